use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    /// `APP_LOG_LEVEL` is not a valid filter directive.
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, source } => {
                write!(f, "APP_LOG_LEVEL '{value}' is not a log filter: {source}")
            }
            TelemetryError::Subscriber(err) => write!(f, "could not install logger: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr; stdout carries the report.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// `RUST_LOG` wins when it parses; otherwise the configured level applies.
fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn config(log_level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: log_level.to_string(),
        }
    }

    #[test]
    fn configured_level_builds_a_filter() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::remove_var("RUST_LOG");
        let filter = build_filter(&config("shelter_stats=debug,warn")).expect("filter builds");
        assert!(filter.to_string().contains("shelter_stats=debug"));
    }

    #[test]
    fn unparseable_level_is_reported_with_its_value() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::remove_var("RUST_LOG");
        let error = build_filter(&config("shelter_stats=verbose")).expect_err("bad level");

        match &error {
            TelemetryError::EnvFilter { value, .. } => assert_eq!(value, "shelter_stats=verbose"),
            other => panic!("expected filter error, got {other:?}"),
        }
        assert!(error.to_string().starts_with("APP_LOG_LEVEL 'shelter_stats=verbose'"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
