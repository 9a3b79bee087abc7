use crate::reports::occupancy::Facility;
use std::env;
use std::fmt;

/// Top-level configuration for the reporting tool.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capacity: CapacityConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let capacity = CapacityConfig {
            brennen: FacilityCapacity {
                beds: capacity_var("APP_BRENNEN_BEDS", Facility::BrennenHouse.default_beds())?,
                rooms: capacity_var("APP_BRENNEN_ROOMS", Facility::BrennenHouse.default_rooms())?,
            },
            rosalie: FacilityCapacity {
                beds: capacity_var("APP_ROSALIE_BEDS", Facility::RosalieHouse.default_beds())?,
                rooms: capacity_var("APP_ROSALIE_ROOMS", Facility::RosalieHouse.default_rooms())?,
            },
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            capacity,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn capacity_var(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidCapacity { var, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

/// Bed and room counts per house. Assumed constant across a reporting window.
#[derive(Debug, Clone)]
pub struct CapacityConfig {
    pub brennen: FacilityCapacity,
    pub rosalie: FacilityCapacity,
}

impl CapacityConfig {
    pub fn for_facility(&self, facility: Facility) -> &FacilityCapacity {
        match facility {
            Facility::BrennenHouse => &self.brennen,
            Facility::RosalieHouse => &self.rosalie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityCapacity {
    pub beds: u32,
    pub rooms: u32,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidCapacity { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCapacity { var, value } => {
                write!(f, "{var} must be a positive integer (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_BRENNEN_BEDS");
        env::remove_var("APP_BRENNEN_ROOMS");
        env::remove_var("APP_ROSALIE_BEDS");
        env::remove_var("APP_ROSALIE_ROOMS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.capacity.brennen, FacilityCapacity { beds: 32, rooms: 12 });
        assert_eq!(config.capacity.rosalie, FacilityCapacity { beds: 18, rooms: 6 });
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn capacity_overrides_are_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ROSALIE_BEDS", "35");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.capacity.for_facility(Facility::RosalieHouse).beds,
            35
        );
        reset_env();
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BRENNEN_ROOMS", "0");
        let error = AppConfig::load().expect_err("zero rooms rejected");
        assert!(matches!(
            error,
            ConfigError::InvalidCapacity {
                var: "APP_BRENNEN_ROOMS",
                ..
            }
        ));
        reset_env();
    }
}
