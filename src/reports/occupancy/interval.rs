use super::domain::{DayCounting, RecordError, ReportingWindow, StayRecord};
use chrono::NaiveDate;
use serde::Serialize;

/// A stay truncated to the reporting window. `entry <= exit` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClippedStay {
    pub entry: NaiveDate,
    pub exit: NaiveDate,
}

impl ClippedStay {
    pub fn nights(&self, counting: DayCounting) -> i64 {
        let span = (self.exit - self.entry).num_days();
        match counting {
            DayCounting::Inclusive => span + 1,
            DayCounting::Exclusive => span,
        }
    }

    /// Every calendar day from entry through exit.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let exit = self.exit;
        self.entry.iter_days().take_while(move |day| *day <= exit)
    }
}

/// Open stays run through the window end.
pub fn effective_exit(record: &StayRecord, window: &ReportingWindow) -> NaiveDate {
    record.exit.unwrap_or(window.end())
}

pub fn clip(record: &StayRecord, window: &ReportingWindow) -> Result<ClippedStay, RecordError> {
    let exit = effective_exit(record, window);
    if let Some(raw_exit) = record.exit {
        if raw_exit < record.entry {
            return Err(RecordError::ExitBeforeEntry {
                entry: record.entry,
                exit: raw_exit,
            });
        }
    }

    let entry = record.entry.max(window.start());
    let exit = exit.min(window.end());
    if exit < entry {
        return Err(RecordError::OutsideWindow {
            entry: record.entry,
            exit: record.exit,
        });
    }

    Ok(ClippedStay { entry, exit })
}

/// Stay intersects the window at all.
pub fn overlaps(record: &StayRecord, window: &ReportingWindow) -> bool {
    record.entry <= window.end() && effective_exit(record, window) >= window.start()
}

/// Raw entry or raw exit falls inside the window.
pub fn entry_or_exit_within(record: &StayRecord, window: &ReportingWindow) -> bool {
    window.contains(record.entry) || record.exit.is_some_and(|exit| window.contains(exit))
}
