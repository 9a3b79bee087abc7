use super::units::UnitLabelRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Age at which a client is reported as an adult.
pub const ADULT_AGE: u32 = 18;

/// Physical unit identity resolved from a bed label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitId {
    Room(u32),
    Bed(String),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Room(number) => write!(f, "Rm {number}"),
            UnitId::Bed(label) => f.write_str(label),
        }
    }
}

/// Subtotal key for a stay: a demographic group or, for identity
/// accounting, the unit itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Adult,
    Child,
    Unit(UnitId),
}

impl Category {
    pub fn from_age(age: u32) -> Self {
        if age >= ADULT_AGE {
            Self::Adult
        } else {
            Self::Child
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Adult => "Adult".to_string(),
            Self::Child => "Child".to_string(),
            Self::Unit(unit) => unit.to_string(),
        }
    }
}

/// One client stay as read from a case-management export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayRecord {
    pub entry: NaiveDate,
    /// `None` for a stay that is still open.
    pub exit: Option<NaiveDate>,
    pub category: Category,
    /// Raw bed assignment label, e.g. `BH Rm 05-A`.
    pub unit_label: Option<String>,
    /// Full name of the client, used for identity de-duplication.
    pub person: Option<String>,
}

impl StayRecord {
    pub fn new(entry: NaiveDate, exit: Option<NaiveDate>, category: Category) -> Self {
        Self {
            entry,
            exit,
            category,
            unit_label: None,
            person: None,
        }
    }

    pub fn with_unit_label(mut self, label: impl Into<String>) -> Self {
        self.unit_label = Some(label.into());
        self
    }

    pub fn with_person(mut self, name: impl Into<String>) -> Self {
        self.person = Some(name.into());
        self
    }
}

/// Inclusive reporting period plus the unit capacity it is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingWindow {
    start: NaiveDate,
    end: NaiveDate,
    total_units: u32,
}

impl ReportingWindow {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        total_units: u32,
    ) -> Result<Self, ConfigurationError> {
        let window = Self {
            start,
            end,
            total_units,
        };
        window.validate()?;
        Ok(window)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if self.start > self.end {
            return Err(ConfigurationError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        if self.total_units == 0 {
            return Err(ConfigurationError::NonPositiveCapacity);
        }
        Ok(())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the window, both ends included.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn available_unit_nights(&self) -> i64 {
        i64::from(self.total_units) * self.length_days()
    }
}

/// Whether the exit day of a stay counts as an occupied night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCounting {
    Inclusive,
    Exclusive,
}

impl DayCounting {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive of exit day",
            Self::Exclusive => "exclusive of exit day",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountingMode {
    /// Bed-night accounting: clipped stay durations are summed.
    SummedDuration(DayCounting),
    /// Room/bed occupancy by identity: distinct units occupied per day.
    DistinctUnitPerDay(UnitLabelRule),
}

impl AccountingMode {
    pub fn day_counting(&self) -> DayCounting {
        match self {
            Self::SummedDuration(counting) => *counting,
            Self::DistinctUnitPerDay(_) => DayCounting::Inclusive,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SummedDuration(_) => "summed duration",
            Self::DistinctUnitPerDay(_) => "distinct units per day",
        }
    }
}

/// Per-row failure. The row is skipped; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing entry date")]
    MissingEntryDate,
    #[error("unparseable {field} '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("unparseable age '{value}'")]
    InvalidAge { value: String },
    #[error("missing bed label")]
    MissingUnitLabel,
    #[error("exit {exit} precedes entry {entry}")]
    ExitBeforeEntry { entry: NaiveDate, exit: NaiveDate },
    #[error("stay {entry} -> {exit:?} falls outside the reporting window")]
    OutsideWindow {
        entry: NaiveDate,
        exit: Option<NaiveDate>,
    },
    #[error("no unit could be resolved from label {label:?}")]
    UnresolvableUnit { label: Option<String> },
    #[error("row could not be read: {detail}")]
    UnreadableRow { detail: String },
}

impl RecordError {
    pub fn reason(&self) -> SkipReason {
        match self {
            Self::MissingEntryDate | Self::InvalidDate { .. } => SkipReason::InvalidDate,
            Self::InvalidAge { .. } => SkipReason::InvalidAge,
            Self::MissingUnitLabel | Self::UnresolvableUnit { .. } => SkipReason::UnresolvableUnit,
            Self::ExitBeforeEntry { .. } => SkipReason::ExitBeforeEntry,
            Self::OutsideWindow { .. } => SkipReason::OutsideWindow,
            Self::UnreadableRow { .. } => SkipReason::UnreadableRow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDate,
    InvalidAge,
    ExitBeforeEntry,
    OutsideWindow,
    UnresolvableUnit,
    UnreadableRow,
}

impl SkipReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InvalidDate => "Invalid date",
            Self::InvalidAge => "Invalid age",
            Self::ExitBeforeEntry => "Exit before entry",
            Self::OutsideWindow => "Outside window",
            Self::UnresolvableUnit => "Unresolvable unit",
            Self::UnreadableRow => "Unreadable row",
        }
    }
}

/// Whole-call failure: the caller supplied an unusable schema or window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("required column for {field} not found in input headers")]
    MissingColumn { field: &'static str },
    #[error("reporting window start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("total units must be greater than zero")]
    NonPositiveCapacity,
}
