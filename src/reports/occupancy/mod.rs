//! Occupied unit-night accounting over a reporting window.
//!
//! Two accounting modes are supported: summed stay durations (bed-nights)
//! and distinct units per day (room occupancy by identity). Stays are
//! clipped to the window; open stays run through the window end.

mod accountant;
pub mod domain;
mod facility;
pub mod interval;
pub mod served;
mod units;
pub mod views;

pub use accountant::{
    compute, occupancy_percentage, AccountingDiagnostics, OccupancyReport, OccupancySummary,
    OverCapacityDay, RecordIssue, StayNights,
};
pub use domain::{
    AccountingMode, Category, ConfigurationError, DayCounting, RecordError, ReportingWindow,
    SkipReason, StayRecord, UnitId,
};
pub use facility::Facility;
pub use served::{first_stay_per_person, people_served, person_key, ServedSummary, WindowFilter};
pub use units::UnitLabelRule;
