use super::domain::{
    AccountingMode, Category, ConfigurationError, RecordError, ReportingWindow, SkipReason,
    StayRecord, UnitId,
};
use super::interval::{clip, ClippedStay};
use super::units::UnitLabelRule;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Position of the record in the input sequence.
    pub index: usize,
    pub error: RecordError,
}

/// A day on which more distinct units were seen than the window's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverCapacityDay {
    pub date: NaiveDate,
    pub units: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AccountingDiagnostics {
    pub issues: Vec<RecordIssue>,
    pub over_capacity_days: Vec<OverCapacityDay>,
}

impl AccountingDiagnostics {
    fn record(&mut self, index: usize, error: RecordError) {
        debug!(index, %error, "record excluded from accounting");
        self.issues.push(RecordIssue { index, error });
    }

    pub fn excluded(&self) -> usize {
        self.issues.len()
    }

    pub fn count(&self, reason: SkipReason) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.error.reason() == reason)
            .count()
    }

    pub fn counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.error.reason()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancySummary {
    pub mode: AccountingMode,
    pub window: ReportingWindow,
    pub occupied_unit_nights: i64,
    /// Sum of clipped stay durations. Equals `occupied_unit_nights` for
    /// summed-duration accounting.
    pub stay_nights: i64,
    pub category_subtotals: BTreeMap<Category, i64>,
    pub occupancy_percentage: f64,
    pub diagnostics: AccountingDiagnostics,
}

impl OccupancySummary {
    pub fn window_days(&self) -> i64 {
        self.window.length_days()
    }

    pub fn available_unit_nights(&self) -> i64 {
        self.window.available_unit_nights()
    }

    pub fn subtotal(&self, category: &Category) -> i64 {
        self.category_subtotals.get(category).copied().unwrap_or(0)
    }
}

/// Contribution of one input record, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayNights {
    pub index: usize,
    pub clipped: Option<ClippedStay>,
    pub nights: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyReport {
    pub summary: OccupancySummary,
    pub stays: Vec<StayNights>,
}

impl OccupancyReport {
    pub fn nights_for(&self, index: usize) -> i64 {
        self.stays.get(index).map(|stay| stay.nights).unwrap_or(0)
    }
}

pub fn occupancy_percentage(occupied: i64, available: i64) -> f64 {
    if available <= 0 {
        0.0
    } else {
        occupied as f64 / available as f64 * 100.0
    }
}

/// Computes occupied unit-nights for `records` clipped to `window`.
///
/// Per-record problems never abort the call; they are collected in the
/// summary diagnostics and the record contributes zero nights.
pub fn compute(
    records: &[StayRecord],
    window: &ReportingWindow,
    mode: &AccountingMode,
) -> Result<OccupancyReport, ConfigurationError> {
    window.validate()?;

    let report = match mode {
        AccountingMode::SummedDuration(_) => summed_duration(records, window, mode),
        AccountingMode::DistinctUnitPerDay(rule) => distinct_units(records, window, mode, rule),
    };

    debug!(
        mode = report.summary.mode.label(),
        occupied = report.summary.occupied_unit_nights,
        available = report.summary.available_unit_nights(),
        excluded = report.summary.diagnostics.excluded(),
        "occupancy computed"
    );

    Ok(report)
}

fn summed_duration(
    records: &[StayRecord],
    window: &ReportingWindow,
    mode: &AccountingMode,
) -> OccupancyReport {
    let counting = mode.day_counting();
    let mut diagnostics = AccountingDiagnostics::default();
    let mut subtotals: BTreeMap<Category, i64> = BTreeMap::new();
    let mut stays = Vec::with_capacity(records.len());
    let mut occupied = 0;

    for (index, record) in records.iter().enumerate() {
        match clip(record, window) {
            Ok(clipped) => {
                let nights = clipped.nights(counting);
                occupied += nights;
                *subtotals.entry(record.category.clone()).or_insert(0) += nights;
                stays.push(StayNights {
                    index,
                    clipped: Some(clipped),
                    nights,
                });
            }
            Err(error) => {
                diagnostics.record(index, error);
                stays.push(StayNights {
                    index,
                    clipped: None,
                    nights: 0,
                });
            }
        }
    }

    OccupancyReport {
        summary: OccupancySummary {
            mode: mode.clone(),
            window: *window,
            occupied_unit_nights: occupied,
            stay_nights: occupied,
            category_subtotals: subtotals,
            occupancy_percentage: occupancy_percentage(occupied, window.available_unit_nights()),
            diagnostics,
        },
        stays,
    }
}

fn distinct_units(
    records: &[StayRecord],
    window: &ReportingWindow,
    mode: &AccountingMode,
    rule: &UnitLabelRule,
) -> OccupancyReport {
    let counting = mode.day_counting();
    let mut diagnostics = AccountingDiagnostics::default();
    let mut occupied_by_day: BTreeMap<NaiveDate, BTreeSet<UnitId>> = BTreeMap::new();
    let mut stays = Vec::with_capacity(records.len());
    let mut stay_nights = 0;

    for (index, record) in records.iter().enumerate() {
        let clipped = match clip(record, window) {
            Ok(clipped) => clipped,
            Err(error) => {
                diagnostics.record(index, error);
                stays.push(StayNights {
                    index,
                    clipped: None,
                    nights: 0,
                });
                continue;
            }
        };

        let nights = clipped.nights(counting);
        stay_nights += nights;
        stays.push(StayNights {
            index,
            clipped: Some(clipped),
            nights,
        });

        let unit = record
            .unit_label
            .as_deref()
            .and_then(|label| rule.resolve(label));
        match unit {
            Some(unit) => {
                for day in clipped.days() {
                    occupied_by_day.entry(day).or_default().insert(unit.clone());
                }
            }
            None => diagnostics.record(
                index,
                RecordError::UnresolvableUnit {
                    label: record.unit_label.clone(),
                },
            ),
        }
    }

    let capacity = window.total_units() as usize;
    let mut unit_days: BTreeMap<Category, i64> = BTreeMap::new();
    let mut occupied = 0;

    for (date, units) in &occupied_by_day {
        occupied += units.len() as i64;
        if units.len() > capacity {
            warn!(
                %date,
                units = units.len(),
                capacity,
                "distinct units exceed capacity; unit labels may be colliding"
            );
            diagnostics.over_capacity_days.push(OverCapacityDay {
                date: *date,
                units: units.len(),
            });
        }
        for unit in units {
            *unit_days.entry(Category::Unit(unit.clone())).or_insert(0) += 1;
        }
    }

    OccupancyReport {
        summary: OccupancySummary {
            mode: mode.clone(),
            window: *window,
            occupied_unit_nights: occupied,
            stay_nights,
            category_subtotals: unit_days,
            occupancy_percentage: occupancy_percentage(occupied, window.available_unit_nights()),
            diagnostics,
        },
        stays,
    }
}
