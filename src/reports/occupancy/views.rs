use super::accountant::OccupancySummary;
use super::domain::{Category, DayCounting, SkipReason};
use super::served::ServedSummary;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct CategorySubtotalView {
    pub category: Category,
    pub category_label: String,
    pub unit_nights: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkipCountView {
    pub reason: SkipReason,
    pub reason_label: &'static str,
    pub records: usize,
}

/// Per-reason counts in reason order.
pub fn skip_counts(counts: BTreeMap<SkipReason, usize>) -> Vec<SkipCountView> {
    counts
        .into_iter()
        .map(|(reason, records)| SkipCountView {
            reason,
            reason_label: reason.label(),
            records,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct OverCapacityView {
    pub date: NaiveDate,
    pub units: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccupancySummaryView {
    pub mode: &'static str,
    pub day_counting: DayCounting,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub window_days: i64,
    pub total_units: u32,
    pub available_unit_nights: i64,
    pub occupied_unit_nights: i64,
    pub stay_nights: i64,
    pub occupancy_percentage: f64,
    pub category_subtotals: Vec<CategorySubtotalView>,
    pub skipped: Vec<SkipCountView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub over_capacity_days: Vec<OverCapacityView>,
}

impl OccupancySummary {
    pub fn view(&self) -> OccupancySummaryView {
        let category_subtotals = self
            .category_subtotals
            .iter()
            .map(|(category, nights)| CategorySubtotalView {
                category: category.clone(),
                category_label: category.label(),
                unit_nights: *nights,
            })
            .collect();

        let skipped = skip_counts(self.diagnostics.counts());

        let over_capacity_days = self
            .diagnostics
            .over_capacity_days
            .iter()
            .map(|day| OverCapacityView {
                date: day.date,
                units: day.units,
            })
            .collect();

        OccupancySummaryView {
            mode: self.mode.label(),
            day_counting: self.mode.day_counting(),
            window_start: self.window.start(),
            window_end: self.window.end(),
            window_days: self.window_days(),
            total_units: self.window.total_units(),
            available_unit_nights: self.available_unit_nights(),
            occupied_unit_nights: self.occupied_unit_nights,
            stay_nights: self.stay_nights,
            occupancy_percentage: self.occupancy_percentage,
            category_subtotals,
            skipped,
            over_capacity_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServedCategoryView {
    pub category: Category,
    pub category_label: String,
    pub people: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServedSummaryView {
    pub distinct_people: usize,
    pub records_matched: usize,
    pub records_without_key: usize,
    pub by_category: Vec<ServedCategoryView>,
}

impl ServedSummary {
    pub fn view(&self) -> ServedSummaryView {
        ServedSummaryView {
            distinct_people: self.distinct_people,
            records_matched: self.records_matched,
            records_without_key: self.records_without_key,
            by_category: self
                .by_category
                .iter()
                .map(|(category, people)| ServedCategoryView {
                    category: category.clone(),
                    category_label: category.label(),
                    people: *people,
                })
                .collect(),
        }
    }
}
