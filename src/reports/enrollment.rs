//! New-enrollment head counts by age group, ethnicity and gender, overall
//! and per house.

use crate::reports::intake::{parse_age, ColumnMapping, Field};
use crate::reports::occupancy::{ConfigurationError, Facility};
use crate::reports::table::{self, cell, Row, TableError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentAgeGroup {
    Child,
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

impl EnrollmentAgeGroup {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Child,
            Self::Teen,
            Self::YoungAdult,
            Self::Adult,
            Self::Senior,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Child => "0-12",
            Self::Teen => "13-17",
            Self::YoungAdult => "18-24",
            Self::Adult => "25-59",
            Self::Senior => "60+",
        }
    }

    pub fn for_age(age: u32) -> Self {
        match age {
            0..=12 => Self::Child,
            13..=17 => Self::Teen,
            18..=24 => Self::YoungAdult,
            25..=59 => Self::Adult,
            _ => Self::Senior,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentBreakdown {
    pub total: usize,
    pub age_groups: BTreeMap<EnrollmentAgeGroup, usize>,
    /// Blank or unreadable ages.
    pub unknown_age: usize,
    /// Blank values count under `Unknown`.
    pub ethnicities: BTreeMap<String, usize>,
    pub genders: BTreeMap<String, usize>,
}

impl EnrollmentBreakdown {
    fn add(&mut self, enrollee: &Enrollee<'_>) {
        self.total += 1;
        match enrollee.age {
            Some(age) => {
                *self
                    .age_groups
                    .entry(EnrollmentAgeGroup::for_age(age))
                    .or_insert(0) += 1
            }
            None => self.unknown_age += 1,
        }
        let ethnicity = enrollee.ethnicity.unwrap_or(UNKNOWN);
        *self.ethnicities.entry(ethnicity.to_owned()).or_insert(0) += 1;
        let gender = enrollee.gender.unwrap_or(UNKNOWN);
        *self.genders.entry(gender.to_owned()).or_insert(0) += 1;
    }

    pub fn age_group(&self, group: EnrollmentAgeGroup) -> usize {
        self.age_groups.get(&group).copied().unwrap_or(0)
    }

    pub fn view(&self) -> EnrollmentBreakdownView {
        EnrollmentBreakdownView {
            total: self.total,
            age_groups: EnrollmentAgeGroup::ordered()
                .into_iter()
                .map(|group| LabelCountView {
                    label: group.label().to_string(),
                    count: self.age_group(group),
                })
                .collect(),
            unknown_age: self.unknown_age,
            ethnicities: counts_view(&self.ethnicities),
            genders: counts_view(&self.genders),
        }
    }
}

fn counts_view(counts: &BTreeMap<String, usize>) -> Vec<LabelCountView> {
    counts
        .iter()
        .map(|(label, count)| LabelCountView {
            label: label.clone(),
            count: *count,
        })
        .collect()
}

struct Enrollee<'r> {
    age: Option<u32>,
    ethnicity: Option<&'r str>,
    gender: Option<&'r str>,
}

/// One enrollment export split by the house code in each bed assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentReport {
    pub all: EnrollmentBreakdown,
    pub houses: BTreeMap<Facility, EnrollmentBreakdown>,
    /// Rows whose bed assignment names no house.
    pub unassigned: usize,
    pub unreadable_rows: usize,
}

impl EnrollmentReport {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        debug!(path = %path.display(), "reading enrollment export");
        Self::from_reader(file)
    }

    /// The bed assignment column is required; age, ethnicity and gender
    /// count as unknown when their column is absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = table::reader(reader);
        let headers = table::headers(&mut csv_reader)?;
        let columns = ColumnMapping::standard().resolve(headers.iter());
        let unit_index = columns.get(&Field::UnitLabel).copied().ok_or(
            ConfigurationError::MissingColumn {
                field: Field::UnitLabel.label(),
            },
        )?;
        let age_index = columns.get(&Field::Age).copied();
        let ethnicity_index = columns.get(&Field::Ethnicity).copied();
        let gender_index = columns.get(&Field::Gender).copied();

        let mut report = Self::default();
        for row in table::rows(&mut csv_reader) {
            let record = match row? {
                Row::Read { record, .. } if table::is_blank(&record) => continue,
                Row::Read { record, .. } => record,
                Row::Unreadable { line, error } => {
                    warn!(line, %error, "skipping unreadable enrollment row");
                    report.unreadable_rows += 1;
                    continue;
                }
            };

            let enrollee = Enrollee {
                age: cell(&record, age_index).and_then(parse_age),
                ethnicity: cell(&record, ethnicity_index),
                gender: cell(&record, gender_index),
            };
            report.all.add(&enrollee);

            match cell(&record, Some(unit_index)).and_then(Facility::from_label) {
                Some(house) => report.houses.entry(house).or_default().add(&enrollee),
                None => report.unassigned += 1,
            }
        }

        Ok(report)
    }

    pub fn house(&self, facility: Facility) -> Option<&EnrollmentBreakdown> {
        self.houses.get(&facility)
    }

    pub fn view(&self) -> EnrollmentReportView {
        EnrollmentReportView {
            all: self.all.view(),
            houses: Facility::ordered()
                .into_iter()
                .map(|facility| HouseEnrollmentView {
                    facility,
                    label: facility.label(),
                    breakdown: self
                        .house(facility)
                        .map(EnrollmentBreakdown::view)
                        .unwrap_or_else(|| EnrollmentBreakdown::default().view()),
                })
                .collect(),
            unassigned: self.unassigned,
            unreadable_rows: self.unreadable_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelCountView {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentBreakdownView {
    pub total: usize,
    pub age_groups: Vec<LabelCountView>,
    pub unknown_age: usize,
    pub ethnicities: Vec<LabelCountView>,
    pub genders: Vec<LabelCountView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HouseEnrollmentView {
    pub facility: Facility,
    pub label: &'static str,
    #[serde(flatten)]
    pub breakdown: EnrollmentBreakdownView,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentReportView {
    pub all: EnrollmentBreakdownView,
    pub houses: Vec<HouseEnrollmentView>,
    pub unassigned: usize,
    pub unreadable_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXPORT: &str = "Bed Assignment Name,Age,Ethnicity,Gender\n\
BH Rm 05-A,34,Hispanic/Latina/e/o,Woman (Girl if child)\n\
BH Rm 05-B,12,Hispanic/Latina/e/o,Man (Boy if child)\n\
RH-Rm 3-2,17,White,Woman (Girl if child)\n\
RH-Rm 4-1,61,,Woman (Girl if child)\n\
Overflow,24,White,\n\
,,,\n";

    #[test]
    fn age_group_boundaries() {
        assert_eq!(EnrollmentAgeGroup::for_age(12), EnrollmentAgeGroup::Child);
        assert_eq!(EnrollmentAgeGroup::for_age(13), EnrollmentAgeGroup::Teen);
        assert_eq!(EnrollmentAgeGroup::for_age(18), EnrollmentAgeGroup::YoungAdult);
        assert_eq!(EnrollmentAgeGroup::for_age(25), EnrollmentAgeGroup::Adult);
        assert_eq!(EnrollmentAgeGroup::for_age(59), EnrollmentAgeGroup::Adult);
        assert_eq!(EnrollmentAgeGroup::for_age(60), EnrollmentAgeGroup::Senior);
    }

    #[test]
    fn enrollments_are_split_by_house() {
        let report = EnrollmentReport::from_reader(Cursor::new(EXPORT)).expect("report builds");

        assert_eq!(report.all.total, 5);
        assert_eq!(report.unassigned, 1);
        assert_eq!(report.all.age_group(EnrollmentAgeGroup::YoungAdult), 1);
        assert_eq!(report.all.genders.get(UNKNOWN), Some(&1));

        let brennen = report.house(Facility::BrennenHouse).expect("brennen rows");
        assert_eq!(brennen.total, 2);
        assert_eq!(brennen.ethnicities.get("Hispanic/Latina/e/o"), Some(&2));
        assert_eq!(brennen.age_group(EnrollmentAgeGroup::Child), 1);
        assert_eq!(brennen.genders.get("Man (Boy if child)"), Some(&1));

        let rosalie = report.house(Facility::RosalieHouse).expect("rosalie rows");
        assert_eq!(rosalie.total, 2);
        assert_eq!(rosalie.age_group(EnrollmentAgeGroup::Teen), 1);
        assert_eq!(rosalie.age_group(EnrollmentAgeGroup::Senior), 1);
        assert_eq!(rosalie.ethnicities.get(UNKNOWN), Some(&1));
    }

    #[test]
    fn unreadable_ages_are_counted_separately() {
        let csv = "Bed Assignment Name,Age\nBH Rm 06-A,unknown\nBH Rm 06-B,\n";
        let report = EnrollmentReport::from_reader(Cursor::new(csv)).expect("report builds");
        assert_eq!(report.all.unknown_age, 2);
        assert!(report.all.age_groups.is_empty());
    }

    #[test]
    fn bed_assignment_column_is_required() {
        let error = EnrollmentReport::from_reader(Cursor::new("Age,Gender\n30,Woman\n"))
            .expect_err("bed column required");
        assert!(matches!(
            error,
            TableError::Configuration(ConfigurationError::MissingColumn { field: "bed label" })
        ));
    }

    #[test]
    fn view_always_lists_both_houses() {
        let csv = "Bed Assignment Name,Age\nBH Rm 06-A,40\n";
        let view = EnrollmentReport::from_reader(Cursor::new(csv))
            .expect("report builds")
            .view();
        assert_eq!(view.houses.len(), 2);
        assert_eq!(view.houses[1].breakdown.total, 0);
        assert_eq!(view.all.age_groups[3].count, 1);
    }
}
