//! Tally of the "History of Violence" multi-select column.

use crate::reports::intake::normalize_header;
use crate::reports::table::{self, cell, find_column, Row, TableError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const HISTORY_COLUMN: &str = "History of Violence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolenceType {
    PhysicalViolence,
    PhysicalAbuse,
    EmotionalAbuse,
    OtherUnknown,
    SexualAssault,
    Neglect,
    WitnessedViolence,
    ElderAbuse,
    Trafficked,
}

impl ViolenceType {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::PhysicalViolence,
            Self::PhysicalAbuse,
            Self::EmotionalAbuse,
            Self::OtherUnknown,
            Self::SexualAssault,
            Self::Neglect,
            Self::WitnessedViolence,
            Self::ElderAbuse,
            Self::Trafficked,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PhysicalViolence => "Physical Violence",
            Self::PhysicalAbuse => "Physical Abuse",
            Self::EmotionalAbuse => "Emotional Abuse",
            Self::OtherUnknown => "Other/Unknown",
            Self::SexualAssault => "Sexual Assault",
            Self::Neglect => "Neglect",
            Self::WitnessedViolence => "Witnessed Violence",
            Self::ElderAbuse => "Elder Abuse",
            Self::Trafficked => "Trafficked",
        }
    }

    /// Matches a selection case-insensitively, ignoring surrounding spaces.
    pub fn from_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolenceTally {
    pub rows_read: usize,
    pub rows_with_history: usize,
    pub counts: BTreeMap<ViolenceType, usize>,
    /// Sum of all recognized selections.
    pub total: usize,
    /// Selections outside the known types, kept verbatim.
    pub unrecognized: BTreeMap<String, usize>,
    pub unreadable_rows: usize,
}

impl ViolenceTally {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        debug!(path = %path.display(), "reading violence history export");
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = table::reader(reader);
        let headers = table::headers(&mut csv_reader)?;
        let wanted = normalize_header(HISTORY_COLUMN);
        let index = find_column(&headers, |header| header == wanted)
            .ok_or_else(|| TableError::missing(HISTORY_COLUMN))?;

        let mut tally = Self::default();
        for row in table::rows(&mut csv_reader) {
            let record = match row? {
                Row::Read { record, .. } if table::is_blank(&record) => continue,
                Row::Read { record, .. } => record,
                Row::Unreadable { line, error } => {
                    warn!(line, %error, "skipping unreadable row");
                    tally.rows_read += 1;
                    tally.unreadable_rows += 1;
                    continue;
                }
            };
            tally.rows_read += 1;

            let Some(history) = cell(&record, Some(index)) else {
                continue;
            };
            tally.rows_with_history += 1;
            history
                .split(';')
                .map(str::trim)
                .filter(|selection| !selection.is_empty())
                .for_each(|selection| tally.record(selection));
        }

        Ok(tally)
    }

    fn record(&mut self, selection: &str) {
        match ViolenceType::from_label(selection) {
            Some(kind) => {
                *self.counts.entry(kind).or_insert(0) += 1;
                self.total += 1;
            }
            None => *self.unrecognized.entry(selection.to_owned()).or_insert(0) += 1,
        }
    }

    pub fn count(&self, kind: ViolenceType) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Adds another house's tally, e.g. Rosalie after Brennen.
    pub fn merge(&mut self, other: &ViolenceTally) {
        self.rows_read += other.rows_read;
        self.rows_with_history += other.rows_with_history;
        self.total += other.total;
        self.unreadable_rows += other.unreadable_rows;
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_insert(0) += count;
        }
        for (selection, count) in &other.unrecognized {
            *self.unrecognized.entry(selection.clone()).or_insert(0) += count;
        }
    }

    pub fn view(&self) -> ViolenceTallyView {
        ViolenceTallyView {
            rows_read: self.rows_read,
            rows_with_history: self.rows_with_history,
            types: ViolenceType::ordered()
                .into_iter()
                .map(|kind| ViolenceCountView {
                    kind,
                    label: kind.label(),
                    count: self.count(kind),
                })
                .collect(),
            total: self.total,
            unrecognized: self.unrecognized.clone(),
            unreadable_rows: self.unreadable_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolenceCountView {
    #[serde(rename = "type")]
    pub kind: ViolenceType,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolenceTallyView {
    pub rows_read: usize,
    pub rows_with_history: usize,
    pub types: Vec<ViolenceCountView>,
    pub total: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unrecognized: BTreeMap<String, usize>,
    pub unreadable_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn selections_are_split_and_counted() {
        let csv = "Client,History of Violence\n\
a,Physical Violence; Emotional Abuse\n\
b,emotional abuse;;Trafficked \n\
c,\n\
d,Stalking;Neglect\n";
        let tally = ViolenceTally::from_reader(Cursor::new(csv)).expect("tally builds");

        assert_eq!(tally.rows_read, 4);
        assert_eq!(tally.rows_with_history, 3);
        assert_eq!(tally.count(ViolenceType::EmotionalAbuse), 2);
        assert_eq!(tally.count(ViolenceType::PhysicalViolence), 1);
        assert_eq!(tally.count(ViolenceType::Trafficked), 1);
        assert_eq!(tally.count(ViolenceType::Neglect), 1);
        assert_eq!(tally.count(ViolenceType::ElderAbuse), 0);
        assert_eq!(tally.total, 5);
        assert_eq!(tally.unrecognized.get("Stalking"), Some(&1));
    }

    #[test]
    fn view_lists_every_type_in_order() {
        let tally = ViolenceTally::from_reader(Cursor::new("History of Violence\nNeglect\n"))
            .expect("tally builds");
        let view = tally.view();

        assert_eq!(view.types.len(), 9);
        assert_eq!(view.types[0].label, "Physical Violence");
        assert_eq!(view.types[5].count, 1);
        assert_eq!(view.total, 1);
    }

    #[test]
    fn history_column_is_required() {
        let error = ViolenceTally::from_reader(Cursor::new("Client,Notes\na,b\n"))
            .expect_err("column required");
        match error {
            TableError::MissingColumn { column } => assert_eq!(column, "History of Violence"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn houses_merge_into_one_tally() {
        let mut brennen = ViolenceTally::from_reader(Cursor::new(
            "History of Violence\nSexual Assault;Neglect\n",
        ))
        .expect("tally builds");
        let rosalie =
            ViolenceTally::from_reader(Cursor::new("History of Violence\nNeglect\nOther/Unknown\n"))
                .expect("tally builds");

        brennen.merge(&rosalie);
        assert_eq!(brennen.rows_read, 3);
        assert_eq!(brennen.count(ViolenceType::Neglect), 2);
        assert_eq!(brennen.total, 4);
    }
}
