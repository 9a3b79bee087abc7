//! Case-management CSV exports to typed [`StayRecord`]s.

pub mod export;
mod mapping;
mod normalizer;
mod parser;

pub use mapping::{ColumnMapping, Field};

use crate::reports::occupancy::{
    Category, ConfigurationError, RecordError, SkipReason, StayRecord, UnitLabelRule,
};
use crate::reports::table::{self, Row};
use parser::HeaderIndex;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub(crate) use normalizer::{normalize_header, parse_age, parse_date};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// How each row's [`Category`] is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySource {
    /// Adult at 18 or older, from the age column.
    Age,
    /// Every row of the file shares a category, e.g. a children-only export.
    Fixed(Category),
    /// Age classifies the row when the column holds a readable age;
    /// otherwise the given category applies. The age column is optional.
    AgeWhenKnown(Category),
    /// The unit resolved from the bed label is the category.
    UnitLabel(UnitLabelRule),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientProfile {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
    pub program: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStay {
    pub stay: StayRecord,
    pub profile: ClientProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line in the source file, header included.
    pub line: u64,
    pub error: RecordError,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub stays: Vec<ClientStay>,
    pub rejected: Vec<RowIssue>,
    pub total_rows: usize,
}

impl ImportOutcome {
    pub fn stay_records(&self) -> Vec<StayRecord> {
        self.stays.iter().map(|client| client.stay.clone()).collect()
    }

    /// Rejected rows per reason.
    pub fn rejection_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.rejected {
            *counts.entry(issue.error.reason()).or_insert(0) += 1;
        }
        counts
    }

    /// Appends another file's rows, e.g. a children export after adults.
    pub fn merge(&mut self, other: ImportOutcome) {
        self.stays.extend(other.stays);
        self.rejected.extend(other.rejected);
        self.total_rows += other.total_rows;
    }
}

#[derive(Debug, Clone)]
pub struct StayImporter {
    mapping: ColumnMapping,
    category_source: CategorySource,
    required: Vec<Field>,
}

impl StayImporter {
    pub fn new(mapping: ColumnMapping, category_source: CategorySource) -> Self {
        let mut required = vec![Field::EntryDate, Field::ExitDate];
        match &category_source {
            CategorySource::Age => required.push(Field::Age),
            CategorySource::UnitLabel(_) => required.push(Field::UnitLabel),
            CategorySource::Fixed(_) | CategorySource::AgeWhenKnown(_) => {}
        }

        Self {
            mapping,
            category_source,
            required,
        }
    }

    /// Marks an additional column as mandatory for this import.
    pub fn require(mut self, field: Field) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<ImportOutcome, ImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        debug!(path = %path.display(), "reading stay export");
        self.from_reader(file)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<ImportOutcome, ImportError> {
        let mut csv_reader = table::reader(reader);
        let headers = table::headers(&mut csv_reader)?;
        let index = HeaderIndex::resolve(&headers, &self.mapping, &self.required)?;
        let mut outcome = ImportOutcome::default();

        for row in table::rows(&mut csv_reader) {
            let (line, parsed) = match row? {
                Row::Read { record, .. } if table::is_blank(&record) => continue,
                Row::Read { line, record } => (
                    line,
                    parser::parse_row(&index, &record, &self.category_source),
                ),
                Row::Unreadable { line, error } => (
                    line,
                    Err(RecordError::UnreadableRow {
                        detail: error.to_string(),
                    }),
                ),
            };
            outcome.total_rows += 1;

            match parsed {
                Ok(stay) => outcome.stays.push(stay),
                Err(error) => {
                    warn!(line, %error, "skipping row");
                    outcome.rejected.push(RowIssue { line, error });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn importer_classifies_by_age_and_keeps_open_stays() {
        let csv = "Full Name,Age,Entry Date,Exit Date,Bed: Bed Number\n\
Jane Doe,34,2024-01-05,2024-01-20,BH Rm 05-A\n\
Sam Doe,7,1/5/2024,,BH Rm 05-B\n";
        let outcome = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_reader(Cursor::new(csv))
            .expect("import succeeds");

        assert_eq!(outcome.total_rows, 2);
        assert!(outcome.rejected.is_empty());
        let adult = &outcome.stays[0];
        assert_eq!(adult.stay.category, Category::Adult);
        assert_eq!(adult.stay.exit, Some(date(2024, 1, 20)));
        assert_eq!(adult.stay.person.as_deref(), Some("Jane Doe"));
        let child = &outcome.stays[1];
        assert_eq!(child.stay.category, Category::Child);
        assert_eq!(child.stay.entry, date(2024, 1, 5));
        assert_eq!(child.stay.exit, None);
        assert_eq!(child.stay.unit_label.as_deref(), Some("BH Rm 05-B"));
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let csv = "Age,Entry Date,Exit Date\n\
40,yesterday,2024-01-02\n\
40,,2024-01-02\n\
40,2024-01-01,soon\n\
adult,2024-01-01,2024-01-02\n\
22,2024-01-01,2024-01-02\n";
        let outcome = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_reader(Cursor::new(csv))
            .expect("import succeeds");

        assert_eq!(outcome.total_rows, 5);
        assert_eq!(outcome.stays.len(), 1);
        let lines: Vec<u64> = outcome.rejected.iter().map(|issue| issue.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
        assert_eq!(outcome.rejected[1].error, RecordError::MissingEntryDate);
        assert!(matches!(
            outcome.rejected[3].error,
            RecordError::InvalidAge { .. }
        ));
    }

    #[test]
    fn missing_required_column_aborts_import() {
        let csv = "Full Name,Entry Date,Exit Date\nJane,2024-01-01,\n";
        let error = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_reader(Cursor::new(csv))
            .expect_err("age column required");

        match error {
            ImportError::Configuration(ConfigurationError::MissingColumn { field }) => {
                assert_eq!(field, "age")
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn fixed_category_files_do_not_need_age() {
        let csv = "Entry Date,Exit Date\n2024-01-01,2024-01-03\n";
        let outcome = StayImporter::new(
            ColumnMapping::standard(),
            CategorySource::Fixed(Category::Child),
        )
        .from_reader(Cursor::new(csv))
        .expect("import succeeds");
        assert_eq!(outcome.stays[0].stay.category, Category::Child);
    }

    #[test]
    fn caller_renames_map_unusual_headers() {
        let csv = "Arrived,Departed,Who\n2024-02-01,2024-02-02,Ana\n";
        let mapping = ColumnMapping::standard()
            .rename("Arrived", Field::EntryDate)
            .rename("Departed", Field::ExitDate)
            .rename("Who", Field::FullName);
        let outcome = StayImporter::new(mapping, CategorySource::Fixed(Category::Adult))
            .require(Field::FullName)
            .from_reader(Cursor::new(csv))
            .expect("import succeeds");
        assert_eq!(outcome.stays[0].stay.person.as_deref(), Some("Ana"));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_path("./does-not-exist.csv")
            .expect_err("expected io error");

        match error {
            ImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_names_do_not_abort_the_import() {
        let mut bytes = b"Full Name,Age,Entry Date,Exit Date\nAna Ruiz,30,2024-01-01,2024-01-02\n".to_vec();
        bytes.extend_from_slice(b"Jos\xe9 Pe\xf1a,41,2024-01-03,\n");
        let outcome = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_reader(Cursor::new(bytes))
            .expect("import succeeds");

        assert_eq!(outcome.total_rows, 2);
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.stays[0].stay.person.as_deref(), Some("Ana Ruiz"));
        assert_eq!(
            outcome.stays[1].stay.person.as_deref(),
            Some("Jos\u{fffd} Pe\u{fffd}a")
        );
        assert_eq!(outcome.stays[1].stay.entry, date(2024, 1, 3));
    }

    #[test]
    fn blank_age_falls_back_when_age_is_optional() {
        let csv = "Age,Entry Date,Exit Date,Bed: Bed Number\n\
34,2024-01-01,2024-01-03,BH Rm 05-A\n\
,2024-01-01,2024-01-03,BH Rm 06-A\n\
9,2024-01-01,2024-01-03,BH Rm 07-A\n";
        let outcome = StayImporter::new(
            ColumnMapping::standard(),
            CategorySource::AgeWhenKnown(Category::Adult),
        )
        .from_reader(Cursor::new(csv))
        .expect("import succeeds");

        let categories: Vec<Category> = outcome
            .stays
            .iter()
            .map(|client| client.stay.category.clone())
            .collect();
        assert_eq!(
            categories,
            vec![Category::Adult, Category::Adult, Category::Child]
        );
        assert_eq!(outcome.stays[1].profile.age, None);
    }

    #[test]
    fn rejections_are_counted_by_reason() {
        let csv = "Age,Entry Date,Exit Date\n\
x,2024-01-01,\n\
40,soon,\n\
41,,\n\
42,2024-01-01,\n";
        let outcome = StayImporter::new(ColumnMapping::standard(), CategorySource::Age)
            .from_reader(Cursor::new(csv))
            .expect("import succeeds");

        let counts = outcome.rejection_counts();
        assert_eq!(counts.get(&SkipReason::InvalidAge), Some(&1));
        assert_eq!(counts.get(&SkipReason::InvalidDate), Some(&2));
        assert_eq!(outcome.stays.len(), 1);
    }
}
