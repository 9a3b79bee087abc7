use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical columns the reports consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    EntryDate,
    ExitDate,
    Age,
    UnitLabel,
    FullName,
    Gender,
    Race,
    Ethnicity,
    Program,
}

impl Field {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EntryDate => "entry date",
            Self::ExitDate => "exit date",
            Self::Age => "age",
            Self::UnitLabel => "bed label",
            Self::FullName => "full name",
            Self::Gender => "gender",
            Self::Race => "race",
            Self::Ethnicity => "ethnicity",
            Self::Program => "program",
        }
    }
}

static STANDARD_HEADERS: OnceLock<HashMap<String, Field>> = OnceLock::new();

fn standard_headers() -> &'static HashMap<String, Field> {
    STANDARD_HEADERS.get_or_init(|| {
        const HEADER_TO_FIELD: &[(&str, Field)] = &[
            ("Entry Date", Field::EntryDate),
            ("entry_date", Field::EntryDate),
            ("Project Start Date", Field::EntryDate),
            ("Exit Date", Field::ExitDate),
            ("exit_date", Field::ExitDate),
            ("Project Exit Date", Field::ExitDate),
            ("Age", Field::Age),
            ("Age at Entry", Field::Age),
            ("Bed: Bed Number", Field::UnitLabel),
            ("Bed Assignment Name", Field::UnitLabel),
            ("bed_name", Field::UnitLabel),
            ("Full Name", Field::FullName),
            ("full_name", Field::FullName),
            ("Client Name", Field::FullName),
            ("Gender", Field::Gender),
            ("Race", Field::Race),
            ("Nationality/Race/Ethnicity", Field::Ethnicity),
            ("Ethnicity", Field::Ethnicity),
            ("Program Enrollment Name", Field::Program),
            ("program_name", Field::Program),
            ("Program", Field::Program),
        ];

        let mut map = HashMap::with_capacity(HEADER_TO_FIELD.len());
        for (header, field) in HEADER_TO_FIELD {
            map.insert(normalize_header(header), *field);
        }
        map
    })
}

/// Maps source headers onto [`Field`]s. Caller renames win over the
/// standard export headers; the first matching column wins otherwise.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    renames: HashMap<String, Field>,
    include_standard: bool,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::standard()
    }
}

impl ColumnMapping {
    pub fn standard() -> Self {
        Self {
            renames: HashMap::new(),
            include_standard: true,
        }
    }

    /// Only caller-supplied renames are recognized.
    pub fn custom() -> Self {
        Self {
            renames: HashMap::new(),
            include_standard: false,
        }
    }

    pub fn rename(mut self, header: &str, field: Field) -> Self {
        self.renames.insert(normalize_header(header), field);
        self
    }

    pub(crate) fn resolve<'h, I>(&self, headers: I) -> HashMap<Field, usize>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let mut renamed: HashMap<Field, usize> = HashMap::new();
        let mut standard: HashMap<Field, usize> = HashMap::new();

        for (index, header) in headers.into_iter().enumerate() {
            let normalized = normalize_header(header);
            if let Some(field) = self.renames.get(&normalized) {
                renamed.entry(*field).or_insert(index);
            } else if self.include_standard {
                if let Some(field) = standard_headers().get(&normalized) {
                    standard.entry(*field).or_insert(index);
                }
            }
        }

        for (field, index) in renamed {
            standard.insert(field, index);
        }
        standard
    }
}
