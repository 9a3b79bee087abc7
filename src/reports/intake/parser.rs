use super::mapping::{ColumnMapping, Field};
use super::normalizer::{clean_cell, parse_age, parse_date};
use super::{CategorySource, ClientProfile, ClientStay};
use crate::reports::occupancy::{Category, ConfigurationError, RecordError, StayRecord};
use csv::StringRecord;
use std::collections::HashMap;

/// Column positions for one input file.
#[derive(Debug)]
pub(crate) struct HeaderIndex {
    columns: HashMap<Field, usize>,
}

impl HeaderIndex {
    pub(crate) fn resolve(
        headers: &StringRecord,
        mapping: &ColumnMapping,
        required: &[Field],
    ) -> Result<Self, ConfigurationError> {
        let columns = mapping.resolve(headers.iter());
        if let Some(missing) = required.iter().find(|field| !columns.contains_key(*field)) {
            return Err(ConfigurationError::MissingColumn {
                field: missing.label(),
            });
        }
        Ok(Self { columns })
    }

    fn cell<'r>(&self, record: &'r StringRecord, field: Field) -> Option<&'r str> {
        let index = *self.columns.get(&field)?;
        record.get(index).and_then(clean_cell)
    }

    fn text(&self, record: &StringRecord, field: Field) -> Option<String> {
        self.cell(record, field).map(str::to_owned)
    }
}

pub(crate) fn parse_row(
    index: &HeaderIndex,
    record: &StringRecord,
    source: &CategorySource,
) -> Result<ClientStay, RecordError> {
    let raw_entry = index
        .cell(record, Field::EntryDate)
        .ok_or(RecordError::MissingEntryDate)?;
    let entry = parse_date(raw_entry).ok_or_else(|| RecordError::InvalidDate {
        field: Field::EntryDate.label(),
        value: raw_entry.to_owned(),
    })?;

    let exit = match index.cell(record, Field::ExitDate) {
        Some(raw_exit) => Some(parse_date(raw_exit).ok_or_else(|| RecordError::InvalidDate {
            field: Field::ExitDate.label(),
            value: raw_exit.to_owned(),
        })?),
        None => None,
    };

    let raw_age = index.cell(record, Field::Age);
    let age = raw_age.and_then(parse_age);
    let unit_label = index.text(record, Field::UnitLabel);

    let category = match source {
        CategorySource::Age => match age {
            Some(age) => Category::from_age(age),
            None => {
                return Err(RecordError::InvalidAge {
                    value: raw_age.unwrap_or_default().to_owned(),
                })
            }
        },
        CategorySource::Fixed(category) => category.clone(),
        CategorySource::AgeWhenKnown(fallback) => {
            age.map(Category::from_age).unwrap_or_else(|| fallback.clone())
        }
        CategorySource::UnitLabel(rule) => {
            let label = unit_label.as_deref().ok_or(RecordError::MissingUnitLabel)?;
            let unit = rule
                .resolve(label)
                .ok_or_else(|| RecordError::UnresolvableUnit {
                    label: Some(label.to_owned()),
                })?;
            Category::Unit(unit)
        }
    };

    let stay = StayRecord {
        entry,
        exit,
        category,
        unit_label,
        person: index.text(record, Field::FullName),
    };

    let profile = ClientProfile {
        age,
        gender: index.text(record, Field::Gender),
        race: index.text(record, Field::Race),
        ethnicity: index.text(record, Field::Ethnicity),
        program: index.text(record, Field::Program),
    };

    Ok(ClientStay { stay, profile })
}
