//! CSV plumbing shared by the tabular reports.

use crate::reports::intake::normalize_header;
use crate::reports::occupancy::ConfigurationError;
use csv::StringRecord;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column `{column}` not found")]
    MissingColumn { column: String },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl TableError {
    pub(crate) fn missing(column: &str) -> Self {
        Self::MissingColumn {
            column: column.to_owned(),
        }
    }
}

/// One data row. Bytes that are not UTF-8 (Windows-1252 names) decode to
/// U+FFFD rather than failing the row.
#[derive(Debug)]
pub(crate) enum Row {
    Read { line: u64, record: StringRecord },
    Unreadable { line: u64, error: csv::Error },
}

pub(crate) fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

pub(crate) fn headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, csv::Error> {
    let raw = reader.byte_headers()?.clone();
    Ok(StringRecord::from_byte_record_lossy(raw))
}

/// Data rows in file order. Only io failures end the iteration with an
/// error; anything else is reported as an unreadable row.
pub(crate) fn rows<'r, R: Read + 'r>(
    reader: &'r mut csv::Reader<R>,
) -> impl Iterator<Item = Result<Row, csv::Error>> + 'r {
    reader.byte_records().map(|result| match result {
        Ok(record) => {
            let line = record
                .position()
                .map(|position| position.line())
                .unwrap_or_default();
            Ok(Row::Read {
                line,
                record: StringRecord::from_byte_record_lossy(record),
            })
        }
        Err(error) if error.is_io_error() => Err(error),
        Err(error) => {
            let line = error
                .position()
                .map(|position| position.line())
                .unwrap_or_default();
            Ok(Row::Unreadable { line, error })
        }
    })
}

pub(crate) fn find_column<F>(headers: &StringRecord, matches: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    headers
        .iter()
        .position(|header| matches(&normalize_header(header)))
}

/// Trimmed cell at `index`, `None` when the column is absent or blank.
pub(crate) fn cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    record
        .get(index?)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let bytes = b"name,age\nJos\xe9,30\nAna,41\n".to_vec();
        let mut csv_reader = reader(Cursor::new(bytes));
        let headers = headers(&mut csv_reader).expect("headers read");
        assert_eq!(find_column(&headers, |header| header == "age"), Some(1));

        let rows: Vec<Row> = rows(&mut csv_reader)
            .collect::<Result<_, _>>()
            .expect("no io failure");
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            Row::Read { line, record } => {
                assert_eq!(*line, 2);
                assert_eq!(cell(record, Some(0)), Some("Jos\u{fffd}"));
            }
            other => panic!("expected a decoded row, got {other:?}"),
        }
    }

    #[test]
    fn blank_rows_are_detected() {
        let record = StringRecord::from(vec!["", "  ", ""]);
        assert!(is_blank(&record));
        assert_eq!(cell(&record, Some(1)), None);
        assert_eq!(cell(&record, None), None);
    }
}
