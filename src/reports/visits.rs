//! Visitor sign-in logs and dated event exports (crisis-line calls).

use crate::reports::intake::{normalize_header, parse_date};
use crate::reports::occupancy::ConfigurationError;
use crate::reports::table::{self, cell, find_column, Row, TableError};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::io::{Read, Write};
use tracing::{debug, warn};

const NAME_COLUMN: &str = "name";
const SIGN_IN_COLUMN: &str = "sign_in_time";
const DV_QUESTION: &str = "domestic violence";

/// Inclusive calendar range for event logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigurationError> {
        if start > end {
            return Err(ConfigurationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitSummary {
    pub total_rows: usize,
    pub in_window: usize,
    pub duplicates_removed: usize,
    pub unique_entries: usize,
    pub non_dv_names: BTreeSet<String>,
    /// Rows without a name or sign-in time, with an unreadable time, or
    /// that could not be parsed as CSV.
    pub skipped: usize,
}

impl VisitSummary {
    pub fn view(&self) -> VisitSummaryView {
        VisitSummaryView {
            total_rows: self.total_rows,
            in_window: self.in_window,
            duplicates_removed: self.duplicates_removed,
            unique_entries: self.unique_entries,
            non_dv_entries: self.non_dv_names.len(),
            skipped: self.skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitSummaryView {
    pub total_rows: usize,
    pub in_window: usize,
    pub duplicates_removed: usize,
    pub unique_entries: usize,
    pub non_dv_entries: usize,
    pub skipped: usize,
}

/// One sign-in per person per day within a range.
#[derive(Debug, Clone)]
pub struct SignInLog {
    headers: StringRecord,
    unique_rows: Vec<StringRecord>,
    summary: VisitSummary,
}

impl SignInLog {
    pub fn from_reader<R: Read>(reader: R, range: &DateRange) -> Result<Self, TableError> {
        let mut csv_reader = table::reader(reader);
        let headers = table::headers(&mut csv_reader)?;
        let name_index = find_column(&headers, |header| header == NAME_COLUMN)
            .ok_or_else(|| TableError::missing(NAME_COLUMN))?;
        let time_index = find_column(&headers, |header| header == SIGN_IN_COLUMN)
            .ok_or_else(|| TableError::missing(SIGN_IN_COLUMN))?;
        let dv_index = find_column(&headers, |header| header.contains(DV_QUESTION));
        if dv_index.is_none() {
            debug!("sign-in log has no domestic violence question column");
        }

        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
        let mut unique_rows = Vec::new();
        let mut summary = VisitSummary::default();

        for row in table::rows(&mut csv_reader) {
            summary.total_rows += 1;
            let (line, record) = match row? {
                Row::Read { line, record } => (line, record),
                Row::Unreadable { line, error } => {
                    warn!(line, %error, "skipping unreadable sign-in row");
                    summary.skipped += 1;
                    continue;
                }
            };

            let name = cell(&record, Some(name_index));
            let time = cell(&record, Some(time_index));
            let (Some(name), Some(time)) = (name, time) else {
                warn!(line, "skipping sign-in without name or time");
                summary.skipped += 1;
                continue;
            };
            let Some(date) = parse_date(time) else {
                warn!(line, time, "skipping unreadable sign-in time");
                summary.skipped += 1;
                continue;
            };

            if !range.contains(date) {
                continue;
            }
            summary.in_window += 1;

            let name = name.to_owned();
            if !seen.insert((name.clone(), date)) {
                summary.duplicates_removed += 1;
                continue;
            }

            let answered_no = cell(&record, dv_index)
                .map(|answer| answer.eq_ignore_ascii_case("no"))
                .unwrap_or(false);
            if answered_no {
                summary.non_dv_names.insert(name);
            }
            unique_rows.push(record);
        }

        summary.unique_entries = unique_rows.len();
        Ok(Self {
            headers,
            unique_rows,
            summary,
        })
    }

    pub fn summary(&self) -> &VisitSummary {
        &self.summary
    }

    pub fn unique_rows(&self) -> &[StringRecord] {
        &self.unique_rows
    }

    /// Writes the source header followed by the de-duplicated rows.
    pub fn write_unique<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.unique_rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatedRowCount {
    pub total_rows: usize,
    pub in_window: usize,
    pub skipped: usize,
}

/// Counts rows whose `column` date falls inside `range`.
pub fn count_dated_rows<R: Read>(
    reader: R,
    column: &str,
    range: &DateRange,
) -> Result<DatedRowCount, TableError> {
    let mut csv_reader = table::reader(reader);
    let wanted = normalize_header(column);
    let headers = table::headers(&mut csv_reader)?;
    let index = find_column(&headers, |header| header == wanted)
        .ok_or_else(|| TableError::missing(column))?;

    let mut count = DatedRowCount::default();
    for row in table::rows(&mut csv_reader) {
        count.total_rows += 1;
        let date = match row? {
            Row::Read { record, .. } => cell(&record, Some(index)).and_then(parse_date),
            Row::Unreadable { .. } => None,
        };

        match date {
            Some(date) if range.contains(date) => count.in_window += 1,
            Some(_) => {}
            None => {
                warn!(row = count.total_rows, column, "skipping row without a readable date");
                count.skipped += 1;
            }
        }
    }

    Ok(count)
}
