use chrono::{DateTime, Datelike, NaiveDate};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%m-%d-%Y"];

/// Folds header spelling differences: BOM, zero-width and non-breaking
/// characters, repeated whitespace and case.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .replace('\u{a0}', " ");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Trimmed cell contents, `None` when blank.
pub(crate) fn clean_cell(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parses the calendar date of a cell. Any time of day after the date is
/// ignored; RFC 3339 timestamps keep the date as written in their offset.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = clean_cell(value)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(date_part, format)
            .ok()
            .filter(|date| (1900..=2200).contains(&date.year()))
    })
}

/// Ages arrive as `34` or `34.0`; fractional years are truncated.
pub(crate) fn parse_age(value: &str) -> Option<u32> {
    let age = clean_cell(value)?.parse::<f64>().ok()?;
    if age.is_finite() && (0.0..150.0).contains(&age) {
        Some(age.trunc() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn normalize_header_removes_whitespace_and_case() {
        let source = "\u{feff}Bed:  Bed\u{a0}Number ";
        assert_eq!(normalize_header(source), "bed: bed number");
    }

    #[test]
    fn parse_date_supports_export_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("3/5/2024"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("03/05/24"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("3/5/2024 4:15 PM"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("01/02/2024 10:30:00 AM EST"), Some(date(2024, 1, 2)));
        assert_eq!(parse_date("2024-03-05 23:10:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2025-09-24T10:00:00Z"), Some(date(2025, 9, 24)));
        assert_eq!(parse_date("2025-09-24T22:00:00-05:00"), Some(date(2025, 9, 24)));
    }

    #[test]
    fn parse_date_rejects_blank_and_garbage() {
        assert_eq!(parse_date("  "), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("13/45/2024"), None);
    }

    #[test]
    fn parse_age_truncates_and_bounds() {
        assert_eq!(parse_age("34"), Some(34));
        assert_eq!(parse_age("17.9"), Some(17));
        assert_eq!(parse_age(""), None);
        assert_eq!(parse_age("-1"), None);
        assert_eq!(parse_age("unknown"), None);
    }
}
