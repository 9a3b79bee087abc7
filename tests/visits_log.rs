use chrono::NaiveDate;
use shelter_stats::reports::table::TableError;
use shelter_stats::reports::visits::{count_dated_rows, DateRange, DatedRowCount, SignInLog};
use std::io::Cursor;

const ENVOY_EXPORT: &str = "name,sign_in_time,host,Are you a Domestic Violence survivor?\u{a0}
Maria Lopez,2025-03-18T14:05:00Z,Front desk,No
Maria Lopez,2025-03-18T19:40:00Z,Front desk,No
Maria Lopez,2025-03-19T09:00:00Z,Front desk,No
Dana Kim,03/20/2025 10:30:00 AM,Advocate,Yes
Dana Kim,2025-04-24T10:30:00Z,Advocate,Yes
Chris Wu,,Front desk,No
Pat Lee,2025-03-21 08:15:00,Advocate,no
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn spring() -> DateRange {
    DateRange::new(date(2025, 3, 18), date(2025, 4, 23)).expect("valid range")
}

#[test]
fn sign_in_log_counts_unique_daily_visits() {
    let log = SignInLog::from_reader(Cursor::new(ENVOY_EXPORT), &spring()).expect("log parses");
    let summary = log.summary();

    assert_eq!(summary.total_rows, 7);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.in_window, 5);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.unique_entries, 4);
    assert_eq!(
        summary.non_dv_names.iter().cloned().collect::<Vec<_>>(),
        vec!["Maria Lopez".to_string(), "Pat Lee".to_string()]
    );

    let view = summary.view();
    assert_eq!(view.non_dv_entries, 2);
}

#[test]
fn unique_export_keeps_first_sign_in_of_the_day() {
    let log = SignInLog::from_reader(Cursor::new(ENVOY_EXPORT), &spring()).expect("log parses");

    let mut buffer = Vec::new();
    log.write_unique(&mut buffer).expect("write succeeds");
    let output = String::from_utf8(buffer).expect("utf8 output");
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("name,sign_in_time,host,"));
    assert_eq!(lines[1], "Maria Lopez,2025-03-18T14:05:00Z,Front desk,No");
    assert!(lines[2].contains("2025-03-19"));
}

#[test]
fn log_without_name_column_is_rejected() {
    let error = SignInLog::from_reader(
        Cursor::new("visitor,sign_in_time\nA,2025-03-18\n"),
        &spring(),
    )
    .expect_err("name column required");

    assert!(matches!(error, TableError::MissingColumn { ref column } if column == "name"));
}

#[test]
fn crisis_calls_are_counted_by_assessment_date() {
    let csv = "Caller ID,Assessment Date,Outcome
101,03/18/2025,Referred
102,04/01/2025,Resolved
103,04/23/2025,Referred
104,04/24/2025,Resolved
105,3/17/2025,Resolved
106,,Resolved
";
    let count =
        count_dated_rows(Cursor::new(csv), "assessment  date", &spring()).expect("counts");

    assert_eq!(
        count,
        DatedRowCount {
            total_rows: 6,
            in_window: 3,
            skipped: 1,
        }
    );
}

#[test]
fn missing_date_column_is_reported() {
    let error = count_dated_rows(Cursor::new("Caller ID\n101\n"), "Assessment Date", &spring())
        .expect_err("column required");

    match error {
        TableError::MissingColumn { column } => assert_eq!(column, "Assessment Date"),
        other => panic!("expected missing column, got {other:?}"),
    }
}
