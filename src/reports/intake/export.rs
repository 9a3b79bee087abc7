use super::ClientStay;
use crate::reports::occupancy::OccupancyReport;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct AnnotatedRow<'a> {
    program_name: &'a str,
    bed_name: &'a str,
    full_name: &'a str,
    category: String,
    entry_date: NaiveDate,
    exit_date: Option<NaiveDate>,
    occupancy_duration: i64,
}

#[derive(Debug, Serialize)]
struct PersonRow<'a> {
    full_name: &'a str,
    category: String,
    age: Option<u32>,
    gender: &'a str,
    bed_name: &'a str,
    program_name: &'a str,
    entry_date: NaiveDate,
    exit_date: Option<NaiveDate>,
}

/// Writes every stay with the nights it contributed to `report`.
/// `stays` must be the sequence the report was computed from.
pub fn write_annotated<W: Write>(
    writer: W,
    stays: &[ClientStay],
    report: &OccupancyReport,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for (index, client) in stays.iter().enumerate() {
        csv_writer.serialize(AnnotatedRow {
            program_name: client.profile.program.as_deref().unwrap_or_default(),
            bed_name: client.stay.unit_label.as_deref().unwrap_or_default(),
            full_name: client.stay.person.as_deref().unwrap_or_default(),
            category: client.stay.category.label(),
            entry_date: client.stay.entry,
            exit_date: client.stay.exit,
            occupancy_duration: report.nights_for(index),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the stays at `indices`, typically one per person served.
pub fn write_people<W: Write>(
    writer: W,
    stays: &[ClientStay],
    indices: &[usize],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for client in indices.iter().filter_map(|index| stays.get(*index)) {
        csv_writer.serialize(PersonRow {
            full_name: client.stay.person.as_deref().unwrap_or_default(),
            category: client.stay.category.label(),
            age: client.profile.age,
            gender: client.profile.gender.as_deref().unwrap_or_default(),
            bed_name: client.stay.unit_label.as_deref().unwrap_or_default(),
            program_name: client.profile.program.as_deref().unwrap_or_default(),
            entry_date: client.stay.entry,
            exit_date: client.stay.exit,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::intake::ClientProfile;
    use crate::reports::occupancy::{
        compute, AccountingMode, Category, DayCounting, ReportingWindow, StayRecord,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn client(stay: StayRecord) -> ClientStay {
        ClientStay {
            stay,
            profile: ClientProfile {
                program: Some("Emergency Shelter".to_string()),
                ..ClientProfile::default()
            },
        }
    }

    #[test]
    fn annotated_export_carries_durations_and_blank_open_exits() {
        let stays = vec![
            client(
                StayRecord::new(date(2024, 1, 1), Some(date(2024, 1, 2)), Category::Adult)
                    .with_unit_label("BH Rm 05-A")
                    .with_person("Jane Doe"),
            ),
            client(StayRecord::new(date(2024, 1, 2), None, Category::Child)),
        ];
        let records: Vec<StayRecord> = stays.iter().map(|c| c.stay.clone()).collect();
        let window = ReportingWindow::new(date(2024, 1, 1), date(2024, 1, 3), 2)
            .expect("valid window");
        let report = compute(
            &records,
            &window,
            &AccountingMode::SummedDuration(DayCounting::Inclusive),
        )
        .expect("computes");

        let mut buffer = Vec::new();
        write_annotated(&mut buffer, &stays, &report).expect("export succeeds");
        let output = String::from_utf8(buffer).expect("utf8 output");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines[0],
            "program_name,bed_name,full_name,category,entry_date,exit_date,occupancy_duration"
        );
        assert_eq!(
            lines[1],
            "Emergency Shelter,BH Rm 05-A,Jane Doe,Adult,2024-01-01,2024-01-02,2"
        );
        assert_eq!(lines[2], "Emergency Shelter,,,Child,2024-01-02,,2");
    }
}
