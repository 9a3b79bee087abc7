use serde::Serialize;
use shelter_stats::error::AppError;
use shelter_stats::reports::demographics::{AgeBracket, DemographicBreakdown, DemographicsView};
use shelter_stats::reports::enrollment::{EnrollmentBreakdownView, EnrollmentReport};
use shelter_stats::reports::intake::ImportOutcome;
use shelter_stats::reports::occupancy::views::{
    skip_counts, OccupancySummaryView, ServedSummaryView, SkipCountView,
};
use shelter_stats::reports::occupancy::{
    Facility, OccupancySummary, ReportingWindow, ServedSummary,
};
use shelter_stats::reports::violence::{ViolenceTally, ViolenceTallyView};
use shelter_stats::reports::visits::{DateRange, DatedRowCount, VisitSummary};

#[derive(Debug, Serialize)]
struct OccupancyOutput {
    facility: Facility,
    rows_read: usize,
    rows_rejected: usize,
    rejected: Vec<SkipCountView>,
    #[serde(flatten)]
    summary: OccupancySummaryView,
}

#[derive(Debug, Serialize)]
struct ServedOutput {
    facility: Facility,
    rows_read: usize,
    rows_rejected: usize,
    rejected: Vec<SkipCountView>,
    #[serde(flatten)]
    summary: ServedSummaryView,
}

#[derive(Debug, Serialize)]
struct DemographicsOutput {
    facility: Facility,
    #[serde(flatten)]
    breakdown: DemographicsView,
}

#[derive(Debug, Serialize)]
struct ViolenceFileOutput {
    file: String,
    #[serde(flatten)]
    tally: ViolenceTallyView,
}

#[derive(Debug, Serialize)]
struct ViolenceOutput {
    files: Vec<ViolenceFileOutput>,
    combined: ViolenceTallyView,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Import totals followed by one line per rejection reason.
fn print_rejections(outcome: &ImportOutcome) {
    println!(
        "Rows read: {} ({} rejected at import)",
        outcome.total_rows,
        outcome.rejected.len()
    );
    for rejection in skip_counts(outcome.rejection_counts()) {
        println!("  - {}: {}", rejection.reason_label, rejection.records);
    }
}

pub(crate) fn occupancy(
    facility: Facility,
    unit: &str,
    summary: &OccupancySummary,
    outcome: &ImportOutcome,
    json: bool,
) -> Result<(), AppError> {
    if json {
        return print_json(&OccupancyOutput {
            facility,
            rows_read: outcome.total_rows,
            rows_rejected: outcome.rejected.len(),
            rejected: skip_counts(outcome.rejection_counts()),
            summary: summary.view(),
        });
    }

    let view = summary.view();
    println!("{} {} occupancy", facility.label(), unit.to_lowercase());
    println!(
        "Window: {} -> {} ({} days, {} {}s, {})",
        view.window_start,
        view.window_end,
        view.window_days,
        view.total_units,
        unit.to_lowercase(),
        view.mode
    );
    print_rejections(outcome);

    println!("\nTotals");
    println!("- Available {unit}-nights: {}", view.available_unit_nights);
    println!("- Occupied {unit}-nights: {}", view.occupied_unit_nights);
    if view.stay_nights != view.occupied_unit_nights {
        println!("- Summed stay nights: {}", view.stay_nights);
    }
    println!("- Occupancy: {:.2}%", view.occupancy_percentage);
    println!("- Day counting: {}", view.day_counting.label());

    if !view.category_subtotals.is_empty() {
        println!("\nBy category");
        for subtotal in &view.category_subtotals {
            println!("- {}: {}", subtotal.category_label, subtotal.unit_nights);
        }
    }

    if view.skipped.is_empty() {
        println!("\nExcluded from accounting: none");
    } else {
        println!("\nExcluded from accounting");
        for skip in &view.skipped {
            println!("- {}: {}", skip.reason_label, skip.records);
        }
    }

    if !view.over_capacity_days.is_empty() {
        println!("\nDays above capacity");
        for day in &view.over_capacity_days {
            println!("- {}: {} {}s", day.date, day.units, unit.to_lowercase());
        }
    }

    Ok(())
}

pub(crate) fn served(
    facility: Facility,
    window: &ReportingWindow,
    summary: &ServedSummary,
    outcome: &ImportOutcome,
    json: bool,
) -> Result<(), AppError> {
    let view = summary.view();
    if json {
        return print_json(&ServedOutput {
            facility,
            rows_read: outcome.total_rows,
            rows_rejected: outcome.rejected.len(),
            rejected: skip_counts(outcome.rejection_counts()),
            summary: view,
        });
    }

    println!("{} people served", facility.label());
    println!("Window: {} -> {}", window.start(), window.end());
    print_rejections(outcome);
    println!(
        "Stays matched: {} ({} without a name)",
        view.records_matched, view.records_without_key
    );
    println!("Distinct people: {}", view.distinct_people);

    println!("\nBy category");
    for category in &view.by_category {
        println!("- {}: {}", category.category_label, category.people);
    }

    Ok(())
}

pub(crate) fn demographics(
    facility: Facility,
    range: &DateRange,
    breakdown: &DemographicBreakdown,
    json: bool,
) -> Result<(), AppError> {
    let view = breakdown.view();
    if json {
        return print_json(&DemographicsOutput {
            facility,
            breakdown: view,
        });
    }

    println!("{} demographics", facility.label());
    println!("Window: {} -> {}", range.start(), range.end());
    println!(
        "People: {} ({} adults, {} children, {} unknown age)",
        view.total_records, view.adults, view.children, view.unknown_age_group
    );

    println!("\nAge");
    for bracket in AgeBracket::ordered() {
        println!(
            "- {}: {} ({:.2}%)",
            bracket.label(),
            breakdown.bracket_count(bracket),
            breakdown.bracket_percentage(bracket)
        );
    }

    println!("\nGender");
    for gender in &view.genders {
        println!("- {}: {} ({:.2}%)", gender.label, gender.count, gender.percentage);
    }

    println!("\nEthnicity");
    for ethnicity in &view.ethnicities {
        println!(
            "- {}: {} ({:.2}%)",
            ethnicity.label, ethnicity.count, ethnicity.percentage
        );
    }

    match view.average_adult_stay_days {
        Some(days) => println!(
            "\nAverage adult stay: {days:.1} days (capped at {})",
            view.stay_cap_days
        ),
        None => println!("\nAverage adult stay: no completed adult stays"),
    }

    Ok(())
}

pub(crate) fn visits(range: &DateRange, summary: &VisitSummary, json: bool) -> Result<(), AppError> {
    let view = summary.view();
    if json {
        return print_json(&view);
    }

    println!("Visitor sign-ins {} -> {}", range.start(), range.end());
    println!("- Rows in file: {}", view.total_rows);
    println!("- Rows in window: {}", view.in_window);
    println!("- Same-day duplicates removed: {}", view.duplicates_removed);
    println!("- Unique sign-ins: {}", view.unique_entries);
    println!("- Answered no to the DV question: {}", view.non_dv_entries);
    if view.skipped > 0 {
        println!("- Skipped (missing name or time, or unreadable): {}", view.skipped);
    }

    Ok(())
}

pub(crate) fn calls(
    range: &DateRange,
    column: &str,
    count: &DatedRowCount,
    json: bool,
) -> Result<(), AppError> {
    if json {
        return print_json(count);
    }

    println!("Rows dated {} -> {} by '{column}'", range.start(), range.end());
    println!("- In window: {}", count.in_window);
    println!("- Rows in file: {}", count.total_rows);
    if count.skipped > 0 {
        println!("- Skipped (unreadable date): {}", count.skipped);
    }

    Ok(())
}

pub(crate) fn violence(
    files: &[(String, ViolenceTally)],
    combined: &ViolenceTally,
    json: bool,
) -> Result<(), AppError> {
    if json {
        return print_json(&ViolenceOutput {
            files: files
                .iter()
                .map(|(file, tally)| ViolenceFileOutput {
                    file: file.clone(),
                    tally: tally.view(),
                })
                .collect(),
            combined: combined.view(),
        });
    }

    for (file, tally) in files {
        println!("History of violence: {file}");
        print_violence(&tally.view());
        println!();
    }
    if files.len() > 1 {
        println!("History of violence: all files");
        print_violence(&combined.view());
    }

    Ok(())
}

fn print_violence(view: &ViolenceTallyView) {
    println!(
        "Rows: {} ({} with a history recorded)",
        view.rows_read, view.rows_with_history
    );
    for kind in &view.types {
        println!("- {}: {}", kind.label, kind.count);
    }
    println!("Total: {}", view.total);
    for (selection, count) in &view.unrecognized {
        println!("- not counted, '{selection}': {count}");
    }
    if view.unreadable_rows > 0 {
        println!("Unreadable rows: {}", view.unreadable_rows);
    }
}

pub(crate) fn enrollment(report: &EnrollmentReport, json: bool) -> Result<(), AppError> {
    let view = report.view();
    if json {
        return print_json(&view);
    }

    println!("New enrollments: all houses");
    print_enrollment(&view.all);
    for house in &view.houses {
        println!("\nNew enrollments: {}", house.label);
        print_enrollment(&house.breakdown);
    }
    if view.unassigned > 0 {
        println!("\nWithout a house in the bed assignment: {}", view.unassigned);
    }
    if view.unreadable_rows > 0 {
        println!("Unreadable rows: {}", view.unreadable_rows);
    }

    Ok(())
}

fn print_enrollment(view: &EnrollmentBreakdownView) {
    println!("Total: {}", view.total);

    println!("Ages");
    for group in &view.age_groups {
        println!("- {}: {}", group.label, group.count);
    }
    if view.unknown_age > 0 {
        println!("- unknown: {}", view.unknown_age);
    }

    println!("Ethnicity");
    for ethnicity in &view.ethnicities {
        println!("- {}: {}", ethnicity.label, ethnicity.count);
    }

    println!("Gender");
    for gender in &view.genders {
        println!("- {}: {}", gender.label, gender.count);
    }
}
