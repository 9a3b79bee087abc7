use crate::render;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shelter_stats::config::AppConfig;
use shelter_stats::error::AppError;
use shelter_stats::reports::demographics::DemographicBreakdown;
use shelter_stats::reports::enrollment::EnrollmentReport;
use shelter_stats::reports::intake::export::{write_annotated, write_people};
use shelter_stats::reports::intake::{
    CategorySource, ColumnMapping, Field, ImportOutcome, StayImporter,
};
use shelter_stats::reports::occupancy::{
    compute, first_stay_per_person, people_served, person_key, AccountingMode, Category,
    DayCounting, Facility, ReportingWindow, WindowFilter,
};
use shelter_stats::reports::violence::ViolenceTally;
use shelter_stats::reports::visits::{count_dated_rows, DateRange, SignInLog};
use shelter_stats::telemetry;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "shelter-stats",
    about = "Occupancy, people-served and visitor statistics from shelter CSV exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bed-night occupancy from summed stay durations
    Beds(BedsArgs),
    /// Room occupancy by distinct rooms occupied per day
    Rooms(RoomsArgs),
    /// Distinct people served per category
    Served(ServedArgs),
    /// Age, gender and ethnicity breakdown of people served
    Demographics(DemographicsArgs),
    /// De-duplicate a visitor sign-in log
    Visits(VisitsArgs),
    /// Count dated rows, e.g. crisis-line calls
    Calls(CallsArgs),
    /// Tally the History of Violence selections
    Violence(ViolenceArgs),
    /// New enrollments by age group, ethnicity and gender per house
    Enrollment(EnrollmentArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FacilityArg {
    Brennen,
    Rosalie,
}

impl From<FacilityArg> for Facility {
    fn from(value: FacilityArg) -> Self {
        match value {
            FacilityArg::Brennen => Facility::BrennenHouse,
            FacilityArg::Rosalie => Facility::RosalieHouse,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DayCountingArg {
    /// The exit day counts as an occupied night
    Inclusive,
    /// The exit day is not counted
    Exclusive,
}

impl From<DayCountingArg> for DayCounting {
    fn from(value: DayCountingArg) -> Self {
        match value {
            DayCountingArg::Inclusive => DayCounting::Inclusive,
            DayCountingArg::Exclusive => DayCounting::Exclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    /// Stay intersects the window
    Overlaps,
    /// Entry or exit date falls inside the window
    EntryOrExit,
}

impl From<FilterArg> for WindowFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Overlaps => WindowFilter::Overlaps,
            FilterArg::EntryOrExit => WindowFilter::EntryOrExitWithin,
        }
    }
}

#[derive(Args, Debug)]
struct StayInputArgs {
    /// House the report covers
    #[arg(long, value_enum)]
    facility: FacilityArg,
    /// First day of the reporting window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    /// Last day of the reporting window, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    /// Stay export classified by its age column; for rooms a blank age
    /// counts as adult
    #[arg(long, required_unless_present_any = ["adults", "children"])]
    input: Vec<PathBuf>,
    /// Stay export whose rows are all adults
    #[arg(long)]
    adults: Vec<PathBuf>,
    /// Stay export whose rows are all children
    #[arg(long)]
    children: Vec<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BedsArgs {
    #[command(flatten)]
    stays: StayInputArgs,
    /// Whether the exit day counts as an occupied night
    #[arg(long, value_enum)]
    day_counting: DayCountingArg,
    /// Override the configured bed count
    #[arg(long)]
    beds: Option<u32>,
    /// Write each stay with its bed-nights to this CSV
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RoomsArgs {
    #[command(flatten)]
    stays: StayInputArgs,
    /// Override the configured room count
    #[arg(long)]
    rooms: Option<u32>,
    /// Write each stay with its occupied days to this CSV
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServedArgs {
    #[command(flatten)]
    stays: StayInputArgs,
    /// Which stays count as served during the window
    #[arg(long, value_enum, default_value = "overlaps")]
    filter: FilterArg,
    /// Write one row per person served to this CSV
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DemographicsArgs {
    #[command(flatten)]
    stays: StayInputArgs,
    /// Which stays count as served during the window
    #[arg(long, value_enum, default_value = "overlaps")]
    filter: FilterArg,
    /// Longest stay, in days, counted toward the adult average
    #[arg(long, default_value_t = 90)]
    stay_cap_days: i64,
}

#[derive(Args, Debug)]
struct VisitsArgs {
    /// Visitor sign-in export
    #[arg(long)]
    input: PathBuf,
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    /// Write the de-duplicated sign-ins to this CSV
    #[arg(long)]
    export: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CallsArgs {
    /// Call log export
    #[arg(long)]
    input: PathBuf,
    /// Header of the date column
    #[arg(long, default_value = "Assessment Date")]
    column: String,
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ViolenceArgs {
    /// History of Violence export; repeat to tally several houses
    #[arg(long, required = true)]
    input: Vec<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct EnrollmentArgs {
    /// New-enrollment export with bed assignments
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    json: bool,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(log_level = %config.telemetry.log_level, "configuration loaded");

    match cli.command {
        Command::Beds(args) => run_beds(&config, args),
        Command::Rooms(args) => run_rooms(&config, args),
        Command::Served(args) => run_served(&config, args),
        Command::Demographics(args) => run_demographics(args),
        Command::Visits(args) => run_visits(args),
        Command::Calls(args) => run_calls(args),
        Command::Violence(args) => run_violence(args),
        Command::Enrollment(args) => run_enrollment(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn run_beds(config: &AppConfig, args: BedsArgs) -> Result<(), AppError> {
    let facility = Facility::from(args.stays.facility);
    let beds = args
        .beds
        .unwrap_or(config.capacity.for_facility(facility).beds);
    let window = ReportingWindow::new(args.stays.start, args.stays.end, beds)?;
    let outcome = load_stays(&args.stays, CategorySource::Age, &[])?;

    let mode = AccountingMode::SummedDuration(args.day_counting.into());
    let report = compute(&outcome.stay_records(), &window, &mode)?;
    info!(
        facility = facility.label(),
        occupied = report.summary.occupied_unit_nights,
        "bed occupancy computed"
    );

    if let Some(path) = &args.export {
        write_annotated(File::create(path)?, &outcome.stays, &report)?;
        info!(path = %path.display(), "annotated stays written");
    }

    render::occupancy(facility, "Bed", &report.summary, &outcome, args.stays.json)
}

fn run_rooms(config: &AppConfig, args: RoomsArgs) -> Result<(), AppError> {
    let facility = Facility::from(args.stays.facility);
    let rooms = args
        .rooms
        .unwrap_or(config.capacity.for_facility(facility).rooms);
    let window = ReportingWindow::new(args.stays.start, args.stays.end, rooms)?;
    // Only the bed label matters here; a blank age must not drop the stay.
    let mut outcome = load_stays(
        &args.stays,
        CategorySource::AgeWhenKnown(Category::Adult),
        &[Field::UnitLabel],
    )?;

    // Shared exports can carry the other house's beds.
    outcome.stays.retain(|client| {
        client
            .stay
            .unit_label
            .as_deref()
            .and_then(Facility::from_label)
            .map_or(true, |house| house == facility)
    });

    let mode = AccountingMode::DistinctUnitPerDay(facility.room_rule());
    let report = compute(&outcome.stay_records(), &window, &mode)?;
    info!(
        facility = facility.label(),
        occupied = report.summary.occupied_unit_nights,
        "room occupancy computed"
    );

    if let Some(path) = &args.export {
        write_annotated(File::create(path)?, &outcome.stays, &report)?;
        info!(path = %path.display(), "annotated stays written");
    }

    render::occupancy(facility, "Room", &report.summary, &outcome, args.stays.json)
}

fn run_served(config: &AppConfig, args: ServedArgs) -> Result<(), AppError> {
    let facility = Facility::from(args.stays.facility);
    let window = ReportingWindow::new(
        args.stays.start,
        args.stays.end,
        config.capacity.for_facility(facility).beds,
    )?;
    let outcome = load_stays(&args.stays, CategorySource::Age, &[Field::FullName])?;
    let records = outcome.stay_records();
    let filter = WindowFilter::from(args.filter);

    let summary = people_served(&records, &window, filter, person_key);

    if let Some(path) = &args.export {
        let first_stays = first_stay_per_person(&records, &window, filter, person_key);
        write_people(File::create(path)?, &outcome.stays, &first_stays)?;
        info!(path = %path.display(), people = first_stays.len(), "people served written");
    }

    render::served(facility, &window, &summary, &outcome, args.stays.json)
}

fn run_demographics(args: DemographicsArgs) -> Result<(), AppError> {
    let facility = Facility::from(args.stays.facility);
    let range = DateRange::new(args.stays.start, args.stays.end)?;
    // Capacity plays no part in the breakdown.
    let window = ReportingWindow::new(range.start(), range.end(), 1)?;
    let outcome = load_stays(&args.stays, CategorySource::Age, &[Field::FullName])?;
    let records = outcome.stay_records();

    let people: Vec<_> =
        first_stay_per_person(&records, &window, args.filter.into(), person_key)
            .into_iter()
            .filter_map(|index| outcome.stays.get(index).cloned())
            .collect();
    let breakdown = DemographicBreakdown::from_stays(&people, args.stay_cap_days);

    render::demographics(facility, &range, &breakdown, args.stays.json)
}

fn run_visits(args: VisitsArgs) -> Result<(), AppError> {
    let range = DateRange::new(args.start, args.end)?;
    let log = SignInLog::from_reader(open(&args.input)?, &range)?;

    if let Some(path) = &args.export {
        log.write_unique(File::create(path)?)?;
        info!(path = %path.display(), rows = log.unique_rows().len(), "unique sign-ins written");
    }

    render::visits(&range, log.summary(), args.json)
}

fn run_calls(args: CallsArgs) -> Result<(), AppError> {
    let range = DateRange::new(args.start, args.end)?;
    let count = count_dated_rows(open(&args.input)?, &args.column, &range)?;
    render::calls(&range, &args.column, &count, args.json)
}

fn run_violence(args: ViolenceArgs) -> Result<(), AppError> {
    let mut files = Vec::with_capacity(args.input.len());
    let mut combined = ViolenceTally::default();
    for path in &args.input {
        let tally = ViolenceTally::from_path(path)?;
        combined.merge(&tally);
        files.push((path.display().to_string(), tally));
    }
    info!(files = files.len(), total = combined.total, "violence history tallied");

    render::violence(&files, &combined, args.json)
}

fn run_enrollment(args: EnrollmentArgs) -> Result<(), AppError> {
    let report = EnrollmentReport::from_path(&args.input)?;
    info!(
        enrollments = report.all.total,
        unassigned = report.unassigned,
        "enrollments counted"
    );
    render::enrollment(&report, args.json)
}

fn open(path: &Path) -> Result<File, AppError> {
    debug!(path = %path.display(), "opening input");
    Ok(File::open(path)?)
}

/// Imports every stay file named on the command line into one outcome.
/// `--input` files are classified by `input_source`.
fn load_stays(
    args: &StayInputArgs,
    input_source: CategorySource,
    extra: &[Field],
) -> Result<ImportOutcome, AppError> {
    let sources = args
        .input
        .iter()
        .map(|path| (path, input_source.clone()))
        .chain(
            args.adults
                .iter()
                .map(|path| (path, CategorySource::Fixed(Category::Adult))),
        )
        .chain(
            args.children
                .iter()
                .map(|path| (path, CategorySource::Fixed(Category::Child))),
        );

    let mut outcome = ImportOutcome::default();
    let mut files = 0_usize;
    for (path, source) in sources {
        let importer = extra
            .iter()
            .fold(StayImporter::new(ColumnMapping::standard(), source), |importer, field| {
                importer.require(*field)
            });
        outcome.merge(importer.from_path(path)?);
        files += 1;
    }

    info!(
        files,
        rows = outcome.total_rows,
        rejected = outcome.rejected.len(),
        "stay exports imported"
    );
    Ok(outcome)
}
