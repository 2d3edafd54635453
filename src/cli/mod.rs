pub mod demo;
pub mod export;
pub mod init;
pub mod report;
pub mod status;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::db::get_connection;
use crate::error::{Result, StewardError};
use crate::models::DateRange;
use crate::reports::{ReportFilters, TypeFilter};
use crate::session::ReportSession;
use crate::settings::Settings;
use crate::source::SqliteSource;

#[derive(Parser)]
#[command(name = "steward", about = "Tithes and offerings reporting for church membership records.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Steward: choose a data directory and initialize the database.
    Init {
        /// Path for Steward data (default: ~/Documents/steward)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Church name shown on report headers
        #[arg(long)]
        church: Option<String>,
        /// Name of the member/visitor table
        #[arg(long = "member-table")]
        member_table: Option<String>,
        /// Name printed as the report's preparer
        #[arg(long)]
        user: Option<String>,
    },
    /// Load sample members, events and 18 months of giving.
    Demo,
    /// Show current settings and row counts.
    Status,
    /// Show the tithes report for a date range.
    Report {
        #[command(flatten)]
        range: RangeArgs,
        /// view: interactive; text: plain tables (default: view on a terminal)
        #[arg(long, value_enum)]
        mode: Option<ReportMode>,
    },
    /// Export the report as PDF or CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportMode {
    View,
    Text,
}

/// Date range and type filters shared by `report` and `export`.
#[derive(Args, Clone, Debug, Default)]
pub struct RangeArgs {
    /// Start date: YYYY-MM-DD (requires --to)
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// End date: YYYY-MM-DD (requires --from)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
    /// Member type to list: all, Member, Visitor, ...
    #[arg(long = "type", default_value = "all")]
    pub member_type: String,
    /// Event type to list, or all
    #[arg(long, default_value = "all")]
    pub event: String,
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Full printable report (tithes-report-<date>.pdf).
    #[cfg(feature = "pdf")]
    Pdf {
        #[command(flatten)]
        range: RangeArgs,
        /// Output path
        #[arg(long)]
        output: Option<String>,
    },
    /// Member summary (member-summary.csv).
    Members {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        output: Option<String>,
    },
    /// Event summary (event-summary.csv).
    Events {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        output: Option<String>,
    },
    /// Every contribution in the range (all-tithes.csv).
    Tithes {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        output: Option<String>,
    },
    /// Every export into one directory.
    All {
        #[command(flatten)]
        range: RangeArgs,
        /// Output directory (default: <data_dir>/exports)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// January 1 of `today`'s year through `today`.
pub fn year_to_date(today: NaiveDate) -> Result<DateRange> {
    let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
        .ok_or_else(|| StewardError::InvalidDate(today.to_string()))?;
    DateRange::new(start, today)
}

impl RangeArgs {
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => DateRange::parse(from, to),
            (None, None) => year_to_date(today),
            _ => Err(StewardError::Other("--from and --to must be given together".into())),
        }
    }

    pub fn filters(&self) -> ReportFilters {
        ReportFilters {
            member_type: TypeFilter::parse(&self.member_type),
            event_type: TypeFilter::parse(&self.event),
        }
    }
}

/// Open the configured database and compute the first report.
pub(crate) fn open_session(settings: &Settings, args: &RangeArgs) -> Result<ReportSession<SqliteSource>> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(StewardError::Settings(format!(
            "no database at {}. Run `steward init` first.",
            db_path.display()
        )));
    }
    let today = today();
    let range = args.date_range(today)?;
    let conn = get_connection(&db_path)?;
    let source = SqliteSource::new(conn, &settings.member_table_name)?;
    ReportSession::open(source, range, args.filters(), today)
}
