//! Flat delimited exports. Fields are written as-is: text containing a comma
//! or newline is not quoted, so such rows will not re-parse cleanly.

use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::error::Result;
use crate::reports::ReportBundle;

pub const MEMBER_SUMMARY_FILE: &str = "member-summary.csv";
pub const EVENT_SUMMARY_FILE: &str = "event-summary.csv";
pub const ALL_TITHES_FILE: &str = "all-tithes.csv";

pub const MEMBER_SUMMARY_HEADER: [&str; 9] = [
    "Member ID",
    "First Name",
    "Last Name",
    "Type",
    "Total Contribution",
    "Contribution Count",
    "Average",
    "Last Contribution",
    "Frequency",
];

pub const EVENT_SUMMARY_HEADER: [&str; 7] = [
    "Event ID",
    "Event Type",
    "Start Date",
    "Location",
    "Total Contribution",
    "Contributors",
    "Average per Contributor",
];

pub const ALL_TITHES_HEADER: [&str; 7] = [
    "ID",
    "Member ID",
    "Member Name",
    "Event ID",
    "Date Paid",
    "Amount",
    "Notes",
];

fn writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(out)
}

fn two_dp(val: f64) -> String {
    format!("{:.2}", if val.is_finite() { val } else { 0.0 })
}

pub fn write_member_summary<W: Write>(bundle: &ReportBundle, out: W) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(MEMBER_SUMMARY_HEADER)?;
    for m in &bundle.members {
        wtr.write_record([
            m.member.id.to_string(),
            m.member.first_name.clone(),
            m.member.last_name.clone(),
            m.member.member_type.clone(),
            two_dp(m.total),
            m.count.to_string(),
            two_dp(m.average),
            m.most_recent
                .as_ref()
                .map(|c| c.date_paid.clone())
                .unwrap_or_default(),
            two_dp(m.frequency),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_event_summary<W: Write>(bundle: &ReportBundle, out: W) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(EVENT_SUMMARY_HEADER)?;
    for e in &bundle.events {
        wtr.write_record([
            e.event.event_id.to_string(),
            e.event.event_type.clone(),
            e.event.start_date.clone(),
            e.event.location.clone().unwrap_or_default(),
            two_dp(e.total),
            e.contributors.to_string(),
            two_dp(e.average_per_contributor),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Every current-period contribution, in fetch order.
pub fn write_all_tithes<W: Write>(bundle: &ReportBundle, out: W) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(ALL_TITHES_HEADER)?;
    for c in &bundle.contributions {
        wtr.write_record([
            c.id.to_string(),
            c.member_id.to_string(),
            bundle.member_name(c.member_id),
            c.event_id.map(|id| id.to_string()).unwrap_or_default(),
            c.date_paid.clone(),
            two_dp(c.amount),
            c.notes.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Which delimited file to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKind {
    MemberSummary,
    EventSummary,
    AllTithes,
}

impl CsvKind {
    pub const ALL: [CsvKind; 3] = [Self::MemberSummary, Self::EventSummary, Self::AllTithes];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::MemberSummary => MEMBER_SUMMARY_FILE,
            Self::EventSummary => EVENT_SUMMARY_FILE,
            Self::AllTithes => ALL_TITHES_FILE,
        }
    }

    pub fn write<W: Write>(&self, bundle: &ReportBundle, out: W) -> Result<()> {
        match self {
            Self::MemberSummary => write_member_summary(bundle, out),
            Self::EventSummary => write_event_summary(bundle, out),
            Self::AllTithes => write_all_tithes(bundle, out),
        }
    }

    pub fn save(&self, bundle: &ReportBundle, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(bundle, std::io::BufWriter::new(file))?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}
