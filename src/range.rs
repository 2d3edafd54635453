use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::{Result, StewardError};
use crate::models::{ContributionRecord, DateRange, EventRecord, MemberRecord};
use crate::source::DataSource;

/// Whole months from `start` to `end`, rounded toward zero. An `end` on the
/// last day of its month counts as completing the month.
pub fn months_between(end: NaiveDate, start: NaiveDate) -> i32 {
    if end < start {
        return -months_between(start, end);
    }
    let mut months =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() && !is_last_day_of_month(end) {
        months -= 1;
    }
    months
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().is_some_and(|next| next.month() != date.month())
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn sub_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| StewardError::InvalidDate(format!("{date} minus {months} months")))
}

/// The three windows one report is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindows {
    pub current: DateRange,
    pub previous: DateRange,
    /// Trailing twelve calendar months ending today, independent of `current`.
    pub yearly: DateRange,
    pub today: NaiveDate,
}

pub fn resolve(current: DateRange, today: NaiveDate) -> Result<ReportWindows> {
    let span = months_between(current.end, current.start);
    let previous = if span > 0 {
        let shift = span as u32;
        DateRange::new(sub_months(current.start, shift)?, sub_months(current.end, shift)?)?
    } else {
        // Within a single month: the equal-length run of days just before it.
        let len = current.len_days() as u64;
        let start = current
            .start
            .checked_sub_days(Days::new(len))
            .ok_or_else(|| StewardError::InvalidDate(current.start.to_string()))?;
        let end = current
            .start
            .pred_opt()
            .ok_or_else(|| StewardError::InvalidDate(current.start.to_string()))?;
        DateRange::new(start, end)?
    };
    let yearly = DateRange::new(first_of_month(sub_months(today, 11)?), today)?;

    log::debug!(
        "windows: current {} / previous {} / yearly {} (span {span} months)",
        current,
        previous,
        yearly
    );
    Ok(ReportWindows {
        current,
        previous,
        yearly,
        today,
    })
}

/// Raw material for one report, fetched as a unit.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub windows: ReportWindows,
    pub current: Vec<ContributionRecord>,
    pub previous: Vec<ContributionRecord>,
    pub yearly: Vec<ContributionRecord>,
    pub members: Vec<MemberRecord>,
    pub events: Vec<EventRecord>,
}

/// Issue all five fetches. They have no ordering dependency, but every one
/// must succeed: any failure yields a single error naming each failed fetch.
pub fn fetch_inputs(source: &dyn DataSource, windows: ReportWindows) -> Result<ReportInputs> {
    let mut failures = Vec::new();

    let current = collect("current period", source.fetch_contributions(&windows.current), &mut failures);
    let previous = collect("comparison period", source.fetch_contributions(&windows.previous), &mut failures);
    let yearly = collect("trailing year", source.fetch_contributions(&windows.yearly), &mut failures);
    let members = collect("members", source.fetch_members(), &mut failures);
    let events = collect("events", source.fetch_events(), &mut failures);

    if !failures.is_empty() {
        return Err(StewardError::Fetch { failures });
    }

    log::info!(
        "fetched {} current, {} previous, {} trailing-year contributions; {} members, {} events",
        current.len(),
        previous.len(),
        yearly.len(),
        members.len(),
        events.len()
    );
    Ok(ReportInputs {
        windows,
        current,
        previous,
        yearly,
        members,
        events,
    })
}

fn collect<T>(label: &str, result: Result<Vec<T>>, failures: &mut Vec<String>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("fetch of {label} failed: {e}");
            failures.push(format!("{label}: {e}"));
            Vec::new()
        }
    }
}
