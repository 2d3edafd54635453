use chrono::{Days, NaiveDate};

use crate::error::{Result, StewardError};
use crate::models::DateRange;
use crate::range::{fetch_inputs, resolve};
use crate::reports::{compute_report, ReportBundle, ReportFilters};
use crate::source::DataSource;

/// The report currently on display. A range change builds a complete new
/// bundle and swaps it in; if the fetch fails the previous bundle stays.
pub struct ReportSession<S: DataSource> {
    source: S,
    filters: ReportFilters,
    today: NaiveDate,
    bundle: ReportBundle,
}

impl<S: DataSource> ReportSession<S> {
    pub fn open(source: S, range: DateRange, filters: ReportFilters, today: NaiveDate) -> Result<Self> {
        let bundle = build(&source, range, &filters, today)?;
        Ok(Self {
            source,
            filters,
            today,
            bundle,
        })
    }

    pub fn bundle(&self) -> &ReportBundle {
        &self.bundle
    }

    pub fn range(&self) -> DateRange {
        self.bundle.windows.current
    }

    pub fn set_range(&mut self, range: DateRange) -> Result<()> {
        let bundle = build(&self.source, range, &self.filters, self.today)?;
        self.bundle = bundle;
        Ok(())
    }

    /// Move the window by its own length; negative steps go back in time.
    pub fn shift(&mut self, steps: i64) -> Result<()> {
        let range = shift_range(self.range(), steps)?;
        self.set_range(range)
    }
}

fn build(source: &dyn DataSource, range: DateRange, filters: &ReportFilters, today: NaiveDate) -> Result<ReportBundle> {
    let windows = resolve(range, today)?;
    let inputs = fetch_inputs(source, windows)?;
    Ok(compute_report(&inputs, filters))
}

pub fn shift_range(range: DateRange, steps: i64) -> Result<DateRange> {
    let days = Days::new((range.len_days() * steps.abs()) as u64);
    let moved = if steps >= 0 {
        range.start.checked_add_days(days).zip(range.end.checked_add_days(days))
    } else {
        range.start.checked_sub_days(days).zip(range.end.checked_sub_days(days))
    };
    let (start, end) = moved.ok_or_else(|| StewardError::InvalidDate(range.to_string()))?;
    DateRange::new(start, end)
}
