use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{ContributionRecord, EventRecord, MemberRecord};
use crate::range::{first_of_month, months_between, sub_months, ReportInputs, ReportWindows};

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// `all` disables filtering; anything else matches case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(String),
}

impl TypeFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(raw.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(want) => want.eq_ignore_ascii_case(value.trim()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(v) => v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub member_type: TypeFilter,
    pub event_type: TypeFilter,
}

// ---------------------------------------------------------------------------
// Derived structures
// ---------------------------------------------------------------------------

/// `(current - previous) / previous * 100`, or 0 when there is no previous value.
pub fn growth_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub current: f64,
    pub previous: f64,
    pub growth: f64,
}

impl Metric {
    fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            growth: growth_pct(current, previous),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub total_amount: Metric,
    pub unique_members: Metric,
    pub unique_events: Metric,
    pub average: Metric,
    pub contribution_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// First day of the month this point covers.
    pub month: NaiveDate,
    pub label: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayBucket {
    pub weekday: Weekday,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

impl WeekdayBucket {
    pub fn name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBucket {
    pub label: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
    pub member: MemberRecord,
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub most_recent: Option<ContributionRecord>,
    /// Contributions per elapsed month between the first and last gift.
    pub frequency: f64,
    pub contributions: Vec<ContributionRecord>,
}

impl MemberSummary {
    pub fn tier(&self) -> FrequencyTier {
        FrequencyTier::classify(self.frequency)
    }

    pub fn is_regular(&self) -> bool {
        self.frequency >= 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub event: EventRecord,
    pub total: f64,
    pub contributors: usize,
    pub average_per_contributor: f64,
    pub contributions: Vec<ContributionRecord>,
}

/// Giving-regularity tiers, checked top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyTier {
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Occasional,
    OneTime,
}

impl FrequencyTier {
    pub const ALL: [FrequencyTier; 6] = [
        Self::Weekly,
        Self::BiWeekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Occasional,
        Self::OneTime,
    ];

    pub fn classify(frequency: f64) -> Self {
        if frequency >= 4.0 {
            Self::Weekly
        } else if frequency >= 2.0 {
            Self::BiWeekly
        } else if frequency >= 1.0 {
            Self::Monthly
        } else if frequency >= 0.25 {
            Self::Quarterly
        } else if frequency > 0.08 {
            Self::Occasional
        } else {
            Self::OneTime
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::BiWeekly => "Bi-weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Occasional => "Occasional",
            Self::OneTime => "One-time",
        }
    }

    pub fn threshold(&self) -> &'static str {
        match self {
            Self::Weekly => ">= 4 / month",
            Self::BiWeekly => ">= 2 / month",
            Self::Monthly => ">= 1 / month",
            Self::Quarterly => ">= 0.25 / month",
            Self::Occasional => "> 0.08 / month",
            Self::OneTime => "<= 0.08 / month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthDirection {
    Increased,
    Decreased,
    Unchanged,
}

impl GrowthDirection {
    pub fn of(growth: f64) -> Self {
        if growth > 0.0 {
            Self::Increased
        } else if growth < 0.0 {
            Self::Decreased
        } else {
            Self::Unchanged
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Unchanged => "held steady",
        }
    }
}

/// Headline findings for the executive summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub direction: GrowthDirection,
    pub amount_growth: f64,
    pub top_contributor: Option<(String, f64)>,
    pub top_event: Option<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberStats {
    pub contributors: usize,
    pub average_per_member: f64,
    pub regular: usize,
    pub occasional: usize,
    pub average_frequency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventStats {
    pub events_with_giving: usize,
    pub average_per_event: f64,
    pub total_contributors: usize,
}

/// Every derived aggregate for one date range. Rebuilt from scratch on each
/// range change, never patched.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub windows: ReportWindows,
    pub filters: ReportFilters,
    /// `None` when the current period has no contributions.
    pub summary: Option<SummaryMetrics>,
    pub monthly_trend: Vec<TrendPoint>,
    pub weekday: Vec<WeekdayBucket>,
    pub member_types: Vec<TypeBucket>,
    pub yearly_trend: Vec<TrendPoint>,
    pub members: Vec<MemberSummary>,
    pub events: Vec<EventSummary>,
    /// Current-period rows, in fetch order.
    pub contributions: Vec<ContributionRecord>,
    pub member_names: HashMap<i64, String>,
    pub grand_total: f64,
    /// Current-period rows left out of date-based passes.
    pub skipped_dates: usize,
}

impl ReportBundle {
    pub fn top_members(&self, n: usize) -> &[MemberSummary] {
        &self.members[..n.min(self.members.len())]
    }

    pub fn top_events(&self, n: usize) -> &[EventSummary] {
        &self.events[..n.min(self.events.len())]
    }

    pub fn member_name(&self, member_id: i64) -> String {
        self.member_names
            .get(&member_id)
            .cloned()
            .unwrap_or_else(|| format!("Member #{member_id}"))
    }

    pub fn percent_of_total(&self, amount: f64) -> f64 {
        if self.grand_total == 0.0 {
            0.0
        } else {
            amount / self.grand_total * 100.0
        }
    }

    pub fn insights(&self) -> Insights {
        let amount_growth = self
            .summary
            .as_ref()
            .map(|s| s.total_amount.growth)
            .unwrap_or(0.0);
        Insights {
            direction: GrowthDirection::of(amount_growth),
            amount_growth,
            top_contributor: self
                .members
                .first()
                .map(|m| (m.member.full_name(), m.total)),
            top_event: self.events.first().map(|e| (event_title(&e.event), e.total)),
        }
    }

    /// Member counts per tier, in tier order, including empty tiers.
    pub fn frequency_distribution(&self) -> Vec<(FrequencyTier, usize)> {
        FrequencyTier::ALL
            .iter()
            .map(|tier| {
                let n = self.members.iter().filter(|m| m.tier() == *tier).count();
                (*tier, n)
            })
            .collect()
    }

    pub fn member_stats(&self) -> MemberStats {
        let contributors = self.members.len();
        let total: f64 = self.members.iter().map(|m| m.total).sum();
        let regular = self.members.iter().filter(|m| m.is_regular()).count();
        let freq_sum: f64 = self.members.iter().map(|m| m.frequency).sum();
        MemberStats {
            contributors,
            average_per_member: safe_div(total, contributors),
            regular,
            occasional: contributors - regular,
            average_frequency: safe_div(freq_sum, contributors),
        }
    }

    pub fn event_stats(&self) -> EventStats {
        let n = self.events.len();
        let total: f64 = self.events.iter().map(|e| e.total).sum();
        EventStats {
            events_with_giving: n,
            average_per_event: safe_div(total, n),
            total_contributors: self.events.iter().map(|e| e.contributors).sum(),
        }
    }
}

pub fn event_title(event: &EventRecord) -> String {
    format!("{} ({})", event.event_type, event.start_date)
}

fn safe_div(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub fn compute_report(inputs: &ReportInputs, filters: &ReportFilters) -> ReportBundle {
    let current = &inputs.current;

    let mut dated: Vec<(NaiveDate, &ContributionRecord)> = Vec::with_capacity(current.len());
    let mut skipped_dates = 0;
    for c in current {
        match c.paid_on() {
            Some(d) => dated.push((d, c)),
            None => {
                skipped_dates += 1;
                log::warn!("contribution {} has malformed date_paid {:?}; skipped for date-based totals", c.id, c.date_paid);
            }
        }
    }

    let summary = summarize(current, &inputs.previous);
    let grand_total = summary.as_ref().map(|s| s.total_amount.current).unwrap_or(0.0);

    let bundle = ReportBundle {
        windows: inputs.windows,
        filters: filters.clone(),
        summary,
        monthly_trend: monthly_trend(&dated),
        weekday: weekday_distribution(&dated),
        member_types: member_type_distribution(current, &inputs.members),
        yearly_trend: yearly_trend(&inputs.yearly, inputs.windows.today),
        members: member_summaries(current, &inputs.members, &filters.member_type),
        events: event_summaries(current, &inputs.events, &filters.event_type),
        contributions: current.clone(),
        member_names: inputs
            .members
            .iter()
            .map(|m| (m.id, m.full_name()))
            .collect(),
        grand_total,
        skipped_dates,
    };
    log::info!(
        "aggregated {} contributions into {} member and {} event summaries ({} skipped dates)",
        current.len(),
        bundle.members.len(),
        bundle.events.len(),
        skipped_dates
    );
    bundle
}

fn summarize(current: &[ContributionRecord], previous: &[ContributionRecord]) -> Option<SummaryMetrics> {
    if current.is_empty() {
        return None;
    }
    let (cur_total, cur_members, cur_events) = period_totals(current);
    let (prev_total, prev_members, prev_events) = period_totals(previous);
    Some(SummaryMetrics {
        total_amount: Metric::new(cur_total, prev_total),
        unique_members: Metric::new(cur_members as f64, prev_members as f64),
        unique_events: Metric::new(cur_events as f64, prev_events as f64),
        average: Metric::new(
            safe_div(cur_total, current.len()),
            safe_div(prev_total, previous.len()),
        ),
        contribution_count: current.len(),
    })
}

fn period_totals(rows: &[ContributionRecord]) -> (f64, usize, usize) {
    let total = rows.iter().map(|c| c.amount).sum();
    let members: HashSet<i64> = rows.iter().map(|c| c.member_id).collect();
    let events: HashSet<i64> = rows.iter().filter_map(|c| c.event_id).collect();
    (total, members.len(), events.len())
}

fn trend_point(month: NaiveDate, total: f64, count: usize) -> TrendPoint {
    TrendPoint {
        month,
        label: month.format("%b %Y").to_string(),
        total,
        count,
        average: safe_div(total, count),
    }
}

fn monthly_trend(dated: &[(NaiveDate, &ContributionRecord)]) -> Vec<TrendPoint> {
    let mut buckets: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for (date, c) in dated {
        let entry = buckets.entry(first_of_month(*date)).or_insert((0.0, 0));
        entry.0 += c.amount;
        entry.1 += 1;
    }
    let mut months: Vec<_> = buckets.into_iter().collect();
    months.sort_by_key(|(month, _)| *month);
    months
        .into_iter()
        .map(|(month, (total, count))| trend_point(month, total, count))
        .collect()
}

fn weekday_distribution(dated: &[(NaiveDate, &ContributionRecord)]) -> Vec<WeekdayBucket> {
    let mut totals = [(0.0f64, 0usize); 7];
    for (date, c) in dated {
        let slot = &mut totals[date.weekday().num_days_from_sunday() as usize];
        slot.0 += c.amount;
        slot.1 += 1;
    }
    WEEKDAYS
        .iter()
        .zip(totals)
        .map(|(day, (total, count))| WeekdayBucket {
            weekday: *day,
            total,
            count,
            average: safe_div(total, count),
        })
        .collect()
}

fn member_type_distribution(current: &[ContributionRecord], members: &[MemberRecord]) -> Vec<TypeBucket> {
    let types: HashMap<i64, &str> = members.iter().map(|m| (m.id, m.member_type.trim())).collect();
    let mut buckets: Vec<TypeBucket> = Vec::new();
    for c in current {
        let label = match types.get(&c.member_id) {
            Some(t) if !t.is_empty() => *t,
            _ => "Other",
        };
        match buckets.iter_mut().find(|b| b.label == label) {
            Some(b) => {
                b.total += c.amount;
                b.count += 1;
            }
            None => buckets.push(TypeBucket {
                label: label.to_string(),
                total: c.amount,
                count: 1,
            }),
        }
    }
    buckets.sort_by(|a, b| b.total.total_cmp(&a.total));
    buckets
}

/// Always twelve points, oldest first, ending with the month containing `today`.
fn yearly_trend(yearly: &[ContributionRecord], today: NaiveDate) -> Vec<TrendPoint> {
    let this_month = first_of_month(today);
    (0..12u32)
        .rev()
        .map(|i| {
            let month = sub_months(this_month, i).unwrap_or(this_month);
            let (total, count) = yearly
                .iter()
                .filter(|c| c.paid_on().is_some_and(|d| first_of_month(d) == month))
                .fold((0.0, 0), |(t, n), c| (t + c.amount, n + 1));
            trend_point(month, total, count)
        })
        .collect()
}

fn group_by<K: std::hash::Hash + Eq>(
    rows: &[ContributionRecord],
    key: impl Fn(&ContributionRecord) -> Option<K>,
) -> HashMap<K, Vec<ContributionRecord>> {
    let mut groups: HashMap<K, Vec<ContributionRecord>> = HashMap::new();
    for c in rows {
        if let Some(k) = key(c) {
            groups.entry(k).or_default().push(c.clone());
        }
    }
    groups
}

fn member_summaries(
    current: &[ContributionRecord],
    members: &[MemberRecord],
    filter: &TypeFilter,
) -> Vec<MemberSummary> {
    let mut groups = group_by(current, |c| Some(c.member_id));
    let mut out: Vec<MemberSummary> = members
        .iter()
        .filter(|m| filter.matches(&m.member_type))
        .filter_map(|m| {
            let contributions = groups.remove(&m.id)?;
            Some(summarize_member(m, contributions))
        })
        .collect();
    // Stable: equal totals keep member-table order.
    out.sort_by(|a, b| b.total.total_cmp(&a.total));
    out
}

fn summarize_member(member: &MemberRecord, contributions: Vec<ContributionRecord>) -> MemberSummary {
    let count = contributions.len();
    let total: f64 = contributions.iter().map(|c| c.amount).sum();

    let mut first: Option<NaiveDate> = None;
    let mut last: Option<(NaiveDate, &ContributionRecord)> = None;
    for c in &contributions {
        if let Some(d) = c.paid_on() {
            first = Some(first.map_or(d, |f| f.min(d)));
            if last.map_or(true, |(l, _)| d > l) {
                last = Some((d, c));
            }
        }
    }

    let frequency = match (first, last) {
        (Some(f), Some((l, _))) => match months_between(l, f) {
            0 => count as f64,
            months => count as f64 / months as f64,
        },
        _ => count as f64,
    };
    let most_recent = last.map(|(_, c)| c.clone());

    MemberSummary {
        member: member.clone(),
        total,
        count,
        average: safe_div(total, count),
        most_recent,
        frequency,
        contributions,
    }
}

fn event_summaries(
    current: &[ContributionRecord],
    events: &[EventRecord],
    filter: &TypeFilter,
) -> Vec<EventSummary> {
    let mut groups = group_by(current, |c| c.event_id);
    let mut out: Vec<EventSummary> = events
        .iter()
        .filter(|e| filter.matches(&e.event_type))
        .filter_map(|e| {
            let contributions = groups.remove(&e.event_id)?;
            let total: f64 = contributions.iter().map(|c| c.amount).sum();
            let contributors = contributions
                .iter()
                .map(|c| c.member_id)
                .collect::<HashSet<_>>()
                .len();
            Some(EventSummary {
                event: e.clone(),
                total,
                contributors,
                average_per_contributor: safe_div(total, contributors),
                contributions,
            })
        })
        .collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total));
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::DateRange;
    use crate::range::resolve;

    pub(crate) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn tithe(id: i64, member_id: i64, event_id: Option<i64>, date: &str, amount: f64) -> ContributionRecord {
        ContributionRecord {
            id,
            member_id,
            event_id,
            date_paid: date.to_string(),
            amount,
            notes: None,
        }
    }

    pub(crate) fn member(id: i64, first: &str, last: &str, member_type: &str) -> MemberRecord {
        MemberRecord {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            member_type: member_type.to_string(),
        }
    }

    pub(crate) fn event(event_id: i64, event_type: &str, start_date: &str) -> EventRecord {
        EventRecord {
            event_id,
            event_type: event_type.to_string(),
            start_date: start_date.to_string(),
            location: None,
        }
    }

    pub(crate) fn inputs(current: Vec<ContributionRecord>, previous: Vec<ContributionRecord>) -> ReportInputs {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        ReportInputs {
            windows: resolve(range, d(2024, 3, 31)).unwrap(),
            yearly: current.clone(),
            current,
            previous,
            members: vec![
                member(1, "Ruth", "Moab", "Member"),
                member(2, "Boaz", "Bethlehem", "Visitor"),
                member(3, "Naomi", "Ephrath", "Member"),
                member(4, "Orpah", "Moab", ""),
            ],
            events: vec![
                event(10, "Sunday Service", "2024-01-07"),
                event(11, "Harvest Festival", "2024-02-10"),
            ],
        }
    }

    /// A quarter of mixed giving used across tests.
    pub(crate) fn sample_bundle() -> ReportBundle {
        let current = vec![
            tithe(1, 1, Some(10), "2024-01-07", 100.0),
            tithe(2, 2, Some(10), "2024-01-07", 40.0),
            tithe(3, 1, Some(11), "2024-02-10", 120.0),
            tithe(4, 3, Some(11), "2024-02-11", 75.5),
            tithe(5, 1, None, "2024-03-03", 90.0),
            tithe(6, 4, None, "2024-03-05", 20.0),
            tithe(7, 9, None, "2024-03-06", 15.0),
        ];
        let previous = vec![tithe(100, 1, None, "2023-11-05", 200.0)];
        compute_report(&inputs(current, previous), &ReportFilters::default())
    }

    #[test]
    fn test_scenario_totals_without_previous_period() {
        let current = vec![
            tithe(1, 1, None, "2024-01-05", 100.0),
            tithe(2, 2, None, "2024-01-12", 50.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        let s = bundle.summary.unwrap();
        assert_eq!(s.total_amount.current, 150.0);
        assert_eq!(s.unique_members.current, 2.0);
        assert_eq!(s.total_amount.growth, 0.0);
        assert_eq!(s.average.current, 75.0);
    }

    #[test]
    fn test_empty_period_has_no_summary() {
        let bundle = compute_report(&inputs(vec![], vec![]), &ReportFilters::default());
        assert!(bundle.summary.is_none());
        assert!(bundle.monthly_trend.is_empty());
        assert_eq!(bundle.weekday.len(), 7);
        assert_eq!(bundle.yearly_trend.len(), 12);
        assert_eq!(bundle.grand_total, 0.0);
    }

    #[test]
    fn test_growth_policy() {
        assert_eq!(growth_pct(150.0, 0.0), 0.0);
        assert_eq!(growth_pct(150.0, 100.0), 50.0);
        assert_eq!(growth_pct(50.0, 100.0), -50.0);
        assert_eq!(growth_pct(100.0, 100.0), 0.0);

        let bundle = sample_bundle();
        let s = bundle.summary.unwrap();
        assert_eq!(s.total_amount.previous, 200.0);
        let expected = (s.total_amount.current - 200.0) / 200.0 * 100.0;
        assert!((s.total_amount.growth - expected).abs() < 1e-9);
        for m in [s.total_amount, s.unique_members, s.unique_events, s.average] {
            if m.growth == 0.0 {
                assert!(m.previous == 0.0 || m.previous == m.current);
            }
        }
    }

    #[test]
    fn test_monthly_trend_partitions_total_in_calendar_order() {
        let current = vec![
            tithe(1, 1, None, "2024-12-01", 10.0),
            tithe(2, 1, None, "2025-02-01", 20.0),
            tithe(3, 2, None, "2025-01-15", 30.0),
            tithe(4, 2, None, "2024-12-24", 5.0),
        ];
        let bundle = compute_report(&inputs(current.clone(), vec![]), &ReportFilters::default());
        let labels: Vec<&str> = bundle.monthly_trend.iter().map(|p| p.label.as_str()).collect();
        // "Dec 2024" sorts after "Feb 2025" lexically; calendar order must win.
        assert_eq!(labels, vec!["Dec 2024", "Jan 2025", "Feb 2025"]);
        let sum: f64 = bundle.monthly_trend.iter().map(|p| p.total).sum();
        let expected: f64 = current.iter().map(|c| c.amount).sum();
        assert_eq!(sum, expected);
        assert_eq!(bundle.monthly_trend[0].count, 2);
        assert_eq!(bundle.monthly_trend[0].average, 7.5);
    }

    #[test]
    fn test_weekday_buckets_skip_malformed_dates() {
        let current = vec![
            tithe(1, 1, None, "2024-01-07", 100.0), // Sunday
            tithe(2, 2, None, "2024-01-10", 30.0),  // Wednesday
            tithe(3, 2, None, "2024-01-14", 50.0),  // Sunday
            tithe(4, 3, None, "07/01/2024", 999.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        assert_eq!(bundle.skipped_dates, 1);
        assert_eq!(bundle.weekday[0].name(), "Sunday");
        assert_eq!(bundle.weekday[0].total, 150.0);
        assert_eq!(bundle.weekday[0].count, 2);
        assert_eq!(bundle.weekday[0].average, 75.0);
        assert_eq!(bundle.weekday[3].total, 30.0);
        let weekday_sum: f64 = bundle.weekday.iter().map(|w| w.total).sum();
        assert_eq!(weekday_sum, 1179.0 - 999.0);
        // Amount-only totals still include the malformed row.
        assert_eq!(bundle.summary.unwrap().total_amount.current, 1179.0);
        let monthly_sum: f64 = bundle.monthly_trend.iter().map(|p| p.total).sum();
        assert_eq!(monthly_sum, 180.0);
    }

    #[test]
    fn test_member_type_distribution_defaults_to_other() {
        let bundle = sample_bundle();
        let labels: Vec<(&str, f64)> = bundle
            .member_types
            .iter()
            .map(|b| (b.label.as_str(), b.total))
            .collect();
        // Orpah has an empty type and member 9 is unknown: both land in Other.
        assert_eq!(labels, vec![("Member", 385.5), ("Visitor", 40.0), ("Other", 35.0)]);
    }

    #[test]
    fn test_yearly_trend_always_has_twelve_points() {
        let bundle = sample_bundle();
        assert_eq!(bundle.yearly_trend.len(), 12);
        assert_eq!(bundle.yearly_trend[0].month, d(2023, 4, 1));
        assert_eq!(bundle.yearly_trend[11].month, d(2024, 3, 1));
        assert_eq!(bundle.yearly_trend[9].total, 140.0);
        assert_eq!(bundle.yearly_trend[11].count, 3);
    }

    #[test]
    fn test_member_summaries_sorted_descending() {
        let bundle = sample_bundle();
        for pair in bundle.members.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
        let ruth = &bundle.members[0];
        assert_eq!(ruth.member.first_name, "Ruth");
        assert_eq!(ruth.total, 310.0);
        assert_eq!(ruth.count, 3);
        assert_eq!(ruth.most_recent.as_ref().unwrap().id, 5);
        assert_eq!(ruth.contributions.len(), 3);
        // Unknown member 9 has no reference row, so no summary.
        assert_eq!(bundle.members.len(), 4);
    }

    #[test]
    fn test_member_sort_is_stable_for_ties() {
        let current = vec![
            tithe(1, 3, None, "2024-01-07", 50.0),
            tithe(2, 1, None, "2024-01-08", 50.0),
            tithe(3, 2, None, "2024-01-09", 50.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        let ids: Vec<i64> = bundle.members.iter().map(|m| m.member.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_member_type_filter() {
        let filters = ReportFilters {
            member_type: TypeFilter::parse("visitor"),
            ..Default::default()
        };
        let current = vec![
            tithe(1, 1, None, "2024-01-07", 50.0),
            tithe(2, 2, None, "2024-01-08", 20.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &filters);
        assert_eq!(bundle.members.len(), 1);
        assert_eq!(bundle.members[0].member.first_name, "Boaz");
        // The filter narrows member rows only; totals cover the whole period.
        assert_eq!(bundle.grand_total, 70.0);
        assert_eq!(TypeFilter::parse("ALL"), TypeFilter::All);
    }

    #[test]
    fn test_frequency_two_months_apart() {
        let current = vec![
            tithe(1, 1, None, "2024-01-01", 10.0),
            tithe(2, 1, None, "2024-03-01", 10.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        assert_eq!(bundle.members[0].frequency, 1.0);
    }

    #[test]
    fn test_single_contribution_lands_in_monthly_tier() {
        // One gift: frequency falls back to the raw count (1), which meets the
        // ">= 1 / month" threshold rather than "One-time".
        let current = vec![tithe(1, 2, None, "2024-02-04", 25.0)];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        let boaz = &bundle.members[0];
        assert_eq!(boaz.frequency, boaz.count as f64);
        assert_eq!(boaz.tier(), FrequencyTier::Monthly);
    }

    #[test]
    fn test_frequency_tiers() {
        assert_eq!(FrequencyTier::classify(4.0), FrequencyTier::Weekly);
        assert_eq!(FrequencyTier::classify(2.5), FrequencyTier::BiWeekly);
        assert_eq!(FrequencyTier::classify(1.0), FrequencyTier::Monthly);
        assert_eq!(FrequencyTier::classify(0.25), FrequencyTier::Quarterly);
        assert_eq!(FrequencyTier::classify(0.1), FrequencyTier::Occasional);
        assert_eq!(FrequencyTier::classify(0.08), FrequencyTier::OneTime);
        let dist = sample_bundle().frequency_distribution();
        assert_eq!(dist.len(), 6);
        assert_eq!(dist.iter().map(|(_, n)| n).sum::<usize>(), 4);
    }

    #[test]
    fn test_event_summaries_sorted_by_total_not_average() {
        let current = vec![
            tithe(1, 1, Some(11), "2024-02-10", 5.0),
            tithe(2, 1, Some(10), "2024-01-07", 100.0),
            tithe(3, 2, Some(10), "2024-01-07", 100.0),
            tithe(4, 3, Some(10), "2024-01-07", 100.0),
            tithe(5, 1, Some(11), "2024-02-10", 45.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &ReportFilters::default());
        assert_eq!(bundle.events.len(), 2);
        assert_eq!(bundle.events[0].event.event_id, 10);
        assert_eq!(bundle.events[0].total, 300.0);
        assert_eq!(bundle.events[0].contributors, 3);
        assert_eq!(bundle.events[0].average_per_contributor, 100.0);
        assert_eq!(bundle.events[1].total, 50.0);
        assert_eq!(bundle.events[1].contributors, 1);
        assert_eq!(bundle.events[1].average_per_contributor, 50.0);
    }

    #[test]
    fn test_event_type_filter() {
        let filters = ReportFilters {
            event_type: TypeFilter::parse("Harvest Festival"),
            ..Default::default()
        };
        let current = vec![
            tithe(1, 1, Some(10), "2024-01-07", 100.0),
            tithe(2, 1, Some(11), "2024-02-10", 45.0),
        ];
        let bundle = compute_report(&inputs(current, vec![]), &filters);
        assert_eq!(bundle.events.len(), 1);
        assert_eq!(bundle.events[0].event.event_id, 11);
    }

    #[test]
    fn test_top_n_slices_and_insights() {
        let bundle = sample_bundle();
        assert_eq!(bundle.top_members(3).len(), 3);
        assert_eq!(bundle.top_members(20).len(), 4);
        assert_eq!(bundle.top_events(5).len(), 2);
        let insights = bundle.insights();
        assert_eq!(insights.direction, GrowthDirection::Increased);
        assert_eq!(insights.top_contributor, Some(("Ruth Moab".to_string(), 310.0)));
        assert_eq!(
            insights.top_event.as_ref().map(|(name, _)| name.as_str()),
            Some("Harvest Festival (2024-02-10)")
        );
        let pct = bundle.percent_of_total(310.0);
        assert!((pct - 310.0 / 460.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_member_and_event_stats() {
        let bundle = sample_bundle();
        let ms = bundle.member_stats();
        assert_eq!(ms.contributors, 4);
        assert_eq!(ms.regular + ms.occasional, 4);
        let es = bundle.event_stats();
        assert_eq!(es.events_with_giving, 2);
        assert_eq!(es.total_contributors, 4);
        assert_eq!(bundle.member_name(9), "Member #9");
    }
}
