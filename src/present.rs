//! Shapes a [`ReportBundle`] into what tables and charts consume: label/value
//! pairs with colors, formatted cells, and drill-down rows.

use std::collections::HashSet;

use crate::fmt::{format_date, format_percentage, money, number};
use crate::reports::{event_title, ReportBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const PALETTE: [Rgb; 8] = [
    Rgb(59, 130, 246),
    Rgb(16, 185, 129),
    Rgb(245, 158, 11),
    Rgb(239, 68, 68),
    Rgb(139, 92, 246),
    Rgb(236, 72, 153),
    Rgb(20, 184, 166),
    Rgb(107, 114, 128),
];

/// Fixed colors for the known member types, palette order for the rest.
pub fn category_color(label: &str, index: usize) -> Rgb {
    match label {
        "Member" => PALETTE[0],
        "Visitor" => PALETTE[1],
        "Other" => PALETTE[7],
        _ => PALETTE[(index + 2) % 6],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

fn series(title: &str, kind: ChartKind, points: impl Iterator<Item = (String, f64)>) -> ChartSeries {
    ChartSeries {
        title: title.to_string(),
        kind,
        points: points
            .enumerate()
            .map(|(i, (label, value))| ChartPoint {
                color: match kind {
                    ChartKind::Pie => category_color(&label, i),
                    _ => PALETTE[0],
                },
                label,
                value,
            })
            .collect(),
    }
}

pub fn monthly_chart(bundle: &ReportBundle) -> ChartSeries {
    series(
        "Monthly Giving",
        ChartKind::Bar,
        bundle.monthly_trend.iter().map(|p| (p.label.clone(), p.total)),
    )
}

pub fn yearly_chart(bundle: &ReportBundle) -> ChartSeries {
    series(
        "Last 12 Months",
        ChartKind::Line,
        bundle
            .yearly_trend
            .iter()
            .map(|p| (p.month.format("%b %y").to_string(), p.total)),
    )
}

pub fn weekday_chart(bundle: &ReportBundle) -> ChartSeries {
    series(
        "Giving by Weekday",
        ChartKind::Bar,
        bundle.weekday.iter().map(|w| (w.name()[..3].to_string(), w.total)),
    )
}

pub fn member_type_chart(bundle: &ReportBundle) -> ChartSeries {
    series(
        "Giving by Member Type",
        ChartKind::Pie,
        bundle.member_types.iter().map(|b| (b.label.clone(), b.total)),
    )
}

pub fn top_members_chart(bundle: &ReportBundle, n: usize) -> ChartSeries {
    series(
        "Top Contributors",
        ChartKind::Bar,
        bundle
            .top_members(n)
            .iter()
            .map(|m| (m.member.full_name(), m.total)),
    )
}

pub fn top_events_chart(bundle: &ReportBundle, n: usize) -> ChartSeries {
    series(
        "Top Events",
        ChartKind::Pie,
        bundle
            .top_events(n)
            .iter()
            .map(|e| (e.event.event_type.clone(), e.total)),
    )
}

// ---------------------------------------------------------------------------
// Summary cards
// ---------------------------------------------------------------------------

pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
    pub previous: String,
    pub growth: String,
}

/// Empty when the period has no contributions.
pub fn summary_cards(bundle: &ReportBundle) -> Vec<SummaryCard> {
    let Some(s) = &bundle.summary else {
        return Vec::new();
    };
    vec![
        SummaryCard {
            label: "Total Giving",
            value: money(s.total_amount.current),
            previous: money(s.total_amount.previous),
            growth: format_percentage(s.total_amount.growth),
        },
        SummaryCard {
            label: "Contributors",
            value: number(s.unique_members.current as usize),
            previous: number(s.unique_members.previous as usize),
            growth: format_percentage(s.unique_members.growth),
        },
        SummaryCard {
            label: "Events",
            value: number(s.unique_events.current as usize),
            previous: number(s.unique_events.previous as usize),
            growth: format_percentage(s.unique_events.growth),
        },
        SummaryCard {
            label: "Average Gift",
            value: money(s.average.current),
            previous: money(s.average.previous),
            growth: format_percentage(s.average.growth),
        },
    ]
}

// ---------------------------------------------------------------------------
// Drill-down
// ---------------------------------------------------------------------------

/// Which member and event rows are expanded. Purely a display concern.
#[derive(Debug, Default, Clone)]
pub struct ExpandState {
    members: HashSet<i64>,
    events: HashSet<i64>,
}

fn toggle(set: &mut HashSet<i64>, id: i64) -> bool {
    if set.remove(&id) {
        false
    } else {
        set.insert(id);
        true
    }
}

impl ExpandState {
    /// Returns the new state for `id`.
    pub fn toggle_member(&mut self, id: i64) -> bool {
        toggle(&mut self.members, id)
    }

    pub fn toggle_event(&mut self, id: i64) -> bool {
        toggle(&mut self.events, id)
    }

    pub fn is_member_expanded(&self, id: i64) -> bool {
        self.members.contains(&id)
    }

    pub fn is_event_expanded(&self, id: i64) -> bool {
        self.events.contains(&id)
    }

    pub fn collapse_all(&mut self) {
        self.members.clear();
        self.events.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    /// Entity id for summary rows; `None` for the nested contribution rows.
    pub key: Option<i64>,
    pub cells: Vec<String>,
}

pub const MEMBER_COLUMNS: [&str; 7] =
    ["Member", "Type", "Total", "Gifts", "Average", "Last Gift", "Frequency"];

pub const EVENT_COLUMNS: [&str; 6] =
    ["Event", "Date", "Location", "Total", "Contributors", "Avg / Contributor"];

fn marker(expanded: bool) -> &'static str {
    if expanded {
        "\u{25be}"
    } else {
        "\u{25b8}"
    }
}

pub fn member_rows(bundle: &ReportBundle, state: &ExpandState) -> Vec<DisplayRow> {
    let mut rows = Vec::new();
    for m in &bundle.members {
        let expanded = state.is_member_expanded(m.member.id);
        let last = m
            .most_recent
            .as_ref()
            .map(|c| format_date(&c.date_paid))
            .unwrap_or_default();
        rows.push(DisplayRow {
            key: Some(m.member.id),
            cells: vec![
                format!("{} {}", marker(expanded), m.member.full_name()),
                m.member.member_type.clone(),
                money(m.total),
                m.count.to_string(),
                money(m.average),
                last,
                format!("{:.2}/mo ({})", m.frequency, m.tier().label()),
            ],
        });
        if expanded {
            for c in &m.contributions {
                let event = c
                    .event_id
                    .and_then(|id| bundle.events.iter().find(|e| e.event.event_id == id))
                    .map(|e| event_title(&e.event))
                    .unwrap_or_default();
                rows.push(DisplayRow {
                    key: None,
                    cells: vec![
                        format!("    {}", format_date(&c.date_paid)),
                        event,
                        money(c.amount),
                        String::new(),
                        String::new(),
                        String::new(),
                        c.notes.clone().unwrap_or_default(),
                    ],
                });
            }
        }
    }
    rows
}

pub fn event_rows(bundle: &ReportBundle, state: &ExpandState) -> Vec<DisplayRow> {
    let mut rows = Vec::new();
    for e in &bundle.events {
        let expanded = state.is_event_expanded(e.event.event_id);
        rows.push(DisplayRow {
            key: Some(e.event.event_id),
            cells: vec![
                format!("{} {}", marker(expanded), e.event.event_type),
                format_date(&e.event.start_date),
                e.event.location.clone().unwrap_or_default(),
                money(e.total),
                e.contributors.to_string(),
                money(e.average_per_contributor),
            ],
        });
        if expanded {
            for c in &e.contributions {
                rows.push(DisplayRow {
                    key: None,
                    cells: vec![
                        format!("    {}", bundle.member_name(c.member_id)),
                        format_date(&c.date_paid),
                        String::new(),
                        money(c.amount),
                        String::new(),
                        c.notes.clone().unwrap_or_default(),
                    ],
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::sample_bundle;

    #[test]
    fn test_charts_follow_bundle() {
        let bundle = sample_bundle();
        let monthly = monthly_chart(&bundle);
        assert_eq!(monthly.kind, ChartKind::Bar);
        assert_eq!(monthly.points.len(), 3);
        assert_eq!(monthly.total(), 460.5);
        assert_eq!(yearly_chart(&bundle).points.len(), 12);
        let weekday = weekday_chart(&bundle);
        assert_eq!(weekday.points[0].label, "Sun");
        assert_eq!(top_members_chart(&bundle, 5).points.len(), 4);
        assert_eq!(top_members_chart(&bundle, 3).max_value(), 310.0);
    }

    #[test]
    fn test_member_type_colors_are_stable() {
        let chart = member_type_chart(&sample_bundle());
        let colors: Vec<(&str, Rgb)> = chart.points.iter().map(|p| (p.label.as_str(), p.color)).collect();
        assert_eq!(
            colors,
            vec![("Member", PALETTE[0]), ("Visitor", PALETTE[1]), ("Other", PALETTE[7])]
        );
    }

    #[test]
    fn test_summary_cards() {
        let cards = summary_cards(&sample_bundle());
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "$460.50");
        assert_eq!(cards[0].previous, "$200.00");
        assert!(cards[0].growth.starts_with("+130."), "got: {}", cards[0].growth);
        assert_eq!(cards[2].growth, "+0.0%");
    }

    #[test]
    fn test_toggle_expands_and_collapses() {
        let mut state = ExpandState::default();
        assert!(state.toggle_member(1));
        assert!(state.is_member_expanded(1));
        assert!(!state.toggle_member(1));
        assert!(!state.is_member_expanded(1));
        state.toggle_event(10);
        state.collapse_all();
        assert!(!state.is_event_expanded(10));
    }

    #[test]
    fn test_member_rows_drill_down() {
        let bundle = sample_bundle();
        let mut state = ExpandState::default();
        let collapsed = member_rows(&bundle, &state);
        assert_eq!(collapsed.len(), 4);
        assert!(collapsed[0].cells[0].ends_with("Ruth Moab"));
        assert_eq!(collapsed[0].cells[2], "$310.00");

        state.toggle_member(1);
        let expanded = member_rows(&bundle, &state);
        assert_eq!(expanded.len(), 7);
        assert_eq!(expanded[1].key, None);
        assert_eq!(expanded[1].cells[0].trim(), "Jan 7, 2024");
        assert_eq!(expanded[1].cells[1], "Sunday Service (2024-01-07)");
        assert_eq!(expanded[4].key, Some(3));
    }

    #[test]
    fn test_event_rows_drill_down() {
        let bundle = sample_bundle();
        let mut state = ExpandState::default();
        state.toggle_event(11);
        let rows = event_rows(&bundle, &state);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].key, Some(11));
        assert_eq!(rows[1].cells[0].trim(), "Ruth Moab");
        assert_eq!(rows[2].cells[0].trim(), "Naomi Ephrath");
    }
}
