use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{format_date, format_percentage, money, short_date};
use crate::present::{summary_cards, EVENT_COLUMNS, MEMBER_COLUMNS};
use crate::reports::{GrowthDirection, ReportBundle};

/// Plain-text rendition of the whole report, for pipes and non-terminals.
pub fn format_report(bundle: &ReportBundle, church_name: &str) -> String {
    let mut out = String::new();
    if !church_name.is_empty() {
        out.push_str(&format!("{}\n", church_name.bold()));
    }
    out.push_str(&format!(
        "Tithes report: {}\nCompared with: {}\n\n",
        bundle.windows.current, bundle.windows.previous
    ));
    out.push_str(&format_summary(bundle));
    out.push_str("\n\n");
    out.push_str(&format_members(bundle));
    out.push_str("\n\n");
    out.push_str(&format_events(bundle));
    out.push_str("\n\n");
    out.push_str(&format_trends(bundle));
    out
}

fn colored_growth(growth: f64) -> String {
    let s = format_percentage(growth);
    match GrowthDirection::of(growth) {
        GrowthDirection::Increased => s.green().to_string(),
        GrowthDirection::Decreased => s.red().to_string(),
        GrowthDirection::Unchanged => s,
    }
}

pub fn format_summary(bundle: &ReportBundle) -> String {
    let Some(summary) = &bundle.summary else {
        return "No contributions in this period.".to_string();
    };

    let mut table = Table::new();
    table.set_header(vec!["Metric", "This Period", "Previous", "Change"]);
    for (card, metric) in summary_cards(bundle).into_iter().zip([
        &summary.total_amount,
        &summary.unique_members,
        &summary.unique_events,
        &summary.average,
    ]) {
        table.add_row(vec![
            Cell::new(card.label),
            Cell::new(card.value),
            Cell::new(card.previous),
            Cell::new(colored_growth(metric.growth)),
        ]);
    }

    let insights = bundle.insights();
    let mut lines = vec![table.to_string(), String::new()];
    lines.push(format!(
        "Giving {} ({}) compared with the previous period.",
        insights.direction.verb(),
        format_percentage(insights.amount_growth)
    ));
    if let Some((name, total)) = &insights.top_contributor {
        lines.push(format!("Top contributor: {} ({})", name.bold(), money(*total)));
    }
    if let Some((title, total)) = &insights.top_event {
        lines.push(format!("Top event: {} ({})", title.bold(), money(*total)));
    }
    if bundle.skipped_dates > 0 {
        lines.push(format!(
            "{} contributions with unreadable dates were left out of the trends.",
            bundle.skipped_dates
        ));
    }

    if !bundle.member_types.is_empty() {
        let mut types = Table::new();
        types.set_header(vec!["Member Type", "Total", "Gifts", "% of Total"]);
        for b in &bundle.member_types {
            types.add_row(vec![
                Cell::new(&b.label),
                Cell::new(money(b.total)),
                Cell::new(b.count),
                Cell::new(format!("{:.1}%", bundle.percent_of_total(b.total))),
            ]);
        }
        lines.push(String::new());
        lines.push(types.to_string());
    }
    lines.join("\n")
}

pub fn format_members(bundle: &ReportBundle) -> String {
    if bundle.members.is_empty() {
        return "No member contributions in this period.".to_string();
    }
    let mut table = Table::new();
    let mut header = MEMBER_COLUMNS.to_vec();
    header.push("Status");
    table.set_header(header);
    for m in &bundle.members {
        let status = if m.is_regular() { "Regular".green() } else { "Occasional".yellow() };
        table.add_row(vec![
            Cell::new(m.member.full_name()),
            Cell::new(&m.member.member_type),
            Cell::new(money(m.total)),
            Cell::new(m.count),
            Cell::new(money(m.average)),
            Cell::new(
                m.most_recent
                    .as_ref()
                    .map(|c| format_date(&c.date_paid))
                    .unwrap_or_default(),
            ),
            Cell::new(format!("{:.2}/mo ({})", m.frequency, m.tier().label())),
            Cell::new(status),
        ]);
    }
    format!("{}\n{table}", "Members".bold())
}

pub fn format_events(bundle: &ReportBundle) -> String {
    if bundle.events.is_empty() {
        return "No event contributions in this period.".to_string();
    }
    let mut table = Table::new();
    table.set_header(EVENT_COLUMNS.to_vec());
    for e in &bundle.events {
        table.add_row(vec![
            Cell::new(&e.event.event_type),
            Cell::new(format_date(&e.event.start_date)),
            Cell::new(e.event.location.as_deref().unwrap_or("")),
            Cell::new(money(e.total)),
            Cell::new(e.contributors),
            Cell::new(money(e.average_per_contributor)),
        ]);
    }
    format!("{}\n{table}", "Events".bold())
}

pub fn format_trends(bundle: &ReportBundle) -> String {
    let mut monthly = Table::new();
    monthly.set_header(vec!["Month", "Total", "Gifts", "Average"]);
    for p in &bundle.monthly_trend {
        monthly.add_row(vec![
            Cell::new(&p.label),
            Cell::new(money(p.total)),
            Cell::new(p.count),
            Cell::new(money(p.average)),
        ]);
    }

    let mut weekday = Table::new();
    weekday.set_header(vec!["Weekday", "Total", "Gifts", "Average"]);
    for w in &bundle.weekday {
        weekday.add_row(vec![
            Cell::new(w.name()),
            Cell::new(money(w.total)),
            Cell::new(w.count),
            Cell::new(money(w.average)),
        ]);
    }

    let mut yearly = Table::new();
    yearly.set_header(vec!["Month", "Total", "Gifts"]);
    for p in &bundle.yearly_trend {
        yearly.add_row(vec![Cell::new(&p.label), Cell::new(money(p.total)), Cell::new(p.count)]);
    }

    let mut tiers = Table::new();
    tiers.set_header(vec!["Frequency", "Gifts per Month", "Members"]);
    for (tier, n) in bundle.frequency_distribution() {
        tiers.add_row(vec![Cell::new(tier.label()), Cell::new(tier.threshold()), Cell::new(n)]);
    }

    format!(
        "{}\n{monthly}\n\n{}\n{weekday}\n\n{}\n{yearly}\n\n{}\n{tiers}",
        "Monthly Giving".bold(),
        "Giving by Weekday".bold(),
        format!("Last 12 Months (to {})", short_date(bundle.windows.today)).bold(),
        "Giving Frequency".bold(),
    )
}
