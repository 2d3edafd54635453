use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::error::Result;
use crate::fmt::{format_k, money};
use crate::present::{
    event_rows, member_rows, summary_cards, DisplayRow, ExpandState, EVENT_COLUMNS, MEMBER_COLUMNS, PALETTE,
};
use crate::reports::ReportBundle;
use crate::session::ReportSession;
use crate::settings::Settings;
use crate::source::DataSource;
use crate::tui::{
    growth_span, palette_color, run_report_view, ReportView, ReportViewAction, ERROR_STYLE, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE, TAB_ACTIVE_STYLE,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Summary,
    Members,
    Events,
    Trends,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Summary, Tab::Members, Tab::Events, Tab::Trends];

    fn title(&self) -> &'static str {
        match self {
            Tab::Summary => "Summary",
            Tab::Members => "Members",
            Tab::Events => "Events",
            Tab::Trends => "Trends",
        }
    }

    fn next(self) -> Tab {
        let i = Tab::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Tab::ALL[(i + 1) % Tab::ALL.len()]
    }
}

pub fn run<S: DataSource>(session: ReportSession<S>, settings: Settings) -> Result<()> {
    let mut view = TithesView::new(session, settings);
    run_report_view(&mut view)
}

pub(crate) struct TithesView<S: DataSource> {
    session: ReportSession<S>,
    settings: Settings,
    tab: Tab,
    expand: ExpandState,
    selected: usize,
    offset: usize,
    visible_count: usize,
    /// Last message for the footer; `true` marks an error.
    status: Option<(String, bool)>,
    /// Set while a PDF is being written; `e` is ignored until it clears.
    generating: bool,
}

impl<S: DataSource> TithesView<S> {
    pub(crate) fn new(session: ReportSession<S>, settings: Settings) -> Self {
        Self {
            session,
            settings,
            tab: Tab::Summary,
            expand: ExpandState::default(),
            selected: 0,
            offset: 0,
            visible_count: 20,
            status: None,
            generating: false,
        }
    }

    fn rows(&self) -> Vec<DisplayRow> {
        let bundle = self.session.bundle();
        match self.tab {
            Tab::Members => member_rows(bundle, &self.expand),
            Tab::Events => event_rows(bundle, &self.expand),
            Tab::Summary | Tab::Trends => Vec::new(),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.selected = 0;
        self.offset = 0;
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1) as usize;
        self.selected = next;
        if next < self.offset {
            self.offset = next;
        } else if next >= self.offset + self.visible_count {
            self.offset = next + 1 - self.visible_count;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(key) = self.rows().get(self.selected).and_then(|r| r.key) else {
            return;
        };
        match self.tab {
            Tab::Members => {
                self.expand.toggle_member(key);
            }
            Tab::Events => {
                self.expand.toggle_event(key);
            }
            Tab::Summary | Tab::Trends => {}
        }
    }

    fn shift_period(&mut self, steps: i64) {
        match self.session.shift(steps) {
            Ok(()) => {
                self.expand.collapse_all();
                self.selected = 0;
                self.offset = 0;
                self.status = None;
            }
            Err(e) => {
                log::warn!("period change failed: {e}");
                self.status = Some((e.to_string(), true));
            }
        }
    }

    #[cfg(feature = "pdf")]
    fn export_pdf(&mut self) {
        if self.generating {
            return;
        }
        self.generating = true;
        let result = crate::cli::export::write_pdf(self.session.bundle(), &self.settings, None);
        self.generating = false;
        self.status = Some(match result {
            Ok(path) => (format!("Wrote {}", path.display()), false),
            Err(e) => (e.to_string(), true),
        });
    }

    #[cfg(not(feature = "pdf"))]
    fn export_pdf(&mut self) {
        self.status = Some(("PDF export requires the 'pdf' feature".into(), true));
    }

    fn draw_summary(&self, frame: &mut Frame, area: Rect) {
        let bundle = self.session.bundle();
        if bundle.summary.is_none() {
            frame.render_widget(Paragraph::new(" No contributions in this period."), area);
            return;
        }
        let [cards_area, insights_area] =
            Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).areas(area);

        let header = Row::new(vec!["Metric", "This Period", "Previous", "Change"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        let growth: Vec<f64> = bundle
            .summary
            .iter()
            .flat_map(|s| [s.total_amount.growth, s.unique_members.growth, s.unique_events.growth, s.average.growth])
            .collect();
        let rows: Vec<Row> = summary_cards(bundle)
            .into_iter()
            .zip(growth)
            .map(|(card, g)| {
                Row::new(vec![
                    Cell::from(card.label),
                    Cell::from(card.value),
                    Cell::from(card.previous),
                    Cell::from(growth_span(g)),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(10),
        ];
        frame.render_widget(Table::new(rows, widths).header(header).column_spacing(2), cards_area);

        let insights = bundle.insights();
        let mut lines = vec![Line::from(vec![
            Span::raw(format!(" Giving {} ", insights.direction.verb())),
            growth_span(insights.amount_growth),
            Span::raw(" compared with the previous period."),
        ])];
        if let Some((name, total)) = &insights.top_contributor {
            lines.push(Line::from(format!(" Top contributor: {name} ({})", money(*total))));
        }
        if let Some((title, total)) = &insights.top_event {
            lines.push(Line::from(format!(" Top event: {title} ({})", money(*total))));
        }
        lines.push(Line::from(""));
        for (i, b) in bundle.member_types.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(" \u{25a0} ", Style::default().fg(palette_color(PALETTE[i % PALETTE.len()]))),
                Span::raw(format!(
                    "{:<12} {:>12}  {:>5.1}%",
                    b.label,
                    money(b.total),
                    bundle.percent_of_total(b.total)
                )),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), insights_area);
    }

    fn draw_rows(&mut self, frame: &mut Frame, area: Rect) {
        let (columns, widths): (&[&str], Vec<Constraint>) = match self.tab {
            Tab::Members => (
                &MEMBER_COLUMNS[..],
                vec![
                    Constraint::Fill(2),
                    Constraint::Length(9),
                    Constraint::Length(12),
                    Constraint::Length(6),
                    Constraint::Length(11),
                    Constraint::Length(13),
                    Constraint::Fill(1),
                ],
            ),
            _ => (
                &EVENT_COLUMNS[..],
                vec![
                    Constraint::Fill(2),
                    Constraint::Length(13),
                    Constraint::Fill(1),
                    Constraint::Length(12),
                    Constraint::Length(12),
                    Constraint::Length(17),
                ],
            ),
        };
        let rows = self.rows();
        if rows.is_empty() {
            frame.render_widget(Paragraph::new(format!(" No {} in this period.", self.tab.title().to_lowercase())), area);
            return;
        }

        let header_overhead = 2u16;
        self.visible_count = (area.height.saturating_sub(header_overhead) as usize).max(1);

        let visible: Vec<Row> = rows
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.visible_count)
            .map(|(i, r)| {
                let row = Row::new(r.cells.iter().map(|c| Cell::from(c.clone())));
                if i == self.selected {
                    row.style(SELECTED_STYLE)
                } else if r.key.is_none() {
                    row.style(FOOTER_STYLE)
                } else {
                    row
                }
            })
            .collect();

        let header = Row::new(columns.iter().map(|c| Cell::from(*c)))
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        frame.render_widget(Table::new(visible, widths).header(header).column_spacing(2), area);
    }

    fn draw_trends(&self, frame: &mut Frame, area: Rect) {
        let bundle = self.session.bundle();
        let [monthly_area, yearly_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let bar_style = Style::default().fg(palette_color(PALETTE[0]));

        let monthly: Vec<(String, f64)> = bundle
            .monthly_trend
            .iter()
            .map(|p| (p.month.format("%b").to_string(), p.total))
            .collect();
        render_bars(frame, monthly_area, "Monthly Giving", &monthly, bar_style);

        let yearly: Vec<(String, f64)> = bundle
            .yearly_trend
            .iter()
            .map(|p| (p.month.format("%b").to_string(), p.total))
            .collect();
        render_bars(frame, yearly_area, "Last 12 Months", &yearly, bar_style);
    }
}

fn render_bars(frame: &mut Frame, area: Rect, title: &str, points: &[(String, f64)], style: Style) {
    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::NONE);
    if points.is_empty() {
        frame.render_widget(Paragraph::new(" No data").block(block), area);
        return;
    }
    let bars: Vec<Bar> = points
        .iter()
        .map(|(label, total)| {
            Bar::default()
                .value(total.max(0.0).round() as u64)
                .text_value(format_k(*total))
                .label(Line::from(label.clone()))
                .style(style)
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn header_line(bundle: &ReportBundle, church: &str) -> String {
    let name = if church.is_empty() { "Tithes & Offerings" } else { church };
    format!(" {name} | {}", bundle.windows.current)
}

impl<S: DataSource> ReportView for TithesView<S> {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, tabs_area, sep_area, content_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(header_line(self.session.bundle(), &self.settings.church_name)).style(HEADER_STYLE),
            header_area,
        );

        let mut tabs = vec![Span::raw(" ")];
        for (i, tab) in Tab::ALL.iter().enumerate() {
            let label = format!(" {} {} ", i + 1, tab.title());
            tabs.push(if *tab == self.tab {
                Span::styled(label, TAB_ACTIVE_STYLE)
            } else {
                Span::raw(label)
            });
            tabs.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(tabs)), tabs_area);

        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        match self.tab {
            Tab::Summary => self.draw_summary(frame, content_area),
            Tab::Members | Tab::Events => self.draw_rows(frame, content_area),
            Tab::Trends => self.draw_trends(frame, content_area),
        }

        let footer = match &self.status {
            Some((msg, true)) => Paragraph::new(format!(" {msg}")).style(ERROR_STYLE),
            Some((msg, false)) => Paragraph::new(format!(" {msg}")).style(FOOTER_STYLE),
            None => Paragraph::new(
                " \u{2190}/\u{2192}=period  Tab/1-4=section  \u{2191}/\u{2193}=select  Enter=expand  e=export PDF  q/Esc=close",
            )
            .style(FOOTER_STYLE),
        };
        frame.render_widget(footer, footer_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportViewAction::Close,
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::Char(c @ '1'..='4') => {
                let i = c as usize - '1' as usize;
                self.switch_tab(Tab::ALL[i]);
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-(self.visible_count as isize)),
            KeyCode::PageDown => self.move_selection(self.visible_count as isize),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Left | KeyCode::Char('h') => self.shift_period(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_period(1),
            KeyCode::Char('e') => self.export_pdf(),
            _ => {}
        }
        ReportViewAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateRange;
    use crate::reports::tests::{d, event, member, tithe};
    use crate::reports::ReportFilters;
    use crate::source::MemorySource;
    use ratatui::{backend::TestBackend, Terminal};

    fn view() -> TithesView<MemorySource> {
        let source = MemorySource {
            contributions: vec![
                tithe(1, 1, Some(10), "2024-03-03", 50.0),
                tithe(2, 1, None, "2024-03-10", 25.0),
                tithe(3, 2, Some(10), "2024-03-03", 40.0),
                tithe(4, 2, None, "2024-02-11", 30.0),
            ],
            members: vec![member(1, "Ruth", "Moab", "Member"), member(2, "Boaz", "Bethlehem", "Visitor")],
            events: vec![event(10, "Communion Service", "2024-03-03")],
            fail: vec![],
        };
        let range = DateRange::new(d(2024, 3, 1), d(2024, 3, 31)).unwrap();
        let session = ReportSession::open(source, range, ReportFilters::default(), d(2024, 3, 31)).unwrap();
        TithesView::new(session, Settings::default())
    }

    fn screen(view: &mut TithesView<MemorySource>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| view.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_tabs_render() {
        let mut v = view();
        assert!(screen(&mut v).contains("Total Giving"));
        v.handle_key(KeyCode::Char('2'));
        assert!(screen(&mut v).contains("Ruth Moab"));
        v.handle_key(KeyCode::Tab);
        assert_eq!(v.tab, Tab::Events);
        assert!(screen(&mut v).contains("Communion Service"));
        v.handle_key(KeyCode::Tab);
        assert!(screen(&mut v).contains("Monthly Giving"));
    }

    #[test]
    fn test_enter_toggles_drill_down() {
        let mut v = view();
        v.handle_key(KeyCode::Char('2'));
        assert_eq!(v.rows().len(), 2);
        v.handle_key(KeyCode::Enter);
        assert_eq!(v.rows().len(), 4);
        // Nested rows can be selected but don't toggle anything.
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Enter);
        assert_eq!(v.rows().len(), 4);
        v.handle_key(KeyCode::Up);
        v.handle_key(KeyCode::Enter);
        assert_eq!(v.rows().len(), 2);
    }

    #[test]
    fn test_period_navigation_recomputes() {
        let mut v = view();
        assert_eq!(v.session.bundle().grand_total, 115.0);
        v.handle_key(KeyCode::Left);
        assert_eq!(v.session.range(), DateRange::new(d(2024, 1, 30), d(2024, 2, 29)).unwrap());
        assert_eq!(v.session.bundle().grand_total, 30.0);
        assert!(v.status.is_none());
    }

    #[test]
    fn test_q_closes() {
        let mut v = view();
        assert!(matches!(v.handle_key(KeyCode::Char('q')), ReportViewAction::Close));
        assert!(matches!(v.handle_key(KeyCode::Char('x')), ReportViewAction::Continue));
    }
}
