use std::fs;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Polygon,
};
use printpdf::path::{PaintMode, WindingOrder};

use crate::chart::{ChartCapture, ChartSnapshot, Shape, SNAPSHOT_H};
use crate::error::{Result, StewardError};
use crate::fmt::{format_date, format_percentage, money, number, short_date};
use crate::present::{self, Rgb};
use crate::reports::{GrowthDirection, ReportBundle};

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const CONTENT_W: f32 = PAGE_W - MARGIN_LEFT - MARGIN_RIGHT;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 11.0;
const WRAP_CHARS: usize = 95;

const BLACK: Rgb = Rgb(0, 0, 0);
const WHITE: Rgb = Rgb(255, 255, 255);
const NAVY: Rgb = Rgb(30, 58, 138);
const CARD_BG: Rgb = Rgb(239, 246, 255);

pub fn report_file_name(date: NaiveDate) -> String {
    format!("tithes-report-{}.pdf", date.format("%Y-%m-%d"))
}

/// Who the document is for and when it was produced.
pub struct DocumentInfo<'a> {
    pub church_name: &'a str,
    pub prepared_by: &'a str,
    pub generated: NaiveDate,
}

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

const fn left(width: f32) -> Col {
    Col { width, align: Align::Left }
}

const fn right(width: f32) -> Col {
    Col { width, align: Align::Right }
}

fn pdf_color(c: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

fn filled(points: Vec<(f32, f32)>) -> Polygon {
    Polygon {
        rings: vec![points
            .into_iter()
            .map(|(x, y)| (Point::new(Mm(x), Mm(y)), false))
            .collect()],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    }
}

/// Lays content out top-down; every page stays addressable so the table of
/// contents and page footers can be stamped once the page count is known.
struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
    toc: Vec<(String, usize)>,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| StewardError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| StewardError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            pages: vec![(page, layer)],
            y: MARGIN_TOP,
            toc: Vec::new(),
        })
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn layer_at(&self, index: usize) -> PdfLayerReference {
        let (page, layer) = self.pages[index];
        self.doc.get_page(page).get_layer(layer)
    }

    fn layer(&self) -> PdfLayerReference {
        self.layer_at(self.pages.len() - 1)
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.pages.push((page, layer));
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.font_bold
        } else {
            &self.font
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        self.layer().use_text(s, size, Mm(x), Mm(self.pdf_y()), self.font(bold));
    }

    fn text_right(&self, s: &str, right_edge: f32, size: f32, bold: bool) {
        self.text(s, right_edge - approx_text_width(s, size), size, bold);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self.layer();
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    /// Filled box with its top edge at `top`, measured from the page top.
    fn fill_rect(&self, x: f32, top: f32, w: f32, h: f32, color: Rgb) {
        let layer = self.layer();
        layer.set_fill_color(pdf_color(color));
        let (y1, y0) = (PAGE_H - top, PAGE_H - top - h);
        layer.add_polygon(filled(vec![(x, y1), (x + w, y1), (x + w, y0), (x, y0)]));
        layer.set_fill_color(pdf_color(BLACK));
    }

    /// Starts a new page and records it in the table of contents.
    fn section(&mut self, title: &str) {
        self.new_page();
        self.toc.push((title.to_string(), self.page_count()));
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 4.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 8.0;
    }

    fn section_label(&mut self, label: &str) {
        self.ensure_space(ROW_H * 3.0);
        self.text(label, MARGIN_LEFT, SUBTITLE_SIZE, true);
        self.y += ROW_H + 1.0;
    }

    fn paragraph(&mut self, text: &str) {
        for line in textwrap::wrap(text, WRAP_CHARS) {
            self.ensure_space(ROW_H);
            self.text(&line, MARGIN_LEFT, FONT_SIZE, false);
            self.y += ROW_H;
        }
        self.y += 2.0;
    }

    fn blank_row(&mut self) {
        self.y += ROW_H;
    }

    fn cells(&self, cols: &[Col], values: &[&str], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            match col.align {
                Align::Left => self.text(value, x, FONT_SIZE, bold),
                Align::Right => self.text_right(value, x + col.width, FONT_SIZE, bold),
            }
            x += col.width;
        }
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 3.0);
        self.cells(cols, headers, true);
        self.y += 1.5;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += ROW_H;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        self.ensure_space(ROW_H);
        self.cells(cols, values, bold);
        self.y += ROW_H;
    }

    fn table(&mut self, cols: &[Col], headers: &[&str], rows: &[Vec<String>]) {
        self.table_header(cols, headers);
        for row in rows {
            let values: Vec<&str> = row.iter().map(String::as_str).collect();
            self.table_row(cols, &values, false);
        }
        self.blank_row();
    }

    fn chart(&mut self, snapshot: &ChartSnapshot) {
        self.ensure_space(SNAPSHOT_H + 16.0);
        self.text(&snapshot.title, MARGIN_LEFT, SUBTITLE_SIZE, true);
        self.y += 6.0;

        let (ox, oy) = (MARGIN_LEFT, PAGE_H - self.y - SNAPSHOT_H);
        let layer = self.layer();
        for shape in &snapshot.shapes {
            match shape {
                Shape::Rect { x, y, w, h, color } => {
                    if *h <= 0.0 || *w <= 0.0 {
                        continue;
                    }
                    let (x0, y0) = (ox + x, oy + y);
                    layer.set_fill_color(pdf_color(*color));
                    layer.add_polygon(filled(vec![
                        (x0, y0),
                        (x0 + w, y0),
                        (x0 + w, y0 + h),
                        (x0, y0 + h),
                    ]));
                }
                Shape::Polygon { points, color } => {
                    layer.set_fill_color(pdf_color(*color));
                    layer.add_polygon(filled(points.iter().map(|(x, y)| (ox + x, oy + y)).collect()));
                }
                Shape::Polyline { points, color } => {
                    layer.set_outline_color(pdf_color(*color));
                    layer.set_outline_thickness(0.8);
                    layer.add_line(Line {
                        points: points
                            .iter()
                            .map(|(x, y)| (Point::new(Mm(ox + x), Mm(oy + y)), false))
                            .collect(),
                        is_closed: false,
                    });
                }
                Shape::Label { x, y, text, size } => {
                    layer.set_fill_color(pdf_color(BLACK));
                    layer.use_text(text.as_str(), *size, Mm(ox + x), Mm(oy + y), &self.font);
                }
            }
        }
        layer.set_fill_color(pdf_color(BLACK));
        layer.set_outline_color(pdf_color(BLACK));
        self.y += SNAPSHOT_H + 8.0;
    }

    fn write_toc(&self, page_index: usize) {
        let layer = self.layer_at(page_index);
        let mut y = MARGIN_TOP;
        layer.use_text("Contents", TITLE_SIZE, Mm(MARGIN_LEFT), Mm(PAGE_H - y), &self.font_bold);
        y += 14.0;
        for (title, page) in &self.toc {
            let num = page.to_string();
            let num_x = PAGE_W - MARGIN_RIGHT - approx_text_width(&num, SUBTITLE_SIZE);
            layer.use_text(title.as_str(), SUBTITLE_SIZE, Mm(MARGIN_LEFT), Mm(PAGE_H - y), &self.font);
            layer.use_text(num, SUBTITLE_SIZE, Mm(num_x), Mm(PAGE_H - y), &self.font);
            y += 9.0;
        }
    }

    fn stamp_footers(&self) {
        let total = self.page_count();
        for index in 0..total {
            let label = format!("Page {} of {}", index + 1, total);
            let x = (PAGE_W - approx_text_width(&label, 8.0)) / 2.0;
            self.layer_at(index)
                .use_text(label, 8.0, Mm(x), Mm(MARGIN_BOTTOM / 2.0), &self.font);
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| StewardError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| StewardError::Pdf(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Captures one chart; failures are logged and the chart is left out.
fn place_chart(pdf: &mut PdfWriter, capture: &mut dyn ChartCapture, series: &present::ChartSeries) -> bool {
    match capture.capture(series) {
        Ok(snapshot) => {
            pdf.chart(&snapshot);
            true
        }
        Err(e) => {
            log::warn!("{e}");
            false
        }
    }
}

fn cover(pdf: &mut PdfWriter, bundle: &ReportBundle, info: &DocumentInfo) {
    pdf.fill_rect(0.0, 0.0, PAGE_W, 90.0, NAVY);
    pdf.layer().set_fill_color(pdf_color(WHITE));
    pdf.y = 45.0;
    pdf.text("Tithes & Offerings Report", MARGIN_LEFT, 26.0, true);
    pdf.y += 12.0;
    if !info.church_name.is_empty() {
        pdf.text(info.church_name, MARGIN_LEFT, 14.0, false);
    }
    pdf.layer().set_fill_color(pdf_color(BLACK));

    pdf.y = 115.0;
    let w = bundle.windows;
    let lines = [
        ("Reporting period", w.current.to_string()),
        ("Compared with", w.previous.to_string()),
        ("Prepared by", info.prepared_by.to_string()),
        ("Generated", short_date(info.generated)),
    ];
    for (label, value) in lines {
        if value.is_empty() {
            continue;
        }
        pdf.text(label, MARGIN_LEFT, SUBTITLE_SIZE, true);
        pdf.text(&value, MARGIN_LEFT + 45.0, SUBTITLE_SIZE, false);
        pdf.y += 8.0;
    }
}

fn executive_summary(pdf: &mut PdfWriter, bundle: &ReportBundle) {
    pdf.section("Executive Summary");
    pdf.paragraph(&format!(
        "This report covers {} and compares it with {}.",
        bundle.windows.current, bundle.windows.previous
    ));

    let Some(summary) = &bundle.summary else {
        pdf.paragraph("No contributions were recorded in this period.");
        return;
    };
    let insights = bundle.insights();
    let total = &summary.total_amount;
    let growth = match insights.direction {
        GrowthDirection::Unchanged => format!(
            "Total giving held steady at {} ({}) compared with the previous period.",
            money(total.current),
            format_percentage(insights.amount_growth)
        ),
        direction => format!(
            "Total giving {} by {} to {}, from {} in the previous period.",
            direction.verb(),
            format_percentage(insights.amount_growth),
            money(total.current),
            money(total.previous)
        ),
    };
    pdf.paragraph(&growth);
    if let Some((name, amount)) = &insights.top_contributor {
        pdf.paragraph(&format!("{name} was the top contributor with {}.", money(*amount)));
    }
    if let Some((title, amount)) = &insights.top_event {
        pdf.paragraph(&format!("{title} was the top event with {}.", money(*amount)));
    }
    pdf.paragraph(&format!(
        "{} contributions came from {} contributors across {} events.",
        number(summary.contribution_count),
        number(summary.unique_members.current as usize),
        number(summary.unique_events.current as usize)
    ));
    if bundle.skipped_dates > 0 {
        pdf.paragraph(&format!(
            "{} contributions had unreadable dates and were left out of date-based charts.",
            bundle.skipped_dates
        ));
    }
}

fn financial_overview(pdf: &mut PdfWriter, bundle: &ReportBundle, capture: &mut dyn ChartCapture) {
    pdf.section("Financial Overview");

    pdf.section_label("Summary");
    let cards = present::summary_cards(bundle);
    if cards.is_empty() {
        pdf.paragraph("No contributions were recorded in this period.");
    } else {
        let rows: Vec<Vec<String>> = cards
            .into_iter()
            .map(|c| vec![c.label.to_string(), c.value, c.previous, c.growth])
            .collect();
        pdf.table(
            &[left(70.0), right(36.0), right(36.0), right(35.8)],
            &["Metric", "This Period", "Previous", "Change"],
            &rows,
        );
    }

    if !bundle.member_types.is_empty() {
        pdf.section_label("By Member Type");
        let rows: Vec<Vec<String>> = bundle
            .member_types
            .iter()
            .map(|b| {
                vec![
                    b.label.clone(),
                    money(b.total),
                    b.count.to_string(),
                    format!("{:.1}%", bundle.percent_of_total(b.total)),
                ]
            })
            .collect();
        pdf.table(
            &[left(70.0), right(36.0), right(36.0), right(35.8)],
            &["Type", "Total", "Gifts", "% of Total"],
            &rows,
        );
    }

    place_chart(pdf, capture, &present::member_type_chart(bundle));
    place_chart(pdf, capture, &present::top_members_chart(bundle, 5));
}

fn contribution_trends(pdf: &mut PdfWriter, bundle: &ReportBundle, capture: &mut dyn ChartCapture) {
    pdf.section("Contribution Trends");
    place_chart(pdf, capture, &present::monthly_chart(bundle));
    place_chart(pdf, capture, &present::yearly_chart(bundle));
    if !place_chart(pdf, capture, &present::weekday_chart(bundle)) {
        pdf.section_label("Giving by Weekday");
        let rows: Vec<Vec<String>> = bundle
            .weekday
            .iter()
            .map(|w| vec![w.name().to_string(), money(w.total), w.count.to_string(), money(w.average)])
            .collect();
        pdf.table(
            &[left(70.0), right(36.0), right(36.0), right(35.8)],
            &["Day", "Total", "Gifts", "Average"],
            &rows,
        );
    }
}

const MEMBER_COLS: [Col; 6] = [left(10.0), left(58.0), left(28.0), right(30.0), right(18.0), right(33.8)];

fn member_table_rows(bundle: &ReportBundle, n: usize) -> Vec<Vec<String>> {
    bundle
        .top_members(n)
        .iter()
        .enumerate()
        .map(|(i, m)| {
            vec![
                (i + 1).to_string(),
                m.member.full_name(),
                m.member.member_type.clone(),
                money(m.total),
                m.count.to_string(),
                money(m.average),
            ]
        })
        .collect()
}

fn member_analysis(pdf: &mut PdfWriter, bundle: &ReportBundle) {
    pdf.section("Member Analysis");
    let stats = bundle.member_stats();
    pdf.section_label("Overview");
    let rows = vec![
        vec!["Contributors".to_string(), number(stats.contributors)],
        vec!["Average per member".to_string(), money(stats.average_per_member)],
        vec!["Regular givers (1+ per month)".to_string(), number(stats.regular)],
        vec!["Occasional givers".to_string(), number(stats.occasional)],
        vec!["Average gifts per month".to_string(), format!("{:.2}", stats.average_frequency)],
    ];
    pdf.table(&[left(120.0), right(57.8)], &["Measure", "Value"], &rows);

    pdf.section_label("Top 10 Contributors");
    if bundle.members.is_empty() {
        pdf.paragraph("No member contributions in this period.");
    } else {
        pdf.table(
            &MEMBER_COLS,
            &["#", "Member", "Type", "Total", "Gifts", "Average"],
            &member_table_rows(bundle, 10),
        );
    }

    pdf.section_label("Giving Frequency");
    let contributors = stats.contributors.max(1) as f64;
    let rows: Vec<Vec<String>> = bundle
        .frequency_distribution()
        .into_iter()
        .map(|(tier, n)| {
            vec![
                tier.label().to_string(),
                tier.threshold().to_string(),
                n.to_string(),
                format!("{:.1}%", n as f64 / contributors * 100.0),
            ]
        })
        .collect();
    pdf.table(
        &[left(50.0), left(56.0), right(36.0), right(35.8)],
        &["Tier", "Gifts per Month", "Members", "% of Members"],
        &rows,
    );
}

const EVENT_COLS: [Col; 6] = [left(52.0), left(26.0), left(36.0), right(24.0), right(18.0), right(21.8)];

fn event_table_rows(bundle: &ReportBundle, n: usize) -> Vec<Vec<String>> {
    bundle
        .top_events(n)
        .iter()
        .map(|e| {
            vec![
                e.event.event_type.clone(),
                format_date(&e.event.start_date),
                e.event.location.clone().unwrap_or_default(),
                money(e.total),
                e.contributors.to_string(),
                money(e.average_per_contributor),
            ]
        })
        .collect()
}

const EVENT_HEADERS: [&str; 6] = ["Event", "Date", "Location", "Total", "Givers", "Avg"];

fn event_analysis(pdf: &mut PdfWriter, bundle: &ReportBundle, capture: &mut dyn ChartCapture) {
    pdf.section("Event Analysis");
    let stats = bundle.event_stats();
    pdf.section_label("Overview");
    let rows = vec![
        vec!["Events with giving".to_string(), number(stats.events_with_giving)],
        vec!["Average per event".to_string(), money(stats.average_per_event)],
        vec!["Contributors across events".to_string(), number(stats.total_contributors)],
    ];
    pdf.table(&[left(120.0), right(57.8)], &["Measure", "Value"], &rows);

    pdf.section_label("Top 10 Events");
    if bundle.events.is_empty() {
        pdf.paragraph("No event contributions in this period.");
        return;
    }
    pdf.table(&EVENT_COLS, &EVENT_HEADERS, &event_table_rows(bundle, 10));
    place_chart(pdf, capture, &present::top_events_chart(bundle, 8));
}

fn top_contributors(pdf: &mut PdfWriter, bundle: &ReportBundle) {
    pdf.section("Top Contributors");
    if bundle.members.is_empty() {
        pdf.paragraph("No member contributions in this period.");
        return;
    }
    const CARD_H: f32 = 26.0;
    for (rank, m) in bundle.top_members(5).iter().enumerate() {
        pdf.ensure_space(CARD_H + 6.0);
        let top = pdf.y;
        pdf.fill_rect(MARGIN_LEFT, top, CONTENT_W, CARD_H, CARD_BG);
        pdf.fill_rect(MARGIN_LEFT + 4.0, top + 4.0, 12.0, 12.0, NAVY);

        pdf.layer().set_fill_color(pdf_color(WHITE));
        pdf.y = top + 12.0;
        pdf.text(&format!("#{}", rank + 1), MARGIN_LEFT + 6.0, 12.0, true);
        pdf.layer().set_fill_color(pdf_color(BLACK));

        pdf.y = top + 9.0;
        pdf.text(&m.member.full_name(), MARGIN_LEFT + 22.0, 13.0, true);
        pdf.y = top + 15.0;
        pdf.text(&m.member.member_type, MARGIN_LEFT + 22.0, FONT_SIZE, false);
        pdf.y = top + 22.0;
        let stats = format!(
            "Total {}    Gifts {}    Average {}    {:.1}% of total giving",
            money(m.total),
            m.count,
            money(m.average),
            bundle.percent_of_total(m.total)
        );
        pdf.text(&stats, MARGIN_LEFT + 22.0, FONT_SIZE, false);
        pdf.y = top + CARD_H + 6.0;
    }
}

fn detailed_reports(pdf: &mut PdfWriter, bundle: &ReportBundle) {
    pdf.section("Detailed Reports");
    pdf.section_label("Top 20 Members");
    if bundle.members.is_empty() {
        pdf.paragraph("No member contributions in this period.");
    } else {
        pdf.table(
            &MEMBER_COLS,
            &["#", "Member", "Type", "Total", "Gifts", "Average"],
            &member_table_rows(bundle, 20),
        );
    }
    pdf.section_label("Top 15 Events");
    if bundle.events.is_empty() {
        pdf.paragraph("No event contributions in this period.");
    } else {
        pdf.table(&EVENT_COLS, &EVENT_HEADERS, &event_table_rows(bundle, 15));
    }
}

fn back_cover(pdf: &mut PdfWriter, info: &DocumentInfo) {
    pdf.new_page();
    pdf.fill_rect(0.0, PAGE_H - 60.0, PAGE_W, 60.0, NAVY);
    pdf.y = PAGE_H / 2.0;
    let name = if info.church_name.is_empty() { "Tithes & Offerings" } else { info.church_name };
    let x = (PAGE_W - approx_text_width(name, TITLE_SIZE)) / 2.0;
    pdf.text(name, x, TITLE_SIZE, true);
    pdf.y += 10.0;
    let line = format!("Generated {}", short_date(info.generated));
    pdf.text(&line, (PAGE_W - approx_text_width(&line, FONT_SIZE)) / 2.0, FONT_SIZE, false);
}

fn layout(bundle: &ReportBundle, info: &DocumentInfo, capture: &mut dyn ChartCapture) -> Result<PdfWriter> {
    let mut pdf = PdfWriter::new("Tithes & Offerings Report")?;
    cover(&mut pdf, bundle, info);
    pdf.new_page();
    let toc_page = pdf.page_count() - 1;

    executive_summary(&mut pdf, bundle);
    financial_overview(&mut pdf, bundle, capture);
    contribution_trends(&mut pdf, bundle, capture);
    member_analysis(&mut pdf, bundle);
    event_analysis(&mut pdf, bundle, capture);
    top_contributors(&mut pdf, bundle);
    detailed_reports(&mut pdf, bundle);
    back_cover(&mut pdf, info);

    pdf.write_toc(toc_page);
    pdf.stamp_footers();
    Ok(pdf)
}

/// Render the full multi-section report. Charts are captured one at a time,
/// in document order.
pub fn render_report(bundle: &ReportBundle, info: &DocumentInfo, capture: &mut dyn ChartCapture) -> Result<Vec<u8>> {
    let pdf = layout(bundle, info, capture)?;
    let pages = pdf.page_count();
    let bytes = pdf.to_bytes()?;
    log::info!("rendered report: {pages} pages, {} bytes", bytes.len());
    Ok(bytes)
}

/// Render and write to `path`. The file appears only once it is complete.
pub fn save_report(
    bundle: &ReportBundle,
    info: &DocumentInfo,
    capture: &mut dyn ChartCapture,
    path: &Path,
) -> Result<()> {
    let bytes = render_report(bundle, info, capture)?;
    let tmp = path.with_extension("pdf.part");
    fs::write(&tmp, &bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::VectorCapture;
    use crate::reports::tests::{inputs, sample_bundle};
    use crate::reports::{compute_report, ReportFilters};

    struct BrokenCapture {
        calls: usize,
    }

    impl ChartCapture for BrokenCapture {
        fn capture(&mut self, chart: &present::ChartSeries) -> Result<ChartSnapshot> {
            self.calls += 1;
            Err(StewardError::ChartCapture(chart.title.clone()))
        }
    }

    fn info() -> DocumentInfo<'static> {
        DocumentInfo {
            church_name: "Grace Fellowship",
            prepared_by: "Treasurer",
            generated: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        }
    }

    #[test]
    fn test_report_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert_eq!(report_file_name(date), "tithes-report-2024-04-02.pdf");
    }

    #[test]
    fn test_render_report_produces_pdf() {
        let bytes = render_report(&sample_bundle(), &info(), &mut VectorCapture).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_sections_are_listed_in_order() {
        let pdf = layout(&sample_bundle(), &info(), &mut VectorCapture).unwrap();
        let titles: Vec<&str> = pdf.toc.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Executive Summary",
                "Financial Overview",
                "Contribution Trends",
                "Member Analysis",
                "Event Analysis",
                "Top Contributors",
                "Detailed Reports",
            ]
        );
        // Cover and contents come first.
        assert_eq!(pdf.toc[0].1, 3);
        assert!(pdf.toc.windows(2).all(|w| w[0].1 < w[1].1));
        assert!(pdf.page_count() > pdf.toc[6].1);
    }

    #[test]
    fn test_capture_failures_do_not_abort_export() {
        let mut capture = BrokenCapture { calls: 0 };
        let bytes = render_report(&sample_bundle(), &info(), &mut capture).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(capture.calls, 6);
    }

    #[test]
    fn test_empty_period_still_renders() {
        let bundle = compute_report(&inputs(vec![], vec![]), &ReportFilters::default());
        let bytes = render_report(&bundle, &info(), &mut VectorCapture).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_save_report_leaves_only_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tithes-report-2024-04-02.pdf");
        save_report(&sample_bundle(), &info(), &mut VectorCapture, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(names.len(), 1);
    }
}
