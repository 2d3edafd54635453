//! Renders chart series into resolution-independent snapshots that the PDF
//! exporter can place on a page.

use crate::error::{Result, StewardError};
use crate::fmt::format_k;
use crate::present::{ChartKind, ChartSeries, Rgb};

/// Snapshot canvas size, in millimetres. Origin is bottom-left.
pub const SNAPSHOT_W: f32 = 170.0;
pub const SNAPSHOT_H: f32 = 70.0;

const AXIS_COLOR: Rgb = Rgb(156, 163, 175);
const LABEL_SIZE: f32 = 7.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { x: f32, y: f32, w: f32, h: f32, color: Rgb },
    Polygon { points: Vec<(f32, f32)>, color: Rgb },
    Polyline { points: Vec<(f32, f32)>, color: Rgb },
    Label { x: f32, y: f32, text: String, size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub title: String,
    pub shapes: Vec<Shape>,
}

/// Turns a live chart into a snapshot. Capture may fail; callers fall back
/// to tabular output or skip the chart.
pub trait ChartCapture {
    fn capture(&mut self, chart: &ChartSeries) -> Result<ChartSnapshot>;
}

/// Draws bars, lines and pies as vector shapes.
#[derive(Debug, Default)]
pub struct VectorCapture;

impl ChartCapture for VectorCapture {
    fn capture(&mut self, chart: &ChartSeries) -> Result<ChartSnapshot> {
        if chart.points.is_empty() {
            return Err(StewardError::ChartCapture(format!("{}: no data", chart.title)));
        }
        if chart.points.iter().any(|p| !p.value.is_finite() || p.value < 0.0) {
            return Err(StewardError::ChartCapture(format!(
                "{}: values must be finite and non-negative",
                chart.title
            )));
        }
        if chart.max_value() <= 0.0 {
            return Err(StewardError::ChartCapture(format!("{}: nothing to plot", chart.title)));
        }
        let shapes = match chart.kind {
            ChartKind::Bar => bar_shapes(chart),
            ChartKind::Line => line_shapes(chart),
            ChartKind::Pie => pie_shapes(chart),
        };
        Ok(ChartSnapshot {
            title: chart.title.clone(),
            shapes,
        })
    }
}

// Plot area for bar and line charts.
const PLOT_X0: f32 = 16.0;
const PLOT_X1: f32 = SNAPSHOT_W;
const PLOT_Y0: f32 = 10.0;
const PLOT_Y1: f32 = SNAPSHOT_H - 4.0;

fn axes(max: f64) -> Vec<Shape> {
    vec![
        Shape::Polyline {
            points: vec![(PLOT_X0, PLOT_Y1), (PLOT_X0, PLOT_Y0), (PLOT_X1, PLOT_Y0)],
            color: AXIS_COLOR,
        },
        Shape::Label { x: 0.0, y: PLOT_Y1 - 2.0, text: format_k(max), size: LABEL_SIZE },
        Shape::Label { x: 0.0, y: PLOT_Y0, text: "$0".into(), size: LABEL_SIZE },
    ]
}

/// Every n-th label so they don't collide.
fn label_stride(n: usize) -> usize {
    (n / 12).max(1)
}

fn scale_y(value: f64, max: f64) -> f32 {
    PLOT_Y0 + ((value / max) as f32) * (PLOT_Y1 - PLOT_Y0)
}

fn bar_shapes(chart: &ChartSeries) -> Vec<Shape> {
    let max = chart.max_value();
    let n = chart.points.len();
    let slot = (PLOT_X1 - PLOT_X0) / n as f32;
    let stride = label_stride(n);
    let mut shapes = axes(max);
    for (i, p) in chart.points.iter().enumerate() {
        let x = PLOT_X0 + slot * i as f32 + slot * 0.15;
        let top = scale_y(p.value, max);
        shapes.push(Shape::Rect { x, y: PLOT_Y0, w: slot * 0.7, h: top - PLOT_Y0, color: p.color });
        if i % stride == 0 {
            shapes.push(Shape::Label { x, y: PLOT_Y0 - 5.0, text: truncate(&p.label, 12), size: LABEL_SIZE });
        }
    }
    shapes
}

fn line_shapes(chart: &ChartSeries) -> Vec<Shape> {
    let max = chart.max_value();
    let n = chart.points.len();
    let step = if n > 1 { (PLOT_X1 - PLOT_X0 - 6.0) / (n - 1) as f32 } else { 0.0 };
    let stride = label_stride(n);
    let mut shapes = axes(max);
    let points: Vec<(f32, f32)> = chart
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (PLOT_X0 + 3.0 + step * i as f32, scale_y(p.value, max)))
        .collect();
    for (i, ((x, y), p)) in points.iter().zip(&chart.points).enumerate() {
        shapes.push(Shape::Rect { x: x - 0.8, y: y - 0.8, w: 1.6, h: 1.6, color: p.color });
        if i % stride == 0 {
            shapes.push(Shape::Label { x: x - 3.0, y: PLOT_Y0 - 5.0, text: truncate(&p.label, 8), size: LABEL_SIZE });
        }
    }
    let color = chart.points[0].color;
    shapes.push(Shape::Polyline { points, color });
    shapes
}

fn pie_shapes(chart: &ChartSeries) -> Vec<Shape> {
    let total = chart.total();
    let (cx, cy, r) = (SNAPSHOT_H / 2.0, SNAPSHOT_H / 2.0, SNAPSHOT_H / 2.0 - 3.0);
    let mut shapes = Vec::new();
    let mut start = std::f32::consts::FRAC_PI_2;
    for (i, p) in chart.points.iter().enumerate() {
        let sweep = (p.value / total) as f32 * std::f32::consts::TAU;
        if sweep > 0.0 {
            let steps = ((sweep / 0.08).ceil() as usize).max(1);
            let mut ring = vec![(cx, cy)];
            for s in 0..=steps {
                let a = start - sweep * s as f32 / steps as f32;
                ring.push((cx + r * a.cos(), cy + r * a.sin()));
            }
            shapes.push(Shape::Polygon { points: ring, color: p.color });
        }
        start -= sweep;

        let ly = SNAPSHOT_H - 8.0 - i as f32 * 7.0;
        shapes.push(Shape::Rect { x: SNAPSHOT_H + 8.0, y: ly, w: 4.0, h: 4.0, color: p.color });
        shapes.push(Shape::Label {
            x: SNAPSHOT_H + 14.0,
            y: ly + 0.5,
            text: format!("{} ({:.1}%)", truncate(&p.label, 28), p.value / total * 100.0),
            size: 8.0,
        });
    }
    shapes
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::{member_type_chart, monthly_chart, yearly_chart, ChartPoint, PALETTE};
    use crate::reports::tests::sample_bundle;

    fn rects(snapshot: &ChartSnapshot) -> usize {
        snapshot.shapes.iter().filter(|s| matches!(s, Shape::Rect { .. })).count()
    }

    #[test]
    fn test_bar_chart_one_rect_per_point() {
        let snap = VectorCapture.capture(&monthly_chart(&sample_bundle())).unwrap();
        assert_eq!(snap.title, "Monthly Giving");
        assert_eq!(rects(&snap), 3);
        for shape in &snap.shapes {
            if let Shape::Rect { y, h, .. } = shape {
                assert!(*h >= 0.0);
                assert!(y + h <= SNAPSHOT_H + 0.01);
            }
        }
    }

    #[test]
    fn test_line_chart_has_polyline_through_every_point() {
        let snap = VectorCapture.capture(&yearly_chart(&sample_bundle())).unwrap();
        let line = snap
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Polyline { points, .. } if points.len() == 12 => Some(points),
                _ => None,
            })
            .next();
        assert!(line.is_some());
    }

    #[test]
    fn test_pie_has_wedge_and_legend_per_slice() {
        let snap = VectorCapture.capture(&member_type_chart(&sample_bundle())).unwrap();
        let wedges = snap.shapes.iter().filter(|s| matches!(s, Shape::Polygon { .. })).count();
        assert_eq!(wedges, 3);
        let legend: Vec<&str> = snap
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(legend[0].starts_with("Member ("), "got: {legend:?}");
    }

    #[test]
    fn test_capture_fails_without_data() {
        let empty = ChartSeries { title: "Empty".into(), kind: ChartKind::Bar, points: vec![] };
        let err = VectorCapture.capture(&empty).unwrap_err();
        assert!(matches!(err, StewardError::ChartCapture(_)));

        let zeros = ChartSeries {
            title: "Weekday".into(),
            kind: ChartKind::Bar,
            points: vec![ChartPoint { label: "Sun".into(), value: 0.0, color: PALETTE[0] }],
        };
        assert!(VectorCapture.capture(&zeros).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Harvest", 12), "Harvest");
        assert_eq!(truncate("Harvest Festival Offering", 8), "Harve...");
    }
}
