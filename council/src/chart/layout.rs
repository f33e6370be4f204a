//! Chart layout: data in, drawing primitives out
//!
//! ```text
//! ┌──────────── panel 0 (delay) ───────────┐┌──────────── panel 1 (cost) ────────────┐
//! │            title                       ││            title                       │
//! │  Timed out: a, b                       ││  Missing cost: c                       │
//! │  ┌──────────────────────────────────┐  ││  ┌──────────────────────────────────┐  │
//! │ y│  ● gpt-5.1                       │  ││ y│      ● gpt-5.1                   │  │
//! │  │          ● sonnet   □ (floor)    │  ││  │  ● sonnet                        │  │
//! │  └──────────────────────────────────┘  ││  └──────────────────────────────────┘  │
//! │              x label                   ││              x label                   │
//! └────────────────────────────────────────┘└────────────────────────────────────────┘
//! ```
//!
//! Layout is a pure function; no rendering surface is touched here.

use serde::{Deserialize, Serialize};

use super::scale::{log_domain, rank_domain, LinearScale, LogScale};
use super::{ChartError, ChartInput, ChartPoint, ChartResult};
use crate::config::ChartConfig;
use crate::display::short_model_name;

/// Matplotlib's tab10 palette, cycled by point index
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 50.0;
const TITLE_BASELINE: f64 = 22.0;
const ANNOTATION_TOP: f64 = 40.0;
const ANNOTATION_LINE: f64 = 14.0;
const POINT_RADIUS: f64 = 5.0;
/// Horizontal gap between a point and its default label
const LABEL_OFFSET: f64 = 8.0;
/// Average glyph width as a fraction of the font size
const CHAR_WIDTH: f64 = 0.6;

// ── Panels ──────────────────────────────────────────────────────────

/// Which metric a panel plots on its log axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Delay,
    Cost,
}

impl Metric {
    pub fn value(&self, point: &ChartPoint) -> Option<f64> {
        match self {
            Metric::Delay => point.delay,
            Metric::Cost => point.cost,
        }
    }
}

/// How tick labels on the log axis are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Seconds,
    Dollars,
    /// Multiple of a reference value
    Ratio,
    Cents,
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        let number = compact_number(value);
        match self {
            ValueFormat::Seconds => format!("{number}s"),
            ValueFormat::Dollars => format!("${number}"),
            ValueFormat::Ratio => format!("{number}x"),
            ValueFormat::Cents => format!("{number}¢"),
        }
    }
}

/// Two significant digits, trailing zeros dropped
fn compact_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (1 - magnitude).clamp(0, 8) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Everything that differs between the two panels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub metric: Metric,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub format: ValueFormat,
    /// Heading for the list of models with no value on this panel
    pub missing_label: String,
}

impl PanelSpec {
    pub fn new(metric: Metric, title: impl Into<String>, format: ValueFormat) -> Self {
        let (y_label, missing_label) = match metric {
            Metric::Delay => ("Delay", "Timed out"),
            Metric::Cost => ("Cost", "Missing cost"),
        };
        Self {
            metric,
            title: title.into(),
            x_label: "Average rank (lower is better)".to_string(),
            y_label: y_label.to_string(),
            format,
            missing_label: missing_label.to_string(),
        }
    }

    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn with_missing_label(mut self, label: impl Into<String>) -> Self {
        self.missing_label = label.into();
        self
    }
}

// ── Primitives ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Point marker: a real measurement, or a value pinned to the axis floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Measured,
    Floor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        stroke: Option<String>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: String,
        width: f64,
    },
    Point {
        x: f64,
        y: f64,
        radius: f64,
        color: String,
        marker: Marker,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        anchor: Anchor,
        color: String,
        bold: bool,
        /// Rotation in degrees around (x, y)
        rotate: Option<f64>,
    },
}

impl Primitive {
    fn text(x: f64, y: f64, text: impl Into<String>, size: f64, anchor: Anchor) -> Self {
        Primitive::Text {
            x,
            y,
            text: text.into(),
            size,
            anchor,
            color: "#222222".to_string(),
            bold: false,
            rotate: None,
        }
    }

    fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) -> Self {
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: stroke.to_string(),
            width,
        }
    }
}

/// A complete chart, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<Primitive>,
}

impl ChartLayout {
    pub fn points(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Point { .. }))
    }
}

// ── Label placement ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct LabelBox {
    left: f64,
    right: f64,
    center_y: f64,
}

impl LabelBox {
    fn collides(&self, other: &LabelBox, gap: f64) -> bool {
        self.left < other.right && other.left < self.right && (self.center_y - other.center_y).abs() < gap
    }
}

/// Greedy label placer; placement order is input order
struct LabelPlacer {
    placed: Vec<LabelBox>,
    collisions: usize,
    font_size: f64,
    gap: f64,
    stagger: f64,
}

impl LabelPlacer {
    fn new(config: &ChartConfig) -> Self {
        Self {
            placed: Vec::new(),
            collisions: 0,
            font_size: config.font_size,
            gap: config.label_gap_px,
            stagger: config.stagger_px,
        }
    }

    /// Returns the text baseline position and anchor for a label at (px, py)
    fn place(&mut self, label: &str, px: f64, py: f64) -> (f64, f64, Anchor) {
        let width = label.chars().count() as f64 * self.font_size * CHAR_WIDTH;
        let baseline_shift = self.font_size / 3.0;

        let right = LabelBox {
            left: px + LABEL_OFFSET,
            right: px + LABEL_OFFSET + width,
            center_y: py,
        };
        if !self.placed.iter().any(|b| b.collides(&right, self.gap)) {
            self.placed.push(right);
            return (right.left, py + baseline_shift, Anchor::Start);
        }

        // Above the point, rotating through three stagger levels
        let level = (self.collisions % 3) as f64;
        self.collisions += 1;
        let baseline = py - LABEL_OFFSET - level * self.stagger;
        self.placed.push(LabelBox {
            left: px - width / 2.0,
            right: px + width / 2.0,
            center_y: baseline - baseline_shift,
        });
        (px, baseline, Anchor::Middle)
    }
}

/// Greedy word wrap at `max_chars`; a single over-long word gets its own line
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ── Layout ───────────────────────────────────────────────────────────

/// Lay out both panels side by side
pub fn layout_chart(input: &ChartInput, config: &ChartConfig) -> ChartResult<ChartLayout> {
    if input.points.is_empty() {
        return Err(ChartError::NoData);
    }

    let width = f64::from(config.width);
    let height = f64::from(config.height);
    let panel_width = width / 2.0;

    // Both panels share the x domain so ranks line up
    let ranks: Vec<f64> = input.points.iter().map(|p| p.rank).collect();
    let x_domain = rank_domain(&ranks);

    let mut primitives = vec![Primitive::Rect {
        x: 0.0,
        y: 0.0,
        width,
        height,
        fill: "#ffffff".to_string(),
        stroke: None,
    }];

    for (index, spec) in input.panels.iter().enumerate() {
        let missing = match spec.metric {
            Metric::Delay => &input.timed_out,
            Metric::Cost => &input.missing_cost,
        };
        layout_panel(
            &mut primitives,
            PanelFrame {
                left: index as f64 * panel_width,
                width: panel_width,
                height,
            },
            spec,
            &input.points,
            missing,
            x_domain,
            config,
        );
    }

    Ok(ChartLayout {
        width: config.width,
        height: config.height,
        primitives,
    })
}

#[derive(Debug, Clone, Copy)]
struct PanelFrame {
    left: f64,
    width: f64,
    height: f64,
}

fn layout_panel(
    out: &mut Vec<Primitive>,
    frame: PanelFrame,
    spec: &PanelSpec,
    points: &[ChartPoint],
    missing: &[String],
    x_domain: (f64, f64),
    config: &ChartConfig,
) {
    let font = config.font_size;
    let center_x = frame.left + frame.width / 2.0;

    out.push(Primitive::Text {
        x: center_x,
        y: TITLE_BASELINE,
        text: spec.title.clone(),
        size: font + 2.0,
        anchor: Anchor::Middle,
        color: "#111111".to_string(),
        bold: true,
        rotate: None,
    });

    let annotation = if missing.is_empty() {
        Vec::new()
    } else {
        let names: Vec<&str> = missing.iter().map(|m| short_model_name(m)).collect();
        let max_chars = ((frame.width - 20.0) / (font * CHAR_WIDTH)).floor().max(1.0) as usize;
        wrap(
            &format!("{}: {}", spec.missing_label, names.join(", ")),
            max_chars,
        )
    };
    for (i, line) in annotation.iter().enumerate() {
        out.push(Primitive::Text {
            x: center_x,
            y: ANNOTATION_TOP + i as f64 * ANNOTATION_LINE,
            text: line.clone(),
            size: font - 1.0,
            anchor: Anchor::Middle,
            color: "#b45309".to_string(),
            bold: false,
            rotate: None,
        });
    }

    let left = frame.left + MARGIN_LEFT;
    let right = frame.left + frame.width - MARGIN_RIGHT;
    let top = ANNOTATION_TOP + annotation.len() as f64 * ANNOTATION_LINE + 10.0;
    let bottom = frame.height - MARGIN_BOTTOM;

    out.push(Primitive::Rect {
        x: left,
        y: top,
        width: right - left,
        height: (bottom - top).max(0.0),
        fill: "#ffffff".to_string(),
        stroke: Some("#cccccc".to_string()),
    });

    let values: Vec<f64> = points.iter().filter_map(|p| spec.metric.value(p)).collect();
    let x_scale = LinearScale::new(x_domain, (left, right));
    let y_scale = LogScale::new(log_domain(&values), (bottom, top));

    for tick in x_scale.ticks() {
        let x = x_scale.map(tick);
        out.push(Primitive::line(x, top, x, bottom, "#eeeeee", 1.0));
        out.push(Primitive::text(
            x,
            bottom + 16.0,
            compact_number(tick),
            font - 1.0,
            Anchor::Middle,
        ));
    }
    for tick in y_scale.ticks() {
        let y = y_scale.map(tick);
        out.push(Primitive::line(left, y, right, y, "#eeeeee", 1.0));
        out.push(Primitive::text(
            left - 6.0,
            y + font / 3.0,
            spec.format.format(tick),
            font - 1.0,
            Anchor::End,
        ));
    }

    out.push(Primitive::text(
        (left + right) / 2.0,
        frame.height - 12.0,
        spec.x_label.clone(),
        font,
        Anchor::Middle,
    ));
    let y_center = (top + bottom) / 2.0;
    out.push(Primitive::Text {
        x: frame.left + 16.0,
        y: y_center,
        text: spec.y_label.clone(),
        size: font,
        anchor: Anchor::Middle,
        color: "#222222".to_string(),
        bold: false,
        rotate: Some(-90.0),
    });

    if values.is_empty() {
        out.push(Primitive::text(
            (left + right) / 2.0,
            y_center,
            "No data",
            font + 1.0,
            Anchor::Middle,
        ));
        return;
    }

    let mut placer = LabelPlacer::new(config);
    for (index, point) in points.iter().enumerate() {
        // Wholly missing values are listed in the annotation instead
        let Some(value) = spec.metric.value(point) else {
            continue;
        };
        let x = x_scale.map(point.rank);
        let (y, marker) = if value.is_finite() && value > 0.0 {
            (y_scale.map(value), Marker::Measured)
        } else {
            (y_scale.floor(), Marker::Floor)
        };
        let color = PALETTE[index % PALETTE.len()];

        out.push(Primitive::Point {
            x,
            y,
            radius: POINT_RADIUS,
            color: color.to_string(),
            marker,
        });

        let label = short_model_name(&point.model);
        let (lx, ly, anchor) = placer.place(label, x, y);
        out.push(Primitive::Text {
            x: lx,
            y: ly,
            text: label.to_string(),
            size: font,
            anchor,
            color: color.to_string(),
            bold: false,
            rotate: None,
        });
    }
}
