//! Rank vs. delay/cost chart
//!
//! Two side-by-side log-scale scatter panels over the same rank axis.
//! Produced in two steps so the layout can be tested without a surface:
//!
//! 1. [`layout_chart`]: `(ChartInput, ChartConfig) -> ChartLayout`
//! 2. [`render_svg`] / [`svg_to_png`]: primitives to an image
//!
//! Identical input gives byte-identical output; no timestamps or random
//! state are involved.

pub mod layout;
pub mod render;
pub mod scale;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChartConfig;
use crate::state::{AssistantMessage, ModelResult};

pub use layout::{
    layout_chart, wrap, Anchor, ChartLayout, Marker, Metric, PanelSpec, Primitive, ValueFormat,
};
pub use render::{render_svg, svg_to_png};
pub use scale::{linear_ticks, log_domain, log_ticks, rank_domain, LinearScale, LogScale};

/// Error type for chart production
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("No points to plot")]
    NoData,

    #[error("Generated SVG could not be parsed: {0}")]
    Svg(String),

    #[error("Could not allocate a {width}x{height} raster")]
    Raster { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for chart operations
pub type ChartResult<T> = Result<T, ChartError>;

/// One model's position on the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub model: String,
    /// X coordinate: average rank, or average percentile for analytics
    pub rank: f64,
    pub delay: Option<f64>,
    pub cost: Option<f64>,
}

/// Points plus the models each panel should call out as missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInput {
    pub points: Vec<ChartPoint>,
    pub timed_out: Vec<String>,
    pub missing_cost: Vec<String>,
    /// Delay panel first, cost panel second
    pub panels: [PanelSpec; 2],
}

fn push_unique(list: &mut Vec<String>, model: &str) {
    if !list.iter().any(|m| m == model) {
        list.push(model.to_string());
    }
}

impl ChartInput {
    /// Points in plotting order; missing metrics are annotated per panel
    pub fn new(points: Vec<ChartPoint>) -> Self {
        let mut timed_out = Vec::new();
        let mut missing_cost = Vec::new();
        for point in &points {
            if point.delay.is_none() {
                push_unique(&mut timed_out, &point.model);
            }
            if point.cost.is_none() {
                push_unique(&mut missing_cost, &point.model);
            }
        }
        Self {
            points,
            timed_out,
            missing_cost,
            panels: [
                PanelSpec::new(Metric::Delay, "Total time vs. rank", ValueFormat::Seconds)
                    .with_y_label("Total time (s)"),
                PanelSpec::new(Metric::Cost, "Total cost vs. rank", ValueFormat::Dollars)
                    .with_y_label("Total cost ($)"),
            ],
        }
    }

    /// Also annotate models whose stage-1 run timed out or reported no cost
    pub fn with_stage1(mut self, stage1: &[ModelResult]) -> Self {
        for result in stage1 {
            if result.elapsed_time.is_none() {
                push_unique(&mut self.timed_out, &result.model);
            }
            if result.effective_cost().is_none() {
                push_unique(&mut self.missing_cost, &result.model);
            }
        }
        self
    }

    pub fn with_panels(mut self, delay: PanelSpec, cost: PanelSpec) -> Self {
        self.panels = [delay, cost];
        self
    }

    /// Chart input for one finished turn
    ///
    /// Needs aggregate rankings and stage-1 data; returns `None` otherwise.
    pub fn from_turn(message: &AssistantMessage) -> Option<Self> {
        let metadata = message.metadata.as_ref()?;
        let stage1 = message.stage1.as_ref()?;
        if metadata.aggregate_rankings.is_empty() || stage1.is_empty() {
            return None;
        }

        let points = metadata
            .aggregate_rankings
            .iter()
            .map(|r| ChartPoint {
                model: r.model.clone(),
                rank: r.average_rank,
                delay: r.total_elapsed_time,
                cost: r.total_cost,
            })
            .collect();
        Some(Self::new(points).with_stage1(stage1))
    }
}

/// A rendered chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    pub svg: String,
    pub png: Option<Vec<u8>>,
}

impl ChartImage {
    /// Inline `data:` URI, PNG when available, SVG otherwise
    pub fn to_data_uri(&self) -> String {
        match &self.png {
            Some(png) => format!("data:image/png;base64,{}", STANDARD.encode(png)),
            None => format!(
                "data:image/svg+xml;base64,{}",
                STANDARD.encode(self.svg.as_bytes())
            ),
        }
    }
}

/// Lay out and render; rasterizes only when `config.embed_png` is set
pub fn render_chart(input: &ChartInput, config: &ChartConfig) -> ChartResult<ChartImage> {
    let layout = layout_chart(input, config)?;
    let svg = render_svg(&layout);
    let png = if config.embed_png {
        Some(svg_to_png(&svg, layout.width, layout.height)?)
    } else {
        None
    };
    debug!(
        points = input.points.len(),
        primitives = layout.primitives.len(),
        png = png.is_some(),
        "Rendered chart"
    );

    Ok(ChartImage {
        width: layout.width,
        height: layout.height,
        svg,
        png,
    })
}
