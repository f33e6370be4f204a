//! Renderers for a [`ChartLayout`]: SVG text, then PNG via resvg

use std::fmt::Write as _;

use png::{BitDepth, ColorType, Encoder};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::debug;

use super::layout::{Anchor, ChartLayout, Marker, Primitive};
use super::{ChartError, ChartResult};

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn anchor_attr(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    }
}

/// Serialize a layout as a standalone SVG document
///
/// Coordinates are written with two decimals so identical layouts give
/// byte-identical documents.
pub fn render_svg(layout: &ChartLayout) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = layout.width,
        h = layout.height
    );

    for primitive in &layout.primitives {
        match primitive {
            Primitive::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let stroke = stroke
                    .as_deref()
                    .map(|s| format!(r#" stroke="{s}" stroke-width="1""#))
                    .unwrap_or_default();
                let _ = writeln!(
                    svg,
                    r#"  <rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="{fill}"{stroke}/>"#
                );
            }
            Primitive::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
                width,
            } => {
                let _ = writeln!(
                    svg,
                    r#"  <line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="{width:.2}"/>"#
                );
            }
            Primitive::Point {
                x,
                y,
                radius,
                color,
                marker: Marker::Measured,
            } => {
                let _ = writeln!(
                    svg,
                    r##"  <circle cx="{x:.2}" cy="{y:.2}" r="{radius:.2}" fill="{color}" stroke="#333333" stroke-width="0.5"/>"##
                );
            }
            Primitive::Point {
                x,
                y,
                radius,
                color,
                marker: Marker::Floor,
            } => {
                // Hollow square: visibly not a measurement
                let _ = writeln!(
                    svg,
                    r#"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
                    x - radius,
                    y - radius,
                    radius * 2.0,
                    radius * 2.0
                );
            }
            Primitive::Text {
                x,
                y,
                text,
                size,
                anchor,
                color,
                bold,
                rotate,
            } => {
                let weight = if *bold { r#" font-weight="bold""# } else { "" };
                let transform = rotate
                    .map(|deg| format!(r#" transform="rotate({deg:.2} {x:.2} {y:.2})""#))
                    .unwrap_or_default();
                let _ = writeln!(
                    svg,
                    r#"  <text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{size:.2}" text-anchor="{}" fill="{color}"{weight}{transform}>{}</text>"#,
                    anchor_attr(*anchor),
                    escape_text(text)
                );
            }
        }
    }

    let _ = writeln!(svg, "</svg>");
    svg
}

/// Rasterize an SVG document to PNG bytes
pub fn svg_to_png(svg: &str, width: u32, height: u32) -> ChartResult<Vec<u8>> {
    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| ChartError::Svg(e.to_string()))?;

    let mut pixmap = Pixmap::new(width, height).ok_or(ChartError::Raster { width, height })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder
        .write_header()
        .map_err(|e| ChartError::Encode(e.to_string()))?
        .write_image_data(pixmap.data())
        .map_err(|e| ChartError::Encode(e.to_string()))?;

    debug!(width, height, bytes = out.len(), "Rasterized chart");
    Ok(out)
}
