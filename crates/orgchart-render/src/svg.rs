//! SVG scene for a [`ChartLayout`].
//!
//! The viewBox is `0 0 width height` in render-scale pixels, so rasterizing at 1:1 keeps every
//! node inside the bbox reported by the layout.

use crate::chart::{
    CANVAS_BG, HIGHLIGHT_COLOR, LEGEND_BG, LEGEND_BORDER, LINE_COLOR, SHADOW_OFFSET,
};
use crate::model::{ChartLayout, NodeBox, PixelBox, TextBlock};
use crate::text::line_height;
use orgchart_core::Rgb;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Optional id for the root `<svg>` element.
    pub diagram_id: Option<String>,
    pub font_family: String,
    /// Canvas fill; `None` leaves the background transparent.
    pub background: Option<Rgb>,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            font_family: "Arial, DejaVu Sans, sans-serif".to_string(),
            background: Some(CANVAS_BG),
        }
    }
}

pub fn render_chart_svg(layout: &ChartLayout, options: &SvgRenderOptions) -> String {
    let mut out = String::new();
    let w = layout.width;
    let h = layout.height;
    let id_attr = options
        .diagram_id
        .as_deref()
        .map(|id| format!(r#" id="{}""#, escape_xml(id)))
        .unwrap_or_default();
    let _ = write!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg"{id_attr} width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
        escape_xml(&options.font_family)
    );
    if let Some(bg) = options.background {
        let _ = write!(
            &mut out,
            r#"<rect class="background" x="0" y="0" width="{w}" height="{h}" fill="{bg}"/>"#
        );
    }

    if !layout.connectors.is_empty() {
        let _ = write!(
            &mut out,
            r#"<g class="connectors" fill="none" stroke="{LINE_COLOR}" stroke-width="{}" stroke-linecap="square">"#,
            layout.line_width
        );
        for c in &layout.connectors {
            let points = c
                .points
                .iter()
                .map(|p| format!("{},{}", p.x, p.y))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(
                &mut out,
                r#"<polyline data-from="{}" data-to="{}" points="{points}"/>"#,
                escape_xml(&c.from),
                escape_xml(&c.to)
            );
        }
        out.push_str("</g>");
    }

    if !layout.nodes.is_empty() {
        out.push_str(r#"<g class="nodes">"#);
        for node in &layout.nodes {
            render_node(&mut out, node, layout.highlight_width);
        }
        out.push_str("</g>");
    }

    if let Some(legend) = &layout.legend {
        out.push_str(r#"<g class="legend">"#);
        rounded_rect(
            &mut out,
            "legend-panel",
            legend.bbox,
            legend.radius,
            Some(LEGEND_BG),
            Some((LEGEND_BORDER, 1)),
        );
        text_block(&mut out, &legend.heading, Some("600"));
        for item in &legend.items {
            rounded_rect(
                &mut out,
                "legend-swatch",
                item.swatch,
                legend.swatch_radius,
                Some(item.color),
                Some((item.color, 1)),
            );
            text_block(&mut out, &item.label, None);
        }
        out.push_str("</g>");
    }

    out.push_str("</svg>");
    out
}

fn render_node(out: &mut String, node: &NodeBox, highlight_width: i64) {
    let b = node.bbox;
    let style = &node.style;
    let _ = write!(
        out,
        r#"<g class="node" data-username="{}">"#,
        escape_xml(&node.username)
    );
    let shadow = PixelBox::new(
        b.x0 + SHADOW_OFFSET,
        b.y0 + SHADOW_OFFSET,
        b.x1 + SHADOW_OFFSET,
        b.y1 + SHADOW_OFFSET,
    );
    rounded_rect(out, "shadow", shadow, node.radius, Some(style.shadow), None);
    rounded_rect(
        out,
        "card",
        b,
        node.radius,
        Some(style.fill),
        Some((style.border, node.border_width)),
    );
    if let Some(stripe) = style.stripe {
        let sw = PixelBox::new(b.x0, b.y0, b.x0 + node.stripe_width, b.y1);
        rounded_rect(out, "stripe", sw, node.radius, Some(stripe), Some((stripe, 1)));
    }
    if node.highlighted {
        let outline = PixelBox::new(b.x0 - 2, b.y0 - 2, b.x1 + 2, b.y1 + 2);
        rounded_rect(
            out,
            "highlight",
            outline,
            node.radius,
            None,
            Some((HIGHLIGHT_COLOR, highlight_width)),
        );
    }
    text_block(out, &node.name, Some("600"));
    text_block(out, &node.detail, None);
    if let Some(mail) = &node.mail {
        text_block(out, mail, None);
    }
    out.push_str("</g>");
}

/// Rounded rectangle whose stroke stays inside `b`.
fn rounded_rect(
    out: &mut String,
    class: &str,
    b: PixelBox,
    radius: i64,
    fill: Option<Rgb>,
    stroke: Option<(Rgb, i64)>,
) {
    let inset = stroke.map(|(_, w)| w as f64 / 2.0).unwrap_or(0.0);
    let x = b.x0 as f64 + inset;
    let y = b.y0 as f64 + inset;
    let w = (b.width() as f64 - inset * 2.0).max(0.0);
    let h = (b.height() as f64 - inset * 2.0).max(0.0);
    let fill = fill.map(|c| c.to_hex()).unwrap_or_else(|| "none".to_string());
    let _ = write!(
        out,
        r#"<rect class="{class}" x="{}" y="{}" width="{}" height="{}" rx="{radius}" ry="{radius}" fill="{fill}""#,
        fmt(x),
        fmt(y),
        fmt(w),
        fmt(h)
    );
    if let Some((color, width)) = stroke {
        let _ = write!(out, r#" stroke="{color}" stroke-width="{width}""#);
    }
    out.push_str("/>");
}

/// One `<text>` per line; `block.y` is the top of the first line.
fn text_block(out: &mut String, block: &TextBlock, weight: Option<&str>) {
    let ascent = (block.font_size as f64 * 0.8).round() as i64;
    let step = line_height(block.font_size);
    let weight = weight
        .map(|w| format!(r#" font-weight="{w}""#))
        .unwrap_or_default();
    for (i, line) in block.lines.iter().enumerate() {
        let y = block.y + ascent + i as i64 * step;
        let _ = write!(
            out,
            r#"<text x="{}" y="{y}" font-size="{}" fill="{}"{weight}>{}</text>"#,
            block.x,
            block.font_size,
            block.fill,
            escape_xml(line)
        );
    }
}

fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let v = if v.abs() < 1e-9 { 0.0 } else { v };
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_drops_trailing_zero() {
        assert_eq!(fmt(12.0), "12");
        assert_eq!(fmt(12.5), "12.5");
        assert_eq!(fmt(-0.0), "0");
    }

    #[test]
    fn blank_layout_is_just_the_canvas() {
        let layout = ChartLayout::blank(900, 600, 1.0);
        let svg = render_chart_svg(&layout, &SvgRenderOptions::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 900 600""#));
        assert!(svg.contains(r##"fill="#f8fafc""##));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn escapes_markup_in_ids() {
        let options = SvgRenderOptions {
            diagram_id: Some("a<b>&\"c\"".to_string()),
            ..SvgRenderOptions::default()
        };
        let svg = render_chart_svg(&ChartLayout::blank(10, 10, 1.0), &options);
        assert!(svg.contains(r#"id="a&lt;b&gt;&amp;&quot;c&quot;""#));
    }
}
