//! Pixel geometry for a laid-out org chart.

use crate::layout::layout_forest;
use crate::model::{
    ChartLayout, ColorStyle, Connector, LegendItem, LegendLayout, NodeBox, NodeStyle, PixelBox,
    PixelPoint, TextBlock,
};
use crate::text::wrap_text;
use crate::{Error, Result};
use indexmap::IndexMap;
use orgchart_core::{Hierarchy, Person, PersonRepository, Rgb, TitleColors};
use std::collections::BTreeSet;

pub const CANVAS_BG: Rgb = Rgb(248, 250, 252);
pub const BOX_BG: Rgb = Rgb(255, 255, 255);
pub const BOX_BORDER: Rgb = Rgb(39, 94, 254);
pub const BOX_SHADOW: Rgb = Rgb(225, 230, 240);
pub const LINE_COLOR: Rgb = Rgb(120, 144, 156);
pub const TEXT_COLOR: Rgb = Rgb(26, 32, 44);
pub const SUBTEXT_COLOR: Rgb = Rgb(88, 96, 108);
pub const HIGHLIGHT_COLOR: Rgb = Rgb(220, 53, 69);
pub const LEGEND_BG: Rgb = Rgb(255, 255, 255);
pub const LEGEND_BORDER: Rgb = Rgb(220, 225, 235);
pub const LEGEND_HEADING_COLOR: Rgb = Rgb(40, 40, 40);
pub const LEGEND_TEXT_COLOR: Rgb = Rgb(60, 60, 60);

pub const BLANK_CANVAS: (u32, u32) = (900, 600);
pub const SHADOW_OFFSET: i64 = 3;
pub const DARK_TEXT_THRESHOLD: f64 = 0.55;
pub const SUBTITLE_SEPARATOR: &str = "  |  ";

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    /// Render scale; UI callers clamp to `0.5..=2.0`, any finite positive value is accepted.
    pub scale: f64,
    /// Draw only the subtree under this username when it is present.
    pub start_from: Option<String>,
    pub title_colors: TitleColors,
    pub show_department: bool,
    pub show_mail: bool,
    pub highlight: Option<String>,
    pub color_style: ColorStyle,
    pub legend: bool,
    pub legend_heading: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            start_from: None,
            title_colors: TitleColors::default(),
            show_department: true,
            show_mail: true,
            highlight: None,
            color_style: ColorStyle::Background,
            legend: true,
            legend_heading: "Title Colors".to_string(),
        }
    }
}

/// Base metrics multiplied by the render scale and truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartMetrics {
    pub box_w: i64,
    pub box_h: i64,
    pub pad: i64,
    pub row_gap: i64,
    pub col_gap: i64,
    pub legend_w: i64,
    pub radius: i64,
    pub border_w: i64,
    pub line_w: i64,
    pub highlight_w: i64,
    pub stripe_w: i64,
    pub text_pad: i64,
    pub name_dy: i64,
    pub detail_dy: i64,
    pub mail_dy: i64,
    pub name_font: i64,
    pub detail_font: i64,
    pub name_wrap: usize,
    pub detail_wrap: usize,
}

impl ChartMetrics {
    pub fn for_scale(scale: f64) -> Self {
        let px = |base: f64| (base * scale) as i64;
        let small = scale < 1.0;
        Self {
            box_w: px(300.0),
            box_h: px(88.0),
            pad: px(44.0),
            row_gap: px(90.0),
            col_gap: px(42.0),
            legend_w: px(260.0),
            radius: px(18.0),
            border_w: px(2.0).max(1),
            line_w: px(2.0).max(1),
            highlight_w: px(3.0).max(2),
            stripe_w: px(16.0),
            text_pad: px(12.0),
            name_dy: px(10.0),
            detail_dy: px(36.0),
            mail_dy: px(58.0),
            name_font: px(17.0).max(11),
            detail_font: px(13.0).max(10),
            name_wrap: if small { 24 } else { 30 },
            detail_wrap: if small { 36 } else { 46 },
        }
    }
}

/// Computes the full chart geometry: node cards, connectors, legend and per-node bboxes.
///
/// An empty repository yields a blank 900×600 canvas. Any manager cycle in the hierarchy is an
/// error, even when it is not reachable from the drawn roots.
pub fn layout_chart(
    people: &PersonRepository,
    hierarchy: &Hierarchy,
    options: &ChartOptions,
) -> Result<ChartLayout> {
    let scale = options.scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidScale { scale });
    }
    hierarchy.ensure_acyclic()?;
    if people.is_empty() {
        return Ok(ChartLayout::blank(BLANK_CANVAS.0, BLANK_CANVAS.1, scale));
    }

    let roots = draw_roots(people, hierarchy, options.start_from.as_deref());
    let forest = layout_forest(hierarchy.children_map(), &roots)?;
    let m = ChartMetrics::for_scale(scale);

    let legend_titles = if options.legend {
        colored_titles(people, &options.title_colors)
    } else {
        Vec::new()
    };
    let legend_w = if legend_titles.is_empty() { 0 } else { m.legend_w };

    let cols = forest.columns as i64;
    let levels = forest.levels as i64;
    let width = m.pad * 2 + cols * m.box_w + (cols - 1) * m.col_gap + legend_w;
    let height = m.pad * 2 + levels * m.box_h + (levels - 1) * m.row_gap;

    let slot = |column: usize, depth: usize| -> PixelBox {
        let x0 = m.pad + column as i64 * (m.box_w + m.col_gap);
        let y0 = m.pad + depth as i64 * (m.box_h + m.row_gap);
        PixelBox::new(x0, y0, x0 + m.box_w, y0 + m.box_h)
    };

    let mut connectors = Vec::new();
    let mut nodes = Vec::with_capacity(forest.node_count());
    let mut bboxes = IndexMap::with_capacity(forest.node_count());
    for (tree, offset) in forest.trees.iter().zip(&forest.offsets) {
        for (u, pos) in &tree.positions {
            let parent = slot(offset + pos.column, pos.depth);
            for v in hierarchy.children(u) {
                let Some(child_pos) = tree.position(v) else {
                    continue;
                };
                let child = slot(offset + child_pos.column, child_pos.depth);
                let px = parent.x0 + m.box_w / 2;
                let cx = child.x0 + m.box_w / 2;
                let mid = (parent.y1 + child.y0).div_euclid(2);
                connectors.push(Connector {
                    from: u.clone(),
                    to: v.clone(),
                    points: [
                        PixelPoint { x: px, y: parent.y1 },
                        PixelPoint { x: px, y: mid },
                        PixelPoint { x: cx, y: mid },
                        PixelPoint { x: cx, y: child.y0 },
                    ],
                });
            }
        }

        for (u, pos) in &tree.positions {
            let Some(person) = people.get(u) else {
                continue;
            };
            let mut grid = *pos;
            grid.column += offset;
            let bbox = slot(grid.column, grid.depth);
            bboxes.insert(u.clone(), bbox);
            let highlighted = options.highlight.as_deref() == Some(u.as_str());
            nodes.push(node_box(person, grid, bbox, highlighted, &m, options));
        }
    }

    let legend = (!legend_titles.is_empty())
        .then(|| legend_layout(&legend_titles, width, scale, &options.legend_heading));

    tracing::debug!(
        nodes = nodes.len(),
        roots = roots.len(),
        width,
        height,
        scale,
        "chart layout computed"
    );

    Ok(ChartLayout {
        width: width.max(1) as u32,
        height: height.max(1) as u32,
        scale,
        line_width: m.line_w,
        highlight_width: m.highlight_w,
        connectors,
        nodes,
        legend,
        bboxes,
    })
}

/// Root override when present, else the hierarchy roots, else the first person.
fn draw_roots(
    people: &PersonRepository,
    hierarchy: &Hierarchy,
    start_from: Option<&str>,
) -> Vec<String> {
    if let Some(start) = start_from.filter(|s| people.contains(s)) {
        return vec![start.to_string()];
    }
    if !hierarchy.roots().is_empty() {
        return hierarchy.roots().to_vec();
    }
    people.usernames().take(1).map(str::to_string).collect()
}

/// Distinct titles (over the whole repository) that have a color, sorted.
fn colored_titles(people: &PersonRepository, colors: &TitleColors) -> Vec<(String, Rgb)> {
    if colors.is_empty() {
        return Vec::new();
    }
    let titles: BTreeSet<&str> = people
        .iter()
        .map(|p| p.title.as_str())
        .filter(|t| colors.get(t).is_some())
        .collect();
    titles
        .into_iter()
        .filter_map(|t| colors.get(t).map(|c| (t.to_string(), c)))
        .collect()
}

/// White text on dark fills, dark slate on light ones.
pub fn text_color_for(fill: Rgb) -> Rgb {
    if fill.relative_luminance() < DARK_TEXT_THRESHOLD {
        Rgb(255, 255, 255)
    } else {
        TEXT_COLOR
    }
}

pub fn node_style(title_color: Option<Rgb>, color_style: ColorStyle) -> NodeStyle {
    match (title_color, color_style) {
        (Some(fill), ColorStyle::Background) => NodeStyle {
            fill,
            border: fill.scaled(0.75),
            shadow: fill.scaled(0.85),
            text_main: text_color_for(fill),
            text_sub: text_color_for(fill.scaled(1.1)),
            stripe: None,
        },
        (stripe, _) => NodeStyle {
            fill: BOX_BG,
            border: BOX_BORDER,
            shadow: BOX_SHADOW,
            text_main: TEXT_COLOR,
            text_sub: SUBTEXT_COLOR,
            stripe,
        },
    }
}

fn node_box(
    person: &Person,
    grid: crate::model::GridPos,
    bbox: PixelBox,
    highlighted: bool,
    m: &ChartMetrics,
    options: &ChartOptions,
) -> NodeBox {
    let style = node_style(options.title_colors.get(&person.title), options.color_style);

    let mut detail = person.title.clone();
    if options.show_department && !person.department.is_empty() {
        detail.push_str(SUBTITLE_SEPARATOR);
        detail.push_str(&person.department);
    }

    let x = bbox.x0 + m.text_pad;
    let mail = (options.show_mail && !person.mail.is_empty()).then(|| TextBlock {
        x,
        y: bbox.y0 + m.mail_dy,
        font_size: m.detail_font,
        lines: vec![person.mail.clone()],
        fill: style.text_sub,
    });

    NodeBox {
        username: person.username.clone(),
        grid,
        bbox,
        radius: m.radius,
        border_width: m.border_w,
        stripe_width: m.stripe_w,
        name: TextBlock {
            x,
            y: bbox.y0 + m.name_dy,
            font_size: m.name_font,
            lines: wrap_text(person.display_name(), m.name_wrap),
            fill: style.text_main,
        },
        detail: TextBlock {
            x,
            y: bbox.y0 + m.detail_dy,
            font_size: m.detail_font,
            lines: wrap_text(&detail, m.detail_wrap),
            fill: style.text_sub,
        },
        mail,
        style,
        highlighted,
    }
}

fn legend_layout(items: &[(String, Rgb)], width: i64, scale: f64, heading: &str) -> LegendLayout {
    let px = |base: f64| (base * scale) as i64;
    let legend_w = px(260.0);
    let x0 = width - legend_w + px(12.0);
    let y0 = px(16.0);
    let x1 = width - px(12.0);
    let y1 = y0 + ((items.len() as f64 * 24.0 + 56.0) * scale) as i64;
    let inset = x0 + px(12.0);
    let swatch = px(18.0);
    let label_font = px(12.0).max(10);

    let mut y = y0 + px(40.0);
    let mut out = Vec::with_capacity(items.len());
    for (title, color) in items {
        out.push(LegendItem {
            title: title.clone(),
            color: *color,
            swatch: PixelBox::new(inset, y, inset + swatch, y + swatch),
            label: TextBlock {
                x: inset + swatch + px(10.0),
                y: y - 2,
                font_size: label_font,
                lines: vec![title.clone()],
                fill: LEGEND_TEXT_COLOR,
            },
        });
        y += px(24.0);
    }

    LegendLayout {
        bbox: PixelBox::new(x0, y0, x1, y1),
        radius: px(12.0),
        heading: TextBlock {
            x: inset,
            y: y0 + px(12.0),
            font_size: px(15.0).max(11),
            lines: vec![heading.to_string()],
            fill: LEGEND_HEADING_COLOR,
        },
        swatch_radius: px(6.0),
        items: out,
    }
}
