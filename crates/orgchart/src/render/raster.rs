#![forbid(unsafe_code)]

//! SVG rasterization and the two ways of getting a bitmap at a new scale.
//!
//! [`relayout_and_render`] recomputes geometry and yields the authoritative [`RenderedChart`]
//! (bitmap + per-node bboxes). [`approximate_rescale`] only resamples an existing render and
//! yields a [`PreviewImage`], which cannot be exported or used for bbox lookups.

use crate::render::{ChartLayout, ChartOptions, HeadlessError, PixelBox, SvgRenderOptions};
use image::RgbaImage;
use image::imageops::FilterType;
use orgchart_core::{Hierarchy, PersonRepository};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Headless(#[from] HeadlessError),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Fill painted before the scene; `None` keeps transparent pixels.
    pub background: Option<String>,
    pub font_family: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            background: None,
            font_family: "Arial".to_string(),
        }
    }
}

/// Authoritative render: bitmap, bboxes and the scale both were computed at.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    image: RgbaImage,
    layout: ChartLayout,
}

impl RenderedChart {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn scale(&self) -> f64 {
        self.layout.scale
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bbox(&self, username: &str) -> Option<PixelBox> {
        self.layout.bboxes.get(username).copied()
    }

    pub fn bboxes(&self) -> impl Iterator<Item = (&str, PixelBox)> {
        self.layout.bboxes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Resampled copy of a [`RenderedChart`]. Geometry queries go through the source render.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    image: RgbaImage,
    scale: f64,
    source_scale: f64,
}

impl PreviewImage {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Scale the preview approximates.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scale of the render it was resampled from.
    pub fn source_scale(&self) -> f64 {
        self.source_scale
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Relayout (with cycle check), SVG scene, then rasterization at 1:1.
pub fn relayout_and_render(
    people: &PersonRepository,
    hierarchy: &Hierarchy,
    options: &ChartOptions,
    svg_options: &SvgRenderOptions,
    raster: &RasterOptions,
) -> Result<RenderedChart> {
    let (layout, svg) =
        super::relayout_and_render_svg(people, hierarchy, options, svg_options)?;
    render_layout(layout, &svg, raster)
}

/// Rasterizes an already computed layout and its SVG scene.
pub fn render_layout(
    layout: ChartLayout,
    svg: &str,
    raster: &RasterOptions,
) -> Result<RenderedChart> {
    let image = svg_to_rgba(svg, raster)?;
    Ok(RenderedChart { image, layout })
}

/// Bilinear resample of the last authoritative render by `factor`.
pub fn approximate_rescale(chart: &RenderedChart, factor: f64) -> PreviewImage {
    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    };
    let w = ((f64::from(chart.width()) * factor) as u32).max(1);
    let h = ((f64::from(chart.height()) * factor) as u32).max(1);
    let image = image::imageops::resize(&chart.image, w, h, FilterType::Triangle);
    PreviewImage {
        image,
        scale: chart.scale() * factor,
        source_scale: chart.scale(),
    }
}

pub fn svg_to_rgba(svg: &str, options: &RasterOptions) -> Result<RgbaImage> {
    let pixmap = svg_to_pixmap(svg, options)?;
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut data = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(w, h, data).ok_or(RasterError::PixmapAlloc)
}

fn svg_to_pixmap(svg: &str, options: &RasterOptions) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    // Keep output stable-ish across environments while still using system fonts.
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = options.font_family.clone();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    let size = tree.size();
    let width_px = size.width().ceil().max(1.0) as u32;
    let height_px = size.height().ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    if let Some(color) = options.background.as_deref().and_then(parse_tiny_skia_color) {
        pixmap.fill(color);
    }
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    Ok(pixmap)
}

fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255)),
        "black" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
        _ => {}
    }
    let rgb = orgchart_core::Rgb::from_hex(&s)?;
    Some(tiny_skia::Color::from_rgba8(rgb.0, rgb.1, rgb.2, 255))
}
