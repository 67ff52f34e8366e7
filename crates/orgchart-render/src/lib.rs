#![forbid(unsafe_code)]

//! Headless org chart layout and SVG scene rendering.
//!
//! [`layout::layout_forest`] assigns grid slots, [`chart::layout_chart`] turns them into pixel
//! geometry and [`svg::render_chart_svg`] emits the scene. Rasterization lives in the `orgchart`
//! facade behind the `raster` feature.

pub mod chart;
pub mod layout;
pub mod model;
pub mod svg;
pub mod text;

pub use chart::{ChartMetrics, ChartOptions, layout_chart};
pub use layout::{layout_forest, layout_tree};
pub use model::{
    ChartLayout, ColorStyle, Connector, ForestLayout, GridPos, LegendItem, LegendLayout, NodeBox,
    NodeStyle, PixelBox, PixelPoint, TextBlock, TreeLayout,
};
pub use svg::{SvgRenderOptions, render_chart_svg};

use orgchart_core::CycleError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("unknown layout root: {root}")]
    UnknownRoot { root: String },
    #[error("invalid render scale: {scale}")]
    InvalidScale { scale: f64 },
    #[error("chart layout JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
