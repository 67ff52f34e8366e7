#![forbid(unsafe_code)]

//! `orgchart` renders organization charts from employee tables without a GUI.
//!
//! The data model (table normalization, person repository, manager hierarchy, title colors) is
//! re-exported from `orgchart-core`.
//!
//! # Features
//!
//! - `render`: enable layout + SVG rendering (`orgchart::render`)
//! - `raster`: enable rasterization, the fast-preview rescale, PNG/PDF export and
//!   [`render::session::ChartSession`]

pub use orgchart_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use orgchart_render::model::{
        ChartLayout, ColorStyle, Connector, ForestLayout, GridPos, LegendLayout, NodeBox, PixelBox,
        PixelPoint, TreeLayout,
    };
    pub use orgchart_render::svg::SvgRenderOptions;
    pub use orgchart_render::{ChartMetrics, ChartOptions, layout_chart, layout_forest, layout_tree};

    use orgchart_core::{Hierarchy, PersonRepository};

    #[cfg(feature = "raster")]
    pub mod export;
    #[cfg(feature = "raster")]
    pub mod raster;
    #[cfg(feature = "raster")]
    pub mod session;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Data(#[from] orgchart_core::Error),
        #[error(transparent)]
        Render(#[from] orgchart_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string (e.g. a file stem) into a conservative SVG `id` token.
    ///
    /// Unsupported characters become `-`, and the id is prefixed with `org-` when it does not
    /// start with an ASCII letter.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return "org-chart".to_string();
        }

        let mut out = String::with_capacity(raw.len() + 4);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }
        if !out.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            out.insert_str(0, "org-");
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() || out == "org" {
            return "org-chart".to_string();
        }
        out.to_string()
    }

    /// Rejects manager cycles, then computes the chart geometry.
    pub fn relayout(
        people: &PersonRepository,
        hierarchy: &Hierarchy,
        options: &ChartOptions,
    ) -> Result<ChartLayout> {
        hierarchy
            .ensure_acyclic()
            .map_err(orgchart_core::Error::from)?;
        Ok(layout_chart(people, hierarchy, options)?)
    }

    /// Relayout followed by SVG scene rendering.
    pub fn relayout_and_render_svg(
        people: &PersonRepository,
        hierarchy: &Hierarchy,
        options: &ChartOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<(ChartLayout, String)> {
        let layout = relayout(people, hierarchy, options)?;
        let svg = orgchart_render::render_chart_svg(&layout, svg_options);
        tracing::info!(
            nodes = layout.nodes.len(),
            width = layout.width,
            height = layout.height,
            "rendered chart scene"
        );
        Ok((layout, svg))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sanitize_svg_id_is_conservative() {
            assert_eq!(sanitize_svg_id("Şirket Şeması"), "org-irket-emas");
            assert_eq!(sanitize_svg_id("company chart"), "company-chart");
            assert_eq!(sanitize_svg_id("2024"), "org-2024");
            assert_eq!(sanitize_svg_id("   "), "org-chart");
        }
    }
}
