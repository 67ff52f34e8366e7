//! PNG/PDF export of an authoritative [`RenderedChart`].

use crate::render::raster::RenderedChart;
use base64::Engine as _;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use std::path::Path;
use std::str::FromStr;

/// Resolution the PDF page embeds the raster at.
pub const PDF_DPI: f32 = 300.0;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[from] image::ImageError),
    #[error("failed to parse SVG page for PDF export")]
    SvgParse,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
    #[error("unsupported export format: {value} (expected png or pdf)")]
    UnsupportedFormat { value: String },
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

impl ExportFormat {
    /// Format implied by the path extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ExportError::UnsupportedFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Lossless RGBA8 PNG of the rendered bitmap.
pub fn encode_png(chart: &RenderedChart) -> Result<Vec<u8>> {
    let img = chart.image();
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Single-page PDF embedding the rendered bitmap at [`PDF_DPI`].
pub fn encode_pdf(chart: &RenderedChart) -> Result<Vec<u8>> {
    let png = encode_png(chart)?;
    let (w, h) = (chart.width(), chart.height());
    let data = base64::engine::general_purpose::STANDARD.encode(png);
    let page = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><image x="0" y="0" width="{w}" height="{h}" xlink:href="data:image/png;base64,{data}"/></svg>"#
    );

    let opt = svg2pdf::usvg::Options::default();
    let tree = svg2pdf::usvg::Tree::from_str(&page, &opt).map_err(|_| ExportError::SvgParse)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions { dpi: PDF_DPI },
    )
    .map_err(|_| ExportError::PdfConvert)
}

pub fn encode(chart: &RenderedChart, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(chart),
        ExportFormat::Pdf => encode_pdf(chart),
    }
}

/// Encodes and writes `chart`. Nothing is written when encoding fails.
pub fn export_chart(chart: &RenderedChart, path: &Path, format: ExportFormat) -> Result<()> {
    let bytes = encode(chart, format)?;
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        format = format.extension(),
        width = chart.width(),
        height = chart.height(),
        "exported chart"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_selector_and_extension() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/chart.pdf")).unwrap(),
            ExportFormat::Pdf
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("chart.jpg")),
            Err(ExportError::UnsupportedFormat { .. })
        ));
        assert!(ExportFormat::from_path(Path::new("chart")).is_err());
    }
}
