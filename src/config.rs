//! Configuration types for Markdown-to-PDF conversion.
//!
//! Two layers live here:
//!
//! * [`ConversionConfig`]: the user-facing knobs (paper/language/color
//!   *codes*, title, page numbers, image ratio …), built via
//!   [`ConversionConfigBuilder`]. This is what the CLI fills in.
//! * [`RenderConfig`]: the concrete layout/theme structure the codes resolve
//!   to (page size, margins, font stacks, highlight and diagram themes).
//!   Produced by [`crate::tables::ConfigResolver`] and immutable afterwards.

use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Paper codes accepted by `--paper`. A trailing `r` selects landscape.
pub const PAPER_CODES: [&str; 10] = [
    "a3", "a3r", "a4", "a4r", "a5", "a5r", "letter", "letterr", "legal", "legalr",
];

/// Language codes accepted by `--lang`.
pub const LANGUAGE_CODES: [&str; 5] = ["latin", "ja", "ko", "cn", "tw"];

/// Color codes accepted by `--color`.
pub const COLOR_CODES: [&str; 3] = ["color", "grayscale", "monochrome"];

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .paper("a4r")
///     .language("ja")
///     .show_page_numbers(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.paper, "a4r");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Paper code, one of [`PAPER_CODES`]. Default: `a4`.
    pub paper: String,

    /// Language code, one of [`LANGUAGE_CODES`]. Default: `latin`.
    pub language: String,

    /// Color code, one of [`COLOR_CODES`]. Default: `color`.
    pub color: String,

    /// Explicit document title. Empty or `None` falls back to the first
    /// level-1 heading.
    pub title: Option<String>,

    /// Print page numbers in the footer. Default: true.
    pub show_page_numbers: bool,

    /// Raster image width as a percentage of the natural width. Default: 100.
    pub image_scale_percent: u32,

    /// Disable first-line paragraph indentation. Default: false.
    pub no_indent: bool,

    /// Log every `(anchor id, heading text)` pair to stderr. Default: false.
    pub anchor_debug: bool,

    /// Directory that relative image paths are resolved against.
    /// Default: the process working directory at build time.
    pub base_dir: PathBuf,

    /// Directory holding stylesheets and scripts (`style/`, `script/`).
    pub resource_dir: PathBuf,

    /// Scale factor passed to the PDF exporter. Range: 0.1–2.0. Default: 0.8.
    pub pdf_scale: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            paper: "a4".to_string(),
            language: "latin".to_string(),
            color: "color".to_string(),
            title: None,
            show_page_numbers: true,
            image_scale_percent: 100,
            no_indent: false,
            anchor_debug: false,
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            resource_dir: default_resource_dir(),
            pdf_scale: 0.8,
        }
    }
}

/// The `resource/` directory shipped next to this crate's manifest.
pub fn default_resource_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resource")
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn paper(mut self, code: impl Into<String>) -> Self {
        self.config.paper = code.into();
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.config.language = code.into();
        self
    }

    pub fn color(mut self, code: impl Into<String>) -> Self {
        self.config.color = code.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn show_page_numbers(mut self, v: bool) -> Self {
        self.config.show_page_numbers = v;
        self
    }

    pub fn image_scale_percent(mut self, pct: u32) -> Self {
        self.config.image_scale_percent = pct;
        self
    }

    pub fn no_indent(mut self, v: bool) -> Self {
        self.config.no_indent = v;
        self
    }

    pub fn anchor_debug(mut self, v: bool) -> Self {
        self.config.anchor_debug = v;
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = dir.into();
        self
    }

    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resource_dir = dir.into();
        self
    }

    pub fn pdf_scale(mut self, scale: f64) -> Self {
        self.config.pdf_scale = scale;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Codes are checked later by [`crate::tables::ConfigResolver`], which
    /// owns the lookup tables.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.image_scale_percent == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Image ratio must be ≥ 1 percent".into(),
            ));
        }
        if !(0.1..=2.0).contains(&c.pdf_scale) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "PDF scale must be 0.1–2.0, got {}",
                c.pdf_scale
            )));
        }
        Ok(self.config)
    }
}

// ── Resolved layout/theme structures ─────────────────────────────────────

/// Physical paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait width and height in inches, as the PDF exporter expects them.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (11.69, 16.54),
            PageSize::A4 => (8.27, 11.69),
            PageSize::A5 => (5.83, 8.27),
            PageSize::Letter => (8.5, 11.0),
            PageSize::Legal => (8.5, 14.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn is_landscape(&self) -> bool {
        matches!(self, Orientation::Landscape)
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margin {
    pub const fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// The same margins in inches: `(top, bottom, left, right)`.
    pub fn to_inches(&self) -> (f64, f64, f64, f64) {
        const MM_PER_INCH: f64 = 25.4;
        (
            self.top / MM_PER_INCH,
            self.bottom / MM_PER_INCH,
            self.left / MM_PER_INCH,
            self.right / MM_PER_INCH,
        )
    }
}

/// Diagram engine theme: a base theme name plus variable overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramTheme {
    pub name: String,
    pub variables: BTreeMap<String, String>,
}

impl DiagramTheme {
    /// The `mermaid.initialize` argument for this theme.
    pub fn initialize_options(&self) -> serde_json::Value {
        serde_json::json!({
            "startOnLoad": false,
            "theme": self.name,
            "themeVariables": self.variables,
        })
    }
}

/// Concrete layout and theme settings for one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margin: Margin,
    /// Font families in fallback order; a Latin serif always comes first.
    pub font_families: Vec<String>,
    /// HTML `lang` attribute value; empty for Latin text.
    pub language_tag: String,
    /// Syntax highlighting theme; `None` disables highlight colouring.
    pub highlight_theme: Option<String>,
    pub diagram_theme: DiagramTheme,
    pub no_indent: bool,
    pub show_page_numbers: bool,
    pub image_scale_percent: u32,
    pub anchor_debug: bool,
    /// Stylesheets to inject, relative to the resource directory.
    pub stylesheets: Vec<String>,
}

impl RenderConfig {
    /// Font stack for inline CSS: `'Noto Serif','Noto Serif CJK JP'`.
    pub fn font_stack(&self) -> String {
        self.font_families
            .iter()
            .map(|family| format!("'{family}'"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.paper, "a4");
        assert_eq!(config.language, "latin");
        assert_eq!(config.color, "color");
        assert!(config.show_page_numbers);
        assert_eq!(config.image_scale_percent, 100);
        assert!((config.pdf_scale - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_rejects_zero_ratio() {
        let err = ConversionConfig::builder()
            .image_scale_percent(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_out_of_range_scale() {
        assert!(ConversionConfig::builder().pdf_scale(3.0).build().is_err());
        assert!(ConversionConfig::builder().pdf_scale(1.0).build().is_ok());
    }

    #[test]
    fn margin_to_inches() {
        let (top, _, left, _) = Margin::new(25.4, 0.0, 12.7, 0.0).to_inches();
        assert!((top - 1.0).abs() < 1e-9);
        assert!((left - 0.5).abs() < 1e-9);
    }

    #[test]
    fn diagram_initialize_options() {
        let theme = DiagramTheme {
            name: "neutral".into(),
            variables: BTreeMap::from([("lineColor".to_string(), "#333333".to_string())]),
        };
        let opts = theme.initialize_options();
        assert_eq!(opts["theme"], "neutral");
        assert_eq!(opts["startOnLoad"], false);
        assert_eq!(opts["themeVariables"]["lineColor"], "#333333");
    }

    #[test]
    fn code_lists_are_distinct() {
        let mut papers = PAPER_CODES.to_vec();
        papers.sort_unstable();
        papers.dedup();
        assert_eq!(papers.len(), PAPER_CODES.len());
    }
}
