//! Lookup tables and the resolver that turns paper/language/color codes into
//! a [`RenderConfig`].
//!
//! The tables are plain immutable data. [`ConfigTables::builtin()`] builds
//! them once at start-up and callers hand a reference to
//! [`ConfigResolver::new`]; nothing here is global or mutable.

use crate::config::{
    ConversionConfig, DiagramTheme, Margin, Orientation, PageSize, RenderConfig, COLOR_CODES,
    LANGUAGE_CODES, PAPER_CODES,
};
use crate::error::Md2PdfError;
use std::collections::BTreeMap;
use tracing::debug;

/// One row of the paper table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperSpec {
    pub code: &'static str,
    pub size: PageSize,
    pub orientation: Orientation,
}

/// One row of the language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSpec {
    pub code: &'static str,
    pub font_families: &'static [&'static str],
    pub language_tag: &'static str,
}

/// One row of the color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpec {
    pub code: &'static str,
    pub highlight_theme: Option<&'static str>,
    pub diagram_theme: &'static str,
    pub diagram_variables: &'static [(&'static str, &'static str)],
}

/// All lookup tables the resolver consults.
#[derive(Debug, Clone)]
pub struct ConfigTables {
    pub papers: Vec<PaperSpec>,
    pub languages: Vec<LanguageSpec>,
    pub colors: Vec<ColorSpec>,
    pub portrait_margin: Margin,
    pub landscape_margin: Margin,
}

impl ConfigTables {
    /// The tables md2pdf ships with.
    pub fn builtin() -> Self {
        let sizes = [
            PageSize::A3,
            PageSize::A3,
            PageSize::A4,
            PageSize::A4,
            PageSize::A5,
            PageSize::A5,
            PageSize::Letter,
            PageSize::Letter,
            PageSize::Legal,
            PageSize::Legal,
        ];
        let papers = PAPER_CODES
            .iter()
            .zip(sizes)
            .map(|(&code, size)| PaperSpec {
                code,
                size,
                orientation: if code.ends_with('r') {
                    Orientation::Landscape
                } else {
                    Orientation::Portrait
                },
            })
            .collect();

        let languages = vec![
            LanguageSpec {
                code: "latin",
                font_families: &["Noto Serif"],
                language_tag: "",
            },
            LanguageSpec {
                code: "ja",
                font_families: &["Noto Serif", "BIZ UDPMincho", "Noto Serif CJK JP"],
                language_tag: "ja",
            },
            LanguageSpec {
                code: "ko",
                font_families: &["Noto Serif", "Noto Serif KR", "Noto Serif CJK KR"],
                language_tag: "ko",
            },
            LanguageSpec {
                code: "cn",
                font_families: &["Noto Serif", "Noto Serif SC", "Noto Serif CJK SC"],
                language_tag: "zh-CN",
            },
            LanguageSpec {
                code: "tw",
                font_families: &["Noto Serif", "Noto Serif TC", "Noto Serif CJK TC"],
                language_tag: "zh-TW",
            },
        ];

        let colors = vec![
            ColorSpec {
                code: "color",
                highlight_theme: Some("InspiredGitHub"),
                diagram_theme: "default",
                diagram_variables: COLOR_VARIABLES,
            },
            ColorSpec {
                code: "grayscale",
                highlight_theme: Some("InspiredGitHub"),
                diagram_theme: "neutral",
                diagram_variables: GRAYSCALE_VARIABLES,
            },
            ColorSpec {
                code: "monochrome",
                highlight_theme: None,
                diagram_theme: "base",
                diagram_variables: MONOCHROME_VARIABLES,
            },
        ];

        Self {
            papers,
            languages,
            colors,
            portrait_margin: Margin::new(16.0, 16.0, 12.0, 12.0),
            landscape_margin: Margin::new(12.0, 12.0, 16.0, 16.0),
        }
    }

    pub fn paper(&self, code: &str) -> Option<&PaperSpec> {
        self.papers.iter().find(|p| p.code == code)
    }

    pub fn language(&self, code: &str) -> Option<&LanguageSpec> {
        self.languages.iter().find(|l| l.code == code)
    }

    pub fn color(&self, code: &str) -> Option<&ColorSpec> {
        self.colors.iter().find(|c| c.code == code)
    }

    /// Margins are a function of orientation alone, never of paper size.
    pub fn margin_for(&self, orientation: Orientation) -> Margin {
        match orientation {
            Orientation::Portrait => self.portrait_margin,
            Orientation::Landscape => self.landscape_margin,
        }
    }
}

impl Default for ConfigTables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Maps enumerated codes to a concrete [`RenderConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'t> {
    tables: &'t ConfigTables,
}

impl<'t> ConfigResolver<'t> {
    pub fn new(tables: &'t ConfigTables) -> Self {
        Self { tables }
    }

    /// Resolve the three codes, with default values for every other option.
    ///
    /// # Errors
    /// [`Md2PdfError::UnknownCode`] when any code is outside its table.
    pub fn resolve(
        &self,
        paper: &str,
        language: &str,
        color: &str,
    ) -> Result<RenderConfig, Md2PdfError> {
        let paper_spec = self
            .tables
            .paper(paper)
            .ok_or_else(|| unknown("paper", paper, &PAPER_CODES))?;
        let language_spec = self
            .tables
            .language(language)
            .ok_or_else(|| unknown("language", language, &LANGUAGE_CODES))?;
        let color_spec = self
            .tables
            .color(color)
            .ok_or_else(|| unknown("color", color, &COLOR_CODES))?;

        debug!(
            "Resolved paper={} language={} color={}",
            paper, language, color
        );

        Ok(RenderConfig {
            page_size: paper_spec.size,
            orientation: paper_spec.orientation,
            margin: self.tables.margin_for(paper_spec.orientation),
            font_families: language_spec
                .font_families
                .iter()
                .map(|f| f.to_string())
                .collect(),
            language_tag: language_spec.language_tag.to_string(),
            highlight_theme: color_spec.highlight_theme.map(str::to_string),
            diagram_theme: DiagramTheme {
                name: color_spec.diagram_theme.to_string(),
                variables: color_spec
                    .diagram_variables
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            },
            no_indent: false,
            show_page_numbers: true,
            image_scale_percent: 100,
            anchor_debug: false,
            stylesheets: vec![
                "style/base.css".to_string(),
                format!("style/lang/{}.css", language_spec.code),
                format!("style/color/{}.css", color_spec.code),
            ],
        })
    }

    /// Resolve a full [`ConversionConfig`], applying its non-code options.
    pub fn resolve_config(&self, config: &ConversionConfig) -> Result<RenderConfig, Md2PdfError> {
        let mut resolved = self.resolve(&config.paper, &config.language, &config.color)?;
        resolved.no_indent = config.no_indent;
        resolved.show_page_numbers = config.show_page_numbers;
        resolved.image_scale_percent = config.image_scale_percent;
        resolved.anchor_debug = config.anchor_debug;
        Ok(resolved)
    }
}

fn unknown(kind: &'static str, code: &str, expected: &[&str]) -> Md2PdfError {
    Md2PdfError::UnknownCode {
        kind,
        code: code.to_string(),
        expected: expected.join(", "),
    }
}

// ── Diagram theme variables ──────────────────────────────────────────────

const COLOR_VARIABLES: &[(&str, &str)] = &[
    ("primaryColor", "#eceffd"),
    ("primaryTextColor", "#1f2328"),
    ("primaryBorderColor", "#6b7bd6"),
    ("secondaryColor", "#fff7d6"),
    ("tertiaryColor", "#f3f7f1"),
    ("lineColor", "#3d4451"),
    ("textColor", "#1f2328"),
    ("mainBkg", "#eceffd"),
    ("nodeBorder", "#6b7bd6"),
    ("clusterBkg", "#fffbe8"),
    ("clusterBorder", "#c9b458"),
    ("actorBkg", "#eceffd"),
    ("actorBorder", "#6b7bd6"),
    ("actorTextColor", "#1f2328"),
    ("actorLineColor", "#8b93a3"),
    ("signalColor", "#3d4451"),
    ("signalTextColor", "#1f2328"),
    ("labelBoxBkgColor", "#eceffd"),
    ("labelBoxBorderColor", "#6b7bd6"),
    ("noteBkgColor", "#fff5ad"),
    ("noteBorderColor", "#c9b458"),
    ("noteTextColor", "#1f2328"),
    ("sectionBkgColor", "#e7eaf6"),
    ("altSectionBkgColor", "#ffffff"),
    ("taskBkgColor", "#8a90dd"),
    ("taskBorderColor", "#534fbc"),
    ("taskTextColor", "#ffffff"),
    ("activeTaskBkgColor", "#bfc7ff"),
    ("activeTaskBorderColor", "#534fbc"),
    ("doneTaskBkgColor", "#d3d3d3"),
    ("doneTaskBorderColor", "#808080"),
    ("critBkgColor", "#ff8888"),
    ("critBorderColor", "#ff0000"),
    ("gridColor", "#d0d0d0"),
    ("todayLineColor", "#d43f3a"),
];

const GRAYSCALE_VARIABLES: &[(&str, &str)] = &[
    ("primaryColor", "#eeeeee"),
    ("primaryTextColor", "#111111"),
    ("primaryBorderColor", "#555555"),
    ("secondaryColor", "#dddddd"),
    ("tertiaryColor", "#f6f6f6"),
    ("lineColor", "#333333"),
    ("textColor", "#111111"),
    ("mainBkg", "#eeeeee"),
    ("nodeBorder", "#555555"),
    ("clusterBkg", "#f6f6f6"),
    ("clusterBorder", "#888888"),
    ("actorBkg", "#eeeeee"),
    ("actorBorder", "#555555"),
    ("actorTextColor", "#111111"),
    ("actorLineColor", "#777777"),
    ("signalColor", "#333333"),
    ("signalTextColor", "#111111"),
    ("labelBoxBkgColor", "#eeeeee"),
    ("labelBoxBorderColor", "#555555"),
    ("noteBkgColor", "#e4e4e4"),
    ("noteBorderColor", "#888888"),
    ("noteTextColor", "#111111"),
    ("sectionBkgColor", "#e8e8e8"),
    ("altSectionBkgColor", "#ffffff"),
    ("taskBkgColor", "#9a9a9a"),
    ("taskBorderColor", "#4d4d4d"),
    ("taskTextColor", "#ffffff"),
    ("activeTaskBkgColor", "#c8c8c8"),
    ("activeTaskBorderColor", "#4d4d4d"),
    ("doneTaskBkgColor", "#dcdcdc"),
    ("doneTaskBorderColor", "#808080"),
    ("critBkgColor", "#6e6e6e"),
    ("critBorderColor", "#222222"),
    ("gridColor", "#cccccc"),
    ("todayLineColor", "#222222"),
];

const MONOCHROME_VARIABLES: &[(&str, &str)] = &[
    ("primaryColor", "#ffffff"),
    ("primaryTextColor", "#000000"),
    ("primaryBorderColor", "#000000"),
    ("secondaryColor", "#ffffff"),
    ("tertiaryColor", "#ffffff"),
    ("lineColor", "#000000"),
    ("textColor", "#000000"),
    ("mainBkg", "#ffffff"),
    ("nodeBorder", "#000000"),
    ("clusterBkg", "#ffffff"),
    ("clusterBorder", "#000000"),
    ("actorBkg", "#ffffff"),
    ("actorBorder", "#000000"),
    ("actorTextColor", "#000000"),
    ("actorLineColor", "#000000"),
    ("signalColor", "#000000"),
    ("signalTextColor", "#000000"),
    ("labelBoxBkgColor", "#ffffff"),
    ("labelBoxBorderColor", "#000000"),
    ("noteBkgColor", "#ffffff"),
    ("noteBorderColor", "#000000"),
    ("noteTextColor", "#000000"),
    ("sectionBkgColor", "#ffffff"),
    ("altSectionBkgColor", "#ffffff"),
    ("taskBkgColor", "#ffffff"),
    ("taskBorderColor", "#000000"),
    ("taskTextColor", "#000000"),
    ("activeTaskBkgColor", "#ffffff"),
    ("activeTaskBorderColor", "#000000"),
    ("doneTaskBkgColor", "#ffffff"),
    ("doneTaskBorderColor", "#000000"),
    ("critBkgColor", "#ffffff"),
    ("critBorderColor", "#000000"),
    ("gridColor", "#000000"),
    ("todayLineColor", "#000000"),
];
