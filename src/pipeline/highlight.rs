//! Syntax highlighting for fenced code blocks, backed by `syntect`.
//!
//! Tokens are emitted as class-annotated `<span>`s (`hl-` prefix) rather than
//! inline styles, so the colour theme is a separate stylesheet: colour output
//! injects [`theme_css`] for the configured theme, monochrome output injects
//! nothing and the same markup prints in black.

use crate::error::ParseWarning;
use html_escape::encode_safe;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::debug;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Languages rendered as plain text without a lookup.
const PLAIN_LANGUAGES: [&str; 3] = ["plaintext", "text", "txt"];

/// Syntax definitions, loaded once per conversion.
pub struct Highlighter {
    syntaxes: SyntaxSet,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Highlight `code` as `language`.
    ///
    /// # Errors
    /// A [`ParseWarning`] when the language is unknown or the highlighter
    /// fails; the caller falls back to [`plain`].
    pub fn highlight(&self, code: &str, language: &str) -> Result<String, ParseWarning> {
        let syntax = self.find_syntax(language)?;
        debug!("Highlighting {} bytes as {}", code.len(), syntax.name);

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| ParseWarning::HighlightFailed {
                    language: language.to_string(),
                    detail: e.to_string(),
                })?;
        }
        Ok(generator.finalize())
    }

    fn find_syntax(&self, language: &str) -> Result<&SyntaxReference, ParseWarning> {
        if PLAIN_LANGUAGES.contains(&language.to_ascii_lowercase().as_str()) {
            return Ok(self.syntaxes.find_syntax_plain_text());
        }
        self.syntaxes
            .find_syntax_by_token(language)
            .ok_or_else(|| ParseWarning::UnknownLanguage {
                language: language.to_string(),
            })
    }
}

/// Unhighlighted fallback: the code, HTML-escaped.
pub fn plain(code: &str) -> String {
    encode_safe(code).into_owned()
}

/// Stylesheet for a syntect theme, matching the span classes above.
///
/// # Errors
/// [`ParseWarning::UnknownTheme`] when no bundled theme has that name.
pub fn theme_css(theme_name: &str) -> Result<String, ParseWarning> {
    let themes = ThemeSet::load_defaults();
    let unknown = || ParseWarning::UnknownTheme {
        theme: theme_name.to_string(),
    };
    let theme = themes.themes.get(theme_name).ok_or_else(unknown)?;
    css_for_theme_with_class_style(theme, CLASS_STYLE).map_err(|_| unknown())
}
