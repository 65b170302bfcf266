//! Image references: resolve the source URI and emit the `<img>` markup.
//!
//! Remote `http(s)://` sources are used verbatim. Everything else is joined
//! onto the caller's base directory (not the process working directory), so
//! relative includes work no matter where md2pdf was started from.
//!
//! SVG sources get the `md-svg` class and keep their intrinsic scaling; all
//! other sources get `md-img`, the class the in-page ratio pass rescales.

use html_escape::{encode_double_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Class for raster images; rescaled by `--ratio`.
pub const RASTER_CLASS: &str = "md-img";

/// Class for vector images.
pub const VECTOR_CLASS: &str = "md-svg";

static RE_REMOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").unwrap());

/// A resolved image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub uri: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub is_vector: bool,
}

impl ImageRef {
    /// Resolve `href` against `base`. Empty `title`/`alt` count as absent.
    pub fn resolve(href: &str, title: Option<&str>, alt: Option<&str>, base: &Path) -> Self {
        let uri = if RE_REMOTE.is_match(href) {
            href.to_string()
        } else {
            normalize(&base.join(href)).to_string_lossy().into_owned()
        };
        let is_vector = has_svg_extension(&uri);

        Self {
            uri,
            alt_text: alt.filter(|a| !a.is_empty()).map(str::to_string),
            caption: title.filter(|t| !t.is_empty()).map(str::to_string),
            is_vector,
        }
    }

    pub fn css_class(&self) -> &'static str {
        if self.is_vector {
            VECTOR_CLASS
        } else {
            RASTER_CLASS
        }
    }

    /// `<img>` tag, wrapped in a `<figure>` when there is a caption.
    pub fn to_html(&self) -> String {
        let alt = self
            .alt_text
            .as_deref()
            .map(|a| format!(" alt=\"{}\"", encode_double_quoted_attribute(a)))
            .unwrap_or_default();
        let img = format!(
            "<img class=\"{}\" src=\"{}\"{}>\n",
            self.css_class(),
            encode_double_quoted_attribute(&self.uri),
            alt
        );
        match self.caption {
            Some(ref caption) => format!(
                "<figure>\n{img}<figcaption>{}</figcaption>\n</figure>\n",
                encode_text(caption)
            ),
            None => img,
        }
    }
}

/// Resolve an image reference and render it in one step.
pub fn resolve(href: &str, title: Option<&str>, alt: Option<&str>, base: &Path) -> String {
    ImageRef::resolve(href, title, alt, base).to_html()
}

/// `.svg` check on the path part of the URI (query and fragment ignored).
fn has_svg_extension(uri: &str) -> bool {
    let path = uri.split(&['?', '#'][..]).next().unwrap_or(uri);
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Lexically remove `.` and `..` components, like `path.resolve` would.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
