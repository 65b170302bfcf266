//! GitHub-compatible heading anchors.
//!
//! Links written against a README on GitHub (`[see](#getting-started)`) keep
//! working in the PDF because the same rules produce the same ids:
//!
//! 1. drop embedded images `![alt](src)`
//! 2. replace embedded links `[label](href)` with `label`
//! 3. drop every character that is not a letter, mark, decimal digit,
//!    letter-number, connector punctuation, space or hyphen
//! 4. trim trailing spaces
//! 5. spaces become hyphens (no collapsing)
//! 6. lowercase

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A heading seen while walking the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    /// 1–6.
    pub level: u8,
    /// Markdown source of the heading text, inline syntax included.
    pub raw_text: String,
    /// Anchor id; identical headings share the same id.
    pub anchor_id: String,
}

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());

static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{Nd}\p{Nl}\p{Pc} \-]").unwrap());

/// Convert heading text into its anchor id.
pub fn slugify(text: &str) -> String {
    let without_images = RE_IMAGE.replace_all(text, "");
    let without_links = RE_LINK.replace_all(&without_images, "$1");
    let kept = RE_DISALLOWED.replace_all(&without_links, "");
    kept.trim_end_matches(' ').replace(' ', "-").to_lowercase()
}
