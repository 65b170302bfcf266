//! The [`NodeRenderer`] used for real conversions.

use crate::error::ParseWarning;
use crate::pipeline::code_block;
use crate::pipeline::highlight::Highlighter;
use crate::pipeline::image;
use crate::pipeline::slug::{slugify, HeadingRef};
use crate::pipeline::walker::NodeRenderer;
use html_escape::encode_double_quoted_attribute;
use std::path::PathBuf;
use tracing::{info, warn};

/// Tracing target for `--anchors` output.
pub const ANCHOR_TARGET: &str = "md2pdf::anchors";

/// Renders headings with anchors, images with resolved paths and code
/// blocks with highlighting. Collects headings and warnings as it goes.
pub struct HtmlRenderer<'h> {
    base_dir: PathBuf,
    anchor_debug: bool,
    highlighter: &'h Highlighter,
    headings: Vec<HeadingRef>,
    warnings: Vec<ParseWarning>,
}

impl<'h> HtmlRenderer<'h> {
    pub fn new(base_dir: impl Into<PathBuf>, anchor_debug: bool, highlighter: &'h Highlighter) -> Self {
        Self {
            base_dir: base_dir.into(),
            anchor_debug,
            highlighter,
            headings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn headings(&self) -> &[HeadingRef] {
        &self.headings
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<HeadingRef>, Vec<ParseWarning>) {
        (self.headings, self.warnings)
    }
}

impl NodeRenderer for HtmlRenderer<'_> {
    fn render_heading(
        &mut self,
        level: u8,
        raw_text: &str,
        plain_text: &str,
        inner_html: &str,
    ) -> String {
        let anchor_id = slugify(plain_text);
        if self.anchor_debug {
            info!(target: ANCHOR_TARGET, "Anchor id={}: {}", anchor_id, raw_text);
        }
        let html = format!(
            "<h{level} id=\"{}\">{inner_html}</h{level}>\n",
            encode_double_quoted_attribute(&anchor_id)
        );
        self.headings.push(HeadingRef {
            level,
            raw_text: raw_text.to_string(),
            anchor_id,
        });
        html
    }

    fn render_image(&mut self, href: &str, title: Option<&str>, alt_text: Option<&str>) -> String {
        image::resolve(href, title, alt_text, &self.base_dir)
    }

    fn render_code_block(&mut self, code: &str, info: &str) -> String {
        let (html, warnings) = code_block::render(code, info, self.highlighter);
        for w in warnings {
            warn!("{}", w);
            self.warnings.push(w);
        }
        html
    }
}
