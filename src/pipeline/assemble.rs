//! Combine the rendered body with its title and [`RenderConfig`] into a
//! [`Document`], and build the page header/footer templates.

use crate::config::RenderConfig;
use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_FIRST_H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h1(?:\s[^>]*)?>(.*?)</h1>").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// A document ready for the render engine.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub title: Option<String>,
    pub body_html: String,
    pub config: RenderConfig,
}

/// Build a [`Document`]. The title is the explicit one if non-empty,
/// otherwise the text of the first `<h1>` in the body, otherwise absent.
pub fn assemble(body_html: String, explicit_title: Option<&str>, config: RenderConfig) -> Document {
    let title = resolve_title(&body_html, explicit_title);
    Document {
        title,
        body_html,
        config,
    }
}

fn resolve_title(body_html: &str, explicit_title: Option<&str>) -> Option<String> {
    if let Some(title) = explicit_title.filter(|t| !t.is_empty()) {
        return Some(title.to_string());
    }
    let inner = RE_FIRST_H1.captures(body_html)?.get(1)?.as_str();
    let text = RE_TAG.replace_all(inner, "");
    let text = decode_html_entities(&text);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl Document {
    /// Complete HTML page loaded by the render engine.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
        if let Some(ref title) = self.title {
            html.push_str(&format!("<title>{}</title>", encode_text(title)));
        }
        html.push_str("</head><body");
        if !self.config.language_tag.is_empty() {
            html.push_str(&format!(
                " lang=\"{}\"",
                encode_double_quoted_attribute(&self.config.language_tag)
            ));
        }
        if self.config.no_indent {
            html.push_str(" class=\"noindent\"");
        }
        html.push('>');
        html.push_str(&self.body_html);
        html.push_str("</body></html>");
        html
    }

    /// Left-aligned title on every page, empty when there is no title.
    pub fn header_template(&self) -> String {
        let content = if self.title.is_some() {
            "<span class=\"title\"></span>"
        } else {
            ""
        };
        self.template("left", content)
    }

    /// Centered page number, empty with `--nopage`.
    pub fn footer_template(&self) -> String {
        let content = if self.config.show_page_numbers {
            "<span class=\"pageNumber\"></span>"
        } else {
            ""
        };
        self.template("center", content)
    }

    fn template(&self, align: &str, content: &str) -> String {
        format!(
            "<div style=\"font:9pt {};padding:0 12mm;width:100%;text-align:{align}\">{content}</div>",
            encode_double_quoted_attribute(&self.config.font_stack())
        )
    }
}
