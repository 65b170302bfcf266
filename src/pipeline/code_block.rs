//! Fenced code block markup.
//!
//! ```text
//! <pre class="PAGING"><code class="filename">FILE</code><code class="language-LANG">TOKENS</code></pre>
//! <div class="mermaid PAGING">\nSOURCE\n</div>
//! ```
//!
//! The paging class, the filename label and the surrounding
//! `<figure>`/`<figcaption>` appear only when the info string asks for them.

use crate::error::ParseWarning;
use crate::pipeline::highlight::{self, Highlighter};
use crate::pipeline::info_string::{self, CodeBlockMeta};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Render one fenced block. Warnings are returned, not logged.
pub fn render(code: &str, info: &str, highlighter: &Highlighter) -> (String, Vec<ParseWarning>) {
    let (meta, warning) = info_string::parse(info);
    let mut warnings: Vec<ParseWarning> = warning.into_iter().collect();

    let block = if meta.is_diagram() {
        diagram_markup(&meta, code)
    } else {
        let tokens = highlighter
            .highlight(code, &meta.language)
            .unwrap_or_else(|w| {
                warnings.push(w);
                highlight::plain(code)
            });
        code_markup(&meta, &tokens)
    };

    (with_caption(&meta, block), warnings)
}

fn code_markup(meta: &CodeBlockMeta, tokens: &str) -> String {
    let mut html = String::from("<pre");
    if let Some(class) = meta.paging.css_class() {
        html.push_str(&format!(" class=\"{class}\""));
    }
    html.push('>');
    if let Some(ref filename) = meta.filename {
        html.push_str(&format!(
            "<code class=\"filename\">{}</code>",
            encode_text(filename)
        ));
    }
    html.push_str(&format!(
        "<code class=\"language-{}\">{}</code></pre>\n",
        encode_double_quoted_attribute(&meta.language),
        tokens
    ));
    html
}

/// The diagram engine reads the container's text content, so the source is
/// only escaped, never highlighted.
fn diagram_markup(meta: &CodeBlockMeta, source: &str) -> String {
    let class = match meta.paging.css_class() {
        Some(paging) => format!("mermaid {paging}"),
        None => "mermaid".to_string(),
    };
    format!("<div class=\"{class}\">\n{}\n</div>\n", encode_text(source))
}

fn with_caption(meta: &CodeBlockMeta, block: String) -> String {
    match meta.caption {
        Some(ref caption) => format!(
            "<figure>\n{block}<figcaption>{}</figcaption>\n</figure>\n",
            encode_text(caption)
        ),
        None => block,
    }
}
