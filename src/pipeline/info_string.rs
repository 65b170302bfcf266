//! Code-fence info strings: ```` ```python:app.py [float] "Entry point" ````.
//!
//! The string is split by a small tokenizer with four named token classes:
//!
//! | Token    | Form                     | Where                          |
//! |----------|--------------------------|--------------------------------|
//! | language | leading run, ends at `:` | always first (may be empty)    |
//! | filename | run right after the `:`  | only when a `:` follows        |
//! | paging   | `[tag]`                  | anywhere in the attribute tail |
//! | caption  | `"text"`                 | anywhere in the attribute tail |
//!
//! In the attribute tail the first non-empty paging token and the first
//! non-empty caption token win. A bracket inside a quoted caption belongs to
//! the caption. Anything else in the tail is a stray word and is ignored.

use crate::error::ParseWarning;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language assumed when the info string does not name one.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// Language that marks a block as a diagram container.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// How a block may break across printed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PagingClass {
    #[default]
    None,
    Float,
    Newpage,
    Isolated,
}

impl PagingClass {
    /// Map a bracketed tag to its class; `None` for unrecognized tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "float" => Some(PagingClass::Float),
            "newpage" => Some(PagingClass::Newpage),
            "isolated" => Some(PagingClass::Isolated),
            _ => None,
        }
    }

    /// CSS class applied to the block, if any.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            PagingClass::None => None,
            PagingClass::Float => Some("float"),
            PagingClass::Newpage => Some("newpage"),
            PagingClass::Isolated => Some("isolated"),
        }
    }
}

/// Metadata parsed from a fenced code block's info string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockMeta {
    pub language: String,
    pub filename: Option<String>,
    pub paging: PagingClass,
    pub caption: Option<String>,
}

impl Default for CodeBlockMeta {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            filename: None,
            paging: PagingClass::None,
            caption: None,
        }
    }
}

impl CodeBlockMeta {
    /// Diagram containers are laid out by the diagram engine, not highlighted.
    pub fn is_diagram(&self) -> bool {
        self.language == DIAGRAM_LANGUAGE
    }
}

/// Canonical form; parsing it yields an identical `CodeBlockMeta`.
impl fmt::Display for CodeBlockMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if let Some(ref filename) = self.filename {
            write!(f, ":{filename}")?;
        }
        if let Some(class) = self.paging.css_class() {
            write!(f, " [{class}]")?;
        }
        if let Some(ref caption) = self.caption {
            write!(f, " \"{caption}\"")?;
        }
        Ok(())
    }
}

/// Parse an info string. Never fails.
///
/// Returns the metadata and, when the paging tag was not recognized, a
/// warning for the caller to report.
pub fn parse(info: &str) -> (CodeBlockMeta, Option<ParseWarning>) {
    let mut meta = CodeBlockMeta::default();
    let mut paging_seen = false;
    let mut warning = None;

    for token in Tokenizer::new(info) {
        match token {
            Token::Language(lang) => {
                if !lang.is_empty() {
                    meta.language = lang.to_string();
                }
            }
            Token::Filename(name) => {
                if !name.is_empty() {
                    meta.filename = Some(name.to_string());
                }
            }
            Token::Paging(tag) if !paging_seen && !tag.is_empty() => {
                paging_seen = true;
                match PagingClass::from_tag(tag) {
                    Some(class) => meta.paging = class,
                    None => {
                        warning = Some(ParseWarning::UnknownPagingTag {
                            tag: tag.to_string(),
                        })
                    }
                }
            }
            Token::Caption(text) if meta.caption.is_none() => {
                if !text.is_empty() {
                    meta.caption = Some(text.to_string());
                }
            }
            Token::Paging(_) | Token::Caption(_) | Token::Stray(_) => {}
        }
    }

    (meta, warning)
}

// ── Tokenizer ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Language(&'a str),
    Filename(&'a str),
    Paging(&'a str),
    Caption(&'a str),
    Stray(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Language,
    Filename,
    Attributes,
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    state: State,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            state: State::Language,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Consume characters while `keep` holds and return them.
    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consume `open`, the body and `close`; the body is returned.
    /// Without a closing delimiter the whole rest becomes a stray word.
    fn delimited(&mut self, close: char, wrap: fn(&'a str) -> Token<'a>) -> Token<'a> {
        let rest = self.rest();
        let body = &rest[1..];
        match body.find(close) {
            Some(end) => {
                self.pos += 1 + end + 1;
                wrap(&body[..end])
            }
            None => {
                self.pos = self.src.len();
                Token::Stray(rest)
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != '[' && c != '"'
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        match self.state {
            State::Language => {
                let lang = self.take_while(|c| is_word_char(c) && c != ':');
                if self.rest().starts_with(':') {
                    self.pos += 1;
                    self.state = State::Filename;
                } else {
                    self.state = State::Attributes;
                }
                Some(Token::Language(lang))
            }
            State::Filename => {
                self.state = State::Attributes;
                Some(Token::Filename(self.take_while(is_word_char)))
            }
            State::Attributes => {
                self.take_while(char::is_whitespace);
                match self.rest().chars().next()? {
                    '[' => Some(self.delimited(']', Token::Paging)),
                    '"' => Some(self.delimited('"', Token::Caption)),
                    _ => Some(Token::Stray(self.take_while(is_word_char))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(info: &str) -> CodeBlockMeta {
        parse(info).0
    }

    #[test]
    fn empty_info_defaults_to_plaintext() {
        let (m, w) = parse("");
        assert_eq!(m, CodeBlockMeta::default());
        assert!(w.is_none());
    }

    #[test]
    fn language_only() {
        let m = meta("rust");
        assert_eq!(m.language, "rust");
        assert_eq!(m.filename, None);
        assert_eq!(m.paging, PagingClass::None);
    }

    #[test]
    fn language_and_filename() {
        let m = meta("python:app.py");
        assert_eq!(m.language, "python");
        assert_eq!(m.filename.as_deref(), Some("app.py"));
    }

    #[test]
    fn filename_without_language() {
        let m = meta(":Makefile");
        assert_eq!(m.language, "plaintext");
        assert_eq!(m.filename.as_deref(), Some("Makefile"));
    }

    #[test]
    fn filename_requires_colon() {
        let m = meta("python app.py");
        assert_eq!(m.language, "python");
        assert_eq!(m.filename, None);
    }

    #[test]
    fn filename_may_contain_colons() {
        let m = meta("text:C:/tmp/x.txt");
        assert_eq!(m.language, "text");
        assert_eq!(m.filename.as_deref(), Some("C:/tmp/x.txt"));
    }

    #[test]
    fn full_info_string() {
        let (m, w) = parse(r#"python:app.py [float] "Entry point""#);
        assert_eq!(m.language, "python");
        assert_eq!(m.filename.as_deref(), Some("app.py"));
        assert_eq!(m.paging, PagingClass::Float);
        assert_eq!(m.caption.as_deref(), Some("Entry point"));
        assert!(w.is_none());
    }

    #[test]
    fn caption_before_paging() {
        let m = meta(r#"sh "Install steps" [newpage]"#);
        assert_eq!(m.caption.as_deref(), Some("Install steps"));
        assert_eq!(m.paging, PagingClass::Newpage);
    }

    #[test]
    fn attributes_directly_after_language() {
        let m = meta(r#"c[isolated]"Main loop""#);
        assert_eq!(m.language, "c");
        assert_eq!(m.paging, PagingClass::Isolated);
        assert_eq!(m.caption.as_deref(), Some("Main loop"));
    }

    #[test]
    fn recognized_tags_never_warn() {
        for tag in ["float", "newpage", "isolated"] {
            let (m, w) = parse(&format!("js [{tag}]"));
            assert!(w.is_none(), "{tag} should not warn");
            assert_eq!(m.paging.css_class(), Some(tag));
        }
    }

    #[test]
    fn unknown_tag_warns_and_is_none() {
        let (m, w) = parse("js [sideways]");
        assert_eq!(m.paging, PagingClass::None);
        assert_eq!(
            w,
            Some(ParseWarning::UnknownPagingTag {
                tag: "sideways".into()
            })
        );
    }

    #[test]
    fn bracket_inside_caption_belongs_to_caption() {
        let (m, w) = parse(r#"rust "see [1]" [float]"#);
        assert_eq!(m.caption.as_deref(), Some("see [1]"));
        assert_eq!(m.paging, PagingClass::Float);
        assert!(w.is_none());
    }

    #[test]
    fn first_paging_token_wins() {
        let (m, w) = parse("rust [newpage] [bogus]");
        assert_eq!(m.paging, PagingClass::Newpage);
        assert!(w.is_none());
    }

    #[test]
    fn empty_delimiters_are_ignored() {
        let (m, w) = parse(r#"rust [] """#);
        assert_eq!(m.paging, PagingClass::None);
        assert_eq!(m.caption, None);
        assert!(w.is_none());
    }

    #[test]
    fn empty_brackets_do_not_hide_a_later_tag() {
        let (m, w) = parse("rust [] [float]");
        assert_eq!(m.paging, PagingClass::Float);
        assert!(w.is_none());
        let m = meta(r#"rust "" "cap""#);
        assert_eq!(m.caption.as_deref(), Some("cap"));
    }

    #[test]
    fn unterminated_delimiters_are_stray() {
        let m = meta(r#"rust "no end [float]"#);
        assert_eq!(m.caption, None);
        assert_eq!(m.paging, PagingClass::None);
        let m = meta("rust [float");
        assert_eq!(m.paging, PagingClass::None);
    }

    #[test]
    fn mermaid_is_a_diagram() {
        let m = meta(r#"mermaid [isolated] "Flow""#);
        assert!(m.is_diagram());
        assert_eq!(m.paging, PagingClass::Isolated);
        assert_eq!(m.caption.as_deref(), Some("Flow"));
        assert!(!meta("python").is_diagram());
    }

    #[test]
    fn multibyte_text_is_handled() {
        let m = meta(r#"python:データ.py "入力を読む""#);
        assert_eq!(m.filename.as_deref(), Some("データ.py"));
        assert_eq!(m.caption.as_deref(), Some("入力を読む"));
    }

    #[test]
    fn canonical_form_round_trips() {
        for info in [
            "plaintext",
            "rust:src/main.rs",
            r#"python:app.py [float] "Entry point""#,
            r#"mermaid [newpage] "Data flow""#,
            "plaintext:Makefile [isolated]",
        ] {
            let first = meta(info);
            assert_eq!(first.to_string(), info);
            assert_eq!(meta(&first.to_string()), first);
        }
    }

    #[test]
    fn non_canonical_input_normalizes() {
        let m = meta(r#"  "Cap"   [float] go"#);
        assert_eq!(m.to_string(), r#"plaintext [float] "Cap""#);
        assert_eq!(meta(&m.to_string()), m);
    }
}
