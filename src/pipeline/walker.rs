//! Walk the `pulldown-cmark` event stream and hand three node kinds to a
//! [`NodeRenderer`]: headings, images and code blocks.
//!
//! Everything else goes through pulldown-cmark's own HTML writer unchanged.
//! The walker knows nothing about anchors, paths or highlighting, so the
//! same walk drives the real renderer and the recording renderers used in
//! tests.

use pulldown_cmark::{html, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::ops::Range;

/// Rendering hooks for the node kinds md2pdf customizes.
pub trait NodeRenderer {
    /// `raw_text` is the heading's Markdown source, `plain_text` its inline
    /// text with Markdown syntax resolved and images dropped, `inner_html`
    /// its rendered content.
    fn render_heading(
        &mut self,
        level: u8,
        raw_text: &str,
        plain_text: &str,
        inner_html: &str,
    ) -> String;

    fn render_image(&mut self, href: &str, title: Option<&str>, alt_text: Option<&str>)
        -> String;

    /// `code` has its final newline removed; `info` is the raw fence info string.
    fn render_code_block(&mut self, code: &str, info: &str) -> String;
}

/// Node being collected while its inner events stream past.
enum Frame {
    Heading {
        level: u8,
        /// Index of the first inner event in the output buffer.
        start: usize,
        source: Option<Range<usize>>,
        /// Text and code spans, entities decoded.
        text: String,
    },
    Image {
        href: String,
        title: String,
        alt: String,
        /// Images nested inside this image's alt text.
        depth: usize,
    },
    Code {
        info: String,
        code: String,
    },
}

/// Markdown → HTML driver.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownWalker {
    options: Options,
}

impl Default for MarkdownWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownWalker {
    /// GFM tables, footnotes, strikethrough, task lists and `$math$`.
    pub fn new() -> Self {
        Self::with_options(
            Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_MATH,
        )
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Render `markdown` to an HTML body fragment.
    pub fn walk<R: NodeRenderer + ?Sized>(&self, markdown: &str, renderer: &mut R) -> String {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();

        for (event, range) in Parser::new_ext(markdown, self.options).into_offset_iter() {
            if !matches!(event, Event::End(TagEnd::Heading(_))) {
                extend_heading_source(&mut frames, &range);
            }

            match frames.last_mut() {
                Some(Frame::Code { code, .. }) => {
                    match event {
                        Event::Text(text) => code.push_str(&text),
                        Event::End(TagEnd::CodeBlock) => {
                            if let Some(Frame::Code { info, mut code }) = frames.pop() {
                                if code.ends_with('\n') {
                                    code.pop();
                                }
                                let html = renderer.render_code_block(&code, &info);
                                events.push(Event::Html(html.into()));
                            }
                        }
                        _ => {}
                    }
                    continue;
                }
                Some(Frame::Image { alt, depth, .. }) => {
                    match event {
                        Event::Start(Tag::Image { .. }) => *depth += 1,
                        Event::End(TagEnd::Image) if *depth > 0 => *depth -= 1,
                        Event::End(TagEnd::Image) => {
                            if let Some(Frame::Image {
                                href, title, alt, ..
                            }) = frames.pop()
                            {
                                let html = renderer.render_image(
                                    &href,
                                    non_empty(&title),
                                    non_empty(&alt),
                                );
                                events.push(Event::InlineHtml(html.into()));
                            }
                        }
                        Event::Text(text) | Event::Code(text) => alt.push_str(&text),
                        Event::SoftBreak | Event::HardBreak => alt.push(' '),
                        _ => {}
                    }
                    continue;
                }
                _ => {}
            }

            match event {
                Event::Start(Tag::Heading { level, .. }) => frames.push(Frame::Heading {
                    level: heading_level(level),
                    start: events.len(),
                    source: None,
                    text: String::new(),
                }),
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(Frame::Heading {
                        level,
                        start,
                        source,
                        text,
                    }) = frames.pop()
                    {
                        let mut inner_html = String::new();
                        html::push_html(&mut inner_html, events.drain(start..));
                        let raw_text = source.map(|r| &markdown[r]).unwrap_or_default();
                        let html = renderer.render_heading(level, raw_text, &text, &inner_html);
                        events.push(Event::Html(html.into()));
                    }
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => frames.push(Frame::Image {
                    href: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                    depth: 0,
                }),
                Event::Start(Tag::CodeBlock(kind)) => frames.push(Frame::Code {
                    info: match kind {
                        CodeBlockKind::Fenced(info) => info.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    },
                    code: String::new(),
                }),
                other => {
                    if let Some(Frame::Heading { text, .. }) = frames.last_mut() {
                        match &other {
                            Event::Text(t) | Event::Code(t) => text.push_str(t),
                            Event::SoftBreak | Event::HardBreak => text.push(' '),
                            _ => {}
                        }
                    }
                    events.push(other);
                }
            }
        }

        let mut body = String::new();
        html::push_html(&mut body, events.into_iter());
        body
    }
}

/// Grow the enclosing heading's source span to cover `range`.
fn extend_heading_source(frames: &mut [Frame], range: &Range<usize>) {
    let heading = frames.iter_mut().find_map(|frame| match frame {
        Frame::Heading { source, .. } => Some(source),
        _ => None,
    });
    if let Some(source) = heading {
        *source = Some(match source.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range.clone(),
        });
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
