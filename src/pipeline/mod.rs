//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements one transformation step, so each can be tested
//! on its own and the browser can be swapped out behind a trait.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ walker ──▶ renderer ──▶ assemble ──▶ render
//! (file/stdin) (events) (HTML body)  (Document)   (Chrome → PDF)
//! ```
//!
//! 1. [`input`]    read the Markdown from a file or standard input
//! 2. [`walker`]   walk the pulldown-cmark event stream, delegating
//!    headings, images and code blocks to a [`walker::NodeRenderer`]
//! 3. [`renderer`] the real `NodeRenderer`, built from:
//!    - [`slug`]        heading anchors
//!    - [`image`]       image paths and markup
//!    - [`info_string`] code-fence annotations
//!    - [`highlight`]   syntax highlighting
//!    - [`code_block`]  code and diagram markup
//! 4. [`assemble`] title resolution, full HTML page, header/footer templates
//! 5. [`render`]   headless browser session: stylesheets, image ratio,
//!    diagrams, math, PDF export

pub mod assemble;
pub mod code_block;
pub mod highlight;
pub mod image;
pub mod info_string;
pub mod input;
pub mod render;
pub mod renderer;
pub mod slug;
pub mod walker;
