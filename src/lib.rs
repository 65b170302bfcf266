//! # md2pdf
//!
//! Convert Markdown to print-ready PDF through a headless browser.
//!
//! Markdown is rendered to annotated HTML (heading anchors, resolved image
//! paths, highlighted code with optional filename labels, captions and
//! page-break hints, diagram containers), wrapped in a page with the
//! configured fonts, and printed by Chrome with a title header and a
//! page-number footer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input     file or stdin (one retry on WouldBlock)
//!  ├─ 2. Walk      pulldown-cmark events → headings / images / code blocks
//!  ├─ 3. Render    anchors, image URIs, syntect highlighting, mermaid containers
//!  ├─ 4. Assemble  title, <html> page, header/footer templates
//!  └─ 5. Print     Chrome: stylesheets → image ratio → diagrams → math → PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert, ChromeEngine, ConfigResolver, ConfigTables, ConversionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tables = ConfigTables::builtin();
//!     let resolver = ConfigResolver::new(&tables);
//!     let config = ConversionConfig::builder().paper("a4").language("ja").build()?;
//!     let output = convert("# Report\n", &config, &resolver, Arc::new(ChromeEngine::default())).await?;
//!     std::fs::write("report.pdf", &output.pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf = { version = "0.2", default-features = false }
//! ```
//!
//! ## Code fences
//!
//! | Info string                          | Result                                  |
//! |--------------------------------------|-----------------------------------------|
//! | ```` ```rust ````                    | highlighted block                       |
//! | ```` ```rust:main.rs ````            | with a `main.rs` label                  |
//! | ```` ```rust [newpage] ````          | starts on a new page                    |
//! | ```` ```rust "Listing 1" ````        | wrapped in a figure with a caption      |
//! | ```` ```mermaid ````                 | diagram, laid out in the browser        |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod tables;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, RenderConfig, COLOR_CODES, LANGUAGE_CODES,
    PAPER_CODES,
};
pub use convert::{convert, convert_source, convert_sync, transform, write_pdf};
pub use error::{Md2PdfError, ParseWarning};
pub use output::{ConversionOutput, Transformed};
pub use pipeline::assemble::Document;
pub use pipeline::input::InputSource;
pub use pipeline::render::{ChromeEngine, RenderEngine, RenderSession};
pub use tables::{ConfigResolver, ConfigTables};
