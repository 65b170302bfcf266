//! Error types for the md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] is **fatal**: the conversion cannot proceed at all
//!   (unreadable input, unknown paper code, browser did not start). Returned
//!   as `Err(Md2PdfError)` from the top-level `convert*` functions. No PDF
//!   bytes are produced.
//!
//! * [`ParseWarning`] is **non-fatal**: a single fragment degraded (unknown
//!   paging tag, unknown highlight language, a diagram that failed to lay
//!   out) but the rest of the document is fine. Collected into
//!   [`crate::output::ConversionOutput::warnings`] and logged as it occurs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input / output ────────────────────────────────────────────────────
    /// The input file or standard input could not be read.
    #[error("Read error: cannot read {name}")]
    ReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The PDF byte stream could not be written.
    #[error("Write error: cannot write PDF output")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A paper, language or color code outside its closed enumeration.
    #[error("Unknown {kind} '{code}' (expected one of: {expected})")]
    UnknownCode {
        kind: &'static str,
        code: String,
        expected: String,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Render engine ─────────────────────────────────────────────────────
    /// The headless browser could not be started.
    #[error(
        "Failed to launch the render engine: {0}\n\
Install Chrome or Chromium, or point --chrome / MD2PDF_CHROME at the binary."
    )]
    EngineLaunch(String),

    /// A render step inside the browser failed (navigation, PDF export).
    #[error("Render failed during {step}: {detail}")]
    RenderFailed { step: &'static str, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem with a single fragment of the document.
///
/// The conversion always continues; the fragment is rendered in a degraded
/// form (plain code, raw diagram source, error-coloured math).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseWarning {
    /// A bracketed code-fence tag that is not `float`, `newpage` or `isolated`.
    #[error("Unknown paging option: {tag}")]
    UnknownPagingTag { tag: String },

    /// No syntax definition matches the code-fence language.
    #[error("Error on highlight: unknown language '{language}'")]
    UnknownLanguage { language: String },

    /// The highlighter failed part-way through a block.
    #[error("Error on highlight ({language}): {detail}")]
    HighlightFailed { language: String, detail: String },

    /// The configured highlight theme is not known to the highlighter.
    #[error("Unknown highlight theme '{theme}'")]
    UnknownTheme { theme: String },

    /// The diagram engine rejected at least one diagram.
    #[error("Error on mermaid: {detail}")]
    DiagramFailed { detail: String },

    /// A math expression failed to parse; it was re-rendered in error colour.
    #[error("Error on math: {detail}")]
    MathFailed { detail: String },

    /// An optional stylesheet or script was not found in the resource directory.
    #[error("Missing asset '{}', continuing without it", .path.display())]
    MissingAsset { path: PathBuf },
}
