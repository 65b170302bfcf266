//! Conversion entry points.
//!
//! [`transform`] is the browser-free half: Markdown in, [`Document`] out.
//! [`convert`] adds the render pipeline and returns PDF bytes.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::output::{ConversionOutput, Transformed};
use crate::pipeline::assemble::{self, Document};
use crate::pipeline::highlight::Highlighter;
use crate::pipeline::input::{self, InputSource};
use crate::pipeline::render::{self, Assets, RenderEngine};
use crate::pipeline::renderer::HtmlRenderer;
use crate::pipeline::walker::MarkdownWalker;
use crate::tables::ConfigResolver;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Render Markdown to a [`Document`] without starting a browser.
///
/// # Errors
/// Only configuration errors: an unknown paper, language or color code.
pub fn transform(
    markdown: &str,
    config: &ConversionConfig,
    resolver: &ConfigResolver<'_>,
) -> Result<Transformed, Md2PdfError> {
    // ── Step 1: Resolve codes ────────────────────────────────────────────
    let render_config = resolver.resolve_config(config)?;

    // ── Step 2: Walk the Markdown ────────────────────────────────────────
    let highlighter = Highlighter::new();
    let mut renderer = HtmlRenderer::new(
        config.base_dir.clone(),
        render_config.anchor_debug,
        &highlighter,
    );
    let body_html = MarkdownWalker::new().walk(markdown, &mut renderer);
    let (headings, warnings) = renderer.into_parts();
    debug!(
        "Rendered body: {} bytes, {} headings, {} warnings",
        body_html.len(),
        headings.len(),
        warnings.len()
    );

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let document: Document =
        assemble::assemble(body_html, config.title.as_deref(), render_config);

    Ok(Transformed {
        document,
        headings,
        warnings,
    })
}

/// Convert Markdown to PDF.
///
/// The browser session runs on the blocking thread pool and is released
/// before this function returns, on every path.
///
/// # Errors
/// Configuration errors, a browser that fails to launch, or a failed
/// navigation/export. Diagram, math and asset problems are reported in
/// [`ConversionOutput::warnings`] instead.
pub async fn convert(
    markdown: &str,
    config: &ConversionConfig,
    resolver: &ConfigResolver<'_>,
    engine: Arc<dyn RenderEngine>,
) -> Result<ConversionOutput, Md2PdfError> {
    let start = Instant::now();
    let transformed = transform(markdown, config, resolver)?;

    let assets = Assets::new(config.resource_dir.clone());
    let scale = config.pdf_scale;
    let document = transformed.document.clone();
    let mut warnings = transformed.warnings.clone();

    let (pdf, warnings) = tokio::task::spawn_blocking(move || {
        render::render_document(&document, &assets, engine.as_ref(), scale, &mut warnings)
            .map(|pdf| (pdf, warnings))
    })
    .await
    .map_err(|e| Md2PdfError::Internal(format!("Render task panicked: {}", e)))??;

    info!(
        "Conversion complete: {} bytes in {}ms",
        pdf.len(),
        start.elapsed().as_millis()
    );

    Ok(Transformed {
        warnings,
        ..transformed
    }
    .into_output(pdf))
}

/// Read the Markdown from `source`, then [`convert`] it.
///
/// Returns `Ok(None)` for empty input: there is nothing to print.
pub async fn convert_source(
    source: &InputSource,
    config: &ConversionConfig,
    resolver: &ConfigResolver<'_>,
    engine: Arc<dyn RenderEngine>,
) -> Result<Option<ConversionOutput>, Md2PdfError> {
    let markdown = input::read_input(source).await?;
    if markdown.is_empty() {
        info!("Empty input, nothing to convert");
        return Ok(None);
    }
    convert(&markdown, config, resolver, engine).await.map(Some)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    markdown: &str,
    config: &ConversionConfig,
    resolver: &ConfigResolver<'_>,
    engine: Arc<dyn RenderEngine>,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(markdown, config, resolver, engine))
}

/// Write the PDF bytes and flush.
pub async fn write_pdf<W: AsyncWrite + Unpin>(out: &mut W, pdf: &[u8]) -> Result<(), Md2PdfError> {
    out.write_all(pdf)
        .await
        .map_err(|e| Md2PdfError::WriteFailed { source: e })?;
    out.flush()
        .await
        .map_err(|e| Md2PdfError::WriteFailed { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseWarning;
    use crate::pipeline::render::{PdfOptions, RenderSession};
    use crate::pipeline::renderer::tests::capture_logs;
    use crate::tables::ConfigTables;
    use serde_json::Value;

    struct StubEngine;

    struct StubSession;

    impl RenderSession for StubSession {
        fn open(&mut self, _url: &str) -> Result<(), Md2PdfError> {
            Ok(())
        }

        fn evaluate(
            &mut self,
            _script: &str,
            _await_promise: bool,
        ) -> Result<Option<Value>, Md2PdfError> {
            Ok(None)
        }

        fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, Md2PdfError> {
            Ok(format!("%PDF landscape={}", options.landscape).into_bytes())
        }
    }

    impl RenderEngine for StubEngine {
        fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
            Ok(Box::new(StubSession))
        }
    }

    struct BrokenEngine;

    impl RenderEngine for BrokenEngine {
        fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
            Err(Md2PdfError::EngineLaunch("no browser".into()))
        }
    }

    fn config(resources: &std::path::Path) -> ConversionConfig {
        ConversionConfig::builder()
            .paper("a4r")
            .base_dir("/docs")
            .resource_dir(resources)
            .build()
            .unwrap()
    }

    #[test]
    fn transform_collects_headings_and_warnings() {
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let md = "# Report\n\n```text [bogus]\nx\n```\n\n## Details\n";
        let out = transform(md, &ConversionConfig::default(), &resolver).unwrap();
        assert_eq!(out.document.title.as_deref(), Some("Report"));
        assert_eq!(out.headings.len(), 2);
        assert_eq!(
            out.warnings,
            vec![ParseWarning::UnknownPagingTag {
                tag: "bogus".into()
            }]
        );
    }

    #[test]
    fn transform_logs_anchors_when_asked() {
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let config = ConversionConfig::builder().anchor_debug(true).build().unwrap();
        let logs = capture_logs(|| {
            let out = transform("# Report\n", &config, &resolver).unwrap();
            assert!(out.document.config.anchor_debug);
        });
        assert!(logs.contains("Anchor id=report: Report"), "{logs}");

        let quiet = capture_logs(|| {
            transform("# Report\n", &ConversionConfig::default(), &resolver).unwrap();
        });
        assert!(!quiet.contains("Anchor id="), "{quiet}");
    }

    #[test]
    fn transform_rejects_unknown_codes() {
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let config = ConversionConfig::builder().language("fr").build().unwrap();
        assert!(matches!(
            transform("# x", &config, &resolver),
            Err(Md2PdfError::UnknownCode { .. })
        ));
    }

    #[tokio::test]
    async fn convert_returns_pdf_bytes_and_asset_warnings() {
        let resources = tempfile::tempdir().unwrap();
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let out = convert(
            "# Report\n",
            &config(resources.path()),
            &resolver,
            Arc::new(StubEngine),
        )
        .await
        .unwrap();
        assert_eq!(out.pdf, b"%PDF landscape=true");
        assert_eq!(out.title.as_deref(), Some("Report"));
        assert!(out
            .warnings
            .iter()
            .all(|w| matches!(w, ParseWarning::MissingAsset { .. })));
        assert_eq!(out.warnings.len(), 3);
    }

    #[tokio::test]
    async fn launch_failure_is_fatal() {
        let resources = tempfile::tempdir().unwrap();
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let err = convert(
            "text",
            &config(resources.path()),
            &resolver,
            Arc::new(BrokenEngine),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Md2PdfError::EngineLaunch(_)));
    }

    #[tokio::test]
    async fn empty_input_converts_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.md"), "").unwrap();
        let tables = ConfigTables::builtin();
        let resolver = ConfigResolver::new(&tables);
        let source = InputSource::from_arg(Some("empty.md"), dir.path());
        let out = convert_source(
            &source,
            &config(dir.path()),
            &resolver,
            Arc::new(BrokenEngine),
        )
        .await
        .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn write_pdf_writes_all_bytes() {
        let mut buf: Vec<u8> = Vec::new();
        write_pdf(&mut buf, b"%PDF-1.7").await.unwrap();
        assert_eq!(buf, b"%PDF-1.7");
    }
}
