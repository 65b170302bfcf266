//! PDF export through a headless browser.
//!
//! The browser is reached through two small traits so the step order can be
//! exercised without Chrome:
//!
//! * [`RenderEngine`] launches a session.
//! * [`RenderSession`] opens a page, evaluates scripts and prints to PDF.
//!
//! [`render_document`] drives one session through a fixed sequence:
//!
//! ```text
//! open ──▶ stylesheets ──▶ image ratio ──▶ diagrams ──▶ math ──▶ print
//! ```
//!
//! The session is a boxed value owned by `render_document`; dropping it
//! closes the browser, whichever step returns. The page itself is written
//! into a `TempDir` declared before the session, so the file outlives it.
//!
//! Diagram and math failures, and missing optional assets, are warnings.
//! Navigation and PDF export failures are fatal.

use crate::config::RenderConfig;
use crate::error::{Md2PdfError, ParseWarning};
use crate::pipeline::assemble::Document;
use crate::pipeline::highlight;
use crate::pipeline::image::RASTER_CLASS;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Optional diagram engine bundle, relative to the resource directory.
pub const DIAGRAM_SCRIPT: &str = "script/mermaid.min.js";

/// Optional math typesetting bundle and its stylesheet.
pub const MATH_SCRIPT: &str = "script/katex.min.js";
pub const MATH_STYLESHEET: &str = "style/katex.min.css";

const DIAGRAM_MARKER: &str = "class=\"mermaid";
const MATH_MARKER: &str = "class=\"math math-";

// ── Engine traits ────────────────────────────────────────────────────────

/// Options handed to the PDF exporter. Lengths are in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub landscape: bool,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub header_template: String,
    pub footer_template: String,
    pub display_header_footer: bool,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub scale: f64,
}

impl PdfOptions {
    pub fn for_document(doc: &Document, scale: f64) -> Self {
        let config = &doc.config;
        let (paper_width, paper_height) = config.page_size.dimensions_in();
        let (margin_top, margin_bottom, margin_left, margin_right) = config.margin.to_inches();
        Self {
            paper_width,
            paper_height,
            landscape: config.orientation.is_landscape(),
            margin_top,
            margin_bottom,
            margin_left,
            margin_right,
            header_template: doc.header_template(),
            footer_template: doc.footer_template(),
            display_header_footer: true,
            print_background: true,
            prefer_css_page_size: true,
            scale,
        }
    }
}

/// One browser page.
pub trait RenderSession {
    /// Navigate to `url` and wait for the load to finish.
    fn open(&mut self, url: &str) -> Result<(), Md2PdfError>;

    /// Evaluate a script, optionally awaiting the promise it returns.
    fn evaluate(&mut self, script: &str, await_promise: bool)
        -> Result<Option<Value>, Md2PdfError>;

    fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, Md2PdfError>;
}

/// Starts browser sessions. Dropping a session releases the browser.
pub trait RenderEngine: Send + Sync {
    fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError>;
}

// ── Chrome ───────────────────────────────────────────────────────────────

/// Headless Chrome/Chromium through the DevTools protocol.
#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    /// Browser binary; `None` lets headless_chrome search the usual places.
    pub executable: Option<PathBuf>,
    /// How long the browser may sit idle before the connection is dropped.
    pub idle_timeout: Option<Duration>,
}

impl ChromeEngine {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            idle_timeout: None,
        }
    }
}

impl RenderEngine for ChromeEngine {
    fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.executable.clone())
            .idle_browser_timeout(self.idle_timeout.unwrap_or(Duration::from_secs(120)))
            .args(vec![
                OsStr::new("--allow-file-access-from-files"),
                OsStr::new("--enable-local-file-access"),
            ])
            .build()
            .map_err(|e| Md2PdfError::EngineLaunch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| Md2PdfError::EngineLaunch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Md2PdfError::EngineLaunch(format!("cannot open a tab: {e}")))?;
        debug!("Browser launched");

        Ok(Box::new(ChromeSession {
            _browser: browser,
            tab,
        }))
    }
}

struct ChromeSession {
    /// Kills the browser process when dropped.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl RenderSession for ChromeSession {
    fn open(&mut self, url: &str) -> Result<(), Md2PdfError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| Md2PdfError::RenderFailed {
                step: "navigation",
                detail: e.to_string(),
            })?;
        Ok(())
    }

    fn evaluate(
        &mut self,
        script: &str,
        await_promise: bool,
    ) -> Result<Option<Value>, Md2PdfError> {
        let result = self
            .tab
            .evaluate(script, await_promise)
            .map_err(|e| Md2PdfError::RenderFailed {
                step: "script evaluation",
                detail: e.to_string(),
            })?;
        Ok(result.value)
    }

    fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, Md2PdfError> {
        let options = PrintToPdfOptions {
            landscape: Some(options.landscape),
            display_header_footer: Some(options.display_header_footer),
            print_background: Some(options.print_background),
            scale: Some(options.scale),
            paper_width: Some(options.paper_width),
            paper_height: Some(options.paper_height),
            margin_top: Some(options.margin_top),
            margin_bottom: Some(options.margin_bottom),
            margin_left: Some(options.margin_left),
            margin_right: Some(options.margin_right),
            header_template: Some(options.header_template.clone()),
            footer_template: Some(options.footer_template.clone()),
            prefer_css_page_size: Some(options.prefer_css_page_size),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| Md2PdfError::RenderFailed {
                step: "PDF export",
                detail: e.to_string(),
            })
    }
}

// ── Assets ───────────────────────────────────────────────────────────────

/// Stylesheets and scripts under the resource directory.
#[derive(Debug, Clone)]
pub struct Assets {
    root: PathBuf,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read an asset as text.
    ///
    /// # Errors
    /// [`ParseWarning::MissingAsset`] when the file cannot be read.
    pub fn load(&self, relative: &str) -> Result<String, ParseWarning> {
        let path = self.root.join(relative);
        std::fs::read_to_string(&path).map_err(|e| {
            debug!("Cannot read asset {}: {}", path.display(), e);
            ParseWarning::MissingAsset { path }
        })
    }

    /// `file://` URL of an existing asset.
    pub fn url(&self, relative: &str) -> Result<String, ParseWarning> {
        let path = self.root.join(relative);
        if path.is_file() {
            Ok(format!("file://{}", path.display()))
        } else {
            Err(ParseWarning::MissingAsset { path })
        }
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Render `doc` to PDF bytes with one session from `engine`.
///
/// Non-fatal problems are logged and appended to `warnings`.
pub fn render_document(
    doc: &Document,
    assets: &Assets,
    engine: &dyn RenderEngine,
    scale: f64,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<u8>, Md2PdfError> {
    let mut report = |w: ParseWarning| {
        warn!("{}", w);
        warnings.push(w);
    };

    let page_dir = TempDir::new()
        .map_err(|e| Md2PdfError::Internal(format!("Cannot create temp directory: {e}")))?;
    let page_path = page_dir.path().join("index.html");
    std::fs::write(&page_path, doc.to_html())
        .map_err(|e| Md2PdfError::Internal(format!("Cannot write temp page: {e}")))?;

    let mut session = engine.launch()?;

    // ── Step 1: Load the page ────────────────────────────────────────────
    session.open(&format!("file://{}", page_path.display()))?;
    debug!("Page loaded from {}", page_path.display());

    // ── Step 2: Stylesheets ──────────────────────────────────────────────
    let css = collect_css(&doc.config, assets, &mut report);
    session.evaluate(&inject_style_script(&css), false)?;

    // ── Step 3: Raster image ratio ───────────────────────────────────────
    if doc.body_html.contains(RASTER_CLASS) {
        let ratio = f64::from(doc.config.image_scale_percent) / 100.0;
        session.evaluate(&image_ratio_script(ratio), true)?;
    }

    // ── Step 4: Diagrams ─────────────────────────────────────────────────
    if doc.body_html.contains(DIAGRAM_MARKER) {
        for w in render_diagrams(session.as_mut(), &doc.config, assets) {
            report(w);
        }
    }

    // ── Step 5: Math ─────────────────────────────────────────────────────
    if doc.body_html.contains(MATH_MARKER) {
        for w in render_math(session.as_mut(), assets) {
            report(w);
        }
    }

    // ── Step 6: Export ───────────────────────────────────────────────────
    let pdf = session.print_to_pdf(&PdfOptions::for_document(doc, scale))?;
    info!("PDF exported: {} bytes", pdf.len());
    Ok(pdf)
}

/// Shipped stylesheets, the font stack and the highlight theme, in that order.
fn collect_css(
    config: &RenderConfig,
    assets: &Assets,
    report: &mut impl FnMut(ParseWarning),
) -> String {
    let mut css = String::new();
    for sheet in &config.stylesheets {
        match assets.load(sheet) {
            Ok(text) => {
                css.push_str(&text);
                css.push('\n');
            }
            Err(w) => report(w),
        }
    }
    css.push_str(&format!(
        "body, .title, .pageNumber {{ font-family: {}; }}\n",
        config.font_stack()
    ));
    if let Some(ref theme) = config.highlight_theme {
        match highlight::theme_css(theme) {
            Ok(text) => css.push_str(&text),
            Err(w) => report(w),
        }
    }
    css
}

fn render_diagrams(
    session: &mut dyn RenderSession,
    config: &RenderConfig,
    assets: &Assets,
) -> Vec<ParseWarning> {
    let bundle = match assets.load(DIAGRAM_SCRIPT) {
        Ok(bundle) => bundle,
        Err(w) => return vec![w],
    };
    let init = format!(
        "mermaid.initialize({});",
        config.diagram_theme.initialize_options()
    );

    let outcome = session
        .evaluate(&bundle, false)
        .and_then(|_| session.evaluate(&init, false))
        .and_then(|_| session.evaluate(DIAGRAM_RUN_SCRIPT, true));

    match outcome {
        Ok(Some(Value::String(detail))) => vec![ParseWarning::DiagramFailed { detail }],
        Ok(_) => {
            debug!("Diagrams rendered");
            Vec::new()
        }
        Err(e) => vec![ParseWarning::DiagramFailed {
            detail: e.to_string(),
        }],
    }
}

fn render_math(session: &mut dyn RenderSession, assets: &Assets) -> Vec<ParseWarning> {
    let mut warnings = Vec::new();
    match assets.url(MATH_STYLESHEET) {
        Ok(url) => {
            if let Err(e) = session.evaluate(&link_stylesheet_script(&url), true) {
                warnings.push(ParseWarning::MathFailed {
                    detail: e.to_string(),
                });
            }
        }
        Err(w) => warnings.push(w),
    }

    let bundle = match assets.load(MATH_SCRIPT) {
        Ok(bundle) => bundle,
        Err(w) => {
            warnings.push(w);
            return warnings;
        }
    };

    let outcome = session
        .evaluate(&bundle, false)
        .and_then(|_| session.evaluate(MATH_RENDER_SCRIPT, false));
    match outcome {
        Ok(Some(Value::Array(errors))) => {
            warnings.extend(errors.into_iter().map(|e| ParseWarning::MathFailed {
                detail: match e {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
            }));
        }
        Ok(_) => {}
        Err(e) => warnings.push(ParseWarning::MathFailed {
            detail: e.to_string(),
        }),
    }
    warnings
}

// ── In-page scripts ──────────────────────────────────────────────────────

fn inject_style_script(css: &str) -> String {
    format!(
        "(() => {{ const s = document.createElement('style'); s.textContent = {}; \
         document.head.appendChild(s); }})()",
        Value::String(css.to_string())
    )
}

fn link_stylesheet_script(url: &str) -> String {
    format!(
        "new Promise((resolve) => {{ const l = document.createElement('link'); \
         l.rel = 'stylesheet'; l.href = {}; l.onload = l.onerror = () => resolve(null); \
         document.head.appendChild(l); }})",
        Value::String(url.to_string())
    )
}

/// Width of every raster image becomes `ceil(naturalWidth * ratio)` px once decoded.
fn image_ratio_script(ratio: f64) -> String {
    format!(
        "(() => {{ const ratio = {ratio}; \
         const images = Array.from(document.querySelectorAll('img.{RASTER_CLASS}')); \
         return Promise.all(images.map((img) => img.decode().catch(() => null))).then(() => {{ \
         for (const img of images) {{ if (img.naturalWidth) \
         img.style.width = Math.ceil(img.naturalWidth * ratio) + 'px'; }} \
         return images.length; }}); }})()"
    )
}

/// Resolves to the first error message, or `null` when every diagram rendered.
const DIAGRAM_RUN_SCRIPT: &str = "(async () => { \
    try { await mermaid.run({ querySelector: '.mermaid' }); return null; } \
    catch (e) { return String((e && e.message) || e); } })()";

/// Renders every math span; failed expressions are re-rendered in error
/// colour and their messages returned.
const MATH_RENDER_SCRIPT: &str = "(() => { const errors = []; \
    for (const el of document.querySelectorAll('.math')) { \
    const tex = el.textContent; const displayMode = el.classList.contains('math-display'); \
    try { katex.render(tex, el, { displayMode, throwOnError: true }); } \
    catch (e) { errors.push(String((e && e.message) || e)); \
    katex.render(tex, el, { displayMode, throwOnError: false }); } } \
    return errors; })()";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::assemble;
    use crate::tables::{ConfigResolver, ConfigTables};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records calls in order and counts released sessions.
    #[derive(Default, Clone)]
    struct FakeEngine {
        calls: Arc<Mutex<Vec<String>>>,
        launched: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
        diagram_error: Option<String>,
        math_errors: Vec<String>,
        fail_export: bool,
    }

    struct FakeSession {
        engine: FakeEngine,
    }

    impl Drop for FakeSession {
        fn drop(&mut self) {
            self.engine.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RenderEngine for FakeEngine {
        fn launch(&self) -> Result<Box<dyn RenderSession>, Md2PdfError> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                engine: self.clone(),
            }))
        }
    }

    fn classify(script: &str) -> &'static str {
        if script.contains("createElement('style')") {
            "css"
        } else if script.contains("naturalWidth") {
            "ratio"
        } else if script.contains("mermaid.initialize") {
            "mermaid-init"
        } else if script.contains("mermaid.run") {
            "mermaid-run"
        } else if script.contains("createElement('link')") {
            "math-css"
        } else if script.contains("katex.render") {
            "math"
        } else {
            "bundle"
        }
    }

    impl RenderSession for FakeSession {
        fn open(&mut self, url: &str) -> Result<(), Md2PdfError> {
            assert!(url.starts_with("file://"));
            assert!(Path::new(&url["file://".len()..]).exists());
            self.engine.calls.lock().unwrap().push("open".into());
            Ok(())
        }

        fn evaluate(
            &mut self,
            script: &str,
            _await_promise: bool,
        ) -> Result<Option<Value>, Md2PdfError> {
            let kind = classify(script);
            self.engine.calls.lock().unwrap().push(kind.into());
            Ok(match kind {
                "mermaid-run" => self.engine.diagram_error.clone().map(Value::String),
                "math" => Some(Value::Array(
                    self.engine
                        .math_errors
                        .iter()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                )),
                _ => None,
            })
        }

        fn print_to_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, Md2PdfError> {
            self.engine.calls.lock().unwrap().push("pdf".into());
            assert!(options.display_header_footer);
            if self.engine.fail_export {
                return Err(Md2PdfError::RenderFailed {
                    step: "PDF export",
                    detail: "boom".into(),
                });
            }
            Ok(b"%PDF-1.7 fake".to_vec())
        }
    }

    fn full_assets() -> TempDir {
        let dir = TempDir::new().unwrap();
        for rel in [
            "style/base.css",
            "style/lang/latin.css",
            "style/color/color.css",
            DIAGRAM_SCRIPT,
            MATH_SCRIPT,
            MATH_STYLESHEET,
        ] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "/* asset */").unwrap();
        }
        dir
    }

    fn document(body: &str) -> Document {
        let tables = ConfigTables::builtin();
        let config = ConfigResolver::new(&tables)
            .resolve("a4", "latin", "color")
            .unwrap();
        assemble(body.to_string(), None, config)
    }

    const EVERYTHING: &str = "<h1 id=\"t\">T</h1>\
        <img class=\"md-img\" src=\"/a.png\">\
        <div class=\"mermaid\">\ngraph TD; A--&gt;B\n</div>\
        <p><span class=\"math math-inline\">x^2</span></p>";

    #[test]
    fn steps_run_in_order() {
        let dir = full_assets();
        let engine = FakeEngine::default();
        let mut warnings = Vec::new();
        let pdf = render_document(
            &document(EVERYTHING),
            &Assets::new(dir.path()),
            &engine,
            0.8,
            &mut warnings,
        )
        .unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec![
                "open",
                "css",
                "ratio",
                "bundle",
                "mermaid-init",
                "mermaid-run",
                "math-css",
                "bundle",
                "math",
                "pdf"
            ]
        );
        assert_eq!(engine.launched.load(Ordering::SeqCst), 1);
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn passes_are_skipped_without_matching_content() {
        let dir = full_assets();
        let engine = FakeEngine::default();
        let mut warnings = Vec::new();
        render_document(
            &document("<p>plain</p>"),
            &Assets::new(dir.path()),
            &engine,
            0.8,
            &mut warnings,
        )
        .unwrap();
        assert_eq!(*engine.calls.lock().unwrap(), vec!["open", "css", "pdf"]);
    }

    #[test]
    fn diagram_and_math_errors_are_warnings() {
        let dir = full_assets();
        let engine = FakeEngine {
            diagram_error: Some("Parse error on line 1".into()),
            math_errors: vec!["KaTeX parse error".into()],
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let pdf = render_document(
            &document(EVERYTHING),
            &Assets::new(dir.path()),
            &engine,
            0.8,
            &mut warnings,
        );
        assert!(pdf.is_ok());
        assert_eq!(
            warnings,
            vec![
                ParseWarning::DiagramFailed {
                    detail: "Parse error on line 1".into()
                },
                ParseWarning::MathFailed {
                    detail: "KaTeX parse error".into()
                },
            ]
        );
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_assets_are_warnings() {
        let dir = TempDir::new().unwrap();
        let engine = FakeEngine::default();
        let mut warnings = Vec::new();
        render_document(
            &document(EVERYTHING),
            &Assets::new(dir.path()),
            &engine,
            0.8,
            &mut warnings,
        )
        .unwrap();
        // three stylesheets, the diagram bundle, the math stylesheet and bundle
        assert_eq!(warnings.len(), 6, "{warnings:?}");
        assert!(warnings
            .iter()
            .all(|w| matches!(w, ParseWarning::MissingAsset { .. })));
        let calls = engine.calls.lock().unwrap();
        assert!(!calls.iter().any(|c| c == "mermaid-run" || c == "math"));
        assert_eq!(calls.last().map(String::as_str), Some("pdf"));
    }

    #[test]
    fn session_is_released_on_failure() {
        let dir = full_assets();
        let engine = FakeEngine {
            fail_export: true,
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let err = render_document(
            &document("<p>x</p>"),
            &Assets::new(dir.path()),
            &engine,
            0.8,
            &mut warnings,
        )
        .unwrap_err();
        assert!(matches!(err, Md2PdfError::RenderFailed { .. }));
        assert_eq!(engine.launched.load(Ordering::SeqCst), 1);
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pdf_options_follow_config() {
        let tables = ConfigTables::builtin();
        let config = ConfigResolver::new(&tables)
            .resolve("letterr", "latin", "color")
            .unwrap();
        let doc = assemble("<h1>T</h1>".into(), None, config);
        let options = PdfOptions::for_document(&doc, 0.8);
        assert!(options.landscape);
        assert_eq!((options.paper_width, options.paper_height), (8.5, 11.0));
        assert!((options.margin_left - 16.0 / 25.4).abs() < 1e-9);
        assert!(options.header_template.contains("class=\"title\""));
        assert!(options.prefer_css_page_size && options.print_background);
    }

    #[test]
    fn style_script_embeds_css_as_a_string_literal() {
        let script = inject_style_script("p { content: \"a\" }\n");
        assert!(script.contains(r#""p { content: \"a\" }\n""#), "got: {script}");
    }
}
