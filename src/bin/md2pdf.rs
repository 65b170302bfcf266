//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and writes the PDF to standard output.

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser};
use md2pdf::pipeline::renderer::ANCHOR_TARGET;
use md2pdf::{
    convert_source, write_pdf, ChromeEngine, ConfigResolver, ConfigTables, ConversionConfig,
    InputSource, COLOR_CODES, LANGUAGE_CODES, PAPER_CODES,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "warn";

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a file, PDF on stdout
  md2pdf README.md > README.pdf

  # Landscape A4, Japanese fonts, no page numbers
  md2pdf -p a4r -l ja -n notes.md > notes.pdf

  # From a pipe, with an explicit title and half-size raster images
  cat report.md | md2pdf -t "Quarterly Report" -r 50 > report.pdf

  # Print the anchor id of every heading to stderr
  md2pdf -a guide.md > /dev/null

CODE FENCES:
  ```lang:file.ext [float|newpage|isolated] "Caption"
  ```mermaid                      diagram

ENVIRONMENT VARIABLES:
  MD2PDF_CHROME      Chrome/Chromium binary to launch
  MD2PDF_RESOURCES   Directory holding style/ and script/ assets
  RUST_LOG           Log filter (default: warn)
"#;

#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    disable_version_flag = true,
    about = "Convert Markdown to PDF through a headless browser",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file; `-` or omitted reads standard input.
    infile: Option<String>,

    /// Paper size; a trailing `r` means landscape.
    #[arg(short, long, default_value = "a4", value_parser = PossibleValuesParser::new(PAPER_CODES))]
    paper: String,

    /// Document title. Default: the first level-1 heading.
    #[arg(short, long)]
    title: Option<String>,

    /// Do not print page numbers.
    #[arg(short = 'n', long)]
    nopage: bool,

    /// Raster image width as a percentage of the natural width.
    #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    ratio: u32,

    /// Text language, selects the font stack.
    #[arg(short, long, default_value = "latin", value_parser = PossibleValuesParser::new(LANGUAGE_CODES))]
    lang: String,

    /// Do not indent the first line of paragraphs.
    #[arg(short = 'i', long)]
    noindent: bool,

    /// Colour scheme for code and diagrams.
    #[arg(short, long, default_value = "color", value_parser = PossibleValuesParser::new(COLOR_CODES))]
    color: String,

    /// Log the anchor id of every heading to stderr.
    #[arg(short, long)]
    anchors: bool,

    /// Base directory for the input file and relative image paths.
    #[arg(short, long, hide = true)]
    base: Option<PathBuf>,

    /// Directory holding stylesheets and scripts.
    #[arg(long, env = "MD2PDF_RESOURCES", hide = true)]
    resources: Option<PathBuf>,

    /// Chrome/Chromium executable.
    #[arg(long, env = "MD2PDF_CHROME", hide = true)]
    chrome: Option<PathBuf>,

    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(diagnostics_layer(filter, io::stderr))
        .with(anchor_layer(io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base = match cli.base {
        Some(ref base) => base.clone(),
        None => std::env::current_dir().context("Cannot determine the working directory")?,
    };

    let config = build_config(&cli, base.clone())?;
    let tables = ConfigTables::builtin();
    let resolver = ConfigResolver::new(&tables);
    let source = InputSource::from_arg(cli.infile.as_deref(), &base);
    let engine = Arc::new(ChromeEngine::new(cli.chrome.clone()));

    let Some(output) = convert_source(&source, &config, &resolver, engine).await? else {
        return Ok(());
    };

    let mut stdout = tokio::io::stdout();
    write_pdf(&mut stdout, &output.pdf).await?;
    Ok(())
}

/// Library diagnostics, filtered by `RUST_LOG`.
fn diagnostics_layer<S, W>(filter: EnvFilter, writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .without_time()
        .with_target(false)
        .with_filter(filter)
        .with_filter(filter_fn(|meta| meta.target() != ANCHOR_TARGET))
}

/// `--anchors` output: bare `Anchor id=…` lines, independent of `RUST_LOG`.
/// The library only emits them when the flag is set.
fn anchor_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .with_filter(filter_fn(|meta| meta.target() == ANCHOR_TARGET))
}

fn build_config(cli: &Cli, base: PathBuf) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .paper(&cli.paper)
        .language(&cli.lang)
        .color(&cli.color)
        .show_page_numbers(!cli.nopage)
        .image_scale_percent(cli.ratio)
        .no_indent(cli.noindent)
        .anchor_debug(cli.anchors)
        .base_dir(base);

    if let Some(ref title) = cli.title {
        builder = builder.title(title);
    }
    if let Some(ref resources) = cli.resources {
        builder = builder.resource_dir(resources);
    }

    builder.build().context("Invalid options")
}
