// ABOUTME: CLI for running a captured selection through the larkcopy pipeline.
// ABOUTME: Prints the html, text, rtf or json rendition and optionally writes the system clipboard.

mod system;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use larkcopy_core::output::html_to_text;
use larkcopy_core::{
    Copier, CopyCommand, CopyOutcome, MemoryDocument, OutputFormat, PreparedCopy, Selection,
    SelectionRange, Settings,
};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::system::SystemClipboard;

/// Normalize copied Feishu/Lark document content into clipboard formats.
#[derive(Parser, Debug)]
#[command(name = "larkcopy")]
#[command(about = "Turn a Feishu/Lark selection into portable clipboard content")]
struct Args {
    /// HTML of the selection. Without it, plain text is read from --text or stdin.
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Plain-text serialization of the selection.
    #[arg(long = "text")]
    text: Option<String>,

    /// Output format: html (default), text/txt, rtf, json
    #[arg(short = 'f', long = "format", default_value = "html")]
    format: String,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Page address the selection comes from; resolves relative image sources
    #[arg(long = "url")]
    url: Option<String>,

    /// Settings JSON file
    #[arg(long = "settings")]
    settings: Option<PathBuf>,

    /// Produce the minimal wrapper instead of rich HTML
    #[arg(long = "no-preserve-format")]
    no_preserve_format: bool,

    /// Image capture timeout in milliseconds
    #[arg(long = "image-timeout", default_value_t = 5000)]
    image_timeout_ms: u64,

    /// Also write the result to the system clipboard
    #[arg(long = "write")]
    write: bool,

    /// Verbose logging
    #[arg(long = "debug")]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "larkcopy=debug" } else { "larkcopy=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("error reading settings {:?}", path))?;
            Settings::from_json(&raw).with_context(|| format!("invalid settings {:?}", path))?
        }
        None => Settings::default(),
    };
    if args.no_preserve_format {
        settings.preserve_format = false;
    }
    if args.debug {
        settings.debug_mode = true;
    }
    Ok(settings)
}

fn load_selection(args: &Args) -> Result<Selection> {
    match &args.html {
        Some(path) => {
            let html = fs::read_to_string(path)
                .with_context(|| format!("error reading file {:?}", path))?;
            let text = args.text.clone().unwrap_or_else(|| html_to_text(&html));
            Ok(Selection::single(SelectionRange::new(html, text)))
        }
        None => {
            let text = match &args.text {
                Some(text) => text.clone(),
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("error reading stdin")?;
                    let trimmed = buf.strip_suffix('\n').unwrap_or(&buf);
                    trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string()
                }
            };
            Ok(Selection::plain(text))
        }
    }
}

fn render(prepared: &PreparedCopy, format: OutputFormat) -> Result<String> {
    let payload = &prepared.payload;
    let out = match format {
        OutputFormat::Html => payload.html().unwrap_or_default().to_string(),
        OutputFormat::Text => payload.plain_text().unwrap_or_default().to_string(),
        OutputFormat::Rtf => payload.rtf().unwrap_or_default().to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "kind": prepared.kind,
            "chars": prepared.chars,
            "images": prepared.images,
            "formats": payload.mime_types().collect::<Vec<_>>(),
            "styles": prepared.descriptor.preserved_styles,
            "html": payload.html(),
            "text": payload.plain_text(),
            "rtf": payload.rtf(),
        }))?,
    };
    Ok(out)
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = load_settings(&args)?;
    init_logging(settings.debug_mode);
    let selection = load_selection(&args)?;
    let format = OutputFormat::from(args.format.as_str());

    let mut builder = Copier::builder()
        .settings(settings)
        .image_timeout(Duration::from_millis(args.image_timeout_ms))
        .verify(false);
    if let Some(url) = &args.url {
        builder = builder.page_url(url.clone());
    }

    let prepared = if args.write {
        let copier = builder.clipboard(Arc::new(SystemClipboard)).build();
        // No page to fall back to: the scratch tier must not report success.
        let mut doc = MemoryDocument::new().with_copy_command(CopyCommand::Refuse);
        match copier.copy(&selection, None, &mut doc).await {
            CopyOutcome::Copied { tier, prepared } => {
                info!(tier = %tier, "clipboard written");
                for toast in doc.toasts() {
                    eprintln!("{}", toast);
                }
                prepared
            }
            CopyOutcome::Failed { .. } => {
                eprintln!("error: could not write the system clipboard");
                return Ok(ExitCode::from(1));
            }
            CopyOutcome::Disabled => {
                eprintln!("copying is disabled in settings");
                return Ok(ExitCode::SUCCESS);
            }
            CopyOutcome::Empty => {
                debug!("empty selection");
                return Ok(ExitCode::SUCCESS);
            }
        }
    } else {
        let copier = builder.build();
        if !copier.settings().enabled {
            eprintln!("copying is disabled in settings");
            return Ok(ExitCode::SUCCESS);
        }
        match copier.prepare(&selection).await {
            Some(prepared) => prepared,
            None => {
                debug!("empty selection");
                return Ok(ExitCode::SUCCESS);
            }
        }
    };

    let output = render(&prepared, format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("error writing to {:?}", path))?
        }
        None => println!("{}", output),
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
