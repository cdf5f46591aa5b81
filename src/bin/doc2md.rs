//! CLI binary for edgequake-doc2md.
//!
//! A thin shim over the library crate: `serve` runs the HTTP endpoint,
//! `convert` runs the same dispatcher on one local file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_doc2md::{convert_file, convert_to_file, server, ConversionConfig, ExtensionMatching};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the conversion endpoint on 0.0.0.0:6677
  doc2md serve

  # Upload a document
  curl -F file=@report.docx http://localhost:6677/convert

  # One-shot conversion to stdout
  doc2md convert slides.pptx

  # Convert to file, treating REPORT.DOCX like report.docx
  doc2md --case-insensitive-extensions convert REPORT.DOCX -o report.md

ROUTING:
  Extensions that name a pandoc input format (docx, odt, epub, html, rst,
  org, latex, ipynb, …) go straight to pandoc. Everything else is rendered
  to HTML by LibreOffice first. Matching is case-sensitive unless
  --case-insensitive-extensions is given.

REQUIREMENTS:
  pandoc       https://pandoc.org/installing.html
  libreoffice  only needed for the render route
"#;

/// Convert documents to CommonMark with pandoc and LibreOffice.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert documents to CommonMark with pandoc and LibreOffice",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    tools: ToolArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOC2MD_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// pandoc executable.
    #[arg(long, global = true, env = "DOC2MD_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// LibreOffice executable (libreoffice or soffice).
    #[arg(long, global = true, env = "DOC2MD_LIBREOFFICE", default_value = "libreoffice")]
    libreoffice: PathBuf,

    /// Per-tool timeout in seconds (0 disables).
    #[arg(long, global = true, env = "DOC2MD_TOOL_TIMEOUT", default_value_t = 120)]
    tool_timeout: u64,

    /// Directory for temporary files.
    #[arg(long, global = true, env = "DOC2MD_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Match extensions against the pandoc format list case-insensitively.
    #[arg(long, global = true, env = "DOC2MD_CASE_INSENSITIVE")]
    case_insensitive_extensions: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /convert`.
    Serve {
        /// Bind address.
        #[arg(long, env = "DOC2MD_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Bind port.
        #[arg(short, long, env = "DOC2MD_PORT", default_value_t = 6677)]
        port: u16,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "DOC2MD_MAX_UPLOAD_MB", default_value_t = 50,
              value_parser = clap::value_parser!(u64).range(1..=4096))]
        max_upload_mb: u64,
    },

    /// Convert one local file.
    Convert {
        /// Document to convert.
        input: PathBuf,

        /// Write Markdown to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output structured JSON (markdown, route, duration) instead of Markdown.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            ref host,
            port,
            max_upload_mb,
        } => {
            let max_upload_bytes = usize::try_from(max_upload_mb * 1024 * 1024)
                .context("--max-upload-mb is too large for this platform")?;
            let config = build_config(&cli.tools, Some(max_upload_bytes))?;
            tracing::debug!("{:?}", config);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            server::serve(listener, config, shutdown_signal())
                .await
                .context("Server error")?;
        }
        Command::Convert {
            ref input,
            ref output,
            json,
        } => {
            let config = build_config(&cli.tools, None)?;
            let progress = (!cli.quiet && io::stderr().is_terminal()).then(|| spinner(input));

            let result = match output {
                Some(path) => convert_to_file(input, path, &config).await,
                None => convert_file(input, &config).await,
            };
            if let Some(ref bar) = progress {
                bar.finish_and_clear();
            }
            let result = result.with_context(|| format!("Failed to convert {}", input.display()))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("Failed to serialize output")?
                );
            } else if output.is_none() {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(result.markdown.as_bytes())
                    .context("Failed to write to stdout")?;
            }

            if !cli.quiet {
                let dest = output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "stdout".to_string());
                eprintln!(
                    "{} {} → {}  {}",
                    green("✔"),
                    input.display(),
                    dest,
                    dim(&format!("{}ms", result.duration_ms)),
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(tools: &ToolArgs, max_upload_bytes: Option<usize>) -> Result<ConversionConfig> {
    let matching = if tools.case_insensitive_extensions {
        ExtensionMatching::CaseInsensitive
    } else {
        ExtensionMatching::CaseSensitive
    };

    let mut builder = ConversionConfig::builder()
        .pandoc_path(&tools.pandoc)
        .libreoffice_path(&tools.libreoffice)
        .tool_timeout_secs(tools.tool_timeout)
        .extension_matching(matching);

    if let Some(ref dir) = tools.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(n) = max_upload_bytes {
        builder = builder.max_upload_bytes(n);
    }

    builder.build().context("Invalid configuration")
}

fn spinner(input: &std::path::Path) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Converting");
    bar.set_message(input.display().to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully..."),
    }
}
