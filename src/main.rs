//! Inkframe - render diagram source through a remote SVG service.
//!
//! # Usage
//!
//! ```bash
//! inkframe flow.mmd > flow.svg
//! echo 'graph TD; A-->B' | inkframe --embed
//! inkframe --watch flow.mmd -o flow.svg
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use inkframe::client::RenderClient;
use inkframe::config::{
    clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags, ConfigFlags,
};
use inkframe::graphic::RenderResult;
use inkframe::session::RenderSession;
use inkframe::source::{decode_upload, normalize, DiagramSource};
use inkframe::watcher::SourceWatcher;

/// Render diagram source through a remote SVG service
#[derive(Parser, Debug)]
#[command(name = "inkframe", version, about, long_about = None)]
struct Cli {
    /// Diagram source file (omit or use `-` for stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Write the SVG to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Re-render whenever the source file changes
    #[arg(short, long)]
    watch: bool,

    /// Wrap the SVG in an outer element that fits and centers it
    #[arg(long)]
    embed: bool,

    /// Rendering service base URL
    #[arg(long, value_name = "URL")]
    service_url: Option<String>,

    /// Give up on a render after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Quiet period after an edit before re-rendering in watch mode
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Write debug logs to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Read a source file the way an upload is decoded.
async fn read_source(path: &Path) -> Result<DiagramSource> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(decode_upload(&name, bytes)?)
}

async fn read_stdin() -> Result<DiagramSource> {
    let text = tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
        .await
        .context("stdin reader failed")?
        .context("Failed to read stdin")?;
    Ok(normalize(&text))
}

/// Print or write the result. Returns whether a graphic was produced.
async fn emit(result: &RenderResult, output: Option<&Path>, embed: bool) -> Result<bool> {
    match result {
        RenderResult::Graphic(graphic) => {
            let svg = if embed {
                graphic.embed()
            } else {
                graphic.markup.clone()
            };
            if let Some(path) = output {
                tokio::fs::write(path, svg)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), "wrote graphic");
            } else {
                println!("{svg}");
            }
            Ok(true)
        }
        RenderResult::Failure(failure) => {
            eprintln!("{failure}");
            Ok(false)
        }
    }
}

fn spawn_render(
    session: &Arc<RenderSession>,
    source: DiagramSource,
    output: Option<PathBuf>,
    embed: bool,
) {
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let Some(result) = session.render_latest(source.as_str()).await else {
            return;
        };
        if let Err(err) = emit(&result, output.as_deref(), embed).await {
            error!("{err:#}");
        }
    });
}

async fn watch(
    session: Arc<RenderSession>,
    path: PathBuf,
    output: Option<PathBuf>,
    effective: &ConfigFlags,
) -> Result<()> {
    let mut watcher = SourceWatcher::new(&path, effective.debounce())
        .with_context(|| format!("Failed to watch {}", path.display()))?;

    spawn_render(&session, read_source(&path).await?, output.clone(), effective.embed);
    while watcher.changed().await {
        info!(path = %watcher.target_path().display(), "source changed");
        match read_source(&path).await {
            Ok(source) => spawn_render(&session, source, output.clone(), effective.embed),
            Err(err) => error!("{err:#}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let log_file = effective
        .log_file
        .clone()
        .or_else(|| std::env::var_os("INKFRAME_LOG_FILE").map(PathBuf::from));
    init_logging(log_file.as_deref())?;

    let client = match &effective.service_url {
        Some(url) => {
            RenderClient::parse(url).with_context(|| format!("Invalid service URL {url}"))?
        }
        None => RenderClient::default(),
    }
    .with_timeout(effective.timeout());
    let session = Arc::new(RenderSession::new(client));

    let file = cli.file.filter(|path| path.as_os_str() != "-");

    if effective.watch {
        let path = file.context("--watch needs a FILE to watch")?;
        watch(session, path, cli.output, &effective).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let source = match &file {
        Some(path) => read_source(path).await?,
        None => read_stdin().await?,
    };
    let result = session.client().render(&source).await;
    if emit(&result, cli.output.as_deref(), effective.embed).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
