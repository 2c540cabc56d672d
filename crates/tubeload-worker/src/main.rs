//! tubeload binary: upload the videos listed in a range of sheet rows.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tubeload_models::RowRange;
use tubeload_sheets::{SheetsClient, SheetsConfig};
use tubeload_worker::{
    authorize, GoogleConfig, ResultWriter, RowPipeline, RowResolver, RunSummary, Uploader,
    WorkerConfig, WorkerError, WorkerPool,
};
use tubeload_youtube::{YouTubeClient, YouTubeConfig};

#[derive(Parser, Debug)]
#[command(name = "tubeload")]
#[command(about = "Upload the videos described by spreadsheet rows and record their links")]
struct Cli {
    /// Directory containing the exported videos
    #[arg(long)]
    dir: PathBuf,

    /// First row to process (1-based, inclusive)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    from: u32,

    /// Last row to process (inclusive)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    to: u32,

    /// Number of concurrent uploads
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    concurrency: Option<u32>,

    /// Spreadsheet id, overriding TUBELOAD_SHEET_ID
    #[arg(long)]
    sheet_id: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let range = match RowRange::from_bounds(cli.from, cli.to) {
        Ok(range) => range,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    match run(cli, range).await {
        Ok(summary) => {
            if summary.write_failures > 0 {
                warn!(summary = %summary, "Some results could not be written back");
            }
            info!(summary = %summary, "tubeload finished");
        }
        Err(e) => {
            match e.downcast_ref::<WorkerError>() {
                Some(stopped) if stopped.is_cancelled() => warn!("{:#}", e),
                Some(failed) => error!(row = ?failed.row().map(|r| r.get()), "{:#}", e),
                None => error!("{:#}", e),
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, range: RowRange) -> Result<RunSummary> {
    let mut worker_config = WorkerConfig::from_env();
    if let Some(concurrency) = cli.concurrency {
        worker_config.concurrency = concurrency as usize;
    }

    let mut google = GoogleConfig::from_env();
    if let Some(sheet_id) = cli.sheet_id {
        google = google.with_sheet_id(sheet_id);
    }
    google.validate()?;
    info!(?worker_config, ?google, "Configuration loaded");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let tokens = authorize(&google, stdin)
        .await
        .context("Authorization failed")?;

    let sheets = Arc::new(
        SheetsClient::new(SheetsConfig::from_env(&google.sheet_id), tokens.clone())
            .context("Failed to create Sheets client")?,
    );

    let youtube_config = YouTubeConfig::from_env()?;
    let locator_host = youtube_config.locator_host.clone();
    let privacy_status = youtube_config.privacy_status;
    let youtube = Arc::new(
        YouTubeClient::new(youtube_config, tokens).context("Failed to create YouTube client")?,
    );

    let pipeline = RowPipeline::new(
        RowResolver::new(sheets.clone(), &cli.dir),
        Uploader::new(youtube).with_privacy_status(privacy_status),
        ResultWriter::new(sheets, locator_host),
        &worker_config,
    );
    let pool = WorkerPool::new(pipeline, worker_config.concurrency);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling in-flight uploads");
            on_signal.cancel();
        }
    });

    Ok(pool.run_range(range, cancel).await?)
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tubeload=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
