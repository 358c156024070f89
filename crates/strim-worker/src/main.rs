//! Bulk silence trimmer binary.
//!
//! Usage: `strim [config.json]`. Settings not in the file come from
//! `STRIM_*` environment variables (a `.env` file is honoured).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strim_worker::report::write_report;
use strim_worker::{BatchScheduler, FileProcessor, TrimConfig, WorkerError};

/// Environment variable bounding each FFmpeg invocation, in seconds.
const FFMPEG_TIMEOUT_ENV: &str = "STRIM_FFMPEG_TIMEOUT_SECS";

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing() {
    // Colored output for terminals, JSON when LOG_FORMAT=json
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("strim=info,strim_worker=info,strim_media=warn"));

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
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> Result<(), WorkerError> {
    let config_file = std::env::args_os().nth(1).map(PathBuf::from);
    let config = TrimConfig::load(config_file.as_deref())?;

    info!(
        root = %config.root_folder.display(),
        replace_files = config.replace_files,
        destination = ?config.output_root(),
        workers = config.worker_count,
        "Starting strim"
    );

    strim_media::check_ffmpeg()?;
    strim_media::check_ffprobe()?;

    let timeout = std::env::var(FFMPEG_TIMEOUT_ENV)
        .ok()
        .and_then(|s| s.parse().ok());
    let scheduler = Arc::new(BatchScheduler::new(config, FileProcessor::ffmpeg(timeout)));

    // Ctrl-C stops new files from starting
    let signal_scheduler = Arc::clone(&scheduler);
    let shutdown_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, finishing files in progress");
            signal_scheduler.shutdown();
        }
    });

    let outcomes = scheduler.run().await?;
    shutdown_handle.abort();

    let mut stdout = std::io::stdout().lock();
    let summary = write_report(&mut stdout, &outcomes)?;

    info!(
        found = summary.found,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        seconds_trimmed = summary.seconds_trimmed,
        "Batch complete"
    );
    Ok(())
}
