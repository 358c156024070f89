//! Per-file trimming pipeline.
//!
//! decode → detect → plan → slice → encode → restore tags, each step
//! short-circuiting into a [`FileOutcome`]. Nothing is written until the
//! trimmed buffer is complete in memory.

use std::sync::Arc;
use std::time::Instant;

use strim_media::silence_removal::trim_decision;
use strim_media::{fs_utils, AudioCodec, FfmpegCodec, FfmpegTagStore, MediaError, TagStore};
use strim_models::{FailureKind, FileOutcome, FileTask};
use tracing::Instrument;

use crate::config::TrimConfig;
use crate::logging::FileLogger;

/// Reason reported for files whose extension is not an audio format.
pub const UNSUPPORTED_FORMAT: &str = "unsupported format";

/// Runs the trimming pipeline for one file at a time.
#[derive(Clone)]
pub struct FileProcessor {
    codec: Arc<dyn AudioCodec>,
    tags: Arc<dyn TagStore>,
}

impl FileProcessor {
    pub fn new(codec: Arc<dyn AudioCodec>, tags: Arc<dyn TagStore>) -> Self {
        Self { codec, tags }
    }

    /// FFmpeg-backed processor; `timeout_secs` bounds each FFmpeg call.
    pub fn ffmpeg(timeout_secs: Option<u64>) -> Self {
        let (codec, tags) = match timeout_secs {
            Some(secs) => (
                FfmpegCodec::new().with_timeout(secs),
                FfmpegTagStore::new().with_timeout(secs),
            ),
            None => (FfmpegCodec::new(), FfmpegTagStore::new()),
        };
        Self::new(Arc::new(codec), Arc::new(tags))
    }

    /// Process one task. Never panics on bad input; every failure becomes an outcome.
    pub async fn process(&self, task: &FileTask, config: &TrimConfig) -> FileOutcome {
        let started = Instant::now();
        let logger = FileLogger::new(&task.source_path, "trim");

        let outcome = self
            .run(task, config, &logger)
            .instrument(logger.create_span())
            .await;

        outcome.with_elapsed_ms(started.elapsed().as_millis() as u64)
    }

    async fn run(&self, task: &FileTask, config: &TrimConfig, logger: &FileLogger) -> FileOutcome {
        let source = &task.source_path;

        let Some(format) = task.format else {
            logger.log_warning("Skipping file with unsupported format");
            return FileOutcome::skipped(source, UNSUPPORTED_FORMAT);
        };

        if let Some(conflict) = &task.conflict {
            logger.log_error(conflict);
            return FileOutcome::failed(source, FailureKind::Conflict, conflict.clone());
        }

        logger.log_start(&format!("{} ({})", source.display(), format));

        // Captured before anything can overwrite the source
        let captured = if config.save_metadata && !config.dry_run {
            Some(self.tags.read_tags(source, format).await)
        } else {
            None
        };

        // An unreadable file is a decode failure even when its tags failed first
        let buffer = match self.codec.decode(source).await {
            Ok(buffer) => buffer,
            Err(e) => return fail(logger, task, &e, FailureKind::Decode),
        };

        let tags = match captured {
            Some(Ok(tags)) => Some(tags),
            Some(Err(e)) => return fail(logger, task, &e, FailureKind::Metadata),
            None => None,
        };

        let policy = config.policy();
        let analysis = tokio::task::spawn_blocking(move || {
            let decision = trim_decision(&buffer, &policy);
            (buffer, decision)
        })
        .await;
        let (buffer, decision) = match analysis {
            Ok(result) => result,
            Err(e) => {
                let message = format!("silence detection task failed: {e}");
                logger.log_error(&message);
                return FileOutcome::failed(source, FailureKind::Internal, message);
            }
        };

        logger.log_decision(&decision, config.min_silence_seconds);

        if config.dry_run {
            logger.log_completion("dry run, nothing written");
            return FileOutcome::success(source, decision, None);
        }

        if task.replaces_source() && decision.window.is_full(buffer.frame_count()) {
            logger.log_completion("nothing to trim, source left untouched");
            return FileOutcome::success(source, decision, None);
        }

        let trimmed = buffer.slice(decision.window);
        drop(buffer);

        let output = &task.destination;
        if let Err(e) = fs_utils::ensure_parent_dir(output).await {
            return fail(logger, task, &e, FailureKind::Io);
        }

        if let Err(e) = self.codec.encode(output, &trimmed).await {
            return fail(logger, task, &e, FailureKind::Encode);
        }

        if let Some(tags) = tags {
            if let Err(e) = self.tags.write_tags(output, format, &tags).await {
                // The trimmed audio stays in place
                return fail(logger, task, &e, FailureKind::Metadata).with_output(output);
            }
        }

        logger.log_completion(&format!(
            "{:.3} s removed, written to {}",
            decision.seconds_removed(),
            output.display()
        ));
        FileOutcome::success(source, decision, Some(output.clone()))
    }
}

/// Build a failed outcome for an error raised during `step`.
///
/// Filesystem errors keep their own category whatever the step.
fn fail(logger: &FileLogger, task: &FileTask, err: &MediaError, step: FailureKind) -> FileOutcome {
    let message = err.detailed();
    logger.log_error(&message);

    let kind = match err.failure_kind() {
        FailureKind::Io => FailureKind::Io,
        _ => step,
    };
    FileOutcome::failed(&task.source_path, kind, message)
}
