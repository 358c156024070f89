//! Batch scheduler.
//!
//! Discovered tasks go into a shared queue drained by `worker_count`
//! workers. Each worker runs one file's whole pipeline before taking the
//! next; outcomes are collected in completion order.

use std::sync::Arc;

use strim_models::{FailureKind, FileOutcome, FileTask};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info};

use crate::config::TrimConfig;
use crate::discovery::discover;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics::record_file_outcome;
use crate::processor::FileProcessor;

/// Reason reported for tasks not started before shutdown.
pub const CANCELLED: &str = "batch cancelled";

type TaskQueue = Arc<Mutex<mpsc::UnboundedReceiver<FileTask>>>;

/// Fans files out over a fixed pool of workers.
pub struct BatchScheduler {
    config: Arc<TrimConfig>,
    processor: Arc<FileProcessor>,
    shutdown: watch::Sender<bool>,
}

impl BatchScheduler {
    /// Create a scheduler for a validated configuration.
    pub fn new(config: TrimConfig, processor: FileProcessor) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
            shutdown,
        }
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// Discover files under the root folder and process them all.
    pub async fn run(&self) -> WorkerResult<Vec<FileOutcome>> {
        let config = Arc::clone(&self.config);
        let tasks = tokio::task::spawn_blocking(move || discover(&config))
            .await
            .map_err(|e| WorkerError::processing_failed(format!("discovery task failed: {e}")))??;

        Ok(self.run_tasks(tasks).await)
    }

    /// Process an explicit task list.
    pub async fn run_tasks(&self, tasks: Vec<FileTask>) -> Vec<FileOutcome> {
        let total = tasks.len();
        let worker_count = (self.config.worker_count.max(1) as usize).min(total.max(1));

        info!(
            files = total,
            workers = worker_count,
            dry_run = self.config.dry_run,
            "Starting batch"
        );

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        for task in tasks {
            // Receiver is alive until the workers below finish
            let _ = task_tx.send(task);
        }
        drop(task_tx);
        let queue: TaskQueue = Arc::new(Mutex::new(task_rx));

        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let outcomes = outcome_tx.clone();
            let processor = Arc::clone(&self.processor);
            let config = Arc::clone(&self.config);
            let shutdown = self.shutdown.subscribe();

            workers.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, outcomes, processor, config, shutdown).await;
            }));
        }
        drop(outcome_tx);

        for worker in workers {
            if let Err(e) = worker.await {
                error!("Worker task failed: {}", e);
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }

        info!(files = outcomes.len(), "Batch finished");
        outcomes
    }

    /// Signal shutdown. Files already in progress run to completion.
    pub fn shutdown(&self) {
        // Stored even when no worker is subscribed yet
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: TaskQueue,
    outcomes: mpsc::UnboundedSender<FileOutcome>,
    processor: Arc<FileProcessor>,
    config: Arc<TrimConfig>,
    shutdown: watch::Receiver<bool>,
) {
    debug!(worker_id, "Worker started");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        let outcome = if *shutdown.borrow() {
            FileOutcome::skipped(&task.source_path, CANCELLED)
        } else {
            let source = task.source_path.clone();
            let processor = Arc::clone(&processor);
            let config = Arc::clone(&config);

            // A panic in one file must not take the worker down
            match tokio::spawn(async move { processor.process(&task, &config).await }).await {
                Ok(outcome) => outcome,
                Err(e) => FileOutcome::failed(
                    source,
                    FailureKind::Internal,
                    format!("file task aborted: {e}"),
                ),
            }
        };

        record_file_outcome(&outcome);
        info!(
            worker_id,
            file = %strim_models::display_name(&outcome.source_path),
            status = outcome.status.as_str(),
            elapsed_ms = outcome.elapsed_ms,
            "File processed"
        );

        if outcomes.send(outcome).is_err() {
            break;
        }
    }

    debug!(worker_id, "Worker stopped");
}
