//! The worker pool.
//!
//! Spawns one task per configured worker, each polling its queue. Shutdown
//! is cooperative: workers finish (and settle) the delivery they hold, then
//! exit. A delivery abandoned by a crashed process is redelivered after its
//! lease expires, so no message is lost either way.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::processor::Processor;
use crate::reindex::ReindexProcessor;
use crate::{QueueWorker, WorkerContext};

/// Running worker tasks for both queues.
pub struct WorkerPool {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the configured ingest and re-index workers.
    pub fn start(ctx: WorkerContext) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::new();

        let processor: Arc<dyn QueueWorker> = Arc::new(Processor::new(ctx.clone()));
        let poll_interval = Duration::from_millis(ctx.config.poll_interval_ms);
        for index in 0..ctx.config.workers {
            handles.push(spawn_worker(
                index,
                Arc::clone(&processor),
                poll_interval,
                shutdown_tx.subscribe(),
            ));
        }

        let reindexer: Arc<dyn QueueWorker> = Arc::new(ReindexProcessor::new(ctx.clone()));
        let reindex_interval = Duration::from_millis(ctx.config.reindex_poll_interval_ms);
        for index in 0..ctx.config.reindex_workers {
            handles.push(spawn_worker(
                index,
                Arc::clone(&reindexer),
                reindex_interval,
                shutdown_tx.subscribe(),
            ));
        }

        tracing::info!(
            workers = ctx.config.workers,
            reindex_workers = ctx.config.reindex_workers,
            "worker pool started"
        );
        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Signal every worker and wait for in-flight deliveries to settle.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            let _ = handle.await;
        }
        tracing::info!("worker pool shut down");
    }
}

fn spawn_worker(
    index: usize,
    worker: Arc<dyn QueueWorker>,
    poll_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Shutdown is only honored between deliveries.
            match shutdown_rx.try_recv() {
                Err(broadcast::error::TryRecvError::Empty) => {}
                _ => break,
            }

            match worker.process_next().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        kind = worker.kind(),
                        index,
                        error = %e,
                        "worker iteration failed"
                    );
                }
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
        tracing::debug!(kind = worker.kind(), index, "worker stopped");
    })
}
