// Background worker that runs deletion resolution off the caller's thread

use crate::domain::{DeletionOutcome, FileTarget, Resolver};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

/// Message types for the deletion worker
enum DeletionRequest {
    /// Resolve one target
    Resolve {
        target: FileTarget,
        response_tx: oneshot::Sender<DeletionOutcome>,
    },
    /// Shutdown the worker
    Shutdown,
}

/// Handle for sending targets to the deletion worker.
///
/// Outcomes are never cached: every request resolves from scratch.
#[derive(Clone)]
pub struct DeletionWorker {
    request_tx: mpsc::Sender<DeletionRequest>,
    /// Targets currently being resolved
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl DeletionWorker {
    /// Create a new worker with a background task. Must be called inside a
    /// tokio runtime.
    pub fn new(resolver: Resolver) -> Self {
        let (request_tx, request_rx) = mpsc::channel(32);
        let in_flight = Arc::new(Mutex::new(HashSet::new()));

        let worker = Self {
            request_tx,
            in_flight: Arc::clone(&in_flight),
        };

        tokio::spawn(async move {
            Self::worker(request_rx, Arc::new(resolver), in_flight).await;
        });

        worker
    }

    /// Background loop. Each target resolves on the blocking pool, so
    /// distinct targets proceed concurrently.
    async fn worker(
        mut request_rx: mpsc::Receiver<DeletionRequest>,
        resolver: Arc<Resolver>,
        in_flight: Arc<Mutex<HashSet<PathBuf>>>,
    ) {
        while let Some(request) = request_rx.recv().await {
            match request {
                DeletionRequest::Resolve {
                    target,
                    response_tx,
                } => {
                    let path = target.path().to_path_buf();

                    // One resolution per target at a time
                    if !in_flight.lock().await.insert(path.clone()) {
                        debug!(%target, "rejected duplicate request");
                        let _ = response_tx
                            .send(DeletionOutcome::failed("deletion already in flight"));
                        continue;
                    }

                    let resolver = Arc::clone(&resolver);
                    let in_flight = Arc::clone(&in_flight);
                    tokio::spawn(async move {
                        let result =
                            tokio::task::spawn_blocking(move || resolver.resolve(&target)).await;

                        in_flight.lock().await.remove(&path);

                        let outcome = match result {
                            Ok(outcome) => outcome,
                            Err(e) => DeletionOutcome::failed(format!("Task panicked: {}", e)),
                        };
                        let _ = response_tx.send(outcome);
                    });
                }
                DeletionRequest::Shutdown => {
                    break;
                }
            }
        }
    }

    /// Resolve a target and wait for its outcome
    pub async fn resolve(&self, target: FileTarget) -> DeletionOutcome {
        let (response_tx, response_rx) = oneshot::channel();

        let request = DeletionRequest::Resolve {
            target,
            response_tx,
        };

        if self.request_tx.send(request).await.is_err() {
            return DeletionOutcome::failed("deletion worker shut down");
        }

        match response_rx.await {
            Ok(outcome) => outcome,
            Err(_) => DeletionOutcome::failed("Response channel closed"),
        }
    }

    /// Check whether a target is currently being resolved
    pub async fn is_in_flight(&self, path: &Path) -> bool {
        self.in_flight.lock().await.contains(path)
    }

    /// Shutdown the worker
    pub async fn shutdown(&self) {
        let _ = self.request_tx.send(DeletionRequest::Shutdown).await;
    }
}

/// Synchronous wrapper for callers without a runtime of their own
pub struct SyncDeletionWorker {
    worker: DeletionWorker,
    runtime: tokio::runtime::Runtime,
}

impl SyncDeletionWorker {
    pub fn new(resolver: Resolver) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let worker = runtime.block_on(async { DeletionWorker::new(resolver) });

        Ok(Self { worker, runtime })
    }

    /// Resolve a single target, blocking until done
    pub fn resolve(&self, target: FileTarget) -> DeletionOutcome {
        self.runtime.block_on(self.worker.resolve(target))
    }

    /// Resolve independent targets concurrently. Outcomes come back in input
    /// order.
    pub fn resolve_all(&self, targets: Vec<FileTarget>) -> Vec<DeletionOutcome> {
        self.runtime.block_on(async {
            let handles: Vec<_> = targets
                .into_iter()
                .map(|target| {
                    let worker = self.worker.clone();
                    tokio::spawn(async move { worker.resolve(target).await })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(handles.len());
            for handle in handles {
                outcomes.push(match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => DeletionOutcome::failed(format!("Task panicked: {}", e)),
                });
            }
            outcomes
        })
    }
}

impl Drop for SyncDeletionWorker {
    fn drop(&mut self) {
        self.runtime.block_on(self.worker.shutdown());
    }
}
