use std::{fmt, future::Future, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    application::{
        error::TransferError,
        services::{
            dispatcher::{dispatch, Outcome},
            StorageBackend, StorageBackendWrapper,
        },
    },
    domain::{
        config::global::GlobalConfig,
        models::file::{DeleteRequest, FileResult, UploadRequest},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Upload,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Upload => f.write_str("upload"),
            OperationKind::Delete => f.write_str("delete"),
        }
    }
}

/// Runs batches of uploads and deletes against the current storage backend.
///
/// A batch either succeeds as a whole or reports the first error any of its
/// transfers produced. Transfers that completed before that error are not
/// rolled back.
#[derive(Clone)]
pub struct TransferService {
    backend: StorageBackendWrapper,
    worker_count: usize,
    batch_timeout: Duration,
}

impl TransferService {
    pub fn new(backend: StorageBackendWrapper, config: &GlobalConfig) -> Self {
        Self {
            backend,
            worker_count: config.worker_count.max(1),
            batch_timeout: config.batch_timeout(),
        }
    }

    pub fn backend(&self) -> &StorageBackendWrapper {
        &self.backend
    }

    pub async fn upload_files(
        &self,
        requests: Vec<UploadRequest>,
    ) -> Result<Vec<FileResult>, TransferError> {
        self.execute_batch(OperationKind::Upload, requests, |backend, request| async move {
            backend.put(request).await
        })
        .await
    }

    /// Deletes every key in the batch. All outcomes are drained before
    /// returning; the first error among them wins.
    pub async fn delete_files(&self, requests: Vec<DeleteRequest>) -> Result<(), TransferError> {
        self.execute_batch(OperationKind::Delete, requests, |backend, request| async move {
            backend.remove(request).await
        })
        .await
        .map(|_| ())
    }

    async fn execute_batch<J, T, F, Fut>(
        &self,
        kind: OperationKind,
        jobs: Vec<J>,
        operation: F,
    ) -> Result<Vec<T>, TransferError>
    where
        J: Send + 'static,
        T: Send + 'static,
        F: Fn(Arc<dyn StorageBackend>, J) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let batch_size = jobs.len();
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        let backend = self.backend.get();
        info!(
            operation = %kind,
            backend = backend.name(),
            batch_size,
            workers = self.worker_count,
            "Starting transfer batch"
        );

        // Fires on every return path, including the deadline.
        let cancel = CancellationToken::new();
        let _cancel_on_return = cancel.clone().drop_guard();

        let run = async {
            let mut dispatch = dispatch(jobs, self.worker_count, cancel.clone(), move |job| {
                operation(backend.clone(), job)
            })
            .await;

            // Uploads fail fast. Deletes keep draining and report the first error.
            let mut results = Vec::with_capacity(batch_size);
            let mut first_error = None;
            for _ in 0..batch_size {
                match dispatch.outcomes.recv().await {
                    Some(Ok(result)) => results.push(result),
                    Some(Err(err)) if kind == OperationKind::Upload => return Err(err),
                    Some(Err(err)) => {
                        first_error.get_or_insert(err);
                    }
                    None => break,
                }
            }

            if let Some(err) = first_error {
                return Err(err);
            }
            if results.len() < batch_size {
                return Err(TransferError::WorkersStopped);
            }

            for worker in dispatch.workers {
                if let Err(e) = worker.await {
                    warn!(operation = %kind, error = %e, "Transfer worker did not exit cleanly");
                }
            }

            Ok(results)
        };

        let outcome = match tokio::time::timeout(self.batch_timeout, run).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransferError::DeadlineExceeded(self.batch_timeout)),
        };

        match &outcome {
            Ok(results) => info!(
                operation = %kind,
                completed = results.len(),
                "Transfer batch finished"
            ),
            Err(err) => error!(
                operation = %kind,
                batch_size,
                error = %err,
                "Transfer batch failed"
            ),
        }

        outcome
    }
}
