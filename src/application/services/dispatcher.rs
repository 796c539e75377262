use std::future::Future;

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::error::TransferError;

pub type Outcome<T> = Result<T, TransferError>;

/// A running worker pool for one batch.
pub struct Dispatch<T> {
    pub outcomes: mpsc::Receiver<Outcome<T>>,
    pub workers: Vec<JoinHandle<()>>,
}

/// Seeds a queue with every job and starts `worker_count` workers on it.
///
/// Each worker pulls jobs until the queue is drained, sending one outcome per
/// job. A worker stops after sending its first error. Both the queue and the
/// outcome channel are sized to the batch, so neither seeding nor reporting
/// ever waits on the consumer.
///
/// Cancelling `cancel` stops every worker: idle ones stop pulling and busy
/// ones drop their in-flight operation.
pub async fn dispatch<J, T, F, Fut>(
    jobs: Vec<J>,
    worker_count: usize,
    cancel: CancellationToken,
    operation: F,
) -> Dispatch<T>
where
    J: Send + 'static,
    T: Send + 'static,
    F: Fn(J) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Outcome<T>> + Send + 'static,
{
    let capacity = jobs.len().max(1);
    let (job_tx, job_rx) = async_channel::bounded::<J>(capacity);
    let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome<T>>(capacity);

    for job in jobs {
        // Capacity covers the whole batch and we hold a receiver, so this
        // neither blocks nor fails.
        if job_tx.send(job).await.is_err() {
            break;
        }
    }
    job_tx.close();

    let workers = (0..worker_count)
        .map(|worker_id| {
            let jobs = job_rx.clone();
            let outcomes = outcome_tx.clone();
            let cancel = cancel.clone();
            let operation = operation.clone();

            tokio::spawn(async move {
                run_worker(worker_id, jobs, outcomes, cancel, operation).await;
            })
        })
        .collect();

    Dispatch {
        outcomes: outcome_rx,
        workers,
    }
}

async fn run_worker<J, T, F, Fut>(
    worker_id: usize,
    jobs: async_channel::Receiver<J>,
    outcomes: mpsc::Sender<Outcome<T>>,
    cancel: CancellationToken,
    operation: F,
) where
    F: Fn(J) -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let mut processed = 0usize;

    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("worker {} cancelled after {} jobs", worker_id, processed);
                return;
            }
            job = jobs.recv() => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("worker {} abandoned an in-flight job", worker_id);
                return;
            }
            outcome = operation(job) => outcome,
        };

        processed += 1;
        let failed = outcome.is_err();

        if outcomes.send(outcome).await.is_err() || failed {
            debug!(
                "worker {} stopping after {} jobs (failed: {})",
                worker_id, processed, failed
            );
            return;
        }
    }

    debug!("worker {} drained the queue after {} jobs", worker_id, processed);
}
