use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::services::StorageError;

/// Why a transfer, or the batch it belongs to, failed.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot read source for {key}: {source}")]
    OpenSource {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write {key} failed: {source}")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("{key} was written but could not be made public: {source}")]
    Visibility {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("conditional delete of {key} failed: {source}")]
    ConditionalDelete {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("local storage operation on {} failed: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("batch did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("transfer workers stopped before the batch was drained")]
    WorkersStopped,
}
