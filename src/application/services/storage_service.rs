use async_trait::async_trait;

use crate::{
    application::error::TransferError,
    domain::models::file::{DeleteRequest, FileResult, UploadRequest},
};

/// A place files can be written to and removed from. Implementations are
/// shared across the workers of a batch, so they must be cheap to call
/// concurrently.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stores the request's bytes under its destination key and returns where
    /// the file can be fetched from.
    async fn put(&self, request: UploadRequest) -> Result<FileResult, TransferError>;

    async fn remove(&self, request: DeleteRequest) -> Result<(), TransferError>;
}
