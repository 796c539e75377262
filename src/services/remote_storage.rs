use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    application::{error::TransferError, services::StorageBackend},
    domain::models::file::{DeleteRequest, FileResult, UploadRequest},
    services::error::StorageError,
};

/// The handful of object-store calls the remote backend is built from.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Writes the object. Returns only once the store has acknowledged the
    /// whole payload.
    async fn write_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn grant_public_read(&self, key: &str) -> Result<(), StorageError>;

    async fn object_generation(&self, key: &str) -> Result<i64, StorageError>;

    /// Deletes the object only if its live generation is still `generation`.
    async fn delete_generation(&self, key: &str, generation: i64) -> Result<(), StorageError>;
}

pub struct RemoteStorageBackend {
    client: Arc<dyn ObjectStoreClient>,
    public_root: String,
}

impl RemoteStorageBackend {
    pub fn new(client: Arc<dyn ObjectStoreClient>, public_root: impl Into<String>) -> Self {
        Self {
            client,
            public_root: public_root.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_root, key)
    }
}

#[async_trait]
impl StorageBackend for RemoteStorageBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn put(&self, request: UploadRequest) -> Result<FileResult, TransferError> {
        let key = request.destination;
        let content = request
            .source
            .read_all()
            .await
            .map_err(|source| TransferError::OpenSource {
                key: key.clone(),
                source,
            })?;
        let size = content.len();

        self.client
            .write_object(&key, content, content_type_for(&request.extension))
            .await
            .map_err(|source| TransferError::Write {
                key: key.clone(),
                source,
            })?;

        info!("{} uploaded to {} ({} bytes)", request.file_name, key, size);

        if let Err(source) = self.client.grant_public_read(&key).await {
            warn!("{} is stored but not public: {}", key, source);
            return Err(TransferError::Visibility { key, source });
        }

        info!("Object {} is now publicly accessible", key);

        Ok(FileResult {
            file_name: request.file_name,
            url: self.public_url(&key),
        })
    }

    async fn remove(&self, request: DeleteRequest) -> Result<(), TransferError> {
        let key = request.destination;

        let generation = self
            .client
            .object_generation(&key)
            .await
            .map_err(|source| TransferError::ConditionalDelete {
                key: key.clone(),
                source,
            })?;

        self.client
            .delete_generation(&key, generation)
            .await
            .map_err(|source| TransferError::ConditionalDelete {
                key: key.clone(),
                source,
            })?;

        info!("Object {} (generation {}) deleted", key, generation);
        Ok(())
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
