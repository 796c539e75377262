use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    application::{error::TransferError, services::StorageBackend},
    domain::{
        config::local::LocalConfig,
        models::file::{DeleteRequest, FileResult, UploadRequest},
    },
};

/// Stores files under a root directory that is served as-is over HTTP.
pub struct LocalStorageBackend {
    root: PathBuf,
    base_url: String,
}

impl LocalStorageBackend {
    pub fn new(root: impl Into<PathBuf>, host: &str, port: u16) -> Self {
        Self {
            root: root.into(),
            base_url: format!("http://{}:{}", host, port),
        }
    }

    pub fn from_config(config: &LocalConfig) -> Self {
        Self::new(config.storage_root.clone(), &config.host, config.port)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn write_with_parents(path: &Path, content: &[u8]) -> Result<(), TransferError> {
        let first_error = match tokio::fs::write(path, content).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let parent = match (first_error.kind(), path.parent()) {
            (ErrorKind::NotFound, Some(parent)) => parent,
            _ => {
                return Err(TransferError::LocalIo {
                    path: path.to_path_buf(),
                    source: first_error,
                })
            }
        };

        warn!("Creating missing directory {}", parent.display());
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| TransferError::LocalIo {
                path: parent.to_path_buf(),
                source,
            })?;

        tokio::fs::write(path, content)
            .await
            .map_err(|source| TransferError::LocalIo {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    fn name(&self) -> &'static str {
        "local"
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

        let path = self.path_for(&key);
        Self::write_with_parents(&path, &content).await?;

        info!("{} stored at {}", request.file_name, path.display());

        Ok(FileResult {
            file_name: request.file_name,
            url: format!("{}/{}", self.base_url, key),
        })
    }

    async fn remove(&self, request: DeleteRequest) -> Result<(), TransferError> {
        let path = self.path_for(&request.destination);

        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| TransferError::LocalIo {
                path: path.clone(),
                source,
            })?;

        info!("Removed {}", path.display());
        Ok(())
    }
}
