mod error;
mod gcs_storage;
mod local_storage;
mod remote_storage;

pub use error::StorageError;
pub use gcs_storage::{GcsClient, GCS_DEFAULT_ENDPOINT};
pub use local_storage::LocalStorageBackend;
pub use remote_storage::{content_type_for, ObjectStoreClient, RemoteStorageBackend};

use std::sync::Arc;

use tracing::info;

use crate::{
    application::services::StorageBackend,
    domain::config::{
        local::{LocalConfig, Provider},
        secrets::Secrets,
    },
};

pub fn create_storage_backend(
    local: &LocalConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match local.provider {
        Provider::Gcp => {
            let gcp_secrets = secrets.gcp_secrets.as_ref().ok_or_else(|| {
                StorageError::InvalidCredentials("GCP secrets not found".to_string())
            })?;

            let client = GcsClient::new(gcp_secrets.clone())?;
            let public_root = client.public_root();
            info!("Using GCS bucket {}", gcp_secrets.bucket_name);

            Ok(Arc::new(RemoteStorageBackend::new(
                Arc::new(client),
                public_root,
            )))
        }
        Provider::Local => {
            info!("Using local storage at {}", local.storage_root.display());
            Ok(Arc::new(LocalStorageBackend::from_config(local)))
        }
    }
}
