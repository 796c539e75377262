use std::path::Path;

use tracing::warn;
use uuid::Uuid;

use crate::{
    application::error::TransferError,
    domain::{
        config::global::GlobalConfig,
        models::file::{FileSource, UploadRequest},
    },
};

const MIB: f64 = 1024.0 * 1024.0;

/// Checks incoming files before they are handed to the transfer engine and
/// gives each one a collision-resistant destination key.
#[derive(Debug, Clone)]
pub struct FileValidator {
    extensions: Vec<String>,
    max_size: u64,
}

impl FileValidator {
    pub fn new(config: &GlobalConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            max_size: config.max_size,
        }
    }

    pub fn prepare_upload(
        &self,
        destination: &str,
        original_name: &str,
        size: u64,
        source: FileSource,
    ) -> Result<UploadRequest, TransferError> {
        // Everything after the last dot of the base name, so ".png" counts as png.
        let extension = Path::new(original_name)
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.extensions.contains(&extension) {
            warn!("Rejected {}: extension not allowed", original_name);
            return Err(TransferError::Validation(
                "extension is not acceptable.".to_string(),
            ));
        }

        if size > self.max_size {
            warn!("Rejected {}: {} bytes over limit", original_name, size);
            return Err(TransferError::Validation(format!(
                "file size must less than {} mib",
                (self.max_size as f64 / MIB).ceil() as u64
            )));
        }

        let file_name = random_file_name(&extension);
        let directory = destination.trim_matches('/');
        let key = if directory.is_empty() {
            file_name.clone()
        } else {
            format!("{}/{}", directory, file_name)
        };

        Ok(UploadRequest {
            destination: key,
            file_name,
            extension,
            source,
        })
    }
}

pub fn random_file_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}
