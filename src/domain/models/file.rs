use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Where the bytes of an upload come from. Consumed exactly once by the backend.
pub enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl FileSource {
    /// Reads the whole source into memory.
    pub async fn read_all(self) -> std::io::Result<Vec<u8>> {
        match self {
            FileSource::Bytes(content) => Ok(content),
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Reader(mut reader) => {
                let mut content = Vec::new();
                reader.read_to_end(&mut content).await?;
                Ok(content)
            }
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Bytes(content) => write!(f, "Bytes({} bytes)", content.len()),
            FileSource::Path(path) => write!(f, "Path({})", path.display()),
            FileSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(content: Vec<u8>) -> Self {
        FileSource::Bytes(content)
    }
}

#[derive(Debug)]
pub struct UploadRequest {
    pub destination: String,
    pub file_name: String,
    pub extension: String,
    pub source: FileSource,
}

impl UploadRequest {
    pub fn new(
        destination: impl Into<String>,
        file_name: impl Into<String>,
        extension: impl Into<String>,
        source: impl Into<FileSource>,
    ) -> Self {
        Self {
            destination: destination.into(),
            file_name: file_name.into(),
            extension: extension.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub destination: String,
}

impl DeleteRequest {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    #[serde(rename = "filename")]
    pub file_name: String,
    pub url: String,
}
