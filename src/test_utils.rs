//! Test doubles shared across the crate's unit tests.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    application::{error::TransferError, services::StorageBackend},
    domain::models::file::{DeleteRequest, FileResult, FileSource, UploadRequest},
    services::{ObjectStoreClient, StorageError},
};

/// Upload request whose content is the key itself.
pub fn upload(key: &str) -> UploadRequest {
    let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
    let extension = Path::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string();
    UploadRequest::new(key, file_name, extension, FileSource::Bytes(key.as_bytes().to_vec()))
}

struct StoredObject {
    generation: i64,
    content_type: String,
    public: bool,
}

/// Object store kept in a map, with per-key failure injection.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    next_generation: AtomicI64,
    fail_write: HashSet<String>,
    fail_visibility: HashSet<String>,
    overwrite_after_read: bool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            next_generation: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn fail_write_for(mut self, key: &str) -> Self {
        self.fail_write.insert(key.to_string());
        self
    }

    pub fn fail_visibility_for(mut self, key: &str) -> Self {
        self.fail_visibility.insert(key.to_string());
        self
    }

    /// Simulates another writer replacing the object right after its
    /// generation was read.
    pub fn overwrite_after_read(mut self) -> Self {
        self.overwrite_after_read = true;
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn is_public(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.public)
            .unwrap_or(false)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.content_type.clone())
    }

    fn generation(&self) -> i64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn write_object(
        &self,
        key: &str,
        _content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_write.contains(key) {
            return Err(StorageError::ProviderError(format!("write rejected: {}", key)));
        }
        let generation = self.generation();
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                generation,
                content_type: content_type.to_string(),
                public: false,
            },
        );
        Ok(())
    }

    async fn grant_public_read(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_visibility.contains(key) {
            return Err(StorageError::Unauthorized(format!("acl rejected: {}", key)));
        }
        match self.objects.lock().unwrap().get_mut(key) {
            Some(object) => {
                object.public = true;
                Ok(())
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn object_generation(&self, key: &str) -> Result<i64, StorageError> {
        let next = self.generation();
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        let seen = object.generation;
        if self.overwrite_after_read {
            object.generation = next;
        }
        Ok(seen)
    }

    async fn delete_generation(&self, key: &str, generation: i64) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().unwrap();
        match objects.get(key) {
            None => Err(StorageError::NotFound(key.to_string())),
            Some(object) if object.generation != generation => {
                Err(StorageError::PreconditionFailed(format!(
                    "{} is at generation {}",
                    key, object.generation
                )))
            }
            Some(_) => {
                objects.remove(key);
                Ok(())
            }
        }
    }
}

/// Backend that records calls, with optional latency and per-key failures.
#[derive(Default)]
pub struct StubBackend {
    delay: Option<Duration>,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
    removed: Mutex<Vec<String>>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_on(mut self, key: &str) -> Self {
        self.fail_on.insert(key.to_string());
        self
    }

    pub fn panic_on(mut self, key: &str) -> Self {
        self.panic_on.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    async fn enter(&self, key: &str) -> Result<InFlight, TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(self.in_flight.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panic_on.contains(key) {
            panic!("stub backend crashed on {}", key);
        }
        if self.fail_on.contains(key) {
            return Err(TransferError::Write {
                key: key.to_string(),
                source: StorageError::ProviderError("injected failure".to_string()),
            });
        }
        Ok(guard)
    }
}

#[async_trait]
impl StorageBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn put(&self, request: UploadRequest) -> Result<FileResult, TransferError> {
        let _guard = self.enter(&request.destination).await?;
        Ok(FileResult {
            file_name: request.file_name,
            url: format!("stub://{}", request.destination),
        })
    }

    async fn remove(&self, request: DeleteRequest) -> Result<(), TransferError> {
        let _guard = self.enter(&request.destination).await?;
        self.removed.lock().unwrap().push(request.destination);
        Ok(())
    }
}
