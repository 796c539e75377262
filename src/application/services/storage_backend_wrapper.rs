use std::sync::{Arc, RwLock};

use tracing::info;

use crate::application::services::StorageBackend;

/// Shared, swappable reference to the active backend. Each batch takes one
/// snapshot with [`get`](Self::get) and keeps it for its whole lifetime.
#[derive(Clone)]
pub struct StorageBackendWrapper {
    backend: Arc<RwLock<Arc<dyn StorageBackend>>>,
}

impl StorageBackendWrapper {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: Arc::new(RwLock::new(backend)),
        }
    }

    pub fn get(&self) -> Arc<dyn StorageBackend> {
        match self.backend.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, new_backend: Arc<dyn StorageBackend>) {
        info!("Switching storage backend to {}", new_backend.name());
        let mut backend = match self.backend.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *backend = new_backend;
    }
}
