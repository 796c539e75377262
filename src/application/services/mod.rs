pub mod dispatcher;
mod storage_backend_wrapper;
mod storage_service;
pub mod transfer_service;

pub use storage_backend_wrapper::StorageBackendWrapper;
pub use storage_service::StorageBackend;
pub use transfer_service::{OperationKind, TransferService};
