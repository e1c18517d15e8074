pub mod records;
pub mod storage;

pub use records::{RecordService, ServiceError};
pub use storage::{FilesystemBackend, StorageBackend, StorageError, UploadStore};
