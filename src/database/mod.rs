pub mod aggregate;
pub mod manager;
pub mod models;
pub mod record;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use record::{ClientInput, FileUpload, PolicyInput, RecordError};
pub use repository::{ClientRepository, PolicyRepository};
