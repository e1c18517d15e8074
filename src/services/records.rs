use sqlx::SqlitePool;
use thiserror::Error;

use crate::database::aggregate;
use crate::database::manager::DatabaseError;
use crate::database::models::{Client, Policy, PolicyClientRow};
use crate::database::record::{ClientInput, ClientSubmission, PolicyInput, RecordError};
use crate::database::repository::{ClientRepository, PolicyRepository};
use crate::services::storage::{parse_reference, StorageError, UploadStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Entry point for every record operation the API exposes.
///
/// Client writes persist their report uploads before touching the row, so a
/// failed file write never leaves a half-written client behind.
#[derive(Clone)]
pub struct RecordService {
    pool: SqlitePool,
    policies: PolicyRepository,
    clients: ClientRepository,
    uploads: UploadStore,
}

impl RecordService {
    pub fn new(pool: SqlitePool, uploads: UploadStore) -> Self {
        Self {
            policies: PolicyRepository::new(pool.clone()),
            clients: ClientRepository::new(pool.clone()),
            pool,
            uploads,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub async fn list_policy_clients(&self) -> Result<Vec<PolicyClientRow>, ServiceError> {
        Ok(aggregate::policy_clients(&self.pool).await?)
    }

    pub async fn create_policy(&self, input: PolicyInput) -> Result<i64, ServiceError> {
        let fields = input.validate()?;
        Ok(self.policies.create(&fields).await?)
    }

    pub async fn update_policy(&self, id: i64, input: PolicyInput) -> Result<(), ServiceError> {
        let fields = input.validate()?;
        Ok(self.policies.update(id, &fields).await?)
    }

    pub async fn get_policy(&self, id: i64) -> Result<Option<Policy>, ServiceError> {
        Ok(self.policies.get(id).await?)
    }

    pub async fn delete_policy(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.policies.delete(id).await?)
    }

    pub async fn get_client(&self, id: i64) -> Result<Option<Client>, ServiceError> {
        Ok(self.clients.get(id).await?)
    }

    /// New client; `existing_*` passthrough paths are ignored on create
    pub async fn create_client(&self, input: ClientInput) -> Result<i64, ServiceError> {
        let ClientSubmission {
            mut fields,
            technical_report_file,
            inspection_report_file,
            ..
        } = input.validate()?;

        fields.technical_report_path = self.uploads.persist(technical_report_file.as_ref()).await?;
        fields.inspection_report_path = self.uploads.persist(inspection_report_file.as_ref()).await?;

        Ok(self.clients.create(&fields).await?)
    }

    /// Full replace of a client. Each report slot takes, in order: a newly
    /// uploaded file, the passthrough reference the form carried, or the
    /// reference already stored on the row.
    pub async fn update_client(&self, id: i64, input: ClientInput) -> Result<(), ServiceError> {
        let ClientSubmission {
            mut fields,
            technical_report_file,
            inspection_report_file,
            existing_technical_report_path,
            existing_inspection_report_path,
        } = input.validate()?;

        let existing_technical = checked_reference("existing_technical_report_path", existing_technical_report_path)?;
        let existing_inspection = checked_reference("existing_inspection_report_path", existing_inspection_report_path)?;

        fields.technical_report_path = self
            .uploads
            .persist(technical_report_file.as_ref())
            .await?
            .or(existing_technical);
        fields.inspection_report_path = self
            .uploads
            .persist(inspection_report_file.as_ref())
            .await?
            .or(existing_inspection);

        Ok(self.clients.update(id, &fields).await?)
    }
}

fn checked_reference(field: &str, reference: Option<String>) -> Result<Option<String>, RecordError> {
    match reference {
        Some(r) if parse_reference(&r).is_err() => Err(RecordError::InvalidField {
            field: field.to_string(),
            message: format!("'{}' is not an upload reference", r),
        }),
        other => Ok(other),
    }
}
