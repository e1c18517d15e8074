use sqlx::SqlitePool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{Client, Policy};
use crate::database::record::{ClientFields, PolicyFields};

const POLICY_COLUMNS: &str =
    "id, policy_number, claim_number, date, address, attended, broker_letter_number, broker_letter_date";

const CLIENT_COLUMNS: &str = "id, policy_id, name, claim_presented, letter_sent, client_letter_number, \
     client_letter_date, technical_report_path, inspection_report_path";

/// Typed reads and writes for the `policies` table
#[derive(Clone)]
pub struct PolicyRepository {
    pool: SqlitePool,
}

impl PolicyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a policy and return the id SQLite assigned to it
    pub async fn create(&self, fields: &PolicyFields) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO policies
                (policy_number, claim_number, date, address, attended, broker_letter_number, broker_letter_date)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&fields.policy_number)
        .bind(&fields.claim_number)
        .bind(fields.date)
        .bind(&fields.address)
        .bind(fields.attended)
        .bind(&fields.broker_letter_number)
        .bind(fields.broker_letter_date)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Created policy {} ({})", id, fields.policy_number);
        Ok(id)
    }

    /// Replace every column of an existing policy
    pub async fn update(&self, id: i64, fields: &PolicyFields) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE policies SET
                policy_number = ?,
                claim_number = ?,
                date = ?,
                address = ?,
                attended = ?,
                broker_letter_number = ?,
                broker_letter_date = ?
             WHERE id = ?",
        )
        .bind(&fields.policy_number)
        .bind(&fields.claim_number)
        .bind(fields.date)
        .bind(&fields.address)
        .bind(fields.attended)
        .bind(&fields.broker_letter_number)
        .bind(fields.broker_letter_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("policy {}", id)));
        }
        info!("Updated policy {}", id);
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Policy>, DatabaseError> {
        let sql = format!("SELECT {} FROM policies WHERE id = ? LIMIT 1", POLICY_COLUMNS);
        let policy = sqlx::query_as::<_, Policy>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(policy)
    }

    /// Hard delete. Clients go with it through the foreign key cascade.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM policies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("policy {}", id)));
        }
        info!("Deleted policy {}", id);
        Ok(())
    }
}

/// Typed reads and writes for the `clients` table
#[derive(Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, fields: &ClientFields) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO clients
                (policy_id, name, claim_presented, letter_sent, client_letter_number,
                 client_letter_date, technical_report_path, inspection_report_path)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.policy_id)
        .bind(&fields.name)
        .bind(fields.claim_presented)
        .bind(fields.letter_sent)
        .bind(&fields.client_letter_number)
        .bind(fields.client_letter_date)
        .bind(&fields.technical_report_path)
        .bind(&fields.inspection_report_path)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("policy {} does not exist", fields.policy_id)))?;

        let id = result.last_insert_rowid();
        info!("Created client {} for policy {}", id, fields.policy_id);
        Ok(id)
    }

    /// Replace every column of an existing client. A `None` report path
    /// keeps whatever reference the row already holds.
    pub async fn update(&self, id: i64, fields: &ClientFields) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE clients SET
                policy_id = ?,
                name = ?,
                claim_presented = ?,
                letter_sent = ?,
                client_letter_number = ?,
                client_letter_date = ?,
                technical_report_path = COALESCE(?, technical_report_path),
                inspection_report_path = COALESCE(?, inspection_report_path)
             WHERE id = ?",
        )
        .bind(fields.policy_id)
        .bind(&fields.name)
        .bind(fields.claim_presented)
        .bind(fields.letter_sent)
        .bind(&fields.client_letter_number)
        .bind(fields.client_letter_date)
        .bind(&fields.technical_report_path)
        .bind(&fields.inspection_report_path)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, &format!("policy {} does not exist", fields.policy_id)))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("client {}", id)));
        }
        info!("Updated client {}", id);
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clients WHERE id = ? LIMIT 1", CLIENT_COLUMNS);
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    #[cfg(test)]
    pub async fn count_for_policy(&self, policy_id: i64) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients WHERE policy_id = ?")
            .bind(policy_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
