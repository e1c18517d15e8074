use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::PolicyClientRow;

const POLICY_CLIENTS_SQL: &str = "SELECT
        p.id AS policy_id,
        p.policy_number,
        p.claim_number,
        p.date,
        p.address,
        p.attended,
        p.broker_letter_number,
        p.broker_letter_date,
        c.id AS client_id,
        c.name AS client_name,
        c.claim_presented,
        c.letter_sent,
        c.client_letter_number,
        c.client_letter_date,
        c.technical_report_path,
        c.inspection_report_path
    FROM policies p
    LEFT JOIN clients c ON c.policy_id = p.id
    ORDER BY p.date DESC, p.policy_number ASC, c.name ASC";

/// The listing view: every policy once per client, or once with empty
/// client columns when it has none. Newest policy dates first, undated
/// policies last.
pub async fn policy_clients(pool: &SqlitePool) -> Result<Vec<PolicyClientRow>, DatabaseError> {
    let rows = sqlx::query_as::<_, PolicyClientRow>(POLICY_CLIENTS_SQL)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
