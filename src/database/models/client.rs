use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A claimant attached to a policy, with optional report uploads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub policy_id: i64,
    pub name: String,
    #[serde(with = "crate::types::flag")]
    pub claim_presented: bool,
    #[serde(with = "crate::types::flag")]
    pub letter_sent: bool,
    pub client_letter_number: Option<String>,
    pub client_letter_date: Option<NaiveDate>,
    pub technical_report_path: Option<String>,
    pub inspection_report_path: Option<String>,
}
