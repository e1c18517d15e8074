use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An insurance policy, the root every client hangs off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Policy {
    pub id: i64,
    pub policy_number: String,
    pub claim_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(with = "crate::types::flag")]
    pub attended: bool,
    pub broker_letter_number: Option<String>,
    pub broker_letter_date: Option<NaiveDate>,
}
