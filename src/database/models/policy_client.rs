use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::view::{EditTarget, EntityKind};

/// One line of the listing: a policy joined with at most one of its clients.
/// Client columns are all `None` when the policy has no clients.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PolicyClientRow {
    pub policy_id: i64,
    pub policy_number: String,
    pub claim_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(serialize_with = "crate::types::flag::serialize")]
    pub attended: bool,
    pub broker_letter_number: Option<String>,
    pub broker_letter_date: Option<NaiveDate>,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    #[serde(serialize_with = "crate::types::flag::option::serialize")]
    pub claim_presented: Option<bool>,
    #[serde(serialize_with = "crate::types::flag::option::serialize")]
    pub letter_sent: Option<bool>,
    pub client_letter_number: Option<String>,
    pub client_letter_date: Option<NaiveDate>,
    pub technical_report_path: Option<String>,
    pub inspection_report_path: Option<String>,
}

impl PolicyClientRow {
    /// Record a click on this row should open: the client when there is one,
    /// otherwise the policy itself.
    pub fn edit_target(&self) -> EditTarget {
        match self.client_id {
            Some(id) => EditTarget { kind: EntityKind::Client, id },
            None => EditTarget { kind: EntityKind::Policy, id: self.policy_id },
        }
    }
}
