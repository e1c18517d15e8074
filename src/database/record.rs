use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{blank_date, flag};

/// Input validation failures, reported to clients as 400s
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },
}

/// An uploaded file as the browser sends it: display name plus a data URI
/// or bare base64 string. Either part empty means "no file".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileUpload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: String,
}

impl FileUpload {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() || self.data.trim().is_empty()
    }
}

/// Body of POST/PUT /api/policies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyInput {
    pub policy_number: Option<String>,
    pub claim_number: Option<String>,
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub date: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub attended: bool,
    pub broker_letter_number: Option<String>,
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub broker_letter_date: Option<NaiveDate>,
}

/// Policy columns after presence checks; what actually reaches the store
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyFields {
    pub policy_number: String,
    pub claim_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub address: Option<String>,
    pub attended: bool,
    pub broker_letter_number: Option<String>,
    pub broker_letter_date: Option<NaiveDate>,
}

impl PolicyInput {
    pub fn validate(self) -> Result<PolicyFields, RecordError> {
        Ok(PolicyFields {
            policy_number: required("policy_number", self.policy_number)?,
            claim_number: self.claim_number,
            date: self.date,
            address: self.address,
            attended: self.attended,
            broker_letter_number: self.broker_letter_number,
            broker_letter_date: self.broker_letter_date,
        })
    }
}

/// Body of POST/PUT /api/clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    pub policy_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub claim_presented: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub letter_sent: bool,
    pub client_letter_number: Option<String>,
    #[serde(default, deserialize_with = "blank_date::deserialize")]
    pub client_letter_date: Option<NaiveDate>,
    pub technical_report_file: Option<FileUpload>,
    pub inspection_report_file: Option<FileUpload>,
    /// Stored reference the form already had; only read on update
    pub existing_technical_report_path: Option<String>,
    pub existing_inspection_report_path: Option<String>,
}

/// Client columns after presence checks. Report paths are filled in by the
/// record service once uploads have been written.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientFields {
    pub policy_id: i64,
    pub name: String,
    pub claim_presented: bool,
    pub letter_sent: bool,
    pub client_letter_number: Option<String>,
    pub client_letter_date: Option<NaiveDate>,
    pub technical_report_path: Option<String>,
    pub inspection_report_path: Option<String>,
}

/// A validated client write: the columns plus whatever report files and
/// passthrough references came with it.
#[derive(Debug, Clone)]
pub struct ClientSubmission {
    pub fields: ClientFields,
    pub technical_report_file: Option<FileUpload>,
    pub inspection_report_file: Option<FileUpload>,
    pub existing_technical_report_path: Option<String>,
    pub existing_inspection_report_path: Option<String>,
}

impl ClientInput {
    pub fn validate(self) -> Result<ClientSubmission, RecordError> {
        let policy_id = self
            .policy_id
            .ok_or_else(|| RecordError::MissingRequiredField("policy_id".to_string()))?;
        if policy_id <= 0 {
            return Err(RecordError::InvalidField {
                field: "policy_id".to_string(),
                message: "must be a positive identifier".to_string(),
            });
        }

        Ok(ClientSubmission {
            fields: ClientFields {
                policy_id,
                name: required("name", self.name)?,
                claim_presented: self.claim_presented,
                letter_sent: self.letter_sent,
                client_letter_number: self.client_letter_number,
                client_letter_date: self.client_letter_date,
                technical_report_path: None,
                inspection_report_path: None,
            },
            technical_report_file: self.technical_report_file.filter(|f| !f.is_empty()),
            inspection_report_file: self.inspection_report_file.filter(|f| !f.is_empty()),
            existing_technical_report_path: non_blank(self.existing_technical_report_path),
            existing_inspection_report_path: non_blank(self.existing_inspection_report_path),
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, RecordError> {
    non_blank(value)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| RecordError::MissingRequiredField(field.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
