//! Upload persistence for client report files.
//!
//! Reports arrive inline in JSON bodies as `{name, data}` where `data` is a
//! data URI or bare base64. They are decoded, given a unique filesystem-safe
//! name and written once; the row only ever stores the returned
//! `/uploads/<name>` reference. Files are never overwritten or removed, so a
//! replaced report leaves its previous file behind.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::database::record::FileUpload;

/// Route prefix under which stored uploads are served
pub const UPLOAD_ROUTE_PREFIX: &str = "/uploads/";

const MAX_NAME_LEN: usize = 120;

/// Standard alphabet, padding optional on input
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid upload payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid upload reference: {0}")]
    InvalidReference(String),

    #[error("Upload not found: {0}")]
    NotFound(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where upload bytes actually live
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a new file. Must fail rather than replace an existing one.
    async fn write_new(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;
}

/// Flat directory of uploaded files
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Create the upload directory if it is missing
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write_new(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.base_path.join(name);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.base_path.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Decodes and stores report uploads, handing back servable references
#[derive(Clone)]
pub struct UploadStore {
    backend: Arc<dyn StorageBackend>,
}

impl UploadStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store an upload if one was supplied. `None` in means `None` out:
    /// nothing to write and nothing to change.
    pub async fn persist(&self, upload: Option<&FileUpload>) -> Result<Option<String>, StorageError> {
        let upload = match upload {
            Some(u) if !u.is_empty() => u,
            _ => return Ok(None),
        };

        let bytes = decode_payload(&upload.data)?;
        let name = generate_file_name(&upload.name);
        self.backend.write_new(&name, &bytes).await?;
        Ok(Some(format!("{}{}", UPLOAD_ROUTE_PREFIX, name)))
    }

    /// Read a stored upload back by its generated file name
    pub async fn open(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        if !is_stored_name(name) {
            return Err(StorageError::InvalidReference(name.to_string()));
        }
        self.backend.read(name).await
    }

    /// Read a stored upload back by the reference `persist` returned
    #[cfg(test)]
    pub async fn open_reference(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let name = parse_reference(reference)?;
        self.open(name).await
    }
}

/// Pull the bytes out of a data URI or bare base64 string. Line breaks and
/// other whitespace inside the payload are ignored, as is missing padding.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, StorageError> {
    let data = data.trim();
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_mime, payload)) => payload,
            None => return Err(StorageError::InvalidPayload("data URI is not base64 encoded".to_string())),
        },
        None => data,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    PAYLOAD_ENGINE
        .decode(compact)
        .map_err(|e| StorageError::InvalidPayload(e.to_string()))
}

/// Reduce a display name to `[A-Za-z0-9._-]`, everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    // Keep the tail so the extension survives truncation
    let excess = sanitized.len().saturating_sub(MAX_NAME_LEN);
    sanitized[excess..].to_string()
}

/// `<stamp>-<sanitized name>` with a stamp that never repeats in-process
pub fn generate_file_name(display_name: &str) -> String {
    format!("{}-{}", next_stamp(), sanitize_file_name(display_name))
}

/// Millisecond clock, bumped forward whenever two uploads land in the same
/// millisecond so the sequence is strictly increasing.
fn next_stamp() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Names `generate_file_name` can produce; anything else is not ours to serve
pub fn is_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.len() <= MAX_NAME_LEN + 24
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Split `/uploads/<name>` into `<name>`, rejecting anything outside the
/// upload directory.
pub fn parse_reference(reference: &str) -> Result<&str, StorageError> {
    reference
        .strip_prefix(UPLOAD_ROUTE_PREFIX)
        .filter(|name| is_stored_name(name))
        .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn temp_store(label: &str) -> (UploadStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("policy-desk-{}-{}", label, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        (UploadStore::new(Arc::new(FilesystemBackend::new(&dir))), dir)
    }

    #[test]
    fn decodes_data_uris_and_raw_base64() {
        assert_eq!(decode_payload("data:application/pdf;base64,JVBERi0x").unwrap(), b"%PDF-1");
        assert_eq!(decode_payload("JVBERi0x").unwrap(), b"%PDF-1");
        assert!(matches!(decode_payload("not base64!"), Err(StorageError::InvalidPayload(_))));

        // Wrapped output as `base64` on the command line prints it
        let wrapped = format!("{}\nRi0x\n", "JVBE".repeat(19));
        let expected = [b"%PD".repeat(19), b"F-1".to_vec()].concat();
        assert_eq!(decode_payload(&wrapped).unwrap(), expected);
        assert_eq!(decode_payload("data:application/pdf;base64,JVBE\r\nRi0x").unwrap(), b"%PDF-1");

        // Unpadded
        assert_eq!(decode_payload("JVBERi0xLg").unwrap(), b"%PDF-1.");
        assert_eq!(decode_payload("JVBERi0xLg==").unwrap(), b"%PDF-1.");
        assert!(matches!(decode_payload("data:text/plain,hello"), Err(StorageError::InvalidPayload(_))));
    }

    #[test]
    fn sanitizes_display_names() {
        assert_eq!(sanitize_file_name("r.pdf"), "r.pdf");
        assert_eq!(sanitize_file_name("Informe técnico (v2).pdf"), "Informe_t_cnico__v2_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");

        let long = format!("{}.pdf", "a".repeat(300));
        let sanitized = sanitize_file_name(&long);
        assert_eq!(sanitized.len(), MAX_NAME_LEN);
        assert!(sanitized.ends_with(".pdf"));
    }

    #[test]
    fn generated_names_never_collide() {
        let names: HashSet<_> = (0..500).map(|_| generate_file_name("r.pdf")).collect();
        assert_eq!(names.len(), 500);
        assert!(names.iter().all(|n| n.ends_with("-r.pdf") && is_stored_name(n)));
    }

    #[test]
    fn references_stay_inside_upload_dir() {
        assert_eq!(parse_reference("/uploads/1700000000000-r.pdf").unwrap(), "1700000000000-r.pdf");
        assert!(parse_reference("/uploads/../data.db").is_err());
        assert!(parse_reference("/uploads/.hidden").is_err());
        assert!(parse_reference("/etc/passwd").is_err());
        assert!(parse_reference("/uploads/").is_err());
    }

    #[tokio::test]
    async fn persisted_upload_reads_back_identically() {
        let (store, dir) = temp_store("storage-roundtrip");
        let upload = FileUpload {
            name: "r.pdf".to_string(),
            data: "data:application/pdf;base64,JVBERi0xLjQKJcOkw7zDtsOf".to_string(),
        };

        let reference = store.persist(Some(&upload)).await.unwrap().expect("reference");
        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with("r.pdf"));

        let expected = decode_payload(&upload.data).unwrap();
        assert_eq!(store.open_reference(&reference).await.unwrap(), expected);

        let again = store.persist(Some(&upload)).await.unwrap().unwrap();
        assert_ne!(again, reference);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn absent_or_empty_upload_is_a_no_op() {
        let (store, dir) = temp_store("storage-noop");
        assert_eq!(store.persist(None).await.unwrap(), None);

        let empty = FileUpload { name: "r.pdf".to_string(), data: String::new() };
        assert_eq!(store.persist(Some(&empty)).await.unwrap(), None);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_upload_is_not_found() {
        let (store, dir) = temp_store("storage-missing");
        assert!(matches!(store.open("1-nothing.pdf").await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.open("../secret").await, Err(StorageError::InvalidReference(_))));
        let _ = std::fs::remove_dir_all(dir);
    }
}
