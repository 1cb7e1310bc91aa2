//! Newline-delimited JSON staging for pipeline outputs.
//!
//! Record batches are serialised as one JSON object per line, the format
//! Dataflow and BigQuery load jobs read, and written to an [`ObjectStore`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use ndjson_stage::{json_to_store, LocalStore};
//!
//! # fn example() -> Result<(), ndjson_stage::StageError> {
//! let store = LocalStore::new("/tmp/staging");
//! let records = vec![serde_json::json!({"DogName": "DOGZILLA"})];
//! json_to_store(&store, "dog_licenses/2024-01.json", &records)?;
//! # Ok(())
//! # }
//! ```

pub mod store;
pub mod writer;

use std::path::Path;

use serde::Serialize;
use tracing::info;

pub use store::{GcsStore, LocalStore, ObjectStore, DEFAULT_GCS_ENDPOINT};
pub use writer::{to_ndjson, NdjsonWriter};

/// Content type used for staged NDJSON objects.
pub const NDJSON_CONTENT_TYPE: &str = "application/json";

/// Errors that can occur while staging.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create parent directories: {0}")]
    CreateDir(std::io::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write staged object: {0}")]
    Write(std::io::Error),

    #[error("failed to remove local file {path}: {source}")]
    Remove {
        path: String,
        source: std::io::Error,
    },

    #[error("object storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object storage returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Encode `records` as NDJSON and upload them to `path`.
///
/// Returns the number of records written.
pub fn json_to_store<S, T>(store: &S, path: &str, records: &[T]) -> Result<usize, StageError>
where
    S: ObjectStore + ?Sized,
    T: Serialize,
{
    let payload = to_ndjson(records)?;
    let bytes = payload.len();
    store.upload(path, payload, NDJSON_CONTENT_TYPE)?;
    info!(path, records = records.len(), bytes, "staged records");
    Ok(records.len())
}

/// Upload the file at `source` to `destination`, then delete `source`.
///
/// The local file is kept if the upload fails.
pub fn upload_file<S>(
    store: &S,
    source: impl AsRef<Path>,
    destination: &str,
    content_type: &str,
) -> Result<(), StageError>
where
    S: ObjectStore + ?Sized,
{
    let source = source.as_ref();
    let bytes = std::fs::read(source).map_err(|source_err| StageError::Read {
        path: source.display().to_string(),
        source: source_err,
    })?;
    store.upload(destination, bytes, content_type)?;
    info!(source = %source.display(), destination, "file uploaded");

    std::fs::remove_file(source).map_err(|source_err| StageError::Remove {
        path: source.display().to_string(),
        source: source_err,
    })
}
