//! Object-storage destinations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::StageError;

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Somewhere a staged payload can be written.
pub trait ObjectStore {
    fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StageError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StageError> {
        (**self).upload(path, bytes, content_type)
    }
}

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

/// Writes objects below a directory. Content type is not recorded.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ObjectStore for LocalStore {
    /// Parent directories are created automatically if they do not exist.
    fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StageError> {
        let target = self.object_path(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(StageError::CreateDir)?;
        }
        std::fs::write(&target, bytes).map_err(StageError::Write)?;
        debug!(path = %target.display(), "wrote object to local store");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GcsStore
// ---------------------------------------------------------------------------

/// Google Cloud Storage bucket, written through the JSON API media upload.
#[derive(Debug, Clone)]
pub struct GcsStore {
    endpoint: String,
    bucket: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl GcsStore {
    /// `token` is an OAuth2 access token with a storage write scope.
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, StageError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            token: token.into(),
            client,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket)
    }
}

impl ObjectStore for GcsStore {
    fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StageError> {
        let response = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Status {
                status: status.as_u16(),
                body: error_body(response.text()),
            });
        }
        debug!(bucket = %self.bucket, path, "uploaded object to GCS");
        Ok(())
    }
}

/// Text of an error response. A body that cannot be read is described
/// rather than dropped.
fn error_body(text: reqwest::Result<String>) -> String {
    text.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}
