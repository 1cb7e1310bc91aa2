//! Cloud DLP text de-identification.
//!
//! [`Deidentifier`] is the seam the scrubber calls once per non-empty value.
//! [`DlpClient`] implements it against the DLP v2 REST API
//! (`projects/{project}/content:deidentify`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

pub const DEFAULT_DLP_ENDPOINT: &str = "https://dlp.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DlpError {
    #[error("DLP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `body` is the API's error payload. A 429 here
    /// means the per-minute quota was exceeded.
    #[error("DLP API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("DLP response carried no item value")]
    MissingItem,
}

// ---------------------------------------------------------------------------
// Request configuration
// ---------------------------------------------------------------------------

/// DLP info types the pipeline asks the classifier to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoType {
    EmailAddress,
    FirstName,
    LastName,
    PhoneNumber,
    Url,
    StreetAddress,
}

/// The fixed taxonomy sent with every request.
pub const INFO_TYPES: &[InfoType] = &[
    InfoType::EmailAddress,
    InfoType::FirstName,
    InfoType::LastName,
    InfoType::PhoneNumber,
    InfoType::Url,
    InfoType::StreetAddress,
];

/// Character-mask transformation. `number_to_mask == 0` masks the whole
/// finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterMask {
    pub masking_character: char,
    pub number_to_mask: u32,
}

impl Default for CharacterMask {
    fn default() -> Self {
        Self {
            masking_character: '#',
            number_to_mask: 0,
        }
    }
}

/// One de-identification call.
#[derive(Debug, Clone, Copy)]
pub struct DeidentifyRequest<'a> {
    pub info_types: &'a [InfoType],
    pub mask: CharacterMask,
    pub value: &'a str,
}

impl<'a> DeidentifyRequest<'a> {
    /// A request for `value` with the pipeline's taxonomy and full masking.
    pub fn masked(value: &'a str) -> Self {
        Self {
            info_types: INFO_TYPES,
            mask: CharacterMask::default(),
            value,
        }
    }

    /// The REST body for `content:deidentify`.
    fn to_body(self) -> serde_json::Value {
        let info_types: Vec<serde_json::Value> = self
            .info_types
            .iter()
            .map(|t| serde_json::json!({ "name": t }))
            .collect();
        serde_json::json!({
            "inspectConfig": { "infoTypes": info_types },
            "deidentifyConfig": {
                "infoTypeTransformations": {
                    "transformations": [{
                        "primitiveTransformation": {
                            "characterMaskConfig": self.mask,
                        }
                    }]
                }
            },
            "item": { "value": self.value },
        })
    }
}

// ---------------------------------------------------------------------------
// Deidentifier
// ---------------------------------------------------------------------------

/// Classify-and-mask for a single text value.
pub trait Deidentifier {
    fn deidentify(&self, request: &DeidentifyRequest<'_>) -> Result<String, DlpError>;
}

impl<T: Deidentifier + ?Sized> Deidentifier for &T {
    fn deidentify(&self, request: &DeidentifyRequest<'_>) -> Result<String, DlpError> {
        (**self).deidentify(request)
    }
}

#[derive(Debug, Deserialize)]
struct DeidentifyResponse {
    item: Option<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    value: Option<String>,
}

/// REST client for one GCP project.
#[derive(Debug, Clone)]
pub struct DlpClient {
    endpoint: String,
    project: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl DlpClient {
    /// `token` is an OAuth2 access token with the `cloud-platform` scope.
    pub fn new(
        endpoint: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, DlpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project: project.into(),
            token: token.into(),
            client,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self) -> String {
        format!(
            "{}/v2/projects/{}/content:deidentify",
            self.endpoint, self.project
        )
    }
}

impl Deidentifier for DlpClient {
    fn deidentify(&self, request: &DeidentifyRequest<'_>) -> Result<String, DlpError> {
        trace!(project = %self.project, len = request.value.len(), "calling DLP deidentify");
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.token)
            .json(&request.to_body())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DlpError::Status {
                status: status.as_u16(),
                body: error_body(response.text()),
            });
        }

        let parsed: DeidentifyResponse = response.json()?;
        parsed
            .item
            .and_then(|item| item.value)
            .ok_or(DlpError::MissingItem)
    }
}

/// Text of an error response. A body that cannot be read is described
/// rather than dropped.
fn error_body(text: reqwest::Result<String>) -> String {
    text.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}
