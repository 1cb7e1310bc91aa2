//! CKAN action API access.
//!
//! [`Datastore`] is the seam the fetch layer talks to; [`RemoteCkan`] is the
//! HTTP implementation against a live portal.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::records::Record;

/// Default request timeout. Large `datastore_search_sql` pages are slow.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by the CKAN instance or the transport to it.
#[derive(Debug, Error)]
pub enum CkanError {
    #[error("CKAN request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The action ran and reported `success: false`. `error` is the body
    /// CKAN returned, which usually names the offending SQL.
    #[error("CKAN action {action} failed: {error}")]
    Action {
        action: String,
        error: serde_json::Value,
    },

    #[error("CKAN action {action} returned no result")]
    MissingResult { action: String },
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// The parts of `resource_show` this crate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceMeta {
    pub id: String,
    pub package_id: String,
}

/// The parts of `package_show` this crate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMeta {
    pub id: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct SqlResult {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct ActionResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    error: serde_json::Value,
}

impl<T> ActionResponse<T> {
    fn into_result(self, action: &str) -> Result<T, CkanError> {
        if !self.success {
            return Err(CkanError::Action {
                action: action.to_string(),
                error: self.error,
            });
        }
        self.result.ok_or_else(|| CkanError::MissingResult {
            action: action.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Datastore
// ---------------------------------------------------------------------------

/// The three CKAN actions the fetch layer needs.
pub trait Datastore {
    fn resource_show(&self, resource_id: &str) -> Result<ResourceMeta, CkanError>;

    fn package_show(&self, package_id: &str) -> Result<PackageMeta, CkanError>;

    /// Run `sql` through `datastore_search_sql` and return its records.
    fn datastore_search_sql(&self, sql: &str) -> Result<Vec<Record>, CkanError>;
}

/// HTTP client for one CKAN site.
#[derive(Debug, Clone)]
pub struct RemoteCkan {
    site: String,
    client: reqwest::blocking::Client,
}

impl RemoteCkan {
    pub fn new(site: impl Into<String>) -> Result<Self, CkanError> {
        Self::with_timeout(site, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(site: impl Into<String>, timeout: Duration) -> Result<Self, CkanError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(site, client))
    }

    pub fn with_client(site: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        let site = site.into().trim_end_matches('/').to_string();
        Self { site, client }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/api/3/action/{action}", self.site)
    }

    /// POST a JSON body to `action` and unwrap the CKAN envelope.
    ///
    /// CKAN answers failed actions with 4xx/5xx and a normal envelope, so
    /// the body is parsed regardless of status.
    fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &serde_json::Value,
    ) -> Result<T, CkanError> {
        debug!(site = %self.site, action, "calling CKAN action");
        let response = self
            .client
            .post(self.action_url(action))
            .json(body)
            .send()?;
        let envelope: ActionResponse<T> = response.json()?;
        envelope.into_result(action)
    }
}

impl Datastore for RemoteCkan {
    fn resource_show(&self, resource_id: &str) -> Result<ResourceMeta, CkanError> {
        self.call("resource_show", &serde_json::json!({ "id": resource_id }))
    }

    fn package_show(&self, package_id: &str) -> Result<PackageMeta, CkanError> {
        self.call("package_show", &serde_json::json!({ "id": package_id }))
    }

    fn datastore_search_sql(&self, sql: &str) -> Result<Vec<Record>, CkanError> {
        let result: SqlResult =
            self.call("datastore_search_sql", &serde_json::json!({ "sql": sql }))?;
        Ok(result.records)
    }
}
