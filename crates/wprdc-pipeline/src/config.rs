use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use pii_scrub::{PacingBasis, PacingPolicy, DEFAULT_DLP_ENDPOINT};
use wprdc_query::WPRDC_SITE;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ckan: CkanConfig,
    #[serde(default)]
    pub dlp: DlpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct CkanConfig {
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_ckan_timeout")]
    pub timeout_secs: u64,
}

impl Default for CkanConfig {
    fn default() -> Self {
        Self {
            site: default_site(),
            timeout_secs: default_ckan_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DlpConfig {
    /// GCP project; falls back to `GCLOUD_PROJECT`.
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default = "default_dlp_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the OAuth2 access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl Default for DlpConfig {
    fn default() -> Self {
        Self {
            project: None,
            endpoint: default_dlp_endpoint(),
            token_env: default_token_env(),
            pacing: PacingConfig::default(),
        }
    }
}

impl DlpConfig {
    pub fn resolve_project(&self) -> Option<String> {
        self.project
            .clone()
            .or_else(|| std::env::var("GCLOUD_PROJECT").ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_calls_per_window")]
    pub calls_per_window: usize,
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    #[serde(default)]
    pub basis: PacingBasis,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            calls_per_window: default_calls_per_window(),
            pause_secs: default_pause_secs(),
            basis: PacingBasis::default(),
        }
    }
}

impl PacingConfig {
    pub fn policy(&self) -> PacingPolicy {
        PacingPolicy {
            calls_per_window: self.calls_per_window,
            pause: Duration::from_secs(self.pause_secs),
            basis: self.basis,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Local,
    Gcs,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
    #[serde(default = "default_gcs_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: None,
            local_root: default_local_root(),
            endpoint: default_gcs_endpoint(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_site() -> String {
    WPRDC_SITE.to_string()
}

fn default_ckan_timeout() -> u64 {
    300
}

fn default_dlp_endpoint() -> String {
    DEFAULT_DLP_ENDPOINT.to_string()
}

fn default_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

fn default_calls_per_window() -> usize {
    pii_scrub::pacing::DEFAULT_CALLS_PER_WINDOW
}

fn default_pause_secs() -> u64 {
    pii_scrub::pacing::DEFAULT_PAUSE.as_secs()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("staging")
}

fn default_gcs_endpoint() -> String {
    ndjson_stage::DEFAULT_GCS_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load configuration from a YAML file.
///
/// If the file does not exist a default configuration is returned and a
/// warning is emitted.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "configuration file not found; using defaults"
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

    parse(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))
}

pub fn parse(yaml: &str) -> Result<Config, serde_yml::Error> {
    serde_yml::from_str(yaml)
}
