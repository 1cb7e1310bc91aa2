mod cli;
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ndjson_stage::{json_to_store, GcsStore, LocalStore, ObjectStore};
use pii_scrub::{DlpClient, Scrubber};
use wprdc_query::{get_wprdc_data, remove_fields, QuerySpec, RemoteCkan};

use crate::cli::Cli;
use crate::config::{Config, DlpConfig, StorageBackend, StorageConfig};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Translate CLI query flags into a [`QuerySpec`].
fn query_spec(cli: &Cli) -> QuerySpec {
    let mut spec = QuerySpec::new(&cli.resource_id);
    if !cli.select_fields.is_empty() {
        spec = spec.select(cli.select_fields.iter().cloned());
    }
    if !cli.where_clauses.is_empty() {
        spec.where_clauses = Some(cli.where_clauses.clone());
    }
    spec.where_join = cli.where_join.into();
    spec.group_by = cli.group_by.clone();
    spec.order_by = cli.order_by.clone();
    spec.limit = cli.limit.clone();
    spec
}

fn read_token(var: &str) -> Result<String> {
    std::env::var(var).with_context(|| format!("access token variable {var} is not set"))
}

fn dlp_client(cfg: &DlpConfig) -> Result<DlpClient> {
    let project = cfg
        .resolve_project()
        .context("no DLP project configured and GCLOUD_PROJECT is not set")?;
    let token = read_token(&cfg.token_env)?;
    DlpClient::new(&cfg.endpoint, project, token).context("failed to build DLP client")
}

fn object_store(cfg: &StorageConfig) -> Result<Box<dyn ObjectStore>> {
    match cfg.backend {
        StorageBackend::Local => Ok(Box::new(LocalStore::new(&cfg.local_root))),
        StorageBackend::Gcs => {
            let bucket = cfg
                .bucket
                .as_deref()
                .context("storage.backend is gcs but no bucket is configured")?;
            let token = read_token(&cfg.token_env)?;
            let store = GcsStore::new(&cfg.endpoint, bucket, token)
                .context("failed to build GCS client")?;
            Ok(Box::new(store))
        }
    }
}

fn init_tracing(cfg: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Load config, then merge CLI overrides.
    let mut cfg = config::load(&cli.config)?;
    if let Some(ref bucket) = cli.bucket {
        cfg.storage.bucket = Some(bucket.clone());
    }

    // 3. Init tracing-subscriber with JSON format.
    init_tracing(&cfg);

    info!(
        config_file = %cli.config.display(),
        site = %cfg.ckan.site,
        resource_id = %cli.resource_id,
        dest = %cli.dest,
        "wprdc-pipeline starting"
    );

    // 4. Fetch.
    let ckan = RemoteCkan::with_timeout(&cfg.ckan.site, Duration::from_secs(cfg.ckan.timeout_secs))
        .context("failed to build CKAN client")?;
    let spec = query_spec(&cli);
    let mut records = get_wprdc_data(&ckan, &spec).context("failed to fetch records")?;

    if !cli.drop_fields.is_empty() {
        remove_fields(&mut records, cli.drop_fields.as_slice());
    }

    // 5. Scrub.
    if let Some(ref field) = cli.scrub_field {
        let scrubber = Scrubber::new(dlp_client(&cfg.dlp)?).with_pacing(cfg.dlp.pacing.policy());
        scrubber
            .scrub_pii(field, &mut records)
            .with_context(|| format!("failed to scrub field {field}"))?;
    }

    // 6. Stage.
    let store = object_store(&cfg.storage)?;
    let count = json_to_store(&*store, &cli.dest, &records)
        .with_context(|| format!("failed to stage records at {}", cli.dest))?;

    info!(count, dest = %cli.dest, "wprdc-pipeline finished");
    Ok(())
}
