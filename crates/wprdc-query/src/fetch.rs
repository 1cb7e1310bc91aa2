//! Query execution against the WPRDC CKAN instance.

use thiserror::Error;
use tracing::{info, warn};

use crate::ckan::{CkanError, Datastore, RemoteCkan};
use crate::clause::ClauseError;
use crate::records::{remove_fields, Record, FULL_TEXT_FIELD};
use crate::synth::{synthesize_query, QuerySpec};

/// Western Pennsylvania Regional Data Center CKAN site.
pub const WPRDC_SITE: &str = "https://data.wprdc.org";

/// Page-size cap of the WPRDC CKAN instance. CKAN wraps every SQL query as
/// `SELECT * FROM (<query>) LIMIT 500001`.
pub const WPRDC_API_HARD_LIMIT: usize = 500_001;

/// Errors from [`get_wprdc_data`] and [`query_any_resource`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Clause(#[from] ClauseError),

    /// `datastore_search_sql` cannot run against private datasets
    /// (ckan/ckan#1954).
    #[error("CKAN can't query private resources (like {resource_id}) yet.")]
    AccessDenied { resource_id: String },

    #[error(transparent)]
    Remote(#[from] CkanError),
}

/// Run `sql` against the datastore of `site`.
pub fn query_resource(site: &str, sql: &str) -> Result<Vec<Record>, FetchError> {
    let ckan = RemoteCkan::new(site)?;
    Ok(ckan.datastore_search_sql(sql)?)
}

/// Run `sql` after confirming `resource_id` belongs to a public package.
///
/// The privacy flag comes from `resource_show` then `package_show`; a private
/// package fails with [`FetchError::AccessDenied`] before any SQL is sent.
pub fn query_any_resource<D: Datastore>(
    ckan: &D,
    resource_id: &str,
    sql: &str,
) -> Result<Vec<Record>, FetchError> {
    let resource = ckan.resource_show(resource_id)?;
    let package = ckan.package_show(&resource.package_id)?;
    if package.private {
        warn!(
            resource_id,
            package_id = %resource.package_id,
            "datastore_search_sql cannot query private datasets"
        );
        return Err(FetchError::AccessDenied {
            resource_id: resource_id.to_string(),
        });
    }
    Ok(ckan.datastore_search_sql(sql)?)
}

/// Synthesize, execute and clean one query.
///
/// A result of exactly [`WPRDC_API_HARD_LIMIT`] records is logged as
/// possibly truncated. `_full_text` is removed from every record.
pub fn get_wprdc_data<D: Datastore>(ckan: &D, spec: &QuerySpec) -> Result<Vec<Record>, FetchError> {
    let query = synthesize_query(spec)?;
    info!(resource_id = %spec.resource_id, %query, "querying CKAN datastore");

    let mut records = query_any_resource(ckan, &spec.resource_id, &query)?;

    if records.len() == WPRDC_API_HARD_LIMIT {
        warn!(
            resource_id = %spec.resource_id,
            limit = WPRDC_API_HARD_LIMIT,
            "result count equals the CKAN page cap; there may be more results than were returned"
        );
    }

    remove_fields(&mut records, &[FULL_TEXT_FIELD]);
    info!(resource_id = %spec.resource_id, count = records.len(), "fetched records");
    Ok(records)
}
