//! # wprdc-query
//!
//! Builds SQL for CKAN's `datastore_search_sql` endpoint and fetches the
//! resulting records from the WPRDC open-data portal.
//!
//! 1. **[`clause`]** -- operator-presence validation for WHERE fragments.
//! 2. **[`synth`]** -- [`QuerySpec`] and SELECT assembly.
//! 3. **[`ckan`]** -- the [`Datastore`] seam and its HTTP implementation.
//! 4. **[`fetch`]** -- private-resource check, row-cap warning and
//!    `_full_text` stripping around a query.
//!
//! ```rust
//! use wprdc_query::QuerySpec;
//!
//! let sql = QuerySpec::new("f8ab32f7-44c7-43ca-98bf-c1b444724598")
//!     .where_clause(r#""DogName" LIKE 'DOGZ%'"#)
//!     .synthesize()
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     r#"SELECT * FROM "f8ab32f7-44c7-43ca-98bf-c1b444724598" WHERE "DogName" LIKE 'DOGZ%'"#
//! );
//! ```

pub mod ckan;
pub mod clause;
pub mod fetch;
pub mod records;
pub mod synth;

#[cfg(test)]
mod test_support;

pub use ckan::{CkanError, Datastore, PackageMeta, RemoteCkan, ResourceMeta};
pub use clause::{validate_where_clause, ClauseError, OPERATORS};
pub use fetch::{
    get_wprdc_data, query_any_resource, query_resource, FetchError, WPRDC_API_HARD_LIMIT,
    WPRDC_SITE,
};
pub use records::{remove_fields, time_to_seconds, Record, FULL_TEXT_FIELD};
pub use synth::{synthesize_query, QuerySpec, WhereJoin};
