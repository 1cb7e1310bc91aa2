//! Template-based SELECT assembly for the CKAN `datastore_search_sql`
//! endpoint.
//!
//! Fragments are inserted verbatim. Field names are not quoted or escaped;
//! CKAN fields that are Postgres reserved words (`ALL`, `CAST`, `NEW`, ...)
//! or contain upper-case letters must be double-quoted by the caller.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clause::{validate_where_clause, ClauseError};

// ---------------------------------------------------------------------------
// Join policy
// ---------------------------------------------------------------------------

/// Delimiter placed between WHERE-clause fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhereJoin {
    /// `, ` between fragments. Multiple fragments joined this way do not
    /// form valid SQL, but this is what existing DAGs emit.
    #[default]
    Comma,
    /// ` AND ` between fragments.
    And,
}

impl WhereJoin {
    fn delimiter(self) -> &'static str {
        match self {
            Self::Comma => ", ",
            Self::And => " AND ",
        }
    }
}

// ---------------------------------------------------------------------------
// QuerySpec
// ---------------------------------------------------------------------------

/// Structured inputs for one SELECT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// CKAN resource id, used as the quoted table name.
    pub resource_id: String,
    /// Select expressions, defaults to `["*"]`.
    #[serde(default = "default_select")]
    pub select_fields: Vec<String>,
    #[serde(default)]
    pub where_clauses: Option<Vec<String>>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    /// Kept as text: a non-numeric limit is warned about but still emitted.
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub where_join: WhereJoin,
}

fn default_select() -> Vec<String> {
    vec!["*".to_string()]
}

impl QuerySpec {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            select_fields: default_select(),
            where_clauses: None,
            group_by: None,
            order_by: None,
            limit: None,
            where_join: WhereJoin::default(),
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append one WHERE fragment.
    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clauses
            .get_or_insert_with(Vec::new)
            .push(clause.into());
        self
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    pub fn limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn where_join(mut self, join: WhereJoin) -> Self {
        self.where_join = join;
        self
    }

    /// Render the SELECT. See [`synthesize_query`].
    pub fn synthesize(&self) -> Result<String, ClauseError> {
        synthesize_query(self)
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Assemble `spec` into a single SELECT string.
///
/// Clause order is SELECT, FROM, WHERE, GROUP BY, ORDER BY, LIMIT; absent
/// inputs are left out. An empty WHERE list is treated as absent. Every
/// WHERE fragment is validated before anything is rendered.
pub fn synthesize_query(spec: &QuerySpec) -> Result<String, ClauseError> {
    let mut query = format!(
        r#"SELECT {} FROM "{}""#,
        spec.select_fields.join(", "),
        spec.resource_id
    );

    if let Some(clauses) = spec.where_clauses.as_deref().filter(|c| !c.is_empty()) {
        for clause in clauses {
            validate_where_clause(clause)?;
        }
        query.push_str(" WHERE ");
        query.push_str(&clauses.join(spec.where_join.delimiter()));
    }

    if let Some(group_by) = &spec.group_by {
        query.push_str(" GROUP BY ");
        query.push_str(group_by);
    }
    if let Some(order_by) = &spec.order_by {
        query.push_str(" ORDER BY ");
        query.push_str(order_by);
    }
    if let Some(limit) = &spec.limit {
        if limit.trim().parse::<i64>().is_err() {
            warn!(
                limit = %limit,
                "unable to cast the LIMIT parameter to an integer limit"
            );
        }
        query.push_str(" LIMIT ");
        query.push_str(limit);
    }

    Ok(query)
}
