use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use wprdc_query::WhereJoin;

#[derive(Parser, Debug)]
#[command(
    name = "wprdc-pipeline",
    version,
    about = "Fetch WPRDC records, scrub PII and stage them as newline-delimited JSON"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// CKAN resource id to query
    #[arg(short, long)]
    pub resource_id: String,

    /// Select expression (repeatable, defaults to *)
    #[arg(long = "select")]
    pub select_fields: Vec<String>,

    /// WHERE fragment, e.g. "\"DogName\" LIKE 'DOGZ%'" (repeatable)
    #[arg(long = "where")]
    pub where_clauses: Vec<String>,

    /// Delimiter between WHERE fragments
    #[arg(long, value_enum, default_value_t = WhereJoinArg::Comma)]
    pub where_join: WhereJoinArg,

    #[arg(long)]
    pub group_by: Option<String>,

    #[arg(long)]
    pub order_by: Option<String>,

    #[arg(long)]
    pub limit: Option<String>,

    /// Text field to run through PII redaction
    #[arg(long)]
    pub scrub_field: Option<String>,

    /// Extra field to drop from every record (repeatable)
    #[arg(long = "drop-field")]
    pub drop_fields: Vec<String>,

    /// Object path to stage the NDJSON output at
    #[arg(short, long)]
    pub dest: String,

    /// Bucket (overrides config file setting)
    #[arg(long)]
    pub bucket: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WhereJoinArg {
    /// `, ` between fragments
    Comma,
    /// ` AND ` between fragments
    And,
}

impl From<WhereJoinArg> for WhereJoin {
    fn from(arg: WhereJoinArg) -> Self {
        match arg {
            WhereJoinArg::Comma => WhereJoin::Comma,
            WhereJoinArg::And => WhereJoin::And,
        }
    }
}
