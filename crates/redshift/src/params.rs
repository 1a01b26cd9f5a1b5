use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_REDSHIFT_CONN_ID: &str = "redshift_default";
pub const DEFAULT_AWS_CONN_ID: &str = "aws_default";

// ---------------------------------------------------------------------------
// Bind parameters
// ---------------------------------------------------------------------------

/// Bind values handed to the execution backend verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParameters {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl QueryParameters {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryParameters::Positional(values) => values.is_empty(),
            QueryParameters::Named(values) => values.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// TLS verification
// ---------------------------------------------------------------------------

/// TLS verification for the storage connection: on/off, or a CA bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TlsVerify {
    Enabled(bool),
    CaBundle(PathBuf),
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Raw, unvalidated parameters of a Redshift-to-S3 export.
///
/// Validation and derived values live in [`crate::task::RedshiftToS3`];
/// this struct is what job files and callers fill in.
///
/// # Example JSON
/// ```json
/// {
///   "s3_bucket": "analytics-exports",
///   "s3_key": "daily",
///   "schema": "public",
///   "table": "orders",
///   "unload_options": ["CSV", "PARALLEL OFF"],
///   "include_header": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnloadParams {
    pub s3_bucket: String,
    /// Key prefix. When `table_as_file_name` is set it is extended with
    /// `/<table>_`, otherwise it must already include the file name.
    pub s3_key: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    /// Custom query; takes precedence over `schema`/`table`.
    #[serde(default)]
    pub select_query: Option<String>,
    #[serde(default = "default_redshift_conn_id")]
    pub redshift_conn_id: String,
    /// Storage connection. `None` skips the connection lookup entirely.
    #[serde(default = "default_aws_conn_id")]
    pub aws_conn_id: Option<String>,
    #[serde(default)]
    pub verify: Option<TlsVerify>,
    #[serde(default)]
    pub unload_options: Vec<String>,
    #[serde(default)]
    pub autocommit: bool,
    #[serde(default)]
    pub include_header: bool,
    #[serde(default)]
    pub parameters: Option<QueryParameters>,
    #[serde(default = "default_true")]
    pub table_as_file_name: bool,
    /// Arguments for the Redshift Data API. A non-empty map selects the
    /// Data API backend instead of a SQL connection.
    #[serde(default)]
    pub data_api_options: Map<String, Value>,
}

impl UnloadParams {
    /// Parameters with every optional field at its default.
    pub fn new(s3_bucket: impl Into<String>, s3_key: impl Into<String>) -> Self {
        Self {
            s3_bucket: s3_bucket.into(),
            s3_key: s3_key.into(),
            schema: None,
            table: None,
            select_query: None,
            redshift_conn_id: default_redshift_conn_id(),
            aws_conn_id: default_aws_conn_id(),
            verify: None,
            unload_options: Vec::new(),
            autocommit: false,
            include_header: false,
            parameters: None,
            table_as_file_name: true,
            data_api_options: Map::new(),
        }
    }

    pub fn table(mut self, schema: impl Into<String>, table: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self.table = Some(table.into());
        self
    }

    pub fn select_query(mut self, sql: impl Into<String>) -> Self {
        self.select_query = Some(sql.into());
        self
    }

    pub fn unload_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unload_options = options.into_iter().map(Into::into).collect();
        self
    }
}

fn default_redshift_conn_id() -> String {
    DEFAULT_REDSHIFT_CONN_ID.to_string()
}

fn default_aws_conn_id() -> Option<String> {
    Some(DEFAULT_AWS_CONN_ID.to_string())
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
