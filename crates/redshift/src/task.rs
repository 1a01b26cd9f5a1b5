//! The Redshift-to-S3 export task.
//!
//! [`RedshiftToS3`] is built once from [`UnloadParams`], validated up front,
//! and then executed: resolve the storage credential, render the UNLOAD
//! statement, hand it to the selected backend. Errors from collaborators
//! are returned as-is; nothing is retried.

use serde_json::{Map, Value};
use tracing::info;

use crate::credentials::{credentials_clause, resolve_credential, CredentialProvider};
use crate::error::{ConfigError, ExecutionError};
use crate::executor::{ExecutionStrategy, ExecutorFactory};
use crate::params::{QueryParameters, TlsVerify, UnloadParams};
use crate::statement::{build_unload_statement, join_options};

/// Data API option keys the task sets itself.
const RESERVED_DATA_API_KEYS: [&str; 2] = ["sql", "parameters"];

const HEADER_OPTION: &str = "HEADER";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// A validated, immutable UNLOAD export.
#[derive(Debug, Clone)]
pub struct RedshiftToS3 {
    s3_bucket: String,
    s3_key: String,
    schema: Option<String>,
    table: Option<String>,
    select_query: String,
    redshift_conn_id: String,
    aws_conn_id: Option<String>,
    verify: Option<TlsVerify>,
    unload_options: Vec<String>,
    autocommit: bool,
    parameters: Option<QueryParameters>,
    data_api_options: Map<String, Value>,
}

impl RedshiftToS3 {
    pub fn new(params: UnloadParams) -> Result<Self, ConfigError> {
        let schema = non_empty(params.schema);
        let table = non_empty(params.table);

        let s3_key = match (&table, params.table_as_file_name) {
            (Some(table), true) => format!("{}/{}_", params.s3_key, table),
            _ => params.s3_key,
        };

        let select_query = match (non_empty(params.select_query), &schema, &table) {
            (Some(sql), _, _) => sql,
            (None, Some(schema), Some(table)) => format!("SELECT * FROM {schema}.{table}"),
            _ => return Err(ConfigError::MissingSource),
        };

        let mut unload_options = params.unload_options;
        if params.include_header
            && !unload_options
                .iter()
                .any(|o| o.trim().eq_ignore_ascii_case(HEADER_OPTION))
        {
            unload_options.push(HEADER_OPTION.to_string());
        }

        if let Some(key) = RESERVED_DATA_API_KEYS
            .iter()
            .find(|k| params.data_api_options.contains_key(**k))
        {
            return Err(ConfigError::ForbiddenDataApiOption(key.to_string()));
        }

        Ok(Self {
            s3_bucket: params.s3_bucket,
            s3_key,
            schema,
            table,
            select_query,
            redshift_conn_id: params.redshift_conn_id,
            aws_conn_id: params.aws_conn_id,
            verify: params.verify,
            unload_options,
            autocommit: params.autocommit,
            parameters: params.parameters,
            data_api_options: params.data_api_options,
        })
    }

    pub fn s3_bucket(&self) -> &str {
        &self.s3_bucket
    }

    /// Effective destination key (includes `/<table>_` when the table is
    /// used as the file name).
    pub fn s3_key(&self) -> &str {
        &self.s3_key
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn select_query(&self) -> &str {
        &self.select_query
    }

    pub fn unload_options(&self) -> &[String] {
        &self.unload_options
    }

    pub fn data_api_options(&self) -> &Map<String, Value> {
        &self.data_api_options
    }

    pub fn uses_data_api(&self) -> bool {
        !self.data_api_options.is_empty()
    }

    /// Render the statement around an already-formatted credentials clause.
    pub fn statement_with_clause(&self, credentials_block: &str) -> String {
        build_unload_statement(
            &self.s3_bucket,
            credentials_block,
            &self.select_query,
            &self.s3_key,
            &join_options(&self.unload_options),
        )
    }

    /// Run the export once.
    pub async fn execute(
        &self,
        executors: &dyn ExecutorFactory,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), ExecutionError> {
        let strategy = ExecutionStrategy::select(
            executors,
            &self.redshift_conn_id,
            self.autocommit,
            &self.data_api_options,
        )
        .await?;

        let credential =
            resolve_credential(credentials, self.aws_conn_id.as_deref(), self.verify.as_ref())
                .await?;
        let statement = self.statement_with_clause(&credentials_clause(&credential));

        info!(
            backend = strategy.name(),
            bucket = %self.s3_bucket,
            key = %self.s3_key,
            "Executing UNLOAD command..."
        );
        strategy
            .submit(&statement, self.parameters.as_ref())
            .await?;
        info!("UNLOAD command complete...");

        Ok(())
    }
}
