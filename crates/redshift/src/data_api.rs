//! Redshift Data API backend.
//!
//! Submits the statement with `ExecuteStatement` and, unless told not to,
//! polls `DescribeStatement` at a fixed interval until the statement reaches
//! a terminal state. Timeouts are left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_redshiftdata::config::{BehaviorVersion, Region};
use aws_sdk_redshiftdata::types::{SqlParameter, StatusString};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use unload_core::{AwsConfig, Connection};

use crate::error::ExecutionError;
use crate::executor::DataApiExecutor;
use crate::params::QueryParameters;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Typed view of the Data API options map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataApiOptions {
    pub database: String,
    #[serde(default)]
    pub cluster_identifier: Option<String>,
    #[serde(default)]
    pub workgroup_name: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub secret_arn: Option<String>,
    #[serde(default)]
    pub statement_name: Option<String>,
    #[serde(default)]
    pub with_event: bool,
    #[serde(default = "default_wait")]
    pub wait_for_completion: bool,
    /// Seconds between `DescribeStatement` calls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_wait() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl DataApiOptions {
    pub fn from_map(options: &Map<String, Value>) -> Result<Self, ExecutionError> {
        let parsed: Self = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|e| ExecutionError::InvalidOptions(e.to_string()))?;

        if parsed.poll_interval == 0 {
            return Err(ExecutionError::InvalidOptions(
                "`poll_interval` must be at least 1 second".into(),
            ));
        }

        match (&parsed.cluster_identifier, &parsed.workgroup_name) {
            (Some(_), Some(_)) => Err(ExecutionError::InvalidOptions(
                "`cluster_identifier` and `workgroup_name` are mutually exclusive".into(),
            )),
            (None, None) => Err(ExecutionError::InvalidOptions(
                "either `cluster_identifier` or `workgroup_name` is required".into(),
            )),
            _ => Ok(parsed),
        }
    }
}

/// Convert bind values into Data API parameters. Only named values are
/// supported; each value is sent as text.
pub fn to_sql_parameters(
    parameters: Option<&QueryParameters>,
) -> Result<Option<Vec<SqlParameter>>, ExecutionError> {
    match parameters {
        None => Ok(None),
        Some(params) if params.is_empty() => Ok(None),
        Some(QueryParameters::Positional(_)) => Err(ExecutionError::UnsupportedParameters(
            "the Data API only accepts named parameters".into(),
        )),
        Some(QueryParameters::Named(values)) => values
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                SqlParameter::builder()
                    .name(name)
                    .value(text)
                    .build()
                    .map_err(|e| ExecutionError::UnsupportedParameters(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}

/// Static keys for the Data API client: the connection's login/password
/// first, then the keys from the AWS config.
fn static_credentials(conn: &Connection, aws: &AwsConfig) -> Option<Credentials> {
    match (conn.login.as_deref(), conn.password.as_deref()) {
        (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
            return Some(Credentials::new(
                key,
                secret,
                conn.extra_str("aws_session_token").map(str::to_string),
                None,
                "unload-redshift-data",
            ));
        }
        _ => {}
    }

    match (aws.access_key_id.as_deref(), aws.secret_access_key.as_deref()) {
        (Some(key), Some(secret)) => Some(Credentials::new(
            key,
            secret,
            aws.session_token.clone(),
            None,
            "unload-redshift-data",
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct RedshiftDataExecutor {
    conn_id: String,
    client: aws_sdk_redshiftdata::Client,
}

impl RedshiftDataExecutor {
    /// Build a client for the connection, treated as an AWS connection:
    /// `region_name` extra, static keys from login/password or from the AWS
    /// config, otherwise the default credential chain. The configured
    /// endpoint override applies in every case.
    pub async fn from_connection(conn: &Connection, aws: &AwsConfig) -> Self {
        let region = conn
            .extra_str("region_name")
            .unwrap_or(aws.region.as_str())
            .to_string();

        let mut builder = match static_credentials(conn, aws) {
            Some(creds) => aws_sdk_redshiftdata::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .credentials_provider(creds),
            None => {
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.clone()))
                    .load()
                    .await;
                aws_sdk_redshiftdata::config::Builder::from(&sdk_config)
            }
        };
        if let Some(endpoint) = aws.endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }
        let client = aws_sdk_redshiftdata::Client::from_conf(builder.build());

        info!(conn_id = %conn.conn_id, region = %region, "Redshift Data API client initialised");

        Self {
            conn_id: conn.conn_id.clone(),
            client,
        }
    }

    async fn wait_for_results(
        &self,
        statement_id: &str,
        poll_interval: Duration,
    ) -> Result<(), ExecutionError> {
        loop {
            let resp = self
                .client
                .describe_statement()
                .id(statement_id)
                .send()
                .await
                .map_err(|e| ExecutionError::AwsSdk(e.to_string()))?;

            let status = resp
                .status()
                .cloned()
                .unwrap_or(StatusString::Submitted);

            debug!(statement_id, status = ?status, "Polling statement status");

            match status {
                StatusString::Finished => return Ok(()),

                StatusString::Failed => {
                    let reason = resp.error().unwrap_or("unknown").to_string();
                    error!(statement_id, reason = %reason, "Statement failed");
                    return Err(ExecutionError::StatementFailed {
                        statement_id: statement_id.to_string(),
                        reason,
                    });
                }

                StatusString::Aborted => {
                    warn!(statement_id, "Statement was aborted");
                    return Err(ExecutionError::StatementAborted {
                        statement_id: statement_id.to_string(),
                    });
                }

                // Submitted | Picked | Started | unknown future variant
                _ => {}
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[async_trait]
impl DataApiExecutor for RedshiftDataExecutor {
    async fn execute_query(
        &self,
        sql: &str,
        parameters: Option<&QueryParameters>,
        options: &Map<String, Value>,
    ) -> Result<(), ExecutionError> {
        let opts = DataApiOptions::from_map(options)?;
        let sql_parameters = to_sql_parameters(parameters)?;

        let resp = self
            .client
            .execute_statement()
            .sql(sql)
            .database(&opts.database)
            .set_cluster_identifier(opts.cluster_identifier.clone())
            .set_workgroup_name(opts.workgroup_name.clone())
            .set_db_user(opts.db_user.clone())
            .set_secret_arn(opts.secret_arn.clone())
            .set_statement_name(opts.statement_name.clone())
            .with_event(opts.with_event)
            .set_parameters(sql_parameters)
            .send()
            .await
            .map_err(|e| ExecutionError::AwsSdk(e.to_string()))?;

        let statement_id = resp
            .id()
            .ok_or_else(|| ExecutionError::AwsSdk("No statement ID returned".into()))?
            .to_string();

        info!(conn_id = %self.conn_id, statement_id = %statement_id, "Statement submitted");

        if opts.wait_for_completion {
            self.wait_for_results(&statement_id, Duration::from_secs(opts.poll_interval))
                .await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests — option and parameter handling only, no AWS calls
// ---------------------------------------------------------------------------
