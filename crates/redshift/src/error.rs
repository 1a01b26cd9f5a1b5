//! Error types for the Redshift UNLOAD task.
//!
//! [`ConfigError`] is raised while the task is being constructed and never
//! reaches a backend. [`ExecutionError`] is the single error type shared by
//! every collaborator (credential provider, SQL client, Data API client) so
//! their failures reach the caller unchanged.

use thiserror::Error;
use unload_core::CoreError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither a select query nor a schema/table pair was provided.
    #[error("Please provide both `schema` and `table` params or `select_query` to fetch the data.")]
    MissingSource,

    /// A Data API option would shadow an argument the task sets itself.
    #[error("Cannot include param '{0}' in Redshift Data API kwargs")]
    ForbiddenDataApiOption(String),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("invalid connection {conn_id}: {reason}")]
    InvalidConnection { conn_id: String, reason: String },

    #[error("credential resolution failed: {0}")]
    Credentials(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Statement {statement_id} failed: {reason}")]
    StatementFailed { statement_id: String, reason: String },

    #[error("Statement {statement_id} was aborted")]
    StatementAborted { statement_id: String },

    #[error("unsupported parameters: {0}")]
    UnsupportedParameters(String),

    #[error("invalid Data API options: {0}")]
    InvalidOptions(String),
}

impl From<CoreError> for ExecutionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionNotFound(id) => ExecutionError::ConnectionNotFound(id),
            CoreError::InvalidConnection { conn_id, reason } => {
                ExecutionError::InvalidConnection { conn_id, reason }
            }
        }
    }
}
