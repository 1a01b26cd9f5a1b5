//! Execution backends and the strategy that picks one per export.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ExecutionError;
use crate::params::QueryParameters;

/// Runs a statement over a SQL connection to the warehouse.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn run(
        &self,
        statement: &str,
        autocommit: bool,
        parameters: Option<&QueryParameters>,
    ) -> Result<(), ExecutionError>;
}

/// Submits a statement through the warehouse Data API.
#[async_trait]
pub trait DataApiExecutor: Send + Sync {
    /// `options` carries the caller's extra Data API arguments (database,
    /// cluster or workgroup, polling behaviour, ...).
    async fn execute_query(
        &self,
        sql: &str,
        parameters: Option<&QueryParameters>,
        options: &Map<String, Value>,
    ) -> Result<(), ExecutionError>;
}

/// Builds the backend for a connection id. Construction must not perform
/// I/O; connecting happens when the statement is submitted.
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    async fn sql_executor(&self, conn_id: &str) -> Result<Box<dyn SqlExecutor>, ExecutionError>;

    async fn data_api_executor(
        &self,
        conn_id: &str,
    ) -> Result<Box<dyn DataApiExecutor>, ExecutionError>;
}

/// The backend chosen for one export, selected once before anything runs.
pub enum ExecutionStrategy<'a> {
    Sql {
        executor: Box<dyn SqlExecutor>,
        autocommit: bool,
    },
    DataApi {
        executor: Box<dyn DataApiExecutor>,
        options: &'a Map<String, Value>,
    },
}

impl<'a> ExecutionStrategy<'a> {
    /// A non-empty `data_api_options` map selects the Data API.
    pub async fn select(
        factory: &dyn ExecutorFactory,
        conn_id: &str,
        autocommit: bool,
        data_api_options: &'a Map<String, Value>,
    ) -> Result<Self, ExecutionError> {
        if data_api_options.is_empty() {
            Ok(ExecutionStrategy::Sql {
                executor: factory.sql_executor(conn_id).await?,
                autocommit,
            })
        } else {
            Ok(ExecutionStrategy::DataApi {
                executor: factory.data_api_executor(conn_id).await?,
                options: data_api_options,
            })
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionStrategy::Sql { .. } => "sql",
            ExecutionStrategy::DataApi { .. } => "data_api",
        }
    }

    /// Submit the statement to the selected backend.
    pub async fn submit(
        &self,
        statement: &str,
        parameters: Option<&QueryParameters>,
    ) -> Result<(), ExecutionError> {
        match self {
            ExecutionStrategy::Sql {
                executor,
                autocommit,
            } => executor.run(statement, *autocommit, parameters).await,
            ExecutionStrategy::DataApi { executor, options } => {
                executor.execute_query(statement, parameters, options).await
            }
        }
    }
}
