use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use unload_core::{AwsConfig, Connection, ConnectionStore, CoreError};

use crate::data_api::RedshiftDataExecutor;
use crate::error::ExecutionError;
use crate::executor::{DataApiExecutor, ExecutorFactory, SqlExecutor};
use crate::sql::RedshiftSqlExecutor;

/// Builds the production backends from connections in a [`ConnectionStore`].
pub struct RedshiftExecutorFactory {
    store: Arc<dyn ConnectionStore>,
    aws: AwsConfig,
}

impl RedshiftExecutorFactory {
    pub fn new(store: Arc<dyn ConnectionStore>, aws: AwsConfig) -> Self {
        Self { store, aws }
    }
}

#[async_trait]
impl ExecutorFactory for RedshiftExecutorFactory {
    async fn sql_executor(&self, conn_id: &str) -> Result<Box<dyn SqlExecutor>, ExecutionError> {
        let conn = self.store.get(conn_id)?;
        Ok(Box::new(RedshiftSqlExecutor::from_connection(&conn)?))
    }

    /// A missing connection is not an error here: the client then takes its
    /// region and credentials from the AWS config and the default chain.
    async fn data_api_executor(
        &self,
        conn_id: &str,
    ) -> Result<Box<dyn DataApiExecutor>, ExecutionError> {
        let conn = match self.store.get(conn_id) {
            Ok(conn) => conn,
            Err(CoreError::ConnectionNotFound(_)) => {
                warn!(conn_id, "Connection not found, using AWS config for the Data API client");
                Connection::new(conn_id)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Box::new(RedshiftDataExecutor::from_connection(&conn, &self.aws).await))
    }
}
