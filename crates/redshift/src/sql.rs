//! SQL-connection backend over the Postgres wire protocol (sqlx).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgSslMode};
use sqlx::query::Query;
use sqlx::{Connection as _, Executor as _, PgConnection, Postgres};
use tracing::{debug, info};
use unload_core::Connection;

use crate::error::ExecutionError;
use crate::executor::SqlExecutor;
use crate::params::QueryParameters;

pub const DEFAULT_REDSHIFT_PORT: u16 = 5439;

/// Opens one connection per statement and closes it before returning.
pub struct RedshiftSqlExecutor {
    conn_id: String,
    options: PgConnectOptions,
}

impl RedshiftSqlExecutor {
    /// Build connect options from a warehouse connection. No I/O happens here.
    pub fn from_connection(conn: &Connection) -> Result<Self, ExecutionError> {
        Ok(Self {
            conn_id: conn.conn_id.clone(),
            options: connect_options(conn)?,
        })
    }

    async fn execute(
        conn: &mut PgConnection,
        statement: &str,
        parameters: Option<&QueryParameters>,
    ) -> Result<(), ExecutionError> {
        match parameters {
            None => {
                conn.execute(sqlx::raw_sql(statement)).await?;
            }
            Some(params) if params.is_empty() => {
                conn.execute(sqlx::raw_sql(statement)).await?;
            }
            Some(QueryParameters::Positional(values)) => {
                let mut query = sqlx::query(statement);
                for value in values {
                    query = bind_json(query, value);
                }
                conn.execute(query).await?;
            }
            Some(QueryParameters::Named(_)) => {
                return Err(ExecutionError::UnsupportedParameters(
                    "named parameters are not supported over a SQL connection".into(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SqlExecutor for RedshiftSqlExecutor {
    async fn run(
        &self,
        statement: &str,
        autocommit: bool,
        parameters: Option<&QueryParameters>,
    ) -> Result<(), ExecutionError> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        debug!(conn_id = %self.conn_id, autocommit, "Connected to Redshift");

        if autocommit {
            Self::execute(&mut conn, statement, parameters).await?;
        } else {
            let mut tx = conn.begin().await?;
            Self::execute(&mut *tx, statement, parameters).await?;
            tx.commit().await?;
        }

        conn.close().await?;
        info!(conn_id = %self.conn_id, "Statement executed");
        Ok(())
    }
}

/// Map a warehouse [`Connection`] onto sqlx connect options.
pub fn connect_options(conn: &Connection) -> Result<PgConnectOptions, ExecutionError> {
    let host = conn
        .host
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ExecutionError::InvalidConnection {
            conn_id: conn.conn_id.clone(),
            reason: "missing host".into(),
        })?;

    let mut options = PgConnectOptions::new()
        .host(host)
        .port(conn.port.unwrap_or(DEFAULT_REDSHIFT_PORT));

    if let Some(login) = conn.login.as_deref() {
        options = options.username(login);
    }
    if let Some(password) = conn.password.as_deref() {
        options = options.password(password);
    }
    if let Some(database) = conn.schema.as_deref().filter(|d| !d.is_empty()) {
        options = options.database(database);
    }
    if let Some(mode) = conn.extra_str("sslmode") {
        let ssl_mode: PgSslMode = mode.parse().map_err(|_| ExecutionError::InvalidConnection {
            conn_id: conn.conn_id.clone(),
            reason: format!("unknown sslmode '{mode}'"),
        })?;
        options = options.ssl_mode(ssl_mode);
    }

    Ok(options)
}

/// Bind a JSON value by its natural SQL type. Arrays and objects are bound
/// as their JSON text.
fn bind_json<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}
