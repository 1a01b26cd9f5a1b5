//! Named connections and the stores that resolve them.
//!
//! A [`Connection`] is the unit both the warehouse clients and the storage
//! credential provider are configured from: host/login/password/port fields
//! plus a free-form `extra` JSON object for provider-specific settings
//! (`role_arn`, `region_name`, `sslmode`, ...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::profiled_env_opt;
use crate::error::CoreError;

/// Env var prefix for JSON-encoded connections (`UNLOAD_CONN_<ID>`).
pub const CONNECTION_ENV_PREFIX: &str = "UNLOAD_CONN_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub conn_id: String,
    #[serde(default)]
    pub conn_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name for warehouse connections.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Connection {
    pub fn new(conn_id: impl Into<String>) -> Self {
        Self {
            conn_id: conn_id.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for an `extra` entry.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// String value of an `extra` entry; empty strings count as unset.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Role ARN the warehouse should assume when writing to storage.
    pub fn role_arn(&self) -> Option<&str> {
        self.extra_str("role_arn")
    }
}

/// Resolves connection ids to [`Connection`]s.
pub trait ConnectionStore: Send + Sync {
    fn get(&self, conn_id: &str) -> Result<Connection, CoreError>;
}

// ── Env-backed store ──────────────────────────────────────────

/// Reads connections from `{PROFILE}_UNLOAD_CONN_{ID}` / `UNLOAD_CONN_{ID}`.
///
/// The id is upper-cased and `-`/`.` are mapped to `_`, so `aws_default`
/// is read from `UNLOAD_CONN_AWS_DEFAULT`. The value is a JSON object in
/// the shape of [`Connection`].
#[derive(Debug, Clone, Default)]
pub struct EnvConnectionStore {
    profile: String,
}

impl EnvConnectionStore {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_uppercase(),
        }
    }

    pub fn env_key(conn_id: &str) -> String {
        let normalized: String = conn_id
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", CONNECTION_ENV_PREFIX, normalized)
    }
}

impl ConnectionStore for EnvConnectionStore {
    fn get(&self, conn_id: &str) -> Result<Connection, CoreError> {
        let key = Self::env_key(conn_id);
        let raw = profiled_env_opt(&self.profile, &key)
            .ok_or_else(|| CoreError::ConnectionNotFound(conn_id.to_string()))?;

        let mut conn: Connection =
            serde_json::from_str(&raw).map_err(|e| CoreError::InvalidConnection {
                conn_id: conn_id.to_string(),
                reason: e.to_string(),
            })?;
        conn.conn_id = conn_id.to_string();

        debug!(conn_id, env_key = %key, "Resolved connection from environment");
        Ok(conn)
    }
}

// ── In-memory store ───────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectionStore {
    connections: HashMap<String, Connection>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, conn: Connection) {
        self.connections.insert(conn.conn_id.clone(), conn);
    }

    pub fn with(mut self, conn: Connection) -> Self {
        self.insert(conn);
        self
    }
}

impl ConnectionStore for InMemoryConnectionStore {
    fn get(&self, conn_id: &str) -> Result<Connection, CoreError> {
        self.connections
            .get(conn_id)
            .cloned()
            .ok_or_else(|| CoreError::ConnectionNotFound(conn_id.to_string()))
    }
}
