//! Credential resolution for the UNLOAD `credentials` clause.
//!
//! Resolution picks between a role the warehouse assumes itself and a
//! key pair fetched from the credential provider. Formatting the clause is
//! kept in [`credentials_clause`] so the resolution logic never touches
//! warehouse syntax.

use std::fmt;

use async_trait::async_trait;
use tracing::debug;
use unload_core::Connection;

use crate::error::ExecutionError;
use crate::params::TlsVerify;

/// Session credentials returned by a [`CredentialProvider`].
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// How the warehouse is authorised to write to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    RoleArn(String),
    KeyPair(SessionCredentials),
}

/// Looks up storage connections and fetches session credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve the named storage connection.
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, ExecutionError>;

    /// Fetch session credentials for the connection (or the default chain
    /// when `conn_id` is `None`).
    async fn get_credentials(
        &self,
        conn_id: Option<&str>,
        verify: Option<&TlsVerify>,
    ) -> Result<SessionCredentials, ExecutionError>;
}

/// Resolve the credential for one export. Nothing is cached.
///
/// A `role_arn` in the connection's extras wins and the key-fetch path is
/// never invoked.
pub async fn resolve_credential(
    provider: &dyn CredentialProvider,
    aws_conn_id: Option<&str>,
    verify: Option<&TlsVerify>,
) -> Result<Credential, ExecutionError> {
    if let Some(conn_id) = aws_conn_id {
        let conn = provider.get_connection(conn_id).await?;
        if let Some(arn) = conn.role_arn() {
            debug!(conn_id, "Using role ARN from storage connection");
            return Ok(Credential::RoleArn(arn.to_string()));
        }
    }

    let creds = provider.get_credentials(aws_conn_id, verify).await?;
    Ok(Credential::KeyPair(creds))
}

/// Render a credential as the body of the UNLOAD `credentials` clause.
pub fn credentials_clause(credential: &Credential) -> String {
    match credential {
        Credential::RoleArn(arn) => format!("aws_iam_role={arn}"),
        Credential::KeyPair(creds) => match &creds.session_token {
            Some(token) => {
                debug!("STS token found in credentials, including it in the command");
                format!(
                    "aws_access_key_id={};aws_secret_access_key={};token={}",
                    creds.access_key, creds.secret_key, token
                )
            }
            None => format!(
                "aws_access_key_id={};aws_secret_access_key={}",
                creds.access_key, creds.secret_key
            ),
        },
    }
}
