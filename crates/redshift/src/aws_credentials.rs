//! [`CredentialProvider`] backed by a connection store and the AWS SDK
//! credential chain.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use tracing::{debug, info};
use unload_core::{AwsConfig, Connection, ConnectionStore};

use crate::credentials::{CredentialProvider, SessionCredentials};
use crate::error::ExecutionError;
use crate::params::TlsVerify;

pub struct AwsCredentialProvider {
    store: Arc<dyn ConnectionStore>,
    aws: AwsConfig,
}

impl AwsCredentialProvider {
    pub fn new(store: Arc<dyn ConnectionStore>, aws: AwsConfig) -> Self {
        Self { store, aws }
    }

    /// Static keys carried by the connection itself (login/password).
    fn static_from_connection(conn: &Connection) -> Option<SessionCredentials> {
        let access_key = conn.login.as_deref().filter(|s| !s.is_empty())?;
        let secret_key = conn.password.as_deref().filter(|s| !s.is_empty())?;
        Some(SessionCredentials {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            session_token: conn.extra_str("aws_session_token").map(str::to_string),
        })
    }

    fn static_from_config(&self) -> Option<SessionCredentials> {
        match (&self.aws.access_key_id, &self.aws.secret_access_key) {
            (Some(key), Some(secret)) => Some(SessionCredentials {
                access_key: key.clone(),
                secret_key: secret.clone(),
                session_token: self.aws.session_token.clone(),
            }),
            _ => None,
        }
    }

    async fn from_default_chain(
        &self,
        conn: Option<&Connection>,
    ) -> Result<SessionCredentials, ExecutionError> {
        let region = conn
            .and_then(|c| c.extra_str("region_name"))
            .unwrap_or(self.aws.region.as_str())
            .to_string();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        if let Some(profile) = conn.and_then(|c| c.extra_str("profile_name")) {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let provider = sdk_config.credentials_provider().ok_or_else(|| {
            ExecutionError::Credentials("no AWS credentials provider configured".into())
        })?;
        let creds = provider
            .provide_credentials()
            .await
            .map_err(|e| ExecutionError::Credentials(e.to_string()))?;

        Ok(SessionCredentials {
            access_key: creds.access_key_id().to_string(),
            secret_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl CredentialProvider for AwsCredentialProvider {
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, ExecutionError> {
        Ok(self.store.get(conn_id)?)
    }

    async fn get_credentials(
        &self,
        conn_id: Option<&str>,
        verify: Option<&TlsVerify>,
    ) -> Result<SessionCredentials, ExecutionError> {
        // Only the credential fetch happens here; no S3 client is built, so
        // the TLS setting has nothing to apply to.
        debug!(?verify, "TLS verification setting for storage connection");

        let conn = match conn_id {
            Some(id) => Some(self.store.get(id)?),
            None => None,
        };

        if let Some(creds) = conn.as_ref().and_then(Self::static_from_connection) {
            info!(conn_id = ?conn_id, "Using static credentials from storage connection");
            return Ok(creds);
        }
        if let Some(creds) = self.static_from_config() {
            info!(conn_id = ?conn_id, "Using static credentials from AWS config");
            return Ok(creds);
        }

        info!(conn_id = ?conn_id, "Resolving credentials from AWS default chain");
        self.from_default_chain(conn.as_ref()).await
    }
}
