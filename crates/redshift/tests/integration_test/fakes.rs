//! Recording fakes for the collaborator traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use unload_core::{Connection, ConnectionStore, InMemoryConnectionStore};
use unload_redshift::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Sql {
        statement: String,
        autocommit: bool,
        parameters: Option<QueryParameters>,
    },
    DataApi {
        sql: String,
        parameters: Option<QueryParameters>,
        options: Map<String, Value>,
    },
}

/// Shared log of backend calls plus an optional canned failure.
#[derive(Default, Clone)]
pub struct Recorder {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub fail_with: Arc<Mutex<Option<String>>>,
    pub requested_conn_ids: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), ExecutionError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(reason) => Err(ExecutionError::StatementFailed {
                statement_id: "fake-1".into(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

struct FakeSql(Recorder);

#[async_trait]
impl SqlExecutor for FakeSql {
    async fn run(
        &self,
        statement: &str,
        autocommit: bool,
        parameters: Option<&QueryParameters>,
    ) -> Result<(), ExecutionError> {
        self.0.record(Call::Sql {
            statement: statement.to_string(),
            autocommit,
            parameters: parameters.cloned(),
        })
    }
}

struct FakeDataApi(Recorder);

#[async_trait]
impl DataApiExecutor for FakeDataApi {
    async fn execute_query(
        &self,
        sql: &str,
        parameters: Option<&QueryParameters>,
        options: &Map<String, Value>,
    ) -> Result<(), ExecutionError> {
        self.0.record(Call::DataApi {
            sql: sql.to_string(),
            parameters: parameters.cloned(),
            options: options.clone(),
        })
    }
}

#[async_trait]
impl ExecutorFactory for Recorder {
    async fn sql_executor(&self, conn_id: &str) -> Result<Box<dyn SqlExecutor>, ExecutionError> {
        self.requested_conn_ids.lock().unwrap().push(conn_id.to_string());
        Ok(Box::new(FakeSql(self.clone())))
    }

    async fn data_api_executor(
        &self,
        conn_id: &str,
    ) -> Result<Box<dyn DataApiExecutor>, ExecutionError> {
        self.requested_conn_ids.lock().unwrap().push(conn_id.to_string());
        Ok(Box::new(FakeDataApi(self.clone())))
    }
}

/// Credential provider backed by an in-memory connection store that counts
/// key fetches.
pub struct FakeCredentials {
    pub store: InMemoryConnectionStore,
    pub creds: SessionCredentials,
    pub key_fetches: AtomicUsize,
    pub fail_fetch: bool,
}

impl FakeCredentials {
    pub fn new(store: InMemoryConnectionStore) -> Self {
        Self {
            store,
            creds: SessionCredentials {
                access_key: "AKIAFAKE".into(),
                secret_key: "fake-secret".into(),
                session_token: None,
            },
            key_fetches: AtomicUsize::new(0),
            fail_fetch: false,
        }
    }

    pub fn fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, ExecutionError> {
        Ok(self.store.get(conn_id)?)
    }

    async fn get_credentials(
        &self,
        _conn_id: Option<&str>,
        _verify: Option<&TlsVerify>,
    ) -> Result<SessionCredentials, ExecutionError> {
        self.key_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(ExecutionError::Credentials("token expired".into()));
        }
        Ok(self.creds.clone())
    }
}

pub fn role_connection(conn_id: &str, arn: &str) -> Connection {
    Connection::new(conn_id).with_extra("role_arn", arn)
}
