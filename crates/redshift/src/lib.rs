pub mod aws_credentials;
pub mod credentials;
pub mod data_api;
pub mod error;
pub mod executor;
pub mod factory;
pub mod params;
pub mod sql;
pub mod statement;
pub mod task;

pub use aws_credentials::AwsCredentialProvider;
pub use credentials::{credentials_clause, resolve_credential, Credential, CredentialProvider, SessionCredentials};
pub use data_api::{DataApiOptions, RedshiftDataExecutor};
pub use error::{ConfigError, ExecutionError};
pub use executor::{DataApiExecutor, ExecutionStrategy, ExecutorFactory, SqlExecutor};
pub use factory::RedshiftExecutorFactory;
pub use params::{QueryParameters, TlsVerify, UnloadParams};
pub use sql::RedshiftSqlExecutor;
pub use statement::{build_unload_statement, join_options, unescape_quotes};
pub use task::RedshiftToS3;
