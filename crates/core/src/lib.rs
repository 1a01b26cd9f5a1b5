pub mod config;
pub mod connection;
pub mod error;

pub use config::{AwsConfig, Config};
pub use connection::{Connection, ConnectionStore, EnvConnectionStore, InMemoryConnectionStore};
pub use error::*;
