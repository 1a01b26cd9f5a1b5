use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("invalid connection {conn_id}: {reason}")]
    InvalidConnection { conn_id: String, reason: String },
}
