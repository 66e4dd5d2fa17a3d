use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZkCacheError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("{op} failed: {source}")]
    Call {
        op: &'static str,
        #[source]
        source: Box<ZkCacheError>,
    },

    #[error("Cannot dial to any server")]
    AllServersFailed,

    #[error("{op} failed {attempts} times: {source}")]
    RetriesExhausted {
        op: &'static str,
        attempts: u32,
        #[source]
        source: Box<ZkCacheError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ZkCacheError>;
