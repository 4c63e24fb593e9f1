//! Access-list errors

use mcproxy_core::ProxyError;
use std::path::PathBuf;
use thiserror::Error;

/// Access-list errors
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Access list not found: {0}")]
    UnknownList(String),

    #[error("Failed to read access list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid entry in access list {list} at line {line}: {reason}")]
    InvalidEntry {
        list: String,
        line: usize,
        reason: String,
    },
}

impl From<AccessError> for ProxyError {
    fn from(err: AccessError) -> Self {
        ProxyError::Access(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
