//! Local error type for the `tokio::fs`-backed filesystem adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum FsAdapterError {
    #[error("io error on {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

impl From<FsAdapterError> for AdapterError {
    fn from(err: FsAdapterError) -> Self {
        Self::Other(err.to_string())
    }
}
