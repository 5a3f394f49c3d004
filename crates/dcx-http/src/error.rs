//! Local error type for the `reqwest`-backed HTTP adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum HttpAdapterError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("retries exhausted after {attempts} attempts: {last_status}")]
    RetriesExhausted { attempts: u32, last_status: u16 },
}

impl From<HttpAdapterError> for AdapterError {
    fn from(err: HttpAdapterError) -> Self {
        match err {
            HttpAdapterError::Build(m) | HttpAdapterError::UnsupportedMethod(m) => Self::Other(m),
            HttpAdapterError::Request(m) => Self::Request(m),
            HttpAdapterError::RetriesExhausted { .. } => Self::Request(err.to_string()),
        }
    }
}
