//! Local error type for the `sqlx`-backed SQL adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum DbAdapterError {
    #[error("failed to open database pool: {0}")]
    Pool(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("unsupported parameter type at index {0}")]
    UnsupportedParam(usize),

    #[error("unsupported column type for {0:?}")]
    UnsupportedColumn(String),

    #[error("transaction already closed")]
    TransactionClosed,
}

impl From<DbAdapterError> for AdapterError {
    fn from(err: DbAdapterError) -> Self {
        match err {
            DbAdapterError::Pool(m) => Self::Connection(m),
            DbAdapterError::Query(m) => Self::Request(m),
            DbAdapterError::UnsupportedParam(_) | DbAdapterError::UnsupportedColumn(_) => Self::Other(err.to_string()),
            DbAdapterError::TransactionClosed => Self::NotConnected,
        }
    }
}
