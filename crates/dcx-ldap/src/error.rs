//! Local error type for the `ldap3`-backed directory adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum LdapAdapterError {
    #[error("failed to connect to {0}: {1}")]
    Connect(String, String),

    #[error("bind failed: {0}")]
    Bind(String),

    #[error("search failed: {0}")]
    Search(String),

    #[error("{operation} failed for {dn}: {detail}")]
    Operation {
        operation: &'static str,
        dn: String,
        detail: String,
    },

    #[error("adapter is not bound")]
    NotBound,
}

impl From<LdapAdapterError> for AdapterError {
    fn from(err: LdapAdapterError) -> Self {
        match err {
            LdapAdapterError::Connect(_, _) => Self::Connection(err.to_string()),
            LdapAdapterError::Bind(m) => Self::Connection(m),
            LdapAdapterError::Search(m) => Self::Request(m),
            LdapAdapterError::Operation { .. } => Self::Request(err.to_string()),
            LdapAdapterError::NotBound => Self::NotConnected,
        }
    }
}
