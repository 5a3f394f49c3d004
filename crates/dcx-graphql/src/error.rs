//! Local error type for the GraphQL adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum GraphQlAdapterError {
    #[error("mutation document must start with the `mutation` keyword")]
    NotAMutation,

    #[error("invalid GraphQL response: {0}")]
    InvalidResponse(String),

    #[error("unknown subscription id: {0}")]
    UnknownSubscription(String),
}

impl From<GraphQlAdapterError> for AdapterError {
    fn from(err: GraphQlAdapterError) -> Self {
        match err {
            GraphQlAdapterError::NotAMutation => Self::Request(err.to_string()),
            GraphQlAdapterError::InvalidResponse(m) => Self::Request(m),
            GraphQlAdapterError::UnknownSubscription(m) => Self::Other(m),
        }
    }
}
