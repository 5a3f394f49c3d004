//! Local error type for the `tokio-tungstenite`-backed WebSocket adapter.

use thiserror::Error;

use dcx_core::ports::adapter::AdapterError;

#[derive(Debug, Error)]
pub enum WsAdapterError {
    #[error("failed to connect to {0}: {1}")]
    Connect(String, String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive timed out after {0:?}")]
    ReceiveTimeout(std::time::Duration),

    #[error("connection closed")]
    Closed,
}

impl From<WsAdapterError> for AdapterError {
    fn from(err: WsAdapterError) -> Self {
        match err {
            WsAdapterError::Connect(_, _) => Self::Connection(err.to_string()),
            WsAdapterError::Send(m) => Self::Request(m),
            WsAdapterError::ReceiveTimeout(d) => Self::Timeout(d),
            WsAdapterError::Closed => Self::NotConnected,
        }
    }
}
