//! WebSocket adapter for `dcx`, built on `tokio-tungstenite`.

mod adapter;
mod error;

pub use adapter::TungsteniteWebSocketAdapter;
pub use error::WsAdapterError;
