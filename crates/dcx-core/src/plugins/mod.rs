//! Client-scoped plugin contract and the process-wide plugin registry.

pub mod registry;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::models::{ApiRequest, ApiResponse};
use crate::ports::adapter::RawResponse;

/// Opaque, weak back-reference a plugin receives to the `Client` that owns
/// it. Rust has no GC, so a plugin holds this wrapped in `std::sync::Weak`
/// rather than a reference-counted cycle back to `Client` itself.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub base_url: Option<String>,
}

/// A Client-scoped extension with a lifecycle and interception points
/// around every request. Every method defaults to identity/no-op so a
/// plugin only overrides what it needs.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable name used for logging and `PluginRegistry` bookkeeping.
    fn name(&self) -> &str;

    async fn initialize(&self, _client: std::sync::Weak<ClientHandle>) {}

    async fn shutdown(&self) {}

    async fn before_request(&self, request: ApiRequest) -> Result<ApiRequest, CoreError> {
        Ok(request)
    }

    async fn after_request(&self, _method: &str, _url: &str, raw: RawResponse) -> Result<RawResponse, CoreError> {
        Ok(raw)
    }

    async fn before_response_processed(
        &self,
        _raw: &RawResponse,
        api: ApiResponse,
    ) -> Result<ApiResponse, CoreError> {
        Ok(api)
    }

    async fn on_error(&self, _method: &str, _url: &str, _error: &str) -> Option<ApiResponse> {
        None
    }

    /// Hook for HTTP-library plugins that want to customize the transport
    /// session before first use. Identity by default; no-op for adapters
    /// with no notion of a reusable session object.
    fn create_session(&self, session: Value) -> Value {
        session
    }
}
