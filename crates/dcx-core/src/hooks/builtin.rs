//! Library-provided hook implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{RequestHook, ResponseHook};
use crate::error::CoreError;
use crate::models::ApiRequest;
use crate::ports::adapter::RawResponse;
use crate::ports::auth::AuthProvider;

/// Logs every request/response pair at `debug`.
#[derive(Debug, Clone, Default)]
pub struct LoggingHook;

#[async_trait]
impl RequestHook for LoggingHook {
    async fn on_request(&self, request: ApiRequest) -> Result<ApiRequest, CoreError> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");
        Ok(request)
    }
}

#[async_trait]
impl ResponseHook for LoggingHook {
    async fn on_response(&self, method: &str, url: &str, raw: RawResponse) -> Result<RawResponse, CoreError> {
        tracing::debug!(method, url, status = raw.status, "received response");
        Ok(raw)
    }
}

/// Merges a static header mapping into every request; existing
/// caller-supplied header keys win.
#[derive(Debug, Clone, Default)]
pub struct HeadersHook {
    headers: HashMap<String, String>,
}

impl HeadersHook {
    #[must_use]
    pub fn new(headers: HashMap<String, String>) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl RequestHook for HeadersHook {
    async fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest, CoreError> {
        for (key, value) in &self.headers {
            request.headers.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(request)
    }
}

/// Injects headers produced by an `AuthProvider`; merges into an existing
/// headers mapping if present (caller-supplied keys still win).
pub struct AuthHook {
    provider: Arc<dyn AuthProvider>,
}

impl AuthHook {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RequestHook for AuthHook {
    async fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest, CoreError> {
        for (key, value) in self.provider.get_auth_headers() {
            request.headers.entry(key).or_insert(value);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn headers_hook_does_not_overwrite_caller_headers() {
        let mut defaults = HashMap::new();
        defaults.insert("X-Api-Key".to_string(), "default-key".to_string());
        let hook = HeadersHook::new(defaults);

        let mut request = ApiRequest::new("GET", "https://x/y");
        request.headers.insert("X-Api-Key".to_string(), "caller-key".to_string());

        let out = hook.on_request(request).await.unwrap();
        assert_eq!(out.headers.get("X-Api-Key").unwrap(), "caller-key");
    }

    #[tokio::test]
    async fn headers_hook_fills_missing_header() {
        let mut defaults = HashMap::new();
        defaults.insert("X-Api-Key".to_string(), "default-key".to_string());
        let hook = HeadersHook::new(defaults);

        let request = ApiRequest::new("GET", "https://x/y");
        let out = hook.on_request(request).await.unwrap();
        assert_eq!(out.headers.get("X-Api-Key").unwrap(), "default-key");
    }
}
