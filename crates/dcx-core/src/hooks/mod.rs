//! Ordered, typed request/response interceptors.
//!
//! The original hook manager classified an opaque object by which methods it
//! happened to define. Rust has no duck typing, so each hook category is its
//! own narrow trait; a value that conceptually belongs to several categories
//! just implements several traits and gets registered into each matching
//! list via `HookManager::add_*`.

pub mod builtin;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{ApiRequest, ApiResponse};
use crate::ports::adapter::RawResponse;

/// Runs before a request is dispatched; may mutate method/url/kwargs via the
/// returned `ApiRequest`. A failure aborts the pipeline and is routed into
/// the error hooks, same as an adapter failure.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, request: ApiRequest) -> Result<ApiRequest, CoreError>;
}

/// Runs after the adapter returns, before the `Client` builds an
/// `ApiResponse`. A failure aborts the pipeline and is routed into the error
/// hooks, same as an adapter failure.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    async fn on_response(&self, method: &str, url: &str, raw: RawResponse) -> Result<RawResponse, CoreError>;
}

/// Runs after the unified envelope is built. A failure aborts the pipeline
/// and is routed into the error hooks, same as an adapter failure.
#[async_trait]
pub trait ApiResponseHook: Send + Sync {
    async fn on_api_response(&self, method: &str, url: &str, api: ApiResponse) -> Result<ApiResponse, CoreError>;
}

/// Runs when an error occurs anywhere after the request hooks. Returning
/// `Some(response)` suppresses the error and substitutes that response.
#[async_trait]
pub trait ErrorHook: Send + Sync {
    async fn on_error(&self, method: &str, url: &str, error: &str) -> Option<ApiResponse>;
}

/// Facade that dispatches into every registered hook list, in registration
/// order, for each of the four categories.
#[derive(Default, Clone)]
pub struct HookManager {
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
    api_response_hooks: Vec<Arc<dyn ApiResponseHook>>,
    error_hooks: Vec<Arc<dyn ErrorHook>>,
}

impl HookManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request_hook(&mut self, hook: Arc<dyn RequestHook>) {
        self.request_hooks.push(hook);
    }

    pub fn add_response_hook(&mut self, hook: Arc<dyn ResponseHook>) {
        self.response_hooks.push(hook);
    }

    pub fn add_api_response_hook(&mut self, hook: Arc<dyn ApiResponseHook>) {
        self.api_response_hooks.push(hook);
    }

    pub fn add_error_hook(&mut self, hook: Arc<dyn ErrorHook>) {
        self.error_hooks.push(hook);
    }

    pub fn clear_hooks(&mut self) {
        self.request_hooks.clear();
        self.response_hooks.clear();
        self.api_response_hooks.clear();
        self.error_hooks.clear();
    }

    /// Fold every request hook over `request`, in registration order;
    /// stops at the first failure.
    pub async fn process_request(&self, mut request: ApiRequest) -> Result<ApiRequest, CoreError> {
        for hook in &self.request_hooks {
            request = hook.on_request(request).await?;
        }
        Ok(request)
    }

    /// Stops at the first failure.
    pub async fn process_response(
        &self,
        method: &str,
        url: &str,
        mut raw: RawResponse,
    ) -> Result<RawResponse, CoreError> {
        for hook in &self.response_hooks {
            raw = hook.on_response(method, url, raw).await?;
        }
        Ok(raw)
    }

    /// Stops at the first failure.
    pub async fn process_api_response(
        &self,
        method: &str,
        url: &str,
        mut api: ApiResponse,
    ) -> Result<ApiResponse, CoreError> {
        for hook in &self.api_response_hooks {
            api = hook.on_api_response(method, url, api).await?;
        }
        Ok(api)
    }

    /// Run every error hook in order; stop and return the first non-`None`
    /// result.
    pub async fn handle_error(&self, method: &str, url: &str, error: &str) -> Option<ApiResponse> {
        for hook in &self.error_hooks {
            if let Some(response) = hook.on_error(method, url, error).await {
                return Some(response);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct UppercaseMethodHook;

    #[async_trait]
    impl RequestHook for UppercaseMethodHook {
        async fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest, CoreError> {
            request.method = request.method.to_uppercase();
            Ok(request)
        }
    }

    struct AlwaysSuppress;

    #[async_trait]
    impl ErrorHook for AlwaysSuppress {
        async fn on_error(&self, _method: &str, _url: &str, _error: &str) -> Option<ApiResponse> {
            Some(ApiResponse::ok(599, json!({"suppressed": true})))
        }
    }

    #[tokio::test]
    async fn request_hooks_run_in_registration_order() {
        let mut manager = HookManager::new();
        manager.add_request_hook(Arc::new(UppercaseMethodHook));
        let req = ApiRequest::new("get", "https://x/y");
        let out = manager.process_request(req).await.unwrap();
        assert_eq!(out.method, "GET");
    }

    #[tokio::test]
    async fn first_suppressing_error_hook_wins() {
        let mut manager = HookManager::new();
        manager.add_error_hook(Arc::new(AlwaysSuppress));
        let result = manager.handle_error("GET", "https://x", "boom").await;
        assert!(result.is_some());
        assert_eq!(result.unwrap().status_code, 599);
    }

    struct AlwaysFail;

    #[async_trait]
    impl RequestHook for AlwaysFail {
        async fn on_request(&self, _request: ApiRequest) -> Result<ApiRequest, CoreError> {
            Err(CoreError::Other("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_request_hook_short_circuits_the_fold() {
        let mut manager = HookManager::new();
        manager.add_request_hook(Arc::new(AlwaysFail));
        manager.add_request_hook(Arc::new(UppercaseMethodHook));
        let req = ApiRequest::new("get", "https://x/y");
        assert!(manager.process_request(req).await.is_err());
    }

    #[tokio::test]
    async fn no_error_hooks_means_no_suppression() {
        let manager = HookManager::new();
        let result = manager.handle_error("GET", "https://x", "boom").await;
        assert!(result.is_none());
    }
}
