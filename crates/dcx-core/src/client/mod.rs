//! The single caller-facing entry point: builds URLs, runs the hook/plugin
//! pipeline, dispatches to the adapter, and adapts the result into a
//! unified `ApiResponse`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::auth::BasicAuthProvider;
use crate::config::Config;
use crate::error::{CoreError, ErrorType};
use crate::hooks::builtin::{AuthHook, LoggingHook};
use crate::hooks::HookManager;
use crate::models::{ApiRequest, ApiResponse, Error as WireError};
use crate::plugins::{ClientHandle, Plugin};
use crate::ports::adapter::{
    AdapterError, CacheAdapter, DatabaseAdapter, DirectoryAdapter, FileSystemAdapter,
    GraphQlAdapter, HttpAdapter, MessageQueueAdapter, RawResponse, RequestKwargs,
    WebSocketAdapter,
};
use crate::ports::auth::AuthProvider;

/// Typed error surfaced by the `Client` after the pipeline's error-recovery
/// path runs and no hook/plugin suppressed the failure.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation requires {required}, but the configured adapter is {actual}")]
    AdapterType {
        required: &'static str,
        actual: &'static str,
    },
}

impl ClientError {
    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::Configuration(_) => ErrorType::ConfigurationError,
            Self::Authentication(_) => ErrorType::AuthenticationError,
            Self::Connection(_) => ErrorType::ConnectionError,
            Self::Request(_) => ErrorType::InvalidOperation,
            Self::Timeout(_) => ErrorType::Timeout,
            Self::AdapterType { .. } => ErrorType::AdapterError,
        }
    }
}

impl From<AdapterError> for ClientError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Connection(m) => Self::Connection(m),
            AdapterError::Request(m) => Self::Request(m),
            AdapterError::Timeout(d) => Self::Timeout(d),
            AdapterError::NotConnected => Self::Connection("adapter is not connected".to_string()),
            AdapterError::Other(m) => Self::Request(m),
        }
    }
}

/// A hook/plugin failure anywhere in the pipeline is routed into the same
/// error-recovery path as an adapter failure.
impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration(m) => Self::Configuration(m),
            CoreError::Authentication(m) => Self::Authentication(m),
            CoreError::Connection(m) => Self::Connection(m),
            other => Self::Request(other.to_string()),
        }
    }
}

/// Closed set of protocol families a `Client` can be built over. Rust trait
/// objects are distinctly typed per family, so an "is this client backed by
/// a database adapter" check is a match over this enum rather than a
/// runtime `isinstance` test.
pub enum AdapterHandle {
    Http(Arc<dyn HttpAdapter>),
    Database(Arc<dyn DatabaseAdapter>),
    Directory(Arc<dyn DirectoryAdapter>),
    Queue(Arc<dyn MessageQueueAdapter>),
    Cache(Arc<dyn CacheAdapter>),
    FileSystem(Arc<dyn FileSystemAdapter>),
    GraphQl(Arc<dyn GraphQlAdapter>),
    WebSocket(Arc<dyn WebSocketAdapter>),
}

impl AdapterHandle {
    fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "HttpAdapter",
            Self::Database(_) => "DatabaseAdapter",
            Self::Directory(_) => "DirectoryAdapter",
            Self::Queue(_) => "MessageQueueAdapter",
            Self::Cache(_) => "CacheAdapter",
            Self::FileSystem(_) => "FileSystemAdapter",
            Self::GraphQl(_) => "GraphQlAdapter",
            Self::WebSocket(_) => "WebSocketAdapter",
        }
    }

    async fn connect(&self) -> Result<(), AdapterError> {
        match self {
            Self::Http(a) => a.connect().await,
            Self::Database(a) => a.connect().await,
            Self::Directory(a) => a.connect().await,
            Self::Queue(a) => a.connect().await,
            Self::Cache(a) => a.connect().await,
            Self::FileSystem(a) => a.connect().await,
            Self::GraphQl(a) => a.connect().await,
            Self::WebSocket(a) => a.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        match self {
            Self::Http(a) => a.disconnect().await,
            Self::Database(a) => a.disconnect().await,
            Self::Directory(a) => a.disconnect().await,
            Self::Queue(a) => a.disconnect().await,
            Self::Cache(a) => a.disconnect().await,
            Self::FileSystem(a) => a.disconnect().await,
            Self::GraphQl(a) => a.disconnect().await,
            Self::WebSocket(a) => a.disconnect().await,
        }
    }

    fn as_http(&self) -> Result<&Arc<dyn HttpAdapter>, ClientError> {
        match self {
            Self::Http(a) => Ok(a),
            other => Err(ClientError::AdapterType {
                required: "HttpAdapter",
                actual: other.kind(),
            }),
        }
    }

    fn as_database(&self) -> Result<&Arc<dyn DatabaseAdapter>, ClientError> {
        match self {
            Self::Database(a) => Ok(a),
            other => Err(ClientError::AdapterType {
                required: "DatabaseAdapter",
                actual: other.kind(),
            }),
        }
    }

    fn as_directory(&self) -> Result<&Arc<dyn DirectoryAdapter>, ClientError> {
        match self {
            Self::Directory(a) => Ok(a),
            other => Err(ClientError::AdapterType {
                required: "DirectoryAdapter",
                actual: other.kind(),
            }),
        }
    }

    fn as_queue(&self) -> Result<&Arc<dyn MessageQueueAdapter>, ClientError> {
        match self {
            Self::Queue(a) => Ok(a),
            other => Err(ClientError::AdapterType {
                required: "MessageQueueAdapter",
                actual: other.kind(),
            }),
        }
    }
}

/// Options bundled for a single HTTP-shaped verb call, avoiding an
/// 8-argument function.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: HashMap<String, String>,
    pub body: Option<Value>,
    pub json: Option<Value>,
    pub headers: HashMap<String, String>,
    pub files: Option<HashMap<String, Vec<u8>>>,
    pub raw_response: bool,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    #[must_use]
    pub fn with_raw_response(mut self, raw: bool) -> Self {
        self.raw_response = raw;
        self
    }
}

/// Builder-constructed, single entry point for the caller. Owns its
/// adapter, auth provider, plugins, and hook lists.
pub struct Client {
    base_url: String,
    adapter: AdapterHandle,
    auth_provider: Arc<dyn AuthProvider>,
    hooks: HookManager,
    plugins: Vec<Arc<dyn Plugin>>,
    timeout: Duration,
    handle: Arc<ClientHandle>,
}

impl Client {
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        }
    }

    async fn run_pipeline(
        &self,
        method: &str,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.build_url(endpoint);
        let body = opts.json.clone().or_else(|| opts.body.clone());

        let mut request = ApiRequest::new(method, url.clone());
        request.query = opts.params;
        request.headers = opts.headers;
        request.body = body;

        if !self.auth_provider.is_authenticated() {
            if let Err(err) = self.auth_provider.authenticate().await {
                let err = ClientError::Authentication(err.to_string());
                return self.recover_from_error(method, &url, err).await;
            }
        }

        let mut request = match self.hooks.process_request(request).await {
            Ok(request) => request,
            Err(err) => return self.recover_from_error(method, &url, err.into()).await,
        };
        for plugin in &self.plugins {
            request = match plugin.before_request(request).await {
                Ok(request) => request,
                Err(err) => return self.recover_from_error(method, &url, err.into()).await,
            };
        }

        let kwargs = RequestKwargs {
            query: request.query.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            timeout: opts.timeout.or(Some(self.timeout)),
            raw_response: opts.raw_response,
            auth: self.auth_provider.get_auth_params(),
        };

        let dispatch = async {
            let adapter = self.adapter.as_http()?;
            let timeout = kwargs.timeout.unwrap_or(self.timeout);
            let raw = tokio::time::timeout(timeout, adapter.request(method, &request.url, kwargs))
                .await
                .map_err(|_| ClientError::Timeout(timeout))??;
            Ok::<RawResponse, ClientError>(raw)
        };

        let mut raw = match dispatch.await {
            Ok(raw) => raw,
            Err(err) => return self.recover_from_error(method, &request.url, err).await,
        };

        for plugin in &self.plugins {
            raw = match plugin.after_request(method, &request.url, raw).await {
                Ok(raw) => raw,
                Err(err) => return self.recover_from_error(method, &request.url, err.into()).await,
            };
        }
        let raw = match self.hooks.process_response(method, &request.url, raw).await {
            Ok(raw) => raw,
            Err(err) => return self.recover_from_error(method, &request.url, err.into()).await,
        };

        if opts.raw_response {
            let mut response = ApiResponse::ok(raw.status, Value::Null).with_headers(raw.headers);
            response.success = raw.status < 400;
            return Ok(response);
        }

        if raw.status == 401 {
            let err = ClientError::Authentication("received 401 from server".to_string());
            return self.recover_from_error(method, &request.url, err).await;
        }

        let mut api = build_api_response(&raw);
        for plugin in &self.plugins {
            api = match plugin.before_response_processed(&raw, api).await {
                Ok(api) => api,
                Err(err) => return self.recover_from_error(method, &request.url, err.into()).await,
            };
        }
        let api = match self.hooks.process_api_response(method, &request.url, api).await {
            Ok(api) => api,
            Err(err) => return self.recover_from_error(method, &request.url, err.into()).await,
        };

        Ok(api)
    }

    async fn recover_from_error(
        &self,
        method: &str,
        url: &str,
        error: ClientError,
    ) -> Result<ApiResponse, ClientError> {
        let message = error.to_string();
        if let Some(response) = self.hooks.handle_error(method, url, &message).await {
            return Ok(response);
        }
        for plugin in &self.plugins {
            if let Some(response) = plugin.on_error(method, url, &message).await {
                return Ok(response);
            }
        }
        Err(error)
    }

    pub async fn get(&self, endpoint: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.run_pipeline("GET", endpoint, opts).await
    }

    pub async fn post(&self, endpoint: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.run_pipeline("POST", endpoint, opts).await
    }

    pub async fn put(&self, endpoint: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.run_pipeline("PUT", endpoint, opts).await
    }

    pub async fn delete(&self, endpoint: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.run_pipeline("DELETE", endpoint, opts).await
    }

    pub async fn patch(&self, endpoint: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.run_pipeline("PATCH", endpoint, opts).await
    }

    /// Requires a `DatabaseAdapter`; fails with `ClientError::AdapterType`
    /// otherwise.
    pub async fn execute_query(
        &self,
        query: &str,
        params: &[Value],
    ) -> Result<Vec<crate::ports::adapter::Row>, ClientError> {
        let adapter = self.adapter.as_database()?;
        Ok(adapter.execute(query, params).await?)
    }

    /// Requires a `DirectoryAdapter`; fails with `ClientError::AdapterType`
    /// otherwise.
    pub async fn search_directory(
        &self,
        base_dn: &str,
        filter: &str,
        attrs: Option<&[&str]>,
        scope: crate::ports::adapter::SearchScope,
    ) -> Result<Vec<crate::ports::adapter::DirectoryEntry>, ClientError> {
        let adapter = self.adapter.as_directory()?;
        Ok(adapter.search(base_dn, filter, attrs, scope).await?)
    }

    /// Requires a `MessageQueueAdapter`; fails with `ClientError::AdapterType`
    /// otherwise.
    pub async fn publish_message(&self, topic: &str, message: Value) -> Result<(), ClientError> {
        let adapter = self.adapter.as_queue()?;
        Ok(adapter.publish(topic, message).await?)
    }

    /// Issues a GET to `ping` with `raw_response: true`; never propagates —
    /// any error is mapped to `(false, "Connection failed: …")`.
    pub async fn test_connection(&self) -> (bool, String) {
        let opts = RequestOptions::new().with_raw_response(true);
        match self.get("ping", opts).await {
            Ok(response) => (
                true,
                format!("Connection successful (status {})", response.status_code),
            ),
            Err(err) => (false, format!("Connection failed: {err}")),
        }
    }

    #[must_use]
    pub fn handle(&self) -> Weak<ClientHandle> {
        Arc::downgrade(&self.handle)
    }

    /// Disconnect the adapter and shut down every plugin, logging (not
    /// propagating) any individual failure.
    pub async fn close(&self) {
        for plugin in &self.plugins {
            plugin.shutdown().await;
        }
        if let Err(err) = self.adapter.disconnect().await {
            tracing::warn!(error = %err, "adapter disconnect failed during client close");
        }
    }
}

fn build_api_response(raw: &RawResponse) -> ApiResponse {
    let success = raw.status < 400;
    let body_text = raw.body_as_str();
    let data: Value = serde_json::from_str(&body_text).unwrap_or_else(|_| Value::String(body_text.into_owned()));

    if success {
        ApiResponse::ok(raw.status, data).with_headers(raw.headers.clone())
    } else {
        let (message, code, details) = extract_error_fields(&data, raw.status);
        let error = WireError::new(ErrorType::ServerError, message.clone(), raw.status)
            .with_detail(message)
            .with_errors(vec![crate::models::ErrorDetail {
                code,
                message: details.unwrap_or_default(),
                field: None,
                details: None,
            }]);
        ApiResponse::failed(raw.status, error).with_headers(raw.headers.clone())
    }
}

fn extract_error_fields(data: &Value, status: u16) -> (String, String, Option<String>) {
    let message = ["error", "message", "msg"]
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"));
    let code = ["code", "error_code"]
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| status.to_string());
    let details = ["details", "error_details"]
        .iter()
        .find_map(|key| data.get(key).map(std::string::ToString::to_string));
    (message, code, details)
}

/// Constructs a `Client`. Accepts either a `Config` or individual
/// overrides; individual overrides win over `Config` fields.
pub struct ClientBuilder {
    config: Config,
    adapter: Option<AdapterHandle>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    hooks: HookManager,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        let mut hooks = HookManager::new();
        hooks.add_request_hook(Arc::new(LoggingHook));
        hooks.add_response_hook(Arc::new(LoggingHook));
        Self {
            config: Config::default(),
            adapter: None,
            auth_provider: None,
            hooks,
            plugins: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let mut builder = Self::new();
        builder.config = config;
        builder
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(crate::config::Secret::new(password.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn adapter(mut self, adapter: AdapterHandle) -> Self {
        self.adapter = Some(adapter);
        self
    }

    #[must_use]
    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn add_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub fn add_request_hook(mut self, hook: Arc<dyn crate::hooks::RequestHook>) -> Self {
        self.hooks.add_request_hook(hook);
        self
    }

    #[must_use]
    pub fn add_response_hook(mut self, hook: Arc<dyn crate::hooks::ResponseHook>) -> Self {
        self.hooks.add_response_hook(hook);
        self
    }

    #[must_use]
    pub fn add_api_response_hook(mut self, hook: Arc<dyn crate::hooks::ApiResponseHook>) -> Self {
        self.hooks.add_api_response_hook(hook);
        self
    }

    #[must_use]
    pub fn add_error_hook(mut self, hook: Arc<dyn crate::hooks::ErrorHook>) -> Self {
        self.hooks.add_error_hook(hook);
        self
    }

    /// Validate configuration, default-construct missing extensions,
    /// connect the adapter, and initialize every plugin.
    pub async fn build(mut self) -> Result<Client, ClientError> {
        self.config
            .normalize()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let base_url = self
            .config
            .url
            .clone()
            .ok_or_else(|| ClientError::Configuration("missing required field: url".to_string()))?;

        let auth_provider = if let Some(provider) = self.auth_provider.take() {
            provider
        } else {
            let username = self.config.username.clone().ok_or_else(|| {
                ClientError::Configuration("missing required field: username".to_string())
            })?;
            let password = self.config.password.clone().ok_or_else(|| {
                ClientError::Configuration("missing required field: password".to_string())
            })?;
            Arc::new(BasicAuthProvider::new(username, password.reveal().to_string()))
        };

        let adapter = self.adapter.take().ok_or_else(|| {
            ClientError::Configuration(
                "no adapter supplied; dcx-core cannot default-construct one without depending \
                 on an adapter crate — pass one explicitly (e.g. a ReqwestHttpAdapter)"
                    .to_string(),
            )
        })?;

        self.hooks
            .add_request_hook(Arc::new(AuthHook::new(auth_provider.clone())));

        adapter.connect().await.map_err(ClientError::from)?;

        let handle = Arc::new(ClientHandle {
            base_url: Some(base_url.clone()),
        });
        for plugin in &self.plugins {
            plugin.initialize(Arc::downgrade(&handle)).await;
        }

        Ok(Client {
            base_url,
            adapter,
            auth_provider,
            hooks: self.hooks,
            plugins: self.plugins,
            timeout: Duration::from_secs(self.config.timeout),
            handle,
        })
    }
}

#[cfg(test)]
mod tests;
