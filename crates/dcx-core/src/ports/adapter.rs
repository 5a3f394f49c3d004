//! Protocol adapter trait family.
//!
//! Each trait here is one row of the protocol-adapter table: a uniform
//! connect/disconnect lifecycle plus a small, protocol-specific set of
//! primitives. Concrete implementations (the default `reqwest`-backed HTTP
//! adapter, the `sqlx`-backed database adapter, …) live in their own crates
//! and depend on `dcx-core`, never the other way around.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Error surfaced by any protocol adapter, after the adapter crate maps its
/// own local error type at the trait boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("adapter is not connected")]
    NotConnected,

    #[error("{0}")]
    Other(String),
}

/// Raw transport-level response, before the `Client` builds an `ApiResponse`
/// out of it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn body_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Options carried alongside one HTTP-shaped request primitive.
#[derive(Debug, Clone, Default)]
pub struct RequestKwargs {
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<std::time::Duration>,
    pub raw_response: bool,
    /// Connection-level credentials from `AuthProvider::get_auth_params`
    /// (e.g. Basic auth's `"auth": "user:pass"`), for adapters that need
    /// something other than a header to authenticate.
    pub auth: HashMap<String, String>,
}

/// Per-technology transport adapter: the base lifecycle every adapter family
/// shares.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    async fn connect(&self) -> Result<(), AdapterError>;
    async fn disconnect(&self) -> Result<(), AdapterError>;
    fn is_connected(&self) -> bool;
}

/// HTTP request primitive: SSL verification and timeout are carried in
/// `RequestKwargs`; retry/backoff is implemented inside the adapter.
#[async_trait]
pub trait HttpAdapter: ProtocolAdapter {
    async fn request(
        &self,
        method: &str,
        url: &str,
        kwargs: RequestKwargs,
    ) -> Result<RawResponse, AdapterError>;
}

/// One row returned by a SQL `execute`/`execute_write` call.
pub type Row = HashMap<String, Value>;

/// Scoped database transaction: callers must explicitly `commit()` or
/// `rollback()` — Rust has no scope-exit hook with access to success/failure,
/// so "commit on success, roll back on failure" is an explicit consuming
/// method instead of implicit `Drop`-based behavior.
#[async_trait]
pub trait DatabaseTransaction: Send + Sync {
    async fn execute(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>, AdapterError>;
    async fn execute_write(&mut self, query: &str, params: &[Value]) -> Result<u64, AdapterError>;
    async fn commit(self: Box<Self>) -> Result<(), AdapterError>;
    async fn rollback(self: Box<Self>) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait DatabaseAdapter: ProtocolAdapter {
    async fn execute(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, AdapterError>;
    async fn execute_write(&self, query: &str, params: &[Value]) -> Result<u64, AdapterError>;
    async fn transaction(&self) -> Result<Box<dyn DatabaseTransaction>, AdapterError>;
}

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Base,
    OneLevel,
    Subtree,
}

/// One directory entry: a DN plus attribute-name to byte-value-list pairs.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<Vec<u8>>>,
}

/// LDAP modify operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOp {
    Add,
    Delete,
    Replace,
}

#[async_trait]
pub trait DirectoryAdapter: ProtocolAdapter {
    async fn search(
        &self,
        base_dn: &str,
        filter: &str,
        attrs: Option<&[&str]>,
        scope: SearchScope,
    ) -> Result<Vec<DirectoryEntry>, AdapterError>;

    async fn add(
        &self,
        dn: &str,
        attrs: &HashMap<String, Vec<Vec<u8>>>,
    ) -> Result<(), AdapterError>;

    async fn modify(
        &self,
        dn: &str,
        changes: &HashMap<String, (ModifyOp, Vec<Vec<u8>>)>,
    ) -> Result<(), AdapterError>;

    async fn delete(&self, dn: &str) -> Result<(), AdapterError>;
}

/// Callback invoked for every message a `MessageQueueAdapter` subscription
/// receives.
pub type MessageCallback = Box<dyn Fn(Value) + Send + Sync>;

#[async_trait]
pub trait MessageQueueAdapter: ProtocolAdapter {
    async fn publish(&self, topic: &str, message: Value) -> Result<(), AdapterError>;
    async fn subscribe(&self, topic: &str, callback: MessageCallback) -> Result<(), AdapterError>;
    async fn unsubscribe(&self, topic: &str) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait CacheAdapter: ProtocolAdapter {
    async fn get(&self, key: &str) -> Result<Option<Value>, AdapterError>;
    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<std::time::Duration>,
    ) -> Result<(), AdapterError>;
    async fn delete(&self, key: &str) -> Result<(), AdapterError>;
    async fn clear(&self) -> Result<(), AdapterError>;
}

/// Directory listing entry produced by `FileSystemAdapter::list_directory`.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
}

#[async_trait]
pub trait FileSystemAdapter: ProtocolAdapter {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, AdapterError>;
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), AdapterError>;
    async fn delete_file(&self, path: &str) -> Result<(), AdapterError>;
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, AdapterError>;
    async fn create_directory(&self, path: &str) -> Result<(), AdapterError>;
    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), AdapterError>;
    async fn exists(&self, path: &str) -> Result<bool, AdapterError>;
    async fn is_file(&self, path: &str) -> Result<bool, AdapterError>;
    async fn is_directory(&self, path: &str) -> Result<bool, AdapterError>;
}

/// Result of a single GraphQL operation.
#[derive(Debug, Clone)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    pub errors: Vec<Value>,
}

/// One operation in a GraphQL batch.
#[derive(Debug, Clone)]
pub struct GraphQlOperation {
    pub query: String,
    pub variables: Option<Value>,
    pub operation_name: Option<String>,
}

pub type GraphQlCallback = Box<dyn Fn(GraphQlResponse) + Send + Sync>;

#[async_trait]
pub trait GraphQlAdapter: ProtocolAdapter {
    async fn query(
        &self,
        query: &str,
        variables: Option<Value>,
        operation_name: Option<&str>,
    ) -> Result<GraphQlResponse, AdapterError>;

    /// Rejects `mutation` strings that do not start with the `mutation`
    /// keyword.
    async fn mutation(
        &self,
        mutation: &str,
        variables: Option<Value>,
        operation_name: Option<&str>,
    ) -> Result<GraphQlResponse, AdapterError>;

    async fn execute_batch(
        &self,
        operations: &[GraphQlOperation],
    ) -> Result<Vec<GraphQlResponse>, AdapterError>;

    async fn introspect(&self) -> Result<Value, AdapterError>;

    async fn subscribe(
        &self,
        query: &str,
        variables: Option<Value>,
        callback: GraphQlCallback,
    ) -> Result<String, AdapterError>;

    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), AdapterError>;
}

pub type WsMessageCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;
pub type WsErrorCallback = Box<dyn Fn(AdapterError) + Send + Sync>;
pub type WsCloseCallback = Box<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait WebSocketAdapter: ProtocolAdapter {
    async fn connect_websocket(&self, url: &str) -> Result<(), AdapterError>;
    async fn disconnect_websocket(&self) -> Result<(), AdapterError>;
    async fn send(&self, data: Vec<u8>) -> Result<(), AdapterError>;
    async fn receive(
        &self,
        timeout: Option<std::time::Duration>,
    ) -> Result<Vec<u8>, AdapterError>;
    fn on_message(&self, callback: WsMessageCallback);
    fn on_error(&self, callback: WsErrorCallback);
    fn on_close(&self, callback: WsCloseCallback);
}
