//! Port definitions (trait abstractions) for every extension axis.
//!
//! Ports define the interfaces the `Client` pipeline expects from
//! infrastructure. They contain no implementation details — no `reqwest`,
//! `sqlx`, or `ldap3` types in any signature — so `dcx-core` never depends
//! on an adapter crate; adapter crates depend on `dcx-core`.

pub mod adapter;
pub mod auth;
pub mod provider;

pub use adapter::{
    AdapterError, CacheAdapter, DatabaseAdapter, DatabaseTransaction, DirEntry, DirectoryAdapter,
    DirectoryEntry, FileSystemAdapter, GraphQlAdapter, GraphQlOperation, GraphQlResponse,
    HttpAdapter, MessageQueueAdapter, ModifyOp, ProtocolAdapter, RawResponse, RequestKwargs, Row,
    SearchScope, WebSocketAdapter,
};
pub use auth::{AuthError, AuthOutcome, AuthProvider};
pub use provider::{ConfigProvider, DataProvider, ProviderError, SchemaProvider, TransformProvider};
