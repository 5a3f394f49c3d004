//! Default HTTP adapter for `dcx`, built on `reqwest`.
//!
//! Re-exports `dcx_core::auth`'s transport-agnostic providers alongside this
//! crate's own HTTP-specific wiring, so callers building an HTTP-backed
//! `Client` don't need a second `use` for auth.

mod adapter;
mod error;

pub use adapter::ReqwestHttpAdapter;
pub use dcx_core::auth::{BasicAuthProvider, OAuthProvider, TokenAuthProvider};
pub use error::HttpAdapterError;
