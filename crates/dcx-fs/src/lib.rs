//! Filesystem adapter for `dcx`, built on `tokio::fs`.

mod adapter;
mod error;

pub use adapter::TokioFileSystemAdapter;
pub use error::FsAdapterError;
