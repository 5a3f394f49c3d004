//! In-process message queue adapter for `dcx`, built on `tokio::sync`.

mod adapter;

pub use adapter::InProcessMessageQueueAdapter;
