//! In-process TTL cache adapter for `dcx`, built on `moka`.

mod adapter;

pub use adapter::MokaCacheAdapter;
