//! SQL adapter for `dcx`, built on `sqlx` over SQLite.

mod adapter;
mod auth;
mod error;
mod row;

pub use adapter::{SqliteTransaction, SqlxDatabaseAdapter};
pub use auth::{DatabaseAuthProvider, DatabaseCredentials};
pub use error::DbAdapterError;
