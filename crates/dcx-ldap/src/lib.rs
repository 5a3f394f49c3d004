//! LDAP directory adapter for `dcx`, built on `ldap3`.

mod adapter;
mod auth;
mod error;

pub use adapter::Ldap3DirectoryAdapter;
pub use auth::LdapAuthProvider;
pub use error::LdapAdapterError;
