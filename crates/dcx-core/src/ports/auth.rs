//! Authentication provider trait.
//!
//! One trait, five methods, shared by every auth variant (Basic, Token,
//! OAuth, Ldap, Database). Each variant's own crate supplies the
//! implementation; `dcx-core` only fixes the contract.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    Failed(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
}

/// Outcome of `AuthProvider::authenticate`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub authenticated: bool,
    pub message: Option<String>,
}

impl AuthOutcome {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            authenticated: true,
            message: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            message: Some(message.into()),
        }
    }
}

/// Policy that supplies credentials — request headers and/or connection
/// parameters — and can refresh them.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError>;
    fn is_authenticated(&self) -> bool;
    fn get_auth_headers(&self) -> HashMap<String, String>;
    fn get_auth_params(&self) -> HashMap<String, String>;
    fn clear_auth(&self);
}
