//! Concrete `AuthProvider` implementations with no transport dependency.
//!
//! `BasicAuthProvider` and `TokenAuthProvider` produce only headers/params —
//! they never touch a concrete HTTP library — so they live here rather than
//! in `dcx-http`, letting `client::ClientBuilder::build` default-construct a
//! `BasicAuthProvider` without creating a dependency cycle between
//! `dcx-core` and its adapter crates. `OAuthProvider` is a pure state
//! machine that reaches the token endpoint through an injected
//! `HttpAdapter` reference rather than owning a concrete client.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::ports::auth::{AuthError, AuthOutcome, AuthProvider};
use crate::ports::adapter::HttpAdapter;

/// HTTP Basic Authentication: stores `(username, password)`, no side effects
/// at `authenticate`.
pub struct BasicAuthProvider {
    credentials: Mutex<Option<(String, String)>>,
}

impl BasicAuthProvider {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Mutex::new(Some((username.into(), password.into()))),
        }
    }
}

#[async_trait]
impl AuthProvider for BasicAuthProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError> {
        Ok(AuthOutcome::ok())
    }

    fn is_authenticated(&self) -> bool {
        self.credentials.lock().unwrap().is_some()
    }

    fn get_auth_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// The "auth" key carries `username:password`; the HTTP adapter reads it
    /// and applies its own Basic-auth request builder. `AuthProvider`'s
    /// `HashMap<String, String>` contract can't hold a raw `(user, pass)`
    /// tuple, so the pair is string-encoded here.
    fn get_auth_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some((user, pass)) = self.credentials.lock().unwrap().as_ref() {
            params.insert("auth".to_string(), format!("{user}:{pass}"));
        }
        params
    }

    fn clear_auth(&self) {
        *self.credentials.lock().unwrap() = None;
    }
}

/// Token-based authentication: `{token, token_type, header_name}`.
pub struct TokenAuthProvider {
    token: Mutex<Option<String>>,
    token_type: String,
    header_name: String,
}

impl TokenAuthProvider {
    #[must_use]
    pub fn new(token: Option<String>, token_type: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(token),
            token_type: token_type.into(),
            header_name: header_name.into(),
        }
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()), "Bearer", "Authorization")
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().unwrap() = Some(token.into());
    }

    #[must_use]
    pub fn validate_token(&self, candidate: &str) -> bool {
        self.token.lock().unwrap().as_deref() == Some(candidate)
    }
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError> {
        if self.token.lock().unwrap().is_none() {
            return Err(AuthError::Failed("token must be set before authentication".to_string()));
        }
        Ok(AuthOutcome::ok())
    }

    fn is_authenticated(&self) -> bool {
        self.token.lock().unwrap().is_some()
    }

    fn get_auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = self.token.lock().unwrap().as_ref() {
            headers.insert(
                self.header_name.clone(),
                format!("{} {}", self.token_type, token),
            );
        }
        headers
    }

    fn get_auth_params(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn clear_auth(&self) {
        *self.token.lock().unwrap() = None;
    }
}

struct OAuthState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expiry: Option<SystemTime>,
}

/// OAuth2 client-credentials-shaped provider. `refresh` drives the grant
/// through an injected `HttpAdapter` so this type carries no transport
/// dependency of its own.
pub struct OAuthProvider {
    client_id: String,
    client_secret: String,
    token_url: String,
    scope: Option<String>,
    redirect_uri: Option<String>,
    state: Mutex<OAuthState>,
    refresh_lock: tokio::sync::Mutex<()>,
    adapter: std::sync::Arc<dyn HttpAdapter>,
}

impl OAuthProvider {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        adapter: std::sync::Arc<dyn HttpAdapter>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            scope: None,
            redirect_uri: None,
            state: Mutex::new(OAuthState {
                access_token: None,
                refresh_token: None,
                expiry: None,
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
            adapter,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Exchange `client_id`/`client_secret` for an access token, serialized
    /// against concurrent callers via `refresh_lock` (single-flight).
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        {
            let state = self.state.lock().unwrap();
            if let (Some(_), Some(expiry)) = (&state.access_token, state.expiry) {
                if expiry > SystemTime::now() {
                    return Ok(());
                }
            }
        }
        let mut body = serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": self.client_id,
            "client_secret": self.client_secret,
        });
        if let Some(scope) = &self.scope {
            body["scope"] = serde_json::Value::String(scope.clone());
        }
        let kwargs = crate::ports::adapter::RequestKwargs {
            body: Some(body),
            ..Default::default()
        };
        let response = self
            .adapter
            .request("POST", &self.token_url, kwargs)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        let parsed: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| AuthError::RefreshFailed(format!("invalid token response: {e}")))?;
        let access_token = parsed
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::RefreshFailed("response missing access_token".to_string()))?
            .to_string();
        let expires_in = parsed.get("expires_in").and_then(serde_json::Value::as_u64).unwrap_or(3600);
        let mut state = self.state.lock().unwrap();
        state.access_token = Some(access_token);
        state.refresh_token = parsed
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| state.refresh_token.clone());
        state.expiry = Some(SystemTime::now() + Duration::from_secs(expires_in));
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for OAuthProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError> {
        self.refresh().await?;
        Ok(AuthOutcome::ok())
    }

    fn is_authenticated(&self) -> bool {
        let state = self.state.lock().unwrap();
        match (&state.access_token, state.expiry) {
            (Some(_), Some(expiry)) => expiry > SystemTime::now(),
            _ => false,
        }
    }

    fn get_auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.state.lock().unwrap().access_token {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        headers
    }

    fn get_auth_params(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn clear_auth(&self) {
        let mut state = self.state.lock().unwrap();
        state.access_token = None;
        state.refresh_token = None;
        state.expiry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_auth_params_encode_pair() {
        let provider = BasicAuthProvider::new("bob", "secret");
        assert!(provider.is_authenticated());
        assert_eq!(provider.get_auth_params().get("auth").unwrap(), "bob:secret");
        assert!(provider.get_auth_headers().is_empty());
        provider.clear_auth();
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn token_auth_rejects_authenticate_without_token() {
        let provider = TokenAuthProvider::new(None, "Bearer", "Authorization");
        assert!(provider.authenticate().await.is_err());
    }

    #[tokio::test]
    async fn token_auth_headers_use_type_and_name() {
        let provider = TokenAuthProvider::bearer("abc123");
        let headers = provider.get_auth_headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer abc123");
        assert!(provider.validate_token("abc123"));
        assert!(!provider.validate_token("wrong"));
    }
}
