//! Bind-DN auth provider for the directory adapter.
//!
//! `authenticate` here doesn't open a connection itself — the real bind
//! happens in [`crate::Ldap3DirectoryAdapter::connect`] — it only confirms a
//! bind DN and password are set. `AuthOutcome` has no dedicated `user`
//! field, so a successful outcome carries the bind DN in `message` instead.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use dcx_core::ports::auth::{AuthError, AuthOutcome, AuthProvider};

struct LdapCredentials {
    bind_dn: String,
    password: String,
}

pub struct LdapAuthProvider {
    server_url: String,
    ssl: bool,
    port: u16,
    credentials: Mutex<Option<LdapCredentials>>,
}

impl LdapAuthProvider {
    #[must_use]
    pub fn new(server_url: impl Into<String>, bind_dn: impl Into<String>, password: impl Into<String>, ssl: bool, port: Option<u16>) -> Self {
        Self {
            server_url: server_url.into(),
            ssl,
            port: port.unwrap_or(if ssl { 636 } else { 389 }),
            credentials: Mutex::new(Some(LdapCredentials {
                bind_dn: bind_dn.into(),
                password: password.into(),
            })),
        }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// A token is "valid" for LDAP iff it is exactly the bind DN.
    #[must_use]
    pub fn validate_token(&self, candidate: &str) -> bool {
        self.credentials
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|creds| creds.bind_dn == candidate)
    }
}

#[async_trait]
impl AuthProvider for LdapAuthProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError> {
        let guard = self.credentials.lock().unwrap();
        match guard.as_ref() {
            Some(creds) => Ok(AuthOutcome {
                authenticated: true,
                message: Some(creds.bind_dn.clone()),
            }),
            None => Ok(AuthOutcome::failed("no bind DN configured")),
        }
    }

    fn is_authenticated(&self) -> bool {
        self.credentials.lock().unwrap().is_some()
    }

    fn get_auth_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn get_auth_params(&self) -> HashMap<String, String> {
        let guard = self.credentials.lock().unwrap();
        let Some(creds) = guard.as_ref() else {
            return HashMap::new();
        };
        HashMap::from([
            ("server_url".to_string(), self.server_url.clone()),
            ("port".to_string(), self.port.to_string()),
            ("ssl".to_string(), self.ssl.to_string()),
            ("bind_dn".to_string(), creds.bind_dn.clone()),
            ("password".to_string(), creds.password.clone()),
        ])
    }

    fn clear_auth(&self) {
        *self.credentials.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_to_636_over_ssl() {
        let provider = LdapAuthProvider::new("dc.example.com", "cn=admin,dc=example,dc=com", "secret", true, None);
        assert_eq!(provider.port(), 636);
    }

    #[test]
    fn port_defaults_to_389_without_ssl() {
        let provider = LdapAuthProvider::new("dc.example.com", "cn=admin,dc=example,dc=com", "secret", false, None);
        assert_eq!(provider.port(), 389);
    }

    #[test]
    fn explicit_port_overrides_default() {
        let provider = LdapAuthProvider::new("dc.example.com", "cn=admin,dc=example,dc=com", "secret", true, Some(10636));
        assert_eq!(provider.port(), 10636);
    }

    #[test]
    fn validate_token_only_accepts_exact_bind_dn() {
        let provider = LdapAuthProvider::new("dc.example.com", "cn=admin,dc=example,dc=com", "secret", true, None);
        assert!(provider.validate_token("cn=admin,dc=example,dc=com"));
        assert!(!provider.validate_token("cn=other,dc=example,dc=com"));
    }

    #[tokio::test]
    async fn authenticate_reports_bind_dn_as_message() {
        let provider = LdapAuthProvider::new("dc.example.com", "cn=admin,dc=example,dc=com", "secret", true, None);
        let outcome = provider.authenticate().await.unwrap();
        assert!(outcome.authenticated);
        assert_eq!(outcome.message.as_deref(), Some("cn=admin,dc=example,dc=com"));
    }
}
