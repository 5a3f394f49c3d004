//! Connection-parameter auth provider for the SQL adapter.
//!
//! Unlike [`dcx_core::auth::BasicAuthProvider`], `authenticate` here never
//! dials anything — the real bind happens when `SqlxDatabaseAdapter::connect`
//! opens the pool. This provider only holds and reports the connection
//! parameters the adapter needs at that point.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use dcx_core::ports::auth::{AuthError, AuthOutcome, AuthProvider};

#[derive(Debug, Clone)]
pub struct DatabaseCredentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

pub struct DatabaseAuthProvider {
    credentials: Mutex<Option<DatabaseCredentials>>,
}

impl DatabaseAuthProvider {
    #[must_use]
    pub fn new(credentials: DatabaseCredentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl AuthProvider for DatabaseAuthProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, AuthError> {
        if self.credentials.lock().unwrap().is_none() {
            return Err(AuthError::Failed("database credentials were cleared".to_string()));
        }
        Ok(AuthOutcome::ok())
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
            ("host".to_string(), creds.host.clone()),
            ("port".to_string(), creds.port.to_string()),
            ("database".to_string(), creds.database.clone()),
            ("username".to_string(), creds.username.clone()),
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

    fn creds() -> DatabaseCredentials {
        DatabaseCredentials {
            host: "db.internal".to_string(),
            port: 5432,
            database: "widgets".to_string(),
            username: "svc".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn params_carry_connection_fields() {
        let provider = DatabaseAuthProvider::new(creds());
        let params = provider.get_auth_params();
        assert_eq!(params.get("host").unwrap(), "db.internal");
        assert_eq!(params.get("port").unwrap(), "5432");
        assert!(provider.get_auth_headers().is_empty());
    }

    #[tokio::test]
    async fn clearing_credentials_fails_authenticate() {
        let provider = DatabaseAuthProvider::new(creds());
        provider.clear_auth();
        assert!(!provider.is_authenticated());
        assert!(provider.authenticate().await.is_err());
    }
}
