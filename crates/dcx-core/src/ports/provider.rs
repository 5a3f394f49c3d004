//! Data / Schema / Transform / Config provider contracts.
//!
//! These are the remaining extension axis from the component table: uniform
//! CRUD over arbitrary back-ends, schema definitions and validation, and
//! data-shape transforms. Concrete providers are out of scope — the same
//! "conforming implementation" rule applies as for protocol adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::schema::SchemaDefinition;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Uniform CRUD over an arbitrary back-end, keyed by opaque string ids.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get(&self, resource: &str, id: &str) -> Result<Value, ProviderError>;
    async fn list(&self, resource: &str) -> Result<Vec<Value>, ProviderError>;
    async fn create(&self, resource: &str, data: Value) -> Result<Value, ProviderError>;
    async fn update(&self, resource: &str, id: &str, data: Value) -> Result<Value, ProviderError>;
    async fn delete(&self, resource: &str, id: &str) -> Result<(), ProviderError>;
}

/// Supplies and validates schema definitions for named resources.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn get_schema(&self, resource: &str) -> Result<SchemaDefinition, ProviderError>;
    fn validate(&self, schema: &SchemaDefinition, data: &Value) -> Result<(), ProviderError>;
}

/// Data-shape transform between two representations of the same resource.
pub trait TransformProvider: Send + Sync {
    fn transform(&self, resource: &str, data: Value) -> Result<Value, ProviderError>;
}

/// Supplies raw configuration key/value pairs from an external source
/// (secret manager, remote config service, …), layered beneath
/// `config::ConfigLoader`'s source chain.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}
