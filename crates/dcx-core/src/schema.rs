//! API entity schema definitions and on-disk schema caching.
//!
//! Rust has no equivalent to runtime class synthesis, and none is needed
//! here: callers pair a `SchemaDefinition` with a concrete
//! `entity::Entity<T>` where `T` is a statically known `serde::Deserialize`
//! type instead of a dynamically generated model class.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Description of a single field within a `SchemaDefinition`.
pub type FieldDefinition = HashMap<String, Value>;

/// Schema for an API entity: field definitions, required fields, and
/// metadata, round-trippable to JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    pub description: String,
    pub fields: HashMap<String, FieldDefinition>,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl SchemaDefinition {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: HashMap<String, FieldDefinition>,
        required_fields: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fields,
            required_fields,
        }
    }

    /// Render as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut schema = serde_json::json!({
            "type": "object",
            "title": self.name,
            "description": self.description,
            "properties": self.fields,
        });
        if !self.required_fields.is_empty() {
            schema["required"] = serde_json::json!(self.required_fields);
        }
        schema
    }

    /// Parse a `SchemaDefinition` back out of a JSON Schema object.
    pub fn from_json_schema(value: &Value, fallback_name: &str) -> Self {
        let name = value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(fallback_name)
            .to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let fields = value
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(k, v)| {
                        let field = v
                            .as_object()
                            .map(|m| m.clone().into_iter().collect())
                            .unwrap_or_default();
                        (k.clone(), field)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let required_fields = value
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name,
            description,
            fields,
            required_fields,
        }
    }

    fn filename(&self) -> String {
        format!("{}.schema.json", self.name.to_lowercase())
    }

    /// Write this schema as `<directory>/<name>.schema.json`.
    pub fn save(&self, directory: &Path) -> Result<PathBuf, CoreError> {
        std::fs::create_dir_all(directory)
            .map_err(|e| CoreError::Other(format!("cannot create schema directory: {e}")))?;
        let path = directory.join(self.filename());
        let body = serde_json::to_string_pretty(&self.to_json_schema())
            .map_err(|e| CoreError::Other(format!("cannot serialize schema: {e}")))?;
        std::fs::write(&path, body)
            .map_err(|e| CoreError::Other(format!("cannot write schema file: {e}")))?;
        Ok(path)
    }

    /// Load a schema from a JSON Schema file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Other(format!("schema file not found: {}: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| CoreError::Other(format!("invalid schema format: {e}")))?;
        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("schema")
            .trim_end_matches(".schema")
            .to_string();
        Ok(Self::from_json_schema(&value, &fallback))
    }
}

/// Caches `SchemaDefinition`s on disk under a single directory, keyed by
/// lowercased name.
pub struct SchemaManager {
    cache_dir: PathBuf,
    schemas: HashMap<String, SchemaDefinition>,
}

impl SchemaManager {
    /// Open (and create, if missing) a schema cache directory, eagerly
    /// loading every `*.schema.json` file already present.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| CoreError::Other(format!("cannot create schema cache dir: {e}")))?;
        let mut manager = Self {
            cache_dir,
            schemas: HashMap::new(),
        };
        manager.load_cached();
        Ok(manager)
    }

    fn load_cached(&mut self) {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match SchemaDefinition::load(&path) {
                Ok(schema) => {
                    self.schemas.insert(schema.name.to_lowercase(), schema);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to load cached schema");
                }
            }
        }
    }

    /// Look up a schema by name, trying the in-memory cache then disk.
    pub fn get_schema(&mut self, name: &str) -> Option<&SchemaDefinition> {
        let key = name.to_lowercase();
        if self.schemas.contains_key(&key) {
            return self.schemas.get(&key);
        }
        let path = self.cache_dir.join(format!("{key}.schema.json"));
        if path.exists() {
            if let Ok(schema) = SchemaDefinition::load(&path) {
                self.schemas.insert(key.clone(), schema);
                return self.schemas.get(&key);
            }
        }
        None
    }

    /// Register a schema in memory and persist it to the cache directory.
    pub fn put_schema(&mut self, schema: SchemaDefinition) -> Result<(), CoreError> {
        schema.save(&self.cache_dir)?;
        self.schemas.insert(schema.name.to_lowercase(), schema);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDefinition {
        let mut fields = HashMap::new();
        fields.insert(
            "id".to_string(),
            HashMap::from([("type".to_string(), Value::String("integer".into()))]),
        );
        fields.insert(
            "name".to_string(),
            HashMap::from([("type".to_string(), Value::String("string".into()))]),
        );
        SchemaDefinition::new("User", "A user", fields, vec!["id".to_string()])
    }

    #[test]
    fn round_trips_through_json_schema() {
        let schema = sample();
        let json = schema.to_json_schema();
        let parsed = SchemaDefinition::from_json_schema(&json, "fallback");
        assert_eq!(parsed.name, "User");
        assert_eq!(parsed.required_fields, vec!["id".to_string()]);
        assert_eq!(parsed.fields.len(), 2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let schema = sample();
        let path = schema.save(dir.path()).unwrap();
        assert!(path.ends_with("user.schema.json"));
        let loaded = SchemaDefinition::load(&path).unwrap();
        assert_eq!(loaded.name, "User");
    }

    #[test]
    fn manager_caches_put_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SchemaManager::new(dir.path()).unwrap();
        manager.put_schema(sample()).unwrap();
        assert!(manager.get_schema("user").is_some());
        assert!(manager.get_schema("missing").is_none());
    }
}
