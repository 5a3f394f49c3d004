//! Generic CRUD surface over a resource, plus a process-wide cache of
//! configured entities keyed by `(resource_name, base_path)`.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use futures::stream::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::{Client, ClientError, RequestOptions};
use crate::pagination::{self, Strategy};

use super::descriptor::EntityDescriptor;
use super::sort::{SortDirection, SortSpec};

/// Options accepted by [`Entity::list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: HashMap<String, String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub params: HashMap<String, String>,
}

/// Options accepted by [`Entity::paginate`].
#[derive(Debug, Clone, Default)]
pub struct PaginateOptions {
    pub filters: HashMap<String, String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub page_size: Option<u64>,
    pub max_pages: Option<u64>,
    pub strategy: Option<Strategy>,
    pub params: HashMap<String, String>,
}

/// A typed CRUD surface over one REST resource. Cheaply cloneable — it
/// only holds an `Arc<Client>` and a descriptor.
#[derive(Clone)]
pub struct Entity<T> {
    client: Arc<Client>,
    descriptor: EntityDescriptor,
    base_path: String,
    _model: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("descriptor", &self.descriptor)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned + Serialize + Send + 'static> Entity<T> {
    pub(crate) fn new(client: Arc<Client>, descriptor: EntityDescriptor, base_path: &str) -> Result<Self, ClientError> {
        if descriptor.resource_name.is_empty() {
            return Err(ClientError::Request("resource_name must be specified for entity".to_string()));
        }
        Ok(Self {
            client,
            descriptor,
            base_path: base_path.trim_end_matches('/').to_string(),
            _model: PhantomData,
        })
    }

    /// `{base_path}/{resource_name}`, or just `{resource_name}` with no base path.
    #[must_use]
    pub fn resource_path(&self) -> String {
        if self.base_path.is_empty() {
            self.descriptor.resource_name.clone()
        } else {
            format!("{}/{}", self.base_path, self.descriptor.resource_name)
        }
    }

    fn entity_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource_path(), id)
    }

    fn apply_sort(&self, params: &mut HashMap<String, String>, sort_by: Option<&str>, direction: SortDirection) {
        let field = sort_by.or(self.descriptor.default_sort_field.as_deref());
        if let Some(field) = field {
            params.extend(SortSpec::new(field, direction).to_params());
        }
    }

    fn decode(value: Value) -> Result<T, ClientError> {
        serde_json::from_value(value)
            .map_err(|err| ClientError::Request(format!("entity does not match expected shape: {err}")))
    }

    pub async fn get(&self, id: &str) -> Result<T, ClientError> {
        let response = self.client.get(&self.entity_path(id), RequestOptions::new()).await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to retrieve {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Self::decode(response.data)
    }

    pub async fn list(&self, options: ListOptions) -> Result<Vec<T>, ClientError> {
        let mut params = options.params;
        params.extend(options.filters);
        self.apply_sort(&mut params, options.sort_by.as_deref(), options.sort_direction);
        if let Some(limit) = options.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        if let Some(offset) = options.offset {
            params.insert("offset".to_string(), offset.to_string());
        }

        let response = self
            .client
            .get(&self.resource_path(), RequestOptions::new().with_params(params))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to list {} entities: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        let items = pagination::extract_items(&response.data, self.descriptor.pagination.data_key.as_deref())?;
        items.into_iter().map(Self::decode).collect()
    }

    /// Stream every entity across every page, honoring filters/sorting and
    /// the resource's configured (or overridden) pagination strategy.
    pub fn paginate(&self, options: PaginateOptions) -> impl Stream<Item = Result<T, ClientError>> {
        let mut params = options.params;
        params.extend(options.filters);
        self.apply_sort(&mut params, options.sort_by.as_deref(), options.sort_direction);

        let mut config = self.descriptor.pagination.clone();
        config.params = params;
        if let Some(page_size) = options.page_size {
            config.page_size = page_size;
        }
        if options.max_pages.is_some() {
            config.max_pages = options.max_pages;
        }

        let strategy = options.strategy.unwrap_or(Strategy::Offset);
        let raw = pagination::paginate(self.client.clone(), self.resource_path(), strategy, config);
        pagination::into_typed::<T>(raw)
    }

    pub async fn create(&self, data: &T) -> Result<T, ClientError> {
        let payload = serde_json::to_value(data)
            .map_err(|err| ClientError::Request(format!("failed to encode entity: {err}")))?;
        let response = self
            .client
            .post(&self.resource_path(), RequestOptions::new().with_json(payload))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to create {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Self::decode(response.data)
    }

    pub async fn update(&self, id: &str, data: &T) -> Result<T, ClientError> {
        let payload = serde_json::to_value(data)
            .map_err(|err| ClientError::Request(format!("failed to encode entity: {err}")))?;
        let response = self
            .client
            .put(&self.entity_path(id), RequestOptions::new().with_json(payload))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to update {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Self::decode(response.data)
    }

    pub async fn partial_update(&self, id: &str, patch: Value) -> Result<T, ClientError> {
        let response = self
            .client
            .patch(&self.entity_path(id), RequestOptions::new().with_json(patch))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to partially update {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Self::decode(response.data)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self.client.delete(&self.entity_path(id), RequestOptions::new()).await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to delete {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Ok(())
    }

    pub async fn bulk_create(&self, items: &[T]) -> Result<Vec<T>, ClientError> {
        let payload = serde_json::to_value(items)
            .map_err(|err| ClientError::Request(format!("failed to encode entities: {err}")))?;
        let endpoint = format!("{}/bulk", self.resource_path());
        let response = self
            .client
            .post(&endpoint, RequestOptions::new().with_json(payload))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to bulk create {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        let items = response.data.as_array().cloned().unwrap_or_default();
        items.into_iter().map(Self::decode).collect()
    }

    pub async fn bulk_update(&self, items: &[(String, T)]) -> Result<Vec<T>, ClientError> {
        let payload: Vec<Value> = items
            .iter()
            .map(|(id, data)| {
                let mut value = serde_json::to_value(data).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut value {
                    map.insert(self.descriptor.id_field.clone(), Value::String(id.clone()));
                }
                value
            })
            .collect();
        let endpoint = format!("{}/bulk", self.resource_path());
        let response = self
            .client
            .put(&endpoint, RequestOptions::new().with_json(Value::Array(payload)))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to bulk update {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        let items = response.data.as_array().cloned().unwrap_or_default();
        items.into_iter().map(Self::decode).collect()
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), ClientError> {
        let endpoint = format!("{}/bulk", self.resource_path());
        let payload = serde_json::json!({ "ids": ids });
        let response = self
            .client
            .delete(&endpoint, RequestOptions::new().with_json(payload))
            .await?;
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to bulk delete {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Call a non-CRUD action on either the collection or one member,
    /// bypassing the typed decode path since a custom action's response
    /// shape is arbitrary.
    pub async fn custom_action(
        &self,
        action: &str,
        id: Option<&str>,
        method: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = match id {
            Some(id) => format!("{}/{}/{action}", self.resource_path(), id),
            None => format!("{}/{action}", self.resource_path()),
        };
        let opts = match body {
            Some(body) => RequestOptions::new().with_json(body),
            None => RequestOptions::new(),
        };
        let response = match method.to_ascii_uppercase().as_str() {
            "GET" => self.client.get(&url, opts).await?,
            "POST" => self.client.post(&url, opts).await?,
            "PUT" => self.client.put(&url, opts).await?,
            "PATCH" => self.client.patch(&url, opts).await?,
            "DELETE" => self.client.delete(&url, opts).await?,
            other => return Err(ClientError::Request(format!("unsupported HTTP method: {other}"))),
        };
        if !response.success {
            return Err(ClientError::Request(format!(
                "failed to execute '{action}' on {}: {}",
                self.descriptor.resource_name,
                response.error.map(|e| e.detail).unwrap_or_default()
            )));
        }
        Ok(response.data)
    }
}

/// Caches configured `Entity<T>` instances by `(resource_name, base_path)`
/// so repeated lookups for the same resource reuse one descriptor.
pub struct EntityManager {
    client: Arc<Client>,
    cache: RwLock<HashMap<(String, String), EntityDescriptor>>,
}

impl EntityManager {
    #[must_use]
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or overwrite) the descriptor for a resource name.
    pub fn register(&self, descriptor: EntityDescriptor, base_path: &str) {
        let key = (descriptor.resource_name.clone(), base_path.to_string());
        self.cache.write().unwrap().insert(key, descriptor);
    }

    /// Build an `Entity<T>` for a previously-registered resource, or fall
    /// back to a bare descriptor with only the resource name set.
    pub fn entity<T: DeserializeOwned + Serialize + Send + 'static>(
        &self,
        resource_name: &str,
        base_path: &str,
    ) -> Result<Entity<T>, ClientError> {
        let key = (resource_name.to_string(), base_path.to_string());
        let descriptor = self
            .cache
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| EntityDescriptor::new(resource_name));
        Entity::new(self.client.clone(), descriptor, base_path)
    }

    /// Run a filterless, sortless custom action against a resource without
    /// constructing a typed `Entity<T>` first.
    pub async fn execute_action(
        &self,
        resource_name: &str,
        action: &str,
        id: Option<&str>,
        method: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let entity = self.entity::<Value>(resource_name, "")?;
        entity.custom_action(action, id, method, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AdapterHandle, ClientBuilder};
    use crate::ports::adapter::{AdapterError, HttpAdapter, ProtocolAdapter, RawResponse, RequestKwargs};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        name: String,
    }

    struct FakeAdapter {
        responses: StdMutex<Vec<RawResponse>>,
    }

    #[async_trait]
    impl ProtocolAdapter for FakeAdapter {
        async fn connect(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn disconnect(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        fn is_connected(&self) -> bool {
            true
        }
    }

    #[async_trait]
    impl HttpAdapter for FakeAdapter {
        async fn request(&self, _method: &str, _url: &str, _kwargs: RequestKwargs) -> Result<RawResponse, AdapterError> {
            let mut responses = self.responses.lock().unwrap();
            Ok(responses.remove(0))
        }
    }

    fn response(body: Value) -> RawResponse {
        RawResponse {
            status: 200,
            headers: HashMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    async fn client_with(responses: Vec<RawResponse>) -> Arc<Client> {
        Arc::new(
            ClientBuilder::new()
                .url("https://api.example")
                .username("u")
                .password("p")
                .adapter(AdapterHandle::Http(Arc::new(FakeAdapter {
                    responses: StdMutex::new(responses),
                })))
                .build()
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_resource_name_is_rejected() {
        let client = client_with(vec![]).await;
        let err = Entity::<Widget>::new(client, EntityDescriptor::new(""), "").unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
    }

    #[tokio::test]
    async fn resource_path_joins_base_path() {
        let client = client_with(vec![]).await;
        let entity = Entity::<Widget>::new(client, EntityDescriptor::new("widgets"), "api/v1/").unwrap();
        assert_eq!(entity.resource_path(), "api/v1/widgets");
    }

    #[tokio::test]
    async fn get_decodes_into_typed_model() {
        let client = client_with(vec![response(serde_json::json!({"id": "1", "name": "gizmo"}))]).await;
        let entity = Entity::<Widget>::new(client, EntityDescriptor::new("widgets"), "").unwrap();
        let widget = entity.get("1").await.unwrap();
        assert_eq!(widget, Widget { id: "1".to_string(), name: "gizmo".to_string() });
    }

    #[tokio::test]
    async fn manager_caches_registered_descriptor() {
        let client = client_with(vec![]).await;
        let manager = EntityManager::new(client);
        manager.register(EntityDescriptor::new("widgets").with_id_field("uuid"), "");
        let entity = manager.entity::<Widget>("widgets", "").unwrap();
        assert_eq!(entity.resource_path(), "widgets");
    }
}
