use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use dcx_core::ports::adapter::{
    AdapterError, GraphQlAdapter, GraphQlCallback, GraphQlOperation, GraphQlResponse, HttpAdapter, ProtocolAdapter,
    RequestKwargs,
};

use crate::error::GraphQlAdapterError;

const INTROSPECTION_QUERY: &str = "query IntrospectionQuery { __schema { queryType { name } mutationType { name } subscriptionType { name } types { name kind } } }";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

fn build_body(query: &str, variables: Option<Value>, operation_name: Option<&str>) -> Value {
    let mut body = json!({ "query": query });
    if let Some(vars) = variables {
        body["variables"] = vars;
    }
    if let Some(name) = operation_name {
        body["operationName"] = Value::String(name.to_string());
    }
    body
}

fn parse_response(value: Value) -> GraphQlResponse {
    GraphQlResponse {
        data: value.get("data").cloned(),
        errors: value
            .get("errors")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

/// GraphQL adapter layered directly on an `HttpAdapter` transport: every
/// operation is a single POST of `{query, variables, operationName}` to
/// `endpoint`. `subscribe` has no transport-level push channel to ride on
/// here, so it polls the query on `poll_interval` from a dedicated task —
/// the same per-subscription-task shape the queue and WebSocket adapters
/// use, adapted to a pull transport.
pub struct HttpGraphQlAdapter {
    transport: Arc<dyn HttpAdapter>,
    endpoint: String,
    poll_interval: Duration,
    subscriptions: tokio::sync::RwLock<HashMap<String, JoinHandle<()>>>,
}

impl HttpGraphQlAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpAdapter>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            subscriptions: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn post(&self, body: Value) -> Result<Value, AdapterError> {
        let kwargs = RequestKwargs {
            body: Some(body),
            ..Default::default()
        };
        let response = self.transport.request("POST", &self.endpoint, kwargs).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| GraphQlAdapterError::InvalidResponse(e.to_string()).into())
    }
}

#[async_trait]
impl ProtocolAdapter for HttpGraphQlAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        self.transport.connect().await
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        let mut subscriptions = self.subscriptions.write().await;
        for (_, handle) in subscriptions.drain() {
            handle.abort();
        }
        self.transport.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

#[async_trait]
impl GraphQlAdapter for HttpGraphQlAdapter {
    async fn query(&self, query: &str, variables: Option<Value>, operation_name: Option<&str>) -> Result<GraphQlResponse, AdapterError> {
        let body = build_body(query, variables, operation_name);
        Ok(parse_response(self.post(body).await?))
    }

    async fn mutation(&self, mutation: &str, variables: Option<Value>, operation_name: Option<&str>) -> Result<GraphQlResponse, AdapterError> {
        if !mutation.trim_start().starts_with("mutation") {
            return Err(GraphQlAdapterError::NotAMutation.into());
        }
        let body = build_body(mutation, variables, operation_name);
        Ok(parse_response(self.post(body).await?))
    }

    async fn execute_batch(&self, operations: &[GraphQlOperation]) -> Result<Vec<GraphQlResponse>, AdapterError> {
        let body = Value::Array(
            operations
                .iter()
                .map(|op| build_body(&op.query, op.variables.clone(), op.operation_name.as_deref()))
                .collect(),
        );
        let response = self.post(body).await?;
        let items = response
            .as_array()
            .ok_or_else(|| GraphQlAdapterError::InvalidResponse("expected a JSON array for a batch response".to_string()))?;
        Ok(items.iter().cloned().map(parse_response).collect())
    }

    async fn introspect(&self) -> Result<Value, AdapterError> {
        let body = build_body(INTROSPECTION_QUERY, None, None);
        let response = self.post(body).await?;
        Ok(response.get("data").cloned().unwrap_or(response))
    }

    async fn subscribe(&self, query: &str, variables: Option<Value>, callback: GraphQlCallback) -> Result<String, AdapterError> {
        let id = uuid::Uuid::new_v4().to_string();
        let transport = self.transport.clone();
        let endpoint = self.endpoint.clone();
        let query = query.to_string();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let body = build_body(&query, variables.clone(), None);
                let kwargs = RequestKwargs {
                    body: Some(body),
                    ..Default::default()
                };
                match transport.request("POST", &endpoint, kwargs).await {
                    Ok(raw) => match serde_json::from_slice::<Value>(&raw.body) {
                        Ok(value) => callback(parse_response(value)),
                        Err(err) => tracing::warn!(%err, "subscription poll returned invalid JSON"),
                    },
                    Err(err) => tracing::warn!(%err, "subscription poll request failed"),
                }
            }
        });

        self.subscriptions.write().await.insert(id.clone(), handle);
        Ok(id)
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), AdapterError> {
        match self.subscriptions.write().await.remove(subscription_id) {
            Some(handle) => {
                handle.abort();
                Ok(())
            }
            None => Err(GraphQlAdapterError::UnknownSubscription(subscription_id.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcx_core::ports::adapter::RawResponse;
    use std::sync::Mutex;

    struct FakeTransport {
        responses: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ProtocolAdapter for FakeTransport {
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
    impl HttpAdapter for FakeTransport {
        async fn request(&self, _method: &str, _url: &str, _kwargs: RequestKwargs) -> Result<RawResponse, AdapterError> {
            let mut responses = self.responses.lock().unwrap();
            let body = if responses.is_empty() {
                json!({"data": null})
            } else {
                responses.remove(0)
            };
            Ok(RawResponse {
                status: 200,
                headers: HashMap::new(),
                body: serde_json::to_vec(&body).unwrap(),
            })
        }
    }

    fn adapter_with(responses: Vec<Value>) -> HttpGraphQlAdapter {
        let transport = Arc::new(FakeTransport {
            responses: Mutex::new(responses),
        });
        HttpGraphQlAdapter::new(transport, "https://example.invalid/graphql")
    }

    #[tokio::test]
    async fn query_parses_data_and_errors() {
        let adapter = adapter_with(vec![json!({"data": {"ok": true}, "errors": []})]);
        let response = adapter.query("{ ok }", None, None).await.unwrap();
        assert_eq!(response.data, Some(json!({"ok": true})));
        assert!(response.errors.is_empty());
    }

    #[tokio::test]
    async fn mutation_rejects_non_mutation_documents() {
        let adapter = adapter_with(vec![]);
        let err = adapter.mutation("query { ok }", None, None).await.unwrap_err();
        assert!(matches!(err, AdapterError::Request(_)));
    }

    #[tokio::test]
    async fn mutation_accepts_leading_whitespace() {
        let adapter = adapter_with(vec![json!({"data": {"created": true}})]);
        let response = adapter.mutation("  mutation { create }", None, None).await.unwrap();
        assert_eq!(response.data, Some(json!({"created": true})));
    }

    #[tokio::test]
    async fn execute_batch_parses_each_item() {
        let adapter = adapter_with(vec![json!([{"data": {"a": 1}}, {"data": {"b": 2}}])]);
        let ops = vec![
            GraphQlOperation { query: "{ a }".to_string(), variables: None, operation_name: None },
            GraphQlOperation { query: "{ b }".to_string(), variables: None, operation_name: None },
        ];
        let responses = adapter.execute_batch(&ops).await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].data, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_errors() {
        let adapter = adapter_with(vec![]);
        let err = adapter.unsubscribe("nope").await.unwrap_err();
        assert!(matches!(err, AdapterError::Other(_)));
    }
}
