use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::hooks::{ErrorHook, ResponseHook};
use crate::ports::adapter::AdapterError;

struct FakeHttpAdapter {
    responses: StdMutex<Vec<Result<RawResponse, AdapterError>>>,
    calls: AtomicUsize,
}

impl FakeHttpAdapter {
    fn new(responses: Vec<Result<RawResponse, AdapterError>>) -> Self {
        Self {
            responses: StdMutex::new(responses),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl crate::ports::adapter::ProtocolAdapter for FakeHttpAdapter {
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
impl HttpAdapter for FakeHttpAdapter {
    async fn request(
        &self,
        _method: &str,
        _url: &str,
        _kwargs: RequestKwargs,
    ) -> Result<RawResponse, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(AdapterError::Other("no more canned responses".to_string()));
        }
        responses.remove(0)
    }
}

fn ok_response(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        headers: HashMap::new(),
        body: body.as_bytes().to_vec(),
    }
}

async fn build_client(adapter: Arc<FakeHttpAdapter>) -> Client {
    ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .adapter(AdapterHandle::Http(adapter))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn successful_get_builds_api_response() {
    let adapter = Arc::new(FakeHttpAdapter::new(vec![Ok(ok_response(200, r#"{"id":1}"#))]));
    let client = build_client(adapter.clone()).await;
    let response = client.get("users/1", RequestOptions::new()).await.unwrap();
    assert!(response.success);
    assert_eq!(response.data, json!({"id": 1}));
    assert_eq!(adapter.call_count(), 1);
}

#[tokio::test]
async fn error_hook_suppresses_exception() {
    struct AlwaysRefuse;
    #[async_trait]
    impl crate::ports::adapter::ProtocolAdapter for AlwaysRefuse {
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
    impl HttpAdapter for AlwaysRefuse {
        async fn request(
            &self,
            _method: &str,
            _url: &str,
            _kwargs: RequestKwargs,
        ) -> Result<RawResponse, AdapterError> {
            Err(AdapterError::Connection("refused".to_string()))
        }
    }

    struct SuppressingErrorHook;
    #[async_trait]
    impl ErrorHook for SuppressingErrorHook {
        async fn on_error(&self, _method: &str, _url: &str, _error: &str) -> Option<ApiResponse> {
            Some(
                ApiResponse::failed(
                    599,
                    WireError::new(ErrorType::ConnectionError, "suppressed", 599),
                ),
            )
        }
    }

    let client = ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .adapter(AdapterHandle::Http(Arc::new(AlwaysRefuse)))
        .add_error_hook(Arc::new(SuppressingErrorHook))
        .build()
        .await
        .unwrap();

    let response = client.get("anything", RequestOptions::new()).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.status_code, 599);
}

#[tokio::test]
async fn plugin_on_error_runs_only_when_no_error_hook_suppressed() {
    struct AlwaysFail;
    #[async_trait]
    impl crate::ports::adapter::ProtocolAdapter for AlwaysFail {
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
    impl HttpAdapter for AlwaysFail {
        async fn request(
            &self,
            _method: &str,
            _url: &str,
            _kwargs: RequestKwargs,
        ) -> Result<RawResponse, AdapterError> {
            Err(AdapterError::Connection("down".to_string()))
        }
    }

    struct RecordingPlugin {
        invoked: AtomicUsize,
    }
    #[async_trait]
    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            "recorder"
        }
        async fn on_error(&self, _method: &str, _url: &str, _error: &str) -> Option<ApiResponse> {
            self.invoked.fetch_add(1, Ordering::SeqCst);
            Some(ApiResponse::failed(
                598,
                WireError::new(ErrorType::ConnectionError, "plugin caught it", 598),
            ))
        }
    }

    let plugin = Arc::new(RecordingPlugin {
        invoked: AtomicUsize::new(0),
    });

    let client = ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .adapter(AdapterHandle::Http(Arc::new(AlwaysFail)))
        .add_plugin(plugin.clone())
        .build()
        .await
        .unwrap();

    let response = client.get("anything", RequestOptions::new()).await.unwrap();
    assert_eq!(response.status_code, 598);
    assert_eq!(plugin.invoked.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn adapter_type_mismatch_is_reported() {
    let adapter = Arc::new(FakeHttpAdapter::new(vec![]));
    let client = build_client(adapter).await;
    let err = client.execute_query("select 1", &[]).await.unwrap_err();
    match err {
        ClientError::AdapterType { required, actual } => {
            assert_eq!(required, "DatabaseAdapter");
            assert_eq!(actual, "HttpAdapter");
        }
        other => panic!("expected AdapterType error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_hooks_run_in_registration_order() {
    struct TagHeaderHook(&'static str);
    #[async_trait]
    impl ResponseHook for TagHeaderHook {
        async fn on_response(
            &self,
            _method: &str,
            _url: &str,
            mut raw: RawResponse,
        ) -> Result<RawResponse, crate::error::CoreError> {
            raw.headers
                .entry("X-Order".to_string())
                .and_modify(|v| v.push_str(self.0))
                .or_insert_with(|| self.0.to_string());
            Ok(raw)
        }
    }

    let adapter = Arc::new(FakeHttpAdapter::new(vec![Ok(ok_response(200, "{}"))]));
    let client = ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .adapter(AdapterHandle::Http(adapter))
        .add_response_hook(Arc::new(TagHeaderHook("a")))
        .add_response_hook(Arc::new(TagHeaderHook("b")))
        .build()
        .await
        .unwrap();

    let response = client.get("x", RequestOptions::new()).await.unwrap();
    assert_eq!(response.headers.get("X-Order").unwrap(), "ab");
}

#[tokio::test]
async fn test_connection_reports_human_readable_success() {
    let adapter = Arc::new(FakeHttpAdapter::new(vec![Ok(ok_response(200, "{}"))]));
    let client = build_client(adapter).await;
    let (ok, message) = client.test_connection().await;
    assert!(ok);
    assert_eq!(message, "Connection successful (status 200)");
}

#[tokio::test]
async fn test_connection_maps_failure_to_message() {
    let adapter = Arc::new(FakeHttpAdapter::new(vec![Err(AdapterError::Connection("boom".to_string()))]));
    let client = build_client(adapter).await;
    let (ok, message) = client.test_connection().await;
    assert!(!ok);
    assert!(message.starts_with("Connection failed:"));
}

#[tokio::test]
async fn failing_response_hook_is_suppressed_by_error_hook() {
    struct FailingResponseHook;
    #[async_trait]
    impl ResponseHook for FailingResponseHook {
        async fn on_response(
            &self,
            _method: &str,
            _url: &str,
            _raw: RawResponse,
        ) -> Result<RawResponse, crate::error::CoreError> {
            Err(crate::error::CoreError::Other("response hook exploded".to_string()))
        }
    }

    struct SuppressingErrorHook;
    #[async_trait]
    impl ErrorHook for SuppressingErrorHook {
        async fn on_error(&self, _method: &str, _url: &str, error: &str) -> Option<ApiResponse> {
            assert!(error.contains("response hook exploded"));
            Some(ApiResponse::failed(
                597,
                WireError::new(ErrorType::UnknownError, "suppressed", 597),
            ))
        }
    }

    let adapter = Arc::new(FakeHttpAdapter::new(vec![Ok(ok_response(200, "{}"))]));
    let client = ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .adapter(AdapterHandle::Http(adapter))
        .add_response_hook(Arc::new(FailingResponseHook))
        .add_error_hook(Arc::new(SuppressingErrorHook))
        .build()
        .await
        .unwrap();

    let response = client.get("anything", RequestOptions::new()).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.status_code, 597);
}

#[tokio::test]
async fn missing_adapter_fails_at_build() {
    let result = ClientBuilder::new()
        .url("https://api.example")
        .username("bob")
        .password("secret")
        .build()
        .await;
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}
