//! Page-number pagination: increments a `page` counter each request.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::Stream;
use serde_json::Value;

use super::base::{extract_items, PaginationConfig};
use crate::client::{Client, ClientError, RequestOptions};

/// Stops when a page returns no items, when the page is shorter than
/// `page_size`, or when `max_pages` is reached. Page numbers start at 1.
pub fn paginate(
    client: Arc<Client>,
    endpoint: String,
    config: PaginationConfig,
) -> impl Stream<Item = Result<Value, ClientError>> {
    try_stream! {
        let mut page: u64 = 1;
        let mut page_count: u64 = 0;
        let mut params = config.params.clone();
        params.insert(config.page_size_param.clone(), config.page_size.to_string());

        loop {
            params.insert(config.page_param.clone(), page.to_string());
            let opts = RequestOptions::new().with_params(params.clone());
            let response = client.get(&endpoint, opts).await?;
            if !response.success {
                Err(ClientError::Request(format!(
                    "pagination failed: {}",
                    response.error.map(|e| e.detail).unwrap_or_else(|| "unknown error".to_string())
                )))?;
            }

            let items = extract_items(&response.data, config.data_key.as_deref())?;
            if items.is_empty() {
                break;
            }

            let count = items.len() as u64;
            for item in items {
                yield item;
            }

            page_count += 1;
            if config.max_pages.is_some_and(|max| page_count >= max) {
                break;
            }
            if count < config.page_size {
                break;
            }
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AdapterHandle, ClientBuilder};
    use crate::ports::adapter::{AdapterError, HttpAdapter, ProtocolAdapter, RawResponse, RequestKwargs};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct PagedAdapter {
        pages: Mutex<Vec<Vec<serde_json::Value>>>,
        seen_pages: Mutex<Vec<String>>,
        calls: AtomicU64,
    }

    #[async_trait]
    impl ProtocolAdapter for PagedAdapter {
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
    impl HttpAdapter for PagedAdapter {
        async fn request(
            &self,
            _method: &str,
            _url: &str,
            kwargs: RequestKwargs,
        ) -> Result<RawResponse, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(p) = kwargs.query.get("page") {
                self.seen_pages.lock().unwrap().push(p.clone());
            }
            let mut pages = self.pages.lock().unwrap();
            let page = if pages.is_empty() { vec![] } else { pages.remove(0) };
            let body = serde_json::to_vec(&serde_json::Value::Array(page)).unwrap();
            Ok(RawResponse {
                status: 200,
                headers: std::collections::HashMap::new(),
                body,
            })
        }
    }

    #[tokio::test]
    async fn advances_page_number_until_short_page() {
        let adapter = Arc::new(PagedAdapter {
            pages: Mutex::new(vec![
                vec![serde_json::json!({"id": 1}), serde_json::json!({"id": 2})],
                vec![serde_json::json!({"id": 3})],
            ]),
            seen_pages: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
        });
        let client = Arc::new(
            ClientBuilder::new()
                .url("https://api.example")
                .username("u")
                .password("p")
                .adapter(AdapterHandle::Http(adapter.clone()))
                .build()
                .await
                .unwrap(),
        );
        let config = PaginationConfig {
            page_size: 2,
            ..Default::default()
        };
        let stream = paginate(client, "items".to_string(), config);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(*adapter.seen_pages.lock().unwrap(), vec!["1", "2"]);
    }
}
