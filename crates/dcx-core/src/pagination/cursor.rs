//! Cursor-based pagination: follows `next_cursor`/`has_more` in the body.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::Stream;
use serde_json::Value;

use super::base::{extract_items, PaginationConfig};
use crate::client::{Client, ClientError, RequestOptions};

/// Stops when a page returns no items, `has_more` is false/absent, the next
/// cursor is absent, or `max_pages` is reached.
pub fn paginate(
    client: Arc<Client>,
    endpoint: String,
    config: PaginationConfig,
) -> impl Stream<Item = Result<Value, ClientError>> {
    try_stream! {
        let mut page_count: u64 = 0;
        let mut cursor: Option<String> = None;
        let mut params = config.params.clone();
        params.insert(config.page_size_param.clone(), config.page_size.to_string());

        loop {
            if let Some(c) = &cursor {
                params.insert(config.cursor_param.clone(), c.clone());
            } else {
                params.remove(&config.cursor_param);
            }

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

            for item in items {
                yield item;
            }

            page_count += 1;
            if config.max_pages.is_some_and(|max| page_count >= max) {
                break;
            }

            let has_more = response
                .data
                .get(&config.has_more_key)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let next_cursor = response
                .data
                .get(&config.next_cursor_key)
                .and_then(Value::as_str)
                .map(str::to_string);

            if !has_more || next_cursor.is_none() {
                break;
            }
            cursor = next_cursor;
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
    use std::sync::Mutex;

    struct CursorAdapter {
        pages: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl ProtocolAdapter for CursorAdapter {
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
    impl HttpAdapter for CursorAdapter {
        async fn request(
            &self,
            _method: &str,
            _url: &str,
            _kwargs: RequestKwargs,
        ) -> Result<RawResponse, AdapterError> {
            let mut pages = self.pages.lock().unwrap();
            let body = if pages.is_empty() {
                serde_json::json!({"items": []})
            } else {
                pages.remove(0)
            };
            Ok(RawResponse {
                status: 200,
                headers: std::collections::HashMap::new(),
                body: serde_json::to_vec(&body).unwrap(),
            })
        }
    }

    #[tokio::test]
    async fn stops_when_has_more_is_false() {
        let adapter = Arc::new(CursorAdapter {
            pages: Mutex::new(vec![
                serde_json::json!({"items": [{"id": 1}], "has_more": true, "next_cursor": "abc"}),
                serde_json::json!({"items": [{"id": 2}], "has_more": false}),
            ]),
        });
        let client = Arc::new(
            ClientBuilder::new()
                .url("https://api.example")
                .username("u")
                .password("p")
                .adapter(AdapterHandle::Http(adapter))
                .build()
                .await
                .unwrap(),
        );
        let mut config = PaginationConfig::default();
        config.data_key = Some("items".to_string());
        let stream = paginate(client, "items".to_string(), config);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
    }
}
