//! RFC 5988 `Link` header pagination, as used by GitHub and similar APIs.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::Stream;
use regex::Regex;
use serde_json::Value;

use super::base::{extract_items, PaginationConfig};
use crate::client::{Client, ClientError, RequestOptions};

/// Extract the `next` URL out of a `Link: <url>; rel="next", ...` header.
fn extract_next_link(headers: &std::collections::HashMap<String, String>, link_header: &str) -> Option<String> {
    let raw = headers.get(link_header)?;
    let pattern = Regex::new(r#"<(.+?)>;\s*rel="(.+?)""#).expect("static link-header pattern");
    let result = pattern
        .captures_iter(raw)
        .find(|c| &c[2] == "next")
        .map(|c| c[1].to_string());
    result
}

/// First request carries the caller's params; every `next` link is followed
/// verbatim, with no params re-applied. Stops when a page is empty, the
/// `Link` header has no `next` relation, or `max_pages` is reached.
pub fn paginate(
    client: Arc<Client>,
    endpoint: String,
    config: PaginationConfig,
) -> impl Stream<Item = Result<Value, ClientError>> {
    try_stream! {
        let mut page_count: u64 = 0;
        let mut url = endpoint;
        let mut params = config.params.clone();
        params.insert(config.page_size_param.clone(), config.page_size.to_string());

        loop {
            let opts = if page_count == 0 {
                RequestOptions::new().with_params(params.clone())
            } else {
                RequestOptions::new()
            };
            let response = client.get(&url, opts).await?;
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

            match extract_next_link(&response.headers, &config.link_header) {
                Some(next) => url = next,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_next_relation_out_of_multiple_links() {
        let mut headers = std::collections::HashMap::new();
        headers.insert(
            "Link".to_string(),
            r#"<https://api.example/items?page=2>; rel="next", <https://api.example/items?page=9>; rel="last""#
                .to_string(),
        );
        let next = extract_next_link(&headers, "Link").unwrap();
        assert_eq!(next, "https://api.example/items?page=2");
    }

    #[test]
    fn returns_none_without_next_relation() {
        let mut headers = std::collections::HashMap::new();
        headers.insert(
            "Link".to_string(),
            r#"<https://api.example/items?page=1>; rel="prev""#.to_string(),
        );
        assert!(extract_next_link(&headers, "Link").is_none());
    }

    #[test]
    fn returns_none_without_link_header() {
        let headers = std::collections::HashMap::new();
        assert!(extract_next_link(&headers, "Link").is_none());
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::client::{AdapterHandle, ClientBuilder};
    use crate::ports::adapter::{AdapterError, HttpAdapter, ProtocolAdapter, RawResponse, RequestKwargs};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Mutex;

    struct LinkAdapter {
        pages: Mutex<Vec<(serde_json::Value, Option<String>)>>,
    }

    #[async_trait]
    impl ProtocolAdapter for LinkAdapter {
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
    impl HttpAdapter for LinkAdapter {
        async fn request(
            &self,
            _method: &str,
            _url: &str,
            _kwargs: RequestKwargs,
        ) -> Result<RawResponse, AdapterError> {
            let mut pages = self.pages.lock().unwrap();
            let (body, next) = pages.remove(0);
            let mut headers = std::collections::HashMap::new();
            if let Some(n) = next {
                headers.insert("Link".to_string(), format!(r#"<{n}>; rel="next""#));
            }
            Ok(RawResponse {
                status: 200,
                headers,
                body: serde_json::to_vec(&body).unwrap(),
            })
        }
    }

    #[tokio::test]
    async fn follows_next_link_verbatim() {
        let adapter = Arc::new(LinkAdapter {
            pages: Mutex::new(vec![
                (
                    serde_json::json!([{"id": 1}]),
                    Some("https://api.example/items?page=2".to_string()),
                ),
                (serde_json::json!([{"id": 2}]), None),
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
        let stream = paginate(client, "items".to_string(), PaginationConfig::default());
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
    }
}
