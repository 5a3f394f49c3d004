//! Offset/limit pagination: `offset += len(items)` each page.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::Stream;
use serde_json::Value;

use super::base::{extract_items, PaginationConfig};
use crate::client::{Client, ClientError, RequestOptions};

/// Stops when a page returns no items, when the page is shorter than
/// `page_size`, or when `max_pages` is reached.
pub fn paginate(
    client: Arc<Client>,
    endpoint: String,
    config: PaginationConfig,
) -> impl Stream<Item = Result<Value, ClientError>> {
    try_stream! {
        let mut offset: u64 = 0;
        let mut page_count: u64 = 0;
        let mut params = config.params.clone();
        params.insert(config.limit_param.clone(), config.page_size.to_string());

        loop {
            params.insert(config.offset_param.clone(), offset.to_string());
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
            offset += count;
        }
    }
}
