//! Shared pagination configuration and data-extraction rules.

use std::collections::HashMap;

use serde_json::Value;

use crate::client::ClientError;

/// Tunables shared by all four pagination strategies.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub page_size: u64,
    pub max_pages: Option<u64>,
    pub data_key: Option<String>,
    pub params: HashMap<String, String>,

    pub page_param: String,
    pub page_size_param: String,

    pub offset_param: String,
    pub limit_param: String,

    pub cursor_param: String,
    pub has_more_key: String,
    pub next_cursor_key: String,

    pub link_header: String,
    pub count_header: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: None,
            data_key: None,
            params: HashMap::new(),
            page_param: "page".to_string(),
            page_size_param: "per_page".to_string(),
            offset_param: "offset".to_string(),
            limit_param: "limit".to_string(),
            cursor_param: "cursor".to_string(),
            has_more_key: "has_more".to_string(),
            next_cursor_key: "next_cursor".to_string(),
            link_header: "Link".to_string(),
            count_header: "X-Total-Count".to_string(),
        }
    }
}

/// Pull the item list out of a page's `data`, honoring `data_key` when set.
pub fn extract_items(data: &Value, data_key: Option<&str>) -> Result<Vec<Value>, ClientError> {
    let items_value = match data_key {
        Some(key) => data.get(key).ok_or_else(|| {
            ClientError::Request(format!(
                "missing key '{key}': response does not contain the expected data key"
            ))
        })?,
        None => data,
    };
    items_value
        .as_array()
        .cloned()
        .ok_or_else(|| ClientError::Request("response data is not a list".to_string()))
}
