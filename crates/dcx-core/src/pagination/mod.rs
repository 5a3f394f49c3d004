//! Generic, strategy-selectable pagination over a [`Client`](crate::client::Client).
//!
//! Every strategy yields raw [`serde_json::Value`] items; [`into_typed`]
//! wraps such a stream to deserialize each item into a concrete type,
//! turning a malformed item into a stream error rather than silently
//! passing the raw value through.

pub mod base;
pub mod cursor;
pub mod link;
pub mod offset;
pub mod page;

use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use base::{extract_items, PaginationConfig};

use crate::client::{Client, ClientError};

/// Which pagination strategy a response family follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Offset,
    Page,
    Cursor,
    Link,
}

impl FromStr for Strategy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offset" => Ok(Self::Offset),
            "page" => Ok(Self::Page),
            "cursor" => Ok(Self::Cursor),
            "link" => Ok(Self::Link),
            other => Err(ClientError::Request(format!(
                "unsupported pagination strategy: {other}"
            ))),
        }
    }
}

/// Dispatch to the strategy-specific paginator, yielding raw JSON items.
pub fn paginate(
    client: Arc<Client>,
    endpoint: impl Into<String>,
    strategy: Strategy,
    config: PaginationConfig,
) -> std::pin::Pin<Box<dyn Stream<Item = Result<Value, ClientError>> + Send>> {
    let endpoint = endpoint.into();
    match strategy {
        Strategy::Offset => Box::pin(offset::paginate(client, endpoint, config)),
        Strategy::Page => Box::pin(page::paginate(client, endpoint, config)),
        Strategy::Cursor => Box::pin(cursor::paginate(client, endpoint, config)),
        Strategy::Link => Box::pin(link::paginate(client, endpoint, config)),
    }
}

/// Deserialize each raw item of a paginated stream into `T`.
///
/// A response row that a page yields but doesn't match `T`'s shape ends the
/// stream with an error for that item, rather than the silent
/// fall-back-to-raw-dict an untyped caller would otherwise get.
pub fn into_typed<T: DeserializeOwned + Send + 'static>(
    stream: impl Stream<Item = Result<Value, ClientError>> + Send + 'static,
) -> impl Stream<Item = Result<T, ClientError>> + Send {
    stream.map(|item| {
        let value = item?;
        serde_json::from_value(value)
            .map_err(|err| ClientError::Request(format!("item does not match expected shape: {err}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_known_names() {
        assert_eq!(Strategy::from_str("offset").unwrap(), Strategy::Offset);
        assert_eq!(Strategy::from_str("page").unwrap(), Strategy::Page);
        assert_eq!(Strategy::from_str("cursor").unwrap(), Strategy::Cursor);
        assert_eq!(Strategy::from_str("link").unwrap(), Strategy::Link);
    }

    #[test]
    fn strategy_rejects_unknown_name() {
        assert!(Strategy::from_str("bogus").is_err());
    }
}
