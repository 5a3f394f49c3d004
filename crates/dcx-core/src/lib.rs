//! Protocol-agnostic core: configuration, the unified response envelope,
//! the hook/plugin pipeline, adapter ports, auth providers, pagination, and
//! the entity layer. Every `dcx-*` adapter crate implements one or more of
//! the traits declared under [`ports`] and is driven through [`client`].

pub mod auth;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod models;
pub mod pagination;
pub mod plugins;
pub mod ports;
pub mod schema;

pub use client::{Client, ClientBuilder, ClientError};
pub use config::Config;
pub use error::{CoreError, ErrorType};
pub use models::{ApiRequest, ApiResponse, Error as WireError};
