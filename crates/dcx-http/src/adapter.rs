use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tokio::time::sleep;

use dcx_core::ports::adapter::{AdapterError, HttpAdapter, ProtocolAdapter, RawResponse, RequestKwargs};

use crate::error::HttpAdapterError;

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Persistent `reqwest::Client`-backed HTTP adapter: connection pooling,
/// status-based retry with exponential backoff, and Basic-auth injection
/// from `RequestKwargs::auth`.
pub struct ReqwestHttpAdapter {
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: f64,
    connected: AtomicBool,
}

impl ReqwestHttpAdapter {
    /// # Errors
    /// Returns an error if the underlying `reqwest::Client` fails to build
    /// (e.g. an invalid TLS configuration).
    pub fn new(
        timeout: Duration,
        verify_ssl: bool,
        max_retries: u32,
        retry_backoff: f64,
        user_agent: &str,
    ) -> Result<Self, HttpAdapterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| HttpAdapterError::Build(e.to_string()))?;

        Ok(Self {
            client,
            max_retries,
            retry_backoff,
            connected: AtomicBool::new(false),
        })
    }

    fn apply_basic_auth(request: reqwest::RequestBuilder, kwargs: &RequestKwargs) -> reqwest::RequestBuilder {
        match kwargs.auth.get("auth").and_then(|raw| raw.split_once(':')) {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn backoff_delay(&self, attempt: u32) {
        let secs = self.retry_backoff * 2f64.powi(attempt as i32);
        sleep(Duration::from_secs_f64(secs)).await;
    }
}

#[async_trait]
impl ProtocolAdapter for ReqwestHttpAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpAdapter for ReqwestHttpAdapter {
    async fn request(&self, method: &str, url: &str, kwargs: RequestKwargs) -> Result<RawResponse, AdapterError> {
        if !ALLOWED_METHODS.contains(&method.to_ascii_uppercase().as_str()) {
            return Err(HttpAdapterError::UnsupportedMethod(method.to_string()).into());
        }
        let parsed_method =
            Method::from_str(&method.to_ascii_uppercase()).map_err(|e| HttpAdapterError::Request(e.to_string()))?;

        let mut attempt = 0;
        loop {
            let mut builder = self.client.request(parsed_method.clone(), url).query(&kwargs.query);
            for (key, value) in &kwargs.headers {
                builder = builder.header(key, value);
            }
            if let Some(body) = &kwargs.body {
                builder = builder.json(body);
            }
            builder = Self::apply_basic_auth(builder, &kwargs);

            let response = builder.send().await.map_err(|e| HttpAdapterError::Request(e.to_string()))?;
            let status = response.status();

            if RETRYABLE_STATUSES.contains(&status.as_u16()) && attempt < self.max_retries {
                attempt += 1;
                tracing::warn!(status = status.as_u16(), attempt, "retrying HTTP request");
                self.backoff_delay(attempt).await;
                continue;
            }

            if RETRYABLE_STATUSES.contains(&status.as_u16()) {
                return Err(HttpAdapterError::RetriesExhausted {
                    attempts: attempt,
                    last_status: status.as_u16(),
                }
                .into());
            }

            return build_raw_response(response, status).await;
        }
    }
}

async fn build_raw_response(response: reqwest::Response, status: StatusCode) -> Result<RawResponse, AdapterError> {
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|e| HttpAdapterError::Request(e.to_string()))?
        .to_vec();

    Ok(RawResponse {
        status: status.as_u16(),
        headers,
        body,
    })
}
