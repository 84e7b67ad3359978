//! The endpoint gateway: the only component that touches the network.
//!
//! Facades depend on the [`ApiGateway`] trait rather than a concrete HTTP
//! client, so tests substitute an in-memory implementation at the same
//! seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::core::error::{BloomyError, Result};
use crate::DEFAULT_TIMEOUT_SECS;

/// One logical remote operation against the API, given a path relative to
/// the versioned base URL. Returns the parsed JSON body, `Value::Null`
/// for empty responses.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;

    async fn get_with_params(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    async fn post_empty(&self, path: &str) -> Result<Value>;

    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    async fn put_empty(&self, path: &str) -> Result<Value>;

    async fn delete(&self, path: &str) -> Result<Value>;
}

/// `reqwest`-backed gateway with bearer auth and a fixed request timeout.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        // The base must end with a slash so relative joins keep the
        // /api/v1 prefix.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| BloomyError::Configuration(format!("Invalid base URL: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| BloomyError::Configuration("API key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        info!("HTTP gateway initialized (base_url={})", base_url);

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BloomyError::Configuration(format!("Invalid endpoint path {path}: {e}")))
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(BloomyError::Authentication(
                "API key was rejected by the server".to_string(),
            ));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BloomyError::api(status.as_u16(), message));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn get(&self, path: &str) -> Result<Value> {
        debug!("GET {}", path);
        self.execute(self.client.get(self.endpoint(path)?)).await
    }

    async fn get_with_params(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        debug!("GET {} (params={:?})", path, params);
        self.execute(self.client.get(self.endpoint(path)?).query(params))
            .await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        debug!("POST {}", path);
        self.execute(self.client.post(self.endpoint(path)?).json(body))
            .await
    }

    async fn post_empty(&self, path: &str) -> Result<Value> {
        debug!("POST {}", path);
        self.execute(self.client.post(self.endpoint(path)?)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        debug!("PUT {}", path);
        self.execute(self.client.put(self.endpoint(path)?).json(body))
            .await
    }

    async fn put_empty(&self, path: &str) -> Result<Value> {
        debug!("PUT {}", path);
        self.execute(self.client.put(self.endpoint(path)?)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        debug!("DELETE {}", path);
        self.execute(self.client.delete(self.endpoint(path)?)).await
    }
}
