//! Single request/response exchange.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::tls::apply_tls;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use rgxr_protocol::Operation;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Performs exchanges against a fixed base URL.
///
/// One call is one HTTP request. Nothing is retried and no timeout is set.
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Builds the underlying HTTP client from the configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL {:?}: {}", base_url, e)))?;

        let builder = apply_tls(reqwest::Client::builder(), &config.tls)?;
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    /// Returns the base URL (without a trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one request and returns the body of a successful response.
    ///
    /// Any non-2xx status fails with [`ClientError::Request`] naming
    /// `operation`; the body of a failed response is not read.
    pub async fn exchange(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<String, ClientError> {
        let url = self.url(path);
        tracing::debug!("{} {} ({})", method, path, operation);

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!("{} {} failed to complete: {}", method, path, e);
            ClientError::Http(e)
        })?;

        let status = response.status();
        tracing::debug!("{} {} -> {}", method, path, status);

        if !status.is_success() {
            return Err(ClientError::Request { operation, status });
        }

        Ok(response.text().await?)
    }

    /// Sends one request and decodes the successful body as JSON.
    pub async fn exchange_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<T, ClientError> {
        let text = self.exchange(operation, method, path, body, headers).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport = Transport::new(&ClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080");
        assert_eq!(
            transport.url("/api/render"),
            "http://localhost:8080/api/render"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let transport = Transport::new(&ClientConfig::new("https://host/rgxr")).unwrap();
        assert_eq!(
            transport.url("/pgapi/finite_automatas?id=eq.x"),
            "https://host/rgxr/pgapi/finite_automatas?id=eq.x"
        );
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let result = Transport::new(&ClientConfig::new(""));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
