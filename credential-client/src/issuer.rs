use crate::error::ClientError;
use crate::models::{IssueRequest, IssuedToken};
use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::time::Duration;

/// Source of fresh credentials
#[async_trait]
pub trait Issuer: Send + Sync + Debug + 'static {
    /// Mint a new token for `subject` with the given `scope`.
    ///
    /// Each implementation should bound its own remote calls with a timeout.
    async fn issue(&self, subject: &str, scope: &str) -> Result<IssuedToken, ClientError>;
}

/// Issuer backed by the token service `POST /issue` endpoint
#[derive(Debug, Clone)]
pub struct HttpIssuer {
    client: reqwest::Client,
    url: String,
}

impl HttpIssuer {
    /// Create a new HTTP issuer with a 5 second request timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(5))
    }

    /// Create a new HTTP issuer with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout.min(Duration::from_secs(2)))
                .build()
                .expect("Failed to create issuance client"),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Issuer for HttpIssuer {
    async fn issue(&self, subject: &str, scope: &str) -> Result<IssuedToken, ClientError> {
        debug!("Requesting token for '{}' from {}", subject, self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&IssueRequest::new(subject, scope))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ResponseError(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::DeserializationError(e.to_string()))?;
        if value
            .get("access_token")
            .and_then(|t| t.as_str())
            .is_none_or(str::is_empty)
        {
            return Err(ClientError::MissingAccessToken);
        }
        serde_json::from_value(value).map_err(|e| ClientError::DeserializationError(e.to_string()))
    }
}
