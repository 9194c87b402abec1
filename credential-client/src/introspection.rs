use crate::error::ClientError;
use crate::models::{BEARER, IntrospectionResponse};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::fmt::Debug;
use std::time::Duration;

/// Real-time validity check of a bearer token against the issuing authority.
///
/// `Ok` with `active == false` means the credential is not valid. `Err` means the authority
/// could not be reached and nothing is known about the credential.
#[async_trait]
pub trait Introspector: Send + Sync + Debug + 'static {
    async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, ClientError>;
}

/// Introspector backed by the token service `POST /introspect` endpoint
#[derive(Debug, Clone)]
pub struct HttpIntrospector {
    client: reqwest::Client,
    url: String,
}

impl HttpIntrospector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout.min(Duration::from_secs(2)))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Some(Duration::from_secs(90)))
                .build()
                .expect("Failed to create introspection client"),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Introspector for HttpIntrospector {
    async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, ClientError> {
        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("{} {}", BEARER, token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ResponseError(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::DeserializationError(e.to_string()))
    }
}
