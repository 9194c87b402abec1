//! Per-request credential enforcement in front of the protected backend.
//!
//! A request is checked in order: bearer header present, token active according to the
//! token service, backend call succeeds. The backend receives the validated subject in the
//! `x-sub` header, never the raw token.

use crate::errors::Rejection;
use credential_client::{fingerprint, parse_bearer, Introspector};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

/// Header carrying the validated subject to the backend
pub const SUBJECT_HEADER: &str = "x-sub";

/// Successful response of a protected route
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub(crate) struct Authorized {
    /// Always true
    pub ok: bool,
    /// Subject of the validated token
    pub sub: String,
    /// Payload returned by the backend
    #[schema(value_type = Object)]
    pub body: Value,
}

#[derive(Debug)]
pub struct GatewayAuthorizer {
    introspector: Arc<dyn Introspector>,
    client: reqwest::Client,
    upstream_target: String,
}

impl GatewayAuthorizer {
    pub fn new(
        introspector: Arc<dyn Introspector>,
        upstream_target: impl Into<String>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            introspector,
            client: reqwest::Client::builder()
                .timeout(upstream_timeout)
                .connect_timeout(upstream_timeout.min(Duration::from_secs(2)))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Some(Duration::from_secs(90)))
                .build()
                .expect("Failed to create upstream client"),
            upstream_target: upstream_target.into(),
        }
    }

    /// Validate the `Authorization` header value and forward to the backend
    pub(crate) async fn authorize(
        &self,
        authorization: Option<&str>,
    ) -> Result<Authorized, Rejection> {
        let token = authorization
            .and_then(parse_bearer)
            .ok_or(Rejection::MissingBearer)?;

        let subject = self.validate(token).await?;
        let body = self.forward(&subject).await?;

        Ok(Authorized {
            ok: true,
            sub: subject,
            body,
        })
    }

    /// Introspect `token` and return its subject if it is active
    async fn validate(&self, token: &str) -> Result<String, Rejection> {
        let introspection = self.introspector.introspect(token).await?;
        if !introspection.active {
            debug!("Token {} is not active", fingerprint(token));
            return Err(Rejection::InactiveToken);
        }

        introspection
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| {
                Rejection::IntrospectionUnavailable(
                    "active introspection result without a subject".to_string(),
                )
            })
    }

    async fn forward(&self, subject: &str) -> Result<Value, Rejection> {
        let response = self
            .client
            .get(&self.upstream_target)
            .header(SUBJECT_HEADER, subject)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Upstream {} returned {} for '{}'",
                self.upstream_target, status, subject
            );
            return Err(Rejection::UpstreamError(format!(
                "upstream returned {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Rejection::UpstreamError(format!("upstream body is not JSON: {}", e)))
    }
}
