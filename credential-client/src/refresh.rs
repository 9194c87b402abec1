//! Reactive recovery from an expired credential on the consumer side.
//!
//! A caller presents its held token. When the call comes back unauthenticated the protocol
//! obtains a new token, adopts it and retries the call a bounded number of times with a short
//! pause between attempts. The outcome is reported, never raised.

use crate::current::CurrentToken;
use crate::error::ClientError;
use crate::issuer::Issuer;
use crate::models::{BEARER, fingerprint};
use crate::stats::RefreshMetrics;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::{Instant, timeout};

/// A call to a protected resource that authenticates with a bearer token
#[async_trait]
pub trait ProtectedCall: Send + Sync + Debug {
    /// Perform the call with `token` and return the response status
    async fn call(&self, token: &str) -> Result<StatusCode, ClientError>;
}

/// `GET` against a gateway-protected URL
#[derive(Debug, Clone)]
pub struct GatewayCall {
    client: reqwest::Client,
    url: String,
}

impl GatewayCall {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create gateway client"),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ProtectedCall for GatewayCall {
    async fn call(&self, token: &str) -> Result<StatusCode, ClientError> {
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, format!("{} {}", BEARER, token))
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Configuration for the refresh protocol
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Subject to request a new token for
    pub subject: String,
    /// Scope to request for the new token
    pub scope: String,
    /// Maximum number of retries with the refreshed token (default: 5)
    pub max_attempts: u32,
    /// Pause between two retries (default: 100 ms)
    pub retry_delay: Duration,
    /// Upper bound for each protected call and for the issuance call (default: 5 s)
    pub request_timeout: Duration,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            subject: "accounts".to_string(),
            scope: "accounts:read".to_string(),
            max_attempts: 5,
            retry_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// How a protected call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The held token was accepted, no refresh was needed
    Authorized,
    /// The first call failed for a reason other than an unauthenticated response
    CallFailed,
    /// A new token could not be obtained
    IssueFailed,
    /// A retry with the refreshed token succeeded
    Recovered,
    /// Every retry with the refreshed token failed
    Exhausted,
}

impl RefreshOutcome {
    fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Authorized => "authorized",
            RefreshOutcome::CallFailed => "call_failed",
            RefreshOutcome::IssueFailed => "issue_failed",
            RefreshOutcome::Recovered => "recovered",
            RefreshOutcome::Exhausted => "exhausted",
        }
    }
}

/// Report of a single run of the protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub outcome: RefreshOutcome,
    /// Status of the last response observed, if any
    pub status: Option<StatusCode>,
    /// Number of retries made with the refreshed token
    pub attempts: u32,
    /// Time from detecting the unauthenticated response to recovery or giving up.
    /// `None` when no refresh was started.
    pub refresh_latency: Option<Duration>,
}

#[derive(Debug)]
pub struct ClientRefreshProtocol<C: ProtectedCall, I: Issuer> {
    call: C,
    issuer: I,
    held: CurrentToken,
    opt: RefreshOptions,
    metrics: Option<RefreshMetrics>,
}

impl<C: ProtectedCall, I: Issuer> ClientRefreshProtocol<C, I> {
    pub fn new(call: C, issuer: I, held: CurrentToken, opt: RefreshOptions) -> Self {
        Self {
            call,
            issuer,
            held,
            opt,
            metrics: None,
        }
    }

    /// Record refresh latency and results in `metrics`
    pub fn with_metrics(mut self, metrics: RefreshMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The token currently held by this client
    pub fn held(&self) -> &CurrentToken {
        &self.held
    }

    /// Perform the protected call, refreshing the credential if it was rejected
    pub async fn run(&self) -> RefreshReport {
        let token = self.held.access_token().unwrap_or_default();
        let status = match self.bounded_call(&token).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Protected call failed: {}", e);
                return RefreshReport {
                    outcome: RefreshOutcome::CallFailed,
                    status: None,
                    attempts: 0,
                    refresh_latency: None,
                };
            }
        };

        if status != StatusCode::UNAUTHORIZED {
            let outcome = if status.is_success() {
                RefreshOutcome::Authorized
            } else {
                RefreshOutcome::CallFailed
            };
            return RefreshReport {
                outcome,
                status: Some(status),
                attempts: 0,
                refresh_latency: None,
            };
        }

        self.refresh().await
    }

    async fn refresh(&self) -> RefreshReport {
        let started = Instant::now();
        debug!("Held token rejected, refreshing credential for '{}'", self.opt.subject);

        let issued = timeout(
            self.opt.request_timeout,
            self.issuer.issue(&self.opt.subject, &self.opt.scope),
        )
        .await
        .unwrap_or(Err(ClientError::Timeout));
        match issued {
            Ok(token) => {
                debug!("Adopting refreshed token {}", fingerprint(&token.access_token));
                self.held.publish(token);
            }
            Err(e) => {
                warn!("Failed to refresh credential for '{}': {}", self.opt.subject, e);
                return self.finish(
                    RefreshOutcome::IssueFailed,
                    Some(StatusCode::UNAUTHORIZED),
                    0,
                    started,
                );
            }
        }

        let token = self.held.access_token().unwrap_or_default();
        let mut attempts = 0;
        let mut last_status = Some(StatusCode::UNAUTHORIZED);
        while attempts < self.opt.max_attempts {
            if attempts > 0 {
                tokio::time::sleep(self.opt.retry_delay).await;
            }
            attempts += 1;
            match self.bounded_call(&token).await {
                Ok(status) if status.is_success() => {
                    return self.finish(RefreshOutcome::Recovered, Some(status), attempts, started);
                }
                Ok(status) => {
                    debug!("Retry {} with refreshed token returned {}", attempts, status);
                    last_status = Some(status);
                }
                Err(e) => {
                    debug!("Retry {} with refreshed token failed: {}", attempts, e);
                    last_status = None;
                }
            }
        }

        self.finish(RefreshOutcome::Exhausted, last_status, attempts, started)
    }

    async fn bounded_call(&self, token: &str) -> Result<StatusCode, ClientError> {
        timeout(self.opt.request_timeout, self.call.call(token))
            .await
            .unwrap_or(Err(ClientError::Timeout))
    }

    fn finish(
        &self,
        outcome: RefreshOutcome,
        status: Option<StatusCode>,
        attempts: u32,
        started: Instant,
    ) -> RefreshReport {
        let latency = started.elapsed();
        info!(
            "client refresh latency {}ms ({}, {} attempts)",
            latency.as_millis(),
            outcome.label(),
            attempts
        );
        if let Some(metrics) = &self.metrics {
            metrics.observe(outcome.label(), latency.as_secs_f64());
        }
        RefreshReport {
            outcome,
            status,
            attempts,
            refresh_latency: Some(latency),
        }
    }
}
