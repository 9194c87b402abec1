//! `RotationAgent` keeps a service's own credential fresh by re-issuing it on a fixed interval.
//!
//! The agent issues once immediately when started and then once per interval. A failed tick is
//! counted and logged; the next scheduled tick is the retry. The agent stops when dropped.

use crate::current::CurrentToken;
use crate::issuer::Issuer;
use crate::models::fingerprint;
use crate::stats::RotationStats;
use log::{debug, info, warn};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;

/// Configuration for the rotation agent
#[derive(Debug, Clone)]
pub struct RotationAgentOptions {
    /// Subject the credential is issued to
    pub subject: String,
    /// Scope requested for the credential
    pub scope: String,
    /// Time between rotations (default: 300 s)
    pub rotate_interval: Duration,
    /// Upper bound for a single issuance call (default: 5 s)
    pub request_timeout: Duration,
}

impl Default for RotationAgentOptions {
    fn default() -> Self {
        Self {
            subject: "accounts".to_string(),
            scope: "accounts:read".to_string(),
            rotate_interval: Duration::from_secs(300),
            request_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct RotationAgent {
    /// Cancellation token to signal shutdown
    shutdown_token: CancellationToken,
    /// The credential published by the agent
    current: CurrentToken,
    /// Statistics about the rotations
    stats: Arc<RotationStats>,
}

impl RotationAgent {
    /// Starts rotating with default options
    pub fn start<I: Issuer>(issuer: I) -> Self {
        Self::start_with_opt(issuer, RotationAgentOptions::default())
    }

    /// Starts rotating with custom options, publishing into a new `CurrentToken`
    pub fn start_with_opt<I: Issuer>(issuer: I, opt: RotationAgentOptions) -> Self {
        Self::start_publishing(issuer, opt, CurrentToken::new())
    }

    /// Starts rotating with custom options, publishing into an existing `CurrentToken`
    pub fn start_publishing<I: Issuer>(
        issuer: I,
        opt: RotationAgentOptions,
        current: CurrentToken,
    ) -> Self {
        let agent = Self {
            shutdown_token: CancellationToken::new(),
            current,
            stats: Arc::new(RotationStats::new()),
        };
        agent.spawn(issuer, opt);
        agent
    }

    fn spawn<I: Issuer>(&self, issuer: I, opt: RotationAgentOptions) {
        let shutdown_token = self.shutdown_token.clone();
        let current = self.current.clone();
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            info!(
                "Starting credential rotation for '{}' every {:?}",
                opt.subject, opt.rotate_interval
            );
            // the first tick completes immediately, so a fresh process gets a credential at once
            let mut ticker = interval(opt.rotate_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => {
                        info!("Rotation agent for '{}' shutting down", opt.subject);
                        break;
                    }
                    _ = ticker.tick() => {
                        let tick = stats.increment_ticks();
                        debug!("Rotation tick {} for '{}'", tick + 1, opt.subject);
                    }
                }

                let issued = tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    result = timeout(opt.request_timeout, issuer.issue(&opt.subject, &opt.scope)) => result,
                };

                match issued {
                    Ok(Ok(token)) => {
                        info!(
                            "[rotation] {} token rotated: {} expIn={}s",
                            opt.subject,
                            fingerprint(&token.access_token),
                            token.expires_in
                        );
                        current.publish(token);
                        stats.increment_rotations();
                    }
                    Ok(Err(e)) => {
                        stats.increment_errors();
                        warn!("[rotation] error for '{}': {}", opt.subject, e);
                    }
                    Err(_) => {
                        stats.increment_errors();
                        warn!(
                            "[rotation] issuance for '{}' timed out after {:?}",
                            opt.subject, opt.request_timeout
                        );
                    }
                }
            }
        });
    }

    /// Register the rotation counters so they are exported on `/metrics`
    pub fn register_metrics(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        self.stats.register(registry)
    }

    /// The cell holding the most recently rotated credential
    pub fn current(&self) -> &CurrentToken {
        &self.current
    }

    /// Gets the number of ticks processed so far
    pub fn ticks(&self) -> usize {
        self.stats.ticks()
    }

    /// Gets the number of successful rotations
    pub fn rotations(&self) -> u64 {
        self.stats.rotations()
    }

    /// Gets the number of failed rotations
    pub fn errors(&self) -> u64 {
        self.stats.errors()
    }

    /// Stop the rotation loop. The last published token stays in `current()`.
    pub fn stop(&self) {
        self.shutdown_token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }
}

impl Drop for RotationAgent {
    fn drop(&mut self) {
        debug!("Rotation agent dropping, stopping rotation loop");
        self.shutdown_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::models::IssuedToken;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issuer whose even-numbered calls (0, 2, 4, ...) fail
    #[derive(Debug, Default)]
    struct FlakyIssuer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Issuer for FlakyIssuer {
        async fn issue(&self, subject: &str, scope: &str) -> Result<IssuedToken, ClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 0 {
                return Err(ClientError::RequestFailed("connection refused".to_string()));
            }
            Ok(IssuedToken {
                access_token: format!("tok_{call}"),
                token_type: "Bearer".to_string(),
                expires_in: 600,
                sub: subject.to_string(),
                scope: scope.to_string(),
            })
        }
    }

    /// Issuer that never answers
    #[derive(Debug)]
    struct HangingIssuer;

    #[async_trait]
    impl Issuer for HangingIssuer {
        async fn issue(&self, _subject: &str, _scope: &str) -> Result<IssuedToken, ClientError> {
            std::future::pending().await
        }
    }

    fn options(interval_secs: u64) -> RotationAgentOptions {
        RotationAgentOptions {
            rotate_interval: Duration::from_secs(interval_secs),
            request_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_issues_immediately_at_startup() {
        let agent = RotationAgent::start_with_opt(FlakyIssuer::default(), options(300));
        tokio::time::sleep(Duration::from_millis(10)).await;

        // the startup tick ran without waiting a full interval
        assert_eq!(agent.ticks(), 1);
        assert_eq!(agent.errors(), 1);
        assert!(agent.current().get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alternating_failures_are_counted_and_loop_continues() {
        let agent = RotationAgent::start_with_opt(FlakyIssuer::default(), options(10));

        // ticks at t = 0, 10, ..., 90
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(agent.ticks(), 10);
        assert_eq!(agent.errors(), 5);
        assert_eq!(agent.rotations(), 5);
        assert_eq!(agent.current().access_token().as_deref(), Some("tok_9"));

        // still ticking after the failures
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(agent.ticks(), 12);
        assert_eq!(agent.errors(), 6);
        assert_eq!(agent.rotations(), 6);
        assert_eq!(agent.current().access_token().as_deref(), Some("tok_11"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let agent = RotationAgent::start_with_opt(HangingIssuer, options(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        // ticks at t = 0, 10, 20, each one gives up after the 1s request timeout
        assert_eq!(agent.ticks(), 3);
        assert_eq!(agent.errors(), 3);
        assert_eq!(agent.rotations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_rotation() {
        let agent = RotationAgent::start_with_opt(FlakyIssuer::default(), options(10));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(agent.ticks(), 2);

        agent.stop();
        assert!(agent.is_stopped());
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(agent.ticks(), 2);
        assert_eq!(agent.current().access_token().as_deref(), Some("tok_1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_into_shared_cell() {
        let shared = CurrentToken::new();
        let reader = shared.clone();
        let _agent =
            RotationAgent::start_publishing(FlakyIssuer::default(), options(10), shared);

        let token = reader.wait_for_token(Duration::from_secs(30)).await.unwrap();
        assert_eq!(token.access_token, "tok_1");
        assert_eq!(token.sub, "accounts");
    }
}
