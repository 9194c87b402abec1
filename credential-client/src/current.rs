use crate::models::IssuedToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// The credential a service currently presents on its outbound calls.
///
/// Publishing replaces the whole value (last writer wins); readers always observe either the
/// previous or the new token, never a mix. Cloning yields another handle to the same cell.
#[derive(Debug, Clone)]
pub struct CurrentToken {
    sender: Arc<watch::Sender<Option<Arc<IssuedToken>>>>,
}

impl Default for CurrentToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentToken {
    /// Create an empty cell
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create a cell already holding `token`
    pub fn with_token(token: IssuedToken) -> Self {
        let cell = Self::new();
        cell.publish(token);
        cell
    }

    /// Replace the current token
    pub fn publish(&self, token: IssuedToken) {
        self.sender.send_replace(Some(Arc::new(token)));
    }

    /// Snapshot of the current token, if any has been published
    pub fn get(&self) -> Option<Arc<IssuedToken>> {
        self.sender.borrow().clone()
    }

    /// The raw access token value of the current token
    pub fn access_token(&self) -> Option<String> {
        self.sender
            .borrow()
            .as_ref()
            .map(|token| token.access_token.clone())
    }

    /// Wait until a token is available or the timeout elapses
    pub async fn wait_for_token(
        &self,
        wait_timeout: Duration,
    ) -> Result<Arc<IssuedToken>, tokio::time::error::Elapsed> {
        let mut receiver = self.sender.subscribe();
        timeout(wait_timeout, async move {
            loop {
                if let Some(token) = receiver.borrow_and_update().clone() {
                    return token;
                }
                if receiver.changed().await.is_err() {
                    // The sender lives as long as `self`, so this cannot happen while we wait.
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str) -> IssuedToken {
        IssuedToken {
            access_token: value.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 600,
            sub: "accounts".to_string(),
            scope: "accounts:read".to_string(),
        }
    }

    #[test]
    fn test_empty_cell() {
        let cell = CurrentToken::new();
        assert!(cell.get().is_none());
        assert!(cell.access_token().is_none());
    }

    #[test]
    fn test_publish_replaces_previous_token() {
        let cell = CurrentToken::with_token(token("tok_1"));
        let reader = cell.clone();
        assert_eq!(reader.access_token().as_deref(), Some("tok_1"));

        let held = reader.get().unwrap();
        cell.publish(token("tok_2"));

        assert_eq!(reader.access_token().as_deref(), Some("tok_2"));
        // a snapshot taken before the swap is unaffected
        assert_eq!(held.access_token, "tok_1");
    }

    #[tokio::test]
    async fn test_wait_for_token() {
        let cell = CurrentToken::new();
        let writer = cell.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.publish(token("tok_late"));
        });

        let token = cell.wait_for_token(Duration::from_secs(2)).await.unwrap();
        assert_eq!(token.access_token, "tok_late");
    }

    #[tokio::test]
    async fn test_wait_for_token_timeout() {
        let cell = CurrentToken::new();
        assert!(
            cell.wait_for_token(Duration::from_millis(20))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_concurrent_publishers_last_writer_wins() {
        let cell = CurrentToken::new();
        let mut handles = vec![];
        for i in 0..10 {
            let cell = cell.clone();
            handles.push(tokio::spawn(async move {
                cell.publish(token(&format!("tok_{i}")));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let value = cell.access_token().unwrap();
        assert!(value.starts_with("tok_"));
    }
}
