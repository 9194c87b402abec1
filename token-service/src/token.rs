use serde::{Deserialize, Serialize};

/// An issued credential as persisted in the token store.
///
/// Records are written once and never updated; expiry is computed at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub subject: String,
    pub scope: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl Token {
    /// Build a token expiring `ttl` seconds after `issued_at`.
    ///
    /// Returns `None` when the expiry does not fit in a `u64` timestamp.
    pub fn new(
        value: String,
        subject: String,
        scope: String,
        issued_at: u64,
        ttl: u64,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add(ttl)?;
        Some(Self {
            value,
            subject,
            scope,
            issued_at,
            expires_at,
        })
    }

    /// Whether the token is valid at `now`. The expiry second itself is still valid.
    pub fn is_active_at(&self, now: u64) -> bool {
        now <= self.expires_at
    }

    pub fn ttl(&self) -> u64 {
        self.expires_at - self.issued_at
    }
}
