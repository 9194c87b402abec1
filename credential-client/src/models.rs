//! Wire types shared by the issuance, introspection and gateway endpoints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The only token type handed out by the issuance endpoint
pub const BEARER: &str = "Bearer";

/// Body of a `POST /issue` request. Missing fields fall back to the issuer's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl IssueRequest {
    pub fn new(service_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            scope: Some(scope.into()),
        }
    }
}

/// A freshly issued credential as returned by `POST /issue`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds from issuance
    pub expires_in: u64,
    pub sub: String,
    pub scope: String,
}

impl IssuedToken {
    /// Value for an `Authorization` header carrying this token
    pub fn authorization(&self) -> String {
        format!("{} {}", BEARER, self.access_token)
    }
}

/// Result of `POST /introspect`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Extracts the token from an `Authorization` header value of the form `Bearer <token>`.
///
/// The scheme is matched case-insensitively and surrounding whitespace around the token is
/// ignored. Returns `None` for any other scheme or an empty token.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Short, non-reversible identifier for a token, safe to put in logs
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}
