use crate::token::Token;
use credential_client::models::BEARER;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of an issuance request; omitted fields fall back to the configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct IssueBody {
    /// Subject the token is issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Capability granted by the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// A freshly issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct IssueResponse {
    /// Opaque bearer token value
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    /// Subject the token was issued to
    pub sub: String,
    /// Granted scope
    pub scope: String,
}

impl From<Token> for IssueResponse {
    fn from(token: Token) -> Self {
        Self {
            expires_in: token.ttl(),
            access_token: token.value,
            token_type: BEARER.to_string(),
            sub: token.subject,
            scope: token.scope,
        }
    }
}

/// Result of introspecting a bearer token
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct IntrospectResponse {
    /// Whether the token is currently valid
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Expiry as seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Set when the token could not be checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntrospectResponse {
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            error: Some("introspection_unavailable".to_string()),
            ..Self::default()
        }
    }
}

impl From<Token> for IntrospectResponse {
    fn from(token: Token) -> Self {
        Self {
            active: true,
            sub: Some(token.subject),
            scope: Some(token.scope),
            exp: Some(token.expires_at),
            error: None,
        }
    }
}
