use thiserror::Error;

/// Failures talking to the issuance, introspection or gateway endpoints.
///
/// Every variant means the remote dependency could not give a usable answer; none of them
/// says anything about the validity of a credential.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Failed to send request: {0}")]
    RequestFailed(String),

    #[error("Response error (status {0}): {1}")]
    ResponseError(u16, String),

    #[error("Failed to deserialize response: {0}")]
    DeserializationError(String),

    #[error("Issuance response did not carry an access token")]
    MissingAccessToken,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::DeserializationError(err.to_string())
        } else {
            ClientError::RequestFailed(err.to_string())
        }
    }
}
