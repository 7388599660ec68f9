//! Client errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The orchestrator could not be reached or the transfer broke off
    #[error("request to orchestrator failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The orchestrator answered with a non-2xx status
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A 2xx answer whose body did not match the expected shape
    #[error("unexpected response body: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and response body
    ///
    /// The orchestrator answers errors as `{"error": "..."}`; that message
    /// is unwrapped when present.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);

        Self::ApiError { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// 409, e.g. an approval that was already resolved
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ApiError { status: 409, .. })
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (500..600).contains(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_unwraps_json_message() {
        let err = ClientError::api_error(409, r#"{"error":"approval 1 is already approved"}"#);
        assert_eq!(
            err.to_string(),
            "API error (status 409): approval 1 is already approved"
        );
        assert!(err.is_conflict());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = ClientError::api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (status 502): Bad Gateway");
        assert!(err.is_server_error());
        assert!(!err.is_not_found());
        assert!(ClientError::api_error(404, "").is_not_found());
    }
}
