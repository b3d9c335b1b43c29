use color_eyre::Result;
use log::debug;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Errors returned by the OpenAI API
#[derive(Debug, Error)]
pub enum OpenAiApiError {
    #[error("Invalid request ({status}): {message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("Authentication error ({status}): {message}")]
    Authentication { status: StatusCode, message: String },

    #[error("Permission error ({status}): {message}")]
    Permission { status: StatusCode, message: String },

    #[error("Not found ({status}): {message}")]
    NotFound { status: StatusCode, message: String },

    #[error("Rate limit exceeded ({status}): {message}")]
    RateLimit { status: StatusCode, message: String },

    #[error("Internal API error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    /// Catch-all for unexpected status codes and error types
    #[error("Unexpected API error ({status}): {message}")]
    Unexpected {
        status: StatusCode,
        error_type: Option<String>,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

impl OpenAiApiError {
    pub fn from_status(status: StatusCode, error_type: Option<&str>, message: String) -> Self {
        match (status.as_u16(), error_type) {
            (401, _) | (_, Some("authentication_error")) => Self::Authentication { status, message },
            (403, _) | (_, Some("permission_error")) => Self::Permission { status, message },
            (404, _) => Self::NotFound { status, message },
            (429, _) | (_, Some("rate_limit_exceeded")) => Self::RateLimit { status, message },
            (400, _) | (_, Some("invalid_request_error")) => Self::InvalidRequest { status, message },
            (500..=599, _) | (_, Some("server_error")) => Self::Server { status, message },
            _ => Self::Unexpected {
                status,
                error_type: error_type.map(str::to_string),
                message,
            },
        }
    }

    /// Builds the error from a non-success response body. Bodies that are
    /// not in OpenAI's error format are kept verbatim as the message.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => {
                Self::from_status(status, error.error_type.as_deref(), error.message)
            }
            Err(_) => Self::from_status(status, None, body.to_string()),
        }
    }
}

/// Returns the response unchanged when it succeeded, otherwise reads the
/// body and turns it into an [`OpenAiApiError`].
pub(crate) async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    debug!("OpenAI error body:\n{body}");
    Err(OpenAiApiError::from_body(status, &body).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_error_envelope() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#;
        let err = OpenAiApiError::from_body(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, OpenAiApiError::Authentication { .. }));
        assert_eq!(
            err.to_string(),
            "Authentication error (401 Unauthorized): Incorrect API key provided"
        );
    }

    #[test]
    fn maps_by_type_when_status_is_generic() {
        let body = r#"{"error":{"message":"Your prompt was rejected","type":"invalid_request_error"}}"#;
        let err = OpenAiApiError::from_body(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, OpenAiApiError::InvalidRequest { .. }));
    }

    #[test]
    fn keeps_unparseable_body() {
        let err = OpenAiApiError::from_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            OpenAiApiError::Server { message, .. } => assert_eq!(message, "<html>bad gateway</html>"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_status() {
        let err = OpenAiApiError::from_body(StatusCode::IM_A_TEAPOT, r#"{"error":{"message":"no"}}"#);
        assert!(matches!(
            err,
            OpenAiApiError::Unexpected {
                error_type: None,
                ..
            }
        ));
    }
}
