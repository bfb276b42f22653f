use reqwest::StatusCode;
use thiserror::Error;

/// Longest response body quoted in an error message.
const MAX_QUOTED_BODY: usize = 500;

/// Failures talking to a Teamworx site.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Sign-in rejected - check username and password")]
    SignInRejected,

    #[error("No session cookie - sign in first")]
    NoSession,

    #[error("Site refused the request ({status}): {body}")]
    Refused { status: StatusCode, body: String },

    #[error("Still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Site error ({status}): {body}")]
    Server { status: StatusCode, body: String },

    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("Could not reach site: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e)
        } else if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else {
            ApiError::Transport(e)
        }
    }
}

impl ApiError {
    /// Map a non-success, non-429 status. 401 and 403 both mean the
    /// session cookie or credentials were not accepted.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = quote_body(body);
        match status.as_u16() {
            401 => ApiError::SignInRejected,
            500..=599 => ApiError::Server { status, body },
            _ => ApiError::Refused { status, body },
        }
    }
}

/// Trim `body` to `MAX_QUOTED_BODY` bytes on a char boundary.
fn quote_body(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_QUOTED_BODY {
        return body.to_string();
    }
    let mut end = MAX_QUOTED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "nope"),
            ApiError::SignInRejected
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, " upstream\n"),
            ApiError::Server { ref body, .. } if body == "upstream"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::Refused { status: StatusCode::NOT_FOUND, .. }
        ));
    }

    #[test]
    fn test_messages_name_the_status() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "blocked");
        assert_eq!(err.to_string(), "Site refused the request (403 Forbidden): blocked");
        assert_eq!(
            ApiError::RateLimited { attempts: 4 }.to_string(),
            "Still rate limited after 4 attempts"
        );
    }

    #[test]
    fn test_long_body_quoted_on_char_boundary() {
        let body = "é".repeat(400);
        let quoted = quote_body(&body);
        assert!(quoted.ends_with("... (800 bytes)"));
        assert!(quoted.starts_with(&"é".repeat(250)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        // Nothing listens on port 9 of the loopback interface
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Transport(_)));
    }
}
