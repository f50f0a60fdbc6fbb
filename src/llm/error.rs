use serde::Deserialize;
use thiserror::Error;

/// Failure of a single upstream chat-completion call.
///
/// The `Display` text of every variant is the message callers have always
/// received in place of a normal answer, so it can be handed back verbatim.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Error calling {api} API: request timed out after {secs}s")]
    Timeout { api: String, secs: u64 },

    #[error("Error calling {api} API: {cause}")]
    Transport { api: String, cause: String },

    #[error("Error calling {api} API: {status} {message}")]
    Status {
        api: String,
        status: u16,
        message: String,
    },

    #[error("Error: Unable to process response from {api} API.")]
    UnexpectedResponse { api: String, detail: String },
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }

    /// The underlying reason, which the display text may leave out.
    pub fn cause(&self) -> &str {
        match self {
            GatewayError::Timeout { .. } => "timed out",
            GatewayError::Transport { cause, .. } => cause.as_str(),
            GatewayError::Status { message, .. } => message.as_str(),
            GatewayError::UnexpectedResponse { detail, .. } => detail.as_str(),
        }
    }
}

/// Longest raw error body, in characters, carried into an error message.
const MAX_RAW_ERROR_CHARS: usize = 200;

/// Pull a readable message out of an OpenAI-style error envelope, falling
/// back to the raw body cut to `MAX_RAW_ERROR_CHARS`.
pub(crate) fn extract_api_error(body: &str) -> String {
    #[derive(Debug, Deserialize)]
    struct ErrorEnvelope {
        error: Option<ApiErrorBody>,
    }
    #[derive(Debug, Deserialize)]
    struct ApiErrorBody {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    }

    if let Ok(ErrorEnvelope { error: Some(err) }) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = err.message.unwrap_or_else(|| "unknown error".to_string());
        return match err.kind {
            Some(kind) => format!("{} (type={})", message, kind),
            None => message,
        };
    }
    let body = body.trim();
    match body.char_indices().nth(MAX_RAW_ERROR_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_legacy_text() {
        let err = GatewayError::Transport {
            api: "Groq".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Error calling Groq API: connection refused");

        let err = GatewayError::UnexpectedResponse {
            api: "Groq".to_string(),
            detail: "missing choices".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error: Unable to process response from Groq API."
        );
        assert_eq!(err.cause(), "missing choices");
    }

    #[test]
    fn test_extract_openai_error_envelope() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(
            extract_api_error(body),
            "Invalid API Key (type=invalid_request_error)"
        );
        assert_eq!(extract_api_error("upstream exploded\n"), "upstream exploded");
    }

    #[test]
    fn test_raw_error_body_is_truncated() {
        let page = format!("<html>{}</html>", "é".repeat(100_000));
        let message = extract_api_error(&page);
        assert_eq!(message.chars().count(), MAX_RAW_ERROR_CHARS + 1);
        assert!(message.starts_with("<html>é"));
        assert!(message.ends_with('…'));

        let exact = "x".repeat(MAX_RAW_ERROR_CHARS);
        assert_eq!(extract_api_error(&exact), exact);
    }
}
