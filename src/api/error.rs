use thiserror::Error;

/// Failure of a single backend call. The `Display` form is what users see in
/// popups, so `Status` renders the backend's own message verbatim.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Transport(err) => err.status().map(|s| s.as_u16()),
            BackendError::Decode(_) => None,
        }
    }

    /// Builds a status error from a non-success response body.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            format!(
                "Request failed with status {}{}",
                status.as_u16(),
                status
                    .canonical_reason()
                    .map(|reason| format!(" ({reason})"))
                    .unwrap_or_default()
            )
        });
        BackendError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

fn extract_json_summary(value: &serde_json::Value) -> Option<String> {
    value
        .get("detail")
        .and_then(|detail| match detail {
            serde_json::Value::String(s) => Some(s.clone()),
            // Validation errors arrive as a list of {loc, msg, type}.
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        })
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
}

/// Pulls a human-readable message out of an error body.
///
/// JSON bodies are searched for `detail`, `error.message`, `error`, then
/// `message`; any other non-empty body is returned. Only the ends are
/// trimmed, the message itself is kept as the backend wrote it.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let summary = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => extract_json_summary(&value)?,
        Err(_) => trimmed.to_string(),
    };

    let summary = summary.trim();
    (!summary.is_empty()).then(|| summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_preferred() {
        let body = r#"{"detail":" Folder   name already\nexists\n","message":"ignored"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Folder   name already\nexists")
        );
    }

    #[test]
    fn validation_detail_lists_are_joined() {
        let body = r#"{"detail":[{"msg":"field required"},{"msg":"too long"}]}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("field required; too long")
        );
    }

    #[test]
    fn nested_error_message_is_found() {
        let body = r#"{"error":{"message":"rate limited"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("rate limited"));
    }

    #[test]
    fn plain_text_and_empty_bodies() {
        assert_eq!(
            extract_error_message("  upstream timeout ").as_deref(),
            Some("upstream timeout")
        );
        assert_eq!(extract_error_message("   "), None);
        assert_eq!(extract_error_message(r#"{"status":"failed"}"#), None);
    }

    #[test]
    fn status_error_falls_back_to_reason_phrase() {
        let err = BackendError::from_response(reqwest::StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Request failed with status 404 (Not Found)");
        assert_eq!(err.status(), Some(404));
    }
}
