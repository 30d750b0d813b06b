use thiserror::Error;

/// Failure of a single call against the studio service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StudioError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service returned HTTP {status}")]
    Http {
        status: u16,
        message: Option<String>,
    },
    #[error("service rejected the request")]
    Rejected(Option<String>),
}

impl StudioError {
    /// The most specific text available for showing to the user.
    ///
    /// `fallback` is used when the service reported a logical failure without
    /// saying why.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            StudioError::Validation(message) => message.clone(),
            StudioError::Transport(detail) => format!("Network error: {detail}"),
            StudioError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            StudioError::Http { status, .. } => format!("HTTP error! status: {status}"),
            StudioError::Rejected(Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            StudioError::Rejected(_) => fallback.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, StudioError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_server_text() {
        let err = StudioError::Http {
            status: 500,
            message: Some("quota exceeded".into()),
        };
        assert_eq!(err.user_message("Failed to convert to 3D"), "quota exceeded");
    }

    #[test]
    fn http_error_without_text_reports_status() {
        let err = StudioError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(err.user_message("unused"), "HTTP error! status: 502");
    }

    #[test]
    fn blank_rejection_falls_back_to_operation_message() {
        let err = StudioError::Rejected(Some("  ".into()));
        assert_eq!(
            err.user_message("Failed to generate image"),
            "Failed to generate image"
        );
    }
}
