use thiserror::Error;

pub type MessagingResult<T> = Result<T, MessagingError>;

#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    #[error("Messaging credential is not configured")]
    MissingCredential,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Messaging API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid messaging API response: {message}")]
    InvalidResponse { message: String },
}

impl MessagingError {
    /// Body returned by the external API, when the failure came with one
    pub fn external_body(&self) -> Option<&str> {
        match self {
            MessagingError::Api { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_expose_body() {
        let err = MessagingError::Api {
            status: 400,
            body: r#"{"ok":false,"description":"Bad Request: chat not found"}"#.to_string(),
        };

        assert!(err.external_body().unwrap().contains("chat not found"));
        assert!(MessagingError::MissingCredential.external_body().is_none());
    }

    #[test]
    fn empty_api_body_is_not_reported() {
        let err = MessagingError::Api {
            status: 502,
            body: String::new(),
        };
        assert!(err.external_body().is_none());
    }
}
