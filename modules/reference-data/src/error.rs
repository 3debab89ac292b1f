use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReferenceDataError>;

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field in {service} response: {path}")]
    MissingField {
        service: &'static str,
        path: String,
    },

    #[error("Token signing failed: {0}")]
    Token(String),
}

impl From<reqwest::Error> for ReferenceDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ReferenceDataError::Parse(err.to_string())
        } else {
            ReferenceDataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ReferenceDataError {
    fn from(err: serde_json::Error) -> Self {
        ReferenceDataError::Parse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ReferenceDataError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ReferenceDataError::Token(err.to_string())
    }
}
