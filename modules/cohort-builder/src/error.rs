use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ai_client::AiError;
use reference_data::ReferenceDataError;

#[derive(Error, Debug)]
pub enum CohortBuilderError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Reference data unavailable: {0}")]
    ReferenceData(String),

    #[error("Model error: {0}")]
    UpstreamModel(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CohortBuilderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ReferenceData(_) | Self::UpstreamModel(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ReferenceData(_) => "reference_data",
            Self::UpstreamModel(_) => "upstream_model",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ReferenceDataError> for CohortBuilderError {
    fn from(err: ReferenceDataError) -> Self {
        Self::ReferenceData(err.to_string())
    }
}

impl From<AiError> for CohortBuilderError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Config(msg) => Self::Internal(msg),
            other => Self::UpstreamModel(other.to_string()),
        }
    }
}

/// `{"error": "..."}` body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for CohortBuilderError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(
            CohortBuilderError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CohortBuilderError::ReferenceData("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            CohortBuilderError::UpstreamModel("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            CohortBuilderError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn reference_failures_keep_their_kind() {
        let err: CohortBuilderError = ReferenceDataError::Network("connection reset".into()).into();
        assert_eq!(err.kind(), "reference_data");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn model_failures_are_upstream_except_misconfiguration() {
        let err: CohortBuilderError = AiError::MissingOutput.into();
        assert_eq!(err.kind(), "upstream_model");

        let err: CohortBuilderError = AiError::Config("bad key".into()).into();
        assert_eq!(err.kind(), "internal");
    }
}
