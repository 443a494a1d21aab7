use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::error::ServiceError;
use log::error;
use models::ValidationError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("missing or invalid bearer token")]
    Unauthenticated,

    #[error("token does not carry a recognized role")]
    UnknownRole,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Service(err.into())
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Service(err) => match err {
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                ServiceError::CourseNotPublished => {
                    (StatusCode::BAD_REQUEST, "COURSE_NOT_PUBLISHED")
                }
                ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ServiceError::LessonNotInCourse(_) => {
                    (StatusCode::NOT_FOUND, "LESSON_NOT_IN_COURSE")
                }
                ServiceError::Permission(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                ServiceError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::UnknownRole => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{self}");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: code.to_owned(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
