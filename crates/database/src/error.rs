use models::{ValidationError, role::AccessError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the service layer, untranslated, to the boundary
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Permission(#[from] AccessError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("this course is not published yet")]
    CourseNotPublished,

    #[error("lesson {0} not found in this course")]
    LessonNotInCourse(Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Turns a unique-constraint violation into a conflict, passing every
    /// other storage error through
    pub fn from_unique_violation(err: DbErr, message: impl FnOnce() -> String) -> Self {
        if is_unique_violation(&err) {
            Self::Conflict(message())
        } else {
            Self::Database(err)
        }
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub type Result<T> = std::result::Result<T, ServiceError>;
