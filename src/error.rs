use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::flashcards::FlashcardStorageError;
use crate::quiz::{GradingError, QuizStorageError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<FlashcardStorageError> for ApiError {
    fn from(err: FlashcardStorageError) -> Self {
        match err {
            FlashcardStorageError::DeckNotFound(_) | FlashcardStorageError::CardNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            FlashcardStorageError::Validation(msg) => ApiError::Validation(msg),
            FlashcardStorageError::Io(_) | FlashcardStorageError::Json(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<QuizStorageError> for ApiError {
    fn from(err: QuizStorageError) -> Self {
        match err {
            QuizStorageError::ResultNotFound(_) => ApiError::NotFound(err.to_string()),
            QuizStorageError::Io(_) | QuizStorageError::Json(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<GradingError> for ApiError {
    fn from(err: GradingError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_storage_errors_map_to_status() {
        let not_found: ApiError = FlashcardStorageError::DeckNotFound(Uuid::nil()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid: ApiError = FlashcardStorageError::Validation("empty".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let io: ApiError = QuizStorageError::Io(std::io::Error::other("disk")).into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_grading_errors_are_validation() {
        let err: ApiError = GradingError::EmptyDeck.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
