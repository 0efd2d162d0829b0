//! Mapping board failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use place::board::BoardError;
use tokio::task::JoinError;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    Board(BoardError),
    Render(minijinja::Error),
    Join(JoinError),
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        Self::Board(err)
    }
}

impl From<place::core::validation::ValidationError> for AppError {
    fn from(err: place::core::validation::ValidationError) -> Self {
        Self::Board(err.into())
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}

impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        Self::Join(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Validation messages are written for the person who clicked.
            Self::Board(err) if err.is_validation() => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            Self::Board(err) => {
                error!(error = %err, "board operation failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Render(err) => {
                error!(error = %err, "template rendering failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Join(err) => {
                error!(error = %err, "blocking board task failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
