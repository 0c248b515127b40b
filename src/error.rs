use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TripWindowError {
    #[error("Invalid trip start date.")]
    InvalidStartDate,
    #[error("Invalid trip end date.")]
    InvalidEndDate,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Template(#[from] askama::Error),
    #[error("mail delivery failed: {0}")]
    Mail(String),
    #[error(transparent)]
    TripWindow(#[from] TripWindowError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Trip not found.")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TripWindow(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migrate(_)
            | AppError::Template(_)
            | AppError::Mail(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("request failed: {self:?}");
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_errors_are_client_errors() {
        let err = AppError::from(TripWindowError::InvalidStartDate);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid trip start date.");

        let err = AppError::from(TripWindowError::InvalidEndDate);
        assert_eq!(err.to_string(), "Invalid trip end date.");
    }

    #[test]
    fn collaborator_failures_map_to_server_errors() {
        assert_eq!(
            AppError::Mail("smtp down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
