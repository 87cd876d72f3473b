use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sheets::SheetsError;
use thiserror::Error;
use tracing::error;

use crate::{store::StoreError, telegram::TelegramError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Google Sheets service is not initialized")]
    SheetsUnavailable,

    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) | AppError::InvalidType(_) => StatusCode::BAD_REQUEST,
            AppError::Sheets(e) if e.is_bad_request() => StatusCode::BAD_REQUEST,
            AppError::Sheets(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Sheets(_) | AppError::Telegram(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::SheetsUnavailable
            | AppError::Store(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::MalformedPayload(_) => "malformed_payload",
            AppError::InvalidType(_) => "invalid_type",
            AppError::Config(_) => "configuration",
            AppError::SheetsUnavailable => "sheets_unavailable",
            AppError::Sheets(e) if e.is_not_found() => "not_found",
            AppError::Sheets(e) if e.is_bad_request() => "invalid_column",
            AppError::Sheets(_) => "sheets",
            AppError::Telegram(_) => "telegram",
            AppError::Store(_) => "storage",
            AppError::Io(_) => "server",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        }

        let body = json!({
            "success": false,
            "error": self.kind(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
