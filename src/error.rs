use std::any::Any;

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    NotFound { message: String, diagnostics: Option<Value> },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("calendar entry has no movie id field")]
    Schema { available_fields: Vec<String> },

    #[error("TMDB returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("TMDB request timed out")]
    UpstreamTimeout,

    #[error("TMDB request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_)
            | AppError::Schema { .. }
            | AppError::Network(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Invalid request",
            AppError::NotFound { .. } => "Not found",
            AppError::Database(_) => "Database query failed",
            AppError::Schema { .. } => "Calendar entry is missing a movie id",
            AppError::Upstream { .. } | AppError::UpstreamTimeout | AppError::Network(_) => {
                "Failed to fetch movie data"
            },
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let details = match &self {
            AppError::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let mut body = json!({ "error": self.summary(), "details": details });

        match self {
            AppError::NotFound { diagnostics: Some(diagnostics), .. } => {
                body["diagnostics"] = diagnostics;
            },
            AppError::Schema { available_fields } => {
                body["available_fields"] = json!(available_fields);
            },
            _ => {},
        }

        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Renders a handler panic as a 500 with the panic message as `details`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(anyhow::anyhow!(details)).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
