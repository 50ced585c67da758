use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("One or more fields are invalid")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Product code already exists")]
    DuplicateProductCode,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Price change must be within ±10% of the current price (allowed range: {min} - {max})")]
    PriceOutOfBounds { min: Decimal, max: Decimal },

    #[error("Price can only be changed once every 24 hours (next change allowed at {next_allowed_at})")]
    PriceChangeCooldown { next_allowed_at: DateTime<Utc> },

    #[error("{0}")]
    InvalidImage(String),

    // Corpo multipart ilegível
    #[error("Malformed form data: {0}")]
    MalformedForm(String),

    // Corpo JSON ou query string rejeitados pelo extrator
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Forbidden: You do not have the required role")]
    Forbidden,

    // Variante para erros de banco de dados
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Falhas do armazenamento de imagens
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::DuplicateProductCode
            | AppError::PriceOutOfBounds { .. }
            | AppError::PriceChangeCooldown { .. }
            | AppError::InvalidImage(_)
            | AppError::MalformedForm(_)
            | AppError::InvalidRequest(_)
            | AppError::EmailAlreadyExists => StatusCode::BAD_REQUEST,
            AppError::ProductNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::StorageError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({ "success": false, "error": self.to_string(), "details": details })
            }
            AppError::PriceOutOfBounds { min, max } => json!({
                "success": false,
                "error": self.to_string(),
                "bounds": { "min": min, "max": max },
            }),
            AppError::PriceChangeCooldown { next_allowed_at } => json!({
                "success": false,
                "error": self.to_string(),
                "nextAllowedAt": next_allowed_at,
            }),

            // Todos os erros 500 viram uma mensagem genérica; o detalhe vai para o log.
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %e, "unexpected server error");
                json!({ "success": false, "error": "Server error" })
            }

            e => json!({ "success": false, "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

// Rejeições dos extratores do axum também saem no formato JSON padrão.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::MalformedForm(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn out_of_bounds_carries_the_bounds() {
        let (status, body) = body_json(AppError::PriceOutOfBounds {
            min: Decimal::new(945, 1),
            max: Decimal::new(1155, 1),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["bounds"]["min"], 94.5);
        assert_eq!(body["bounds"]["max"], 115.5);
        assert!(body["error"].as_str().unwrap().contains("94.5 - 115.5"));
    }

    #[tokio::test]
    async fn server_errors_do_not_leak_details() {
        let (status, body) =
            body_json(AppError::InternalServerError(anyhow::anyhow!("pool exhausted"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }

    #[tokio::test]
    async fn validation_errors_list_each_field() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("required");
        err.message = Some("Name is required".into());
        errors.add("name", err);

        let (status, body) = body_json(AppError::ValidationError(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["name"][0], "Name is required");
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UserNotFound.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ProductNotFound.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_bodies_are_json_too() {
        let (status, body) = body_json(AppError::InvalidRequest("expected value".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid request: expected value");
    }
}
