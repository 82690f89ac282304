//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Quota exceeded: wallet {wallet_id} has {available} units available, {requested} requested")]
    QuotaExceeded {
        wallet_id: i64,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Insufficient points: client {client_id} has {balance} points, {requested} requested")]
    InsufficientPoints {
        client_id: i64,
        requested: Decimal,
        balance: Decimal,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable expuesto en las respuestas de error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            AppError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Errores de infraestructura (base de datos, fallos internos)
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::QuotaExceeded { .. }
            | AppError::InsufficientPoints { .. } => StatusCode::CONFLICT,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (error, message, details) = match &self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    "Database Error",
                    "An error occurred while accessing the database".to_string(),
                    Some(json!({ "sql_error": e.to_string() })),
                )
            }
            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    Some(json!({ "internal_error": msg })),
                )
            }
            AppError::Validation(msg) => {
                warn!("⚠️ Validation error: {}", msg);
                ("Validation Error", msg.clone(), None)
            }
            AppError::BadRequest(msg) => {
                warn!("⚠️ Bad request: {}", msg);
                ("Bad Request", msg.clone(), None)
            }
            AppError::NotFound(msg) => {
                warn!("⚠️ Resource not found: {}", msg);
                ("Not Found", msg.clone(), None)
            }
            AppError::Conflict(msg) => {
                warn!("⚠️ Conflict: {}", msg);
                ("Conflict", msg.clone(), None)
            }
            AppError::QuotaExceeded { wallet_id, requested, available } => {
                warn!(wallet_id, %requested, %available, "⚠️ Quota exceeded");
                (
                    "Quota Exceeded",
                    self.to_string(),
                    Some(json!({ "wallet_id": wallet_id, "requested": requested, "available": available })),
                )
            }
            AppError::InsufficientPoints { client_id, requested, balance } => {
                warn!(client_id, %requested, %balance, "⚠️ Insufficient points");
                (
                    "Insufficient Points",
                    self.to_string(),
                    Some(json!({ "client_id": client_id, "requested": requested, "balance": balance })),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de validación sobre un campo
pub fn validation_error(field: &str, message: &str) -> AppError {
    AppError::Validation(format!("{}: {}", field, message))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Convierte los errores del derive `Validate` en un mensaje legible y estable
pub fn from_validation_errors(errors: &validator::ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let parts: Vec<String> = fields
        .into_iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect();

    AppError::Validation(parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::QuotaExceeded {
                wallet_id: 1,
                requested: Decimal::ONE,
                available: Decimal::ZERO,
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert!(AppError::Internal("boom".into()).is_infrastructure());
        assert!(!AppError::Validation("x".into()).is_infrastructure());
    }

    #[test]
    fn test_from_validation_errors_is_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("precio", ValidationError::new("positive"));
        errors.add("monto", ValidationError::new("required"));

        let err = from_validation_errors(&errors);
        assert_eq!(err.to_string(), "Validation error: monto: required; precio: positive");
    }
}
