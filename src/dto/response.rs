//! Sobres de respuesta de la API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::BatchOutcome;

/// Sobre común `{success, message?, data?, errors?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            errors: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Conteos y resultados confirmados de un lote
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchData<T> {
    pub processed_count: usize,
    pub failed_count: usize,
    pub total: usize,
    pub processed: Vec<T>,
}

/// Respuesta de un lote: 200 si algo se confirmó, 400 si nada
#[derive(Debug)]
pub struct BatchResponse<T> {
    status: StatusCode,
    body: ApiResponse<BatchData<T>>,
}

impl<T> BatchResponse<T> {
    pub fn from_outcome(outcome: BatchOutcome<T>, what: &str) -> Self {
        let processed_count = outcome.processed_count();
        let failed_count = outcome.failed_count();

        let (status, success, message) = if outcome.nothing_processed() {
            (StatusCode::BAD_REQUEST, false, format!("No {} were processed", what))
        } else if failed_count == 0 {
            (StatusCode::OK, true, format!("{} {} processed", processed_count, what))
        } else {
            (
                StatusCode::OK,
                true,
                format!("{} {} processed, {} failed", processed_count, what, failed_count),
            )
        };

        let errors = if outcome.errors.is_empty() {
            None
        } else {
            Some(outcome.errors)
        };

        Self {
            status,
            body: ApiResponse {
                success,
                message: Some(message),
                data: Some(BatchData {
                    processed_count,
                    failed_count,
                    total: outcome.total,
                    processed: outcome.processed,
                }),
                errors,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for BatchResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    fn outcome(ok: &[i64], failed: usize) -> BatchOutcome<i64> {
        let mut outcome = BatchOutcome::new(ok.len() + failed);
        for id in ok {
            outcome.push("record", Ok(*id));
        }
        for _ in 0..failed {
            outcome.push("record", Err(AppError::Validation("monto: required".into())));
        }
        outcome
    }

    #[test]
    fn test_batch_status_rules() {
        assert_eq!(BatchResponse::from_outcome(outcome(&[1, 2], 0), "transactions").status(), StatusCode::OK);
        assert_eq!(BatchResponse::from_outcome(outcome(&[1], 1), "transactions").status(), StatusCode::OK);
        assert_eq!(
            BatchResponse::from_outcome(outcome(&[], 2), "transactions").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_batch_body_uses_camel_case_counts() {
        let response = BatchResponse::from_outcome(outcome(&[7], 1), "transactions");
        let body = serde_json::to_value(&response.body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["processedCount"], 1);
        assert_eq!(body["data"]["failedCount"], 1);
        assert_eq!(body["data"]["processed"][0], 7);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }
}
