use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use validator::Validate;

use crate::dto::{ApiResponse, CloseShiftRequest, CloseShiftResponse, OpenShiftRequest};
use crate::models::Shift;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, from_validation_errors, AppError};

pub fn create_shift_router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_shift))
        .route("/close", put(close_shift))
}

fn parse_body<T>(body: Value) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let request: T = serde_json::from_value(body).map_err(|e| bad_request_error(&e.to_string()))?;
    request.validate().map_err(|e| from_validation_errors(&e))?;
    Ok(request)
}

async fn open_shift(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<ApiResponse<Shift>, AppError> {
    let request: OpenShiftRequest = parse_body(body)?;
    let shift = state.services.shifts.open(request.into_new_shift(Utc::now())?).await?;
    Ok(ApiResponse::success_with_message(shift, "Shift opened"))
}

async fn close_shift(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<ApiResponse<CloseShiftResponse>, AppError> {
    let request: CloseShiftRequest = parse_body(body)?;
    let (shift_id, ended_at) = request.into_parts(Utc::now())?;

    let closure = state.services.shifts.close(shift_id, ended_at).await?;
    let rows = closure.total_closed();
    Ok(ApiResponse::success_with_message(
        CloseShiftResponse::from(closure),
        format!("Shift {} closed, {} rows moved to closed", shift_id, rows),
    ))
}
