use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;
use tracing::info;

use crate::dto::{
    parse_records, split_batch, ApiResponse, BatchResponse, CancelRequest, LoyaltyTransactionRecord,
    RedemptionRecord,
};
use crate::models::PointsBalance;
use crate::services::{Cancellation, LoyaltyPurchase, PointsRedemption};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_loyalty_router() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(process_transactions))
        .route("/transactions/cancel", put(cancel_transactions))
        .route("/redemptions", post(process_redemptions))
        .route("/redemptions/cancel", put(cancel_redemptions))
}

pub fn create_points_router() -> Router<AppState> {
    Router::new().route("/:cliente_id", get(get_points_balance))
}

async fn process_transactions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<i64>, AppError> {
    let records = split_batch(body)?;
    info!(records = records.len(), "🧾 Lote de transacciones de lealtad");

    let purchases = parse_records::<LoyaltyTransactionRecord, LoyaltyPurchase>(records);
    let outcome = state.services.processor.process_loyalty_batch(purchases).await;
    Ok(BatchResponse::from_outcome(outcome, "loyalty transactions"))
}

async fn cancel_transactions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<Cancellation>, AppError> {
    let ids = CancelRequest::from_body(body)?;
    let outcome = state.services.compensator.cancel_loyalty_batch(ids).await;
    Ok(BatchResponse::from_outcome(outcome, "loyalty cancellations"))
}

async fn process_redemptions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<i64>, AppError> {
    let records = split_batch(body)?;
    info!(records = records.len(), "🎁 Lote de canjes");

    let redemptions = parse_records::<RedemptionRecord, PointsRedemption>(records);
    let outcome = state.services.processor.process_redemption_batch(redemptions).await;
    Ok(BatchResponse::from_outcome(outcome, "redemptions"))
}

async fn cancel_redemptions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<Cancellation>, AppError> {
    let ids = CancelRequest::from_body(body)?;
    let outcome = state.services.compensator.cancel_redemption_batch(ids).await;
    Ok(BatchResponse::from_outcome(outcome, "redemption cancellations"))
}

async fn get_points_balance(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> Result<ApiResponse<PointsBalance>, AppError> {
    let balance = state.services.queries.points_balance(client_id).await?;
    Ok(ApiResponse::success(balance))
}
