use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::dto::{
    parse_records, split_batch, ApiResponse, BatchResponse, CancelRequest, FleetTransactionRecord,
};
use crate::services::{Cancellation, FleetPurchase, WalletAvailability, WalletQuery};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_fleet_router() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(process_transactions))
        .route("/transactions/cancel", put(cancel_transactions))
        .route("/wallet", get(get_wallet))
}

async fn process_transactions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<i64>, AppError> {
    let records = split_batch(body)?;
    info!(records = records.len(), "⛽ Lote de transacciones de flota");

    let purchases = parse_records::<FleetTransactionRecord, FleetPurchase>(records);
    let outcome = state.services.processor.process_fleet_batch(purchases).await;
    Ok(BatchResponse::from_outcome(outcome, "fleet transactions"))
}

async fn cancel_transactions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<BatchResponse<Cancellation>, AppError> {
    let ids = CancelRequest::from_body(body)?;
    info!(ids = ?ids, "↩️ Cancelación de transacciones de flota");

    let outcome = state.services.compensator.cancel_fleet_batch(ids).await;
    Ok(BatchResponse::from_outcome(outcome, "fleet cancellations"))
}

#[derive(Debug, Deserialize)]
struct WalletParams {
    vehiculo_id: Option<i64>,
    numero_tarjeta: Option<String>,
}

async fn get_wallet(
    State(state): State<AppState>,
    Query(params): Query<WalletParams>,
) -> Result<ApiResponse<WalletAvailability>, AppError> {
    let query = match (params.vehiculo_id, params.numero_tarjeta) {
        (Some(vehicle_id), _) => WalletQuery::Vehicle(vehicle_id),
        (None, Some(card)) => WalletQuery::Card(card),
        (None, None) => return Err(bad_request_error("vehiculo_id or numero_tarjeta is required")),
    };

    let wallet = state.services.queries.wallet_availability(query).await?;
    Ok(ApiResponse::success(wallet))
}
