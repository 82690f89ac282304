mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{memory_store, FLEET_CARD};
use fuel_ledger::config::{EnvironmentConfig, StoreKind};
use fuel_ledger::create_app;
use fuel_ledger::state::AppState;

async fn create_test_app() -> Router {
    let config = EnvironmentConfig {
        store: StoreKind::Memory,
        ..EnvironmentConfig::default()
    };
    create_app(AppState::new(Arc::new(memory_store().await), config))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn fleet_record(monto: u32) -> Value {
    json!({
        "monto": monto,
        "precio": 50,
        "tipo_combustible_id": 1,
        "turno_id": 1,
        "establecimiento_id": 1,
        "numero_tarjeta": FLEET_CARD,
        "created_at": "2024-03-01T08:00:00Z"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_single_fleet_record_then_cancel() {
    let app = create_test_app().await;

    let (status, body) = send(&app, "POST", "/api/fleet/transactions", Some(fleet_record(500))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["processedCount"], 1);
    let id = body["data"]["processed"][0].as_i64().unwrap();

    let (_, wallet) = send(&app, "GET", "/api/fleet/wallet?vehiculo_id=1", None).await;
    assert_eq!(decimal(&wallet["data"]["available"]), Decimal::from(50));

    let (status, body) = send(&app, "PUT", "/api/fleet/transactions/cancel", Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processed"][0]["estado"], false);

    let (_, wallet) = send(&app, "GET", "/api/fleet/wallet?numero_tarjeta=4111111111111111", None).await;
    assert_eq!(decimal(&wallet["data"]["consumed"]), Decimal::from(40));
}

#[tokio::test]
async fn test_partial_loyalty_batch_reports_failed_record() {
    let app = create_test_app().await;

    let batch = json!({
        "records": [
            {"cliente_id": 1, "establecimiento_id": 1, "terminal_id": 1, "monto": 100, "fecha": "2024-03-01T09:00:00Z"},
            {"cliente_id": 1, "establecimiento_id": 1, "terminal_id": 1, "fecha": "2024-03-01T09:05:00Z"},
            {"cliente_id": 1, "establecimiento_id": 1, "terminal_id": 1, "monto": 20, "fecha": "2024-03-01T09:10:00Z"}
        ]
    });
    let (status, body) = send(&app, "POST", "/api/loyalty/transactions", Some(batch)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processedCount"], 2);
    assert_eq!(body["data"]["failedCount"], 1);
    let error = body["errors"][0].as_str().unwrap();
    assert!(error.contains("record 2"), "{}", error);

    let (status, body) = send(&app, "GET", "/api/points/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["balance"]), Decimal::from(120));
}

#[tokio::test]
async fn test_batch_with_no_committed_record_is_400() {
    let app = create_test_app().await;

    let batch = json!({ "dataArray": [fleet_record(10_000), fleet_record(20_000)] });
    let (status, body) = send(&app, "POST", "/api/fleet/transactions", Some(batch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["processedCount"], 0);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_batch_is_rejected_whole() {
    let app = create_test_app().await;

    let (status, body) = send(&app, "POST", "/api/loyalty/redemptions", Some(json!({ "records": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(&app, "PUT", "/api/loyalty/transactions/cancel", Some(json!({ "ids": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redemption_by_card_goes_negative() {
    let app = create_test_app().await;

    let record = json!({
        "numero_tarjeta": "6011000990139424",
        "establecimiento_id": 1,
        "terminal_id": 1,
        "monto": 50,
        "fecha": "2024-03-01T10:00:00Z"
    });
    let (status, _) = send(&app, "POST", "/api/loyalty/redemptions", Some(record)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/points/1", None).await;
    assert_eq!(decimal(&body["data"]["balance"]), Decimal::from(-50));
}

#[tokio::test]
async fn test_shift_lifecycle() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/shifts",
        Some(json!({
            "miembro_id": 3,
            "empresa_id": 1,
            "establecimiento_id": 1,
            "terminal_id": 8,
            "fecha_inicio": "2024-03-01T06:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let shift_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["state"], "open");

    let close = json!({ "turno_id": shift_id, "fecha_final": "2024-03-01T14:00:00Z" });
    let (status, body) = send(&app, "PUT", "/api/shifts/close", Some(close.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["turno"]["state"], "closed");
    assert_eq!(body["data"]["rowsClosed"], 0);

    let (status, body) = send(&app, "PUT", "/api/shifts/close", Some(close)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(&app, "PUT", "/api/shifts/close", Some(json!({ "turno_id": 404 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_client_points_is_404() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", "/api/points/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
