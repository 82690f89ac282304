mod common;

use common::{at, fleet_purchase, loyalty_purchase, redemption, services};
use fuel_ledger::models::{NewShift, ShiftState};
use fuel_ledger::utils::AppError;

#[tokio::test]
async fn test_close_moves_only_rows_of_that_shift() {
    let (store, services) = services(true).await;

    let in_shift_1 = services.processor.process_fleet(fleet_purchase("100", 1)).await.unwrap();
    let in_shift_2 = services.processor.process_fleet(fleet_purchase("100", 2)).await.unwrap();

    let mut purchase = loyalty_purchase(1, "50");
    purchase.shift_id = Some(1);
    let loyalty = services.processor.process_loyalty(purchase).await.unwrap();
    let mut spend = redemption(1, "10");
    spend.shift_id = Some(1);
    let redeemed = services.processor.process_redemption(spend).await.unwrap();
    let untagged = services.processor.process_loyalty(loyalty_purchase(2, "5")).await.unwrap();

    let closure = services.shifts.close(1, at(14)).await.unwrap();
    assert_eq!(closure.shift.state, ShiftState::Closed);
    assert_eq!(closure.shift.ended_at, Some(at(14)));
    assert_eq!(closure.fleet_transactions_closed, 1);
    assert_eq!(closure.loyalty_transactions_closed, 1);
    assert_eq!(closure.redemptions_closed, 1);
    assert_eq!(closure.total_closed(), 3);

    let state = store.snapshot().await;
    assert_eq!(state.fleet_transactions[&in_shift_1.id].shift_state, ShiftState::Closed);
    assert_eq!(state.fleet_transactions[&in_shift_2.id].shift_state, ShiftState::Open);
    assert_eq!(state.loyalty_transactions[&loyalty.id].shift_state, ShiftState::Closed);
    assert_eq!(state.redemptions[&redeemed.id].shift_state, ShiftState::Closed);
    assert_eq!(state.loyalty_transactions[&untagged.id].shift_state, ShiftState::Open);
    assert_eq!(state.shifts[&2].state, ShiftState::Open);
}

#[tokio::test]
async fn test_closing_a_closed_shift_is_a_conflict() {
    let (store, services) = services(true).await;

    services.shifts.close(2, at(14)).await.unwrap();
    let before = store.snapshot().await.shifts[&2].clone();

    let err = services.shifts.close(2, at(18)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.snapshot().await.shifts[&2], before);
}

#[tokio::test]
async fn test_closing_unknown_shift_is_not_found() {
    let (_, services) = services(true).await;
    let err = services.shifts.close(404, at(14)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_closing_empty_shift_reports_zero_rows() {
    let (_, services) = services(true).await;
    let closure = services.shifts.close(2, at(14)).await.unwrap();
    assert_eq!(closure.total_closed(), 0);
    assert_eq!(closure.shift.state, ShiftState::Closed);
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let (store, services) = services(true).await;
    let err = services.shifts.close(1, at(5)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(store.snapshot().await.shifts[&1].is_open());
}

#[tokio::test]
async fn test_opened_shift_accepts_rows_until_closed() {
    let (_, services) = services(true).await;

    let shift = services
        .shifts
        .open(NewShift {
            member_id: 9,
            company_id: 1,
            establishment_id: 4,
            terminal_id: 12,
            started_at: at(7),
        })
        .await
        .unwrap();
    assert!(shift.is_open());
    assert_eq!(shift.ended_at, None);

    services.processor.process_fleet(fleet_purchase("100", shift.id)).await.unwrap();
    let closure = services.shifts.close(shift.id, at(15)).await.unwrap();
    assert_eq!(closure.fleet_transactions_closed, 1);

    let err = services
        .processor
        .process_fleet(fleet_purchase("100", shift.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancellation_after_close_keeps_shift_state() {
    let (store, services) = services(true).await;

    let row = services.processor.process_fleet(fleet_purchase("100", 1)).await.unwrap();
    services.shifts.close(1, at(14)).await.unwrap();
    services.compensator.cancel_fleet(row.id).await.unwrap();

    let stored = store.snapshot().await.fleet_transactions[&row.id].clone();
    assert!(!stored.active);
    assert_eq!(stored.shift_state, ShiftState::Closed);
}
