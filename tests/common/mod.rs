#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use fuel_ledger::models::{Card, Client, FleetWallet, Shift, ShiftState, Vehicle};
use fuel_ledger::repositories::{MemoryStore, SeedData, Store};
use fuel_ledger::services::{FleetPurchase, IdentityLookup, LedgerServices, LoyaltyPurchase, PointsRedemption};

pub const FLEET_CARD: &str = "4111111111111111";
pub const CARD_WALLET_CARD: &str = "4000000000005555";
pub const LOYALTY_CARD: &str = "6011000990139424";
pub const SHARED_LAST_FOUR: &str = "1111";

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

fn card(id: i64, number: &str, client_id: Option<i64>, vehicle_id: Option<i64>) -> Card {
    Card {
        id,
        card_number: number.to_string(),
        client_id,
        vehicle_id,
        channel_id: Some(10 + id),
        subchannel_id: Some(20 + id),
    }
}

fn shift(id: i64, state: ShiftState) -> Shift {
    Shift {
        id,
        member_id: 1,
        company_id: 1,
        establishment_id: 1,
        terminal_id: id,
        started_at: at(6),
        ended_at: if state == ShiftState::Closed { Some(at(14)) } else { None },
        state,
    }
}

/// Clientes 1-3, vehículo 1 con monedero {total 100, consumed 40}, un
/// monedero de tarjeta {total 50}, turnos 1 y 2 abiertos y 3 cerrado
pub fn seed() -> SeedData {
    let mut vehicle_wallet = FleetWallet::new(1, Some(1), None, dec("100"));
    vehicle_wallet.consume(dec("40")).unwrap();

    SeedData {
        clients: vec![
            Client { id: 1, name: "Ana".into(), channel_id: Some(2) },
            Client { id: 2, name: "Beto".into(), channel_id: None },
            Client { id: 3, name: "Carla".into(), channel_id: None },
        ],
        cards: vec![
            card(1, LOYALTY_CARD, Some(1), None),
            card(2, FLEET_CARD, None, Some(1)),
            card(3, "5500000000001111", Some(2), None),
            card(4, "5500000000021111", Some(3), None),
            card(5, CARD_WALLET_CARD, None, None),
        ],
        vehicles: vec![Vehicle {
            id: 1,
            license_plate: Some("HAA-1234".into()),
            fuel_type_id: 1,
            odometer: Some(dec("1000")),
            previous_odometer: None,
        }],
        wallets: vec![vehicle_wallet, FleetWallet::new(2, None, Some(5), dec("50"))],
        shifts: vec![
            shift(1, ShiftState::Open),
            shift(2, ShiftState::Open),
            shift(3, ShiftState::Closed),
        ],
    }
}

pub async fn memory_store() -> MemoryStore {
    MemoryStore::with_seed(seed()).await.unwrap()
}

pub async fn services(allow_negative_points: bool) -> (MemoryStore, LedgerServices) {
    let store = memory_store().await;
    let shared: Arc<dyn Store> = Arc::new(store.clone());
    (store, LedgerServices::new(shared, allow_negative_points))
}

/// Carga con la tarjeta del vehículo 1: `amount / 50` unidades
pub fn fleet_purchase(amount: &str, shift_id: i64) -> FleetPurchase {
    FleetPurchase {
        amount: dec(amount),
        price: dec("50"),
        fuel_type_id: 1,
        shift_id,
        establishment_id: 1,
        card_number: FLEET_CARD.to_string(),
        vehicle_id: None,
        odometer: None,
        created_at: at(8),
    }
}

pub fn loyalty_purchase(client_id: i64, amount: &str) -> LoyaltyPurchase {
    LoyaltyPurchase {
        identity: IdentityLookup::ById(client_id),
        card_number: None,
        establishment_id: 1,
        terminal_id: 1,
        fuel_type_id: None,
        amount: dec(amount),
        price: None,
        units: None,
        discount: Decimal::ZERO,
        shift_id: None,
        occurred_at: at(9),
    }
}

pub fn redemption(client_id: i64, points: &str) -> PointsRedemption {
    PointsRedemption {
        identity: IdentityLookup::ById(client_id),
        card_number: None,
        establishment_id: 1,
        terminal_id: 1,
        points: dec(points),
        shift_id: None,
        occurred_at: at(10),
    }
}
