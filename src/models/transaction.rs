//! Modelos de filas de hechos
//!
//! `FleetTransaction`, `LoyaltyTransaction` y `Redemption` son inmutables
//! salvo por `active` (lo cambia la compensación) y `shift_state` (lo
//! cambia el cierre de turno).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::shift::ShiftState;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::{fits_numeric, UNITS_PRECISION};

/// Decimales con los que se guardan las unidades calculadas
pub const UNITS_DECIMALS: u32 = 4;

/// Unidades de combustible = monto / precio, redondeadas a `UNITS_DECIMALS`.
/// El resultado debe caber en la columna `units`.
pub fn compute_units(amount: Decimal, price: Decimal) -> AppResult<Decimal> {
    if price <= Decimal::ZERO {
        return Err(validation_error("precio", "must be greater than 0"));
    }
    amount
        .checked_div(price)
        .map(|units| units.round_dp(UNITS_DECIMALS))
        .filter(|units| fits_numeric(*units, UNITS_PRECISION))
        .ok_or_else(|| validation_error("monto", "monto/precio out of range"))
}

/// Transacción de flota - mapea a la tabla fleet_transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FleetTransaction {
    pub id: i64,
    pub amount: Decimal,
    pub price: Decimal,
    pub units: Decimal,
    pub odometer: Option<Decimal>,
    pub previous_odometer: Option<Decimal>,
    pub card_number: String,
    pub card_id: i64,
    pub vehicle_id: Option<i64>,
    pub wallet_id: i64,
    pub fuel_type_id: i64,
    pub shift_id: i64,
    pub establishment_id: i64,
    pub channel_id: Option<i64>,
    pub subchannel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub shift_state: ShiftState,
    pub active: bool,
}

/// Datos para insertar una transacción de flota
#[derive(Debug, Clone)]
pub struct NewFleetTransaction {
    pub amount: Decimal,
    pub price: Decimal,
    pub units: Decimal,
    pub odometer: Option<Decimal>,
    pub previous_odometer: Option<Decimal>,
    pub card_number: String,
    pub card_id: i64,
    pub vehicle_id: Option<i64>,
    pub wallet_id: i64,
    pub fuel_type_id: i64,
    pub shift_id: i64,
    pub establishment_id: i64,
    pub channel_id: Option<i64>,
    pub subchannel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Transacción de lealtad (compra que acumula puntos) - tabla loyalty_transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LoyaltyTransaction {
    pub id: i64,
    pub client_id: i64,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub fuel_type_id: Option<i64>,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub units: Option<Decimal>,
    pub discount: Decimal,
    pub channel_id: Option<i64>,
    pub shift_id: Option<i64>,
    pub shift_state: ShiftState,
    pub occurred_at: DateTime<Utc>,
    pub active: bool,
}

/// Datos para insertar una transacción de lealtad
#[derive(Debug, Clone)]
pub struct NewLoyaltyTransaction {
    pub client_id: i64,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub fuel_type_id: Option<i64>,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub units: Option<Decimal>,
    pub discount: Decimal,
    pub channel_id: Option<i64>,
    pub shift_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Canje de puntos en punto de venta - tabla redemptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Redemption {
    pub id: i64,
    pub client_id: i64,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub points: Decimal,
    pub shift_id: Option<i64>,
    pub shift_state: ShiftState,
    pub occurred_at: DateTime<Utc>,
    pub active: bool,
}

/// Datos para insertar un canje
#[derive(Debug, Clone)]
pub struct NewRedemption {
    pub client_id: i64,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub points: Decimal,
    pub shift_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_units() {
        assert_eq!(
            compute_units(Decimal::from(500), Decimal::from(50)).unwrap(),
            Decimal::from(10)
        );
        assert_eq!(
            compute_units(Decimal::from(100), Decimal::from(3)).unwrap(),
            "33.3333".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_compute_units_rejects_non_positive_price() {
        let err = compute_units(Decimal::from(100), Decimal::ZERO).unwrap_err();
        assert!(err.to_string().contains("precio"), "{}", err);
        assert!(compute_units(Decimal::from(100), Decimal::from(-2)).is_err());
    }

    #[test]
    fn test_compute_units_out_of_range_is_not_a_price_error() {
        let err = compute_units(Decimal::MAX, Decimal::ONE).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);

        let err = compute_units(Decimal::MAX, "0.0001".parse().unwrap()).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);
        assert!(!err.to_string().contains("greater than 0"), "{}", err);
    }
}
