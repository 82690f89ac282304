//! Modelo de FleetWallet
//!
//! Monedero de combustible de un vehículo de flota. Mantiene la cuota
//! `total`, lo `consumed` y lo `available`, donde siempre se cumple
//! `available == total - consumed`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::AppError;

/// Monedero de flota - mapea a la tabla fleet_wallets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FleetWallet {
    pub id: i64,
    pub vehicle_id: Option<i64>,
    pub card_id: Option<i64>,
    pub total: Decimal,
    pub consumed: Decimal,
    pub available: Decimal,
}

/// Único punto donde se deriva `available` a partir de la cuota
pub fn derive_available(total: Decimal, consumed: Decimal) -> Decimal {
    total - consumed
}

impl FleetWallet {
    pub fn new(id: i64, vehicle_id: Option<i64>, card_id: Option<i64>, total: Decimal) -> Self {
        let mut wallet = Self {
            id,
            vehicle_id,
            card_id,
            total,
            consumed: Decimal::ZERO,
            available: Decimal::ZERO,
        };
        wallet.rederive();
        wallet
    }

    /// Registra un consumo. Falla sin tocar el monedero si `consumed`
    /// superaría `total`.
    pub fn consume(&mut self, units: Decimal) -> Result<(), AppError> {
        if units <= Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "units: consumption must be positive, got {}",
                units
            )));
        }

        let consumed = match self.consumed.checked_add(units) {
            Some(consumed) if consumed <= self.total => consumed,
            _ => {
                return Err(AppError::QuotaExceeded {
                    wallet_id: self.id,
                    requested: units,
                    available: derive_available(self.total, self.consumed),
                })
            }
        };

        self.consumed = consumed;
        self.rederive();
        Ok(())
    }

    /// Revierte un consumo previo. `consumed` nunca baja de cero.
    pub fn release(&mut self, units: Decimal) {
        self.consumed = (self.consumed - units).max(Decimal::ZERO);
        self.rederive();
    }

    /// Un monedero cargado desde fuera además no puede estar sobregirado
    pub fn is_within_quota(&self) -> bool {
        self.holds_invariant() && self.consumed <= self.total
    }

    pub fn holds_invariant(&self) -> bool {
        self.consumed >= Decimal::ZERO && self.available == derive_available(self.total, self.consumed)
    }

    fn rederive(&mut self) {
        self.available = derive_available(self.total, self.consumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn wallet(total: &str, consumed: &str) -> FleetWallet {
        let mut w = FleetWallet::new(1, Some(10), None, dec(total));
        if dec(consumed) > Decimal::ZERO {
            w.consume(dec(consumed)).unwrap();
        }
        w
    }

    #[test]
    fn test_consume_and_release_round_trip() {
        let mut w = wallet("100", "40");
        assert_eq!(w.available, dec("60"));

        w.consume(dec("10")).unwrap();
        assert_eq!(w.consumed, dec("50"));
        assert_eq!(w.available, dec("50"));

        w.release(dec("10"));
        assert_eq!(w.consumed, dec("40"));
        assert_eq!(w.available, dec("60"));
        assert!(w.holds_invariant());
    }

    #[test]
    fn test_consume_over_total_leaves_wallet_untouched() {
        let mut w = wallet("100", "95");
        let before = w.clone();

        let err = w.consume(dec("5.5")).unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { wallet_id: 1, .. }));
        assert_eq!(w, before);
    }

    #[test]
    fn test_consume_exactly_to_total_is_allowed() {
        let mut w = wallet("100", "95");
        w.consume(dec("5")).unwrap();
        assert_eq!(w.available, Decimal::ZERO);
    }

    #[test]
    fn test_release_floors_at_zero() {
        let mut w = wallet("100", "3");
        w.release(dec("10"));
        assert_eq!(w.consumed, Decimal::ZERO);
        assert_eq!(w.available, dec("100"));
        assert!(w.holds_invariant());
    }

    #[test]
    fn test_consume_overflow_is_a_quota_error() {
        let mut w = wallet("100", "40");
        let before = w.clone();

        let err = w.consume(Decimal::MAX).unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { wallet_id: 1, .. }));
        assert_eq!(w, before);
    }

    #[test]
    fn test_overdrawn_wallet_is_not_within_quota() {
        let w = FleetWallet {
            id: 7,
            vehicle_id: None,
            card_id: Some(1),
            total: dec("50"),
            consumed: dec("80"),
            available: dec("-30"),
        };
        assert!(w.holds_invariant());
        assert!(!w.is_within_quota());
        assert!(wallet("100", "40").is_within_quota());
    }

    #[test]
    fn test_non_positive_consumption_rejected() {
        let mut w = wallet("100", "0");
        assert!(w.consume(Decimal::ZERO).is_err());
        assert!(w.consume(dec("-1")).is_err());
    }
}
