//! Libro de puntos
//!
//! Cada entrada es un crédito (compra) o un débito (canje). El saldo de
//! un cliente es Σcréditos − Σdébitos sobre las entradas activas. Las
//! entradas nunca se borran; la compensación solo apaga `active`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Entrada del libro de puntos - mapea a la tabla points_entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PointsEntry {
    pub id: i64,
    pub client_id: i64,
    pub credit: Option<Decimal>,
    pub debit: Option<Decimal>,
    pub transaction_id: Option<i64>,
    pub redemption_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl PointsEntry {
    /// Aporte firmado de la entrada al saldo
    pub fn signed_amount(&self) -> Decimal {
        self.credit.unwrap_or_default() - self.debit.unwrap_or_default()
    }
}

/// Movimiento de puntos: exactamente uno de crédito o débito
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointsMovement {
    Credit(Decimal),
    Debit(Decimal),
}

impl PointsMovement {
    pub fn credit(&self) -> Option<Decimal> {
        match self {
            PointsMovement::Credit(amount) => Some(*amount),
            PointsMovement::Debit(_) => None,
        }
    }

    pub fn debit(&self) -> Option<Decimal> {
        match self {
            PointsMovement::Debit(amount) => Some(*amount),
            PointsMovement::Credit(_) => None,
        }
    }
}

/// Fila de hechos a la que pertenece una entrada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsReference {
    Transaction(i64),
    Redemption(i64),
}

/// Datos para agregar una entrada al libro
#[derive(Debug, Clone)]
pub struct NewPointsEntry {
    pub client_id: i64,
    pub movement: PointsMovement,
    pub reference: PointsReference,
    pub created_at: DateTime<Utc>,
}

impl NewPointsEntry {
    pub fn transaction_id(&self) -> Option<i64> {
        match self.reference {
            PointsReference::Transaction(id) => Some(id),
            PointsReference::Redemption(_) => None,
        }
    }

    pub fn redemption_id(&self) -> Option<i64> {
        match self.reference {
            PointsReference::Redemption(id) => Some(id),
            PointsReference::Transaction(_) => None,
        }
    }
}

/// Saldo de puntos de un cliente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PointsBalance {
    pub client_id: i64,
    pub total_credit: Decimal,
    pub total_debit: Decimal,
    pub balance: Decimal,
}

impl PointsBalance {
    /// Calcula el saldo a partir de las entradas activas
    pub fn from_entries<'a>(client_id: i64, entries: impl IntoIterator<Item = &'a PointsEntry>) -> Self {
        let (total_credit, total_debit) = entries
            .into_iter()
            .filter(|e| e.client_id == client_id && e.active)
            .fold((Decimal::ZERO, Decimal::ZERO), |(credit, debit), e| {
                (
                    credit + e.credit.unwrap_or_default(),
                    debit + e.debit.unwrap_or_default(),
                )
            });

        Self {
            client_id,
            total_credit,
            total_debit,
            balance: total_credit - total_debit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, client_id: i64, movement: PointsMovement, active: bool) -> PointsEntry {
        PointsEntry {
            id,
            client_id,
            credit: movement.credit(),
            debit: movement.debit(),
            transaction_id: None,
            redemption_id: None,
            created_at: Utc::now(),
            active,
        }
    }

    #[test]
    fn test_balance_ignores_inactive_and_other_clients() {
        let entries = vec![
            entry(1, 1, PointsMovement::Credit(Decimal::from(100)), true),
            entry(2, 1, PointsMovement::Debit(Decimal::from(30)), true),
            entry(3, 1, PointsMovement::Credit(Decimal::from(500)), false),
            entry(4, 2, PointsMovement::Credit(Decimal::from(77)), true),
        ];

        let balance = PointsBalance::from_entries(1, &entries);
        assert_eq!(balance.total_credit, Decimal::from(100));
        assert_eq!(balance.total_debit, Decimal::from(30));
        assert_eq!(balance.balance, Decimal::from(70));
        assert_eq!(entries[1].signed_amount(), Decimal::from(-30));
    }
}
