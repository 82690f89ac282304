//! Compensación (cancelación)
//!
//! Revierte una sola vez los efectos de una fila de hechos ya confirmada.
//! La fila se apaga con un compare-and-swap sobre `active`: si otra
//! cancelación ganó, esta no revierte nada y se reporta como ya
//! cancelada. Cada id corre en su propia unidad de trabajo.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::batch::{id_label, BatchOutcome};
use crate::models::PointsReference;
use crate::repositories::{scoped, RowLock, Store, UnitOfWork, WalletKey};
use crate::utils::errors::{not_found_error, AppResult};

/// Resultado de cancelar un id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    pub id: i64,
    /// Estado de la fila después de la cancelación (siempre `false`)
    pub estado: bool,
    /// La fila ya estaba inactiva; no se revirtió nada
    pub ya_cancelada: bool,
}

impl Cancellation {
    fn applied(id: i64) -> Self {
        Self { id, estado: false, ya_cancelada: false }
    }

    fn already_cancelled(id: i64) -> Self {
        Self { id, estado: false, ya_cancelada: true }
    }
}

#[derive(Clone)]
pub struct Compensator {
    store: Arc<dyn Store>,
}

impl Compensator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn cancel_fleet_batch(&self, ids: Vec<i64>) -> BatchOutcome<Cancellation> {
        let mut outcome = BatchOutcome::new(ids.len());
        for id in ids {
            outcome.push(id_label(id), self.cancel_fleet(id).await);
        }
        outcome
    }

    pub async fn cancel_loyalty_batch(&self, ids: Vec<i64>) -> BatchOutcome<Cancellation> {
        let mut outcome = BatchOutcome::new(ids.len());
        for id in ids {
            outcome.push(id_label(id), self.cancel_loyalty(id).await);
        }
        outcome
    }

    pub async fn cancel_redemption_batch(&self, ids: Vec<i64>) -> BatchOutcome<Cancellation> {
        let mut outcome = BatchOutcome::new(ids.len());
        for id in ids {
            outcome.push(id_label(id), self.cancel_redemption(id).await);
        }
        outcome
    }

    /// Cancela una carga de flota: libera el consumo del monedero y
    /// regresa el odómetro del vehículo a la lectura anterior
    pub async fn cancel_fleet(&self, id: i64) -> AppResult<Cancellation> {
        let result = scoped(self.store.as_ref(), move |uow| Box::pin(reverse_fleet(uow, id))).await?;
        log_cancellation("flota", &result);
        Ok(result)
    }

    /// Cancela una compra de lealtad y apaga su crédito de puntos
    pub async fn cancel_loyalty(&self, id: i64) -> AppResult<Cancellation> {
        let result = scoped(self.store.as_ref(), move |uow| Box::pin(reverse_loyalty(uow, id))).await?;
        log_cancellation("lealtad", &result);
        Ok(result)
    }

    /// Cancela un canje y apaga su débito de puntos
    pub async fn cancel_redemption(&self, id: i64) -> AppResult<Cancellation> {
        let result = scoped(self.store.as_ref(), move |uow| Box::pin(reverse_redemption(uow, id))).await?;
        log_cancellation("canje", &result);
        Ok(result)
    }
}

fn log_cancellation(kind: &str, result: &Cancellation) {
    if result.ya_cancelada {
        info!(id = result.id, kind, "ℹ️ Fila ya cancelada, sin cambios");
    } else {
        info!(id = result.id, kind, "✅ Cancelación aplicada");
    }
}

async fn reverse_fleet(uow: &mut dyn UnitOfWork, id: i64) -> AppResult<Cancellation> {
    let row = uow
        .find_fleet_transaction(id, RowLock::Exclusive)
        .await?
        .ok_or_else(|| not_found_error("Fleet transaction", id))?;

    if !row.active || !uow.deactivate_fleet_transaction(id).await? {
        return Ok(Cancellation::already_cancelled(id));
    }

    let mut wallet = uow
        .find_wallet(WalletKey::Id(row.wallet_id), RowLock::Exclusive)
        .await?
        .ok_or_else(|| not_found_error("Wallet", row.wallet_id))?;
    wallet.release(row.units);
    uow.save_wallet(&wallet).await?;
    debug!(wallet_id = wallet.id, consumed = %wallet.consumed, available = %wallet.available, "Consumo liberado");

    if let (Some(_), Some(vehicle_id)) = (row.odometer, row.vehicle_id) {
        let mut vehicle = uow
            .find_vehicle(vehicle_id, RowLock::Exclusive)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;
        vehicle.odometer = row.previous_odometer;
        uow.save_vehicle_odometer(&vehicle).await?;
    }

    Ok(Cancellation::applied(id))
}

async fn reverse_loyalty(uow: &mut dyn UnitOfWork, id: i64) -> AppResult<Cancellation> {
    let row = uow
        .find_loyalty_transaction(id, RowLock::Exclusive)
        .await?
        .ok_or_else(|| not_found_error("Loyalty transaction", id))?;

    if !row.active || !uow.deactivate_loyalty_transaction(id).await? {
        return Ok(Cancellation::already_cancelled(id));
    }

    let entries = uow.deactivate_points(PointsReference::Transaction(id)).await?;
    debug!(transaction_id = id, entries, "Créditos de puntos apagados");
    Ok(Cancellation::applied(id))
}

async fn reverse_redemption(uow: &mut dyn UnitOfWork, id: i64) -> AppResult<Cancellation> {
    let row = uow
        .find_redemption(id, RowLock::Exclusive)
        .await?
        .ok_or_else(|| not_found_error("Redemption", id))?;

    if !row.active || !uow.deactivate_redemption(id).await? {
        return Ok(Cancellation::already_cancelled(id));
    }

    let entries = uow.deactivate_points(PointsReference::Redemption(id)).await?;
    debug!(redemption_id = id, entries, "Débitos de puntos apagados");
    Ok(Cancellation::applied(id))
}
