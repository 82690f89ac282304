//! Apertura y cierre de turnos
//!
//! `closed` es terminal: cerrar un turno ya cerrado es un conflicto y no
//! cambia nada.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{NewShift, Shift, ShiftClosure};
use crate::repositories::{scoped, RowLock, Store, UnitOfWork};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

#[derive(Clone)]
pub struct ShiftCloser {
    store: Arc<dyn Store>,
}

impl ShiftCloser {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn open(&self, shift: NewShift) -> AppResult<Shift> {
        let shift = scoped(self.store.as_ref(), move |uow| {
            Box::pin(async move { uow.insert_shift(&shift).await })
        })
        .await?;
        info!(shift_id = shift.id, terminal_id = shift.terminal_id, "✅ Turno abierto");
        Ok(shift)
    }

    /// Cierra el turno y pasa a `closed` todas sus filas de hechos abiertas
    pub async fn close(&self, shift_id: i64, ended_at: DateTime<Utc>) -> AppResult<ShiftClosure> {
        let closure = scoped(self.store.as_ref(), move |uow| {
            Box::pin(close_shift(uow, shift_id, ended_at))
        })
        .await?;
        info!(
            shift_id,
            state = closure.shift.state.as_str(),
            rows_closed = closure.total_closed(),
            "✅ Turno cerrado"
        );
        Ok(closure)
    }
}

async fn close_shift(uow: &mut dyn UnitOfWork, shift_id: i64, ended_at: DateTime<Utc>) -> AppResult<ShiftClosure> {
    let shift = uow
        .find_shift(shift_id, RowLock::Exclusive)
        .await?
        .ok_or_else(|| not_found_error("Shift", shift_id))?;

    if !shift.is_open() {
        return Err(AppError::Conflict(format!("shift {} is already closed", shift_id)));
    }
    if ended_at < shift.started_at {
        return Err(validation_error("fecha_final", "must not be before the shift start"));
    }

    let rows = uow.close_shift_rows(shift_id).await?;
    let shift = uow.close_shift(shift_id, ended_at).await?;

    Ok(ShiftClosure {
        shift,
        fleet_transactions_closed: rows.fleet_transactions,
        loyalty_transactions_closed: rows.loyalty_transactions,
        redemptions_closed: rows.redemptions,
    })
}
