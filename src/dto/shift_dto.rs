use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{required, timestamp};
use crate::models::{NewShift, ShiftClosure};
use crate::utils::errors::AppResult;

// Request para abrir un turno
#[derive(Debug, Deserialize, Validate)]
pub struct OpenShiftRequest {
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub miembro_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub empresa_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub establecimiento_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub terminal_id: Option<i64>,
    #[validate(custom = "crate::utils::validation::validate_timestamp")]
    pub fecha_inicio: Option<String>,
}

impl OpenShiftRequest {
    pub fn into_new_shift(self, now: DateTime<Utc>) -> AppResult<NewShift> {
        let started_at = match self.fecha_inicio.as_deref() {
            Some(value) => timestamp(value, "fecha_inicio")?,
            None => now,
        };
        Ok(NewShift {
            member_id: required(self.miembro_id, "miembro_id")?,
            company_id: required(self.empresa_id, "empresa_id")?,
            establishment_id: required(self.establecimiento_id, "establecimiento_id")?,
            terminal_id: required(self.terminal_id, "terminal_id")?,
            started_at,
        })
    }
}

// Request para cerrar un turno
#[derive(Debug, Deserialize, Validate)]
pub struct CloseShiftRequest {
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub turno_id: Option<i64>,
    #[validate(custom = "crate::utils::validation::validate_timestamp")]
    pub fecha_final: Option<String>,
}

impl CloseShiftRequest {
    pub fn into_parts(self, now: DateTime<Utc>) -> AppResult<(i64, DateTime<Utc>)> {
        let ended_at = match self.fecha_final.as_deref() {
            Some(value) => timestamp(value, "fecha_final")?,
            None => now,
        };
        Ok((required(self.turno_id, "turno_id")?, ended_at))
    }
}

// Response del cierre: el turno y cuántas filas pasaron a closed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftResponse {
    pub turno: crate::models::Shift,
    pub rows_closed: u64,
    pub fleet_transactions_closed: u64,
    pub loyalty_transactions_closed: u64,
    pub redemptions_closed: u64,
}

impl From<ShiftClosure> for CloseShiftResponse {
    fn from(closure: ShiftClosure) -> Self {
        Self {
            rows_closed: closure.total_closed(),
            fleet_transactions_closed: closure.fleet_transactions_closed,
            loyalty_transactions_closed: closure.loyalty_transactions_closed,
            redemptions_closed: closure.redemptions_closed,
            turno: closure.shift,
        }
    }
}
