//! Modelo de Shift (turno)
//!
//! Un turno se abre una sola vez y `closed` es terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Estado de turno - mapea al ENUM shift_state. Lo usan tanto los
/// turnos como las filas de hechos etiquetadas con un turno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "shift_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShiftState {
    Open,
    Closed,
}

impl ShiftState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftState::Open => "open",
            ShiftState::Closed => "closed",
        }
    }
}

/// Turno de trabajo en una terminal - mapea a la tabla shifts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Shift {
    pub id: i64,
    pub member_id: i64,
    pub company_id: i64,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub state: ShiftState,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.state == ShiftState::Open
    }
}

/// Datos para abrir un turno nuevo
#[derive(Debug, Clone)]
pub struct NewShift {
    pub member_id: i64,
    pub company_id: i64,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub started_at: DateTime<Utc>,
}

/// Resultado del cierre de un turno
#[derive(Debug, Clone, Serialize)]
pub struct ShiftClosure {
    pub shift: Shift,
    pub fleet_transactions_closed: u64,
    pub loyalty_transactions_closed: u64,
    pub redemptions_closed: u64,
}

impl ShiftClosure {
    pub fn total_closed(&self) -> u64 {
        self.fleet_transactions_closed + self.loyalty_transactions_closed + self.redemptions_closed
    }
}
