//! DTOs de entrada y salida de la API
//!
//! Los nombres de campo siguen el contrato de las terminales (`monto`,
//! `precio`, `turno_id`...).

pub mod batch;
pub mod cancel_dto;
pub mod fleet_dto;
pub mod loyalty_dto;
pub mod response;
pub mod shift_dto;

use chrono::{DateTime, Utc};

use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::validate_datetime;

pub use batch::{parse_record, parse_records, split_batch};
pub use cancel_dto::CancelRequest;
pub use fleet_dto::FleetTransactionRecord;
pub use loyalty_dto::{LoyaltyTransactionRecord, RedemptionRecord};
pub use response::{ApiResponse, BatchResponse};
pub use shift_dto::{CloseShiftRequest, CloseShiftResponse, OpenShiftRequest};

/// Campo obligatorio ya validado por el derive
pub(crate) fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| validation_error(field, "required"))
}

pub(crate) fn timestamp(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    validate_datetime(value).map_err(|_| validation_error(field, "invalid datetime"))
}
