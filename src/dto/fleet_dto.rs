use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{required, timestamp};
use crate::services::FleetPurchase;
use crate::utils::errors::AppError;

// Registro de carga de combustible con tarjeta de flota
#[derive(Debug, Deserialize, Validate)]
pub struct FleetTransactionRecord {
    #[validate(required, custom = "crate::utils::validation::validate_positive_amount")]
    pub monto: Option<Decimal>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_price")]
    pub precio: Option<Decimal>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub tipo_combustible_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub turno_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub establecimiento_id: Option<i64>,
    #[validate(required, regex = "crate::utils::validation::CARD_NUMBER")]
    pub numero_tarjeta: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_positive_id")]
    pub vehiculo_id: Option<i64>,
    #[validate(custom = "crate::utils::validation::validate_non_negative_amount")]
    pub odometro: Option<Decimal>,
    #[validate(required, custom = "crate::utils::validation::validate_timestamp")]
    pub created_at: Option<String>,
}

impl TryFrom<FleetTransactionRecord> for FleetPurchase {
    type Error = AppError;

    fn try_from(record: FleetTransactionRecord) -> Result<Self, Self::Error> {
        Ok(FleetPurchase {
            amount: required(record.monto, "monto")?,
            price: required(record.precio, "precio")?,
            fuel_type_id: required(record.tipo_combustible_id, "tipo_combustible_id")?,
            shift_id: required(record.turno_id, "turno_id")?,
            establishment_id: required(record.establecimiento_id, "establecimiento_id")?,
            card_number: required(record.numero_tarjeta, "numero_tarjeta")?,
            vehicle_id: record.vehiculo_id,
            odometer: record.odometro,
            created_at: timestamp(required(record.created_at, "created_at")?.as_str(), "created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::batch::parse_record;
    use serde_json::json;

    #[test]
    fn test_missing_and_invalid_fields_are_named() {
        let err = parse_record::<FleetTransactionRecord>(json!({
            "precio": 0,
            "tipo_combustible_id": 1,
            "turno_id": 1,
            "establecimiento_id": 1,
            "numero_tarjeta": "6011000990139424",
            "created_at": "2024-03-01T08:00:00Z"
        }))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("monto: required"), "{}", message);
        assert!(message.contains("precio: positive"), "{}", message);
    }

    #[test]
    fn test_card_number_must_be_a_string() {
        let err = parse_record::<FleetTransactionRecord>(json!({
            "monto": 500,
            "precio": 25,
            "tipo_combustible_id": 1,
            "turno_id": 1,
            "establecimiento_id": 1,
            "numero_tarjeta": 6011000990139424u64,
            "created_at": "2024-03-01T08:00:00Z"
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_valid_record_converts() {
        let record = parse_record::<FleetTransactionRecord>(json!({
            "monto": 500,
            "precio": "25.00",
            "tipo_combustible_id": 1,
            "turno_id": 3,
            "establecimiento_id": 2,
            "numero_tarjeta": "6011000990139424",
            "odometro": 15200,
            "created_at": "2024-03-01 08:00:00"
        }))
        .unwrap();

        let purchase = FleetPurchase::try_from(record).unwrap();
        assert_eq!(purchase.amount, Decimal::from(500));
        assert_eq!(purchase.shift_id, 3);
        assert_eq!(purchase.odometer, Some(Decimal::from(15200)));
        assert_eq!(purchase.vehicle_id, None);
    }

    #[test]
    fn test_amounts_that_do_not_fit_the_ledger_are_rejected() {
        let err = parse_record::<FleetTransactionRecord>(json!({
            "monto": "79228162514264337593543950335",
            "precio": "25.12345",
            "tipo_combustible_id": 1,
            "turno_id": 1,
            "establecimiento_id": 1,
            "numero_tarjeta": "6011000990139424",
            "odometro": "15200.005",
            "created_at": "2024-03-01T08:00:00Z"
        }))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("monto: numeric_range"), "{}", message);
        assert!(message.contains("precio: numeric_range"), "{}", message);
        assert!(message.contains("odometro: numeric_range"), "{}", message);
    }
}
