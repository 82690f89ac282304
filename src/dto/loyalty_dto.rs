use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{required, timestamp};
use crate::services::{IdentityLookup, LoyaltyPurchase, PointsRedemption};
use crate::utils::errors::AppError;

// Registro de compra que acumula puntos
#[derive(Debug, Deserialize, Validate)]
pub struct LoyaltyTransactionRecord {
    #[validate(custom = "crate::utils::validation::validate_positive_id")]
    pub cliente_id: Option<i64>,
    #[validate(regex = "crate::utils::validation::CARD_NUMBER")]
    pub numero_tarjeta: Option<String>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub establecimiento_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub terminal_id: Option<i64>,
    pub tipo_combustible_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_amount")]
    pub monto: Option<Decimal>,
    #[validate(custom = "crate::utils::validation::validate_positive_price")]
    pub precio: Option<Decimal>,
    #[validate(custom = "crate::utils::validation::validate_non_negative_units")]
    pub unidades: Option<Decimal>,
    #[validate(custom = "crate::utils::validation::validate_non_negative_amount")]
    pub descuento: Option<Decimal>,
    pub turno_id: Option<i64>,
    #[serde(alias = "created_at")]
    #[validate(required, custom = "crate::utils::validation::validate_timestamp")]
    pub fecha: Option<String>,
}

impl TryFrom<LoyaltyTransactionRecord> for LoyaltyPurchase {
    type Error = AppError;

    fn try_from(record: LoyaltyTransactionRecord) -> Result<Self, Self::Error> {
        Ok(LoyaltyPurchase {
            identity: IdentityLookup::from_parts(record.cliente_id, record.numero_tarjeta.as_deref())?,
            card_number: record.numero_tarjeta,
            establishment_id: required(record.establecimiento_id, "establecimiento_id")?,
            terminal_id: required(record.terminal_id, "terminal_id")?,
            fuel_type_id: record.tipo_combustible_id,
            amount: required(record.monto, "monto")?,
            price: record.precio,
            units: record.unidades,
            discount: record.descuento.unwrap_or_default(),
            shift_id: record.turno_id,
            occurred_at: timestamp(required(record.fecha, "fecha")?.as_str(), "fecha")?,
        })
    }
}

// Registro de canje de puntos
#[derive(Debug, Deserialize, Validate)]
pub struct RedemptionRecord {
    #[validate(custom = "crate::utils::validation::validate_positive_id")]
    pub cliente_id: Option<i64>,
    #[validate(regex = "crate::utils::validation::CARD_NUMBER")]
    pub numero_tarjeta: Option<String>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub establecimiento_id: Option<i64>,
    #[validate(required, custom = "crate::utils::validation::validate_positive_id")]
    pub terminal_id: Option<i64>,
    /// Puntos a canjear
    #[serde(alias = "puntos")]
    #[validate(required, custom = "crate::utils::validation::validate_positive_amount")]
    pub monto: Option<Decimal>,
    pub turno_id: Option<i64>,
    #[serde(alias = "created_at")]
    #[validate(required, custom = "crate::utils::validation::validate_timestamp")]
    pub fecha: Option<String>,
}

impl TryFrom<RedemptionRecord> for PointsRedemption {
    type Error = AppError;

    fn try_from(record: RedemptionRecord) -> Result<Self, Self::Error> {
        Ok(PointsRedemption {
            identity: IdentityLookup::from_parts(record.cliente_id, record.numero_tarjeta.as_deref())?,
            card_number: record.numero_tarjeta,
            establishment_id: required(record.establecimiento_id, "establecimiento_id")?,
            terminal_id: required(record.terminal_id, "terminal_id")?,
            points: required(record.monto, "monto")?,
            shift_id: record.turno_id,
            occurred_at: timestamp(required(record.fecha, "fecha")?.as_str(), "fecha")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::batch::parse_records;
    use crate::models::CardLookup;
    use serde_json::json;

    #[test]
    fn test_each_record_keeps_its_own_error() {
        let records = vec![
            json!({"cliente_id": 1, "establecimiento_id": 1, "terminal_id": 1, "monto": 100, "fecha": "2024-03-01T08:00:00Z"}),
            json!({"cliente_id": 1, "establecimiento_id": 1, "terminal_id": 1, "fecha": "2024-03-01T08:00:00Z"}),
            json!({"numero_tarjeta": "9424", "establecimiento_id": 1, "terminal_id": 1, "monto": 80, "fecha": "2024-03-01T08:00:00Z"}),
        ];

        let parsed = parse_records::<LoyaltyTransactionRecord, LoyaltyPurchase>(records);
        assert!(parsed[0].is_ok());
        assert!(parsed[1].as_ref().unwrap_err().to_string().contains("monto"));

        let third = parsed[2].as_ref().unwrap();
        assert_eq!(third.identity, IdentityLookup::ByCard(CardLookup::LastFour("9424".into())));
        assert_eq!(third.discount, Decimal::ZERO);
    }

    #[test]
    fn test_redemption_needs_client_or_card() {
        let parsed = parse_records::<RedemptionRecord, PointsRedemption>(vec![json!({
            "establecimiento_id": 1,
            "terminal_id": 1,
            "puntos": 50,
            "fecha": "2024-03-01T08:00:00Z"
        })]);
        assert!(parsed[0].as_ref().unwrap_err().to_string().contains("numero_tarjeta"));
    }
}
