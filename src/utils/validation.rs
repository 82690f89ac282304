//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! usadas por los DTOs de entrada.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    /// Número de tarjeta completo: solo dígitos, entre 5 y 19
    pub static ref FULL_CARD_NUMBER: Regex = Regex::new(r"^\d{5,19}$").unwrap();
    /// Últimos cuatro dígitos de una tarjeta
    pub static ref LAST_FOUR_DIGITS: Regex = Regex::new(r"^\d{4}$").unwrap();
    /// Número de tarjeta aceptado en cualquiera de sus dos formas
    pub static ref CARD_NUMBER: Regex = Regex::new(r"^\d{4,19}$").unwrap();
}

/// Validar y convertir string a datetime
pub fn validate_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Las terminales envían a veces la fecha sin zona horaria
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
                .map(|naive| naive.and_utc())
        })
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"RFC3339".to_string());
            error
        })
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Dígitos y decimales de las columnas NUMERIC(14, 2) (montos, puntos, odómetro)
pub const AMOUNT_PRECISION: (u32, u32) = (14, 2);
/// Dígitos y decimales de las columnas NUMERIC(14, 4) (precios, unidades)
pub const UNITS_PRECISION: (u32, u32) = (14, 4);

/// `true` si el valor cabe en una columna NUMERIC(precision, scale) sin redondeo
pub fn fits_numeric(value: Decimal, (precision, scale): (u32, u32)) -> bool {
    let limit = Decimal::new(10i64.pow(precision - scale), 0);
    value.normalize().scale() <= scale && value.abs() < limit
}

/// Validar que un decimal quepa en su columna sin redondearse
pub fn validate_numeric(value: Decimal, columns: (u32, u32)) -> Result<(), ValidationError> {
    if fits_numeric(value, columns) {
        return Ok(());
    }
    let mut error = ValidationError::new("numeric_range");
    error.add_param("value".into(), &value);
    error.add_param("precision".into(), &columns.0);
    error.add_param("scale".into(), &columns.1);
    Err(error)
}

/// Validador para el derive: monto o puntos positivos
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)?;
    validate_numeric(*value, AMOUNT_PRECISION)
}

/// Validador para el derive: precio positivo
pub fn validate_positive_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)?;
    validate_numeric(*value, UNITS_PRECISION)
}

/// Validador para el derive: descuento u odómetro no negativos
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)?;
    validate_numeric(*value, AMOUNT_PRECISION)
}

/// Validador para el derive: unidades no negativas
pub fn validate_non_negative_units(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)?;
    validate_numeric(*value, UNITS_PRECISION)
}

/// Validador para el derive: fecha en formato RFC3339
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    validate_datetime(value).map(|_| ())
}

/// Validador para el derive: identificadores numéricos positivos
pub fn validate_positive_id(value: i64) -> Result<(), ValidationError> {
    validate_positive(value)
}
