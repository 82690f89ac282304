//! Modelo de Vehicle
//!
//! Vehículo de flota. Cada vehículo tiene un tipo de combustible y
//! exactamente un monedero (`FleetWallet`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: Option<String>,
    pub fuel_type_id: i64,
    /// Lectura actual del odómetro
    pub odometer: Option<Decimal>,
    /// Lectura que `odometer` reemplazó en la última transacción
    pub previous_odometer: Option<Decimal>,
}

impl Vehicle {
    /// Aplica una nueva lectura y devuelve la que reemplazó
    pub fn advance_odometer(&mut self, reading: Decimal) -> Option<Decimal> {
        let previous = self.odometer;
        self.previous_odometer = previous;
        self.odometer = Some(reading);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_odometer_keeps_previous_reading() {
        let mut vehicle = Vehicle {
            id: 7,
            license_plate: Some("HAA-1234".to_string()),
            fuel_type_id: 1,
            odometer: Some(Decimal::from(1_000)),
            previous_odometer: None,
        };

        let replaced = vehicle.advance_odometer(Decimal::from(1_250));
        assert_eq!(replaced, Some(Decimal::from(1_000)));
        assert_eq!(vehicle.odometer, Some(Decimal::from(1_250)));
        assert_eq!(vehicle.previous_odometer, Some(Decimal::from(1_000)));
    }
}
