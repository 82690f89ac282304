//! Modelos de Client y Card
//!
//! Los clientes y tarjetas los administran colaboradores externos; el
//! núcleo solo los lee para resolver identidades.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cliente del programa de lealtad - mapea a la tabla clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Canal de precios/descuentos del cliente
    pub channel_id: Option<i64>,
}

/// Tarjeta física - puede apuntar a un cliente, a un vehículo o a ambos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: i64,
    pub card_number: String,
    pub client_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub subchannel_id: Option<i64>,
}

/// Forma en que una terminal identifica una tarjeta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLookup {
    FullNumber(String),
    LastFour(String),
}

impl CardLookup {
    pub fn value(&self) -> &str {
        match self {
            CardLookup::FullNumber(number) | CardLookup::LastFour(number) => number,
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        match self {
            CardLookup::FullNumber(number) => card.card_number == *number,
            CardLookup::LastFour(digits) => card.last_four() == digits,
        }
    }
}

impl Card {
    pub fn last_four(&self) -> &str {
        let start = self
            .card_number
            .char_indices()
            .rev()
            .nth(3)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.card_number[start..]
    }
}
