//! Resolución de identidades
//!
//! Una sola capacidad de búsqueda para todos los caminos de escritura:
//! por id directo, por número completo de tarjeta o por sus últimos
//! cuatro dígitos.

use crate::models::{Card, CardLookup, Client, Shift};
use crate::repositories::{RowLock, UnitOfWork};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{FULL_CARD_NUMBER, LAST_FOUR_DIGITS};

/// Cómo identifica el registro de entrada a su dueño
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityLookup {
    ById(i64),
    ByCard(CardLookup),
}

impl IdentityLookup {
    /// El id directo gana sobre la tarjeta
    pub fn from_parts(id: Option<i64>, card: Option<&str>) -> AppResult<Self> {
        match (id, card) {
            (Some(id), _) => Ok(IdentityLookup::ById(id)),
            (None, Some(card)) => parse_card_lookup(card).map(IdentityLookup::ByCard),
            (None, None) => Err(validation_error(
                "cliente_id",
                "either cliente_id or numero_tarjeta is required",
            )),
        }
    }
}

/// Cuatro dígitos se buscan por terminación; más dígitos, por número completo
pub fn parse_card_lookup(raw: &str) -> AppResult<CardLookup> {
    let card = raw.trim();
    if LAST_FOUR_DIGITS.is_match(card) {
        Ok(CardLookup::LastFour(card.to_string()))
    } else if FULL_CARD_NUMBER.is_match(card) {
        Ok(CardLookup::FullNumber(card.to_string()))
    } else {
        Err(validation_error(
            "numero_tarjeta",
            "must be the last four digits or a full card number",
        ))
    }
}

/// Resuelve una tarjeta única. Una terminación compartida por varias
/// tarjetas es ambigua.
pub async fn resolve_card(uow: &mut dyn UnitOfWork, lookup: &CardLookup) -> AppResult<Card> {
    let mut cards = uow.find_cards(lookup).await?;
    match cards.len() {
        0 => Err(not_found_error("Card", lookup.value())),
        1 => Ok(cards.remove(0)),
        n => Err(AppError::Conflict(format!(
            "card '{}' is ambiguous: it matches {} cards",
            lookup.value(),
            n
        ))),
    }
}

/// Resuelve el cliente de un registro de lealtad
pub async fn resolve_client(
    uow: &mut dyn UnitOfWork,
    lookup: &IdentityLookup,
    lock: RowLock,
) -> AppResult<Client> {
    let client_id = match lookup {
        IdentityLookup::ById(id) => *id,
        IdentityLookup::ByCard(card) => client_id_for_card(uow, card).await?,
    };

    uow.find_client(client_id, lock)
        .await?
        .ok_or_else(|| not_found_error("Client", client_id))
}

async fn client_id_for_card(uow: &mut dyn UnitOfWork, lookup: &CardLookup) -> AppResult<i64> {
    let cards = uow.find_cards(lookup).await?;
    if cards.is_empty() {
        return Err(not_found_error("Card", lookup.value()));
    }

    let mut client_ids: Vec<i64> = cards.iter().filter_map(|card| card.client_id).collect();
    client_ids.sort_unstable();
    client_ids.dedup();

    match client_ids.as_slice() {
        [] => Err(AppError::NotFound(format!(
            "card '{}' is not linked to a client",
            lookup.value()
        ))),
        [client_id] => Ok(*client_id),
        _ => Err(AppError::Conflict(format!(
            "card '{}' is ambiguous: it matches cards of {} clients",
            lookup.value(),
            client_ids.len()
        ))),
    }
}

/// Solo se agregan filas de hechos a turnos existentes y abiertos. El
/// bloqueo compartido impide que el turno se cierre mientras tanto.
pub async fn require_open_shift(uow: &mut dyn UnitOfWork, shift_id: i64) -> AppResult<Shift> {
    let shift = uow
        .find_shift(shift_id, RowLock::Shared)
        .await?
        .ok_or_else(|| not_found_error("Shift", shift_id))?;

    if !shift.is_open() {
        return Err(AppError::Conflict(format!("shift {} is closed", shift_id)));
    }
    Ok(shift)
}
