//! Consultas de solo lectura sobre los saldos

use std::sync::Arc;

use serde::Serialize;

use super::identity::{parse_card_lookup, resolve_card};
use crate::models::{FleetWallet, PointsBalance};
use crate::repositories::{scoped, RowLock, Store, WalletKey};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Cómo se pide un monedero
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletQuery {
    Vehicle(i64),
    Card(String),
}

/// Disponibilidad de un monedero de flota
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletAvailability {
    #[serde(flatten)]
    pub wallet: FleetWallet,
    pub fully_consumed: bool,
}

#[derive(Clone)]
pub struct LedgerQueries {
    store: Arc<dyn Store>,
}

impl LedgerQueries {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Σ créditos activos − Σ débitos activos del cliente
    pub async fn points_balance(&self, client_id: i64) -> AppResult<PointsBalance> {
        scoped(self.store.as_ref(), move |uow| {
            Box::pin(async move {
                uow.find_client(client_id, RowLock::None)
                    .await?
                    .ok_or_else(|| not_found_error("Client", client_id))?;
                uow.points_balance(client_id).await
            })
        })
        .await
    }

    pub async fn wallet_availability(&self, query: WalletQuery) -> AppResult<WalletAvailability> {
        let wallet = scoped(self.store.as_ref(), move |uow| {
            Box::pin(async move {
                match query {
                    WalletQuery::Vehicle(vehicle_id) => uow
                        .find_wallet(WalletKey::Vehicle(vehicle_id), RowLock::None)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("no fuel wallet for vehicle {}", vehicle_id))),
                    WalletQuery::Card(raw) => {
                        let card = resolve_card(uow, &parse_card_lookup(&raw)?).await?;
                        let key = match card.vehicle_id {
                            Some(vehicle_id) => WalletKey::Vehicle(vehicle_id),
                            None => WalletKey::Card(card.id),
                        };
                        let wallet = uow.find_wallet(key, RowLock::None).await?;
                        let wallet = match wallet {
                            Some(wallet) => Some(wallet),
                            None => uow.find_wallet(WalletKey::Card(card.id), RowLock::None).await?,
                        };
                        wallet.ok_or_else(|| AppError::NotFound(format!("no fuel wallet for card '{}'", raw)))
                    }
                }
            })
        })
        .await?;

        Ok(WalletAvailability {
            fully_consumed: wallet.available <= rust_decimal::Decimal::ZERO,
            wallet,
        })
    }
}
