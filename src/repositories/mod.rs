//! Repositorios y unidad de trabajo
//!
//! Todo acceso a datos del núcleo pasa por un `UnitOfWork`: una
//! transacción con alcance que se confirma entera o se revierte entera.
//! `Store` abre unidades de trabajo; hay una implementación PostgreSQL
//! (`PgStore`) y una en memoria (`MemoryStore`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tracing::warn;

use crate::models::{
    Card, CardLookup, Client, FleetTransaction, FleetWallet, LoyaltyTransaction,
    NewFleetTransaction, NewLoyaltyTransaction, NewPointsEntry, NewRedemption, NewShift,
    PointsBalance, PointsEntry, PointsReference, Redemption, Shift, Vehicle,
};
use crate::utils::errors::AppResult;

pub use memory::{MemoryState, MemoryStore, SeedData};
pub use postgres::PgStore;

/// Bloqueo de fila pedido al leer dentro de una unidad de trabajo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    None,
    /// Impide que otra unidad de trabajo modifique la fila (FOR SHARE)
    Shared,
    /// Serializa lectura-modificación-escritura sobre la fila (FOR UPDATE)
    Exclusive,
}

impl RowLock {
    pub fn clause(&self) -> &'static str {
        match self {
            RowLock::None => "",
            RowLock::Shared => " FOR SHARE",
            RowLock::Exclusive => " FOR UPDATE",
        }
    }
}

/// Claves por las que se alcanza un monedero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKey {
    Id(i64),
    Vehicle(i64),
    Card(i64),
}

/// Filas de hechos pasadas de `open` a `closed` en un cierre de turno
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosedRows {
    pub fleet_transactions: u64,
    pub loyalty_transactions: u64,
    pub redemptions: u64,
}

/// Operaciones de lectura y escritura disponibles dentro de una transacción
#[async_trait]
pub trait UnitOfWork: Send {
    // Identidades
    async fn find_client(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Client>>;
    async fn find_cards(&mut self, lookup: &CardLookup) -> AppResult<Vec<Card>>;
    async fn find_vehicle(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Vehicle>>;
    async fn save_vehicle_odometer(&mut self, vehicle: &Vehicle) -> AppResult<()>;

    // Monederos
    async fn find_wallet(&mut self, key: WalletKey, lock: RowLock) -> AppResult<Option<FleetWallet>>;
    async fn save_wallet(&mut self, wallet: &FleetWallet) -> AppResult<()>;

    // Turnos
    async fn insert_shift(&mut self, shift: &NewShift) -> AppResult<Shift>;
    async fn find_shift(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Shift>>;
    async fn close_shift(&mut self, id: i64, ended_at: DateTime<Utc>) -> AppResult<Shift>;
    async fn close_shift_rows(&mut self, shift_id: i64) -> AppResult<ClosedRows>;

    // Filas de hechos
    async fn insert_fleet_transaction(&mut self, new: &NewFleetTransaction) -> AppResult<FleetTransaction>;
    async fn find_fleet_transaction(&mut self, id: i64, lock: RowLock) -> AppResult<Option<FleetTransaction>>;
    async fn deactivate_fleet_transaction(&mut self, id: i64) -> AppResult<bool>;

    async fn insert_loyalty_transaction(&mut self, new: &NewLoyaltyTransaction) -> AppResult<LoyaltyTransaction>;
    async fn find_loyalty_transaction(&mut self, id: i64, lock: RowLock) -> AppResult<Option<LoyaltyTransaction>>;
    async fn deactivate_loyalty_transaction(&mut self, id: i64) -> AppResult<bool>;

    async fn insert_redemption(&mut self, new: &NewRedemption) -> AppResult<Redemption>;
    async fn find_redemption(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Redemption>>;
    async fn deactivate_redemption(&mut self, id: i64) -> AppResult<bool>;

    // Libro de puntos
    async fn append_points(&mut self, entry: &NewPointsEntry) -> AppResult<PointsEntry>;
    async fn deactivate_points(&mut self, reference: PointsReference) -> AppResult<u64>;
    async fn points_balance(&mut self, client_id: i64) -> AppResult<PointsBalance>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Fábrica de unidades de trabajo
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// Ejecuta `work` dentro de una unidad de trabajo nueva.
///
/// Si `work` devuelve `Ok` se confirma; si devuelve `Err` se revierte y
/// se propaga el error original. Si el futuro se cancela, la unidad de
/// trabajo se descarta y también se revierte.
pub async fn scoped<T, F>(store: &dyn Store, work: F) -> AppResult<T>
where
    T: Send,
    F: for<'u> FnOnce(&'u mut dyn UnitOfWork) -> BoxFuture<'u, AppResult<T>> + Send,
{
    let mut uow = store.begin().await?;

    match work(&mut *uow).await {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "⚠️ Rollback falló después de: {}", err);
            }
            Err(err)
        }
    }
}
