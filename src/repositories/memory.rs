//! Store en memoria
//!
//! Guarda todas las tablas detrás de un único mutex asíncrono. Cada
//! unidad de trabajo toma el mutex durante toda su vida y trabaja sobre
//! una copia; confirmar reemplaza el estado, revertir la descarta. Con
//! eso las unidades de trabajo quedan serializadas.
//!
//! Se usa en pruebas y con `LEDGER_STORE=memory` para desarrollo local.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ClosedRows, RowLock, Store, UnitOfWork, WalletKey};
use crate::models::{
    Card, CardLookup, Client, FleetTransaction, FleetWallet, LoyaltyTransaction,
    NewFleetTransaction, NewLoyaltyTransaction, NewPointsEntry, NewRedemption, NewShift,
    PointsBalance, PointsEntry, PointsReference, Redemption, Shift, ShiftState, Vehicle,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Tablas del store en memoria
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryState {
    pub clients: BTreeMap<i64, Client>,
    pub cards: BTreeMap<i64, Card>,
    pub vehicles: BTreeMap<i64, Vehicle>,
    pub wallets: BTreeMap<i64, FleetWallet>,
    pub shifts: BTreeMap<i64, Shift>,
    pub fleet_transactions: BTreeMap<i64, FleetTransaction>,
    pub loyalty_transactions: BTreeMap<i64, LoyaltyTransaction>,
    pub redemptions: BTreeMap<i64, Redemption>,
    pub points_entries: BTreeMap<i64, PointsEntry>,
}

impl MemoryState {
    pub fn points_balance(&self, client_id: i64) -> PointsBalance {
        PointsBalance::from_entries(client_id, self.points_entries.values())
    }

    pub fn wallet_for_vehicle(&self, vehicle_id: i64) -> Option<&FleetWallet> {
        self.wallets.values().find(|w| w.vehicle_id == Some(vehicle_id))
    }
}

/// Datos maestros con los que se puebla el store (lo que en producción
/// administran otros sistemas)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub clients: Vec<Client>,
    pub cards: Vec<Card>,
    pub vehicles: Vec<Vehicle>,
    pub wallets: Vec<FleetWallet>,
    pub shifts: Vec<Shift>,
}

impl SeedData {
    /// Carga los datos maestros desde un archivo JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Internal(format!("cannot read seed file {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(format!("invalid seed file {}: {}", path.display(), e)))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_seed(seed: SeedData) -> AppResult<Self> {
        let store = Self::new();
        store.seed(seed).await?;
        Ok(store)
    }

    /// Agrega datos maestros. Rechaza monederos que no cumplan la cuota.
    pub async fn seed(&self, seed: SeedData) -> AppResult<()> {
        let mut state = self.state.lock().await;

        if let Some(bad) = seed.wallets.iter().find(|w| !w.is_within_quota()) {
            return Err(AppError::Validation(format!(
                "wallet {}: available must equal total - consumed with 0 <= consumed <= total",
                bad.id
            )));
        }

        state.clients.extend(seed.clients.into_iter().map(|c| (c.id, c)));
        state.cards.extend(seed.cards.into_iter().map(|c| (c.id, c)));
        state.vehicles.extend(seed.vehicles.into_iter().map(|v| (v.id, v)));
        state.wallets.extend(seed.wallets.into_iter().map(|w| (w.id, w)));
        state.shifts.extend(seed.shifts.into_iter().map(|s| (s.id, s)));
        Ok(())
    }

    /// Copia del estado confirmado
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_client(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<Client>> {
        Ok(self.working.clients.get(&id).cloned())
    }

    async fn find_cards(&mut self, lookup: &CardLookup) -> AppResult<Vec<Card>> {
        Ok(self
            .working
            .cards
            .values()
            .filter(|card| lookup.matches(card))
            .cloned()
            .collect())
    }

    async fn find_vehicle(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<Vehicle>> {
        Ok(self.working.vehicles.get(&id).cloned())
    }

    async fn save_vehicle_odometer(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let stored = self
            .working
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or_else(|| not_found_error("Vehicle", vehicle.id))?;
        stored.odometer = vehicle.odometer;
        stored.previous_odometer = vehicle.previous_odometer;
        Ok(())
    }

    async fn find_wallet(&mut self, key: WalletKey, _lock: RowLock) -> AppResult<Option<FleetWallet>> {
        let wallets = &self.working.wallets;
        let wallet = match key {
            WalletKey::Id(id) => wallets.get(&id),
            WalletKey::Vehicle(vehicle_id) => wallets.values().find(|w| w.vehicle_id == Some(vehicle_id)),
            WalletKey::Card(card_id) => wallets.values().find(|w| w.card_id == Some(card_id)),
        };
        Ok(wallet.cloned())
    }

    async fn save_wallet(&mut self, wallet: &FleetWallet) -> AppResult<()> {
        if !wallet.holds_invariant() {
            return Err(AppError::Internal(format!(
                "wallet {} violates available = total - consumed",
                wallet.id
            )));
        }
        let stored = self
            .working
            .wallets
            .get_mut(&wallet.id)
            .ok_or_else(|| not_found_error("Wallet", wallet.id))?;
        stored.consumed = wallet.consumed;
        stored.available = wallet.available;
        Ok(())
    }

    async fn insert_shift(&mut self, shift: &NewShift) -> AppResult<Shift> {
        let row = Shift {
            id: next_id(&self.working.shifts),
            member_id: shift.member_id,
            company_id: shift.company_id,
            establishment_id: shift.establishment_id,
            terminal_id: shift.terminal_id,
            started_at: shift.started_at,
            ended_at: None,
            state: ShiftState::Open,
        };
        self.working.shifts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_shift(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<Shift>> {
        Ok(self.working.shifts.get(&id).cloned())
    }

    async fn close_shift(&mut self, id: i64, ended_at: DateTime<Utc>) -> AppResult<Shift> {
        let shift = self
            .working
            .shifts
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Shift", id))?;
        shift.state = ShiftState::Closed;
        shift.ended_at = Some(ended_at);
        Ok(shift.clone())
    }

    async fn close_shift_rows(&mut self, shift_id: i64) -> AppResult<ClosedRows> {
        let mut closed = ClosedRows::default();

        for row in self.working.fleet_transactions.values_mut() {
            if row.shift_id == shift_id && row.shift_state == ShiftState::Open {
                row.shift_state = ShiftState::Closed;
                closed.fleet_transactions += 1;
            }
        }
        for row in self.working.loyalty_transactions.values_mut() {
            if row.shift_id == Some(shift_id) && row.shift_state == ShiftState::Open {
                row.shift_state = ShiftState::Closed;
                closed.loyalty_transactions += 1;
            }
        }
        for row in self.working.redemptions.values_mut() {
            if row.shift_id == Some(shift_id) && row.shift_state == ShiftState::Open {
                row.shift_state = ShiftState::Closed;
                closed.redemptions += 1;
            }
        }

        Ok(closed)
    }

    async fn insert_fleet_transaction(&mut self, new: &NewFleetTransaction) -> AppResult<FleetTransaction> {
        let row = FleetTransaction {
            id: next_id(&self.working.fleet_transactions),
            amount: new.amount,
            price: new.price,
            units: new.units,
            odometer: new.odometer,
            previous_odometer: new.previous_odometer,
            card_number: new.card_number.clone(),
            card_id: new.card_id,
            vehicle_id: new.vehicle_id,
            wallet_id: new.wallet_id,
            fuel_type_id: new.fuel_type_id,
            shift_id: new.shift_id,
            establishment_id: new.establishment_id,
            channel_id: new.channel_id,
            subchannel_id: new.subchannel_id,
            created_at: new.created_at,
            shift_state: ShiftState::Open,
            active: true,
        };
        self.working.fleet_transactions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_fleet_transaction(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<FleetTransaction>> {
        Ok(self.working.fleet_transactions.get(&id).cloned())
    }

    async fn deactivate_fleet_transaction(&mut self, id: i64) -> AppResult<bool> {
        Ok(match self.working.fleet_transactions.get_mut(&id) {
            Some(row) if row.active => {
                row.active = false;
                true
            }
            _ => false,
        })
    }

    async fn insert_loyalty_transaction(&mut self, new: &NewLoyaltyTransaction) -> AppResult<LoyaltyTransaction> {
        let row = LoyaltyTransaction {
            id: next_id(&self.working.loyalty_transactions),
            client_id: new.client_id,
            card_number: new.card_number.clone(),
            establishment_id: new.establishment_id,
            terminal_id: new.terminal_id,
            fuel_type_id: new.fuel_type_id,
            amount: new.amount,
            price: new.price,
            units: new.units,
            discount: new.discount,
            channel_id: new.channel_id,
            shift_id: new.shift_id,
            shift_state: ShiftState::Open,
            occurred_at: new.occurred_at,
            active: true,
        };
        self.working.loyalty_transactions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_loyalty_transaction(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<LoyaltyTransaction>> {
        Ok(self.working.loyalty_transactions.get(&id).cloned())
    }

    async fn deactivate_loyalty_transaction(&mut self, id: i64) -> AppResult<bool> {
        Ok(match self.working.loyalty_transactions.get_mut(&id) {
            Some(row) if row.active => {
                row.active = false;
                true
            }
            _ => false,
        })
    }

    async fn insert_redemption(&mut self, new: &NewRedemption) -> AppResult<Redemption> {
        let row = Redemption {
            id: next_id(&self.working.redemptions),
            client_id: new.client_id,
            card_number: new.card_number.clone(),
            establishment_id: new.establishment_id,
            terminal_id: new.terminal_id,
            points: new.points,
            shift_id: new.shift_id,
            shift_state: ShiftState::Open,
            occurred_at: new.occurred_at,
            active: true,
        };
        self.working.redemptions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_redemption(&mut self, id: i64, _lock: RowLock) -> AppResult<Option<Redemption>> {
        Ok(self.working.redemptions.get(&id).cloned())
    }

    async fn deactivate_redemption(&mut self, id: i64) -> AppResult<bool> {
        Ok(match self.working.redemptions.get_mut(&id) {
            Some(row) if row.active => {
                row.active = false;
                true
            }
            _ => false,
        })
    }

    async fn append_points(&mut self, entry: &NewPointsEntry) -> AppResult<PointsEntry> {
        let row = PointsEntry {
            id: next_id(&self.working.points_entries),
            client_id: entry.client_id,
            credit: entry.movement.credit(),
            debit: entry.movement.debit(),
            transaction_id: entry.transaction_id(),
            redemption_id: entry.redemption_id(),
            created_at: entry.created_at,
            active: true,
        };
        self.working.points_entries.insert(row.id, row.clone());
        Ok(row)
    }

    async fn deactivate_points(&mut self, reference: PointsReference) -> AppResult<u64> {
        let mut flipped = 0;
        for entry in self.working.points_entries.values_mut() {
            let belongs = match reference {
                PointsReference::Transaction(id) => entry.transaction_id == Some(id),
                PointsReference::Redemption(id) => entry.redemption_id == Some(id),
            };
            if belongs && entry.active {
                entry.active = false;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn points_balance(&mut self, client_id: i64) -> AppResult<PointsBalance> {
        Ok(self.working.points_balance(client_id))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
