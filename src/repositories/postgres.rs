//! Store PostgreSQL
//!
//! Cada unidad de trabajo es una `sqlx::Transaction`. Las lecturas que
//! preceden a una escritura bloquean la fila (`FOR UPDATE`), y la
//! compensación usa `UPDATE ... WHERE active = true` como compare-and-swap,
//! de modo que dos cancelaciones concurrentes de la misma fila no pueden
//! revertir dos veces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::{ClosedRows, RowLock, Store, UnitOfWork, WalletKey};
use crate::models::{
    Card, CardLookup, Client, FleetTransaction, FleetWallet, LoyaltyTransaction,
    NewFleetTransaction, NewLoyaltyTransaction, NewPointsEntry, NewRedemption, NewShift,
    PointsBalance, PointsEntry, PointsReference, Redemption, Shift, Vehicle,
};
use crate::utils::errors::{not_found_error, AppResult};

const CLIENT_COLUMNS: &str = "id, name, channel_id";
const CARD_COLUMNS: &str = "id, card_number, client_id, vehicle_id, channel_id, subchannel_id";
const VEHICLE_COLUMNS: &str = "id, license_plate, fuel_type_id, odometer, previous_odometer";
const WALLET_COLUMNS: &str = "id, vehicle_id, card_id, total, consumed, available";
const SHIFT_COLUMNS: &str =
    "id, member_id, company_id, establishment_id, terminal_id, started_at, ended_at, state";
const FLEET_COLUMNS: &str = "id, amount, price, units, odometer, previous_odometer, card_number, \
     card_id, vehicle_id, wallet_id, fuel_type_id, shift_id, establishment_id, channel_id, \
     subchannel_id, created_at, shift_state, active";
const LOYALTY_COLUMNS: &str = "id, client_id, card_number, establishment_id, terminal_id, \
     fuel_type_id, amount, price, units, discount, channel_id, shift_id, shift_state, \
     occurred_at, active";
const REDEMPTION_COLUMNS: &str = "id, client_id, card_number, establishment_id, terminal_id, \
     points, shift_id, shift_state, occurred_at, active";
const POINTS_COLUMNS: &str =
    "id, client_id, credit, debit, transaction_id, redemption_id, created_at, active";

/// Store respaldado por un pool de PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_client(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1{}", CLIENT_COLUMNS, lock.clause());
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(client)
    }

    async fn find_cards(&mut self, lookup: &CardLookup) -> AppResult<Vec<Card>> {
        let filter = match lookup {
            CardLookup::FullNumber(_) => "card_number = $1",
            CardLookup::LastFour(_) => "RIGHT(card_number, 4) = $1",
        };
        let sql = format!("SELECT {} FROM cards WHERE {} ORDER BY id", CARD_COLUMNS, filter);
        let cards = sqlx::query_as::<_, Card>(&sql)
            .bind(lookup.value())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(cards)
    }

    async fn find_vehicle(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles WHERE id = $1{}", VEHICLE_COLUMNS, lock.clause());
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(vehicle)
    }

    async fn save_vehicle_odometer(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE vehicles SET odometer = $2, previous_odometer = $3 WHERE id = $1",
        )
        .bind(vehicle.id)
        .bind(vehicle.odometer)
        .bind(vehicle.previous_odometer)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", vehicle.id));
        }
        Ok(())
    }

    async fn find_wallet(&mut self, key: WalletKey, lock: RowLock) -> AppResult<Option<FleetWallet>> {
        let (column, value) = match key {
            WalletKey::Id(id) => ("id", id),
            WalletKey::Vehicle(id) => ("vehicle_id", id),
            WalletKey::Card(id) => ("card_id", id),
        };
        let sql = format!(
            "SELECT {} FROM fleet_wallets WHERE {} = $1 ORDER BY id LIMIT 1{}",
            WALLET_COLUMNS,
            column,
            lock.clause()
        );
        let wallet = sqlx::query_as::<_, FleetWallet>(&sql)
            .bind(value)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(wallet)
    }

    async fn save_wallet(&mut self, wallet: &FleetWallet) -> AppResult<()> {
        // La restricción CHECK de la tabla vuelve a validar la cuota
        let result = sqlx::query(
            "UPDATE fleet_wallets SET consumed = $2, available = $3 WHERE id = $1",
        )
        .bind(wallet.id)
        .bind(wallet.consumed)
        .bind(wallet.available)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Wallet", wallet.id));
        }
        Ok(())
    }

    async fn insert_shift(&mut self, shift: &NewShift) -> AppResult<Shift> {
        let sql = format!(
            r#"
            INSERT INTO shifts (member_id, company_id, establishment_id, terminal_id, started_at, state)
            VALUES ($1, $2, $3, $4, $5, 'open'::shift_state)
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        );
        let row = sqlx::query_as::<_, Shift>(&sql)
            .bind(shift.member_id)
            .bind(shift.company_id)
            .bind(shift.establishment_id)
            .bind(shift.terminal_id)
            .bind(shift.started_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_shift(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Shift>> {
        let sql = format!("SELECT {} FROM shifts WHERE id = $1{}", SHIFT_COLUMNS, lock.clause());
        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(shift)
    }

    async fn close_shift(&mut self, id: i64, ended_at: DateTime<Utc>) -> AppResult<Shift> {
        let sql = format!(
            "UPDATE shifts SET state = 'closed'::shift_state, ended_at = $2 WHERE id = $1 RETURNING {}",
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .bind(ended_at)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| not_found_error("Shift", id))
    }

    async fn close_shift_rows(&mut self, shift_id: i64) -> AppResult<ClosedRows> {
        let mut closed = ClosedRows::default();

        for (table, slot) in [
            ("fleet_transactions", &mut closed.fleet_transactions),
            ("loyalty_transactions", &mut closed.loyalty_transactions),
            ("redemptions", &mut closed.redemptions),
        ] {
            let sql = format!(
                "UPDATE {} SET shift_state = 'closed'::shift_state \
                 WHERE shift_id = $1 AND shift_state = 'open'::shift_state",
                table
            );
            let result = sqlx::query(&sql).bind(shift_id).execute(&mut *self.tx).await?;
            *slot = result.rows_affected();
        }

        Ok(closed)
    }

    async fn insert_fleet_transaction(&mut self, new: &NewFleetTransaction) -> AppResult<FleetTransaction> {
        let sql = format!(
            r#"
            INSERT INTO fleet_transactions (
                amount, price, units, odometer, previous_odometer, card_number, card_id,
                vehicle_id, wallet_id, fuel_type_id, shift_id, establishment_id, channel_id,
                subchannel_id, created_at, shift_state, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    'open'::shift_state, true)
            RETURNING {}
            "#,
            FLEET_COLUMNS
        );
        let row = sqlx::query_as::<_, FleetTransaction>(&sql)
            .bind(new.amount)
            .bind(new.price)
            .bind(new.units)
            .bind(new.odometer)
            .bind(new.previous_odometer)
            .bind(&new.card_number)
            .bind(new.card_id)
            .bind(new.vehicle_id)
            .bind(new.wallet_id)
            .bind(new.fuel_type_id)
            .bind(new.shift_id)
            .bind(new.establishment_id)
            .bind(new.channel_id)
            .bind(new.subchannel_id)
            .bind(new.created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_fleet_transaction(&mut self, id: i64, lock: RowLock) -> AppResult<Option<FleetTransaction>> {
        let sql = format!(
            "SELECT {} FROM fleet_transactions WHERE id = $1{}",
            FLEET_COLUMNS,
            lock.clause()
        );
        let row = sqlx::query_as::<_, FleetTransaction>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn deactivate_fleet_transaction(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE fleet_transactions SET active = false WHERE id = $1 AND active = true")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_loyalty_transaction(&mut self, new: &NewLoyaltyTransaction) -> AppResult<LoyaltyTransaction> {
        let sql = format!(
            r#"
            INSERT INTO loyalty_transactions (
                client_id, card_number, establishment_id, terminal_id, fuel_type_id, amount,
                price, units, discount, channel_id, shift_id, occurred_at, shift_state, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'open'::shift_state, true)
            RETURNING {}
            "#,
            LOYALTY_COLUMNS
        );
        let row = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
            .bind(new.client_id)
            .bind(&new.card_number)
            .bind(new.establishment_id)
            .bind(new.terminal_id)
            .bind(new.fuel_type_id)
            .bind(new.amount)
            .bind(new.price)
            .bind(new.units)
            .bind(new.discount)
            .bind(new.channel_id)
            .bind(new.shift_id)
            .bind(new.occurred_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_loyalty_transaction(&mut self, id: i64, lock: RowLock) -> AppResult<Option<LoyaltyTransaction>> {
        let sql = format!(
            "SELECT {} FROM loyalty_transactions WHERE id = $1{}",
            LOYALTY_COLUMNS,
            lock.clause()
        );
        let row = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn deactivate_loyalty_transaction(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE loyalty_transactions SET active = false WHERE id = $1 AND active = true")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_redemption(&mut self, new: &NewRedemption) -> AppResult<Redemption> {
        let sql = format!(
            r#"
            INSERT INTO redemptions (
                client_id, card_number, establishment_id, terminal_id, points, shift_id,
                occurred_at, shift_state, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open'::shift_state, true)
            RETURNING {}
            "#,
            REDEMPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, Redemption>(&sql)
            .bind(new.client_id)
            .bind(&new.card_number)
            .bind(new.establishment_id)
            .bind(new.terminal_id)
            .bind(new.points)
            .bind(new.shift_id)
            .bind(new.occurred_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_redemption(&mut self, id: i64, lock: RowLock) -> AppResult<Option<Redemption>> {
        let sql = format!(
            "SELECT {} FROM redemptions WHERE id = $1{}",
            REDEMPTION_COLUMNS,
            lock.clause()
        );
        let row = sqlx::query_as::<_, Redemption>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn deactivate_redemption(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE redemptions SET active = false WHERE id = $1 AND active = true")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn append_points(&mut self, entry: &NewPointsEntry) -> AppResult<PointsEntry> {
        let sql = format!(
            r#"
            INSERT INTO points_entries (client_id, credit, debit, transaction_id, redemption_id, created_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, true)
            RETURNING {}
            "#,
            POINTS_COLUMNS
        );
        let row = sqlx::query_as::<_, PointsEntry>(&sql)
            .bind(entry.client_id)
            .bind(entry.movement.credit())
            .bind(entry.movement.debit())
            .bind(entry.transaction_id())
            .bind(entry.redemption_id())
            .bind(entry.created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn deactivate_points(&mut self, reference: PointsReference) -> AppResult<u64> {
        let (column, id) = match reference {
            PointsReference::Transaction(id) => ("transaction_id", id),
            PointsReference::Redemption(id) => ("redemption_id", id),
        };
        let sql = format!(
            "UPDATE points_entries SET active = false WHERE {} = $1 AND active = true",
            column
        );
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn points_balance(&mut self, client_id: i64) -> AppResult<PointsBalance> {
        let balance = sqlx::query_as::<_, PointsBalance>(
            r#"
            SELECT $1::BIGINT AS client_id,
                   COALESCE(SUM(credit), 0) AS total_credit,
                   COALESCE(SUM(debit), 0) AS total_debit,
                   COALESCE(SUM(credit), 0) - COALESCE(SUM(debit), 0) AS balance
            FROM points_entries
            WHERE client_id = $1 AND active = true
            "#,
        )
        .bind(client_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
