//! Procesador de transacciones
//!
//! Cada registro de un lote se procesa en su propia unidad de trabajo:
//! resolver identidad, agregar la fila de hechos, agregar el movimiento
//! de puntos y actualizar el saldo. Un registro que falla se revierte
//! solo y el lote sigue. Los registros se procesan en orden, de modo que
//! dos consumos del mismo monedero en un lote se ven entre sí.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::batch::{record_label, BatchOutcome};
use super::identity::{parse_card_lookup, require_open_shift, resolve_card, resolve_client, IdentityLookup};
use crate::models::{
    compute_units, FleetTransaction, LoyaltyTransaction, NewFleetTransaction, NewLoyaltyTransaction,
    NewPointsEntry, NewRedemption, PointsMovement, PointsReference, Redemption,
};
use crate::repositories::{scoped, RowLock, Store, UnitOfWork, WalletKey};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{fits_numeric, AMOUNT_PRECISION};

/// Carga de combustible con tarjeta de flota
#[derive(Debug, Clone)]
pub struct FleetPurchase {
    pub amount: Decimal,
    pub price: Decimal,
    pub fuel_type_id: i64,
    pub shift_id: i64,
    pub establishment_id: i64,
    pub card_number: String,
    pub vehicle_id: Option<i64>,
    pub odometer: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Compra que acumula puntos
#[derive(Debug, Clone)]
pub struct LoyaltyPurchase {
    pub identity: IdentityLookup,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub fuel_type_id: Option<i64>,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub units: Option<Decimal>,
    pub discount: Decimal,
    pub shift_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Canje de puntos
#[derive(Debug, Clone)]
pub struct PointsRedemption {
    pub identity: IdentityLookup,
    pub card_number: Option<String>,
    pub establishment_id: i64,
    pub terminal_id: i64,
    pub points: Decimal,
    pub shift_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TransactionProcessor {
    store: Arc<dyn Store>,
    allow_negative_points: bool,
}

impl TransactionProcessor {
    pub fn new(store: Arc<dyn Store>, allow_negative_points: bool) -> Self {
        Self {
            store,
            allow_negative_points,
        }
    }

    /// Procesa un lote de cargas de flota. Los registros que ya fallaron
    /// al interpretarse llegan como `Err` y solo se reportan.
    pub async fn process_fleet_batch(&self, records: Vec<AppResult<FleetPurchase>>) -> BatchOutcome<i64> {
        let mut outcome = BatchOutcome::new(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let result = match record {
                Ok(purchase) => self.process_fleet(purchase).await.map(|row| row.id),
                Err(err) => Err(err),
            };
            outcome.push(record_label(index), result);
        }
        outcome
    }

    pub async fn process_loyalty_batch(&self, records: Vec<AppResult<LoyaltyPurchase>>) -> BatchOutcome<i64> {
        let mut outcome = BatchOutcome::new(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let result = match record {
                Ok(purchase) => self.process_loyalty(purchase).await.map(|row| row.id),
                Err(err) => Err(err),
            };
            outcome.push(record_label(index), result);
        }
        outcome
    }

    pub async fn process_redemption_batch(&self, records: Vec<AppResult<PointsRedemption>>) -> BatchOutcome<i64> {
        let mut outcome = BatchOutcome::new(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let result = match record {
                Ok(redemption) => self.process_redemption(redemption).await.map(|row| row.id),
                Err(err) => Err(err),
            };
            outcome.push(record_label(index), result);
        }
        outcome
    }

    pub async fn process_fleet(&self, purchase: FleetPurchase) -> AppResult<FleetTransaction> {
        let row = scoped(self.store.as_ref(), move |uow| Box::pin(apply_fleet(uow, purchase))).await?;
        info!(
            transaction_id = row.id,
            wallet_id = row.wallet_id,
            units = %row.units,
            "✅ Transacción de flota registrada"
        );
        Ok(row)
    }

    pub async fn process_loyalty(&self, purchase: LoyaltyPurchase) -> AppResult<LoyaltyTransaction> {
        let row = scoped(self.store.as_ref(), move |uow| Box::pin(apply_loyalty(uow, purchase))).await?;
        info!(
            transaction_id = row.id,
            client_id = row.client_id,
            points = %row.amount,
            "✅ Transacción de lealtad registrada"
        );
        Ok(row)
    }

    pub async fn process_redemption(&self, redemption: PointsRedemption) -> AppResult<Redemption> {
        let allow_negative = self.allow_negative_points;
        let row = scoped(self.store.as_ref(), move |uow| {
            Box::pin(apply_redemption(uow, redemption, allow_negative))
        })
        .await?;
        info!(
            redemption_id = row.id,
            client_id = row.client_id,
            points = %row.points,
            "✅ Canje registrado"
        );
        Ok(row)
    }
}

/// Los montos se guardan en NUMERIC(14, 2); lo que no cabe se rechaza
/// en vez de redondearse o desbordar la suma de saldos.
fn check_amount(field: &str, value: Decimal) -> AppResult<()> {
    if fits_numeric(value, AMOUNT_PRECISION) {
        Ok(())
    } else {
        Err(validation_error(field, "out of range"))
    }
}

async fn apply_fleet(uow: &mut dyn UnitOfWork, purchase: FleetPurchase) -> AppResult<FleetTransaction> {
    if purchase.amount <= Decimal::ZERO {
        return Err(validation_error("monto", "must be greater than 0"));
    }
    check_amount("monto", purchase.amount)?;
    let units = compute_units(purchase.amount, purchase.price)?;

    let lookup = parse_card_lookup(&purchase.card_number)?;
    let card = resolve_card(uow, &lookup).await?;
    require_open_shift(uow, purchase.shift_id).await?;

    let vehicle_id = purchase.vehicle_id.or(card.vehicle_id);
    let mut vehicle = match vehicle_id {
        Some(id) => Some(
            uow.find_vehicle(id, RowLock::Exclusive)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", id))?,
        ),
        None => None,
    };

    let mut wallet = match vehicle.as_ref() {
        Some(v) => uow.find_wallet(WalletKey::Vehicle(v.id), RowLock::Exclusive).await?,
        None => None,
    };
    if wallet.is_none() {
        wallet = uow.find_wallet(WalletKey::Card(card.id), RowLock::Exclusive).await?;
    }
    let mut wallet = wallet.ok_or_else(|| {
        AppError::NotFound(format!("no fuel wallet for card '{}'", card.card_number))
    })?;

    wallet.consume(units)?;
    uow.save_wallet(&wallet).await?;
    debug!(wallet_id = wallet.id, consumed = %wallet.consumed, available = %wallet.available, "Monedero actualizado");

    let mut previous_odometer = None;
    if let (Some(reading), Some(v)) = (purchase.odometer, vehicle.as_mut()) {
        previous_odometer = v.advance_odometer(reading);
        uow.save_vehicle_odometer(v).await?;
    }

    let new = NewFleetTransaction {
        amount: purchase.amount,
        price: purchase.price,
        units,
        odometer: purchase.odometer,
        previous_odometer,
        card_number: card.card_number.clone(),
        card_id: card.id,
        vehicle_id,
        wallet_id: wallet.id,
        fuel_type_id: purchase.fuel_type_id,
        shift_id: purchase.shift_id,
        establishment_id: purchase.establishment_id,
        channel_id: card.channel_id,
        subchannel_id: card.subchannel_id,
        created_at: purchase.created_at,
    };
    uow.insert_fleet_transaction(&new).await
}

async fn apply_loyalty(uow: &mut dyn UnitOfWork, purchase: LoyaltyPurchase) -> AppResult<LoyaltyTransaction> {
    if purchase.amount <= Decimal::ZERO {
        return Err(validation_error("monto", "must be greater than 0"));
    }
    check_amount("monto", purchase.amount)?;
    check_amount("descuento", purchase.discount)?;
    let units = match purchase.price {
        Some(price) => Some(compute_units(purchase.amount, price)?),
        None => purchase.units,
    };

    let client = resolve_client(uow, &purchase.identity, RowLock::None).await?;
    if let Some(shift_id) = purchase.shift_id {
        require_open_shift(uow, shift_id).await?;
    }

    let new = NewLoyaltyTransaction {
        client_id: client.id,
        card_number: purchase.card_number,
        establishment_id: purchase.establishment_id,
        terminal_id: purchase.terminal_id,
        fuel_type_id: purchase.fuel_type_id,
        amount: purchase.amount,
        price: purchase.price,
        units,
        discount: purchase.discount,
        channel_id: client.channel_id,
        shift_id: purchase.shift_id,
        occurred_at: purchase.occurred_at,
    };
    let row = uow.insert_loyalty_transaction(&new).await?;

    uow.append_points(&NewPointsEntry {
        client_id: client.id,
        movement: PointsMovement::Credit(row.amount),
        reference: PointsReference::Transaction(row.id),
        created_at: row.occurred_at,
    })
    .await?;

    Ok(row)
}

async fn apply_redemption(
    uow: &mut dyn UnitOfWork,
    redemption: PointsRedemption,
    allow_negative: bool,
) -> AppResult<Redemption> {
    if redemption.points <= Decimal::ZERO {
        return Err(validation_error("monto", "must be greater than 0"));
    }
    check_amount("monto", redemption.points)?;

    // Con saldo estricto, el bloqueo del cliente serializa los canjes
    // concurrentes entre la lectura del saldo y la escritura del débito
    let lock = if allow_negative { RowLock::None } else { RowLock::Exclusive };
    let client = resolve_client(uow, &redemption.identity, lock).await?;
    if let Some(shift_id) = redemption.shift_id {
        require_open_shift(uow, shift_id).await?;
    }

    if !allow_negative {
        let balance = uow.points_balance(client.id).await?;
        if balance.balance < redemption.points {
            return Err(AppError::InsufficientPoints {
                client_id: client.id,
                requested: redemption.points,
                balance: balance.balance,
            });
        }
    }

    let new = NewRedemption {
        client_id: client.id,
        card_number: redemption.card_number,
        establishment_id: redemption.establishment_id,
        terminal_id: redemption.terminal_id,
        points: redemption.points,
        shift_id: redemption.shift_id,
        occurred_at: redemption.occurred_at,
    };
    let row = uow.insert_redemption(&new).await?;

    uow.append_points(&NewPointsEntry {
        client_id: client.id,
        movement: PointsMovement::Debit(row.points),
        reference: PointsReference::Redemption(row.id),
        created_at: row.occurred_at,
    })
    .await?;

    Ok(row)
}
