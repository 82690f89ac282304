//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL (ver `migrations/`).

pub mod client;
pub mod points;
pub mod shift;
pub mod transaction;
pub mod vehicle;
pub mod wallet;

pub use client::{Card, CardLookup, Client};
pub use points::{NewPointsEntry, PointsBalance, PointsEntry, PointsMovement, PointsReference};
pub use shift::{NewShift, Shift, ShiftClosure, ShiftState};
pub use transaction::{
    compute_units, FleetTransaction, LoyaltyTransaction, NewFleetTransaction,
    NewLoyaltyTransaction, NewRedemption, Redemption,
};
pub use vehicle::Vehicle;
pub use wallet::FleetWallet;
