//! Servicios del núcleo
//!
//! Los servicios encapsulan la lógica de negocio: cada operación corre
//! dentro de una unidad de trabajo del `Store` compartido.

pub mod batch;
pub mod compensator;
pub mod identity;
pub mod ledger_queries;
pub mod shift_closer;
pub mod transaction_processor;

use std::sync::Arc;

use crate::repositories::Store;

pub use batch::BatchOutcome;
pub use compensator::{Cancellation, Compensator};
pub use identity::IdentityLookup;
pub use ledger_queries::{LedgerQueries, WalletAvailability, WalletQuery};
pub use shift_closer::ShiftCloser;
pub use transaction_processor::{FleetPurchase, LoyaltyPurchase, PointsRedemption, TransactionProcessor};

/// Todos los servicios, construidos sobre el mismo store
#[derive(Clone)]
pub struct LedgerServices {
    pub processor: TransactionProcessor,
    pub compensator: Compensator,
    pub shifts: ShiftCloser,
    pub queries: LedgerQueries,
}

impl LedgerServices {
    pub fn new(store: Arc<dyn Store>, allow_negative_points: bool) -> Self {
        Self {
            processor: TransactionProcessor::new(store.clone(), allow_negative_points),
            compensator: Compensator::new(store.clone()),
            shifts: ShiftCloser::new(store.clone()),
            queries: LedgerQueries::new(store),
        }
    }
}
