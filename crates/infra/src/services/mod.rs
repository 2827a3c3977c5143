//! Orchestration services: the use cases that mutate stock.
//!
//! Every mutating service follows the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. begin transaction
//!   ↓
//! 2. load Inventory under its exclusive aggregate lock
//!   ↓
//! 3. validate (policy / lifecycle / expiry)
//!   ↓
//! 4. mutate Inventory + Reservation, stage a DomainEvent
//!   ↓
//! 5. commit (inventory, reservation and event land together; lock released)
//!   ↓
//! 6. publish committed events (best-effort, failures logged)
//! ```
//!
//! Any failure before step 5 drops the transaction, so nothing is persisted.

pub mod add_stock;
pub mod commit;
pub mod error;
pub mod model;
pub mod provision;
pub mod query;
pub mod release;
pub mod replay;
pub mod reserve;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use stockhold_core::Clock;
use stockhold_events::{EventEnvelope, EventPublisher};
use stockhold_inventory::{DomainEvent, Inventory, InventoryKey};

use crate::store::{StoredEvent, Transaction, TransactionManager};

pub use add_stock::AddStockService;
pub use commit::CommitStockService;
pub use error::{ErrorReport, ServiceError, ServiceResult};
pub use model::{
    AddStockCommand, CommitStockCommand, InventoryView, ReleaseStockCommand, ReservationView,
    ReserveStockCommand,
};
pub use provision::{InventoryProvisioner, SampleItem, sample_catalogue, seed_sample_inventory};
pub use query::InventoryQueryService;
pub use release::ReleaseStockService;
pub use replay::EventReplayer;
pub use reserve::ReserveStockService;

/// Publisher of committed stock events.
pub trait StockEventPublisher: EventPublisher<EventEnvelope<DomainEvent>> {}

impl<P> StockEventPublisher for P where P: EventPublisher<EventEnvelope<DomainEvent>> + ?Sized {}

/// Collaborators shared by every service: store, publisher and clock.
pub struct ServiceContext<T: ?Sized, P: ?Sized> {
    store: Arc<T>,
    publisher: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<T: ?Sized, P: ?Sized> Clone for ServiceContext<T, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T, P> ServiceContext<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(store: Arc<T>, publisher: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn begin(&self) -> ServiceResult<Box<dyn Transaction + '_>> {
        Ok(self.store.begin()?)
    }

    /// Hand committed events to the publisher.
    ///
    /// The state change is already durable, so a failure here is logged and
    /// swallowed; the event can be re-sent with [`EventReplayer`].
    pub(crate) fn publish(&self, committed: &[StoredEvent]) {
        for stored in committed {
            if let Err(err) = self.publisher.publish(stored.to_envelope()) {
                error!(
                    event_id = %stored.event_id(),
                    event_type = stored.event_type(),
                    aggregate_id = stored.aggregate_id(),
                    sequence = stored.sequence_number,
                    error = %err,
                    "event publication failed; event remains in the durable log"
                );
            }
        }
    }
}

/// Load an Inventory under its aggregate lock, or fail with `ProductNotFound`.
pub(crate) fn lock_inventory(
    tx: &mut (dyn Transaction + '_),
    key: &InventoryKey,
) -> ServiceResult<Inventory> {
    tx.inventories()
        .find_by_key_with_lock(key)?
        .ok_or_else(|| ServiceError::ProductNotFound {
            store_id: key.store_id().clone(),
            sku: key.sku().clone(),
        })
}

/// Log a failed outcome at the level its kind deserves.
pub(crate) fn log_failure<R>(operation: &'static str, result: &ServiceResult<R>) {
    match result {
        Err(err @ ServiceError::Internal(source)) => {
            error!(operation, code = err.code(), error = %source, "operation failed unexpectedly");
        }
        Err(err) => {
            warn!(operation, code = err.code(), error = %err, "operation rejected");
        }
        Ok(_) => {}
    }
}
