//! Persistence boundary: repositories, the durable event log and the unit of work.
//!
//! Every mutating operation runs inside one [`Transaction`]:
//!
//! ```text
//! begin
//!   ↓
//! find_by_key_with_lock   (exclusive per-aggregate lock, held until the transaction ends)
//!   ↓
//! save inventory / save reservation / append event   (staged, invisible to others)
//!   ↓
//! commit                  (all staged writes land together, or none do)
//! ```
//!
//! Dropping a transaction without committing discards its staged writes and
//! releases its locks.

pub mod in_memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockhold_core::{EventId, ReservationId, VersionConflict};
use stockhold_events::{Event, EventEnvelope};
use stockhold_inventory::{DomainEvent, Inventory, InventoryKey, Reservation, ReservationStatus};

use crate::lock::LockError;

pub use in_memory::InMemoryLedger;

/// Infrastructure failure while reading or writing state.
///
/// These never describe a business outcome; the service layer surfaces them
/// as an opaque internal error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("timed out after {waited_ms}ms waiting for lock on {key}")]
    LockTimeout { key: String, waited_ms: u64 },

    #[error("lock poisoned: {0}")]
    Poisoned(String),

    #[error("concurrency conflict on {key}: {source}")]
    Concurrency {
        key: String,
        #[source]
        source: VersionConflict,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<LockError> for RepositoryError {
    fn from(value: LockError) -> Self {
        match value {
            LockError::Timeout { key, waited_ms } => {
                RepositoryError::LockTimeout { key, waited_ms }
            }
            LockError::Poisoned(msg) => RepositoryError::Poisoned(msg),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A domain event after it has been appended to the durable log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Monotonically increasing position in the aggregate stream (starts at 1).
    pub sequence_number: u64,
    pub event: DomainEvent,
}

impl StoredEvent {
    pub fn event_id(&self) -> EventId {
        self.event.event_id()
    }

    pub fn aggregate_id(&self) -> &str {
        self.event.aggregate_id()
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.event.occurred_at()
    }

    /// Wrap the event for publication.
    pub fn to_envelope(&self) -> EventEnvelope<DomainEvent> {
        EventEnvelope::seal(self.event.clone(), self.sequence_number)
    }
}

pub trait InventoryRepository {
    /// Read without locking.
    fn find_by_key(&self, key: &InventoryKey) -> RepositoryResult<Option<Inventory>>;

    /// Acquire the exclusive aggregate lock for `key`, then read.
    ///
    /// The lock is held until the enclosing transaction commits or is dropped.
    /// Acquiring a key the transaction already holds does not block.
    fn find_by_key_with_lock(&mut self, key: &InventoryKey) -> RepositoryResult<Option<Inventory>>;

    fn save(&mut self, inventory: Inventory) -> RepositoryResult<Inventory>;

    fn exists_by_key(&self, key: &InventoryKey) -> RepositoryResult<bool>;

    fn count(&self) -> RepositoryResult<usize>;
}

pub trait ReservationRepository {
    fn find_by_id(&self, id: &ReservationId) -> RepositoryResult<Option<Reservation>>;

    fn save(&mut self, reservation: Reservation) -> RepositoryResult<Reservation>;

    fn find_by_status(&self, status: ReservationStatus) -> RepositoryResult<Vec<Reservation>>;

    /// `RESERVED` reservations whose `expires_at` is strictly before `before`.
    fn find_expired(&self, before: DateTime<Utc>) -> RepositoryResult<Vec<Reservation>>;

    fn delete(&mut self, reservation: &Reservation) -> RepositoryResult<()>;
}

/// Append-only log of domain events.
///
/// Reads only see committed events.
pub trait EventStore {
    /// Stage an event for append. Idempotent on `event_id`.
    fn append(&mut self, event: DomainEvent) -> RepositoryResult<()>;

    /// Events of one aggregate ordered by `occurred_at`, then sequence.
    fn find_by_aggregate_id(&self, aggregate_id: &str) -> RepositoryResult<Vec<StoredEvent>>;

    fn find_by_event_id(&self, event_id: EventId) -> RepositoryResult<Option<StoredEvent>>;

    /// Events of one aggregate with `from <= occurred_at <= to`.
    fn find_by_aggregate_id_between(
        &self,
        aggregate_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<StoredEvent>> {
        Ok(self
            .find_by_aggregate_id(aggregate_id)?
            .into_iter()
            .filter(|e| e.occurred_at() >= from && e.occurred_at() <= to)
            .collect())
    }

    /// Every committed event in append order.
    fn find_all(&self) -> RepositoryResult<Vec<StoredEvent>>;
}

/// One atomic unit of work over the three repositories.
pub trait Transaction {
    fn inventories(&mut self) -> &mut dyn InventoryRepository;

    fn reservations(&mut self) -> &mut dyn ReservationRepository;

    fn events(&mut self) -> &mut dyn EventStore;

    /// Apply every staged write atomically and release held locks.
    ///
    /// Returns the events appended by this transaction with their assigned
    /// sequence numbers. On error nothing is applied.
    fn commit(self: Box<Self>) -> RepositoryResult<Vec<StoredEvent>>;
}

pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> RepositoryResult<Box<dyn Transaction + '_>>;
}

impl<T> TransactionManager for std::sync::Arc<T>
where
    T: TransactionManager + ?Sized,
{
    fn begin(&self) -> RepositoryResult<Box<dyn Transaction + '_>> {
        (**self).begin()
    }
}
