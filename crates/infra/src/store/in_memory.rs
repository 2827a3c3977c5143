use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use stockhold_core::{AggregateRoot, Entity, EventId, ExpectedVersion, ReservationId};
use stockhold_events::Event;
use stockhold_inventory::{DomainEvent, Inventory, InventoryKey, Reservation, ReservationStatus};

use super::{
    EventStore, InventoryRepository, RepositoryError, RepositoryResult, ReservationRepository,
    StoredEvent, Transaction, TransactionManager,
};
use crate::lock::{KeyGuard, KeyedLocks};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct LedgerState {
    inventories: HashMap<InventoryKey, Inventory>,
    reservations: HashMap<ReservationId, Reservation>,
    events: Vec<StoredEvent>,
    event_index: HashMap<EventId, usize>,
    sequences: HashMap<String, u64>,
}

impl LedgerState {
    /// Append unless the event id is already present.
    fn append(&mut self, event: DomainEvent) -> Option<StoredEvent> {
        if self.event_index.contains_key(&event.event_id()) {
            return None;
        }
        let sequence = self
            .sequences
            .entry(event.aggregate_id().to_owned())
            .or_insert(0);
        *sequence += 1;
        let stored = StoredEvent {
            sequence_number: *sequence,
            event,
        };
        self.event_index.insert(stored.event_id(), self.events.len());
        self.events.push(stored.clone());
        Some(stored)
    }
}

/// In-memory transactional store for inventories, reservations and events.
///
/// Intended for tests, the demo binary and single-process deployments.
/// Aggregate locks come from a [`KeyedLocks`] table keyed by [`InventoryKey`].
#[derive(Debug)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    locks: KeyedLocks<InventoryKey>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            locks: KeyedLocks::new(timeout),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.locks.timeout()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Poisoned("ledger state poisoned".to_string()))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Poisoned("ledger state poisoned".to_string()))
    }
}

impl TransactionManager for InMemoryLedger {
    fn begin(&self) -> RepositoryResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(InMemoryTransaction {
            ledger: self,
            held: HashMap::new(),
            inventories: HashMap::new(),
            reservations: HashMap::new(),
            events: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum Staged<T> {
    Put(T),
    Deleted,
}

/// Staged writes plus the aggregate locks taken so far.
#[derive(Debug)]
struct InMemoryTransaction<'a> {
    ledger: &'a InMemoryLedger,
    held: HashMap<InventoryKey, KeyGuard<InventoryKey>>,
    inventories: HashMap<InventoryKey, Inventory>,
    reservations: HashMap<ReservationId, Staged<Reservation>>,
    events: Vec<DomainEvent>,
}

impl InMemoryTransaction<'_> {
    /// Committed reservations overlaid with this transaction's staged writes.
    fn visible_reservations(&self) -> RepositoryResult<Vec<Reservation>> {
        let state = self.ledger.read()?;
        let mut visible: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|(id, _)| !self.reservations.contains_key(*id))
            .map(|(_, r)| r.clone())
            .collect();
        visible.extend(self.reservations.values().filter_map(|staged| match staged {
            Staged::Put(r) => Some(r.clone()),
            Staged::Deleted => None,
        }));
        visible.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(visible)
    }
}

impl InventoryRepository for InMemoryTransaction<'_> {
    fn find_by_key(&self, key: &InventoryKey) -> RepositoryResult<Option<Inventory>> {
        if let Some(staged) = self.inventories.get(key) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.ledger.read()?.inventories.get(key).cloned())
    }

    fn find_by_key_with_lock(&mut self, key: &InventoryKey) -> RepositoryResult<Option<Inventory>> {
        if !self.held.contains_key(key) {
            let guard = self.ledger.locks.acquire(key)?;
            self.held.insert(key.clone(), guard);
        }
        self.find_by_key(key)
    }

    fn save(&mut self, inventory: Inventory) -> RepositoryResult<Inventory> {
        self.inventories
            .insert(inventory.key().clone(), inventory.clone());
        Ok(inventory)
    }

    fn exists_by_key(&self, key: &InventoryKey) -> RepositoryResult<bool> {
        Ok(self.find_by_key(key)?.is_some())
    }

    fn count(&self) -> RepositoryResult<usize> {
        let state = self.ledger.read()?;
        let staged_only = self
            .inventories
            .keys()
            .filter(|k| !state.inventories.contains_key(*k))
            .count();
        Ok(state.inventories.len() + staged_only)
    }
}

impl ReservationRepository for InMemoryTransaction<'_> {
    fn find_by_id(&self, id: &ReservationId) -> RepositoryResult<Option<Reservation>> {
        match self.reservations.get(id) {
            Some(Staged::Put(r)) => Ok(Some(r.clone())),
            Some(Staged::Deleted) => Ok(None),
            None => Ok(self.ledger.read()?.reservations.get(id).cloned()),
        }
    }

    fn save(&mut self, reservation: Reservation) -> RepositoryResult<Reservation> {
        self.reservations.insert(
            reservation.id().clone(),
            Staged::Put(reservation.clone()),
        );
        Ok(reservation)
    }

    fn find_by_status(&self, status: ReservationStatus) -> RepositoryResult<Vec<Reservation>> {
        Ok(self
            .visible_reservations()?
            .into_iter()
            .filter(|r| r.status() == status)
            .collect())
    }

    fn find_expired(&self, before: DateTime<Utc>) -> RepositoryResult<Vec<Reservation>> {
        Ok(self
            .visible_reservations()?
            .into_iter()
            .filter(|r| r.status() == ReservationStatus::Reserved && r.expires_at() < before)
            .collect())
    }

    fn delete(&mut self, reservation: &Reservation) -> RepositoryResult<()> {
        self.reservations
            .insert(reservation.id().clone(), Staged::Deleted);
        Ok(())
    }
}

impl EventStore for InMemoryTransaction<'_> {
    fn append(&mut self, event: DomainEvent) -> RepositoryResult<()> {
        if !self.events.iter().any(|e| e.event_id() == event.event_id()) {
            self.events.push(event);
        }
        Ok(())
    }

    fn find_by_aggregate_id(&self, aggregate_id: &str) -> RepositoryResult<Vec<StoredEvent>> {
        let state = self.ledger.read()?;
        let mut events: Vec<StoredEvent> = state
            .events
            .iter()
            .filter(|e| e.aggregate_id() == aggregate_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.occurred_at()
                .cmp(&b.occurred_at())
                .then(a.sequence_number.cmp(&b.sequence_number))
        });
        Ok(events)
    }

    fn find_by_event_id(&self, event_id: EventId) -> RepositoryResult<Option<StoredEvent>> {
        let state = self.ledger.read()?;
        Ok(state
            .event_index
            .get(&event_id)
            .and_then(|idx| state.events.get(*idx))
            .cloned())
    }

    fn find_all(&self) -> RepositoryResult<Vec<StoredEvent>> {
        Ok(self.ledger.read()?.events.clone())
    }
}

impl Transaction for InMemoryTransaction<'_> {
    fn inventories(&mut self) -> &mut dyn InventoryRepository {
        self
    }

    fn reservations(&mut self) -> &mut dyn ReservationRepository {
        self
    }

    fn events(&mut self) -> &mut dyn EventStore {
        self
    }

    fn commit(self: Box<Self>) -> RepositoryResult<Vec<StoredEvent>> {
        let InMemoryTransaction {
            ledger,
            held,
            inventories,
            reservations,
            events,
        } = *self;

        let mut state = ledger.write()?;

        // Verify every staged aggregate before touching anything.
        for (key, inventory) in &inventories {
            let current = state.inventories.get(key).map(|i| i.version()).unwrap_or(0);
            ExpectedVersion::Exact(inventory.version())
                .check(current)
                .map_err(|source| RepositoryError::Concurrency {
                    key: key.to_string(),
                    source,
                })?;
        }

        let (inventory_count, reservation_count) = (inventories.len(), reservations.len());
        for (key, inventory) in inventories {
            let next = inventory.version() + 1;
            state.inventories.insert(key, inventory.with_version(next));
        }
        for (id, staged) in reservations {
            match staged {
                Staged::Put(r) => {
                    state.reservations.insert(id, r);
                }
                Staged::Deleted => {
                    state.reservations.remove(&id);
                }
            }
        }
        let committed: Vec<StoredEvent> = events
            .into_iter()
            .filter_map(|event| state.append(event))
            .collect();

        drop(state);
        drop(held);

        debug!(
            inventories = inventory_count,
            reservations = reservation_count,
            events = committed.len(),
            "transaction committed"
        );
        Ok(committed)
    }
}
