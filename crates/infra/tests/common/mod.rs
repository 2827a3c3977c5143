#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockhold_core::{Clock, ManualClock, Sku, StoreId};
use stockhold_events::{EventEnvelope, InMemoryEventBus};
use stockhold_infra::{InMemoryLedger, InventoryView, LedgerConfig, StockLedger};
use stockhold_inventory::{DomainEvent, InventoryKey};

pub type Envelope = EventEnvelope<DomainEvent>;
pub type Bus = InMemoryEventBus<Envelope>;

pub struct Harness<P: ?Sized = Bus> {
    pub ledger: StockLedger<InMemoryLedger, P>,
    pub store: Arc<InMemoryLedger>,
    pub publisher: Arc<P>,
    pub clock: Arc<ManualClock>,
}

pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn harness() -> Harness {
    harness_with(LedgerConfig::default())
}

pub fn harness_with(config: LedgerConfig) -> Harness {
    harness_with_publisher(config, Arc::new(Bus::new()))
}

pub fn harness_with_publisher<P>(config: LedgerConfig, publisher: Arc<P>) -> Harness<P>
where
    P: stockhold_infra::StockEventPublisher + 'static,
{
    let store = Arc::new(InMemoryLedger::with_lock_timeout(config.lock_timeout));
    let clock = Arc::new(ManualClock::new(t0()));
    let ledger = StockLedger::new(
        Arc::clone(&store),
        Arc::clone(&publisher),
        Arc::clone(&clock) as Arc<dyn Clock>,
        config,
    );
    Harness {
        ledger,
        store,
        publisher,
        clock,
    }
}

pub fn store_id(s: &str) -> StoreId {
    StoreId::parse(s).unwrap()
}

pub fn sku(s: &str) -> Sku {
    Sku::parse(s).unwrap()
}

impl<P: stockhold_infra::StockEventPublisher + ?Sized> Harness<P> {
    pub fn provision(&self, store: &str, product: &str, available: i64) {
        self.provision_sku(store, "SKU123", product, available);
    }

    pub fn provision_sku(&self, store: &str, sku_code: &str, product: &str, available: i64) {
        let created = self
            .ledger
            .provision(InventoryKey::parse(store, sku_code).unwrap(), product, available)
            .unwrap();
        assert!(created);
    }

    pub fn view(&self, store: &str, sku_code: &str) -> InventoryView {
        self.ledger
            .find_by_store_and_sku(&store_id(store), &sku(sku_code))
            .unwrap()
            .unwrap()
    }

    /// `(available, reserved, sold)`.
    pub fn counters(&self, store: &str, sku_code: &str) -> (i64, i64, i64) {
        let v = self.view(store, sku_code);
        (v.available, v.reserved, v.sold)
    }
}
