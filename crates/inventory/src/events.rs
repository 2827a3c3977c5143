//! Stock movement events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{EventId, ReservationId, Sku, StoreId};
use stockhold_events::Event;

/// Aggregate type tag carried on published envelopes.
pub const AGGREGATE_TYPE: &str = "inventory";

/// Event: StockReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub reservation_id: ReservationId,
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub customer_id: String,
}

/// Event: StockCommitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCommitted {
    pub reservation_id: ReservationId,
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub customer_id: String,
    pub order_id: String,
}

/// Event: StockReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub reservation_id: ReservationId,
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub reason: String,
}

/// Event: StockAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdded {
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StockEvent {
    StockReserved(StockReserved),
    StockCommitted(StockCommitted),
    StockReleased(StockReleased),
    StockAdded(StockAdded),
}

impl StockEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StockEvent::StockReserved(_) => "StockReserved",
            StockEvent::StockCommitted(_) => "StockCommitted",
            StockEvent::StockReleased(_) => "StockReleased",
            StockEvent::StockAdded(_) => "StockAdded",
        }
    }

    pub fn sku(&self) -> &Sku {
        match self {
            StockEvent::StockReserved(e) => &e.sku,
            StockEvent::StockCommitted(e) => &e.sku,
            StockEvent::StockReleased(e) => &e.sku,
            StockEvent::StockAdded(e) => &e.sku,
        }
    }

    pub fn store_id(&self) -> &StoreId {
        match self {
            StockEvent::StockReserved(e) => &e.store_id,
            StockEvent::StockCommitted(e) => &e.store_id,
            StockEvent::StockReleased(e) => &e.store_id,
            StockEvent::StockAdded(e) => &e.store_id,
        }
    }
}

/// An immutable record of a stock movement.
///
/// `aggregate_id` is the sku: events for the same product in different
/// stores share a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    event_id: EventId,
    aggregate_id: String,
    occurred_at: DateTime<Utc>,
    payload: StockEvent,
}

impl DomainEvent {
    pub fn new(payload: StockEvent, occurred_at: DateTime<Utc>) -> Self {
        Self::with_id(EventId::new(), payload, occurred_at)
    }

    /// Build with an explicit id (replays, deterministic tests).
    pub fn with_id(event_id: EventId, payload: StockEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            aggregate_id: payload.sku().to_string(),
            occurred_at,
            payload,
        }
    }

    pub fn payload(&self) -> &StockEvent {
        &self.payload
    }
}

impl Event for DomainEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }

    fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    fn aggregate_type(&self) -> &'static str {
        AGGREGATE_TYPE
    }

    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
