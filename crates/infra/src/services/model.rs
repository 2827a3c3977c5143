//! Commands accepted by the services and the read views they return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{AggregateRoot, Entity, ReservationId, Sku, StoreId};
use stockhold_inventory::{
    ExpirationPolicy, Inventory, InventoryKey, Reservation, ReservationStatus, StockLevel,
    StockValidationPolicy,
};

/// Command: hold `quantity` units for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStockCommand {
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub customer_id: String,
}

impl ReserveStockCommand {
    pub fn new(store_id: StoreId, sku: Sku, quantity: i64, customer_id: impl Into<String>) -> Self {
        Self {
            store_id,
            sku,
            quantity,
            customer_id: customer_id.into(),
        }
    }

    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.store_id.clone(), self.sku.clone())
    }
}

/// Command: finalize a hold as a sale for an external order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStockCommand {
    pub reservation_id: ReservationId,
    pub order_id: String,
}

impl CommitStockCommand {
    pub fn new(reservation_id: ReservationId, order_id: impl Into<String>) -> Self {
        Self {
            reservation_id,
            order_id: order_id.into(),
        }
    }
}

/// Command: cancel a hold and return its units to available stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStockCommand {
    pub reservation_id: ReservationId,
    pub reason: String,
}

impl ReleaseStockCommand {
    pub fn new(reservation_id: ReservationId, reason: impl Into<String>) -> Self {
        Self {
            reservation_id,
            reason: reason.into(),
        }
    }
}

/// Command: restock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStockCommand {
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub reason: String,
}

impl AddStockCommand {
    pub fn new(store_id: StoreId, sku: Sku, quantity: i64, reason: impl Into<String>) -> Self {
        Self {
            store_id,
            sku,
            quantity,
            reason: reason.into(),
        }
    }

    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.store_id.clone(), self.sku.clone())
    }
}

/// Snapshot of one Inventory for dashboards and pre-checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub store_id: StoreId,
    pub sku: Sku,
    pub product_name: String,
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
    pub total: i64,
    pub level: StockLevel,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl InventoryView {
    pub fn from_inventory(inventory: &Inventory, levels: &StockValidationPolicy) -> Self {
        let stock = inventory.stock();
        Self {
            store_id: inventory.store_id().clone(),
            sku: inventory.sku().clone(),
            product_name: inventory.product_name().to_owned(),
            available: stock.available(),
            reserved: stock.reserved(),
            sold: stock.sold(),
            total: stock.total(),
            level: levels.stock_level(&stock),
            last_updated: inventory.last_updated(),
            version: inventory.version(),
        }
    }
}

/// Snapshot of one Reservation with its expiry outlook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub reservation_id: ReservationId,
    pub store_id: StoreId,
    pub sku: Sku,
    pub quantity: i64,
    pub customer_id: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub committed_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub expiring_soon: bool,
    pub minutes_until_expiration: i64,
}

impl ReservationView {
    pub fn from_reservation(
        reservation: &Reservation,
        expiration: &ExpirationPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reservation_id: reservation.id().clone(),
            store_id: reservation.store_id().clone(),
            sku: reservation.sku().clone(),
            quantity: reservation.quantity(),
            customer_id: reservation.customer_id().to_owned(),
            status: reservation.status(),
            created_at: reservation.created_at(),
            expires_at: reservation.expires_at(),
            committed_at: reservation.committed_at(),
            expired: expiration.is_expired(reservation, now),
            expiring_soon: expiration.is_expiring_soon(reservation, now),
            minutes_until_expiration: expiration
                .time_until_expiration(reservation, now)
                .num_minutes(),
        }
    }
}
