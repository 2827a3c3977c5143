//! Inventory aggregate: one Stock bound to a `(store, sku)` identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{AggregateRoot, DomainError, DomainResult, Sku, StoreId};

use crate::stock::Stock;

/// Identity of an Inventory aggregate, and the key its lock is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryKey {
    store_id: StoreId,
    sku: Sku,
}

impl InventoryKey {
    pub fn new(store_id: StoreId, sku: Sku) -> Self {
        Self { store_id, sku }
    }

    /// Parse both halves of the key from raw strings.
    pub fn parse(store_id: &str, sku: &str) -> DomainResult<Self> {
        Ok(Self::new(StoreId::parse(store_id)?, Sku::parse(sku)?))
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }
}

impl core::fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.store_id, self.sku)
    }
}

/// Aggregate root: Inventory.
///
/// Mutated only through [`reserve`](Self::reserve), [`commit`](Self::commit),
/// [`release`](Self::release) and [`add_stock`](Self::add_stock). Each replaces
/// the Stock value and refreshes `last_updated`; a failed transition leaves
/// the aggregate untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    key: InventoryKey,
    product_name: String,
    stock: Stock,
    last_updated: DateTime<Utc>,
    version: u64,
}

impl Inventory {
    /// Create a never-persisted aggregate (version 0).
    pub fn provision(
        key: InventoryKey,
        product_name: impl Into<String>,
        initial_available: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let product_name = product_name.into();
        if product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            key,
            product_name,
            stock: Stock::with_available(initial_available)?,
            last_updated: now,
            version: 0,
        })
    }

    /// Rebuild an aggregate from persisted state.
    pub fn restore(
        key: InventoryKey,
        product_name: String,
        stock: Stock,
        last_updated: DateTime<Utc>,
        version: u64,
    ) -> Self {
        Self {
            key,
            product_name,
            stock,
            last_updated,
            version,
        }
    }

    pub fn key(&self) -> &InventoryKey {
        &self.key
    }

    pub fn store_id(&self) -> &StoreId {
        self.key.store_id()
    }

    pub fn sku(&self) -> &Sku {
        self.key.sku()
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn stock(&self) -> Stock {
        self.stock
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn has_available(&self, quantity: i64) -> bool {
        self.stock.has_available(quantity)
    }

    pub fn reserve(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let next = self.stock.reserve(quantity)?;
        self.replace_stock(next, now);
        Ok(())
    }

    pub fn commit(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let next = self.stock.commit(quantity)?;
        self.replace_stock(next, now);
        Ok(())
    }

    pub fn release(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let next = self.stock.release(quantity)?;
        self.replace_stock(next, now);
        Ok(())
    }

    pub fn add_stock(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let next = self.stock.add_stock(quantity)?;
        self.replace_stock(next, now);
        Ok(())
    }

    /// Stamp the version assigned by the store on a committed save.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    fn replace_stock(&mut self, stock: Stock, now: DateTime<Utc>) {
        self.stock = stock;
        self.last_updated = now;
    }
}

impl AggregateRoot for Inventory {
    type Id = InventoryKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }

    fn version(&self) -> u64 {
        self.version
    }
}
