//! Creating Inventory aggregates, and the sample catalogue.

use tracing::info;

use stockhold_inventory::{Inventory, InventoryKey};

use super::{ServiceContext, ServiceResult, StockEventPublisher};
use crate::store::TransactionManager;

/// One catalogue line: `(store, sku, product name, initial available)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleItem {
    pub store_id: &'static str,
    pub sku: &'static str,
    pub product_name: &'static str,
    pub available: i64,
}

const SAMPLE_CATALOGUE: [SampleItem; 6] = [
    SampleItem {
        store_id: "STORE-01",
        sku: "SKU123",
        product_name: "Notebook Dell XPS 13",
        available: 100,
    },
    SampleItem {
        store_id: "STORE-01",
        sku: "SKU456",
        product_name: "iPhone 15 Pro",
        available: 50,
    },
    SampleItem {
        store_id: "STORE-01",
        sku: "SKU789",
        product_name: "Samsung Galaxy S24",
        available: 75,
    },
    SampleItem {
        store_id: "STORE-02",
        sku: "SKU123",
        product_name: "Notebook Dell XPS 13",
        available: 80,
    },
    SampleItem {
        store_id: "STORE-02",
        sku: "SKU456",
        product_name: "iPhone 15 Pro",
        available: 40,
    },
    SampleItem {
        store_id: "STORE-03",
        sku: "SKU789",
        product_name: "Samsung Galaxy S24",
        available: 60,
    },
];

pub fn sample_catalogue() -> &'static [SampleItem] {
    &SAMPLE_CATALOGUE
}

pub struct InventoryProvisioner<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
}

impl<T, P> InventoryProvisioner<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>) -> Self {
        Self { ctx }
    }

    /// Create the Inventory for `key` unless it already exists.
    ///
    /// Returns `true` if it was created.
    pub fn provision(
        &self,
        key: InventoryKey,
        product_name: &str,
        initial_available: i64,
    ) -> ServiceResult<bool> {
        let mut tx = self.ctx.begin()?;
        if tx.inventories().find_by_key_with_lock(&key)?.is_some() {
            return Ok(false);
        }
        let inventory =
            Inventory::provision(key.clone(), product_name, initial_available, self.ctx.now())?;
        tx.inventories().save(inventory)?;
        tx.commit()?;
        info!(key = %key, product_name, initial_available, "inventory provisioned");
        Ok(true)
    }

    /// Create every item in one transaction, skipping keys that already exist.
    ///
    /// Returns how many were created.
    pub fn provision_all(&self, items: &[SampleItem]) -> ServiceResult<usize> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin()?;
        let mut created = 0;
        for item in items {
            let key = InventoryKey::parse(item.store_id, item.sku)?;
            if tx.inventories().find_by_key_with_lock(&key)?.is_some() {
                continue;
            }
            let inventory = Inventory::provision(key, item.product_name, item.available, now)?;
            tx.inventories().save(inventory)?;
            created += 1;
        }
        tx.commit()?;
        Ok(created)
    }
}

/// Load the sample catalogue into an empty store. Skips if any Inventory exists.
pub fn seed_sample_inventory<T, P>(provisioner: &InventoryProvisioner<T, P>) -> ServiceResult<usize>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    let existing = provisioner.ctx.begin()?.inventories().count()?;
    if existing > 0 {
        info!(existing, "store already contains inventory; skipping sample data");
        return Ok(0);
    }

    let created = provisioner.provision_all(sample_catalogue())?;
    info!(created, "sample inventory loaded");
    Ok(created)
}
