//! Add stock: restocking an existing Inventory.

use tracing::{debug, info};

use stockhold_inventory::{DomainEvent, StockAdded, StockEvent, StockValidationPolicy};

use super::{
    AddStockCommand, InventoryView, ServiceContext, ServiceError, ServiceResult,
    StockEventPublisher, lock_inventory, log_failure,
};
use crate::store::TransactionManager;

pub struct AddStockService<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
    policy: StockValidationPolicy,
}

impl<T, P> AddStockService<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>, policy: StockValidationPolicy) -> Self {
        Self { ctx, policy }
    }

    pub fn execute(&self, command: AddStockCommand) -> ServiceResult<InventoryView> {
        info!(
            store_id = %command.store_id,
            sku = %command.sku,
            quantity = command.quantity,
            reason = %command.reason,
            "adding stock"
        );
        let result = self.add(command);
        log_failure("add_stock", &result);
        result
    }

    fn add(&self, command: AddStockCommand) -> ServiceResult<InventoryView> {
        let key = command.key();
        let mut tx = self.ctx.begin()?;
        let mut inventory = lock_inventory(tx.as_mut(), &key)?;
        debug!(key = %key, stock = ?inventory.stock(), "inventory loaded under lock");

        let mut validation = self.policy.validate_add(&inventory.stock(), command.quantity);
        if command.reason.trim().is_empty() {
            validation = validation.with_error("Restock reason is required");
        }
        if !validation.is_valid() {
            return Err(ServiceError::validation(
                "Stock validation failed",
                validation.into_errors(),
            ));
        }

        let now = self.ctx.now();
        inventory.add_stock(command.quantity, now)?;
        let event = DomainEvent::new(
            StockEvent::StockAdded(StockAdded {
                store_id: command.store_id,
                sku: command.sku,
                quantity: command.quantity,
                reason: command.reason,
            }),
            now,
        );

        tx.inventories().save(inventory)?;
        tx.events().append(event)?;
        let committed = tx.commit()?;

        info!(key = %key, "stock added");
        self.ctx.publish(&committed);

        let mut reader = self.ctx.begin()?;
        let stored = reader
            .inventories()
            .find_by_key(&key)?
            .ok_or_else(|| ServiceError::ProductNotFound {
                store_id: key.store_id().clone(),
                sku: key.sku().clone(),
            })?;
        Ok(InventoryView::from_inventory(&stored, &self.policy))
    }
}
