//! Read-only queries. No locks are taken; results are snapshots and must
//! never gate a mutation.

use tracing::debug;

use stockhold_core::{ReservationId, Sku, StoreId};
use stockhold_inventory::{ExpirationPolicy, InventoryKey, ReservationStatus, StockValidationPolicy};

use super::{InventoryView, ReservationView, ServiceContext, ServiceResult, StockEventPublisher};
use crate::store::{StoredEvent, TransactionManager};

pub struct InventoryQueryService<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
    levels: StockValidationPolicy,
    expiration: ExpirationPolicy,
}

impl<T, P> InventoryQueryService<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(
        ctx: ServiceContext<T, P>,
        levels: StockValidationPolicy,
        expiration: ExpirationPolicy,
    ) -> Self {
        Self {
            ctx,
            levels,
            expiration,
        }
    }

    pub fn find_by_store_and_sku(
        &self,
        store_id: &StoreId,
        sku: &Sku,
    ) -> ServiceResult<Option<InventoryView>> {
        debug!(store_id = %store_id, sku = %sku, "querying stock");
        let key = InventoryKey::new(store_id.clone(), sku.clone());
        let inventory = self.ctx.begin()?.inventories().find_by_key(&key)?;
        Ok(inventory.map(|inv| InventoryView::from_inventory(&inv, &self.levels)))
    }

    pub fn find_reservation(&self, id: &ReservationId) -> ServiceResult<Option<ReservationView>> {
        let now = self.ctx.now();
        let reservation = self.ctx.begin()?.reservations().find_by_id(id)?;
        Ok(reservation.map(|r| ReservationView::from_reservation(&r, &self.expiration, now)))
    }

    pub fn reservations_by_status(
        &self,
        status: ReservationStatus,
    ) -> ServiceResult<Vec<ReservationView>> {
        let now = self.ctx.now();
        let reservations = self.ctx.begin()?.reservations().find_by_status(status)?;
        Ok(reservations
            .iter()
            .map(|r| ReservationView::from_reservation(r, &self.expiration, now))
            .collect())
    }

    /// Audit trail of one sku, oldest first.
    pub fn event_history(&self, sku: &Sku) -> ServiceResult<Vec<StoredEvent>> {
        Ok(self.ctx.begin()?.events().find_by_aggregate_id(sku.as_str())?)
    }
}
