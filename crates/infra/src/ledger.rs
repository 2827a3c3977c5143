//! One entry point bundling every service over a shared store, publisher and clock.

use std::sync::Arc;

use stockhold_core::{Clock, EventId, ReservationId, Sku, StoreId};
use stockhold_inventory::{InventoryKey, ReservationStatus};

use crate::config::LedgerConfig;
use crate::services::{
    AddStockCommand, AddStockService, CommitStockCommand, CommitStockService, EventReplayer,
    InventoryProvisioner, InventoryQueryService, InventoryView, ReleaseStockCommand,
    ReleaseStockService, ReservationView, ReserveStockCommand, ReserveStockService,
    ServiceContext, ServiceResult, StockEventPublisher, seed_sample_inventory,
};
use crate::store::{StoredEvent, TransactionManager};
use crate::sweeper::ExpirySweeper;

pub struct StockLedger<T: ?Sized, P: ?Sized> {
    config: LedgerConfig,
    ctx: ServiceContext<T, P>,
    reserve: ReserveStockService<T, P>,
    commit: CommitStockService<T, P>,
    release: ReleaseStockService<T, P>,
    add_stock: AddStockService<T, P>,
    query: InventoryQueryService<T, P>,
    replay: EventReplayer<T, P>,
    provisioner: InventoryProvisioner<T, P>,
}

impl<T, P> StockLedger<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(
        store: Arc<T>,
        publisher: Arc<P>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        let ctx = ServiceContext::new(store, publisher, clock);
        let reservation = config.reservation_policy();
        let expiration = config.expiration_policy();
        let levels = config.stock_validation_policy();

        Self {
            reserve: ReserveStockService::new(ctx.clone(), reservation),
            commit: CommitStockService::new(ctx.clone(), expiration),
            release: ReleaseStockService::new(ctx.clone()),
            add_stock: AddStockService::new(ctx.clone(), levels),
            query: InventoryQueryService::new(ctx.clone(), levels, expiration),
            replay: EventReplayer::new(ctx.clone()),
            provisioner: InventoryProvisioner::new(ctx.clone()),
            ctx,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn reserve(&self, command: ReserveStockCommand) -> ServiceResult<ReservationId> {
        self.reserve.execute(command)
    }

    pub fn commit(&self, command: CommitStockCommand) -> ServiceResult<String> {
        self.commit.execute(command)
    }

    pub fn release(&self, command: ReleaseStockCommand) -> ServiceResult<()> {
        self.release.execute(command)
    }

    pub fn add_stock(&self, command: AddStockCommand) -> ServiceResult<InventoryView> {
        self.add_stock.execute(command)
    }

    pub fn find_by_store_and_sku(
        &self,
        store_id: &StoreId,
        sku: &Sku,
    ) -> ServiceResult<Option<InventoryView>> {
        self.query.find_by_store_and_sku(store_id, sku)
    }

    pub fn find_reservation(&self, id: &ReservationId) -> ServiceResult<Option<ReservationView>> {
        self.query.find_reservation(id)
    }

    pub fn reservations_by_status(
        &self,
        status: ReservationStatus,
    ) -> ServiceResult<Vec<ReservationView>> {
        self.query.reservations_by_status(status)
    }

    pub fn event_history(&self, sku: &Sku) -> ServiceResult<Vec<StoredEvent>> {
        self.query.event_history(sku)
    }

    pub fn republish(&self, aggregate_id: &str) -> ServiceResult<usize> {
        self.replay.republish(aggregate_id)
    }

    pub fn republish_event(&self, event_id: EventId) -> ServiceResult<bool> {
        self.replay.republish_event(event_id)
    }

    pub fn provision(
        &self,
        key: InventoryKey,
        product_name: &str,
        initial_available: i64,
    ) -> ServiceResult<bool> {
        self.provisioner.provision(key, product_name, initial_available)
    }

    pub fn seed_sample_inventory(&self) -> ServiceResult<usize> {
        seed_sample_inventory(&self.provisioner)
    }

    /// Build an expiry sweeper over the same collaborators.
    pub fn sweeper(&self) -> ExpirySweeper<T, P> {
        ExpirySweeper::new(self.ctx.clone(), self.config.sweeper.purge_retention)
    }
}
