//! Reserve: none → RESERVED.

use tracing::{debug, info};

use stockhold_core::ReservationId;
use stockhold_inventory::{DomainEvent, Reservation, ReservationPolicy, StockEvent, StockReserved};

use super::{
    ReserveStockCommand, ServiceContext, ServiceError, ServiceResult, StockEventPublisher,
    lock_inventory, log_failure,
};
use crate::store::TransactionManager;

pub struct ReserveStockService<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
    policy: ReservationPolicy,
}

impl<T, P> ReserveStockService<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>, policy: ReservationPolicy) -> Self {
        Self { ctx, policy }
    }

    /// Place a hold and return its id.
    ///
    /// The aggregate lock is taken before validation and held until the
    /// inventory, the reservation and the `StockReserved` event are committed.
    pub fn execute(&self, command: ReserveStockCommand) -> ServiceResult<ReservationId> {
        info!(
            store_id = %command.store_id,
            sku = %command.sku,
            quantity = command.quantity,
            customer_id = %command.customer_id,
            "reserving stock"
        );
        let result = self.reserve(command);
        log_failure("reserve", &result);
        result
    }

    fn reserve(&self, command: ReserveStockCommand) -> ServiceResult<ReservationId> {
        if command.customer_id.trim().is_empty() {
            return Err(ServiceError::validation(
                "Reservation validation failed",
                vec!["Customer id is required".to_owned()],
            ));
        }

        let key = command.key();
        let mut tx = self.ctx.begin()?;
        let mut inventory = lock_inventory(tx.as_mut(), &key)?;
        debug!(key = %key, stock = ?inventory.stock(), "inventory loaded under lock");

        let validation = self.policy.validate(&inventory, command.quantity);
        if !validation.is_valid() {
            return Err(ServiceError::validation(
                "Reservation validation failed",
                validation.into_errors(),
            ));
        }

        let now = self.ctx.now();
        let reservation_id = ReservationId::generate();
        inventory.reserve(command.quantity, now)?;
        let reservation = Reservation::new(
            reservation_id.clone(),
            &key,
            command.quantity,
            command.customer_id.clone(),
            now,
            self.policy.ttl(),
        )?;
        let event = DomainEvent::new(
            StockEvent::StockReserved(StockReserved {
                reservation_id: reservation_id.clone(),
                store_id: command.store_id,
                sku: command.sku,
                quantity: command.quantity,
                customer_id: command.customer_id,
            }),
            now,
        );

        tx.inventories().save(inventory)?;
        tx.reservations().save(reservation)?;
        tx.events().append(event)?;
        let committed = tx.commit()?;

        info!(reservation_id = %reservation_id, key = %key, "stock reserved");
        self.ctx.publish(&committed);
        Ok(reservation_id)
    }
}
