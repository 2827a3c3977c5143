//! Release: RESERVED → CANCELLED.

use tracing::{debug, info};

use stockhold_core::Entity;
use stockhold_inventory::{DomainEvent, Reservation, ReservationStatus, StockEvent, StockReleased};

use super::commit::find_reservation;
use super::{
    ReleaseStockCommand, ServiceContext, ServiceError, ServiceResult, StockEventPublisher,
    lock_inventory, log_failure,
};
use crate::store::TransactionManager;

pub struct ReleaseStockService<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
}

impl<T, P> ReleaseStockService<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>) -> Self {
        Self { ctx }
    }

    /// Cancel a hold and return its units to available stock.
    ///
    /// Expired holds are releasable; terminal ones are not.
    pub fn execute(&self, command: ReleaseStockCommand) -> ServiceResult<()> {
        info!(
            reservation_id = %command.reservation_id,
            reason = %command.reason,
            "releasing reservation"
        );
        let result = self.release(command);
        log_failure("release", &result);
        result
    }

    fn release(&self, command: ReleaseStockCommand) -> ServiceResult<()> {
        if command.reason.trim().is_empty() {
            return Err(ServiceError::validation(
                "Release validation failed",
                vec!["Release reason is required".to_owned()],
            ));
        }

        let mut tx = self.ctx.begin()?;

        let reservation = find_reservation(tx.as_mut(), &command.reservation_id)?;
        ensure_releasable(&reservation)?;

        let key = reservation.inventory_key();
        let mut inventory = lock_inventory(tx.as_mut(), &key)?;

        let mut reservation = find_reservation(tx.as_mut(), &command.reservation_id)?;
        ensure_releasable(&reservation)?;
        debug!(key = %key, stock = ?inventory.stock(), "inventory loaded under lock");

        let now = self.ctx.now();
        inventory.release(reservation.quantity(), now)?;
        reservation.cancel()?;
        let event = DomainEvent::new(
            StockEvent::StockReleased(StockReleased {
                reservation_id: reservation.id().clone(),
                store_id: reservation.store_id().clone(),
                sku: reservation.sku().clone(),
                quantity: reservation.quantity(),
                reason: command.reason.clone(),
            }),
            now,
        );

        tx.inventories().save(inventory)?;
        tx.reservations().save(reservation)?;
        tx.events().append(event)?;
        let committed = tx.commit()?;

        info!(reservation_id = %command.reservation_id, key = %key, "reservation released");
        self.ctx.publish(&committed);
        Ok(())
    }
}

fn ensure_releasable(reservation: &Reservation) -> Result<(), ServiceError> {
    if !reservation.can_be_released() {
        return Err(ServiceError::InvalidReservationState {
            reservation_id: reservation.id().clone(),
            current: reservation.status(),
            expected: ReservationStatus::Reserved,
        });
    }
    Ok(())
}
