//! Commit: RESERVED → COMMITTED.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use stockhold_core::{Entity, ReservationId};
use stockhold_inventory::{
    DomainEvent, ExpirationPolicy, Reservation, ReservationStatus, StockCommitted, StockEvent,
};

use super::{
    CommitStockCommand, ServiceContext, ServiceError, ServiceResult, StockEventPublisher,
    lock_inventory, log_failure,
};
use crate::store::{Transaction, TransactionManager};

pub struct CommitStockService<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
    expiration: ExpirationPolicy,
}

impl<T, P> CommitStockService<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>, expiration: ExpirationPolicy) -> Self {
        Self { ctx, expiration }
    }

    /// Turn a live hold into a sale. Returns the order id as confirmation.
    ///
    /// An expired hold is rejected even if it is still `RESERVED`.
    pub fn execute(&self, command: CommitStockCommand) -> ServiceResult<String> {
        info!(
            reservation_id = %command.reservation_id,
            order_id = %command.order_id,
            "committing reservation"
        );
        let result = self.commit(command);
        log_failure("commit", &result);
        result
    }

    fn commit(&self, command: CommitStockCommand) -> ServiceResult<String> {
        if command.order_id.trim().is_empty() {
            return Err(ServiceError::validation(
                "Commit validation failed",
                vec!["Order id is required".to_owned()],
            ));
        }

        let mut tx = self.ctx.begin()?;

        let reservation = find_reservation(tx.as_mut(), &command.reservation_id)?;
        self.ensure_committable(&reservation, self.ctx.now())?;

        let key = reservation.inventory_key();
        let mut inventory = lock_inventory(tx.as_mut(), &key)?;

        // Re-read under the lock: a concurrent commit/release may have won,
        // and the hold may have expired while waiting.
        let now = self.ctx.now();
        let mut reservation = find_reservation(tx.as_mut(), &command.reservation_id)?;
        self.ensure_committable(&reservation, now)?;
        debug!(key = %key, stock = ?inventory.stock(), "inventory loaded under lock");

        inventory.commit(reservation.quantity(), now)?;
        reservation.commit(now)?;
        let event = DomainEvent::new(
            StockEvent::StockCommitted(StockCommitted {
                reservation_id: reservation.id().clone(),
                store_id: reservation.store_id().clone(),
                sku: reservation.sku().clone(),
                quantity: reservation.quantity(),
                customer_id: reservation.customer_id().to_owned(),
                order_id: command.order_id.clone(),
            }),
            now,
        );

        tx.inventories().save(inventory)?;
        tx.reservations().save(reservation)?;
        tx.events().append(event)?;
        let committed = tx.commit()?;

        info!(
            reservation_id = %command.reservation_id,
            order_id = %command.order_id,
            key = %key,
            "reservation committed"
        );
        self.ctx.publish(&committed);
        Ok(command.order_id)
    }

    fn ensure_committable(
        &self,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if reservation.status() != ReservationStatus::Reserved {
            return Err(ServiceError::InvalidReservationState {
                reservation_id: reservation.id().clone(),
                current: reservation.status(),
                expected: ReservationStatus::Reserved,
            });
        }
        if self.expiration.is_expired(reservation, now) {
            return Err(ServiceError::ReservationExpired {
                reservation_id: reservation.id().clone(),
                expired_at: reservation.expires_at(),
                ttl_minutes: reservation.ttl().num_minutes(),
            });
        }
        Ok(())
    }
}

pub(crate) fn find_reservation(
    tx: &mut (dyn Transaction + '_),
    id: &ReservationId,
) -> ServiceResult<Reservation> {
    tx.reservations()
        .find_by_id(id)?
        .ok_or_else(|| ServiceError::ReservationNotFound(id.clone()))
}
