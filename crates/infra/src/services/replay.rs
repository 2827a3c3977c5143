//! Re-publication of the durable log.
//!
//! Publication after commit is best-effort; when a notification is lost the
//! log still has the event, and this is the path to send it again. Consumers
//! already tolerate duplicates via the envelope's sequence number.

use tracing::{info, warn};

use stockhold_core::EventId;

use super::{ServiceContext, ServiceError, ServiceResult, StockEventPublisher};
use crate::store::TransactionManager;

pub struct EventReplayer<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
}

impl<T, P> EventReplayer<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>) -> Self {
        Self { ctx }
    }

    /// Publish every stored event of `aggregate_id` again, in log order.
    pub fn republish(&self, aggregate_id: &str) -> ServiceResult<usize> {
        let events = self.ctx.begin()?.events().find_by_aggregate_id(aggregate_id)?;
        let count = events.len();
        let envelopes = events.iter().map(|e| e.to_envelope()).collect();

        self.ctx.publisher().publish_batch(envelopes).map_err(|err| {
            warn!(aggregate_id, error = %err, "republish failed");
            ServiceError::internal(ReplayFailed(err.to_string()))
        })?;

        info!(aggregate_id, events = count, "aggregate stream republished");
        Ok(count)
    }

    /// Publish a single stored event again. Returns `false` if it is unknown.
    pub fn republish_event(&self, event_id: EventId) -> ServiceResult<bool> {
        let Some(stored) = self.ctx.begin()?.events().find_by_event_id(event_id)? else {
            return Ok(false);
        };
        self.ctx
            .publisher()
            .publish(stored.to_envelope())
            .map_err(|err| ServiceError::internal(ReplayFailed(err.to_string())))?;
        Ok(true)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("republish failed: {0}")]
struct ReplayFailed(String);
