use chrono::{DateTime, Utc};

use stockhold_core::EventId;

/// A domain event: an immutable fact about one aggregate stream.
///
/// The stream is identified by `(aggregate_type, aggregate_id)`; `event_id`
/// is what at-least-once consumers and the durable log deduplicate on.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Globally unique, assigned once when the event is raised.
    fn event_id(&self) -> EventId;

    /// Stable event name (e.g. "StockReserved").
    fn event_type(&self) -> &'static str;

    /// Kind of aggregate the stream belongs to (e.g. "inventory").
    fn aggregate_type(&self) -> &'static str;

    /// Correlation key of the stream.
    fn aggregate_id(&self) -> &str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
