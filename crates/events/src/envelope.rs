use serde::{Deserialize, Serialize};

use stockhold_core::EventId;

use crate::event::Event;

/// Envelope for an event, containing stream metadata.
///
/// This is the unit handed to publishers after the event has been durably
/// appended.
///
/// Notes:
/// - `aggregate_id` is the correlation key of the stream (the sku for stock events).
/// - `sequence_number` is monotonically increasing per aggregate stream and lets
///   at-least-once consumers drop duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: EventId,

    aggregate_id: String,
    aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: EventId,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    /// Wrap an event at its position in the stream, taking the stream
    /// metadata from the event itself.
    pub fn seal(event: E, sequence_number: u64) -> Self
    where
        E: Event,
    {
        let aggregate_id = event.aggregate_id().to_owned();
        Self::new(
            event.event_id(),
            aggregate_id,
            event.aggregate_type(),
            sequence_number,
            event,
        )
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    #[derive(Debug, Clone)]
    struct Restocked {
        id: EventId,
        sku: String,
        at: DateTime<Utc>,
    }

    impl Event for Restocked {
        fn event_id(&self) -> EventId {
            self.id
        }

        fn event_type(&self) -> &'static str {
            "Restocked"
        }

        fn aggregate_type(&self) -> &'static str {
            "inventory"
        }

        fn aggregate_id(&self) -> &str {
            &self.sku
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn seal_copies_stream_metadata_from_the_event() {
        let event = Restocked {
            id: EventId::new(),
            sku: "SKU123".into(),
            at: Utc::now(),
        };
        let id = event.id;

        let envelope = EventEnvelope::seal(event, 7);

        assert_eq!(envelope.event_id(), id);
        assert_eq!(envelope.aggregate_id(), "SKU123");
        assert_eq!(envelope.aggregate_type(), "inventory");
        assert_eq!(envelope.sequence_number(), 7);
        assert_eq!(envelope.payload().sku, "SKU123");
    }
}
