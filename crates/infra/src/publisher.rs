//! Publisher that writes every event to the log as JSON.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use stockhold_events::EventPublisher;

#[derive(Debug, Error)]
pub enum LoggingPublishError {
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Logs each published message at `info` under the `stockhold::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl<M> EventPublisher<M> for LoggingEventPublisher
where
    M: Serialize + Send,
{
    type Error = LoggingPublishError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let json = serde_json::to_string(&message)?;
        info!(target: "stockhold::events", event = %json, "event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publishes_serializable_messages() {
        let publisher = LoggingEventPublisher::new();
        assert!(publisher.publish(json!({"type": "StockAdded"})).is_ok());
        assert!(publisher.publish_batch(vec![json!(1), json!(2)]).is_ok());
    }
}
