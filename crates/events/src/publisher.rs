//! Event publication abstraction (mechanics only).
//!
//! Publication is the **secondary** half of the event contract: an event is
//! first appended to the durable log, and only then handed to a publisher.
//!
//! - **Best-effort**: a failed publish never undoes the state change that
//!   produced the event; the durable log stays the source of truth.
//! - **At-least-once**: a notification can be re-sent from the log, so
//!   consumers must tolerate duplicates (the envelope's sequence number helps).
//! - **No ordering across aggregates**: only the per-aggregate sequence is meaningful.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a published stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Intended for single-threaded consumption.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(envelope) => handle(envelope),
///         Err(RecvTimeoutError::Timeout) => continue,
///         Err(RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Publishes committed events to interested consumers.
///
/// Implementations may talk to an in-process channel, a log line, or an
/// external broker. Callers treat failures as non-fatal: they log them and
/// move on, since the event is already in the durable log and can be
/// republished from there.
pub trait EventPublisher<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    /// Publish several messages in order.
    ///
    /// The default publishes one by one and stops at the first failure.
    fn publish_batch(&self, messages: Vec<M>) -> Result<(), Self::Error> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }
}

impl<M, P> EventPublisher<M> for Arc<P>
where
    P: EventPublisher<M> + ?Sized,
{
    type Error = P::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn publish_batch(&self, messages: Vec<M>) -> Result<(), Self::Error> {
        (**self).publish_batch(messages)
    }
}
