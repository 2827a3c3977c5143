//! Event mechanics shared by the domain and infrastructure layers.
//!
//! Nothing here knows about stock or reservations: this crate defines what an
//! event is, how it is wrapped for distribution, and how it is published.

pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod publisher;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use publisher::{EventPublisher, Subscription};
