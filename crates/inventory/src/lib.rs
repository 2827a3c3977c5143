//! Inventory reservation domain.
//!
//! Pure, deterministic business rules: the three-way stock counter, the
//! Inventory aggregate, the Reservation lifecycle, admission/expiry policies
//! and the events every stock movement produces. No IO, no locking, no storage.

pub mod events;
pub mod inventory;
pub mod policy;
pub mod reservation;
pub mod stock;

pub use events::{
    AGGREGATE_TYPE, DomainEvent, StockAdded, StockCommitted, StockEvent, StockReleased,
    StockReserved,
};
pub use inventory::{Inventory, InventoryKey};
pub use policy::{
    ExpirationPolicy, ReservationPolicy, StockLevel, StockValidationPolicy, ValidationResult,
};
pub use reservation::{Reservation, ReservationStatus};
pub use stock::Stock;
