//! Infrastructure layer: persistence ports, the in-memory ledger, aggregate
//! locks, orchestration services, publication, configuration and the expiry
//! sweeper.

pub mod config;
pub mod ledger;
pub mod lock;
pub mod publisher;
pub mod services;
pub mod store;
pub mod sweeper;

pub use config::{ConfigError, LedgerConfig, SweeperConfig};
pub use ledger::StockLedger;
pub use lock::{KeyGuard, KeyedLocks, LockError};
pub use publisher::{LoggingEventPublisher, LoggingPublishError};
pub use services::{
    AddStockCommand, CommitStockCommand, ErrorReport, InventoryView, ReleaseStockCommand,
    ReservationView, ReserveStockCommand, ServiceContext, ServiceError, ServiceResult,
    StockEventPublisher,
};
pub use store::{
    EventStore, InMemoryLedger, InventoryRepository, RepositoryError, RepositoryResult,
    ReservationRepository, StoredEvent, Transaction, TransactionManager,
};
pub use sweeper::{ExpirySweeper, SweepReport, SweeperHandle, SweeperStats};
