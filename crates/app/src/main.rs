use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use stockhold_core::{Clock, Sku, StoreId, SystemClock};
use stockhold_infra::{
    CommitStockCommand, InMemoryLedger, LedgerConfig, LoggingEventPublisher, ReleaseStockCommand,
    ReserveStockCommand, StockLedger,
};

fn main() -> anyhow::Result<()> {
    stockhold_observability::init();

    let config = LedgerConfig::from_env().context("invalid ledger configuration")?;
    info!(
        ttl_minutes = config.reservation_ttl.num_minutes(),
        max_quantity = config.max_quantity_per_reservation,
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        sweeper = config.sweeper.enabled,
        "starting stock ledger"
    );

    let store = Arc::new(InMemoryLedger::with_lock_timeout(config.lock_timeout));
    let ledger = StockLedger::new(
        store,
        Arc::new(LoggingEventPublisher::new()),
        Arc::new(SystemClock) as Arc<dyn Clock>,
        config,
    );

    let seeded = ledger.seed_sample_inventory()?;
    info!(seeded, "sample inventory ready");

    let sweeper = if ledger.config().sweeper.enabled {
        let interval = ledger.config().sweeper.interval;
        Some(
            ledger
                .sweeper()
                .spawn(interval)
                .context("failed to start expiry sweeper")?,
        )
    } else {
        None
    };

    let outcome = walkthrough(&ledger);

    if let Some(handle) = sweeper {
        let stats = handle.stats();
        info!(sweeps = stats.sweeps, released = stats.released, "stopping expiry sweeper");
        handle.shutdown();
    }
    outcome
}

/// Reserve, commit and release against the sample catalogue, logging each step.
fn walkthrough(ledger: &StockLedger<InMemoryLedger, LoggingEventPublisher>) -> anyhow::Result<()> {
    let store_id = StoreId::parse("STORE-01")?;
    let sku = Sku::parse("SKU123")?;

    let committed = ledger.reserve(ReserveStockCommand::new(
        store_id.clone(),
        sku.clone(),
        2,
        "CUST-001",
    ))?;
    let order_id = ledger.commit(CommitStockCommand::new(committed.clone(), "ORDER-1001"))?;
    info!(reservation_id = %committed, order_id = %order_id, "reservation committed");

    let released = ledger.reserve(ReserveStockCommand::new(
        store_id.clone(),
        sku.clone(),
        5,
        "CUST-002",
    ))?;
    ledger.release(ReleaseStockCommand::new(released.clone(), "customer cancelled"))?;
    info!(reservation_id = %released, "reservation released");

    match ledger.reserve(ReserveStockCommand::new(store_id.clone(), sku.clone(), 500, "CUST-003")) {
        Ok(id) => warn!(reservation_id = %id, "oversized reservation unexpectedly accepted"),
        Err(err) => {
            let report = serde_json::to_string(&err.report())?;
            info!(error = %report, "oversized reservation rejected");
        }
    }

    if let Some(view) = ledger.find_by_store_and_sku(&store_id, &sku)? {
        info!(inventory = %serde_json::to_string(&view)?, "final stock");
    }
    let history = ledger.event_history(&sku)?;
    info!(events = history.len(), sku = %sku, "event history");
    Ok(())
}
