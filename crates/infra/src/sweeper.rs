//! Optional expiry sweeper.
//!
//! Expiry is enforced lazily at commit time; nothing depends on this
//! running. When enabled it reclaims abandoned holds by releasing every
//! `RESERVED` reservation past its deadline, and purges settled
//! reservations once they are older than the retention window.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Duration as ChronoDuration;
use serde::Serialize;
use tracing::{debug, info, warn};

use stockhold_core::Entity;
use stockhold_inventory::ReservationStatus;

use crate::services::{
    ReleaseStockCommand, ReleaseStockService, ServiceContext, ServiceError, ServiceResult,
    StockEventPublisher,
};
use crate::store::TransactionManager;

pub const EXPIRED_RELEASE_REASON: &str = "reservation expired";

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub released: usize,
    /// Settled by someone else between the scan and the release.
    pub skipped: usize,
    pub failed: usize,
}

/// Sweeper runtime statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweeperStats {
    pub sweeps: u64,
    pub released: u64,
    pub failed: u64,
    pub purged: u64,
    pub uptime_secs: u64,
    pub last_error: Option<String>,
}

pub struct ExpirySweeper<T: ?Sized, P: ?Sized> {
    ctx: ServiceContext<T, P>,
    release: ReleaseStockService<T, P>,
    retention: ChronoDuration,
}

impl<T, P> ExpirySweeper<T, P>
where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    pub fn new(ctx: ServiceContext<T, P>, retention: ChronoDuration) -> Self {
        Self {
            release: ReleaseStockService::new(ctx.clone()),
            ctx,
            retention,
        }
    }

    /// Release every expired `RESERVED` reservation through the Release service.
    pub fn sweep_once(&self) -> ServiceResult<SweepReport> {
        let now = self.ctx.now();
        let expired = self.ctx.begin()?.reservations().find_expired(now)?;

        let mut report = SweepReport::default();
        for reservation in expired {
            let id = reservation.id().clone();
            match self
                .release
                .execute(ReleaseStockCommand::new(id.clone(), EXPIRED_RELEASE_REASON))
            {
                Ok(()) => report.released += 1,
                Err(
                    ServiceError::InvalidReservationState { .. }
                    | ServiceError::ReservationNotFound(_),
                ) => {
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(
                        reservation_id = %id,
                        code = err.code(),
                        "expired reservation could not be released"
                    );
                    report.failed += 1;
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                released = report.released,
                skipped = report.skipped,
                failed = report.failed,
                "expiry sweep finished"
            );
        }
        Ok(report)
    }

    /// Delete committed/cancelled reservations whose `expires_at` is older
    /// than the retention window. Returns how many were deleted.
    pub fn purge_settled(&self) -> ServiceResult<usize> {
        let cutoff = self.ctx.now() - self.retention;
        let mut tx = self.ctx.begin()?;
        let mut purged = 0;
        for status in [ReservationStatus::Committed, ReservationStatus::Cancelled] {
            let settled = tx.reservations().find_by_status(status)?;
            let purgeable = settled
                .iter()
                .filter(|r| r.is_settled() && r.expires_at() < cutoff);
            for reservation in purgeable {
                tx.reservations().delete(reservation)?;
                purged += 1;
            }
        }
        tx.commit()?;
        if purged > 0 {
            info!(purged, cutoff = %cutoff, "settled reservations purged");
        }
        Ok(purged)
    }
}

impl<T, P> ExpirySweeper<T, P>
where
    T: TransactionManager + ?Sized + 'static,
    P: StockEventPublisher + ?Sized + 'static,
{
    /// Run sweeps every `interval` on a named background thread.
    pub fn spawn(self, interval: Duration) -> std::io::Result<SweeperHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(SweeperStats::default()));
        let loop_stats = Arc::clone(&stats);

        let join = thread::Builder::new()
            .name("expiry-sweeper".to_string())
            .spawn(move || sweeper_loop(self, interval, shutdown_rx, loop_stats))?;

        Ok(SweeperHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

/// Handle to a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<SweeperStats>>,
}

impl SweeperHandle {
    /// Stop the loop and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    pub fn stats(&self) -> SweeperStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn sweeper_loop<T, P>(
    sweeper: ExpirySweeper<T, P>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<SweeperStats>>,
) where
    T: TransactionManager + ?Sized,
    P: StockEventPublisher + ?Sized,
{
    info!(interval_ms = interval.as_millis() as u64, "expiry sweeper started");
    let started = Instant::now();

    loop {
        match shutdown_rx.recv_timeout(interval) {
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let sweep = sweeper.sweep_once();
        let purge = sweeper.purge_settled();

        let mut s = stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        s.sweeps += 1;
        s.uptime_secs = started.elapsed().as_secs();
        match sweep {
            Ok(report) => {
                s.released += report.released as u64;
                s.failed += report.failed as u64;
            }
            Err(err) => {
                warn!(error = %err, "expiry sweep failed");
                s.last_error = Some(err.to_string());
            }
        }
        match purge {
            Ok(purged) => s.purged += purged as u64,
            Err(err) => {
                warn!(error = %err, "purge of settled reservations failed");
                s.last_error = Some(err.to_string());
            }
        }
        debug!(sweeps = s.sweeps, "sweeper tick");
    }

    info!("expiry sweeper stopped");
}
