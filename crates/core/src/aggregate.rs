//! Aggregate root trait and the concurrency token attached to aggregates.

use thiserror::Error;

/// Aggregate root marker + minimal interface.
///
/// An aggregate is the unit of locking and of persistence: every mutation of
/// its state happens through its own transition methods, and every committed
/// mutation advances `version()`.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's persisted state.
    ///
    /// `0` means the aggregate has never been persisted.
    fn version(&self) -> u64;
}

/// Version mismatch detected while persisting an aggregate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("version check failed (expected: {expected:?}, actual: {actual})")]
pub struct VersionConflict {
    pub expected: ExpectedVersion,
    pub actual: u64,
}

/// Concurrency expectation for an aggregate write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (provisioning, migrations).
    Any,
    /// Require the stored aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> Result<(), VersionConflict> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(VersionConflict {
                expected: self,
                actual,
            })
        }
    }
}
