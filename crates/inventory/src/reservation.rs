//! Reservation entity and its status lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{DomainError, DomainResult, Entity, ReservationId, Sku, StoreId};

use crate::inventory::InventoryKey;

/// Reservation lifecycle.
///
/// `Reserved` is initial; `Committed` and `Cancelled` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Reserved,
    Committed,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 3] = [Self::Reserved, Self::Committed, Self::Cancelled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Committed => "COMMITTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Cancelled)
    }

    /// Transition table. Anything not listed here is illegal.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Reserved, Self::Committed) | (Self::Reserved, Self::Cancelled)
        )
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown reservation status '{s}'")))
    }
}

/// A hold of `quantity` units against one Inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    store_id: StoreId,
    sku: Sku,
    quantity: i64,
    customer_id: String,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    committed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Open a new hold in status `RESERVED`, expiring at `created_at + ttl`.
    pub fn new(
        id: ReservationId,
        key: &InventoryKey,
        quantity: i64,
        customer_id: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> DomainResult<Self> {
        let customer_id = customer_id.into();
        if quantity <= 0 {
            return Err(DomainError::validation("reservation quantity must be positive"));
        }
        if customer_id.trim().is_empty() {
            return Err(DomainError::validation("customer id cannot be empty"));
        }
        Ok(Self {
            id,
            store_id: key.store_id().clone(),
            sku: key.sku().clone(),
            quantity,
            customer_id,
            status: ReservationStatus::Reserved,
            created_at,
            expires_at: created_at + ttl,
            committed_at: None,
        })
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn inventory_key(&self) -> InventoryKey {
        InventoryKey::new(self.store_id.clone(), self.sku.clone())
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Hold window this reservation was created with.
    pub fn ttl(&self) -> Duration {
        self.expires_at - self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn can_be_committed(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Reserved && !self.is_expired(now)
    }

    pub fn can_be_released(&self) -> bool {
        self.status.can_transition_to(ReservationStatus::Cancelled)
    }

    /// `RESERVED -> COMMITTED`. Rejected once expired.
    pub fn commit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_transition(ReservationStatus::Committed)?;
        if self.is_expired(now) {
            return Err(DomainError::expired(self.id.as_str(), self.expires_at));
        }
        self.status = ReservationStatus::Committed;
        self.committed_at = Some(now);
        Ok(())
    }

    /// `RESERVED -> CANCELLED`, regardless of expiry.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.ensure_transition(ReservationStatus::Cancelled)?;
        self.status = ReservationStatus::Cancelled;
        Ok(())
    }

    fn ensure_transition(&self, next: ReservationStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                self.id.as_str(),
                self.status,
                ReservationStatus::Reserved,
            ));
        }
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_settled(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn reservation(quantity: i64) -> Reservation {
        Reservation::new(
            ReservationId::generate(),
            &InventoryKey::parse("STORE-01", "SKU123").unwrap(),
            quantity,
            "CUST-1",
            t0(),
            Duration::minutes(15),
        )
        .unwrap()
    }

    #[test]
    fn new_reservation_is_reserved_with_ttl() {
        let r = reservation(10);
        assert_eq!(r.status(), ReservationStatus::Reserved);
        assert_eq!(r.expires_at(), t0() + Duration::minutes(15));
        assert_eq!(r.ttl(), Duration::minutes(15));
        assert_eq!(r.committed_at(), None);
    }

    #[test]
    fn rejects_non_positive_quantity_and_blank_customer() {
        let key = InventoryKey::parse("STORE-01", "SKU123").unwrap();
        let ttl = Duration::minutes(15);
        assert!(Reservation::new(ReservationId::generate(), &key, 0, "C", t0(), ttl).is_err());
        assert!(Reservation::new(ReservationId::generate(), &key, 1, " ", t0(), ttl).is_err());
    }

    #[test]
    fn transition_table_only_leaves_reserved() {
        use ReservationStatus::*;
        for from in ReservationStatus::ALL {
            for to in ReservationStatus::ALL {
                let legal = from == Reserved && to != Reserved;
                assert_eq!(from.can_transition_to(to), legal, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn commit_sets_committed_at() {
        let mut r = reservation(1);
        let at = t0() + Duration::minutes(3);
        r.commit(at).unwrap();
        assert_eq!(r.status(), ReservationStatus::Committed);
        assert_eq!(r.committed_at(), Some(at));
    }

    #[test]
    fn expiry_blocks_commit_but_not_cancel() {
        let mut r = reservation(1);
        let late = t0() + Duration::minutes(16);
        assert!(r.is_expired(late));
        assert!(!r.is_expired(t0() + Duration::minutes(15)));
        assert!(matches!(r.commit(late), Err(DomainError::Expired { .. })));
        assert_eq!(r.status(), ReservationStatus::Reserved);

        r.cancel().unwrap();
        assert_eq!(r.status(), ReservationStatus::Cancelled);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut committed = reservation(1);
        committed.commit(t0()).unwrap();
        match committed.cancel() {
            Err(DomainError::InvalidTransition { current, expected, .. }) => {
                assert_eq!(current, "COMMITTED");
                assert_eq!(expected, "RESERVED");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }

        let mut cancelled = reservation(1);
        let before = cancelled.clone();
        assert!(!before.is_settled());
        cancelled.cancel().unwrap();
        assert!(cancelled.is_settled());
        assert!(cancelled.same_identity_as(&before));
        assert!(!cancelled.same_identity_as(&reservation(1)));
        assert!(cancelled.cancel().is_err());
        assert!(cancelled.commit(t0()).is_err());
        assert!(!cancelled.can_be_released());
    }

    #[test]
    fn status_parses_and_serializes_as_upper_case() {
        assert_eq!("CANCELLED".parse::<ReservationStatus>().unwrap(), ReservationStatus::Cancelled);
        assert!("cancelled".parse::<ReservationStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Committed).unwrap(),
            "\"COMMITTED\""
        );
    }
}
