//! The three-way stock counter.

use serde::{Deserialize, Serialize};

use stockhold_core::{DomainError, DomainResult, ValueObject};

/// Immutable `(available, reserved, sold)` triple.
///
/// All three counters are non-negative at every observable instant. Every
/// transition is a pure function returning a new value; a failed transition
/// leaves the original untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StockCounters")]
pub struct Stock {
    available: i64,
    reserved: i64,
    sold: i64,
}

#[derive(Deserialize)]
struct StockCounters {
    available: i64,
    reserved: i64,
    sold: i64,
}

impl TryFrom<StockCounters> for Stock {
    type Error = DomainError;

    fn try_from(c: StockCounters) -> Result<Self, Self::Error> {
        Stock::new(c.available, c.reserved, c.sold)
    }
}

impl ValueObject for Stock {}

impl Stock {
    pub fn new(available: i64, reserved: i64, sold: i64) -> DomainResult<Self> {
        if available < 0 {
            return Err(DomainError::invalid_state("available stock cannot be negative"));
        }
        if reserved < 0 {
            return Err(DomainError::invalid_state("reserved stock cannot be negative"));
        }
        if sold < 0 {
            return Err(DomainError::invalid_state("sold stock cannot be negative"));
        }
        Ok(Self {
            available,
            reserved,
            sold,
        })
    }

    pub fn empty() -> Self {
        Self {
            available: 0,
            reserved: 0,
            sold: 0,
        }
    }

    pub fn with_available(quantity: i64) -> DomainResult<Self> {
        Self::new(quantity, 0, 0)
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn sold(&self) -> i64 {
        self.sold
    }

    /// Sellable total: `available + reserved`.
    pub fn total(&self) -> i64 {
        self.available + self.reserved
    }

    pub fn has_available(&self, quantity: i64) -> bool {
        self.available >= quantity
    }

    /// Move `quantity` from available to reserved.
    pub fn reserve(&self, quantity: i64) -> DomainResult<Self> {
        ensure_positive("reserve", quantity)?;
        if quantity > self.available {
            return Err(DomainError::invalid_operation(format!(
                "Cannot reserve {quantity} units. Only {} available",
                self.available
            )));
        }
        Self::new(self.available - quantity, self.reserved + quantity, self.sold)
    }

    /// Move `quantity` from reserved to sold.
    pub fn commit(&self, quantity: i64) -> DomainResult<Self> {
        ensure_positive("commit", quantity)?;
        if quantity > self.reserved {
            return Err(DomainError::invalid_operation(format!(
                "Cannot commit {quantity} units. Only {} reserved",
                self.reserved
            )));
        }
        Self::new(self.available, self.reserved - quantity, self.sold + quantity)
    }

    /// Move `quantity` from reserved back to available.
    pub fn release(&self, quantity: i64) -> DomainResult<Self> {
        ensure_positive("release", quantity)?;
        if quantity > self.reserved {
            return Err(DomainError::invalid_operation(format!(
                "Cannot release {quantity} units. Only {} reserved",
                self.reserved
            )));
        }
        Self::new(self.available + quantity, self.reserved - quantity, self.sold)
    }

    /// Restock: increase available by `quantity`.
    pub fn add_stock(&self, quantity: i64) -> DomainResult<Self> {
        ensure_positive("add stock", quantity)?;
        let available = self.available.checked_add(quantity).ok_or_else(|| {
            DomainError::invalid_operation(format!("Cannot add {quantity} units: counter overflow"))
        })?;
        Self::new(available, self.reserved, self.sold)
    }
}

fn ensure_positive(operation: &str, quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::invalid_operation(format!(
            "Cannot {operation} {quantity} units: quantity must be positive"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stock(available: i64, reserved: i64, sold: i64) -> Stock {
        Stock::new(available, reserved, sold).unwrap()
    }

    #[test]
    fn construction_rejects_negative_counters() {
        for (a, r, s) in [(-1, 0, 0), (0, -1, 0), (0, 0, -1)] {
            match Stock::new(a, r, s) {
                Err(DomainError::InvalidState(_)) => {}
                other => panic!("expected InvalidState, got {other:?}"),
            }
        }
    }

    #[test]
    fn reserve_moves_available_to_reserved() {
        let s = stock(100, 0, 0).reserve(10).unwrap();
        assert_eq!(s, stock(90, 10, 0));
    }

    #[test]
    fn reserve_more_than_available_fails_and_keeps_original() {
        let original = stock(5, 0, 0);
        let err = original.reserve(6).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(ref m) if m.contains("Only 5 available")));
        assert_eq!(original, stock(5, 0, 0));
    }

    #[test]
    fn commit_and_release_are_bounded_by_reserved() {
        let s = stock(10, 3, 0);
        assert!(s.commit(4).is_err());
        assert!(s.release(4).is_err());
        assert_eq!(s.commit(3).unwrap(), stock(10, 0, 3));
        assert_eq!(s.release(3).unwrap(), stock(13, 0, 0));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let s = stock(10, 10, 0);
        assert!(s.reserve(0).is_err());
        assert!(s.commit(-1).is_err());
        assert!(s.release(0).is_err());
        assert!(s.add_stock(0).is_err());
        assert!(s.add_stock(-5).is_err());
    }

    #[test]
    fn add_stock_only_touches_available() {
        assert_eq!(stock(1, 2, 3).add_stock(7).unwrap(), stock(8, 2, 3));
    }

    #[test]
    fn deserialization_enforces_invariant() {
        let ok: Stock = serde_json::from_str(r#"{"available":1,"reserved":2,"sold":3}"#).unwrap();
        assert_eq!(ok, stock(1, 2, 3));
        assert!(serde_json::from_str::<Stock>(r#"{"available":-1,"reserved":0,"sold":0}"#).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: reserve succeeds iff q <= available; failures leave the value unchanged.
        #[test]
        fn no_over_reservation(available in 0i64..1_000, q in 1i64..2_000) {
            let s = stock(available, 0, 0);
            match s.reserve(q) {
                Ok(next) => {
                    prop_assert!(q <= available);
                    prop_assert_eq!(next.available(), available - q);
                    prop_assert_eq!(next.reserved(), q);
                }
                Err(DomainError::InvalidOperation(_)) => prop_assert!(q > available),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
            prop_assert_eq!(s, stock(available, 0, 0));
        }

        /// Property: reserve then release of the same quantity is the identity.
        #[test]
        fn reserve_release_conserves(available in 1i64..1_000, reserved in 0i64..1_000, sold in 0i64..1_000, pick in 0usize..1_000) {
            let s = stock(available, reserved, sold);
            let q = (pick as i64 % available) + 1;
            let back = s.reserve(q).unwrap().release(q).unwrap();
            prop_assert_eq!(back, s);
        }

        /// Property: reserve then commit keeps available and moves q into sold.
        #[test]
        fn reserve_commit_moves_to_sold(available in 1i64..1_000, sold in 0i64..1_000, pick in 0usize..1_000) {
            let s = stock(available, 0, sold);
            let q = (pick as i64 % available) + 1;
            let reserved = s.reserve(q).unwrap();
            let committed = reserved.commit(q).unwrap();
            prop_assert_eq!(committed.available(), reserved.available());
            prop_assert_eq!(committed.reserved(), 0);
            prop_assert_eq!(committed.sold(), sold + q);
            prop_assert_eq!(committed.available() + committed.reserved() + committed.sold(), available + sold);
        }

        /// Property: any sequence of operations keeps every counter non-negative
        /// and never changes available + reserved + sold except through restocking.
        #[test]
        fn counters_never_negative(ops in prop::collection::vec((0u8..4, -5i64..50), 1..60)) {
            let mut s = stock(100, 0, 0);
            let mut added = 0i64;
            for (op, q) in ops {
                let next = match op {
                    0 => s.reserve(q),
                    1 => s.commit(q),
                    2 => s.release(q),
                    _ => s.add_stock(q),
                };
                if let Ok(n) = next {
                    if op == 3 {
                        added += q;
                    }
                    s = n;
                }
                prop_assert!(s.available() >= 0 && s.reserved() >= 0 && s.sold() >= 0);
                prop_assert_eq!(s.available() + s.reserved() + s.sold(), 100 + added);
            }
        }
    }
}
