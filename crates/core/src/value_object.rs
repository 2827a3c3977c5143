//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new value; the stock counters are the canonical example here:
///
/// ```ignore
/// let before = Stock::with_available(10);
/// let after = before.reserve(4)?;   // `before` is untouched
/// assert_ne!(before, after);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
