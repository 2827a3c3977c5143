//! Entity trait: identity that survives state changes.

/// An object tracked by identity through a lifecycle.
///
/// Two snapshots of the same entity compare as the same thing even after its
/// status moved on; once the lifecycle reaches a terminal state the entity is
/// settled and only kept for history.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// No further state change is possible.
    fn is_settled(&self) -> bool;

    /// Same identity, regardless of state.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
