//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inside an aggregate, entities are looked up by identity, never by value:
/// two cart lines for the same product are the same line.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
