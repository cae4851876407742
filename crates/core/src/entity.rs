//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Collections keyed by identity (reservations, guests, rooms) use this to
/// deduplicate when merging server data into local state.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Append every entity from `incoming` whose id is not already present in
/// `existing`. Returns how many were appended.
pub fn append_missing<T: Entity + Clone>(existing: &mut Vec<T>, incoming: &[T]) -> usize {
    let mut appended = 0;
    for item in incoming {
        if !existing.iter().any(|e| e.id() == item.id()) {
            existing.push(item.clone());
            appended += 1;
        }
    }
    appended
}
