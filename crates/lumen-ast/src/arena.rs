//! Append-only node storage addressed by typed handles.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Position of a node inside an [`Arena`].
///
/// A handle is only meaningful for the arena that issued it. Comparing
/// handles compares issue order.
pub struct Handle<T> {
    slot: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn from_slot(slot: usize) -> Self {
        let slot = u32::try_from(slot)
            .unwrap_or_else(|_| panic!("arena slot {slot} does not fit in a u32 handle"));
        Self {
            slot,
            marker: PhantomData,
        }
    }

    /// Zero-based issue order of this handle.
    pub fn index(self) -> usize {
        self.slot as usize
    }
}

// Manual impls keep these free of bounds on `T`.
impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.slot.cmp(&other.slot)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.slot);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot)
    }
}

/// Growable node store. Nodes are never removed; a program that drops a
/// node simply stops referring to it.
#[derive(Clone, Debug)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stores `value` and hands back its position.
    pub fn append(&mut self, value: T) -> Handle<T> {
        let handle = Handle::from_slot(self.items.len());
        self.items.push(value);
        handle
    }

    pub fn try_get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    /// Nodes paired with their handles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(slot, item)| (Handle::from_slot(slot), item))
    }
}

impl<T> Index<Handle<T>> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &self.items[handle.index()]
    }
}

impl<T> IndexMut<Handle<T>> for Arena<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.items[handle.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_follow_issue_order() {
        let mut names = Arena::new();
        let first = names.append("a");
        let second = names.append("b");
        assert!(first < second);
        assert_eq!(second.index(), 1);
        assert_eq!(names[second], "b");
        assert_eq!(format!("{first:?}"), "#0");
    }

    #[test]
    fn iteration_pairs_handles_with_nodes() {
        let mut arena = Arena::new();
        for v in [3, 1, 2] {
            arena.append(v);
        }
        let seen: Vec<(usize, i32)> = arena.iter().map(|(h, &v)| (h.index(), v)).collect();
        assert_eq!(seen, [(0, 3), (1, 1), (2, 2)]);
    }

    #[test]
    fn foreign_handles_miss() {
        let mut big = Arena::new();
        big.append(1u8);
        let stray = big.append(2u8);
        let mut small = Arena::new();
        small.append(9u8);
        assert_eq!(small.try_get(stray), None);

        small[Handle::from_slot(0)] = 4;
        assert_eq!(small.try_get(Handle::from_slot(0)), Some(&4));
    }
}
