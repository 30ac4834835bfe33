//! Type-keyed bag of transform inputs and outputs.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Holds at most one value per Rust type.
///
/// Transforms read their configuration from a `DataMap` by type (for
/// example [`SingleEntryPointConfig`](crate::SingleEntryPointConfig)) and
/// report results the same way.
#[derive(Default)]
pub struct DataMap {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, replacing any earlier value of the same type.
    pub fn add<T: Any>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Removes and returns the value of type `T`.
    pub fn take<T: Any>(&mut self) -> Option<T> {
        let boxed = self.entries.remove(&TypeId::of::<T>())?;
        boxed.downcast().ok().map(|b| *b)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Moves every entry of `other` into `self`; `other` wins on conflict.
    pub fn merge(&mut self, other: DataMap) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DataMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Limit(u32);

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    #[test]
    fn values_are_keyed_by_type() {
        let mut data = DataMap::new();
        data.add(Limit(3));
        data.add(Label("a"));
        data.add(Limit(4));
        assert_eq!(data.len(), 2);
        assert_eq!(data.get::<Limit>(), Some(&Limit(4)));
        assert_eq!(data.get::<Label>(), Some(&Label("a")));
        assert!(data.get::<u32>().is_none());
    }

    #[test]
    fn take_removes() {
        let mut data = DataMap::new();
        data.add(Limit(1));
        assert_eq!(data.take::<Limit>(), Some(Limit(1)));
        assert!(!data.contains::<Limit>());
        assert!(data.take::<Limit>().is_none());
    }

    #[test]
    fn merge_prefers_other() {
        let mut a = DataMap::new();
        a.add(Limit(1));
        a.add(Label("kept"));
        let mut b = DataMap::new();
        b.add(Limit(2));
        a.merge(b);
        assert_eq!(a.get::<Limit>(), Some(&Limit(2)));
        assert_eq!(a.get::<Label>(), Some(&Label("kept")));
    }
}
