//! Owned, uuid-indexed child collections.
//!
//! A [`ChildCollection`] never holds two elements with the same key. Insertion is
//! insert-if-absent: the first element delivered for a key is kept and later ones are ignored.
//! Element order is insertion order. Every change bumps a logical `version` so observers can
//! cheaply tell whether a collection changed.

use crate::store::Record;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Anything that can live in a [`ChildCollection`].
pub trait Keyed {
    /// The element's identity (its uuid).
    fn key(&self) -> &str;

    fn is_voided(&self) -> bool {
        false
    }
}

impl Keyed for Record {
    fn key(&self) -> &str {
        self.uuid().unwrap_or_default()
    }

    fn is_voided(&self) -> bool {
        self.voided()
    }
}

#[derive(Clone, Debug)]
pub struct ChildCollection<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
    version: u64,
}

impl<T> Default for ChildCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            version: 0,
        }
    }
}

impl<T: Keyed> ChildCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from `items`, dropping any element whose key was already seen.
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        for item in items {
            collection.insert_if_absent(item);
        }
        collection.version = 0;
        collection
    }

    /// Appends `item` unless an element with the same key is present.
    ///
    /// Returns whether the item was inserted.
    pub fn insert_if_absent(&mut self, item: T) -> bool {
        if self.index.contains_key(item.key()) {
            return false;
        }
        self.index.insert(item.key().to_owned(), self.items.len());
        self.items.push(item);
        self.version += 1;
        true
    }

    /// Removes the element with `key`, if any.
    pub fn remove_by_key(&mut self, key: &str) -> Option<T> {
        let position = self.index.remove(key)?;
        let removed = self.items.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        self.version += 1;
        Some(removed)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let i = *self.index.get(key)?;
        self.version += 1;
        self.items.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Elements that are not voided, in insertion order.
    pub fn non_voided(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().filter(|item| !item.is_voided())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq> PartialEq for ChildCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Keyed> FromIterator<T> for ChildCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a ChildCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for ChildCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Serialize> Serialize for ChildCollection<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.items.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ChildCollection<T>
where
    T: Deserialize<'de> + Keyed,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::from_vec(items))
    }
}
