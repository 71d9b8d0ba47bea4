//! Flat keyed repository for entities without nested ownership.

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Configuration, EventType, Simulation};
use crate::types::EntityId;

/// An entity that knows its own cache key.
pub trait Keyed {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

impl Keyed for Configuration {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Keyed for Simulation {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Keyed for EventType {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Map from key to entity. Iteration order is unspecified.
#[derive(Debug, Clone)]
pub struct Repository<T: Keyed> {
    entries: HashMap<T::Key, T>,
}

impl<T: Keyed> Default for Repository<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Keyed + Clone> Repository<T> {
    /// Insert or replace the entity at its key, returning the previous one.
    pub fn put(&mut self, entity: T) -> Option<T> {
        self.entries.insert(entity.key(), entity)
    }

    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove the entity at `key`; a no-op when absent.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.entries.remove(key)
    }

    pub fn get_all(&self) -> Vec<T> {
        self.entries.values().cloned().collect()
    }

    /// Replace the whole content with `entities`.
    pub fn replace_all(&mut self, entities: impl IntoIterator<Item = T>) {
        self.entries = entities.into_iter().map(|e| (e.key(), e)).collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
