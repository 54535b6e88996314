//! Entity ids and storage
//!
//! Ids are minted centrally by the game state and never reused within a
//! game, so an id names the same entity in every snapshot taken from that
//! game. The store does no id bookkeeping of its own: cloning it for a
//! snapshot carries every id over unchanged (which is what cross-copy
//! reverse-mapping relies on), and iteration is in id order so walks over
//! entities are deterministic across runs and across copies.

use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable integer id for game entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id-ordered storage for game entities
///
/// Backed by a BTreeMap so `iter` visits entities in ascending id order;
/// anything derived from a full walk (outcome decisions, hashing, feature
/// slots) stays reproducible without sorting at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: BTreeMap<EntityId, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: BTreeMap::new(),
        }
    }

    /// Insert an entity under an id minted by the game state
    ///
    /// Re-inserting an existing id replaces the entity; the game state
    /// never mints the same id twice, so that only happens when a caller
    /// deliberately overwrites.
    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: EntityId) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Remove an entity; only tokens ceasing to exist ever take this path
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Entities in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.entities.iter()
    }

    /// Ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
