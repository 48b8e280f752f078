//! Per-type component storage.
//!
//! Each registered component type owns one [`Storage<T>`]: an ordered map
//! from [`EntityId`] to the component value. The world keeps them behind the
//! object-safe [`ErasedStorage`] trait so it can remove an entity from every
//! storage on despawn and answer membership questions without knowing the
//! concrete type.

use std::any::Any;
use std::collections::BTreeMap;

use crate::component::Component;
use crate::entity::EntityId;

/// Type-erased view of a [`Storage<T>`].
pub trait ErasedStorage: Any {
    fn contains(&self, entity: EntityId) -> bool;
    /// Drop the component held for `entity`, if any.
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn len(&self) -> usize;
    fn entities(&self) -> Box<dyn Iterator<Item = EntityId> + '_>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete storage for one component type.
#[derive(Debug)]
pub struct Storage<T> {
    values: BTreeMap<EntityId, T>,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T: Component> Storage<T> {
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.values.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.values.get_mut(&entity)
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.values.insert(entity, value)
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.values.remove(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.values.iter().map(|(e, v)| (*e, v))
    }
}

impl<T: Component> ErasedStorage for Storage<T> {
    fn contains(&self, entity: EntityId) -> bool {
        self.values.contains_key(&entity)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.values.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn entities(&self) -> Box<dyn Iterator<Item = EntityId> + '_> {
        Box::new(self.values.keys().copied())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
