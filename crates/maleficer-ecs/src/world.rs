//! The [`World`] is the top-level container for the ECS. It owns the entity
//! allocator, the component registry, and one storage per component type.

use std::collections::BTreeSet;

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityAllocator, EntityId};
use crate::storage::{ErasedStorage, Storage};
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentBundle
// ---------------------------------------------------------------------------

type Inserter = Box<dyn FnOnce(&mut World, EntityId)>;

/// A set of components attached together when an entity is spawned.
///
/// ```
/// use maleficer_ecs::prelude::*;
///
/// #[derive(Debug, PartialEq)]
/// struct Hp(i32);
/// #[derive(Debug)]
/// struct Blocking;
///
/// let mut world = World::new();
/// let e = world.spawn_bundle(ComponentBundle::new().with(Hp(3)).with(Blocking));
/// assert_eq!(world.get_component::<Hp>(e), Some(&Hp(3)));
/// assert!(world.has_component::<Blocking>(e));
/// ```
#[derive(Default)]
pub struct ComponentBundle {
    inserters: Vec<Inserter>,
}

impl ComponentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component. A later value of the same type overwrites an earlier one.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.add(value);
        self
    }

    pub fn add<T: Component>(&mut self, value: T) {
        self.inserters.push(Box::new(move |world, entity| {
            world.storage_mut_or_create::<T>().insert(entity, value);
        }));
    }

    pub fn len(&self) -> usize {
        self.inserters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserters.is_empty()
    }
}

impl std::fmt::Debug for ComponentBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBundle")
            .field("components", &self.inserters.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Entity/component store.
///
/// Storages are indexed by [`ComponentTypeId`]; a slot is `None` until the
/// first component of that type is inserted.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    storages: Vec<Option<Box<dyn ErasedStorage>>>,
    /// Entities scheduled for removal at the next [`flush_deferred`](Self::flush_deferred).
    pending_despawn: Vec<EntityId>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.allocator.alive_count())
            .field("component_types", &self.registry.len())
            .field("pending_despawn", &self.pending_despawn.len())
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register `T` under an explicit name. Optional: unregistered types are
    /// registered under their short type name on first insert.
    pub fn register_component<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let id = self.registry.register::<T>(name);
        self.ensure_slot::<T>(id);
        id
    }

    // -- spawn / despawn ----------------------------------------------------

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    pub fn spawn_with<T: Component>(&mut self, component: T) -> EntityId {
        self.spawn_bundle(ComponentBundle::new().with(component))
    }

    pub fn spawn_bundle(&mut self, bundle: ComponentBundle) -> EntityId {
        let entity = self.allocator.allocate();
        for insert in bundle.inserters {
            insert(self, entity);
        }
        entity
    }

    /// Remove an entity and all its components immediately.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if !self.allocator.deallocate(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        for storage in self.storages.iter_mut().flatten() {
            storage.remove_entity(entity);
        }
        Ok(())
    }

    /// Schedule `entity` for removal at the next [`flush_deferred`](Self::flush_deferred).
    ///
    /// The entity stays fully queryable until then.
    pub fn despawn_deferred(&mut self, entity: EntityId) {
        if self.is_alive(entity) && !self.pending_despawn.contains(&entity) {
            self.pending_despawn.push(entity);
        }
    }

    /// Remove every entity scheduled with [`despawn_deferred`](Self::despawn_deferred).
    ///
    /// Entities that died in the meantime are skipped. Returns how many were
    /// removed.
    pub fn flush_deferred(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_despawn);
        pending
            .into_iter()
            .filter(|entity| self.despawn(*entity).is_ok())
            .count()
    }

    pub fn pending_despawn_count(&self) -> usize {
        self.pending_despawn.len()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Every live entity in engine order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.allocator.iter_alive()
    }

    // -- component access ---------------------------------------------------

    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Attach `value` to `entity`, overwriting any existing `T`.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.storage_mut_or_create::<T>().insert(entity, value);
        Ok(())
    }

    /// Detach `T` from `entity`, returning it if it was present.
    pub fn remove_component<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Result<Option<T>, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        Ok(self.storage_mut::<T>().and_then(|s| s.remove(entity)))
    }

    // -- storage plumbing ---------------------------------------------------

    pub(crate) fn storage<T: Component>(&self) -> Option<&Storage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.erased(id)?.as_any().downcast_ref::<Storage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut Storage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages
            .get_mut(id.index())?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Storage<T>>()
    }

    fn storage_mut_or_create<T: Component>(&mut self) -> &mut Storage<T> {
        let id = self.registry.register_auto::<T>();
        self.ensure_slot::<T>(id);
        self.storages[id.index()]
            .as_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .expect("storage slot was just created for this component type")
    }

    fn ensure_slot<T: Component>(&mut self, id: ComponentTypeId) {
        if self.storages.len() <= id.index() {
            self.storages.resize_with(id.index() + 1, || None);
        }
        if self.storages[id.index()].is_none() {
            self.storages[id.index()] = Some(Box::new(Storage::<T>::default()));
        }
    }

    pub(crate) fn erased(&self, id: ComponentTypeId) -> Option<&dyn ErasedStorage> {
        self.storages.get(id.index())?.as_deref()
    }

    /// Entities holding every component in `required` (set intersection).
    ///
    /// Starts from the smallest storage so the intersection is bounded by
    /// the rarest component.
    pub(crate) fn intersect(&self, required: &[ComponentTypeId]) -> BTreeSet<EntityId> {
        let mut storages = Vec::with_capacity(required.len());
        for id in required {
            match self.erased(*id) {
                Some(storage) => storages.push(storage),
                None => return BTreeSet::new(),
            }
        }
        storages.sort_by_key(|s| s.len());
        let Some((smallest, rest)) = storages.split_first() else {
            return BTreeSet::new();
        };
        smallest
            .entities()
            .filter(|e| rest.iter().all(|s| s.contains(*e)))
            .collect()
    }
}
