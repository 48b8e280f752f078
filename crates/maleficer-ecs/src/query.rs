//! Query engine: set-intersection filters with a lazy component join.
//!
//! A query names a tuple of component references, e.g.
//! `(&Position, &Health)`. [`World::filter`] computes the set of entities
//! carrying *all* of them, [`Filter::exclude`] subtracts entities carrying a
//! given type, and iterating the filter looks each requested component up
//! per entity, yielding `(EntityId, (&A, &B, ..))`.
//!
//! ```
//! use maleficer_ecs::prelude::*;
//!
//! #[derive(Debug)] struct Pos(i32, i32);
//! #[derive(Debug)] struct Hp(i32);
//! #[derive(Debug)] struct Flying;
//!
//! let mut world = World::new();
//! let walker = world.spawn_bundle(ComponentBundle::new().with(Pos(0, 0)).with(Hp(3)));
//! world.spawn_bundle(ComponentBundle::new().with(Pos(1, 0)).with(Hp(2)).with(Flying));
//! world.spawn_with(Pos(2, 0));
//!
//! let grounded: Vec<_> = world
//!     .filter::<(&Pos, &Hp)>()
//!     .exclude::<Flying>()
//!     .into_iter()
//!     .map(|(entity, _)| entity)
//!     .collect();
//! assert_eq!(grounded, vec![walker]);
//! ```

use std::collections::{btree_set, BTreeSet};
use std::marker::PhantomData;

use crate::component::{Component, ComponentTypeId};
use crate::entity::EntityId;
use crate::world::World;
use crate::EcsError;

// ---------------------------------------------------------------------------
// QueryItem -- one element of a query tuple
// ---------------------------------------------------------------------------

/// A single element of a query: `&T`.
pub trait QueryItem {
    type Item<'w>;
    /// `None` when the type has never been stored, which means no entity
    /// can match.
    fn component_type_id(world: &World) -> Option<ComponentTypeId>;
    fn fetch(world: &World, entity: EntityId) -> Option<Self::Item<'_>>;
}

impl<T: Component> QueryItem for &T {
    type Item<'w> = &'w T;

    fn component_type_id(world: &World) -> Option<ComponentTypeId> {
        world.registry().lookup::<T>()
    }

    fn fetch(world: &World, entity: EntityId) -> Option<Self::Item<'_>> {
        world.get_component::<T>(entity)
    }
}

// ---------------------------------------------------------------------------
// Query -- a tuple of QueryItems
// ---------------------------------------------------------------------------

/// A tuple of query items: `(&A,)`, `(&A, &B)`, up to four elements.
pub trait Query {
    type Item<'w>;
    fn type_ids(world: &World) -> Option<Vec<ComponentTypeId>>;
    fn fetch_row(world: &World, entity: EntityId) -> Option<Self::Item<'_>>;
}

macro_rules! impl_query_tuple {
    ($($item:ident),+) => {
        impl<$($item: QueryItem),+> Query for ($($item,)+) {
            type Item<'w> = ($($item::Item<'w>,)+);

            fn type_ids(world: &World) -> Option<Vec<ComponentTypeId>> {
                Some(vec![$($item::component_type_id(world)?),+])
            }

            fn fetch_row(world: &World, entity: EntityId) -> Option<Self::Item<'_>> {
                Some(($($item::fetch(world, entity)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// The materialised entity set of a query, ready to be narrowed or joined.
///
/// Filters are pure reads: they borrow the world immutably and never
/// mutate it.
pub struct Filter<'w, Q: Query> {
    world: &'w World,
    entities: BTreeSet<EntityId>,
    _marker: PhantomData<Q>,
}

impl<'w, Q: Query> Filter<'w, Q> {
    /// Remove every entity that carries `T`.
    pub fn exclude<T: Component>(mut self) -> Self {
        if let Some(storage) = self
            .world
            .registry()
            .lookup::<T>()
            .and_then(|id| self.world.erased(id))
        {
            self.entities.retain(|e| !storage.contains(*e));
        }
        self
    }

    pub fn entities(&self) -> &BTreeSet<EntityId> {
        &self.entities
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// An arbitrary (engine-ordered) matching entity.
    ///
    /// Only meaningful when the caller knows a match is structurally
    /// guaranteed, e.g. "the player".
    pub fn first(&self) -> Result<EntityId, EcsError> {
        self.entities
            .iter()
            .next()
            .copied()
            .ok_or_else(|| EcsError::NotFound {
                query: std::any::type_name::<Q>(),
            })
    }

    /// The one and only match, with its components.
    pub fn single(self) -> Result<(EntityId, Q::Item<'w>), EcsError> {
        let query = std::any::type_name::<Q>();
        match self.entities.len() {
            0 => Err(EcsError::NotFound { query }),
            1 => {
                let entity = self.first()?;
                let row = Q::fetch_row(self.world, entity).ok_or(EcsError::NotFound { query })?;
                Ok((entity, row))
            }
            count => Err(EcsError::NotSingleton { query, count }),
        }
    }

    /// Components of `entity`, if it is part of this filter.
    pub fn get(&self, entity: EntityId) -> Option<Q::Item<'w>> {
        if !self.entities.contains(&entity) {
            return None;
        }
        Q::fetch_row(self.world, entity)
    }
}

impl<'w, Q: Query> IntoIterator for Filter<'w, Q> {
    type Item = (EntityId, Q::Item<'w>);
    type IntoIter = FilterIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        FilterIter {
            world: self.world,
            inner: self.entities.into_iter(),
            _marker: PhantomData,
        }
    }
}

/// Lazy join over a [`Filter`]'s entity set.
pub struct FilterIter<'w, Q: Query> {
    world: &'w World,
    inner: btree_set::IntoIter<EntityId>,
    _marker: PhantomData<Q>,
}

impl<'w, Q: Query> Iterator for FilterIter<'w, Q> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        for entity in self.inner.by_ref() {
            if let Some(row) = Q::fetch_row(self.world, entity) {
                return Some((entity, row));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

// ---------------------------------------------------------------------------
// World query methods
// ---------------------------------------------------------------------------

impl World {
    /// Entities carrying every component named by `Q`.
    pub fn filter<Q: Query>(&self) -> Filter<'_, Q> {
        let entities = match Q::type_ids(self) {
            Some(ids) => self.intersect(&ids),
            None => BTreeSet::new(),
        };
        Filter {
            world: self,
            entities,
            _marker: PhantomData,
        }
    }

    /// Iterate `(EntityId, components)` for every match of `Q`.
    ///
    /// ```ignore
    /// for (entity, (pos, hp)) in world.query::<(&Position, &Health)>() {
    ///     println!("{entity}: {pos:?} {hp:?}");
    /// }
    /// ```
    pub fn query<Q: Query>(&self) -> FilterIter<'_, Q> {
        self.filter::<Q>().into_iter()
    }

    /// The only entity carrying `T`, with its value.
    pub fn unique<T: Component>(&self) -> Result<(EntityId, &T), EcsError> {
        self.filter::<(&T,)>().single().map(|(e, (value,))| (e, value))
    }
}
