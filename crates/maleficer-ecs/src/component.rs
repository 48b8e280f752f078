//! Component type registration and metadata.
//!
//! Any `'static + Debug` type can be attached to an entity. The first time a
//! type is seen it is given a [`ComponentTypeId`] by the
//! [`ComponentRegistry`]; that id keys the per-type storage and is what
//! query filters intersect over.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Marker trait for values that can live in a [`World`](crate::world::World).
pub trait Component: Any + fmt::Debug {}

impl<T: Any + fmt::Debug> Component for T {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub id: ComponentTypeId,
    /// Human-readable name, used in tracing output.
    pub name: String,
    pub type_id: TypeId,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types to [`ComponentTypeId`]s.
///
/// A type is registered at most once; later registrations return the
/// existing id and ignore the new name.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`, or return its existing id.
    pub fn register<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return existing;
        }
        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: rust_type_id,
        });
        self.by_type.insert(rust_type_id, id);
        tracing::trace!(component = name, id = id.0, "registered component type");
        id
    }

    /// Register `T` under its short type name (`Position` rather than
    /// `maleficer_engine::components::Position`).
    pub fn register_auto<T: Component>(&mut self) -> ComponentTypeId {
        if let Some(existing) = self.lookup::<T>() {
            return existing;
        }
        self.register::<T>(short_type_name::<T>())
    }

    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Registered name for `id`, or `"?"` when unknown.
    pub fn name_of(&self, id: ComponentTypeId) -> &str {
        self.get_info(id).map(|info| info.name.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// Last path segment of `std::any::type_name::<T>()`, generics included.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pos {
        _x: i32,
    }

    #[derive(Debug)]
    struct Vel;

    #[test]
    fn register_and_lookup() {
        let mut reg = ComponentRegistry::new();
        let id = reg.register::<Pos>("position");
        assert_eq!(reg.lookup::<Pos>(), Some(id));
        assert_eq!(reg.name_of(id), "position");
    }

    #[test]
    fn same_type_same_id() {
        let mut reg = ComponentRegistry::new();
        let first = reg.register::<Pos>("position");
        let second = reg.register::<Pos>("position_again");
        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn auto_registration_uses_short_name() {
        let mut reg = ComponentRegistry::new();
        let id = reg.register_auto::<Vel>();
        assert_eq!(reg.name_of(id), "Vel");
        assert_ne!(reg.register_auto::<Pos>(), id);
    }

    #[test]
    fn short_name_keeps_generics() {
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec<u8>");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
