//! Registry - the process-wide index of libraries.
//!
//! This module provides [`Registry`], the single store every consumer resolves
//! libraries from. Libraries are keyed by [`MetaId`] in a sorted map, so
//! iteration order is stable and independent of registration order.
//!
//! # Lookup Paths
//!
//! - **By id**: direct map hit ([`Registry::get`])
//! - **By name**: hash, then map hit ([`Registry::get_by_name`])
//! - **By exact type**: linear scan ([`Registry::by_type`]), the rare path
//! - **By implementor**: first non-abstract library whose type is, derives
//!   from or implements the requested type ([`Registry::find`]), optionally
//!   filtered ([`Registry::find_with`])
//!
//! # Lifecycle
//!
//! The registry is populated once at startup ([`Registry::init`] or
//! [`Registry::populate`]) and is read-heavy afterwards. Registering a second
//! library under an existing name replaces the first, clears its components
//! and logs a warning; [`Registry::try_add`] refuses instead.
//!
//! # Example
//!
//! ```
//! use ovum_core::{Library, MetaId};
//! use ovum_registry::Registry;
//!
//! struct Player;
//!
//! let registry = Registry::new();
//! registry.add(Library::builder::<Player>().name("player").build());
//!
//! assert!(registry.get(MetaId::from_name("player")).is_some());
//! assert!(registry.of::<Player>().is_some());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use ovum_core::markers::Order;
use ovum_core::{Instance, Library, MetaId, TypeHandle};
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::RegistryError;

/// Process-wide store of every [`Library`].
#[derive(Default)]
pub struct Registry {
    storage: RwLock<BTreeMap<MetaId, Arc<Library>>>,
    /// Successful adds over the registry's lifetime, replacements included.
    added: AtomicUsize,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated from every submitted registration.
    pub fn init() -> Arc<Self> {
        let started = Instant::now();
        let registry = Self::new();
        registry.populate();
        info!(
            libraries = registry.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "library registry ready"
        );
        Arc::new(registry)
    }

    /// Detach every component of every library and empty the store.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.storage.write());
        for library in drained.values() {
            library.clear_components();
        }
        info!(libraries = drained.len(), "library registry shut down");
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Add a library, replacing any library with the same id.
    ///
    /// A replaced library has its components cleared, so its bindings and
    /// dispatch markers stop firing. Returns the replaced library so callers
    /// can tell an override happened.
    pub fn add(&self, library: Arc<Library>) -> Option<Arc<Library>> {
        let previous = self.storage.write().insert(library.id(), library.clone());
        self.added.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = &previous {
            warn!(
                library = library.name(),
                id = %library.id(),
                replaced = previous.info().name(),
                "replacing library"
            );
            if !Arc::ptr_eq(previous, &library) {
                previous.clear_components();
            }
        }
        previous
    }

    /// Add a library only if its id is free.
    pub fn try_add(&self, library: Arc<Library>) -> Result<(), RegistryError> {
        let mut storage = self.storage.write();
        if storage.contains_key(&library.id()) {
            return Err(RegistryError::Duplicate {
                name: library.name().to_string(),
                id: library.id(),
            });
        }
        storage.insert(library.id(), library);
        self.added.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn remove(&self, id: MetaId) -> Option<Arc<Library>> {
        self.storage.write().remove(&id)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Library by id. A miss is logged.
    pub fn get(&self, id: MetaId) -> Option<Arc<Library>> {
        let found = self.storage.read().get(&id).cloned();
        if found.is_none() {
            error!(%id, "library not found");
        }
        found
    }

    /// Library by canonical name. A miss is logged.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<Library>> {
        let found = self.storage.read().get(&MetaId::from_name(name)).cloned();
        if found.is_none() {
            error!(library = name, "library not found");
        }
        found
    }

    pub fn contains(&self, id: MetaId) -> bool {
        self.storage.read().contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.contains(MetaId::from_name(name))
    }

    /// Library describing exactly `handle`.
    pub fn by_type(&self, handle: TypeHandle) -> Option<Arc<Library>> {
        self.storage
            .read()
            .values()
            .find(|library| library.info() == handle)
            .cloned()
    }

    /// Library describing exactly `T`.
    pub fn of<T: ?Sized + 'static>(&self) -> Option<Arc<Library>> {
        self.by_type(TypeHandle::of::<T>())
    }

    /// First non-abstract library whose type is, derives from, or implements
    /// `handle`.
    pub fn find(&self, handle: TypeHandle) -> Option<Arc<Library>> {
        self.find_with(handle, |_| true)
    }

    /// Like [`Registry::find`], also requiring `predicate`.
    pub fn find_with(
        &self,
        handle: TypeHandle,
        predicate: impl Fn(&Library) -> bool,
    ) -> Option<Arc<Library>> {
        self.storage
            .read()
            .values()
            .find(|library| {
                !library.is_abstract() && library.implements(handle) && predicate(library)
            })
            .cloned()
    }

    /// [`Registry::find`] for the type `T`.
    pub fn find_of<T: ?Sized + 'static>(&self) -> Option<Arc<Library>> {
        self.find(TypeHandle::of::<T>())
    }

    /// Every library that derives from or implements `handle`, excluding the
    /// library describing `handle` itself.
    pub fn all(&self, handle: TypeHandle) -> Vec<Arc<Library>> {
        self.storage
            .read()
            .values()
            .filter(|library| library.info() != handle && library.implements(handle))
            .cloned()
            .collect()
    }

    /// [`Registry::all`], stably sorted by each library's [`Order`] component.
    /// Libraries without one sort as `Order(0)`.
    pub fn all_ordered(&self, handle: TypeHandle) -> Vec<Arc<Library>> {
        let mut libraries = self.all(handle);
        libraries.sort_by_key(|library| {
            library
                .components()
                .get::<Order>()
                .map(|order| *order)
                .unwrap_or_default()
        });
        libraries
    }

    /// Snapshot of every library in id order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Library>> + use<> {
        self.storage
            .read()
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub(crate) fn added(&self) -> usize {
        self.added.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    // ==========================================================================
    // Instances
    // ==========================================================================

    /// The library describing the concrete type of `instance`.
    pub fn library_of(&self, instance: &Instance) -> Option<Arc<Library>> {
        let found = self.by_type(instance.type_handle());
        if found.is_none() {
            error!(instance = instance.type_name(), "no library describes instance");
        }
        found
    }

    /// Create an instance of the library named `name`.
    pub fn create(&self, name: &str) -> Option<Instance> {
        self.get_by_name(name)?.create()
    }

    /// Register a live instance with its library's bindings.
    ///
    /// Returns false if no library describes it or a binding vetoed.
    pub fn register(&self, instance: &Instance) -> bool {
        self.library_of(instance)
            .is_some_and(|library| library.register(instance))
    }

    pub fn unregister(&self, instance: &Instance) {
        if let Some(library) = self.library_of(instance) {
            library.unregister(instance);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.storage
                    .read()
                    .iter()
                    .map(|(id, library)| (*id, library.name().to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovum_core::markers::Singleton;
    use ovum_core::{Component, Property};

    trait Weapon {}

    #[derive(Default)]
    struct Sword;

    #[derive(Default)]
    struct Bow;

    struct Melee;

    impl Component<Library> for Melee {}

    fn weapon() -> Arc<Library> {
        Library::builder::<dyn Weapon>().name("weapon").as_abstract().build()
    }

    fn armory() -> Registry {
        let registry = Registry::new();
        let weapon = weapon();
        registry.add(weapon.clone());
        registry.add(
            Library::builder::<Bow>()
                .name("bow")
                .parent(&weapon)
                .default_constructor()
                .component(Order(2))
                .build(),
        );
        registry.add(
            Library::builder::<Sword>()
                .name("sword")
                .implements::<dyn Weapon>()
                .default_constructor()
                .component(Melee)
                .component(Order(1))
                .build(),
        );
        registry
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn lookup_by_id_and_name() {
        let registry = armory();
        assert!(registry.get(MetaId::from_name("sword")).is_some());
        assert!(registry.get_by_name("bow").is_some());
        assert!(registry.get_by_name("axe").is_none());
        assert!(registry.contains_name("weapon"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_replaces_and_returns_previous() {
        let registry = Registry::new();
        let first = Library::builder::<Sword>().name("sword").build();
        let second = Library::builder::<Sword>().name("sword").build();

        assert!(registry.add(first.clone()).is_none());
        let replaced = registry.add(second.clone());

        assert!(replaced.is_some_and(|r| Arc::ptr_eq(&r, &first)));
        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_name("sword").is_some_and(|l| Arc::ptr_eq(&l, &second)));
    }

    #[test]
    fn replaced_library_is_detached() {
        let registry = Registry::new();
        let first = Library::builder::<Sword>().name("sword").component(Melee).build();
        let second = Library::builder::<Sword>().name("sword").component(Melee).build();

        registry.add(first.clone());
        registry.add(first.clone());
        assert!(first.components().has::<Melee>());

        registry.add(second.clone());
        assert!(first.components().is_empty());
        assert!(second.components().has::<Melee>());
    }

    #[test]
    fn try_add_refuses_duplicates() {
        let registry = Registry::new();
        registry.try_add(Library::builder::<Sword>().name("sword").build()).unwrap();
        let err = registry
            .try_add(Library::builder::<Sword>().name("sword").build())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { ref name, .. } if name == "sword"));
    }

    #[test]
    fn lookup_by_exact_type() {
        let registry = armory();
        assert!(registry.of::<Sword>().is_some_and(|l| l.name() == "sword"));
        assert!(registry.of::<dyn Weapon>().is_some_and(|l| l.is_abstract()));
        assert!(registry.of::<String>().is_none());
    }

    #[test]
    fn find_skips_abstract_libraries() {
        let registry = armory();
        let found = registry.find_of::<dyn Weapon>();
        assert!(found.is_some_and(|l| !l.is_abstract()));
    }

    #[test]
    fn find_with_predicate() {
        let registry = armory();
        let melee = registry.find_with(TypeHandle::of::<dyn Weapon>(), |l| {
            l.components().has::<Melee>()
        });
        assert!(melee.is_some_and(|l| l.name() == "sword"));

        let none = registry.find_with(TypeHandle::of::<dyn Weapon>(), |l| l.name() == "axe");
        assert!(none.is_none());
    }

    #[test]
    fn all_lists_implementors_in_order() {
        let registry = armory();
        let all = registry.all(TypeHandle::of::<dyn Weapon>());
        assert_eq!(all.len(), 2);

        let ordered: Vec<String> = registry
            .all_ordered(TypeHandle::of::<dyn Weapon>())
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        assert_eq!(ordered, vec!["sword", "bow"]);
    }

    #[test]
    fn iteration_is_id_ordered() {
        let registry = armory();
        let ids: Vec<MetaId> = registry.iter().map(|l| l.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn create_and_register_instances() {
        let registry = Registry::new();
        registry.add(
            Library::builder::<Sword>()
                .name("sword")
                .default_constructor()
                .component(Singleton::new())
                .build(),
        );

        let sword = registry.create("sword").unwrap();
        assert!(registry.register(&sword));
        assert!(!registry.register(&Instance::new(Sword)));
        assert!(registry.create("sword").is_some_and(|s| s.ptr_eq(&sword)));

        registry.unregister(&sword);
        assert!(registry.create("sword").is_some_and(|s| !s.ptr_eq(&sword)));
    }

    #[test]
    fn register_unknown_instance_fails() {
        let registry = armory();
        assert!(!registry.register(&Instance::new(String::new())));
        assert!(registry.library_of(&Instance::new(Bow)).is_some());
    }

    #[test]
    fn remove_and_shutdown() {
        let registry = armory();
        let singleton = Library::builder::<String>()
            .name("text")
            .property(Property::builder("len").stored(0i64))
            .component(Singleton::new())
            .build();
        registry.add(singleton.clone());

        assert!(registry.remove(MetaId::from_name("bow")).is_some());
        assert_eq!(registry.len(), 3);

        registry.shutdown();
        assert!(registry.is_empty());
        assert!(singleton.components().is_empty());
    }
}
