//! Bulk population from link-time registration tables.
//!
//! Libraries reach the registry through two tables collected with
//! [`inventory`]:
//!
//! - [`UnitRegistration`]: one bulk routine per compilation unit that adds all
//!   of that unit's libraries in a single call. This is the fast path, and
//!   the form a build-step generator emits.
//! - [`LibraryRegistration`]: one entry per library, used for units without a
//!   bulk routine. Entries declare their parent by name so the registry can
//!   build parents first.
//!
//! ```ignore
//! fn player() -> Arc<Library> {
//!     Library::builder::<Player>().default_constructor().build()
//! }
//!
//! ovum_registry::library!(player);
//! ```

use std::sync::Arc;

use ovum_core::Library;
use rustc_hash::FxHashSet;
use tracing::{debug, error};

use crate::Registry;

/// Bulk registration routine for one compilation unit.
pub struct UnitRegistration {
    pub unit: &'static str,
    pub cache: fn(&Registry),
}

impl UnitRegistration {
    pub const fn new(unit: &'static str, cache: fn(&Registry)) -> Self {
        Self { unit, cache }
    }
}

/// Per-library registration entry.
pub struct LibraryRegistration {
    pub unit: &'static str,
    /// Canonical name of the parent library, which must be registered first.
    pub parent: Option<&'static str>,
    /// Builds the library. Receives the registry to resolve its parent.
    pub build: fn(&Registry) -> Arc<Library>,
}

impl LibraryRegistration {
    pub const fn new(unit: &'static str, build: fn(&Registry) -> Arc<Library>) -> Self {
        Self {
            unit,
            parent: None,
            build,
        }
    }

    pub const fn with_parent(mut self, parent: &'static str) -> Self {
        self.parent = Some(parent);
        self
    }
}

inventory::collect!(UnitRegistration);
inventory::collect!(LibraryRegistration);

/// Submit a per-library registration entry.
///
/// `build` is a `fn(&Registry) -> Arc<Library>`. The unit defaults to the
/// calling crate's package name.
#[macro_export]
macro_rules! library {
    (unit = $unit:expr, $build:path $(, parent = $parent:literal)?) => {
        $crate::inventory::submit! {
            $crate::LibraryRegistration::new($unit, $build) $(.with_parent($parent))?
        }
    };
    ($build:path $(, parent = $parent:literal)?) => {
        $crate::library!(unit = env!("CARGO_PKG_NAME"), $build $(, parent = $parent)?);
    };
}

/// Submit a bulk registration routine for a unit.
///
/// `cache` is a `fn(&Registry)`. The unit defaults to the calling crate's
/// package name; per-library entries of that unit are then skipped.
#[macro_export]
macro_rules! bulk_cache {
    (unit = $unit:expr, $cache:path) => {
        $crate::inventory::submit! {
            $crate::UnitRegistration::new($unit, $cache)
        }
    };
    ($cache:path) => {
        $crate::bulk_cache!(unit = env!("CARGO_PKG_NAME"), $cache);
    };
}

impl Registry {
    /// Run every bulk routine, then build the per-library entries of units
    /// without one.
    ///
    /// Returns the number of libraries added, counting each one that replaced
    /// an existing library of the same name.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn populate(&self) -> usize {
        let before = self.added();
        let mut cached: FxHashSet<&'static str> = FxHashSet::default();
        for unit in inventory::iter::<UnitRegistration> {
            debug!(unit = unit.unit, "populating from bulk cache");
            (unit.cache)(self);
            cached.insert(unit.unit);
        }

        let pending: Vec<&'static LibraryRegistration> = inventory::iter::<LibraryRegistration>
            .into_iter()
            .filter(|entry| !cached.contains(entry.unit))
            .collect();
        self.build_entries(pending);

        self.added() - before
    }

    /// Build entries so that every parent is registered before its children.
    fn build_entries(&self, mut pending: Vec<&'static LibraryRegistration>) {
        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|entry| entry.parent.is_none_or(|parent| self.contains_name(parent)));

            if ready.is_empty() {
                for entry in blocked {
                    error!(
                        unit = entry.unit,
                        parent = entry.parent,
                        "parent library never registered, skipping"
                    );
                }
                return;
            }

            for entry in ready {
                self.add((entry.build)(self));
            }
            pending = blocked;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Creature;
    struct Wolf;
    struct Ghost;
    struct Cached;
    struct Skipped;

    fn creature(_: &Registry) -> Arc<Library> {
        Library::builder::<Creature>().name("population.creature").build()
    }

    fn wolf(registry: &Registry) -> Arc<Library> {
        let mut builder = Library::builder::<Wolf>().name("population.wolf");
        if let Some(parent) = registry.get_by_name("population.creature") {
            builder = builder.parent(&parent);
        }
        builder.build()
    }

    fn ghost(_: &Registry) -> Arc<Library> {
        Library::builder::<Ghost>().name("population.ghost").build()
    }

    fn cached_unit(registry: &Registry) {
        registry.add(Library::builder::<Cached>().name("population.cached").build());
    }

    fn skipped(_: &Registry) -> Arc<Library> {
        Library::builder::<Skipped>().name("population.skipped").build()
    }

    // Child submitted before its parent.
    crate::library!(unit = "population-tests", wolf, parent = "population.creature");
    crate::library!(unit = "population-tests", creature);
    crate::library!(unit = "population-tests", ghost, parent = "population.missing");
    crate::bulk_cache!(unit = "population-cached", cached_unit);
    crate::library!(unit = "population-cached", skipped);

    #[test]
    fn populate_orders_parents_first() {
        let registry = Registry::new();
        registry.populate();

        let wolf = registry.get_by_name("population.wolf");
        assert!(wolf.is_some_and(|w| w.parent().is_some_and(|p| p.name() == "population.creature")));
    }

    #[test]
    fn populate_skips_orphans() {
        let registry = Registry::new();
        registry.populate();
        assert!(!registry.contains_name("population.ghost"));
    }

    #[test]
    fn bulk_cache_replaces_per_library_entries() {
        let registry = Registry::new();
        let added = registry.populate();

        assert!(registry.contains_name("population.cached"));
        assert!(!registry.contains_name("population.skipped"));
        assert_eq!(added, registry.len());
    }

    #[test]
    fn populate_counts_replacements() {
        let registry = Registry::new();
        registry.add(creature(&registry));
        let before = registry.len();

        let added = registry.populate();

        // Every populated library is new except the creature it rebuilt.
        assert_eq!(added, registry.len() - before + 1);
        assert!(registry.contains_name("population.creature"));
    }

    #[test]
    fn init_returns_populated_registry() {
        let registry = Registry::init();
        assert!(registry.contains_name("population.creature"));
    }
}
