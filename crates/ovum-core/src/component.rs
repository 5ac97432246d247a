//! Component databases: ordered extension objects attached to one owner.
//!
//! A [`Components<T>`] holds the extension objects of a single owner, which may
//! be a [`Library`](crate::Library), a member descriptor, or any runtime object
//! that wants composition. The owner is referenced weakly; it builds its
//! database with [`Arc::new_cyclic`] so hooks can receive the owning `Arc`.
//!
//! # Lifecycle
//!
//! - [`Components::add`] asks [`Component::can_attach`], appends the item, then
//!   calls [`Component::on_attached`].
//! - A component whose [`Component::is_singleton`] returns true replaces an
//!   existing component of the same concrete type. The old one is detached
//!   before the new one is attached.
//! - [`Components::remove`] and [`Components::clear`] call
//!   [`Component::on_detached`] after taking the item out.
//!
//! Hooks always run with the database unlocked, so a hook may freely add or
//! remove components on any owner, including its own.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ovum_core::{Component, Components};
//!
//! struct Player {
//!     components: Components<Player>,
//! }
//!
//! struct Health(i32);
//! impl Component<Player> for Health {}
//!
//! let player = Arc::new_cyclic(|weak| Player { components: Components::new(weak.clone()) });
//! player.components.add(Health(10));
//! assert_eq!(player.components.get::<Health>().map(|h| h.0), Some(10));
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::{Binding, TypeHandle};

/// An extension object attachable to an owner of type `T`.
///
/// Every hook has a no-op default so plain data records only need an empty
/// `impl`.
pub trait Component<T>: Send + Sync + 'static {
    /// Called before attaching. Returning false silently refuses the attach.
    fn can_attach(&self, _owner: &Arc<T>) -> bool {
        true
    }

    fn on_attached(&self, _owner: &Arc<T>) {}

    fn on_detached(&self, _owner: &Arc<T>) {}

    /// Singleton-kind components coalesce: adding a second one of the same
    /// concrete type replaces the first.
    fn is_singleton(&self) -> bool {
        false
    }

    /// The binding capability of this component, if it has one.
    ///
    /// Only consulted when the owner is a [`Library`](crate::Library).
    fn as_binding(&self) -> Option<&dyn Binding> {
        None
    }
}

/// Deferred attach of a component, applied once the owner `Arc` is live.
pub(crate) type Marker<T> = Box<dyn FnOnce(&Components<T>) + Send>;

pub(crate) fn marker<T: 'static, C: Component<T>>(component: C) -> Marker<T> {
    Box::new(move |components: &Components<T>| {
        components.add(component);
    })
}

struct Slot<T: 'static> {
    ty: TypeHandle,
    any: Arc<dyn Any + Send + Sync>,
    component: Arc<dyn Component<T>>,
}

impl<T: 'static> Slot<T> {
    fn new<C: Component<T>>(item: &Arc<C>) -> Self {
        Self {
            ty: TypeHandle::of::<C>(),
            any: item.clone(),
            component: item.clone(),
        }
    }

    fn holds(&self, ptr: *const ()) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.any), ptr)
    }
}

impl<T: 'static> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            ty: self.ty,
            any: self.any.clone(),
            component: self.component.clone(),
        }
    }
}

/// Ordered store of the components attached to one owner.
pub struct Components<T: 'static> {
    owner: Weak<T>,
    storage: RwLock<Vec<Slot<T>>>,
}

impl<T: 'static> Components<T> {
    pub fn new(owner: Weak<T>) -> Self {
        Self {
            owner,
            storage: RwLock::new(Vec::new()),
        }
    }

    // ==========================================================================
    // Attach / detach
    // ==========================================================================

    /// Attach `item` and return a shared handle to it.
    ///
    /// Returns `None` when the component refuses to attach or the owner is gone.
    pub fn add<C: Component<T>>(&self, item: C) -> Option<Arc<C>> {
        let Some(owner) = self.owner.upgrade() else {
            error!(
                owner = type_name::<T>(),
                component = type_name::<C>(),
                "cannot attach component: owner has been dropped"
            );
            return None;
        };

        let item = Arc::new(item);
        if !item.can_attach(&owner) {
            debug!(
                owner = type_name::<T>(),
                component = type_name::<C>(),
                "component refused to attach"
            );
            return None;
        }

        let slot = Slot::new(&item);
        if item.is_singleton() {
            let previous = {
                let mut storage = self.storage.write();
                storage
                    .iter()
                    .position(|s| s.ty == slot.ty)
                    .map(|index| storage.remove(index))
            };
            if let Some(previous) = previous {
                warn!(
                    owner = type_name::<T>(),
                    component = slot.ty.name(),
                    "replacing singleton component"
                );
                previous.component.on_detached(&owner);
            }
        }

        let component = slot.component.clone();
        self.storage.write().push(slot);
        component.on_attached(&owner);
        Some(item)
    }

    /// Detach and remove one specific component.
    pub fn remove<C: Component<T>>(&self, item: &Arc<C>) -> bool {
        let ptr = Arc::as_ptr(item).cast::<()>();
        let removed = {
            let mut storage = self.storage.write();
            storage
                .iter()
                .position(|s| s.holds(ptr))
                .map(|index| storage.remove(index))
        };
        match removed {
            Some(slot) => {
                self.detach(&slot);
                true
            }
            None => false,
        }
    }

    /// Detach and remove the first component of type `C`.
    pub fn remove_type<C: Component<T>>(&self) -> Option<Arc<C>> {
        let ty = TypeHandle::of::<C>();
        let removed = {
            let mut storage = self.storage.write();
            storage
                .iter()
                .position(|s| s.ty == ty)
                .map(|index| storage.remove(index))
        }?;
        self.detach(&removed);
        removed.any.downcast::<C>().ok()
    }

    /// Detach every component in insertion order, then leave the store empty.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.storage.write());
        for slot in &drained {
            self.detach(slot);
        }
    }

    fn detach(&self, slot: &Slot<T>) {
        match self.owner.upgrade() {
            Some(owner) => slot.component.on_detached(&owner),
            None => debug!(
                owner = type_name::<T>(),
                component = slot.ty.name(),
                "owner dropped, skipping on_detached"
            ),
        }
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// First component of concrete type `C`.
    pub fn get<C: Component<T>>(&self) -> Option<Arc<C>> {
        let ty = TypeHandle::of::<C>();
        let any = self
            .storage
            .read()
            .iter()
            .find(|s| s.ty == ty)
            .map(|s| s.any.clone())?;
        any.downcast::<C>().ok()
    }

    /// Every component of concrete type `C`, in insertion order.
    pub fn get_all<C: Component<T>>(&self) -> Vec<Arc<C>> {
        let ty = TypeHandle::of::<C>();
        let matching: Vec<_> = self
            .storage
            .read()
            .iter()
            .filter(|s| s.ty == ty)
            .map(|s| s.any.clone())
            .collect();
        matching
            .into_iter()
            .filter_map(|any| any.downcast::<C>().ok())
            .collect()
    }

    /// First component whose concrete type is `handle`.
    pub fn get_by_type(&self, handle: TypeHandle) -> Option<Arc<dyn Component<T>>> {
        self.storage
            .read()
            .iter()
            .find(|s| s.ty == handle)
            .map(|s| s.component.clone())
    }

    /// First component matching `predicate`, in insertion order.
    pub fn find(
        &self,
        predicate: impl Fn(&dyn Component<T>) -> bool,
    ) -> Option<Arc<dyn Component<T>>> {
        self.storage
            .read()
            .iter()
            .find(|s| predicate(s.component.as_ref()))
            .map(|s| s.component.clone())
    }

    pub fn has<C: Component<T>>(&self) -> bool {
        self.has_type(TypeHandle::of::<C>())
    }

    pub fn has_type(&self, handle: TypeHandle) -> bool {
        self.storage.read().iter().any(|s| s.ty == handle)
    }

    /// Snapshot of all components in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<dyn Component<T>>> + use<T> {
        self.snapshot().into_iter()
    }

    /// Snapshot of the components that carry the binding capability.
    pub fn bindings(&self) -> Vec<Arc<dyn Component<T>>> {
        self.snapshot()
            .into_iter()
            .filter(|c| c.as_binding().is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Component<T>>> {
        self.storage
            .read()
            .iter()
            .map(|s| s.component.clone())
            .collect()
    }
}

impl<T: 'static> fmt::Debug for Components<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.storage.read().iter().map(|s| s.ty.name()))
            .finish()
    }
}
