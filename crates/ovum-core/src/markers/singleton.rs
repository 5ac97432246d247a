use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use crate::{Binding, Component, Instance, Library};

/// Admits a single live instance per library.
///
/// The first instance registered is kept and returned by every subsequent
/// [`Library::create`]. Registering a second instance while the first is
/// live is vetoed.
#[derive(Default)]
pub struct Singleton {
    instance: RwLock<Option<Instance>>,
}

impl Singleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered instance, if any.
    pub fn instance(&self) -> Option<Instance> {
        self.instance.read().clone()
    }
}

impl Component<Library> for Singleton {
    fn is_singleton(&self) -> bool {
        true
    }

    fn on_detached(&self, _owner: &Arc<Library>) {
        self.instance.write().take();
    }

    fn as_binding(&self) -> Option<&dyn Binding> {
        Some(self)
    }
}

impl Binding for Singleton {
    fn on_register(&self, library: &Library, instance: &Instance) -> bool {
        let mut slot = self.instance.write();
        match slot.as_ref() {
            Some(current) if current.ptr_eq(instance) => true,
            Some(_) => {
                error!(
                    library = library.name(),
                    "a singleton instance is already registered"
                );
                false
            }
            None => {
                *slot = Some(instance.clone());
                true
            }
        }
    }

    fn on_unregister(&self, _library: &Library, instance: &Instance) {
        let mut slot = self.instance.write();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(instance)) {
            *slot = None;
        }
    }

    fn on_create(&self, _library: &Library) -> Option<Instance> {
        self.instance()
    }
}
