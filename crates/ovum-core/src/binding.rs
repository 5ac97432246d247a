//! The binding capability: hooks into a library's create/register lifecycle.

use crate::{Instance, Library};

/// Intercepts [`Library::create`], [`Library::register`] and
/// [`Library::unregister`].
///
/// A component exposes this capability through
/// [`Component::as_binding`](crate::Component::as_binding). Bindings are
/// consulted in the order their components were attached.
pub trait Binding: Send + Sync {
    /// Accept or veto a live instance. Returning false aborts registration.
    fn on_register(&self, _library: &Library, _instance: &Instance) -> bool {
        true
    }

    fn on_unregister(&self, _library: &Library, _instance: &Instance) {}

    /// Factory override. The first binding returning `Some` wins.
    fn on_create(&self, _library: &Library) -> Option<Instance> {
        None
    }
}
