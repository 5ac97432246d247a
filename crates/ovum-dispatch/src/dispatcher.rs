//! String-keyed fan-out to bound functions.
//!
//! The [`Dispatcher`] keeps two side tables:
//!
//! - `events`: event name → functions bound to it, in binding order
//! - `instances`: declaring library id → live instances registered with that
//!   library, in registration order
//!
//! [`Dispatcher::run`] invokes each bound static function once, and each bound
//! instance function once per live instance of its declaring library.
//! Failures are logged and never stop the remaining listeners.
//!
//! The dispatcher holds strong handles to registered instances until they are
//! unregistered, which the library's dispatch hook does from
//! [`Library::unregister`].

use std::sync::Arc;

use ovum_core::{Function, Instance, Library, Member, MetaId, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, error, trace, warn};

use crate::Dispatch;

/// Event table and live-instance buckets.
#[derive(Default)]
pub struct Dispatcher {
    events: RwLock<FxHashMap<String, Vec<Arc<Function>>>>,
    instances: RwLock<FxHashMap<MetaId, Vec<Instance>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Events
    // ==========================================================================

    /// Bind `function` to `event`. Binding the same function twice is a no-op.
    pub fn add(&self, event: impl Into<String>, function: Arc<Function>) {
        let event = event.into();
        let mut events = self.events.write();
        let bound = events.entry(event.clone()).or_default();
        if bound.iter().any(|f| Arc::ptr_eq(f, &function)) {
            debug!(event, function = function.name(), "function already bound");
            return;
        }
        debug!(event, function = function.name(), "function bound");
        bound.push(function);
    }

    /// Unbind `function` from `event`.
    pub fn remove(&self, event: &str, function: &Arc<Function>) -> bool {
        let mut events = self.events.write();
        let Some(bound) = events.get_mut(event) else {
            return false;
        };
        let before = bound.len();
        bound.retain(|f| !Arc::ptr_eq(f, function));
        let removed = bound.len() != before;
        if bound.is_empty() {
            events.remove(event);
        }
        removed
    }

    /// Number of functions bound to `event`.
    pub fn listeners(&self, event: &str) -> usize {
        self.events.read().get(event).map_or(0, Vec::len)
    }

    /// Bind every unbound [`Dispatch`] marker on the functions of `libraries`
    /// to this dispatcher. Returns the number of markers bound.
    pub fn bind(self: &Arc<Self>, libraries: impl IntoIterator<Item = Arc<Library>>) -> usize {
        let mut bound = 0;
        for library in libraries {
            for function in library.functions().iter() {
                for marker in function.components().get_all::<Dispatch>() {
                    if marker.bind(self, &function) {
                        bound += 1;
                    }
                }
            }
        }
        debug!(markers = bound, "dispatch markers bound");
        bound
    }

    // ==========================================================================
    // Instances
    // ==========================================================================

    /// Add `instance` to `library`'s bucket. Registering twice is a no-op.
    pub fn register(&self, library: &Library, instance: &Instance) {
        let mut instances = self.instances.write();
        let bucket = instances.entry(library.id()).or_default();
        if !bucket.iter().any(|i| i.ptr_eq(instance)) {
            bucket.push(instance.clone());
        }
    }

    pub fn unregister(&self, library: &Library, instance: &Instance) {
        let mut instances = self.instances.write();
        if let Some(bucket) = instances.get_mut(&library.id()) {
            bucket.retain(|i| !i.ptr_eq(instance));
            if bucket.is_empty() {
                instances.remove(&library.id());
            }
        }
    }

    /// Number of live instances registered for `library`.
    pub fn instances(&self, library: MetaId) -> usize {
        self.instances.read().get(&library).map_or(0, Vec::len)
    }

    /// Drop every binding and every registered instance.
    pub fn clear(&self) {
        self.events.write().clear();
        self.instances.write().clear();
    }

    // ==========================================================================
    // Dispatch
    // ==========================================================================

    pub fn run(&self, event: &str) {
        self.run_with(event, &[]);
    }

    /// Invoke every function bound to `event` with `args`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_with(&self, event: &str, args: &[Value]) {
        if event.is_empty() {
            return;
        }
        let Some(functions) = self.events.read().get(event).cloned() else {
            trace!(event, "no listeners");
            return;
        };

        for function in &functions {
            if function.is_static() {
                self.invoke(event, function, None, args);
                continue;
            }

            let Some(library) = function.base().owner_id() else {
                warn!(
                    event,
                    function = function.name(),
                    "declaring library is gone, skipping"
                );
                continue;
            };
            let targets = self
                .instances
                .read()
                .get(&library)
                .cloned()
                .unwrap_or_default();
            for target in &targets {
                self.invoke(event, function, Some(target), args);
            }
        }
    }

    fn invoke(&self, event: &str, function: &Function, target: Option<&Instance>, args: &[Value]) {
        if let Err(err) = function.invoke(target, args) {
            error!(
                event,
                function = function.name(),
                %err,
                "dispatch listener failed"
            );
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("events", &self.events.read().len())
            .field("buckets", &self.instances.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovum_core::{MemberError, arg};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[test]
    fn run_without_listeners_is_noop() {
        let dispatcher = Dispatcher::new();
        dispatcher.run("x");
        dispatcher.run("");
        assert_eq!(dispatcher.listeners("x"), 0);
    }

    #[test]
    fn static_function_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let function = Function::builder("on_x")
            .static_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let dispatcher = Dispatcher::new();
        dispatcher.add("x", function.clone());
        dispatcher.add("x", function);
        dispatcher.run("x");

        assert_eq!(dispatcher.listeners("x"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arguments_are_forwarded() {
        let total = Arc::new(AtomicI64::new(0));
        let sink = total.clone();
        let function = Function::builder("on_damage")
            .param::<i64>("amount")
            .static_fn(move |args| {
                sink.fetch_add(arg::<i64>(args, 0)?, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let dispatcher = Dispatcher::new();
        dispatcher.add("damage", function);
        dispatcher.run_with("damage", &[Value::Int(4)]);
        dispatcher.run_with("damage", &[Value::Int(6)]);

        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn failing_listener_does_not_stop_others() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let first = calls.clone();
        let second = calls.clone();
        let failing = Function::builder("fails")
            .static_fn(move |_| {
                first.lock().push("fails");
                Err::<(), _>(MemberError::failed("boom"))
            })
            .build();
        let working = Function::builder("works")
            .static_fn(move |_| {
                second.lock().push("works");
                Ok(())
            })
            .build();

        let dispatcher = Dispatcher::new();
        dispatcher.add("x", failing);
        dispatcher.add("x", working);
        dispatcher.run("x");

        assert_eq!(*calls.lock(), vec!["fails", "works"]);
    }

    #[test]
    fn remove_unbinds() {
        let function = Function::builder("on_x").static_fn(|_| Ok(())).build();
        let dispatcher = Dispatcher::new();
        dispatcher.add("x", function.clone());

        assert!(dispatcher.remove("x", &function));
        assert!(!dispatcher.remove("x", &function));
        assert_eq!(dispatcher.listeners("x"), 0);
    }

    #[test]
    fn instance_buckets() {
        struct Npc;
        let library = Library::builder::<Npc>().name("npc").build();
        let dispatcher = Dispatcher::new();
        let a = Instance::new(Npc);
        let b = Instance::new(Npc);

        dispatcher.register(&library, &a);
        dispatcher.register(&library, &a);
        dispatcher.register(&library, &b);
        assert_eq!(dispatcher.instances(library.id()), 2);

        dispatcher.unregister(&library, &a);
        assert_eq!(dispatcher.instances(library.id()), 1);
        dispatcher.clear();
        assert_eq!(dispatcher.instances(library.id()), 0);
    }
}
