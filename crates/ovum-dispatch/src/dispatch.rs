//! Components that connect descriptors to a [`Dispatcher`].

use std::sync::{Arc, OnceLock, Weak};

use ovum_core::{Binding, Component, Function, Instance, Library, Member};
use tracing::debug;

use crate::Dispatcher;

/// Opts a function into an event.
///
/// A marker created with [`Dispatch::with`] binds as soon as it is attached.
/// One created with [`Dispatch::new`] stays dormant until
/// [`Dispatcher::bind`] reaches it, which is how libraries built before the
/// dispatcher existed get wired.
///
/// Binding also attaches a [`DispatchHook`] to the function's declaring
/// library so its registered instances receive the event.
pub struct Dispatch {
    event: String,
    dispatcher: OnceLock<Weak<Dispatcher>>,
}

impl Dispatch {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            dispatcher: OnceLock::new(),
        }
    }

    pub fn with(event: impl Into<String>, dispatcher: &Arc<Dispatcher>) -> Self {
        let marker = Self::new(event);
        let _ = marker.dispatcher.set(Arc::downgrade(dispatcher));
        marker
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// The dispatcher this marker is bound to, if any and still alive.
    pub fn dispatcher(&self) -> Option<Arc<Dispatcher>> {
        self.dispatcher.get().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.dispatcher.get().is_some()
    }

    /// Bind a dormant marker. Returns `false` if it was already bound.
    pub(crate) fn bind(&self, dispatcher: &Arc<Dispatcher>, function: &Arc<Function>) -> bool {
        if self.dispatcher.set(Arc::downgrade(dispatcher)).is_err() {
            return false;
        }
        self.connect(dispatcher, function);
        true
    }

    fn connect(&self, dispatcher: &Arc<Dispatcher>, function: &Arc<Function>) {
        dispatcher.add(self.event.clone(), function.clone());
        if function.is_static() {
            return;
        }
        if let Some(library) = function.owner()
            && !library.components().has::<DispatchHook>()
        {
            debug!(library = library.name(), "attaching dispatch hook");
            library.components().add(DispatchHook::new(dispatcher));
        }
    }
}

impl Component<Function> for Dispatch {
    fn on_attached(&self, function: &Arc<Function>) {
        if let Some(dispatcher) = self.dispatcher() {
            self.connect(&dispatcher, function);
        }
    }

    fn on_detached(&self, function: &Arc<Function>) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.remove(&self.event, function);
        }
    }
}

/// Library binding that mirrors registered instances into a dispatcher's
/// instance buckets.
pub struct DispatchHook {
    dispatcher: Weak<Dispatcher>,
}

impl DispatchHook {
    pub fn new(dispatcher: &Arc<Dispatcher>) -> Self {
        Self {
            dispatcher: Arc::downgrade(dispatcher),
        }
    }
}

impl Component<Library> for DispatchHook {
    fn is_singleton(&self) -> bool {
        true
    }

    fn as_binding(&self) -> Option<&dyn Binding> {
        Some(self)
    }
}

impl Binding for DispatchHook {
    fn on_register(&self, library: &Library, instance: &Instance) -> bool {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.register(library, instance);
        }
        true
    }

    fn on_unregister(&self, library: &Library, instance: &Instance) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.unregister(library, instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovum_core::MemberError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Listener {
        id: u32,
        log: Arc<Mutex<Vec<u32>>>,
    }

    fn listener_library(dispatcher: &Arc<Dispatcher>) -> Arc<Library> {
        Library::builder::<Listener>()
            .name("listener")
            .function(
                Function::builder("on_tick")
                    .method(|this: &mut Listener, _| {
                        this.log.lock().push(this.id);
                        Ok(())
                    })
                    .component(Dispatch::with("tick", dispatcher)),
            )
            .build()
    }

    #[test]
    fn instance_function_fans_out_in_registration_order() {
        let dispatcher = Arc::new(Dispatcher::new());
        let library = listener_library(&dispatcher);
        let log = Arc::new(Mutex::new(Vec::new()));

        let instances: Vec<_> = [2, 0, 1]
            .into_iter()
            .map(|id| Instance::new(Listener { id, log: log.clone() }))
            .collect();
        for instance in &instances {
            assert!(library.register(instance));
        }

        dispatcher.run("tick");
        assert_eq!(*log.lock(), vec![2, 0, 1]);
    }

    #[test]
    fn unregistered_instances_stop_receiving() {
        let dispatcher = Arc::new(Dispatcher::new());
        let library = listener_library(&dispatcher);
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Instance::new(Listener { id: 1, log: log.clone() });
        let b = Instance::new(Listener { id: 2, log: log.clone() });
        library.register(&a);
        library.register(&b);

        library.unregister(&a);
        dispatcher.run("tick");

        assert_eq!(*log.lock(), vec![2]);
        assert_eq!(dispatcher.instances(library.id()), 1);
    }

    #[test]
    fn no_registered_instances_is_empty_iteration() {
        let dispatcher = Arc::new(Dispatcher::new());
        let _library = listener_library(&dispatcher);
        assert_eq!(dispatcher.listeners("tick"), 1);
        dispatcher.run("tick");
    }

    #[test]
    fn binding_attaches_one_hook() {
        let dispatcher = Arc::new(Dispatcher::new());
        let library = Library::builder::<Listener>()
            .name("listener")
            .function(
                Function::builder("on_a")
                    .method(|_: &mut Listener, _| Ok(()))
                    .component(Dispatch::with("a", &dispatcher)),
            )
            .function(
                Function::builder("on_b")
                    .method(|_: &mut Listener, _| Ok(()))
                    .component(Dispatch::with("b", &dispatcher)),
            )
            .build();

        assert_eq!(library.components().get_all::<DispatchHook>().len(), 1);
    }

    #[test]
    fn vetoed_registration_leaves_bucket_empty() {
        struct Veto;
        impl Component<Library> for Veto {
            fn as_binding(&self) -> Option<&dyn Binding> {
                Some(self)
            }
        }
        impl Binding for Veto {
            fn on_register(&self, _: &Library, _: &Instance) -> bool {
                false
            }
        }

        let dispatcher = Arc::new(Dispatcher::new());
        let library = listener_library(&dispatcher);
        library.components().add(Veto);

        let log = Arc::new(Mutex::new(Vec::new()));
        let instance = Instance::new(Listener { id: 7, log: log.clone() });
        assert!(!library.register(&instance));

        dispatcher.run("tick");
        assert!(log.lock().is_empty());
        assert_eq!(dispatcher.instances(library.id()), 0);
    }

    #[derive(Default)]
    struct Echo {
        outer: u32,
        inner: u32,
    }

    #[test]
    fn nested_run_skips_busy_instance() {
        let dispatcher = Arc::new(Dispatcher::new());
        let weak = Arc::downgrade(&dispatcher);
        let library = Library::builder::<Echo>()
            .name("echo")
            .function(
                Function::builder("on_outer")
                    .method(move |echo: &mut Echo, _| {
                        if let Some(dispatcher) = weak.upgrade() {
                            dispatcher.run("inner");
                        }
                        echo.outer += 1;
                        Ok(())
                    })
                    .component(Dispatch::with("outer", &dispatcher)),
            )
            .function(
                Function::builder("on_inner")
                    .method(|echo: &mut Echo, _| {
                        echo.inner += 1;
                        Ok(())
                    })
                    .component(Dispatch::with("inner", &dispatcher)),
            )
            .build();

        let a = Instance::new(Echo::default());
        let b = Instance::new(Echo::default());
        library.register(&a);
        library.register(&b);

        dispatcher.run("outer");

        // Each instance misses the inner event raised from its own handler only.
        for echo in [&a, &b] {
            assert_eq!(echo.read(|e: &Echo| (e.outer, e.inner)), Some((1, 1)));
        }
    }

    #[test]
    fn dormant_markers_bind_later() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let library = Library::builder::<Listener>()
            .name("listener")
            .function(
                Function::builder("on_boot")
                    .static_fn(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .component(Dispatch::new("boot")),
            )
            .build();

        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.run("boot");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(dispatcher.bind([library.clone()]), 1);
        assert_eq!(dispatcher.bind([library]), 0);
        dispatcher.run("boot");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detaching_marker_unbinds_function() {
        let dispatcher = Arc::new(Dispatcher::new());
        let function = Function::builder("on_x")
            .static_fn(|_| Err::<(), _>(MemberError::failed("unused")))
            .component(Dispatch::with("x", &dispatcher))
            .build();
        assert_eq!(dispatcher.listeners("x"), 1);

        function.components().clear();
        assert_eq!(dispatcher.listeners("x"), 0);
    }
}
