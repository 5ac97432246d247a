//! Process-wide owner of the registry and dispatcher.

use std::sync::Arc;

use ovum_core::{Instance, Library, Value};
use ovum_dispatch::Dispatcher;
use ovum_registry::Registry;
use tracing::{info, warn};

use crate::events;

/// One registry and one dispatcher, started and stopped together.
///
/// Build one at startup with [`Context::init`] and share it by reference.
#[derive(Debug, Clone)]
pub struct Context {
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// An empty context. Nothing is populated and no event fires.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Wrap an existing registry, binding its dormant dispatch markers.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.bind(registry.iter());
        Self {
            registry,
            dispatcher,
        }
    }

    /// Populate the registry from every submitted registration, bind dispatch
    /// markers and fire [`events::READY`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn init() -> Self {
        let context = Self::with_registry(Registry::init());
        context.run(events::READY);
        info!(libraries = context.registry.len(), "context ready");
        context
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Add a library after startup, binding its dispatch markers.
    ///
    /// Returns the library it replaced, if any.
    pub fn add(&self, library: Arc<Library>) -> Option<Arc<Library>> {
        self.dispatcher.bind([library.clone()]);
        self.registry.add(library)
    }

    // ==========================================================================
    // Instances
    // ==========================================================================

    /// Create an instance of the library named `name` and register it.
    ///
    /// Returns `None` if the library is missing, cannot create, or a binding
    /// vetoed the registration.
    pub fn spawn(&self, name: &str) -> Option<Instance> {
        let library = self.registry.get_by_name(name)?;
        let instance = library.create()?;
        if !library.register(&instance) {
            warn!(library = name, "spawned instance was not registered");
            return None;
        }
        Some(instance)
    }

    /// Unregister an instance from its library's bindings.
    pub fn despawn(&self, instance: &Instance) {
        self.registry.unregister(instance);
    }

    // ==========================================================================
    // Events
    // ==========================================================================

    pub fn run(&self, event: &str) {
        self.dispatcher.run(event);
    }

    pub fn run_with(&self, event: &str, args: &[Value]) {
        self.dispatcher.run_with(event, args);
    }

    /// Fire [`events::SHUTDOWN`], then drop every binding and detach every
    /// component.
    pub fn shutdown(&self) {
        self.run(events::SHUTDOWN);
        self.dispatcher.clear();
        self.registry.shutdown();
        info!("context shut down");
    }
}
