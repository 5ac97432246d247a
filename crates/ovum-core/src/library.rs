//! Libraries: the per-type descriptor.
//!
//! A [`Library`] describes one Rust type: its canonical name and [`MetaId`],
//! presentation data, optional parent library, the interfaces it implements,
//! the components attached to it, and its property and function catalogues.
//! It also owns the creation and registration lifecycle of live instances,
//! which attached [`Binding`]s may intercept.
//!
//! # Building
//!
//! Libraries are immutable in shape once built. [`LibraryBuilder::build`]:
//!
//! 1. derives the name (`namespace.type_name` in programmer case) unless given
//! 2. seeds the catalogues with the parent's members
//! 3. adds the library's own members, which shadow inherited ones by name
//! 4. attaches the declared components, library first, then members
//!
//! # Example
//!
//! ```
//! use ovum_core::{Library, Property};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let library = Library::builder::<Counter>()
//!     .name("counter")
//!     .default_constructor()
//!     .property(Property::builder("count").field(|c: &Counter| c.count, |c: &mut Counter, v| c.count = v))
//!     .build();
//!
//! let instance = library.create().unwrap();
//! let count = library.properties().find("counter.count").unwrap();
//! count.set(Some(&instance), 3i64);
//! assert_eq!(count.get_as::<i64>(Some(&instance)), Some(3));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::component::{Marker, marker};
use crate::markers::Constructor;
use crate::members::{Function, FunctionBuilder, Member, Members, Property, PropertyBuilder};
use crate::naming::{member_name, to_programmer_case, to_title_case};
use crate::{Binding, Component, Components, Instance, Meta, MetaId, TypeHandle};

bitflags! {
    /// Lifecycle flags of a library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LibraryFlags: u8 {
        /// Describes an abstract type or interface; never constructed directly.
        const ABSTRACT = 1 << 0;
        /// [`Library::create`] may construct new instances.
        const SPAWNABLE = 1 << 1;
    }
}

type Initializer = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Descriptor of one registered type.
pub struct Library {
    meta: Meta,
    info: TypeHandle,
    flags: RwLock<LibraryFlags>,
    parent: Option<Arc<Library>>,
    children: RwLock<Vec<Weak<Library>>>,
    interfaces: Vec<TypeHandle>,
    initializer: Option<Initializer>,
    components: Components<Library>,
    properties: Members<Property>,
    functions: Members<Function>,
}

impl Library {
    /// Start describing `T`.
    pub fn builder<T: ?Sized + 'static>() -> LibraryBuilder<T> {
        LibraryBuilder::new()
    }

    // ==========================================================================
    // Identity & presentation
    // ==========================================================================

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn id(&self) -> MetaId {
        self.meta.id()
    }

    pub fn title(&self) -> String {
        self.meta.title()
    }

    pub fn group(&self) -> String {
        self.meta.group()
    }

    pub fn help(&self) -> String {
        self.meta.help()
    }

    /// The Rust type this library describes.
    pub fn info(&self) -> TypeHandle {
        self.info
    }

    /// Prefix of this library's member names: the last segment of its name.
    pub fn prefix(&self) -> &str {
        let name = self.name();
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Canonical name of `member` when declared on this library.
    pub fn member_name(&self, member: &str) -> String {
        member_name(self.prefix(), member)
    }

    // ==========================================================================
    // Hierarchy
    // ==========================================================================

    pub fn parent(&self) -> Option<&Arc<Library>> {
        self.parent.as_ref()
    }

    /// Live libraries built with this one as parent.
    pub fn children(&self) -> Vec<Arc<Library>> {
        self.children.read().iter().filter_map(Weak::upgrade).collect()
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn base_chain(&self) -> Vec<Arc<Library>> {
        let mut chain = Vec::new();
        let mut current = self.parent.clone();
        while let Some(library) = current {
            current = library.parent.clone();
            chain.push(library);
        }
        chain
    }

    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.interfaces
    }

    /// Whether `other` appears in this library's parent chain.
    pub fn is_subclass_of(&self, other: &Library) -> bool {
        self.base_chain().iter().any(|base| base.id() == other.id())
    }

    /// Whether this library's type is, derives from, or implements `handle`.
    pub fn implements(&self, handle: TypeHandle) -> bool {
        if self.info == handle || self.interfaces.contains(&handle) {
            return true;
        }
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.implements(handle))
    }

    // ==========================================================================
    // Flags
    // ==========================================================================

    pub fn flags(&self) -> LibraryFlags {
        *self.flags.read()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags().contains(LibraryFlags::ABSTRACT)
    }

    pub fn is_spawnable(&self) -> bool {
        self.flags().contains(LibraryFlags::SPAWNABLE)
    }

    pub fn set_spawnable(&self, spawnable: bool) {
        self.flags.write().set(LibraryFlags::SPAWNABLE, spawnable);
    }

    // ==========================================================================
    // Catalogues
    // ==========================================================================

    pub fn components(&self) -> &Components<Library> {
        &self.components
    }

    pub fn properties(&self) -> &Members<Property> {
        &self.properties
    }

    pub fn functions(&self) -> &Members<Function> {
        &self.functions
    }

    /// Build and add a property after construction.
    pub fn add_property(&self, builder: PropertyBuilder) -> Arc<Property> {
        let pending = builder.build_pending(Some(self.prefix()));
        self.properties.add(pending.member.clone());
        pending.attach()
    }

    /// Build and add a function after construction.
    pub fn add_function(&self, builder: FunctionBuilder) -> Arc<Function> {
        let pending = builder.build_pending(Some(self.prefix()));
        self.functions.add(pending.member.clone());
        pending.attach()
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    /// Produce an instance.
    ///
    /// The first binding whose `on_create` returns an instance wins. Without
    /// one, a spawnable library falls back to [`Library::construct`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn create(&self) -> Option<Instance> {
        for component in self.components.bindings() {
            if let Some(binding) = component.as_binding()
                && let Some(instance) = binding.on_create(self)
            {
                return Some(instance);
            }
        }

        if !self.is_spawnable() {
            error!(library = self.name(), "library is not spawnable");
            return None;
        }
        self.construct()
    }

    /// Construct a new instance, bypassing bindings.
    ///
    /// A [`Constructor`] component is consulted before the default
    /// initializer.
    pub fn construct(&self) -> Option<Instance> {
        if let Some(constructor) = self.components.get::<Constructor>()
            && let Some(instance) = constructor.construct(self)
        {
            return Some(instance);
        }

        if self.is_abstract() {
            error!(library = self.name(), "cannot construct an abstract library");
            return None;
        }
        match &self.initializer {
            Some(initializer) => Some(initializer()),
            None => {
                error!(
                    library = self.name(),
                    "library has no parameterless initializer"
                );
                None
            }
        }
    }

    /// Offer a live instance to every binding.
    ///
    /// Any veto aborts registration: bindings that already accepted the
    /// instance get `on_unregister`, and `false` is returned.
    pub fn register(&self, instance: &Instance) -> bool {
        let bindings = self.components.bindings();
        for (index, component) in bindings.iter().enumerate() {
            let Some(binding) = component.as_binding() else {
                continue;
            };
            if binding.on_register(self, instance) {
                continue;
            }

            warn!(
                library = self.name(),
                instance = instance.type_name(),
                "registration vetoed"
            );
            for accepted in bindings[..index].iter().rev() {
                if let Some(binding) = accepted.as_binding() {
                    binding.on_unregister(self, instance);
                }
            }
            return false;
        }
        true
    }

    /// Withdraw a live instance from every binding.
    pub fn unregister(&self, instance: &Instance) {
        for component in self.components.bindings() {
            if let Some(binding) = component.as_binding() {
                binding.on_unregister(self, instance);
            }
        }
    }

    /// Detach every component of this library and of its own members.
    pub fn clear_components(&self) {
        self.components.clear();
        for property in self.properties.iter() {
            if self.owns(property.owner()) {
                property.components().clear();
            }
        }
        for function in self.functions.iter() {
            if self.owns(function.owner()) {
                function.components().clear();
            }
        }
    }

    fn owns(&self, owner: Option<Arc<Library>>) -> bool {
        owner.is_some_and(|owner| std::ptr::eq(Arc::as_ptr(&owner), self))
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name())
            .field("id", &self.id())
            .field("info", &self.info)
            .field("flags", &self.flags())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("components", &self.components)
            .field("properties", &self.properties)
            .field("functions", &self.functions)
            .finish()
    }
}

/// Builder for [`Library`].
pub struct LibraryBuilder<T: ?Sized + 'static> {
    info: TypeHandle,
    name: Option<String>,
    title: Option<String>,
    group: Option<String>,
    help: Option<String>,
    parent: Option<Arc<Library>>,
    interfaces: Vec<TypeHandle>,
    is_abstract: bool,
    spawnable: Option<bool>,
    initializer: Option<Initializer>,
    properties: Vec<PropertyBuilder>,
    functions: Vec<FunctionBuilder>,
    markers: Vec<Marker<Library>>,
    _type: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + 'static> LibraryBuilder<T> {
    fn new() -> Self {
        Self {
            info: TypeHandle::of::<T>(),
            name: None,
            title: None,
            group: None,
            help: None,
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            spawnable: None,
            initializer: None,
            properties: Vec::new(),
            functions: Vec::new(),
            markers: Vec::new(),
            _type: PhantomData,
        }
    }

    /// Canonical name. Defaults to `namespace.type_name` in programmer case.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Inherit members from `parent` and link into its children.
    pub fn parent(mut self, parent: &Arc<Library>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare that the type implements interface `I`.
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        self.interfaces.push(TypeHandle::of::<I>());
        self
    }

    /// Mark as abstract. Abstract libraries are not spawnable by default.
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn spawnable(mut self, spawnable: bool) -> Self {
        self.spawnable = Some(spawnable);
        self
    }

    /// Parameterless initializer used by [`Library::construct`].
    pub fn initializer(mut self, init: impl Fn() -> Instance + Send + Sync + 'static) -> Self {
        self.initializer = Some(Arc::new(init));
        self
    }

    pub fn property(mut self, property: PropertyBuilder) -> Self {
        self.properties.push(property);
        self
    }

    pub fn function(mut self, function: FunctionBuilder) -> Self {
        self.functions.push(function);
        self
    }

    /// Attach a component once the library is built.
    pub fn component<C: Component<Library>>(mut self, component: C) -> Self {
        self.markers.push(marker(component));
        self
    }

    pub fn build(self) -> Arc<Library> {
        let Self {
            info,
            name,
            title,
            group,
            help,
            parent,
            interfaces,
            is_abstract,
            spawnable,
            initializer,
            properties,
            functions,
            markers,
            _type,
        } = self;

        let name = name.unwrap_or_else(|| to_programmer_case(info.short_name(), info.namespace()));
        let prefix = name.rsplit('.').next().unwrap_or(&name).to_string();
        let meta = Meta::with_presentation(
            name,
            title.unwrap_or_else(|| to_title_case(info.short_name())),
            group.unwrap_or_else(|| info.namespace().map(to_title_case).unwrap_or_default()),
            help.unwrap_or_default(),
        );

        let mut flags = LibraryFlags::empty();
        flags.set(LibraryFlags::ABSTRACT, is_abstract);
        flags.set(LibraryFlags::SPAWNABLE, spawnable.unwrap_or(!is_abstract));

        let mut pending_properties = Vec::with_capacity(properties.len());
        let mut pending_functions = Vec::with_capacity(functions.len());
        let library = Arc::new_cyclic(|weak: &Weak<Library>| {
            let own_properties = Members::new(weak.clone());
            let own_functions = Members::new(weak.clone());
            if let Some(parent) = &parent {
                own_properties.add_inherited(&parent.properties);
                own_functions.add_inherited(&parent.functions);
            }
            for builder in properties {
                let pending = builder.build_pending(Some(&prefix));
                own_properties.add(pending.member.clone());
                pending_properties.push(pending);
            }
            for builder in functions {
                let pending = builder.build_pending(Some(&prefix));
                own_functions.add(pending.member.clone());
                pending_functions.push(pending);
            }

            Library {
                meta,
                info,
                flags: RwLock::new(flags),
                parent,
                children: RwLock::new(Vec::new()),
                interfaces,
                initializer,
                components: Components::new(weak.clone()),
                properties: own_properties,
                functions: own_functions,
            }
        });

        if let Some(parent) = &library.parent {
            parent.children.write().push(Arc::downgrade(&library));
        }
        for marker in markers {
            marker(&library.components);
        }
        for pending in pending_properties {
            pending.attach();
        }
        for pending in pending_functions {
            pending.attach();
        }

        debug!(library = library.name(), id = %library.id(), "library built");
        library
    }
}

impl<T: Default + Any + Send + Sync> LibraryBuilder<T> {
    /// Use `T::default()` as the parameterless initializer.
    pub fn default_constructor(self) -> Self {
        self.initializer(|| Instance::new(T::default()))
    }
}
