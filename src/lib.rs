//! ovum: self-describing type metadata and extension registry.
//!
//! Every registered Rust type gets a process-wide [`Library`] carrying its
//! identity, presentation data, a typed member catalogue and a set of attached
//! [`Component`]s. Consumers resolve libraries from the [`Registry`], read and
//! write members through typed accessors, and fire string-keyed events
//! through the [`Dispatcher`].
//!
//! [`Context`] owns one registry and one dispatcher and sequences their
//! startup and shutdown.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ovum::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     hits: i64,
//! }
//!
//! let context = Context::new();
//! context.add(
//!     Library::builder::<Counter>()
//!         .name("counter")
//!         .default_constructor()
//!         .property(Property::builder("hits").field(
//!             |c: &Counter| c.hits,
//!             |c: &mut Counter, v: i64| c.hits = v,
//!         ))
//!         .function(
//!             Function::builder("hit")
//!                 .method(|c: &mut Counter, _| {
//!                     c.hits += 1;
//!                     Ok(())
//!                 })
//!                 .component(Dispatch::new("tick")),
//!         )
//!         .build(),
//! );
//!
//! let counter = context.spawn("counter").unwrap();
//! context.run("tick");
//! context.run("tick");
//!
//! let library = context.registry().get_by_name("counter").unwrap();
//! let hits = library.properties().find("counter.hits").unwrap();
//! assert_eq!(hits.get_as::<i64>(Some(&counter)), Some(2));
//! ```
//!
//! # Features
//!
//! - `profiling`: instrument hot paths with the `profiling` crate.
//! - `profile-with-puffin`: route those scopes to puffin.

mod context;

pub use context::Context;

pub use ovum_core::{
    Binding, Component, Components, ConversionError, FromValue, Function, FunctionBuilder,
    Instance, IntoValue, Library, LibraryBuilder, LibraryFlags, Member, MemberBase, MemberError,
    MemberFlags, Members, Meta, MetaId, Param, Property, PropertyBuilder, TypeHandle, Value, arg,
};
pub use ovum_core::{markers, naming};
pub use ovum_dispatch::{Dispatch, DispatchHook, Dispatcher};
pub use ovum_registry::{
    LibraryRegistration, Registry, RegistryError, UnitRegistration, bulk_cache, library,
};

/// Events the [`Context`] fires during its own lifecycle.
pub mod events {
    /// Fired once at the end of [`Context::init`](crate::Context::init).
    pub const READY: &str = "ovum.ready";
    /// Fired at the start of [`Context::shutdown`](crate::Context::shutdown).
    pub const SHUTDOWN: &str = "ovum.shutdown";
}

pub mod prelude {
    pub use crate::Context;
    pub use crate::markers::{Constructor, Order, Singleton, Tags};
    pub use ovum_core::{
        Binding, Component, Function, Instance, Library, Member, MemberError, MetaId, Property,
        Value, arg,
    };
    pub use ovum_dispatch::{Dispatch, Dispatcher};
    pub use ovum_registry::Registry;
}
