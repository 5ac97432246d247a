//! Core types for the ovum type metadata registry.
//!
//! This crate provides the building blocks every other ovum crate shares:
//!
//! - [`MetaId`]: deterministic name-based identity
//! - [`naming`]: canonical name and title helpers
//! - [`Value`], [`FromValue`], [`IntoValue`]: dynamic values for accessors
//! - [`Instance`]: shared handle to a live object
//! - [`Components`], [`Component`], [`Binding`]: the extension point
//! - [`Property`], [`Function`], [`Members`]: member descriptors and catalogues
//! - [`Library`]: the per-type descriptor and its lifecycle
//! - [`markers`]: built-in components
//!
//! Registry storage lives in `ovum-registry`; event dispatch in `ovum-dispatch`.

mod binding;
mod component;
mod error;
mod hash;
mod instance;
mod library;
pub mod markers;
mod members;
mod meta;
pub mod naming;
mod type_handle;
mod value;

pub use binding::Binding;
pub use component::{Component, Components};
pub use error::{ConversionError, MemberError};
pub use hash::MetaId;
pub use instance::Instance;
pub use library::{Library, LibraryBuilder, LibraryFlags};
pub use members::{
    Function, FunctionBuilder, Member, MemberBase, MemberFlags, Members, Param, Property,
    PropertyBuilder, arg,
};
pub use meta::Meta;
pub use type_handle::TypeHandle;
pub use value::{FromValue, IntoValue, Value};
