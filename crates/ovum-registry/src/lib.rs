//! Process-wide library registry for ovum.
//!
//! This crate provides [`Registry`], the store every consumer resolves
//! [`Library`](ovum_core::Library) descriptors from, and the registration
//! tables ([`UnitRegistration`], [`LibraryRegistration`]) it is populated
//! from at startup.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ovum_core::Library;
//! use ovum_registry::Registry;
//!
//! #[derive(Default)]
//! struct Door;
//!
//! fn door(_: &Registry) -> Arc<Library> {
//!     Library::builder::<Door>().name("door").default_constructor().build()
//! }
//!
//! let registry = Registry::new();
//! registry.add(door(&registry));
//! assert!(registry.create("door").is_some());
//! assert!(registry.get_by_name("window").is_none());
//! ```
//!
//! In a real crate `door` would be submitted with
//! `ovum_registry::library!(door)` and picked up by [`Registry::init`].

mod error;
mod population;
mod registry;

pub use error::RegistryError;
pub use population::{LibraryRegistration, UnitRegistration};
pub use registry::Registry;

#[doc(hidden)]
pub use inventory;
