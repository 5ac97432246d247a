//! Event dispatch for ovum.
//!
//! Functions opt into a named event by carrying a [`Dispatch`] component.
//! Instances opt in by being registered with their library, which a
//! [`DispatchHook`] mirrors into the dispatcher's instance buckets.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ovum_core::{Function, Instance, Library};
//! use ovum_dispatch::{Dispatch, Dispatcher};
//!
//! struct Lamp {
//!     lit: bool,
//! }
//!
//! let dispatcher = Arc::new(Dispatcher::new());
//! let library = Library::builder::<Lamp>()
//!     .name("lamp")
//!     .function(
//!         Function::builder("on_dusk")
//!             .method(|lamp: &mut Lamp, _| {
//!                 lamp.lit = true;
//!                 Ok(())
//!             })
//!             .component(Dispatch::with("dusk", &dispatcher)),
//!     )
//!     .build();
//!
//! let lamp = Instance::new(Lamp { lit: false });
//! assert!(library.register(&lamp));
//!
//! dispatcher.run("dusk");
//! assert_eq!(lamp.read(|l: &Lamp| l.lit), Some(true));
//! ```

mod dispatch;
mod dispatcher;

pub use dispatch::{Dispatch, DispatchHook};
pub use dispatcher::Dispatcher;
