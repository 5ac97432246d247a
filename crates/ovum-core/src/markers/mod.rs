//! Built-in components for libraries and members.
//!
//! - [`Singleton`]: binding that admits one live instance and serves it from
//!   [`Library::create`](crate::Library::create)
//! - [`Constructor`]: names an alternate constructor function
//! - [`Tags`], [`Order`]: plain metadata records

mod constructor;
mod singleton;
mod tags;

pub use constructor::Constructor;
pub use singleton::Singleton;
pub use tags::{Order, Tags};
