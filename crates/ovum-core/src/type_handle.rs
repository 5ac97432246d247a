//! Opaque handles to Rust types.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to the real Rust type a library or member describes.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for
/// diagnostics and for deriving default library names. Interfaces are
/// described with trait-object handles such as `TypeHandle::of::<dyn Greeter>()`.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
}

impl TypeHandle {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full path as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment with generics and `dyn` stripped.
    ///
    /// `game::units::Player<i32>` → `Player`.
    pub fn short_name(&self) -> &'static str {
        let path = self.path();
        path.rsplit("::").next().unwrap_or(path)
    }

    /// The module segment directly enclosing the type, if any.
    ///
    /// `game::units::Player` → `units`.
    pub fn namespace(&self) -> Option<&'static str> {
        let mut segments = self.path().rsplit("::");
        segments.next();
        segments.next()
    }

    fn path(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        match name.find('<') {
            Some(index) => &name[..index],
            None => name,
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.name)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod units {
        pub struct Player;
        pub trait Greeter {}
    }

    #[test]
    fn equality_by_type_id() {
        assert_eq!(TypeHandle::of::<units::Player>(), TypeHandle::of::<units::Player>());
        assert_ne!(TypeHandle::of::<units::Player>(), TypeHandle::of::<i32>());
    }

    #[test]
    fn short_name_and_namespace() {
        let handle = TypeHandle::of::<units::Player>();
        assert_eq!(handle.short_name(), "Player");
        assert_eq!(handle.namespace(), Some("units"));
    }

    #[test]
    fn trait_object_handle() {
        let handle = TypeHandle::of::<dyn units::Greeter>();
        assert_eq!(handle.short_name(), "Greeter");
        assert_eq!(handle.namespace(), Some("units"));
    }

    #[test]
    fn generics_are_stripped() {
        let handle = TypeHandle::of::<Vec<units::Player>>();
        assert_eq!(handle.short_name(), "Vec");
        assert_eq!(TypeHandle::of::<i64>().namespace(), None);
    }
}
