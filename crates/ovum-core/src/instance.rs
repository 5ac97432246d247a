//! Shared handles to live objects.
//!
//! The registry manages identity and metadata only; the objects themselves are
//! owned by whoever created them. An [`Instance`] is a cheap-clone handle that
//! consumers pass to libraries, accessors and the dispatcher. Two handles are
//! the same object when [`Instance::ptr_eq`] says so.
//!
//! Accessors lock the object for the duration of a single get, set or call.
//! Locks are never waited on: an accessor that finds the object already locked
//! fails with [`MemberError::Busy`], so a function body that re-enters its own
//! target (directly or through a nested dispatch) gets an error instead of
//! hanging.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{MemberError, TypeHandle};

/// Cheap-clone handle to a live, type-erased object.
#[derive(Clone)]
pub struct Instance {
    ty: TypeHandle,
    cell: Arc<RwLock<dyn Any + Send + Sync>>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let cell: Arc<RwLock<dyn Any + Send + Sync>> = Arc::new(RwLock::new(value));
        Self {
            ty: TypeHandle::of::<T>(),
            cell,
        }
    }

    /// Handle of the concrete type stored in this instance.
    pub fn type_handle(&self) -> TypeHandle {
        self.ty
    }

    pub fn type_name(&self) -> &'static str {
        self.ty.name()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.ty == TypeHandle::of::<T>()
    }

    /// Run `f` with shared access to the object.
    ///
    /// Fails with [`MemberError::Busy`] while the object is exclusively locked
    /// and with [`MemberError::WrongTarget`] if it is not a `T`.
    pub fn try_read<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, MemberError> {
        let guard = self.cell.try_read().ok_or(MemberError::Busy {
            instance: self.type_name(),
        })?;
        guard.downcast_ref::<T>().map(f).ok_or(MemberError::WrongTarget {
            expected: type_name::<T>(),
            actual: self.type_name(),
        })
    }

    /// Run `f` with exclusive access to the object.
    ///
    /// Fails with [`MemberError::Busy`] while the object is locked and with
    /// [`MemberError::WrongTarget`] if it is not a `T`.
    pub fn try_write<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, MemberError> {
        let mut guard = self.cell.try_write().ok_or(MemberError::Busy {
            instance: self.type_name(),
        })?;
        guard.downcast_mut::<T>().map(f).ok_or(MemberError::WrongTarget {
            expected: type_name::<T>(),
            actual: self.type_name(),
        })
    }

    /// [`Instance::try_read`], discarding the reason.
    pub fn read<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.try_read(f).ok()
    }

    /// [`Instance::try_write`], discarding the reason.
    pub fn write<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.try_write(f).ok()
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.cell), Arc::as_ptr(&other.cell))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("addr", &Arc::as_ptr(&self.cell).cast::<()>())
            .finish()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        count: i64,
    }

    #[test]
    fn read_and_write_typed() {
        let instance = Instance::new(Counter::default());
        instance.write(|c: &mut Counter| c.count = 3);
        assert_eq!(instance.read(|c: &Counter| c.count), Some(3));
    }

    #[test]
    fn wrong_type_yields_none() {
        let instance = Instance::new(Counter::default());
        assert!(instance.read(|s: &String| s.len()).is_none());
        assert!(instance.is::<Counter>());
        assert!(!instance.is::<String>());
    }

    #[test]
    fn locked_instance_reports_busy() {
        let instance = Instance::new(Counter::default());
        let inner = instance.clone();

        let nested = instance.try_write(|_: &mut Counter| {
            (
                inner.try_read(|c: &Counter| c.count),
                inner.try_write(|c: &mut Counter| c.count = 1),
            )
        });

        let Ok((read, write)) = nested else {
            panic!("outer write should succeed");
        };
        assert!(matches!(read, Err(MemberError::Busy { .. })));
        assert!(matches!(write, Err(MemberError::Busy { .. })));
        assert_eq!(instance.read(|c: &Counter| c.count), Some(0));
    }

    #[test]
    fn wrong_type_is_wrong_target() {
        let instance = Instance::new(Counter::default());
        assert!(matches!(
            instance.try_read(|s: &String| s.len()),
            Err(MemberError::WrongTarget { .. })
        ));
    }

    #[test]
    fn identity_by_pointer() {
        let a = Instance::new(Counter::default());
        let b = a.clone();
        let c = Instance::new(Counter::default());
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&c));
    }
}
