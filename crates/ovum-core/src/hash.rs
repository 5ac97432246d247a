//! Deterministic name-based identity.
//!
//! Every library and member is identified by a [`MetaId`], a 32-bit hash of its
//! canonical name. Ids are computed, never allocated, so:
//!
//! - the same name always produces the same id, across calls and processes
//! - an id can be computed before the thing it names is registered
//! - sorted storages keyed by id iterate in a stable order
//!
//! # Hash Computation
//!
//! Uses XXHash32 (seed 0) over the UTF-8 bytes of the name, reinterpreted as a
//! signed 32-bit integer.
//!
//! # Examples
//!
//! ```
//! use ovum_core::MetaId;
//!
//! let a = MetaId::from_name("a.count");
//! assert_eq!(a, MetaId::from_name("a.count"));
//! assert_ne!(a, MetaId::from_name("b.count"));
//! ```

use std::fmt;
use xxhash_rust::xxh32::xxh32;

/// A deterministic 32-bit identity derived from a canonical name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct MetaId(pub i32);

impl MetaId {
    /// The id of nothing. Never produced for a non-empty name in practice.
    pub const EMPTY: MetaId = MetaId(0);

    /// Hash a canonical name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        MetaId(xxh32(name.as_bytes(), 0) as i32)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<&str> for MetaId {
    fn from(name: &str) -> Self {
        MetaId::from_name(name)
    }
}

impl fmt::Debug for MetaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetaId({:#010x})", self.0 as u32)
    }
}

impl fmt::Display for MetaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_deterministic() {
        assert_eq!(MetaId::from_name("a"), MetaId::from_name("a"));
        assert_eq!(MetaId::from("units.player"), MetaId::from_name("units.player"));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(MetaId::from_name("a.count"), MetaId::from_name("a.counts"));
        assert_ne!(MetaId::from_name("a"), MetaId::from_name("A"));
    }

    #[test]
    fn known_value_is_stable() {
        // Pinned so a change of algorithm or seed shows up as a test failure.
        assert_eq!(MetaId::from_name(""), MetaId(0x02cc5d05));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(format!("{}", MetaId(0x1f)), "0x0000001f");
        assert_eq!(format!("{:?}", MetaId(-1)), "MetaId(0xffffffff)");
    }
}
