//! Member descriptors and the per-library member catalogues.
//!
//! A library owns two [`Members`] collections, one of [`Property`] and one of
//! [`Function`]. Each member carries a [`Meta`] (name, hashed id and
//! presentation), flags, a weak link to the library that declared it, its own
//! [`Components`] database, and the closures that actually touch the
//! underlying Rust value.
//!
//! # Inheritance
//!
//! A derived library's collections are seeded with every entry of its parent's
//! collections before its own members are added. The inherited entries are the
//! parent's descriptors, shared by `Arc`. A derived member with the same name
//! replaces the inherited one in the derived catalogue only.

mod function;
mod property;

pub use function::{Function, FunctionBuilder, Param, arg};
pub use property::{Property, PropertyBuilder};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use bitflags::bitflags;
use parking_lot::RwLock;
use tracing::{error, warn};

use crate::component::Marker;
use crate::{Components, Library, Meta, MetaId};

bitflags! {
    /// Capabilities of a member, fixed when it is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// Accessed without a target instance.
        const STATIC = 1 << 0;
        /// Property has a getter.
        const READABLE = 1 << 1;
        /// Property has a setter.
        const ASSIGNABLE = 1 << 2;
    }
}

/// State shared by every kind of member.
#[derive(Debug)]
pub struct MemberBase {
    meta: Meta,
    flags: MemberFlags,
    owner: OnceLock<Weak<Library>>,
}

impl MemberBase {
    pub(crate) fn new(meta: Meta, flags: MemberFlags) -> Self {
        Self {
            meta,
            flags,
            owner: OnceLock::new(),
        }
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// The library that declared this member, if it is still alive.
    pub fn owner(&self) -> Option<Arc<Library>> {
        self.owner.get().and_then(Weak::upgrade)
    }

    /// Id of the declaring library, if it is still alive.
    pub fn owner_id(&self) -> Option<MetaId> {
        self.owner().map(|library| library.id())
    }

    /// The first library to adopt a member becomes its owner; later adoptions
    /// (inheritance) leave it untouched.
    pub(crate) fn adopt(&self, owner: &Weak<Library>) {
        let _ = self.owner.set(owner.clone());
    }
}

/// Common surface of [`Property`] and [`Function`].
pub trait Member: Send + Sync + Sized + 'static {
    /// Short kind name used in diagnostics.
    const KIND: &'static str;

    fn base(&self) -> &MemberBase;

    fn components(&self) -> &Components<Self>;

    fn meta(&self) -> &Meta {
        self.base().meta()
    }

    fn name(&self) -> &str {
        self.base().meta().name()
    }

    fn id(&self) -> MetaId {
        self.base().meta().id()
    }

    fn is_static(&self) -> bool {
        self.base().flags().contains(MemberFlags::STATIC)
    }

    fn owner(&self) -> Option<Arc<Library>> {
        self.base().owner()
    }
}

/// A freshly built member whose declared components are not attached yet.
pub(crate) struct Pending<M: Member> {
    pub(crate) member: Arc<M>,
    markers: Vec<Marker<M>>,
}

impl<M: Member> Pending<M> {
    pub(crate) fn new(member: Arc<M>, markers: Vec<Marker<M>>) -> Self {
        Self { member, markers }
    }

    pub(crate) fn attach(self) -> Arc<M> {
        for marker in self.markers {
            marker(self.member.components());
        }
        self.member
    }
}

/// Catalogue of one library's members, sorted and deduplicated by id.
pub struct Members<M: Member> {
    owner: Weak<Library>,
    storage: RwLock<BTreeMap<MetaId, Arc<M>>>,
}

impl<M: Member> Members<M> {
    pub(crate) fn new(owner: Weak<Library>) -> Self {
        Self {
            owner,
            storage: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add a member, replacing any entry with the same id.
    ///
    /// The member is adopted by this collection's library unless another
    /// library already owns it. Returns the replaced entry.
    pub fn add(&self, item: Arc<M>) -> Option<Arc<M>> {
        item.base().adopt(&self.owner);
        let previous = self.storage.write().insert(item.id(), item.clone());
        if previous.is_some() {
            warn!(
                kind = M::KIND,
                member = item.name(),
                id = %item.id(),
                "replacing member"
            );
        }
        previous
    }

    /// Copy every entry of `parent` into this collection.
    pub fn add_inherited(&self, parent: &Members<M>) {
        for item in parent.iter() {
            self.add(item);
        }
    }

    /// Look up by hashed id. A miss is logged.
    pub fn get(&self, id: MetaId) -> Option<Arc<M>> {
        let found = self.storage.read().get(&id).cloned();
        if found.is_none() {
            error!(kind = M::KIND, %id, "member not found");
        }
        found
    }

    /// Look up by canonical name. A miss is logged.
    pub fn find(&self, name: &str) -> Option<Arc<M>> {
        let found = self.storage.read().get(&MetaId::from_name(name)).cloned();
        if found.is_none() {
            error!(kind = M::KIND, member = name, "member not found");
        }
        found
    }

    pub fn contains(&self, id: MetaId) -> bool {
        self.storage.read().contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.contains(MetaId::from_name(name))
    }

    pub fn remove(&self, id: MetaId) -> Option<Arc<M>> {
        self.storage.write().remove(&id)
    }

    /// Snapshot of all members in id order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<M>> + use<M> {
        self.storage
            .read()
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }
}

impl<M: Member> fmt::Debug for Members<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.storage.read().values().map(|m| m.name().to_string()))
            .finish()
    }
}
