//! Identity and presentation shared by libraries and members.

use parking_lot::RwLock;

use crate::MetaId;

/// Canonical name, hashed id and mutable presentation data.
///
/// `name` and `id` are fixed at construction. `title`, `group` and `help` are
/// presentation only and may be changed at any time.
#[derive(Debug)]
pub struct Meta {
    name: String,
    id: MetaId,
    title: RwLock<String>,
    group: RwLock<String>,
    help: RwLock<String>,
}

impl Meta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: MetaId::from_name(&name),
            name,
            title: RwLock::new(String::new()),
            group: RwLock::new(String::new()),
            help: RwLock::new(String::new()),
        }
    }

    pub(crate) fn with_presentation(
        name: impl Into<String>,
        title: String,
        group: String,
        help: String,
    ) -> Self {
        let meta = Self::new(name);
        *meta.title.write() = title;
        *meta.group.write() = group;
        *meta.help.write() = help;
        meta
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> MetaId {
        self.id
    }

    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
    }

    pub fn group(&self) -> String {
        self.group.read().clone()
    }

    pub fn set_group(&self, group: impl Into<String>) {
        *self.group.write() = group.into();
    }

    pub fn help(&self) -> String {
        self.help.read().clone()
    }

    pub fn set_help(&self, help: impl Into<String>) {
        *self.help.write() = help.into();
    }
}
