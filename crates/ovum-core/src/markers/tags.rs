use crate::{Component, Function, Library, Property};

/// Free-form string tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    pub fn has(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Component<Library> for Tags {
    fn is_singleton(&self) -> bool {
        true
    }
}

impl Component<Property> for Tags {
    fn is_singleton(&self) -> bool {
        true
    }
}

impl Component<Function> for Tags {
    fn is_singleton(&self) -> bool {
        true
    }
}

/// Ordering hint. Lower values come first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Order(pub i32);

impl Component<Library> for Order {
    fn is_singleton(&self) -> bool {
        true
    }
}

impl Component<Function> for Order {
    fn is_singleton(&self) -> bool {
        true
    }
}
