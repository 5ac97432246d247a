use std::sync::Arc;

use tracing::{error, info};

use crate::members::Member;
use crate::{Component, Instance, Library, Value};

/// Names a static function that constructs instances of its library.
///
/// The function is resolved in the library's function catalogue, either by
/// full canonical name (`"player.spawn"`) or by member name (`"spawn"`). It is
/// called without arguments, so its parameters must have defaults, and must
/// return a [`Value::Object`].
#[derive(Debug, Clone)]
pub struct Constructor {
    function: String,
}

impl Constructor {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Canonical name of the constructor function on `library`.
    pub fn resolve(&self, library: &Library) -> String {
        if self.function.contains('.') {
            self.function.clone()
        } else {
            library.member_name(&self.function)
        }
    }

    /// Call the constructor function. `None` means the default initializer
    /// should be used instead.
    pub fn construct(&self, library: &Library) -> Option<Instance> {
        let name = self.resolve(library);
        if !library.functions().contains_name(&name) {
            return None;
        }
        let function = library.functions().find(&name)?;

        match function.invoke(None, &[]) {
            Ok(Value::Object(instance)) => Some(instance),
            Ok(other) => {
                error!(
                    library = library.name(),
                    function = function.name(),
                    returned = other.type_name(),
                    "constructor did not return an object"
                );
                None
            }
            Err(err) => {
                error!(
                    library = library.name(),
                    function = function.name(),
                    %err,
                    "constructor failed"
                );
                None
            }
        }
    }
}

impl Component<Library> for Constructor {
    fn is_singleton(&self) -> bool {
        true
    }

    fn on_attached(&self, owner: &Arc<Library>) {
        let name = self.resolve(owner);
        if !owner.functions().contains_name(&name) {
            info!(
                library = owner.name(),
                function = %name,
                "constructor function not found, default initializer will be used"
            );
        }
    }
}
