use ovum_core::MetaId;
use thiserror::Error;

/// Errors raised by strict registry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A library with the same name is already registered.
    #[error("library '{name}' ({id}) is already registered")]
    Duplicate { name: String, id: MetaId },
}
