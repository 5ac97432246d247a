//! Error types for value conversion and member access.

use thiserror::Error;

/// Errors converting between [`Value`](crate::Value) and Rust types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Value holds a different type than requested.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer value doesn't fit in the target type.
    #[error("integer overflow: {value} doesn't fit in {target_type}")]
    IntegerOverflow {
        value: i64,
        target_type: &'static str,
    },
}

/// Errors raised by property accessors and function invokers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemberError {
    /// A non-static member was accessed without a target instance.
    #[error("'{member}' is not static and needs a target instance")]
    MissingTarget { member: String },

    /// The target instance is not of the type the accessor was built for.
    #[error("accessor expects an instance of '{expected}', got '{actual}'")]
    WrongTarget {
        expected: &'static str,
        actual: &'static str,
    },

    /// The target is already locked by an accessor further up the stack.
    #[error("instance of '{instance}' is busy")]
    Busy { instance: &'static str },

    /// Static-only access on an instance member.
    #[error("'{member}' is not static")]
    NotStatic { member: String },

    #[error("'{member}' has no getter")]
    NotReadable { member: String },

    #[error("'{member}' has no setter")]
    NotAssignable { member: String },

    /// Argument slice is shorter than the invoker expects.
    #[error("argument {index} is missing")]
    MissingArgument { index: usize },

    /// A trailing parameter was omitted and declares no default.
    #[error("'{member}' parameter '{param}' has no default value")]
    NoDefault { member: String, param: String },

    #[error("'{member}' takes at most {expected} arguments, got {actual}")]
    TooManyArguments {
        member: String,
        expected: usize,
        actual: usize,
    },

    /// Function was declared without an invoker.
    #[error("'{member}' has no body")]
    Unbound { member: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Failure reported by a user accessor or function body.
    #[error("{0}")]
    Failed(String),
}

impl MemberError {
    pub fn failed(message: impl Into<String>) -> Self {
        MemberError::Failed(message.into())
    }
}
