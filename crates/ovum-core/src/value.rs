//! Dynamically typed values flowing through accessors and invokers.
//!
//! Properties and functions are reached through type-erased closures, so their
//! inputs and outputs travel as [`Value`]. The conversion traits move between
//! `Value` and concrete Rust types:
//! - [`FromValue`]: extract a Rust value from a [`Value`]
//! - [`IntoValue`]: wrap a Rust value in a [`Value`]
//!
//! ## Supported Types
//!
//! - Integers: `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32`
//! - Floats: `f32`, `f64`
//! - Boolean: `bool`
//! - Strings: `String` (and `&str` into values)
//! - Objects: [`Instance`], `Option<Instance>`
//! - Unit: `()` (void)
//!
//! ## Example
//!
//! ```
//! use ovum_core::{FromValue, IntoValue, Value};
//!
//! let value = 42i32.into_value();
//! assert_eq!(value, Value::Int(42));
//! assert_eq!(i64::from_value(&value), Ok(42));
//! ```

use std::fmt;

use crate::error::ConversionError;
use crate::instance::Instance;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value (result of a function returning nothing).
    #[default]
    Void,
    /// An explicitly empty object reference.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(Instance),
}

impl Value {
    /// Name of the held type, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Object(v) => write!(f, "Object({})", v.type_name()),
        }
    }
}

/// Extract a Rust value from a [`Value`].
pub trait FromValue: Sized {
    /// Returns a `ConversionError` if the value holds an incompatible type.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Wrap a Rust value in a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn mismatch(expected: &'static str, value: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        _ => Err(mismatch("int", value)),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

impl_value_int!(i8, i16, i32, i64, u8, u16, u32);

// ============================================================================
// Float implementations
// ============================================================================

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }
}

// ============================================================================
// Other primitives
// ============================================================================

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(*v),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for () {
    fn from_value(_value: &Value) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Void
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(v) => Ok(v.clone()),
            _ => Err(mismatch("string", value)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

// ============================================================================
// Objects
// ============================================================================

impl FromValue for Instance {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Object(v) => Ok(v.clone()),
            _ => Err(mismatch("object", value)),
        }
    }
}

impl IntoValue for Instance {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for Option<Instance> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Object(v) => Ok(Some(v.clone())),
            Value::Null | Value::Void => Ok(None),
            _ => Err(mismatch("object", value)),
        }
    }
}

impl IntoValue for Option<Instance> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => Value::Object(v),
            None => Value::Null,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_checks_bounds() {
        assert_eq!(i8::from_value(&Value::Int(127)), Ok(127));
        assert_eq!(
            i8::from_value(&Value::Int(128)),
            Err(ConversionError::IntegerOverflow {
                value: 128,
                target_type: "i8"
            })
        );
        assert!(u32::from_value(&Value::Int(-1)).is_err());
    }

    #[test]
    fn mismatch_reports_actual_type() {
        assert_eq!(
            bool::from_value(&Value::Int(1)),
            Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: "int"
            })
        );
    }

    #[test]
    fn floats_accept_ints() {
        assert_eq!(f64::from_value(&Value::Int(2)), Ok(2.0));
        assert_eq!(1.5f32.into_value(), Value::Float(1.5));
    }

    #[test]
    fn strings() {
        assert_eq!("hi".into_value(), Value::String("hi".into()));
        assert_eq!(String::from_value(&Value::String("x".into())), Ok("x".to_string()));
    }

    #[test]
    fn optional_instance() {
        assert_eq!(Option::<Instance>::from_value(&Value::Null), Ok(None));
        let instance = Instance::new(5u8);
        let value = Some(instance.clone()).into_value();
        assert_eq!(value.as_instance(), Some(&instance));
        assert_eq!(None::<Instance>.into_value(), Value::Null);
    }

    #[test]
    fn unit_is_void() {
        assert!(().into_value().is_void());
        assert_eq!(Value::default(), Value::Void);
    }
}
