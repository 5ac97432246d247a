//! Function descriptors and their invokers.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::error;

use super::{Member, MemberBase, MemberFlags, Pending};
use crate::component::{Marker, marker};
use crate::naming::{to_programmer_case, to_title_case};
use crate::{
    Component, Components, FromValue, Instance, IntoValue, MemberError, Meta, TypeHandle, Value,
};

type Invoker = Arc<dyn Fn(Option<&Instance>, &[Value]) -> Result<Value, MemberError> + Send + Sync>;

/// A declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub declared_type: TypeHandle,
    /// Used when a call omits this parameter.
    pub default: Option<Value>,
}

/// Extract and convert argument `index`.
///
/// ```
/// use ovum_core::{Value, arg};
///
/// let args = [Value::Int(3)];
/// assert_eq!(arg::<i32>(&args, 0), Ok(3));
/// assert!(arg::<i32>(&args, 1).is_err());
/// ```
pub fn arg<V: FromValue>(args: &[Value], index: usize) -> Result<V, MemberError> {
    let value = args
        .get(index)
        .ok_or(MemberError::MissingArgument { index })?;
    Ok(V::from_value(value)?)
}

/// A callable member of a library's type.
pub struct Function {
    base: MemberBase,
    params: Vec<Param>,
    returns: TypeHandle,
    invoker: Option<Invoker>,
    components: Components<Function>,
}

impl Function {
    /// Start building a function for the member named `member`.
    pub fn builder(member: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder::new(member.into())
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn returns(&self) -> TypeHandle {
        self.returns
    }

    /// Invoke with `args`, filling omitted trailing parameters from their
    /// defaults. Static functions ignore `target`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(&self, target: Option<&Instance>, args: &[Value]) -> Result<Value, MemberError> {
        let invoker = self.invoker.as_ref().ok_or_else(|| MemberError::Unbound {
            member: self.name().to_string(),
        })?;

        let target = match (self.is_static(), target) {
            (true, _) => None,
            (false, Some(target)) => Some(target),
            (false, None) => {
                return Err(MemberError::MissingTarget {
                    member: self.name().to_string(),
                });
            }
        };

        if args.len() > self.params.len() {
            return Err(MemberError::TooManyArguments {
                member: self.name().to_string(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        if args.len() == self.params.len() {
            return invoker(target, args);
        }

        let mut full = Vec::with_capacity(self.params.len());
        full.extend_from_slice(args);
        for param in &self.params[args.len()..] {
            match &param.default {
                Some(default) => full.push(default.clone()),
                None => {
                    return Err(MemberError::NoDefault {
                        member: self.name().to_string(),
                        param: param.name.clone(),
                    });
                }
            }
        }
        invoker(target, &full)
    }

    /// Invoke, logging any failure and returning [`Value::Void`] in its place.
    pub fn call(&self, target: Option<&Instance>, args: &[Value]) -> Value {
        self.invoke(target, args).unwrap_or_else(|err| {
            error!(function = self.name(), %err, "function call failed");
            Value::default()
        })
    }
}

impl Member for Function {
    const KIND: &'static str = "function";

    fn base(&self) -> &MemberBase {
        &self.base
    }

    fn components(&self) -> &Components<Self> {
        &self.components
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("id", &self.id())
            .field("static", &self.is_static())
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Builder for [`Function`].
pub struct FunctionBuilder {
    member: String,
    name: Option<String>,
    title: Option<String>,
    group: Option<String>,
    help: Option<String>,
    is_static: bool,
    params: Vec<Param>,
    returns: TypeHandle,
    invoker: Option<Invoker>,
    markers: Vec<Marker<Function>>,
}

impl FunctionBuilder {
    fn new(member: String) -> Self {
        Self {
            member,
            name: None,
            title: None,
            group: None,
            help: None,
            is_static: true,
            params: Vec::new(),
            returns: TypeHandle::of::<()>(),
            invoker: None,
            markers: Vec::new(),
        }
    }

    /// Explicit canonical name, bypassing prefix derivation.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Declare a required parameter.
    pub fn param<V: 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            declared_type: TypeHandle::of::<V>(),
            default: None,
        });
        self
    }

    /// Declare a parameter that may be omitted.
    pub fn param_or<V: IntoValue + 'static>(mut self, name: impl Into<String>, default: V) -> Self {
        self.params.push(Param {
            name: name.into(),
            declared_type: TypeHandle::of::<V>(),
            default: Some(default.into_value()),
        });
        self
    }

    pub fn returns<V: 'static>(mut self) -> Self {
        self.returns = TypeHandle::of::<V>();
        self
    }

    /// Static body. Receives the full argument list.
    pub fn static_fn<R: IntoValue>(
        mut self,
        body: impl Fn(&[Value]) -> Result<R, MemberError> + Send + Sync + 'static,
    ) -> Self {
        self.is_static = true;
        self.invoker = Some(Arc::new(
            move |_: Option<&Instance>, args: &[Value]| -> Result<Value, MemberError> {
                body(args).map(IntoValue::into_value)
            },
        ));
        self
    }

    /// Instance body on `T`. The target is locked for the duration of the call.
    pub fn method<T, R>(
        mut self,
        body: impl Fn(&mut T, &[Value]) -> Result<R, MemberError> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        R: IntoValue,
    {
        self.is_static = false;
        self.invoker = Some(Arc::new(
            move |target: Option<&Instance>, args: &[Value]| -> Result<Value, MemberError> {
                let target = target.ok_or(MemberError::WrongTarget {
                    expected: type_name::<T>(),
                    actual: "null",
                })?;
                let result = target.try_write(|this: &mut T| body(this, args))??;
                Ok(result.into_value())
            },
        ));
        self
    }

    /// Attach a component once the function is built.
    pub fn component<C: Component<Function>>(mut self, component: C) -> Self {
        self.markers.push(marker(component));
        self
    }

    /// Build a standalone function. Without an explicit name, the member name
    /// is used unprefixed.
    pub fn build(self) -> Arc<Function> {
        self.build_pending(None).attach()
    }

    pub(crate) fn build_pending(self, prefix: Option<&str>) -> Pending<Function> {
        let name = self
            .name
            .unwrap_or_else(|| to_programmer_case(&self.member, prefix));
        let title = self.title.unwrap_or_else(|| to_title_case(&self.member));
        let meta = Meta::with_presentation(
            name,
            title,
            self.group.unwrap_or_default(),
            self.help.unwrap_or_default(),
        );

        let mut flags = MemberFlags::empty();
        flags.set(MemberFlags::STATIC, self.is_static);

        let (params, returns, invoker) = (self.params, self.returns, self.invoker);
        let function = Arc::new_cyclic(|weak| Function {
            base: MemberBase::new(meta, flags),
            params,
            returns,
            invoker,
            components: Components::new(weak.clone()),
        });
        Pending::new(function, self.markers)
    }
}
