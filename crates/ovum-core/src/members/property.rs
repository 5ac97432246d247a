//! Property descriptors and their accessors.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use super::{Member, MemberBase, MemberFlags, Pending};
use crate::component::{Marker, marker};
use crate::naming::{to_programmer_case, to_title_case};
use crate::{
    Component, Components, FromValue, Instance, IntoValue, MemberError, Meta, TypeHandle, Value,
};

type Getter = Arc<dyn Fn(Option<&Instance>) -> Result<Value, MemberError> + Send + Sync>;
type Setter = Arc<dyn Fn(Option<&Instance>, Value) -> Result<(), MemberError> + Send + Sync>;

/// A readable and/or writable value on a library's type.
///
/// Access goes through closures captured when the property was built, so a
/// read is one indirect call plus a [`Value`] conversion. Static properties
/// ignore the target; instance properties require one.
pub struct Property {
    base: MemberBase,
    declared_type: TypeHandle,
    getter: Option<Getter>,
    setter: Option<Setter>,
    components: Components<Property>,
}

impl Property {
    /// Start building a property for the member named `member`.
    pub fn builder(member: impl Into<String>) -> PropertyBuilder {
        PropertyBuilder::new(member.into())
    }

    /// The value type stored or returned.
    pub fn declared_type(&self) -> TypeHandle {
        self.declared_type
    }

    pub fn is_readable(&self) -> bool {
        self.base.flags().contains(MemberFlags::READABLE)
    }

    pub fn is_assignable(&self) -> bool {
        self.base.flags().contains(MemberFlags::ASSIGNABLE)
    }

    // ==========================================================================
    // Access
    // ==========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_get(&self, target: Option<&Instance>) -> Result<Value, MemberError> {
        let getter = self.getter.as_ref().ok_or_else(|| MemberError::NotReadable {
            member: self.name().to_string(),
        })?;
        getter(self.target(target)?)
    }

    pub fn try_set(&self, target: Option<&Instance>, value: impl IntoValue) -> Result<(), MemberError> {
        let setter = self.setter.as_ref().ok_or_else(|| MemberError::NotAssignable {
            member: self.name().to_string(),
        })?;
        setter(self.target(target)?, value.into_value())
    }

    /// Read the property. Failures are logged and yield [`Value::Void`].
    pub fn get(&self, target: Option<&Instance>) -> Value {
        self.try_get(target).unwrap_or_else(|err| {
            self.report("read", &err);
            Value::default()
        })
    }

    /// Read and convert. Failures are logged and yield `None`.
    pub fn get_as<V: FromValue>(&self, target: Option<&Instance>) -> Option<V> {
        let result = self
            .try_get(target)
            .and_then(|value| V::from_value(&value).map_err(MemberError::from));
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report("read", &err);
                None
            }
        }
    }

    /// Write the property. Failures are logged and the write is dropped.
    pub fn set(&self, target: Option<&Instance>, value: impl IntoValue) {
        if let Err(err) = self.try_set(target, value) {
            self.report("write", &err);
        }
    }

    /// Value of a static property.
    pub fn value(&self) -> Value {
        if !self.is_static() {
            self.report_not_static();
            return Value::default();
        }
        self.get(None)
    }

    /// Assign a static property.
    pub fn set_value(&self, value: impl IntoValue) {
        if !self.is_static() {
            self.report_not_static();
            return;
        }
        self.set(None, value);
    }

    fn target<'a>(&self, target: Option<&'a Instance>) -> Result<Option<&'a Instance>, MemberError> {
        if self.is_static() {
            return Ok(None);
        }
        match target {
            Some(target) => Ok(Some(target)),
            None => Err(MemberError::MissingTarget {
                member: self.name().to_string(),
            }),
        }
    }

    fn report(&self, action: &str, err: &MemberError) {
        error!(property = self.name(), action, %err, "property access failed");
    }

    fn report_not_static(&self) {
        let err = MemberError::NotStatic {
            member: self.name().to_string(),
        };
        self.report("static access", &err);
    }
}

impl Member for Property {
    const KIND: &'static str = "property";

    fn base(&self) -> &MemberBase {
        &self.base
    }

    fn components(&self) -> &Components<Self> {
        &self.components
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name())
            .field("id", &self.id())
            .field("flags", &self.base.flags())
            .field("declared_type", &self.declared_type)
            .finish()
    }
}

/// Builder for [`Property`].
///
/// The canonical name is `"{prefix}.{member}"` in programmer case, where the
/// prefix comes from the declaring library, unless [`PropertyBuilder::name`]
/// overrides it.
pub struct PropertyBuilder {
    member: String,
    name: Option<String>,
    title: Option<String>,
    group: Option<String>,
    help: Option<String>,
    is_static: bool,
    declared_type: TypeHandle,
    getter: Option<Getter>,
    setter: Option<Setter>,
    markers: Vec<Marker<Property>>,
}

impl PropertyBuilder {
    fn new(member: String) -> Self {
        Self {
            member,
            name: None,
            title: None,
            group: None,
            help: None,
            is_static: false,
            declared_type: TypeHandle::of::<Value>(),
            getter: None,
            setter: None,
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

    /// Attach a component once the property is built.
    pub fn component<C: Component<Property>>(mut self, component: C) -> Self {
        self.markers.push(marker(component));
        self
    }

    // ==========================================================================
    // Instance accessors
    // ==========================================================================

    /// Read-write field of `T`.
    pub fn field<T, V>(
        self,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        V: FromValue + IntoValue + 'static,
    {
        self.getter(get).setter(set)
    }

    /// Read accessor on `T`.
    pub fn getter<T, V>(mut self, get: impl Fn(&T) -> V + Send + Sync + 'static) -> Self
    where
        T: Any + Send + Sync,
        V: IntoValue + 'static,
    {
        self.is_static = false;
        self.declared_type = TypeHandle::of::<V>();
        self.getter = Some(Arc::new(move |target: Option<&Instance>| -> Result<Value, MemberError> {
            let target = target.ok_or(MemberError::WrongTarget {
                expected: type_name::<T>(),
                actual: "null",
            })?;
            target.try_read(|this: &T| get(this).into_value())
        }));
        self
    }

    /// Write accessor on `T`.
    pub fn setter<T, V>(mut self, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self
    where
        T: Any + Send + Sync,
        V: FromValue + 'static,
    {
        self.is_static = false;
        self.declared_type = TypeHandle::of::<V>();
        self.setter = Some(Arc::new(move |target: Option<&Instance>, value: Value| -> Result<(), MemberError> {
            let value = V::from_value(&value)?;
            let target = target.ok_or(MemberError::WrongTarget {
                expected: type_name::<T>(),
                actual: "null",
            })?;
            target.try_write(|this: &mut T| set(this, value))
        }));
        self
    }

    // ==========================================================================
    // Static accessors
    // ==========================================================================

    /// Read-write static value backed by caller-provided storage.
    pub fn static_field<V>(
        mut self,
        get: impl Fn() -> V + Send + Sync + 'static,
        set: impl Fn(V) + Send + Sync + 'static,
    ) -> Self
    where
        V: FromValue + IntoValue + 'static,
    {
        self = self.static_getter(get);
        self.setter = Some(Arc::new(move |_: Option<&Instance>, value: Value| -> Result<(), MemberError> {
            set(V::from_value(&value)?);
            Ok(())
        }));
        self
    }

    /// Read-only static value.
    pub fn static_getter<V>(mut self, get: impl Fn() -> V + Send + Sync + 'static) -> Self
    where
        V: IntoValue + 'static,
    {
        self.is_static = true;
        self.declared_type = TypeHandle::of::<V>();
        self.getter = Some(Arc::new(move |_: Option<&Instance>| Ok(get().into_value())));
        self
    }

    /// Read-write static value that owns its storage, starting at `initial`.
    pub fn stored<V>(self, initial: V) -> Self
    where
        V: FromValue + IntoValue + Clone + Send + Sync + 'static,
    {
        let cell = Arc::new(RwLock::new(initial));
        let read = cell.clone();
        self.static_field(move || read.read().clone(), move |value| *cell.write() = value)
    }

    // ==========================================================================
    // Build
    // ==========================================================================

    /// Build a standalone property. Without an explicit name, the member name
    /// is used unprefixed.
    pub fn build(self) -> Arc<Property> {
        self.build_pending(None).attach()
    }

    pub(crate) fn build_pending(self, prefix: Option<&str>) -> Pending<Property> {
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
        flags.set(MemberFlags::READABLE, self.getter.is_some());
        flags.set(MemberFlags::ASSIGNABLE, self.setter.is_some());

        let (declared_type, getter, setter) = (self.declared_type, self.getter, self.setter);
        let property = Arc::new_cyclic(|weak| Property {
            base: MemberBase::new(meta, flags),
            declared_type,
            getter,
            setter,
            components: Components::new(weak.clone()),
        });
        Pending::new(property, self.markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        count: i64,
        label: String,
    }

    fn count() -> Arc<Property> {
        Property::builder("count")
            .name("counter.count")
            .field(|c: &Counter| c.count, |c: &mut Counter, v: i64| c.count = v)
            .build()
    }

    #[test]
    fn instance_field_round_trips_through_target() {
        let property = count();
        let instance = Instance::new(Counter::default());

        property.set(Some(&instance), 7i64);
        assert_eq!(property.get(Some(&instance)), Value::Int(7));
        assert_eq!(instance.read(|c: &Counter| c.count), Some(7));
        assert!(property.is_readable());
        assert!(property.is_assignable());
        assert!(!property.is_static());
        assert_eq!(property.declared_type(), TypeHandle::of::<i64>());
    }

    #[test]
    fn instance_member_without_target_returns_default() {
        let property = count();
        assert_eq!(property.get(None), Value::Void);
        assert!(matches!(
            property.try_get(None),
            Err(MemberError::MissingTarget { .. })
        ));
        assert!(matches!(
            property.try_set(None, 1i64),
            Err(MemberError::MissingTarget { .. })
        ));
    }

    #[test]
    fn wrong_target_type_is_an_error() {
        let property = count();
        let other = Instance::new(String::from("not a counter"));
        assert!(matches!(
            property.try_get(Some(&other)),
            Err(MemberError::WrongTarget { .. })
        ));
    }

    #[test]
    fn read_only_property_ignores_writes() {
        let property = Property::builder("label")
            .getter(|c: &Counter| c.label.clone())
            .build();
        let instance = Instance::new(Counter {
            count: 0,
            label: "x".into(),
        });

        assert!(!property.is_assignable());
        property.set(Some(&instance), "y");
        assert_eq!(property.get_as::<String>(Some(&instance)), Some("x".to_string()));
        assert!(matches!(
            property.try_set(Some(&instance), "y"),
            Err(MemberError::NotAssignable { .. })
        ));
    }

    #[test]
    fn stored_static_ignores_target() {
        let property = Property::builder("count").name("a.count").stored(0i64).build();
        let unrelated = Instance::new(5u8);

        property.set(Some(&unrelated), 5i64);
        assert_eq!(property.get(None), Value::Int(5));
        assert_eq!(property.value(), Value::Int(5));
        property.set_value(6i64);
        assert_eq!(property.get_as::<i64>(Some(&unrelated)), Some(6));
    }

    #[test]
    fn static_access_on_instance_member_is_rejected() {
        let property = count();
        assert_eq!(property.value(), Value::Void);
    }

    #[test]
    fn conversion_failure_drops_write() {
        let property = Property::builder("count").name("a.count").stored(1i64).build();
        assert!(matches!(
            property.try_set(None, "seven"),
            Err(MemberError::Conversion(_))
        ));
        property.set(None, true);
        assert_eq!(property.get_as::<i64>(None), Some(1));
        assert_eq!(property.get_as::<bool>(None), None);
    }

    #[test]
    fn names_and_presentation() {
        let property = Property::builder("MaxHealth")
            .help("Upper bound")
            .stored(100i32)
            .build_pending(Some("units.player"))
            .attach();
        assert_eq!(property.name(), "player.max_health");
        assert_eq!(property.meta().title(), "Max Health");
        assert_eq!(property.meta().help(), "Upper bound");
        assert!(property.owner().is_none());
    }

    #[test]
    fn declared_components_are_attached() {
        struct Hidden;
        impl Component<Property> for Hidden {}

        let property = Property::builder("secret").component(Hidden).stored(0i64).build();
        assert!(property.components().has::<Hidden>());
    }
}
