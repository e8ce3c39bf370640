//! JavaScript object representation
//!
//! An [`Object`] is an identity-stable handle. Behind it sits exactly one
//! [`Representation`] at a time: a generic object, a sparse array or a dense
//! array (or a lazy placeholder, see [`crate::runtime::lazy`]). Every
//! operation resolves the current representation through the handle, so a
//! representation swap is never observable as a change of identity.
//!
//! Representations implement [`ObjectImpl`]. They never call back into
//! JavaScript-visible code themselves: operations that need to run a getter
//! or setter, or to swap the representation, return that intent to the
//! handle, which acts on it after releasing its borrow.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{JsError, JsResult, reject};
use crate::runtime::array::ArrayObject;
use crate::runtime::enumerate::PropertyIter;
use crate::runtime::index::str_to_index;
use crate::runtime::lazy::{LazyObject, ShellState};
use crate::runtime::length::{ArrayLength, to_length};
use crate::runtime::property::{
    Property, PropertyDescriptor, PropertyKey, PropertyTable, SlotValue, apply_descriptor,
};
use crate::runtime::sparse::SparseArrayObject;
use crate::value::{ExportType, Exported, Function, Value};

/// Outcome of a write, as decided by a representation
pub enum Assignment {
    /// The write completed (or was rejected without throwing)
    Stored(bool),
    /// The write must be carried out by calling this setter
    Setter(Object),
}

/// Result of an operation that may swap representations
pub enum Step<T> {
    /// The operation completed
    Done(T),
    /// Install this representation, then repeat the operation against it
    Replace(Representation),
}

/// Preferred type for primitive conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Default,
    Number,
    String,
}

/// The operations every representation provides
///
/// Named properties and the prototype/extensibility state live in the
/// [`BaseObject`] each representation embeds; the default methods cover
/// those. Array representations override the indexed paths.
pub trait ObjectImpl {
    fn base(&self) -> &BaseObject;

    fn base_mut(&mut self) -> &mut BaseObject;

    fn class_name(&self) -> &'static str {
        self.base().class_name()
    }

    /// The own property stored under `key`, without running accessors
    fn get_own_property(&self, key: &PropertyKey) -> Option<SlotValue>;

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Assign `value` to `key`
    ///
    /// `inherited` is the attributed property found on the prototype chain
    /// when the object has no own property under `key`.
    fn put(
        &mut self,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Step<Assignment>>;

    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>>;

    fn delete(&mut self, key: &PropertyKey, throw: bool) -> JsResult<bool>;

    /// The first own indexed property with index greater than `after`
    fn next_index_entry(&self, after: Option<u32>) -> Option<(u32, SlotValue)> {
        self.base().next_named_index(after)
    }

    /// The non-index property at enumeration position `pos` or later, with
    /// the position to resume from
    fn string_entry(&self, pos: usize) -> Option<(usize, Rc<str>, SlotValue)> {
        self.base().next_named_string(pos)
    }

    fn export(&self) -> JsResult<Exported>;

    fn export_type(&self) -> ExportType;

    /// One past the highest index the sort routine has to look at
    fn sort_len(&self) -> u32;

    /// Raw element for the sort routine; holes are `None`
    fn sort_get(&self, index: u32) -> Option<SlotValue>;

    /// Exchange two elements for the sort routine
    fn swap(&mut self, i: u32, j: u32);
}

/// Generic object: named properties, prototype, extensibility, callability
pub struct BaseObject {
    class: &'static str,
    pub(crate) prototype: Option<Object>,
    pub(crate) extensible: bool,
    pub(crate) properties: PropertyTable,
    call: Option<Function>,
}

impl BaseObject {
    /// Create an empty, extensible object
    pub fn new(class: &'static str, prototype: Option<Object>) -> Self {
        BaseObject {
            class,
            prototype,
            extensible: true,
            properties: PropertyTable::new(),
            call: None,
        }
    }

    /// Create a callable object
    pub fn function(call: Function, prototype: Option<Object>) -> Self {
        BaseObject {
            call: Some(call),
            ..Self::new("Function", prototype)
        }
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.class
    }

    #[inline]
    pub fn prototype(&self) -> Option<&Object> {
        self.prototype.as_ref()
    }

    pub(crate) fn set_prototype(&mut self, prototype: Option<Object>) {
        self.prototype = prototype;
    }

    #[inline]
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    #[inline]
    pub fn callable(&self) -> Option<&Function> {
        self.call.as_ref()
    }

    /// Store a named property without any checks (builtin setup)
    pub fn put_raw(&mut self, name: &str, value: SlotValue) {
        self.properties.set(Rc::from(name), value);
    }

    pub(crate) fn get_named(&self, name: &str) -> Option<SlotValue> {
        self.properties.get(name).cloned()
    }

    pub(crate) fn put_named(
        &mut self,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Assignment> {
        let name = key.name();
        if let Some(slot) = self.properties.get_mut(&name) {
            return assign_existing(slot, value, throw, key);
        }
        if let Some(settled) = gate_new_property(inherited, self.extensible, throw, key)? {
            return Ok(settled);
        }
        self.properties.set(name, SlotValue::Plain(value));
        Ok(Assignment::Stored(true))
    }

    pub(crate) fn define_named(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let name = key.name();
        let existing = self.properties.get(&name);
        let Some(slot) = apply_descriptor(key, existing, self.extensible, desc, throw)? else {
            return Ok(false);
        };
        self.properties.set(name, slot);
        Ok(true)
    }

    pub(crate) fn delete_named(&mut self, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        let name = key.name();
        match self.properties.get(&name) {
            None => Ok(true),
            Some(slot) if !slot.is_configurable() => reject(throw, self.cannot_delete(key)),
            Some(_) => {
                self.properties.delete(&name);
                Ok(true)
            }
        }
    }

    pub(crate) fn cannot_delete(&self, key: &PropertyKey) -> JsError {
        JsError::DeleteRejected(format!(
            "Cannot delete property '{}' of [object {}]",
            key, self.class
        ))
    }

    /// The index-named property with the smallest index above `after`
    ///
    /// Generic objects keep index names in the named table, so this is a scan.
    pub(crate) fn next_named_index(&self, after: Option<u32>) -> Option<(u32, SlotValue)> {
        self.properties
            .iter()
            .filter_map(|(name, slot)| str_to_index(name).map(|index| (index, slot)))
            .filter(|(index, _)| after.is_none_or(|a| *index > a))
            .min_by_key(|(index, _)| *index)
            .map(|(index, slot)| (index, slot.clone()))
    }

    /// The first non-index property at table position `pos` or later, with
    /// the position after it
    pub(crate) fn next_named_string(&self, mut pos: usize) -> Option<(usize, Rc<str>, SlotValue)> {
        while let Some((p, name, slot)) = self.properties.next_live(pos) {
            if str_to_index(name).is_none() {
                return Some((p + 1, name.clone(), slot.clone()));
            }
            pos = p + 1;
        }
        None
    }

    /// Export enumerable named properties in insertion order
    pub(crate) fn export_map(&self) -> JsResult<Exported> {
        let mut entries = Vec::with_capacity(self.properties.len());
        for (name, slot) in self.properties.iter() {
            if slot.is_enumerable() {
                entries.push((name.to_string(), slot.export()?));
            }
        }
        Ok(Exported::Map(entries))
    }
}

impl Default for BaseObject {
    fn default() -> Self {
        Self::new("Object", None)
    }
}

/// Write to an existing own slot, honoring its attributes
pub(crate) fn assign_existing(
    slot: &mut SlotValue,
    value: Value,
    throw: bool,
    key: &PropertyKey,
) -> JsResult<Assignment> {
    match slot {
        SlotValue::Plain(v) => {
            *v = value;
            Ok(Assignment::Stored(true))
        }
        SlotValue::Property(p) => {
            if !p.is_writable() {
                return reject(throw, read_only(key)).map(Assignment::Stored);
            }
            if p.accessor {
                return Ok(match &p.setter {
                    Some(setter) => Assignment::Setter(setter.clone()),
                    None => Assignment::Stored(false),
                });
            }
            p.value = value;
            Ok(Assignment::Stored(true))
        }
    }
}

/// Apply the rules that guard creation of a new own property: a read-only
/// or accessor property on the prototype chain, and extensibility
///
/// Returns `Some` when the write is settled without creating a property.
pub(crate) fn gate_new_property(
    inherited: Option<&Property>,
    extensible: bool,
    throw: bool,
    key: &PropertyKey,
) -> JsResult<Option<Assignment>> {
    if let Some(p) = inherited {
        if !p.is_writable() {
            return reject(throw, read_only(key)).map(|ok| Some(Assignment::Stored(ok)));
        }
        if p.accessor {
            return Ok(p.setter.clone().map(Assignment::Setter));
        }
    }
    if !extensible {
        let err = JsError::WriteRejected(format!(
            "Cannot add property {}, object is not extensible",
            key
        ));
        return reject(throw, err).map(|ok| Some(Assignment::Stored(ok)));
    }
    Ok(None)
}

fn read_only(key: &PropertyKey) -> JsError {
    JsError::WriteRejected(format!("Cannot assign to read only property '{}'", key))
}

/// Named enumeration for arrays: `length` first, then the named table
pub(crate) fn array_string_entry(
    base: &BaseObject,
    length: &ArrayLength,
    pos: usize,
) -> Option<(usize, Rc<str>, SlotValue)> {
    if pos == 0 {
        return Some((1, Rc::from("length"), SlotValue::Property(length.property())));
    }
    base.next_named_string(pos - 1)
        .map(|(next, name, slot)| (next + 1, name, slot))
}

impl ObjectImpl for BaseObject {
    fn base(&self) -> &BaseObject {
        self
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        self
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<SlotValue> {
        self.get_named(&key.name())
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.has(&key.name())
    }

    fn put(
        &mut self,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Step<Assignment>> {
        self.put_named(key, value, throw, inherited).map(Step::Done)
    }

    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>> {
        self.define_named(key, desc, throw).map(Step::Done)
    }

    fn delete(&mut self, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        self.delete_named(key, throw)
    }

    fn export(&self) -> JsResult<Exported> {
        if self.call.is_some() {
            return Ok(Exported::Function);
        }
        self.export_map()
    }

    fn export_type(&self) -> ExportType {
        if self.call.is_some() {
            ExportType::Function
        } else {
            ExportType::Map
        }
    }

    fn sort_len(&self) -> u32 {
        self.properties
            .get("length")
            .and_then(|slot| to_length(&slot.raw_value()))
            .unwrap_or(0)
    }

    fn sort_get(&self, index: u32) -> Option<SlotValue> {
        self.get_named(&index.to_string())
    }

    fn swap(&mut self, i: u32, j: u32) {
        let (ki, kj) = (i.to_string(), j.to_string());
        if let (Some(a), Some(b)) = (self.get_named(&ki), self.get_named(&kj)) {
            self.properties.set(Rc::from(ki), b);
            self.properties.set(Rc::from(kj), a);
        }
    }
}

/// The concrete storage strategy behind an object handle
pub enum Representation {
    Base(BaseObject),
    Sparse(SparseArrayObject),
    Dense(ArrayObject),
}

/// Which representation a handle currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReprKind {
    Lazy,
    Base,
    Sparse,
    Dense,
}

impl Representation {
    pub fn kind(&self) -> ReprKind {
        match self {
            Representation::Base(_) => ReprKind::Base,
            Representation::Sparse(_) => ReprKind::Sparse,
            Representation::Dense(_) => ReprKind::Dense,
        }
    }

    pub fn as_impl(&self) -> &dyn ObjectImpl {
        match self {
            Representation::Base(o) => o,
            Representation::Sparse(o) => o,
            Representation::Dense(o) => o,
        }
    }

    pub fn as_impl_mut(&mut self) -> &mut dyn ObjectImpl {
        match self {
            Representation::Base(o) => o,
            Representation::Sparse(o) => o,
            Representation::Dense(o) => o,
        }
    }
}

pub(crate) struct ObjectShell {
    pub(crate) state: RefCell<ShellState>,
}

/// Identity-stable object handle
///
/// Cloning the handle clones the reference, not the object.
#[derive(Clone)]
pub struct Object(pub(crate) Rc<ObjectShell>);

pub(crate) fn busy() -> JsError {
    JsError::TypeError("object is in use by its own initializer".to_string())
}

fn resolve(slot: SlotValue, receiver: &Value) -> JsResult<Value> {
    match slot {
        SlotValue::Plain(v) => Ok(v),
        SlotValue::Property(p) if p.accessor => match p.getter {
            Some(getter) => getter.call(receiver, &[]),
            None => Ok(Value::Undefined),
        },
        SlotValue::Property(p) => Ok(p.value),
    }
}

impl Object {
    /// Wrap a materialized representation
    pub fn new(repr: Representation) -> Self {
        Self::from_state(ShellState::Materialized(repr))
    }

    /// Create an object whose representation is built on first use
    pub fn lazy(factory: impl FnOnce(&Object) -> Representation + 'static) -> Self {
        Self::from_state(ShellState::Unmaterialized(LazyObject::new(factory)))
    }

    /// Create a callable object without a prototype
    pub fn function(call: impl Fn(&Value, &[Value]) -> JsResult<Value> + 'static) -> Self {
        Self::new(Representation::Base(BaseObject::function(Rc::new(call), None)))
    }

    fn from_state(state: ShellState) -> Self {
        Object(Rc::new(ObjectShell {
            state: RefCell::new(state),
        }))
    }

    /// Identity comparison
    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Object equality; materializes the object like any other operation
    pub fn equal(&self, other: &Object) -> JsResult<bool> {
        self.materialize()?;
        Ok(self.ptr_eq(other))
    }

    /// Check whether the representation exists yet, without creating it
    pub fn is_materialized(&self) -> bool {
        self.0
            .state
            .try_borrow()
            .is_ok_and(|state| matches!(*state, ShellState::Materialized(_)))
    }

    /// The current representation kind, without materializing
    pub fn repr_kind(&self) -> ReprKind {
        match self.0.state.try_borrow().as_deref() {
            Ok(ShellState::Materialized(repr)) => repr.kind(),
            _ => ReprKind::Lazy,
        }
    }

    /// Swap in a new representation
    pub(crate) fn install(&self, repr: Representation) {
        debug!(kind = ?repr.kind(), "installing representation");
        let previous = self.0.state.replace(ShellState::Materialized(repr));
        drop(previous);
    }

    pub(crate) fn with_impl<R>(&self, f: impl FnOnce(&dyn ObjectImpl) -> R) -> JsResult<R> {
        self.materialize()?;
        let state = self.0.state.try_borrow().map_err(|_| busy())?;
        match &*state {
            ShellState::Materialized(repr) => Ok(f(repr.as_impl())),
            _ => Err(busy()),
        }
    }

    pub(crate) fn with_impl_mut<R>(
        &self,
        f: impl FnOnce(&mut dyn ObjectImpl) -> R,
    ) -> JsResult<R> {
        self.materialize()?;
        let mut state = self.0.state.try_borrow_mut().map_err(|_| busy())?;
        match &mut *state {
            ShellState::Materialized(repr) => Ok(f(repr.as_impl_mut())),
            _ => Err(busy()),
        }
    }

    /// Run `op`, swapping representations and retrying as it requests
    fn forward<T>(
        &self,
        mut op: impl FnMut(&mut dyn ObjectImpl) -> JsResult<Step<T>>,
    ) -> JsResult<T> {
        loop {
            match self.with_impl_mut(&mut op)?? {
                Step::Done(v) => return Ok(v),
                Step::Replace(repr) => self.install(repr),
            }
        }
    }

    fn this(&self) -> Value {
        Value::Object(self.clone())
    }

    pub fn class_name(&self) -> JsResult<&'static str> {
        self.with_impl(|o| o.class_name())
    }

    pub fn get(&self, key: &Value) -> JsResult<Value> {
        self.get_key(&PropertyKey::from_value(key))
    }

    pub fn get_str(&self, name: &str) -> JsResult<Value> {
        self.get_key(&PropertyKey::from_name(name))
    }

    pub fn get_key(&self, key: &PropertyKey) -> JsResult<Value> {
        self.get_with_receiver(key, &self.this())
    }

    /// Property lookup along the prototype chain; getters see `receiver`
    pub fn get_with_receiver(&self, key: &PropertyKey, receiver: &Value) -> JsResult<Value> {
        match self.get_property(key)? {
            Some(slot) => resolve(slot, receiver),
            None => Ok(Value::Undefined),
        }
    }

    pub fn get_own_property(&self, key: &PropertyKey) -> JsResult<Option<SlotValue>> {
        self.with_impl(|o| o.get_own_property(key))
    }

    /// Own or inherited property, without running accessors
    pub fn get_property(&self, key: &PropertyKey) -> JsResult<Option<SlotValue>> {
        let mut current = self.clone();
        loop {
            if let Some(slot) = current.get_own_property(key)? {
                return Ok(Some(slot));
            }
            match current.prototype()? {
                Some(proto) => current = proto,
                None => return Ok(None),
            }
        }
    }

    pub fn put(&self, key: &Value, value: Value, throw: bool) -> JsResult<bool> {
        self.put_key(&PropertyKey::from_value(key), value, throw)
    }

    pub fn put_str(&self, name: &str, value: Value, throw: bool) -> JsResult<bool> {
        self.put_key(&PropertyKey::from_name(name), value, throw)
    }

    /// Assignment; `throw` selects strict (raise) over sloppy (return false)
    pub fn put_key(&self, key: &PropertyKey, value: Value, throw: bool) -> JsResult<bool> {
        let inherited = if self.has_own_property_key(key)? {
            None
        } else {
            match self.prototype()? {
                Some(proto) => match proto.get_property(key)? {
                    Some(SlotValue::Property(p)) => Some(p),
                    _ => None,
                },
                None => None,
            }
        };

        let assignment = self.forward(|o| o.put(key, value.clone(), throw, inherited.as_ref()))?;
        match assignment {
            Assignment::Stored(ok) => Ok(ok),
            Assignment::Setter(setter) => {
                setter.call(&self.this(), &[value])?;
                Ok(true)
            }
        }
    }

    pub fn define_own_property(
        &self,
        key: &Value,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        self.define_own_property_key(&PropertyKey::from_value(key), desc, throw)
    }

    pub fn define_own_property_str(
        &self,
        name: &str,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        self.define_own_property_key(&PropertyKey::from_name(name), desc, throw)
    }

    pub fn define_own_property_key(
        &self,
        key: &PropertyKey,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        self.forward(|o| o.define_own_property(key, &desc, throw))
    }

    pub fn delete(&self, key: &Value, throw: bool) -> JsResult<bool> {
        self.delete_key(&PropertyKey::from_value(key), throw)
    }

    pub fn delete_str(&self, name: &str, throw: bool) -> JsResult<bool> {
        self.delete_key(&PropertyKey::from_name(name), throw)
    }

    pub fn delete_key(&self, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        self.with_impl_mut(|o| o.delete(key, throw))?
    }

    pub fn has_own_property(&self, key: &Value) -> JsResult<bool> {
        self.has_own_property_key(&PropertyKey::from_value(key))
    }

    pub fn has_own_property_str(&self, name: &str) -> JsResult<bool> {
        self.has_own_property_key(&PropertyKey::from_name(name))
    }

    pub fn has_own_property_key(&self, key: &PropertyKey) -> JsResult<bool> {
        self.with_impl(|o| o.has_own_property(key))
    }

    pub fn has_property(&self, key: &Value) -> JsResult<bool> {
        Ok(self.get_property(&PropertyKey::from_value(key))?.is_some())
    }

    pub fn has_property_str(&self, name: &str) -> JsResult<bool> {
        Ok(self.get_property(&PropertyKey::from_name(name))?.is_some())
    }

    pub fn prototype(&self) -> JsResult<Option<Object>> {
        self.with_impl(|o| o.base().prototype().cloned())
    }

    /// Change the prototype; fails on non-extensible objects and cycles
    pub fn set_prototype(&self, prototype: Option<Object>, throw: bool) -> JsResult<bool> {
        let current = self.prototype()?;
        let unchanged = match (&current, &prototype) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        if unchanged {
            return Ok(true);
        }
        if !self.is_extensible()? {
            return reject(
                throw,
                JsError::TypeError("object is not extensible".to_string()),
            );
        }
        let mut link = prototype.clone();
        while let Some(p) = link {
            if p.ptr_eq(self) {
                return reject(throw, JsError::TypeError("Cyclic __proto__ value".to_string()));
            }
            link = p.prototype()?;
        }
        self.with_impl_mut(|o| o.base_mut().set_prototype(prototype))?;
        Ok(true)
    }

    pub fn is_extensible(&self) -> JsResult<bool> {
        self.with_impl(|o| o.base().is_extensible())
    }

    pub fn prevent_extensions(&self, _throw: bool) -> JsResult<bool> {
        self.with_impl_mut(|o| o.base_mut().prevent_extensions())?;
        Ok(true)
    }

    /// Enumerate property names and raw values
    ///
    /// Own indices come first in ascending order, then named properties in
    /// insertion order, then (if `recursive`) the prototype chain. Unless
    /// `all` is set, non-enumerable properties are skipped.
    pub fn enumerate(&self, all: bool, recursive: bool) -> JsResult<PropertyIter> {
        self.materialize()?;
        Ok(PropertyIter::new(self.clone(), all, recursive))
    }

    pub fn export(&self) -> JsResult<Exported> {
        self.with_impl(|o| o.export())?
    }

    pub fn export_type(&self) -> JsResult<ExportType> {
        self.with_impl(|o| o.export_type())
    }

    /// The native function behind this object, if it is callable
    pub fn assert_callable(&self) -> JsResult<Option<Function>> {
        self.with_impl(|o| o.base().callable().cloned())
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult<Value> {
        match self.assert_callable()? {
            Some(f) => f(this, args),
            None => Err(JsError::TypeError(format!(
                "{} is not a function",
                Value::Object(self.clone())
            ))),
        }
    }

    /// Convert to a primitive through `valueOf` / `toString`
    pub fn to_primitive(&self, hint: Hint) -> JsResult<Value> {
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Default | Hint::Number => ["valueOf", "toString"],
        };
        for name in order {
            if let Value::Object(method) = self.get_str(name)? {
                if method.assert_callable()?.is_some() {
                    let result = method.call(&self.this(), &[])?;
                    if !result.is_object() {
                        return Ok(result);
                    }
                }
            }
        }
        Err(JsError::TypeError(
            "Cannot convert object to primitive value".to_string(),
        ))
    }

    pub fn sort_len(&self) -> JsResult<u32> {
        self.with_impl(|o| o.sort_len())
    }

    /// Element for the sort routine, running getters; holes are `None`
    pub fn sort_get(&self, index: u32) -> JsResult<Option<Value>> {
        let slot = self.with_impl(|o| o.sort_get(index))?;
        slot.map(|s| resolve(s, &self.this())).transpose()
    }

    pub fn swap(&self, i: u32, j: u32) -> JsResult<()> {
        self.with_impl_mut(|o| o.swap(i, j))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:p})", Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn plain_object(proto: Option<Object>) -> Object {
        Object::new(Representation::Base(BaseObject::new("Object", proto)))
    }

    #[test]
    fn test_named_put_get_delete() {
        let obj = plain_object(None);
        assert!(obj.put_str("a", Value::int(1), true).unwrap());
        assert_eq!(obj.get_str("a").unwrap(), Value::int(1));
        assert!(obj.has_own_property_str("a").unwrap());

        assert!(obj.delete_str("a", true).unwrap());
        assert!(!obj.has_own_property_str("a").unwrap());
        assert!(obj.get_str("a").unwrap().is_undefined());
    }

    #[test]
    fn test_prototype_fallback() {
        let proto = plain_object(None);
        proto.put_str("x", Value::int(9), true).unwrap();
        let obj = plain_object(Some(proto.clone()));

        assert_eq!(obj.get_str("x").unwrap(), Value::int(9));
        assert!(obj.has_property_str("x").unwrap());
        assert!(!obj.has_own_property_str("x").unwrap());

        // Shadowing creates an own property
        obj.put_str("x", Value::int(1), true).unwrap();
        assert_eq!(obj.get_str("x").unwrap(), Value::int(1));
        assert_eq!(proto.get_str("x").unwrap(), Value::int(9));
    }

    #[test]
    fn test_inherited_read_only_blocks_write() {
        let proto = plain_object(None);
        proto
            .define_own_property_str("x", PropertyDescriptor::data(Value::int(1)), true)
            .unwrap();
        let obj = plain_object(Some(proto));

        assert!(!obj.put_str("x", Value::int(2), false).unwrap());
        assert!(matches!(
            obj.put_str("x", Value::int(2), true),
            Err(JsError::WriteRejected(_))
        ));
        assert!(!obj.has_own_property_str("x").unwrap());
    }

    #[test]
    fn test_inherited_setter_receives_receiver() {
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        let setter = Object::function(move |this, args| {
            assert!(this.is_object());
            sink.set(args[0].to_number());
            Ok(Value::Undefined)
        });
        let proto = plain_object(None);
        proto
            .define_own_property_str("x", PropertyDescriptor::accessor(None, Some(setter)), true)
            .unwrap();
        let obj = plain_object(Some(proto));

        assert!(obj.put_str("x", Value::int(42), true).unwrap());
        assert_eq!(seen.get(), 42.0);
        assert!(!obj.has_own_property_str("x").unwrap());
    }

    #[test]
    fn test_getter_runs_with_receiver() {
        let getter = Object::function(|this, _| {
            let this = this.as_object().expect("receiver is an object");
            this.get_str("base")
        });
        let proto = plain_object(None);
        proto
            .define_own_property_str("x", PropertyDescriptor::accessor(Some(getter), None), true)
            .unwrap();
        let obj = plain_object(Some(proto));
        obj.put_str("base", Value::int(5), true).unwrap();

        assert_eq!(obj.get_str("x").unwrap(), Value::int(5));
    }

    #[test]
    fn test_non_extensible() {
        let obj = plain_object(None);
        obj.put_str("a", Value::int(1), true).unwrap();
        obj.prevent_extensions(true).unwrap();
        assert!(!obj.is_extensible().unwrap());

        assert!(obj.put_str("a", Value::int(2), true).unwrap());
        assert!(!obj.put_str("b", Value::int(2), false).unwrap());
        assert!(matches!(
            obj.put_str("b", Value::int(2), true),
            Err(JsError::WriteRejected(_))
        ));
    }

    #[test]
    fn test_delete_non_configurable() {
        let obj = plain_object(None);
        obj.define_own_property_str(
            "a",
            PropertyDescriptor::data(Value::int(1)).configurable(false),
            true,
        )
        .unwrap();
        assert!(!obj.delete_str("a", false).unwrap());
        assert!(matches!(
            obj.delete_str("a", true),
            Err(JsError::DeleteRejected(_))
        ));
        // Missing properties delete trivially
        assert!(obj.delete_str("zzz", true).unwrap());
    }

    #[test]
    fn test_set_prototype_rejects_cycles() {
        let a = plain_object(None);
        let b = plain_object(Some(a.clone()));
        assert!(!a.set_prototype(Some(b.clone()), false).unwrap());
        assert!(matches!(
            a.set_prototype(Some(b), true),
            Err(JsError::TypeError(_))
        ));
    }

    #[test]
    fn test_call_and_to_primitive() {
        let obj = plain_object(None);
        assert!(matches!(
            obj.call(&Value::Undefined, &[]),
            Err(JsError::TypeError(_))
        ));
        assert!(obj.to_primitive(Hint::Default).is_err());

        let value_of = Object::function(|_, _| Ok(Value::int(3)));
        obj.put_str("valueOf", Value::Object(value_of), true).unwrap();
        assert_eq!(obj.to_primitive(Hint::Number).unwrap(), Value::int(3));
    }

    #[test]
    fn test_thrown_value_propagates() {
        let getter = Object::function(|_, _| Err(JsError::Thrown(Value::string("boom"))));
        let obj = plain_object(None);
        obj.define_own_property_str("x", PropertyDescriptor::accessor(Some(getter), None), true)
            .unwrap();
        assert!(matches!(obj.get_str("x"), Err(JsError::Thrown(_))));
    }

    #[test]
    fn test_export_map_skips_hidden() {
        let obj = plain_object(None);
        obj.put_str("a", Value::int(1), true).unwrap();
        obj.define_own_property_str("hidden", PropertyDescriptor::data(Value::int(2)), true)
            .unwrap();
        assert_eq!(
            obj.export().unwrap(),
            Exported::Map(vec![("a".to_string(), Exported::Number(1.0))])
        );
        assert_eq!(obj.export_type().unwrap(), ExportType::Map);
    }
}
