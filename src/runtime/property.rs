//! Property attributes and the named property table
//!
//! Named (non-index) properties are stored in a hash table that keeps
//! insertion order, which enumeration relies on. Indexed storage lives in
//! the array representations; both share [`SlotValue`] as the stored form.

use std::fmt;
use std::rc::Rc;

use crate::error::{JsError, JsResult, reject};
use crate::runtime::index::{str_to_index, to_index};
use crate::runtime::object::Object;
use crate::value::{Exported, Value};

/// A canonicalized property key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    /// Array index in `[0, 2^32 - 2]`
    Index(u32),
    /// Any other name, including `"length"`
    String(Rc<str>),
}

impl PropertyKey {
    /// Canonicalize a value-typed key
    pub fn from_value(key: &Value) -> Self {
        match to_index(key) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::String(key.to_property_name()),
        }
    }

    /// Canonicalize a string-typed key
    pub fn from_name(name: &str) -> Self {
        match str_to_index(name) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::String(Rc::from(name)),
        }
    }

    /// Check if this is the `length` pseudo-property
    #[inline]
    pub fn is_length(&self) -> bool {
        matches!(self, PropertyKey::String(s) if &**s == "length")
    }

    /// The key as a property name
    pub fn name(&self) -> Rc<str> {
        match self {
            PropertyKey::Index(i) => Rc::from(i.to_string()),
            PropertyKey::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::String(s) => write!(f, "{}", s),
        }
    }
}

/// A property with explicit attributes
///
/// Either a data property (`accessor == false`, `value` holds the data) or
/// an accessor property (`getter`/`setter`, `value` unused).
#[derive(Debug, Clone, Default)]
pub struct Property {
    pub value: Value,
    pub getter: Option<Object>,
    pub setter: Option<Object>,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    pub accessor: bool,
}

impl Property {
    /// Create a data property
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Property {
            value,
            writable,
            enumerable,
            configurable,
            ..Default::default()
        }
    }

    /// Create an accessor property
    pub fn accessor(
        getter: Option<Object>,
        setter: Option<Object>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Property {
            getter,
            setter,
            enumerable,
            configurable,
            accessor: true,
            ..Default::default()
        }
    }

    /// Whether an assignment can succeed: a writable data property, or an
    /// accessor with a setter
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable || self.setter.is_some()
    }
}

/// The stored form of a property
///
/// Plain values are writable, enumerable and configurable data properties
/// and need no attribute checks.
#[derive(Debug, Clone)]
pub enum SlotValue {
    Plain(Value),
    Property(Property),
}

impl SlotValue {
    /// Check if this slot carries explicit attributes
    #[inline]
    pub fn is_property(&self) -> bool {
        matches!(self, SlotValue::Property(_))
    }

    #[inline]
    pub fn is_enumerable(&self) -> bool {
        match self {
            SlotValue::Plain(_) => true,
            SlotValue::Property(p) => p.enumerable,
        }
    }

    #[inline]
    pub fn is_configurable(&self) -> bool {
        match self {
            SlotValue::Plain(_) => true,
            SlotValue::Property(p) => p.configurable,
        }
    }

    /// The stored data value; accessors yield undefined, getters are not run
    pub fn raw_value(&self) -> Value {
        match self {
            SlotValue::Plain(v) => v.clone(),
            SlotValue::Property(p) if p.accessor => Value::Undefined,
            SlotValue::Property(p) => p.value.clone(),
        }
    }

    /// Export the raw value; accessor slots export as undefined
    pub fn export(&self) -> JsResult<Exported> {
        self.raw_value().export()
    }
}

/// A partial property definition, as passed to `defineProperty`
///
/// Absent fields leave the corresponding attribute untouched. A getter or
/// setter of `Some(Value::Undefined)` clears that accessor half.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
    pub getter: Option<Value>,
    pub setter: Option<Value>,
}

impl PropertyDescriptor {
    /// A descriptor carrying only a value
    pub fn data(value: Value) -> Self {
        PropertyDescriptor {
            value: Some(value),
            ..Default::default()
        }
    }

    /// A descriptor carrying a getter and/or setter
    pub fn accessor(getter: Option<Object>, setter: Option<Object>) -> Self {
        PropertyDescriptor {
            getter: Some(getter.map(Value::Object).unwrap_or_default()),
            setter: Some(setter.map(Value::Object).unwrap_or_default()),
            ..Default::default()
        }
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    #[inline]
    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }

    #[inline]
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }
}

fn accessor_half(v: Option<&Value>, what: &str) -> JsResult<Option<Option<Object>>> {
    match v {
        None => Ok(None),
        Some(Value::Undefined) => Ok(Some(None)),
        Some(Value::Object(o)) => Ok(Some(Some(o.clone()))),
        Some(other) => Err(JsError::TypeError(format!(
            "{} must be a function: {}",
            what, other
        ))),
    }
}

fn same_function(a: &Option<Object>, b: &Option<Object>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Validate a property (re)definition and compute the resulting slot
///
/// `existing` is the current own slot, if any. Returns `Ok(None)` when the
/// definition is rejected and `throw` is not set. A descriptor mixing data
/// and accessor fields is always a `TypeError`. A result that is a writable,
/// enumerable, configurable data property collapses to [`SlotValue::Plain`].
pub fn apply_descriptor(
    key: &PropertyKey,
    existing: Option<&SlotValue>,
    extensible: bool,
    desc: &PropertyDescriptor,
    throw: bool,
) -> JsResult<Option<SlotValue>> {
    if desc.is_accessor() && desc.is_data() {
        return Err(JsError::TypeError(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
                .to_string(),
        ));
    }
    let getter = accessor_half(desc.getter.as_ref(), "Getter")?;
    let setter = accessor_half(desc.setter.as_ref(), "Setter")?;

    let mut prop = match existing {
        None => {
            if !extensible {
                reject(
                    throw,
                    JsError::TypeError(format!(
                        "Cannot define property {}, object is not extensible",
                        key
                    )),
                )?;
                return Ok(None);
            }
            Property::default()
        }
        Some(SlotValue::Plain(v)) => Property::data(v.clone(), true, true, true),
        Some(SlotValue::Property(p)) => p.clone(),
    };

    if existing.is_some() && !prop.configurable {
        let kind_change = if prop.accessor {
            desc.is_data()
        } else {
            getter.is_some() || setter.is_some()
        };
        let rejected = desc.configurable == Some(true)
            || desc.enumerable.is_some_and(|e| e != prop.enumerable)
            || kind_change
            || (!prop.accessor
                && !prop.writable
                && (desc.writable == Some(true)
                    || desc.value.as_ref().is_some_and(|v| !v.same_value(&prop.value))))
            || (prop.accessor
                && (getter.as_ref().is_some_and(|g| !same_function(g, &prop.getter))
                    || setter.as_ref().is_some_and(|s| !same_function(s, &prop.setter))));
        if rejected {
            reject(
                throw,
                JsError::TypeError(format!("Cannot redefine property: {}", key)),
            )?;
            return Ok(None);
        }
    }

    if let Some(w) = desc.writable {
        prop.writable = w;
    }
    if let Some(e) = desc.enumerable {
        prop.enumerable = e;
    }
    if let Some(c) = desc.configurable {
        prop.configurable = c;
    }
    if desc.is_data() && prop.accessor {
        prop.accessor = false;
        prop.getter = None;
        prop.setter = None;
    }
    if let Some(v) = &desc.value {
        prop.value = v.clone();
    }
    if getter.is_some() || setter.is_some() {
        if !prop.accessor {
            prop.accessor = true;
            prop.writable = false;
            prop.value = Value::Undefined;
        }
        if let Some(g) = getter {
            prop.getter = g;
        }
        if let Some(s) = setter {
            prop.setter = s;
        }
    }
    if !prop.accessor && prop.writable && prop.enumerable && prop.configurable {
        return Ok(Some(SlotValue::Plain(prop.value)));
    }
    Ok(Some(SlotValue::Property(prop)))
}

/// One entry of the named property table; `key == None` marks a deleted entry
#[derive(Debug, Clone)]
struct Entry {
    key: Option<Rc<str>>,
    value: SlotValue,
    /// Next entry in the hash chain (index + 1, 0 = end of chain)
    hash_next: u32,
}

/// Named property table
///
/// Entries are appended in insertion order and threaded into hash chains.
/// Deleted entries stay in place as tombstones until the next resize, so
/// iteration order always matches insertion order.
#[derive(Debug, Clone)]
pub struct PropertyTable {
    /// Number of live properties
    prop_count: u32,
    /// Hash table mask (size - 1)
    hash_mask: u32,
    /// Entries in insertion order, including tombstones
    entries: Vec<Entry>,
    /// Chain heads (indices into entries + 1, 0 = empty bucket)
    hash_table: Vec<u32>,
}

impl PropertyTable {
    /// Minimum hash table size
    const MIN_HASH_SIZE: usize = 4;

    /// Maximum load factor before resize
    const MAX_LOAD_FACTOR: f64 = 0.75;

    /// Create a new empty property table
    pub fn new() -> Self {
        PropertyTable {
            prop_count: 0,
            hash_mask: (Self::MIN_HASH_SIZE - 1) as u32,
            entries: Vec::new(),
            hash_table: vec![0; Self::MIN_HASH_SIZE],
        }
    }

    /// Get the number of properties
    #[inline]
    pub fn len(&self) -> usize {
        self.prop_count as usize
    }

    /// Check if the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prop_count == 0
    }

    /// Hash a property name (FNV-1a, then a finalizer mix)
    #[inline]
    fn hash_key(key: &str) -> u32 {
        let mut h: u32 = 0x811c9dc5;
        for &b in key.as_bytes() {
            h ^= u32::from(b);
            h = h.wrapping_mul(0x01000193);
        }
        h ^= h >> 16;
        h = h.wrapping_mul(0x85ebca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2ae35);
        h ^= h >> 16;
        h
    }

    /// Find a property by name, returning its entry index
    fn find(&self, key: &str) -> Option<usize> {
        if self.prop_count == 0 {
            return None;
        }

        let mut idx = self.hash_table[(Self::hash_key(key) & self.hash_mask) as usize];
        while idx != 0 {
            let entry = &self.entries[(idx - 1) as usize];
            if entry.key.as_deref() == Some(key) {
                return Some((idx - 1) as usize);
            }
            idx = entry.hash_next;
        }
        None
    }

    /// Get a property by name
    pub fn get(&self, key: &str) -> Option<&SlotValue> {
        self.find(key).map(|idx| &self.entries[idx].value)
    }

    /// Get a mutable property reference by name
    pub fn get_mut(&mut self, key: &str) -> Option<&mut SlotValue> {
        self.find(key).map(move |idx| &mut self.entries[idx].value)
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Insert or update a property
    ///
    /// Returns true if this was a new property, false if updated.
    pub fn set(&mut self, key: Rc<str>, value: SlotValue) -> bool {
        if let Some(idx) = self.find(&key) {
            self.entries[idx].value = value;
            return false;
        }

        let load = (self.entries.len() + 1) as f64 / (self.hash_mask + 1) as f64;
        if load > Self::MAX_LOAD_FACTOR {
            self.resize();
        }

        let bucket = (Self::hash_key(&key) & self.hash_mask) as usize;
        self.entries.push(Entry {
            key: Some(key),
            value,
            hash_next: self.hash_table[bucket],
        });
        self.hash_table[bucket] = self.entries.len() as u32;
        self.prop_count += 1;
        true
    }

    /// Delete a property by name, returning its old value
    pub fn delete(&mut self, key: &str) -> Option<SlotValue> {
        let target = self.find(key)?;
        let bucket = (Self::hash_key(key) & self.hash_mask) as usize;
        let next = self.entries[target].hash_next;

        // Unlink from the hash chain
        let mut idx = self.hash_table[bucket];
        if (idx - 1) as usize == target {
            self.hash_table[bucket] = next;
        } else {
            while idx != 0 {
                let prev = (idx - 1) as usize;
                idx = self.entries[prev].hash_next;
                if idx != 0 && (idx - 1) as usize == target {
                    self.entries[prev].hash_next = next;
                    break;
                }
            }
        }

        let entry = &mut self.entries[target];
        entry.key = None;
        entry.hash_next = 0;
        self.prop_count -= 1;
        Some(std::mem::replace(
            &mut entry.value,
            SlotValue::Plain(Value::Undefined),
        ))
    }

    /// Rebuild the hash table, dropping tombstones
    fn resize(&mut self) {
        self.entries.retain(|e| e.key.is_some());
        let new_size = ((self.entries.len() + 1) * 2)
            .next_power_of_two()
            .max(Self::MIN_HASH_SIZE);
        self.hash_mask = (new_size - 1) as u32;
        self.hash_table = vec![0; new_size];

        for i in 0..self.entries.len() {
            let bucket = match &self.entries[i].key {
                Some(key) => (Self::hash_key(key) & self.hash_mask) as usize,
                None => continue,
            };
            self.entries[i].hash_next = self.hash_table[bucket];
            self.hash_table[bucket] = (i + 1) as u32;
        }
    }

    /// The first live entry at or after position `pos`, with its position
    pub fn next_live(&self, pos: usize) -> Option<(usize, &Rc<str>, &SlotValue)> {
        self.entries
            .iter()
            .enumerate()
            .skip(pos)
            .find_map(|(i, e)| e.key.as_ref().map(|k| (i, k, &e.value)))
    }

    /// Iterate over live properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &SlotValue)> {
        self.entries
            .iter()
            .filter_map(|e| e.key.as_ref().map(|k| (k, &e.value)))
    }

    /// Iterate over live property names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Rc<str>> + '_ {
        self.iter().map(|(k, _)| k)
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}
