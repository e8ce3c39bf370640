//! Dense array representation
//!
//! Elements are stored in a vector indexed directly by array index. Holes
//! are `None`, and the vector never extends past `length`. Sparse arrays
//! switch to this representation once they become tightly packed.

use std::rc::Rc;

use crate::config::PromotionPolicy;
use crate::error::{JsResult, reject};
use crate::runtime::length::{ArrayLength, IndexedStorage};
use crate::runtime::object::{
    Assignment, BaseObject, Object, ObjectImpl, Representation, Step, array_string_entry,
    assign_existing, gate_new_property,
};
use crate::runtime::promote::{demote, should_demote};
use crate::runtime::property::{
    Property, PropertyDescriptor, PropertyKey, SlotValue, apply_descriptor,
};
use crate::runtime::slots::{IndexedSlot, SlotTable};
use crate::value::{ExportType, Exported, Value};

/// Element vector with present and attributed element counts
#[derive(Debug, Default)]
struct Elements {
    values: Vec<Option<SlotValue>>,
    present: usize,
    property_count: usize,
}

impl Elements {
    #[inline]
    fn get(&self, index: u32) -> Option<&SlotValue> {
        self.values.get(index as usize).and_then(Option::as_ref)
    }

    #[inline]
    fn get_mut(&mut self, index: u32) -> Option<&mut SlotValue> {
        self.values.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Store `value` at `index`, extending the vector with holes
    fn store(&mut self, index: u32, value: SlotValue) {
        let i = index as usize;
        if i >= self.values.len() {
            self.values.resize(i + 1, None);
        }
        if value.is_property() {
            self.property_count += 1;
        }
        match self.values[i].replace(value) {
            None => self.present += 1,
            Some(SlotValue::Property(_)) => self.property_count -= 1,
            Some(SlotValue::Plain(_)) => {}
        }
    }

    fn remove(&mut self, index: u32) {
        match self.values.get_mut(index as usize).and_then(Option::take) {
            Some(SlotValue::Property(_)) => {
                self.present -= 1;
                self.property_count -= 1;
            }
            Some(SlotValue::Plain(_)) => self.present -= 1,
            None => {}
        }
    }

    /// Drop everything from `cut` up, keeping the counts in step
    fn drop_tail(&mut self, cut: usize) {
        for value in self.values.drain(cut..).flatten() {
            self.present -= 1;
            if value.is_property() {
                self.property_count -= 1;
            }
        }
    }

    /// Present elements as ordered slots
    fn into_slots(self) -> SlotTable {
        let items = self
            .values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|value| IndexedSlot { index: i as u32, value }))
            .collect();
        SlotTable::from_ordered(items)
    }
}

impl IndexedStorage for Elements {
    fn truncate_from(&mut self, new_len: u32) -> Result<(), u32> {
        let cut = new_len as usize;
        if self.values.len() <= cut {
            return Ok(());
        }
        if self.property_count > 0 {
            for i in (cut..self.values.len()).rev() {
                if let Some(SlotValue::Property(p)) = &self.values[i] {
                    if !p.configurable {
                        self.drop_tail(i + 1);
                        return Err(i as u32);
                    }
                }
            }
        }
        self.drop_tail(cut);
        Ok(())
    }
}

/// Array backed by a contiguous element vector
pub struct ArrayObject {
    pub(crate) base: BaseObject,
    elements: Elements,
    length: ArrayLength,
    policy: PromotionPolicy,
}

impl ArrayObject {
    /// Create a new empty array
    pub fn new(prototype: Option<Object>) -> Self {
        ArrayObject {
            base: BaseObject::new("Array", prototype),
            elements: Elements::default(),
            length: ArrayLength::new(0),
            policy: PromotionPolicy::default(),
        }
    }

    /// Create an array from a vector of values
    pub fn from_values(prototype: Option<Object>, values: Vec<Value>) -> Self {
        let len = values.len() as u32;
        ArrayObject {
            base: BaseObject::new("Array", prototype),
            elements: Elements {
                present: values.len(),
                values: values.into_iter().map(|v| Some(SlotValue::Plain(v))).collect(),
                property_count: 0,
            },
            length: ArrayLength::new(len),
            policy: PromotionPolicy::default(),
        }
    }

    /// Use `policy` if a far write sends this array back to sparse storage
    pub fn with_policy(mut self, policy: PromotionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take over the contents of a slot table
    pub(crate) fn from_slots(
        base: BaseObject,
        slots: SlotTable,
        length: ArrayLength,
        policy: PromotionPolicy,
    ) -> Self {
        let present = slots.len();
        let property_count = slots.property_count();
        let mut values = Vec::new();
        if let Some(highest) = slots.highest_index() {
            values.resize(highest as usize + 1, None);
        }
        for slot in slots.into_items() {
            values[slot.index as usize] = Some(slot.value);
        }
        ArrayObject {
            base,
            elements: Elements {
                values,
                present,
                property_count,
            },
            length,
            policy,
        }
    }

    /// Move everything out, leaving an empty array behind
    pub(crate) fn take_parts(&mut self) -> (BaseObject, SlotTable, ArrayLength, PromotionPolicy) {
        let base = std::mem::take(&mut self.base);
        let elements = std::mem::take(&mut self.elements);
        (base, elements.into_slots(), self.length, self.policy)
    }

    /// Number of present (non-hole) elements
    #[inline]
    pub fn present(&self) -> usize {
        self.elements.present
    }

    /// A write to `index` that would grow the vector far past its contents
    fn goes_sparse(&mut self, index: u32) -> Option<Representation> {
        if (index as usize) < self.elements.values.len()
            || !should_demote(&self.policy, self.elements.present, index)
        {
            return None;
        }
        Some(Representation::Sparse(demote(self, index)))
    }

    /// Get the array length
    #[inline]
    pub fn len(&self) -> u32 {
        self.length.get()
    }

    /// Check if the array is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length.get() == 0
    }

    /// Get the element at `index`; holes are `None`
    #[inline]
    pub fn get(&self, index: u32) -> Option<&SlotValue> {
        self.elements.get(index)
    }

    /// Set the length, deleting elements above it
    pub fn set_length(&mut self, new_len: u32, throw: bool) -> JsResult<bool> {
        self.length.set(&mut self.elements, new_len, throw)
    }

    fn put_index(
        &mut self,
        index: u32,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Step<Assignment>> {
        if let Some(slot) = self.elements.get_mut(index) {
            return assign_existing(slot, value, throw, key).map(Step::Done);
        }
        if let Some(sparse) = self.goes_sparse(index) {
            return Ok(Step::Replace(sparse));
        }
        if let Some(settled) = gate_new_property(inherited, self.base.extensible, throw, key)? {
            return Ok(Step::Done(settled));
        }
        if !self.length.cover(&mut self.elements, index, throw)? {
            return Ok(Step::Done(Assignment::Stored(false)));
        }
        self.elements.store(index, SlotValue::Plain(value));
        Ok(Step::Done(Assignment::Stored(true)))
    }

    fn define_index(
        &mut self,
        index: u32,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>> {
        if let Some(sparse) = self.goes_sparse(index) {
            return Ok(Step::Replace(sparse));
        }
        let existing = self.elements.get(index);
        let Some(slot) = apply_descriptor(key, existing, self.base.extensible, desc, throw)? else {
            return Ok(Step::Done(false));
        };
        if !self.length.cover(&mut self.elements, index, throw)? {
            return Ok(Step::Done(false));
        }
        self.elements.store(index, slot);
        Ok(Step::Done(true))
    }

    fn delete_index(&mut self, index: u32, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        match self.elements.get(index) {
            None => Ok(true),
            Some(slot) if !slot.is_configurable() => reject(throw, self.base.cannot_delete(key)),
            Some(_) => {
                self.elements.remove(index);
                Ok(true)
            }
        }
    }
}

impl ObjectImpl for ArrayObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<SlotValue> {
        match key {
            PropertyKey::Index(index) => self.elements.get(*index).cloned(),
            k if k.is_length() => Some(SlotValue::Property(self.length.property())),
            PropertyKey::String(name) => self.base.get_named(name),
        }
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => self.elements.get(*index).is_some(),
            k if k.is_length() => true,
            PropertyKey::String(name) => self.base.properties.has(name),
        }
    }

    fn put(
        &mut self,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Step<Assignment>> {
        let assignment = match key {
            PropertyKey::Index(index) => return self.put_index(*index, key, value, throw, inherited),
            k if k.is_length() => Assignment::Stored(self.length.set_from_value(
                &mut self.elements,
                &value,
                throw,
            )?),
            _ => self.base.put_named(key, value, throw, inherited)?,
        };
        Ok(Step::Done(assignment))
    }

    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>> {
        let defined = match key {
            PropertyKey::Index(index) => return self.define_index(*index, key, desc, throw),
            k if k.is_length() => self.length.define(&mut self.elements, desc, throw)?,
            _ => self.base.define_named(key, desc, throw)?,
        };
        Ok(Step::Done(defined))
    }

    fn delete(&mut self, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        match key {
            PropertyKey::Index(index) => self.delete_index(*index, key, throw),
            k if k.is_length() => reject(throw, self.base.cannot_delete(key)),
            _ => self.base.delete_named(key, throw),
        }
    }

    fn next_index_entry(&self, after: Option<u32>) -> Option<(u32, SlotValue)> {
        let start = after.map_or(0, |a| a as usize + 1);
        self.elements
            .values
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(i, v)| v.as_ref().map(|v| (i as u32, v.clone())))
    }

    fn string_entry(&self, pos: usize) -> Option<(usize, Rc<str>, SlotValue)> {
        array_string_entry(&self.base, &self.length, pos)
    }

    fn export(&self) -> JsResult<Exported> {
        let mut out = vec![None; self.length.get() as usize];
        for (i, value) in self.elements.values.iter().enumerate() {
            if let Some(value) = value {
                out[i] = Some(value.export()?);
            }
        }
        Ok(Exported::Array(out))
    }

    fn export_type(&self) -> ExportType {
        ExportType::Array
    }

    fn sort_len(&self) -> u32 {
        self.elements.values.len() as u32
    }

    fn sort_get(&self, index: u32) -> Option<SlotValue> {
        self.elements.get(index).cloned()
    }

    fn swap(&mut self, i: u32, j: u32) {
        let len = self.elements.values.len();
        if (i as usize) < len && (j as usize) < len {
            self.elements.values.swap(i as usize, j as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsError;
    use crate::runtime::object::ReprKind;

    fn dense(values: Vec<Value>) -> Object {
        Object::new(Representation::Dense(ArrayObject::from_values(None, values)))
    }

    fn ints(range: std::ops::Range<i64>) -> Vec<Value> {
        range.map(Value::int).collect()
    }

    #[test]
    fn test_from_values() {
        let arr = ArrayObject::from_values(None, ints(0..3));
        assert_eq!(arr.len(), 3);
        assert!(!arr.is_empty());
        assert!(matches!(arr.get(1), Some(SlotValue::Plain(v)) if *v == Value::int(1)));
        assert!(arr.get(3).is_none());
    }

    #[test]
    fn test_get_set() {
        let arr = dense(ints(0..3));
        arr.put(&Value::int(1), Value::int(10), true).unwrap();
        assert_eq!(arr.get(&Value::int(1)).unwrap(), Value::int(10));

        // Writing past the end leaves holes
        arr.put(&Value::int(5), Value::int(50), true).unwrap();
        assert_eq!(arr.get_str("length").unwrap(), Value::int(6));
        assert!(!arr.has_own_property(&Value::int(4)).unwrap());
        assert_eq!(arr.sort_len().unwrap(), 6);
    }

    #[test]
    fn test_set_length() {
        let arr = dense(ints(0..5));
        arr.put_str("length", Value::int(2), true).unwrap();
        assert!(!arr.has_own_property(&Value::int(2)).unwrap());
        assert_eq!(arr.sort_len().unwrap(), 2);

        // Growing does not allocate elements
        arr.put_str("length", Value::int(100), true).unwrap();
        assert_eq!(arr.sort_len().unwrap(), 2);
        assert_eq!(arr.get_str("length").unwrap(), Value::int(100));
    }

    #[test]
    fn test_set_length_blocked() {
        let arr = dense(ints(0..5));
        arr.define_own_property(
            &Value::int(2),
            PropertyDescriptor::data(Value::int(2)).configurable(false),
            true,
        )
        .unwrap();
        assert!(matches!(
            arr.put_str("length", Value::int(0), true),
            Err(JsError::LengthRedefineRejected)
        ));
        assert_eq!(arr.get_str("length").unwrap(), Value::int(3));
        assert!(arr.has_own_property(&Value::int(1)).unwrap());
    }

    #[test]
    fn test_delete() {
        let arr = dense(ints(0..3));
        assert!(arr.delete(&Value::int(1), true).unwrap());
        assert!(!arr.has_own_property(&Value::int(1)).unwrap());
        assert_eq!(arr.get_str("length").unwrap(), Value::int(3));
        assert!(arr.delete(&Value::int(1), true).unwrap());
    }

    #[test]
    fn test_enumeration_skips_holes() {
        let arr = dense(ints(0..4));
        arr.delete(&Value::int(2), true).unwrap();
        let names: Vec<String> = arr
            .enumerate(true, false)
            .unwrap()
            .map(|item| item.name.to_string())
            .collect();
        assert_eq!(names, ["0", "1", "3", "length"]);
    }

    #[test]
    fn test_export() {
        let arr = dense(ints(0..2));
        arr.put_str("length", Value::int(3), true).unwrap();
        assert_eq!(
            arr.export().unwrap(),
            Exported::Array(vec![
                Some(Exported::Number(0.0)),
                Some(Exported::Number(1.0)),
                None
            ])
        );
    }

    #[test]
    fn test_from_slots() {
        let mut slots = SlotTable::new();
        slots.store(3, SlotValue::Plain(Value::int(3)));
        slots.store(
            1,
            SlotValue::Property(Property::data(Value::int(1), false, true, false)),
        );
        let arr = ArrayObject::from_slots(
            BaseObject::default(),
            slots,
            ArrayLength::new(8),
            PromotionPolicy::default(),
        );
        assert_eq!(arr.len(), 8);
        assert!(arr.get(0).is_none());
        assert!(arr.get(1).is_some_and(SlotValue::is_property));
        assert_eq!(arr.elements.property_count, 1);
        assert_eq!(arr.present(), 2);
    }

    #[test]
    fn test_counts_follow_writes_and_shrinks() {
        let mut arr = ArrayObject::from_values(None, ints(0..6));
        arr.elements.store(
            4,
            SlotValue::Property(Property::data(Value::int(4), true, true, true)),
        );
        arr.elements.remove(1);
        assert_eq!((arr.present(), arr.elements.property_count), (5, 1));

        assert!(arr.set_length(2, true).unwrap());
        assert_eq!((arr.present(), arr.elements.property_count), (1, 0));
    }

    #[test]
    fn test_far_write_goes_sparse() {
        let arr = dense(ints(0..6));
        let alias = arr.clone();
        assert!(arr.put(&Value::int(50_000_000), Value::int(1), true).unwrap());

        assert_eq!(arr.repr_kind(), ReprKind::Sparse);
        assert!(alias.ptr_eq(&arr));
        assert_eq!(arr.get_str("length").unwrap(), Value::int(50_000_001));
        assert_eq!(arr.get(&Value::int(50_000_000)).unwrap(), Value::int(1));
        assert_eq!(arr.get(&Value::int(3)).unwrap(), Value::int(3));
        assert!(!arr.has_own_property(&Value::int(6)).unwrap());

        // Another write keeps it sparse
        arr.put(&Value::int(7), Value::int(7), true).unwrap();
        assert_eq!(arr.repr_kind(), ReprKind::Sparse);
    }

    #[test]
    fn test_far_define_goes_sparse_and_keeps_attributes() {
        let arr = dense(ints(0..3));
        arr.define_own_property(
            &Value::int(1),
            PropertyDescriptor::data(Value::int(1)).configurable(false),
            true,
        )
        .unwrap();
        arr.define_own_property(
            &Value::int(1_000_000),
            PropertyDescriptor::data(Value::int(9))
                .enumerable(true)
                .configurable(true),
            true,
        )
        .unwrap();

        assert_eq!(arr.repr_kind(), ReprKind::Sparse);
        assert!(!arr.delete(&Value::int(1), false).unwrap());
        assert!(!arr.put_str("length", Value::int(0), false).unwrap());
        assert_eq!(arr.get_str("length").unwrap(), Value::int(2));
    }

    #[test]
    fn test_near_write_stays_dense() {
        let arr = dense(ints(0..1000));
        arr.put(&Value::int(9_000), Value::int(1), true).unwrap();
        assert_eq!(arr.repr_kind(), ReprKind::Dense);
        // Below the far-write floor even an empty array grows in place
        let empty = dense(Vec::new());
        empty.put(&Value::int(4_000), Value::int(1), true).unwrap();
        assert_eq!(empty.repr_kind(), ReprKind::Dense);
    }
}
