//! Sparse array representation
//!
//! Elements live in a [`SlotTable`] ordered by index, so storage grows with
//! the number of present elements rather than with `length`. Writing index
//! 1,000,000 into an empty array stores one slot.
//!
//! When an insertion finds the table large and tightly packed, the array
//! asks its handle to switch to the dense representation (see
//! [`crate::runtime::promote`]) and the insertion is replayed there.

use std::rc::Rc;

use crate::config::PromotionPolicy;
use crate::error::{JsResult, reject};
use crate::runtime::length::ArrayLength;
use crate::runtime::object::{
    Assignment, BaseObject, Object, ObjectImpl, Representation, Step, array_string_entry,
    assign_existing, gate_new_property,
};
use crate::runtime::promote::{promote, should_promote};
use crate::runtime::property::{
    Property, PropertyDescriptor, PropertyKey, SlotValue, apply_descriptor,
};
use crate::runtime::slots::SlotTable;
use crate::value::{ExportType, Exported, Value};

/// Array backed by a sorted slot table
pub struct SparseArrayObject {
    pub(crate) base: BaseObject,
    pub(crate) slots: SlotTable,
    pub(crate) length: ArrayLength,
    policy: PromotionPolicy,
}

impl SparseArrayObject {
    pub fn new(prototype: Option<Object>, policy: PromotionPolicy) -> Self {
        SparseArrayObject {
            base: BaseObject::new("Array", prototype),
            slots: SlotTable::new(),
            length: ArrayLength::new(0),
            policy,
        }
    }

    pub(crate) fn from_parts(
        base: BaseObject,
        slots: SlotTable,
        length: ArrayLength,
        policy: PromotionPolicy,
    ) -> Self {
        SparseArrayObject {
            base,
            slots,
            length,
            policy,
        }
    }

    /// Replace the contents with `values`; `None` entries become holes and
    /// `length` becomes the list length
    pub fn set_values(&mut self, values: impl IntoIterator<Item = Option<Value>>) {
        let (slots, len) = SlotTable::from_values(values);
        self.slots = slots;
        self.length = ArrayLength::new(len);
    }

    #[inline]
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    #[inline]
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    #[inline]
    pub fn policy(&self) -> PromotionPolicy {
        self.policy
    }

    pub fn set_length(&mut self, new_len: u32, throw: bool) -> JsResult<bool> {
        self.length.set(&mut self.slots, new_len, throw)
    }

    /// Hand the slots to a dense array if inserting `index` leaves the table packed
    fn admit(&mut self, index: u32) -> Option<Representation> {
        if should_promote(&self.policy, &self.slots, index) {
            Some(Representation::Dense(promote(self)))
        } else {
            None
        }
    }

    fn put_index(
        &mut self,
        index: u32,
        key: &PropertyKey,
        value: Value,
        throw: bool,
        inherited: Option<&Property>,
    ) -> JsResult<Step<Assignment>> {
        let pos = match self.slots.find(index) {
            Ok(pos) => {
                let slot = self.slots.value_at_mut(pos);
                return assign_existing(slot, value, throw, key).map(Step::Done);
            }
            Err(pos) => pos,
        };

        if let Some(settled) = gate_new_property(inherited, self.base.extensible, throw, key)? {
            return Ok(Step::Done(settled));
        }
        if !self.length.cover(&mut self.slots, index, throw)? {
            return Ok(Step::Done(Assignment::Stored(false)));
        }
        if let Some(dense) = self.admit(index) {
            return Ok(Step::Replace(dense));
        }
        self.slots.insert_at(pos, index, SlotValue::Plain(value));
        Ok(Step::Done(Assignment::Stored(true)))
    }

    fn define_index(
        &mut self,
        index: u32,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>> {
        let found = self.slots.find(index);
        let existing = self.slots.get(index);
        let Some(slot) = apply_descriptor(key, existing, self.base.extensible, desc, throw)? else {
            return Ok(Step::Done(false));
        };
        if !self.length.cover(&mut self.slots, index, throw)? {
            return Ok(Step::Done(false));
        }
        match found {
            Ok(pos) => {
                self.slots.replace_at(pos, slot);
            }
            Err(pos) => {
                if let Some(dense) = self.admit(index) {
                    return Ok(Step::Replace(dense));
                }
                self.slots.insert_at(pos, index, slot);
            }
        }
        Ok(Step::Done(true))
    }

    fn delete_index(&mut self, index: u32, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        match self.slots.get(index) {
            None => Ok(true),
            Some(slot) if !slot.is_configurable() => reject(throw, self.base.cannot_delete(key)),
            Some(_) => {
                self.slots.remove(index);
                Ok(true)
            }
        }
    }
}

impl ObjectImpl for SparseArrayObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<SlotValue> {
        match key {
            PropertyKey::Index(index) => self.slots.get(*index).cloned(),
            k if k.is_length() => Some(SlotValue::Property(self.length.property())),
            PropertyKey::String(name) => self.base.get_named(name),
        }
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => self.slots.contains(*index),
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
        match key {
            PropertyKey::Index(index) => self.put_index(*index, key, value, throw, inherited),
            k if k.is_length() => {
                let stored = self.length.set_from_value(&mut self.slots, &value, throw)?;
                Ok(Step::Done(Assignment::Stored(stored)))
            }
            _ => self.base.put_named(key, value, throw, inherited).map(Step::Done),
        }
    }

    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<Step<bool>> {
        match key {
            PropertyKey::Index(index) => self.define_index(*index, key, desc, throw),
            k if k.is_length() => self.length.define(&mut self.slots, desc, throw).map(Step::Done),
            _ => self.base.define_named(key, desc, throw).map(Step::Done),
        }
    }

    fn delete(&mut self, key: &PropertyKey, throw: bool) -> JsResult<bool> {
        match key {
            PropertyKey::Index(index) => self.delete_index(*index, key, throw),
            k if k.is_length() => reject(throw, self.base.cannot_delete(key)),
            _ => self.base.delete_named(key, throw),
        }
    }

    fn next_index_entry(&self, after: Option<u32>) -> Option<(u32, SlotValue)> {
        self.slots
            .entry_after(after)
            .map(|slot| (slot.index, slot.value.clone()))
    }

    fn string_entry(&self, pos: usize) -> Option<(usize, Rc<str>, SlotValue)> {
        array_string_entry(&self.base, &self.length, pos)
    }

    fn export(&self) -> JsResult<Exported> {
        self.slots
            .export_snapshot(self.length.get())
            .map(Exported::Array)
    }

    fn export_type(&self) -> ExportType {
        ExportType::Array
    }

    fn sort_len(&self) -> u32 {
        self.slots.sort_len()
    }

    fn sort_get(&self, index: u32) -> Option<SlotValue> {
        self.slots.get(index).cloned()
    }

    fn swap(&mut self, i: u32, j: u32) {
        self.slots.swap(i, j);
    }
}
