//! Sorted slot table for sparse arrays
//!
//! Slots are kept in strictly ascending index order, so lookup is a binary
//! search and enumeration is a linear walk. The table also counts how many
//! slots carry explicit attributes, which lets truncation skip the
//! configurability scan when every slot is plain.

use crate::error::JsResult;
use crate::runtime::length::IndexedStorage;
use crate::runtime::property::SlotValue;
use crate::value::{Exported, Value};

/// One present element of a sparse array
#[derive(Debug, Clone)]
pub struct IndexedSlot {
    pub index: u32,
    pub value: SlotValue,
}

/// Slots ordered by index
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    items: Vec<IndexedSlot>,
    /// Number of slots holding [`SlotValue::Property`]
    property_count: usize,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a list of elements; `None` entries are holes
    ///
    /// Returns the table and the list length.
    pub fn from_values(values: impl IntoIterator<Item = Option<Value>>) -> (Self, u32) {
        let mut table = SlotTable::new();
        let mut len = 0u32;
        for value in values {
            if let Some(value) = value {
                table.items.push(IndexedSlot {
                    index: len,
                    value: SlotValue::Plain(value),
                });
            }
            len += 1;
        }
        (table, len)
    }

    /// Build a table from slots already in ascending index order
    pub(crate) fn from_ordered(items: Vec<IndexedSlot>) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0].index < w[1].index));
        let property_count = items.iter().filter(|s| s.value.is_property()).count();
        SlotTable {
            items,
            property_count,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn property_count(&self) -> usize {
        self.property_count
    }

    pub fn highest_index(&self) -> Option<u32> {
        self.items.last().map(|s| s.index)
    }

    /// One past the highest present index
    pub fn sort_len(&self) -> u32 {
        self.highest_index().map_or(0, |i| i + 1)
    }

    /// Binary search for `index`: `Ok(pos)` if present, `Err(insert_pos)` otherwise
    #[inline]
    pub fn find(&self, index: u32) -> Result<usize, usize> {
        self.items.binary_search_by_key(&index, |s| s.index)
    }

    pub fn get(&self, index: u32) -> Option<&SlotValue> {
        self.find(index).ok().map(|pos| &self.items[pos].value)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.find(index).is_ok()
    }

    /// Mutable access to the slot at `pos`
    ///
    /// Callers may change the value but not the slot kind.
    pub(crate) fn value_at_mut(&mut self, pos: usize) -> &mut SlotValue {
        &mut self.items[pos].value
    }

    /// Insert a new slot at `pos`, as returned by a failed [`Self::find`]
    pub(crate) fn insert_at(&mut self, pos: usize, index: u32, value: SlotValue) {
        debug_assert_eq!(self.find(index), Err(pos));
        if value.is_property() {
            self.property_count += 1;
        }
        self.items.insert(pos, IndexedSlot { index, value });
    }

    /// Replace the slot at `pos`, keeping the attribute count in step
    pub(crate) fn replace_at(&mut self, pos: usize, value: SlotValue) -> SlotValue {
        let slot = &mut self.items[pos];
        match (slot.value.is_property(), value.is_property()) {
            (false, true) => self.property_count += 1,
            (true, false) => self.property_count -= 1,
            _ => {}
        }
        std::mem::replace(&mut slot.value, value)
    }

    /// Insert or replace the slot for `index`
    pub fn store(&mut self, index: u32, value: SlotValue) {
        match self.find(index) {
            Ok(pos) => {
                self.replace_at(pos, value);
            }
            Err(pos) => self.insert_at(pos, index, value),
        }
    }

    pub fn remove(&mut self, index: u32) -> Option<SlotValue> {
        let pos = self.find(index).ok()?;
        let slot = self.items.remove(pos);
        if slot.value.is_property() {
            self.property_count -= 1;
        }
        Some(slot.value)
    }

    /// The first slot with index greater than `after` (or the first slot)
    pub fn entry_after(&self, after: Option<u32>) -> Option<&IndexedSlot> {
        let pos = match after {
            None => 0,
            Some(after) => match self.find(after) {
                Ok(pos) => pos + 1,
                Err(pos) => pos,
            },
        };
        self.items.get(pos)
    }

    /// Exchange the contents of two present slots
    pub fn swap(&mut self, i: u32, j: u32) {
        if let (Ok(a), Ok(b)) = (self.find(i), self.find(j)) {
            let tmp = std::mem::replace(
                &mut self.items[a].value,
                SlotValue::Plain(Value::Undefined),
            );
            self.items[a].value = std::mem::replace(&mut self.items[b].value, tmp);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedSlot> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<IndexedSlot> {
        self.items
    }

    /// Export elements below `len` into a vector of that length; holes are `None`
    pub fn export_snapshot(&self, len: u32) -> JsResult<Vec<Option<Exported>>> {
        let mut out = vec![None; len as usize];
        for slot in self.items.iter().take_while(|s| s.index < len) {
            out[slot.index as usize] = Some(slot.value.export()?);
        }
        Ok(out)
    }

    /// Check the ordering invariant
    pub fn is_ordered(&self) -> bool {
        self.items.windows(2).all(|w| w[0].index < w[1].index)
    }
}

impl IndexedStorage for SlotTable {
    fn truncate_from(&mut self, new_len: u32) -> Result<(), u32> {
        let cut = match self.find(new_len) {
            Ok(pos) | Err(pos) => pos,
        };
        if self.property_count == 0 {
            self.items.truncate(cut);
            return Ok(());
        }
        for pos in (cut..self.items.len()).rev() {
            if let SlotValue::Property(p) = &self.items[pos].value {
                if !p.configurable {
                    let blocking = self.items[pos].index;
                    self.items.truncate(pos + 1);
                    return Err(blocking);
                }
                self.property_count -= 1;
            }
        }
        self.items.truncate(cut);
        Ok(())
    }
}
