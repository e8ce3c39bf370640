//! Runtime object model
//!
//! This module contains the object representations and the handle that
//! ties them together:
//! - Array index canonicalization
//! - Property attributes, descriptors and the string-keyed property table
//! - Generic objects, the representation trait and the object handle
//! - Sparse arrays (slot table + length controller + promotion gate)
//! - Dense arrays
//! - Lazily materialized objects
//! - Property enumeration

pub mod array;
pub mod enumerate;
pub mod index;
pub mod lazy;
pub mod length;
pub mod object;
pub mod promote;
pub mod property;
pub mod slots;
pub mod sparse;

pub use array::ArrayObject;
pub use enumerate::{PropertyItem, PropertyIter};
pub use index::{MAX_ARRAY_INDEX, str_to_index, to_index};
pub use lazy::LazyObject;
pub use length::ArrayLength;
pub use object::{
    Assignment, BaseObject, Hint, Object, ObjectImpl, ReprKind, Representation, Step,
};
pub use property::{Property, PropertyDescriptor, PropertyKey, PropertyTable, SlotValue};
pub use slots::{IndexedSlot, SlotTable};
pub use sparse::SparseArrayObject;
