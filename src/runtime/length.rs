//! Array `length` handling
//!
//! `length` is a non-enumerable, non-configurable data property that both
//! array representations expose. Shrinking it deletes elements from the top
//! down and stops at the first element that cannot be deleted.

use tracing::debug;

use crate::error::{JsError, JsResult, reject};
use crate::runtime::property::{Property, PropertyDescriptor};
use crate::value::Value;

/// Element storage that `length` can shrink
pub trait IndexedStorage {
    /// Remove every element with index `>= new_len`, highest first
    ///
    /// On hitting a non-configurable element, stop and return its index;
    /// elements above it stay removed.
    fn truncate_from(&mut self, new_len: u32) -> Result<(), u32>;
}

/// Convert a value to an array length
///
/// Returns `None` for non-integral numbers and anything outside
/// `[0, 2^32 - 1]`.
pub fn to_length(value: &Value) -> Option<u32> {
    let n = value.to_number();
    if n.is_finite() && n >= 0.0 && n <= f64::from(u32::MAX) && n.trunc() == n {
        Some(n as u32)
    } else {
        None
    }
}

/// The `length` value of an array and its writability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayLength {
    value: u32,
    writable: bool,
}

impl ArrayLength {
    pub const fn new(value: u32) -> Self {
        ArrayLength {
            value,
            writable: true,
        }
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.value
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// `length` as a property descriptor
    pub fn property(&self) -> Property {
        Property::data(Value::int(i64::from(self.value)), self.writable, false, false)
    }

    /// Set the length to `new_len`, truncating `storage` when it shrinks
    pub fn set(
        &mut self,
        storage: &mut impl IndexedStorage,
        new_len: u32,
        throw: bool,
    ) -> JsResult<bool> {
        if new_len == self.value {
            return Ok(true);
        }
        if !self.writable {
            return reject(
                throw,
                JsError::WriteRejected("length is not writable".to_string()),
            );
        }
        if new_len < self.value {
            if let Err(blocking) = storage.truncate_from(new_len) {
                debug!(blocking, requested = new_len, "length shrink blocked");
                self.value = blocking + 1;
                return reject(throw, JsError::LengthRedefineRejected);
            }
        }
        self.value = new_len;
        Ok(true)
    }

    /// Assignment to `length`
    ///
    /// An invalid length raises [`JsError::RangeViolation`] regardless of
    /// `throw`; writability is checked first.
    pub fn set_from_value(
        &mut self,
        storage: &mut impl IndexedStorage,
        value: &Value,
        throw: bool,
    ) -> JsResult<bool> {
        let new_len = to_length(value);
        if new_len == Some(self.value) {
            return Ok(true);
        }
        if !self.writable {
            return reject(
                throw,
                JsError::WriteRejected("length is not writable".to_string()),
            );
        }
        match new_len {
            Some(new_len) => self.set(storage, new_len, throw),
            None => Err(JsError::RangeViolation),
        }
    }

    /// `defineProperty` on `length`
    pub fn define(
        &mut self,
        storage: &mut impl IndexedStorage,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        if desc.is_accessor()
            || desc.configurable == Some(true)
            || desc.enumerable == Some(true)
            || (desc.writable == Some(true) && !self.writable)
        {
            return reject(throw, JsError::LengthRedefineRejected);
        }
        let stored = match &desc.value {
            Some(value) => self.set_from_value(storage, value, throw),
            None => Ok(true),
        };
        // Becoming read-only sticks even when the shrink was blocked
        if desc.writable == Some(false) && !matches!(stored, Err(JsError::RangeViolation)) {
            self.writable = false;
        }
        stored
    }

    /// Raise the length to cover `index`
    pub(crate) fn cover(
        &mut self,
        storage: &mut impl IndexedStorage,
        index: u32,
        throw: bool,
    ) -> JsResult<bool> {
        if index < self.value {
            return Ok(true);
        }
        self.set(storage, index + 1, throw)
    }
}

impl Default for ArrayLength {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage with a fixed set of indices, some of them pinned
    struct Fake {
        present: Vec<u32>,
        pinned: Vec<u32>,
    }

    impl IndexedStorage for Fake {
        fn truncate_from(&mut self, new_len: u32) -> Result<(), u32> {
            while let Some(&top) = self.present.last() {
                if top < new_len {
                    break;
                }
                if self.pinned.contains(&top) {
                    return Err(top);
                }
                self.present.pop();
            }
            Ok(())
        }
    }

    fn fake(present: &[u32], pinned: &[u32]) -> Fake {
        Fake {
            present: present.to_vec(),
            pinned: pinned.to_vec(),
        }
    }

    #[test]
    fn test_to_length() {
        assert_eq!(to_length(&Value::int(0)), Some(0));
        assert_eq!(to_length(&Value::string("42")), Some(42));
        assert_eq!(to_length(&Value::number(4294967295.0)), Some(u32::MAX));
        assert_eq!(to_length(&Value::number(4294967296.0)), None);
        assert_eq!(to_length(&Value::number(-1.0)), None);
        assert_eq!(to_length(&Value::number(1.5)), None);
        assert_eq!(to_length(&Value::number(f64::NAN)), None);
    }

    #[test]
    fn test_shrink_blocked() {
        let mut storage = fake(&[1, 5, 9], &[5]);
        let mut len = ArrayLength::new(10);

        assert!(matches!(
            len.set(&mut storage, 0, true),
            Err(JsError::LengthRedefineRejected)
        ));
        assert_eq!(len.get(), 6);
        assert_eq!(storage.present, [1, 5]);

        let mut len = ArrayLength::new(10);
        let mut storage = fake(&[1, 5, 9], &[5]);
        assert!(!len.set(&mut storage, 0, false).unwrap());
        assert_eq!(len.get(), 6);
    }

    #[test]
    fn test_range_violation_ignores_throw() {
        let mut storage = fake(&[], &[]);
        let mut len = ArrayLength::new(3);
        assert!(matches!(
            len.set_from_value(&mut storage, &Value::number(-1.0), false),
            Err(JsError::RangeViolation)
        ));
        assert_eq!(len.get(), 3);
    }

    #[test]
    fn test_not_writable() {
        let mut storage = fake(&[0, 1], &[]);
        let mut len = ArrayLength::new(2);
        let freeze = PropertyDescriptor::default().writable(false);
        assert!(len.define(&mut storage, &freeze, true).unwrap());
        assert!(!len.is_writable());

        // Same value is still fine
        assert!(len.set(&mut storage, 2, true).unwrap());
        assert!(!len.set(&mut storage, 0, false).unwrap());
        assert!(matches!(
            len.set(&mut storage, 0, true),
            Err(JsError::WriteRejected(_))
        ));
        assert!(matches!(
            len.set_from_value(&mut storage, &Value::number(0.5), true),
            Err(JsError::WriteRejected(_))
        ));

        let thaw = PropertyDescriptor::default().writable(true);
        assert!(matches!(
            len.define(&mut storage, &thaw, true),
            Err(JsError::LengthRedefineRejected)
        ));
    }

    #[test]
    fn test_define_rejects_attribute_changes() {
        let mut storage = fake(&[], &[]);
        let mut len = ArrayLength::new(0);
        for desc in [
            PropertyDescriptor::default().enumerable(true),
            PropertyDescriptor::default().configurable(true),
            PropertyDescriptor::accessor(None, None),
        ] {
            assert!(!len.define(&mut storage, &desc, false).unwrap());
        }
        let grow = PropertyDescriptor::data(Value::int(7));
        assert!(len.define(&mut storage, &grow, true).unwrap());
        assert_eq!(len.get(), 7);
    }

    #[test]
    fn test_freeze_sticks_after_blocked_shrink() {
        let mut storage = fake(&[1, 5, 9], &[5]);
        let mut len = ArrayLength::new(10);
        let desc = PropertyDescriptor::data(Value::int(0)).writable(false);
        assert!(matches!(
            len.define(&mut storage, &desc, true),
            Err(JsError::LengthRedefineRejected)
        ));
        assert_eq!(len.get(), 6);
        assert!(!len.is_writable());

        let mut len = ArrayLength::new(10);
        let bad = PropertyDescriptor::data(Value::number(-1.0)).writable(false);
        assert!(matches!(
            len.define(&mut storage, &bad, false),
            Err(JsError::RangeViolation)
        ));
        assert!(len.is_writable());
    }

    #[test]
    fn test_property_attributes() {
        let p = ArrayLength::new(4).property();
        assert!(p.writable && !p.enumerable && !p.configurable && !p.accessor);
        assert_eq!(p.value, Value::int(4));
    }
}
