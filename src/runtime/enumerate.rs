//! Property enumeration
//!
//! [`PropertyIter`] walks an object's own indexed properties in ascending
//! order, then its named properties in insertion order, then (when asked)
//! each prototype in turn. Each step re-resolves the object through its
//! handle, so no borrow is held between items.

use std::collections::HashSet;
use std::rc::Rc;

use crate::runtime::object::Object;
use crate::runtime::property::SlotValue;

/// One enumerated property: its name and raw slot
#[derive(Debug, Clone)]
pub struct PropertyItem {
    pub name: Rc<str>,
    pub value: SlotValue,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    /// Indexed properties; holds the last index yielded
    Indices(Option<u32>),
    /// Named properties; holds the next table position
    Names(usize),
}

/// Iterator over property names
///
/// A name is reported once even when it appears again further up the
/// prototype chain; shadowed non-enumerable names hide enumerable ones.
/// Enumeration ends early if the object becomes unusable mid-walk.
pub struct PropertyIter {
    current: Option<Object>,
    stage: Stage,
    all: bool,
    recursive: bool,
    seen: HashSet<Rc<str>>,
}

impl PropertyIter {
    pub(crate) fn new(object: Object, all: bool, recursive: bool) -> Self {
        PropertyIter {
            current: Some(object),
            stage: Stage::Indices(None),
            all,
            recursive,
            seen: HashSet::new(),
        }
    }

    /// The next property in walk order, before filtering
    fn advance(&mut self) -> Option<PropertyItem> {
        loop {
            let object = self.current.clone()?;
            match self.stage {
                Stage::Indices(after) => match object.with_impl(|o| o.next_index_entry(after)).ok()? {
                    Some((index, value)) => {
                        self.stage = Stage::Indices(Some(index));
                        return Some(PropertyItem {
                            name: Rc::from(index.to_string()),
                            value,
                        });
                    }
                    None => self.stage = Stage::Names(0),
                },
                Stage::Names(pos) => match object.with_impl(|o| o.string_entry(pos)).ok()? {
                    Some((next, name, value)) => {
                        self.stage = Stage::Names(next);
                        return Some(PropertyItem { name, value });
                    }
                    None => {
                        self.current = if self.recursive {
                            object.prototype().ok()?
                        } else {
                            None
                        };
                        self.stage = Stage::Indices(None);
                    }
                },
            }
        }
    }
}

impl Iterator for PropertyIter {
    type Item = PropertyItem;

    fn next(&mut self) -> Option<PropertyItem> {
        while let Some(item) = self.advance() {
            if self.seen.insert(item.name.clone()) && (self.all || item.value.is_enumerable()) {
                return Some(item);
            }
        }
        None
    }
}
