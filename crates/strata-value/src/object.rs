//! Ordered member map backing object-typed values.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::Value;

/// The mutable payload of an object-typed [`Value`].
///
/// Members keep their insertion order; inserting under an existing key
/// replaces the value without moving it, and removal shifts later members
/// down so that member indices stay dense.
///
/// Every structural change bumps [`mod_count`](ObjectValue::mod_count),
/// which external observers can poll for cheap change detection. The
/// counter is not part of equality.
#[derive(Debug, Clone, Default)]
pub struct ObjectValue {
    members: IndexMap<Arc<str>, Value>,
    mod_count: u32,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current value of the modification counter.
    pub fn mod_count(&self) -> u32 {
        self.mod_count
    }

    /// Look up a member, returning the shared null value if absent.
    pub fn member(&self, key: &str) -> &Value {
        self.members.get(key).unwrap_or(Value::null())
    }

    /// Look up a member without the null fallback.
    pub fn member_opt(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    /// Mutable lookup of an existing member. Counts as a modification when
    /// the member exists, since the caller receives write access.
    pub fn member_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.members.get_mut(key) {
            Some(value) => {
                self.mod_count = self.mod_count.wrapping_add(1);
                Some(value)
            }
            None => None,
        }
    }

    /// Return the member under `key`, inserting a null value first if it
    /// does not exist yet.
    pub fn update_member(&mut self, key: &str) -> &mut Value {
        self.mod_count = self.mod_count.wrapping_add(1);

        let index = match self.members.get_index_of(key) {
            Some(index) => index,
            None => self.members.insert_full(Arc::from(key), Value::Null).0,
        };

        &mut self.members[index]
    }

    /// Variant of [`update_member`](Self::update_member) that takes a
    /// pre-shared key, so repeated inserts of the same key string can share
    /// one allocation.
    pub fn update_member_shared(&mut self, key: &Arc<str>) -> &mut Value {
        self.mod_count = self.mod_count.wrapping_add(1);

        let index = match self.members.get_index_of(&**key) {
            Some(index) => index,
            None => self.members.insert_full(Arc::clone(key), Value::Null).0,
        };

        &mut self.members[index]
    }

    pub fn set_member(&mut self, key: &str, value: Value) {
        *self.update_member(key) = value;
    }

    /// Remove the named member. Returns false if it does not exist.
    pub fn remove_member(&mut self, key: &str) -> bool {
        if self.members.shift_remove(key).is_some() {
            self.mod_count = self.mod_count.wrapping_add(1);
            true
        } else {
            false
        }
    }

    pub fn has_member(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// Name of the i'th member.
    pub fn member_name(&self, index: usize) -> Option<&str> {
        self.members.get_index(index).map(|(name, _)| &**name)
    }

    /// Value of the i'th member, or the shared null if out of range.
    pub fn member_value(&self, index: usize) -> &Value {
        match self.members.get_index(index) {
            Some((_, value)) => value,
            None => Value::null(),
        }
    }

    /// Index of the member with the given name.
    pub fn member_index(&self, key: &str) -> Option<usize> {
        self.members.get_index_of(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(name, value)| (&**name, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.mod_count = self.mod_count.wrapping_add(1);
        self.members.iter_mut().map(|(name, value)| (&**name, value))
    }

    /// Remove all members.
    pub fn clear(&mut self) {
        self.members.clear();
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    /// Merge `overrides` into this object, recursively for object-typed
    /// members. A null value in `overrides` removes the member.
    pub fn merge(&mut self, overrides: &ObjectValue) {
        for (name, value) in &overrides.members {
            if value.is_null() {
                self.remove_member(name);
            } else {
                self.update_member_shared(name).merge(value);
            }
        }
    }

    /// Exchange contents with `other`. Both mod counts advance.
    pub fn swap(&mut self, other: &mut ObjectValue) {
        std::mem::swap(&mut self.members, &mut other.members);
        self.mod_count = self.mod_count.wrapping_add(1);
        other.mod_count = other.mod_count.wrapping_add(1);
    }

    /// Total order: size first, then the i'th key and i'th value for each i.
    pub fn compare(&self, other: &ObjectValue) -> Ordering {
        let order = self.members.len().cmp(&other.members.len());
        if order != Ordering::Equal {
            return order;
        }

        for (index, (name, value)) in self.members.iter().enumerate() {
            let (other_name, other_value) = match other.members.get_index(index) {
                Some(entry) => entry,
                None => return Ordering::Greater,
            };

            let key_order = name.as_bytes().cmp(other_name.as_bytes());
            if key_order != Ordering::Equal {
                return key_order;
            }

            let value_order = value.compare(other_value);
            if value_order != Ordering::Equal {
                return value_order;
            }
        }

        Ordering::Equal
    }
}

// The modification counter is an observation token, not state. Members are
// compared in order, consistent with `compare`.
impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(other.members.iter())
                .all(|((name, value), (other_name, other_value))| {
                    name == other_name && value == other_value
                })
    }
}

impl<'a> IntoIterator for &'a ObjectValue {
    type Item = (&'a Arc<str>, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Arc<str>, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
