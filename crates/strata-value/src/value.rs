//! The `Value` variant type.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::id::id_from_str;
use crate::object::ObjectValue;

/// Discriminant of a [`Value`].
///
/// The declaration order defines the cross-type ordering used by
/// [`Value::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    UInt,
    Int64,
    UInt64,
    Double,
    String,
    Array,
    Object,
}

impl ValueType {
    /// Lowercase name, for error messages and dumps.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::Int64 => "int64",
            ValueType::UInt64 => "uint64",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

/// A generically typed configuration value.
///
/// `Value` is designed to fail gracefully rather than panic: queries against
/// the wrong kind return the shared null value (or `false`/a default), and
/// writes against the wrong kind report `None` so the caller can ignore or
/// surface the mismatch. The idea is to keep call sites free of
/// error-checking boilerplate.
///
/// Cloning is cheap for strings and arrays, whose payloads are immutable and
/// shared by reference count. Object payloads are mutable and therefore
/// deep-copied on clone, so mutations never leak between values.
///
/// # Example
///
/// ```
/// use strata_value::Value;
///
/// let mut config = Value::new_object();
/// config.set_member("name", Value::from("strata"));
/// config.set_member("workers", Value::from(4));
///
/// assert_eq!(config.member("workers").as_i32(), 4);
/// assert!(config.member("missing").is_null());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    UInt(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Object(Box<ObjectValue>),
}

static NULL_VALUE: Value = Value::Null;

impl Value {
    /// The shared immutable null value returned by failed lookups.
    pub fn null() -> &'static Value {
        &NULL_VALUE
    }

    /// A default value of the given type: zero for numbers, empty for
    /// strings/arrays/objects.
    pub fn of_type(value_type: ValueType) -> Value {
        match value_type {
            ValueType::Null => Value::Null,
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::UInt => Value::UInt(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::UInt64 => Value::UInt64(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::String => Value::String(Arc::from("")),
            ValueType::Array => Value::Array(Arc::from([])),
            ValueType::Object => Value::new_object(),
        }
    }

    /// An empty object value.
    pub fn new_object() -> Value {
        Value::Object(Box::default())
    }

    /// An array of `n` null values.
    pub fn new_array(n: usize) -> Value {
        Value::Array(std::iter::repeat_with(|| Value::Null).take(n).collect())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::Int64(_) => ValueType::Int64,
            Value::UInt64(_) => ValueType::UInt64,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_uint(&self) -> bool {
        matches!(self, Value::UInt(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    /// True for bool and all four integer kinds.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::UInt(_)
                | Value::Int64(_)
                | Value::UInt64(_)
        )
    }

    /// True for integral kinds and double.
    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_double()
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// True if an array, or null (convertible to an array on write).
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Null)
    }

    /// True if an object, or null (convertible to an object on write).
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Null)
    }

    /// Report whether this value converts to `other` without loss, per the
    /// range of the held value rather than just the kinds involved.
    pub fn is_convertible_to(&self, other: ValueType) -> bool {
        use ValueType as T;

        match *self {
            Value::Null => true,

            Value::Bool(_) => matches!(
                other,
                T::Bool | T::Int | T::UInt | T::Int64 | T::UInt64 | T::Double
            ),

            Value::Int(v) => match other {
                T::Bool | T::Int | T::Int64 | T::Double => true,
                T::UInt | T::UInt64 => v >= 0,
                _ => false,
            },

            Value::UInt(v) => match other {
                T::Bool | T::UInt | T::Int64 | T::UInt64 | T::Double => true,
                T::Int => v <= i32::MAX as u32,
                _ => false,
            },

            Value::Int64(v) => match other {
                T::Bool | T::Int64 | T::Double => true,
                T::Int => v >= i64::from(i32::MIN) && v <= i64::from(i32::MAX),
                T::UInt => v >= 0 && v <= i64::from(u32::MAX),
                T::UInt64 => v >= 0,
                _ => false,
            },

            Value::UInt64(v) => match other {
                T::Bool | T::UInt64 | T::Double => true,
                T::Int => v <= i32::MAX as u64,
                T::UInt => v <= u64::from(u32::MAX),
                T::Int64 => v <= i64::MAX as u64,
                _ => false,
            },

            Value::Double(v) => match other {
                T::Bool | T::Double => true,
                T::Int => v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX),
                T::UInt => v >= 0.0 && v <= f64::from(u32::MAX),
                T::Int64 => v >= i64::MIN as f64 && v <= i64::MAX as f64,
                T::UInt64 => v >= 0.0 && v <= u64::MAX as f64,
                _ => false,
            },

            Value::String(_) => matches!(other, T::Bool | T::String),
            Value::Array(_) => matches!(other, T::Bool | T::Array),
            Value::Object(_) => matches!(other, T::Bool | T::Object),
        }
    }

    // --- Coercions ----------------------------------------------------------

    pub fn as_bool(&self) -> bool {
        self.as_bool_or(false)
    }

    pub fn as_bool_or(&self, default: bool) -> bool {
        match self {
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::UInt(v) => *v != 0,
            Value::Int64(v) => *v != 0,
            Value::UInt64(v) => *v != 0,
            Value::Double(v) => *v != 0.0,
            Value::String(v) => v.eq_ignore_ascii_case("true"),
            Value::Array(v) => !v.is_empty(),
            Value::Object(v) => !v.is_empty(),
            Value::Null => default,
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.as_i32_or(0)
    }

    /// Saturating conversion to `i32`; `default` when not numeric.
    pub fn as_i32_or(&self, default: i32) -> i32 {
        match *self {
            Value::Bool(v) => i32::from(v),
            Value::Int(v) => v,
            Value::UInt(v) => {
                if v > i32::MAX as u32 {
                    i32::MAX
                } else {
                    v as i32
                }
            }
            Value::Int64(v) => {
                if v > i64::from(i32::MAX) {
                    i32::MAX
                } else if v < i64::from(i32::MIN) {
                    i32::MIN
                } else {
                    v as i32
                }
            }
            Value::UInt64(v) => {
                if v > i32::MAX as u64 {
                    i32::MAX
                } else {
                    v as i32
                }
            }
            Value::Double(v) => {
                if v < f64::from(i32::MIN) {
                    i32::MIN
                } else if v > f64::from(i32::MAX) {
                    i32::MAX
                } else {
                    v as i32
                }
            }
            _ => default,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.as_u32_or(0)
    }

    /// Saturating conversion to `u32`; negatives clamp to zero.
    pub fn as_u32_or(&self, default: u32) -> u32 {
        match *self {
            Value::Bool(v) => u32::from(v),
            Value::Int(v) => {
                if v < 0 {
                    0
                } else {
                    v as u32
                }
            }
            Value::UInt(v) => v,
            Value::Int64(v) => {
                if v > i64::from(u32::MAX) {
                    u32::MAX
                } else if v < 0 {
                    0
                } else {
                    v as u32
                }
            }
            Value::UInt64(v) => {
                if v > u64::from(u32::MAX) {
                    u32::MAX
                } else {
                    v as u32
                }
            }
            Value::Double(v) => {
                if v < 0.0 {
                    0
                } else if v > f64::from(u32::MAX) {
                    u32::MAX
                } else {
                    v as u32
                }
            }
            _ => default,
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.as_i64_or(0)
    }

    pub fn as_i64_or(&self, default: i64) -> i64 {
        match *self {
            Value::Bool(v) => i64::from(v),
            Value::Int(v) => i64::from(v),
            Value::UInt(v) => i64::from(v),
            Value::Int64(v) => v,
            Value::UInt64(v) => {
                if v > i64::MAX as u64 {
                    i64::MAX
                } else {
                    v as i64
                }
            }
            Value::Double(v) => {
                if v < i64::MIN as f64 {
                    i64::MIN
                } else if v > i64::MAX as f64 {
                    i64::MAX
                } else {
                    v as i64
                }
            }
            _ => default,
        }
    }

    pub fn as_u64(&self) -> u64 {
        self.as_u64_or(0)
    }

    pub fn as_u64_or(&self, default: u64) -> u64 {
        match *self {
            Value::Bool(v) => u64::from(v),
            Value::Int(v) => {
                if v < 0 {
                    0
                } else {
                    v as u64
                }
            }
            Value::UInt(v) => u64::from(v),
            Value::Int64(v) => {
                if v < 0 {
                    0
                } else {
                    v as u64
                }
            }
            Value::UInt64(v) => v,
            Value::Double(v) => {
                if v < 0.0 {
                    0
                } else if v > u64::MAX as f64 {
                    u64::MAX
                } else {
                    v as u64
                }
            }
            _ => default,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.as_f32_or(0.0)
    }

    pub fn as_f32_or(&self, default: f32) -> f32 {
        match *self {
            Value::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(v) => v as f32,
            Value::UInt(v) => v as f32,
            Value::Int64(v) => v as f32,
            Value::UInt64(v) => v as f32,
            Value::Double(v) => v as f32,
            _ => default,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.as_f64_or(0.0)
    }

    pub fn as_f64_or(&self, default: f64) -> f64 {
        match *self {
            Value::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(v) => f64::from(v),
            Value::UInt(v) => f64::from(v),
            Value::Int64(v) => v as f64,
            Value::UInt64(v) => v as f64,
            Value::Double(v) => v,
            _ => default,
        }
    }

    pub fn as_str(&self) -> &str {
        self.as_str_or("")
    }

    /// The string payload, `"true"`/`"false"` for bools, `default` otherwise.
    pub fn as_str_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Value::String(v) => v,
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            _ => default,
        }
    }

    /// The string payload only, with no bool fallback.
    pub fn as_str_opt(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// 32-bit ID form: the FNV-1a hash of the lowercased string with the
    /// high bit forced, or the low 32 bits of an integer kind, saturating.
    pub fn as_id(&self) -> u32 {
        self.as_id_or(0)
    }

    pub fn as_id_or(&self, default: u32) -> u32 {
        match *self {
            Value::String(ref v) => id_from_str(v),
            Value::UInt(v) => v,
            Value::Int(v) => {
                if v < 0 {
                    0
                } else {
                    v as u32
                }
            }
            Value::Int64(v) => {
                if v < 0 {
                    0
                } else if v > i64::from(u32::MAX) {
                    u32::MAX
                } else {
                    v as u32
                }
            }
            Value::UInt64(v) => {
                if v > u64::from(u32::MAX) {
                    u32::MAX
                } else {
                    v as u32
                }
            }
            _ => default,
        }
    }

    // --- Array access -------------------------------------------------------

    /// The array elements, or `None` if not an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(elts) => Some(elts),
            _ => None,
        }
    }

    /// Element `index`, clamped to the shared null when out of range or not
    /// an array.
    pub fn elt(&self, index: usize) -> &Value {
        match self {
            Value::Array(elts) => elts.get(index).unwrap_or(Value::null()),
            _ => Value::null(),
        }
    }

    /// Mutable element access. Since array payloads may be shared, the
    /// payload is copied first if anything else holds a reference to it.
    pub fn elt_mut(&mut self, index: usize) -> Option<&mut Value> {
        let Value::Array(elts) = self else {
            return None;
        };
        if index >= elts.len() {
            return None;
        }

        if Arc::get_mut(elts).is_none() {
            let copied: Arc<[Value]> = elts.iter().cloned().collect();
            *elts = copied;
        }

        Arc::get_mut(elts).map(|elts| &mut elts[index])
    }

    pub fn num_elts(&self) -> usize {
        match self {
            Value::Array(elts) => elts.len(),
            _ => 0,
        }
    }

    // --- Object access ------------------------------------------------------

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// If null, become an empty object. Returns true if the value is an
    /// object afterwards.
    pub fn to_object(&mut self) -> bool {
        if self.is_null() {
            *self = Value::new_object();
        }
        matches!(self, Value::Object(_))
    }

    /// Object member lookup; the shared null when absent or not an object.
    pub fn member(&self, key: &str) -> &Value {
        match self {
            Value::Object(object) => object.member(key),
            _ => Value::null(),
        }
    }

    pub fn member_opt(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.member_opt(key))
    }

    /// Writable member access, inserting a null member if absent. A null
    /// value auto-converts to an object first; any other non-object kind
    /// reports `None`.
    pub fn update_member(&mut self, key: &str) -> Option<&mut Value> {
        if !self.to_object() {
            return None;
        }
        self.as_object_mut().map(|object| object.update_member(key))
    }

    /// Set a member, silently doing nothing if this is a non-object kind
    /// other than null.
    pub fn set_member(&mut self, key: &str, value: Value) {
        if let Some(member) = self.update_member(key) {
            *member = value;
        }
    }

    pub fn remove_member(&mut self, key: &str) -> bool {
        match self {
            Value::Object(object) => object.remove_member(key),
            _ => false,
        }
    }

    pub fn has_member(&self, key: &str) -> bool {
        match self {
            Value::Object(object) => object.has_member(key),
            _ => false,
        }
    }

    pub fn num_members(&self) -> usize {
        match self {
            Value::Object(object) => object.len(),
            _ => 0,
        }
    }

    pub fn member_name(&self, index: usize) -> Option<&str> {
        self.as_object().and_then(|object| object.member_name(index))
    }

    pub fn member_value(&self, index: usize) -> &Value {
        match self {
            Value::Object(object) => object.member_value(index),
            _ => Value::null(),
        }
    }

    // --- Container-generic helpers ------------------------------------------

    /// Number of elements or members; string length in bytes; 0 otherwise.
    pub fn len(&self) -> usize {
        match self {
            Value::String(v) => v.len(),
            Value::Array(v) => v.len(),
            Value::Object(v) => v.len(),
            _ => 0,
        }
    }

    /// True for null and for empty strings/arrays/objects.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(v) => v.is_empty(),
            Value::Array(v) => v.is_empty(),
            Value::Object(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Drop string/array payloads or remove all object members. The kind is
    /// kept for containers; scalars are untouched.
    pub fn clear(&mut self) {
        match self {
            Value::String(v) => *v = Arc::from(""),
            Value::Array(v) => *v = Arc::from([]),
            Value::Object(v) => v.clear(),
            _ => {}
        }
    }

    /// Reset to null, releasing any payload.
    pub fn make_null(&mut self) {
        *self = Value::Null;
    }

    // --- Merge / swap / compare ---------------------------------------------

    /// Merge `overrides` into this value. A null override is a no-op; two
    /// objects merge recursively (null members remove); anything else
    /// replaces this value.
    pub fn merge(&mut self, overrides: &Value) {
        if overrides.is_null() {
            return;
        }

        match (&mut *self, overrides) {
            (Value::Object(target), Value::Object(source)) => target.merge(source),
            (slot, _) => *slot = overrides.clone(),
        }
    }

    /// Exchange payloads. Two objects swap contents so that both
    /// modification counters advance.
    pub fn swap(&mut self, other: &mut Value) {
        if let (Value::Object(a), Value::Object(b)) = (&mut *self, &mut *other) {
            a.swap(b);
        } else {
            std::mem::swap(self, other);
        }
    }

    /// Total order over (type, payload). NaN doubles compare as equal to
    /// each other so the order stays total.
    pub fn compare(&self, other: &Value) -> Ordering {
        let type_order = self.value_type().cmp(&other.value_type());
        if type_order != Ordering::Equal {
            return type_order;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::UInt(a), Value::UInt(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::UInt64(a), Value::UInt64(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Array(a), Value::Array(b)) => {
                let len_order = a.len().cmp(&b.len());
                if len_order != Ordering::Equal {
                    return len_order;
                }
                for (elt, other_elt) in a.iter().zip(b.iter()) {
                    let elt_order = elt.compare(other_elt);
                    if elt_order != Ordering::Equal {
                        return elt_order;
                    }
                }
                Ordering::Equal
            }
            (Value::Object(a), Value::Object(b)) => a.compare(b),
            _ => Ordering::Equal,
        }
    }
}

// --- Conversions ------------------------------------------------------------

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values.into())
    }
}

impl From<Arc<[Value]>> for Value {
    fn from(values: Arc<[Value]>) -> Self {
        Value::Array(values)
    }
}

impl From<ObjectValue> for Value {
    fn from(object: ObjectValue) -> Self {
        Value::Object(Box::new(object))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}
