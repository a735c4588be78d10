//! Dotted-path access into value trees.
//!
//! Paths are dotted member chains with optional bracketed array indices,
//! e.g. `render.targets[2].width`. Lookups degrade to the shared null value
//! on any missing segment; the writable variant creates intermediate
//! objects for member segments but requires array elements to exist
//! already (there is no way to create array holes).

use crate::Value;

/// Look up a value by path, returning the shared null on any miss.
///
/// # Example
///
/// ```
/// use strata_value::{member_path, Value};
///
/// let mut config = Value::new_object();
/// config.set_member("sizes", Value::from(vec![Value::from(4), Value::from(8)]));
///
/// assert_eq!(member_path(&config, "sizes[1]").as_i32(), 8);
/// assert!(member_path(&config, "sizes[9]").is_null());
/// assert!(member_path(&config, "missing.deeper").is_null());
/// ```
pub fn member_path<'a>(value: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return value;
    }

    let (field, rest) = split_path(path);
    let next = path_field(value, field);

    if rest.is_empty() {
        next
    } else {
        member_path(next, rest)
    }
}

/// Writable path access. Member segments are created as needed (nulls
/// auto-convert to objects); a wrong-kind segment or a missing array
/// element reports `None`.
pub fn update_member_path<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(value);
    }

    let (field, rest) = split_path(path);
    let next = update_path_field(value, field)?;

    if rest.is_empty() {
        Some(next)
    } else {
        update_member_path(next, rest)
    }
}

/// Split off the leading path segment. The separator search starts after
/// the first character so a leading `.` or `[` stays attached to its own
/// segment.
fn split_path(path: &str) -> (&str, &str) {
    let first = path.chars().next().map_or(0, char::len_utf8);
    let sep = path[first..]
        .find(['.', '['])
        .map_or(path.len(), |offset| offset + first);

    (&path[..sep], &path[sep..])
}

fn array_index(field: &str) -> Option<usize> {
    let body = field.strip_prefix('[')?.strip_suffix(']')?;
    body.parse().ok()
}

fn path_field<'a>(value: &'a Value, field: &str) -> &'a Value {
    if value.as_array().is_some() && field.starts_with('[') {
        return match array_index(field) {
            Some(index) => value.elt(index),
            None => Value::null(),
        };
    }

    let key = field.strip_prefix('.').unwrap_or(field);
    value.member(key)
}

fn update_path_field<'a>(value: &'a mut Value, field: &str) -> Option<&'a mut Value> {
    if value.as_array().is_some() && field.starts_with('[') {
        return value.elt_mut(array_index(field)?);
    }

    let key = field.strip_prefix('.').unwrap_or(field);
    value.update_member(key)
}
