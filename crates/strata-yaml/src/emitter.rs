//! Minimal YAML output.
//!
//! Writes a small block-style dialect: objects as `key: ` lines, array
//! entries as `- ` lines, and leaf scalars in their single-line JSON form
//! (so strings come out double-quoted and round-trip exactly).

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use strata_json::{as_json, JsonFormat};
use strata_value::Value;

/// Render `value` as YAML text with the given indent step.
///
/// # Example
///
/// ```
/// use strata_value::Value;
/// use strata_yaml::as_yaml;
///
/// let mut value = Value::new_object();
/// value.set_member("name", Value::from("box"));
/// value.set_member("sizes", Value::from(vec![Value::from(1), Value::from(2)]));
///
/// assert_eq!(as_yaml(&value, 2), "name: \"box\"\nsizes: \n  - 1\n  - 2\n");
/// ```
pub fn as_yaml(value: &Value, indent: i32) -> String {
    let mut out = String::new();
    write_value(&mut out, value, indent.max(1) as usize, 0);
    out
}

/// Write `value` as YAML to a file.
pub fn save_as_yaml(path: impl AsRef<Path>, value: &Value, indent: i32) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(as_yaml(value, indent).as_bytes())
}

fn write_value(out: &mut String, value: &Value, tab: usize, indent: usize) {
    match value {
        Value::Object(object) => {
            if indent > 0 {
                out.push('\n');
            }

            for (name, member) in object.iter() {
                push_spaces(out, indent);
                out.push_str(name);
                out.push_str(": ");
                write_value(out, member, tab, indent + tab);
            }
        }

        Value::Array(elements) => {
            if indent > 0 {
                out.push('\n');
            }

            for element in elements.iter() {
                push_spaces(out, (indent + tab).saturating_sub(2));
                out.push_str("- ");
                write_value(out, element, tab, indent + tab);
            }
        }

        _ => {
            out.push_str(&as_json(value, -1, JsonFormat::default()));
            out.push('\n');
        }
    }
}

fn push_spaces(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::ObjectValue;

    #[test]
    fn scalar_leaves_use_json_form() {
        assert_eq!(as_yaml(&Value::from(5), 2), "5\n");
        assert_eq!(as_yaml(&Value::from("hi"), 2), "\"hi\"\n");
        assert_eq!(as_yaml(&Value::Null, 2), "null\n");
    }

    #[test]
    fn nested_objects_indent() {
        let mut inner = ObjectValue::new();
        inner.set_member("x", Value::from(1));

        let mut outer = ObjectValue::new();
        outer.set_member("inner", Value::from(inner));

        let text = as_yaml(&Value::from(outer), 2);
        assert_eq!(text, "inner: \n  x: 1\n");
    }

    #[test]
    fn arrays_use_dash_entries() {
        let mut object = ObjectValue::new();
        object.set_member(
            "items",
            Value::from(vec![Value::from(1), Value::from(2)]),
        );

        let text = as_yaml(&Value::from(object), 2);
        assert_eq!(text, "items: \n  - 1\n  - 2\n");
    }

    #[test]
    fn output_reloads_to_an_equal_tree() {
        let mut inner = ObjectValue::new();
        inner.set_member("name", Value::from("deep"));
        inner.set_member("factor", Value::from(2.5));

        let mut object = ObjectValue::new();
        object.set_member("title", Value::from("test: with punctuation"));
        object.set_member("inner", Value::from(inner));
        object.set_member(
            "list",
            Value::from(vec![Value::from(1), Value::from("two")]),
        );

        let value = Value::from(object);
        let text = as_yaml(&value, 2);
        let reloaded = crate::load_yaml_text(&text).expect("reload failed");

        assert_eq!(reloaded.compare(&value), std::cmp::Ordering::Equal);
    }
}
