//! Event-to-value binding.
//!
//! Walks the parser's event stream and materialises a [`Value`] tree:
//! plain scalars go through type inference, anchors are recorded so aliases
//! can share their payloads, and `<<` merge keys fill in defaults from a
//! referenced mapping (or list of mappings) without overwriting members the
//! mapping already has.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use strata_value::{ObjectValue, Value};

use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::mark::Mark;
use crate::parser::Parser;

/// Load the first YAML document in `text` into a [`Value`].
///
/// # Example
///
/// ```
/// use strata_yaml::load_yaml_text;
///
/// let value = load_yaml_text("answer: 42").unwrap();
/// assert_eq!(value.member("answer").as_i32(), 42);
/// ```
pub fn load_yaml_text(text: &str) -> Result<Value> {
    let mut loader = Loader::new(Parser::from_str(text));
    loader.load()
}

/// Load the first YAML document from an arbitrary byte source.
pub fn load_yaml_reader<'a>(source: impl io::Read + 'a) -> Result<Value> {
    let mut loader = Loader::new(Parser::new(Box::new(source)));
    loader.load()
}

/// Load the first YAML document from a file.
pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| {
        Error::loader(format!("couldn't read {}", path.display()), Mark::default())
    })?;
    load_yaml_reader(io::BufReader::new(file))
}

enum Parsed {
    Node(Value),
    /// The enclosing sequence or mapping ended.
    End,
}

struct Loader<'a> {
    parser: Parser<'a>,
    anchors: HashMap<String, Value>,
}

impl<'a> Loader<'a> {
    fn new(parser: Parser<'a>) -> Loader<'a> {
        Loader {
            parser,
            anchors: HashMap::new(),
        }
    }

    fn load(&mut self) -> Result<Value> {
        match self.parse_node()? {
            Parsed::Node(value) => Ok(value),
            Parsed::End => Ok(Value::Null),
        }
    }

    fn register_anchor(&mut self, anchor: Option<String>, value: &Value) {
        if let Some(anchor) = anchor {
            self.anchors.insert(anchor, value.clone());
        }
    }

    fn parse_node(&mut self) -> Result<Parsed> {
        loop {
            let event = self.parser.next_event()?;

            match event.kind {
                EventKind::StreamStart { .. } | EventKind::DocumentStart { .. } => continue,

                EventKind::StreamEnd | EventKind::DocumentEnd { .. } => {
                    return Ok(Parsed::Node(Value::Null));
                }

                EventKind::SequenceStart { anchor, .. } => {
                    let mut items = Vec::new();
                    loop {
                        match self.parse_node()? {
                            Parsed::End => break,
                            Parsed::Node(item) => items.push(item),
                        }
                    }

                    let value = Value::from(items);
                    self.register_anchor(anchor, &value);
                    return Ok(Parsed::Node(value));
                }

                EventKind::MappingStart { anchor, .. } => {
                    let value = self.parse_mapping()?;
                    self.register_anchor(anchor, &value);
                    return Ok(Parsed::Node(value));
                }

                EventKind::SequenceEnd | EventKind::MappingEnd => return Ok(Parsed::End),

                EventKind::Alias { anchor } => {
                    return match self.anchors.get(&anchor) {
                        Some(value) => Ok(Parsed::Node(value.clone())),
                        None => Err(Error::loader(
                            format!("unknown anchor '{}'", anchor),
                            event.start_mark,
                        )),
                    };
                }

                EventKind::Scalar {
                    anchor,
                    value,
                    style,
                    ..
                } => {
                    let value = if style.is_quoted() {
                        Value::from(value)
                    } else {
                        classify_plain_scalar(&value)
                    };

                    self.register_anchor(anchor, &value);
                    return Ok(Parsed::Node(value));
                }
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value> {
        let mut object = ObjectValue::new();

        loop {
            let event = self.parser.next_event()?;

            match event.kind {
                EventKind::MappingEnd => break,

                EventKind::Scalar { value: key, .. } => {
                    if key == "<<" {
                        let source = match self.parse_node()? {
                            Parsed::Node(value) => value,
                            Parsed::End => Value::Null,
                        };
                        merge_defaults(&mut object, &source, event.start_mark)?;
                    } else {
                        let member = match self.parse_node()? {
                            Parsed::Node(value) => value,
                            Parsed::End => Value::Null,
                        };
                        *object.update_member(&key) = member;
                    }
                }

                _ => {
                    return Err(Error::loader(
                        "expecting scalar value for key",
                        event.start_mark,
                    ));
                }
            }
        }

        Ok(Value::from(object))
    }
}

/// Apply `<<` merge-key semantics: fill `target` with members of the
/// referenced mapping(s) without overwriting members it already has. An
/// array source merges each element in turn, supporting the
/// `<<: [*a, *b]` idiom.
fn merge_defaults(target: &mut ObjectValue, source: &Value, mark: Mark) -> Result<()> {
    match source {
        Value::Object(defaults) => {
            insert_absent(target, defaults);
            Ok(())
        }
        Value::Array(elements) => {
            for element in elements.iter() {
                match element {
                    Value::Object(defaults) => insert_absent(target, defaults),
                    _ => return Err(Error::loader("can't merge non-mapping", mark)),
                }
            }
            Ok(())
        }
        _ => Err(Error::loader("can't merge non-mapping", mark)),
    }
}

fn insert_absent(target: &mut ObjectValue, defaults: &ObjectValue) {
    for (name, value) in defaults.iter() {
        if !target.has_member(name) {
            target.set_member(name, value.clone());
        }
    }
}

/// Infer the type of a plain scalar.
///
/// Null and boolean forms are case-insensitive; the IEEE special floats are
/// not (`-.inf`, `.inf`, `.nan` only). Numbers may use `_` separators and a
/// `0o` octal prefix; whatever fails both integer and float parsing is a
/// string.
fn classify_plain_scalar(text: &str) -> Value {
    if text.is_empty() || text == "~" || text.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    if text.eq_ignore_ascii_case("true") {
        return Value::from(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::from(false);
    }

    if text == "-.inf" {
        return Value::from(f64::NEG_INFINITY);
    }
    if text == ".inf" {
        return Value::from(f64::INFINITY);
    }
    if text == ".nan" {
        return Value::from(f64::NAN);
    }

    let mut number: String = text.chars().filter(|c| *c != '_').collect();
    if number.starts_with("0o") {
        // Rewrite the YAML 1.2-style octal prefix to the C-style one the
        // integer parser understands.
        number.remove(1);
    }

    if let Some(int) = parse_int_auto(&number) {
        return if int >= i64::from(i32::MIN) && int <= i64::from(i32::MAX) {
            Value::from(int as i32)
        } else {
            Value::from(int)
        };
    }

    if let Ok(float) = number.parse::<f64>() {
        return Value::from(float);
    }

    Value::from(text)
}

/// C-style integer parsing with base detection: `0x` hex, leading `0`
/// octal, decimal otherwise. The whole string must be consumed.
fn parse_int_auto(text: &str) -> Option<i64> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if magnitude.is_empty() {
        return None;
    }

    let (radix, digits) = if let Some(hex) = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        (16, hex)
    } else if magnitude.len() > 1 && magnitude.starts_with('0') {
        (8, &magnitude[1..])
    } else {
        (10, magnitude)
    };

    if digits.is_empty() {
        return None;
    }

    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::ValueType;

    #[test]
    fn classify_null_forms() {
        assert!(classify_plain_scalar("").is_null());
        assert!(classify_plain_scalar("~").is_null());
        assert!(classify_plain_scalar("null").is_null());
        assert!(classify_plain_scalar("NULL").is_null());
    }

    #[test]
    fn classify_bools_case_insensitively() {
        assert_eq!(classify_plain_scalar("true"), Value::from(true));
        assert_eq!(classify_plain_scalar("False"), Value::from(false));
        assert_eq!(classify_plain_scalar("TRUE"), Value::from(true));
    }

    #[test]
    fn classify_float_specials_case_sensitively() {
        assert_eq!(
            classify_plain_scalar(".inf").as_f64(),
            f64::INFINITY
        );
        assert_eq!(
            classify_plain_scalar("-.inf").as_f64(),
            f64::NEG_INFINITY
        );
        assert!(classify_plain_scalar(".nan").as_f64().is_nan());

        // The capitalised variants are not special forms.
        assert_eq!(classify_plain_scalar(".Inf").value_type(), ValueType::String);
    }

    #[test]
    fn classify_integers_with_bases() {
        assert_eq!(classify_plain_scalar("42"), Value::from(42));
        assert_eq!(classify_plain_scalar("-17"), Value::from(-17));
        assert_eq!(classify_plain_scalar("0x10"), Value::from(16));
        assert_eq!(classify_plain_scalar("017"), Value::from(15));
        assert_eq!(classify_plain_scalar("0o17"), Value::from(15));
        assert_eq!(classify_plain_scalar("1_000_000"), Value::from(1_000_000));
    }

    #[test]
    fn wide_integers_use_the_64_bit_kind() {
        assert_eq!(
            classify_plain_scalar("5000000000"),
            Value::from(5_000_000_000_i64)
        );
        assert_eq!(classify_plain_scalar("2147483647"), Value::from(i32::MAX));
        assert_eq!(
            classify_plain_scalar("2147483648"),
            Value::from(2_147_483_648_i64)
        );
    }

    #[test]
    fn classify_floats() {
        assert_eq!(classify_plain_scalar("1.5"), Value::from(1.5));
        assert_eq!(classify_plain_scalar("-2e3"), Value::from(-2000.0));
        assert_eq!(classify_plain_scalar("1_0.5"), Value::from(10.5));
    }

    #[test]
    fn everything_else_is_a_string() {
        assert_eq!(classify_plain_scalar("hello"), Value::from("hello"));
        assert_eq!(classify_plain_scalar("0x"), Value::from("0x"));
        assert_eq!(classify_plain_scalar("1.2.3"), Value::from("1.2.3"));
        assert_eq!(classify_plain_scalar("12abc"), Value::from("12abc"));
    }
}
