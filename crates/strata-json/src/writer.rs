//! The JSON writer.
//!
//! Emission is driven by [`JsonFormat`]: indentation (including the two
//! single-line modes), key quoting, float precision and zero trimming, the
//! treatment of infinities/NaN, and the array margin — short arrays stay on
//! one line, arrays whose one-line rendering would cross the margin wrap
//! one element per line.

use strata_value::Value;

/// How to emit the floating point specials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfNanStyle {
    /// `inf` / `nan`.
    C,
    /// `Infinity` / `NaN`.
    Js,
    /// As a null value.
    Null,
}

/// Output options.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat {
    /// Indent level. -1 = single line, -2 = single line with spaces removed.
    pub indent: i32,
    /// Quote all keys (strict json) rather than using bare keys where
    /// possible (json5 etc).
    pub quote_keys: bool,
    /// Margin to use when wrapping arrays, or 0 to wrap every array.
    pub array_margin: i32,
    /// Max precision to use for reals.
    pub max_precision: i32,
    /// Remove trailing zeroes for a minimal text representation.
    pub trim_zeroes: bool,
    /// How to emit floating point specials.
    pub inf_nan: InfNanStyle,
}

impl Default for JsonFormat {
    fn default() -> Self {
        JsonFormat {
            indent: 2,
            quote_keys: false,
            array_margin: 74,
            max_precision: 6,
            trim_zeroes: true,
            inf_nan: InfNanStyle::Js,
        }
    }
}

impl JsonFormat {
    /// Options that strict json parsers will accept.
    pub fn strict() -> JsonFormat {
        JsonFormat {
            indent: 2,
            quote_keys: true,
            array_margin: 0,
            max_precision: 6,
            trim_zeroes: true,
            inf_nan: InfNanStyle::Null,
        }
    }
}

/// Quick conversion to a single-line string.
///
/// # Example
///
/// ```
/// use strata_json::{as_json, JsonFormat};
/// use strata_value::Value;
///
/// let mut value = Value::new_object();
/// value.set_member("a", Value::from(1));
///
/// assert_eq!(as_json(&value, -1, JsonFormat::default()), "{ a: 1 }");
/// ```
pub fn as_json(value: &Value, indent: i32, mut format: JsonFormat) -> String {
    format.indent = indent;
    let mut writer = JsonWriter::new(format);
    writer.write(value)
}

/// Convert with the format's own indent setting.
pub fn as_json_formatted(value: &Value, format: &JsonFormat) -> String {
    let mut writer = JsonWriter::new(*format);
    writer.write(value)
}

/// Stateful writer; reusable across values.
pub struct JsonWriter {
    format: JsonFormat,
    document: String,
    indent: usize,
    add_child_values: bool,
    child_values: Vec<String>,
}

impl JsonWriter {
    pub fn new(format: JsonFormat) -> JsonWriter {
        JsonWriter {
            format,
            document: String::new(),
            indent: 0,
            add_child_values: false,
            child_values: Vec::new(),
        }
    }

    pub fn write(&mut self, value: &Value) -> String {
        self.document.clear();
        self.add_child_values = false;
        self.indent = 0;

        self.write_value(value);

        std::mem::take(&mut self.document)
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.push_value("null"),
            Value::Bool(true) => self.push_value("true"),
            Value::Bool(false) => self.push_value("false"),
            Value::Int(v) => self.push_value(&v.to_string()),
            Value::UInt(v) => self.push_value(&v.to_string()),
            Value::Int64(v) => self.push_value(&v.to_string()),
            Value::UInt64(v) => self.push_value(&v.to_string()),
            Value::Double(v) => {
                let text = format_double(*v, &self.format);
                self.push_value(&text);
            }
            Value::String(v) => {
                let text = quoted_string(v);
                self.push_value(&text);
            }
            Value::Array(_) => self.write_array_value(value),
            Value::Object(object) => {
                if object.is_empty() {
                    self.push_value("{}");
                    return;
                }

                self.write_with_indent("{");
                self.increase_indent();

                let count = object.len();
                for (index, (name, child)) in object.iter().enumerate() {
                    self.write_indent();

                    if self.format.quote_keys || !is_bare_token(name) {
                        self.document.push_str(&quoted_string(name));
                    } else {
                        self.document.push_str(name);
                    }

                    if self.format.indent < -1 {
                        self.document.push(':');
                    } else {
                        self.document.push_str(": ");
                    }

                    self.write_value(child);

                    if index + 1 < count {
                        self.document.push(',');
                    }
                }

                self.decrease_indent();
                self.write_with_indent("}");
            }
        }
    }

    fn write_array_value(&mut self, value: &Value) {
        let size = value.num_elts();

        if size == 0 {
            self.push_value("[]");
            return;
        }

        let multi_line = self.format.indent >= 0 && self.is_multi_line_array(value);
        let has_child_values = !self.child_values.is_empty();

        if multi_line {
            self.write_with_indent("[");
            self.increase_indent();

            for index in 0..size {
                if has_child_values {
                    let text = self.child_values[index].clone();
                    self.write_with_indent(&text);
                } else {
                    self.write_indent();
                    self.write_value(value.elt(index));
                }

                if index + 1 < size {
                    self.document.push(',');
                }
            }

            self.decrease_indent();
            self.write_with_indent("]");
        } else {
            self.document.push('[');

            for index in 0..size {
                if index > 0 {
                    self.document.push(',');
                    if self.format.indent >= -1 {
                        self.document.push(' ');
                    }
                }

                if has_child_values {
                    let text = self.child_values[index].clone();
                    self.document.push_str(&text);
                } else {
                    self.write_value(value.elt(index));
                }
            }

            self.document.push(']');
        }

        self.child_values.clear();
    }

    /// Decide whether an array needs one element per line. Arrays holding
    /// non-empty collections always wrap; otherwise the elements are
    /// rendered into a side buffer and the one-line width is measured
    /// against the margin.
    fn is_multi_line_array(&mut self, value: &Value) -> bool {
        if self.format.array_margin == 0 {
            return true;
        }

        let size = value.num_elts();
        let mut multi_line = size as i32 * 3 >= self.format.array_margin;

        for index in 0..size {
            if multi_line {
                break;
            }
            let child = value.elt(index);
            if (matches!(child, Value::Array(_)) || matches!(child, Value::Object(_)))
                && !child.is_empty()
            {
                multi_line = true;
            }
        }

        if !multi_line {
            self.child_values.reserve(size);
            self.add_child_values = true;

            // '[' + ', ' per separator + ']'
            let mut line_length = 2 + (size.saturating_sub(1)) * 2;

            for index in 0..size {
                self.write_value(value.elt(index));
                line_length += self.child_values[index].len();
            }

            self.add_child_values = false;
            multi_line = line_length as i32 >= self.format.array_margin;
        }

        multi_line
    }

    fn push_value(&mut self, text: &str) {
        if self.add_child_values {
            self.child_values.push(text.to_string());
        } else {
            self.document.push_str(text);
        }
    }

    fn write_indent(&mut self) {
        if self.format.indent < 0 {
            if self.format.indent == -1 && !self.document.is_empty() {
                self.document.push(' ');
            }
            return;
        }

        if let Some(last) = self.document.chars().last() {
            if last == ' ' {
                return; // already indented
            }
            if last != '\n' {
                self.document.push('\n');
            }
        }

        for _ in 0..self.indent {
            self.document.push(' ');
        }
    }

    fn write_with_indent(&mut self, text: &str) {
        self.write_indent();
        self.document.push_str(text);
    }

    fn increase_indent(&mut self) {
        if self.format.indent >= 0 {
            self.indent += self.format.indent as usize;
        }
    }

    fn decrease_indent(&mut self) {
        if self.format.indent >= 0 {
            self.indent = self.indent.saturating_sub(self.format.indent as usize);
        }
    }
}

/// True if `name` can be written without quotes in the lax dialect.
fn is_bare_token(name: &str) -> bool {
    let mut bytes = name.bytes();

    match bytes.next() {
        Some(c) if c.is_ascii_alphabetic() || c == b'_' || c == b'@' => {}
        _ => return false,
    }

    bytes.all(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'@' | b'.' | b'-' | b'+' | b'='))
}

fn quoted_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');

    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }

    out.push('"');
    out
}

/// `%g`-style formatting: `max_precision` significant digits, switching to
/// exponential notation for very large or small magnitudes.
fn format_double(value: f64, format: &JsonFormat) -> String {
    if value.is_infinite() {
        return match format.inf_nan {
            InfNanStyle::C => {
                if value < 0.0 {
                    "-inf".into()
                } else {
                    "inf".into()
                }
            }
            InfNanStyle::Js => {
                if value < 0.0 {
                    "-Infinity".into()
                } else {
                    "Infinity".into()
                }
            }
            InfNanStyle::Null => "null".into(),
        };
    }

    if value.is_nan() {
        return match format.inf_nan {
            InfNanStyle::C => "nan".into(),
            InfNanStyle::Js => "NaN".into(),
            InfNanStyle::Null => "null".into(),
        };
    }

    let precision = format.max_precision.max(1) as usize;

    let text = if value == 0.0 {
        format!("{:.*}", precision - 1, 0.0)
    } else {
        // Decimal exponent, from the exponential rendering.
        let exponent = format!("{:e}", value)
            .split('e')
            .nth(1)
            .and_then(|e| e.parse::<i32>().ok())
            .unwrap_or(0);

        if exponent < -4 || exponent >= precision as i32 {
            let mantissa = format!("{:.*e}", precision - 1, value);
            match mantissa.split_once('e') {
                Some((digits, exp)) => {
                    let exp: i32 = exp.parse().unwrap_or(0);
                    format!("{}e{}{:02}", digits, if exp < 0 { '-' } else { '+' }, exp.abs())
                }
                None => mantissa,
            }
        } else {
            let fraction_digits = (precision as i32 - 1 - exponent).max(0) as usize;
            format!("{:.*}", fraction_digits, value)
        }
    };

    if !format.trim_zeroes {
        return text;
    }

    trim_zeroes(&text)
}

/// Remove trailing zeroes (and a dangling dot) from the decimal part.
fn trim_zeroes(text: &str) -> String {
    let (mantissa, exponent) = match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text, None),
    };

    let trimmed = if mantissa.contains('.') {
        let trimmed = mantissa.trim_end_matches('0');
        trimmed.strip_suffix('.').unwrap_or(trimmed)
    } else {
        mantissa
    };

    match exponent {
        Some(exponent) => format!("{}e{}", trimmed, exponent),
        None => trimmed.to_string(),
    }
}
