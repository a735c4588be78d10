//! The JSON reader.
//!
//! Reads a practical JSON dialect: `//` and `/* */` comments, trailing
//! commas and bare-word keys are accepted unless strict mode is on, and
//! `Infinity`/`NaN` literals are understood. Numbers keep the narrowest
//! value kind that holds them (i32, then u32, i64, u64, finally f64).
//!
//! On a syntax error the reader records a diagnostic and skips ahead to the
//! close of the enclosing collection, so one run can report several
//! independent problems.

use strata_value::{ObjectValue, Value};

use crate::error::{Diagnostic, ParseErrors};

/// Read a JSON document.
///
/// # Example
///
/// ```
/// use strata_json::load_json_text;
///
/// let value = load_json_text("{ workers: 4, /* inline */ name: \"pool\" }").unwrap();
/// assert_eq!(value.member("workers").as_i32(), 4);
/// assert_eq!(value.member("name").as_str(), "pool");
/// ```
pub fn load_json_text(text: &str) -> Result<Value, ParseErrors> {
    load_json_text_opts(text, false)
}

/// Read a JSON document; `strict` turns off comments-adjacent laxness
/// (trailing commas and bare keys).
pub fn load_json_text_opts(text: &str, strict: bool) -> Result<Value, ParseErrors> {
    let mut reader = Reader::new(text, strict);
    let value = reader.read_document();

    if reader.errors.is_empty() {
        Ok(value)
    } else {
        Err(reader.into_errors())
    }
}

/// Read a JSON file.
pub fn load_json_file(path: impl AsRef<std::path::Path>) -> Result<Value, ParseErrors> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => load_json_text(&text),
        Err(_) => Err(ParseErrors {
            diagnostics: vec![Diagnostic {
                message: format!("Couldn't read {}", path.display()),
                line: 0,
                column: 0,
            }],
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    EndOfStream,
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    String,
    Number,
    MinusInfinity,
    Infinity,
    NaN,
    True,
    False,
    Null,
    ArraySeparator,
    MemberSeparator,
    Comment,
    Error,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

struct ErrorInfo {
    message: String,
    offset: usize,
}

struct Reader<'a> {
    text: &'a str,
    bytes: &'a [u8],
    current: usize,
    errors: Vec<ErrorInfo>,

    allow_unquoted_strings: bool,
    allow_trailing_commas: bool,
}

/// Signals "an error was recorded and recovery already ran".
struct Fail;

fn is_start_token_char(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'@'
}

fn is_token_char(c: u8) -> bool {
    // In particular, NOT ':' ',' or brackets.
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'@' | b'.' | b'-' | b'+' | b'=')
}

impl<'a> Reader<'a> {
    fn new(text: &'a str, strict: bool) -> Reader<'a> {
        Reader {
            text,
            bytes: text.as_bytes(),
            current: 0,
            errors: Vec::new(),
            allow_unquoted_strings: !strict,
            allow_trailing_commas: !strict,
        }
    }

    fn read_document(&mut self) -> Value {
        let value = match self.read_value() {
            Ok(value) => value,
            Err(Fail) => Value::Null,
        };

        self.skip_spaces();

        if self.errors.is_empty() && self.current != self.bytes.len() {
            self.add_error("trailing garbage", self.current);
        }

        value
    }

    fn read_value(&mut self) -> Result<Value, Fail> {
        let token = self.read_non_comment_token();
        self.read_value_from(token)
    }

    fn read_value_from(&mut self, token: Token) -> Result<Value, Fail> {
        match token.kind {
            TokenKind::ObjectBegin => self.read_object(),
            TokenKind::ArrayBegin => self.read_array(),
            TokenKind::Number => self.decode_number(token),
            TokenKind::String => self.decode_string_value(token),
            TokenKind::MinusInfinity => Ok(Value::from(f64::NEG_INFINITY)),
            TokenKind::Infinity => Ok(Value::from(f64::INFINITY)),
            TokenKind::NaN => Ok(Value::from(f64::NAN)),
            TokenKind::True => Ok(Value::from(true)),
            TokenKind::False => Ok(Value::from(false)),
            TokenKind::Null => Ok(Value::Null),
            _ => {
                self.add_error("Syntax error: value, object or array expected.", token.start);
                Err(Fail)
            }
        }
    }

    // --- Tokens -------------------------------------------------------------

    fn read_non_comment_token(&mut self) -> Token {
        loop {
            let token = self.read_token();
            if token.kind != TokenKind::Comment {
                return token;
            }
        }
    }

    fn read_token(&mut self) -> Token {
        self.skip_spaces();

        let start = self.current;
        let c = self.next_char();
        let mut kind;
        let mut ok = true;
        let mut valid_unquoted = false;

        match c {
            b'{' => kind = TokenKind::ObjectBegin,
            b'}' => kind = TokenKind::ObjectEnd,
            b'[' => kind = TokenKind::ArrayBegin,
            b']' => kind = TokenKind::ArrayEnd,
            b'"' => {
                kind = TokenKind::String;
                ok = self.read_string();
            }
            b'/' => {
                kind = TokenKind::Comment;
                ok = self.read_comment();
            }
            b'-' if self.matches("Infinity") || self.matches("inf") => {
                kind = TokenKind::MinusInfinity;
            }
            b'-' | b'+' | b'0'..=b'9' => {
                kind = TokenKind::Number;
                self.read_number();
            }
            b'I' => {
                kind = TokenKind::Infinity;
                valid_unquoted = true;
                ok = self.matches("nfinity");
            }
            b'i' => {
                kind = TokenKind::Infinity;
                valid_unquoted = true;
                ok = self.matches("nf");
            }
            b'N' => {
                kind = TokenKind::NaN;
                valid_unquoted = true;
                ok = self.matches("aN");
            }
            b't' => {
                kind = TokenKind::True;
                valid_unquoted = true;
                ok = self.matches("rue");
            }
            b'f' => {
                kind = TokenKind::False;
                valid_unquoted = true;
                ok = self.matches("alse");
            }
            b'n' => {
                valid_unquoted = true;
                if self.matches("ull") {
                    kind = TokenKind::Null;
                } else if self.matches("an") {
                    kind = TokenKind::NaN;
                } else {
                    kind = TokenKind::Error;
                    ok = false;
                }
            }
            b',' => kind = TokenKind::ArraySeparator,
            b':' => kind = TokenKind::MemberSeparator,
            0 => kind = TokenKind::EndOfStream,
            c => {
                valid_unquoted = is_start_token_char(c);
                kind = TokenKind::Error;
                ok = false;
            }
        }

        if !ok && self.allow_unquoted_strings && valid_unquoted {
            kind = TokenKind::String;
            self.read_unquoted_string();
            ok = true;
        }

        if !ok {
            kind = TokenKind::Error;
        }

        Token {
            kind,
            start,
            end: self.current,
        }
    }

    fn skip_spaces(&mut self) {
        while let Some(&c) = self.bytes.get(self.current) {
            if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' {
                self.current += 1;
            } else {
                break;
            }
        }
    }

    fn next_char(&mut self) -> u8 {
        match self.bytes.get(self.current) {
            Some(&c) => {
                self.current += 1;
                c
            }
            None => 0,
        }
    }

    /// Consume `pattern` if it follows immediately and is not glued to
    /// further token characters.
    fn matches(&mut self, pattern: &str) -> bool {
        let end = self.current + pattern.len();
        if end > self.bytes.len() {
            return false;
        }
        if &self.bytes[self.current..end] != pattern.as_bytes() {
            return false;
        }
        if let Some(&next) = self.bytes.get(end) {
            if is_token_char(next) {
                return false;
            }
        }
        self.current = end;
        true
    }

    fn read_comment(&mut self) -> bool {
        match self.next_char() {
            b'*' => self.read_c_style_comment(),
            b'/' => self.read_line_comment(),
            _ => false,
        }
    }

    fn read_c_style_comment(&mut self) -> bool {
        while self.current < self.bytes.len() {
            let c = self.next_char();
            if c == b'*' && self.bytes.get(self.current) == Some(&b'/') {
                break;
            }
        }
        self.next_char() == b'/'
    }

    fn read_line_comment(&mut self) -> bool {
        while self.current < self.bytes.len() {
            let c = self.next_char();
            if c == b'\r' || c == b'\n' {
                break;
            }
        }
        true
    }

    fn read_number(&mut self) {
        while let Some(&c) = self.bytes.get(self.current) {
            if !c.is_ascii_digit() && !matches!(c, b'.' | b'e' | b'E' | b'+' | b'-') {
                break;
            }
            self.current += 1;
        }
    }

    fn read_string(&mut self) -> bool {
        let mut c = 0;
        while self.current < self.bytes.len() {
            c = self.next_char();
            if c == b'\\' {
                self.next_char();
            } else if c == b'"' {
                break;
            }
        }
        c == b'"'
    }

    fn read_unquoted_string(&mut self) {
        while let Some(&c) = self.bytes.get(self.current) {
            if !is_token_char(c) {
                break;
            }
            self.current += 1;
        }
    }

    // --- Collections --------------------------------------------------------

    fn read_object(&mut self) -> Result<Value, Fail> {
        let mut object = ObjectValue::new();
        let mut first = true;

        loop {
            let token_name = self.read_non_comment_token();

            if token_name.kind == TokenKind::ObjectEnd && (first || self.allow_trailing_commas)
            {
                break;
            }

            if token_name.kind != TokenKind::String {
                return self.add_error_and_recover(
                    "Object member name isn't a String",
                    token_name,
                    TokenKind::ObjectEnd,
                );
            }

            let name = match self.decode_string(token_name) {
                Ok(name) => name,
                Err(Fail) => return self.recover_from_error(TokenKind::ObjectEnd),
            };

            let colon = self.read_non_comment_token();
            if colon.kind != TokenKind::MemberSeparator {
                return self.add_error_and_recover(
                    "Missing ':' after object member name",
                    colon,
                    TokenKind::ObjectEnd,
                );
            }

            let value = match self.read_value() {
                Ok(value) => value,
                Err(Fail) => return self.recover_from_error(TokenKind::ObjectEnd),
            };
            object.set_member(&name, value);
            first = false;

            let comma = self.read_non_comment_token();
            if comma.kind != TokenKind::ObjectEnd && comma.kind != TokenKind::ArraySeparator {
                return self.add_error_and_recover(
                    "Missing ',' or '}' in object declaration",
                    comma,
                    TokenKind::ObjectEnd,
                );
            }

            if comma.kind == TokenKind::ObjectEnd {
                break;
            }
        }

        Ok(Value::from(object))
    }

    fn read_array(&mut self) -> Result<Value, Fail> {
        let mut array: Vec<Value> = Vec::new();

        loop {
            let token = self.read_non_comment_token();

            // ']' may close an empty array, or follow a trailing comma.
            if token.kind == TokenKind::ArrayEnd
                && (self.allow_trailing_commas || array.is_empty())
            {
                break;
            }

            let value = match self.read_value_from(token) {
                Ok(value) => value,
                Err(Fail) => return self.recover_from_error(TokenKind::ArrayEnd),
            };
            array.push(value);

            let separator = self.read_non_comment_token();

            if separator.kind == TokenKind::ArrayEnd {
                break;
            }

            if separator.kind != TokenKind::ArraySeparator {
                return self.add_error_and_recover(
                    "Expecting ',' in array declaration",
                    separator,
                    TokenKind::ArrayEnd,
                );
            }
        }

        Ok(Value::from(array))
    }

    // --- Decoding -----------------------------------------------------------

    fn decode_number(&mut self, token: Token) -> Result<Value, Fail> {
        let text = &self.text[token.start..token.end];

        // Anything with a fraction, exponent or interior sign is a double.
        let is_double = text.bytes().enumerate().any(|(index, c)| {
            matches!(c, b'.' | b'e' | b'E' | b'+') || (c == b'-' && index != 0)
        });

        if is_double {
            return self.decode_double(token);
        }

        // The double check above leaves at most one leading '-'.
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut value: u64 = 0;
        for c in digits.bytes() {
            if !c.is_ascii_digit() {
                self.add_error(&format!("'{}' is not a number.", text), token.start);
                return Err(Fail);
            }

            let digit = u64::from(c - b'0');
            match value
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
            {
                Some(next) => value = next,
                None => return self.decode_double(token),
            }
        }

        // Pick the narrowest kind that holds the value.
        let result = if negative {
            if value <= 2_147_483_648 {
                Value::from(-(value as i64) as i32)
            } else if value <= 9_223_372_036_854_775_808 {
                Value::from((value as i128).wrapping_neg() as i64)
            } else {
                Value::from(-(value as f64))
            }
        } else if value <= i32::MAX as u64 {
            Value::from(value as i32)
        } else if value <= u64::from(u32::MAX) {
            Value::from(value as u32)
        } else if value <= i64::MAX as u64 {
            Value::from(value as i64)
        } else {
            Value::from(value)
        };

        Ok(result)
    }

    fn decode_double(&mut self, token: Token) -> Result<Value, Fail> {
        let text = &self.text[token.start..token.end];

        match text.parse::<f64>() {
            Ok(value) => Ok(Value::from(value)),
            Err(_) => {
                self.add_error(&format!("'{}' is not a number.", text), token.start);
                Err(Fail)
            }
        }
    }

    fn decode_string_value(&mut self, token: Token) -> Result<Value, Fail> {
        let decoded = self.decode_string(token)?;
        Ok(Value::from(decoded))
    }

    fn decode_string(&mut self, token: Token) -> Result<String, Fail> {
        let quoted = self.bytes.get(token.start) == Some(&b'"');

        let (mut current, end) = if quoted {
            (token.start + 1, token.end.saturating_sub(1))
        } else {
            (token.start, token.end)
        };

        let mut decoded = String::with_capacity(end.saturating_sub(current));

        while current < end {
            let c = self.bytes[current];
            current += 1;

            if quoted && c == b'"' {
                break;
            }
            if !quoted && !is_token_char(c) {
                break;
            }

            if c == b'\\' {
                if current == end {
                    self.add_error("Empty escape sequence in string", token.start);
                    return Err(Fail);
                }

                let escape = self.bytes[current];
                current += 1;

                match escape {
                    b'"' => decoded.push('"'),
                    b'/' => decoded.push('/'),
                    b'\\' => decoded.push('\\'),
                    b'b' => decoded.push('\x08'),
                    b'f' => decoded.push('\x0C'),
                    b'n' => decoded.push('\n'),
                    b'r' => decoded.push('\r'),
                    b't' => decoded.push('\t'),
                    b'u' => {
                        let ch = self.decode_unicode_escape(token, &mut current, end)?;
                        decoded.push(ch);
                    }
                    _ => {
                        self.add_error("Bad escape sequence in string", token.start);
                        return Err(Fail);
                    }
                }
            } else {
                // Multi-byte UTF-8 passes through unchanged.
                let char_start = current - 1;
                let width = utf8_width(c);
                let char_end = (char_start + width).min(end);
                decoded.push_str(&self.text[char_start..char_end]);
                current = char_end;
            }
        }

        Ok(decoded)
    }

    fn decode_unicode_escape(
        &mut self,
        token: Token,
        current: &mut usize,
        end: usize,
    ) -> Result<char, Fail> {
        let unit = self.decode_hex_quad(token, current, end)?;

        // Surrogate pairs arrive as two consecutive \u escapes.
        if (0xD800..=0xDBFF).contains(&unit) {
            if end.saturating_sub(*current) >= 2
                && self.bytes[*current] == b'\\'
                && self.bytes[*current + 1] == b'u'
            {
                *current += 2;
                let low = self.decode_hex_quad(token, current, end)?;
                if (0xDC00..=0xDFFF).contains(&low) {
                    let value = 0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(ch) = char::from_u32(value) {
                        return Ok(ch);
                    }
                }
            }
            self.add_error(
                "Bad unicode escape sequence in string: invalid surrogate pair.",
                token.start,
            );
            return Err(Fail);
        }

        match char::from_u32(unit) {
            Some(ch) => Ok(ch),
            None => {
                self.add_error(
                    "Bad unicode escape sequence in string: invalid code point.",
                    token.start,
                );
                Err(Fail)
            }
        }
    }

    fn decode_hex_quad(
        &mut self,
        token: Token,
        current: &mut usize,
        end: usize,
    ) -> Result<u32, Fail> {
        if end.saturating_sub(*current) < 4 {
            self.add_error(
                "Bad unicode escape sequence in string: four digits expected.",
                token.start,
            );
            return Err(Fail);
        }

        let mut unicode = 0;
        for _ in 0..4 {
            let c = self.bytes[*current];
            *current += 1;

            unicode <<= 4;
            match c {
                b'0'..=b'9' => unicode += u32::from(c - b'0'),
                b'a'..=b'f' => unicode += u32::from(c - b'a' + 10),
                b'A'..=b'F' => unicode += u32::from(c - b'A' + 10),
                _ => {
                    self.add_error(
                        "Bad unicode escape sequence in string: hexadecimal digit expected.",
                        token.start,
                    );
                    return Err(Fail);
                }
            }
        }

        Ok(unicode)
    }

    // --- Errors -------------------------------------------------------------

    fn add_error(&mut self, message: &str, offset: usize) {
        self.errors.push(ErrorInfo {
            message: message.to_string(),
            offset,
        });
    }

    /// Skip tokens until the given close token (or end of stream), so that
    /// parsing can continue after the damaged region. Errors produced by
    /// the skipped tokens themselves are discarded.
    fn recover_from_error(&mut self, skip_until: TokenKind) -> Result<Value, Fail> {
        let error_count = self.errors.len();

        loop {
            let skip = self.read_token();
            if skip.kind == skip_until || skip.kind == TokenKind::EndOfStream {
                break;
            }
        }

        self.errors.truncate(error_count);
        Err(Fail)
    }

    fn add_error_and_recover(
        &mut self,
        message: &str,
        token: Token,
        skip_until: TokenKind,
    ) -> Result<Value, Fail> {
        self.add_error(message, token.start);
        self.recover_from_error(skip_until)
    }

    fn location_line_and_column(&self, offset: usize) -> (usize, usize) {
        let mut line = 0;
        let mut last_line_start = 0;
        let mut index = 0;

        while index < offset && index < self.bytes.len() {
            let c = self.bytes[index];
            index += 1;

            if c == b'\r' {
                if self.bytes.get(index) == Some(&b'\n') {
                    index += 1;
                }
                last_line_start = index;
                line += 1;
            } else if c == b'\n' {
                last_line_start = index;
                line += 1;
            }
        }

        (line + 1, offset - last_line_start + 1)
    }

    fn into_errors(self) -> ParseErrors {
        let diagnostics = self
            .errors
            .iter()
            .map(|error| {
                let (line, column) = self.location_line_and_column(error.offset);
                Diagnostic {
                    message: error.message.clone(),
                    line,
                    column,
                }
            })
            .collect();

        ParseErrors { diagnostics }
    }
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::ValueType;

    #[test]
    fn reads_scalars() {
        assert_eq!(load_json_text("42").unwrap(), Value::from(42));
        assert_eq!(load_json_text("-1.5").unwrap(), Value::from(-1.5));
        assert_eq!(load_json_text("true").unwrap(), Value::from(true));
        assert_eq!(load_json_text("null").unwrap(), Value::Null);
        assert_eq!(load_json_text("\"hi\"").unwrap(), Value::from("hi"));
    }

    #[test]
    fn number_width_selection() {
        assert_eq!(load_json_text("1").unwrap().value_type(), ValueType::Int);
        assert_eq!(
            load_json_text("3000000000").unwrap().value_type(),
            ValueType::UInt
        );
        assert_eq!(
            load_json_text("5000000000").unwrap().value_type(),
            ValueType::Int64
        );
        assert_eq!(
            load_json_text("10000000000000000000").unwrap().value_type(),
            ValueType::UInt64
        );
        assert_eq!(
            load_json_text("-2147483648").unwrap(),
            Value::from(i32::MIN)
        );
        assert_eq!(
            load_json_text("-9223372036854775808").unwrap(),
            Value::from(i64::MIN)
        );
        assert_eq!(
            load_json_text("99999999999999999999999").unwrap().value_type(),
            ValueType::Double
        );
    }

    #[test]
    fn reads_infinities_and_nan() {
        assert_eq!(load_json_text("Infinity").unwrap().as_f64(), f64::INFINITY);
        assert_eq!(
            load_json_text("-Infinity").unwrap().as_f64(),
            f64::NEG_INFINITY
        );
        assert_eq!(load_json_text("-inf").unwrap().as_f64(), f64::NEG_INFINITY);
        assert!(load_json_text("NaN").unwrap().as_f64().is_nan());
        assert!(load_json_text("nan").unwrap().as_f64().is_nan());
    }

    #[test]
    fn reads_objects_and_arrays() {
        let value = load_json_text(r#"{"a": [1, 2], "b": {"c": 3}}"#).unwrap();
        assert_eq!(value.member("a").elt(1).as_i32(), 2);
        assert_eq!(value.member("b").member("c").as_i32(), 3);
    }

    #[test]
    fn member_order_is_preserved() {
        let value = load_json_text(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        assert_eq!(value.member_name(0), Some("z"));
        assert_eq!(value.member_name(1), Some("a"));
        assert_eq!(value.member_name(2), Some("m"));
    }

    #[test]
    fn comments_are_skipped() {
        let text = r#"
        {
            // line comment
            "a": 1, /* block comment */
            "b": 2
        }
        "#;
        let value = load_json_text(text).unwrap();
        assert_eq!(value.member("a").as_i32(), 1);
        assert_eq!(value.member("b").as_i32(), 2);
    }

    #[test]
    fn trailing_commas_and_bare_keys() {
        let value = load_json_text("{ a: 1, b: [1, 2,], }").unwrap();
        assert_eq!(value.member("a").as_i32(), 1);
        assert_eq!(value.member("b").num_elts(), 2);
    }

    #[test]
    fn strict_mode_rejects_bare_keys() {
        assert!(load_json_text_opts("{ a: 1 }", true).is_err());
        assert!(load_json_text_opts("[1, 2,]", true).is_err());
        assert!(load_json_text_opts(r#"{ "a": 1 }"#, true).is_ok());
    }

    #[test]
    fn string_escapes() {
        let value = load_json_text(r#""a\tb\n\"q\" é""#).unwrap();
        assert_eq!(value.as_str(), "a\tb\n\"q\" \u{e9}");
    }

    #[test]
    fn surrogate_pair_escape() {
        // Directly embedded astral characters pass through.
        let value = load_json_text("\"\u{1F600}\"").unwrap();
        assert_eq!(value.as_str(), "\u{1F600}");

        // Escaped surrogate pairs combine into one character.
        let value = load_json_text(r#""\uD83D\uDE00""#).unwrap();
        assert_eq!(value.as_str(), "\u{1F600}");

        // A lone high surrogate is malformed.
        assert!(load_json_text(r#""\uD83D""#).is_err());
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let errors = load_json_text("1 2").unwrap_err();
        assert!(errors.diagnostics[0].message.contains("trailing garbage"));
    }

    #[test]
    fn error_carries_line_and_column() {
        let errors = load_json_text("{\n  \"a\": }\n}").unwrap_err();
        assert_eq!(errors.diagnostics[0].line, 2);
    }

    #[test]
    fn unquoted_values_read_as_strings() {
        let value = load_json_text("{ mode: fast }").unwrap();
        assert_eq!(value.member("mode").as_str(), "fast");
    }
}
