//! Byte input decoding.
//!
//! Turns a raw byte source into a validated UTF-8 character buffer for the
//! scanner: detects the input encoding from an optional BOM, decodes
//! UTF-8/UTF-16LE/UTF-16BE with full validation, rejects characters outside
//! the YAML character set, and maintains the `(index, line, column)` mark of
//! the next unread character.
//!
//! The scanner drives the reader through [`Reader::cache`], which
//! guarantees a requested amount of lookahead; once the source is
//! exhausted, [`Reader::peek`] yields a NUL sentinel so lookahead never
//! needs a bounds check.

use std::io;

use crate::error::{Error, Result};
use crate::mark::Mark;

const RAW_BUFFER_SIZE: usize = 16 * 1024;
const DECODED_COMPACT_THRESHOLD: usize = 3 * RAW_BUFFER_SIZE;
const MAX_INPUT_SIZE: usize = usize::MAX / 2;

/// Input encoding, fixed on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

pub(crate) struct Reader<'a> {
    source: Box<dyn io::Read + 'a>,
    raw: Vec<u8>,
    raw_pos: usize,
    source_eof: bool,
    encoding: Option<Encoding>,
    /// Byte offset of the next undecoded byte.
    offset: usize,

    /// Decoded characters not yet consumed by the scanner.
    buffer: String,
    head: usize,
    unread: usize,
    stream_ended: bool,

    mark: Mark,
}

impl<'a> Reader<'a> {
    pub fn new(source: Box<dyn io::Read + 'a>) -> Reader<'a> {
        Reader {
            source,
            raw: Vec::with_capacity(RAW_BUFFER_SIZE),
            raw_pos: 0,
            source_eof: false,
            encoding: None,
            offset: 0,
            buffer: String::new(),
            head: 0,
            unread: 0,
            stream_ended: false,
            mark: Mark::default(),
        }
    }

    pub fn from_str(text: &'a str) -> Reader<'a> {
        Reader::new(Box::new(text.as_bytes()))
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding.unwrap_or(Encoding::Utf8)
    }

    /// Make at least `length` characters available for lookahead, or fewer
    /// if the stream ends first (in which case peeks past the end yield the
    /// NUL sentinel).
    pub fn cache(&mut self, length: usize) -> Result<()> {
        while self.unread < length && !self.stream_ended {
            self.decode_step()?;
        }
        Ok(())
    }

    /// Byte at offset `k` from the cursor; 0 past the end of the stream.
    pub fn peek(&self, k: usize) -> u8 {
        self.buffer.as_bytes().get(self.head + k).copied().unwrap_or(0)
    }

    pub fn check(&self, k: usize, octet: u8) -> bool {
        self.peek(k) == octet
    }

    // --- Character classes --------------------------------------------------

    pub fn is_z(&self, k: usize) -> bool {
        self.peek(k) == 0
    }

    pub fn is_bom(&self, k: usize) -> bool {
        self.peek(k) == 0xEF && self.peek(k + 1) == 0xBB && self.peek(k + 2) == 0xBF
    }

    pub fn is_space(&self, k: usize) -> bool {
        self.peek(k) == b' '
    }

    pub fn is_tab(&self, k: usize) -> bool {
        self.peek(k) == b'\t'
    }

    pub fn is_blank(&self, k: usize) -> bool {
        self.is_space(k) || self.is_tab(k)
    }

    /// Line break: LF, CR, NEL, LS or PS.
    pub fn is_break(&self, k: usize) -> bool {
        let b = self.peek(k);
        b == b'\r'
            || b == b'\n'
            || (b == 0xC2 && self.peek(k + 1) == 0x85)
            || (b == 0xE2
                && self.peek(k + 1) == 0x80
                && (self.peek(k + 2) == 0xA8 || self.peek(k + 2) == 0xA9))
    }

    pub fn is_breakz(&self, k: usize) -> bool {
        self.is_break(k) || self.is_z(k)
    }

    pub fn is_blankz(&self, k: usize) -> bool {
        self.is_blank(k) || self.is_breakz(k)
    }

    /// Alphanumeric plus `_` and `-`, the anchor/handle character class.
    pub fn is_alpha(&self, k: usize) -> bool {
        let b = self.peek(k);
        b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
    }

    pub fn is_digit(&self, k: usize) -> bool {
        self.peek(k).is_ascii_digit()
    }

    pub fn as_digit(&self, k: usize) -> u32 {
        u32::from(self.peek(k).wrapping_sub(b'0'))
    }

    pub fn is_hex(&self, k: usize) -> bool {
        self.peek(k).is_ascii_hexdigit()
    }

    pub fn as_hex(&self, k: usize) -> u32 {
        let b = self.peek(k);
        match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'a'..=b'f' => u32::from(b - b'a' + 10),
            b'A'..=b'F' => u32::from(b - b'A' + 10),
            _ => 0,
        }
    }

    // --- Movement -----------------------------------------------------------

    fn current_char(&self) -> Option<char> {
        self.buffer[self.head..].chars().next()
    }

    /// Advance over one character.
    pub fn skip(&mut self) {
        if let Some(ch) = self.current_char() {
            self.head += ch.len_utf8();
            self.unread -= 1;
            self.mark.index += 1;
            self.mark.column += 1;
        }
    }

    /// Advance over one line break, treating CRLF as a single break.
    pub fn skip_line(&mut self) {
        if self.check(0, b'\r') && self.check(1, b'\n') {
            self.head += 2;
            self.unread -= 2;
            self.mark.index += 2;
            self.mark.column = 0;
            self.mark.line += 1;
        } else if self.is_break(0) {
            if let Some(ch) = self.current_char() {
                self.head += ch.len_utf8();
                self.unread -= 1;
                self.mark.index += 1;
                self.mark.column = 0;
                self.mark.line += 1;
            }
        }
    }

    /// Pretend the cursor sits at the start of a fresh line. Used when the
    /// stream ends mid-line so the STREAM-END mark lands on its own line.
    pub fn force_line_start(&mut self) {
        if self.mark.column != 0 {
            self.mark.column = 0;
            self.mark.line += 1;
        }
    }

    /// Copy the current character to `out` and advance.
    pub fn read_ch(&mut self, out: &mut String) {
        if let Some(ch) = self.current_char() {
            out.push(ch);
            self.skip();
        }
    }

    /// Copy the current line break to `out` as a normalised `\n` (LS/PS are
    /// kept verbatim) and advance.
    pub fn read_line(&mut self, out: &mut String) {
        if self.check(0, b'\r') && self.check(1, b'\n') {
            out.push('\n');
            self.head += 2;
            self.unread -= 2;
            self.mark.index += 2;
            self.mark.column = 0;
            self.mark.line += 1;
        } else if self.check(0, b'\r') || self.check(0, b'\n') {
            out.push('\n');
            self.head += 1;
            self.unread -= 1;
            self.mark.index += 1;
            self.mark.column = 0;
            self.mark.line += 1;
        } else if self.peek(0) == 0xC2 && self.peek(1) == 0x85 {
            out.push('\n');
            self.head += 2;
            self.unread -= 1;
            self.mark.index += 1;
            self.mark.column = 0;
            self.mark.line += 1;
        } else if self.peek(0) == 0xE2 {
            // LS/PS keep their identity in scalar content.
            if let Some(ch) = self.current_char() {
                out.push(ch);
                self.head += ch.len_utf8();
                self.unread -= 1;
                self.mark.index += 1;
                self.mark.column = 0;
                self.mark.line += 1;
            }
        }
    }

    // --- Decoding -----------------------------------------------------------

    fn raw_avail(&self) -> usize {
        self.raw.len() - self.raw_pos
    }

    /// Pull more bytes from the source into the raw window.
    fn update_raw(&mut self) -> Result<()> {
        if self.source_eof {
            return Ok(());
        }

        if self.raw_pos > 0 {
            self.raw.drain(..self.raw_pos);
            self.raw_pos = 0;
        }

        if self.raw.len() >= RAW_BUFFER_SIZE {
            return Ok(());
        }

        let old_len = self.raw.len();
        self.raw.resize(RAW_BUFFER_SIZE, 0);

        match self.source.read(&mut self.raw[old_len..]) {
            Ok(count) => {
                self.raw.truncate(old_len + count);
                if count == 0 {
                    self.source_eof = true;
                }
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {
                self.raw.truncate(old_len);
                Ok(())
            }
            Err(_) => {
                self.raw.truncate(old_len);
                Err(Error::reader("input error", self.offset, None))
            }
        }
    }

    /// Examine the first bytes of the stream for a BOM.
    fn determine_encoding(&mut self) {
        let raw = &self.raw[self.raw_pos..];

        let (encoding, bom_len) = if raw.len() >= 2 && raw[0] == 0xFF && raw[1] == 0xFE {
            (Encoding::Utf16Le, 2)
        } else if raw.len() >= 2 && raw[0] == 0xFE && raw[1] == 0xFF {
            (Encoding::Utf16Be, 2)
        } else if raw.len() >= 3 && raw[0] == 0xEF && raw[1] == 0xBB && raw[2] == 0xBF {
            (Encoding::Utf8, 3)
        } else {
            (Encoding::Utf8, 0)
        };

        self.encoding = Some(encoding);
        self.raw_pos += bom_len;
        self.offset += bom_len;
    }

    /// Decode one character into the buffer, or mark the end of the stream.
    fn decode_step(&mut self) -> Result<()> {
        if self.offset >= MAX_INPUT_SIZE {
            return Err(Error::reader("input is too long", self.offset, None));
        }

        if self.encoding.is_none() {
            while !self.source_eof && self.raw_avail() < 3 {
                self.update_raw()?;
            }
            self.determine_encoding();
        }

        // The widest character needs 4 raw bytes.
        while !self.source_eof && self.raw_avail() < 4 {
            self.update_raw()?;
        }

        if self.raw_avail() == 0 {
            self.stream_ended = true;
            return Ok(());
        }

        let value = match self.encoding() {
            Encoding::Utf8 => self.decode_utf8()?,
            Encoding::Utf16Le => self.decode_utf16(true)?,
            Encoding::Utf16Be => self.decode_utf16(false)?,
        };

        if !allowed_character(value) {
            return Err(Error::reader(
                "control characters are not allowed",
                self.offset,
                Some(value),
            ));
        }

        if self.head >= DECODED_COMPACT_THRESHOLD {
            self.buffer.drain(..self.head);
            self.head = 0;
        }

        match char::from_u32(value) {
            Some(ch) => self.buffer.push(ch),
            None => {
                return Err(Error::reader(
                    "invalid Unicode character",
                    self.offset,
                    Some(value),
                ))
            }
        }
        self.unread += 1;

        Ok(())
    }

    fn decode_utf8(&mut self) -> Result<u32> {
        let raw = &self.raw[self.raw_pos..];
        let octet = raw[0];

        let width = if octet & 0x80 == 0x00 {
            1
        } else if octet & 0xE0 == 0xC0 {
            2
        } else if octet & 0xF0 == 0xE0 {
            3
        } else if octet & 0xF8 == 0xF0 {
            4
        } else {
            return Err(Error::reader(
                "invalid leading UTF-8 octet",
                self.offset,
                Some(u32::from(octet)),
            ));
        };

        if raw.len() < width {
            return Err(Error::reader(
                "incomplete UTF-8 octet sequence",
                self.offset,
                None,
            ));
        }

        let mut value = match width {
            1 => u32::from(octet),
            2 => u32::from(octet & 0x1F),
            3 => u32::from(octet & 0x0F),
            _ => u32::from(octet & 0x07),
        };

        for k in 1..width {
            let trailing = raw[k];
            if trailing & 0xC0 != 0x80 {
                return Err(Error::reader(
                    "invalid trailing UTF-8 octet",
                    self.offset + k,
                    Some(u32::from(trailing)),
                ));
            }
            value = (value << 6) + u32::from(trailing & 0x3F);
        }

        let minimal = match width {
            1 => true,
            2 => value >= 0x80,
            3 => value >= 0x800,
            _ => value >= 0x1_0000,
        };
        if !minimal {
            return Err(Error::reader(
                "invalid length of a UTF-8 sequence",
                self.offset,
                None,
            ));
        }

        if (0xD800..=0xDFFF).contains(&value) || value > 0x10_FFFF {
            return Err(Error::reader(
                "invalid Unicode character",
                self.offset,
                Some(value),
            ));
        }

        self.raw_pos += width;
        self.offset += width;
        Ok(value)
    }

    fn decode_utf16(&mut self, little_endian: bool) -> Result<u32> {
        let unit = |raw: &[u8], at: usize| -> u32 {
            if little_endian {
                u32::from(raw[at]) | u32::from(raw[at + 1]) << 8
            } else {
                u32::from(raw[at]) << 8 | u32::from(raw[at + 1])
            }
        };

        let raw = &self.raw[self.raw_pos..];

        if raw.len() < 2 {
            return Err(Error::reader(
                "incomplete UTF-16 character",
                self.offset,
                None,
            ));
        }

        let first = unit(raw, 0);

        if (0xDC00..=0xDFFF).contains(&first) {
            return Err(Error::reader(
                "unexpected low surrogate area",
                self.offset,
                Some(first),
            ));
        }

        if (0xD800..=0xDBFF).contains(&first) {
            if raw.len() < 4 {
                return Err(Error::reader(
                    "incomplete UTF-16 surrogate pair",
                    self.offset,
                    None,
                ));
            }

            let second = unit(raw, 2);
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(Error::reader(
                    "expected low surrogate area",
                    self.offset + 2,
                    Some(second),
                ));
            }

            self.raw_pos += 4;
            self.offset += 4;
            return Ok(0x1_0000 + ((first & 0x3FF) << 10) + (second & 0x3FF));
        }

        self.raw_pos += 2;
        self.offset += 2;
        Ok(first)
    }
}

/// The YAML character set:
/// `#x9 | #xA | #xD | [#x20-#x7E] | #x85 | [#xA0-#xD7FF] | [#xE000-#xFFFD]
/// | [#x10000-#x10FFFF]`.
fn allowed_character(ch: u32) -> bool {
    ch == 0x09
        || ch == 0x0A
        || ch == 0x0D
        || (0x20..=0x7E).contains(&ch)
        || ch == 0x85
        || (0xA0..=0xD7FF).contains(&ch)
        || (0xE000..=0xFFFD).contains(&ch)
        || (0x1_0000..=0x10_FFFF).contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Result<String> {
        let mut reader = Reader::new(Box::new(bytes));
        let mut out = String::new();
        loop {
            reader.cache(1)?;
            if reader.is_z(0) {
                return Ok(out);
            }
            reader.read_ch(&mut out);
        }
    }

    #[test]
    fn plain_ascii() {
        assert_eq!(decode_all(b"abc\n").unwrap(), "abc\n");
    }

    #[test]
    fn utf8_bom_is_consumed() {
        assert_eq!(decode_all(b"\xEF\xBB\xBFkey").unwrap(), "key");
    }

    #[test]
    fn utf16le_with_bom() {
        let bytes = b"\xFF\xFEa\x00b\x00";
        assert_eq!(decode_all(bytes).unwrap(), "ab");
    }

    #[test]
    fn utf16be_with_bom() {
        let bytes = b"\xFE\xFF\x00a\x00b";
        assert_eq!(decode_all(bytes).unwrap(), "ab");
    }

    #[test]
    fn utf16_surrogate_pair() {
        // U+1F600 as UTF-16LE: D8 3D DE 00
        let bytes = b"\xFF\xFE\x3D\xD8\x00\xDE";
        assert_eq!(decode_all(bytes).unwrap(), "\u{1F600}");
    }

    #[test]
    fn lone_low_surrogate_is_rejected() {
        let bytes = b"\xFF\xFE\x00\xDC";
        let err = decode_all(bytes).unwrap_err();
        assert_eq!(err.problem, "unexpected low surrogate area");
    }

    #[test]
    fn truncated_surrogate_pair_is_rejected() {
        let bytes = b"\xFF\xFE\x3D\xD8";
        let err = decode_all(bytes).unwrap_err();
        assert_eq!(err.problem, "incomplete UTF-16 surrogate pair");
    }

    #[test]
    fn overlong_utf8_is_rejected() {
        // 0xC0 0xAF is an overlong encoding of '/'.
        let err = decode_all(b"\xC0\xAF").unwrap_err();
        assert_eq!(err.problem, "invalid length of a UTF-8 sequence");
    }

    #[test]
    fn bad_leading_octet_is_rejected() {
        let err = decode_all(b"\xFFx").unwrap_err();
        assert_eq!(err.problem, "invalid leading UTF-8 octet");
        assert_eq!(err.value, Some(0xFF));
    }

    #[test]
    fn bad_trailing_octet_is_rejected() {
        let err = decode_all(b"\xC3\x28").unwrap_err();
        assert_eq!(err.problem, "invalid trailing UTF-8 octet");
    }

    #[test]
    fn truncated_utf8_sequence_is_rejected() {
        let err = decode_all(b"\xE2\x82").unwrap_err();
        assert_eq!(err.problem, "incomplete UTF-8 octet sequence");
    }

    #[test]
    fn utf8_surrogate_encoding_is_rejected() {
        // CESU-style encoding of U+D800.
        let err = decode_all(b"\xED\xA0\x80").unwrap_err();
        assert_eq!(err.problem, "invalid Unicode character");
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = decode_all(b"a\x01b").unwrap_err();
        assert_eq!(err.problem, "control characters are not allowed");
        assert_eq!(err.value, Some(1));
    }

    #[test]
    fn tab_and_newline_are_allowed() {
        assert_eq!(decode_all(b"a\tb\r\nc").unwrap(), "a\tb\r\nc");
    }

    #[test]
    fn marks_track_lines_and_columns() {
        let mut reader = Reader::from_str("ab\ncd");
        reader.cache(8).unwrap();

        reader.skip();
        reader.skip();
        assert_eq!(reader.mark().column, 2);

        reader.skip_line();
        let mark = reader.mark();
        assert_eq!(mark.line, 1);
        assert_eq!(mark.column, 0);
        assert_eq!(mark.index, 3);
    }
}
