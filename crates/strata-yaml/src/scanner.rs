//! The YAML 1.1 token scanner.
//!
//! Produces the token stream consumed by the [`Parser`](crate::Parser):
//! stream/document framing, block structure derived from indentation, flow
//! collection punctuation, anchors, tags, directives and the four scalar
//! styles.
//!
//! Two mechanisms give the scanner its shape:
//!
//! - **Indentation roll/unroll.** In block context the scanner maintains a
//!   stack of indentation columns. Moving to a deeper column opens a block
//!   collection (`BLOCK-SEQUENCE-START`/`BLOCK-MAPPING-START`); returning to
//!   a shallower one emits a `BLOCK-END` for every level popped. A sentinel
//!   of -1 keeps the stack from over-popping.
//! - **Simple keys.** A scalar such as `key` in `key: value` only becomes a
//!   mapping key retroactively, when the `:` shows up. Wherever a simple key
//!   could start, the scanner records a candidate with the position the
//!   `KEY` token would need to occupy in the token queue. On `:` the token
//!   is inserted at that saved position, so consumers observe tokens in
//!   source order. Candidates expire after a line break or 1024 characters;
//!   an expired candidate that was required (it sat at the block indent)
//!   is an error.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::mark::Mark;
use crate::reader::Reader;
use crate::token::{ScalarStyle, Token, TokenKind};

/// A simple key is limited to a single line and this many characters.
const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
struct SimpleKey {
    possible: bool,
    required: bool,
    /// Absolute number of the token this key would become.
    token_number: usize,
    mark: Mark,
}

/// Token-level scanner over a character stream.
pub struct Scanner<'a> {
    input: Reader<'a>,

    tokens: VecDeque<Token>,
    /// Tokens handed to the consumer so far; `tokens_parsed + queue index`
    /// is a token's absolute number.
    tokens_parsed: usize,
    token_available: bool,

    /// Current indentation column, -1 before any block structure.
    indent: i64,
    indents: Vec<i64>,

    /// One record per flow level, plus one for block context.
    simple_keys: Vec<SimpleKey>,
    simple_key_allowed: bool,

    flow_level: usize,

    stream_start_produced: bool,
    stream_end_produced: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: Box<dyn std::io::Read + 'a>) -> Scanner<'a> {
        Scanner::with_input(Reader::new(source))
    }

    pub fn from_str(text: &'a str) -> Scanner<'a> {
        Scanner::with_input(Reader::from_str(text))
    }

    fn with_input(input: Reader<'a>) -> Scanner<'a> {
        Scanner {
            input,
            tokens: VecDeque::new(),
            tokens_parsed: 0,
            token_available: false,
            indent: -1,
            indents: Vec::new(),
            simple_keys: Vec::new(),
            simple_key_allowed: true,
            flow_level: 0,
            stream_start_produced: false,
            stream_end_produced: false,
        }
    }

    pub fn stream_end_produced(&self) -> bool {
        self.stream_end_produced
    }

    pub(crate) fn mark(&self) -> Mark {
        self.input.mark()
    }

    /// Make sure a token is available and return a reference to it.
    pub fn peek_token(&mut self) -> Result<&Token> {
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        match self.tokens.front() {
            Some(token) => Ok(token),
            None => unreachable!("fetch_more_tokens always leaves a token queued"),
        }
    }

    /// Take the next token off the queue.
    pub fn next_token(&mut self) -> Result<Token> {
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        match self.tokens.pop_front() {
            Some(token) => {
                self.token_available = false;
                self.tokens_parsed += 1;
                if token.kind == TokenKind::StreamEnd {
                    self.stream_end_produced = true;
                }
                Ok(token)
            }
            None => unreachable!("fetch_more_tokens always leaves a token queued"),
        }
    }

    /// Fetch tokens until the head of the queue is settled: at least one
    /// token is present, and no still-live simple key candidate could
    /// retro-insert a `KEY` ahead of it.
    fn fetch_more_tokens(&mut self) -> Result<()> {
        loop {
            let mut need_more = self.tokens.is_empty();

            if !need_more {
                self.stale_simple_keys()?;
                need_more = self
                    .simple_keys
                    .iter()
                    .any(|key| key.possible && key.token_number == self.tokens_parsed);
            }

            if !need_more {
                break;
            }

            self.fetch_next_token()?;
        }

        self.token_available = true;
        Ok(())
    }

    /// The decision procedure: identify and fetch the next token.
    fn fetch_next_token(&mut self) -> Result<()> {
        self.input.cache(1)?;

        if !self.stream_start_produced {
            return self.fetch_stream_start();
        }

        self.scan_to_next_token()?;
        self.stale_simple_keys()?;
        self.unroll_indent(self.input.mark().column as i64);

        // 4 is the length of the longest indicators: '--- ' and '... '.
        self.input.cache(4)?;

        if self.input.is_z(0) {
            return self.fetch_stream_end();
        }

        if self.input.mark().column == 0 && self.input.check(0, b'%') {
            return self.fetch_directive();
        }

        if self.input.mark().column == 0
            && self.input.check(0, b'-')
            && self.input.check(1, b'-')
            && self.input.check(2, b'-')
            && self.input.is_blankz(3)
        {
            return self.fetch_document_indicator(TokenKind::DocumentStart);
        }

        if self.input.mark().column == 0
            && self.input.check(0, b'.')
            && self.input.check(1, b'.')
            && self.input.check(2, b'.')
            && self.input.is_blankz(3)
        {
            return self.fetch_document_indicator(TokenKind::DocumentEnd);
        }

        if self.input.check(0, b'[') {
            return self.fetch_flow_collection_start(TokenKind::FlowSequenceStart);
        }
        if self.input.check(0, b'{') {
            return self.fetch_flow_collection_start(TokenKind::FlowMappingStart);
        }
        if self.input.check(0, b']') {
            return self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd);
        }
        if self.input.check(0, b'}') {
            return self.fetch_flow_collection_end(TokenKind::FlowMappingEnd);
        }

        if self.input.check(0, b',') {
            return self.fetch_flow_entry();
        }

        if self.input.check(0, b'-') && self.input.is_blankz(1) {
            return self.fetch_block_entry();
        }

        if self.input.check(0, b'?') && (self.flow_level > 0 || self.input.is_blankz(1)) {
            return self.fetch_key();
        }

        if self.input.check(0, b':') && (self.flow_level > 0 || self.input.is_blankz(1)) {
            return self.fetch_value();
        }

        if self.input.check(0, b'*') {
            return self.fetch_anchor(false);
        }
        if self.input.check(0, b'&') {
            return self.fetch_anchor(true);
        }

        if self.input.check(0, b'!') {
            return self.fetch_tag();
        }

        if self.input.check(0, b'|') && self.flow_level == 0 {
            return self.fetch_block_scalar(true);
        }
        if self.input.check(0, b'>') && self.flow_level == 0 {
            return self.fetch_block_scalar(false);
        }

        if self.input.check(0, b'\'') {
            return self.fetch_flow_scalar(true);
        }
        if self.input.check(0, b'"') {
            return self.fetch_flow_scalar(false);
        }

        // A plain scalar may start with any non-indicator character, or
        // with '-'/'?'/':' when followed by a non-blank (the latter two in
        // block context only).
        let indicator = self.input.is_blankz(0)
            || matches!(
                self.input.peek(0),
                b'-' | b'?'
                    | b':'
                    | b','
                    | b'['
                    | b']'
                    | b'{'
                    | b'}'
                    | b'#'
                    | b'&'
                    | b'*'
                    | b'!'
                    | b'|'
                    | b'>'
                    | b'\''
                    | b'"'
                    | b'%'
                    | b'@'
                    | b'`'
            );

        if !indicator
            || (self.input.check(0, b'-') && !self.input.is_blank(1))
            || (self.flow_level == 0
                && (self.input.check(0, b'?') || self.input.check(0, b':'))
                && !self.input.is_blankz(1))
        {
            return self.fetch_plain_scalar();
        }

        Err(Error::scanner(
            Some("while scanning for the next token"),
            self.input.mark(),
            "found character that cannot start any token",
            self.input.mark(),
        ))
    }

    // --- Simple keys --------------------------------------------------------

    /// Expire candidates that can no longer become simple keys: the line
    /// has been crossed or the lookahead window exceeded.
    fn stale_simple_keys(&mut self) -> Result<()> {
        let mark = self.input.mark();

        for key in &mut self.simple_keys {
            if key.possible
                && (key.mark.line < mark.line
                    || key.mark.index + MAX_SIMPLE_KEY_LENGTH < mark.index)
            {
                if key.required {
                    return Err(Error::scanner(
                        Some("while scanning a simple key"),
                        key.mark,
                        "could not find expected ':'",
                        mark,
                    ));
                }
                key.possible = false;
            }
        }

        Ok(())
    }

    /// Record a simple key candidate at the current position if one is
    /// allowed here.
    fn save_simple_key(&mut self) -> Result<()> {
        // A simple key is required when it sits exactly at the block
        // indent.
        let required =
            self.flow_level == 0 && self.indent == self.input.mark().column as i64;

        if self.simple_key_allowed {
            let key = SimpleKey {
                possible: true,
                required,
                token_number: self.tokens_parsed + self.tokens.len(),
                mark: self.input.mark(),
            };

            self.remove_simple_key()?;

            if let Some(top) = self.simple_keys.last_mut() {
                *top = key;
            }
        }

        Ok(())
    }

    /// Drop the candidate at the current flow level; an unmatched required
    /// candidate is an error.
    fn remove_simple_key(&mut self) -> Result<()> {
        let mark = self.input.mark();

        if let Some(key) = self.simple_keys.last_mut() {
            if key.possible && key.required {
                return Err(Error::scanner(
                    Some("while scanning a simple key"),
                    key.mark,
                    "could not find expected ':'",
                    mark,
                ));
            }
            key.possible = false;
        }

        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.simple_keys.push(SimpleKey::default());
        self.flow_level += 1;
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level > 0 {
            self.flow_level -= 1;
            self.simple_keys.pop();
        }
    }

    // --- Indentation --------------------------------------------------------

    /// Open a block collection if the column is deeper than the current
    /// indent. `number` is the absolute queue position for retro-insertion;
    /// `None` appends.
    fn roll_indent(&mut self, column: i64, number: Option<usize>, kind: TokenKind, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }

        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;

            let token = Token::new(kind, mark, mark);
            match number {
                None => self.tokens.push_back(token),
                Some(number) => {
                    self.tokens.insert(number - self.tokens_parsed, token);
                }
            }
        }
    }

    /// Close block collections deeper than `column`.
    fn unroll_indent(&mut self, column: i64) {
        if self.flow_level > 0 {
            return;
        }

        while self.indent > column {
            let mark = self.input.mark();
            self.tokens
                .push_back(Token::new(TokenKind::BlockEnd, mark, mark));
            self.indent = match self.indents.pop() {
                Some(indent) => indent,
                None => -1,
            };
        }
    }

    // --- Token fetchers -----------------------------------------------------

    fn fetch_stream_start(&mut self) -> Result<()> {
        self.indent = -1;
        self.simple_keys.push(SimpleKey::default());
        self.simple_key_allowed = true;
        self.stream_start_produced = true;

        let mark = self.input.mark();
        self.tokens.push_back(Token::new(
            TokenKind::StreamStart(self.input.encoding()),
            mark,
            mark,
        ));
        Ok(())
    }

    fn fetch_stream_end(&mut self) -> Result<()> {
        self.input.force_line_start();
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;

        let mark = self.input.mark();
        self.tokens
            .push_back(Token::new(TokenKind::StreamEnd, mark, mark));
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;

        let token = self.scan_directive()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;

        let start_mark = self.input.mark();
        self.input.skip();
        self.input.skip();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens.push_back(Token::new(kind, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<()> {
        // '[' and '{' may themselves start a simple key, e.g. '{a: 1}: b'.
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens.push_back(Token::new(kind, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<()> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens.push_back(Token::new(kind, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens
            .push_back(Token::new(TokenKind::FlowEntry, start_mark, end_mark));
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<()> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(Error::scanner(
                    None,
                    self.input.mark(),
                    "block sequence entries are not allowed in this context",
                    self.input.mark(),
                ));
            }

            let column = self.input.mark().column as i64;
            let mark = self.input.mark();
            self.roll_indent(column, None, TokenKind::BlockSequenceStart, mark);
        }
        // In flow context a '-' entry is an error, but the parser can point
        // at the surrounding collection, so it reports it.

        self.remove_simple_key()?;
        self.simple_key_allowed = true;

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens
            .push_back(Token::new(TokenKind::BlockEntry, start_mark, end_mark));
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<()> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(Error::scanner(
                    None,
                    self.input.mark(),
                    "mapping keys are not allowed in this context",
                    self.input.mark(),
                ));
            }

            let column = self.input.mark().column as i64;
            let mark = self.input.mark();
            self.roll_indent(column, None, TokenKind::BlockMappingStart, mark);
        }

        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens
            .push_back(Token::new(TokenKind::Key, start_mark, end_mark));
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<()> {
        let simple_key = match self.simple_keys.last() {
            Some(key) => *key,
            None => SimpleKey::default(),
        };

        if simple_key.possible {
            // Retro-insert the KEY token where the candidate started, so
            // the consumer sees KEY, <scalar>, VALUE in source order.
            self.tokens.insert(
                simple_key.token_number - self.tokens_parsed,
                Token::new(TokenKind::Key, simple_key.mark, simple_key.mark),
            );

            self.roll_indent(
                simple_key.mark.column as i64,
                Some(simple_key.token_number),
                TokenKind::BlockMappingStart,
                simple_key.mark,
            );

            if let Some(key) = self.simple_keys.last_mut() {
                key.possible = false;
            }

            self.simple_key_allowed = false;
        } else {
            // The ':' follows a complex key.
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return Err(Error::scanner(
                        None,
                        self.input.mark(),
                        "mapping values are not allowed in this context",
                        self.input.mark(),
                    ));
                }

                let column = self.input.mark().column as i64;
                let mark = self.input.mark();
                self.roll_indent(column, None, TokenKind::BlockMappingStart, mark);
            }

            self.simple_key_allowed = self.flow_level == 0;
        }

        let start_mark = self.input.mark();
        self.input.skip();
        let end_mark = self.input.mark();

        self.tokens
            .push_back(Token::new(TokenKind::Value, start_mark, end_mark));
        Ok(())
    }

    fn fetch_anchor(&mut self, is_anchor: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let token = self.scan_anchor(is_anchor)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let token = self.scan_tag()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;

        let token = self.scan_block_scalar(literal)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let token = self.scan_flow_scalar(single)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let token = self.scan_plain_scalar()?;
        self.tokens.push_back(token);
        Ok(())
    }

    // --- Whitespace and comments --------------------------------------------

    fn scan_to_next_token(&mut self) -> Result<()> {
        loop {
            self.input.cache(1)?;

            // A BOM may start a line.
            if self.input.mark().column == 0 && self.input.is_bom(0) {
                self.input.skip();
            }

            // Tabs are allowed in flow context, and in block context
            // anywhere a simple key could not start.
            self.input.cache(1)?;
            while self.input.check(0, b' ')
                || ((self.flow_level > 0 || !self.simple_key_allowed)
                    && self.input.check(0, b'\t'))
            {
                self.input.skip();
                self.input.cache(1)?;
            }

            if self.input.check(0, b'#') {
                while !self.input.is_breakz(0) {
                    self.input.skip();
                    self.input.cache(1)?;
                }
            }

            if self.input.is_break(0) {
                self.input.cache(2)?;
                self.input.skip_line();

                if self.flow_level == 0 {
                    self.simple_key_allowed = true;
                }
            } else {
                break;
            }
        }

        Ok(())
    }

    // --- Directives ---------------------------------------------------------

    fn scan_directive(&mut self) -> Result<Token> {
        let start_mark = self.input.mark();
        self.input.skip(); // '%'

        let name = self.scan_directive_name(start_mark)?;

        let token = if name == "YAML" {
            let (major, minor) = self.scan_version_directive_value(start_mark)?;
            Token::new(
                TokenKind::VersionDirective { major, minor },
                start_mark,
                self.input.mark(),
            )
        } else if name == "TAG" {
            let (handle, prefix) = self.scan_tag_directive_value(start_mark)?;
            Token::new(
                TokenKind::TagDirective { handle, prefix },
                start_mark,
                self.input.mark(),
            )
        } else {
            return Err(Error::scanner(
                Some("while scanning a directive"),
                start_mark,
                "found unknown directive name",
                self.input.mark(),
            ));
        };

        // Eat the rest of the line, comments included.
        self.input.cache(1)?;
        while self.input.is_blank(0) {
            self.input.skip();
            self.input.cache(1)?;
        }

        if self.input.check(0, b'#') {
            while !self.input.is_breakz(0) {
                self.input.skip();
                self.input.cache(1)?;
            }
        }

        if !self.input.is_breakz(0) {
            return Err(Error::scanner(
                Some("while scanning a directive"),
                start_mark,
                "did not find expected comment or line break",
                self.input.mark(),
            ));
        }

        if self.input.is_break(0) {
            self.input.cache(2)?;
            self.input.skip_line();
        }

        Ok(token)
    }

    fn scan_directive_name(&mut self, start_mark: Mark) -> Result<String> {
        let mut name = String::new();

        self.input.cache(1)?;
        while self.input.is_alpha(0) {
            self.input.read_ch(&mut name);
            self.input.cache(1)?;
        }

        if name.is_empty() {
            return Err(Error::scanner(
                Some("while scanning a directive"),
                start_mark,
                "could not find expected directive name",
                self.input.mark(),
            ));
        }

        if !self.input.is_blankz(0) {
            return Err(Error::scanner(
                Some("while scanning a directive"),
                start_mark,
                "found unexpected non-alphabetical character",
                self.input.mark(),
            ));
        }

        Ok(name)
    }

    fn scan_version_directive_value(&mut self, start_mark: Mark) -> Result<(u32, u32)> {
        self.input.cache(1)?;
        while self.input.is_blank(0) {
            self.input.skip();
            self.input.cache(1)?;
        }

        let major = self.scan_version_directive_number(start_mark)?;

        if !self.input.check(0, b'.') {
            return Err(Error::scanner(
                Some("while scanning a %YAML directive"),
                start_mark,
                "did not find expected digit or '.' character",
                self.input.mark(),
            ));
        }
        self.input.skip();

        let minor = self.scan_version_directive_number(start_mark)?;

        Ok((major, minor))
    }

    fn scan_version_directive_number(&mut self, start_mark: Mark) -> Result<u32> {
        const MAX_NUMBER_LENGTH: usize = 9;

        let mut value: u32 = 0;
        let mut length = 0;

        self.input.cache(1)?;
        while self.input.is_digit(0) {
            length += 1;
            if length > MAX_NUMBER_LENGTH {
                return Err(Error::scanner(
                    Some("while scanning a %YAML directive"),
                    start_mark,
                    "found extremely long version number",
                    self.input.mark(),
                ));
            }

            value = value * 10 + self.input.as_digit(0);
            self.input.skip();
            self.input.cache(1)?;
        }

        if length == 0 {
            return Err(Error::scanner(
                Some("while scanning a %YAML directive"),
                start_mark,
                "did not find expected version number",
                self.input.mark(),
            ));
        }

        Ok(value)
    }

    fn scan_tag_directive_value(&mut self, start_mark: Mark) -> Result<(String, String)> {
        self.input.cache(1)?;
        while self.input.is_blank(0) {
            self.input.skip();
            self.input.cache(1)?;
        }

        let handle = self.scan_tag_handle(true, start_mark)?;

        self.input.cache(1)?;
        if !self.input.is_blank(0) {
            return Err(Error::scanner(
                Some("while scanning a %TAG directive"),
                start_mark,
                "did not find expected whitespace",
                self.input.mark(),
            ));
        }

        while self.input.is_blank(0) {
            self.input.skip();
            self.input.cache(1)?;
        }

        let prefix = self.scan_tag_uri(true, None, start_mark)?;

        self.input.cache(1)?;
        if !self.input.is_blankz(0) {
            return Err(Error::scanner(
                Some("while scanning a %TAG directive"),
                start_mark,
                "did not find expected whitespace or line break",
                self.input.mark(),
            ));
        }

        Ok((handle, prefix))
    }

    // --- Anchors and tags ---------------------------------------------------

    fn scan_anchor(&mut self, is_anchor: bool) -> Result<Token> {
        let start_mark = self.input.mark();
        self.input.skip(); // '&' or '*'

        let mut name = String::new();

        self.input.cache(1)?;
        while self.input.is_alpha(0) {
            self.input.read_ch(&mut name);
            self.input.cache(1)?;
        }

        let end_mark = self.input.mark();

        // The anchor must be non-empty and followed by a blank or one of
        // the indicators that may legally end it.
        let terminator_ok = self.input.is_blankz(0)
            || matches!(
                self.input.peek(0),
                b'?' | b':' | b',' | b']' | b'}' | b'%' | b'@' | b'`'
            );

        if name.is_empty() || !terminator_ok {
            return Err(Error::scanner(
                Some(if is_anchor {
                    "while scanning an anchor"
                } else {
                    "while scanning an alias"
                }),
                start_mark,
                "did not find expected alphabetic or numeric character",
                self.input.mark(),
            ));
        }

        let kind = if is_anchor {
            TokenKind::Anchor(name)
        } else {
            TokenKind::Alias(name)
        };

        Ok(Token::new(kind, start_mark, end_mark))
    }

    fn scan_tag(&mut self) -> Result<Token> {
        let start_mark = self.input.mark();

        self.input.cache(2)?;

        let (handle, suffix) = if self.input.check(1, b'<') {
            // Canonical form: !<uri>
            self.input.skip();
            self.input.skip();

            let suffix = self.scan_tag_uri(false, None, start_mark)?;

            if !self.input.check(0, b'>') {
                return Err(Error::scanner(
                    Some("while scanning a tag"),
                    start_mark,
                    "did not find the expected '>'",
                    self.input.mark(),
                ));
            }
            self.input.skip();

            (String::new(), suffix)
        } else {
            // Either '!suffix' or '!handle!suffix'.
            let handle = self.scan_tag_handle(false, start_mark)?;

            if handle.len() > 1 && handle.starts_with('!') && handle.ends_with('!') {
                let suffix = self.scan_tag_uri(false, None, start_mark)?;
                (handle, suffix)
            } else {
                // Not a handle after all; the scanned text is part of the
                // suffix.
                let suffix = self.scan_tag_uri(false, Some(&handle), start_mark)?;

                if suffix.is_empty() {
                    // The bare '!' tag.
                    (String::new(), String::from("!"))
                } else {
                    (String::from("!"), suffix)
                }
            }
        };

        self.input.cache(1)?;
        if !self.input.is_blankz(0) {
            return Err(Error::scanner(
                Some("while scanning a tag"),
                start_mark,
                "did not find expected whitespace or line break",
                self.input.mark(),
            ));
        }

        Ok(Token::new(
            TokenKind::Tag { handle, suffix },
            start_mark,
            self.input.mark(),
        ))
    }

    fn scan_tag_handle(&mut self, directive: bool, start_mark: Mark) -> Result<String> {
        let context = if directive {
            "while scanning a tag directive"
        } else {
            "while scanning a tag"
        };

        self.input.cache(1)?;
        if !self.input.check(0, b'!') {
            return Err(Error::scanner(
                Some(context),
                start_mark,
                "did not find expected '!'",
                self.input.mark(),
            ));
        }

        let mut handle = String::new();
        self.input.read_ch(&mut handle);

        self.input.cache(1)?;
        while self.input.is_alpha(0) {
            self.input.read_ch(&mut handle);
            self.input.cache(1)?;
        }

        if self.input.check(0, b'!') {
            self.input.read_ch(&mut handle);
        } else if directive && handle != "!" {
            // In a %TAG directive the handle must be closed by '!'.
            return Err(Error::scanner(
                Some("while parsing a tag directive"),
                start_mark,
                "did not find expected '!'",
                self.input.mark(),
            ));
        }

        Ok(handle)
    }

    fn scan_tag_uri(
        &mut self,
        directive: bool,
        head: Option<&str>,
        start_mark: Mark,
    ) -> Result<String> {
        let context = if directive {
            "while parsing a %TAG directive"
        } else {
            "while parsing a tag"
        };

        // The head is a rescanned '!suffix' handle; its leading '!' is not
        // part of the URI.
        let mut uri = match head {
            Some(head) if head.len() > 1 => String::from(&head[1..]),
            _ => String::new(),
        };
        let mut length = head.map_or(0, str::len);

        self.input.cache(1)?;
        loop {
            let b = self.input.peek(0);
            let uri_char = self.input.is_alpha(0)
                || matches!(
                    b,
                    b';' | b'/'
                        | b'?'
                        | b':'
                        | b'@'
                        | b'&'
                        | b'='
                        | b'+'
                        | b'$'
                        | b','
                        | b'.'
                        | b'!'
                        | b'~'
                        | b'*'
                        | b'\''
                        | b'('
                        | b')'
                        | b'['
                        | b']'
                        | b'%'
                );

            if !uri_char {
                break;
            }

            if self.input.check(0, b'%') {
                let ch = self.scan_uri_escapes(directive, start_mark)?;
                uri.push(ch);
            } else {
                self.input.read_ch(&mut uri);
            }

            length += 1;
            self.input.cache(1)?;
        }

        if length == 0 {
            return Err(Error::scanner(
                Some(context),
                start_mark,
                "did not find expected tag URI",
                self.input.mark(),
            ));
        }

        Ok(uri)
    }

    /// Decode one `%HH`-escaped UTF-8 sequence. The leading octet fixes the
    /// sequence length; the remaining escapes must be continuation octets.
    fn scan_uri_escapes(&mut self, directive: bool, start_mark: Mark) -> Result<char> {
        let context = if directive {
            "while parsing a %TAG directive"
        } else {
            "while parsing a tag"
        };

        let mut width = 0usize;
        let mut remaining = 0usize;
        let mut value: u32 = 0;

        loop {
            self.input.cache(3)?;

            if !(self.input.check(0, b'%') && self.input.is_hex(1) && self.input.is_hex(2)) {
                return Err(Error::scanner(
                    Some(context),
                    start_mark,
                    "did not find URI escaped octet",
                    self.input.mark(),
                ));
            }

            let octet = (self.input.as_hex(1) << 4) + self.input.as_hex(2);

            if width == 0 {
                width = if octet & 0x80 == 0x00 {
                    1
                } else if octet & 0xE0 == 0xC0 {
                    2
                } else if octet & 0xF0 == 0xE0 {
                    3
                } else if octet & 0xF8 == 0xF0 {
                    4
                } else {
                    return Err(Error::scanner(
                        Some(context),
                        start_mark,
                        "found an incorrect leading UTF-8 octet",
                        self.input.mark(),
                    ));
                };
                value = match width {
                    1 => octet,
                    2 => octet & 0x1F,
                    3 => octet & 0x0F,
                    _ => octet & 0x07,
                };
                remaining = width - 1;
            } else {
                if octet & 0xC0 != 0x80 {
                    return Err(Error::scanner(
                        Some(context),
                        start_mark,
                        "found an incorrect trailing UTF-8 octet",
                        self.input.mark(),
                    ));
                }
                value = (value << 6) + (octet & 0x3F);
                remaining -= 1;
            }

            self.input.skip();
            self.input.skip();
            self.input.skip();

            if remaining == 0 {
                break;
            }
        }

        let minimal = match width {
            1 => true,
            2 => value >= 0x80,
            3 => value >= 0x800,
            _ => value >= 0x1_0000,
        };

        match char::from_u32(value) {
            Some(ch) if minimal => Ok(ch),
            _ => Err(Error::scanner(
                Some(context),
                start_mark,
                "found an invalid UTF-8 escape sequence",
                self.input.mark(),
            )),
        }
    }

    // --- Block scalars ------------------------------------------------------

    fn scan_block_scalar(&mut self, literal: bool) -> Result<Token> {
        let start_mark = self.input.mark();
        self.input.skip(); // '|' or '>'

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();

        // Header: chomping and explicit indentation, in either order.
        let mut chomping = 0i32; // -1 strip, 0 clip, +1 keep
        let mut increment = 0i64;

        self.input.cache(1)?;

        if self.input.check(0, b'+') || self.input.check(0, b'-') {
            chomping = if self.input.check(0, b'+') { 1 } else { -1 };
            self.input.skip();

            self.input.cache(1)?;
            if self.input.is_digit(0) {
                if self.input.check(0, b'0') {
                    return Err(Error::scanner(
                        Some("while scanning a block scalar"),
                        start_mark,
                        "found an indentation indicator equal to 0",
                        self.input.mark(),
                    ));
                }
                increment = i64::from(self.input.as_digit(0));
                self.input.skip();
            }
        } else if self.input.is_digit(0) {
            if self.input.check(0, b'0') {
                return Err(Error::scanner(
                    Some("while scanning a block scalar"),
                    start_mark,
                    "found an indentation indicator equal to 0",
                    self.input.mark(),
                ));
            }
            increment = i64::from(self.input.as_digit(0));
            self.input.skip();

            self.input.cache(1)?;
            if self.input.check(0, b'+') || self.input.check(0, b'-') {
                chomping = if self.input.check(0, b'+') { 1 } else { -1 };
                self.input.skip();
            }
        }

        // Trailing whitespace and comment on the header line.
        self.input.cache(1)?;
        while self.input.is_blank(0) {
            self.input.skip();
            self.input.cache(1)?;
        }

        if self.input.check(0, b'#') {
            while !self.input.is_breakz(0) {
                self.input.skip();
                self.input.cache(1)?;
            }
        }

        if !self.input.is_breakz(0) {
            return Err(Error::scanner(
                Some("while scanning a block scalar"),
                start_mark,
                "did not find expected comment or line break",
                self.input.mark(),
            ));
        }

        if self.input.is_break(0) {
            self.input.cache(2)?;
            self.input.skip_line();
        }

        let mut end_mark = self.input.mark();

        // Resolve the content indentation level when it was given
        // explicitly; otherwise the first scan of the leading breaks
        // determines it from the longest leading run of spaces.
        let mut indent: i64 = 0;
        if increment != 0 {
            indent = if self.indent >= 0 {
                self.indent + increment
            } else {
                increment
            };
        }

        self.scan_block_scalar_breaks(
            &mut indent,
            &mut trailing_breaks,
            start_mark,
            &mut end_mark,
        )?;

        // Body: one content line per iteration.
        self.input.cache(1)?;

        let mut leading_blank = false;
        let mut trailing_blank;

        while self.input.mark().column as i64 == indent && !self.input.is_z(0) {
            // Folding: a single break between two non-blank lines becomes a
            // space in folded style; everything else keeps its newlines.
            trailing_blank = self.input.is_blank(0);

            if !literal
                && leading_break.starts_with('\n')
                && !leading_blank
                && !trailing_blank
            {
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
                leading_break.clear();
            } else {
                string.push_str(&leading_break);
                leading_break.clear();
            }

            string.push_str(&trailing_breaks);
            trailing_breaks.clear();

            leading_blank = self.input.is_blank(0);

            while !self.input.is_breakz(0) {
                self.input.read_ch(&mut string);
                self.input.cache(1)?;
            }

            self.input.cache(2)?;
            self.input.read_line(&mut leading_break);

            self.scan_block_scalar_breaks(
                &mut indent,
                &mut trailing_breaks,
                start_mark,
                &mut end_mark,
            )?;
            self.input.cache(1)?;
        }

        // Chomping: strip drops every trailing break, clip keeps one, keep
        // keeps them all.
        if chomping != -1 {
            string.push_str(&leading_break);
        }
        if chomping == 1 {
            string.push_str(&trailing_breaks);
        }

        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };

        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style,
            },
            start_mark,
            end_mark,
        ))
    }

    /// Consume indentation spaces and line breaks between block scalar
    /// content lines. When the indentation level is still undetermined
    /// (`*indent == 0`), track the widest leading run seen and settle on it
    /// (but no shallower than one past the parent indent).
    fn scan_block_scalar_breaks(
        &mut self,
        indent: &mut i64,
        breaks: &mut String,
        start_mark: Mark,
        end_mark: &mut Mark,
    ) -> Result<()> {
        let mut max_indent: i64 = 0;

        *end_mark = self.input.mark();

        loop {
            self.input.cache(1)?;
            while (*indent == 0 || (self.input.mark().column as i64) < *indent)
                && self.input.is_space(0)
            {
                self.input.skip();
                self.input.cache(1)?;
            }

            if self.input.mark().column as i64 > max_indent {
                max_indent = self.input.mark().column as i64;
            }

            if (*indent == 0 || (self.input.mark().column as i64) < *indent)
                && self.input.is_tab(0)
            {
                return Err(Error::scanner(
                    Some("while scanning a block scalar"),
                    start_mark,
                    "found a tab character where an indentation space is expected",
                    self.input.mark(),
                ));
            }

            if !self.input.is_break(0) {
                break;
            }

            self.input.cache(2)?;
            self.input.read_line(breaks);
            *end_mark = self.input.mark();
        }

        if *indent == 0 {
            *indent = max_indent;
            if *indent < self.indent + 1 {
                *indent = self.indent + 1;
            }
            if *indent < 1 {
                *indent = 1;
            }
        }

        Ok(())
    }

    // --- Quoted scalars -----------------------------------------------------

    fn scan_flow_scalar(&mut self, single: bool) -> Result<Token> {
        let start_mark = self.input.mark();
        self.input.skip(); // the left quote

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks;

        loop {
            // A document indicator may not appear inside a quoted scalar.
            self.input.cache(4)?;

            if self.input.mark().column == 0
                && ((self.input.check(0, b'-')
                    && self.input.check(1, b'-')
                    && self.input.check(2, b'-'))
                    || (self.input.check(0, b'.')
                        && self.input.check(1, b'.')
                        && self.input.check(2, b'.')))
                && self.input.is_blankz(3)
            {
                return Err(Error::scanner(
                    Some("while scanning a quoted scalar"),
                    start_mark,
                    "found unexpected document indicator",
                    self.input.mark(),
                ));
            }

            if self.input.is_z(0) {
                return Err(Error::scanner(
                    Some("while scanning a quoted scalar"),
                    start_mark,
                    "found unexpected end of stream",
                    self.input.mark(),
                ));
            }

            self.input.cache(2)?;
            leading_blanks = false;

            while !self.input.is_blankz(0) {
                if single && self.input.check(0, b'\'') && self.input.check(1, b'\'') {
                    // '' is an escaped single quote.
                    string.push('\'');
                    self.input.skip();
                    self.input.skip();
                } else if self.input.check(0, if single { b'\'' } else { b'"' }) {
                    break;
                } else if !single && self.input.check(0, b'\\') && self.input.is_break(1) {
                    // An escaped line break swallows the break and the
                    // following indentation.
                    self.input.cache(3)?;
                    self.input.skip();
                    self.input.skip_line();
                    leading_blanks = true;
                    break;
                } else if !single && self.input.check(0, b'\\') {
                    let mut code_length = 0usize;

                    match self.input.peek(1) {
                        b'0' => string.push('\0'),
                        b'a' => string.push('\x07'),
                        b'b' => string.push('\x08'),
                        b't' | b'\t' => string.push('\t'),
                        b'n' => string.push('\n'),
                        b'v' => string.push('\x0B'),
                        b'f' => string.push('\x0C'),
                        b'r' => string.push('\r'),
                        b'e' => string.push('\x1B'),
                        b' ' => string.push(' '),
                        b'"' => string.push('"'),
                        b'/' => string.push('/'),
                        b'\\' => string.push('\\'),
                        b'N' => string.push('\u{85}'),
                        b'_' => string.push('\u{A0}'),
                        b'L' => string.push('\u{2028}'),
                        b'P' => string.push('\u{2029}'),
                        b'x' => code_length = 2,
                        b'u' => code_length = 4,
                        b'U' => code_length = 8,
                        _ => {
                            return Err(Error::scanner(
                                Some("while parsing a quoted scalar"),
                                start_mark,
                                "found unknown escape character",
                                self.input.mark(),
                            ));
                        }
                    }

                    self.input.skip();
                    self.input.skip();

                    if code_length > 0 {
                        self.input.cache(code_length)?;

                        let mut value: u32 = 0;
                        for k in 0..code_length {
                            if !self.input.is_hex(k) {
                                return Err(Error::scanner(
                                    Some("while parsing a quoted scalar"),
                                    start_mark,
                                    "did not find expected hexadecimal number",
                                    self.input.mark(),
                                ));
                            }
                            value = (value << 4) + self.input.as_hex(k);
                        }

                        let ch = match char::from_u32(value) {
                            Some(ch) if !(0xD800..=0xDFFF).contains(&value) && value <= 0x10_FFFF => ch,
                            _ => {
                                return Err(Error::scanner(
                                    Some("while parsing a quoted scalar"),
                                    start_mark,
                                    "found invalid Unicode character escape code",
                                    self.input.mark(),
                                ));
                            }
                        };
                        string.push(ch);

                        for _ in 0..code_length {
                            self.input.skip();
                        }
                    }
                } else {
                    self.input.read_ch(&mut string);
                }

                self.input.cache(2)?;
            }

            // Are we at the closing quote?
            self.input.cache(1)?;
            if self.input.check(0, if single { b'\'' } else { b'"' }) {
                break;
            }

            // Consume blanks and breaks, folding them per the plain-scalar
            // rule.
            self.input.cache(1)?;
            while self.input.is_blank(0) || self.input.is_break(0) {
                if self.input.is_blank(0) {
                    if !leading_blanks {
                        self.input.read_ch(&mut whitespaces);
                    } else {
                        self.input.skip();
                    }
                } else {
                    self.input.cache(2)?;
                    if !leading_blanks {
                        whitespaces.clear();
                        self.input.read_line(&mut leading_break);
                        leading_blanks = true;
                    } else {
                        self.input.read_line(&mut trailing_breaks);
                    }
                }
                self.input.cache(1)?;
            }

            if leading_blanks {
                if leading_break.starts_with('\n') {
                    if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                        trailing_breaks.clear();
                    }
                    leading_break.clear();
                } else {
                    string.push_str(&leading_break);
                    string.push_str(&trailing_breaks);
                    leading_break.clear();
                    trailing_breaks.clear();
                }
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.input.skip(); // the right quote
        let end_mark = self.input.mark();

        let style = if single {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };

        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style,
            },
            start_mark,
            end_mark,
        ))
    }

    // --- Plain scalars ------------------------------------------------------

    fn scan_plain_scalar(&mut self) -> Result<Token> {
        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks = false;
        let indent = self.indent + 1;

        let start_mark = self.input.mark();
        let mut end_mark = start_mark;

        loop {
            // Stop before a document indicator at column 0.
            self.input.cache(4)?;

            if self.input.mark().column == 0
                && ((self.input.check(0, b'-')
                    && self.input.check(1, b'-')
                    && self.input.check(2, b'-'))
                    || (self.input.check(0, b'.')
                        && self.input.check(1, b'.')
                        && self.input.check(2, b'.')))
                && self.input.is_blankz(3)
            {
                break;
            }

            if self.input.check(0, b'#') {
                break;
            }

            while !self.input.is_blankz(0) {
                // "x:y" is accepted in block context, but in flow context
                // ':' directly followed by flow punctuation is ambiguous.
                if self.flow_level > 0
                    && self.input.check(0, b':')
                    && matches!(
                        self.input.peek(1),
                        b',' | b'?' | b'[' | b']' | b'{' | b'}'
                    )
                {
                    return Err(Error::scanner(
                        Some("while scanning a plain scalar"),
                        start_mark,
                        "found unexpected ':'",
                        self.input.mark(),
                    ));
                }

                // Indicators that end a plain scalar.
                if (self.input.check(0, b':') && self.input.is_blankz(1))
                    || (self.flow_level > 0
                        && matches!(
                            self.input.peek(0),
                            b',' | b'?' | b'[' | b']' | b'{' | b'}'
                        ))
                {
                    break;
                }

                // Fold accumulated whitespace and breaks into the value.
                if leading_blanks || !whitespaces.is_empty() {
                    if leading_blanks {
                        if leading_break.starts_with('\n') {
                            if trailing_breaks.is_empty() {
                                string.push(' ');
                            } else {
                                string.push_str(&trailing_breaks);
                                trailing_breaks.clear();
                            }
                            leading_break.clear();
                        } else {
                            string.push_str(&leading_break);
                            string.push_str(&trailing_breaks);
                            leading_break.clear();
                            trailing_breaks.clear();
                        }
                        leading_blanks = false;
                    } else {
                        string.push_str(&whitespaces);
                        whitespaces.clear();
                    }
                }

                self.input.read_ch(&mut string);
                end_mark = self.input.mark();

                self.input.cache(2)?;
            }

            if !(self.input.is_blank(0) || self.input.is_break(0)) {
                break;
            }

            self.input.cache(1)?;
            while self.input.is_blank(0) || self.input.is_break(0) {
                if self.input.is_blank(0) {
                    // A tab shallower than the scalar indent would fake
                    // indentation.
                    if leading_blanks
                        && (self.input.mark().column as i64) < indent
                        && self.input.is_tab(0)
                    {
                        return Err(Error::scanner(
                            Some("while scanning a plain scalar"),
                            start_mark,
                            "found a tab character that violate indentation",
                            self.input.mark(),
                        ));
                    }

                    if !leading_blanks {
                        self.input.read_ch(&mut whitespaces);
                    } else {
                        self.input.skip();
                    }
                } else {
                    self.input.cache(2)?;
                    if !leading_blanks {
                        whitespaces.clear();
                        self.input.read_line(&mut leading_break);
                        leading_blanks = true;
                    } else {
                        self.input.read_line(&mut trailing_breaks);
                    }
                }
                self.input.cache(1)?;
            }

            // The scalar ends when the next line is shallower than its
            // indent.
            if self.flow_level == 0 && (self.input.mark().column as i64) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }

        Ok(Token::new(
            TokenKind::Scalar {
                value: string,
                style: ScalarStyle::Plain,
            },
            start_mark,
            end_mark,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::from_str(text);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token().expect("scan failed");
            let done = token.kind == TokenKind::StreamEnd;
            kinds.push(token.kind);
            if done {
                break;
            }
        }
        kinds
    }

    fn scalar(value: &str, style: ScalarStyle) -> TokenKind {
        TokenKind::Scalar {
            value: value.into(),
            style,
        }
    }

    #[test]
    fn scans_simple_mapping() {
        use TokenKind::*;

        let kinds = tokens("key: value\n");
        assert_eq!(
            kinds[1..],
            [
                BlockMappingStart,
                Key,
                scalar("key", ScalarStyle::Plain),
                Value,
                scalar("value", ScalarStyle::Plain),
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn key_token_precedes_scalar_after_retrofit() {
        // The ':' is seen well after 'key' has been tokenised; the KEY
        // token must still come out first.
        let kinds = tokens("key:   value\n");
        assert!(matches!(kinds[2], TokenKind::Key) || matches!(kinds[1], TokenKind::Key));

        let key_pos = kinds.iter().position(|k| *k == TokenKind::Key);
        let scalar_pos = kinds.iter().position(|k| {
            matches!(k, TokenKind::Scalar { value, .. } if value == "key")
        });
        assert!(key_pos.unwrap() < scalar_pos.unwrap());
    }

    #[test]
    fn scans_block_sequence() {
        use TokenKind::*;

        let kinds = tokens("- a\n- b\n");
        assert_eq!(
            kinds[1..],
            [
                BlockSequenceStart,
                BlockEntry,
                scalar("a", ScalarStyle::Plain),
                BlockEntry,
                scalar("b", ScalarStyle::Plain),
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn nested_mapping_emits_block_ends_in_order() {
        use TokenKind::*;

        let kinds = tokens("a:\n  b: 1\nc: 2\n");
        assert_eq!(
            kinds[1..],
            [
                BlockMappingStart,
                Key,
                scalar("a", ScalarStyle::Plain),
                Value,
                BlockMappingStart,
                Key,
                scalar("b", ScalarStyle::Plain),
                Value,
                scalar("1", ScalarStyle::Plain),
                BlockEnd,
                Key,
                scalar("c", ScalarStyle::Plain),
                Value,
                scalar("2", ScalarStyle::Plain),
                BlockEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn scans_flow_collection() {
        use TokenKind::*;

        let kinds = tokens("[a, {b: 1}]");
        assert_eq!(
            kinds[1..],
            [
                FlowSequenceStart,
                scalar("a", ScalarStyle::Plain),
                FlowEntry,
                FlowMappingStart,
                Key,
                scalar("b", ScalarStyle::Plain),
                Value,
                scalar("1", ScalarStyle::Plain),
                FlowMappingEnd,
                FlowSequenceEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn scans_document_markers_and_directives() {
        use TokenKind::*;

        let kinds = tokens("%YAML 1.1\n---\nx\n...\n");
        assert_eq!(
            kinds[1..],
            [
                VersionDirective { major: 1, minor: 1 },
                DocumentStart,
                scalar("x", ScalarStyle::Plain),
                DocumentEnd,
                StreamEnd,
            ]
        );
    }

    #[test]
    fn scans_tag_directive() {
        let kinds = tokens("%TAG !e! tag:example.com,2000:app/\n---\nx\n");
        assert_eq!(
            kinds[1],
            TokenKind::TagDirective {
                handle: "!e!".into(),
                prefix: "tag:example.com,2000:app/".into(),
            }
        );
    }

    #[test]
    fn scans_anchor_and_alias() {
        use TokenKind::*;

        let kinds = tokens("a: &x 1\nb: *x\n");
        assert!(kinds.contains(&Anchor("x".into())));
        assert!(kinds.contains(&Alias("x".into())));
    }

    #[test]
    fn scans_tags() {
        let kinds = tokens("!!str text\n");
        assert_eq!(
            kinds[1],
            TokenKind::Tag {
                handle: "!!".into(),
                suffix: "str".into(),
            }
        );

        let kinds = tokens("!<tag:example.com,2000:x> text\n");
        assert_eq!(
            kinds[1],
            TokenKind::Tag {
                handle: "".into(),
                suffix: "tag:example.com,2000:x".into(),
            }
        );

        let kinds = tokens("!local text\n");
        assert_eq!(
            kinds[1],
            TokenKind::Tag {
                handle: "!".into(),
                suffix: "local".into(),
            }
        );
    }

    #[test]
    fn tag_uri_percent_escapes_decode() {
        let kinds = tokens("!<tag:%C3%A9> x\n");
        assert_eq!(
            kinds[1],
            TokenKind::Tag {
                handle: "".into(),
                suffix: "tag:\u{E9}".into(),
            }
        );
    }

    #[test]
    fn single_quoted_scalar() {
        let kinds = tokens("'it''s'\n");
        assert_eq!(kinds[1], scalar("it's", ScalarStyle::SingleQuoted));
    }

    #[test]
    fn double_quoted_escapes() {
        let kinds = tokens(r#""\x41\u00e9\U0001F600""#);
        assert_eq!(
            kinds[1],
            scalar("A\u{E9}\u{1F600}", ScalarStyle::DoubleQuoted)
        );
    }

    #[test]
    fn double_quoted_break_folding() {
        let kinds = tokens("\"a\n b\"\n");
        assert_eq!(kinds[1], scalar("a b", ScalarStyle::DoubleQuoted));
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let mut scanner = Scanner::from_str(r#""\q""#);
        let mut error = None;
        loop {
            match scanner.next_token() {
                Err(e) => {
                    error = Some(e);
                    break;
                }
                Ok(t) if t.kind == TokenKind::StreamEnd => break,
                Ok(_) => {}
            }
        }
        let error = error.expect("expected scan error");
        assert_eq!(error.problem, "found unknown escape character");
    }

    #[test]
    fn unterminated_quoted_scalar_is_an_error() {
        let mut scanner = Scanner::from_str("'never closed");
        let mut failed = false;
        loop {
            match scanner.next_token() {
                Err(error) => {
                    assert_eq!(error.problem, "found unexpected end of stream");
                    failed = true;
                    break;
                }
                Ok(t) if t.kind == TokenKind::StreamEnd => break,
                Ok(_) => {}
            }
        }
        assert!(failed);
    }

    #[test]
    fn plain_scalar_folds_breaks() {
        let kinds = tokens("key: one\n two\n\n three\n");
        assert!(kinds.contains(&scalar("one two\nthree", ScalarStyle::Plain)));
    }

    #[test]
    fn literal_block_scalar_keeps_breaks() {
        let kinds = tokens("key: |\n  one\n  two\n");
        assert!(kinds.contains(&scalar("one\ntwo\n", ScalarStyle::Literal)));
    }

    #[test]
    fn folded_block_scalar_with_strip_chomping() {
        let kinds = tokens("value: >-\n  one\n  two\n\n  three\n");
        assert!(kinds.contains(&scalar("one two\nthree", ScalarStyle::Folded)));
    }

    #[test]
    fn block_scalar_keep_chomping() {
        let kinds = tokens("key: |+\n  one\n\n\n");
        assert!(kinds.contains(&scalar("one\n\n\n", ScalarStyle::Literal)));
    }

    #[test]
    fn block_scalar_explicit_indent() {
        let kinds = tokens("key: |2\n    one\n");
        // Two of the four leading spaces are content.
        assert!(kinds.contains(&scalar("  one\n", ScalarStyle::Literal)));
    }

    #[test]
    fn block_scalar_zero_indent_is_an_error() {
        let mut scanner = Scanner::from_str("key: |0\n  x\n");
        let mut failed = false;
        loop {
            match scanner.next_token() {
                Err(error) => {
                    assert_eq!(error.problem, "found an indentation indicator equal to 0");
                    failed = true;
                    break;
                }
                Ok(t) if t.kind == TokenKind::StreamEnd => break,
                Ok(_) => {}
            }
        }
        assert!(failed);
    }

    #[test]
    fn required_simple_key_without_colon_is_an_error() {
        let mut scanner = Scanner::from_str("a: 1\nb\nc: 2\n");
        let mut failed = false;
        loop {
            match scanner.next_token() {
                Err(error) => {
                    assert_eq!(error.problem, "could not find expected ':'");
                    failed = true;
                    break;
                }
                Ok(t) if t.kind == TokenKind::StreamEnd => break,
                Ok(_) => {}
            }
        }
        assert!(failed);
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;

        let kinds = tokens("# leading\nkey: value # trailing\n");
        assert_eq!(
            kinds[1..],
            [
                BlockMappingStart,
                Key,
                scalar("key", ScalarStyle::Plain),
                Value,
                scalar("value", ScalarStyle::Plain),
                BlockEnd,
                StreamEnd,
            ]
        );
    }
}
