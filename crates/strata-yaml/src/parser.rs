//! The YAML grammar state machine.
//!
//! Consumes the scanner's token stream and emits one event per call to
//! [`Parser::next_event`]. Each state consumes zero or more tokens, emits
//! exactly one event, and either replaces the current state or pushes a
//! continuation on the state stack. Missing nodes (a `KEY` followed
//! directly by `VALUE`, a dangling `,` in a flow collection) synthesise an
//! empty plain scalar event.

use crate::error::{Error, Result};
use crate::event::{CollectionStyle, Event, EventKind, TagDirective};
use crate::mark::Mark;
use crate::scanner::Scanner;
use crate::token::{ScalarStyle, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    BlockNode,
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    FlowMappingEmptyValue,
    End,
}

/// Event-level YAML parser.
///
/// # Example
///
/// ```
/// use strata_yaml::{EventKind, Parser};
///
/// let mut parser = Parser::from_str("a: 1");
/// loop {
///     let event = parser.next_event().unwrap();
///     if event.kind == EventKind::StreamEnd {
///         break;
///     }
/// }
/// ```
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    state: State,
    states: Vec<State>,
    marks: Vec<Mark>,
    tag_directives: Vec<TagDirective>,
}

impl<'a> Parser<'a> {
    pub fn new(source: Box<dyn std::io::Read + 'a>) -> Parser<'a> {
        Parser {
            scanner: Scanner::new(source),
            state: State::StreamStart,
            states: Vec::new(),
            marks: Vec::new(),
            tag_directives: Vec::new(),
        }
    }

    pub fn from_str(text: &'a str) -> Parser<'a> {
        Parser {
            scanner: Scanner::from_str(text),
            state: State::StreamStart,
            states: Vec::new(),
            marks: Vec::new(),
            tag_directives: Vec::new(),
        }
    }

    /// Position of the next unread character, for error reporting.
    pub fn mark(&self) -> Mark {
        self.scanner.mark()
    }

    /// Produce the next event. After `StreamEnd` has been emitted, further
    /// calls keep returning `StreamEnd`.
    pub fn next_event(&mut self) -> Result<Event> {
        match self.state {
            State::StreamStart => self.parse_stream_start(),
            State::ImplicitDocumentStart => self.parse_document_start(true),
            State::DocumentStart => self.parse_document_start(false),
            State::DocumentContent => self.parse_document_content(),
            State::DocumentEnd => self.parse_document_end(),
            State::BlockNode => self.parse_node(true, false),
            State::BlockSequenceFirstEntry => self.parse_block_sequence_entry(true),
            State::BlockSequenceEntry => self.parse_block_sequence_entry(false),
            State::IndentlessSequenceEntry => self.parse_indentless_sequence_entry(),
            State::BlockMappingFirstKey => self.parse_block_mapping_key(true),
            State::BlockMappingKey => self.parse_block_mapping_key(false),
            State::BlockMappingValue => self.parse_block_mapping_value(),
            State::FlowSequenceFirstEntry => self.parse_flow_sequence_entry(true),
            State::FlowSequenceEntry => self.parse_flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.parse_flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => {
                self.parse_flow_sequence_entry_mapping_value()
            }
            State::FlowSequenceEntryMappingEnd => self.parse_flow_sequence_entry_mapping_end(),
            State::FlowMappingFirstKey => self.parse_flow_mapping_key(true),
            State::FlowMappingKey => self.parse_flow_mapping_key(false),
            State::FlowMappingValue => self.parse_flow_mapping_value(false),
            State::FlowMappingEmptyValue => self.parse_flow_mapping_value(true),
            State::End => {
                let mark = self.scanner.mark();
                Ok(Event::new(EventKind::StreamEnd, mark, mark))
            }
        }
    }

    fn pop_state(&mut self) -> State {
        self.states.pop().unwrap_or(State::End)
    }

    fn pop_mark(&mut self) -> Mark {
        self.marks.pop().unwrap_or_default()
    }

    /// Emit an empty plain scalar for a missing node.
    fn process_empty_scalar(&mut self, mark: Mark) -> Result<Event> {
        Ok(Event::new(
            EventKind::Scalar {
                anchor: None,
                tag: None,
                value: String::new(),
                plain_implicit: true,
                quoted_implicit: false,
                style: ScalarStyle::Plain,
            },
            mark,
            mark,
        ))
    }

    // --- Stream and document framing ----------------------------------------

    fn parse_stream_start(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let (start_mark, encoding) = match token.kind {
            TokenKind::StreamStart(encoding) => (token.start_mark, encoding),
            _ => {
                return Err(Error::parser(
                    "did not find expected <stream-start>",
                    token.start_mark,
                ))
            }
        };

        self.scanner.next_token()?;
        self.state = State::ImplicitDocumentStart;

        Ok(Event::new(
            EventKind::StreamStart { encoding },
            start_mark,
            start_mark,
        ))
    }

    fn parse_document_start(&mut self, implicit: bool) -> Result<Event> {
        if !implicit {
            // Eat extra document end indicators.
            while self.scanner.peek_token()?.kind == TokenKind::DocumentEnd {
                self.scanner.next_token()?;
            }
        }

        let token = self.scanner.peek_token()?;
        let kind = token.kind.clone();
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        let is_directive = matches!(
            kind,
            TokenKind::VersionDirective { .. } | TokenKind::TagDirective { .. }
        );

        if implicit
            && !is_directive
            && kind != TokenKind::DocumentStart
            && kind != TokenKind::StreamEnd
        {
            // An implicit document: content with no '---'.
            self.process_directives(start_mark)?;
            self.states.push(State::DocumentEnd);
            self.state = State::BlockNode;

            return Ok(Event::new(
                EventKind::DocumentStart {
                    version: None,
                    tag_directives: Vec::new(),
                    implicit: true,
                },
                start_mark,
                start_mark,
            ));
        }

        if kind != TokenKind::StreamEnd {
            let (version, tag_directives) = self.process_directives(start_mark)?;

            let token = self.scanner.peek_token()?;
            if token.kind != TokenKind::DocumentStart {
                return Err(Error::parser(
                    "did not find expected <document start>",
                    token.start_mark,
                ));
            }
            let end_mark = token.end_mark;
            self.scanner.next_token()?;

            self.states.push(State::DocumentEnd);
            self.state = State::DocumentContent;

            return Ok(Event::new(
                EventKind::DocumentStart {
                    version,
                    tag_directives,
                    implicit: false,
                },
                start_mark,
                end_mark,
            ));
        }

        self.scanner.next_token()?;
        self.state = State::End;
        Ok(Event::new(EventKind::StreamEnd, start_mark, end_mark))
    }

    fn parse_document_content(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;

        let empty = matches!(
            token.kind,
            TokenKind::VersionDirective { .. }
                | TokenKind::TagDirective { .. }
                | TokenKind::DocumentStart
                | TokenKind::DocumentEnd
                | TokenKind::StreamEnd
        );

        if empty {
            self.state = self.pop_state();
            self.process_empty_scalar(start_mark)
        } else {
            self.parse_node(true, false)
        }
    }

    fn parse_document_end(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;
        let mut end_mark = token.start_mark;
        let mut implicit = true;

        if token.kind == TokenKind::DocumentEnd {
            end_mark = token.end_mark;
            self.scanner.next_token()?;
            implicit = false;
        }

        // The directive table does not persist between documents.
        self.tag_directives.clear();

        self.state = State::DocumentStart;
        Ok(Event::new(
            EventKind::DocumentEnd { implicit },
            start_mark,
            end_mark,
        ))
    }

    /// Consume `%YAML`/`%TAG` tokens ahead of a document and seed the
    /// directive table, defaults included.
    fn process_directives(
        &mut self,
        mark: Mark,
    ) -> Result<(Option<(u32, u32)>, Vec<TagDirective>)> {
        let mut version: Option<(u32, u32)> = None;
        let mut tag_directives: Vec<TagDirective> = Vec::new();

        loop {
            let (kind, directive_mark) = {
                let token = self.scanner.peek_token()?;
                (token.kind.clone(), token.start_mark)
            };

            match kind {
                TokenKind::VersionDirective { major, minor } => {
                    if version.is_some() {
                        return Err(Error::parser(
                            "found duplicate %YAML directive",
                            directive_mark,
                        ));
                    }
                    // Only YAML 1.1 is supported.
                    if major != 1 || minor != 1 {
                        return Err(Error::parser(
                            "found incompatible YAML document",
                            directive_mark,
                        ));
                    }
                    version = Some((major, minor));
                    self.scanner.next_token()?;
                }
                TokenKind::TagDirective { handle, prefix } => {
                    let directive = TagDirective { handle, prefix };
                    self.append_tag_directive(directive.clone(), false, directive_mark)?;
                    tag_directives.push(directive);
                    self.scanner.next_token()?;
                }
                _ => break,
            }
        }

        for (handle, prefix) in [("!", "!"), ("!!", "tag:yaml.org,2002:")] {
            self.append_tag_directive(
                TagDirective {
                    handle: handle.into(),
                    prefix: prefix.into(),
                },
                true,
                mark,
            )?;
        }

        Ok((version, tag_directives))
    }

    fn append_tag_directive(
        &mut self,
        directive: TagDirective,
        allow_duplicates: bool,
        mark: Mark,
    ) -> Result<()> {
        if self
            .tag_directives
            .iter()
            .any(|existing| existing.handle == directive.handle)
        {
            if allow_duplicates {
                return Ok(());
            }
            return Err(Error::parser("found duplicate %TAG directive", mark));
        }

        self.tag_directives.push(directive);
        Ok(())
    }

    // --- Nodes --------------------------------------------------------------

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event> {
        let token = self.scanner.peek_token()?;

        if let TokenKind::Alias(_) = token.kind {
            let token = self.scanner.next_token()?;
            let anchor = match token.kind {
                TokenKind::Alias(anchor) => anchor,
                _ => unreachable!("just matched an alias token"),
            };
            self.state = self.pop_state();
            return Ok(Event::new(
                EventKind::Alias { anchor },
                token.start_mark,
                token.end_mark,
            ));
        }

        let mut start_mark = token.start_mark;
        let mut end_mark = token.start_mark;
        let mut tag_mark = token.start_mark;

        let mut anchor: Option<String> = None;
        let mut tag_handle: Option<String> = None;
        let mut tag_suffix: Option<String> = None;

        // properties ::= TAG ANCHOR? | ANCHOR TAG?
        if let TokenKind::Anchor(_) = token.kind {
            let token = self.scanner.next_token()?;
            start_mark = token.start_mark;
            end_mark = token.end_mark;
            if let TokenKind::Anchor(name) = token.kind {
                anchor = Some(name);
            }

            if let TokenKind::Tag { .. } = self.scanner.peek_token()?.kind {
                let token = self.scanner.next_token()?;
                tag_mark = token.start_mark;
                end_mark = token.end_mark;
                if let TokenKind::Tag { handle, suffix } = token.kind {
                    tag_handle = Some(handle);
                    tag_suffix = Some(suffix);
                }
            }
        } else if let TokenKind::Tag { .. } = token.kind {
            let token = self.scanner.next_token()?;
            start_mark = token.start_mark;
            tag_mark = token.start_mark;
            end_mark = token.end_mark;
            if let TokenKind::Tag { handle, suffix } = token.kind {
                tag_handle = Some(handle);
                tag_suffix = Some(suffix);
            }

            if let TokenKind::Anchor(_) = self.scanner.peek_token()?.kind {
                let token = self.scanner.next_token()?;
                end_mark = token.end_mark;
                if let TokenKind::Anchor(name) = token.kind {
                    anchor = Some(name);
                }
            }
        }

        // Resolve the tag against the directive table.
        let mut tag: Option<String> = None;
        if let (Some(handle), Some(suffix)) = (tag_handle.as_deref(), tag_suffix) {
            if handle.is_empty() {
                tag = Some(suffix);
            } else {
                match self
                    .tag_directives
                    .iter()
                    .find(|directive| directive.handle == handle)
                {
                    Some(directive) => {
                        tag = Some(format!("{}{}", directive.prefix, suffix));
                    }
                    None => {
                        return Err(Error::parser_context(
                            "while parsing a node",
                            start_mark,
                            "found undefined tag handle",
                            tag_mark,
                        ));
                    }
                }
            }
        }

        let implicit = tag.as_deref().map_or(true, str::is_empty);

        let token = self.scanner.peek_token()?;

        if indentless_sequence && token.kind == TokenKind::BlockEntry {
            end_mark = token.end_mark;
            self.state = State::IndentlessSequenceEntry;
            return Ok(Event::new(
                EventKind::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    style: CollectionStyle::Block,
                },
                start_mark,
                end_mark,
            ));
        }

        match &token.kind {
            TokenKind::Scalar { .. } => {
                let token = self.scanner.next_token()?;
                end_mark = token.end_mark;
                let (value, style) = match token.kind {
                    TokenKind::Scalar { value, style } => (value, style),
                    _ => unreachable!("just matched a scalar token"),
                };

                let plain_implicit = (style == ScalarStyle::Plain && tag.is_none())
                    || tag.as_deref() == Some("!");
                let quoted_implicit = !plain_implicit && tag.is_none();

                self.state = self.pop_state();
                Ok(Event::new(
                    EventKind::Scalar {
                        anchor,
                        tag,
                        value,
                        plain_implicit,
                        quoted_implicit,
                        style,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            TokenKind::FlowSequenceStart => {
                end_mark = token.end_mark;
                self.state = State::FlowSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        implicit,
                        style: CollectionStyle::Flow,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            TokenKind::FlowMappingStart => {
                end_mark = token.end_mark;
                self.state = State::FlowMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        implicit,
                        style: CollectionStyle::Flow,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            TokenKind::BlockSequenceStart if block => {
                end_mark = token.end_mark;
                self.state = State::BlockSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        implicit,
                        style: CollectionStyle::Block,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            TokenKind::BlockMappingStart if block => {
                end_mark = token.end_mark;
                self.state = State::BlockMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        implicit,
                        style: CollectionStyle::Block,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            _ if anchor.is_some() || tag.is_some() => {
                // Properties with no content: an empty scalar node.
                self.state = self.pop_state();
                Ok(Event::new(
                    EventKind::Scalar {
                        anchor,
                        tag,
                        value: String::new(),
                        plain_implicit: implicit,
                        quoted_implicit: false,
                        style: ScalarStyle::Plain,
                    },
                    start_mark,
                    end_mark,
                ))
            }

            _ => Err(Error::parser_context(
                if block {
                    "while parsing a block node"
                } else {
                    "while parsing a flow node"
                },
                start_mark,
                "did not find expected node content",
                token.start_mark,
            )),
        }
    }

    // --- Block collections --------------------------------------------------

    fn parse_block_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            let mark = self.scanner.peek_token()?.start_mark;
            self.marks.push(mark);
            self.scanner.next_token()?;
        }

        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        match token.kind {
            TokenKind::BlockEntry => {
                self.scanner.next_token()?;
                let token = self.scanner.peek_token()?;
                if token.kind != TokenKind::BlockEntry && token.kind != TokenKind::BlockEnd {
                    self.states.push(State::BlockSequenceEntry);
                    self.parse_node(true, false)
                } else {
                    self.state = State::BlockSequenceEntry;
                    self.process_empty_scalar(end_mark)
                }
            }

            TokenKind::BlockEnd => {
                self.state = self.pop_state();
                self.pop_mark();
                self.scanner.next_token()?;
                Ok(Event::new(EventKind::SequenceEnd, start_mark, end_mark))
            }

            _ => Err(Error::parser_context(
                "while parsing a block collection",
                self.pop_mark(),
                "did not find expected '-' indicator",
                start_mark,
            )),
        }
    }

    fn parse_indentless_sequence_entry(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        if token.kind == TokenKind::BlockEntry {
            self.scanner.next_token()?;
            let token = self.scanner.peek_token()?;
            let terminates = matches!(
                token.kind,
                TokenKind::BlockEntry
                    | TokenKind::Key
                    | TokenKind::Value
                    | TokenKind::BlockEnd
            );
            if !terminates {
                self.states.push(State::IndentlessSequenceEntry);
                self.parse_node(true, false)
            } else {
                self.state = State::IndentlessSequenceEntry;
                self.process_empty_scalar(end_mark)
            }
        } else {
            // An indentless sequence closes without a BLOCK-END token.
            self.state = self.pop_state();
            Ok(Event::new(EventKind::SequenceEnd, start_mark, start_mark))
        }
    }

    fn parse_block_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            let mark = self.scanner.peek_token()?.start_mark;
            self.marks.push(mark);
            self.scanner.next_token()?;
        }

        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        match token.kind {
            TokenKind::Key => {
                self.scanner.next_token()?;
                let token = self.scanner.peek_token()?;
                let missing = matches!(
                    token.kind,
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
                );
                if !missing {
                    self.states.push(State::BlockMappingValue);
                    self.parse_node(true, true)
                } else {
                    self.state = State::BlockMappingValue;
                    self.process_empty_scalar(end_mark)
                }
            }

            TokenKind::BlockEnd => {
                self.state = self.pop_state();
                self.pop_mark();
                self.scanner.next_token()?;
                Ok(Event::new(EventKind::MappingEnd, start_mark, end_mark))
            }

            _ => Err(Error::parser_context(
                "while parsing a block mapping",
                self.pop_mark(),
                "did not find expected key",
                start_mark,
            )),
        }
    }

    fn parse_block_mapping_value(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        if token.kind == TokenKind::Value {
            self.scanner.next_token()?;
            let token = self.scanner.peek_token()?;
            let missing = matches!(
                token.kind,
                TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
            );
            if !missing {
                self.states.push(State::BlockMappingKey);
                self.parse_node(true, true)
            } else {
                self.state = State::BlockMappingKey;
                self.process_empty_scalar(end_mark)
            }
        } else {
            self.state = State::BlockMappingKey;
            self.process_empty_scalar(start_mark)
        }
    }

    // --- Flow collections ---------------------------------------------------

    fn parse_flow_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            let mark = self.scanner.peek_token()?.start_mark;
            self.marks.push(mark);
            self.scanner.next_token()?;
        }

        let mut token = self.scanner.peek_token()?;

        if token.kind != TokenKind::FlowSequenceEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.scanner.next_token()?;
                    token = self.scanner.peek_token()?;
                } else {
                    let start_mark = token.start_mark;
                    return Err(Error::parser_context(
                        "while parsing a flow sequence",
                        self.pop_mark(),
                        "did not find expected ',' or ']'",
                        start_mark,
                    ));
                }
            }

            if token.kind == TokenKind::Key {
                // A single pair inside a sequence is an implicit mapping.
                let start_mark = token.start_mark;
                let end_mark = token.end_mark;
                self.state = State::FlowSequenceEntryMappingKey;
                self.scanner.next_token()?;
                return Ok(Event::new(
                    EventKind::MappingStart {
                        anchor: None,
                        tag: None,
                        implicit: true,
                        style: CollectionStyle::Flow,
                    },
                    start_mark,
                    end_mark,
                ));
            } else if token.kind != TokenKind::FlowSequenceEnd {
                self.states.push(State::FlowSequenceEntry);
                return self.parse_node(false, false);
            }
        }

        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        self.state = self.pop_state();
        self.pop_mark();
        self.scanner.next_token()?;
        Ok(Event::new(EventKind::SequenceEnd, start_mark, end_mark))
    }

    fn parse_flow_sequence_entry_mapping_key(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let end_mark = token.end_mark;

        let missing = matches!(
            token.kind,
            TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowSequenceEnd
        );

        if !missing {
            self.states.push(State::FlowSequenceEntryMappingValue);
            self.parse_node(false, false)
        } else {
            self.scanner.next_token()?;
            self.state = State::FlowSequenceEntryMappingValue;
            self.process_empty_scalar(end_mark)
        }
    }

    fn parse_flow_sequence_entry_mapping_value(&mut self) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;

        if token.kind == TokenKind::Value {
            self.scanner.next_token()?;
            let token = self.scanner.peek_token()?;
            let start_mark = token.start_mark;
            let missing = matches!(
                token.kind,
                TokenKind::FlowEntry | TokenKind::FlowSequenceEnd
            );
            if !missing {
                self.states.push(State::FlowSequenceEntryMappingEnd);
                return self.parse_node(false, false);
            }
            self.state = State::FlowSequenceEntryMappingEnd;
            return self.process_empty_scalar(start_mark);
        }

        self.state = State::FlowSequenceEntryMappingEnd;
        self.process_empty_scalar(start_mark)
    }

    fn parse_flow_sequence_entry_mapping_end(&mut self) -> Result<Event> {
        let mark = self.scanner.peek_token()?.start_mark;
        self.state = State::FlowSequenceEntry;
        Ok(Event::new(EventKind::MappingEnd, mark, mark))
    }

    fn parse_flow_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            let mark = self.scanner.peek_token()?.start_mark;
            self.marks.push(mark);
            self.scanner.next_token()?;
        }

        let mut token = self.scanner.peek_token()?;

        if token.kind != TokenKind::FlowMappingEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.scanner.next_token()?;
                    token = self.scanner.peek_token()?;
                } else {
                    let start_mark = token.start_mark;
                    return Err(Error::parser_context(
                        "while parsing a flow mapping",
                        self.pop_mark(),
                        "did not find expected ',' or '}'",
                        start_mark,
                    ));
                }
            }

            if token.kind == TokenKind::Key {
                self.scanner.next_token()?;
                let token = self.scanner.peek_token()?;
                let start_mark = token.start_mark;
                let missing = matches!(
                    token.kind,
                    TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowMappingEnd
                );
                if !missing {
                    self.states.push(State::FlowMappingValue);
                    return self.parse_node(false, false);
                }
                self.state = State::FlowMappingValue;
                return self.process_empty_scalar(start_mark);
            } else if token.kind != TokenKind::FlowMappingEnd {
                // A value with no key: the key is an empty node.
                self.states.push(State::FlowMappingEmptyValue);
                return self.parse_node(false, false);
            }
        }

        let start_mark = token.start_mark;
        let end_mark = token.end_mark;

        self.state = self.pop_state();
        self.pop_mark();
        self.scanner.next_token()?;
        Ok(Event::new(EventKind::MappingEnd, start_mark, end_mark))
    }

    fn parse_flow_mapping_value(&mut self, empty: bool) -> Result<Event> {
        let token = self.scanner.peek_token()?;
        let start_mark = token.start_mark;

        if empty {
            self.state = State::FlowMappingKey;
            return self.process_empty_scalar(start_mark);
        }

        if token.kind == TokenKind::Value {
            self.scanner.next_token()?;
            let token = self.scanner.peek_token()?;
            let start_mark = token.start_mark;
            let missing = matches!(
                token.kind,
                TokenKind::FlowEntry | TokenKind::FlowMappingEnd
            );
            if !missing {
                self.states.push(State::FlowMappingKey);
                return self.parse_node(false, false);
            }
            self.state = State::FlowMappingKey;
            return self.process_empty_scalar(start_mark);
        }

        self.state = State::FlowMappingKey;
        self.process_empty_scalar(start_mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(text: &str) -> Vec<EventKind> {
        let mut parser = Parser::from_str(text);
        let mut kinds = Vec::new();
        loop {
            let event = parser.next_event().expect("parse failed");
            let done = event.kind == EventKind::StreamEnd;
            kinds.push(event.kind);
            if done {
                break;
            }
        }
        kinds
    }

    fn plain(value: &str) -> EventKind {
        EventKind::Scalar {
            anchor: None,
            tag: None,
            value: value.into(),
            plain_implicit: true,
            quoted_implicit: false,
            style: ScalarStyle::Plain,
        }
    }

    #[test]
    fn scalar_document() {
        let kinds = events("hello");
        assert!(matches!(kinds[0], EventKind::StreamStart { .. }));
        assert!(matches!(kinds[1], EventKind::DocumentStart { implicit: true, .. }));
        assert_eq!(kinds[2], plain("hello"));
        assert!(matches!(kinds[3], EventKind::DocumentEnd { implicit: true }));
        assert_eq!(kinds[4], EventKind::StreamEnd);
    }

    #[test]
    fn block_mapping_events() {
        let kinds = events("a: 1\nb: 2\n");
        assert!(matches!(
            kinds[2],
            EventKind::MappingStart {
                style: CollectionStyle::Block,
                ..
            }
        ));
        assert_eq!(kinds[3], plain("a"));
        assert_eq!(kinds[4], plain("1"));
        assert_eq!(kinds[5], plain("b"));
        assert_eq!(kinds[6], plain("2"));
        assert_eq!(kinds[7], EventKind::MappingEnd);
    }

    #[test]
    fn missing_value_synthesises_empty_scalar() {
        let kinds = events("a:\nb: 2\n");
        assert_eq!(kinds[3], plain("a"));
        assert_eq!(kinds[4], plain(""));
    }

    #[test]
    fn flow_mapping_with_missing_value() {
        let kinds = events("{ a: 1, b: [2, 3], c: }");

        assert!(matches!(
            kinds[2],
            EventKind::MappingStart {
                style: CollectionStyle::Flow,
                ..
            }
        ));
        assert_eq!(kinds[3], plain("a"));
        assert_eq!(kinds[4], plain("1"));
        assert_eq!(kinds[5], plain("b"));
        assert!(matches!(
            kinds[6],
            EventKind::SequenceStart {
                style: CollectionStyle::Flow,
                ..
            }
        ));
        assert_eq!(kinds[7], plain("2"));
        assert_eq!(kinds[8], plain("3"));
        assert_eq!(kinds[9], EventKind::SequenceEnd);
        assert_eq!(kinds[10], plain("c"));
        assert_eq!(kinds[11], plain(""));
        assert_eq!(kinds[12], EventKind::MappingEnd);
    }

    #[test]
    fn indentless_sequence_in_mapping() {
        let kinds = events("items:\n- a\n- b\n");
        assert_eq!(kinds[3], plain("items"));
        assert!(matches!(kinds[4], EventKind::SequenceStart { .. }));
        assert_eq!(kinds[5], plain("a"));
        assert_eq!(kinds[6], plain("b"));
        assert_eq!(kinds[7], EventKind::SequenceEnd);
    }

    #[test]
    fn anchor_and_alias_events() {
        let kinds = events("a: &x 1\nb: *x\n");

        assert!(kinds.iter().any(|kind| matches!(
            kind,
            EventKind::Scalar { anchor: Some(anchor), .. } if anchor == "x"
        )));
        assert!(kinds
            .iter()
            .any(|kind| matches!(kind, EventKind::Alias { anchor } if anchor == "x")));
    }

    #[test]
    fn secondary_tag_handle_resolves_to_yaml_namespace() {
        let kinds = events("!!str 42");
        assert!(kinds.iter().any(|kind| matches!(
            kind,
            EventKind::Scalar { tag: Some(tag), .. } if tag == "tag:yaml.org,2002:str"
        )));
    }

    #[test]
    fn tag_directive_prefixes_suffix() {
        let kinds = events("%TAG !e! tag:example.com,2000:app/\n---\n!e!thing 1\n");
        assert!(kinds.iter().any(|kind| matches!(
            kind,
            EventKind::Scalar { tag: Some(tag), .. } if tag == "tag:example.com,2000:app/thing"
        )));
    }

    #[test]
    fn undefined_tag_handle_is_an_error() {
        let mut parser = Parser::from_str("!u!thing 1");
        let error = loop {
            match parser.next_event() {
                Err(error) => break error,
                Ok(event) if event.kind == EventKind::StreamEnd => {
                    panic!("expected parse error")
                }
                Ok(_) => {}
            }
        };
        assert_eq!(error.problem, "found undefined tag handle");
    }

    #[test]
    fn yaml_12_directive_is_rejected() {
        let mut parser = Parser::from_str("%YAML 1.2\n---\nx\n");
        let error = loop {
            match parser.next_event() {
                Err(error) => break error,
                Ok(event) if event.kind == EventKind::StreamEnd => {
                    panic!("expected parse error")
                }
                Ok(_) => {}
            }
        };
        assert_eq!(error.problem, "found incompatible YAML document");
    }

    #[test]
    fn duplicate_yaml_directive_is_rejected() {
        let mut parser = Parser::from_str("%YAML 1.1\n%YAML 1.1\n---\nx\n");
        let error = loop {
            match parser.next_event() {
                Err(error) => break error,
                Ok(event) if event.kind == EventKind::StreamEnd => {
                    panic!("expected parse error")
                }
                Ok(_) => {}
            }
        };
        assert_eq!(error.problem, "found duplicate %YAML directive");
    }

    #[test]
    fn multiple_documents() {
        let kinds = events("---\none\n---\ntwo\n");
        let scalars: Vec<_> = kinds
            .iter()
            .filter(|kind| matches!(kind, EventKind::Scalar { .. }))
            .collect();
        assert_eq!(scalars.len(), 2);

        let document_starts = kinds
            .iter()
            .filter(|kind| matches!(kind, EventKind::DocumentStart { .. }))
            .count();
        assert_eq!(document_starts, 2);
    }

    #[test]
    fn explicit_document_markers() {
        let kinds = events("---\nx\n...\n");
        assert!(matches!(
            kinds[1],
            EventKind::DocumentStart { implicit: false, .. }
        ));
        assert!(matches!(
            kinds[3],
            EventKind::DocumentEnd { implicit: false }
        ));
    }
}
