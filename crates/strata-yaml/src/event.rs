//! Parser output.

use crate::mark::Mark;
use crate::reader::Encoding;
use crate::token::ScalarStyle;

/// Collection presentation style carried on start events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStyle {
    Block,
    Flow,
}

/// A `%TAG` mapping from handle to URI prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDirective {
    pub handle: String,
    pub prefix: String,
}

/// One step of the event stream produced by [`Parser`](crate::Parser).
///
/// The stream for a well-formed input is
/// `StreamStart (DocumentStart node DocumentEnd)* StreamEnd`, where `node`
/// is a scalar, an alias, or a sequence/mapping bracketed by its start and
/// end events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    StreamStart {
        encoding: Encoding,
    },
    StreamEnd,
    DocumentStart {
        version: Option<(u32, u32)>,
        tag_directives: Vec<TagDirective>,
        implicit: bool,
    },
    DocumentEnd {
        implicit: bool,
    },
    Alias {
        anchor: String,
    },
    Scalar {
        anchor: Option<String>,
        tag: Option<String>,
        value: String,
        plain_implicit: bool,
        quoted_implicit: bool,
        style: ScalarStyle,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        style: CollectionStyle,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        style: CollectionStyle,
    },
    MappingEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Event {
    pub fn new(kind: EventKind, start_mark: Mark, end_mark: Mark) -> Event {
        Event {
            kind,
            start_mark,
            end_mark,
        }
    }
}
