//! # strata-yaml
//!
//! A streaming YAML 1.1 pipeline producing [`strata_value::Value`] trees.
//!
//! The pipeline is strictly layered:
//!
//! 1. a reader decodes raw bytes (UTF-8 or UTF-16 with BOM detection) into
//!    validated characters,
//! 2. the [`Scanner`] turns characters into tokens — indentation-derived
//!    block structure, flow punctuation, directives, all four scalar
//!    styles,
//! 3. the [`Parser`] runs the grammar state machine over tokens and emits
//!    events,
//! 4. the loader binds events to values, resolving anchors/aliases, plain
//!    scalar types and `<<` merge keys.
//!
//! Most callers only need [`load_yaml_text`] or [`load_yaml_file`]; the
//! scanner and parser layers are public for tools that want the token or
//! event streams.
//!
//! ## Example
//!
//! ```
//! use strata_yaml::load_yaml_text;
//!
//! let config = load_yaml_text(r#"
//! window:
//!   width: 1280
//!   title: main
//! flags: [a, b]
//! "#).unwrap();
//!
//! assert_eq!(config.member("window").member("width").as_i32(), 1280);
//! assert_eq!(config.member("flags").elt(1).as_str(), "b");
//! ```
//!
//! Errors carry a problem description plus the `(line, column)` marks of
//! the problem and of the construct being scanned when it occurred.

mod emitter;
mod error;
mod event;
mod loader;
mod mark;
mod parser;
mod reader;
mod scanner;
mod token;

pub use emitter::{as_yaml, save_as_yaml};
pub use error::{Error, ErrorKind, Result};
pub use event::{CollectionStyle, Event, EventKind, TagDirective};
pub use loader::{load_yaml_file, load_yaml_reader, load_yaml_text};
pub use mark::Mark;
pub use parser::Parser;
pub use reader::Encoding;
pub use scanner::Scanner;
pub use token::{ScalarStyle, Token, TokenKind};
