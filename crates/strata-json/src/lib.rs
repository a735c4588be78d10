//! # strata-json
//!
//! JSON reading and writing for [`strata_value::Value`] trees.
//!
//! The reader accepts a practical superset of JSON — comments, trailing
//! commas, bare keys, `Infinity`/`NaN` — unless strict mode is requested,
//! and preserves integer widths by picking the narrowest numeric kind. The
//! writer is driven by [`JsonFormat`], covering everything from compact
//! single-line output to indented output with array-margin wrapping.
//!
//! ## Example
//!
//! ```
//! use strata_json::{as_json, load_json_text, JsonFormat};
//!
//! let value = load_json_text("{ size: [10, 20], /* px */ dpi: 96 }").unwrap();
//! let text = as_json(&value, -1, JsonFormat::default());
//! assert_eq!(text, "{ size: [10, 20], dpi: 96 }");
//! ```

mod error;
mod reader;
mod writer;

pub use error::{Diagnostic, ParseErrors};
pub use reader::{load_json_file, load_json_text, load_json_text_opts};
pub use writer::{as_json, as_json_formatted, InfNanStyle, JsonFormat, JsonWriter};
