//! # strata-value
//!
//! The polymorphic value model underlying strata configurations: a tagged
//! variant over null, bool, four integer widths, double, UTF-8 string,
//! array and ordered object.
//!
//! ## Design
//!
//! String and array payloads are immutable and shared by reference count,
//! so cloning a value is cheap; mutating an array means replacing its
//! payload. Object payloads are mutable and deep-copied on clone, so a
//! copied tree can be edited freely without affecting the original. Each
//! object carries a monotonic modification counter that observers can use
//! for change detection.
//!
//! Numeric coercions saturate at the destination bounds and never fail;
//! [`Value::is_convertible_to`] reports whether a conversion would be
//! lossless for the held value.
//!
//! ## Example
//!
//! ```
//! use strata_value::{member_path, Value};
//!
//! let mut config = Value::new_object();
//! config.set_member("window", {
//!     let mut window = Value::new_object();
//!     window.set_member("width", Value::from(1280));
//!     window
//! });
//!
//! assert_eq!(member_path(&config, "window.width").as_i32(), 1280);
//! ```

mod id;
mod object;
mod path;
mod value;

pub use id::id_from_str;
pub use object::ObjectValue;
pub use path::{member_path, update_member_path};
pub use value::{Value, ValueType};
