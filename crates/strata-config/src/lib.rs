//! # strata-config
//!
//! Layered configuration on top of the strata value model: load a JSON or
//! YAML file, resolve its `import` directives (with optional per-variant
//! overlays) and its `template` inheritance, and apply command-line
//! `key=value` overrides.
//!
//! ## Example
//!
//! Given `base.yml`:
//!
//! ```yaml
//! model:
//!   mesh: "a"
//!   colour: "red"
//! ```
//!
//! and `main.yml`:
//!
//! ```yaml
//! import: "base.yml"
//! model:
//!   colour: "blue"
//! ```
//!
//! loading `main.yml` produces the merged tree
//! `{ model: { mesh: "a", colour: "blue" } }` — imports form the base, the
//! importing file wins.

mod compose;
mod error;
mod paths;
mod settings;

pub use compose::{
    config_json_format, load_config, load_json_config, load_yaml_config, save_config,
    ConfigInfo,
};
pub use error::{ComposeError, SettingsError};
pub use paths::path_normalise;
pub use settings::apply_settings;
