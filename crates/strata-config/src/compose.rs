//! Configuration composition.
//!
//! [`load_config`] reads a root file (JSON or YAML by extension) and then
//! resolves two in-document directives:
//!
//! - **`import`** — a path or list of paths loaded relative to the current
//!   file, composed depth-first. The imports form the base and the
//!   importing object overrides them. When a variant is set in
//!   [`ConfigInfo`], a sibling `name_<variant>.ext` file is merged on top
//!   of each primary import.
//! - **`template`** — a member naming a sibling of the enclosing object;
//!   the sibling (itself template-expanded first) is copied and the local
//!   object merged over the copy, giving inheritance-with-override inside
//!   one document.
//!
//! Composition is best-effort: a missing import is recorded but the rest of
//! the tree still composes, and the partial result travels with the error.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use strata_value::Value;

use crate::error::ComposeError;
use crate::paths::{path_full, path_has_extensions, path_location, path_normalise, path_with_suffix};

const JSON_EXTENSIONS: [&str; 3] = [".json", ".jsn", ".json5"];
const YAML_EXTENSIONS: [&str; 2] = [".yaml", ".yml"];

/// Loading context and results.
#[derive(Debug, Clone, Default)]
pub struct ConfigInfo {
    /// If non-empty, additionally look for variant files with this suffix
    /// when resolving imports.
    pub variant: String,

    /// Filled in with the (normalised) path of the root config file.
    pub main: PathBuf,
    /// All other config files pulled in by imports.
    pub imports: BTreeSet<PathBuf>,
}

impl ConfigInfo {
    pub fn new() -> ConfigInfo {
        ConfigInfo::default()
    }

    pub fn with_variant(variant: impl Into<String>) -> ConfigInfo {
        ConfigInfo {
            variant: variant.into(),
            ..ConfigInfo::default()
        }
    }
}

type FileLoader = fn(&Path) -> Result<Value, String>;

fn load_file_general(path: &Path) -> Result<Value, String> {
    if path_has_extensions(path, &JSON_EXTENSIONS) {
        return strata_json::load_json_file(path).map_err(|errors| errors.to_string());
    }

    if path_has_extensions(path, &YAML_EXTENSIONS) {
        return strata_yaml::load_yaml_file(path).map_err(|error| error.to_string());
    }

    Err(format!("Unsupported file format: '{}'", path.display()))
}

fn load_file_json(path: &Path) -> Result<Value, String> {
    strata_json::load_json_file(path).map_err(|errors| errors.to_string())
}

fn load_file_yaml(path: &Path) -> Result<Value, String> {
    strata_yaml::load_yaml_file(path).map_err(|error| error.to_string())
}

/// Load a config file with import and template resolution, dispatching on
/// the file extension.
///
/// # Example
///
/// ```no_run
/// use strata_config::{load_config, ConfigInfo};
///
/// let mut info = ConfigInfo::new();
/// let config = load_config("game/config.yaml", &mut info).unwrap();
/// println!("loaded {} with {} imports", info.main.display(), info.imports.len());
/// # let _ = config;
/// ```
pub fn load_config(
    path: impl AsRef<Path>,
    info: &mut ConfigInfo,
) -> Result<Value, ComposeError> {
    load_config_internal(load_file_general, path.as_ref(), info)
}

/// JSON-specific variant of [`load_config`], ignoring the file extension.
pub fn load_json_config(
    path: impl AsRef<Path>,
    info: &mut ConfigInfo,
) -> Result<Value, ComposeError> {
    load_config_internal(load_file_json, path.as_ref(), info)
}

/// YAML-specific variant of [`load_config`], ignoring the file extension.
pub fn load_yaml_config(
    path: impl AsRef<Path>,
    info: &mut ConfigInfo,
) -> Result<Value, ComposeError> {
    load_config_internal(load_file_yaml, path.as_ref(), info)
}

fn load_config_internal(
    loader: FileLoader,
    path: &Path,
    info: &mut ConfigInfo,
) -> Result<Value, ComposeError> {
    debug!(path = %path.display(), "loading config");

    let mut errors = Vec::new();
    let mut config = Value::Null;

    let mut success = match loader(path) {
        Ok(value) => {
            config = value;
            true
        }
        Err(message) => {
            errors.push(message);
            false
        }
    };

    if success {
        info.main = path_normalise(path);
        info.imports.clear();

        let base = path_location(&info.main);
        success = add_imports(loader, &base, &mut config, &mut errors, info);
    }

    if !apply_templates(&mut config, &mut errors) {
        success = false;
    }

    if !success {
        errors.push(format!("  in {}", path.display()));
        return Err(ComposeError {
            errors,
            partial: config,
        });
    }

    Ok(config)
}

/// Save a config as JSON or YAML according to the path's extension.
pub fn save_config(path: impl AsRef<Path>, config: &Value) -> Result<(), String> {
    let path = path.as_ref();

    if path_has_extensions(path, &JSON_EXTENSIONS) {
        let text = strata_json::as_json_formatted(config, &config_json_format());
        return std::fs::write(path, text).map_err(|error| error.to_string());
    }

    if path_has_extensions(path, &YAML_EXTENSIONS) {
        return strata_yaml::save_as_yaml(path, config, config_json_format().indent)
            .map_err(|error| error.to_string());
    }

    Err(String::from("Unrecognised config type"))
}

/// The house output style for saved configs.
pub fn config_json_format() -> strata_json::JsonFormat {
    strata_json::JsonFormat {
        indent: 4,
        quote_keys: false,
        array_margin: 74,
        max_precision: 6,
        trim_zeroes: true,
        inf_nan: strata_json::InfNanStyle::C,
    }
}

// --- Imports -----------------------------------------------------------------

fn add_imports(
    loader: FileLoader,
    base_path: &Path,
    value: &mut Value,
    errors: &mut Vec<String>,
    info: &mut ConfigInfo,
) -> bool {
    let mut success = true;

    // Depth-first: children resolve their own imports before this level
    // merges anything.
    for index in 0..value.num_elts() {
        if let Some(child) = value.elt_mut(index) {
            if !add_imports(loader, base_path, child, errors, info) {
                success = false;
            }
        }
    }

    let Some(object) = value.as_object_mut() else {
        return success;
    };

    for (_, member) in object.iter_mut() {
        if !add_imports(loader, base_path, member, errors, info) {
            success = false;
        }
    }

    let import_values = value.member("import").clone();
    if import_values.is_null() {
        return success;
    }

    let mut import_value = Value::Null;
    let mut one_success = false;

    if let Some(import_paths) = import_values.as_array() {
        for import_path in import_paths {
            match load_import(import_path, loader, base_path, errors, info) {
                Some(loaded) => {
                    import_value.merge(&loaded);
                    one_success = true;
                }
                // Keep trying the remaining imports so the caller gets a
                // best-effort result along with the failure.
                None => success = false,
            }
        }
    } else {
        match load_import(&import_values, loader, base_path, errors, info) {
            Some(loaded) => {
                import_value = loaded;
                one_success = true;
            }
            None => success = false,
        }
    }

    if one_success {
        // The composed import becomes the base; the local members override.
        value.remove_member("import");
        value.swap(&mut import_value);
        value.merge(&import_value);
    }

    success
}

fn load_import(
    import_path_value: &Value,
    loader: FileLoader,
    base_path: &Path,
    errors: &mut Vec<String>,
    info: &mut ConfigInfo,
) -> Option<Value> {
    let relative = match import_path_value.as_str_opt() {
        Some(relative) => relative,
        None => {
            errors.push(format!(
                "Expecting import path in '{}'",
                strata_json::as_json(import_path_value, -1, strata_json::JsonFormat::default())
            ));
            return None;
        }
    };

    let import_path = path_full(relative, base_path);
    debug!(path = %import_path.display(), "resolving import");

    let mut value = Value::Null;
    let mut success = false;
    let mut import_exists = false;

    if import_path.is_file() {
        import_exists = true;

        match loader(&import_path) {
            Ok(loaded) => {
                value = loaded;
                info.imports.insert(import_path.clone());
                success = add_imports(loader, &path_location(&import_path), &mut value, errors, info);
            }
            Err(message) => errors.push(message),
        }

        if !success {
            errors.push(format!("  in {}", import_path.display()));
        }
    }

    // Variant files (name_<variant>.ext) are merged on top of the primary
    // import.
    if !info.variant.is_empty() {
        let variant_path = path_with_suffix(&import_path, &format!("_{}", info.variant));

        if variant_path.is_file() {
            import_exists = true;
            let mut variant_value = Value::Null;
            let mut variant_success = false;

            match loader(&variant_path) {
                Ok(loaded) => {
                    variant_value = loaded;
                    info.imports.insert(variant_path.clone());
                    variant_success = add_imports(
                        loader,
                        &path_location(&variant_path),
                        &mut variant_value,
                        errors,
                        info,
                    );
                }
                Err(message) => errors.push(message),
            }

            if !variant_success {
                errors.push(format!("  in {}", variant_path.display()));
            } else {
                if value.is_null() {
                    value.swap(&mut variant_value);
                } else {
                    value.merge(&variant_value);
                }
            }

            success = variant_success;
        }
    }

    if !import_exists {
        warn!(path = %import_path.display(), "import not found");
        errors.push(format!("Couldn't find {}", import_path.display()));
    }

    if success {
        Some(value)
    } else {
        None
    }
}

// --- Templates ---------------------------------------------------------------

/// Expand `template` members throughout the tree. Expansion applies at
/// each object level before recursing, so children can reference objects
/// their parent's template brought in.
pub(crate) fn apply_templates(value: &mut Value, errors: &mut Vec<String>) -> bool {
    let mut success = true;

    if value.as_object().is_some() {
        let names: Vec<String> = {
            let mut names = Vec::new();
            for index in 0..value.num_members() {
                if let Some(name) = value.member_name(index) {
                    names.push(name.to_string());
                }
            }
            names
        };

        for name in &names {
            if value.member(name).is_object() && !value.member(name).is_null() {
                let mut visiting = Vec::new();
                if !expand_member_template(value, name, &mut visiting, errors) {
                    success = false;
                }
            }
        }

        if let Some(object) = value.as_object_mut() {
            for (_, member) in object.iter_mut() {
                if !apply_templates(member, errors) {
                    success = false;
                }
            }
        }

        return success;
    }

    for index in 0..value.num_elts() {
        if let Some(element) = value.elt_mut(index) {
            if !apply_templates(element, errors) {
                success = false;
            }
        }
    }

    success
}

/// Expand one member's `template` reference, expanding the referenced
/// sibling first so chains resolve in order. `visiting` breaks reference
/// cycles.
fn expand_member_template(
    objects: &mut Value,
    name: &str,
    visiting: &mut Vec<String>,
    errors: &mut Vec<String>,
) -> bool {
    let template_key = match objects.member(name).member("template").as_str_opt() {
        Some(template_key) => template_key.to_string(),
        None => return true,
    };

    if !objects.has_member(&template_key) {
        errors.push(format!("Unknown template key: {}", template_key));
        return false;
    }

    if visiting.iter().any(|seen| *seen == template_key) {
        errors.push(format!("Recursive template reference: {}", template_key));
        return false;
    }

    debug!(member = name, template = %template_key, "expanding template");

    visiting.push(name.to_string());
    let expanded = expand_member_template(objects, &template_key, visiting, errors);
    visiting.pop();

    if !expanded {
        return false;
    }

    // Copy the source, override it with the local members, and replace the
    // local object with the result.
    let mut merged = objects.member(&template_key).clone();

    if let Some(target) = objects.update_member(name) {
        target.remove_member("template");
        merged.merge(target);
        target.swap(&mut merged);
    }

    true
}
