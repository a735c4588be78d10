//! Command-line style settings.

use strata_value::{update_member_path, Value};

use crate::error::SettingsError;

/// Apply `path[=value]` settings to a config.
///
/// The path is a dotted member expression (array indices in brackets are
/// allowed, e.g. `render.targets[2].width`). A bare `path` sets the member
/// to `true`. The value is parsed as JSON; anything that does not look
/// like a JSON literal is treated as a bare string, so `-set mode=fast`
/// works without inner quotes.
///
/// # Example
///
/// ```
/// use strata_config::apply_settings;
/// use strata_value::Value;
///
/// let mut config = Value::new_object();
/// apply_settings(&["window.width=1280", "fullscreen"], &mut config).unwrap();
///
/// assert_eq!(config.member("window").member("width").as_i32(), 1280);
/// assert!(config.member("fullscreen").as_bool());
/// ```
pub fn apply_settings<S: AsRef<str>>(
    settings: &[S],
    config: &mut Value,
) -> Result<(), SettingsError> {
    for setting in settings {
        let setting = setting.as_ref();

        let (path, value_text) = match setting.find('=').or_else(|| setting.find(':')) {
            Some(split) => {
                let value = setting[split + 1..].trim_start_matches(' ');
                (&setting[..split], Some(value))
            }
            None => (setting, None),
        };

        // A failed path segment (e.g. an out-of-range array index) is
        // silently skipped; member paths create what they need.
        let slot = match update_member_path(config, path) {
            Some(slot) => slot,
            None => continue,
        };

        let value_text = match value_text {
            Some(value_text) => value_text,
            None => {
                *slot = Value::from(true);
                continue;
            }
        };

        if value_text.is_empty() {
            *slot = Value::Null;
            continue;
        }

        // Wrap bare words so they parse as JSON strings.
        let quoted;
        let json_text = if needs_quoting(value_text) {
            quoted = format!("\"{}\"", value_text);
            &quoted
        } else {
            value_text
        };

        match strata_json::load_json_text(json_text) {
            Ok(value) => *slot = value,
            Err(errors) => {
                return Err(SettingsError::BadValue {
                    setting: setting.to_string(),
                    message: errors.to_string(),
                });
            }
        }
    }

    Ok(())
}

fn needs_quoting(value: &str) -> bool {
    let first = match value.bytes().next() {
        Some(first) => first,
        None => return false,
    };

    !(matches!(first, b'[' | b'{' | b'-' | b'"')
        || first.is_ascii_digit()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("false"))
}
