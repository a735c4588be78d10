//! Small path helpers for the composer.

use std::path::{Component, Path, PathBuf};

/// Directory containing `path`, or the empty path for bare file names.
pub(crate) fn path_location(path: &Path) -> PathBuf {
    path.parent().map_or_else(PathBuf::new, Path::to_path_buf)
}

/// Append `suffix` to the file stem, keeping the extension:
/// `base.yml` + `_debug` → `base_debug.yml`.
pub(crate) fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let text = path.to_string_lossy();

    match text.rfind('.') {
        Some(dot) => PathBuf::from(format!("{}{}{}", &text[..dot], suffix, &text[dot..])),
        None => PathBuf::from(format!("{}{}", text, suffix)),
    }
}

/// Resolve `relative` against `base`; absolute paths pass through.
pub(crate) fn path_full(relative: &str, base: &Path) -> PathBuf {
    let relative = Path::new(relative);

    if relative.is_absolute() || base.as_os_str().is_empty() {
        return relative.to_path_buf();
    }

    base.join(relative)
}

/// Case-insensitive extension test against a list like `[".yaml", ".yml"]`.
pub(crate) fn path_has_extensions(path: &Path, extensions: &[&str]) -> bool {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return false,
    };

    extensions.iter().any(|extension| {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        name.rfind('.').is_some_and(|dot| {
            name[dot + 1..].eq_ignore_ascii_case(extension)
        })
    })
}

/// Resolve `.` and `..` segments without touching the filesystem. Drive
/// letters and UNC roots survive as prefix components.
pub fn path_normalise(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_inserts_before_extension() {
        assert_eq!(
            path_with_suffix(Path::new("dir/base.yml"), "_fast"),
            PathBuf::from("dir/base_fast.yml")
        );
        assert_eq!(
            path_with_suffix(Path::new("noext"), "_fast"),
            PathBuf::from("noext_fast")
        );
    }

    #[test]
    fn full_path_resolution() {
        assert_eq!(
            path_full("child.yml", Path::new("configs")),
            PathBuf::from("configs/child.yml")
        );
        assert_eq!(
            path_full("/abs/child.yml", Path::new("configs")),
            PathBuf::from("/abs/child.yml")
        );
        assert_eq!(path_full("child.yml", Path::new("")), PathBuf::from("child.yml"));
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let yaml = [".yaml", ".yml"];
        assert!(path_has_extensions(Path::new("a/b.YAML"), &yaml));
        assert!(path_has_extensions(Path::new("b.yml"), &yaml));
        assert!(!path_has_extensions(Path::new("b.json"), &yaml));
        assert!(!path_has_extensions(Path::new("yaml"), &yaml));
    }

    #[test]
    fn normalise_resolves_dot_segments() {
        assert_eq!(
            path_normalise(Path::new("a/./b/../c")),
            PathBuf::from("a/c")
        );
        assert_eq!(
            path_normalise(Path::new("../x/y")),
            PathBuf::from("../x/y")
        );
        assert_eq!(path_normalise(Path::new("/a/../b")), PathBuf::from("/b"));
    }
}
