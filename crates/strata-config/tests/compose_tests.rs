//! Filesystem-level composer tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use strata_config::{apply_settings, load_config, ConfigInfo};
use strata_value::Value;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("failed to write fixture");
}

#[test]
fn import_forms_the_base_and_local_members_override() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "base.yml",
        "model:\n  mesh: a\n  colour: red\n",
    );
    write(
        dir.path(),
        "main.yml",
        "import: base.yml\nmodel:\n  colour: blue\n",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    let model = config.member("model");
    assert_eq!(model.member("mesh").as_str(), "a");
    assert_eq!(model.member("colour").as_str(), "blue");
    assert!(!config.has_member("import"));

    assert_eq!(info.imports.len(), 1);
    assert!(info.main.ends_with("main.yml"));
}

#[test]
fn json_and_yaml_mix_across_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.json", "{ a: 1, nested: { x: 1 } }");
    write(
        dir.path(),
        "main.yaml",
        "import: base.json\nnested:\n  y: 2\n",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yaml"), &mut info).unwrap();

    assert_eq!(config.member("a").as_i32(), 1);
    assert_eq!(config.member("nested").member("x").as_i32(), 1);
    assert_eq!(config.member("nested").member("y").as_i32(), 2);
}

#[test]
fn import_lists_merge_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one.yml", "a: 1\nshared: one\n");
    write(dir.path(), "two.yml", "b: 2\nshared: two\n");
    write(
        dir.path(),
        "main.yml",
        "import:\n  - one.yml\n  - two.yml\n",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    assert_eq!(config.member("a").as_i32(), 1);
    assert_eq!(config.member("b").as_i32(), 2);
    // Later imports override earlier ones.
    assert_eq!(config.member("shared").as_str(), "two");
    assert_eq!(info.imports.len(), 2);
}

#[test]
fn imports_resolve_relative_to_the_importing_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(dir.path(), "root.yml", "import: sub/mid.yml\n");
    write(dir.path().join("sub").as_path(), "mid.yml", "import: leaf.yml\nmid: 1\n");
    write(dir.path().join("sub").as_path(), "leaf.yml", "leaf: 1\n");

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("root.yml"), &mut info).unwrap();

    assert_eq!(config.member("mid").as_i32(), 1);
    assert_eq!(config.member("leaf").as_i32(), 1);
}

#[test]
fn nested_imports_expand_inside_members() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "engine.yml", "threads: 4\n");
    write(
        dir.path(),
        "main.yml",
        "systems:\n  engine:\n    import: engine.yml\n    threads: 8\n",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    assert_eq!(
        config.member("systems").member("engine").member("threads").as_i32(),
        8
    );
}

#[test]
fn variant_files_overlay_primary_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.yml", "speed: 1\nname: base\n");
    write(dir.path(), "base_fast.yml", "speed: 9\n");
    write(dir.path(), "main.yml", "import: base.yml\n");

    let mut info = ConfigInfo::with_variant("fast");
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    assert_eq!(config.member("speed").as_i32(), 9);
    assert_eq!(config.member("name").as_str(), "base");
    assert_eq!(info.imports.len(), 2);
}

#[test]
fn variant_without_primary_still_loads() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "extra_fast.yml", "turbo: true\n");
    write(dir.path(), "main.yml", "import: extra.yml\n");

    let mut info = ConfigInfo::with_variant("fast");
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    assert_eq!(config.member("turbo"), &Value::from(true));
}

#[test]
fn missing_import_reports_but_composes_best_effort() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.yml", "good: 1\n");
    write(
        dir.path(),
        "main.yml",
        "import:\n  - good.yml\n  - missing.yml\nlocal: 1\n",
    );

    let mut info = ConfigInfo::new();
    let error = load_config(dir.path().join("main.yml"), &mut info).unwrap_err();

    assert!(error
        .errors
        .iter()
        .any(|message| message.contains("Couldn't find")));

    // Best-effort result still contains the good import and local members.
    assert_eq!(error.partial.member("good").as_i32(), 1);
    assert_eq!(error.partial.member("local").as_i32(), 1);
}

#[test]
fn template_inherits_and_overrides() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.yml",
        "
base:
  colour: red
  size: 1
item:
  template: base
  size: 2
",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    let item = config.member("item");
    assert_eq!(item.member("colour").as_str(), "red");
    assert_eq!(item.member("size").as_i32(), 2);
    assert!(!item.has_member("template"));
}

#[test]
fn template_chains_expand_source_first() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.yml",
        "
grand:
  a: 1
parent:
  template: grand
  b: 2
child:
  template: parent
  c: 3
",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    let child = config.member("child");
    assert_eq!(child.member("a").as_i32(), 1);
    assert_eq!(child.member("b").as_i32(), 2);
    assert_eq!(child.member("c").as_i32(), 3);
}

#[test]
fn unknown_template_key_is_reported() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.yml",
        "item:\n  template: nowhere\n  x: 1\n",
    );

    let mut info = ConfigInfo::new();
    let error = load_config(dir.path().join("main.yml"), &mut info).unwrap_err();

    assert!(error
        .errors
        .iter()
        .any(|message| message.contains("Unknown template key: nowhere")));
}

#[test]
fn template_cycles_are_reported_rather_than_hanging() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.yml",
        "
a:
  template: b
b:
  template: a
",
    );

    let mut info = ConfigInfo::new();
    let error = load_config(dir.path().join("main.yml"), &mut info).unwrap_err();

    assert!(error
        .errors
        .iter()
        .any(|message| message.contains("Recursive template reference")));
}

#[test]
fn template_expansion_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.yml",
        "
base:
  colour: red
item:
  template: base
  size: 2
",
    );

    let mut info = ConfigInfo::new();
    let once = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    // Re-save the expanded tree and load it again: nothing changes.
    let expanded = strata_yaml::as_yaml(&once, 2);
    write(dir.path(), "expanded.yml", &expanded);

    let mut info = ConfigInfo::new();
    let twice = load_config(dir.path().join("expanded.yml"), &mut info).unwrap();

    assert_eq!(once.compare(&twice), std::cmp::Ordering::Equal);
}

#[test]
fn templates_can_use_objects_brought_in_by_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "library.yml", "proto:\n  kind: widget\n");
    write(
        dir.path(),
        "main.yml",
        "import: library.yml\nbutton:\n  template: proto\n  label: go\n",
    );

    let mut info = ConfigInfo::new();
    let config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    let button = config.member("button");
    assert_eq!(button.member("kind").as_str(), "widget");
    assert_eq!(button.member("label").as_str(), "go");
}

#[test]
fn settings_apply_on_top_of_loaded_configs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.yml", "window:\n  width: 640\n");

    let mut info = ConfigInfo::new();
    let mut config = load_config(dir.path().join("main.yml"), &mut info).unwrap();

    apply_settings(&["window.width=1280", "window.title=Main"], &mut config).unwrap();

    assert_eq!(config.member("window").member("width").as_i32(), 1280);
    assert_eq!(config.member("window").member("title").as_str(), "Main");
}

#[test]
fn unsupported_extension_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.txt", "a: 1\n");

    let mut info = ConfigInfo::new();
    let error = load_config(dir.path().join("main.txt"), &mut info).unwrap_err();

    assert!(error
        .errors
        .iter()
        .any(|message| message.contains("Unsupported file format")));
}
