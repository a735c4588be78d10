//! End-to-end tests: text in, value trees out.

use strata_value::{Value, ValueType};
use strata_yaml::load_yaml_text;

#[test]
fn octal_prefix_scalar() {
    let value = load_yaml_text("key: 0o17").unwrap();
    assert_eq!(value.member("key"), &Value::from(15));
}

#[test]
fn folded_scalar_with_strip_chomping() {
    let value = load_yaml_text("value: >-\n  one\n  two\n\n  three\n").unwrap();
    assert_eq!(value.member("value").as_str(), "one two\nthree");
}

#[test]
fn literal_scalar_with_keep_chomping() {
    let value = load_yaml_text("value: |+\n  line\n\n\n").unwrap();
    assert_eq!(value.member("value").as_str(), "line\n\n\n");
}

#[test]
fn anchor_alias_and_merge_key() {
    let text = "
defaults: &d
  colour: red
  size: 1
item:
  <<: *d
  size: 2
";
    let value = load_yaml_text(text).unwrap();

    let item = value.member("item");
    assert_eq!(item.member("colour").as_str(), "red");
    assert_eq!(item.member("size").as_i32(), 2);
    assert_eq!(item.num_members(), 2);

    // The anchored mapping itself is unchanged.
    assert_eq!(value.member("defaults").member("size").as_i32(), 1);
}

#[test]
fn merge_key_does_not_overwrite_existing_members() {
    let text = "
defaults: &d
  size: 1
item:
  size: 2
  <<: *d
";
    let value = load_yaml_text(text).unwrap();
    assert_eq!(value.member("item").member("size").as_i32(), 2);
}

#[test]
fn merge_key_accepts_a_list_of_mappings() {
    let text = "
a: &a
  one: 1
b: &b
  two: 2
merged:
  <<: [*a, *b]
";
    let value = load_yaml_text(text).unwrap();
    let merged = value.member("merged");
    assert_eq!(merged.member("one").as_i32(), 1);
    assert_eq!(merged.member("two").as_i32(), 2);
}

#[test]
fn merge_key_rejects_non_mappings() {
    let error = load_yaml_text("item:\n  <<: 5\n").unwrap_err();
    assert_eq!(error.problem, "can't merge non-mapping");
}

#[test]
fn flow_mapping_with_missing_value() {
    let value = load_yaml_text("{ a: 1, b: [2, 3], c: }").unwrap();

    assert_eq!(value.member("a").as_i32(), 1);
    assert_eq!(value.member("b").elt(0).as_i32(), 2);
    assert_eq!(value.member("b").elt(1).as_i32(), 3);
    assert!(value.member("c").is_null());
    assert!(value.has_member("c"));
}

#[test]
fn double_quoted_escapes() {
    let value = load_yaml_text(r#"v: "\x41\u00e9\U0001F600""#).unwrap();
    assert_eq!(value.member("v").as_str(), "A\u{E9}\u{1F600}");
}

#[test]
fn quoted_scalars_stay_strings() {
    let value = load_yaml_text("a: \"42\"\nb: 'true'\nc: |\n  17\n").unwrap();
    assert_eq!(value.member("a").value_type(), ValueType::String);
    assert_eq!(value.member("b").value_type(), ValueType::String);
    assert_eq!(value.member("c").value_type(), ValueType::String);
}

#[test]
fn plain_scalar_type_inference() {
    let value = load_yaml_text(
        "
int: 42
negative: -17
hex: 0x1F
wide: 5000000000
float: 2.5
sci: 1e3
inf: .inf
nan: .nan
yes: true
no: False
nothing: ~
also_nothing: null
text: hello world
",
    )
    .unwrap();

    assert_eq!(value.member("int"), &Value::from(42));
    assert_eq!(value.member("negative"), &Value::from(-17));
    assert_eq!(value.member("hex"), &Value::from(31));
    assert_eq!(value.member("wide"), &Value::from(5_000_000_000_i64));
    assert_eq!(value.member("float"), &Value::from(2.5));
    assert_eq!(value.member("sci"), &Value::from(1000.0));
    assert_eq!(value.member("inf").as_f64(), f64::INFINITY);
    assert!(value.member("nan").as_f64().is_nan());
    assert_eq!(value.member("yes"), &Value::from(true));
    assert_eq!(value.member("no"), &Value::from(false));
    assert!(value.has_member("nothing"));
    assert!(value.member("nothing").is_null());
    assert!(value.member("also_nothing").is_null());
    assert_eq!(value.member("text").as_str(), "hello world");
}

#[test]
fn nested_block_structure() {
    let text = "
server:
  host: localhost
  ports:
    - 8080
    - 8081
  limits:
    cpu: 2
    memory: 512
";
    let value = load_yaml_text(text).unwrap();

    let server = value.member("server");
    assert_eq!(server.member("host").as_str(), "localhost");
    assert_eq!(server.member("ports").num_elts(), 2);
    assert_eq!(server.member("ports").elt(1).as_i32(), 8081);
    assert_eq!(server.member("limits").member("memory").as_i32(), 512);
}

#[test]
fn sequence_of_mappings() {
    let text = "
- name: a
  id: 1
- name: b
  id: 2
";
    let value = load_yaml_text(text).unwrap();
    assert_eq!(value.num_elts(), 2);
    assert_eq!(value.elt(0).member("name").as_str(), "a");
    assert_eq!(value.elt(1).member("id").as_i32(), 2);
}

#[test]
fn aliased_mapping_is_a_snapshot() {
    let text = "
base: &b
  x: 1
copy: *b
";
    let value = load_yaml_text(text).unwrap();
    assert_eq!(
        value.member("base").compare(value.member("copy")),
        std::cmp::Ordering::Equal
    );
}

#[test]
fn unknown_alias_is_an_error() {
    let error = load_yaml_text("a: *missing\n").unwrap_err();
    assert_eq!(error.problem, "unknown anchor 'missing'");
}

#[test]
fn utf16_input_with_bom() {
    let text = "key: value\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let value = strata_yaml::load_yaml_reader(bytes.as_slice()).unwrap();
    assert_eq!(value.member("key").as_str(), "value");
}

#[test]
fn bom_prefixed_utf8_input() {
    let value = strata_yaml::load_yaml_reader(&b"\xEF\xBB\xBFkey: 1\n"[..]).unwrap();
    assert_eq!(value.member("key").as_i32(), 1);
}

#[test]
fn empty_document_loads_as_null() {
    assert!(load_yaml_text("").unwrap().is_null());
    assert!(load_yaml_text("# only a comment\n").unwrap().is_null());
    assert!(load_yaml_text("---\n").unwrap().is_null());
}

#[test]
fn only_the_first_document_is_loaded() {
    let value = load_yaml_text("---\nfirst: 1\n---\nsecond: 2\n").unwrap();
    assert!(value.has_member("first"));
    assert!(!value.has_member("second"));
}

#[test]
fn tab_indentation_is_an_error() {
    let error = load_yaml_text("key: |\n\tvalue\n").unwrap_err();
    assert_eq!(
        error.problem,
        "found a tab character where an indentation space is expected"
    );
}

#[test]
fn error_positions_are_reported() {
    let error = load_yaml_text("a: 1\nb\nc: 2\n").unwrap_err();
    assert_eq!(error.problem, "could not find expected ':'");
    // The candidate key 'b' sits on the second line.
    assert_eq!(error.context_mark.map(|m| m.line), Some(1));
}

#[test]
fn keys_with_null_values_are_removed_by_merge_but_kept_by_load() {
    // Loading keeps explicit nulls as members; only Value::merge treats
    // null as a removal marker.
    let value = load_yaml_text("a:\nb: 1\n").unwrap();
    assert!(value.has_member("a"));
    assert!(value.member("a").is_null());
}
