//! Property tests: emit-then-load round trips and robustness against
//! arbitrary input.

use proptest::prelude::*;

use strata_value::{ObjectValue, Value};
use strata_yaml::{as_yaml, load_yaml_text};

/// Leaf values whose YAML rendering reparses to the same kind: bools,
/// small ints, doubles with an exact short fraction, and strings (always
/// emitted quoted, so they never reclassify).
fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        (-1_000_000..1_000_000i32).prop_map(Value::from),
        ((-999..999i32), prop_oneof![Just(0.25), Just(0.5), Just(0.75)])
            .prop_map(|(whole, fraction)| Value::from(f64::from(whole) + fraction)),
        "[ -~]{0,12}".prop_map(Value::from),
    ]
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(String::from)
}

/// Trees of non-empty arrays and objects over the leaf set.
fn tree_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Value::from),
            prop::collection::vec((key_strategy(), inner), 1..4).prop_map(|members| {
                let mut object = ObjectValue::new();
                for (key, value) in members {
                    object.set_member(&key, value);
                }
                Value::from(object)
            }),
        ]
    })
}

proptest! {
    /// Emitting a tree and loading the text back yields an equal tree.
    #[test]
    fn emit_load_roundtrip(value in tree_strategy()) {
        let text = as_yaml(&value, 2);
        let reloaded = load_yaml_text(&text).expect("emitted YAML failed to load");
        prop_assert_eq!(reloaded.compare(&value), std::cmp::Ordering::Equal);
    }

    /// The byte decoder accepts or rejects arbitrary input without
    /// panicking.
    #[test]
    fn reader_survives_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = strata_yaml::load_yaml_reader(bytes.as_slice());
    }

    /// The scanner survives arbitrary printable input with line structure.
    #[test]
    fn scanner_survives_ascii_soup(text in "[ -~\n\t]{0,200}") {
        let _ = load_yaml_text(&text);
    }

    /// Indentation-shaped input exercises the roll/unroll machinery.
    #[test]
    fn scanner_survives_indented_documents(
        entries in prop::collection::vec(("[a-z]{1,6}", 0usize..6), 1..12)
    ) {
        let mut text = String::new();
        for (word, depth) in entries {
            for _ in 0..depth {
                text.push(' ');
            }
            text.push_str(&word);
            text.push_str(":\n");
        }
        let _ = load_yaml_text(&text);
    }
}
