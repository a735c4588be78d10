//! Cross-cutting invariants of the value model: numeric round-trips, the
//! convertibility table, copy isolation and merge semantics.

use std::cmp::Ordering;

use strata_value::{Value, ValueType};

#[test]
fn numeric_roundtrip_in_range() {
    for v in [i32::MIN, -1, 0, 1, i32::MAX] {
        assert_eq!(Value::from(v).as_i32(), v);
    }
    for v in [0_u32, 1, u32::MAX] {
        assert_eq!(Value::from(v).as_u32(), v);
    }
    for v in [i64::MIN, -1, 0, 1, i64::MAX] {
        assert_eq!(Value::from(v).as_i64(), v);
    }
    for v in [0_u64, 1, u64::MAX] {
        assert_eq!(Value::from(v).as_u64(), v);
    }
    for v in [-1.5, 0.0, 1.0, f64::MAX, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(Value::from(v).as_f64(), v);
    }

    let nan = Value::from(f64::NAN);
    assert!(nan.is_double());
    assert!(nan.as_f64().is_nan());
}

#[test]
fn convertible_means_roundtrip_unchanged() {
    let samples = [
        Value::from(true),
        Value::from(-7),
        Value::from(7),
        Value::from(3_000_000_000_u32),
        Value::from(-5_000_000_000_i64),
        Value::from(10_000_000_000_000_000_000_u64),
    ];

    // For integral sources, convertibility to Int must coincide with the
    // saturating coercion being lossless.
    for value in &samples {
        let lossless = i64::from(value.as_i32()) == value.as_i64();
        assert_eq!(
            value.is_convertible_to(ValueType::Int),
            lossless,
            "{value:?}"
        );
    }

    // Direct table pins.
    assert!(Value::from(3_000_000_000_u32).is_convertible_to(ValueType::Int64));
    assert!(!Value::from(3_000_000_000_u32).is_convertible_to(ValueType::Int));
    assert!(Value::from(-5_000_000_000_i64).is_convertible_to(ValueType::Double));
    assert!(!Value::from(-5_000_000_000_i64).is_convertible_to(ValueType::UInt64));
    assert!(Value::from(2.0).is_convertible_to(ValueType::Int));
    assert!(!Value::from(1e300).is_convertible_to(ValueType::Int64));
    assert!(Value::from(true).is_convertible_to(ValueType::UInt64));
}

#[test]
fn object_copy_isolation_and_mod_counts() {
    let mut original = Value::new_object();
    original.set_member("colour", Value::from("red"));

    let original_count = original.as_object().map(|o| o.mod_count()).unwrap_or(0);

    let mut copy = original.clone();
    copy.set_member("colour", Value::from("blue"));
    copy.set_member("size", Value::from(3));
    copy.remove_member("size");

    // The source object is untouched, counter included.
    assert_eq!(original.member("colour").as_str(), "red");
    assert_eq!(
        original.as_object().map(|o| o.mod_count()).unwrap_or(0),
        original_count
    );

    // Every structural change advanced the copy's counter.
    let copy_count = copy.as_object().map(|o| o.mod_count()).unwrap_or(0);
    assert!(copy_count >= original_count + 3);
}

#[test]
fn merge_override_semantics() {
    let mut base = Value::new_object();
    base.set_member("a", Value::from(1));
    base.set_member("nested", {
        let mut nested = Value::new_object();
        nested.set_member("x", Value::from(1));
        nested.set_member("y", Value::from(2));
        nested
    });
    base.set_member("gone", Value::from("soon"));

    let mut overrides = Value::new_object();
    overrides.set_member("b", Value::from(2));
    overrides.set_member("nested", {
        let mut nested = Value::new_object();
        nested.set_member("y", Value::from(9));
        nested
    });
    overrides.set_member("gone", Value::Null);

    base.merge(&overrides);

    assert_eq!(base.member("a").as_i32(), 1);
    assert_eq!(base.member("b").as_i32(), 2);
    assert_eq!(base.member("nested").member("x").as_i32(), 1);
    assert_eq!(base.member("nested").member("y").as_i32(), 9);
    assert!(!base.has_member("gone"));
}

#[test]
fn merge_non_object_override_replaces() {
    let mut base = Value::new_object();
    base.set_member("a", Value::from(1));

    base.merge(&Value::from(5));
    assert_eq!(base.as_i32(), 5);
}

#[test]
fn compare_agrees_with_equality() {
    let values = [
        Value::Null,
        Value::from(false),
        Value::from(true),
        Value::from(-3),
        Value::from(3),
        Value::from(3_u32),
        Value::from(3.5),
        Value::from("abc"),
        Value::from("abd"),
        Value::from(vec![Value::from(1)]),
        Value::from(vec![Value::from(1), Value::from(2)]),
    ];

    for a in &values {
        for b in &values {
            let equal = a == b;
            let compared = a.compare(b) == Ordering::Equal;
            assert_eq!(equal, compared, "{a:?} vs {b:?}");
        }
    }
}
