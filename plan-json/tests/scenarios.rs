//! End-to-end decode scenarios, one test per literal input/output pair.
//!
//! These exercise the interpreter the way a caller actually would — through
//! `Decoder::new`/`Decoder::decode` with a `#[derive(Decode)]` destination —
//! rather than poking at the compiled `Plan` directly the way the unit
//! tests scattered through `src/` do.

use std::collections::HashMap;

use plan_json::{Decode, DecodeOptions, Decoder, ErrorKind, InitOptions, Source};

#[derive(Default, Decode, Debug, PartialEq)]
struct Point3 {
    #[plan_json(rename = "X")]
    x: f64,
    #[plan_json(rename = "Y")]
    y: f64,
    #[plan_json(rename = "Z")]
    z: f64,
}

#[test]
fn s1_nested_bool_slices() {
    let decoder = Decoder::<Vec<Vec<bool>>>::new(InitOptions::default()).unwrap();
    let mut dest = Vec::new();
    decoder
        .decode(
            Source::Str("[[true],[false,false,false,false],[],[],[true]]"),
            &mut dest,
            DecodeOptions::default(),
        )
        .unwrap();
    assert_eq!(dest, vec![vec![true], vec![false; 4], vec![], vec![], vec![true]]);
    assert_eq!(dest.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 4, 0, 0, 1]);
}

#[test]
fn s2_exact_name_match() {
    let decoder = Decoder::<Point3>::new(InitOptions::default()).unwrap();
    let mut dest = Point3::default();
    decoder
        .decode(Source::Str(r#"{"X":0.0052265971,"Y":12.6644301,"Z":10}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest, Point3 { x: 0.0052265971, y: 12.6644301, z: 10.0 });
}

#[test]
fn s2_case_insensitive_fallback() {
    let decoder = Decoder::<Point3>::new(InitOptions::default()).unwrap();
    let mut dest = Point3::default();
    decoder
        .decode(Source::Str(r#"{"x":0.0052265971,"y":12.6644301,"z":10}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest, Point3 { x: 0.0052265971, y: 12.6644301, z: 10.0 });
}

#[test]
fn s2_case_insensitive_can_be_disabled() {
    let decoder = Decoder::<Point3>::new(InitOptions::default()).unwrap();
    let mut dest = Point3::default();
    let options = DecodeOptions { disable_case_insensitive_matching: true, ..Default::default() };
    decoder
        .decode(Source::Str(r#"{"x":1,"y":2,"z":3}"#), &mut dest, options)
        .unwrap();
    // None of the lowercase keys matched, so every field kept its zero value.
    assert_eq!(dest, Point3::default());
}

#[test]
fn s3_string_to_string_map_preserves_unicode_keys() {
    let decoder = Decoder::<HashMap<String, String>>::new(InitOptions::default()).unwrap();
    let mut dest = HashMap::new();
    decoder
        .decode(Source::Str(r#"{"foo":"bar", "1234":"", "ъ":"ツ"}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest.len(), 3);
    assert_eq!(dest.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(dest.get("1234").map(String::as_str), Some(""));
    assert_eq!(dest.get("ъ").map(String::as_str), Some("ツ"));
}

#[derive(Default, Decode, Debug, PartialEq)]
struct Named {
    name: String,
    number: i64,
    tags: Vec<String>,
}

#[test]
fn s4_nested_maps_with_integer_keys_and_null_member() {
    let decoder = Decoder::<HashMap<i64, HashMap<String, Named>>>::new(InitOptions::default()).unwrap();
    let mut dest = HashMap::new();
    let input = r#"{"10001":{"first":{"name":"First","number":1001,"tags":[]}},
     "10002":{"second":{}, "third":{"name":"T","number":1003,
                                    "tags":["a","b"]},
              "fourth":null, "fifth":{"name":"F","number":1005,
                                      "tags":["x","y"]}}}"#;
    decoder.decode(Source::Str(input), &mut dest, DecodeOptions::default()).unwrap();

    assert_eq!(dest.len(), 2);
    let first_group = &dest[&10001];
    assert_eq!(first_group.len(), 1);
    assert_eq!(first_group["first"], Named { name: "First".into(), number: 1001, tags: vec![] });
    assert!(first_group["first"].tags.is_empty());

    let second_group = &dest[&10002];
    assert_eq!(second_group.len(), 4);
    assert_eq!(second_group["second"], Named::default());
    assert_eq!(second_group["fourth"], Named::default());
    assert_eq!(
        second_group["third"],
        Named { name: "T".into(), number: 1003, tags: vec!["a".into(), "b".into()] }
    );
    assert_eq!(
        second_group["fifth"],
        Named { name: "F".into(), number: 1005, tags: vec!["x".into(), "y".into()] }
    );
}

#[derive(Default, Decode, Debug, PartialEq)]
struct FooBar {
    foo: i64,
    bar: String,
}

#[test]
fn s5_unknown_field_skipped_by_default() {
    let decoder = Decoder::<FooBar>::new(InitOptions::default()).unwrap();
    let mut dest = FooBar::default();
    decoder
        .decode(Source::Str(r#"{"bar":"bar","unknown":42,"foo":102}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest, FooBar { foo: 102, bar: "bar".into() });
}

#[test]
fn s5_unknown_field_rejected_in_strict_mode() {
    let decoder = Decoder::<FooBar>::new(InitOptions::default()).unwrap();
    let mut dest = FooBar::default();
    let options = DecodeOptions { disallow_unknown_fields: true, ..Default::default() };
    let input = r#"{"bar":"bar","unknown":42,"foo":102}"#;
    let err = decoder.decode(Source::Str(input), &mut dest, options).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownField(ref name) if name == "unknown"));
    // `Token::index` for a string token points past the opening quote, at
    // the first content byte.
    assert_eq!(err.index, input.find("\"unknown\"").unwrap() + 1);
}

#[test]
fn s6_unsigned_overflow_reported_at_index_zero() {
    let decoder = Decoder::<u64>::new(InitOptions::default()).unwrap();
    let mut dest = 0u64;
    let err = decoder.decode(Source::Str("18446744073709551616"), &mut dest, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOverflow));
    assert_eq!(err.index, 0);
}

#[test]
fn s6_signed_underflow_reported_at_index_zero() {
    let decoder = Decoder::<i64>::new(InitOptions::default()).unwrap();
    let mut dest = 0i64;
    let err = decoder.decode(Source::Str("-9223372036854775809"), &mut dest, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOverflow));
    assert_eq!(err.index, 0);
}

#[derive(Default, Decode, Debug, PartialEq)]
struct StringTagged {
    #[plan_json(string)]
    value: i64,
}

#[test]
fn s7_string_tag_rejects_bare_literal() {
    let decoder = Decoder::<StringTagged>::new(InitOptions::default()).unwrap();
    let mut dest = StringTagged::default();
    let err = decoder.decode(Source::Str(r#"{"value":42}"#), &mut dest, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnexpectedValue));
}

#[test]
fn s7_string_tag_accepts_quoted_literal() {
    let decoder = Decoder::<StringTagged>::new(InitOptions::default()).unwrap();
    let mut dest = StringTagged::default();
    decoder
        .decode(Source::Str(r#"{"value":"42"}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest, StringTagged { value: 42 });
}

#[test]
fn fixed_array_decodes_in_place_and_zeroes_excess() {
    let decoder = Decoder::<[i32; 4]>::new(InitOptions::default()).unwrap();
    let mut dest = [9, 9, 9, 9];
    decoder.decode(Source::Str("[1,2]"), &mut dest, DecodeOptions::default()).unwrap();
    assert_eq!(dest, [1, 2, 0, 0]);
}

#[test]
fn fixed_array_drops_elements_past_its_length() {
    let decoder = Decoder::<[i32; 2]>::new(InitOptions::default()).unwrap();
    let mut dest = [0, 0];
    decoder.decode(Source::Str("[1,2,3,4]"), &mut dest, DecodeOptions::default()).unwrap();
    assert_eq!(dest, [1, 2]);
}

#[test]
fn empty_array_decodes_to_non_nil_empty_slice() {
    let decoder = Decoder::<Vec<i32>>::new(InitOptions::default()).unwrap();
    let mut dest = vec![1, 2, 3];
    decoder.decode(Source::Str("[]"), &mut dest, DecodeOptions::default()).unwrap();
    assert_eq!(dest, Vec::<i32>::new());
}

#[test]
fn null_resets_map_to_empty() {
    let decoder = Decoder::<HashMap<String, i32>>::new(InitOptions::default()).unwrap();
    let mut dest = HashMap::from([("a".to_string(), 1)]);
    decoder.decode(Source::Str("null"), &mut dest, DecodeOptions::default()).unwrap();
    assert!(dest.is_empty());
}

#[test]
fn disallow_duplicate_names_rejects_second_occurrence() {
    let decoder = Decoder::<FooBar>::new(InitOptions::default()).unwrap();
    let mut dest = FooBar::default();
    let options = DecodeOptions { disallow_duplicate_names: true, ..Default::default() };
    let err = decoder
        .decode(Source::Str(r#"{"foo":1,"bar":"a","foo":2}"#), &mut dest, options)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateField(ref name) if name == "foo"));
}

#[test]
fn duplicate_names_last_write_wins_by_default() {
    let decoder = Decoder::<FooBar>::new(InitOptions::default()).unwrap();
    let mut dest = FooBar::default();
    decoder
        .decode(Source::Str(r#"{"foo":1,"bar":"a","foo":2}"#), &mut dest, DecodeOptions::default())
        .unwrap();
    assert_eq!(dest, FooBar { foo: 2, bar: "a".into() });
}

#[test]
fn duplicate_map_key_with_struct_value_replaces_instead_of_merging() {
    let decoder = Decoder::<HashMap<String, Named>>::new(InitOptions::default()).unwrap();
    let mut dest = HashMap::new();
    let input = r#"{"a":{"name":"old","number":99,"tags":["x"]},"a":{"number":5}}"#;
    decoder.decode(Source::Str(input), &mut dest, DecodeOptions::default()).unwrap();

    // The second occurrence of "a" must fully replace the first, not merge
    // field-by-field with it — `name`/`tags` come back to their zero value
    // rather than surviving from the first occurrence.
    assert_eq!(dest.len(), 1);
    assert_eq!(dest["a"], Named { name: String::new(), number: 5, tags: Vec::new() });
}
