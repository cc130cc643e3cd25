//! Differential tests against `serde_json` as a reference decoder: for a
//! handful of representative documents, this crate's decoded value must
//! agree with the struct `serde` would build from the same bytes.

use plan_json::{Decode, DecodeOptions, Decoder, InitOptions, Source};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Default, Decode, Deserialize, Debug, PartialEq)]
struct Address {
    street: String,
    city: String,
    zip: Option<Box<String>>,
}

#[derive(Default, Decode, Deserialize, Debug, PartialEq)]
struct Person {
    name: String,
    age: u32,
    active: bool,
    scores: Vec<f64>,
    address: Address,
    aliases: HashMap<String, String>,
}

const DOC: &str = r#"{
    "name": "Ada",
    "age": 36,
    "active": true,
    "scores": [1.0, 2.5, -3.25],
    "address": {"street": "10 Example Rd", "city": "London", "zip": "EC1"},
    "aliases": {"given": "Augusta", "full": "Ada Lovelace"}
}"#;

#[test]
fn agrees_with_serde_json_on_a_nested_document() {
    let via_serde: Person = serde_json::from_str(DOC).unwrap();

    let decoder = Decoder::<Person>::new(InitOptions::default()).unwrap();
    let mut via_plan = Person::default();
    decoder.decode(Source::Str(DOC), &mut via_plan, DecodeOptions::default()).unwrap();

    assert_eq!(via_plan, via_serde);
}

#[test]
fn agrees_with_serde_json_on_null_pointer_field() {
    let doc = r#"{"street":"x","city":"y","zip":null}"#;
    let via_serde: Address = serde_json::from_str(doc).unwrap();

    let decoder = Decoder::<Address>::new(InitOptions::default()).unwrap();
    let mut via_plan = Address::default();
    decoder.decode(Source::Str(doc), &mut via_plan, DecodeOptions::default()).unwrap();

    assert_eq!(via_plan, via_serde);
    assert!(via_plan.zip.is_none());
}

#[derive(Default, Decode, Deserialize, Debug, PartialEq)]
struct Tree {
    value: i64,
    children: Vec<Tree>,
}

#[test]
fn agrees_with_serde_json_on_self_referential_tree() {
    let doc = r#"{"value":1,"children":[
        {"value":2,"children":[]},
        {"value":3,"children":[{"value":4,"children":[]}]}
    ]}"#;
    let via_serde: Tree = serde_json::from_str(doc).unwrap();

    let decoder = Decoder::<Tree>::new(InitOptions::default()).unwrap();
    let mut via_plan = Tree::default();
    decoder.decode(Source::Str(doc), &mut via_plan, DecodeOptions::default()).unwrap();

    assert_eq!(via_plan, via_serde);
}

#[derive(Default, Decode, Deserialize, Debug, PartialEq)]
struct LinkedNode {
    value: i64,
    next: Option<Box<LinkedNode>>,
}

#[test]
fn agrees_with_serde_json_on_self_referential_linked_list() {
    let doc = r#"{"value":1,"next":{"value":2,"next":{"value":3,"next":null}}}"#;
    let via_serde: LinkedNode = serde_json::from_str(doc).unwrap();

    let decoder = Decoder::<LinkedNode>::new(InitOptions::default()).unwrap();
    let mut via_plan = LinkedNode::default();
    decoder.decode(Source::Str(doc), &mut via_plan, DecodeOptions::default()).unwrap();

    assert_eq!(via_plan, via_serde);
}
