use std::{
    collections::{BTreeSet, HashMap},
    rc::Rc,
    sync::Arc,
};

use chrono::NaiveDate;
use rstest::rstest;

use super::*;
use crate::{
    Bytes, ErrorCategory, FieldLookup, path, reflect, reflect_enum, reflect_union,
};

fn json(text: &str) -> Value {
    text.parse().unwrap()
}

#[derive(Debug, Default, PartialEq)]
struct Leaf {
    value: String,
}
reflect!(Leaf { value: String });

#[derive(Debug, Default)]
struct Doc {
    outer: Rc<Leaf>,
    inner: Vec<Rc<Leaf>>,
}
reflect!(Doc { outer: Rc<Leaf>, inner: Vec<Rc<Leaf>> });

#[derive(Debug, Default, PartialEq)]
struct Counter {
    count: u32,
}
reflect!(Counter { count: u32 });

#[derive(Debug, Default)]
struct Mixed {
    a: Rc<Leaf>,
    b: Rc<Counter>,
}
reflect!(Mixed { a: Rc<Leaf>, b: Rc<Counter> });

#[derive(Debug, Default)]
struct Threaded {
    first: Arc<Leaf>,
    second: Arc<Leaf>,
}
reflect!(Threaded { first: Arc<Leaf>, second: Arc<Leaf> });

#[derive(Debug, Default, PartialEq)]
struct Holder {
    list: Vec<u32>,
}
reflect!(Holder { list: Vec<u32> });

#[derive(Debug, Default, PartialEq)]
struct Login {
    user: String,
    password: String,
    remember: bool,
}
reflect!(Login {
    #[required] user: String,
    #[required] password: String,
    remember: bool,
});

// ── shared references ──────────────────────────────────────────────────────

#[test]
fn back_reference_aliases_first_occurrence() {
    let node = json(r#"{"outer":{"value":"string"},"inner":[{"$ref":"/outer"}]}"#);
    let doc: Doc = from_tree(&node).unwrap();
    assert_eq!(doc.outer.value, "string");
    assert!(Rc::ptr_eq(&doc.outer, &doc.inner[0]));
    assert_eq!(to_tree(&doc).unwrap(), node);
}

#[test]
fn shared_value_is_written_once() {
    let leaf = Rc::new(Leaf { value: "s".into() });
    let doc = Doc {
        outer: Rc::clone(&leaf),
        inner: vec![Rc::clone(&leaf), leaf],
    };
    assert_eq!(
        to_string(&doc).unwrap(),
        r#"{"outer":{"value":"s"},"inner":[{"$ref":"/outer"},{"$ref":"/outer"}]}"#
    );
}

#[test]
fn first_occurrence_inside_a_list() {
    let shared = Rc::new(Leaf { value: "s".into() });
    let doc = Doc {
        outer: Rc::new(Leaf { value: "other".into() }),
        inner: vec![Rc::clone(&shared), shared],
    };
    let node = to_tree(&doc).unwrap();
    assert_eq!(
        node.to_string(),
        r#"{"outer":{"value":"other"},"inner":[{"value":"s"},{"$ref":"/inner/0"}]}"#
    );

    let back: Doc = from_tree(&node).unwrap();
    assert!(Rc::ptr_eq(&back.inner[0], &back.inner[1]));
    assert!(!Rc::ptr_eq(&back.outer, &back.inner[0]));
}

#[test]
fn forward_reference_is_unresolved() {
    let node = json(r#"{"inner":[{"$ref":"/outer"}],"outer":{"value":"string"}}"#);
    let err = from_tree::<Doc>(&node).unwrap_err();
    assert_eq!(err.path, path!["inner", 0]);
    assert_eq!(err.kind, ErrorKind::UnresolvedReference("/outer".into()));
    assert_eq!(err.category(), ErrorCategory::Reference);
}

#[test]
fn reference_to_another_type_fails() {
    let node = json(r#"{"a":{"value":"x"},"b":{"$ref":"/a"}}"#);
    let err = from_tree::<Mixed>(&node).unwrap_err();
    assert_eq!(err.path, path!["b"]);
    assert_eq!(err.kind, ErrorKind::ReferenceTypeMismatch("/a".into()));
}

#[test]
fn arc_references() {
    let node = json(r#"{"first":{"value":"t"},"second":{"$ref":"/first"}}"#);
    let doc: Threaded = from_tree(&node).unwrap();
    assert!(Arc::ptr_eq(&doc.first, &doc.second));
    assert_eq!(to_tree(&doc).unwrap(), node);
}

#[test]
fn distinct_allocations_are_not_merged() {
    let doc = Threaded {
        first: Arc::new(Leaf { value: "t".into() }),
        second: Arc::new(Leaf { value: "t".into() }),
    };
    assert_eq!(
        to_string(&doc).unwrap(),
        r#"{"first":{"value":"t"},"second":{"value":"t"}}"#
    );
}

// ── union rollback ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tagged {
    item: Rc<Leaf>,
    kind: String,
}
reflect!(Tagged {
    #[required] item: Rc<Leaf>,
    #[required] kind: String,
});

#[derive(Debug, Default)]
struct Loose {
    item: Value,
}
reflect!(Loose { item: Value });

#[derive(Debug)]
enum Entry {
    Tagged(Tagged),
    Loose(Loose),
}
reflect_union!(Entry { Tagged(Tagged), Loose(Loose) });

#[derive(Debug, Default)]
struct Log {
    entry: Option<Entry>,
    again: Option<Rc<Leaf>>,
}
reflect!(Log { entry: Option<Entry>, again: Option<Rc<Leaf>> });

#[test]
fn rejected_alternative_forgets_its_references() {
    let node = json(r#"{"entry":{"item":{"value":"x"}},"again":{"$ref":"/entry/item"}}"#);
    let err = from_tree::<Log>(&node).unwrap_err();
    assert_eq!(err.path, path!["again"]);
    assert_eq!(err.kind, ErrorKind::UnresolvedReference("/entry/item".into()));

    let node = json(r#"{"entry":{"item":{"value":"x"},"kind":"k"},"again":{"$ref":"/entry/item"}}"#);
    let log: Log = from_tree(&node).unwrap();
    let Some(Entry::Tagged(tagged)) = &log.entry else {
        panic!("expected the tagged alternative, got {:?}", log.entry);
    };
    assert!(Rc::ptr_eq(&tagged.item, log.again.as_ref().unwrap()));
}

#[test]
fn union_without_match() {
    let err = from_tree::<Entry>(&json("[1]")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatchingAlternative("Entry"));
    assert!(err.path.is_root());
}

// ── error locations ────────────────────────────────────────────────────────

#[test]
fn error_path_points_at_element() {
    let err = from_tree::<Holder>(&json(r#"{"list":[1,2,"three"]}"#)).unwrap_err();
    assert_eq!(err.path, path!["list", 2]);
    assert_eq!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: "integer",
            found: "string",
        }
    );
    assert_eq!(
        err.to_string(),
        "expected integer, found string at '/list/2'"
    );
}

#[rstest]
#[case::u8_overflow("256", "u8")]
#[case::i8_underflow("-129", "i8")]
#[case::unsigned_negative("-1", "u32")]
#[case::u64_overflow_as_float("18446744073709551616", "u64")]
fn integer_out_of_range(#[case] literal: &str, #[case] target: &str) {
    let node = json(literal);
    let err = match target {
        "u8" => from_tree::<u8>(&node).map(drop),
        "i8" => from_tree::<i8>(&node).map(drop),
        "u32" => from_tree::<u32>(&node).map(drop),
        _ => from_tree::<u64>(&node).map(drop),
    }
    .unwrap_err();
    match err.kind {
        ErrorKind::NumberOutOfRange { target: t, .. } => assert_eq!(t, target),
        // Literals beyond 64 bits are already floats in the tree.
        ErrorKind::TypeMismatch { found: "float", .. } => assert_eq!(target, "u64"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn integer_bounds_are_inclusive() {
    assert_eq!(from_tree::<u8>(&json("255")).unwrap(), 255);
    assert_eq!(from_tree::<i8>(&json("-128")).unwrap(), -128);
    assert_eq!(from_tree::<i64>(&json("-9223372036854775808")).unwrap(), i64::MIN);
    assert_eq!(from_tree::<u64>(&json("18446744073709551615")).unwrap(), u64::MAX);
}

#[test]
fn float_is_not_an_integer() {
    let err = from_tree::<i64>(&json("1.5")).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: "integer",
            found: "float",
        }
    );
}

#[rstest]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
#[case(f64::NEG_INFINITY)]
fn non_finite_floats_have_no_tree(#[case] x: f64) {
    let err = to_tree(&x).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NonFiniteFloat(_)));
    assert_eq!(err.category(), ErrorCategory::Encoding);
}

#[test]
fn f32_range() {
    assert_eq!(from_tree::<f32>(&json("1.5")).unwrap(), 1.5);
    let err = from_tree::<f32>(&json("1e300")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NumberOutOfRange { target: "f32", .. }));
}

#[test]
fn depth_limit_counts_path_length() {
    let options = TreeOptions {
        max_depth: 2,
        ..TreeOptions::default()
    };
    let node = json("[[[1]]]");
    let err = from_tree_with::<Vec<Vec<Vec<u8>>>>(&node, options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded(2));
    assert_eq!(err.path, path![0, 0]);

    let err = to_tree_with(&vec![vec![vec![1u8]]], options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded(2));

    let shallow: Vec<Vec<u8>> = from_tree_with(&json("[[1]]"), options).unwrap();
    assert_eq!(shallow, vec![vec![1]]);
}

// ── object policies ────────────────────────────────────────────────────────

#[test]
fn missing_required_field() {
    let err = from_tree::<Login>(&json(r#"{"user":"ada"}"#)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingField("password"));
    assert!(err.path.is_root());

    let lenient = TreeOptions {
        enforce_required: false,
        ..TreeOptions::default()
    };
    let login: Login = from_tree_with(&json(r#"{"user":"ada"}"#), lenient).unwrap();
    assert_eq!(
        login,
        Login {
            user: "ada".into(),
            ..Login::default()
        }
    );
}

#[test]
fn unknown_members() {
    let node = json(r#"{"user":"ada","password":"pw","extra":[1,2]}"#);
    let login: Login = from_tree(&node).unwrap();
    assert_eq!(login.user, "ada");

    let strict = TreeOptions {
        unknown_keys: UnknownKeys::Reject,
        ..TreeOptions::default()
    };
    let err = from_tree_with::<Login>(&node, strict).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownField("extra".into()));
    assert_eq!(err.path, path!["extra"]);
}

#[rstest]
fn lookup_strategies_agree(
    #[values(FieldLookup::Auto, FieldLookup::Linear, FieldLookup::PerfectHash)] field_lookup: FieldLookup,
) {
    let options = TreeOptions {
        field_lookup,
        ..TreeOptions::default()
    };
    let node = json(r#"{"remember":true,"password":"pw","user":"ada"}"#);
    let login: Login = from_tree_with(&node, options).unwrap();
    assert_eq!(
        login,
        Login {
            user: "ada".into(),
            password: "pw".into(),
            remember: true,
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Plane {
    x: i32,
    z: i32,
}
reflect!(Plane { #[required] x: i32, #[required] z: i32 });

#[rstest]
fn two_field_names_stay_apart(
    #[values(FieldLookup::Linear, FieldLookup::PerfectHash)] field_lookup: FieldLookup,
) {
    let options = TreeOptions {
        field_lookup,
        ..TreeOptions::default()
    };
    let plane: Plane = from_tree_with(&json(r#"{"z":-4,"x":9}"#), options).unwrap();
    assert_eq!(plane, Plane { x: 9, z: -4 });
}

#[test]
fn absent_options_are_omitted() {
    #[derive(Debug, Default)]
    struct Profile {
        name: String,
        nick: Option<String>,
    }
    reflect!(Profile { name: String, nick: Option<String> });

    let profile = Profile {
        name: "ada".into(),
        nick: None,
    };
    assert_eq!(to_string(&profile).unwrap(), r#"{"name":"ada"}"#);

    let back: Profile = from_tree(&json(r#"{"name":"ada","nick":null}"#)).unwrap();
    assert_eq!(back.nick, None);
}

// ── other types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    Red,
    Green,
}
reflect_enum!(Color { Red => "red", Green => "green" });

#[test]
fn string_enums() {
    assert_eq!(to_string(&[Color::Green, Color::Red]).unwrap(), r#"["green","red"]"#);
    let err = from_tree::<Color>(&json(r#""blue""#)).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnknownVariant {
            variant: "blue".into(),
            type_name: "Color",
        }
    );
}

#[test]
fn fixed_arrays_and_tuples() {
    let pair: (u8, String) = from_tree(&json(r#"[1,"a"]"#)).unwrap();
    assert_eq!(pair, (1, "a".into()));
    assert_eq!(to_string(&(true, 'x', -3i16)).unwrap(), r#"[true,"x",-3]"#);

    let err = from_tree::<[u8; 3]>(&json("[1,2]")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch { expected: 3, found: 2 });
    let err = from_tree::<(u8, u8)>(&json("[1,2,3]")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch { expected: 2, found: 3 });
}

#[test]
fn sets_reject_duplicates() {
    let set: BTreeSet<u8> = from_tree(&json("[3,1,2]")).unwrap();
    assert_eq!(to_string(&set).unwrap(), "[1,2,3]");

    let err = from_tree::<BTreeSet<u8>>(&json("[1,2,1]")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateElement(2));
    assert_eq!(err.path, path![2]);
}

#[test]
fn hash_maps_serialize_in_key_order() {
    let map: HashMap<String, u8> = [("b".to_string(), 2), ("a".to_string(), 1), ("c".to_string(), 3)]
        .into_iter()
        .collect();
    assert_eq!(to_string(&map).unwrap(), r#"{"a":1,"b":2,"c":3}"#);
}

#[test]
fn encoded_scalars() {
    let bytes = Bytes(b"foobar".to_vec());
    assert_eq!(to_string(&bytes).unwrap(), r#""Zm9vYmFy""#);
    let err = from_tree::<Bytes>(&json(r#""Zm9""#)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Encoding);

    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(to_string(&date).unwrap(), r#""2024-02-29""#);
    let err = from_tree::<NaiveDate>(&json(r#""2024-13-01""#)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDateTime { format: "date", .. }));

    assert_eq!(from_tree::<char>(&json(r#""é""#)).unwrap(), 'é');
    assert!(from_tree::<char>(&json(r#""ab""#)).is_err());
}
