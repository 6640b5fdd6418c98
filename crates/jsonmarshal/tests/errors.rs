#![expect(missing_docs)]

mod common;

use jsonmarshal::{
    DecodeOptions, ErrorCategory, ErrorKind, SyntaxError, TreeOptions, UnknownKeys, Value, from_str,
    from_str_with, from_tree, from_tree_with, path, to_tree,
};
use rstest::rstest;

use crate::common::{Blog, FLAT_BLOG, Post};

#[test]
fn syntax_error_offset() {
    let err = from_str::<Value>(r#"{"bool_value": true, []}"#).unwrap_err();
    assert_eq!(err.offset, 21);
    assert_eq!(err.kind, ErrorKind::Syntax(SyntaxError::InvalidCharacter('[')));
    assert_eq!(err.to_string(), "syntax error: invalid character '[' at offset 21");
}

#[test]
fn tree_error_names_the_element() {
    let tree: Value = r#"{"title": "t", "author": {"name": "a"}, "tags": ["x", "y", 3]}"#
        .parse()
        .unwrap();
    let err = from_tree::<Post>(&tree).unwrap_err();
    assert_eq!(err.path, path!["tags", 2]);
    assert_eq!(err.path.to_string(), "/tags/2");
    assert_eq!(err.category(), ErrorCategory::TypeMismatch);
}

#[test]
fn stream_error_offset_points_at_the_value() {
    let text = r#"{"title": "t", "author": {"name": "a"}, "status": "archived"}"#;
    let err = from_str::<Post>(text).unwrap_err();
    assert_eq!(err.offset, text.find(r#""archived""#).unwrap());
    assert_eq!(
        err.kind,
        ErrorKind::UnknownVariant {
            variant: "archived".into(),
            type_name: "Status",
        }
    );
}

#[rstest]
#[case::trailing_comma(r#"{"name": "x",}"#)]
#[case::leading_zero(r#"{"name": 01}"#)]
#[case::trailing_content(r#"{"name": "x"} {}"#)]
#[case::unterminated(r#"{"name": "x"#)]
fn malformed_text_is_lexical(#[case] text: &str) {
    assert_eq!(from_str::<Value>(text).unwrap_err().category(), ErrorCategory::Lexical);
}

#[test]
fn policies_agree_across_paths() {
    let text = r#"{"title": "t", "author": {"name": "a", "handle": "@a"}}"#;
    let tree: Value = text.parse().unwrap();

    assert!(from_str::<Post>(text).is_ok());
    assert!(from_tree::<Post>(&tree).is_ok());

    let stream = DecodeOptions {
        unknown_keys: UnknownKeys::Reject,
        ..DecodeOptions::default()
    };
    let strict = TreeOptions {
        unknown_keys: UnknownKeys::Reject,
        ..TreeOptions::default()
    };
    let stream_err = from_str_with::<Post>(text, stream).unwrap_err();
    let tree_err = from_tree_with::<Post>(&tree, strict).unwrap_err();
    assert_eq!(stream_err.kind, ErrorKind::UnknownField("handle".into()));
    assert_eq!(tree_err.kind, stream_err.kind);
    assert_eq!(tree_err.path, path!["author", "handle"]);
}

#[test]
fn missing_required_field_on_both_paths() {
    let text = r#"{"title": "t"}"#;
    assert_eq!(from_str::<Post>(text).unwrap_err().kind, ErrorKind::MissingField("author"));
    let tree: Value = text.parse().unwrap();
    assert_eq!(from_tree::<Post>(&tree).unwrap_err().kind, ErrorKind::MissingField("author"));
}

#[test]
fn numeric_bounds_round_trip() {
    fn check<T>(values: &[T])
    where
        T: jsonmarshal::Marshal + PartialEq + core::fmt::Debug,
    {
        for value in values {
            let tree = to_tree(value).unwrap();
            assert_eq!(&from_tree::<T>(&tree).unwrap(), value);
            assert_eq!(&from_str::<T>(&tree.to_string()).unwrap(), value);
        }
    }

    check(&[i8::MIN, i8::MAX]);
    check(&[i16::MIN, i16::MAX]);
    check(&[i32::MIN, i32::MAX]);
    check(&[i64::MIN, i64::MAX]);
    check(&[u8::MIN, u8::MAX]);
    check(&[u16::MIN, u16::MAX]);
    check(&[u32::MIN, u32::MAX]);
    check(&[u64::MIN, u64::MAX]);
    check(&[f64::MIN, f64::MAX, f64::MIN_POSITIVE, -0.5]);
    check(&[f32::MIN, f32::MAX]);

    for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(to_tree(&x).unwrap_err().category(), ErrorCategory::Encoding);
    }
}

#[test]
fn flat_blog_decodes_on_both_paths() {
    let tree: Value = FLAT_BLOG.parse().unwrap();
    let streamed: Blog = from_str(FLAT_BLOG).unwrap();
    let built: Blog = from_tree(&tree).unwrap();
    assert_eq!(streamed, built);
}
