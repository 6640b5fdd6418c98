use std::{borrow::Cow, fmt::Write as _};

use rstest::rstest;

use super::Lexer;
use crate::{
    error::{DecodeError, ErrorKind, SyntaxError},
    event::Event,
};

fn render(src: &str) -> String {
    let mut out = String::new();
    for item in Lexer::new(src) {
        match item {
            Ok(spanned) => writeln!(out, "{spanned}").unwrap(),
            Err(err) => writeln!(out, "error: {err}").unwrap(),
        }
    }
    out
}

fn first_error(src: &str) -> DecodeError {
    Lexer::new(src)
        .find_map(Result::err)
        .unwrap_or_else(|| panic!("{src:?} lexed without error"))
}

#[test]
fn events_carry_token_offsets() {
    insta::assert_snapshot!(render(r#"{"a": [1, "x\n"], "b": null}"#), @r#"
    0    {
    1    key "a"
    6    [
    7    number 1
    10   string "x\n"
    15   ]
    18   key "b"
    23   null
    27   }
    "#);
}

#[test]
fn misplaced_array_in_object_fails_at_its_bracket() {
    let err = first_error(r#"{"bool_value": true, []}"#);
    assert_eq!(err.offset, 21);
    assert_eq!(err.kind, ErrorKind::Syntax(SyntaxError::InvalidCharacter('[')));
}

#[rstest]
#[case::empty("", 0, SyntaxError::UnexpectedEndOfInput)]
#[case::trailing_comma("[1,]", 3, SyntaxError::InvalidCharacter(']'))]
#[case::leading_zero_root("01", 1, SyntaxError::TrailingCharacters)]
#[case::leading_zero_nested("[01]", 2, SyntaxError::InvalidCharacter('1'))]
#[case::control_character("\"a\u{1}\"", 2, SyntaxError::ControlCharacter(1))]
#[case::bad_escape(r#""\x""#, 1, SyntaxError::InvalidEscape('x'))]
#[case::truncated_literal("tru", 3, SyntaxError::UnexpectedEndOfInput)]
#[case::misspelled_literal("nul!", 3, SyntaxError::InvalidCharacter('!'))]
#[case::lone_minus("-", 1, SyntaxError::UnexpectedEndOfInput)]
#[case::bare_fraction("1.", 2, SyntaxError::UnexpectedEndOfInput)]
#[case::empty_exponent("[1e]", 3, SyntaxError::InvalidCharacter(']'))]
#[case::missing_colon(r#"{"a" 1}"#, 5, SyntaxError::InvalidCharacter('1'))]
#[case::lone_high_surrogate(r#""\ud800""#, 1, SyntaxError::InvalidUnicodeEscape(0xD800))]
#[case::lone_low_surrogate(r#""\udc00""#, 1, SyntaxError::InvalidUnicodeEscape(0xDC00))]
#[case::trailing_content("{} x", 3, SyntaxError::TrailingCharacters)]
#[case::unterminated_string(r#""abc"#, 4, SyntaxError::UnexpectedEndOfInput)]
#[case::unclosed_array("[true", 5, SyntaxError::UnexpectedEndOfInput)]
fn rejects_malformed_text(#[case] src: &str, #[case] offset: usize, #[case] expected: SyntaxError) {
    let err = first_error(src);
    assert_eq!(err, DecodeError::new(offset, expected), "{src:?}");
}

#[test]
fn strings_borrow_unless_escaped() {
    let events: Vec<_> = Lexer::new(r#"["plain", "aé😀\t\/"]"#)
        .map(|e| e.unwrap().event)
        .collect();

    match &events[1] {
        Event::String(Cow::Borrowed(s)) => assert_eq!(*s, "plain"),
        other => panic!("expected borrowed string, got {other:?}"),
    }
    match &events[2] {
        Event::String(Cow::Owned(s)) => assert_eq!(s, "a\u{e9}\u{1F600}\t/"),
        other => panic!("expected owned string, got {other:?}"),
    }
}

#[rstest]
#[case("0")]
#[case("-0")]
#[case("12.5e-3")]
#[case("1E+9")]
#[case("-7.0")]
fn numbers_keep_their_literal(#[case] src: &str) {
    let events: Vec<_> = Lexer::new(src).map(|e| e.unwrap().event).collect();
    assert_eq!(events, vec![Event::Number(src.into())]);
}

#[test]
fn fused_after_error() {
    let mut lexer = Lexer::new("[1 2]");
    assert!(lexer.next().unwrap().is_ok());
    assert!(lexer.next().unwrap().is_ok());
    assert!(lexer.next().unwrap().is_err());
    assert!(lexer.next().is_none());
    assert!(lexer.next().is_none());
}

#[test]
fn surrounding_whitespace_is_ignored() {
    insta::assert_snapshot!(render(" \t\n[ ]\r\n "), @r"
    3    [
    5    ]
    ");
}
