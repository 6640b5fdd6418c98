//! Token scanners for strings, numbers and the three keyword literals.
//!
//! Each scanner starts at `*pos`, advances it past the token on success and
//! leaves it at the offending byte on failure.

use std::borrow::Cow;

use bstr::ByteSlice;

use crate::error::{DecodeError, SyntaxError};

/// Bytes that end the fast scan of a string body.
const STRING_STOP: &[u8] = b"\"\\\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e\x0f\
\x10\x11\x12\x13\x14\x15\x16\x17\x18\x19\x1a\x1b\x1c\x1d\x1e\x1f";

pub(super) fn invalid_at(src: &str, pos: usize) -> DecodeError {
    match src.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(c) => DecodeError::new(pos, SyntaxError::InvalidCharacter(c)),
        None => DecodeError::new(src.len(), SyntaxError::UnexpectedEndOfInput),
    }
}

/// Matches one of `true`, `false` or `null`.
pub(super) fn literal(src: &str, pos: &mut usize, expected: &'static str) -> Result<(), DecodeError> {
    let bytes = src.as_bytes();
    for (i, want) in expected.bytes().enumerate() {
        if bytes.get(*pos + i) != Some(&want) {
            return Err(invalid_at(src, *pos + i));
        }
    }
    *pos += expected.len();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    Sign,
    Zero,
    DecimalInteger,
    DecimalPoint,
    DecimalFraction,
    DecimalExponent,
    DecimalExponentSign,
    DecimalExponentInteger,
}

/// Scans a number literal per the RFC 8259 grammar and returns its text.
pub(super) fn number<'src>(src: &'src str, pos: &mut usize) -> Result<&'src str, DecodeError> {
    use NumberState::*;

    let bytes = src.as_bytes();
    let start = *pos;
    let mut i = start;
    let mut state = match bytes.get(i) {
        Some(b'-') => Sign,
        Some(b'0') => Zero,
        Some(b'1'..=b'9') => DecimalInteger,
        _ => return Err(invalid_at(src, i)),
    };
    i += 1;

    loop {
        let next = bytes.get(i).copied();
        state = match (state, next) {
            (Sign, Some(b'0')) => Zero,
            (Sign, Some(b'1'..=b'9')) => DecimalInteger,
            (Zero | DecimalInteger, Some(b'.')) => DecimalPoint,
            (Zero | DecimalInteger | DecimalFraction, Some(b'e' | b'E')) => DecimalExponent,
            (DecimalInteger, Some(b'0'..=b'9')) => DecimalInteger,
            (DecimalPoint | DecimalFraction, Some(b'0'..=b'9')) => DecimalFraction,
            (DecimalExponent, Some(b'+' | b'-')) => DecimalExponentSign,
            (DecimalExponent | DecimalExponentSign | DecimalExponentInteger, Some(b'0'..=b'9')) => {
                DecimalExponentInteger
            }
            (Zero | DecimalInteger | DecimalFraction | DecimalExponentInteger, _) => break,
            (Sign | DecimalPoint | DecimalExponent | DecimalExponentSign, _) => {
                *pos = i;
                return Err(invalid_at(src, i));
            }
        };
        i += 1;
    }

    *pos = i;
    Ok(&src[start..i])
}

/// Scans a string literal starting at its opening quote.
pub(super) fn string<'src>(src: &'src str, pos: &mut usize) -> Result<Cow<'src, str>, DecodeError> {
    let bytes = src.as_bytes();
    debug_assert_eq!(bytes.get(*pos), Some(&b'"'));
    let mut i = *pos + 1;
    let mut owned: Option<String> = None;

    loop {
        let Some(rel) = bytes[i..].find_byteset(STRING_STOP) else {
            *pos = src.len();
            return Err(DecodeError::new(src.len(), SyntaxError::UnexpectedEndOfInput));
        };
        let j = i + rel;
        match bytes[j] {
            b'"' => {
                let tail = &src[i..j];
                *pos = j + 1;
                return Ok(match owned {
                    None => Cow::Borrowed(tail),
                    Some(mut s) => {
                        s.push_str(tail);
                        Cow::Owned(s)
                    }
                });
            }
            b'\\' => {
                let s = owned.get_or_insert_with(String::new);
                s.push_str(&src[i..j]);
                let (c, next) = escape(src, j)?;
                s.push(c);
                i = next;
            }
            control => {
                *pos = j;
                return Err(DecodeError::new(
                    j,
                    SyntaxError::ControlCharacter(u32::from(control)),
                ));
            }
        }
    }
}

/// Decodes the escape sequence whose backslash is at `at`; returns the
/// character and the offset just past the sequence.
fn escape(src: &str, at: usize) -> Result<(char, usize), DecodeError> {
    let bytes = src.as_bytes();
    let c = match bytes.get(at + 1) {
        None => return Err(DecodeError::new(src.len(), SyntaxError::UnexpectedEndOfInput)),
        Some(b'"') => '"',
        Some(b'\\') => '\\',
        Some(b'/') => '/',
        Some(b'b') => '\u{08}',
        Some(b'f') => '\u{0C}',
        Some(b'n') => '\n',
        Some(b'r') => '\r',
        Some(b't') => '\t',
        Some(b'u') => return unicode_escape(src, at),
        Some(_) => {
            let c = src[at + 1..].chars().next().unwrap_or('\\');
            return Err(DecodeError::new(at, SyntaxError::InvalidEscape(c)));
        }
    };
    Ok((c, at + 2))
}

fn hex4(src: &str, at: usize) -> Result<u32, DecodeError> {
    let bytes = src.as_bytes();
    for i in at..at + 4 {
        match bytes.get(i) {
            Some(b) if b.is_ascii_hexdigit() => {}
            _ => return Err(invalid_at(src, i)),
        }
    }
    u32::from_str_radix(&src[at..at + 4], 16).map_err(|_| invalid_at(src, at))
}

/// `\uXXXX`, combining a high surrogate with the `\uXXXX` low surrogate that
/// must follow it.
fn unicode_escape(src: &str, at: usize) -> Result<(char, usize), DecodeError> {
    let bytes = src.as_bytes();
    let code = hex4(src, at + 2)?;
    let mut end = at + 6;

    let scalar = match code {
        0xD800..=0xDBFF => {
            if bytes.get(end) != Some(&b'\\') || bytes.get(end + 1) != Some(&b'u') {
                return Err(DecodeError::new(at, SyntaxError::InvalidUnicodeEscape(code)));
            }
            let low = hex4(src, end + 2)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(DecodeError::new(end, SyntaxError::InvalidUnicodeEscape(low)));
            }
            end += 6;
            0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
        }
        0xDC00..=0xDFFF => {
            return Err(DecodeError::new(at, SyntaxError::InvalidUnicodeEscape(code)));
        }
        code => code,
    };

    char::from_u32(scalar)
        .map(|c| (c, end))
        .ok_or_else(|| DecodeError::new(at, SyntaxError::InvalidUnicodeEscape(scalar)))
}
