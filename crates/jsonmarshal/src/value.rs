//! JSON value types and utilities.
//!
//! This module defines the [`Value`] tree used by the tree codec, its compact
//! text rendering, and its construction from an event stream.
//!
use core::{fmt, str::FromStr};
use std::borrow::Cow;

use indexmap::IndexMap;

use crate::{
    error::{DecodeError, ErrorKind},
    event::{Event, Spanned},
    lexer::Lexer,
};

/// Member name of a back-reference object.
pub const REF_KEY: &str = "$ref";

/// A JSON number, keeping integers exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// A non-negative integer.
    PosInt(u64),
    /// A negative integer.
    NegInt(i64),
    /// A finite floating point number.
    Float(f64),
}

impl Number {
    /// An integer, normalized so that non-negative values are `PosInt`.
    #[must_use]
    pub fn from_i64(i: i64) -> Self {
        match u64::try_from(i) {
            Ok(u) => Self::PosInt(u),
            Err(_) => Self::NegInt(i),
        }
    }

    /// A non-negative integer.
    #[must_use]
    pub fn from_u64(u: u64) -> Self {
        Self::PosInt(u)
    }

    /// Returns `None` for NaN and the infinities, which JSON cannot express.
    #[must_use]
    pub fn from_f64(f: f64) -> Option<Self> {
        f.is_finite().then_some(Self::Float(f))
    }

    /// The number as `i64`, if it is an integer in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::PosInt(u) => i64::try_from(u).ok(),
            Self::NegInt(i) => Some(i),
            Self::Float(_) => None,
        }
    }

    /// The number as `u64`, if it is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::PosInt(u) => Some(u),
            Self::NegInt(_) | Self::Float(_) => None,
        }
    }

    /// Any number converts to `f64`, possibly losing precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::PosInt(u) => u as f64,
            Self::NegInt(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Whether the number was written without a fraction or exponent.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::Float(_))
    }

    /// Parses a JSON number literal. Integers that overflow 64 bits fall back
    /// to `Float`.
    #[must_use]
    pub fn parse_literal(literal: &str) -> Option<Self> {
        let is_integer = !literal.contains(['.', 'e', 'E']);
        if is_integer {
            if literal.starts_with('-') {
                if let Ok(i) = literal.parse::<i64>() {
                    return Some(Self::from_i64(i));
                }
            } else if let Ok(u) = literal.parse::<u64>() {
                return Some(Self::PosInt(u));
            }
        }
        literal.parse::<f64>().ok().and_then(Self::from_f64)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PosInt(u) => write!(f, "{u}"),
            Self::NegInt(i) => write!(f, "{i}"),
            // `Debug` is the shortest round-tripping form and keeps a fraction
            // or exponent, so the literal reads back as a float.
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// An insertion-ordered JSON object.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    /// An empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty object with room for `capacity` members.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the object has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value of member `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The value of member `key`, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Whether member `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a member, returning the previous value of `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Member names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Objects compare equal when they hold the same members in the same order.
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The elements of a JSON array.
pub type Array = Vec<Value>;

/// A JSON value as defined by [RFC 8259].
///
/// # Examples
///
/// ```
/// use jsonmarshal::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("key", Value::String("value".into()));
/// let v = Value::Object(map);
/// assert_eq!(v.to_string(), r#"{"key":"value"}"#);
/// ```
///
/// [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// `null`.
    #[default]
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An array.
    Array(Array),
    /// An object.
    Object(Map),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Self::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// Builds the back-reference object `{"$ref": target}`.
    #[must_use]
    pub fn reference(target: impl Into<String>) -> Self {
        let mut map = Map::with_capacity(1);
        map.insert(REF_KEY, Value::String(target.into()));
        Self::Object(map)
    }

    /// Returns the target if this is exactly `{"$ref": "<string>"}`.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Object(map) if map.len() == 1 => match map.get(REF_KEY) {
                Some(Self::String(target)) => Some(target),
                _ => None,
            },
            _ => None,
        }
    }

    /// Human readable name of the variant, used in type mismatch errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text of a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// The elements of an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        if let Self::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }

    /// The members of an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        if let Self::Object(o) = self {
            Some(o)
        } else {
            None
        }
    }

    /// Member `key` of an object; `None` for other kinds.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Builds a value from a stream of located events.
    ///
    /// # Errors
    ///
    /// Propagates lexer errors, and fails if the events are not one
    /// well-nested value.
    pub fn from_events<'src, I>(events: I) -> Result<Value, DecodeError>
    where
        I: IntoIterator<Item = Result<Spanned<'src>, DecodeError>>,
    {
        let mut builder = ValueBuilder::default();
        let mut last_offset = 0;
        for spanned in events {
            let Spanned { offset, event } = spanned?;
            last_offset = offset;
            builder
                .push(event)
                .map_err(|kind| DecodeError::new(offset, kind))?;
        }
        builder
            .finish()
            .map_err(|kind| DecodeError::new(last_offset, kind))
    }
}

impl FromStr for Value {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_events(Lexer::new(s))
    }
}

// ── builder ────────────────────────────────────────────────────────────────

enum Open {
    Array(Array),
    Object(Map, Option<String>),
}

/// Explicit-stack value builder; one open container per nesting level.
#[derive(Default)]
pub(crate) struct ValueBuilder {
    stack: Vec<Open>,
    root: Option<Value>,
}

impl ValueBuilder {
    pub(crate) fn push(&mut self, event: Event<'_>) -> Result<(), ErrorKind> {
        match event {
            Event::Null => self.attach(Value::Null),
            Event::Bool(b) => self.attach(Value::Boolean(b)),
            Event::Number(literal) => {
                let n = Number::parse_literal(&literal)
                    .ok_or_else(|| ErrorKind::InvalidNumber(literal.into_owned()))?;
                self.attach(Value::Number(n))
            }
            Event::String(s) => self.attach(Value::String(s.into_owned())),
            Event::ArrayStart => {
                self.stack.push(Open::Array(Array::new()));
                Ok(())
            }
            Event::ObjectStart => {
                self.stack.push(Open::Object(Map::new(), None));
                Ok(())
            }
            Event::ObjectKey(key) => match self.stack.last_mut() {
                Some(Open::Object(_, pending @ None)) => {
                    *pending = Some(key.into_owned());
                    Ok(())
                }
                _ => Err(ErrorKind::Internal("object key outside of an object")),
            },
            Event::ArrayEnd => match self.stack.pop() {
                Some(Open::Array(items)) => self.attach(Value::Array(items)),
                _ => Err(ErrorKind::Internal("unbalanced array end")),
            },
            Event::ObjectEnd => match self.stack.pop() {
                Some(Open::Object(map, None)) => self.attach(Value::Object(map)),
                _ => Err(ErrorKind::Internal("unbalanced object end")),
            },
        }
    }

    fn attach(&mut self, value: Value) -> Result<(), ErrorKind> {
        match self.stack.last_mut() {
            None if self.root.is_some() => Err(ErrorKind::TrailingEvent),
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(Open::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Open::Object(map, pending)) => match pending.take() {
                Some(key) => {
                    map.insert(key, value);
                    Ok(())
                }
                None => Err(ErrorKind::Internal("object member without a key")),
            },
        }
    }

    /// Number of containers currently open.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the events pushed so far form one complete value.
    pub(crate) fn is_complete(&self) -> bool {
        self.root.is_some() && self.stack.is_empty()
    }

    pub(crate) fn finish(self) -> Result<Value, ErrorKind> {
        match self.root {
            Some(root) if self.stack.is_empty() => Ok(root),
            _ => Err(ErrorKind::Incomplete),
        }
    }
}

/// Replays a value as the event sequence a lexer would produce for its text.
///
/// Offsets are event ordinals, since there is no source text.
#[must_use]
pub fn events_of(value: &Value) -> Vec<Spanned<'_>> {
    fn walk<'v>(value: &'v Value, out: &mut Vec<Event<'v>>) {
        match value {
            Value::Null => out.push(Event::Null),
            Value::Boolean(b) => out.push(Event::Bool(*b)),
            Value::Number(n) => out.push(Event::Number(Cow::Owned(n.to_string()))),
            Value::String(s) => out.push(Event::String(Cow::Borrowed(s))),
            Value::Array(items) => {
                out.push(Event::ArrayStart);
                for item in items {
                    walk(item, out);
                }
                out.push(Event::ArrayEnd);
            }
            Value::Object(map) => {
                out.push(Event::ObjectStart);
                for (k, v) in map.iter() {
                    out.push(Event::ObjectKey(Cow::Borrowed(k)));
                    walk(v, out);
                }
                out.push(Event::ObjectEnd);
            }
        }
    }

    let mut events = Vec::new();
    walk(value, &mut events);
    events
        .into_iter()
        .enumerate()
        .map(|(offset, event)| Spanned { offset, event })
        .collect()
}

// ── text rendering ─────────────────────────────────────────────────────────

/// Escapes a string for inclusion in a JSON string literal.
///
/// Quotes, backslashes and control characters are escaped, using the short
/// forms where JSON has one. U+2028 and U+2029 are escaped as well, since
/// pre-2019 JavaScript parsers reject them raw.
pub(crate) fn write_escaped_string<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0C}' => f.write_str("\\f")?,
            '\u{2028}' | '\u{2029}' => write!(f, "\\u{:04X}", c as u32)?,
            c if c.is_ascii_control() => write!(f, "\\u{:04X}", c as u32)?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("\"")?;
                    write_escaped_string(k, f)?;
                    write!(f, "\":{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(any(test, feature = "serde"))]
mod serde_impls {
    use serde::{
        Serialize, Serializer,
        ser::{SerializeMap, SerializeSeq},
    };

    use super::{Number, Value};

    impl Serialize for Value {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                Value::Null => serializer.serialize_unit(),
                Value::Boolean(b) => serializer.serialize_bool(*b),
                Value::Number(Number::PosInt(u)) => serializer.serialize_u64(*u),
                Value::Number(Number::NegInt(i)) => serializer.serialize_i64(*i),
                Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
                Value::String(s) => serializer.serialize_str(s),
                Value::Array(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
                Value::Object(map) => {
                    let mut out = serializer.serialize_map(Some(map.len()))?;
                    for (k, v) in map.iter() {
                        out.serialize_entry(k, v)?;
                    }
                    out.end()
                }
            }
        }
    }
}
