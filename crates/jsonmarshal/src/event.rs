//! Events consumed by the streaming decoder.
//!
//! An [`Event`] is one primitive token of a JSON document. Literal payloads
//! borrow from the source text whenever no unescaping was needed, so an event
//! is only valid for as long as the text it was lexed from. The lexer
//! delivers each event as a [`Spanned`] carrying the byte offset of the
//! token's first byte.
//!
//! # Examples
//!
//! ```
//! use jsonmarshal::{Event, Lexer, Spanned};
//!
//! let events: Vec<Spanned> = Lexer::new(r#"{"a": [true]}"#)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(events[1].event, Event::ObjectKey("a".into()));
//! assert_eq!(events[1].offset, 1);
//! assert_eq!(events[3].event, Event::Bool(true));
//! assert_eq!(events[3].offset, 7);
//! ```
use core::fmt;
use std::borrow::Cow;

/// One primitive token of a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'src> {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A number literal, exactly as written.
    Number(Cow<'src, str>),
    /// A string value, unescaped.
    String(Cow<'src, str>),
    /// `{`.
    ObjectStart,
    /// A member name, unescaped.
    ObjectKey(Cow<'src, str>),
    /// `}`.
    ObjectEnd,
    /// `[`.
    ArrayStart,
    /// `]`.
    ArrayEnd,
}

impl Event<'_> {
    /// The payload-free kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Null => EventKind::Null,
            Self::Bool(_) => EventKind::Bool,
            Self::Number(_) => EventKind::Number,
            Self::String(_) => EventKind::String,
            Self::ObjectStart => EventKind::ObjectStart,
            Self::ObjectKey(_) => EventKind::ObjectKey,
            Self::ObjectEnd => EventKind::ObjectEnd,
            Self::ArrayStart => EventKind::ArrayStart,
            Self::ArrayEnd => EventKind::ArrayEnd,
        }
    }

    /// Detaches the event from the source text.
    #[must_use]
    pub fn into_owned(self) -> Event<'static> {
        match self {
            Self::Null => Event::Null,
            Self::Bool(b) => Event::Bool(b),
            Self::Number(n) => Event::Number(Cow::Owned(n.into_owned())),
            Self::String(s) => Event::String(Cow::Owned(s.into_owned())),
            Self::ObjectStart => Event::ObjectStart,
            Self::ObjectKey(k) => Event::ObjectKey(Cow::Owned(k.into_owned())),
            Self::ObjectEnd => Event::ObjectEnd,
            Self::ArrayStart => Event::ArrayStart,
            Self::ArrayEnd => Event::ArrayEnd,
        }
    }
}

/// The kind of an [`Event`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`Event::Null`].
    Null,
    /// [`Event::Bool`].
    Bool,
    /// [`Event::Number`].
    Number,
    /// [`Event::String`].
    String,
    /// [`Event::ObjectStart`].
    ObjectStart,
    /// [`Event::ObjectKey`].
    ObjectKey,
    /// [`Event::ObjectEnd`].
    ObjectEnd,
    /// [`Event::ArrayStart`].
    ArrayStart,
    /// [`Event::ArrayEnd`].
    ArrayEnd,
}

impl EventKind {
    /// Name used in type mismatch messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::ObjectStart => "object",
            Self::ObjectKey => "object key",
            Self::ObjectEnd => "end of object",
            Self::ArrayStart => "array",
            Self::ArrayEnd => "end of array",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event together with the byte offset where its token starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'src> {
    /// Byte offset of the token in the source text.
    pub offset: usize,
    /// The event.
    pub event: Event<'src>,
}

impl fmt::Display for Spanned<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<4} ", self.offset)?;
        match &self.event {
            Event::Null => f.write_str("null"),
            Event::Bool(b) => write!(f, "bool {b}"),
            Event::Number(n) => write!(f, "number {n}"),
            Event::String(s) => write!(f, "string {s:?}"),
            Event::ObjectStart => f.write_str("{"),
            Event::ObjectKey(k) => write!(f, "key {k:?}"),
            Event::ObjectEnd => f.write_str("}"),
            Event::ArrayStart => f.write_str("["),
            Event::ArrayEnd => f.write_str("]"),
        }
    }
}
