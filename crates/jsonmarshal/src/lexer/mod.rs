//! A strict JSON lexer producing located [`Event`]s.
//!
//! The lexer walks the source text once, tracking the open containers on a
//! small stack and the expected next token in a [`ParseState`]. Every event
//! is reported with the byte offset of its first byte; every error is
//! reported with the byte offset of the offending character (or the end of
//! input).
//!
//! String and key literals are borrowed from the source unless they contain
//! escape sequences.
//!
//! # Examples
//!
//! ```rust
//! use jsonmarshal::{Event, Lexer};
//!
//! let kinds: Vec<_> = Lexer::new("[null, 1]")
//!     .map(|e| e.unwrap().event)
//!     .collect();
//! assert_eq!(
//!     kinds,
//!     vec![Event::ArrayStart, Event::Null, Event::Number("1".into()), Event::ArrayEnd]
//! );
//! ```

mod scan;

use tracing::trace;

use crate::{
    error::{DecodeError, SyntaxError},
    event::{Event, Spanned},
};

// ------------------------------------------------------------------------------------------------
// State machine
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    BeforePropertyName { first: bool },
    AfterPropertyName,
    BeforePropertyValue,
    BeforeArrayValue { first: bool },
    AfterPropertyValue,
    AfterArrayValue,
    End,
    Error,
}

/// Stack entry – one per open container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

/// Iterator of [`Spanned`] events over a complete JSON text.
///
/// After the first error the iterator is fused and yields `None`.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    state: ParseState,
    frames: Vec<Container>,
}

impl<'src> Lexer<'src> {
    /// A lexer positioned at the start of `src`.
    #[must_use]
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            state: ParseState::Start,
            frames: Vec::with_capacity(16),
        }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn bytes(&self) -> &'src [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn next_event(&mut self) -> Result<Option<Spanned<'src>>, DecodeError> {
        use ParseState::*;

        loop {
            self.skip_whitespace();
            let offset = self.pos;
            match self.state {
                Error => return Ok(None),
                End => {
                    return match self.peek() {
                        None => Ok(None),
                        Some(_) => Err(DecodeError::new(offset, SyntaxError::TrailingCharacters)),
                    };
                }
                Start | BeforePropertyValue => return self.value().map(Some),
                BeforeArrayValue { first } => {
                    if first && self.peek() == Some(b']') {
                        self.pos += 1;
                        return Ok(Some(self.pop(offset, Event::ArrayEnd)));
                    }
                    return self.value().map(Some);
                }
                BeforePropertyName { first } => match self.peek() {
                    Some(b'"') => {
                        let key = scan::string(self.src, &mut self.pos)?;
                        self.state = AfterPropertyName;
                        return Ok(Some(Spanned {
                            offset,
                            event: Event::ObjectKey(key),
                        }));
                    }
                    Some(b'}') if first => {
                        self.pos += 1;
                        return Ok(Some(self.pop(offset, Event::ObjectEnd)));
                    }
                    _ => return Err(self.invalid_char()),
                },
                AfterPropertyName => match self.peek() {
                    Some(b':') => {
                        self.pos += 1;
                        self.state = BeforePropertyValue;
                    }
                    _ => return Err(self.invalid_char()),
                },
                AfterPropertyValue => match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        self.state = BeforePropertyName { first: false };
                    }
                    Some(b'}') => {
                        self.pos += 1;
                        return Ok(Some(self.pop(offset, Event::ObjectEnd)));
                    }
                    _ => return Err(self.invalid_char()),
                },
                AfterArrayValue => match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        self.state = BeforeArrayValue { first: false };
                    }
                    Some(b']') => {
                        self.pos += 1;
                        return Ok(Some(self.pop(offset, Event::ArrayEnd)));
                    }
                    _ => return Err(self.invalid_char()),
                },
            }
        }
    }

    /// Lexes one value token at the current position.
    fn value(&mut self) -> Result<Spanned<'src>, DecodeError> {
        let offset = self.pos;
        let event = match self.peek() {
            Some(b'{') => {
                self.pos += 1;
                self.frames.push(Container::Object);
                self.state = ParseState::BeforePropertyName { first: true };
                return Ok(Spanned {
                    offset,
                    event: Event::ObjectStart,
                });
            }
            Some(b'[') => {
                self.pos += 1;
                self.frames.push(Container::Array);
                self.state = ParseState::BeforeArrayValue { first: true };
                return Ok(Spanned {
                    offset,
                    event: Event::ArrayStart,
                });
            }
            Some(b'"') => Event::String(scan::string(self.src, &mut self.pos)?),
            Some(b't') => {
                scan::literal(self.src, &mut self.pos, "true")?;
                Event::Bool(true)
            }
            Some(b'f') => {
                scan::literal(self.src, &mut self.pos, "false")?;
                Event::Bool(false)
            }
            Some(b'n') => {
                scan::literal(self.src, &mut self.pos, "null")?;
                Event::Null
            }
            Some(b'-' | b'0'..=b'9') => Event::Number(scan::number(self.src, &mut self.pos)?.into()),
            _ => return Err(self.invalid_char()),
        };
        self.after_value();
        Ok(Spanned { offset, event })
    }

    fn pop(&mut self, offset: usize, event: Event<'src>) -> Spanned<'src> {
        self.frames.pop();
        self.after_value();
        Spanned { offset, event }
    }

    /// Restores the state expected after a complete value in the current
    /// container.
    fn after_value(&mut self) {
        self.state = match self.frames.last() {
            None => ParseState::End,
            Some(Container::Array) => ParseState::AfterArrayValue,
            Some(Container::Object) => ParseState::AfterPropertyValue,
        };
    }

    fn invalid_char(&self) -> DecodeError {
        scan::invalid_at(self.src, self.pos)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Spanned<'src>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(spanned)) => Some(Ok(spanned)),
            Ok(None) => None,
            Err(err) => {
                trace!(offset = err.offset, %err, "lexer error");
                self.state = ParseState::Error;
                Some(Err(err))
            }
        }
    }
}

impl core::iter::FusedIterator for Lexer<'_> {}

#[cfg(test)]
mod tests;
