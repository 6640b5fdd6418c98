//! Event-driven decoding straight into typed values.
//!
//! The decoder keeps an explicit stack of [`Frame`]s instead of recursing, one
//! frame per value under construction. Only the top frame sees the next
//! event; it may consume it, push a child frame, replace itself, or complete
//! and hand its value to the frame below. Depth and the combined size of the
//! open frames are bounded by [`DecodeOptions`].
//!
//! # Examples
//!
//! ```rust
//! use jsonmarshal::{Event, StreamDecoder};
//!
//! let mut decoder = StreamDecoder::<Vec<u8>>::default();
//! decoder.event(0, &Event::ArrayStart).unwrap();
//! decoder.event(1, &Event::Number("7".into())).unwrap();
//! decoder.event(2, &Event::ArrayEnd).unwrap();
//! assert_eq!(decoder.finish().unwrap(), vec![7]);
//! ```

mod frame;
mod frames;
mod impls;

use core::marker::PhantomData;

use tracing::debug;

pub use self::{
    frame::{Frame, FrameCx, Step, take},
    frames::{MapBuilder, Scalar, SeqBuilder, TupleDecode},
};
use self::{
    frame::FrameStack,
    frames::{ObjectStart, ScalarFrame, UnionFrame, mismatch},
};
use crate::{
    error::{DecodeError, ErrorKind},
    event::{Event, EventKind, Spanned},
    lexer::Lexer,
    options::DecodeOptions,
    reflect::{Reflect, StringEnum, Union},
};

/// A type the streaming decoder can build.
pub trait Decode: Sized + 'static {
    /// A fresh frame that decodes one value of this type, starting with the
    /// value's first event.
    fn frame() -> Box<dyn Frame>;

    /// Whether a value of this type can start with an event of this kind.
    fn accepts(kind: EventKind) -> bool;
}

/// Root frame of a reflected struct.
#[doc(hidden)]
#[must_use]
pub fn object_frame<T: Reflect>() -> Box<dyn Frame> {
    Box::new(ObjectStart::<T>::new())
}

/// Frame of a single-event value.
#[doc(hidden)]
#[must_use]
pub fn scalar_frame<T: Scalar>() -> Box<dyn Frame> {
    Box::new(ScalarFrame::<T>::new())
}

/// Frame that picks a union alternative from the first event.
#[doc(hidden)]
#[must_use]
pub fn union_frame<U: Union>() -> Box<dyn Frame> {
    Box::new(UnionFrame::<U>::new())
}

/// Reads a string enum from a string event.
#[doc(hidden)]
pub fn enum_from_event<E: StringEnum>(event: &Event<'_>) -> Result<E, ErrorKind> {
    let Event::String(name) = event else {
        return Err(mismatch("string", event));
    };
    E::from_name(name).ok_or_else(|| ErrorKind::UnknownVariant {
        variant: name.to_string(),
        type_name: E::TYPE_NAME,
    })
}

// ------------------------------------------------------------------------------------------------
// Decoder
// ------------------------------------------------------------------------------------------------

/// Push-style decoder of one `T` from a sequence of events.
pub struct StreamDecoder<T> {
    options: DecodeOptions,
    stack: FrameStack,
    result: Option<Box<dyn core::any::Any>>,
    failure: Option<DecodeError>,
    last_offset: usize,
    _target: PhantomData<fn() -> T>,
}

impl<T: Decode> Default for StreamDecoder<T> {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

impl<T: Decode> StreamDecoder<T> {
    /// A decoder with nothing fed yet.
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            stack: FrameStack::new(&options),
            result: None,
            failure: None,
            last_offset: 0,
            _target: PhantomData,
        }
    }

    /// Whether the root value is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Feeds the next event; `offset` locates it in errors.
    ///
    /// # Errors
    ///
    /// Fails when the event does not fit the value being decoded, when a
    /// resource bound is exceeded, or when the root value is already
    /// complete. After a failure every further call returns the same error.
    pub fn event(&mut self, offset: usize, event: &Event<'_>) -> Result<(), DecodeError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.last_offset = offset;
        let outcome = if self.result.is_some() {
            Err(ErrorKind::TrailingEvent)
        } else {
            self.deliver(event)
        };
        #[cfg(any(test, feature = "fuzzing"))]
        self.stack.assert_consistent();
        outcome.map_err(|kind| {
            let err = DecodeError::new(offset, kind);
            debug!(%err, depth = self.stack.depth(), "stream decode failed");
            self.failure = Some(err.clone());
            err
        })
    }

    fn deliver(&mut self, event: &Event<'_>) -> Result<(), ErrorKind> {
        if self.stack.depth() == 0 {
            self.stack.push(T::frame())?;
        }
        let cx = FrameCx::new(&self.options, self.stack.depth());
        let top = self
            .stack
            .top()
            .ok_or(ErrorKind::Internal("empty frame stack"))?;
        let mut step = top.event(event, &cx)?;
        loop {
            match step {
                Step::Continue => return Ok(()),
                Step::Push(frame) => return self.stack.push(frame),
                Step::Replace(frame) => return self.stack.replace(frame),
                Step::Delegate(frame) => {
                    self.stack.push(frame)?;
                    let cx = FrameCx::new(&self.options, self.stack.depth());
                    let top = self
                        .stack
                        .top()
                        .ok_or(ErrorKind::Internal("empty frame stack"))?;
                    step = top.event(event, &cx)?;
                }
                Step::Done(value) => {
                    self.stack.pop();
                    let depth = self.stack.depth();
                    match self.stack.top() {
                        None => {
                            self.result = Some(value);
                            return Ok(());
                        }
                        Some(parent) => {
                            let cx = FrameCx::new(&self.options, depth);
                            step = parent.child(value, &cx)?;
                        }
                    }
                }
            }
        }
    }

    /// Footprint in bytes of the frames currently open.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        self.stack.bytes()
    }

    /// Returns the decoded value.
    ///
    /// # Errors
    ///
    /// Returns the earlier failure if any, or
    /// [`ErrorKind::Incomplete`] if the root value is not complete.
    pub fn finish(self) -> Result<T, DecodeError> {
        if let Some(failure) = self.failure {
            return Err(failure);
        }
        let offset = self.last_offset;
        let value = self
            .result
            .ok_or_else(|| DecodeError::new(offset, ErrorKind::Incomplete))?;
        take::<T>(value).map_err(|kind| DecodeError::new(offset, kind))
    }
}

// ------------------------------------------------------------------------------------------------
// Entry points
// ------------------------------------------------------------------------------------------------

/// Decodes a `T` from located events with default options.
///
/// # Errors
///
/// See [`decode_stream_with`].
pub fn decode_stream<'src, T, I>(events: I) -> Result<T, DecodeError>
where
    T: Decode,
    I: IntoIterator<Item = Result<Spanned<'src>, DecodeError>>,
{
    decode_stream_with(events, DecodeOptions::default())
}

/// Decodes a `T` from located events.
///
/// # Errors
///
/// Propagates the first event error, fails when the events do not describe
/// a `T`, when events follow the complete value, and when the events end
/// before it is complete.
pub fn decode_stream_with<'src, T, I>(events: I, options: DecodeOptions) -> Result<T, DecodeError>
where
    T: Decode,
    I: IntoIterator<Item = Result<Spanned<'src>, DecodeError>>,
{
    let mut decoder = StreamDecoder::<T>::new(options);
    for spanned in events {
        let Spanned { offset, event } = spanned?;
        decoder.event(offset, &event)?;
    }
    decoder.finish()
}

/// Lexes and decodes JSON text with default options.
///
/// # Errors
///
/// See [`from_str_with`].
pub fn from_str<T: Decode>(text: &str) -> Result<T, DecodeError> {
    from_str_with(text, DecodeOptions::default())
}

/// Lexes and decodes JSON text without building a [`Value`](crate::Value)
/// tree.
///
/// # Errors
///
/// Fails on malformed text, including trailing non-whitespace content, and
/// on every error of [`decode_stream_with`].
pub fn from_str_with<T: Decode>(text: &str, options: DecodeOptions) -> Result<T, DecodeError> {
    decode_stream_with(Lexer::new(text), options)
}
