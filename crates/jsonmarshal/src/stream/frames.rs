//! The frame types that make up the streaming decoder.
//!
//! Composite values use two frames: a start frame that checks the opening
//! event and replaces itself with a body frame, and the body frame that
//! collects child values until the closing event.

use core::{any::Any, marker::PhantomData, mem};

use super::{
    Decode,
    frame::{Frame, FrameCx, Step, take},
};
use crate::{
    error::ErrorKind,
    event::{Event, EventKind},
    options::UnknownKeys,
    reflect::{Reflect, Union},
    value::ValueBuilder,
};

pub(crate) fn mismatch(expected: &'static str, event: &Event<'_>) -> ErrorKind {
    ErrorKind::TypeMismatch {
        expected,
        found: event.kind().name(),
    }
}

// ------------------------------------------------------------------------------------------------
// Scalars
// ------------------------------------------------------------------------------------------------

/// A value decoded from exactly one event.
pub trait Scalar: Sized + 'static {
    /// Converts the event into a value.
    ///
    /// # Errors
    ///
    /// Fails on an event of the wrong kind or a payload out of range.
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind>;

    /// Whether an event of this kind can hold the value.
    fn accepts(kind: EventKind) -> bool;
}

pub(crate) struct ScalarFrame<T>(PhantomData<fn() -> T>);

impl<T: Scalar> ScalarFrame<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Scalar> Frame for ScalarFrame<T> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        T::from_event(event).map(|value| Step::Done(Box::new(value)))
    }

    fn expecting(&self) -> &'static str {
        "scalar"
    }
}

// ------------------------------------------------------------------------------------------------
// Sequences
// ------------------------------------------------------------------------------------------------

/// Collects the elements of a JSON array into a container.
pub trait SeqBuilder: Default + 'static {
    /// Element type.
    type Item: Decode;
    /// The finished container.
    type Output: 'static;

    /// Called before element `index` is decoded.
    ///
    /// # Errors
    ///
    /// Fails if the container cannot hold another element.
    fn admit(&self, index: usize) -> Result<(), ErrorKind> {
        let _ = index;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the element cannot be added, e.g. a duplicate set member.
    fn push(&mut self, item: Self::Item, index: usize) -> Result<(), ErrorKind>;

    /// # Errors
    ///
    /// Fails if `len` elements do not make a valid container.
    fn finish(self, len: usize) -> Result<Self::Output, ErrorKind>;
}

pub(crate) struct SeqStart<B>(PhantomData<fn() -> B>);

impl<B: SeqBuilder> SeqStart<B> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<B: SeqBuilder> Frame for SeqStart<B> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ArrayStart => Ok(Step::Replace(Box::new(SeqBody::<B> {
                builder: B::default(),
                len: 0,
            }))),
            other => Err(mismatch("array", other)),
        }
    }

    fn expecting(&self) -> &'static str {
        "array"
    }
}

struct SeqBody<B> {
    builder: B,
    len: usize,
}

impl<B: SeqBuilder> Frame for SeqBody<B> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        if let Event::ArrayEnd = event {
            let builder = mem::take(&mut self.builder);
            let output = builder.finish(self.len)?;
            return Ok(Step::Done(Box::new(output)));
        }
        self.builder.admit(self.len)?;
        Ok(Step::Delegate(B::Item::frame()))
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        self.builder.push(take::<B::Item>(value)?, self.len)?;
        self.len += 1;
        Ok(Step::Continue)
    }

    fn expecting(&self) -> &'static str {
        "array element"
    }
}

// ------------------------------------------------------------------------------------------------
// Tuples
// ------------------------------------------------------------------------------------------------

/// A heterogeneous fixed-length array.
pub trait TupleDecode: Sized + 'static {
    /// Number of elements.
    const ARITY: usize;

    /// Frame of element `index`.
    fn frame_at(index: usize) -> Box<dyn Frame>;

    /// Builds the tuple from exactly [`Self::ARITY`] element values.
    ///
    /// # Errors
    ///
    /// Fails if a part has the wrong type.
    fn assemble(parts: Vec<Box<dyn Any>>) -> Result<Self, ErrorKind>;
}

pub(crate) struct TupleStart<T>(PhantomData<fn() -> T>);

impl<T: TupleDecode> TupleStart<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: TupleDecode> Frame for TupleStart<T> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ArrayStart => Ok(Step::Replace(Box::new(TupleBody::<T> {
                parts: Vec::with_capacity(T::ARITY),
                _tuple: PhantomData,
            }))),
            other => Err(mismatch("array", other)),
        }
    }

    fn expecting(&self) -> &'static str {
        "tuple"
    }
}

struct TupleBody<T> {
    parts: Vec<Box<dyn Any>>,
    _tuple: PhantomData<fn() -> T>,
}

impl<T: TupleDecode> Frame for TupleBody<T> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let found = self.parts.len();
        if let Event::ArrayEnd = event {
            if found != T::ARITY {
                return Err(ErrorKind::ArityMismatch {
                    expected: T::ARITY,
                    found,
                });
            }
            let tuple = T::assemble(mem::take(&mut self.parts))?;
            return Ok(Step::Done(Box::new(tuple)));
        }
        if found >= T::ARITY {
            return Err(ErrorKind::ArityMismatch {
                expected: T::ARITY,
                found: found + 1,
            });
        }
        Ok(Step::Delegate(T::frame_at(found)))
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        self.parts.push(value);
        Ok(Step::Continue)
    }

    fn expecting(&self) -> &'static str {
        "tuple element"
    }
}

// ------------------------------------------------------------------------------------------------
// Maps
// ------------------------------------------------------------------------------------------------

/// A string-keyed map filled member by member.
pub trait MapBuilder: Default + 'static {
    /// Member value type.
    type Value: Decode;

    /// Inserts a member; a repeated key replaces the earlier value.
    fn insert(&mut self, key: String, value: Self::Value);
}

pub(crate) struct MapStart<M>(PhantomData<fn() -> M>);

impl<M: MapBuilder> MapStart<M> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M: MapBuilder> Frame for MapStart<M> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ObjectStart => Ok(Step::Replace(Box::new(MapBody::<M> {
                map: M::default(),
                key: None,
            }))),
            other => Err(mismatch("object", other)),
        }
    }

    fn expecting(&self) -> &'static str {
        "map"
    }
}

struct MapBody<M> {
    map: M,
    key: Option<String>,
}

impl<M: MapBuilder> Frame for MapBody<M> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ObjectKey(key) => {
                self.key = Some(key.clone().into_owned());
                Ok(Step::Push(M::Value::frame()))
            }
            Event::ObjectEnd => Ok(Step::Done(Box::new(mem::take(&mut self.map)))),
            other => Err(mismatch("object key", other)),
        }
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let key = self
            .key
            .take()
            .ok_or(ErrorKind::Internal("map value without a key"))?;
        self.map.insert(key, take::<M::Value>(value)?);
        Ok(Step::Continue)
    }

    fn expecting(&self) -> &'static str {
        "map member"
    }
}

// ------------------------------------------------------------------------------------------------
// Objects
// ------------------------------------------------------------------------------------------------

pub(crate) struct ObjectStart<T>(PhantomData<fn() -> T>);

impl<T: Reflect> ObjectStart<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Reflect> Frame for ObjectStart<T> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ObjectStart => Ok(Step::Replace(Box::new(ObjectBody::<T> {
                value: T::default(),
                seen: vec![false; T::fields().len()],
                pending: Pending::None,
            }))),
            other => Err(mismatch("object", other)),
        }
    }

    fn expecting(&self) -> &'static str {
        T::TYPE_NAME
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Field(usize),
    Skipped,
}

struct ObjectBody<T> {
    value: T,
    seen: Vec<bool>,
    pending: Pending,
}

impl<T: Reflect> Frame for ObjectBody<T> {
    fn event(&mut self, event: &Event<'_>, cx: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ObjectKey(key) => {
                let table = T::field_table()?;
                match table.find(key, cx.options.field_lookup) {
                    Some(index) => {
                        self.pending = Pending::Field(index);
                        Ok(Step::Push((T::fields()[index].frame)()))
                    }
                    None => match cx.options.unknown_keys {
                        UnknownKeys::Ignore => {
                            self.pending = Pending::Skipped;
                            Ok(Step::Push(Box::new(SkipFrame::default())))
                        }
                        UnknownKeys::Reject => Err(ErrorKind::UnknownField(key.clone().into_owned())),
                    },
                }
            }
            Event::ObjectEnd => {
                if cx.options.enforce_required {
                    let missing = T::fields()
                        .iter()
                        .zip(&self.seen)
                        .find(|(field, seen)| field.required && !**seen);
                    if let Some((field, _)) = missing {
                        return Err(ErrorKind::MissingField(field.name));
                    }
                }
                Ok(Step::Done(Box::new(mem::take(&mut self.value))))
            }
            other => Err(mismatch("object key", other)),
        }
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match mem::replace(&mut self.pending, Pending::None) {
            Pending::Field(index) => {
                (T::fields()[index].assign)(&mut self.value, value)?;
                self.seen[index] = true;
            }
            Pending::Skipped => {}
            Pending::None => return Err(ErrorKind::Internal("object value without a key")),
        }
        Ok(Step::Continue)
    }

    fn expecting(&self) -> &'static str {
        T::TYPE_NAME
    }
}

// ------------------------------------------------------------------------------------------------
// Skipping
// ------------------------------------------------------------------------------------------------

/// Consumes one complete value of any shape.
#[derive(Debug, Default)]
pub(crate) struct SkipFrame {
    depth: usize,
}

impl Frame for SkipFrame {
    fn event(&mut self, event: &Event<'_>, cx: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::ArrayStart | Event::ObjectStart => {
                cx.check_nested(self.depth)?;
                self.depth += 1;
            }
            Event::ArrayEnd | Event::ObjectEnd => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or(ErrorKind::Internal("unbalanced end while skipping"))?;
            }
            Event::ObjectKey(_) | Event::Null | Event::Bool(_) | Event::Number(_) | Event::String(_) => {}
        }
        if self.depth == 0 {
            Ok(Step::Done(Box::new(())))
        } else {
            Ok(Step::Continue)
        }
    }

    fn expecting(&self) -> &'static str {
        "any value"
    }
}

// ------------------------------------------------------------------------------------------------
// Wrappers
// ------------------------------------------------------------------------------------------------

pub(crate) struct OptionFrame<T>(PhantomData<fn() -> T>);

impl<T: Decode> OptionFrame<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Decode> Frame for OptionFrame<T> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        match event {
            Event::Null => Ok(Step::Done(Box::new(None::<T>))),
            _ => Ok(Step::Delegate(T::frame())),
        }
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        Ok(Step::Done(Box::new(Some(take::<T>(value)?))))
    }

    fn expecting(&self) -> &'static str {
        "optional value"
    }
}

/// Decodes a `T` and wraps it into an owning or shared pointer `P`.
pub(crate) struct PointerFrame<T, P> {
    wrap: fn(T) -> P,
}

impl<T: Decode, P: 'static> PointerFrame<T, P> {
    pub(crate) fn new(wrap: fn(T) -> P) -> Self {
        Self { wrap }
    }
}

impl<T: Decode, P: 'static> Frame for PointerFrame<T, P> {
    fn event(&mut self, _: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        Ok(Step::Delegate(T::frame()))
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let pointer = (self.wrap)(take::<T>(value)?);
        Ok(Step::Done(Box::new(pointer)))
    }

    fn expecting(&self) -> &'static str {
        "pointee"
    }
}

pub(crate) struct UnionFrame<U> {
    chosen: Option<usize>,
    _union: PhantomData<fn() -> U>,
}

impl<U: Union> UnionFrame<U> {
    pub(crate) fn new() -> Self {
        Self {
            chosen: None,
            _union: PhantomData,
        }
    }
}

impl<U: Union> Frame for UnionFrame<U> {
    fn event(&mut self, event: &Event<'_>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let kind = event.kind();
        let (index, alternative) = U::alternatives()
            .iter()
            .enumerate()
            .find(|(_, alt)| (alt.accepts)(kind))
            .ok_or(ErrorKind::NoMatchingAlternative(U::TYPE_NAME))?;
        self.chosen = Some(index);
        Ok(Step::Delegate((alternative.frame)()))
    }

    fn child(&mut self, value: Box<dyn Any>, _: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let alternative = self
            .chosen
            .and_then(|index| U::alternatives().get(index))
            .ok_or(ErrorKind::Internal("union value without an alternative"))?;
        Ok(Step::Done(Box::new((alternative.wrap)(value)?)))
    }

    fn expecting(&self) -> &'static str {
        U::TYPE_NAME
    }
}

// ------------------------------------------------------------------------------------------------
// Untyped values
// ------------------------------------------------------------------------------------------------

/// Builds a [`Value`](crate::Value) from one complete value's events.
///
/// Skipped and untyped values nest inside a single frame, so their own
/// nesting counts toward the depth limit on top of the frames enclosing them.
#[derive(Default)]
pub(crate) struct ValueFrame {
    builder: ValueBuilder,
}

impl Frame for ValueFrame {
    fn event(&mut self, event: &Event<'_>, cx: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let opens = matches!(event, Event::ArrayStart | Event::ObjectStart);
        if opens {
            cx.check_nested(self.builder.depth())?;
        }
        self.builder.push(event.clone())?;
        if self.builder.is_complete() {
            let value = mem::take(&mut self.builder).finish()?;
            Ok(Step::Done(Box::new(value)))
        } else {
            Ok(Step::Continue)
        }
    }

    fn expecting(&self) -> &'static str {
        "any value"
    }
}
