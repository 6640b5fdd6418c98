//! [`Decode`] for the standard library types.

use core::any::Any;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::Hash,
    rc::Rc,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};

use super::{
    Decode,
    frame::{Frame, take},
    frames::{
        MapBuilder, MapStart, OptionFrame, PointerFrame, Scalar, ScalarFrame, SeqBuilder, SeqStart,
        TupleDecode, TupleStart, ValueFrame, mismatch,
    },
};
use crate::{
    base64::{self, Bytes},
    error::ErrorKind,
    event::{Event, EventKind},
    time,
    value::Value,
};

// ── scalars ────────────────────────────────────────────────────────────────

macro_rules! decode_scalar {
    ($($t:ty),+ $(,)?) => {$(
        impl Decode for $t {
            fn frame() -> Box<dyn Frame> {
                Box::new(ScalarFrame::<Self>::new())
            }

            fn accepts(kind: EventKind) -> bool {
                <Self as Scalar>::accepts(kind)
            }
        }
    )+};
}

impl Scalar for bool {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        match event {
            Event::Bool(b) => Ok(*b),
            other => Err(mismatch("boolean", other)),
        }
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::Bool
    }
}

fn integer<T: TryFrom<i128>>(event: &Event<'_>, target: &'static str) -> Result<T, ErrorKind> {
    let Event::Number(literal) = event else {
        return Err(mismatch("integer", event));
    };
    if literal.contains(['.', 'e', 'E']) {
        return Err(ErrorKind::TypeMismatch {
            expected: "integer",
            found: "float",
        });
    }
    literal
        .parse::<i128>()
        .ok()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ErrorKind::NumberOutOfRange {
            literal: literal.to_string(),
            target,
        })
}

macro_rules! scalar_integer {
    ($($t:ty),+) => {$(
        impl Scalar for $t {
            fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
                integer(event, stringify!($t))
            }

            fn accepts(kind: EventKind) -> bool {
                kind == EventKind::Number
            }
        }
    )+};
}

scalar_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Scalar for f64 {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let Event::Number(literal) = event else {
            return Err(mismatch("number", event));
        };
        literal
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| ErrorKind::NumberOutOfRange {
                literal: literal.to_string(),
                target: "f64",
            })
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::Number
    }
}

impl Scalar for f32 {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let Event::Number(literal) = event else {
            return Err(mismatch("number", event));
        };
        literal
            .parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| ErrorKind::NumberOutOfRange {
                literal: literal.to_string(),
                target: "f32",
            })
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::Number
    }
}

fn text<'e>(event: &'e Event<'_>, expected: &'static str) -> Result<&'e str, ErrorKind> {
    match event {
        Event::String(s) => Ok(&**s),
        other => Err(mismatch(expected, other)),
    }
}

impl Scalar for String {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        text(event, "string").map(str::to_string)
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::String
    }
}

impl Scalar for char {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let s = text(event, "character")?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ErrorKind::TypeMismatch {
                expected: "character",
                found: "string",
            }),
        }
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::String
    }
}

impl Scalar for Bytes {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let s = text(event, "base64 string")?;
        Ok(Bytes(base64::decode(s)?))
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::String
    }
}

impl Scalar for NaiveDate {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let s = text(event, "date")?;
        time::parse_date(s)
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::String
    }
}

impl Scalar for DateTime<Utc> {
    fn from_event(event: &Event<'_>) -> Result<Self, ErrorKind> {
        let s = text(event, "date-time")?;
        time::parse_date_time(s)
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::String
    }
}

decode_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    char,
    Bytes,
    NaiveDate,
    DateTime<Utc>,
);

impl Decode for Value {
    fn frame() -> Box<dyn Frame> {
        Box::new(ValueFrame::default())
    }

    fn accepts(kind: EventKind) -> bool {
        !matches!(
            kind,
            EventKind::ObjectKey | EventKind::ObjectEnd | EventKind::ArrayEnd
        )
    }
}

// ── sequences ──────────────────────────────────────────────────────────────

impl<T: Decode> SeqBuilder for Vec<T> {
    type Item = T;
    type Output = Self;

    fn push(&mut self, item: T, _: usize) -> Result<(), ErrorKind> {
        Vec::push(self, item);
        Ok(())
    }

    fn finish(self, _: usize) -> Result<Self, ErrorKind> {
        Ok(self)
    }
}

impl<T: Decode> SeqBuilder for VecDeque<T> {
    type Item = T;
    type Output = Self;

    fn push(&mut self, item: T, _: usize) -> Result<(), ErrorKind> {
        self.push_back(item);
        Ok(())
    }

    fn finish(self, _: usize) -> Result<Self, ErrorKind> {
        Ok(self)
    }
}

impl<T: Decode + Ord> SeqBuilder for BTreeSet<T> {
    type Item = T;
    type Output = Self;

    fn push(&mut self, item: T, index: usize) -> Result<(), ErrorKind> {
        if self.insert(item) {
            Ok(())
        } else {
            Err(ErrorKind::DuplicateElement(index))
        }
    }

    fn finish(self, _: usize) -> Result<Self, ErrorKind> {
        Ok(self)
    }
}

impl<T: Decode + Eq + Hash> SeqBuilder for HashSet<T> {
    type Item = T;
    type Output = Self;

    fn push(&mut self, item: T, index: usize) -> Result<(), ErrorKind> {
        if self.insert(item) {
            Ok(())
        } else {
            Err(ErrorKind::DuplicateElement(index))
        }
    }

    fn finish(self, _: usize) -> Result<Self, ErrorKind> {
        Ok(self)
    }
}

/// Builder for `[T; N]`.
pub(crate) struct FixedArray<T, const N: usize>(Vec<T>);

impl<T, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self(Vec::with_capacity(N))
    }
}

impl<T: Decode, const N: usize> SeqBuilder for FixedArray<T, N> {
    type Item = T;
    type Output = [T; N];

    fn admit(&self, index: usize) -> Result<(), ErrorKind> {
        if index < N {
            Ok(())
        } else {
            Err(ErrorKind::ArityMismatch {
                expected: N,
                found: index + 1,
            })
        }
    }

    fn push(&mut self, item: T, _: usize) -> Result<(), ErrorKind> {
        self.0.push(item);
        Ok(())
    }

    fn finish(self, len: usize) -> Result<[T; N], ErrorKind> {
        <[T; N]>::try_from(self.0).map_err(|_| ErrorKind::ArityMismatch { expected: N, found: len })
    }
}

macro_rules! decode_seq {
    ($($ty:ident<T $(: $bound:path)?>),+) => {$(
        impl<T: Decode $(+ $bound)?> Decode for $ty<T> {
            fn frame() -> Box<dyn Frame> {
                Box::new(SeqStart::<Self>::new())
            }

            fn accepts(kind: EventKind) -> bool {
                kind == EventKind::ArrayStart
            }
        }
    )+};
}

decode_seq!(Vec<T>, VecDeque<T>, BTreeSet<T: Ord>);

impl<T: Decode + Eq + Hash> Decode for HashSet<T> {
    fn frame() -> Box<dyn Frame> {
        Box::new(SeqStart::<Self>::new())
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::ArrayStart
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn frame() -> Box<dyn Frame> {
        Box::new(SeqStart::<FixedArray<T, N>>::new())
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::ArrayStart
    }
}

// ── tuples ─────────────────────────────────────────────────────────────────

macro_rules! decode_tuple {
    ($len:literal => $($name:ident)+) => {
        impl<$($name: Decode),+> TupleDecode for ($($name,)+) {
            const ARITY: usize = $len;

            fn frame_at(index: usize) -> Box<dyn Frame> {
                let frames: [fn() -> Box<dyn Frame>; $len] = [$(<$name as Decode>::frame),+];
                frames[index]()
            }

            fn assemble(parts: Vec<Box<dyn Any>>) -> Result<Self, ErrorKind> {
                let mut parts = parts.into_iter();
                Ok(($(
                    take::<$name>(parts.next().ok_or(ErrorKind::Internal("missing tuple element"))?)?,
                )+))
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn frame() -> Box<dyn Frame> {
                Box::new(TupleStart::<Self>::new())
            }

            fn accepts(kind: EventKind) -> bool {
                kind == EventKind::ArrayStart
            }
        }
    };
}

decode_tuple!(1 => A);
decode_tuple!(2 => A B);
decode_tuple!(3 => A B C);
decode_tuple!(4 => A B C D);
decode_tuple!(5 => A B C D E);
decode_tuple!(6 => A B C D E F);

// ── maps ───────────────────────────────────────────────────────────────────

impl<V: Decode> MapBuilder for BTreeMap<String, V> {
    type Value = V;

    fn insert(&mut self, key: String, value: V) {
        BTreeMap::insert(self, key, value);
    }
}

impl<V: Decode> MapBuilder for HashMap<String, V> {
    type Value = V;

    fn insert(&mut self, key: String, value: V) {
        HashMap::insert(self, key, value);
    }
}

impl<V: Decode> Decode for BTreeMap<String, V> {
    fn frame() -> Box<dyn Frame> {
        Box::new(MapStart::<Self>::new())
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::ObjectStart
    }
}

impl<V: Decode> Decode for HashMap<String, V> {
    fn frame() -> Box<dyn Frame> {
        Box::new(MapStart::<Self>::new())
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::ObjectStart
    }
}

// ── wrappers ───────────────────────────────────────────────────────────────

impl<T: Decode> Decode for Option<T> {
    fn frame() -> Box<dyn Frame> {
        Box::new(OptionFrame::<T>::new())
    }

    fn accepts(kind: EventKind) -> bool {
        kind == EventKind::Null || T::accepts(kind)
    }
}

macro_rules! decode_pointer {
    ($($ptr:ident),+) => {$(
        impl<T: Decode> Decode for $ptr<T> {
            fn frame() -> Box<dyn Frame> {
                Box::new(PointerFrame::<T, Self>::new($ptr::new))
            }

            fn accepts(kind: EventKind) -> bool {
                T::accepts(kind)
            }
        }
    )+};
}

decode_pointer!(Box, Rc, Arc);
