//! [`ToTree`] and [`FromTree`] for the standard library types.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::Hash,
    rc::Rc,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};

use super::{FromTree, Shared, ToTree, TreeDeserializer, TreeSerializer};
use crate::{
    base64::{self, Bytes},
    error::{ErrorKind, TreeError},
    time,
    value::{Array, Map, Number, Value},
};

fn mismatch(de: &TreeDeserializer, expected: &'static str, node: &Value) -> TreeError {
    de.error(ErrorKind::TypeMismatch {
        expected,
        found: node.kind_name(),
    })
}

// ── scalars ────────────────────────────────────────────────────────────────

impl ToTree for bool {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::Boolean(*self))
    }
}

impl FromTree for bool {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        match node {
            Value::Boolean(b) => Ok(*b),
            other => Err(mismatch(de, "boolean", other)),
        }
    }
}

fn integer<T>(node: &Value, de: &TreeDeserializer, target: &'static str) -> Result<T, TreeError>
where
    T: TryFrom<u64> + TryFrom<i64>,
{
    let converted = match node {
        Value::Number(Number::PosInt(u)) => <T as TryFrom<u64>>::try_from(*u).ok(),
        Value::Number(Number::NegInt(i)) => <T as TryFrom<i64>>::try_from(*i).ok(),
        Value::Number(Number::Float(_)) => {
            return Err(de.error(ErrorKind::TypeMismatch {
                expected: "integer",
                found: "float",
            }));
        }
        other => return Err(mismatch(de, "integer", other)),
    };
    converted.ok_or_else(|| {
        de.error(ErrorKind::NumberOutOfRange {
            literal: node.to_string(),
            target,
        })
    })
}

macro_rules! tree_signed {
    ($($t:ty),+) => {$(
        impl ToTree for $t {
            fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
                #[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
                Ok(Value::Number(Number::from_i64(*self as i64)))
            }
        }

        impl FromTree for $t {
            fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
                integer(node, de, stringify!($t))
            }
        }
    )+};
}

macro_rules! tree_unsigned {
    ($($t:ty),+) => {$(
        impl ToTree for $t {
            fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
                #[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
                Ok(Value::Number(Number::from_u64(*self as u64)))
            }
        }

        impl FromTree for $t {
            fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
                integer(node, de, stringify!($t))
            }
        }
    )+};
}

tree_signed!(i8, i16, i32, i64, isize);
tree_unsigned!(u8, u16, u32, u64, usize);

impl ToTree for f64 {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        Number::from_f64(*self)
            .map(Value::Number)
            .ok_or_else(|| ser.error(ErrorKind::NonFiniteFloat(*self)))
    }
}

impl FromTree for f64 {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        match node {
            Value::Number(n) => Ok(n.as_f64()),
            other => Err(mismatch(de, "number", other)),
        }
    }
}

impl ToTree for f32 {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        f64::from(*self).to_tree(ser)
    }
}

impl FromTree for f32 {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let wide = f64::from_tree(node, de)?;
        if wide.abs() > f64::from(f32::MAX) {
            return Err(de.error(ErrorKind::NumberOutOfRange {
                literal: node.to_string(),
                target: "f32",
            }));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(wide as f32)
    }
}

impl ToTree for str {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToTree for String {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(self.clone()))
    }
}

fn text<'v>(node: &'v Value, de: &TreeDeserializer, expected: &'static str) -> Result<&'v str, TreeError> {
    match node {
        Value::String(s) => Ok(s),
        other => Err(mismatch(de, expected, other)),
    }
}

impl FromTree for String {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        text(node, de, "string").map(str::to_string)
    }
}

impl ToTree for char {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl FromTree for char {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let s = text(node, de, "character")?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(de.error(ErrorKind::TypeMismatch {
                expected: "character",
                found: "string",
            })),
        }
    }
}

impl ToTree for Bytes {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(base64::encode(&self.0)))
    }
}

impl FromTree for Bytes {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let s = text(node, de, "base64 string")?;
        base64::decode(s).map(Bytes).map_err(|err| de.error(err))
    }
}

impl ToTree for NaiveDate {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(time::format_date(self)))
    }
}

impl FromTree for NaiveDate {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let s = text(node, de, "date")?;
        time::parse_date(s).map_err(|kind| de.error(kind))
    }
}

impl ToTree for DateTime<Utc> {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(Value::String(time::format_date_time(self)))
    }
}

impl FromTree for DateTime<Utc> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let s = text(node, de, "date-time")?;
        time::parse_date_time(s).map_err(|kind| de.error(kind))
    }
}

impl ToTree for Value {
    fn to_tree(&self, _: &mut TreeSerializer) -> Result<Value, TreeError> {
        Ok(self.clone())
    }
}

impl FromTree for Value {
    fn from_tree(node: &Value, _: &mut TreeDeserializer) -> Result<Self, TreeError> {
        Ok(node.clone())
    }
}

// ── sequences ──────────────────────────────────────────────────────────────

fn seq_to_tree<'a, T, I>(items: I, ser: &mut TreeSerializer) -> Result<Value, TreeError>
where
    T: ToTree + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut array = Array::new();
    for (index, item) in items.into_iter().enumerate() {
        array.push(ser.element(index, |ser| item.to_tree(ser))?);
    }
    Ok(Value::Array(array))
}

/// Deserializes each element of an array node, handing it to `push`.
fn seq_from_tree<T: FromTree>(
    node: &Value,
    de: &mut TreeDeserializer,
    expected: &'static str,
    mut push: impl FnMut(T, usize) -> Result<(), ErrorKind>,
) -> Result<usize, TreeError> {
    let Value::Array(items) = node else {
        return Err(mismatch(de, expected, node));
    };
    for (index, item) in items.iter().enumerate() {
        de.element(index, |de| {
            let value = T::from_tree(item, de)?;
            push(value, index).map_err(|kind| de.error(kind))
        })?;
    }
    Ok(items.len())
}

impl<T: ToTree> ToTree for [T] {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: ToTree> ToTree for Vec<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: FromTree> FromTree for Vec<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = Vec::new();
        seq_from_tree(node, de, "array", |item, _| {
            out.push(item);
            Ok(())
        })?;
        Ok(out)
    }
}

impl<T: ToTree> ToTree for VecDeque<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: FromTree> FromTree for VecDeque<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = VecDeque::new();
        seq_from_tree(node, de, "array", |item, _| {
            out.push_back(item);
            Ok(())
        })?;
        Ok(out)
    }
}

impl<T: ToTree, const N: usize> ToTree for [T; N] {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: FromTree, const N: usize> FromTree for [T; N] {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        match node {
            Value::Array(items) if items.len() != N => {
                return Err(de.error(ErrorKind::ArityMismatch {
                    expected: N,
                    found: items.len(),
                }));
            }
            _ => {}
        }
        let mut out = Vec::with_capacity(N);
        let len = seq_from_tree(node, de, "array", |item, _| {
            out.push(item);
            Ok(())
        })?;
        <[T; N]>::try_from(out).map_err(|_| {
            de.error(ErrorKind::ArityMismatch {
                expected: N,
                found: len,
            })
        })
    }
}

impl<T: ToTree> ToTree for BTreeSet<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: FromTree + Ord> FromTree for BTreeSet<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = BTreeSet::new();
        seq_from_tree(node, de, "array", |item, index| {
            if out.insert(item) {
                Ok(())
            } else {
                Err(ErrorKind::DuplicateElement(index))
            }
        })?;
        Ok(out)
    }
}

impl<T: ToTree> ToTree for HashSet<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        seq_to_tree(self, ser)
    }
}

impl<T: FromTree + Eq + Hash> FromTree for HashSet<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = HashSet::new();
        seq_from_tree(node, de, "array", |item, index| {
            if out.insert(item) {
                Ok(())
            } else {
                Err(ErrorKind::DuplicateElement(index))
            }
        })?;
        Ok(out)
    }
}

// ── tuples ─────────────────────────────────────────────────────────────────

macro_rules! tree_tuple {
    ($len:literal => $($name:ident $index:tt)+) => {
        impl<$($name: ToTree),+> ToTree for ($($name,)+) {
            fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
                Ok(Value::Array(vec![$(
                    ser.element($index, |ser| self.$index.to_tree(ser))?
                ),+]))
            }
        }

        impl<$($name: FromTree),+> FromTree for ($($name,)+) {
            fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
                let items = match node {
                    Value::Array(items) if items.len() == $len => items,
                    Value::Array(items) => {
                        return Err(de.error(ErrorKind::ArityMismatch {
                            expected: $len,
                            found: items.len(),
                        }));
                    }
                    other => return Err(mismatch(de, "array", other)),
                };
                Ok(($(
                    de.element($index, |de| $name::from_tree(&items[$index], de))?,
                )+))
            }
        }
    };
}

tree_tuple!(1 => A 0);
tree_tuple!(2 => A 0 B 1);
tree_tuple!(3 => A 0 B 1 C 2);
tree_tuple!(4 => A 0 B 1 C 2 D 3);
tree_tuple!(5 => A 0 B 1 C 2 D 3 E 4);
tree_tuple!(6 => A 0 B 1 C 2 D 3 E 4 F 5);

// ── maps ───────────────────────────────────────────────────────────────────

fn map_to_tree<'a, V, I>(members: I, ser: &mut TreeSerializer) -> Result<Value, TreeError>
where
    V: ToTree + 'a,
    I: IntoIterator<Item = (&'a String, &'a V)>,
{
    let mut map = Map::new();
    for (key, value) in members {
        let node = ser.member(key, |ser| value.to_tree(ser))?;
        map.insert(key.clone(), node);
    }
    Ok(Value::Object(map))
}

fn map_from_tree<V: FromTree>(
    node: &Value,
    de: &mut TreeDeserializer,
    mut insert: impl FnMut(String, V),
) -> Result<(), TreeError> {
    let Value::Object(map) = node else {
        return Err(mismatch(de, "object", node));
    };
    for (key, member) in map.iter() {
        let value = de.member(key, |de| V::from_tree(member, de))?;
        insert(key.to_string(), value);
    }
    Ok(())
}

impl<V: ToTree> ToTree for BTreeMap<String, V> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        map_to_tree(self, ser)
    }
}

impl<V: FromTree> FromTree for BTreeMap<String, V> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = BTreeMap::new();
        map_from_tree(node, de, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }
}

impl<V: ToTree> ToTree for HashMap<String, V> {
    /// Members are written in key order so the output is deterministic.
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        let mut members: Vec<_> = self.iter().collect();
        members.sort_unstable_by(|a, b| a.0.cmp(b.0));
        map_to_tree(members, ser)
    }
}

impl<V: FromTree> FromTree for HashMap<String, V> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        let mut out = HashMap::new();
        map_from_tree(node, de, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }
}

// ── wrappers ───────────────────────────────────────────────────────────────

impl<T: ToTree> ToTree for Option<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        match self {
            Some(value) => value.to_tree(ser),
            None => Ok(Value::Null),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: FromTree> FromTree for Option<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        match node {
            Value::Null => Ok(None),
            node => T::from_tree(node, de).map(Some),
        }
    }
}

impl<T: ToTree + ?Sized> ToTree for Box<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        (**self).to_tree(ser)
    }
}

impl<T: FromTree> FromTree for Box<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        T::from_tree(node, de).map(Box::new)
    }
}

impl<T: ToTree + ?Sized> ToTree for Rc<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        let address = Rc::as_ptr(self).cast::<()>().addr();
        ser.shared(address, |ser| (**self).to_tree(ser))
    }
}

impl<T: FromTree + 'static> FromTree for Rc<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        if let Some(target) = node.as_reference() {
            let aliased = match de.resolve(target)? {
                Shared::Rc(rc) => rc.downcast::<T>().ok(),
                Shared::Arc(_) => None,
            };
            return aliased
                .ok_or_else(|| de.error(ErrorKind::ReferenceTypeMismatch(target.to_string())));
        }
        let value = Rc::new(T::from_tree(node, de)?);
        de.register(Shared::Rc(value.clone()));
        Ok(value)
    }
}

impl<T: ToTree + ?Sized> ToTree for Arc<T> {
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
        let address = Arc::as_ptr(self).cast::<()>().addr();
        ser.shared(address, |ser| (**self).to_tree(ser))
    }
}

impl<T: FromTree + Send + Sync + 'static> FromTree for Arc<T> {
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError> {
        if let Some(target) = node.as_reference() {
            let aliased = match de.resolve(target)? {
                Shared::Arc(arc) => arc.downcast::<T>().ok(),
                Shared::Rc(_) => None,
            };
            return aliased
                .ok_or_else(|| de.error(ErrorKind::ReferenceTypeMismatch(target.to_string())));
        }
        let value = Arc::new(T::from_tree(node, de)?);
        de.register(Shared::Arc(value.clone()));
        Ok(value)
    }
}
