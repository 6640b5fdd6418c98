//! Conversion between typed values and [`Value`] trees.
//!
//! Serialization walks a value and writes a tree node per value, tracking the
//! current [`Path`](crate::Path) for error reporting and for naming shared
//! values: an `Rc` or `Arc` allocation is written in full at its first
//! occurrence (in document order) and as `{"$ref": "<path>"}` at every later
//! one. Deserialization mirrors this, aliasing every `$ref` to the value
//! already built at its path.
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use jsonmarshal::{reflect, Value};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Leaf {
//!     value: String,
//! }
//! reflect!(Leaf { value: String });
//!
//! #[derive(Debug, Default)]
//! struct Doc {
//!     outer: Rc<Leaf>,
//!     inner: Vec<Rc<Leaf>>,
//! }
//! reflect!(Doc { outer: Rc<Leaf>, inner: Vec<Rc<Leaf>> });
//!
//! let node: Value = r#"{"outer":{"value":"string"},"inner":[{"$ref":"/outer"}]}"#
//!     .parse()
//!     .unwrap();
//! let doc: Doc = jsonmarshal::from_tree(&node).unwrap();
//! assert!(Rc::ptr_eq(&doc.outer, &doc.inner[0]));
//! assert_eq!(jsonmarshal::to_tree(&doc).unwrap(), node);
//! ```

mod de;
mod impls;
mod refs;
mod ser;

use tracing::{debug, trace};

pub use self::{de::TreeDeserializer, refs::Shared, ser::TreeSerializer};
use crate::{
    error::{ErrorKind, TreeError},
    options::{TreeOptions, UnknownKeys},
    reflect::{Reflect, StringEnum, Union},
    value::{Map, Value},
};

/// A type that can be written as a [`Value`] tree.
pub trait ToTree {
    /// # Errors
    ///
    /// Fails if the value has no JSON form, e.g. a non-finite float.
    fn to_tree(&self, ser: &mut TreeSerializer) -> Result<Value, TreeError>;

    /// Whether an object field holding this value is left out entirely.
    fn is_absent(&self) -> bool {
        false
    }
}

/// A type that can be read from a [`Value`] tree.
pub trait FromTree: Sized {
    /// # Errors
    ///
    /// Fails if the node does not describe a value of this type.
    fn from_tree(node: &Value, de: &mut TreeDeserializer) -> Result<Self, TreeError>;
}

// ------------------------------------------------------------------------------------------------
// Reflected types
// ------------------------------------------------------------------------------------------------

/// Writes every declared field in order, leaving out absent ones.
///
/// # Errors
///
/// Fails with the first failing field's error.
pub fn object_to_tree<T: Reflect>(value: &T, ser: &mut TreeSerializer) -> Result<Value, TreeError> {
    let fields = T::fields();
    let mut map = Map::with_capacity(fields.len());
    for field in fields {
        if let Some(node) = ser.member(field.name, |ser| (field.to_tree)(value, ser))? {
            map.insert(field.name, node);
        }
    }
    Ok(Value::Object(map))
}

/// Reads an object member by member into `T::default()`.
///
/// # Errors
///
/// Fails if `node` is not an object, with the first failing member's error,
/// on an unknown member when those are rejected, and on a missing required
/// field when those are enforced.
pub fn object_from_tree<T: Reflect>(node: &Value, de: &mut TreeDeserializer) -> Result<T, TreeError> {
    let Value::Object(map) = node else {
        return Err(de.error(ErrorKind::TypeMismatch {
            expected: "object",
            found: node.kind_name(),
        }));
    };
    let table = T::field_table().map_err(|err| de.error(err))?;
    let fields = T::fields();
    let options = *de.options();

    let mut value = T::default();
    let mut seen = vec![false; fields.len()];
    for (key, member) in map.iter() {
        match table.find(key, options.field_lookup) {
            Some(index) => {
                de.member(key, |de| (fields[index].from_tree)(&mut value, member, de))?;
                seen[index] = true;
            }
            None if options.unknown_keys == UnknownKeys::Reject => {
                return de.member(key, |de| Err(de.error(ErrorKind::UnknownField(key.to_string()))));
            }
            None => trace!(key, type_name = T::TYPE_NAME, "unknown member skipped"),
        }
    }

    if options.enforce_required {
        let missing = fields
            .iter()
            .zip(&seen)
            .find(|(field, seen)| field.required && !**seen);
        if let Some((field, _)) = missing {
            return Err(de.error(ErrorKind::MissingField(field.name)));
        }
    }
    Ok(value)
}

/// Reads a string enum from a string node.
#[doc(hidden)]
pub fn enum_from_tree<E: StringEnum>(node: &Value, de: &mut TreeDeserializer) -> Result<E, TreeError> {
    let Value::String(name) = node else {
        return Err(de.error(ErrorKind::TypeMismatch {
            expected: "string",
            found: node.kind_name(),
        }));
    };
    E::from_name(name).ok_or_else(|| {
        de.error(ErrorKind::UnknownVariant {
            variant: name.clone(),
            type_name: E::TYPE_NAME,
        })
    })
}

/// Tries each alternative in order and keeps the first that deserializes.
/// Shared values registered by a rejected alternative are forgotten.
///
/// # Errors
///
/// Fails with [`ErrorKind::NoMatchingAlternative`] if every alternative
/// fails.
pub fn union_from_tree<U: Union>(node: &Value, de: &mut TreeDeserializer) -> Result<U, TreeError> {
    for alternative in U::alternatives() {
        let mark = de.checkpoint();
        match (alternative.from_tree)(node, de) {
            Ok(value) => return Ok(value),
            Err(err) => {
                trace!(alternative = alternative.name, %err, "union alternative rejected");
                de.rollback(mark);
            }
        }
    }
    Err(de.error(ErrorKind::NoMatchingAlternative(U::TYPE_NAME)))
}

// ------------------------------------------------------------------------------------------------
// Entry points
// ------------------------------------------------------------------------------------------------

/// Serializes `value` with default options.
///
/// # Errors
///
/// See [`to_tree_with`].
pub fn to_tree<T: ToTree + ?Sized>(value: &T) -> Result<Value, TreeError> {
    to_tree_with(value, TreeOptions::default())
}

/// Serializes `value` into a [`Value`] tree.
///
/// # Errors
///
/// Fails on values without a JSON form and when the depth limit is
/// exceeded; the error carries the path of the offending node.
pub fn to_tree_with<T: ToTree + ?Sized>(value: &T, options: TreeOptions) -> Result<Value, TreeError> {
    let mut ser = TreeSerializer::new(options);
    value.to_tree(&mut ser).inspect_err(|err| debug!(%err, "tree serialization failed"))
}

/// Deserializes a `T` with default options.
///
/// # Errors
///
/// See [`from_tree_with`].
pub fn from_tree<T: FromTree>(node: &Value) -> Result<T, TreeError> {
    from_tree_with(node, TreeOptions::default())
}

/// Deserializes a `T` from a [`Value`] tree, resolving `$ref` objects read
/// into shared pointers.
///
/// # Errors
///
/// Fails when the tree does not describe a `T`, on unresolvable references,
/// and when the depth limit is exceeded; the error carries the path of the
/// offending node.
pub fn from_tree_with<T: FromTree>(node: &Value, options: TreeOptions) -> Result<T, TreeError> {
    let mut de = TreeDeserializer::new(options);
    T::from_tree(node, &mut de).inspect_err(|err| debug!(%err, "tree deserialization failed"))
}

/// Serializes `value` to compact JSON text.
///
/// # Errors
///
/// See [`to_tree_with`].
pub fn to_string<T: ToTree + ?Sized>(value: &T) -> Result<String, TreeError> {
    to_tree(value).map(|node| node.to_string())
}

#[cfg(test)]
mod tests;
