//! Per-type field metadata shared by every marshaller.
//!
//! A reflectable type lists its fields once, in order, as [`Field`]
//! descriptors. Each descriptor holds monomorphized function pointers for the
//! field's tree codec, its streaming frame and its schema, so the engines can
//! walk any reflectable type without knowing it statically.
//!
//! The [`reflect!`](crate::reflect!) macro builds the descriptors from a
//! field list. Types with unusual needs can implement [`Reflect`] by hand and
//! call [`impl_marshal!`](crate::impl_marshal!) to get the engine traits.
//!
//! # Examples
//!
//! ```rust
//! use jsonmarshal::{reflect, Reflect};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: Option<String>,
//! }
//!
//! reflect!(Point {
//!     #[required] x: i32,
//!     #[required] y: i32,
//!     label: Option<String>,
//! });
//!
//! let names: Vec<_> = Point::fields().iter().map(|f| f.name).collect();
//! assert_eq!(names, ["x", "y", "label"]);
//!
//! let p: Point = jsonmarshal::from_str(r#"{"y": 2, "x": 1}"#).unwrap();
//! assert_eq!(p, Point { x: 1, y: 2, label: None });
//! ```

use core::any::Any;

use crate::{
    error::{ErrorKind, TreeError},
    event::EventKind,
    perfect_hash::{FieldTable, PerfectHashError},
    schema::SchemaGenerator,
    stream::{Frame, take},
    tree::{FromTree, ToTree, TreeDeserializer, TreeSerializer},
    value::Value,
};

/// One declared field of a reflectable type `T`.
pub struct Field<T> {
    /// Member name in JSON.
    pub name: &'static str,
    /// Whether decoding fails when the member is missing.
    pub required: bool,
    /// Serializes the field; `Ok(None)` omits the member.
    pub to_tree: fn(&T, &mut TreeSerializer) -> Result<Option<Value>, TreeError>,
    /// Deserializes the member into the field.
    pub from_tree: fn(&mut T, &Value, &mut TreeDeserializer) -> Result<(), TreeError>,
    /// Creates the streaming frame that decodes the member's value.
    pub frame: fn() -> Box<dyn Frame>,
    /// Stores the value produced by `frame` into the field.
    pub assign: fn(&mut T, Box<dyn Any>) -> Result<(), ErrorKind>,
    /// Schema of the member's value.
    pub schema: fn(&mut SchemaGenerator) -> Value,
}

impl<T> core::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A type described by an ordered list of [`Field`]s.
///
/// Decoding starts from `Default::default()` and overwrites the fields that
/// are present.
pub trait Reflect: Default + 'static {
    /// Name of the type, used for schema definitions and error messages.
    const TYPE_NAME: &'static str;

    /// The declared fields, in serialization order.
    fn fields() -> &'static [Field<Self>];

    /// The type's field name table, built on first use.
    ///
    /// Implementations keep the table in a `static` `OnceLock` of their own;
    /// a `static` inside a generic default method would be shared by every
    /// implementing type.
    ///
    /// # Errors
    ///
    /// Fails if two fields share a name.
    fn field_table() -> Result<&'static FieldTable, PerfectHashError>;
}

/// A C-like enum marshalled as one of a fixed set of strings.
pub trait StringEnum: Sized + 'static {
    /// Name of the enum.
    const TYPE_NAME: &'static str;
    /// Every variant's text, in declaration order.
    const NAMES: &'static [&'static str];

    /// The text of this variant.
    fn name(&self) -> &'static str;
    /// The variant whose text is `name`.
    fn from_name(name: &str) -> Option<Self>;
}

/// One alternative of a tagged union.
pub struct Alternative<U> {
    /// Name of the variant.
    pub name: &'static str,
    /// Whether a value of this alternative can start with the event kind.
    pub accepts: fn(EventKind) -> bool,
    /// Creates the streaming frame that decodes this alternative.
    pub frame: fn() -> Box<dyn Frame>,
    /// Wraps the value produced by `frame` into the union.
    pub wrap: fn(Box<dyn Any>) -> Result<U, ErrorKind>,
    /// Deserializes a tree node as this alternative.
    pub from_tree: fn(&Value, &mut TreeDeserializer) -> Result<U, TreeError>,
    /// Schema of this alternative.
    pub schema: fn(&mut SchemaGenerator) -> Value,
}

/// An enum whose variants each wrap one marshallable type. The JSON form is
/// the wrapped value itself, with no tag.
pub trait Union: Sized + 'static {
    /// Name of the union.
    const TYPE_NAME: &'static str;

    /// Alternatives in the order they are tried.
    fn alternatives() -> &'static [Alternative<Self>];
}

// ── helpers for generated code ──────────────────────────────────────────────

/// Serializes one field, omitting absent values.
#[doc(hidden)]
pub fn field_to_tree<V: ToTree + ?Sized>(
    value: &V,
    ser: &mut TreeSerializer,
) -> Result<Option<Value>, TreeError> {
    if value.is_absent() {
        Ok(None)
    } else {
        value.to_tree(ser).map(Some)
    }
}

/// Deserializes one member into its field.
#[doc(hidden)]
pub fn field_from_tree<V: FromTree>(
    slot: &mut V,
    node: &Value,
    de: &mut TreeDeserializer,
) -> Result<(), TreeError> {
    *slot = V::from_tree(node, de)?;
    Ok(())
}

/// The JSON member name of a field declared as `ident`, without the `r#` of
/// a raw identifier.
#[doc(hidden)]
#[must_use]
pub const fn member_name(ident: &'static str) -> &'static str {
    match ident.as_bytes() {
        [b'r', b'#', rest @ ..] => match core::str::from_utf8(rest) {
            Ok(name) => name,
            Err(_) => ident,
        },
        _ => ident,
    }
}

/// Stores a streamed value into its field.
#[doc(hidden)]
pub fn field_assign<V: 'static>(slot: &mut V, value: Box<dyn Any>) -> Result<(), ErrorKind> {
    *slot = take::<V>(value)?;
    Ok(())
}

// ── macros ──────────────────────────────────────────────────────────────────

/// Implements [`Reflect`] and the engine traits for a struct.
///
/// Fields are listed with their types, in serialization order; `#[required]`
/// marks fields that must be present when decoding. The struct must implement
/// `Default`, and every field type must be marshallable.
///
/// A field's member name is its identifier, with the `r#` of a raw identifier
/// dropped. `#[rename = "..."]` picks any other name.
///
/// ```rust
/// use std::rc::Rc;
/// use jsonmarshal::reflect;
///
/// #[derive(Default)]
/// struct Node {
///     name: String,
///     r#type: String,
///     children: Vec<Rc<Node>>,
///     parent_id: Option<u64>,
/// }
///
/// reflect!(Node {
///     #[required] name: String,
///     r#type: String,
///     children: Vec<Rc<Node>>,
///     #[rename = "parentId"] parent_id: Option<u64>,
/// });
///
/// let node: Node = jsonmarshal::from_str(r#"{"name": "a", "type": "leaf", "parentId": 7}"#).unwrap();
/// assert_eq!((node.r#type.as_str(), node.parent_id), ("leaf", Some(7)));
/// ```
#[macro_export]
macro_rules! reflect {
    (@required) => { false };
    (@required required ; $($rest:tt)*) => { true };
    (@required rename = $rename:literal ; $($rest:tt)*) => {
        $crate::reflect!(@required $($rest)*)
    };

    (@name $field:ident ;) => { $crate::reflect::member_name(stringify!($field)) };
    (@name $field:ident ; rename = $rename:literal ; $($rest:tt)*) => { $rename };
    (@name $field:ident ; required ; $($rest:tt)*) => {
        $crate::reflect!(@name $field ; $($rest)*)
    };

    ($name:ident {
        $( $(#[$attr:ident $(= $arg:literal)?])* $field:ident : $fty:ty ),* $(,)?
    }) => {
        impl $crate::Reflect for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::Field<Self>] {
                static FIELDS: &[$crate::Field<$name>] = &[$(
                    $crate::Field {
                        name: $crate::reflect!(@name $field ; $( $attr $(= $arg)? ; )*),
                        required: $crate::reflect!(@required $( $attr $(= $arg)? ; )*),
                        to_tree: |obj, ser| $crate::reflect::field_to_tree::<$fty>(&obj.$field, ser),
                        from_tree: |obj, node, de| {
                            $crate::reflect::field_from_tree::<$fty>(&mut obj.$field, node, de)
                        },
                        frame: <$fty as $crate::Decode>::frame,
                        assign: |obj, value| $crate::reflect::field_assign::<$fty>(&mut obj.$field, value),
                        schema: <$fty as $crate::JsonSchema>::schema,
                    }
                ),*];
                FIELDS
            }

            fn field_table() -> ::core::result::Result<&'static $crate::FieldTable, $crate::PerfectHashError> {
                static TABLE: ::std::sync::OnceLock<
                    ::core::result::Result<$crate::FieldTable, $crate::PerfectHashError>,
                > = ::std::sync::OnceLock::new();
                TABLE
                    .get_or_init(|| {
                        $crate::FieldTable::new(
                            <Self as $crate::Reflect>::fields().iter().map(|f| f.name),
                        )
                    })
                    .as_ref()
                    .map_err(::core::clone::Clone::clone)
            }
        }

        $crate::impl_marshal!($name);
    };
}

/// Implements the engine traits for a type with a hand-written [`Reflect`]
/// implementation.
#[macro_export]
macro_rules! impl_marshal {
    ($name:ident) => {
        impl $crate::ToTree for $name {
            fn to_tree(
                &self,
                ser: &mut $crate::TreeSerializer,
            ) -> ::core::result::Result<$crate::Value, $crate::TreeError> {
                $crate::tree::object_to_tree(self, ser)
            }
        }

        impl $crate::FromTree for $name {
            fn from_tree(
                node: &$crate::Value,
                de: &mut $crate::TreeDeserializer,
            ) -> ::core::result::Result<Self, $crate::TreeError> {
                $crate::tree::object_from_tree(node, de)
            }
        }

        impl $crate::Decode for $name {
            fn frame() -> ::std::boxed::Box<dyn $crate::Frame> {
                $crate::stream::object_frame::<Self>()
            }

            fn accepts(kind: $crate::EventKind) -> bool {
                kind == $crate::EventKind::ObjectStart
            }
        }

        impl $crate::JsonSchema for $name {
            fn schema(generator: &mut $crate::SchemaGenerator) -> $crate::Value {
                generator.definition::<Self>(stringify!($name), $crate::schema::object_schema::<Self>)
            }

            fn inline_schema(generator: &mut $crate::SchemaGenerator) -> $crate::Value {
                $crate::schema::object_schema::<Self>(generator)
            }
        }
    };
}

/// Marshals a C-like enum as a fixed set of strings.
///
/// ```rust
/// use jsonmarshal::reflect_enum;
///
/// #[derive(Debug, PartialEq)]
/// enum Level {
///     Low,
///     High,
/// }
///
/// reflect_enum!(Level { Low => "low", High => "high" });
///
/// assert_eq!(jsonmarshal::to_string(&Level::High).unwrap(), r#""high""#);
/// assert_eq!(jsonmarshal::from_str::<Level>(r#""low""#).unwrap(), Level::Low);
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($name:ident { $( $variant:ident => $text:literal ),+ $(,)? }) => {
        impl $crate::StringEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const NAMES: &'static [&'static str] = &[$($text),+];

            fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    $( $text => ::core::option::Option::Some($name::$variant), )+
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::ToTree for $name {
            fn to_tree(
                &self,
                _: &mut $crate::TreeSerializer,
            ) -> ::core::result::Result<$crate::Value, $crate::TreeError> {
                ::core::result::Result::Ok($crate::Value::from($crate::StringEnum::name(self)))
            }
        }

        impl $crate::FromTree for $name {
            fn from_tree(
                node: &$crate::Value,
                de: &mut $crate::TreeDeserializer,
            ) -> ::core::result::Result<Self, $crate::TreeError> {
                $crate::tree::enum_from_tree(node, de)
            }
        }

        impl $crate::Scalar for $name {
            fn from_event(event: &$crate::Event<'_>) -> ::core::result::Result<Self, $crate::ErrorKind> {
                $crate::stream::enum_from_event(event)
            }

            fn accepts(kind: $crate::EventKind) -> bool {
                kind == $crate::EventKind::String
            }
        }

        impl $crate::Decode for $name {
            fn frame() -> ::std::boxed::Box<dyn $crate::Frame> {
                $crate::stream::scalar_frame::<Self>()
            }

            fn accepts(kind: $crate::EventKind) -> bool {
                kind == $crate::EventKind::String
            }
        }

        impl $crate::JsonSchema for $name {
            fn schema(_: &mut $crate::SchemaGenerator) -> $crate::Value {
                $crate::schema::enum_schema::<Self>()
            }
        }
    };
}

/// Marshals an enum of single-value variants as an untagged union.
///
/// The tree path tries the alternatives in the listed order and keeps the
/// first that deserializes. The streaming path picks the first alternative
/// that can start with the value's first event.
///
/// ```rust
/// use jsonmarshal::{reflect, reflect_union};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Circle {
///     radius: f64,
/// }
/// reflect!(Circle { #[required] radius: f64 });
///
/// #[derive(Debug, PartialEq)]
/// enum Shape {
///     Circle(Circle),
///     Label(String),
/// }
/// reflect_union!(Shape { Circle(Circle), Label(String) });
///
/// let shapes: Vec<Shape> = jsonmarshal::from_str(r#"[{"radius": 1.5}, "dot"]"#).unwrap();
/// assert_eq!(shapes[1], Shape::Label("dot".into()));
/// ```
#[macro_export]
macro_rules! reflect_union {
    ($name:ident { $( $variant:ident ( $alt:ty ) ),+ $(,)? }) => {
        impl $crate::Union for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn alternatives() -> &'static [$crate::Alternative<Self>] {
                static ALTERNATIVES: &[$crate::Alternative<$name>] = &[$(
                    $crate::Alternative {
                        name: stringify!($variant),
                        accepts: <$alt as $crate::Decode>::accepts,
                        frame: <$alt as $crate::Decode>::frame,
                        wrap: |value| $crate::stream::take::<$alt>(value).map($name::$variant),
                        from_tree: |node, de| {
                            <$alt as $crate::FromTree>::from_tree(node, de).map($name::$variant)
                        },
                        schema: <$alt as $crate::JsonSchema>::schema,
                    }
                ),+];
                ALTERNATIVES
            }
        }

        impl $crate::ToTree for $name {
            fn to_tree(
                &self,
                ser: &mut $crate::TreeSerializer,
            ) -> ::core::result::Result<$crate::Value, $crate::TreeError> {
                match self {
                    $( $name::$variant(value) => $crate::ToTree::to_tree(value, ser), )+
                }
            }
        }

        impl $crate::FromTree for $name {
            fn from_tree(
                node: &$crate::Value,
                de: &mut $crate::TreeDeserializer,
            ) -> ::core::result::Result<Self, $crate::TreeError> {
                $crate::tree::union_from_tree(node, de)
            }
        }

        impl $crate::Decode for $name {
            fn frame() -> ::std::boxed::Box<dyn $crate::Frame> {
                $crate::stream::union_frame::<Self>()
            }

            fn accepts(kind: $crate::EventKind) -> bool {
                <Self as $crate::Union>::alternatives()
                    .iter()
                    .any(|alt| (alt.accepts)(kind))
            }
        }

        impl $crate::JsonSchema for $name {
            fn schema(generator: &mut $crate::SchemaGenerator) -> $crate::Value {
                $crate::schema::union_schema::<Self>(generator)
            }
        }
    };
}
