//! Reflection-driven JSON marshalling.
//!
//! Types describe their fields once with [`reflect!`] (or the
//! [`reflect_enum!`] and [`reflect_union!`] variants), and every engine walks
//! that description:
//!
//! - the streaming decoder ([`from_str`], [`decode_stream`],
//!   [`StreamDecoder`]) builds typed values straight from lexer events,
//!   bounding depth and memory with an explicit frame stack;
//! - the tree codec ([`to_tree`], [`from_tree`]) converts to and from
//!   [`Value`], writing shared `Rc`/`Arc` values once and as `{"$ref": path}`
//!   afterwards;
//! - the schema generator ([`schema_for`]) derives a draft-07 JSON Schema.
//!
//! ```rust
//! use jsonmarshal::{reflect, Bytes};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Upload {
//!     name: String,
//!     data: Bytes,
//!     tags: Vec<String>,
//! }
//!
//! reflect!(Upload {
//!     #[required] name: String,
//!     data: Bytes,
//!     tags: Vec<String>,
//! });
//!
//! let upload: Upload = jsonmarshal::from_str(r#"{"name": "a.bin", "data": "AAEC"}"#).unwrap();
//! assert_eq!(upload.data, Bytes(vec![0, 1, 2]));
//! assert_eq!(
//!     jsonmarshal::to_string(&upload).unwrap(),
//!     r#"{"name":"a.bin","data":"AAEC","tags":[]}"#
//! );
//! ```

mod base64;
mod error;
mod event;
mod lexer;
mod options;
mod path;
mod perfect_hash;
mod time;
mod value;

pub mod reflect;
pub mod schema;
pub mod stream;
pub mod tree;

#[cfg(test)]
mod tests;

pub use base64::{Base64Error, Bytes, decode as decode_base64, encode as encode_base64};
pub use error::{DecodeError, ErrorCategory, ErrorKind, SyntaxError, TreeError};
pub use event::{Event, EventKind, Spanned};
pub use lexer::Lexer;
pub use options::{DecodeOptions, FieldLookup, SchemaOptions, TreeOptions, UnknownKeys};
pub use path::{Path, PathItem, PathItemFrom};
pub use perfect_hash::{FieldTable, PerfectHash, PerfectHashError};
pub use reflect::{Alternative, Field, Reflect, StringEnum, Union};
pub use schema::{JsonSchema, SchemaGenerator, schema_for, schema_for_with};
pub use stream::{
    Decode, Frame, FrameCx, MapBuilder, Scalar, SeqBuilder, Step, StreamDecoder, TupleDecode,
    decode_stream, decode_stream_with, from_str, from_str_with,
};
pub use tree::{
    FromTree, Shared, ToTree, TreeDeserializer, TreeSerializer, from_tree, from_tree_with,
    to_string, to_tree, to_tree_with,
};
pub use value::{Array, Map, Number, REF_KEY, Value, events_of};

#[doc(hidden)]
pub use std::vec;

/// Builds a [`Path`] from a heterogeneous list of keys and indices.
///
/// ```rust
/// use jsonmarshal::{path, PathItem};
///
/// let p = path![0, "foo", 2];
/// assert_eq!(
///     p.items(),
///     [PathItem::Index(0), PathItem::Key("foo".into()), PathItem::Index(2)]
/// );
/// assert_eq!(p.to_string(), "/0/foo/2");
/// ```
#[macro_export]
macro_rules! path {
    ( $( $elem:expr ),* $(,)? ) => {{
        use $crate::PathItemFrom;
        $crate::Path::from($crate::vec![$($crate::PathItem::from_path_item($elem)),*])
    }};
}

/// Everything the three engines need; implemented by every type that
/// [`reflect!`] and the standard impls cover.
pub trait Marshal: ToTree + FromTree + Decode + JsonSchema {}

impl<T: ToTree + FromTree + Decode + JsonSchema> Marshal for T {}
