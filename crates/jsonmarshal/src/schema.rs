//! JSON Schema (draft-07) generation from the reflected field metadata.
//!
//! Reflected objects are written once into a shared `definitions` table and
//! referenced from everywhere else with `{"$ref": "#/definitions/<name>"}`,
//! so recursive and repeated types produce bounded output. The root type is
//! inlined.
//!
//! # Examples
//!
//! ```rust
//! use jsonmarshal::{reflect, schema_for};
//!
//! #[derive(Default)]
//! struct Tag {
//!     name: String,
//! }
//! reflect!(Tag { #[required] name: String });
//!
//! let schema = schema_for::<Vec<Tag>>();
//! assert_eq!(
//!     schema.to_string(),
//!     concat!(
//!         r#"{"$schema":"http://json-schema.org/draft-07/schema#","#,
//!         r##""type":"array","items":{"$ref":"#/definitions/Tag"},"##,
//!         r##""definitions":{"Tag":{"type":"object","properties":{"name":{"type":"string"}},"##,
//!         r#""required":["name"],"additionalProperties":false}}}"#,
//!     )
//! );
//! ```

use core::any::TypeId;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    rc::Rc,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::{
    base64::Bytes,
    options::SchemaOptions,
    reflect::{Reflect, StringEnum, Union},
    value::{Map, Number, Value},
};

/// URI of the meta-schema the output conforms to.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Shared state of one schema generation: the definitions written so far.
#[derive(Debug, Default)]
pub struct SchemaGenerator {
    options: SchemaOptions,
    definitions: Map,
    names: HashMap<TypeId, String>,
}

impl SchemaGenerator {
    /// A generator with no definitions yet.
    #[must_use]
    pub fn new(options: SchemaOptions) -> Self {
        Self {
            options,
            definitions: Map::new(),
            names: HashMap::new(),
        }
    }

    /// Returns a reference to the definition of `T`, writing it with `body`
    /// the first time `T` is seen.
    ///
    /// The definition is reserved before `body` runs, so a type that contains
    /// itself refers to its own entry. A name already taken by another type
    /// gets a numeric suffix.
    pub fn definition<T: ?Sized + 'static>(&mut self, name: &str, body: fn(&mut Self) -> Value) -> Value {
        let id = TypeId::of::<T>();
        if let Some(key) = self.names.get(&id) {
            return Self::reference_to(key);
        }

        let key = self.free_key(name);
        self.names.insert(id, key.clone());
        self.definitions.insert(key.as_str(), Value::Null);
        let schema = body(self);
        self.definitions.insert(key.as_str(), schema);
        debug!(key = key.as_str(), "schema definition written");
        Self::reference_to(&key)
    }

    fn free_key(&self, name: &str) -> String {
        if !self.definitions.contains_key(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name}{n}"))
            .find(|key| !self.definitions.contains_key(key))
            .unwrap_or_else(|| name.to_string())
    }

    fn reference_to(key: &str) -> Value {
        Value::reference(format!("#/definitions/{key}"))
    }

    /// Schema of `T`, by reference for reflected objects.
    pub fn subschema_for<T: JsonSchema + ?Sized>(&mut self) -> Value {
        T::schema(self)
    }

    /// The definitions written so far, in first-use order.
    #[must_use]
    pub fn definitions(&self) -> &Map {
        &self.definitions
    }

    /// Wraps `root` into a complete document.
    #[must_use]
    pub fn into_root_schema(self, root: Value) -> Value {
        let mut document = Map::new();
        if self.options.meta_schema {
            document.insert("$schema", Value::from(DRAFT_07));
        }
        match root {
            Value::Object(members) => {
                for (key, value) in members {
                    document.insert(key, value);
                }
            }
            other => {
                document.insert("allOf", Value::Array(vec![other]));
            }
        }
        if !self.definitions.is_empty() {
            document.insert("definitions", Value::Object(self.definitions));
        }
        Value::Object(document)
    }
}

/// A type with a JSON Schema.
pub trait JsonSchema {
    /// The schema used wherever the type appears.
    fn schema(generator: &mut SchemaGenerator) -> Value;

    /// The schema used when the type is the document root. Reflected objects
    /// write their body here instead of a reference.
    fn inline_schema(generator: &mut SchemaGenerator) -> Value {
        Self::schema(generator)
    }
}

fn object<const N: usize>(members: [(&str, Value); N]) -> Value {
    Value::Object(members.into_iter().collect())
}

fn typed(name: &str) -> Value {
    object([("type", Value::from(name))])
}

fn usize_value(n: usize) -> Value {
    Value::Number(Number::from_u64(n as u64))
}

/// Inline schema of a reflected struct.
#[doc(hidden)]
pub fn object_schema<T: Reflect>(generator: &mut SchemaGenerator) -> Value {
    let fields = T::fields();
    let mut properties = Map::with_capacity(fields.len());
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name, (field.schema)(generator));
        if field.required {
            required.push(Value::from(field.name));
        }
    }

    let mut schema = Map::new();
    schema.insert("type", Value::from("object"));
    schema.insert("properties", Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required", Value::Array(required));
    }
    schema.insert("additionalProperties", Value::Boolean(false));
    Value::Object(schema)
}

/// Schema of a string enum.
#[doc(hidden)]
#[must_use]
pub fn enum_schema<E: StringEnum>() -> Value {
    object([
        ("type", Value::from("string")),
        ("enum", E::NAMES.iter().map(|&name| Value::from(name)).collect::<Vec<_>>().into()),
    ])
}

/// Schema of a union, one `oneOf` entry per alternative.
#[doc(hidden)]
pub fn union_schema<U: Union>(generator: &mut SchemaGenerator) -> Value {
    let alternatives = U::alternatives()
        .iter()
        .map(|alternative| (alternative.schema)(generator))
        .collect::<Vec<_>>();
    object([("oneOf", Value::Array(alternatives))])
}

/// Generates the schema document of `T` with default options.
#[must_use]
pub fn schema_for<T: JsonSchema + ?Sized>() -> Value {
    schema_for_with::<T>(SchemaOptions::default())
}

/// Generates the schema document of `T`: the root schema inlined, followed by
/// the `definitions` it refers to.
#[must_use]
pub fn schema_for_with<T: JsonSchema + ?Sized>(options: SchemaOptions) -> Value {
    let mut generator = SchemaGenerator::new(options);
    let root = T::inline_schema(&mut generator);
    generator.into_root_schema(root)
}

// ── implementations ────────────────────────────────────────────────────────

impl JsonSchema for bool {
    fn schema(_: &mut SchemaGenerator) -> Value {
        typed("boolean")
    }
}

macro_rules! schema_signed {
    ($($t:ty),+) => {$(
        impl JsonSchema for $t {
            #[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
            fn schema(_: &mut SchemaGenerator) -> Value {
                object([
                    ("type", Value::from("integer")),
                    ("minimum", Value::Number(Number::from_i64(<$t>::MIN as i64))),
                    ("maximum", Value::Number(Number::from_i64(<$t>::MAX as i64))),
                ])
            }
        }
    )+};
}

macro_rules! schema_unsigned {
    ($($t:ty),+) => {$(
        impl JsonSchema for $t {
            #[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
            fn schema(_: &mut SchemaGenerator) -> Value {
                object([
                    ("type", Value::from("integer")),
                    ("minimum", Value::Number(Number::from_u64(0))),
                    ("maximum", Value::Number(Number::from_u64(<$t>::MAX as u64))),
                ])
            }
        }
    )+};
}

schema_signed!(i8, i16, i32, i64, isize);
schema_unsigned!(u8, u16, u32, u64, usize);

impl JsonSchema for f32 {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([("type", Value::from("number")), ("format", Value::from("float"))])
    }
}

impl JsonSchema for f64 {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([("type", Value::from("number")), ("format", Value::from("double"))])
    }
}

impl JsonSchema for str {
    fn schema(_: &mut SchemaGenerator) -> Value {
        typed("string")
    }
}

impl JsonSchema for String {
    fn schema(_: &mut SchemaGenerator) -> Value {
        typed("string")
    }
}

impl JsonSchema for char {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([
            ("type", Value::from("string")),
            ("minLength", usize_value(1)),
            ("maxLength", usize_value(1)),
        ])
    }
}

impl JsonSchema for Bytes {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([
            ("type", Value::from("string")),
            ("contentEncoding", Value::from("base64")),
        ])
    }
}

impl JsonSchema for NaiveDate {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([("type", Value::from("string")), ("format", Value::from("date"))])
    }
}

impl JsonSchema for DateTime<Utc> {
    fn schema(_: &mut SchemaGenerator) -> Value {
        object([("type", Value::from("string")), ("format", Value::from("date-time"))])
    }
}

impl JsonSchema for Value {
    fn schema(_: &mut SchemaGenerator) -> Value {
        Value::Object(Map::new())
    }
}

fn array_of(items: Value) -> Map {
    let mut schema = Map::new();
    schema.insert("type", Value::from("array"));
    schema.insert("items", items);
    schema
}

macro_rules! schema_seq {
    ($($ty:ident<T $(: $bound:path)?> => $unique:literal),+) => {$(
        impl<T: JsonSchema $(+ $bound)?> JsonSchema for $ty<T> {
            fn schema(generator: &mut SchemaGenerator) -> Value {
                let mut schema = array_of(T::schema(generator));
                if $unique {
                    schema.insert("uniqueItems", Value::Boolean(true));
                }
                Value::Object(schema)
            }
        }
    )+};
}

schema_seq!(Vec<T> => false, VecDeque<T> => false, BTreeSet<T> => true, HashSet<T> => true);

impl<T: JsonSchema> JsonSchema for [T] {
    fn schema(generator: &mut SchemaGenerator) -> Value {
        Value::Object(array_of(T::schema(generator)))
    }
}

impl<T: JsonSchema, const N: usize> JsonSchema for [T; N] {
    fn schema(generator: &mut SchemaGenerator) -> Value {
        let mut schema = array_of(T::schema(generator));
        schema.insert("minItems", usize_value(N));
        schema.insert("maxItems", usize_value(N));
        Value::Object(schema)
    }
}

macro_rules! schema_tuple {
    ($len:literal => $($name:ident)+) => {
        impl<$($name: JsonSchema),+> JsonSchema for ($($name,)+) {
            fn schema(generator: &mut SchemaGenerator) -> Value {
                let items = vec![$($name::schema(generator)),+];
                let mut schema = array_of(Value::Array(items));
                schema.insert("minItems", usize_value($len));
                schema.insert("maxItems", usize_value($len));
                Value::Object(schema)
            }
        }
    };
}

schema_tuple!(1 => A);
schema_tuple!(2 => A B);
schema_tuple!(3 => A B C);
schema_tuple!(4 => A B C D);
schema_tuple!(5 => A B C D E);
schema_tuple!(6 => A B C D E F);

impl<V: JsonSchema> JsonSchema for BTreeMap<String, V> {
    fn schema(generator: &mut SchemaGenerator) -> Value {
        object([
            ("type", Value::from("object")),
            ("additionalProperties", V::schema(generator)),
        ])
    }
}

impl<V: JsonSchema> JsonSchema for HashMap<String, V> {
    fn schema(generator: &mut SchemaGenerator) -> Value {
        BTreeMap::<String, V>::schema(generator)
    }
}

impl<T: JsonSchema> JsonSchema for Option<T> {
    fn schema(generator: &mut SchemaGenerator) -> Value {
        object([("anyOf", Value::Array(vec![T::schema(generator), typed("null")]))])
    }
}

macro_rules! schema_pointer {
    ($($ptr:ident),+) => {$(
        impl<T: JsonSchema + ?Sized> JsonSchema for $ptr<T> {
            fn schema(generator: &mut SchemaGenerator) -> Value {
                T::schema(generator)
            }

            fn inline_schema(generator: &mut SchemaGenerator) -> Value {
                T::inline_schema(generator)
            }
        }
    )+};
}

schema_pointer!(Box, Rc, Arc);

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{reflect, reflect_enum, reflect_union};

    fn pretty(schema: &Value) -> String {
        serde_json::to_string_pretty(schema).unwrap()
    }

    #[derive(Debug, Default)]
    struct Node {
        name: String,
        children: Vec<Rc<Node>>,
    }
    reflect!(Node {
        #[required] name: String,
        children: Vec<Rc<Node>>,
    });

    #[derive(Debug, Clone, Copy)]
    enum Level {
        Low,
        High,
    }
    reflect_enum!(Level { Low => "low", High => "high" });

    #[derive(Debug)]
    enum Key {
        Id(u16),
        Name(String),
    }
    reflect_union!(Key { Id(u16), Name(String) });

    #[derive(Debug, Default)]
    struct Record {
        key: Option<Key>,
        level: Option<Level>,
        point: (f32, f32),
        digest: [u8; 2],
        blob: Bytes,
        day: Option<NaiveDate>,
        labels: BTreeSet<String>,
    }
    reflect!(Record {
        #[required] key: Option<Key>,
        level: Option<Level>,
        point: (f32, f32),
        digest: [u8; 2],
        blob: Bytes,
        day: Option<NaiveDate>,
        labels: BTreeSet<String>,
    });

    #[test]
    fn recursive_type_refers_to_itself() {
        insta::assert_snapshot!(pretty(&schema_for::<Node>()), @r##"
        {
          "$schema": "http://json-schema.org/draft-07/schema#",
          "type": "object",
          "properties": {
            "name": {
              "type": "string"
            },
            "children": {
              "type": "array",
              "items": {
                "$ref": "#/definitions/Node"
              }
            }
          },
          "required": [
            "name"
          ],
          "additionalProperties": false,
          "definitions": {
            "Node": {
              "type": "object",
              "properties": {
                "name": {
                  "type": "string"
                },
                "children": {
                  "type": "array",
                  "items": {
                    "$ref": "#/definitions/Node"
                  }
                }
              },
              "required": [
                "name"
              ],
              "additionalProperties": false
            }
          }
        }
        "##);
    }

    #[test]
    fn field_kinds() {
        let schema = schema_for_with::<Record>(SchemaOptions { meta_schema: false });
        insta::assert_snapshot!(pretty(&schema), @r##"
        {
          "type": "object",
          "properties": {
            "key": {
              "anyOf": [
                {
                  "oneOf": [
                    {
                      "type": "integer",
                      "minimum": 0,
                      "maximum": 65535
                    },
                    {
                      "type": "string"
                    }
                  ]
                },
                {
                  "type": "null"
                }
              ]
            },
            "level": {
              "anyOf": [
                {
                  "type": "string",
                  "enum": [
                    "low",
                    "high"
                  ]
                },
                {
                  "type": "null"
                }
              ]
            },
            "point": {
              "type": "array",
              "items": [
                {
                  "type": "number",
                  "format": "float"
                },
                {
                  "type": "number",
                  "format": "float"
                }
              ],
              "minItems": 2,
              "maxItems": 2
            },
            "digest": {
              "type": "array",
              "items": {
                "type": "integer",
                "minimum": 0,
                "maximum": 255
              },
              "minItems": 2,
              "maxItems": 2
            },
            "blob": {
              "type": "string",
              "contentEncoding": "base64"
            },
            "day": {
              "anyOf": [
                {
                  "type": "string",
                  "format": "date"
                },
                {
                  "type": "null"
                }
              ]
            },
            "labels": {
              "type": "array",
              "items": {
                "type": "string"
              },
              "uniqueItems": true
            }
          },
          "required": [
            "key"
          ],
          "additionalProperties": false
        }
        "##);
    }

    #[test]
    fn integer_bounds() {
        let schema = schema_for_with::<i64>(SchemaOptions { meta_schema: false });
        assert_eq!(
            schema.to_string(),
            r#"{"type":"integer","minimum":-9223372036854775808,"maximum":9223372036854775807}"#
        );
        let schema = schema_for_with::<u64>(SchemaOptions { meta_schema: false });
        assert_eq!(
            schema.to_string(),
            r#"{"type":"integer","minimum":0,"maximum":18446744073709551615}"#
        );
    }

    mod first {
        #[derive(Default)]
        pub(super) struct Item {
            pub(super) id: u8,
        }
        crate::reflect!(Item { id: u8 });
    }

    mod second {
        #[derive(Default)]
        pub(super) struct Item {
            pub(super) label: String,
        }
        crate::reflect!(Item { label: String });
    }

    #[derive(Default)]
    struct Both {
        a: first::Item,
        b: second::Item,
        c: Vec<first::Item>,
    }
    reflect!(Both { a: first::Item, b: second::Item, c: Vec<first::Item> });

    #[test]
    fn name_collisions_get_a_suffix() {
        let mut generator = SchemaGenerator::default();
        let root = Both::inline_schema(&mut generator);
        let keys: Vec<_> = generator.definitions().keys().collect();
        assert_eq!(keys, ["Item", "Item2"]);
        assert_eq!(
            root.as_object().unwrap().get("properties").unwrap().to_string(),
            concat!(
                r##"{"a":{"$ref":"#/definitions/Item"},"b":{"$ref":"#/definitions/Item2"},"##,
                r##""c":{"type":"array","items":{"$ref":"#/definitions/Item"}}}"##,
            )
        );
    }

    #[test]
    fn primitives_stand_alone() {
        let mut generator = SchemaGenerator::default();
        assert_eq!(generator.subschema_for::<char>().to_string(), r#"{"type":"string","minLength":1,"maxLength":1}"#);
        assert_eq!(generator.subschema_for::<Value>().to_string(), "{}");
        assert_eq!(
            generator.subschema_for::<HashMap<String, bool>>().to_string(),
            r#"{"type":"object","additionalProperties":{"type":"boolean"}}"#
        );
        assert!(generator.definitions().is_empty());
    }
}
