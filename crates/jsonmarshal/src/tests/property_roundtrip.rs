use quickcheck::QuickCheck;

use super::{arbitrary::Sample, iterations};
use crate::{Value, decode_stream, events_of, from_str, from_tree, to_string, to_tree};

/// Property: rendering a value and parsing the text back is lossless, and
/// `serde_json` accepts the text as a document of the same shape.
#[test]
fn value_text_roundtrip_quickcheck() {
    fn same_shape(ours: &Value, theirs: &serde_json::Value) -> bool {
        match (ours, theirs) {
            (Value::Null, serde_json::Value::Null) | (Value::Number(_), serde_json::Value::Number(_)) => true,
            (Value::Boolean(a), serde_json::Value::Bool(b)) => a == b,
            (Value::String(a), serde_json::Value::String(b)) => a == b,
            (Value::Array(a), serde_json::Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
            }
            (Value::Object(a), serde_json::Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && same_shape(va, vb))
            }
            _ => false,
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value) -> bool {
        let text = value.to_string();
        let Ok(parsed) = text.parse::<Value>() else {
            return false;
        };
        let Ok(theirs) = serde_json::from_str::<serde_json::Value>(&text) else {
            return false;
        };
        parsed == value && same_shape(&value, &theirs)
    }

    QuickCheck::new()
        .tests(iterations())
        .quickcheck(prop as fn(Value) -> bool);
}

/// Property: replaying a value's events through the streaming decoder
/// rebuilds it.
#[test]
fn value_events_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value) -> bool {
        decode_stream::<Value, _>(events_of(&value).into_iter().map(Ok)).is_ok_and(|v| v == value)
    }

    QuickCheck::new()
        .tests(iterations())
        .quickcheck(prop as fn(Value) -> bool);
}

/// Property: a reflected record survives both the tree path and the text
/// path, and the two paths agree.
#[test]
fn reflected_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(sample: Sample) -> bool {
        let Ok(tree) = to_tree(&sample) else {
            return false;
        };
        let via_tree = from_tree::<Sample>(&tree).ok();
        let via_text = to_string(&sample).ok().and_then(|text| from_str::<Sample>(&text).ok());
        via_tree.as_ref() == Some(&sample) && via_text.as_ref() == Some(&sample)
    }

    QuickCheck::new()
        .tests(iterations())
        .quickcheck(prop as fn(Sample) -> bool);
}
