#![no_main]
use std::{cell::RefCell, collections::BTreeMap};

use arbitrary::Arbitrary;
use jsonmarshal::{
    Bytes, DecodeOptions, ErrorKind, FieldLookup, Lexer, TreeOptions, UnknownKeys, Value, from_str,
    from_str_with, from_tree, from_tree_with, reflect, reflect_enum, reflect_union, to_string,
    to_tree,
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

const HEADER: usize = 1; // option flags

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

// JSON whitespace, plus a few code points the lexer must reject.
static WS_TABLE: &[&[u8]] = &[
    b" ",
    b"\t",
    b"\n",
    b"\r",
    "\u{00A0}".as_bytes(),
    "\u{2028}".as_bytes(),
    "\u{FEFF}".as_bytes(),
];

// Member names of `Record`, so generated objects hit declared fields.
static KEYS: &[&str] = &[
    "id", "name", "score", "tags", "parent", "extra", "payload", "kind", "ids", "$ref",
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size <= HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);

        let mut prefix = HEADER;
        while prefix < size.max(HEADER + 1) {
            let limit = max_size - prefix;
            if limit == 0 {
                break;
            }
            prefix += append_whitespace(&mut data[prefix..], limit);
            prefix += append_value(&mut data[prefix..], size, max_size - prefix);
        }
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 || rng.random_range(0..4) != 0 {
            return 0;
        }
        let w = WS_TABLE[rng.random_range(0..WS_TABLE.len())];
        let len = w.len().min(limit);
        buf[..len].copy_from_slice(&w[..len]);
        len
    })
}

fn append_value(buf: &mut [u8], size: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    let value = loop {
        let n = with_rng(|rng| rng.random_range(size / 2..=size * 2 + 8));
        let bytes: Vec<u8> = with_rng(|rng| (0..n).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec(&value.0).expect("serializing a generated value");
    let len = serialized.len().min(limit);
    buf[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(serde_json::Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        use serde_json::{Map, Number, Value};

        let value = match u.choose_index(20)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => Value::Number(
                Number::from_f64(u.arbitrary()?).ok_or(arbitrary::Error::IncorrectFormat)?,
            ),
            3 | 4 => Value::Number(u.arbitrary::<u64>()?.into()),
            5 => Value::Number(u.arbitrary::<i64>()?.into()),
            6..=9 => Value::String(u.arbitrary()?),
            10..=13 => {
                let items: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(items.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let members: Vec<(u8, ArbitraryValue)> = u.arbitrary()?;
                let map: Map<String, Value> = members
                    .into_iter()
                    .map(|(k, v)| (KEYS[usize::from(k) % KEYS.len()].to_string(), v.0))
                    .collect();
                Value::Object(map)
            }
        };
        Ok(ArbitraryValue(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Plain,
    Fancy,
}

reflect_enum!(Kind { Plain => "plain", Fancy => "fancy" });

#[derive(Debug, PartialEq)]
enum Id {
    Num(u64),
    Text(String),
}

reflect_union!(Id { Num(u64), Text(String) });

#[derive(Debug, Default, PartialEq)]
struct Record {
    id: u64,
    name: String,
    score: f64,
    tags: Vec<String>,
    parent: Option<Box<Record>>,
    extra: BTreeMap<String, Value>,
    payload: Bytes,
    kind: Option<Kind>,
    ids: Vec<Id>,
}

reflect!(Record {
    id: u64,
    name: String,
    score: f64,
    tags: Vec<String>,
    parent: Option<Box<Record>>,
    extra: BTreeMap<String, Value>,
    payload: Bytes,
    kind: Option<Kind>,
    ids: Vec<Id>,
});

fn options(flags: u8) -> (DecodeOptions, TreeOptions) {
    let field_lookup = match (flags >> 1) & 3 {
        0 => FieldLookup::Auto,
        1 => FieldLookup::Linear,
        _ => FieldLookup::PerfectHash,
    };
    let unknown_keys = if flags & 1 != 0 {
        UnknownKeys::Reject
    } else {
        UnknownKeys::Ignore
    };
    let stream = DecodeOptions {
        max_depth: usize::from(flags >> 3) * 2 + 1,
        max_frame_bytes: if flags & 0x80 != 0 { 512 } else { 64 * 1024 },
        unknown_keys,
        field_lookup,
        ..DecodeOptions::default()
    };
    let tree = TreeOptions {
        unknown_keys,
        field_lookup,
        ..TreeOptions::default()
    };
    (stream, tree)
}

fn decode(data: &[u8]) {
    let Some((&flags, body)) = data.split_first() else {
        return;
    };
    let Ok(text) = core::str::from_utf8(body) else {
        return;
    };
    let (stream_options, tree_options) = options(flags);

    let lexed = Lexer::new(text).collect::<Result<Vec<_>, _>>();
    let parsed = text.parse::<Value>();
    match (&lexed, &parsed) {
        (Ok(_), Ok(_)) | (Err(_), Err(_)) => {}
        (Ok(_), Err(err)) => assert!(
            matches!(err.kind, ErrorKind::InvalidNumber(_)),
            "lexed but failed to build: {err}"
        ),
        (Err(err), Ok(_)) => panic!("built despite lexer error: {err}"),
    }
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        assert!(lexed.is_ok(), "rejected valid JSON: {text:?}");
    }

    if let Ok(value) = &parsed {
        let rendered = value.to_string();
        assert_eq!(rendered.parse::<Value>().as_ref(), Ok(value));
        let _ = from_tree_with::<Record>(value, tree_options);
    }

    if let Ok(record) = from_str_with::<Record>(text, stream_options) {
        let tree = to_tree(&record).expect("decoded records serialize");
        assert_eq!(from_tree::<Record>(&tree).as_ref(), Ok(&record));
        let text = to_string(&record).expect("decoded records serialize");
        assert_eq!(from_str::<Record>(&text).as_ref(), Ok(&record));
    }
}

fuzz_target!(|data: &[u8]| decode(data));
