use quickcheck::{Arbitrary, Gen};

use crate::{Array, Map, Number, Value, reflect};

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct JsonNumber(pub(crate) Number);

impl Arbitrary for JsonNumber {
    fn arbitrary(g: &mut Gen) -> Self {
        let number = match u8::arbitrary(g) % 3 {
            0 => Number::from_u64(u64::arbitrary(g)),
            1 => Number::from_i64(i64::arbitrary(g)),
            _ => loop {
                if let Some(n) = Number::from_f64(f64::arbitrary(g)) {
                    break n;
                }
            },
        };
        Self(number)
    }
}

impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            let choices = if depth == 0 { 4 } else { 6 };
            match usize::arbitrary(g) % choices {
                0 => Value::Null,
                1 => Value::Boolean(bool::arbitrary(g)),
                2 => Value::Number(JsonNumber::arbitrary(g).0),
                3 => Value::String(String::arbitrary(g)),
                4 => {
                    let len = usize::arbitrary(g) % 3;
                    let items: Array = (0..len).map(|_| gen_val(g, depth - 1)).collect();
                    Value::Array(items)
                }
                _ => {
                    let len = usize::arbitrary(g) % 3;
                    let mut map = Map::new();
                    for _ in 0..len {
                        map.insert(String::arbitrary(g), gen_val(g, depth - 1));
                    }
                    Value::Object(map)
                }
            }
        }

        gen_val(g, 3)
    }
}

/// A reflected record covering the common field kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Sample {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) scores: Vec<i64>,
    pub(crate) ratio: f64,
    pub(crate) flag: Option<bool>,
    pub(crate) pair: (i8, char),
    pub(crate) payload: crate::Bytes,
}

reflect!(Sample {
    #[required] id: u32,
    #[required] name: String,
    scores: Vec<i64>,
    ratio: f64,
    flag: Option<bool>,
    pair: (i8, char),
    payload: crate::Bytes,
});

impl Arbitrary for Sample {
    fn arbitrary(g: &mut Gen) -> Self {
        let ratio = loop {
            let x = f64::arbitrary(g);
            if x.is_finite() {
                break x;
            }
        };
        Self {
            id: u32::arbitrary(g),
            name: String::arbitrary(g),
            scores: Vec::arbitrary(g),
            ratio,
            flag: Option::arbitrary(g),
            pair: (i8::arbitrary(g), char::arbitrary(g)),
            payload: crate::Bytes(Vec::arbitrary(g)),
        }
    }
}
