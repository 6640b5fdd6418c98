use std::collections::BTreeSet;

use quickcheck::QuickCheck;

use super::iterations;
use crate::{PerfectHash, decode_base64, encode_base64};

/// Property: decoding an encoding yields the input, and the padding length
/// follows the input length modulo 3.
#[test]
fn base64_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(bytes: Vec<u8>) -> bool {
        let text = encode_base64(&bytes);
        let padding = text.bytes().rev().take_while(|&b| b == b'=').count();
        let expected_padding = [0, 2, 1][bytes.len() % 3];
        text.len() % 4 == 0 && padding == expected_padding && decode_base64(&text) == Ok(bytes)
    }

    QuickCheck::new()
        .tests(iterations())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: every key of a built table maps back to its original index.
#[test]
fn perfect_hash_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(keys: BTreeSet<String>) -> bool {
        let keys: Vec<String> = keys.into_iter().collect();
        let Ok(table) = PerfectHash::build(keys.as_slice()) else {
            return false;
        };
        table.len() == keys.len()
            && keys
                .iter()
                .enumerate()
                .all(|(i, key)| table.lookup(key) == Some(i))
    }

    QuickCheck::new()
        .tests(iterations())
        .quickcheck(prop as fn(BTreeSet<String>) -> bool);
}
