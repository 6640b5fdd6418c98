//! Standard-alphabet base64 with `=` padding (RFC 4648 §4).
//!
//! Byte fields declared as [`Bytes`] marshal as base64 strings through this
//! codec on every path.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Marks characters outside the alphabet.
const INVALID: u8 = 0xFF;

#[allow(clippy::cast_possible_truncation)]
const DECODE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Why a base64 text could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Base64Error {
    /// The text length is not a multiple of four.
    #[error("length {0} is not a multiple of 4")]
    InvalidLength(usize),
    /// A group of four characters holds a non-alphabet character or
    /// misplaced padding.
    #[error("invalid quadruplet at offset {offset}")]
    InvalidQuadruplet {
        /// Byte offset of the group in the text.
        offset: usize,
    },
}

/// Encodes `bytes`, padding the final group with `=`.
///
/// ```
/// assert_eq!(jsonmarshal::encode_base64(b"f"), "Zg==");
/// assert_eq!(jsonmarshal::encode_base64(b"foobar"), "Zm9vYmFy");
/// ```
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    let mut chunks = bytes.chunks_exact(3);
    for chunk in &mut chunks {
        push_group(&mut out, [chunk[0], chunk[1], chunk[2]], 4);
    }
    match *chunks.remainder() {
        [] => {}
        [a] => {
            push_group(&mut out, [a, 0, 0], 2);
            out.push_str("==");
        }
        [a, b] => {
            push_group(&mut out, [a, b, 0], 3);
            out.push('=');
        }
        _ => unreachable!("chunks_exact(3) leaves at most two bytes"),
    }
    out
}

fn push_group(out: &mut String, group: [u8; 3], chars: usize) {
    let n = (u32::from(group[0]) << 16) | (u32::from(group[1]) << 8) | u32::from(group[2]);
    for i in 0..chars {
        let sextet = (n >> (18 - 6 * i)) & 0x3F;
        out.push(char::from(ALPHABET[sextet as usize]));
    }
}

/// Decodes padded base64 text.
///
/// # Errors
///
/// Fails if the length is not a multiple of four, or if any quadruplet holds
/// a character outside the alphabet or misplaced padding.
///
/// ```
/// assert_eq!(jsonmarshal::decode_base64("Zg==").unwrap(), b"f");
/// assert!(jsonmarshal::decode_base64("AAA").is_err());
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>, Base64Error> {
    let bytes = text.as_bytes();
    if bytes.len() % 4 != 0 {
        return Err(Base64Error::InvalidLength(bytes.len()));
    }
    let Some((body, last)) = bytes.split_last_chunk::<4>() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    for (i, quad) in body.chunks_exact(4).enumerate() {
        let (a, b, c, d) = (
            DECODE[quad[0] as usize],
            DECODE[quad[1] as usize],
            DECODE[quad[2] as usize],
            DECODE[quad[3] as usize],
        );
        // Every valid sextet is below 0x40, so one test covers all four.
        if (a | b | c | d) & 0x80 != 0 {
            return Err(Base64Error::InvalidQuadruplet { offset: i * 4 });
        }
        out.extend_from_slice(&join(a, b, c, d));
    }

    let offset = body.len();
    let invalid = Base64Error::InvalidQuadruplet { offset };
    let pad = match last {
        [_, _, b'=', b'='] => 2,
        [_, _, _, b'='] => 1,
        _ => 0,
    };
    let mut sextets = [0u8; 4];
    for (slot, &ch) in sextets.iter_mut().zip(&last[..4 - pad]) {
        *slot = DECODE[ch as usize];
        if *slot == INVALID {
            return Err(invalid);
        }
    }
    let [a, b, c, d] = sextets;
    let group = join(a, b, c, d);
    out.extend_from_slice(&group[..3 - pad]);
    Ok(out)
}

fn join(a: u8, b: u8, c: u8, d: u8) -> [u8; 3] {
    let n = (u32::from(a) << 18) | (u32::from(b) << 12) | (u32::from(c) << 6) | u32::from(d);
    let [_, x, y, z] = n.to_be_bytes();
    [x, y, z]
}

/// A byte sequence that marshals as a base64 string.
///
/// A bare `Vec<u8>` marshals as an array of numbers; wrap it in `Bytes` to
/// get the compact text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl core::ops::Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}
