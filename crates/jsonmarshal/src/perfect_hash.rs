//! Minimal perfect hashing for fixed key sets.
//!
//! The construction is the two-level "hash, displace" scheme: keys are first
//! split into `n` buckets by an unseeded hash, then every bucket gets a
//! second-level seed that scatters its members into free slots of an
//! `n`-slot table. Buckets with a single member skip the search and record
//! their slot directly, with the top bit set to tell the two cases apart.
//!
//! Lookups cost two hashes and two array reads and never allocate. A lookup
//! of a key outside the set returns *some* index; callers compare the key at
//! that index before trusting it (see [`FieldTable`]).

use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use crate::options::FieldLookup;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;
/// Seeds with this bit set mark single-member buckets.
const DIRECT_SLOT: u32 = 0x8000_0000;

/// Why a table could not be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerfectHashError {
    /// The same key occurs twice in the set.
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    /// No displacement seed separates the keys of one bucket.
    #[error("no seed separates a bucket of {0} keys")]
    SeedsExhausted(usize),
}

/// FNV-1a over the seed's bytes and then `key`, finished with the murmur3
/// finalizer so that every output bit depends on every input bit. Plain FNV
/// keeps the low bits of its state a function of the low input bits only,
/// which `% n` would expose for power-of-two `n`.
fn hash(key: &str, seed: u32) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in seed.to_le_bytes().iter().chain(key.as_bytes()) {
        h = (h ^ u32::from(b)).wrapping_mul(FNV_PRIME);
    }
    fmix32(h)
}

fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

fn slot_of(key: &str, seed: u32, n: usize) -> usize {
    hash(key, seed) as usize % n
}

/// A built table mapping each key of its set to the key's original index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerfectHash {
    /// Per bucket: a displacement seed, or `!slot` for single-member buckets.
    seeds: Box<[u32]>,
    index_map: Box<[usize]>,
}

impl PerfectHash {
    /// Builds a table for `keys`.
    ///
    /// Construction may take quadratic time in the worst case. The seed
    /// search is bounded by the seeds that fit below the direct-slot bit.
    ///
    /// # Errors
    ///
    /// Returns [`PerfectHashError::DuplicateKey`] if a key occurs twice, and
    /// [`PerfectHashError::SeedsExhausted`] if no seed separates a bucket.
    pub fn build<S: AsRef<str>>(keys: &[S]) -> Result<Self, PerfectHashError> {
        let n = keys.len();
        if n == 0 {
            return Ok(Self::default());
        }

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, key) in keys.iter().enumerate() {
            buckets[slot_of(key.as_ref(), 0, n)].push(i);
        }
        for bucket in &buckets {
            for (j, &a) in bucket.iter().enumerate() {
                if let Some(&dup) = bucket[j + 1..]
                    .iter()
                    .find(|&&b| keys[a].as_ref() == keys[b].as_ref())
                {
                    return Err(PerfectHashError::DuplicateKey(keys[dup].as_ref().to_string()));
                }
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&b| core::cmp::Reverse(buckets[b].len()));

        let mut seeds = vec![0u32; n];
        let mut index_map = vec![usize::MAX; n];
        let mut taken = vec![false; n];
        let mut scratch = Vec::new();
        let mut singletons = Vec::new();

        for &b in &order {
            let bucket = &buckets[b];
            match bucket.len() {
                0 => break,
                1 => singletons.push(b),
                _ => {
                    let mut d = 1u32;
                    'search: loop {
                        scratch.clear();
                        for &k in bucket {
                            let slot = slot_of(keys[k].as_ref(), d, n);
                            if taken[slot] || scratch.contains(&slot) {
                                d += 1;
                                if d & DIRECT_SLOT != 0 {
                                    return Err(PerfectHashError::SeedsExhausted(bucket.len()));
                                }
                                continue 'search;
                            }
                            scratch.push(slot);
                        }
                        break;
                    }
                    seeds[b] = d;
                    for (&k, &slot) in bucket.iter().zip(&scratch) {
                        taken[slot] = true;
                        index_map[slot] = k;
                    }
                }
            }
        }

        let mut free = (0..n).filter(|&s| !taken[s]);
        for b in singletons {
            let Some(slot) = free.next() else {
                unreachable!("n keys always fit n slots");
            };
            #[allow(clippy::cast_possible_truncation)]
            {
                seeds[b] = !(slot as u32);
            }
            index_map[slot] = buckets[b][0];
        }

        debug!(keys = n, "built perfect hash table");
        Ok(Self {
            seeds: seeds.into_boxed_slice(),
            index_map: index_map.into_boxed_slice(),
        })
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    /// Returns the original index of `key` if it belongs to the set, or an
    /// arbitrary valid index if it does not. `None` only for an empty table.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<usize> {
        let n = self.seeds.len();
        if n == 0 {
            return None;
        }
        let d = self.seeds[slot_of(key, 0, n)];
        let slot = if d & DIRECT_SLOT != 0 {
            (!d) as usize
        } else {
            slot_of(key, d, n)
        };
        Some(self.index_map[slot])
    }
}

/// The field names of one reflectable type and, once a hashed lookup asks
/// for it, their perfect hash.
#[derive(Debug, Clone)]
pub struct FieldTable {
    names: Box<[&'static str]>,
    hash: OnceLock<Option<PerfectHash>>,
}

impl FieldTable {
    /// Collects the names of a type's fields, in declaration order.
    ///
    /// # Errors
    ///
    /// Fails if two fields share a name.
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Result<Self, PerfectHashError> {
        let names: Box<[&'static str]> = names.into_iter().collect();
        let mut sorted = names.to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(PerfectHashError::DuplicateKey(pair[0].to_string()));
        }
        Ok(Self {
            names,
            hash: OnceLock::new(),
        })
    }

    /// The field names, in declaration order.
    #[must_use]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// The perfect hash of the names, built on first use. `None` if it
    /// cannot be built, in which case lookups scan linearly.
    fn hashed(&self) -> Option<&PerfectHash> {
        self.hash
            .get_or_init(|| {
                PerfectHash::build(&self.names[..])
                    .inspect_err(|err| debug!(%err, "perfect hash unavailable, scanning field names"))
                    .ok()
            })
            .as_ref()
    }

    /// Index of the field called `key`, verified against the stored name.
    #[must_use]
    pub fn find(&self, key: &str, strategy: FieldLookup) -> Option<usize> {
        let hashed = match strategy {
            FieldLookup::Auto => self.names.len() >= FieldLookup::AUTO_THRESHOLD,
            FieldLookup::Linear => false,
            FieldLookup::PerfectHash => true,
        };
        if let Some(table) = hashed.then(|| self.hashed()).flatten() {
            return table
                .lookup(key)
                .filter(|&i| self.names.get(i) == Some(&key));
        }
        self.names.iter().position(|&name| name == key)
    }
}
