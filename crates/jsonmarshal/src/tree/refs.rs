//! Reference tables for shared substructure.
//!
//! While serializing, every `Rc`/`Arc` allocation is remembered together
//! with the path where it was first written; later occurrences become
//! `{"$ref": "<path>"}`. While deserializing, every freshly built shared
//! value is registered under its path so that later `$ref` objects can alias
//! it.

use core::any::Any;
use std::{collections::HashMap, rc::Rc, sync::Arc};

/// A shared value registered on the read side.
#[derive(Clone)]
pub enum Shared {
    /// A single-threaded shared value.
    Rc(Rc<dyn Any>),
    /// A thread-safe shared value.
    Arc(Arc<dyn Any + Send + Sync>),
}

impl core::fmt::Debug for Shared {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Rc(_) => f.write_str("Shared::Rc"),
            Self::Arc(_) => f.write_str("Shared::Arc"),
        }
    }
}

/// Allocation address to first path, for one serialization.
#[derive(Debug, Default)]
pub(crate) struct WriteRefs {
    first_seen: HashMap<usize, String>,
}

impl WriteRefs {
    pub(crate) fn get(&self, address: usize) -> Option<&str> {
        self.first_seen.get(&address).map(String::as_str)
    }

    pub(crate) fn insert(&mut self, address: usize, path: String) {
        self.first_seen.entry(address).or_insert(path);
    }
}

/// Path to constructed value, for one deserialization.
///
/// Registrations are kept in insertion order so that a failed union
/// alternative can be undone with [`ReadRefs::rollback`].
#[derive(Debug, Default)]
pub(crate) struct ReadRefs {
    by_path: HashMap<String, Shared>,
    order: Vec<String>,
}

impl ReadRefs {
    pub(crate) fn get(&self, path: &str) -> Option<&Shared> {
        self.by_path.get(path)
    }

    pub(crate) fn insert(&mut self, path: String, shared: Shared) {
        if self.by_path.insert(path.clone(), shared).is_none() {
            self.order.push(path);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn rollback(&mut self, mark: usize) {
        for path in self.order.drain(mark.min(self.order.len())..) {
            self.by_path.remove(&path);
        }
    }
}
