//! Paths from the document root to a node.
//!
//! A [`Path`] is rendered as a JSON Pointer: `/users/0/name`, with `~` and `/`
//! inside keys escaped as `~0` and `~1`. The root is the empty string. The
//! rendered form doubles as the target of `{"$ref": ...}` back-references.

use core::fmt;

/// One step of a [`Path`]: a key into an object or an index into an array.
///
/// # Examples
///
/// ```
/// use jsonmarshal::PathItem;
///
/// let key = PathItem::Key("foo".to_string());
/// assert_eq!(key.as_key(), Some("foo"));
///
/// let idx = PathItem::Index(3);
/// assert_eq!(idx.as_index(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathItem {
    /// An object member name.
    Key(String),
    /// An array index.
    Index(usize),
}

impl PathItem {
    /// Returns the key if this item is a key, otherwise `None`.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        if let Self::Key(k) = self {
            Some(k)
        } else {
            None
        }
    }

    /// Returns the index if this item is an index, otherwise `None`.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        if let Self::Index(i) = self {
            Some(*i)
        } else {
            None
        }
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => {
                for c in k.chars() {
                    match c {
                        '~' => f.write_str("~0")?,
                        '/' => f.write_str("~1")?,
                        c => fmt::Write::write_char(f, c)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PathItem {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for PathItem {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for PathItem {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Conversion into a [`PathItem`], used by the `path!` macro.
#[doc(hidden)]
pub trait PathItemFrom<T> {
    /// Converts `value`.
    fn from_path_item(value: T) -> PathItem;
}

// use macro_rules to implement for i8..i64, u8..u64, isize, usize, &str and
// String
macro_rules! impl_unsigned_as_path_item {
    ($($t:ty),+) => {
        $(
            impl PathItemFrom<$t> for PathItem {
                fn from_path_item(value: $t) -> Self {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                    PathItem::Index(value as usize)
                }
            }
        )+
    };
}
impl_unsigned_as_path_item!(u8, u16, u32, u64, usize);

macro_rules! impl_signed_as_path_item {
    ($($t:ty),+) => {
        $(
            impl PathItemFrom<$t> for PathItem {
                fn from_path_item(value: $t) -> Self {
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    PathItem::Index(value.max(0) as usize)
                }
            }
        )+
    };
}
impl_signed_as_path_item!(i8, i16, i32, i64, isize);

impl PathItemFrom<&str> for PathItem {
    fn from_path_item(value: &str) -> Self {
        PathItem::Key(value.to_string())
    }
}

impl PathItemFrom<String> for PathItem {
    fn from_path_item(value: String) -> Self {
        PathItem::Key(value)
    }
}

/// A path from the document root; empty for the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathItem>);

impl Path {
    /// Creates the root path.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of items in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Alias of [`Path::is_root`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Descends into member `key`.
    pub fn push_key(&mut self, key: &str) {
        self.0.push(PathItem::Key(key.to_string()));
    }

    /// Descends into element `index`.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathItem::Index(index));
    }

    /// Descends one level.
    pub fn push(&mut self, item: PathItem) {
        self.0.push(item);
    }

    /// Ascends one level, returning the item left.
    pub fn pop(&mut self) -> Option<PathItem> {
        self.0.pop()
    }

    /// Last item, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathItem> {
        self.0.last()
    }

    /// The items from the root down.
    #[must_use]
    pub fn items(&self) -> &[PathItem] {
        &self.0
    }

    /// Renders the path as a JSON Pointer.
    #[must_use]
    pub fn to_pointer(&self) -> String {
        self.to_string()
    }
}

impl From<Vec<PathItem>> for Path {
    fn from(items: Vec<PathItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<PathItem> for Path {
    fn from_iter<I: IntoIterator<Item = PathItem>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.0 {
            write!(f, "/{item}")?;
        }
        Ok(())
    }
}
