/// What to do with an object member whose name matches no declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Skip the member and its whole value.
    #[default]
    Ignore,
    /// Fail with [`ErrorKind::UnknownField`](crate::ErrorKind::UnknownField).
    Reject,
}

/// How object member names are matched against declared field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldLookup {
    /// Perfect hash for types with at least [`FieldLookup::AUTO_THRESHOLD`]
    /// fields, linear scan otherwise.
    #[default]
    Auto,
    /// Compare against every declared name in order.
    Linear,
    /// Always use the type's perfect hash table.
    PerfectHash,
}

impl FieldLookup {
    /// Field count from which [`FieldLookup::Auto`] switches to hashing.
    pub const AUTO_THRESHOLD: usize = 8;
}

/// Configuration of the streaming decoder.
///
/// # Examples
///
/// ```rust
/// use jsonmarshal::{DecodeOptions, UnknownKeys};
///
/// let options = DecodeOptions {
///     unknown_keys: UnknownKeys::Reject,
///     max_depth: 32,
///     ..Default::default()
/// };
/// assert!(options.enforce_required);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Maximum number of simultaneously open decoder frames.
    ///
    /// Every container level takes at least one frame, so this bounds the
    /// nesting depth of accepted input.
    ///
    /// # Default
    ///
    /// `128`
    pub max_depth: usize,

    /// Maximum combined size in bytes of all open decoder frames.
    ///
    /// # Default
    ///
    /// `65536`
    pub max_frame_bytes: usize,

    /// # Default
    ///
    /// [`UnknownKeys::Ignore`]
    pub unknown_keys: UnknownKeys,

    /// Whether an object missing a field declared `#[required]` fails to
    /// decode.
    ///
    /// # Default
    ///
    /// `true`
    pub enforce_required: bool,

    /// # Default
    ///
    /// [`FieldLookup::Auto`]
    pub field_lookup: FieldLookup,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_frame_bytes: 64 * 1024,
            unknown_keys: UnknownKeys::Ignore,
            enforce_required: true,
            field_lookup: FieldLookup::Auto,
        }
    }
}

/// Configuration of the tree serializer and deserializer.
#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    /// Maximum path length below the root.
    ///
    /// # Default
    ///
    /// `128`
    pub max_depth: usize,

    /// Only consulted when deserializing.
    ///
    /// # Default
    ///
    /// [`UnknownKeys::Ignore`]
    pub unknown_keys: UnknownKeys,

    /// # Default
    ///
    /// `true`
    pub enforce_required: bool,

    /// # Default
    ///
    /// [`FieldLookup::Auto`]
    pub field_lookup: FieldLookup,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            unknown_keys: UnknownKeys::Ignore,
            enforce_required: true,
            field_lookup: FieldLookup::Auto,
        }
    }
}

/// Configuration of [`schema_for_with`](crate::schema_for_with).
#[derive(Debug, Clone, Copy)]
pub struct SchemaOptions {
    /// Whether the root carries the draft-07 `$schema` member.
    ///
    /// # Default
    ///
    /// `true`
    pub meta_schema: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self { meta_schema: true }
    }
}
