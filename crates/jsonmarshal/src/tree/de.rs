use tracing::trace;

use super::refs::{ReadRefs, Shared};
use crate::{
    error::{ErrorKind, TreeError},
    options::TreeOptions,
    path::{Path, PathItem},
};

/// State of one tree-to-value conversion: the current path and the shared
/// values built so far.
#[derive(Debug, Default)]
pub struct TreeDeserializer {
    options: TreeOptions,
    path: Path,
    refs: ReadRefs,
}

impl TreeDeserializer {
    /// A deserializer positioned at the document root.
    #[must_use]
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            path: Path::root(),
            refs: ReadRefs::default(),
        }
    }

    /// Options of this deserialization.
    #[must_use]
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Path of the node being deserialized.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An error located at the current path.
    pub fn error(&self, kind: impl Into<ErrorKind>) -> TreeError {
        TreeError {
            path: self.path.clone(),
            kind: kind.into(),
        }
    }

    /// Runs `f` with the path extended by an object member name.
    ///
    /// # Errors
    ///
    /// Fails if the path would exceed the depth limit, and propagates the
    /// error of `f`.
    pub fn member<R>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut Self) -> Result<R, TreeError>,
    ) -> Result<R, TreeError> {
        self.enter(PathItem::Key(key.to_string()))?;
        let result = f(self);
        self.path.pop();
        result
    }

    /// Runs `f` with the path extended by an array index.
    ///
    /// # Errors
    ///
    /// Fails if the path would exceed the depth limit, and propagates the
    /// error of `f`.
    pub fn element<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Self) -> Result<R, TreeError>,
    ) -> Result<R, TreeError> {
        self.enter(PathItem::Index(index))?;
        let result = f(self);
        self.path.pop();
        result
    }

    fn enter(&mut self, item: PathItem) -> Result<(), TreeError> {
        if self.path.len() >= self.options.max_depth {
            return Err(self.error(ErrorKind::DepthLimitExceeded(self.options.max_depth)));
        }
        self.path.push(item);
        Ok(())
    }

    /// Looks up the shared value registered at `target`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UnresolvedReference`] if nothing was built at
    /// that path yet.
    pub fn resolve(&self, target: &str) -> Result<Shared, TreeError> {
        match self.refs.get(target) {
            Some(shared) => {
                trace!(path = %self.path, target, "reference resolved");
                Ok(shared.clone())
            }
            None => Err(self.error(ErrorKind::UnresolvedReference(target.to_string()))),
        }
    }

    /// Registers a freshly built shared value at the current path.
    pub fn register(&mut self, shared: Shared) {
        self.refs.insert(self.path.to_pointer(), shared);
    }

    /// Marks the current state of the reference table.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.refs.len()
    }

    /// Forgets every registration made since `mark`.
    pub fn rollback(&mut self, mark: usize) {
        self.refs.rollback(mark);
    }
}
