use tracing::trace;

use super::refs::WriteRefs;
use crate::{
    error::{ErrorKind, TreeError},
    options::TreeOptions,
    path::{Path, PathItem},
    value::Value,
};

/// State of one value-to-tree conversion: the current path and the shared
/// values already written.
#[derive(Debug, Default)]
pub struct TreeSerializer {
    options: TreeOptions,
    path: Path,
    refs: WriteRefs,
}

impl TreeSerializer {
    /// A serializer positioned at the document root.
    #[must_use]
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            path: Path::root(),
            refs: WriteRefs::default(),
        }
    }

    /// Path of the node being serialized.
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

    /// Serializes the shared allocation at `address` with `f` the first time
    /// it is seen, and as a `$ref` to that first path afterwards.
    ///
    /// # Errors
    ///
    /// Propagates the error of `f`.
    pub fn shared(
        &mut self,
        address: usize,
        f: impl FnOnce(&mut Self) -> Result<Value, TreeError>,
    ) -> Result<Value, TreeError> {
        if let Some(first) = self.refs.get(address) {
            trace!(path = %self.path, target = first, "shared value written as reference");
            return Ok(Value::reference(first));
        }
        let value = f(self)?;
        self.refs.insert(address, self.path.to_pointer());
        Ok(value)
    }
}
