//! The coder cache.
//!
//! A [`Registry`] maps each type to its compiled [`Coder`]. Lookups are
//! lock-free for readers on distinct shards, and compilation happens outside
//! any lock: two threads that miss on the same type may both compile it, but
//! only the first install wins and both callers receive that same coder.
//!
//! ```rust
//! use std::sync::Arc;
//! use ido::Registry;
//!
//! let registry = Registry::new();
//! let first = registry.coder::<Vec<String>>().unwrap();
//! let second = registry.coder::<Vec<String>>().unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! assert!(registry.contains::<String>());
//! ```

use crate::compile::{resolve, Coder, Compiler};
use crate::{Result, Shape};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Concurrent cache of compiled coders, keyed by type.
#[derive(Default)]
pub struct Registry {
    coders: DashMap<TypeId, Arc<Coder>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the coder for `T`, compiling it and every type it depends on
    /// the first time it is requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`](crate::Error::Unsupported) when `T`, or
    /// a type reachable from it, has no positional encoding. Nothing is cached
    /// for a failed compilation.
    pub fn coder<T: Shape>(&self) -> Result<Arc<Coder>> {
        if let Some(coder) = self.lookup(TypeId::of::<T>()) {
            return Ok(coder);
        }
        resolve::<T>(&mut Compiler::new(self))
    }

    /// Returns `true` if a coder for `T` has been compiled.
    pub fn contains<T: Shape>(&self) -> bool {
        self.coders.contains_key(&TypeId::of::<T>())
    }

    /// Number of cached coders.
    pub fn len(&self) -> usize {
        self.coders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coders.is_empty()
    }

    /// Drops every cached coder. Coders already handed out stay valid.
    pub fn clear(&self) {
        self.coders.clear();
    }

    pub(crate) fn lookup(&self, id: TypeId) -> Option<Arc<Coder>> {
        self.coders.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Installs a freshly compiled coder unless another caller got there
    /// first, and returns whichever coder is cached.
    pub(crate) fn install(&self, id: TypeId, coder: Coder) -> Arc<Coder> {
        match self.coders.entry(id) {
            Entry::Occupied(entry) => {
                trace!(type_name = coder.type_name, "discarding duplicate coder");
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(coder)).value()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("coders", &self.coders.len())
            .finish()
    }
}
