//! Open-typed values.
//!
//! A [`Dynamic`] field holds a value whose concrete type is only known at run
//! time. Encoding looks up (or compiles) the coder of whatever the field holds
//! at that moment and writes it like any other value; an empty field writes
//! nothing.
//!
//! Nothing on the wire names a type, so the decoder has no way to pick one.
//! Decoding into a `Dynamic` consumes its slot and leaves the destination
//! unchanged. Round trips through an open-typed field therefore lose the
//! value:
//!
//! ```rust
//! use ido::Dynamic;
//!
//! ido::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Event {
//!         pub id: u32,
//!         pub payload: Dynamic,
//!         pub seen: bool,
//!     }
//! }
//!
//! let event = Event {
//!     id: 7,
//!     payload: Dynamic::new(vec![1_u8, 2]),
//!     seen: true,
//! };
//! let bytes = ido::to_vec(&event).unwrap();
//! assert_eq!(bytes, b"{7,[1,2],+}");
//!
//! let back: Event = ido::from_slice(&bytes).unwrap();
//! assert_eq!(back.id, 7);
//! assert!(back.payload.is_none());
//! assert!(back.seen);
//! ```

use crate::compile::Coder;
use crate::shape::{DynamicLayout, Layout, Shape};
use crate::{Registry, Result};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A value that can be encoded without its type being known statically.
///
/// Implemented for every [`Shape`] type that is `Send + Sync`.
pub trait DynamicValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Resolves the coder of the concrete type.
    fn coder(&self, registry: &Registry) -> Result<Arc<Coder>>;

    fn type_name(&self) -> &'static str;
}

impl<T: Shape + Send + Sync> DynamicValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn coder(&self, registry: &Registry) -> Result<Arc<Coder>> {
        registry.coder::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// An optional value of any encodable type.
#[derive(Default)]
pub struct Dynamic(pub Option<Box<dyn DynamicValue>>);

impl Dynamic {
    pub fn new<T: DynamicValue>(value: T) -> Self {
        Dynamic(Some(Box::new(value)))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Returns the held value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Takes the held value out, leaving the field empty.
    pub fn take(&mut self) -> Option<Box<dyn DynamicValue>> {
        self.0.take()
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_deref() {
            Some(value) => write!(f, "Dynamic({})", value.type_name()),
            None => f.write_str("Dynamic(None)"),
        }
    }
}

impl Shape for Dynamic {
    fn layout() -> Layout {
        Layout::Dynamic(DynamicLayout::new(|v| {
            v.downcast_ref::<Dynamic>().and_then(|d| d.0.as_deref())
        }))
    }
}
