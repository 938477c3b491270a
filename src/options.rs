//! Configuration options for IDO codecs.
//!
//! The wire format itself has no knobs: field order, separators and markers
//! are fixed. [`Options`] only tunes the memory behaviour of a [`Codec`]:
//!
//! - how large a fresh scratch buffer starts out
//! - how many scratch buffers the pool keeps, and how large they may grow
//!   before the pool drops them instead of retaining them
//! - how large a streaming reader's buffer starts out
//!
//! ## Examples
//!
//! ```rust
//! use ido::{Codec, Options};
//!
//! let options = Options::new()
//!     .with_scratch_capacity(4096)
//!     .with_read_capacity(64 * 1024);
//! let codec = Codec::with_options(options);
//! assert_eq!(codec.options().read_capacity, 64 * 1024);
//! ```
//!
//! Options derive `serde` traits, so they can live in a configuration file:
//!
//! ```rust
//! use ido::Options;
//!
//! let options: Options = serde_json::from_str(r#"{ "max_pooled_buffers": 8 }"#).unwrap();
//! assert_eq!(options.max_pooled_buffers, 8);
//! assert_eq!(options.scratch_capacity, 512);
//! ```
//!
//! [`Codec`]: crate::Codec

use serde::{Deserialize, Serialize};

/// Tuning options for scratch buffers and streaming reads.
///
/// # Examples
///
/// ```rust
/// use ido::Options;
///
/// let options = Options::new().with_max_pooled_buffers(4);
/// assert_eq!(options.max_pooled_buffers, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial capacity of a freshly allocated scratch buffer.
    pub scratch_capacity: usize,
    /// Maximum number of idle scratch buffers kept by the pool.
    pub max_pooled_buffers: usize,
    /// Scratch buffers that grew beyond this capacity are dropped on return.
    pub max_pooled_capacity: usize,
    /// Initial size of a streaming decoder's read buffer.
    pub read_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            scratch_capacity: 512,
            max_pooled_buffers: 32,
            max_pooled_capacity: 1 << 20,
            read_capacity: 1024,
        }
    }
}

impl Options {
    /// Creates default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ido::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.scratch_capacity, 512);
    /// assert_eq!(options.read_capacity, 1024);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial capacity of new scratch buffers.
    #[must_use]
    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }

    /// Sets how many idle scratch buffers the pool retains.
    ///
    /// Zero disables retention: every buffer is dropped on return.
    #[must_use]
    pub fn with_max_pooled_buffers(mut self, count: usize) -> Self {
        self.max_pooled_buffers = count;
        self
    }

    /// Sets the largest scratch buffer capacity the pool retains.
    #[must_use]
    pub fn with_max_pooled_capacity(mut self, capacity: usize) -> Self {
        self.max_pooled_capacity = capacity;
        self
    }

    /// Sets the initial size of a streaming decoder's read buffer.
    ///
    /// The buffer doubles whenever it fills up without holding a complete
    /// record, so this is a starting point, not a limit.
    #[must_use]
    pub fn with_read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity;
        self
    }
}
