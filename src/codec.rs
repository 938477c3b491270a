//! The codec handle.
//!
//! A [`Codec`] bundles the pieces every encode and decode call needs: the
//! [`Registry`] of compiled coders, the scratch [`BufferPool`] and the
//! [`Options`] they were built from. It is cheap to clone, and clones share
//! their registry and pool.
//!
//! The free functions at the crate root use [`Codec::shared`]. Build your own
//! codec to isolate a cache, tune buffers, or tear everything down again:
//!
//! ```rust
//! use std::sync::Arc;
//! use ido::{Codec, Options, Registry};
//!
//! let registry = Arc::new(Registry::new());
//! let codec = Codec::with_registry(Arc::clone(&registry), Options::default());
//!
//! let bytes = codec.to_vec(&vec![Some(1_i8), None]).unwrap();
//! assert_eq!(bytes, b"[1,]");
//! assert!(registry.contains::<Option<i8>>());
//!
//! registry.clear();
//! assert!(registry.is_empty());
//! ```

use crate::compile::Coder;
use crate::de::{trim, Decoder};
use crate::ser::Encoder;
use crate::{BufferPool, Error, Options, Registry, Result, Shape};
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};

/// Shared registry, buffer pool and options.
#[derive(Clone, Debug)]
pub struct Codec {
    registry: Arc<Registry>,
    pool: Arc<BufferPool>,
    options: Options,
}

impl Codec {
    pub fn new() -> Self {
        Codec::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Codec::with_registry(Arc::new(Registry::new()), options)
    }

    /// Creates a codec around an existing registry, so several codecs can
    /// share compiled coders while keeping separate buffer settings.
    pub fn with_registry(registry: Arc<Registry>, options: Options) -> Self {
        Codec {
            registry,
            pool: Arc::new(BufferPool::new(&options)),
            options,
        }
    }

    /// The process-wide codec behind the crate-level functions.
    pub fn shared() -> &'static Codec {
        static SHARED: OnceLock<Codec> = OnceLock::new();
        SHARED.get_or_init(Codec::new)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the compiled coder for `T`.
    pub fn coder<T: Shape>(&self) -> Result<Arc<Coder>> {
        self.registry.coder::<T>()
    }

    /// Appends the encoding of `value` to `out`.
    pub fn encode_into<T: Shape>(&self, value: &T, out: &mut Vec<u8>) -> Result<()> {
        let coder = self.registry.coder::<T>()?;
        coder.encode(value, out, &self.registry)
    }

    /// Encodes `value` through a pooled scratch buffer and returns a copy of
    /// the bytes.
    pub fn to_vec<T: Shape>(&self, value: &T) -> Result<Vec<u8>> {
        let mut scratch = self.pool.acquire();
        self.encode_into(value, &mut scratch)?;
        Ok(scratch.to_vec())
    }

    pub fn to_string<T: Shape>(&self, value: &T) -> Result<String> {
        String::from_utf8(self.to_vec(value)?).map_err(Error::custom)
    }

    /// Writes the encoding of `value` to `writer`, without a record separator.
    pub fn to_writer<W: Write, T: Shape>(&self, mut writer: W, value: &T) -> Result<()> {
        let mut scratch = self.pool.acquire();
        self.encode_into(value, &mut scratch)?;
        writer.write_all(&scratch)?;
        Ok(())
    }

    /// Decodes one value into `dest`. Surrounding whitespace is ignored.
    pub fn decode_into<T: Shape>(&self, input: &[u8], dest: &mut T) -> Result<()> {
        let coder = self.registry.coder::<T>()?;
        coder.decode(trim(input), dest)
    }

    pub fn from_slice<T: Shape + Default>(&self, input: &[u8]) -> Result<T> {
        let mut value = T::default();
        self.decode_into(input, &mut value)?;
        Ok(value)
    }

    /// Reads `reader` to the end and decodes its contents as one value.
    pub fn from_reader<R: Read, T: Shape + Default>(&self, mut reader: R) -> Result<T> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        self.from_slice(&input)
    }

    /// Creates a streaming encoder on this codec.
    pub fn encoder<W: Write>(&self, writer: W) -> Encoder<W> {
        Encoder::with_codec(writer, self.clone())
    }

    /// Creates a streaming decoder on this codec.
    pub fn decoder<R: Read>(&self, reader: R) -> Decoder<R> {
        Decoder::with_codec(reader, self.clone())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::new()
    }
}
