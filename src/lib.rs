//! # ido
//!
//! A compact, positional text codec for records whose type is known on both
//! ends of the wire.
//!
//! ## What is IDO?
//!
//! IDO trades self-description for density. Field names are never written:
//! a field is identified by its position alone. Fields holding their zero
//! value collapse to empty slots, `true` is a single `+`, and `false` is
//! nothing at all.
//!
//! ```text
//! { name: "Jo\"e", age: 0, active: true }   =>   {"Jo\"e",,+}
//! ```
//!
//! ## Key Features
//!
//! - **Compiled plans**: each type is described once and compiled into a
//!   cached [`Coder`]; nothing is re-derived per call
//! - **Concurrent cache**: a sharded [`Registry`] safe under first-use races
//! - **Pooled buffers**: encoding reuses scratch buffers from a [`BufferPool`]
//! - **Streaming**: [`Encoder`] and [`Decoder`] move newline-terminated
//!   records through any `Write`/`Read`, in chunks of any size
//! - **Extension hook**: types can supply their own bytes via [`Extension`]
//!
//! ## Quick Start
//!
//! ```rust
//! ido::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct User {
//!         pub name: String,
//!         pub age: u32,
//!         pub active: bool,
//!         pub tags: Vec<String>,
//!     }
//! }
//!
//! let user = User {
//!     name: "Jo\"e".to_string(),
//!     age: 0,
//!     active: true,
//!     tags: vec!["admin".to_string()],
//! };
//!
//! let text = ido::to_string(&user).unwrap();
//! assert_eq!(text, r#"{"Jo\"e",,+,["admin"]}"#);
//!
//! let back: User = ido::from_str(&text).unwrap();
//! assert_eq!(back, user);
//! ```
//!
//! ## Streams of Records
//!
//! ```rust
//! use ido::{Decoder, Encoder};
//!
//! ido::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Point {
//!         pub x: i32,
//!         pub y: i32,
//!     }
//! }
//!
//! let mut encoder = Encoder::new(Vec::new());
//! encoder.encode(&Point { x: 1, y: -2 }).unwrap();
//! encoder.encode(&Point { x: 0, y: 5 }).unwrap();
//! let bytes = encoder.into_inner();
//! assert_eq!(bytes, b"{1,-2}\n{,5}\n");
//!
//! let mut decoder = Decoder::new(&bytes[..]);
//! let points: Vec<Point> = decoder.iter::<Point>().collect::<Result<_, _>>().unwrap();
//! assert_eq!(points, vec![Point { x: 1, y: -2 }, Point { x: 0, y: 5 }]);
//! ```
//!
//! ## Describing Types
//!
//! [`record!`] covers ordinary structs. [`extension!`] registers types that
//! implement [`Extension`]. Any other layout can be written by hand through
//! [`Shape`]; see the [`shape`] module. Built in are `String`, `bool`, the
//! integer and float primitives, `Vec<T>`, `Option<T>`, `Box<T>`,
//! `chrono::DateTime<Utc>` and [`Dynamic`].
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (coder compilation, read buffer growth,
//! truncated streams) and installs no subscriber of its own.
//!
//! ## Format Specification
//!
//! See the [`format`] module for the grammar and per-type rules.

mod codec;
mod compile;
mod de;
mod error;
mod ext;
pub mod format;
mod macros;
mod options;
mod pool;
mod registry;
pub mod scan;
mod ser;
pub mod shape;
mod value;

pub use codec::Codec;
pub use compile::Coder;
pub use de::{DecodeIter, Decoder};
pub use error::{Error, Result};
pub use ext::Extension;
pub use options::Options;
pub use pool::{BufferPool, PooledBuffer};
pub use registry::Registry;
pub use ser::Encoder;
pub use shape::{
    DynamicLayout, ExtensionLayout, Field, GetFn, GetMutFn, IndirectLayout, Layout, Scalar,
    SeqLayout, Shape, StructLayout, TypeRef,
};
pub use value::{Dynamic, DynamicValue};

use std::io::{Read, Write};

/// Encodes a value to a byte vector.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] when the type has no positional encoding,
/// or any error raised by an [`Extension`].
///
/// # Examples
///
/// ```rust
/// let bytes = ido::to_vec(&vec![1_u32, 0, 3]).unwrap();
/// assert_eq!(bytes, b"[1,0,3]");
/// ```
pub fn to_vec<T: Shape>(value: &T) -> Result<Vec<u8>> {
    Codec::shared().to_vec(value)
}

/// Encodes a value to a string.
///
/// # Examples
///
/// ```rust
/// assert_eq!(ido::to_string(&Some(String::from("hi"))).unwrap(), r#""hi""#);
/// assert_eq!(ido::to_string(&None::<String>).unwrap(), "");
/// ```
pub fn to_string<T: Shape>(value: &T) -> Result<String> {
    Codec::shared().to_string(value)
}

/// Writes the encoding of a value to a writer, without a record separator.
///
/// Use [`Encoder`] to write a stream of records.
pub fn to_writer<W: Write, T: Shape>(writer: W, value: &T) -> Result<()> {
    Codec::shared().to_writer(writer, value)
}

/// Decodes into an existing value. Fields whose slot is empty or missing keep
/// their current contents.
///
/// # Examples
///
/// ```rust
/// ido::record! {
///     #[derive(Debug, Default)]
///     pub struct Limits {
///         pub soft: u32,
///         pub hard: u32,
///     }
/// }
///
/// let mut limits = Limits { soft: 10, hard: 20 };
/// ido::decode_into(b"{,25}", &mut limits).unwrap();
/// assert_eq!((limits.soft, limits.hard), (10, 25));
/// ```
pub fn decode_into<T: Shape>(input: &[u8], dest: &mut T) -> Result<()> {
    Codec::shared().decode_into(input, dest)
}

/// Decodes a value from bytes.
///
/// # Errors
///
/// Returns [`Error::Malformed`] when a token does not parse as its field's
/// type.
///
/// # Examples
///
/// ```rust
/// let values: Vec<Option<i64>> = ido::from_slice(b"[-1,,7]").unwrap();
/// assert_eq!(values, vec![Some(-1), None, Some(7)]);
/// ```
pub fn from_slice<T: Shape + Default>(input: &[u8]) -> Result<T> {
    Codec::shared().from_slice(input)
}

/// Decodes a value from a string.
pub fn from_str<T: Shape + Default>(input: &str) -> Result<T> {
    Codec::shared().from_slice(input.as_bytes())
}

/// Reads a reader to the end and decodes its contents as one value.
///
/// Use [`Decoder`] to read a stream of records.
pub fn from_reader<R: Read, T: Shape + Default>(reader: R) -> Result<T> {
    Codec::shared().from_reader(reader)
}
