//! IDO encoding.
//!
//! This module drives a compiled [`Coder`] over a value and appends the
//! result to a byte buffer. It also provides the streaming [`Encoder`], which
//! writes one record per call to an [`std::io::Write`] sink.
//!
//! ## Overview
//!
//! - **Structs** write each encodable field followed by `,`; a field holding
//!   its zero value writes nothing but keeps its slot. The final `,` becomes
//!   `}`.
//! - **Sequences** write every element followed by `,`; the final `,` becomes
//!   `]`. An empty sequence is `[]`.
//! - **Scalars** are written as described in [`format`](crate::format).
//!
//! The value handed to the top-level call is always written in full, zero or
//! not.
//!
//! ## Usage
//!
//! ```rust
//! ido::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct User {
//!         pub name: String,
//!         pub age: u32,
//!         pub active: bool,
//!     }
//! }
//!
//! let user = User { name: "Jo\"e".into(), age: 0, active: true };
//! assert_eq!(ido::to_string(&user).unwrap(), r#"{"Jo\"e",,+}"#);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use ido::Encoder;
//!
//! let mut encoder = Encoder::new(Vec::new());
//! encoder.encode(&vec![1_u8, 2]).unwrap();
//! encoder.encode(&vec![3_u8]).unwrap();
//! assert_eq!(encoder.into_inner(), b"[1,2]\n[3]\n");
//! ```

use crate::compile::{Coder, Plan};
use crate::format::{
    ESCAPE, QUOTE, RECORD_SEPARATOR, SEPARATOR, SEQ_CLOSE, SEQ_OPEN, STRUCT_CLOSE, STRUCT_OPEN,
    TRUE_MARKER,
};
use crate::shape::Scalar;
use crate::{Codec, Error, Registry, Result, Shape};
use std::any::Any;
use std::io::{self, Write};

impl Coder {
    /// Appends the encoding of `value` to `out`.
    ///
    /// `registry` resolves the run-time types of open-typed values.
    pub(crate) fn encode(
        &self,
        value: &dyn Any,
        out: &mut Vec<u8>,
        registry: &Registry,
    ) -> Result<()> {
        match &self.plan {
            Plan::Scalar(scalar) => encode_scalar(*scalar, value, out)
                .ok_or_else(|| Error::type_mismatch(self.type_name)),
            Plan::Extension(hooks) => (hooks.encode)(value, out),
            Plan::Seq { elem, access } => {
                let len = (access.len)(value)
                    .ok_or_else(|| Error::type_mismatch(self.type_name))?;
                out.push(SEQ_OPEN);
                for i in 0..len {
                    let item = (access.item)(value, i)
                        .ok_or_else(|| Error::type_mismatch(self.type_name))?;
                    elem.encode(item, out, registry)?;
                    out.push(SEPARATOR);
                }
                close(out, SEQ_CLOSE);
                Ok(())
            }
            Plan::Struct { fields } => {
                out.push(STRUCT_OPEN);
                for field in fields {
                    let slot = (field.get)(value)
                        .ok_or_else(|| Error::type_mismatch(self.type_name))?;
                    if !field.coder.is_zero(slot) {
                        field.coder.encode(slot, out, registry)?;
                    }
                    out.push(SEPARATOR);
                }
                close(out, STRUCT_CLOSE);
                Ok(())
            }
            Plan::Indirect { target, access } => match (access.get)(value) {
                Some(inner) => target.encode(inner, out, registry),
                None => Ok(()),
            },
            Plan::Dynamic(access) => match (access.get)(value) {
                Some(inner) => inner.coder(registry)?.encode(inner.as_any(), out, registry),
                None => Ok(()),
            },
        }
    }

    /// Whether a struct field holding `value` is written as an empty slot.
    pub(crate) fn is_zero(&self, value: &dyn Any) -> bool {
        match &self.plan {
            Plan::Scalar(scalar) => scalar_is_zero(*scalar, value),
            Plan::Extension(hooks) => (hooks.is_zero)(value),
            Plan::Seq { access, .. } => (access.len)(value) == Some(0),
            Plan::Struct { fields } => fields.iter().all(|field| {
                (field.get)(value).map_or(true, |slot| field.coder.is_zero(slot))
            }),
            Plan::Indirect { access, .. } => (access.get)(value).is_none(),
            Plan::Dynamic(access) => (access.get)(value).is_none(),
        }
    }
}

/// Overwrites a trailing separator with `closer`, or appends `closer` when
/// the container wrote nothing.
#[inline]
fn close(out: &mut Vec<u8>, closer: u8) {
    match out.last_mut() {
        Some(last) if *last == SEPARATOR => *last = closer,
        _ => out.push(closer),
    }
}

fn encode_scalar(scalar: Scalar, value: &dyn Any, out: &mut Vec<u8>) -> Option<()> {
    macro_rules! integer {
        ($ty:ty) => {{
            let mut buf = itoa::Buffer::new();
            out.extend_from_slice(buf.format(*value.downcast_ref::<$ty>()?).as_bytes());
        }};
    }

    match scalar {
        Scalar::Str => write_quoted(value.downcast_ref::<String>()?, out),
        Scalar::Bool => {
            if *value.downcast_ref::<bool>()? {
                out.push(TRUE_MARKER);
            }
        }
        Scalar::I8 => integer!(i8),
        Scalar::I16 => integer!(i16),
        Scalar::I32 => integer!(i32),
        Scalar::I64 => integer!(i64),
        Scalar::I128 => integer!(i128),
        Scalar::Isize => integer!(isize),
        Scalar::U8 => integer!(u8),
        Scalar::U16 => integer!(u16),
        Scalar::U32 => integer!(u32),
        Scalar::U64 => integer!(u64),
        Scalar::U128 => integer!(u128),
        Scalar::Usize => integer!(usize),
        // Display is the shortest round-trip form and never uses an exponent
        Scalar::F32 => write!(out, "{}", value.downcast_ref::<f32>()?).ok()?,
        Scalar::F64 => write!(out, "{}", value.downcast_ref::<f64>()?).ok()?,
    }
    Some(())
}

fn scalar_is_zero(scalar: Scalar, value: &dyn Any) -> bool {
    macro_rules! zero {
        ($ty:ty, $zero:expr) => {
            value.downcast_ref::<$ty>().is_some_and(|v| *v == $zero)
        };
    }

    match scalar {
        Scalar::Str => value.downcast_ref::<String>().is_some_and(String::is_empty),
        Scalar::Bool => zero!(bool, false),
        Scalar::I8 => zero!(i8, 0),
        Scalar::I16 => zero!(i16, 0),
        Scalar::I32 => zero!(i32, 0),
        Scalar::I64 => zero!(i64, 0),
        Scalar::I128 => zero!(i128, 0),
        Scalar::Isize => zero!(isize, 0),
        Scalar::U8 => zero!(u8, 0),
        Scalar::U16 => zero!(u16, 0),
        Scalar::U32 => zero!(u32, 0),
        Scalar::U64 => zero!(u64, 0),
        Scalar::U128 => zero!(u128, 0),
        Scalar::Usize => zero!(usize, 0),
        // by bits, so `-0.0` keeps its sign on the wire
        Scalar::F32 => value.downcast_ref::<f32>().is_some_and(|v| v.to_bits() == 0),
        Scalar::F64 => value.downcast_ref::<f64>().is_some_and(|v| v.to_bits() == 0),
    }
}

/// Writes `text` between quotes, escaping `"` and `\`.
fn write_quoted(text: &str, out: &mut Vec<u8>) {
    out.reserve(text.len() + 2);
    out.push(QUOTE);
    for &byte in text.as_bytes() {
        if byte == QUOTE || byte == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(byte);
    }
    out.push(QUOTE);
}

/// Writes records to an output sink, one per line.
///
/// Each call leases a scratch buffer from the codec's pool, encodes into it,
/// appends the record separator and writes the whole record at once. The
/// buffer returns to the pool whether or not encoding succeeds.
pub struct Encoder<W> {
    writer: W,
    codec: Codec,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder backed by the shared codec.
    pub fn new(writer: W) -> Self {
        Encoder::with_codec(writer, Codec::shared().clone())
    }

    pub fn with_codec(writer: W, codec: Codec) -> Self {
        Encoder { writer, codec }
    }

    /// Writes one record.
    ///
    /// Nothing reaches the writer if encoding fails.
    ///
    /// A value whose encoding is empty, such as `false` or `None`, is written
    /// as a bare record separator. A [`Decoder`](crate::Decoder) skips that
    /// line as whitespace, so it yields one record fewer than were written.
    pub fn encode<T: Shape>(&mut self, value: &T) -> Result<()> {
        let mut scratch = self.codec.pool().acquire();
        self.codec.encode_into(value, &mut scratch)?;
        scratch.push(RECORD_SEPARATOR);
        self.writer.write_all(&scratch)?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
