//! IDO decoding.
//!
//! This module drives a compiled [`Coder`] over a token and writes the result
//! into an existing destination, and provides the streaming [`Decoder`] that
//! assembles records from a [`std::io::Read`] source.
//!
//! ## Overview
//!
//! - An empty token is a no-op for every type: the destination keeps whatever
//!   it held.
//! - **Structs**: the i-th token goes to the i-th encodable field. Missing
//!   trailing tokens leave their fields alone and surplus tokens are ignored.
//! - **Sequences** are cleared first, then every token (empty ones included)
//!   appends one element.
//! - **Options** allocate their value only for a non-empty token.
//! - **Open-typed values** cannot be decoded, since the wire carries no type
//!   name. Their slot is skipped.
//!
//! A failing decode may already have written earlier fields.
//!
//! ## Usage
//!
//! ```rust
//! let mut numbers = vec![9_u16, 9, 9];
//! ido::decode_into(b"[1,2]", &mut numbers).unwrap();
//! assert_eq!(numbers, vec![1, 2]);
//!
//! let words: Vec<String> = ido::from_slice(br#"["a\"b",plain]"#).unwrap();
//! assert_eq!(words, vec!["a\"b".to_string(), "plain".to_string()]);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use ido::Decoder;
//!
//! let input: &[u8] = b"[1,2]\n[3]\n";
//! let mut decoder = Decoder::new(input);
//! assert_eq!(decoder.decode::<Vec<u8>>().unwrap(), Some(vec![1, 2]));
//! assert_eq!(decoder.decode::<Vec<u8>>().unwrap(), Some(vec![3]));
//! assert_eq!(decoder.decode::<Vec<u8>>().unwrap(), None);
//! ```

use crate::compile::{Coder, Plan};
use crate::format::{
    ESCAPE, QUOTE, RECORD_SEPARATOR, SEQ_CLOSE, SEQ_OPEN, STRUCT_CLOSE, STRUCT_OPEN, TRUE_MARKER,
};
use crate::scan::{closes_early, object_span, tokens};
use crate::shape::Scalar;
use crate::{Codec, Error, Result, Shape};
use std::any::{type_name, Any};
use std::borrow::Cow;
use std::io::{self, Read};
use std::marker::PhantomData;
use std::str::FromStr;
use tracing::{debug, trace};

impl Coder {
    /// Decodes `token` into `dest`, which must be a value of this coder's type.
    pub(crate) fn decode(&self, token: &[u8], dest: &mut dyn Any) -> Result<()> {
        if token.is_empty() {
            return Ok(());
        }

        match &self.plan {
            Plan::Scalar(scalar) => decode_scalar(*scalar, token, dest),
            Plan::Extension(hooks) => (hooks.decode)(token, dest),
            Plan::Seq { elem, access } => {
                let body = strip(token, SEQ_OPEN, SEQ_CLOSE, "expected a sequence")?;
                if !(access.clear)(&mut *dest) {
                    return Err(Error::not_addressable(self.type_name));
                }
                for item in tokens(body) {
                    let item = item?;
                    let slot = (access.push_default)(&mut *dest)
                        .ok_or_else(|| Error::not_addressable(self.type_name))?;
                    elem.decode(item, slot)?;
                }
                Ok(())
            }
            Plan::Struct { fields } => {
                let body = strip(token, STRUCT_OPEN, STRUCT_CLOSE, "expected a struct")?;
                for (field, item) in fields.iter().zip(tokens(body)) {
                    let item = item?;
                    if item.is_empty() {
                        continue;
                    }
                    let slot = (field.get_mut)(&mut *dest)
                        .ok_or_else(|| Error::not_addressable(self.type_name))?;
                    field.coder.decode(item, slot)?;
                }
                Ok(())
            }
            Plan::Indirect { target, access } => {
                let slot = (access.get_or_insert)(dest)
                    .ok_or_else(|| Error::not_addressable(self.type_name))?;
                target.decode(token, slot)
            }
            Plan::Dynamic(_) => {
                trace!(type_name = self.type_name, "skipping open-typed value");
                Ok(())
            }
        }
    }
}

/// Returns the body between `open` and `close`.
fn strip<'a>(token: &'a [u8], open: u8, close: u8, reason: &str) -> Result<&'a [u8]> {
    match token {
        [first, body @ .., last] if *first == open && *last == close => Ok(body),
        _ => Err(Error::malformed(token, reason)),
    }
}

fn decode_scalar(scalar: Scalar, token: &[u8], dest: &mut dyn Any) -> Result<()> {
    macro_rules! number {
        ($ty:ty) => {{
            let slot = dest
                .downcast_mut::<$ty>()
                .ok_or_else(|| Error::not_addressable(type_name::<$ty>()))?;
            *slot = parse_number::<$ty>(token)?;
        }};
    }

    match scalar {
        Scalar::Str => {
            let slot = dest
                .downcast_mut::<String>()
                .ok_or_else(|| Error::not_addressable("String"))?;
            let text = unquote(token)?;
            slot.clear();
            slot.push_str(&text);
        }
        Scalar::Bool => {
            let slot = dest
                .downcast_mut::<bool>()
                .ok_or_else(|| Error::not_addressable("bool"))?;
            if token != [TRUE_MARKER] {
                return Err(Error::malformed(token, "invalid bool"));
            }
            *slot = true;
        }
        Scalar::I8 => number!(i8),
        Scalar::I16 => number!(i16),
        Scalar::I32 => number!(i32),
        Scalar::I64 => number!(i64),
        Scalar::I128 => number!(i128),
        Scalar::Isize => number!(isize),
        Scalar::U8 => number!(u8),
        Scalar::U16 => number!(u16),
        Scalar::U32 => number!(u32),
        Scalar::U64 => number!(u64),
        Scalar::U128 => number!(u128),
        Scalar::Usize => number!(usize),
        Scalar::F32 => number!(f32),
        Scalar::F64 => number!(f64),
    }
    Ok(())
}

fn parse_number<T: FromStr>(token: &[u8]) -> Result<T> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| Error::malformed(token, &format!("invalid {}", type_name::<T>())))
}

/// Decodes a string token.
///
/// A quoted token loses its quotes and every `\x` becomes `x`. Anything else
/// is taken verbatim. Borrows from `token` unless an escape had to be undone.
pub(crate) fn unquote(token: &[u8]) -> Result<Cow<'_, str>> {
    let inner = match token {
        [QUOTE, inner @ .., QUOTE] => inner,
        [QUOTE, ..] => return Err(Error::malformed(token, "unterminated string")),
        raw => return utf8(raw, token).map(Cow::Borrowed),
    };

    if !inner.contains(&ESCAPE) {
        return utf8(inner, token).map(Cow::Borrowed);
    }

    let mut out = Vec::with_capacity(inner.len());
    let mut bytes = inner.iter();
    while let Some(&byte) = bytes.next() {
        if byte == ESCAPE {
            match bytes.next() {
                Some(&escaped) => out.push(escaped),
                None => return Err(Error::malformed(token, "unterminated string")),
            }
        } else {
            out.push(byte);
        }
    }
    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| Error::malformed(token, "invalid utf-8"))
}

fn utf8<'a>(bytes: &'a [u8], token: &[u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| Error::malformed(token, "invalid utf-8"))
}

/// Strips ASCII whitespace from both ends.
pub(crate) fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Reads records from an input source.
///
/// Input may arrive in chunks of any size: the decoder buffers until it holds
/// a complete record, doubling its buffer when a record does not fit. Every
/// record is copied out of the buffer before it is decoded.
pub struct Decoder<R> {
    reader: R,
    codec: Codec,
    buf: Vec<u8>,
    filled: usize,
    eof: bool,
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder backed by the shared codec.
    pub fn new(reader: R) -> Self {
        Decoder::with_codec(reader, Codec::shared().clone())
    }

    pub fn with_codec(reader: R, codec: Codec) -> Self {
        let capacity = codec.options().read_capacity.max(1);
        Decoder {
            reader,
            codec,
            buf: vec![0; capacity],
            filled: 0,
            eof: false,
        }
    }

    /// Returns the bytes of the next record, without its record separator.
    ///
    /// Returns `Ok(None)` once the input is exhausted and nothing but
    /// whitespace is left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] when the input ends inside a struct or
    /// sequence, and [`Error::Io`] when reading fails.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let pending = &self.buf[..self.filled];
            if let Some(span) = object_span(pending) {
                let record = pending[span.clone()].to_vec();
                let mut consumed = span.end;
                if pending.get(consumed) == Some(&RECORD_SEPARATOR) {
                    consumed += 1;
                }
                self.buf.copy_within(consumed..self.filled, 0);
                self.filled -= consumed;
                return Ok(Some(record));
            }

            if self.eof {
                return self.finish();
            }

            if self.filled == self.buf.len() {
                let grown = self.buf.len() * 2;
                debug!(from = self.buf.len(), to = grown, "growing read buffer");
                self.buf.resize(grown, 0);
            }

            match self.reader.read(&mut self.buf[self.filled..]) {
                Ok(0) => self.eof = true,
                Ok(n) => self.filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Handles what is left in the buffer once the input is exhausted. A bare
    /// scalar or an unbalanced container needs no record separator after the
    /// last record; anything else left over is a cut-off record.
    fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        let rest = trim(&self.buf[..self.filled]);
        let result = match rest.first() {
            None => Ok(None),
            Some(&STRUCT_OPEN) | Some(&SEQ_OPEN) if !closes_early(rest) => {
                debug!(buffered = self.filled, "input ended inside a record");
                Err(Error::truncated(self.filled))
            }
            Some(_) => Ok(Some(rest.to_vec())),
        };
        self.filled = 0;
        result
    }

    /// Decodes the next record into `dest`. Returns `false` at the end of the
    /// input.
    pub fn decode_into<T: Shape>(&mut self, dest: &mut T) -> Result<bool> {
        match self.next_record()? {
            Some(record) => {
                self.codec.decode_into(&record, dest)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decodes the next record into a fresh `T`.
    pub fn decode<T: Shape + Default>(&mut self) -> Result<Option<T>> {
        let mut value = T::default();
        Ok(self.decode_into(&mut value)?.then_some(value))
    }

    /// Iterates over the remaining records. The iterator ends after the first
    /// error.
    pub fn iter<T: Shape + Default>(&mut self) -> DecodeIter<'_, R, T> {
        DecodeIter {
            decoder: self,
            done: false,
            marker: PhantomData,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Iterator returned by [`Decoder::iter`].
pub struct DecodeIter<'a, R, T> {
    decoder: &'a mut Decoder<R>,
    done: bool,
    marker: PhantomData<fn() -> T>,
}

impl<R: Read, T: Shape + Default> Iterator for DecodeIter<'_, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.decode::<T>() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    fn decode<T: Shape + Default>(token: &[u8]) -> Result<T> {
        let registry = Registry::new();
        let mut value = T::default();
        registry.coder::<T>()?.decode(token, &mut value)?;
        Ok(value)
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(br#""a\"b""#).unwrap(), "a\"b");
        assert_eq!(unquote(br#""a\\b""#).unwrap(), "a\\b");
        assert_eq!(unquote(br#""\x""#).unwrap(), "x");
        assert!(matches!(unquote(b"plain").unwrap(), Cow::Borrowed("plain")));
        assert!(matches!(unquote(br#""q""#).unwrap(), Cow::Borrowed("q")));
        assert!(unquote(br#""abc"#).unwrap_err().is_malformed());
        assert!(unquote(br#""a\""#).unwrap_err().is_malformed());
        assert!(unquote(&[b'"', 0xff, b'"']).unwrap_err().is_malformed());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(decode::<i16>(b"-300").unwrap(), -300);
        assert_eq!(decode::<f64>(b"2.25").unwrap(), 2.25);
        assert!(decode::<u8>(b"256").unwrap_err().is_malformed());
        assert!(decode::<u32>(b"-1").unwrap_err().is_malformed());
        assert!(decode::<i32>(b"1.5").unwrap_err().is_malformed());
        assert_eq!(
            decode::<u128>(b"340282366920938463463374607431768211455").unwrap(),
            u128::MAX
        );
        assert_eq!(decode::<i128>(b"-1").unwrap(), -1);
        assert!(decode::<u128>(b"340282366920938463463374607431768211456")
            .unwrap_err()
            .is_malformed());
    }

    #[test]
    fn test_bool_requires_marker() {
        assert!(decode::<bool>(b"+").unwrap());
        assert!(!decode::<bool>(b"").unwrap());
        assert!(decode::<bool>(b"true").unwrap_err().is_malformed());
    }

    #[test]
    fn test_sequence_keeps_trailing_empty_element() {
        assert_eq!(decode::<Vec<bool>>(b"[+,]").unwrap(), vec![true, false]);
        assert_eq!(decode::<Vec<bool>>(b"[,]").unwrap(), vec![false, false]);
        assert_eq!(decode::<Vec<bool>>(b"[]").unwrap(), Vec::<bool>::new());
    }

    #[test]
    fn test_option_allocates_only_for_content() {
        assert_eq!(
            decode::<Vec<Option<u8>>>(b"[1,,0]").unwrap(),
            vec![Some(1), None, Some(0)]
        );
    }

    #[test]
    fn test_container_delimiters_are_checked() {
        assert!(decode::<Vec<u8>>(b"{1}").unwrap_err().is_malformed());
        assert!(decode::<Vec<u8>>(b"[1").unwrap_err().is_malformed());
        assert!(decode::<Vec<u8>>(b"[").unwrap_err().is_malformed());
    }

    #[test]
    fn test_wrong_destination() {
        let registry = Registry::new();
        let coder = registry.coder::<Vec<u8>>().unwrap();
        let mut wrong = String::new();
        let err = coder.decode(b"[1]", &mut wrong).unwrap_err();
        assert!(matches!(err, Error::NotAddressable { .. }));
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim(b" \r\n{1}\n"), b"{1}");
        assert_eq!(trim(b"   "), b"");
        assert_eq!(trim(b""), b"");
    }
}
