//! Boundary scanning for IDO bodies.
//!
//! The scanner knows nothing about types. It answers two questions about a
//! byte span:
//!
//! - where does the next top-level token inside a struct or sequence body end
//!   ([`next_token`], [`tokens`])
//! - where does the next complete record end ([`object_span`])
//!
//! Both walk the same state machine, so they always agree on where quoted
//! regions begin and end. Outside quotes `{`/`}` and `[`/`]` adjust two depth
//! counters and `"` opens a quote; inside quotes only the closing `"` and the
//! escaping `\` are significant.
//!
//! ```rust
//! use ido::scan::{object_span, tokens};
//!
//! let input = br#"  {"a,b\"}c",1}{2}"#;
//! let span = object_span(input).unwrap();
//! assert_eq!(&input[span], br#"{"a,b\"}c",1}"#);
//!
//! let body = br#""a,b\"}c",1"#;
//! let parts: Vec<&[u8]> = tokens(body).collect::<Result<_, _>>().unwrap();
//! assert_eq!(parts, vec![&br#""a,b\"}c""#[..], &b"1"[..]]);
//! ```

use crate::format::{
    ESCAPE, QUOTE, RECORD_SEPARATOR, SEPARATOR, SEQ_CLOSE, SEQ_OPEN, STRUCT_CLOSE, STRUCT_OPEN,
};
use crate::{Error, Result};
use std::ops::Range;

#[derive(Debug, Default)]
struct ScanState {
    braces: isize,
    brackets: isize,
    in_quote: bool,
    escaped: bool,
}

impl ScanState {
    /// Feeds one byte. Returns `false` while the byte sits inside a quoted
    /// region (the closing quote included).
    #[inline]
    fn step(&mut self, byte: u8) -> bool {
        if self.in_quote {
            if self.escaped {
                self.escaped = false;
            } else if byte == ESCAPE {
                self.escaped = true;
            } else if byte == QUOTE {
                self.in_quote = false;
            }
            return false;
        }

        match byte {
            STRUCT_OPEN => self.braces += 1,
            STRUCT_CLOSE => self.braces -= 1,
            SEQ_OPEN => self.brackets += 1,
            SEQ_CLOSE => self.brackets -= 1,
            QUOTE => self.in_quote = true,
            _ => {}
        }
        true
    }

    #[inline]
    fn balanced(&self) -> bool {
        self.braces == 0 && self.brackets == 0
    }

    #[inline]
    fn underflow(&self) -> bool {
        self.braces < 0 || self.brackets < 0
    }
}

/// Splits the next top-level token off a struct or sequence body.
///
/// Returns the token and the number of bytes consumed, separator included.
/// When no separator is left the whole remaining input is the token and the
/// consumed count equals its length.
///
/// # Errors
///
/// Returns [`Error::Malformed`] for an unterminated quoted string or
/// unbalanced containers.
///
/// # Examples
///
/// ```rust
/// use ido::scan::next_token;
///
/// let (token, advance) = next_token(b"[1,2],3").unwrap();
/// assert_eq!(token, b"[1,2]");
/// assert_eq!(advance, 6);
/// ```
pub fn next_token(data: &[u8]) -> Result<(&[u8], usize)> {
    let mut state = ScanState::default();

    for (i, &byte) in data.iter().enumerate() {
        if !state.step(byte) {
            continue;
        }
        if state.underflow() {
            return Err(Error::malformed(data, "unbalanced container"));
        }
        if byte == SEPARATOR && state.balanced() {
            return Ok((&data[..i], i + 1));
        }
    }

    if state.in_quote {
        Err(Error::malformed(data, "unterminated string"))
    } else if !state.balanced() {
        Err(Error::malformed(data, "unbalanced container"))
    } else {
        Ok((data, data.len()))
    }
}

/// Iterates over the positional tokens of a struct or sequence body (the
/// bytes between the outer delimiters).
///
/// An empty body has no tokens. A body ending in a separator yields a final
/// empty token, so `"+,"` is two tokens.
pub fn tokens(body: &[u8]) -> Tokens<'_> {
    Tokens {
        rest: body,
        done: body.is_empty(),
    }
}

/// Iterator returned by [`tokens`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a [u8],
    done: bool,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match next_token(self.rest) {
            Ok((token, advance)) => {
                if advance > token.len() {
                    self.rest = &self.rest[advance..];
                } else {
                    self.done = true;
                }
                Some(Ok(token))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Locates the first complete record in `data`.
///
/// Leading whitespace is skipped. A record starting with `{` or `[` ends at
/// the delimiter that balances it; any other record is a bare scalar that ends
/// just before the next [`RECORD_SEPARATOR`] outside quotes. A container that
/// closes a delimiter it never opened cannot balance, so it ends at the next
/// record separator as well and is left for the decoder to reject.
///
/// Returns `None` when `data` is empty, whitespace only, or holds an
/// incomplete record: the caller should read more input.
///
/// # Examples
///
/// ```rust
/// use ido::scan::object_span;
///
/// assert_eq!(object_span(b"\n[1,[2]]\n"), Some(1..8));
/// assert_eq!(object_span(b"{1,2"), None);
/// assert_eq!(object_span(b"  \n"), None);
/// assert_eq!(object_span(b"{1]}\n{2}"), Some(0..4));
/// ```
pub fn object_span(data: &[u8]) -> Option<Range<usize>> {
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let mut by_line = !matches!(data[start], STRUCT_OPEN | SEQ_OPEN);
    let mut state = ScanState::default();

    for (offset, &byte) in data[start..].iter().enumerate() {
        let outside = state.step(byte);
        let at = start + offset;
        if outside && state.underflow() {
            by_line = true;
        }
        if by_line {
            if outside && byte == RECORD_SEPARATOR {
                return Some(start..at);
            }
        } else if outside && state.balanced() {
            return Some(start..at + 1);
        }
    }

    None
}

/// Whether `data` closes a container it never opened, outside quotes.
pub(crate) fn closes_early(data: &[u8]) -> bool {
    let mut state = ScanState::default();
    data.iter()
        .any(|&byte| state.step(byte) && state.underflow())
}
