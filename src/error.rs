//! Error types for IDO encoding and decoding.
//!
//! ## Error Categories
//!
//! - **Malformed input**: a token that cannot be parsed as the type it is
//!   decoded into, an unterminated quoted string, or unbalanced containers
//! - **Unsupported shape**: a type the codec compiler cannot build a plan for
//! - **Truncated stream**: input ended in the middle of a record
//! - **Usage errors**: a destination or value that does not match the coder
//!   it was handed to
//! - **I/O errors**: failures of the underlying reader or writer
//!
//! A clean end of stream is not an error: the streaming [`Decoder`] reports it
//! as `Ok(None)` so callers can tell "no more records" from
//! [`Error::Truncated`].
//!
//! ## Examples
//!
//! ```rust
//! use ido::{from_slice, Error};
//!
//! let result: Result<u32, Error> = from_slice(b"12x");
//! assert!(matches!(result, Err(Error::Malformed { .. })));
//! ```
//!
//! [`Decoder`]: crate::Decoder

use std::fmt;
use thiserror::Error;

/// Tokens longer than this are shortened in error messages.
const TOKEN_PREVIEW: usize = 64;

/// Represents all possible errors that can occur while encoding or decoding IDO.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// A token could not be decoded
    #[error("Malformed token `{token}`: {reason}")]
    Malformed { token: String, reason: String },

    /// The codec compiler has no plan for this type
    #[error("Unsupported type {type_name}: {reason}")]
    Unsupported { type_name: String, reason: String },

    /// Input ended with a partially buffered record
    #[error("Truncated stream: {buffered} bytes of an incomplete record")]
    Truncated { buffered: usize },

    /// The destination handed to a decoder cannot be written as the coder's type
    #[error("Destination is not an addressable {type_name}")]
    NotAddressable { type_name: String },

    /// The value handed to an encoder is not the coder's type
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch { expected: String },

    /// Custom error, usually raised by an extension hook
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a malformed-input error naming the offending token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ido::Error;
    ///
    /// let err = Error::malformed(b"12x", "invalid u32");
    /// assert!(err.to_string().contains("`12x`"));
    /// ```
    pub fn malformed(token: &[u8], reason: &str) -> Self {
        let preview = if token.len() > TOKEN_PREVIEW {
            format!("{}...", String::from_utf8_lossy(&token[..TOKEN_PREVIEW]))
        } else {
            String::from_utf8_lossy(token).into_owned()
        };
        Error::Malformed {
            token: preview,
            reason: reason.to_string(),
        }
    }

    /// Creates an unsupported-shape error for a type the compiler rejects.
    pub fn unsupported(type_name: &str, reason: &str) -> Self {
        Error::Unsupported {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a truncation error for a stream that ended mid-record.
    pub fn truncated(buffered: usize) -> Self {
        Error::Truncated { buffered }
    }

    /// Creates a usage error for a destination that is not the coder's type.
    pub fn not_addressable(type_name: &str) -> Self {
        Error::NotAddressable {
            type_name: type_name.to_string(),
        }
    }

    /// Creates a usage error for a value that is not the coder's type.
    pub fn type_mismatch(expected: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ido::Error;
    ///
    /// let err = Error::custom("version must have three parts");
    /// assert!(err.to_string().contains("three parts"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reader or writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` if the input ended in the middle of a record.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }

    /// Returns `true` if a token could not be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed { .. })
    }

    /// Returns `true` if a type has no encodable plan.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
