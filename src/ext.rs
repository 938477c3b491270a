//! Types that supply their own bytes.
//!
//! An [`Extension`] bypasses the structural plan entirely: the encoder writes
//! whatever [`Extension::encode_ido`] appends, and the decoder hands the whole
//! token, delimiters included, to [`Extension::decode_ido`]. Register the type
//! with [`extension!`](crate::extension).
//!
//! The bytes an extension writes must keep the surrounding record scannable:
//! separators and container delimiters have to sit inside a quoted region or
//! inside balanced `{}`/`[]`.
//!
//! ```rust
//! use ido::{Error, Extension, Result};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Version(u16, u16, u16);
//!
//! impl Extension for Version {
//!     fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()> {
//!         out.extend_from_slice(format!("{}.{}.{}", self.0, self.1, self.2).as_bytes());
//!         Ok(())
//!     }
//!
//!     fn decode_ido(&mut self, data: &[u8]) -> Result<()> {
//!         let text = std::str::from_utf8(data).map_err(Error::custom)?;
//!         let parts: Vec<u16> = text
//!             .split('.')
//!             .map(str::parse)
//!             .collect::<std::result::Result<_, _>>()
//!             .map_err(Error::custom)?;
//!         match parts[..] {
//!             [major, minor, patch] => {
//!                 *self = Version(major, minor, patch);
//!                 Ok(())
//!             }
//!             _ => Err(Error::custom("version must have three parts")),
//!         }
//!     }
//!
//!     fn is_zero(&self) -> bool {
//!         *self == Version::default()
//!     }
//! }
//!
//! ido::extension!(Version);
//!
//! assert_eq!(ido::to_string(&Version(1, 4, 2)).unwrap(), "1.4.2");
//! let version: Version = ido::from_str("1.4.2").unwrap();
//! assert_eq!(version, Version(1, 4, 2));
//! ```

use crate::shape::{Layout, Shape};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::any::Any;

/// Custom byte conversion for one type.
pub trait Extension: Any {
    /// Appends the encoding of `self` to `out`.
    fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Overwrites `self` from a complete, non-empty token.
    fn decode_ido(&mut self, data: &[u8]) -> Result<()>;

    /// Whether a struct field holding this value is written as an empty slot.
    fn is_zero(&self) -> bool {
        false
    }
}

/// Timestamps travel as microseconds since the Unix epoch. The epoch itself
/// is the zero value.
impl Extension for DateTime<Utc> {
    fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        out.extend_from_slice(buf.format(self.timestamp_micros()).as_bytes());
        Ok(())
    }

    fn decode_ido(&mut self, data: &[u8]) -> Result<()> {
        let micros: i64 = std::str::from_utf8(data)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| Error::malformed(data, "invalid timestamp"))?;
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        *self = DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| Error::malformed(data, "timestamp out of range"))?;
        Ok(())
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl Shape for DateTime<Utc> {
    fn layout() -> Layout {
        Layout::extension::<Self>()
    }
}
