//! The IDO wire format.
//!
//! IDO trades self-description for density. A decoder must already know the
//! target type: nothing on the wire names a field or a type.
//!
//! # Grammar
//!
//! ```text
//! object    := struct | sequence
//! struct    := '{' fields? '}'
//! fields    := field (',' field)*
//! field     := '' | scalar | struct | sequence
//! sequence  := '[' elements? ']'
//! elements  := element (',' element)*
//! element   := '' | scalar | struct | sequence
//! scalar    := string | number | '+' | timestamp
//! string    := '"' (escaped-char | char)* '"' | raw-bytes
//! number    := ['-'] digit+ ['.' digit+]
//! timestamp := ['-'] digit+
//! ```
//!
//! # Structs
//!
//! Fields are written in declaration order, each followed by a `,`; the last
//! separator is then overwritten by `}`. Position is the only field identity,
//! so encoder and decoder must agree on the field list, including which
//! fields are excluded with `#[ido(skip)]`.
//!
//! A field holding its type's zero value writes nothing but keeps its slot:
//!
//! ```text
//! { name: "Jo\"e", age: 0, active: true }   =>   {"Jo\"e",,+}
//! ```
//!
//! When decoding, a missing trailing field or an empty slot leaves the
//! destination field untouched, and surplus tokens are ignored.
//!
//! # Sequences
//!
//! `[` + comma-joined elements + `]`. Elements are written in full, without
//! zero suppression, except for values whose own encoding is empty (`false`,
//! `None`). An empty sequence is `[]`. Decoding clears the destination before
//! appending.
//!
//! A sequence of exactly one empty-encoding element (`vec![false]`) is
//! written as `[]` and therefore reads back empty.
//!
//! # Scalars
//!
//! | Type                   | Encoding                                       |
//! |------------------------|------------------------------------------------|
//! | `String`               | `"..."` with `"` and `\` escaped by `\`        |
//! | `bool`                 | `+` for true, nothing for false                |
//! | integers up to 128 bit | base 10, leading `-` when negative             |
//! | `f32`, `f64`           | shortest round-trip decimal, no exponent       |
//! | `DateTime<Utc>`        | microseconds since the Unix epoch              |
//! | `Option<T>`, `Box<T>`  | nothing when absent, otherwise `T`             |
//!
//! Decoding a string accepts a bare, unquoted token verbatim. Inside quotes a
//! backslash makes the next byte literal.
//!
//! # Streams
//!
//! Each record is followed by a single [`RECORD_SEPARATOR`]. A reader locates
//! the end of a record by balancing `{}` and `[]` outside quoted regions, so
//! separators are only needed to terminate bare scalar records.

/// Separates fields in a struct and elements in a sequence.
pub const SEPARATOR: u8 = b',';

/// Terminates each record in a stream.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Encodes `true`; `false` is encoded as nothing.
pub const TRUE_MARKER: u8 = b'+';

/// Delimits a quoted string.
pub const QUOTE: u8 = b'"';

/// Inside a quoted string, makes the following byte literal.
pub const ESCAPE: u8 = b'\\';

pub const STRUCT_OPEN: u8 = b'{';
pub const STRUCT_CLOSE: u8 = b'}';
pub const SEQ_OPEN: u8 = b'[';
pub const SEQ_CLOSE: u8 = b']';
