//! # jsondom
//!
//! A JSON document model, parser, and serializer built for throughput:
//! SIMD-accelerated scanning, a compact 24-byte [`Value`] with
//! small-string optimization, and optional arena-backed allocation for
//! predictable, reusable memory in parse-heavy services.
//!
//! ## Parsing and the DOM
//!
//! ```
//! let value = jsondom::parse(r#"{"name":"Ada","scores":[95.5,87]}"#)?;
//! assert_eq!(value["name"].as_str()?, "Ada");
//! assert_eq!(value["scores"][1].as_int()?, 87);
//! assert_eq!(value.dump(-1), r#"{"name":"Ada","scores":[95.5,87]}"#);
//! # Ok::<(), jsondom::Error>(())
//! ```
//!
//! Non-standard inputs (comments, trailing commas, JSON5-style extras)
//! are opt-in through [`ParseOptions`]; output formatting (pretty
//! printing, ASCII-only escaping, key sorting) through
//! [`SerializeOptions`].
//!
//! ## Arena parsing
//!
//! Latency-sensitive loops parse into an [`ArenaDocument`]: the whole
//! tree is bump-allocated from one arena and released in O(1) by
//! [`ArenaDocument::reset`].
//!
//! ```
//! let mut doc = jsondom::ArenaDocument::new();
//! for _ in 0..3 {
//!     doc.parse(r#"{"type":"scan","rssi":-42,"channel":36}"#)?;
//!     assert_eq!(doc.root()["rssi"].as_int()?, -42);
//!     doc.reset();
//! }
//! # Ok::<(), jsondom::Error>(())
//! ```
//!
//! Arena-backed values must not outlive their document; cloning a value
//! outside the arena scope produces an ordinary heap value that may.
//!
//! ## Beyond the DOM
//!
//! [`Pointer`] resolves RFC 6901 JSON Pointers, and [`Writer`] emits
//! JSON incrementally without building a tree.

mod arena;
mod document;
mod error;
mod hash;
mod num;
mod options;
mod parser;
mod pointer;
mod ser;
mod simd;
mod utf8;
mod value;
mod writer;

pub use arena::{Arena, ArenaScope};
pub use document::ArenaDocument;
pub use error::{Error, ErrorKind, Location, Result};
pub use options::{ParseOptions, SerializeOptions, DEFAULT_MAX_DEPTH};
pub use parser::{
    parse, parse_slice, parse_slice_with_options, parse_with_arena, parse_with_options,
};
pub use pointer::Pointer;
pub use ser::{to_string, to_writer};
pub use value::{Array, Kind, Object, Value, ValueIndex};
pub use writer::Writer;
