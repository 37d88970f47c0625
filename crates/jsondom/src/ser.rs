//! Serializer.
//!
//! Output goes through a [`Sink`]: the string sink writes into a `Vec<u8>`
//! (already amortized, no staging buffer needed), the stream sink batches
//! into an 8 KiB buffer so a `Write` implementation sees few large writes
//! instead of many small ones, with oversized writes bypassing the buffer.
//!
//! Pretty-printing and ASCII-escaping are const-generic parameters of the
//! core, so the four combinations are separate monomorphizations and the
//! inner loops carry no per-byte mode branches; the public entry points
//! pick the instantiation from [`SerializeOptions`] once per call.

use std::convert::Infallible;
use std::fmt;
use std::io;

use smallvec::SmallVec;

use crate::num;
use crate::options::SerializeOptions;
use crate::simd;
use crate::utf8;
use crate::value::{Array, Object, Value, ValueView};

/// Serialize to an owned string.
pub fn to_string(value: &Value, opts: &SerializeOptions) -> String {
    let mut out = Vec::new();
    // O(1) size hint from the root element count only; avoids the first
    // few reallocations on large documents without a tree walk.
    let hint = size_hint(value);
    if hint > 4096 {
        out.reserve(hint);
    }
    let mut sink = StringSink { out: &mut out };
    match serialize_into(&mut sink, value, opts) {
        // SAFETY: the serializer emits JSON text: ASCII syntax plus string
        // contents that are themselves valid UTF-8.
        Ok(()) => unsafe { String::from_utf8_unchecked(out) },
        Err(never) => match never {},
    }
}

/// Serialize to an `io::Write` sink through the buffered adapter.
pub fn to_writer<W: io::Write>(
    writer: &mut W,
    value: &Value,
    opts: &SerializeOptions,
) -> io::Result<()> {
    let mut sink = StreamSink::new(writer);
    serialize_into(&mut sink, value, opts)?;
    sink.finish()
}

impl Value {
    /// Serialize; `indent < 0` is compact, `indent >= 0` pretty-prints.
    pub fn dump(&self, indent: i32) -> String {
        to_string(
            self,
            &SerializeOptions {
                indent,
                ..SerializeOptions::compact()
            },
        )
    }

    /// Serialize with full [`SerializeOptions`].
    pub fn dump_with(&self, opts: &SerializeOptions) -> String {
        to_string(self, opts)
    }
}

impl fmt::Display for Value {
    /// Compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_string(self, &SerializeOptions::compact()))
    }
}

/// Escape `text` as a JSON string literal (quotes included) into `out`.
/// Shared with the incremental writer.
pub(crate) fn escape_str_into(out: &mut Vec<u8>, text: &str) {
    let opts = SerializeOptions::compact();
    let mut sink = StringSink { out };
    let mut core = SerializerCore::<_, false, false>::new(&mut sink, &opts);
    match core.write_string(text) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

fn size_hint(value: &Value) -> usize {
    match value.view() {
        ValueView::Array(array) => array.len() * 64 + 2,
        ValueView::Object(object) => object.len() * 80 + 2,
        ValueView::Str(s) => s.len() + 2,
        _ => 16,
    }
}

fn serialize_into<S: Sink>(
    sink: &mut S,
    value: &Value,
    opts: &SerializeOptions,
) -> Result<(), S::Error> {
    match (opts.indent >= 0, opts.ensure_ascii) {
        (false, false) => SerializerCore::<_, false, false>::new(sink, opts).write_value(value),
        (false, true) => SerializerCore::<_, false, true>::new(sink, opts).write_value(value),
        (true, false) => SerializerCore::<_, true, false>::new(sink, opts).write_value(value),
        (true, true) => SerializerCore::<_, true, true>::new(sink, opts).write_value(value),
    }
}

pub(crate) trait Sink {
    type Error;
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.write(&[byte])
    }
}

struct StringSink<'a> {
    out: &'a mut Vec<u8>,
}

impl Sink for StringSink<'_> {
    type Error = Infallible;

    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), Infallible> {
        self.out.push(byte);
        Ok(())
    }
}

const STREAM_BUF: usize = 8192;

/// Buffered adapter over `io::Write`: batches small writes, hands writes
/// of a buffer-length or more straight to the underlying writer.
pub(crate) struct StreamSink<'w, W: io::Write> {
    writer: &'w mut W,
    buf: [u8; STREAM_BUF],
    filled: usize,
}

impl<'w, W: io::Write> StreamSink<'w, W> {
    fn new(writer: &'w mut W) -> StreamSink<'w, W> {
        StreamSink {
            writer,
            buf: [0; STREAM_BUF],
            filled: 0,
        }
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        if self.filled > 0 {
            self.writer.write_all(&self.buf[..self.filled])?;
            self.filled = 0;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.flush_buf()
    }
}

impl<W: io::Write> Sink for StreamSink<'_, W> {
    type Error = io::Error;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.filled + bytes.len() <= STREAM_BUF {
            self.buf[self.filled..self.filled + bytes.len()].copy_from_slice(bytes);
            self.filled += bytes.len();
            return Ok(());
        }
        self.flush_buf()?;
        if bytes.len() >= STREAM_BUF {
            self.writer.write_all(bytes)
        } else {
            self.buf[..bytes.len()].copy_from_slice(bytes);
            self.filled = bytes.len();
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
struct ControlEscape {
    bytes: [u8; 6],
    len: u8,
}

const fn short_escape(c: u8) -> ControlEscape {
    ControlEscape {
        bytes: [b'\\', c, 0, 0, 0, 0],
        len: 2,
    }
}

/// Escapes for bytes 0x00..0x1F: the five short forms, `\u00XX` for the
/// rest.
const CONTROL_ESCAPES: [ControlEscape; 32] = {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut table = [ControlEscape {
        bytes: [0; 6],
        len: 0,
    }; 32];
    let mut i = 0;
    while i < 32 {
        table[i] = ControlEscape {
            bytes: [
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[(i >> 4) & 0xF],
                HEX[i & 0xF],
            ],
            len: 6,
        };
        i += 1;
    }
    table[0x08] = short_escape(b'b');
    table[0x09] = short_escape(b't');
    table[0x0A] = short_escape(b'n');
    table[0x0C] = short_escape(b'f');
    table[0x0D] = short_escape(b'r');
    table
};

const SPACES: [u8; 256] = [b' '; 256];

struct SerializerCore<'a, S: Sink, const PRETTY: bool, const ASCII: bool> {
    sink: &'a mut S,
    opts: &'a SerializeOptions,
    indent: usize,
}

impl<'a, S: Sink, const PRETTY: bool, const ASCII: bool> SerializerCore<'a, S, PRETTY, ASCII> {
    fn new(sink: &'a mut S, opts: &'a SerializeOptions) -> Self {
        SerializerCore {
            sink,
            opts,
            indent: 0,
        }
    }

    fn write_value(&mut self, value: &Value) -> Result<(), S::Error> {
        match value.view() {
            ValueView::Null => self.sink.write(b"null"),
            ValueView::Bool(true) => self.sink.write(b"true"),
            ValueView::Bool(false) => self.sink.write(b"false"),
            ValueView::Int(v) => {
                let mut buf = [0u8; num::INT_BUF_LEN + 1];
                let n = num::write_i64(&mut buf, v);
                self.sink.write(&buf[..n])
            }
            ValueView::UInt(v) => {
                let mut buf = [0u8; num::INT_BUF_LEN];
                let n = num::write_u64(&mut buf, v);
                self.sink.write(&buf[..n])
            }
            ValueView::Float(v) => self.write_float(v),
            ValueView::Str(s) => self.write_string(s),
            ValueView::Array(array) => self.write_array(array),
            ValueView::Object(object) => self.write_object(object),
        }
    }

    fn write_float(&mut self, v: f64) -> Result<(), S::Error> {
        if v.is_nan() {
            return self.sink.write(if self.opts.allow_nan_inf {
                &b"NaN"[..]
            } else {
                &b"null"[..]
            });
        }
        if v.is_infinite() {
            return self.sink.write(match (self.opts.allow_nan_inf, v < 0.0) {
                (true, false) => &b"Infinity"[..],
                (true, true) => &b"-Infinity"[..],
                (false, _) => &b"null"[..],
            });
        }
        let mut buf = [0u8; num::F64_BUF_LEN];
        let n = num::write_f64(&mut buf, v);
        self.sink.write(&buf[..n])
    }

    /// Run-based escaping: bulk-write every span of passthrough bytes
    /// found by the SIMD scan, then emit one escape for the hit byte.
    fn write_string(&mut self, text: &str) -> Result<(), S::Error> {
        self.sink.write_byte(b'"')?;
        let bytes = text.as_bytes();
        let mut at = 0;
        while at < bytes.len() {
            let run = simd::find_needs_escape::<ASCII>(&bytes[at..]);
            if run > 0 {
                self.sink.write(&bytes[at..at + run])?;
                at += run;
                if at >= bytes.len() {
                    break;
                }
            }
            let b = bytes[at];
            if b < 0x20 {
                let escape = &CONTROL_ESCAPES[b as usize];
                self.sink.write(&escape.bytes[..escape.len as usize])?;
                at += 1;
            } else if b == b'"' {
                self.sink.write(b"\\\"")?;
                at += 1;
            } else if b == b'\\' {
                self.sink.write(b"\\\\")?;
                at += 1;
            } else {
                // Only reachable in ASCII mode: decode the sequence and
                // re-emit as \uXXXX (or a surrogate pair).
                debug_assert!(ASCII && b >= 0x80);
                let (cp, consumed) = utf8::decode(&bytes[at..]);
                let mut buf = [0u8; 12];
                let n = utf8::encode_escaped(cp, &mut buf);
                self.sink.write(&buf[..n])?;
                at += consumed;
            }
        }
        self.sink.write_byte(b'"')
    }

    fn write_newline(&mut self) -> Result<(), S::Error> {
        if PRETTY {
            self.sink.write_byte(b'\n')?;
        }
        Ok(())
    }

    fn write_indent(&mut self) -> Result<(), S::Error> {
        if PRETTY {
            let mut n = self.indent;
            while n > 0 {
                let chunk = n.min(SPACES.len());
                self.sink.write(&SPACES[..chunk])?;
                n -= chunk;
            }
        }
        Ok(())
    }

    fn write_array(&mut self, array: &Array) -> Result<(), S::Error> {
        if array.is_empty() {
            return self.sink.write(b"[]");
        }
        self.sink.write_byte(b'[')?;
        if PRETTY {
            self.indent += self.opts.indent as usize;
        }
        self.write_newline()?;
        for (i, value) in array.iter().enumerate() {
            if i > 0 {
                self.sink.write_byte(b',')?;
                self.write_newline()?;
            }
            self.write_indent()?;
            self.write_value(value)?;
        }
        if PRETTY {
            self.indent -= self.opts.indent as usize;
        }
        self.write_newline()?;
        self.write_indent()?;
        self.sink.write_byte(b']')
    }

    fn write_object(&mut self, object: &Object) -> Result<(), S::Error> {
        if object.is_empty() {
            return self.sink.write(b"{}");
        }
        self.sink.write_byte(b'{')?;
        if PRETTY {
            self.indent += self.opts.indent as usize;
        }
        self.write_newline()?;
        if self.opts.sort_keys {
            self.write_object_sorted(object)?;
        } else {
            self.write_object_ordered(object)?;
        }
        if PRETTY {
            self.indent -= self.opts.indent as usize;
        }
        self.write_newline()?;
        self.write_indent()?;
        self.sink.write_byte(b'}')
    }

    fn write_entry(&mut self, first: bool, key: &str, value: &Value) -> Result<(), S::Error> {
        if !first {
            self.sink.write_byte(b',')?;
            self.write_newline()?;
        }
        self.write_indent()?;
        self.write_string(key)?;
        self.sink.write_byte(b':')?;
        if PRETTY {
            self.sink.write_byte(b' ')?;
        }
        self.write_value(value)
    }

    fn write_object_ordered(&mut self, object: &Object) -> Result<(), S::Error> {
        for (i, (key, value)) in object.iter().enumerate() {
            self.write_entry(i == 0, key, value)?;
        }
        Ok(())
    }

    fn write_object_sorted(&mut self, object: &Object) -> Result<(), S::Error> {
        let entries = object.entries();
        // Up to 64 keys the index scratch lives on the stack.
        let mut order: SmallVec<[u32; 64]> = (0..entries.len() as u32).collect();
        order.sort_unstable_by(|&a, &b| {
            entries[a as usize]
                .key
                .as_bytes()
                .cmp(entries[b as usize].key.as_bytes())
        });
        for (i, &idx) in order.iter().enumerate() {
            let entry = &entries[idx as usize];
            self.write_entry(i == 0, entry.key.as_str(), &entry.value)?;
        }
        Ok(())
    }
}
