//! Incremental (push-style) JSON writer.
//!
//! Emits JSON without building a DOM. A small state machine enforces
//! well-formedness as values are pushed: keys only inside objects,
//! key/value alternation, balanced containers, one root value. Commas and
//! (in pretty mode) newlines and indentation are inserted automatically.
//!
//! ```
//! let mut w = jsondom::Writer::new();
//! w.begin_object()?;
//! w.key("name")?.string_value("Alice")?;
//! w.key("scores")?.begin_array()?;
//! w.int_value(100)?.int_value(95)?;
//! w.end_array()?;
//! w.end_object()?;
//! assert_eq!(w.finish()?, r#"{"name":"Alice","scores":[100,95]}"#);
//! # Ok::<(), jsondom::Error>(())
//! ```

use smallvec::SmallVec;

use crate::error::{Error, ErrorKind, Result};
use crate::num;
use crate::ser::escape_str_into;

#[derive(Clone, Copy)]
enum Frame {
    Object {
        has_entries: bool,
        expect_value: bool,
    },
    Array {
        has_entries: bool,
    },
}

/// Streaming JSON builder with structural validation.
pub struct Writer {
    out: Vec<u8>,
    indent: i32,
    frames: SmallVec<[Frame; 16]>,
    root_written: bool,
}

impl Writer {
    /// Compact writer.
    pub fn new() -> Writer {
        Writer::with_indent(-1)
    }

    /// `indent >= 0` pretty-prints with that many spaces per level.
    pub fn with_indent(indent: i32) -> Writer {
        Writer {
            out: Vec::new(),
            indent,
            frames: SmallVec::new(),
            root_written: false,
        }
    }

    fn structure_error(&self, message: &str) -> Error {
        Error::new(ErrorKind::UnexpectedCharacter, message)
    }

    fn newline_indent(&mut self) {
        if self.indent >= 0 {
            self.out.push(b'\n');
            let mut n = self.frames.len() * self.indent as usize;
            const SPACES: [u8; 64] = [b' '; 64];
            while n > 0 {
                let chunk = n.min(SPACES.len());
                self.out.extend_from_slice(&SPACES[..chunk]);
                n -= chunk;
            }
        }
    }

    /// Separator and placement before a value; rejects values written
    /// where the grammar does not allow one.
    fn pre_value(&mut self) -> Result<()> {
        match self.frames.last() {
            None => {
                if self.root_written {
                    return Err(self.structure_error("multiple root values"));
                }
                Ok(())
            }
            Some(Frame::Array { has_entries }) => {
                if *has_entries {
                    self.out.push(b',');
                }
                self.newline_indent();
                Ok(())
            }
            Some(Frame::Object { expect_value, .. }) => {
                if !expect_value {
                    return Err(self.structure_error("value written where a key was expected"));
                }
                Ok(())
            }
        }
    }

    fn post_value(&mut self) {
        match self.frames.last_mut() {
            None => self.root_written = true,
            Some(Frame::Array { has_entries }) => *has_entries = true,
            Some(Frame::Object {
                has_entries,
                expect_value,
            }) => {
                *has_entries = true;
                *expect_value = false;
            }
        }
    }

    fn raw_value(&mut self, bytes: &[u8]) -> Result<&mut Writer> {
        self.pre_value()?;
        self.out.extend_from_slice(bytes);
        self.post_value();
        Ok(self)
    }

    /// Write an object key. Only legal inside an object, alternating with
    /// values.
    pub fn key(&mut self, key: &str) -> Result<&mut Writer> {
        let (has_entries, accepts_key) = match self.frames.last() {
            Some(Frame::Object {
                has_entries,
                expect_value,
            }) => (*has_entries, !expect_value),
            _ => (false, false),
        };
        if !accepts_key {
            return Err(self.structure_error("key is only valid inside an object, before a value"));
        }
        if has_entries {
            self.out.push(b',');
        }
        self.newline_indent();
        escape_str_into(&mut self.out, key);
        self.out.push(b':');
        if self.indent >= 0 {
            self.out.push(b' ');
        }
        if let Some(Frame::Object { expect_value, .. }) = self.frames.last_mut() {
            *expect_value = true;
        }
        Ok(self)
    }

    pub fn begin_object(&mut self) -> Result<&mut Writer> {
        self.pre_value()?;
        self.out.push(b'{');
        self.frames.push(Frame::Object {
            has_entries: false,
            expect_value: false,
        });
        Ok(self)
    }

    pub fn end_object(&mut self) -> Result<&mut Writer> {
        match self.frames.last() {
            Some(Frame::Object {
                expect_value: false,
                has_entries,
            }) => {
                let had_entries = *has_entries;
                self.frames.pop();
                if had_entries {
                    self.newline_indent();
                }
                self.out.push(b'}');
                self.post_value();
                Ok(self)
            }
            Some(Frame::Object { .. }) => {
                Err(self.structure_error("end_object after a key with no value"))
            }
            _ => Err(self.structure_error("end_object without a matching begin_object")),
        }
    }

    pub fn begin_array(&mut self) -> Result<&mut Writer> {
        self.pre_value()?;
        self.out.push(b'[');
        self.frames.push(Frame::Array { has_entries: false });
        Ok(self)
    }

    pub fn end_array(&mut self) -> Result<&mut Writer> {
        match self.frames.last() {
            Some(Frame::Array { has_entries }) => {
                let had_entries = *has_entries;
                self.frames.pop();
                if had_entries {
                    self.newline_indent();
                }
                self.out.push(b']');
                self.post_value();
                Ok(self)
            }
            _ => Err(self.structure_error("end_array without a matching begin_array")),
        }
    }

    pub fn null_value(&mut self) -> Result<&mut Writer> {
        self.raw_value(b"null")
    }

    pub fn bool_value(&mut self, value: bool) -> Result<&mut Writer> {
        self.raw_value(if value { &b"true"[..] } else { &b"false"[..] })
    }

    pub fn int_value(&mut self, value: i64) -> Result<&mut Writer> {
        let mut buf = [0u8; num::INT_BUF_LEN + 1];
        let n = num::write_i64(&mut buf, value);
        self.raw_value(&buf[..n])
    }

    pub fn uint_value(&mut self, value: u64) -> Result<&mut Writer> {
        let mut buf = [0u8; num::INT_BUF_LEN];
        let n = num::write_u64(&mut buf, value);
        self.raw_value(&buf[..n])
    }

    /// Non-finite floats write `null`, like the DOM serializer's default.
    pub fn float_value(&mut self, value: f64) -> Result<&mut Writer> {
        if !value.is_finite() {
            return self.raw_value(b"null");
        }
        let mut buf = [0u8; num::F64_BUF_LEN];
        let n = num::write_f64(&mut buf, value);
        self.raw_value(&buf[..n])
    }

    pub fn string_value(&mut self, value: &str) -> Result<&mut Writer> {
        self.pre_value()?;
        escape_str_into(&mut self.out, value);
        self.post_value();
        Ok(self)
    }

    /// Finish and return the output; fails if containers are unclosed or
    /// no root value was written.
    pub fn finish(self) -> Result<String> {
        if !self.frames.is_empty() {
            return Err(self.structure_error("unclosed container at finish"));
        }
        if !self.root_written {
            return Err(self.structure_error("no value written"));
        }
        // SAFETY: the writer emits ASCII syntax and escaped string
        // contents from &str inputs.
        Ok(unsafe { String::from_utf8_unchecked(self.out) })
    }
}

impl Default for Writer {
    fn default() -> Writer {
        Writer::new()
    }
}
