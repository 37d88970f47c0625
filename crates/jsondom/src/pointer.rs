//! JSON Pointer (RFC 6901) navigation.
//!
//! ```
//! use jsondom::{parse, Pointer};
//!
//! let doc = parse(r#"{"a/b": [{"c": 1}]}"#)?;
//! let pointer: Pointer = "/a~1b/0/c".parse()?;
//! assert_eq!(pointer.resolve(&doc)?.as_int()?, 1);
//! assert_eq!(doc.pointer("/a~1b/0/c"), pointer.try_resolve(&doc));
//! # Ok::<(), jsondom::Error>(())
//! ```

use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::value::Value;

/// A parsed RFC 6901 pointer: a sequence of reference tokens with `~1`
/// (`/`) and `~0` (`~`) already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    tokens: Vec<Box<str>>,
}

impl Pointer {
    /// Parse a pointer string. The empty string references the whole
    /// document; anything else must start with `/`.
    pub fn parse(text: &str) -> Result<Pointer> {
        if text.is_empty() {
            return Ok(Pointer { tokens: Vec::new() });
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(Error::new(
                ErrorKind::UnexpectedCharacter,
                "JSON pointer must start with '/' or be empty",
            ));
        };
        let tokens = rest
            .split('/')
            .map(unescape_token)
            .collect::<Result<Vec<_>>>()?;
        Ok(Pointer { tokens })
    }

    /// The unescaped reference tokens, in order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| &**t)
    }

    /// Walk the pointer from `root`, failing with the reason the path
    /// does not resolve.
    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        let mut current = root;
        for (depth, token) in self.tokens.iter().enumerate() {
            current = if let Some(object) = current.try_object() {
                object.find(token).ok_or_else(|| {
                    Error::new(
                        ErrorKind::KeyNotFound,
                        format!("JSON pointer: key not found \"{token}\" at depth {depth}"),
                    )
                })?
            } else if let Some(array) = current.try_array() {
                let index = parse_index(token).ok_or_else(|| {
                    Error::new(
                        ErrorKind::OutOfRange,
                        format!("JSON pointer: invalid array index \"{token}\""),
                    )
                })?;
                array.get(index).ok_or_else(|| {
                    Error::new(
                        ErrorKind::OutOfRange,
                        format!(
                            "JSON pointer: index {index} out of range (len={})",
                            array.len()
                        ),
                    )
                })?
            } else {
                return Err(Error::new(
                    ErrorKind::TypeMismatch,
                    format!(
                        "JSON pointer: cannot index into {} at depth {depth}",
                        current.kind().name()
                    ),
                ));
            };
        }
        Ok(current)
    }

    /// Walk the pointer without constructing an error on a miss.
    pub fn try_resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        let mut current = root;
        for token in &self.tokens {
            current = if let Some(object) = current.try_object() {
                object.find(token)?
            } else if let Some(array) = current.try_array() {
                array.get(parse_index(token)?)?
            } else {
                return None;
            };
        }
        Some(current)
    }
}

impl FromStr for Pointer {
    type Err = Error;

    fn from_str(text: &str) -> Result<Pointer> {
        Pointer::parse(text)
    }
}

impl Value {
    /// Resolve an RFC 6901 pointer string against this value; `None` for
    /// a malformed pointer or an unresolvable path.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        Pointer::parse(pointer).ok()?.try_resolve(self)
    }
}

fn unescape_token(segment: &str) -> Result<Box<str>> {
    if !segment.contains('~') {
        return Ok(segment.into());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidEscape,
                    format!("invalid '~' escape in JSON pointer token \"{segment}\""),
                ))
            }
        }
    }
    Ok(out.into_boxed_str())
}

/// Canonical array index: no sign, no leading zeros (except "0" itself).
fn parse_index(token: &str) -> Option<usize> {
    if token.starts_with('+') || (token.starts_with('0') && token.len() != 1) {
        return None;
    }
    token.parse().ok()
}
