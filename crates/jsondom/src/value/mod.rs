//! The JSON value representation.
//!
//! [`Value`] is a 24-byte tagged union: a one-byte discriminant plus a
//! 16-byte payload slot holding scalar bits, a small-string buffer, or a
//! tagged container pointer. The size is a public contract (values pack
//! 2-to-a-cache-line in arrays) and is asserted at compile time.
//!
//! Variable-sized payloads (strings past the inline limit, arrays,
//! objects) consult the thread-local arena context at construction: under
//! an active [`ArenaScope`] they allocate from the arena and their
//! destructors release bookkeeping only, never the backing bytes. Clones
//! are deep copies routed through the context active *at clone time*, so
//! cloning an arena-backed value outside its scope yields an independent
//! heap value.
//!
//! [`ArenaScope`]: crate::ArenaScope

mod array;
mod object;
mod raw;
mod string;

use std::fmt;
use std::ptr::NonNull;

use num_cmp::NumCmp;

pub use array::Array;
pub use object::Object;

pub(crate) use object::ObjectIndex;
pub(crate) use string::Str;

use crate::arena::Arena;
use crate::error::{Error, ErrorKind, Result};
use raw::RawBox;

/// The eight JSON value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Array,
    Object,
}

impl Kind {
    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "integer",
            Kind::UInt => "uinteger",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

enum Repr {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(Str),
    Array(RawBox<Array>),
    Object(RawBox<Object>),
}

/// A JSON document value.
pub struct Value {
    repr: Repr,
}

pub(crate) enum ValueView<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Array(&'a Array),
    Object(&'a Object),
}

const _: () = assert!(std::mem::size_of::<Value>() == 24);

impl Value {
    /// The `null` value.
    pub const fn null() -> Value {
        Value { repr: Repr::Null }
    }

    /// An empty array allocated per the current context.
    pub fn array() -> Value {
        Value::from(Array::new())
    }

    /// An empty object allocated per the current context.
    pub fn object() -> Value {
        Value::from(Object::new())
    }

    pub fn kind(&self) -> Kind {
        match self.repr {
            Repr::Null => Kind::Null,
            Repr::Bool(_) => Kind::Bool,
            Repr::Int(_) => Kind::Int,
            Repr::UInt(_) => Kind::UInt,
            Repr::Float(_) => Kind::Float,
            Repr::String(_) => Kind::String,
            Repr::Array(_) => Kind::Array,
            Repr::Object(_) => Kind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.repr, Repr::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self.repr, Repr::Int(_))
    }

    pub fn is_uint(&self) -> bool {
        matches!(self.repr, Repr::UInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.repr, Repr::Float(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.repr, Repr::Int(_) | Repr::UInt(_) | Repr::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.repr, Repr::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.repr, Repr::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.repr, Repr::Object(_))
    }

    // Tolerant accessors: no allocation, no error construction.

    pub fn try_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Signed view of a number; unsigned values convert when they fit.
    pub fn try_int(&self) -> Option<i64> {
        match self.repr {
            Repr::Int(v) => Some(v),
            Repr::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Unsigned view of a number; signed values convert when non-negative.
    pub fn try_uint(&self) -> Option<u64> {
        match self.repr {
            Repr::UInt(v) => Some(v),
            Repr::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Widening view of any numeric variant.
    pub fn try_float(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(v) => Some(v),
            Repr::Int(v) => Some(v as f64),
            Repr::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn try_str(&self) -> Option<&str> {
        match &self.repr {
            Repr::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn try_array(&self) -> Option<&Array> {
        match &self.repr {
            Repr::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn try_array_mut(&mut self) -> Option<&mut Array> {
        match &mut self.repr {
            Repr::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn try_object(&self) -> Option<&Object> {
        match &self.repr {
            Repr::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn try_object_mut(&mut self) -> Option<&mut Object> {
        match &mut self.repr {
            Repr::Object(o) => Some(o),
            _ => None,
        }
    }

    // Failing accessors.

    pub fn as_bool(&self) -> Result<bool> {
        self.try_bool().ok_or_else(|| self.type_error("bool"))
    }

    /// Signed integer access. Unsigned values above `i64::MAX` fail with
    /// [`ErrorKind::IntegerOverflow`]; non-numeric kinds with
    /// [`ErrorKind::TypeMismatch`].
    pub fn as_int(&self) -> Result<i64> {
        match self.repr {
            Repr::Int(v) => Ok(v),
            Repr::UInt(v) => i64::try_from(v).map_err(|_| {
                Error::new(
                    ErrorKind::IntegerOverflow,
                    format!("unsigned value {v} does not fit in a signed integer"),
                )
            }),
            _ => Err(self.type_error("integer")),
        }
    }

    /// Unsigned integer access; negative values fail with
    /// [`ErrorKind::IntegerOverflow`].
    pub fn as_uint(&self) -> Result<u64> {
        match self.repr {
            Repr::UInt(v) => Ok(v),
            Repr::Int(v) => u64::try_from(v).map_err(|_| {
                Error::new(
                    ErrorKind::IntegerOverflow,
                    format!("negative value {v} does not fit in an unsigned integer"),
                )
            }),
            _ => Err(self.type_error("uinteger")),
        }
    }

    /// Numeric access with widening: any of Int/UInt/Float succeeds.
    pub fn as_float(&self) -> Result<f64> {
        self.try_float().ok_or_else(|| self.type_error("number"))
    }

    pub fn as_str(&self) -> Result<&str> {
        self.try_str().ok_or_else(|| self.type_error("string"))
    }

    pub fn as_array(&self) -> Result<&Array> {
        self.try_array().ok_or_else(|| self.type_error("array"))
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array> {
        let kind = self.kind();
        match &mut self.repr {
            Repr::Array(a) => Ok(a),
            _ => Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("expected array, got {}", kind.name()),
            )),
        }
    }

    pub fn as_object(&self) -> Result<&Object> {
        self.try_object().ok_or_else(|| self.type_error("object"))
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Object> {
        let kind = self.kind();
        match &mut self.repr {
            Repr::Object(o) => Ok(o),
            _ => Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("expected object, got {}", kind.name()),
            )),
        }
    }

    fn type_error(&self, expected: &str) -> Error {
        Error::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected}, got {}", self.kind().name()),
        )
    }

    /// Element count of an array or object; `0` for every other kind.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Array(a) => a.len(),
            Repr::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// True for `null` and for empty arrays/objects.
    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Null => true,
            Repr::Array(a) => a.is_empty(),
            Repr::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    /// Key lookup on an object; `None` for missing keys and non-objects.
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.try_object()?.find(key)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.try_object_mut()?.find_mut(key)
    }

    /// True when this is an object containing `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Non-failing indexing by array position or object key.
    pub fn get<I: ValueIndex>(&self, index: I) -> Option<&Value> {
        index.get_from(self)
    }

    pub fn get_mut<I: ValueIndex>(&mut self, index: I) -> Option<&mut Value> {
        index.get_from_mut(self)
    }

    /// Failing indexing: [`ErrorKind::OutOfRange`] for a bad array index,
    /// [`ErrorKind::KeyNotFound`] for a missing key, and
    /// [`ErrorKind::TypeMismatch`] when the kind cannot be indexed.
    pub fn at<I: ValueIndex>(&self, index: I) -> Result<&Value> {
        match index.get_from(self) {
            Some(value) => Ok(value),
            None => Err(index.missing_error(self)),
        }
    }

    /// Borrowed view for serializer dispatch.
    pub(crate) fn view(&self) -> ValueView<'_> {
        match &self.repr {
            Repr::Null => ValueView::Null,
            Repr::Bool(v) => ValueView::Bool(*v),
            Repr::Int(v) => ValueView::Int(*v),
            Repr::UInt(v) => ValueView::UInt(*v),
            Repr::Float(v) => ValueView::Float(*v),
            Repr::String(s) => ValueView::Str(s.as_str()),
            Repr::Array(a) => ValueView::Array(a),
            Repr::Object(o) => ValueView::Object(o),
        }
    }

    // Parser internals: constructors with a pre-cached arena pointer so
    // the hot loop skips the thread-local read.

    pub(crate) fn from_str_payload(payload: Str) -> Value {
        Value {
            repr: Repr::String(payload),
        }
    }

    pub(crate) fn array_in(array: Array, arena: Option<NonNull<Arena>>) -> Value {
        Value {
            repr: Repr::Array(RawBox::new_in(array, arena)),
        }
    }

    pub(crate) fn object_in(object: Object, arena: Option<NonNull<Arena>>) -> Value {
        Value {
            repr: Repr::Object(RawBox::new_in(object, arena)),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::null()
    }
}

impl Clone for Value {
    /// Deep copy. Containers and out-of-line strings are re-allocated
    /// through the arena context active at clone time, never aliased.
    fn clone(&self) -> Value {
        let repr = match &self.repr {
            Repr::Null => Repr::Null,
            Repr::Bool(v) => Repr::Bool(*v),
            Repr::Int(v) => Repr::Int(*v),
            Repr::UInt(v) => Repr::UInt(*v),
            Repr::Float(v) => Repr::Float(*v),
            Repr::String(s) => Repr::String(s.clone()),
            Repr::Array(a) => Repr::Array(a.clone()),
            Repr::Object(o) => Repr::Object(o.clone()),
        };
        Value { repr }
    }
}

impl PartialEq for Value {
    /// Structural equality. Mixed Int/UInt comparisons are exact; any
    /// comparison involving a Float converts the integer side to binary64
    /// first, which is lossy above 2^53 — `Int(i) == Float(d)` is defined
    /// as `(i as f64) == d`.
    fn eq(&self, other: &Value) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Int(a), Repr::Int(b)) => a == b,
            (Repr::UInt(a), Repr::UInt(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a == b,
            (Repr::Int(a), Repr::UInt(b)) | (Repr::UInt(b), Repr::Int(a)) => {
                NumCmp::num_eq(*a, *b)
            }
            (Repr::Int(a), Repr::Float(b)) | (Repr::Float(b), Repr::Int(a)) => *a as f64 == *b,
            (Repr::UInt(a), Repr::Float(b)) | (Repr::Float(b), Repr::UInt(a)) => *a as f64 == *b,
            (Repr::String(a), Repr::String(b)) => a == b,
            (Repr::Array(a), Repr::Array(b)) => **a == **b,
            (Repr::Object(a), Repr::Object(b)) => **a == **b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Null => f.write_str("Null"),
            Repr::Bool(v) => write!(f, "Bool({v})"),
            Repr::Int(v) => write!(f, "Int({v})"),
            Repr::UInt(v) => write!(f, "UInt({v})"),
            Repr::Float(v) => write!(f, "Float({v})"),
            Repr::String(s) => write!(f, "String({s:?})"),
            Repr::Array(a) => fmt::Debug::fmt(&**a, f),
            Repr::Object(o) => fmt::Debug::fmt(&**o, f),
        }
    }
}

// Conversions.

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::null()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value {
            repr: Repr::Bool(v),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value { repr: Repr::Int(v as i64) }
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);

macro_rules! from_small_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value { repr: Repr::Int(v as i64) }
            }
        }
    )*};
}

from_small_unsigned!(u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value {
            repr: Repr::UInt(v),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value {
            repr: Repr::Float(f64::from(v)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value {
            repr: Repr::Float(v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value {
            repr: Repr::String(Str::new(v)),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::from(v.as_str())
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Value {
        Value {
            repr: Repr::Array(RawBox::new(v)),
        }
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Value {
        Value {
            repr: Repr::Object(RawBox::new(v)),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value {
        Value::from(v.into_iter().collect::<Array>())
    }
}

// Indexing.

mod sealed {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for &str {}
}

/// Types usable with [`Value::get`] / [`Value::at`] and the `Index`
/// operators: `usize` for arrays, `&str` for objects.
pub trait ValueIndex: sealed::Sealed {
    #[doc(hidden)]
    fn get_from<'v>(&self, value: &'v Value) -> Option<&'v Value>;
    #[doc(hidden)]
    fn get_from_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value>;
    #[doc(hidden)]
    fn missing_error(&self, value: &Value) -> Error;
    #[doc(hidden)]
    fn or_insert<'v>(&self, value: &'v mut Value) -> &'v mut Value;
}

impl ValueIndex for usize {
    fn get_from<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.try_array()?.get(*self)
    }

    fn get_from_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        value.try_array_mut()?.get_mut(*self)
    }

    fn missing_error(&self, value: &Value) -> Error {
        match value.try_array() {
            Some(array) => Error::new(
                ErrorKind::OutOfRange,
                format!("array index {self} out of range (len={})", array.len()),
            ),
            None => value.type_error("array"),
        }
    }

    fn or_insert<'v>(&self, value: &'v mut Value) -> &'v mut Value {
        if value.get(*self).is_none() {
            panic!("{}", self.missing_error(value));
        }
        value.get_mut(*self).expect("presence checked above")
    }
}

impl ValueIndex for &str {
    fn get_from<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.try_object()?.find(self)
    }

    fn get_from_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        value.try_object_mut()?.find_mut(self)
    }

    fn missing_error(&self, value: &Value) -> Error {
        match value.try_object() {
            Some(_) => Error::new(ErrorKind::KeyNotFound, format!("key not found: \"{self}\"")),
            None => value.type_error("object"),
        }
    }

    fn or_insert<'v>(&self, value: &'v mut Value) -> &'v mut Value {
        if !value.is_object() {
            panic!("expected object, got {}", value.kind().name());
        }
        value
            .try_object_mut()
            .expect("kind checked above")
            .entry_or_insert(self)
    }
}

impl<I: ValueIndex> std::ops::Index<I> for Value {
    type Output = Value;

    /// # Panics
    ///
    /// Panics on a missing key, an out-of-range index, or a kind that
    /// cannot be indexed; use [`Value::get`] or [`Value::at`] for
    /// non-panicking access.
    fn index(&self, index: I) -> &Value {
        match self.at(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<I: ValueIndex> std::ops::IndexMut<I> for Value {
    /// On objects, a missing string key inserts `Null` first (so
    /// `value["k"] = x` works); array indices must be in bounds.
    fn index_mut(&mut self, index: I) -> &mut Value {
        index.or_insert(self)
    }
}
