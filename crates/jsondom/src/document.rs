//! Arena-backed document facade.

use crate::arena::{Arena, ArenaScope};
use crate::error::Result;
use crate::options::ParseOptions;
use crate::parser;
use crate::value::Value;

/// A parse destination that owns its arena.
///
/// Every allocation for the parsed tree comes from the internal arena, so
/// a parse / [`reset`] cycle touches the heap only when the arena grows —
/// after a few iterations over similar payloads it stops growing entirely.
///
/// The root value and everything reachable from it are backed by the
/// arena: they are valid until [`reset`], the next successful parse, or
/// the document's drop. Reading through [`root`] is unrestricted, and
/// [`Value::clone`] taken outside an arena scope produces independent
/// heap values that may outlive the document.
///
/// ```
/// let mut doc = jsondom::ArenaDocument::new();
/// doc.parse(r#"{"a":1,"b":[2,3]}"#)?;
/// assert_eq!(doc.root()["a"].as_int()?, 1);
/// doc.reset(); // O(1), reuse for the next payload
/// doc.parse("[1,2,3]")?;
/// assert_eq!(doc.root().len(), 3);
/// # Ok::<(), jsondom::Error>(())
/// ```
///
/// [`reset`]: ArenaDocument::reset
/// [`root`]: ArenaDocument::root
pub struct ArenaDocument {
    // Field order is load-bearing: root drops before the arena backing it.
    root: Value,
    // Boxed so the arena's address is stable when the document moves;
    // containers keep a pointer back to their arena for growth.
    arena: Box<Arena>,
}

impl ArenaDocument {
    /// Document with the default 4 KiB initial arena block.
    pub fn new() -> ArenaDocument {
        ArenaDocument::with_capacity(4096)
    }

    /// Document whose arena starts with an `initial_size`-byte block.
    pub fn with_capacity(initial_size: usize) -> ArenaDocument {
        ArenaDocument {
            root: Value::null(),
            arena: Box::new(Arena::with_capacity(initial_size)),
        }
    }

    /// Parse strict JSON into the document, replacing the root. On
    /// failure the previous root is left untouched.
    pub fn parse(&mut self, input: &str) -> Result<&Value> {
        self.parse_with_options(input, &ParseOptions::strict())
    }

    /// Parse with explicit [`ParseOptions`].
    pub fn parse_with_options(&mut self, input: &str, opts: &ParseOptions) -> Result<&Value> {
        let parsed = {
            // SAFETY: the parsed tree is stored into self.root, which is
            // declared before the boxed arena (drops first) and is cleared
            // in reset() before the arena rewinds. The arena cannot move
            // while the tree is alive because it is boxed.
            let _scope = unsafe { ArenaScope::enter(&self.arena) };
            parser::parse_with_options(input, opts)?
        };
        self.root = parsed;
        Ok(&self.root)
    }

    /// The last successfully parsed root; Null before the first parse and
    /// after [`reset`](ArenaDocument::reset).
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Mutable access to the root.
    ///
    /// # Safety
    ///
    /// The reference must not be used to move arena-backed values out of
    /// the document (for example with `std::mem::replace`) — such a value
    /// would dangle once the document is reset or dropped. Mutating in
    /// place is fine; new insertions made outside an arena scope go to the
    /// heap and are released normally.
    pub unsafe fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Clear the root, then rewind the arena. Everything previously
    /// parsed from this document becomes invalid.
    pub fn reset(&mut self) {
        // Root first: its destructors run while the arena memory is still
        // intact.
        self.root = Value::null();
        self.arena.reset();
    }

    /// The owning arena, for allocation statistics.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl Default for ArenaDocument {
    fn default() -> ArenaDocument {
        ArenaDocument::new()
    }
}
