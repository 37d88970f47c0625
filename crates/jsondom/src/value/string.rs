//! 16-byte SSO string payload.
//!
//! The final byte of the 16-byte buffer is the discriminator: values
//! `0..=15` are the length of an inline string stored in the leading
//! bytes; `0xFE` marks an arena slice and `0xFF` a heap slice, both stored
//! as a pointer in the first word and a 32-bit length after it. Keeping
//! the out-of-line length at 32 bits is what lets `Value` stay at 24
//! bytes; strings are capped at `u32::MAX` bytes.
//!
//! Contents are always valid UTF-8: a `Str` is only ever built from
//! `&str`, so `as_str` can skip re-validation.

use std::fmt;
use std::ptr::{self, NonNull};

use crate::arena::{current_arena, Arena};

/// Longest string stored inline.
pub(crate) const MAX_INLINE: usize = 15;

const TAG_IDX: usize = 15;
const TAG_ARENA: u8 = 0xFE;
const TAG_HEAP: u8 = 0xFF;
const LEN_IDX: usize = 8;

#[repr(C, align(8))]
pub(crate) struct Str {
    raw: [u8; 16],
}

const _: () = assert!(std::mem::size_of::<Str>() == 16);

impl Str {
    /// Build from `text`, routing storage through `arena` when one is
    /// given: inline up to 15 bytes, otherwise an arena copy (no
    /// destructor) or an owned heap slice.
    pub(crate) fn new_in(text: &str, arena: Option<NonNull<Arena>>) -> Str {
        let bytes = text.as_bytes();
        let mut raw = [0u8; 16];
        if bytes.len() <= MAX_INLINE {
            raw[..bytes.len()].copy_from_slice(bytes);
            raw[TAG_IDX] = bytes.len() as u8;
            return Str { raw };
        }

        assert!(bytes.len() <= u32::MAX as usize, "string exceeds 4 GiB limit");
        match arena {
            Some(arena) => {
                // SAFETY: callers uphold the arena-outlives-value contract.
                let copy = unsafe { arena.as_ref() }.alloc_bytes(bytes);
                Str::from_out_of_line(copy.as_ptr(), bytes.len() as u32, TAG_ARENA)
            }
            None => {
                let boxed: Box<[u8]> = bytes.into();
                let ptr = Box::into_raw(boxed) as *mut u8;
                Str::from_out_of_line(ptr, bytes.len() as u32, TAG_HEAP)
            }
        }
    }

    /// Build from `text` using the thread's current arena context.
    pub(crate) fn new(text: &str) -> Str {
        Str::new_in(text, current_arena())
    }

    fn from_out_of_line(ptr: *const u8, len: u32, tag: u8) -> Str {
        let mut raw = [0u8; 16];
        // SAFETY: the buffer has room for a pointer at offset 0 and the
        // length at offset 8; unaligned writes keep this layout-agnostic.
        unsafe {
            ptr::write_unaligned(raw.as_mut_ptr() as *mut *const u8, ptr);
            ptr::write_unaligned(raw.as_mut_ptr().add(LEN_IDX) as *mut u32, len);
        }
        raw[TAG_IDX] = tag;
        Str { raw }
    }

    #[inline]
    fn out_of_line_parts(&self) -> (*const u8, usize) {
        // SAFETY: tags TAG_ARENA/TAG_HEAP are only set by
        // from_out_of_line, which stored these fields.
        unsafe {
            let ptr = ptr::read_unaligned(self.raw.as_ptr() as *const *const u8);
            let len = ptr::read_unaligned(self.raw.as_ptr().add(LEN_IDX) as *const u32);
            (ptr, len as usize)
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        let tag = self.raw[TAG_IDX];
        if tag as usize <= MAX_INLINE {
            tag as usize
        } else {
            self.out_of_line_parts().1
        }
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        let tag = self.raw[TAG_IDX];
        if tag as usize <= MAX_INLINE {
            &self.raw[..tag as usize]
        } else {
            let (ptr, len) = self.out_of_line_parts();
            // SAFETY: out-of-line storage is live for the life of the Str
            // (heap: owned; arena: the arena-outlives-value contract).
            unsafe { std::slice::from_raw_parts(ptr, len) }
        }
    }

    #[inline]
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: every constructor takes &str, so the bytes are UTF-8.
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

    #[cfg(test)]
    pub(crate) fn is_inline(&self) -> bool {
        self.raw[TAG_IDX] as usize <= MAX_INLINE
    }

    #[cfg(test)]
    pub(crate) fn is_arena(&self) -> bool {
        self.raw[TAG_IDX] == TAG_ARENA
    }
}

impl Drop for Str {
    fn drop(&mut self) {
        if self.raw[TAG_IDX] == TAG_HEAP {
            let (ptr, len) = self.out_of_line_parts();
            // SAFETY: heap strings own a Box<[u8]> created in new_in.
            unsafe {
                drop(Box::from_raw(std::slice::from_raw_parts_mut(
                    ptr as *mut u8,
                    len,
                )));
            }
        }
        // Inline: nothing. Arena: the arena owns the bytes.
    }
}

impl Clone for Str {
    /// Deep copy through the *current* context: cloning an arena string
    /// outside its scope produces an independent heap (or inline) string.
    fn clone(&self) -> Str {
        Str::new(self.as_str())
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Str {}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
