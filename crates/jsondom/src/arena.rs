//! Monotonic arena allocation.
//!
//! [`Arena`] is a bump allocator: the hot path is one aligned pointer bump,
//! exhausted blocks chain into a linked list of heap overflow blocks with
//! geometric growth, and [`Arena::reset`] releases everything at once.
//! Value construction routes through an arena when one is active on the
//! current thread (see [`ArenaScope`]); [`crate::ArenaDocument`] is the
//! safe way to use that mechanism.
//!
//! An arena is a per-thread resource. Allocations never move, and every
//! pointer handed out is invalidated by `reset()` — the ownership rules
//! around that contract live in the callers (`ArenaScope::enter` and
//! `Arena::from_raw_buffer` are `unsafe` for this reason).

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// Minimum size of the first heap block.
const MIN_BLOCK: usize = 256;
/// Floor for overflow blocks when the initial buffer is small.
const DEFAULT_BLOCK: usize = 4096;
/// Alignment of block storage; covers every type the crate places in an
/// arena and any `align <= 16` request without per-block bookkeeping.
const BLOCK_ALIGN: usize = 16;

/// Overflow block header; the block's data follows immediately after.
#[repr(C)]
struct BlockHeader {
    next: *mut BlockHeader,
    capacity: usize,
}

const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

/// A monotonic (bump) arena.
///
/// Deallocation is a no-op; memory is released en bloc by [`reset`] or
/// drop. The initial block may be caller-provided (e.g. a stack buffer via
/// [`from_raw_buffer`]) and is reused across resets; only heap overflow
/// blocks are freed.
///
/// The arena must not move while any allocation from it is outstanding —
/// containers keep a pointer back to it for growth. [`crate::ArenaDocument`]
/// boxes its arena for exactly this reason.
///
/// [`reset`]: Arena::reset
/// [`from_raw_buffer`]: Arena::from_raw_buffer
pub struct Arena {
    head: Cell<*mut u8>,
    end: Cell<*mut u8>,
    /// External initial buffer; null when the arena is heap-only.
    initial: *mut u8,
    initial_len: usize,
    blocks: Cell<*mut BlockHeader>,
    total_allocated: Cell<usize>,
    next_block_size: Cell<usize>,
    /// Arenas hand out raw pointers into themselves; keep them off other
    /// threads.
    _not_sync: PhantomData<*mut u8>,
}

impl Arena {
    /// Heap-backed arena with a 4 KiB initial block.
    pub fn new() -> Arena {
        Arena::with_capacity(DEFAULT_BLOCK)
    }

    /// Heap-backed arena whose first block holds `initial_size` bytes.
    pub fn with_capacity(initial_size: usize) -> Arena {
        let arena = Arena {
            head: Cell::new(ptr::null_mut()),
            end: Cell::new(ptr::null_mut()),
            initial: ptr::null_mut(),
            initial_len: 0,
            blocks: Cell::new(ptr::null_mut()),
            total_allocated: Cell::new(0),
            next_block_size: Cell::new(initial_size.max(MIN_BLOCK)),
            _not_sync: PhantomData,
        };
        if arena.grow(arena.next_block_size.get()).is_none() {
            handle_alloc_error(Layout::array::<u8>(initial_size).unwrap_or(Layout::new::<u8>()));
        }
        arena
    }

    /// Arena whose initial block is a caller-provided buffer (typically on
    /// the stack). Overflow still goes to the heap; `reset()` rewinds to
    /// the start of the buffer.
    ///
    /// # Safety
    ///
    /// `buf` must be valid for reads and writes of `len` bytes for the
    /// whole lifetime of the arena, must not be accessed through any other
    /// pointer while the arena is alive, and the arena must be dropped (or
    /// never used again) before the buffer is.
    pub unsafe fn from_raw_buffer(buf: NonNull<u8>, len: usize) -> Arena {
        Arena {
            head: Cell::new(buf.as_ptr()),
            end: Cell::new(buf.as_ptr().add(len)),
            initial: buf.as_ptr(),
            initial_len: len,
            blocks: Cell::new(ptr::null_mut()),
            total_allocated: Cell::new(len),
            next_block_size: Cell::new(if len < DEFAULT_BLOCK {
                DEFAULT_BLOCK
            } else {
                len * 2
            }),
            _not_sync: PhantomData,
        }
    }

    /// Allocate `size` bytes at `align`. Returns `None` only when the
    /// operating system refuses a new block.
    #[inline]
    pub fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        debug_assert!(align.is_power_of_two() && align <= BLOCK_ALIGN);
        let cur = self.head.get() as usize;
        let aligned = (cur + align - 1) & !(align - 1);
        let next = aligned.checked_add(size)?;
        if next <= self.end.get() as usize && !self.head.get().is_null() {
            self.head.set(next as *mut u8);
            // SAFETY: aligned lies in the current block, which is non-null.
            return Some(unsafe { NonNull::new_unchecked(aligned as *mut u8) });
        }
        self.alloc_slow(size, align)
    }

    #[cold]
    fn alloc_slow(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let needed = size.checked_add(align - 1)?;
        let block_size = self.next_block_size.get().max(needed);
        self.grow(block_size)?;

        let cur = self.head.get() as usize;
        let aligned = (cur + align - 1) & !(align - 1);
        let next = aligned + size;
        debug_assert!(next <= self.end.get() as usize);
        self.head.set(next as *mut u8);
        // SAFETY: grow() succeeded, so the fresh block covers the request.
        Some(unsafe { NonNull::new_unchecked(aligned as *mut u8) })
    }

    /// Copy `bytes` into the arena, aborting on OOM.
    pub(crate) fn alloc_bytes(&self, bytes: &[u8]) -> NonNull<u8> {
        if bytes.is_empty() {
            return NonNull::dangling();
        }
        let Some(dst) = self.alloc(bytes.len(), 1) else {
            handle_alloc_error(Layout::array::<u8>(bytes.len()).unwrap_or(Layout::new::<u8>()));
        };
        // SAFETY: dst is a fresh arena region of bytes.len() bytes and
        // cannot overlap the source.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), dst.as_ptr(), bytes.len());
        }
        dst
    }

    /// Move `value` into arena storage, aborting on OOM. The value's
    /// destructor will not run unless the owner runs it in place.
    pub(crate) fn alloc_value<T>(&self, value: T) -> NonNull<T> {
        let layout = Layout::new::<T>();
        let Some(raw) = self.alloc(layout.size(), layout.align()) else {
            handle_alloc_error(layout);
        };
        let dst = raw.cast::<T>();
        // SAFETY: dst is fresh, properly aligned arena storage for a T.
        unsafe {
            ptr::write(dst.as_ptr(), value);
        }
        dst
    }

    /// Release all overflow blocks and rewind to the initial block.
    ///
    /// Every pointer previously handed out by this arena is invalidated.
    /// Requiring `&mut self` keeps borrows out, but raw arena-backed
    /// values (see [`ArenaScope`]) are the caller's responsibility.
    pub fn reset(&mut self) {
        self.free_blocks();
        self.blocks.set(ptr::null_mut());
        if !self.initial.is_null() {
            self.head.set(self.initial);
            // SAFETY: initial..initial + initial_len is the caller's buffer.
            self.end
                .set(unsafe { self.initial.add(self.initial_len) });
            self.total_allocated.set(self.initial_len);
        } else {
            self.total_allocated.set(0);
            self.head.set(ptr::null_mut());
            self.end.set(ptr::null_mut());
            // Halve: grow() doubles again, so the block size stays stable
            // across parse/reset cycles.
            let size = (self.next_block_size.get() / 2).max(MIN_BLOCK);
            let _ = self.grow(size);
        }
    }

    /// Total bytes obtained from the OS (plus the initial buffer).
    pub fn bytes_allocated(&self) -> usize {
        self.total_allocated.get()
    }

    /// Bytes handed out so far, including alignment padding and the unused
    /// remainder of exhausted blocks.
    pub fn bytes_used(&self) -> usize {
        self.data_capacity() - self.bytes_remaining()
    }

    /// Usable capacity across all blocks (block headers excluded).
    pub fn data_capacity(&self) -> usize {
        let mut cap = self.initial_len;
        let mut block = self.blocks.get();
        while !block.is_null() {
            // SAFETY: block is a live header from grow().
            unsafe {
                cap += (*block).capacity;
                block = (*block).next;
            }
        }
        cap
    }

    /// Bytes left in the current block before the next overflow.
    pub fn bytes_remaining(&self) -> usize {
        let head = self.head.get();
        let end = self.end.get();
        if head.is_null() || end <= head {
            0
        } else {
            end as usize - head as usize
        }
    }

    /// Number of heap overflow blocks currently held.
    pub fn block_count(&self) -> usize {
        let mut n = 0;
        let mut block = self.blocks.get();
        while !block.is_null() {
            n += 1;
            // SAFETY: block is a live header from grow().
            block = unsafe { (*block).next };
        }
        n
    }

    /// Allocate a fresh block of `data_size` usable bytes and make it
    /// current.
    fn grow(&self, data_size: usize) -> Option<()> {
        let layout = Layout::from_size_align(HEADER_SIZE.checked_add(data_size)?, BLOCK_ALIGN).ok()?;
        // SAFETY: layout has non-zero size.
        let base = unsafe { alloc(layout) };
        let header = NonNull::new(base)?.cast::<BlockHeader>();
        // SAFETY: the allocation starts with space for the header.
        unsafe {
            header.as_ptr().write(BlockHeader {
                next: self.blocks.get(),
                capacity: data_size,
            });
            let data = base.add(HEADER_SIZE);
            self.head.set(data);
            self.end.set(data.add(data_size));
        }
        self.blocks.set(header.as_ptr());
        self.total_allocated
            .set(self.total_allocated.get() + layout.size());
        self.next_block_size.set(data_size * 2);
        Some(())
    }

    fn free_blocks(&self) {
        let mut block = self.blocks.get();
        while !block.is_null() {
            // SAFETY: every header in the list was produced by grow() with
            // this exact layout.
            unsafe {
                let next = (*block).next;
                let layout = Layout::from_size_align_unchecked(
                    HEADER_SIZE + (*block).capacity,
                    BLOCK_ALIGN,
                );
                dealloc(block as *mut u8, layout);
                block = next;
            }
        }
    }
}

impl Default for Arena {
    fn default() -> Arena {
        Arena::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.free_blocks();
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("bytes_allocated", &self.bytes_allocated())
            .field("bytes_used", &self.bytes_used())
            .field("block_count", &self.block_count())
            .finish()
    }
}

thread_local! {
    /// The arena consulted by value construction; written only by
    /// [`ArenaScope`].
    static CURRENT_ARENA: Cell<Option<NonNull<Arena>>> = const { Cell::new(None) };
}

/// The active arena for this thread, if any.
#[inline]
pub(crate) fn current_arena() -> Option<NonNull<Arena>> {
    CURRENT_ARENA.with(Cell::get)
}

/// RAII guard that makes an arena current for this thread.
///
/// While the guard is alive, every `String`/`Array`/`Object` value
/// constructed on this thread allocates from the arena. The previous
/// arena is restored on drop, so scopes nest.
pub struct ArenaScope<'a> {
    prev: Option<NonNull<Arena>>,
    _arena: PhantomData<&'a Arena>,
}

impl<'a> ArenaScope<'a> {
    /// Activate `arena` for the current thread.
    ///
    /// # Safety
    ///
    /// Every value constructed while the scope is active may hold pointers
    /// into the arena. The caller must ensure that no such value is used
    /// after the arena is reset or dropped, and that the arena does not
    /// move while such values exist.
    pub unsafe fn enter(arena: &'a Arena) -> ArenaScope<'a> {
        let prev = CURRENT_ARENA.with(|cell| cell.replace(Some(NonNull::from(arena))));
        ArenaScope {
            prev,
            _arena: PhantomData,
        }
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        CURRENT_ARENA.with(|cell| cell.set(self.prev));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_allocations_do_not_move() {
        let arena = Arena::with_capacity(64);
        let first = arena.alloc_bytes(b"hello world");
        // Force several overflow blocks.
        for _ in 0..100 {
            arena.alloc_bytes(&[0xAB; 128]);
        }
        // SAFETY: the arena is alive and never reset in this test.
        let bytes = unsafe { std::slice::from_raw_parts(first.as_ptr(), 11) };
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn alignment_is_honored() {
        let arena = Arena::new();
        arena.alloc(1, 1).unwrap();
        for align in [1usize, 2, 4, 8, 16] {
            let p = arena.alloc(3, align).unwrap();
            assert_eq!(p.as_ptr() as usize % align, 0, "align {align}");
        }
    }

    #[test]
    fn blocks_grow_geometrically() {
        let arena = Arena::with_capacity(256);
        assert_eq!(arena.block_count(), 1);
        let before = arena.data_capacity();
        // Overflow the initial block a few times.
        for _ in 0..4 {
            arena.alloc(before, 1).unwrap();
        }
        assert!(arena.block_count() > 1);
        // Newest block dominates the capacity; each block doubles.
        assert!(arena.data_capacity() >= before * 2);
    }

    #[test]
    fn oversized_request_gets_its_own_block() {
        let arena = Arena::with_capacity(256);
        let p = arena.alloc(100_000, 8).unwrap();
        assert_eq!(p.as_ptr() as usize % 8, 0);
        assert!(arena.data_capacity() >= 100_000);
    }

    #[test]
    fn reset_rewinds_heap_arena_to_one_block() {
        let mut arena = Arena::with_capacity(256);
        for _ in 0..50 {
            arena.alloc_bytes(&[1; 200]);
        }
        assert!(arena.block_count() > 1);
        arena.reset();
        assert_eq!(arena.block_count(), 1);
        // Still usable after reset.
        arena.alloc_bytes(b"again");
        assert!(arena.bytes_used() >= 5);
    }

    #[test]
    fn block_size_is_stable_across_reset_cycles() {
        let mut arena = Arena::with_capacity(1024);
        let mut counts = Vec::new();
        for _ in 0..10 {
            for _ in 0..30 {
                arena.alloc_bytes(&[7; 100]);
            }
            counts.push(arena.block_count());
            arena.reset();
        }
        // The halve-on-reset / double-on-grow pair converges within a few
        // cycles to a stable block count.
        assert!(counts[3..].windows(2).all(|w| w[0] == w[1]), "{counts:?}");
        assert!(*counts.last().unwrap() <= 2, "{counts:?}");
    }

    #[test]
    fn external_buffer_is_reused_after_reset() {
        let mut buf = [0u8; 512];
        let base = buf.as_mut_ptr();
        // SAFETY: buf outlives the arena and is not touched directly while
        // the arena is alive.
        let mut arena = unsafe { Arena::from_raw_buffer(NonNull::new(base).unwrap(), 512) };
        let p = arena.alloc_bytes(b"stack-backed");
        assert_eq!(p.as_ptr() as usize, base as usize);
        assert_eq!(arena.block_count(), 0);
        arena.reset();
        assert_eq!(arena.bytes_used(), 0);
        let q = arena.alloc_bytes(b"rewound");
        assert_eq!(q.as_ptr() as usize, base as usize);
        drop(arena);
    }

    #[test]
    fn scope_nesting_restores_previous_arena() {
        let outer = Arena::new();
        let inner = Arena::new();
        assert!(current_arena().is_none());
        // SAFETY: no values are constructed in this test; the scopes only
        // toggle the thread-local.
        unsafe {
            let _outer_scope = ArenaScope::enter(&outer);
            assert_eq!(current_arena(), Some(NonNull::from(&outer)));
            {
                let _inner_scope = ArenaScope::enter(&inner);
                assert_eq!(current_arena(), Some(NonNull::from(&inner)));
            }
            assert_eq!(current_arena(), Some(NonNull::from(&outer)));
        }
        assert!(current_arena().is_none());
    }
}
