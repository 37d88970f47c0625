//! AArch64 NEON scan tier: 2 x 16-byte blocks per iteration (the register
//! file is wide enough to keep both chunks in flight), then a 16-byte loop,
//! then the scalar tail.

use core::arch::aarch64::*;

use super::{find_needs_escape_scalar, find_string_delimiter_scalar, skip_whitespace_scalar};

/// Collapse a NEON comparison result (each lane 0x00 or 0xFF) into a
/// 16-bit mask, bit N for lane N. Equivalent of x86 `movemask` built from
/// three pairwise horizontal adds.
#[inline]
unsafe fn neon_movemask(v: uint8x16_t) -> u16 {
    const BIT_MASK: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];
    let bit_mask = vld1q_u8(BIT_MASK.as_ptr());
    let masked = vandq_u8(v, bit_mask);
    let mut paired = vpadd_u8(vget_low_u8(masked), vget_high_u8(masked));
    paired = vpadd_u8(paired, paired);
    paired = vpadd_u8(paired, paired);
    vget_lane_u16::<0>(vreinterpret_u16_u8(paired))
}

#[inline]
unsafe fn whitespace_mask(chunk: uint8x16_t) -> u16 {
    let ws = vorrq_u8(
        vorrq_u8(
            vceqq_u8(chunk, vdupq_n_u8(b' ')),
            vceqq_u8(chunk, vdupq_n_u8(b'\t')),
        ),
        vorrq_u8(
            vceqq_u8(chunk, vdupq_n_u8(b'\n')),
            vceqq_u8(chunk, vdupq_n_u8(b'\r')),
        ),
    );
    neon_movemask(ws)
}

pub(super) fn skip_whitespace(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        while at + 32 <= len {
            let mask0 = whitespace_mask(vld1q_u8(ptr.add(at)));
            if mask0 != 0xFFFF {
                return at + (!mask0).trailing_zeros() as usize;
            }
            let mask1 = whitespace_mask(vld1q_u8(ptr.add(at + 16)));
            if mask1 != 0xFFFF {
                return at + 16 + (!mask1).trailing_zeros() as usize;
            }
            at += 32;
        }
        if at + 16 <= len {
            let mask = whitespace_mask(vld1q_u8(ptr.add(at)));
            if mask != 0xFFFF {
                return at + (!mask).trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + skip_whitespace_scalar(&bytes[at..])
}

#[inline]
unsafe fn delimiter_mask(chunk: uint8x16_t) -> u16 {
    let hit = vorrq_u8(
        vceqq_u8(chunk, vdupq_n_u8(b'"')),
        vceqq_u8(chunk, vdupq_n_u8(b'\\')),
    );
    neon_movemask(hit)
}

pub(super) fn find_string_delimiter(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        while at + 32 <= len {
            let mask0 = delimiter_mask(vld1q_u8(ptr.add(at)));
            if mask0 != 0 {
                return at + mask0.trailing_zeros() as usize;
            }
            let mask1 = delimiter_mask(vld1q_u8(ptr.add(at + 16)));
            if mask1 != 0 {
                return at + 16 + mask1.trailing_zeros() as usize;
            }
            at += 32;
        }
        if at + 16 <= len {
            let mask = delimiter_mask(vld1q_u8(ptr.add(at)));
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + find_string_delimiter_scalar(&bytes[at..])
}

#[inline]
unsafe fn needs_escape_mask<const ENSURE_ASCII: bool>(chunk: uint8x16_t) -> u16 {
    let ctrl = vcleq_u8(chunk, vdupq_n_u8(0x1F));
    let special = vorrq_u8(
        vceqq_u8(chunk, vdupq_n_u8(b'"')),
        vceqq_u8(chunk, vdupq_n_u8(b'\\')),
    );
    let mut needs = vorrq_u8(ctrl, special);
    if ENSURE_ASCII {
        needs = vorrq_u8(needs, vcgeq_u8(chunk, vdupq_n_u8(0x80)));
    }
    neon_movemask(needs)
}

pub(super) fn find_needs_escape<const ENSURE_ASCII: bool>(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        while at + 32 <= len {
            let mask0 = needs_escape_mask::<ENSURE_ASCII>(vld1q_u8(ptr.add(at)));
            if mask0 != 0 {
                return at + mask0.trailing_zeros() as usize;
            }
            let mask1 = needs_escape_mask::<ENSURE_ASCII>(vld1q_u8(ptr.add(at + 16)));
            if mask1 != 0 {
                return at + 16 + mask1.trailing_zeros() as usize;
            }
            at += 32;
        }
        if at + 16 <= len {
            let mask = needs_escape_mask::<ENSURE_ASCII>(vld1q_u8(ptr.add(at)));
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + find_needs_escape_scalar::<ENSURE_ASCII>(&bytes[at..])
}
