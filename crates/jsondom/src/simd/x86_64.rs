//! x86_64 scan tiers: AVX2 (32-byte blocks) when compiled in, with SSE2
//! (16-byte blocks, the x86_64 baseline) as the primary loop or the AVX2
//! tail. Each loop computes a comparison movemask and extracts the first
//! hit with a trailing-zeros count.

use core::arch::x86_64::*;

use super::{find_needs_escape_scalar, find_string_delimiter_scalar, skip_whitespace_scalar};

pub(super) fn skip_whitespace(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    #[cfg(target_feature = "avx2")]
    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        let space = _mm256_set1_epi8(b' ' as i8);
        let tab = _mm256_set1_epi8(b'\t' as i8);
        let nl = _mm256_set1_epi8(b'\n' as i8);
        let cr = _mm256_set1_epi8(b'\r' as i8);
        while at + 32 <= len {
            let chunk = _mm256_loadu_si256(ptr.add(at) as *const __m256i);
            let ws = _mm256_or_si256(
                _mm256_or_si256(_mm256_cmpeq_epi8(chunk, space), _mm256_cmpeq_epi8(chunk, tab)),
                _mm256_or_si256(_mm256_cmpeq_epi8(chunk, nl), _mm256_cmpeq_epi8(chunk, cr)),
            );
            let mask = _mm256_movemask_epi8(ws) as u32;
            if mask != u32::MAX {
                return at + (!mask).trailing_zeros() as usize;
            }
            at += 32;
        }
    }

    // SAFETY: every load covers [at, at + 16) which stays inside the slice.
    unsafe {
        let space = _mm_set1_epi8(b' ' as i8);
        let tab = _mm_set1_epi8(b'\t' as i8);
        let nl = _mm_set1_epi8(b'\n' as i8);
        let cr = _mm_set1_epi8(b'\r' as i8);
        while at + 16 <= len {
            let chunk = _mm_loadu_si128(ptr.add(at) as *const __m128i);
            let ws = _mm_or_si128(
                _mm_or_si128(_mm_cmpeq_epi8(chunk, space), _mm_cmpeq_epi8(chunk, tab)),
                _mm_or_si128(_mm_cmpeq_epi8(chunk, nl), _mm_cmpeq_epi8(chunk, cr)),
            );
            let mask = _mm_movemask_epi8(ws) as u32;
            if mask != 0xFFFF {
                return at + (!mask & 0xFFFF).trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + skip_whitespace_scalar(&bytes[at..])
}

pub(super) fn find_string_delimiter(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    #[cfg(target_feature = "avx2")]
    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        let quote = _mm256_set1_epi8(b'"' as i8);
        let bslash = _mm256_set1_epi8(b'\\' as i8);
        while at + 32 <= len {
            let chunk = _mm256_loadu_si256(ptr.add(at) as *const __m256i);
            let hit = _mm256_or_si256(
                _mm256_cmpeq_epi8(chunk, quote),
                _mm256_cmpeq_epi8(chunk, bslash),
            );
            let mask = _mm256_movemask_epi8(hit) as u32;
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 32;
        }
    }

    // SAFETY: every load covers [at, at + 16) which stays inside the slice.
    unsafe {
        let quote = _mm_set1_epi8(b'"' as i8);
        let bslash = _mm_set1_epi8(b'\\' as i8);
        while at + 16 <= len {
            let chunk = _mm_loadu_si128(ptr.add(at) as *const __m128i);
            let hit = _mm_or_si128(_mm_cmpeq_epi8(chunk, quote), _mm_cmpeq_epi8(chunk, bslash));
            let mask = _mm_movemask_epi8(hit) as u32;
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + find_string_delimiter_scalar(&bytes[at..])
}

pub(super) fn find_needs_escape<const ENSURE_ASCII: bool>(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let ptr = bytes.as_ptr();
    let mut at = 0;

    #[cfg(target_feature = "avx2")]
    // SAFETY: every load covers [at, at + 32) which stays inside the slice.
    unsafe {
        let quote = _mm256_set1_epi8(b'"' as i8);
        let bslash = _mm256_set1_epi8(b'\\' as i8);
        // Unsigned `b < 0x20` via sign-bias: xor with 0x80 maps the
        // unsigned order onto the signed order.
        let bias = _mm256_set1_epi8(0x80u8 as i8);
        let thresh = _mm256_set1_epi8(0xA0u8 as i8);
        while at + 32 <= len {
            let chunk = _mm256_loadu_si256(ptr.add(at) as *const __m256i);
            let biased = _mm256_xor_si256(chunk, bias);
            let ctrl = _mm256_cmpgt_epi8(thresh, biased);
            let special = _mm256_or_si256(
                _mm256_cmpeq_epi8(chunk, quote),
                _mm256_cmpeq_epi8(chunk, bslash),
            );
            let mut needs = _mm256_or_si256(ctrl, special);
            if ENSURE_ASCII {
                // Sign bit set means byte >= 0x80.
                let hi = _mm256_cmpgt_epi8(_mm256_setzero_si256(), chunk);
                needs = _mm256_or_si256(needs, hi);
            }
            let mask = _mm256_movemask_epi8(needs) as u32;
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 32;
        }
    }

    // SAFETY: every load covers [at, at + 16) which stays inside the slice.
    unsafe {
        let quote = _mm_set1_epi8(b'"' as i8);
        let bslash = _mm_set1_epi8(b'\\' as i8);
        let bias = _mm_set1_epi8(0x80u8 as i8);
        let thresh = _mm_set1_epi8(0xA0u8 as i8);
        while at + 16 <= len {
            let chunk = _mm_loadu_si128(ptr.add(at) as *const __m128i);
            let biased = _mm_xor_si128(chunk, bias);
            let ctrl = _mm_cmplt_epi8(biased, thresh);
            let special = _mm_or_si128(_mm_cmpeq_epi8(chunk, quote), _mm_cmpeq_epi8(chunk, bslash));
            let mut needs = _mm_or_si128(ctrl, special);
            if ENSURE_ASCII {
                let hi = _mm_cmplt_epi8(chunk, _mm_setzero_si128());
                needs = _mm_or_si128(needs, hi);
            }
            let mask = _mm_movemask_epi8(needs) as u32;
            if mask != 0 {
                return at + mask.trailing_zeros() as usize;
            }
            at += 16;
        }
    }

    at + find_needs_escape_scalar::<ENSURE_ASCII>(&bytes[at..])
}
