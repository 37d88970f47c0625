//! Vectorized byte scans for the parser and serializer hot loops.
//!
//! Three primitives, each returning the offset of the first matching byte
//! or `bytes.len()` when nothing matches:
//!
//! - [`skip_whitespace`]: first byte outside `{' ', '\t', '\n', '\r'}`.
//! - [`find_string_delimiter`]: first `"` or `\`.
//! - [`find_needs_escape`]: first byte < 0x20, `"`, `\`, or (when
//!   `ENSURE_ASCII`) >= 0x80.
//!
//! Dispatch is decided at compile time: AVX2 (32-byte blocks with an SSE2
//! tail) when the target enables it, SSE2 on any other x86_64, NEON
//! (2 x 16-byte blocks) on AArch64, and a scalar loop everywhere else. The
//! vector loops only load full blocks that lie inside the slice, so no read
//! ever crosses `bytes.len()`. Every tier returns the same offset as the
//! scalar reference; the tests below check that exhaustively for lengths
//! 0..=1024.

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "x86_64")]
mod x86_64;

/// Offset of the first non-whitespace byte.
#[inline]
pub(crate) fn skip_whitespace(bytes: &[u8]) -> usize {
    #[cfg(target_arch = "x86_64")]
    return x86_64::skip_whitespace(bytes);
    #[cfg(target_arch = "aarch64")]
    return aarch64::skip_whitespace(bytes);
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    skip_whitespace_scalar(bytes)
}

/// Offset of the first `"` or `\`.
#[inline]
pub(crate) fn find_string_delimiter(bytes: &[u8]) -> usize {
    #[cfg(target_arch = "x86_64")]
    return x86_64::find_string_delimiter(bytes);
    #[cfg(target_arch = "aarch64")]
    return aarch64::find_string_delimiter(bytes);
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    find_string_delimiter_scalar(bytes)
}

/// Offset of the first byte that the serializer cannot pass through
/// verbatim.
#[inline]
pub(crate) fn find_needs_escape<const ENSURE_ASCII: bool>(bytes: &[u8]) -> usize {
    #[cfg(target_arch = "x86_64")]
    return x86_64::find_needs_escape::<ENSURE_ASCII>(bytes);
    #[cfg(target_arch = "aarch64")]
    return aarch64::find_needs_escape::<ENSURE_ASCII>(bytes);
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    find_needs_escape_scalar::<ENSURE_ASCII>(bytes)
}

#[inline]
pub(crate) fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

// Scalar reference implementations. The vector paths fall through to these
// for the final sub-block bytes, and the tests compare against them.

pub(crate) fn skip_whitespace_scalar(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| !is_json_whitespace(b))
        .unwrap_or(bytes.len())
}

pub(crate) fn find_string_delimiter_scalar(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b == b'"' || b == b'\\')
        .unwrap_or(bytes.len())
}

pub(crate) fn find_needs_escape_scalar<const ENSURE_ASCII: bool>(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b < 0x20 || b == b'"' || b == b'\\' || (ENSURE_ASCII && b >= 0x80))
        .unwrap_or(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic xorshift so the property sweep is reproducible.
    fn next(state: &mut u64) -> u64 {
        *state ^= *state << 13;
        *state ^= *state >> 7;
        *state ^= *state << 17;
        *state
    }

    // A byte mix heavy on plain text but salted with every class the scans
    // care about: whitespace, quotes, backslashes, control bytes, and
    // non-ASCII.
    fn fill(buf: &mut [u8], state: &mut u64) {
        for b in buf.iter_mut() {
            let r = next(state);
            *b = match r % 16 {
                0 => b' ',
                1 => b'\t',
                2 => b'\n',
                3 => b'\r',
                4 => b'"',
                5 => b'\\',
                6 => 0x00,
                7 => 0x1F,
                8 => 0x7F,
                9 => 0x80,
                10 => 0xE4,
                11 => 0xFF,
                _ => b'a' + (r >> 8) as u8 % 26,
            };
        }
    }

    #[test]
    fn dispatch_matches_scalar_at_every_length() {
        let mut state = 0x243F_6A88_85A3_08D3;
        let mut buf = [0u8; 1024];
        fill(&mut buf, &mut state);
        for len in 0..=1024 {
            let s = &buf[..len];
            assert_eq!(skip_whitespace(s), skip_whitespace_scalar(s), "ws len {len}");
            assert_eq!(
                find_string_delimiter(s),
                find_string_delimiter_scalar(s),
                "delim len {len}"
            );
            assert_eq!(
                find_needs_escape::<false>(s),
                find_needs_escape_scalar::<false>(s),
                "escape len {len}"
            );
            assert_eq!(
                find_needs_escape::<true>(s),
                find_needs_escape_scalar::<true>(s),
                "escape-ascii len {len}"
            );
        }
    }

    #[test]
    fn single_match_at_every_offset() {
        // Put the one interesting byte at each position of an otherwise
        // uniform buffer, crossing both the 16- and 32-byte block borders.
        for offset in 0..96 {
            let mut ws = [b' '; 96];
            ws[offset] = b'x';
            assert_eq!(skip_whitespace(&ws), offset);

            let mut text = [b'a'; 96];
            text[offset] = b'"';
            assert_eq!(find_string_delimiter(&text), offset);
            text[offset] = b'\\';
            assert_eq!(find_string_delimiter(&text), offset);
            assert_eq!(find_needs_escape::<false>(&text), offset);

            text[offset] = 0x1F;
            assert_eq!(find_needs_escape::<false>(&text), offset);

            text[offset] = 0x80;
            assert_eq!(find_needs_escape::<false>(&text), 96);
            assert_eq!(find_needs_escape::<true>(&text), offset);
        }
    }

    #[test]
    fn no_match_returns_len() {
        let all_ws = [b' '; 100];
        assert_eq!(skip_whitespace(&all_ws), 100);
        let text = [b'q'; 100];
        assert_eq!(find_string_delimiter(&text), 100);
        assert_eq!(find_needs_escape::<true>(&text), 100);
        assert_eq!(skip_whitespace(&[]), 0);
        assert_eq!(find_string_delimiter(&[]), 0);
    }

    #[test]
    fn whitespace_set_is_exact() {
        // Vertical tab and form feed are not JSON whitespace.
        assert_eq!(skip_whitespace(&[0x0B]), 0);
        assert_eq!(skip_whitespace(&[0x0C]), 0);
        for ws in [b' ', b'\t', b'\n', b'\r'] {
            assert_eq!(skip_whitespace(&[ws]), 1);
        }
    }
}
