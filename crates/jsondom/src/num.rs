//! Fast number formatting for the serializer.
//!
//! Integers go through a two-digit-pair table with a CLZ-based digit count,
//! writing directly into the output buffer without reversal. Floats try an
//! exact-integer path and a fixed-point path (both orders of magnitude
//! cheaper than shortest-decimal) before falling back to Ryū.

/// Two-digit pairs "00".."99": two digits per division.
const DIGIT_PAIRS: &[u8; 200] = b"\
0001020304050607080910111213141516171819\
2021222324252627282930313233343536373839\
4041424344454647484950515253545556575859\
6061626364656667686970717273747576777879\
8081828384858687888990919293949596979899";

/// Powers of ten for the fixed-point fast path.
const POW10: [f64; 16] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15,
];

/// `POW10_U64[0]` is a sentinel; `POW10_U64[i] = 10^i` for `i = 1..=19`.
const POW10_U64: [u64; 20] = [
    0,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
];

/// Largest integer exactly representable in a binary64 (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Buffer large enough for any output of [`write_f64`].
pub(crate) const F64_BUF_LEN: usize = 40;
/// Buffer large enough for any output of [`write_i64`] / [`write_u64`].
pub(crate) const INT_BUF_LEN: usize = 20;

/// Decimal digit count of `val` (1..=20).
///
/// log10(2) ~= 1233/4096, corrected with the powers-of-ten table; compiles
/// to a single CLZ plus a compare.
#[inline]
fn count_digits(val: u64) -> usize {
    let bits = 64 - (val | 1).leading_zeros() as usize;
    let approx = (bits * 1233) >> 12;
    approx - usize::from(val < POW10_U64[approx]) + 1
}

/// Format `val` into the front of `buf`, returning the length written.
#[inline]
pub(crate) fn write_u64(buf: &mut [u8], mut val: u64) -> usize {
    if val == 0 {
        buf[0] = b'0';
        return 1;
    }

    let len = count_digits(val);
    let mut at = len;

    // Right to left, two digits per step.
    while val >= 100 {
        let pair = (val % 100) as usize * 2;
        val /= 100;
        at -= 2;
        buf[at..at + 2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    }
    if val >= 10 {
        let pair = val as usize * 2;
        buf[..2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    } else {
        buf[0] = b'0' + val as u8;
    }
    len
}

/// Format `val` into the front of `buf`, returning the length written.
/// `i64::MIN` is handled via the unsigned complement.
#[inline]
pub(crate) fn write_i64(buf: &mut [u8], val: i64) -> usize {
    if val < 0 {
        buf[0] = b'-';
        let magnitude = (!(val as u64)).wrapping_add(1);
        1 + write_u64(&mut buf[1..], magnitude)
    } else {
        write_u64(buf, val as u64)
    }
}

/// Format a finite `val` as the shortest JSON number literal that parses
/// back to the same double. The output always contains a `.` or an
/// exponent; `-0.0` serializes as `0.0`.
///
/// Callers handle NaN and infinities before calling.
pub(crate) fn write_f64(buf: &mut [u8], mut val: f64) -> usize {
    debug_assert!(val.is_finite());
    let mut at = 0;

    if val.is_sign_negative() {
        if val == 0.0 {
            buf[..3].copy_from_slice(b"0.0");
            return 3;
        }
        buf[0] = b'-';
        at = 1;
        val = -val;
    }

    // Exact integers: digits plus a ".0" suffix.
    if val <= MAX_SAFE_INTEGER && val == val.trunc() {
        at += write_u64(&mut buf[at..], val as u64);
        buf[at..at + 2].copy_from_slice(b".0");
        return at + 2;
    }

    // Fixed point: is val * 10^k an exact integer for some small k?
    // The check is conservative: if the scaling rounds, the equality fails
    // and we fall through to the exact path.
    if val < 1e15 && val > 1e-6 {
        for k in 1..=9usize {
            let scaled = val * POW10[k];
            // Monotone in k: past 2^53 every later k overflows too.
            if scaled > MAX_SAFE_INTEGER {
                break;
            }
            if scaled == scaled.trunc() {
                let mut digits = [0u8; INT_BUF_LEN];
                let total = write_u64(&mut digits, scaled as u64);
                let int_digits = total as isize - k as isize;

                if int_digits <= 0 {
                    // Below one: 0.005 style.
                    buf[at] = b'0';
                    buf[at + 1] = b'.';
                    at += 2;
                    for _ in 0..-int_digits {
                        buf[at] = b'0';
                        at += 1;
                    }
                    buf[at..at + total].copy_from_slice(&digits[..total]);
                    at += total;
                } else {
                    let int_digits = int_digits as usize;
                    buf[at..at + int_digits].copy_from_slice(&digits[..int_digits]);
                    at += int_digits;
                    buf[at] = b'.';
                    at += 1;
                    buf[at..at + k].copy_from_slice(&digits[int_digits..total]);
                    at += k;
                }
                return at;
            }
        }
    }

    // Shortest decimal via Ryū. Its output always carries a fraction or an
    // exponent, so no ".0" fix-up is required here.
    let mut shortest = ryu::Buffer::new();
    let formatted = shortest.format_finite(val).as_bytes();
    buf[at..at + formatted.len()].copy_from_slice(formatted);
    at + formatted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn fmt_u64(v: u64) -> String {
        let mut buf = [0u8; INT_BUF_LEN];
        let n = write_u64(&mut buf, v);
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    fn fmt_i64(v: i64) -> String {
        let mut buf = [0u8; INT_BUF_LEN + 1];
        let n = write_i64(&mut buf, v);
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    fn fmt_f64(v: f64) -> String {
        let mut buf = [0u8; F64_BUF_LEN];
        let n = write_f64(&mut buf, v);
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    #[test]
    fn digit_count_boundaries() {
        for (i, &p) in POW10_U64.iter().enumerate().skip(1) {
            assert_eq!(count_digits(p - 1), i, "below 10^{i}");
            assert_eq!(count_digits(p), i + 1, "at 10^{i}");
        }
        assert_eq!(count_digits(0), 1);
        assert_eq!(count_digits(u64::MAX), 20);
    }

    #[test_case(0, "0")]
    #[test_case(7, "7")]
    #[test_case(42, "42")]
    #[test_case(100, "100")]
    #[test_case(65_535, "65535")]
    #[test_case(u64::MAX, "18446744073709551615")]
    fn unsigned_formatting(v: u64, expected: &str) {
        assert_eq!(fmt_u64(v), expected);
    }

    #[test_case(0, "0")]
    #[test_case(-1, "-1")]
    #[test_case(i64::MIN, "-9223372036854775808")]
    #[test_case(i64::MAX, "9223372036854775807")]
    fn signed_formatting(v: i64, expected: &str) {
        assert_eq!(fmt_i64(v), expected);
    }

    #[test_case(0.0, "0.0")]
    #[test_case(-0.0, "0.0"; "negative zero has no sign")]
    #[test_case(1.0, "1.0")]
    #[test_case(-42.0, "-42.0")]
    #[test_case(3.14, "3.14")]
    #[test_case(37.7749295, "37.7749295"; "fixed point with nine decimals")]
    #[test_case(0.005, "0.005")]
    #[test_case(95.5, "95.5")]
    #[test_case(9007199254740992.0, "9007199254740992.0"; "two to the 53")]
    fn float_fast_paths(v: f64, expected: &str) {
        assert_eq!(fmt_f64(v), expected);
    }

    #[test]
    fn float_fallback_round_trips() {
        for v in [
            0.1 + 0.2,
            1.0 / 3.0,
            f64::MIN_POSITIVE,
            f64::MAX,
            2.2250738585072014e-308,
            -1.7976931348623157e308,
        ] {
            let s = fmt_f64(v);
            assert_eq!(s.parse::<f64>().unwrap(), v, "round trip of {s}");
            assert!(
                s.contains('.') || s.contains('e') || s.contains('E'),
                "{s} must be a float literal"
            );
        }
    }

    #[test]
    fn shortest_form_for_famous_sum() {
        assert_eq!(fmt_f64(0.1 + 0.2), "0.30000000000000004");
    }
}
