//! Recursive-descent JSON parser.
//!
//! The hot loops lean on the `simd` scans: whitespace skipping (with
//! zero/one/two-step inline fast paths first), string scanning that finds
//! the closing quote or first escape in bulk, and an inline number
//! accumulator that builds the mantissa and exponent in one pass instead
//! of handing the span to a general float parser. Strings without escapes
//! materialize straight from the input slice — under an active arena that
//! is a single bump-and-copy, with no per-string heap allocation.
//!
//! Objects are parsed append-only and fixed up once after the closing
//! brace: duplicate keys collapse with last-value-wins and large objects
//! get their hash index built in the same pass.

use std::ptr::NonNull;

use crate::arena::{current_arena, Arena, ArenaScope};
use crate::error::{Error, ErrorKind, Location, Result};
use crate::options::ParseOptions;
use crate::simd;
use crate::utf8;
use crate::value::{Array, Object, ObjectIndex, Str, Value};

/// Parse strict (RFC 8259) JSON.
pub fn parse(input: &str) -> Result<Value> {
    parse_with_options(input, &ParseOptions::strict())
}

/// Parse with explicit [`ParseOptions`].
pub fn parse_with_options(input: &str, opts: &ParseOptions) -> Result<Value> {
    Parser::new(input.as_bytes(), opts).parse_document()
}

/// Parse raw bytes; the input is validated as UTF-8 first and rejected
/// with [`ErrorKind::InvalidUtf8`] if malformed.
pub fn parse_slice(input: &[u8]) -> Result<Value> {
    parse_slice_with_options(input, &ParseOptions::strict())
}

/// Parse raw bytes with explicit options.
pub fn parse_slice_with_options(input: &[u8], opts: &ParseOptions) -> Result<Value> {
    if !utf8::validate(input) {
        return Err(invalid_utf8_error(input));
    }
    Parser::new(input, opts).parse_document()
}

/// Parse with every allocation routed through `arena`.
///
/// # Safety
///
/// The returned value (and every value cloned from it *while the arena is
/// active*) borrows the arena: it must be dropped before the arena is
/// reset or dropped, and the arena must not move in the meantime.
/// [`crate::ArenaDocument`] packages this contract safely.
pub unsafe fn parse_with_arena(
    input: &str,
    arena: &Arena,
    opts: &ParseOptions,
) -> Result<Value> {
    let _scope = ArenaScope::enter(arena);
    parse_with_options(input, opts)
}

/// Locate the first malformed sequence for the error report.
#[cold]
fn invalid_utf8_error(input: &[u8]) -> Error {
    let mut at = 0;
    while at < input.len() {
        if input[at] < 0x80 {
            at += 1;
            continue;
        }
        let (cp, consumed) = utf8::decode(&input[at..]);
        if cp == utf8::REPLACEMENT && input[at..at + consumed] != utf8::REPLACEMENT_BYTES {
            break;
        }
        at += consumed;
    }
    Error::at(
        ErrorKind::InvalidUtf8,
        "input is not valid UTF-8",
        Location::of_offset(input, at),
    )
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn byte_display(b: u8) -> String {
    if b.is_ascii_graphic() || b == b' ' {
        char::from(b).to_string()
    } else {
        format!("\\x{b:02x}")
    }
}

/// Hex nibble values; 0xFF marks a non-hex byte. One lookup per nibble
/// instead of a three-way range compare.
const HEX_TABLE: [u8; 256] = {
    let mut table = [0xFF_u8; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
};

/// Powers of ten exactly representable in a binary64; with a mantissa of
/// at most 19 digits, one multiply or divide by these is correctly
/// rounded.
const EXACT_POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    opts: &'a ParseOptions,
    depth: usize,
    max_depth: usize,
    /// Arena cached once at construction; skips the thread-local read in
    /// the hot loop.
    arena: Option<NonNull<Arena>>,
    /// Reused builder for strings containing escapes.
    scratch: Vec<u8>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], opts: &'a ParseOptions) -> Parser<'a> {
        Parser {
            input,
            pos: 0,
            opts,
            depth: 0,
            max_depth: opts.effective_max_depth(),
            arena: current_arena(),
            scratch: Vec::new(),
        }
    }

    fn parse_document(mut self) -> Result<Value> {
        let value = self.parse_value()?;
        self.skip_ws_and_comments()?;
        if self.pos < self.input.len() {
            return Err(self.err(ErrorKind::TrailingContent, "unexpected trailing content"));
        }
        Ok(value)
    }

    // Error helpers. Location is computed here, on the failure path only.

    fn err(&self, kind: ErrorKind, message: impl Into<Box<str>>) -> Error {
        Error::at(kind, message, Location::of_offset(self.input, self.pos))
    }

    fn err_eof(&self) -> Error {
        self.err(ErrorKind::UnexpectedEndOfInput, "unexpected end of input")
    }

    fn err_unexpected(&self) -> Error {
        match self.input.get(self.pos) {
            Some(&b) => self.err(
                ErrorKind::UnexpectedCharacter,
                format!("unexpected character '{}'", byte_display(b)),
            ),
            None => self.err_eof(),
        }
    }

    // Whitespace and comments.

    #[inline]
    fn skip_whitespace(&mut self) {
        let bytes = self.input;
        let pos = self.pos;
        let Some(&b0) = bytes.get(pos) else { return };
        // Fast path: already at a non-whitespace byte.
        if b0 > b' ' || !simd::is_json_whitespace(b0) {
            return;
        }
        // One or two whitespace bytes cover ": " and ",\n  " prefixes.
        if let Some(&b1) = bytes.get(pos + 1) {
            if !simd::is_json_whitespace(b1) {
                self.pos = pos + 1;
                return;
            }
            if let Some(&b2) = bytes.get(pos + 2) {
                if !simd::is_json_whitespace(b2) {
                    self.pos = pos + 2;
                    return;
                }
            }
        }
        self.skip_whitespace_slow();
    }

    #[cold]
    fn skip_whitespace_slow(&mut self) {
        self.pos += simd::skip_whitespace(&self.input[self.pos..]);
    }

    #[inline]
    fn skip_ws_and_comments(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.opts.allow_comments {
            self.skip_comments()?;
        }
        Ok(())
    }

    fn skip_comments(&mut self) -> Result<()> {
        while self.pos + 1 < self.input.len() && self.input[self.pos] == b'/' {
            match self.input[self.pos + 1] {
                b'/' => {
                    self.pos += 2;
                    while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    if self.pos < self.input.len() {
                        self.pos += 1;
                    }
                    self.skip_whitespace();
                }
                b'*' => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos + 1 >= self.input.len() {
                            return Err(Error::at(
                                ErrorKind::InvalidComment,
                                "unterminated block comment",
                                Location::of_offset(self.input, start),
                            ));
                        }
                        if self.input[self.pos] == b'*' && self.input[self.pos + 1] == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                    self.skip_whitespace();
                }
                _ => break,
            }
        }
        Ok(())
    }

    // Single-byte and literal matching.

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.input.get(self.pos) {
            Some(&b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(&b) => Err(self.err(
                ErrorKind::UnexpectedCharacter,
                format!("expected '{}', got '{}'", char::from(expected), byte_display(b)),
            )),
            None => Err(self.err_eof()),
        }
    }

    fn expect_literal(&mut self, literal: &'static str) -> Result<()> {
        let bytes = literal.as_bytes();
        if self.input.get(self.pos..self.pos + bytes.len()) == Some(bytes) {
            self.pos += bytes.len();
            Ok(())
        } else {
            Err(self.err(ErrorKind::InvalidLiteral, format!("expected '{literal}'")))
        }
    }

    // Value dispatch.

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_ws_and_comments()?;
        let Some(&b) = self.input.get(self.pos) else {
            return Err(self.err_eof());
        };
        match b {
            b'"' => {
                self.pos += 1;
                Ok(Value::from_str_payload(self.parse_string(b'"')?))
            }
            b'\'' if self.opts.allow_single_quotes => {
                self.pos += 1;
                Ok(Value::from_str_payload(self.parse_string(b'\'')?))
            }
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b't' => {
                self.expect_literal("true")?;
                Ok(Value::from(true))
            }
            b'f' => {
                self.expect_literal("false")?;
                Ok(Value::from(false))
            }
            b'n' => {
                self.expect_literal("null")?;
                Ok(Value::null())
            }
            b'-' | b'0'..=b'9' => self.parse_number(),
            b'N' if self.opts.allow_nan_inf => {
                self.expect_literal("NaN")?;
                Ok(Value::from(f64::NAN))
            }
            b'I' if self.opts.allow_nan_inf => {
                self.expect_literal("Infinity")?;
                Ok(Value::from(f64::INFINITY))
            }
            _ => Err(self.err_unexpected()),
        }
    }

    // Strings.

    /// Offset of the next interesting byte in double-quoted content. In
    /// strict mode the escape scan is used so raw control bytes surface;
    /// with `allow_control_chars` they pass through and only the
    /// delimiter scan runs.
    #[inline]
    fn scan_double_quoted(&self, rest: &[u8]) -> usize {
        if self.opts.allow_control_chars {
            simd::find_string_delimiter(rest)
        } else {
            simd::find_needs_escape::<false>(rest)
        }
    }

    fn scan_single_quoted(&self, rest: &[u8]) -> usize {
        let allow_ctrl = self.opts.allow_control_chars;
        rest.iter()
            .position(|&b| b == b'\'' || b == b'\\' || (!allow_ctrl && b < 0x20))
            .unwrap_or(rest.len())
    }

    /// Parse string content after the opening quote was consumed.
    ///
    /// Fast path: the scan lands directly on the closing quote, so the
    /// content has no escapes and materializes straight from the input.
    fn parse_string(&mut self, quote: u8) -> Result<Str> {
        debug_assert_eq!(self.input[self.pos - 1], quote);
        if quote == b'"' {
            let rest = &self.input[self.pos..];
            let hit = self.scan_double_quoted(rest);
            if rest.get(hit) == Some(&b'"') {
                // SAFETY: the parser input was validated as UTF-8, and a
                // quote byte never splits a multi-byte sequence.
                let text = unsafe { std::str::from_utf8_unchecked(&rest[..hit]) };
                self.pos += hit + 1;
                return Ok(Str::new_in(text, self.arena));
            }
        }
        self.parse_string_escaped(quote)
    }

    #[cold]
    fn parse_string_escaped(&mut self, quote: u8) -> Result<Str> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        if scratch.capacity() == 0 {
            scratch.reserve(4096);
        }
        let result = self.string_content_into(&mut scratch, quote);
        let payload = result.map(|()| {
            // SAFETY: scratch holds input bytes (validated UTF-8) plus
            // escape expansions produced by utf8::encode.
            let text = unsafe { std::str::from_utf8_unchecked(&scratch) };
            Str::new_in(text, self.arena)
        });
        self.scratch = scratch;
        payload
    }

    fn string_content_into(&mut self, out: &mut Vec<u8>, quote: u8) -> Result<()> {
        loop {
            let rest = &self.input[self.pos..];
            let hit = if quote == b'"' {
                self.scan_double_quoted(rest)
            } else {
                self.scan_single_quoted(rest)
            };
            out.extend_from_slice(&rest[..hit]);
            self.pos += hit;

            let Some(&b) = self.input.get(self.pos) else {
                return Err(self.err(ErrorKind::UnterminatedString, "unterminated string"));
            };
            if b == quote {
                self.pos += 1;
                return Ok(());
            }
            if b == b'\\' {
                self.pos += 1;
                self.parse_escape(out)?;
            } else if self.opts.allow_control_chars {
                out.push(b);
                self.pos += 1;
            } else {
                return Err(self.err(
                    ErrorKind::UnexpectedCharacter,
                    "raw control character in string",
                ));
            }
        }
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(&c) = self.input.get(self.pos) else {
            return Err(self.err(ErrorKind::InvalidEscape, "unterminated escape sequence"));
        };
        self.pos += 1;
        match c {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'\'' if self.opts.allow_single_quotes => out.push(b'\''),
            b'u' => return self.parse_unicode_escape(out),
            _ => {
                self.pos -= 1;
                return Err(self.err(
                    ErrorKind::InvalidEscape,
                    format!("invalid escape '\\{}'", byte_display(c)),
                ));
            }
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let Some(chunk) = self.input.get(self.pos..self.pos + 4) else {
            return Err(self.err(
                ErrorKind::InvalidUnicodeEscape,
                "incomplete unicode escape",
            ));
        };
        let mut val = 0u32;
        for &b in chunk {
            let nibble = HEX_TABLE[b as usize];
            if nibble > 15 {
                return Err(self.err(
                    ErrorKind::InvalidUnicodeEscape,
                    "invalid hex digit in unicode escape",
                ));
            }
            val = (val << 4) | u32::from(nibble);
        }
        self.pos += 4;
        Ok(val)
    }

    fn parse_unicode_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let mut cp = self.parse_hex4()?;

        if (0xD800..=0xDBFF).contains(&cp) {
            // A high surrogate must pair with a following \uDC00..\uDFFF.
            if self.input.get(self.pos..self.pos + 2) != Some(b"\\u".as_slice()) {
                return Err(self.err(ErrorKind::InvalidUnicodeEscape, "missing low surrogate"));
            }
            self.pos += 2;
            let low = self.parse_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.err(
                    ErrorKind::InvalidUnicodeEscape,
                    "invalid low surrogate value",
                ));
            }
            cp = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
        } else if (0xDC00..=0xDFFF).contains(&cp) {
            return Err(self.err(
                ErrorKind::InvalidUnicodeEscape,
                "unexpected lone low surrogate",
            ));
        }

        let mut buf = [0u8; 4];
        let n = utf8::encode(cp, &mut buf);
        out.extend_from_slice(&buf[..n]);
        Ok(())
    }

    // Numbers: inline mantissa/exponent accumulation. The fallback float
    // parse only runs for mantissas over 19 digits or exponents outside
    // the exact power-of-ten window.

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        let mut negative = false;

        if self.input[self.pos] == b'-' {
            negative = true;
            self.pos += 1;
            match self.input.get(self.pos) {
                Some(&b'I') if self.opts.allow_nan_inf => {
                    self.expect_literal("Infinity")?;
                    return Ok(Value::from(f64::NEG_INFINITY));
                }
                Some(_) => {}
                None => return Err(self.err(ErrorKind::InvalidNumber, "invalid number")),
            }
        }

        if self.opts.allow_hex_numbers
            && self.input[self.pos] == b'0'
            && matches!(self.input.get(self.pos + 1), Some(b'x' | b'X'))
        {
            return self.parse_hex_number(negative);
        }

        let first = self.input[self.pos];
        if !first.is_ascii_digit() {
            return Err(self.err(ErrorKind::InvalidNumber, "invalid number"));
        }

        let mut int_val: u64 = 0;
        let mut int_overflow = false;
        let mut int_digits: i32 = 0;

        if first == b'0' {
            self.pos += 1;
        } else {
            int_val = u64::from(first - b'0');
            self.pos += 1;
            int_digits = 1;
            const OVERFLOW_THRESHOLD: u64 = u64::MAX / 10;
            const OVERFLOW_LAST_DIGIT: u64 = u64::MAX % 10;
            while let Some(&b) = self.input.get(self.pos) {
                if !b.is_ascii_digit() {
                    break;
                }
                let digit = u64::from(b - b'0');
                if int_val > OVERFLOW_THRESHOLD
                    || (int_val == OVERFLOW_THRESHOLD && digit > OVERFLOW_LAST_DIGIT)
                {
                    int_overflow = true;
                    while matches!(self.input.get(self.pos), Some(b) if b.is_ascii_digit()) {
                        self.pos += 1;
                    }
                    break;
                }
                int_val = int_val * 10 + digit;
                self.pos += 1;
                int_digits += 1;
            }
        }

        let mut is_float = false;
        let mut mantissa = int_val;
        let mut frac_digits: i32 = 0;
        let mut explicit_exp: i32 = 0;
        let mut mantissa_overflow = int_overflow;
        const MAX_MANTISSA_DIGITS: i32 = 19;
        let mut total_digits = int_digits;

        if self.input.get(self.pos) == Some(&b'.') {
            is_float = true;
            self.pos += 1;
            if !matches!(self.input.get(self.pos), Some(b) if b.is_ascii_digit()) {
                return Err(self.err(
                    ErrorKind::InvalidNumber,
                    "expected digit after decimal point",
                ));
            }
            while let Some(&b) = self.input.get(self.pos) {
                if !b.is_ascii_digit() {
                    break;
                }
                if total_digits < MAX_MANTISSA_DIGITS {
                    mantissa = mantissa * 10 + u64::from(b - b'0');
                    frac_digits += 1;
                    total_digits += 1;
                } else {
                    mantissa_overflow = true;
                }
                self.pos += 1;
            }
        }

        if matches!(self.input.get(self.pos), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            let mut neg_exp = false;
            if let Some(&b) = self.input.get(self.pos) {
                if b == b'+' || b == b'-' {
                    neg_exp = b == b'-';
                    self.pos += 1;
                }
            }
            if !matches!(self.input.get(self.pos), Some(b) if b.is_ascii_digit()) {
                return Err(self.err(ErrorKind::InvalidNumber, "expected digit in exponent"));
            }
            while let Some(&b) = self.input.get(self.pos) {
                if !b.is_ascii_digit() {
                    break;
                }
                // Clamp: anything past +-400 is an overflow/underflow to
                // infinity or zero anyway.
                explicit_exp = (explicit_exp * 10 + i32::from(b - b'0')).min(400);
                self.pos += 1;
            }
            if neg_exp {
                explicit_exp = -explicit_exp;
            }
        }

        if !is_float && !int_overflow {
            if negative {
                const MAX_NEGATIVE: u64 = i64::MAX as u64 + 1;
                if int_val <= MAX_NEGATIVE {
                    return Ok(Value::from((int_val as i64).wrapping_neg()));
                }
            } else if int_val <= i64::MAX as u64 {
                return Ok(Value::from(int_val as i64));
            } else {
                // Literals in (i64::MAX, u64::MAX] become UInt.
                return Ok(Value::from(int_val));
            }
        }

        if !mantissa_overflow && total_digits <= MAX_MANTISSA_DIGITS {
            let exp10 = explicit_exp - frac_digits;
            if (-22..=22).contains(&exp10) {
                let mut val = if exp10 >= 0 {
                    mantissa as f64 * EXACT_POW10[exp10 as usize]
                } else {
                    mantissa as f64 / EXACT_POW10[(-exp10) as usize]
                };
                if negative {
                    val = -val;
                }
                return Ok(Value::from(val));
            }
        }

        self.parse_float_fallback(start)
    }

    #[cold]
    fn parse_float_fallback(&self, start: usize) -> Result<Value> {
        let span = &self.input[start..self.pos];
        // SAFETY: the scanned span consists of ASCII sign/digit/dot/
        // exponent bytes only.
        let text = unsafe { std::str::from_utf8_unchecked(span) };
        match text.parse::<f64>() {
            Ok(val) => Ok(Value::from(val)),
            Err(_) => Err(self.err(ErrorKind::InvalidNumber, "invalid number")),
        }
    }

    #[cold]
    fn parse_hex_number(&mut self, negative: bool) -> Result<Value> {
        self.pos += 2; // 0x
        let mut val: u64 = 0;
        let mut has_digit = false;
        while let Some(&b) = self.input.get(self.pos) {
            let nibble = HEX_TABLE[b as usize];
            if nibble > 15 {
                break;
            }
            has_digit = true;
            val = (val << 4) | u64::from(nibble);
            self.pos += 1;
        }
        if !has_digit {
            return Err(self.err(ErrorKind::InvalidNumber, "expected hex digit"));
        }
        let signed = val as i64;
        Ok(Value::from(if negative {
            signed.wrapping_neg()
        } else {
            signed
        }))
    }

    // Containers.

    fn push_depth(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.err(
                ErrorKind::MaxDepthExceeded,
                "maximum nesting depth exceeded",
            ));
        }
        Ok(())
    }

    /// Estimate the element count of the container starting at `pos` by
    /// counting commas at this nesting level in a bounded look-ahead.
    /// Skipped for small inputs and deep nesting, where the pre-scan
    /// costs more than letting the vector grow from 8.
    fn estimate_capacity(&self) -> usize {
        let remaining = self.input.len() - self.pos;
        if self.depth > 2 || remaining <= 256 {
            return 8;
        }
        let scan = &self.input[self.pos..self.pos + remaining.min(512)];
        let mut estimate = 1usize;
        let mut nested = 0i32;
        let mut i = 0;
        while i < scan.len() {
            match scan[i] {
                b'{' | b'[' => nested += 1,
                b'}' | b']' => {
                    if nested == 0 {
                        break;
                    }
                    nested -= 1;
                }
                b',' if nested == 0 => estimate += 1,
                b'"' => {
                    i += 1;
                    while i < scan.len() && scan[i] != b'"' {
                        if scan[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        estimate.max(8)
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.pos += 1; // [
        self.push_depth()?;
        self.skip_ws_and_comments()?;

        match self.input.get(self.pos) {
            Some(&b']') => {
                self.pos += 1;
                self.depth -= 1;
                return Ok(Value::array_in(
                    Array::with_capacity_in(0, self.arena),
                    self.arena,
                ));
            }
            Some(_) => {}
            None => return Err(self.err(ErrorKind::UnterminatedArray, "unterminated array")),
        }

        let mut array = Array::with_capacity_in(self.estimate_capacity(), self.arena);
        loop {
            let value = self.parse_value()?;
            array.push(value);
            self.skip_ws_and_comments()?;

            match self.input.get(self.pos) {
                Some(&b',') => {
                    self.pos += 1;
                    self.skip_ws_and_comments()?;
                    if self.opts.allow_trailing_commas && self.input.get(self.pos) == Some(&b']') {
                        self.pos += 1;
                        self.depth -= 1;
                        return Ok(Value::array_in(array, self.arena));
                    }
                }
                Some(&b']') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Value::array_in(array, self.arena));
                }
                Some(_) => {
                    return Err(self.err(
                        ErrorKind::UnexpectedCharacter,
                        "expected ',' or ']' in array",
                    ))
                }
                None => return Err(self.err(ErrorKind::UnterminatedArray, "unterminated array")),
            }
        }
    }

    fn parse_unquoted_key(&mut self) -> Str {
        let start = self.pos;
        debug_assert!(is_ident_start(self.input[self.pos]));
        self.pos += 1;
        while matches!(self.input.get(self.pos), Some(&b) if is_ident_char(b)) {
            self.pos += 1;
        }
        // SAFETY: identifier characters are ASCII.
        let text = unsafe { std::str::from_utf8_unchecked(&self.input[start..self.pos]) };
        Str::new_in(text, self.arena)
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.pos += 1; // {
        self.push_depth()?;
        self.skip_ws_and_comments()?;

        match self.input.get(self.pos) {
            Some(&b'}') => {
                self.pos += 1;
                self.depth -= 1;
                return Ok(Value::object_in(
                    Object::with_capacity_in(0, self.arena),
                    self.arena,
                ));
            }
            Some(_) => {}
            None => return Err(self.err(ErrorKind::UnterminatedObject, "unterminated object")),
        }

        let mut object = Object::with_capacity_in(self.estimate_capacity(), self.arena);
        // Only pay for duplicate tracking when duplicates are an error;
        // the default last-wins policy is applied wholesale in
        // finalize_parsed.
        let mut seen = if self.opts.allow_duplicate_keys {
            None
        } else {
            Some(ObjectIndex::build(&[]))
        };

        loop {
            self.skip_ws_and_comments()?;
            let key = match self.input.get(self.pos) {
                Some(&b'"') => {
                    self.pos += 1;
                    self.parse_string(b'"')?
                }
                Some(&b'\'') if self.opts.allow_single_quotes => {
                    self.pos += 1;
                    self.parse_string(b'\'')?
                }
                Some(&b) if self.opts.allow_unquoted_keys && is_ident_start(b) => {
                    self.parse_unquoted_key()
                }
                Some(_) | None => {
                    return Err(self.err(
                        ErrorKind::UnterminatedObject,
                        "expected string key in object",
                    ))
                }
            };

            self.skip_ws_and_comments()?;
            self.expect(b':')?;
            let value = self.parse_value()?;
            object.push_entry_unchecked(key, value);

            if let Some(seen) = &mut seen {
                let offset = (object.len() - 1) as u32;
                if seen.insert_if_absent(object.entries(), offset).is_err() {
                    let key = object.entries()[offset as usize].key.as_str();
                    return Err(self.err(
                        ErrorKind::DuplicateKey,
                        format!("duplicate key: \"{key}\""),
                    ));
                }
            }

            self.skip_ws_and_comments()?;
            match self.input.get(self.pos) {
                Some(&b',') => {
                    self.pos += 1;
                    self.skip_ws_and_comments()?;
                    if self.opts.allow_trailing_commas && self.input.get(self.pos) == Some(&b'}') {
                        self.pos += 1;
                        self.depth -= 1;
                        object.finalize_parsed();
                        return Ok(Value::object_in(object, self.arena));
                    }
                }
                Some(&b'}') => {
                    self.pos += 1;
                    self.depth -= 1;
                    object.finalize_parsed();
                    return Ok(Value::object_in(object, self.arena));
                }
                Some(_) => {
                    return Err(self.err(
                        ErrorKind::UnexpectedCharacter,
                        "expected ',' or '}' in object",
                    ))
                }
                None => {
                    return Err(self.err(ErrorKind::UnterminatedObject, "unterminated object"))
                }
            }
        }
    }
}
