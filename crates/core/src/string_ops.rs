//! String operations indexed by UTF-16 code unit
//!
//! Strings are ordinary Rust `str` values, but every index accepted or
//! returned here counts UTF-16 code units, so a scalar at or above U+10000
//! spans two index positions. Stepping, counting, and slicing therefore agree
//! with hosts that store strings as UTF-16.
//!
//! Out-of-range indices clamp; nothing here panics on a bad index.
//!
//! # API
//!
//! ```
//! use weft_core::string_ops::{count_between, next, prev, slice, utf16_len};
//!
//! let s = "a🙂b";
//! assert_eq!(utf16_len(s), 4);
//! assert_eq!(next(s, 1), 3);
//! assert_eq!(prev(s, 3), 1);
//! assert_eq!(count_between(s, 0, 4), 3);
//! assert_eq!(slice(s, 1, 3), "🙂");
//! ```

use crate::error::{Error, Result, bubble};
use crate::list_ops::List;
use std::fmt;
use std::num::IntErrorKind;

/// Sentinel for "no string index"
pub const NO_STRING_INDEX: i32 = -1;

/// Checked cast from an index option to a valid index
pub fn require_string_index(i: i32) -> Result<usize> {
    usize::try_from(i)
        .map_err(|_| Error::invalid_argument(format!("Required StringIndex but got {}", i)))
}

/// Checked cast from an index option to the no-index sentinel
pub fn require_no_string_index(i: i32) -> Result<i32> {
    if i < 0 {
        Ok(NO_STRING_INDEX)
    } else {
        Err(Error::invalid_argument(format!(
            "Required NoStringIndex but got {}",
            i
        )))
    }
}

// =============================================================================
// Code unit scanning
// =============================================================================
//
// Text is stored as UTF-8, so finding code unit `i` means counting units up
// to it. Lookups scan only as far as the target, skip whole blocks with the
// bulk `str` routines, and take one pass when the prefix is ASCII.

const BLOCK: usize = 512;

/// Code units in a run of whole UTF-8 sequences
fn units_in(text: &str) -> usize {
    if text.is_ascii() {
        return text.len();
    }
    // Only four-byte sequences need a pair
    let paired = if (0xF0..=0xF4).any(|lead| text.as_bytes().contains(&lead)) {
        text.chars().filter(|c| c.len_utf16() == 2).count()
    } else {
        0
    };
    text.chars().count() + paired
}

/// At most `BLOCK` bytes from `from`, ending on a char boundary
fn block_at(s: &str, from: usize) -> &str {
    let mut end = (from + BLOCK).min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[from..end]
}

/// Byte offset of the scalar covering code unit `index`, and whether
/// `index` is the trailing half of that scalar's pair
///
/// `None` when `index` is at or past the end.
fn locate(s: &str, index: usize) -> Option<(usize, bool)> {
    let bytes = s.as_bytes();
    // A scalar never takes fewer bytes than code units
    if index >= bytes.len() {
        return None;
    }
    if bytes[..=index].is_ascii() {
        return Some((index, false));
    }
    let mut byte = 0;
    let mut units = 0;
    while byte < s.len() {
        let block = block_at(s, byte);
        let n = units_in(block);
        if units + n > index {
            break;
        }
        units += n;
        byte += block.len();
    }
    for (offset, c) in s[byte..].char_indices() {
        let width = c.len_utf16();
        if index < units + width {
            return Some((byte + offset, index > units));
        }
        units += width;
    }
    None
}

fn scalar_at(s: &str, byte: usize) -> Option<char> {
    s.get(byte..)?.chars().next()
}

/// Length in UTF-16 code units
pub fn utf16_len(s: &str) -> usize {
    units_in(s)
}

/// Byte offset of the scalar covering code unit `index`
///
/// Indices inside a surrogate pair floor to the start of the pair; indices
/// at or past the end map to `s.len()`.
pub fn byte_offset(s: &str, index: usize) -> usize {
    locate(s, index).map_or(s.len(), |(byte, _)| byte)
}

/// Code unit index of a byte offset on a char boundary
pub fn utf16_index(s: &str, byte: usize) -> usize {
    units_in(&s[..byte.min(s.len())])
}

/// `end` clamped to the string length, scanning no further than `end`
fn clamp_end(s: &str, end: usize) -> usize {
    if end == 0 || has_index(s, end - 1) {
        end
    } else {
        utf16_len(s)
    }
}

// =============================================================================
// Indexing and stepping
// =============================================================================

/// Number of code points in `[begin, end)` after clamping
///
/// A `begin` on the trailing half of a pair counts that half as one.
pub fn count_between(s: &str, begin: usize, end: usize) -> usize {
    if end <= begin {
        return 0;
    }
    let Some((start, trailing)) = locate(s, begin) else {
        return 0;
    };
    let first = match (trailing, scalar_at(s, start)) {
        (true, Some(c)) => start + c.len_utf8(),
        _ => start,
    };
    // A pair straddling `end` starts inside the range
    let stop = match locate(s, end) {
        Some((byte, true)) => byte + scalar_at(s, byte).map_or(0, char::len_utf8),
        Some((byte, false)) => byte,
        None => s.len(),
    };
    usize::from(trailing) + s[first..stop.max(first)].chars().count()
}

/// Whether `[begin, end)` holds at least `min_count` code points
///
/// Decided from the code unit span when it is shorter than `min_count` or at
/// least twice as long; otherwise counts, stopping at `min_count`.
pub fn has_at_least(s: &str, begin: usize, end: usize, min_count: usize) -> bool {
    let end = clamp_end(s, end);
    let begin = begin.min(end);
    let n_utf16 = end - begin;
    if n_utf16 < min_count {
        return false;
    }
    if n_utf16 >= min_count.saturating_mul(2) {
        return true;
    }
    let Some((start, trailing)) = locate(s, begin) else {
        return false;
    };
    let mut chars = s[start..].chars();
    let mut pos = begin;
    let mut count = 0;
    if trailing {
        chars.next();
        pos += 1;
        count += 1;
    }
    while count < min_count && pos < end {
        let Some(c) = chars.next() else {
            break;
        };
        pos += c.len_utf16();
        count += 1;
    }
    count >= min_count
}

pub fn has_index(s: &str, i: usize) -> bool {
    locate(s, i).is_some()
}

/// Index just past the code point starting at `i`
pub fn next(s: &str, i: usize) -> usize {
    match locate(s, i) {
        Some((_, true)) => i + 1,
        Some((byte, false)) => i + scalar_at(s, byte).map_or(1, char::len_utf16),
        None => utf16_len(s),
    }
}

/// Index of the code point ending at `i`
pub fn prev(s: &str, i: usize) -> usize {
    // Nothing before index 1 can be a pair
    if i <= 1 {
        return 0;
    }
    match locate(s, i - 2) {
        Some((byte, false)) if scalar_at(s, byte).is_some_and(|c| c.len_utf16() == 2) => i - 2,
        Some(_) if has_index(s, i - 1) => i - 1,
        _ => utf16_len(s),
    }
}

/// Apply `next` (or `prev` for negative `by`) `|by|` times
///
/// Stops early once a step no longer moves.
pub fn step(s: &str, i: usize, by: i32) -> usize {
    let mut index = i;
    for _ in 0..by.unsigned_abs() {
        let moved = if by >= 0 { next(s, index) } else { prev(s, index) };
        if moved == index {
            break;
        }
        index = moved;
    }
    index
}

/// The code point starting at `i`
///
/// Bubbles when `i` is at or past the end. An index on the trailing half of
/// a pair reads that half alone.
pub fn code_at(s: &str, i: usize) -> Result<i32> {
    let (byte, trailing) = locate(s, i).ok_or_else(bubble)?;
    let c = scalar_at(s, byte).ok_or_else(bubble)?;
    if trailing {
        let mut units = [0u16; 2];
        Ok(i32::from(c.encode_utf16(&mut units)[1]))
    } else {
        Ok(c as i32)
    }
}

/// Code unit index of the first `target` at or after `start`
///
/// A `start` inside a pair floors to the pair. An empty `target` matches at
/// the clamped start.
pub fn index_of(text: &str, target: &str, start: usize) -> Option<usize> {
    let from = byte_offset(text, start);
    text[from..]
        .find(target)
        .map(|found| utf16_index(text, from + found))
}

pub fn for_each(s: &str, mut f: impl FnMut(char)) {
    for c in s.chars() {
        f(c);
    }
}

/// Substring over clamped code unit indices
pub fn slice(s: &str, begin: usize, end: usize) -> &str {
    let start = byte_offset(s, begin);
    let stop = byte_offset(s, end).max(start);
    &s[start..stop]
}

// =============================================================================
// Construction
// =============================================================================

fn scalar_from(code_point: i32) -> Result<char> {
    u32::try_from(code_point)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "Not a valid Unicode scalar value: 0x{:X}",
                code_point
            ))
        })
}

pub fn from_code_point(code_point: i32) -> Result<String> {
    scalar_from(code_point).map(String::from)
}

pub fn from_code_points(code_points: impl IntoIterator<Item = i32>) -> Result<String> {
    code_points.into_iter().map(scalar_from).collect()
}

/// Mutable string accumulator used by generated code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringBuilder {
    buf: String,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn append_code_point(&mut self, code_point: i32) -> Result<()> {
        self.buf.push(scalar_from(code_point)?);
        Ok(())
    }

    /// Append `s[begin..end]` with the same clamping as [`slice`]
    pub fn append_between(&mut self, s: &str, begin: usize, end: usize) {
        self.buf.push_str(slice(s, begin, end));
    }

    pub fn len_utf16(&self) -> usize {
        utf16_len(&self.buf)
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Display for StringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

// =============================================================================
// Split and parse
// =============================================================================

/// Split on a delimiter
///
/// An empty delimiter yields one string per code point. Otherwise the result
/// has one more element than there are non-overlapping matches, keeping
/// empty pieces at either end.
pub fn split(source: &str, delimiter: &str) -> List<String> {
    if delimiter.is_empty() {
        return source.chars().map(String::from).collect();
    }
    source.split(delimiter).map(str::to_string).collect()
}

/// Parse a float, rejecting a leading or trailing `.`
///
/// The text must end in a digit or spell out `NaN` or `Infinity` exactly;
/// `f64::from_str` alone would also take `inf` or `nan` in any case.
pub fn to_float64(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    if trimmed.starts_with('.') || trimmed.ends_with('.') {
        return Err(bubble());
    }
    let spelled_out = trimmed.ends_with("NaN") || trimmed.ends_with("Infinity");
    if !spelled_out && !trimmed.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(bubble());
    }
    trimmed.parse::<f64>().map_err(|_| bubble())
}

fn check_radix(radix: u32) -> Result<()> {
    if (2..=36).contains(&radix) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("radix out of range: {}", radix)))
    }
}

fn int_parse_error(s: &str, kind: &IntErrorKind) -> Error {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            Error::invalid_argument(format!("integer out of range: {}", s))
        }
        _ => bubble(),
    }
}

pub fn to_int(s: &str) -> Result<i32> {
    to_int_radix(s, 10)
}

pub fn to_int_radix(s: &str, radix: u32) -> Result<i32> {
    check_radix(radix)?;
    let trimmed = s.trim();
    i32::from_str_radix(trimmed, radix).map_err(|e| int_parse_error(trimmed, e.kind()))
}

pub fn to_int64(s: &str) -> Result<i64> {
    to_int64_radix(s, 10)
}

pub fn to_int64_radix(s: &str, radix: u32) -> Result<i64> {
    check_radix(radix)?;
    let trimmed = s.trim();
    i64::from_str_radix(trimmed, radix).map_err(|e| int_parse_error(trimmed, e.kind()))
}
