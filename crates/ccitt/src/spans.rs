//! # Packed scanline helpers
//!
//! A packed row stores one bit per pixel, MSB-first within each byte. These
//! routines find and fill pixel spans on such rows, working on whole bytes
//! via 256-entry leading-run tables instead of testing bit by bit.

use crate::color::Color;

/// Number of leading zero bits, indexed by byte value
const ZERO_RUNS: [u8; 256] = build_runs(false);
/// Number of leading one bits, indexed by byte value
const ONE_RUNS: [u8; 256] = build_runs(true);

const fn build_runs(ones: bool) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut value = 0usize;
    while value < 256 {
        let byte = if ones { !(value as u8) } else { value as u8 };
        table[value] = byte.leading_zeros() as u8;
        value += 1;
    }
    table
}

/// Offset of the first bit in `start..end` that differs from `color`,
/// or `end` if the rest of the range is uniform
pub(crate) fn find_diff(line: &[u8], start: usize, end: usize, color: Color) -> usize {
    let table = match color {
        Color::White => &ZERO_RUNS,
        Color::Black => &ONE_RUNS,
    };
    start + find_span(line, start, end, table)
}

/// Length of the span of identical bits at `start`, limited to `end`
fn find_span(line: &[u8], start: usize, end: usize, table: &[u8; 256]) -> usize {
    let mut pos = start >> 3;
    let mut bits = end.saturating_sub(start);
    let mut span = 0;

    // partial byte on the left
    let shift = start & 7;
    if bits > 0 && shift != 0 {
        let mut n = table[(line[pos] as usize) << shift & 0xff] as usize;
        if n > 8 - shift {
            n = 8 - shift;
        }
        if n > bits {
            n = bits;
        }
        span = n;
        if shift + n < 8 {
            return span;
        }
        bits -= n;
        pos += 1;
    }

    while bits >= 8 {
        let n = table[line[pos] as usize] as usize;
        span += n;
        bits -= n;
        if n < 8 {
            return span;
        }
        pos += 1;
    }

    // partial byte on the right
    if bits > 0 {
        let n = table[line[pos] as usize] as usize;
        span += if n > bits { bits } else { n };
    }
    span
}

const FILL_MASKS: [u8; 9] = [0x00, 0x80, 0xc0, 0xe0, 0xf0, 0xf8, 0xfc, 0xfe, 0xff];

/// Fill `count` pixels of ink starting at bit offset `x`.
///
/// With `invert` the row was prefilled with ones and ink clears bits, so
/// partial bytes toggle and whole bytes are stored as zeros.
pub(crate) fn fill_span(line: &mut [u8], x: usize, mut count: usize, invert: bool) {
    if count == 0 {
        return;
    }
    let mut pos = x >> 3;
    let bit = x & 7;
    if invert {
        if bit != 0 {
            if count < 8 - bit {
                line[pos] ^= FILL_MASKS[count] >> bit;
                return;
            }
            line[pos] ^= 0xff >> bit;
            pos += 1;
            count -= 8 - bit;
        }
        while count >= 8 {
            line[pos] = 0x00;
            pos += 1;
            count -= 8;
        }
        if count > 0 {
            line[pos] ^= FILL_MASKS[count];
        }
    } else {
        if bit != 0 {
            if count < 8 - bit {
                line[pos] |= FILL_MASKS[count] >> bit;
                return;
            }
            line[pos] |= 0xff >> bit;
            pos += 1;
            count -= 8 - bit;
        }
        while count >= 8 {
            line[pos] = 0xff;
            pos += 1;
            count -= 8;
        }
        if count > 0 {
            line[pos] |= FILL_MASKS[count];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_run_tables() {
        assert_eq!(ZERO_RUNS[0x00], 8);
        assert_eq!(ZERO_RUNS[0xFF], 0);
        assert_eq!(ZERO_RUNS[0b00010000], 3);
        assert_eq!(ONE_RUNS[0xFF], 8);
        assert_eq!(ONE_RUNS[0x00], 0);
        assert_eq!(ONE_RUNS[0b11100000], 3);
    }

    #[test]
    fn test_find_diff() {
        let line = [0b00001111, 0b11110000];
        assert_eq!(find_diff(&line, 0, 16, Color::White), 4);
        assert_eq!(find_diff(&line, 4, 16, Color::Black), 12);
        assert_eq!(find_diff(&line, 12, 16, Color::White), 16);
        // start inside the first partial byte
        assert_eq!(find_diff(&line, 2, 16, Color::White), 4);
    }

    #[test]
    fn test_find_diff_spanning_bytes() {
        let line = [0x00, 0x00, 0b00010000];
        assert_eq!(find_diff(&line, 0, 24, Color::White), 19);
        let line = [0xFF, 0xFF, 0xFF];
        assert_eq!(find_diff(&line, 5, 24, Color::Black), 24);
    }

    #[test]
    fn test_find_diff_stops_at_end() {
        let line = [0x00, 0x00];
        assert_eq!(find_diff(&line, 0, 10, Color::White), 10);
        assert_eq!(find_diff(&line, 10, 10, Color::White), 10);
    }

    #[test]
    fn test_fill_span() {
        let mut line = [0u8; 2];
        fill_span(&mut line, 3, 7, false);
        assert_eq!(line, [0b00011111, 0b11000000]);

        let mut line = [0u8; 2];
        fill_span(&mut line, 2, 3, false);
        assert_eq!(line, [0b00111000, 0b00000000]);

        let mut line = [0u8; 4];
        fill_span(&mut line, 8, 16, false);
        assert_eq!(line, [0x00, 0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn test_fill_span_inverted() {
        let mut line = [0xFFu8; 2];
        fill_span(&mut line, 3, 7, true);
        assert_eq!(line, [0b11100000, 0b00111111]);

        let mut line = [0xFFu8; 1];
        fill_span(&mut line, 0, 8, true);
        assert_eq!(line, [0x00]);
    }

    #[test]
    fn test_fill_span_empty() {
        let mut line = [0u8; 1];
        fill_span(&mut line, 3, 0, false);
        assert_eq!(line, [0x00]);
    }
}
