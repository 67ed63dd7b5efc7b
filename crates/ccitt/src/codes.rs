//! # Modified Huffman code tables
//!
//! One (length, bits) pair per run length, per color. Runs 0 to 63 use the
//! terminating tables. Longer runs put a make-up code (a multiple of 64) in
//! front of the terminating code for the remainder; make-up codes above 1728
//! are shared by both colors. A run longer than 2623 pixels has no single
//! make-up/terminating pair, so the encoder repeats the largest pair with a
//! zero-length run of the opposite color in between to keep the colors
//! alternating.
//!
//! `bits` are right-justified for the encoder. The decoder probes with
//! left-justified windows, one bit at a time, against the per-color entry
//! lists built at compile time (which also carry the end-of-line code).

use crate::bits::{BitReader, BitWriter};
use crate::color::Color;
use crate::error::{MhError, MhResult};

/// Longest run a terminating code can express
pub(crate) const MAX_TERM_RUN: u32 = 63;
/// Longest run a single make-up/terminating pair can express
const MAX_PAIR_RUN: u32 = 2560 + MAX_TERM_RUN;

/// End-of-line code, `000000000001`
const EOL: (u8, u16) = (12, 0b000000000001);

/// Longest white code to probe for (common make-up and EOL codes)
const WHITE_MAX_BITS: u8 = 12;
/// Longest black code to probe for (black make-up codes reach 13 bits)
const BLACK_MAX_BITS: u8 = 13;

/// Terminating codes for white runs 0..=63
const WHITE_TERM: [(u8, u16); 64] = [
    (8, 0b00110101),
    (6, 0b000111),
    (4, 0b0111),
    (4, 0b1000),
    (4, 0b1011),
    (4, 0b1100),
    (4, 0b1110),
    (4, 0b1111),
    (5, 0b10011),
    (5, 0b10100),
    (5, 0b00111),
    (5, 0b01000),
    (6, 0b001000),
    (6, 0b000011),
    (6, 0b110100),
    (6, 0b110101),
    (6, 0b101010),
    (6, 0b101011),
    (7, 0b0100111),
    (7, 0b0001100),
    (7, 0b0001000),
    (7, 0b0010111),
    (7, 0b0000011),
    (7, 0b0000100),
    (7, 0b0101000),
    (7, 0b0101011),
    (7, 0b0010011),
    (7, 0b0100100),
    (7, 0b0011000),
    (8, 0b00000010),
    (8, 0b00000011),
    (8, 0b00011010),
    (8, 0b00011011),
    (8, 0b00010010),
    (8, 0b00010011),
    (8, 0b00010100),
    (8, 0b00010101),
    (8, 0b00010110),
    (8, 0b00010111),
    (8, 0b00101000),
    (8, 0b00101001),
    (8, 0b00101010),
    (8, 0b00101011),
    (8, 0b00101100),
    (8, 0b00101101),
    (8, 0b00000100),
    (8, 0b00000101),
    (8, 0b00001010),
    (8, 0b00001011),
    (8, 0b01010010),
    (8, 0b01010011),
    (8, 0b01010100),
    (8, 0b01010101),
    (8, 0b00100100),
    (8, 0b00100101),
    (8, 0b01011000),
    (8, 0b01011001),
    (8, 0b01011010),
    (8, 0b01011011),
    (8, 0b01001010),
    (8, 0b01001011),
    (8, 0b00110010),
    (8, 0b00110011),
    (8, 0b00110100),
];

/// Make-up codes for white runs; index i stands for run (i + 1) * 64.
/// The last 13 entries (1792..=2560) are the common make-up codes.
const WHITE_MAKEUP: [(u8, u16); 40] = [
    (5, 0b11011),
    (5, 0b10010),
    (6, 0b010111),
    (7, 0b0110111),
    (8, 0b00110110),
    (8, 0b00110111),
    (8, 0b01100100),
    (8, 0b01100101),
    (8, 0b01101000),
    (8, 0b01100111),
    (9, 0b011001100),
    (9, 0b011001101),
    (9, 0b011010010),
    (9, 0b011010011),
    (9, 0b011010100),
    (9, 0b011010101),
    (9, 0b011010110),
    (9, 0b011010111),
    (9, 0b011011000),
    (9, 0b011011001),
    (9, 0b011011010),
    (9, 0b011011011),
    (9, 0b010011000),
    (9, 0b010011001),
    (9, 0b010011010),
    (6, 0b011000),
    (9, 0b010011011),
    (11, 0b00000001000),
    (11, 0b00000001100),
    (11, 0b00000001101),
    (12, 0b000000010010),
    (12, 0b000000010011),
    (12, 0b000000010100),
    (12, 0b000000010101),
    (12, 0b000000010110),
    (12, 0b000000010111),
    (12, 0b000000011100),
    (12, 0b000000011101),
    (12, 0b000000011110),
    (12, 0b000000011111),
];

/// Terminating codes for black runs 0..=63
const BLACK_TERM: [(u8, u16); 64] = [
    (10, 0b0000110111),
    (3, 0b010),
    (2, 0b11),
    (2, 0b10),
    (3, 0b011),
    (4, 0b0011),
    (4, 0b0010),
    (5, 0b00011),
    (6, 0b000101),
    (6, 0b000100),
    (7, 0b0000100),
    (7, 0b0000101),
    (7, 0b0000111),
    (8, 0b00000100),
    (8, 0b00000111),
    (9, 0b000011000),
    (10, 0b0000010111),
    (10, 0b0000011000),
    (10, 0b0000001000),
    (11, 0b00001100111),
    (11, 0b00001101000),
    (11, 0b00001101100),
    (11, 0b00000110111),
    (11, 0b00000101000),
    (11, 0b00000010111),
    (11, 0b00000011000),
    (12, 0b000011001010),
    (12, 0b000011001011),
    (12, 0b000011001100),
    (12, 0b000011001101),
    (12, 0b000001101000),
    (12, 0b000001101001),
    (12, 0b000001101010),
    (12, 0b000001101011),
    (12, 0b000011010010),
    (12, 0b000011010011),
    (12, 0b000011010100),
    (12, 0b000011010101),
    (12, 0b000011010110),
    (12, 0b000011010111),
    (12, 0b000001101100),
    (12, 0b000001101101),
    (12, 0b000011011010),
    (12, 0b000011011011),
    (12, 0b000001010100),
    (12, 0b000001010101),
    (12, 0b000001010110),
    (12, 0b000001010111),
    (12, 0b000001100100),
    (12, 0b000001100101),
    (12, 0b000001010010),
    (12, 0b000001010011),
    (12, 0b000000100100),
    (12, 0b000000110111),
    (12, 0b000000111000),
    (12, 0b000000100111),
    (12, 0b000000101000),
    (12, 0b000001011000),
    (12, 0b000001011001),
    (12, 0b000000101011),
    (12, 0b000000101100),
    (12, 0b000001011010),
    (12, 0b000001100110),
    (12, 0b000001100111),
];

/// Make-up codes for black runs; index i stands for run (i + 1) * 64.
/// The last 13 entries (1792..=2560) are the common make-up codes.
const BLACK_MAKEUP: [(u8, u16); 40] = [
    (10, 0b0000001111),
    (12, 0b000011001000),
    (12, 0b000011001001),
    (12, 0b000001011011),
    (12, 0b000000110011),
    (12, 0b000000110100),
    (12, 0b000000110101),
    (13, 0b0000001101100),
    (13, 0b0000001101101),
    (13, 0b0000001001010),
    (13, 0b0000001001011),
    (13, 0b0000001001100),
    (13, 0b0000001001101),
    (13, 0b0000001110010),
    (13, 0b0000001110011),
    (13, 0b0000001110100),
    (13, 0b0000001110101),
    (13, 0b0000001110110),
    (13, 0b0000001110111),
    (13, 0b0000001010010),
    (13, 0b0000001010011),
    (13, 0b0000001010100),
    (13, 0b0000001010101),
    (13, 0b0000001011010),
    (13, 0b0000001011011),
    (13, 0b0000001100100),
    (13, 0b0000001100101),
    (11, 0b00000001000),
    (11, 0b00000001100),
    (11, 0b00000001101),
    (12, 0b000000010010),
    (12, 0b000000010011),
    (12, 0b000000010100),
    (12, 0b000000010101),
    (12, 0b000000010110),
    (12, 0b000000010111),
    (12, 0b000000011100),
    (12, 0b000000011101),
    (12, 0b000000011110),
    (12, 0b000000011111),
];

/// A single code read off the bit stream, before make-up accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawCode {
    /// Terminating or make-up run length
    Run(u16),
    /// End-of-line code
    Eol,
}

/// Decode probe entry with the code left-justified in 16 bits
#[derive(Debug, Clone, Copy)]
struct Entry {
    window: u16,
    len: u8,
    run: u16,
}

/// Marker run for the end-of-line entry
const EOL_RUN: u16 = u16::MAX;

const fn left_justified(code: (u8, u16)) -> u16 {
    code.1 << (16 - code.0)
}

const fn build_entries(
    term: &[(u8, u16); 64],
    makeup: &[(u8, u16); 40],
) -> [Entry; 105] {
    let mut entries = [Entry {
        window: 0,
        len: 0,
        run: 0,
    }; 105];
    let mut i = 0;
    while i < 64 {
        entries[i] = Entry {
            window: left_justified(term[i]),
            len: term[i].0,
            run: i as u16,
        };
        i += 1;
    }
    while i < 104 {
        let j = i - 64;
        entries[i] = Entry {
            window: left_justified(makeup[j]),
            len: makeup[j].0,
            run: ((j + 1) * 64) as u16,
        };
        i += 1;
    }
    entries[104] = Entry {
        window: left_justified(EOL),
        len: EOL.0,
        run: EOL_RUN,
    };
    entries
}

const WHITE_ENTRIES: [Entry; 105] = build_entries(&WHITE_TERM, &WHITE_MAKEUP);
const BLACK_ENTRIES: [Entry; 105] = build_entries(&BLACK_TERM, &BLACK_MAKEUP);

/// Read one code of the given color off the reader.
///
/// The byte window is only committed back to the reader when a code matches.
/// On failure the reader keeps its old window, but the byte position has
/// already moved past whatever was pulled in, so a caller can report how far
/// into the buffer the bad code sits.
pub(crate) fn read_code(reader: &mut BitReader, src: &[u8], color: Color) -> MhResult<RawCode> {
    let (entries, max_bits) = match color {
        Color::White => (&WHITE_ENTRIES, WHITE_MAX_BITS),
        Color::Black => (&BLACK_ENTRIES, BLACK_MAX_BITS),
    };
    let mut byte = reader.byte;
    let mut mask = reader.mask;
    let mut window = 0u16;
    let mut window_bit = 0x8000u16;
    for len in 1..=max_bits {
        mask >>= 1;
        if mask == 0 {
            let next = *src.get(reader.pos).ok_or(MhError::NoMoreInputData)?;
            byte = reader.fill_order.apply(next);
            reader.pos += 1;
            mask = 0x80;
        }
        if byte & mask != 0 {
            window |= window_bit;
        }
        window_bit >>= 1;
        for entry in entries.iter() {
            if entry.len == len && entry.window == window {
                reader.byte = byte;
                reader.mask = mask;
                return Ok(if entry.run == EOL_RUN {
                    RawCode::Eol
                } else {
                    RawCode::Run(entry.run)
                });
            }
        }
    }
    Err(MhError::InvalidCode)
}

/// Write the code or codes for one run of the given color.
///
/// Runs above 2623 repeat the largest make-up/terminating pair with a
/// zero-length terminating code of the opposite color in between, so the
/// decoder sees strictly alternating colors.
pub(crate) fn write_run(
    writer: &mut BitWriter,
    out: &mut [u8],
    color: Color,
    run: u32,
) -> MhResult<()> {
    let (term, makeup, other_term) = match color {
        Color::White => (&WHITE_TERM, &WHITE_MAKEUP, &BLACK_TERM),
        Color::Black => (&BLACK_TERM, &BLACK_MAKEUP, &WHITE_TERM),
    };
    let mut rest = run;
    while rest > MAX_PAIR_RUN {
        write_code(writer, out, makeup[39])?;
        write_code(writer, out, term[63])?;
        write_code(writer, out, other_term[0])?;
        rest -= MAX_PAIR_RUN;
    }
    if rest > MAX_TERM_RUN {
        write_code(writer, out, makeup[(rest >> 6) as usize - 1])?;
        rest &= MAX_TERM_RUN;
    }
    write_code(writer, out, term[rest as usize])
}

fn write_code(writer: &mut BitWriter, out: &mut [u8], code: (u8, u16)) -> MhResult<()> {
    writer.write_bits(out, code.1, code.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::FillOrder;

    #[test]
    fn test_term_spot_checks() {
        assert_eq!(WHITE_TERM[0], (8, 0b00110101));
        assert_eq!(WHITE_TERM[8], (5, 0b10011));
        assert_eq!(WHITE_TERM[63], (8, 0b00110100));
        assert_eq!(BLACK_TERM[0], (10, 0b0000110111));
        assert_eq!(BLACK_TERM[2], (2, 0b11));
    }

    #[test]
    fn test_makeup_spot_checks() {
        assert_eq!(WHITE_MAKEUP[0], (5, 0b11011));
        assert_eq!(WHITE_MAKEUP[26], (9, 0b010011011));
        assert_eq!(BLACK_MAKEUP[0], (10, 0b0000001111));
        assert_eq!(BLACK_MAKEUP[26], (13, 0b0000001100101));
        // make-up codes above 1728 are shared
        for i in 27..40 {
            assert_eq!(WHITE_MAKEUP[i], BLACK_MAKEUP[i]);
        }
        assert_eq!(WHITE_MAKEUP[39], (12, 0b000000011111));
    }

    #[test]
    fn test_no_code_is_a_prefix_of_another() {
        for entries in [&WHITE_ENTRIES, &BLACK_ENTRIES] {
            for (i, a) in entries.iter().enumerate() {
                for (j, b) in entries.iter().enumerate() {
                    if i == j || a.len > b.len {
                        continue;
                    }
                    let mask = !0u16 << (16 - a.len);
                    assert!(
                        a.window != b.window & mask,
                        "{:0w$b} is a prefix of {:0v$b}",
                        a.window >> (16 - a.len),
                        b.window >> (16 - b.len),
                        w = a.len as usize,
                        v = b.len as usize,
                    );
                }
            }
        }
    }

    #[test]
    fn test_read_single_codes() {
        // white 8 (10011) then white 3 (1000)
        let src = [0b10011100, 0b00000000];
        let mut reader = BitReader::new(FillOrder::MsbToLsb);
        assert_eq!(read_code(&mut reader, &src, Color::White), Ok(RawCode::Run(8)));
        assert_eq!(read_code(&mut reader, &src, Color::White), Ok(RawCode::Run(3)));
    }

    #[test]
    fn test_read_eol() {
        let src = [0b00000000, 0b00010000];
        let mut reader = BitReader::new(FillOrder::MsbToLsb);
        assert_eq!(read_code(&mut reader, &src, Color::White), Ok(RawCode::Eol));
        assert_eq!(reader.pos(), 2);
    }

    #[test]
    fn test_read_invalid_code_keeps_window() {
        // twelve zero bits match no white code and are not an EOL
        let src = [0b00000000, 0b00000000];
        let mut reader = BitReader::new(FillOrder::MsbToLsb);
        assert_eq!(
            read_code(&mut reader, &src, Color::White),
            Err(MhError::InvalidCode)
        );
        // the probe consumed into the second byte but committed nothing
        assert_eq!(reader.pos(), 2);
        assert_eq!(reader.mask, 0);
    }

    #[test]
    fn test_read_truncated_input() {
        let src = [0b00000000];
        let mut reader = BitReader::new(FillOrder::MsbToLsb);
        assert_eq!(
            read_code(&mut reader, &src, Color::White),
            Err(MhError::NoMoreInputData)
        );
    }

    #[test]
    fn test_write_short_run() {
        let mut out = [0u8; 1];
        let mut writer = BitWriter::new(FillOrder::MsbToLsb);
        write_run(&mut writer, &mut out, Color::White, 8).unwrap();
        writer.flush(&mut out).unwrap();
        assert_eq!(out[0], 0b10011000);
    }

    #[test]
    fn test_write_makeup_pair() {
        // 64 = make-up 64 (11011) + terminating 0 (00110101)
        let mut out = [0u8; 2];
        let mut writer = BitWriter::new(FillOrder::MsbToLsb);
        write_run(&mut writer, &mut out, Color::White, 64).unwrap();
        writer.flush(&mut out).unwrap();
        assert_eq!(out, [0b11011001, 0b10101000]);
    }

    #[test]
    fn test_write_oversized_run() {
        // 2624 = 2560 + 63 (white), zero-length black, then white 1
        let mut out = [0u8; 5];
        let mut writer = BitWriter::new(FillOrder::MsbToLsb);
        write_run(&mut writer, &mut out, Color::White, 2624).unwrap();
        writer.flush(&mut out).unwrap();
        assert_eq!(out, [0x01, 0xF3, 0x40, 0xDC, 0x70]);

        let mut reader = BitReader::new(FillOrder::MsbToLsb);
        assert_eq!(
            read_code(&mut reader, &out, Color::White),
            Ok(RawCode::Run(2560))
        );
        assert_eq!(
            read_code(&mut reader, &out, Color::White),
            Ok(RawCode::Run(63))
        );
        assert_eq!(
            read_code(&mut reader, &out, Color::Black),
            Ok(RawCode::Run(0))
        );
        assert_eq!(
            read_code(&mut reader, &out, Color::White),
            Ok(RawCode::Run(1))
        );
    }
}
