//! # Bit-level cursors over caller-supplied buffers
//!
//! Codes are packed MSB-first within each byte. When the stream uses the
//! reversed fill order (TIFF `FillOrder` 2), every byte is passed through a
//! fixed 256-entry bit-reversal table on its way in or out; bit consumption
//! inside a byte is always high to low.

use crate::error::{BufferKind, MhError, MhResult};

/// Order of writing/reading bits to/from a byte (see TIFF spec)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillOrder {
    /// A byte is filled from most- to least-significant bit
    MsbToLsb = 1,
    /// A byte is filled from least- to most-significant bit
    LsbToMsb = 2,
}

impl Default for FillOrder {
    fn default() -> Self {
        FillOrder::MsbToLsb
    }
}

impl FillOrder {
    /// Apply the per-byte transform for this fill order
    pub(crate) fn apply(self, byte: u8) -> u8 {
        match self {
            FillOrder::MsbToLsb => byte,
            FillOrder::LsbToMsb => BIT_REVERSE[byte as usize],
        }
    }
}

/// Byte-wise bit reversal, indexed by byte value
const BIT_REVERSE: [u8; 256] = build_bit_reverse();

const fn build_bit_reverse() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut value = 0usize;
    while value < 256 {
        let mut reversed = 0u8;
        let mut bit = 0;
        while bit < 8 {
            if value & (1 << bit) != 0 {
                reversed |= 0x80 >> bit;
            }
            bit += 1;
        }
        table[value] = reversed;
        value += 1;
    }
    table
}

/// Decode-side cursor: a byte window consumed one bit at a time
///
/// The mask starts out spent, so the first bit read pulls a byte from the
/// input. [`BitReader::align`] spends the mask again, which is how decoding
/// restarts on a fresh byte boundary after every scanline.
#[derive(Debug, Clone, Default)]
pub struct BitReader {
    pub(crate) pos: usize,
    pub(crate) byte: u8,
    pub(crate) mask: u8,
    pub(crate) fill_order: FillOrder,
}

impl BitReader {
    /// Creates a new instance
    pub fn new(fill_order: FillOrder) -> Self {
        BitReader {
            pos: 0,
            byte: 0,
            mask: 0,
            fill_order,
        }
    }

    /// Byte offset of the next unread byte
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Restart at offset 0 of a new buffer, keeping the bit state
    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Discard any partially consumed byte
    pub fn align(&mut self) {
        self.mask = 0;
    }

    /// Read one bit, pulling the next byte when the window is spent
    pub fn next_bit(&mut self, src: &[u8]) -> MhResult<bool> {
        self.mask >>= 1;
        if self.mask == 0 {
            let byte = *src.get(self.pos).ok_or(MhError::NoMoreInputData)?;
            self.byte = self.fill_order.apply(byte);
            self.pos += 1;
            self.mask = 0x80;
        }
        Ok(self.byte & self.mask != 0)
    }
}

/// Encode-side cursor: an accumulator byte written MSB-first
#[derive(Debug, Clone)]
pub struct BitWriter {
    pos: usize,
    acc: u8,
    mask: u8,
    fill_order: FillOrder,
}

impl BitWriter {
    /// Creates a new instance
    pub fn new(fill_order: FillOrder) -> Self {
        BitWriter {
            pos: 0,
            acc: 0,
            mask: 0x80,
            fill_order,
        }
    }

    /// Byte offset one past the last completed byte
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Restart at offset 0 of a new buffer, keeping the bit state
    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }

    /// True when no partial byte is pending
    pub fn is_aligned(&self) -> bool {
        self.mask == 0x80
    }

    /// Write the low `len` bits of `bits`, most significant first
    pub fn write_bits(&mut self, out: &mut [u8], bits: u16, len: u8) -> MhResult<()> {
        for shift in (0..len).rev() {
            if bits & (1 << shift) != 0 {
                self.acc |= self.mask;
            }
            self.mask >>= 1;
            if self.mask == 0 {
                self.put(out)?;
            }
        }
        Ok(())
    }

    /// Write a pending partial byte, realigning on a byte boundary
    pub fn flush(&mut self, out: &mut [u8]) -> MhResult<()> {
        if self.mask != 0x80 {
            self.put(out)?;
        }
        Ok(())
    }

    /// Append a literal byte, bypassing the accumulator
    pub(crate) fn emit_byte(&mut self, out: &mut [u8], value: u8) -> MhResult<()> {
        let slot = out
            .get_mut(self.pos)
            .ok_or(MhError::BufferTooSmall(BufferKind::Compressed))?;
        *slot = value;
        self.pos += 1;
        Ok(())
    }

    fn put(&mut self, out: &mut [u8]) -> MhResult<()> {
        let byte = self.fill_order.apply(self.acc);
        self.emit_byte(out, byte)?;
        self.acc = 0;
        self.mask = 0x80;
        Ok(())
    }
}
