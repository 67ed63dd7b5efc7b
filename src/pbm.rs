//! Reading and writing Portable Bit-Maps.
//!
//! Covers the plain (P1) and raw (P4) variants. The raw raster layout is
//! the same packed form the codec works on: eight pixels per byte, leftmost
//! pixel in the most significant bit, rows padded to a byte boundary, a set
//! bit meaning black.

use std::io::{self, Write};

use ccitt_mh::packed_line_stride;
use color_eyre::eyre::{self, bail, eyre};

/// A bi-level image in packed rows
pub struct Image {
    /// Width in pixels
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Packed rows, `packed_line_stride(width)` bytes each
    pub data: Vec<u8>,
}

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Header<'_> {
    fn skip_space(&mut self) {
        loop {
            match self.bytes.get(self.pos) {
                Some(b'#') => {
                    while !matches!(self.bytes.get(self.pos), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(c) if c.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn number(&mut self) -> eyre::Result<u32> {
        self.skip_space();
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(c) = self.bytes.get(self.pos) {
            if !c.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(c - b'0')))
                .ok_or_else(|| eyre!("PBM header number out of range"))?;
            digits += 1;
            self.pos += 1;
        }
        if digits == 0 {
            bail!("Malformed PBM header");
        }
        Ok(value)
    }
}

/// Parse a P1 or P4 file into packed rows
pub fn parse(bytes: &[u8]) -> eyre::Result<Image> {
    let magic = bytes
        .get(..2)
        .ok_or_else(|| eyre!("File too short for a PBM header"))?;
    let mut header = Header { bytes, pos: 2 };
    let width = header.number()?;
    let height = header.number()?;

    let stride = packed_line_stride(width);
    let size = stride
        .checked_mul(height as usize)
        .ok_or_else(|| eyre!("PBM dimensions out of range"))?;
    let mut data = vec![0u8; size];

    match magic {
        b"P1" => {
            let mut pixel = 0u64;
            let total = u64::from(width) * u64::from(height);
            while let Some(&c) = bytes.get(header.pos) {
                match c {
                    b'0' | b'1' => {
                        if pixel == total {
                            bail!("More pixels than the PBM header announced");
                        }
                        if c == b'1' {
                            let row = (pixel / u64::from(width)) as usize;
                            let col = (pixel % u64::from(width)) as usize;
                            data[row * stride + col / 8] |= 0x80 >> (col % 8);
                        }
                        pixel += 1;
                        header.pos += 1;
                    }
                    b'#' => {
                        while !matches!(bytes.get(header.pos), None | Some(b'\n')) {
                            header.pos += 1;
                        }
                    }
                    c if c.is_ascii_whitespace() => header.pos += 1,
                    c => bail!("Unexpected byte {:?} in a plain PBM raster", c as char),
                }
            }
            if pixel != total {
                bail!("Plain PBM raster ended after {} of {} pixels", pixel, total);
            }
        }
        b"P4" => {
            match bytes.get(header.pos) {
                Some(c) if c.is_ascii_whitespace() => header.pos += 1,
                _ => bail!("Missing whitespace before the raw PBM raster"),
            }
            let raster = bytes
                .get(header.pos..header.pos + data.len())
                .ok_or_else(|| eyre!("Raw PBM raster shorter than the header announced"))?;
            data.copy_from_slice(raster);
        }
        magic => bail!("Unsupported PBM type {:?}", magic),
    }

    Ok(Image {
        width,
        height,
        data,
    })
}

/// Write packed rows as a raw (P4) file
pub fn write(out: &mut impl Write, width: u32, height: u32, data: &[u8]) -> io::Result<()> {
    write!(out, "P4\n{} {}\n", width, height)?;
    out.write_all(data)
}
