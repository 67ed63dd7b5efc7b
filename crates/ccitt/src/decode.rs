//! # Scanline decoding
//!
//! Both decode loops walk the compressed stream one full run at a time,
//! tracking a 1-based pixel cursor `x` and the open ink span `l..=r`. A
//! span is closed when a positive white run follows it; zero-length runs
//! only switch the expected color, which is how runs above 2623 pixels
//! (split by the encoder) come back together, and the span still open when
//! `x` passes the width is closed at line end.
//!
//! A failed line leaves the stream position wherever the bad code ended and
//! does not advance the packed line offset, so the caller can inspect how
//! far decoding got. The run-length variant still tops its row up to the
//! full width before reporting the error.

use log::warn;

use crate::bits::BitReader;
use crate::codes::{self, RawCode, MAX_TERM_RUN};
use crate::color::Color;
use crate::error::{BufferKind, MhError, MhResult};
use crate::runs;
use crate::session::{MhSession, Mode};
use crate::spans;

/// One run after make-up accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunCode {
    /// Total pixel count, possibly summed over several make-up codes
    Run(u32),
    /// End-of-line seen in place of a run
    Eol,
}

/// Read one full run of the given color.
///
/// A make-up code keeps the read going until a terminating code arrives;
/// the pixel counts add up, saturating rather than wrapping on absurd
/// streams. An end-of-line code is only legal as the first code, in the
/// middle of an accumulation it is reported as [`MhError::InvalidCode`].
pub(crate) fn next_run(reader: &mut BitReader, src: &[u8], color: Color) -> MhResult<RunCode> {
    let first = match codes::read_code(reader, src, color)? {
        RawCode::Eol => return Ok(RunCode::Eol),
        RawCode::Run(run) => run,
    };
    let mut total = u32::from(first);
    let mut code = first;
    while u32::from(code) > MAX_TERM_RUN {
        code = match codes::read_code(reader, src, color)? {
            RawCode::Eol => return Err(MhError::InvalidCode),
            RawCode::Run(run) => run,
        };
        total = total.saturating_add(u32::from(code));
    }
    Ok(RunCode::Run(total))
}

impl MhSession {
    /// Decode the next scanline into the packed-pixel chunk buffer.
    ///
    /// On success the line offset advances by one stride and the stream
    /// realigns on a byte boundary. On failure the offset stays, the pair
    /// list is cleared and the error is recorded for [`MhSession::post`].
    pub fn decode_line_to_packed_bits(&mut self, src: &[u8], packed: &mut [u8]) -> MhResult<()> {
        debug_assert!(self.mode == Mode::Decode);
        debug_assert!(self.line_stride != 0);
        self.last_error = None;
        self.decode_packed_line(src, packed).map_err(|e| {
            warn!("packed scanline decode failed at byte {}: {}", self.reader.pos(), e);
            self.last_error = Some(e);
            self.elements.clear();
            self.pairs = 0;
            e
        })
    }

    fn decode_packed_line(&mut self, src: &[u8], packed: &mut [u8]) -> MhResult<()> {
        let line = packed
            .get_mut(self.packed_pos..)
            .ok_or(MhError::BufferTooSmall(BufferKind::PackedBits))?;
        let avail_bits = line.len() * 8;

        self.elements.clear();
        self.pairs = 0;

        let width = self.width;
        let mut color = Color::White;
        let mut x: u32 = 1;
        let mut l: u32 = 0;
        let mut r: u32 = 0;

        loop {
            let code = match next_run(&mut self.reader, src, color)? {
                RunCode::Eol => return Err(MhError::ReadError),
                RunCode::Run(run) => run,
            };
            match color {
                Color::White => {
                    if code > 0 && r > 0 {
                        fill_ink(self, line, avail_bits, l, r)?;
                        r = 0;
                    }
                    x = x.saturating_add(code);
                }
                Color::Black => {
                    if code > 0 {
                        if r == 0 {
                            l = x;
                        }
                        x = x.saturating_add(code);
                        r = x - 1;
                    }
                }
            }
            color.invert();
            if x > width {
                break;
            }
        }

        if r != 0 {
            fill_ink(self, line, avail_bits, l, r)?;
        }

        self.packed_pos += self.line_stride;
        self.push_sentinels();
        self.reader.align();
        Ok(())
    }

    /// Decode the next scanline into a run-length row, starting at the
    /// current slot cursor.
    ///
    /// The row's runs always sum to the full width, even when the line
    /// fails partway; the remainder is emitted as one final white run. With
    /// inverted polarity a zero-length run is added at each end of the row.
    pub fn decode_line_to_runs(&mut self, src: &[u8], slots: &mut [u16]) -> MhResult<()> {
        debug_assert!(self.mode == Mode::Decode);
        self.last_error = None;

        let mut last_right: u32 = 0;
        let decoded = self.decode_run_line(src, slots, &mut last_right);
        let finished = self.finish_run_line(slots, last_right);
        self.pairs = 0;
        decoded.and(finished).map_err(|e| {
            warn!("run-length scanline decode failed at byte {}: {}", self.reader.pos(), e);
            self.last_error = Some(e);
            e
        })
    }

    fn decode_run_line(
        &mut self,
        src: &[u8],
        slots: &mut [u16],
        last_right: &mut u32,
    ) -> MhResult<()> {
        if self.invert {
            runs::push_run(slots, &mut self.run_pos, 0)?;
        }

        let width = self.width;
        let mut color = Color::White;
        let mut x: u32 = 1;
        let mut l: u32 = 0;
        let mut r: u32 = 0;

        loop {
            let code = match next_run(&mut self.reader, src, color)? {
                RunCode::Eol => return Err(MhError::ReadError),
                RunCode::Run(run) => run,
            };
            match color {
                Color::White => {
                    if code > 0 && r > 0 {
                        runs::push_run(slots, &mut self.run_pos, l - *last_right - 1)?;
                        runs::push_run(slots, &mut self.run_pos, r - (l - 1))?;
                        *last_right = r;
                        self.pairs += 1;
                        r = 0;
                    }
                    x = x.saturating_add(code);
                }
                Color::Black => {
                    if code > 0 {
                        if r == 0 {
                            l = x;
                        }
                        x = x.saturating_add(code);
                        r = x - 1;
                    }
                }
            }
            color.invert();
            if x > width {
                break;
            }
        }

        if r != 0 {
            runs::push_run(slots, &mut self.run_pos, l - *last_right - 1)?;
            runs::push_run(slots, &mut self.run_pos, r - (l - 1))?;
            *last_right = r;
            self.pairs += 1;
        }
        Ok(())
    }

    /// Top the row up to the full width and realign the stream. This runs
    /// on the error path too, so a partially decoded row stays well-formed.
    fn finish_run_line(&mut self, slots: &mut [u16], last_right: u32) -> MhResult<()> {
        let gap = runs::push_run(
            slots,
            &mut self.run_pos,
            self.width.saturating_sub(last_right),
        );
        let trailer = if self.invert {
            runs::push_run(slots, &mut self.run_pos, 0)
        } else {
            Ok(())
        };
        self.reader.align();
        gap.and(trailer)
    }
}

/// Close the open span: render its pixels and record the element pair
fn fill_ink(
    session: &mut MhSession,
    line: &mut [u8],
    avail_bits: usize,
    l: u32,
    r: u32,
) -> MhResult<()> {
    if r as usize > avail_bits {
        return Err(MhError::BufferTooSmall(BufferKind::PackedBits));
    }
    spans::fill_span(line, l as usize - 1, (r - (l - 1)) as usize, session.invert);
    session.push_pair(l, r);
    Ok(())
}
