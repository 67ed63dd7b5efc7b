//! # Scanline encoding
//!
//! Encoding runs in two steps. A scan pass turns the input line into
//! changing-element pairs, one pair per ink span, recorded 1-based with
//! the right edge one past the last ink pixel. The emit pass then walks
//! the pairs and writes alternating white/black codes, closing the line
//! with the trailing white run and a flush to the next byte boundary.
//!
//! The element pairs stay readable on the session after the line is
//! written, so a caller can inspect what the encoder saw.

use log::warn;

use crate::codes;
use crate::color::Color;
use crate::error::{BufferKind, MhError, MhResult};
use crate::session::{MhSession, Mode};
use crate::spans;

impl MhSession {
    /// Encode the next scanline of the packed-pixel chunk buffer.
    ///
    /// The line offset advances by one stride as soon as the line has been
    /// scanned. On failure the error is recorded for [`MhSession::post`].
    pub fn encode_line_from_packed_bits(&mut self, packed: &[u8], out: &mut [u8]) -> MhResult<()> {
        debug_assert!(self.mode == Mode::Encode);
        debug_assert!(self.line_stride != 0);
        self.last_error = None;
        let done = self
            .scan_line_elements(packed)
            .and_then(|()| self.emit_line(out));
        done.map_err(|e| {
            warn!("packed scanline encode failed at byte {}: {}", self.writer.pos(), e);
            self.last_error = Some(e);
            e
        })
    }

    /// Encode one scanline from a run-length row, starting at the current
    /// slot cursor.
    ///
    /// Runs are consumed until they cover the width; zero-length slots
    /// merge their neighbors, which is how rows carrying runs above the
    /// slot maximum come back together. Whether a run is ink is decided by
    /// the parity of its slot index, flipped under inverted polarity.
    pub fn encode_line_from_runs(&mut self, slots: &[u16], out: &mut [u8]) -> MhResult<()> {
        debug_assert!(self.mode == Mode::Encode);
        self.last_error = None;
        let done = self
            .collect_run_elements(slots)
            .and_then(|()| self.emit_line(out));
        done.map_err(|e| {
            warn!("run-length scanline encode failed at byte {}: {}", self.writer.pos(), e);
            self.last_error = Some(e);
            e
        })
    }

    /// Scan the packed line for ink spans and record them as element pairs
    fn scan_line_elements(&mut self, packed: &[u8]) -> MhResult<()> {
        let line = packed
            .get(self.packed_pos..)
            .ok_or(MhError::BufferTooSmall(BufferKind::PackedBits))?;
        let width = self.width as usize;
        if line.len() * 8 < width {
            return Err(MhError::BufferTooSmall(BufferKind::PackedBits));
        }

        self.elements.clear();
        self.pairs = 0;

        let gap = Color::from(self.invert);
        let ink = gap.other();

        let mut i = 0;
        while i < width {
            let left = spans::find_diff(line, i, width, gap);
            if left == width {
                break;
            }
            let right = spans::find_diff(line, left, width, ink);
            self.push_pair(left as u32 + 1, right as u32 + 1);
            i = right + 1;
        }

        self.packed_pos += self.line_stride;
        self.push_sentinels();
        Ok(())
    }

    /// Walk run slots until they cover the width, recording an element
    /// pair for every merged run that lands on the ink parity
    fn collect_run_elements(&mut self, slots: &[u16]) -> MhResult<()> {
        self.elements.clear();
        self.pairs = 0;

        let width = self.width;
        let ink_parity = usize::from(self.invert);
        let mut total: u32 = 0;

        while total < width {
            let slot = *slots
                .get(self.run_pos)
                .ok_or(MhError::BufferTooSmall(BufferKind::RunLengths))?;
            if slot == 0 {
                self.run_pos += 1;
                continue;
            }

            let start = total;
            total = total.saturating_add(u32::from(slot));
            self.run_pos += 1;

            // a zero slot splices the next slot onto the current run
            while total < width && slots.get(self.run_pos) == Some(&0) {
                let next = *slots
                    .get(self.run_pos + 1)
                    .ok_or(MhError::BufferTooSmall(BufferKind::RunLengths))?;
                total = total.saturating_add(u32::from(next));
                self.run_pos += 2;
            }

            if self.run_pos & 1 == ink_parity {
                self.push_pair(start + 1, total + 1);
            }
        }

        self.push_sentinels();
        Ok(())
    }

    /// Emit the recorded pairs as alternating white/black codes and close
    /// the line on a byte boundary
    fn emit_line(&mut self, out: &mut [u8]) -> MhResult<()> {
        let mut oldr: u32 = 0;

        for i in 0..self.pairs {
            let left = self.elements[2 * i].pos;
            let right = self.elements[2 * i + 1].pos;
            codes::write_run(&mut self.writer, out, Color::White, left.saturating_sub(oldr + 1))?;
            codes::write_run(&mut self.writer, out, Color::Black, right.saturating_sub(left))?;
            oldr = right - 1;
        }

        let tail = self.width.saturating_sub(oldr);
        if tail > 0 {
            codes::write_run(&mut self.writer, out, Color::White, tail)?;
        }
        self.writer.flush(out)
    }
}
