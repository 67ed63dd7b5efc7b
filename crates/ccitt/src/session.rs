//! # Codec session state
//!
//! An [`MhSession`] holds everything that has to survive between scanlines
//! of one image: the compressed-stream cursors, the changing-element list of
//! the line being worked on, per-chunk buffer offsets, and the sticky error
//! used to decide whether finishing work may run. The session never owns the
//! compressed, packed or run-length buffers; callers pass those into every
//! operation and the session only keeps offsets into them.
//!
//! A session serves one image at a time; [`MhSession::reset`] rearms it for
//! the next. Scanline operations live in separate `impl` blocks next to the
//! decode and encode loops.

use log::debug;

use crate::bits::{BitReader, BitWriter, FillOrder};
use crate::color::Color;
use crate::error::{MhError, MhResult};

/// Increment by which the changing-element capacity grows
pub(crate) const GROW_RATE: usize = 2048;

/// Direction of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Scanlines in, compressed stream out
    Encode,
    /// Compressed stream in, scanlines out
    Decode,
}

/// One edge of an ink span, in 1-based pixel coordinates
///
/// Spans are stored as pairs: a left edge carrying [`Color::Black`] and a
/// right edge carrying [`Color::White`]. A finished line is terminated by
/// two sentinel elements at `width + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangingElement {
    /// 1-based pixel position of the edge
    pub pos: u32,
    /// Color to the right of the edge
    pub color: Color,
}

/// Scanline codec state for one image
#[derive(Debug, Clone)]
pub struct MhSession {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) mode: Mode,
    pub(crate) invert: bool,
    pub(crate) reader: BitReader,
    pub(crate) writer: BitWriter,
    pub(crate) elements: Vec<ChangingElement>,
    pub(crate) max_pairs: usize,
    pub(crate) pairs: usize,
    pub(crate) packed_pos: usize,
    pub(crate) line_stride: usize,
    pub(crate) run_pos: usize,
    pub(crate) last_error: Option<MhError>,
}

impl MhSession {
    /// Creates a new session for one image.
    ///
    /// `invert` flips the packed-pixel sense: ink is stored as zero bits and
    /// run-length rows carry an extra zero-length run at each end to keep
    /// the white/black alternation.
    pub fn new(width: u32, height: u32, mode: Mode, fill_order: FillOrder, invert: bool) -> Self {
        MhSession {
            width,
            height,
            mode,
            invert,
            reader: BitReader::new(fill_order),
            writer: BitWriter::new(fill_order),
            elements: Vec::with_capacity(GROW_RATE * 2 + 4),
            max_pairs: GROW_RATE,
            pairs: 0,
            packed_pos: 0,
            line_stride: 0,
            run_pos: 0,
            last_error: None,
        }
    }

    /// Pixel width of every scanline
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Total number of scanlines in the image
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Direction this session was created for
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the packed-pixel sense is inverted
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Error recorded by the most recent scanline operation, if any
    pub fn last_error(&self) -> Option<MhError> {
        self.last_error
    }

    /// Changing elements of the most recently processed line
    pub fn changing_elements(&self) -> &[ChangingElement] {
        &self.elements
    }

    /// Number of ink-span pairs found in the most recently processed line
    pub fn pair_count(&self) -> usize {
        self.pairs
    }

    /// Compressed bytes consumed (decode) or produced (encode) in the
    /// current chunk
    pub fn compressed_bytes(&self) -> usize {
        match self.mode {
            Mode::Encode => self.writer.pos(),
            Mode::Decode => self.reader.pos(),
        }
    }

    /// Run-length slots consumed or produced since the last row rewind
    pub fn run_slots(&self) -> usize {
        self.run_pos
    }

    /// Like [`MhSession::run_slots`], but in bytes
    pub fn run_bytes(&self) -> usize {
        self.run_pos << 1
    }

    /// Packed-pixel bytes consumed or produced in the current chunk
    pub fn packed_bytes(&self) -> usize {
        self.packed_pos
    }

    /// Start a chunk of scanlines in the packed-pixel representation.
    ///
    /// Rewinds the compressed cursor and the packed line offset to the start
    /// of the buffers the next operations will be handed. The bit state is
    /// carried over, so a stream can continue across chunk boundaries.
    pub fn begin_packed_chunk(&mut self, line_stride: usize) {
        self.reader.rewind();
        self.writer.rewind();
        self.packed_pos = 0;
        self.line_stride = line_stride;
        debug!("packed chunk: line stride {} bytes", line_stride);
    }

    /// Prefill a packed-pixel decode target so line decoding only has to
    /// touch ink pixels
    pub fn prefill_packed(&self, packed: &mut [u8]) {
        let blank = if self.invert { 0xFF } else { 0x00 };
        packed.fill(blank);
    }

    /// Start a chunk of scanlines in the run-length representation
    pub fn begin_run_chunk(&mut self) {
        self.reader.rewind();
        self.writer.rewind();
        self.run_pos = 0;
    }

    /// Rewind the run-length cursor to slot 0 of the next row buffer
    pub fn begin_run_row(&mut self) {
        self.run_pos = 0;
    }

    /// Finish the compressed stream after the last scanline.
    ///
    /// On encode, if no scanline operation failed, flushes a pending partial
    /// byte and pads the stream with a zero byte to an even length. Decoding
    /// needs no finishing work.
    pub fn post(&mut self, out: &mut [u8]) -> MhResult<()> {
        if self.mode == Mode::Encode && self.last_error.is_none() {
            self.finish_compressed(out).map_err(|e| {
                self.last_error = Some(e);
                e
            })
        } else {
            Ok(())
        }
    }

    fn finish_compressed(&mut self, out: &mut [u8]) -> MhResult<()> {
        self.writer.flush(out)?;
        if self.writer.pos() & 1 == 1 {
            self.writer.emit_byte(out, 0)?;
        }
        debug!("compressed stream closed at {} bytes", self.writer.pos());
        Ok(())
    }

    /// Release the growable element storage and drop all buffer offsets.
    ///
    /// The caller-supplied buffers are never owned by the session, so there
    /// is nothing else to release.
    pub fn reset(&mut self) {
        self.elements = Vec::new();
        self.max_pairs = GROW_RATE;
        self.pairs = 0;
        self.packed_pos = 0;
        self.line_stride = 0;
        self.run_pos = 0;
        self.reader.rewind();
        self.writer.rewind();
    }

    /// Record one ink-span pair for the current line
    pub(crate) fn push_pair(&mut self, left: u32, right: u32) {
        self.elements.push(ChangingElement {
            pos: left,
            color: Color::Black,
        });
        self.elements.push(ChangingElement {
            pos: right,
            color: Color::White,
        });
        self.pairs += 1;
        if self.pairs >= self.max_pairs {
            self.grow_elements();
        }
    }

    /// Terminate the current line's element list
    pub(crate) fn push_sentinels(&mut self) {
        let stop = self.width + 1;
        self.elements.push(ChangingElement {
            pos: stop,
            color: Color::White,
        });
        self.elements.push(ChangingElement {
            pos: stop,
            color: Color::Black,
        });
    }

    fn grow_elements(&mut self) {
        self.max_pairs += GROW_RATE;
        self.elements.reserve(GROW_RATE * 2);
        debug!("changing-element capacity grown to {} pairs", self.max_pairs);
    }
}
