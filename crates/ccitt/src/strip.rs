//! # Strip processing
//!
//! An image moves through the codec as one or more strips of whole
//! scanlines, in order, each strip with its own buffers. The compressed
//! stream continues from strip to strip; every call reports how many
//! compressed bytes it produced or consumed so the caller can advance
//! its own cursor between strips.
//!
//! When the strip that reaches the image height completes, the stream is
//! closed out (the encoder pads it to an even byte count) and the coder
//! rearms itself for a new image.

use crate::bits::FillOrder;
use crate::error::{BufferKind, MhError, MhResult};
use crate::runs;
use crate::session::{MhSession, Mode};

/// Bytes per packed scanline for a given width
pub fn packed_line_stride(width: u32) -> usize {
    (width as usize + 7) / 8
}

/// Drives an [`MhSession`] over an image strip by strip.
///
/// The packed-pixel and run-length entry points can be mixed freely
/// between strips of the same image; both sides of the codec speak the
/// same stream.
#[derive(Debug)]
pub struct StripCoder {
    session: MhSession,
    lines_done: u32,
}

impl StripCoder {
    /// A coder for one image of `height` lines of `width` pixels.
    pub fn new(width: u32, height: u32, mode: Mode, fill_order: FillOrder, invert: bool) -> Self {
        StripCoder {
            session: MhSession::new(width, height, mode, fill_order, invert),
            lines_done: 0,
        }
    }

    /// The session driven by this coder
    pub fn session(&self) -> &MhSession {
        &self.session
    }

    /// Lines processed so far for the current image
    pub fn lines_done(&self) -> u32 {
        self.lines_done
    }

    /// Compress `rows` packed scanlines into `out`.
    ///
    /// Returns the compressed bytes written for this strip. A failed line
    /// stops the strip, leaves the error on the session and does not count
    /// the strip toward the image.
    pub fn encode_strip(&mut self, packed: &[u8], rows: u32, out: &mut [u8]) -> MhResult<usize> {
        debug_assert!(self.session.mode == Mode::Encode);
        let stride = packed_line_stride(self.session.width);
        let chunk = packed
            .get(..stride * rows as usize)
            .ok_or(MhError::BufferTooSmall(BufferKind::PackedBits))?;
        self.session.begin_packed_chunk(stride);
        for _ in 0..rows {
            self.session.encode_line_from_packed_bits(chunk, out)?;
        }
        self.finish_encode(rows, out)
    }

    /// Compress one run-length row per scanline into `out`.
    pub fn encode_strip_from_runs(&mut self, rows: &[Vec<u16>], out: &mut [u8]) -> MhResult<usize> {
        debug_assert!(self.session.mode == Mode::Encode);
        self.session.begin_run_chunk();
        for row in rows {
            self.session.begin_run_row();
            self.session.encode_line_from_runs(row, out)?;
        }
        self.finish_encode(rows.len() as u32, out)
    }

    /// Decompress `rows` scanlines into the packed buffer.
    ///
    /// The buffer is prefilled to the background color first, so only ink
    /// spans are written during decoding. Returns the compressed bytes
    /// consumed; on the last strip the closing pad byte of the stream is
    /// not part of any line and stays unconsumed.
    pub fn decode_strip(&mut self, src: &[u8], rows: u32, packed: &mut [u8]) -> MhResult<usize> {
        debug_assert!(self.session.mode == Mode::Decode);
        let stride = packed_line_stride(self.session.width);
        let chunk = packed
            .get_mut(..stride * rows as usize)
            .ok_or(MhError::BufferTooSmall(BufferKind::PackedBits))?;
        self.session.begin_packed_chunk(stride);
        self.session.prefill_packed(chunk);
        for _ in 0..rows {
            self.session.decode_line_to_packed_bits(src, chunk)?;
        }
        Ok(self.finish_decode(rows))
    }

    /// Decompress one scanline into each of the given rows.
    ///
    /// Rows are resized to the worst case up front and trimmed to the
    /// slots actually produced, so every returned row sums to the width
    /// and holds an odd number of slots.
    pub fn decode_strip_to_runs(&mut self, src: &[u8], rows: &mut [Vec<u16>]) -> MhResult<usize> {
        debug_assert!(self.session.mode == Mode::Decode);
        self.session.begin_run_chunk();
        let worst_case = runs::max_line_slots(self.session.width);
        for row in rows.iter_mut() {
            row.clear();
            row.resize(worst_case, 0);
            self.session.begin_run_row();
            let decoded = self.session.decode_line_to_runs(src, row);
            debug_assert!(self.session.run_slots() % 2 == 1);
            row.truncate(self.session.run_slots());
            decoded?;
        }
        Ok(self.finish_decode(rows.len() as u32))
    }

    fn finish_encode(&mut self, rows: u32, out: &mut [u8]) -> MhResult<usize> {
        self.lines_done += rows;
        if self.lines_done >= self.session.height {
            self.session.post(out)?;
            let written = self.session.compressed_bytes();
            self.session.reset();
            self.lines_done = 0;
            Ok(written)
        } else {
            Ok(self.session.compressed_bytes())
        }
    }

    fn finish_decode(&mut self, rows: u32) -> usize {
        self.lines_done += rows;
        let consumed = self.session.compressed_bytes();
        if self.lines_done >= self.session.height {
            self.session.reset();
            self.lines_done = 0;
        }
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // four distinct 16 pixel lines: blank, solid, one centered span,
    // one byte-straddling span
    const LINES: [[u8; 2]; 4] = [
        [0x00, 0x00],
        [0xFF, 0xFF],
        [0b00111100, 0x00],
        [0x0F, 0xF0],
    ];

    fn image() -> Vec<u8> {
        LINES.iter().flatten().copied().collect()
    }

    fn encoder(height: u32) -> StripCoder {
        StripCoder::new(16, height, Mode::Encode, FillOrder::MsbToLsb, false)
    }

    fn decoder(height: u32) -> StripCoder {
        StripCoder::new(16, height, Mode::Decode, FillOrder::MsbToLsb, false)
    }

    #[test]
    fn test_single_strip_round_trip() {
        let image = image();
        let mut out = [0u8; 32];
        let written = encoder(4).encode_strip(&image, 4, &mut out).unwrap();
        assert_eq!(written % 2, 0);

        let mut packed = vec![0u8; 8];
        let consumed = decoder(4)
            .decode_strip(&out[..written], 4, &mut packed)
            .unwrap();
        assert!(consumed <= written);
        assert_eq!(packed, image);
    }

    #[test]
    fn test_strips_concatenate_to_one_stream() {
        let image = image();
        let mut whole = [0u8; 32];
        let whole_size = encoder(4).encode_strip(&image, 4, &mut whole).unwrap();

        let mut coder = encoder(4);
        let mut first = [0u8; 32];
        let first_size = coder.encode_strip(&image[..4], 2, &mut first).unwrap();
        assert_eq!(coder.lines_done(), 2);
        let mut second = [0u8; 32];
        let second_size = coder.encode_strip(&image[4..], 2, &mut second).unwrap();
        assert_eq!(coder.lines_done(), 0);

        let mut stream = first[..first_size].to_vec();
        stream.extend_from_slice(&second[..second_size]);
        assert_eq!(stream, whole[..whole_size]);
    }

    #[test]
    fn test_decode_in_two_strips() {
        let image = image();
        let mut out = [0u8; 32];
        let written = encoder(4).encode_strip(&image, 4, &mut out).unwrap();
        let stream = &out[..written];

        let mut coder = decoder(4);
        let mut first = vec![0u8; 4];
        let consumed = coder.decode_strip(stream, 2, &mut first).unwrap();
        let mut second = vec![0u8; 4];
        coder.decode_strip(&stream[consumed..], 2, &mut second).unwrap();

        first.extend_from_slice(&second);
        assert_eq!(first, image);
    }

    #[test]
    fn test_run_rows_round_trip() {
        let rows = vec![vec![40u16, 60, 0], vec![100u16]];
        let mut out = [0u8; 32];
        let written = StripCoder::new(100, 2, Mode::Encode, FillOrder::MsbToLsb, false)
            .encode_strip_from_runs(&rows, &mut out)
            .unwrap();
        assert_eq!(written % 2, 0);

        let mut decoded = vec![Vec::new(), Vec::new()];
        let mut coder = StripCoder::new(100, 2, Mode::Decode, FillOrder::MsbToLsb, false);
        let consumed = coder
            .decode_strip_to_runs(&out[..written], &mut decoded)
            .unwrap();
        assert!(consumed <= written);
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_packed_stream_reads_back_as_runs() {
        let image = image();
        let mut out = [0u8; 32];
        let written = encoder(4).encode_strip(&image, 4, &mut out).unwrap();

        let mut rows = vec![Vec::new(); 4];
        StripCoder::new(16, 4, Mode::Decode, FillOrder::MsbToLsb, false)
            .decode_strip_to_runs(&out[..written], &mut rows)
            .unwrap();
        assert_eq!(rows[0], [16]);
        assert_eq!(rows[1], [0, 16, 0]);
        assert_eq!(rows[2], [2, 4, 10]);
        assert_eq!(rows[3], [4, 8, 4]);
        for row in &rows {
            assert_eq!(row.iter().map(|&s| u32::from(s)).sum::<u32>(), 16);
            assert_eq!(row.len() % 2, 1);
        }
    }

    #[test]
    fn test_inverted_image_round_trip() {
        let image: Vec<u8> = LINES.iter().flatten().map(|&b| !b).collect();
        let mut out = [0u8; 32];
        let written = StripCoder::new(16, 4, Mode::Encode, FillOrder::MsbToLsb, true)
            .encode_strip(&image, 4, &mut out)
            .unwrap();

        let mut packed = vec![0u8; 8];
        StripCoder::new(16, 4, Mode::Decode, FillOrder::MsbToLsb, true)
            .decode_strip(&out[..written], 4, &mut packed)
            .unwrap();
        assert_eq!(packed, image);
    }

    #[test]
    fn test_reversed_fill_order_round_trip() {
        let image = image();
        let mut out = [0u8; 32];
        let written = StripCoder::new(16, 4, Mode::Encode, FillOrder::LsbToMsb, false)
            .encode_strip(&image, 4, &mut out)
            .unwrap();

        let mut forward = [0u8; 32];
        let forward_size = encoder(4).encode_strip(&image, 4, &mut forward).unwrap();
        assert_eq!(written, forward_size);
        assert_ne!(out[..written], forward[..forward_size]);

        let mut packed = vec![0u8; 8];
        StripCoder::new(16, 4, Mode::Decode, FillOrder::LsbToMsb, false)
            .decode_strip(&out[..written], 4, &mut packed)
            .unwrap();
        assert_eq!(packed, image);
    }

    #[test]
    fn test_inverted_reversed_fill_order_round_trip() {
        let image: Vec<u8> = LINES.iter().flatten().map(|&b| !b).collect();
        let mut out = [0u8; 32];
        let written = StripCoder::new(16, 4, Mode::Encode, FillOrder::LsbToMsb, true)
            .encode_strip(&image, 4, &mut out)
            .unwrap();

        let mut packed = vec![0u8; 8];
        StripCoder::new(16, 4, Mode::Decode, FillOrder::LsbToMsb, true)
            .decode_strip(&out[..written], 4, &mut packed)
            .unwrap();
        assert_eq!(packed, image);
    }

    #[test]
    fn test_coder_rearms_after_image() {
        let image = image();
        let mut coder = encoder(4);
        let mut first = [0u8; 32];
        let first_size = coder.encode_strip(&image, 4, &mut first).unwrap();
        let mut second = [0u8; 32];
        let second_size = coder.encode_strip(&image, 4, &mut second).unwrap();
        assert_eq!(first[..first_size], second[..second_size]);
    }

    #[test]
    fn test_bad_stream_reports_error() {
        let mut coder = decoder(1);
        let mut packed = vec![0u8; 2];
        assert_eq!(
            coder.decode_strip(&[0x00, 0x00, 0x00], 1, &mut packed),
            Err(MhError::InvalidCode)
        );
        assert_eq!(coder.session().last_error(), Some(MhError::InvalidCode));
        assert_eq!(coder.lines_done(), 0);
    }

    #[test]
    fn test_undersized_strip_buffer() {
        let mut coder = encoder(4);
        let mut out = [0u8; 32];
        assert_eq!(
            coder.encode_strip(&[0u8; 4], 4, &mut out),
            Err(MhError::BufferTooSmall(BufferKind::PackedBits))
        );
    }
}
