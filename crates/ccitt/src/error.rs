//! Error type for encoding and decoding

use thiserror::Error;

/// The buffer a size check failed for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferKind {
    /// The compressed bitstream buffer
    Compressed,
    /// The packed 1-bit-per-pixel raster buffer
    PackedBits,
    /// The run-length (`u16` slots) buffer
    RunLengths,
}

impl BufferKind {
    fn name(&self) -> &'static str {
        match self {
            BufferKind::Compressed => "compressed",
            BufferKind::PackedBits => "packed-bit",
            BufferKind::RunLengths => "run-length",
        }
    }
}

/// An error while encoding or decoding a Modified-Huffman stream
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MhError {
    /// An end-of-line code appeared where a run code was expected
    #[error("end-of-line code inside a scanline")]
    ReadError,
    /// The bit window matched no code within the maximum code length
    #[error("bit pattern matches no Huffman code")]
    InvalidCode,
    /// The compressed buffer ran out while a code was still being assembled
    #[error("compressed input exhausted mid-codeword")]
    NoMoreInputData,
    /// A caller-supplied buffer was too small for the operation
    #[error("{} buffer too small", .0.name())]
    BufferTooSmall(BufferKind),
}

/// Type alias for convenience
pub type MhResult<T> = Result<T, MhError>;
