#![warn(missing_docs)]
//! CCITT Modified Huffman (T.4 one-dimensional) run-length codec
//!
//! Bi-level scanlines go in and out either as packed bits, eight pixels per
//! byte with the leftmost pixel in the most significant bit, or as rows of
//! `u16` run lengths alternating white and black. Every scanline is coded
//! independently, ends on a byte boundary, and the finished stream is padded
//! to an even byte count. See [`StripCoder`] for whole images and
//! [`MhSession`] for line-by-line control.

pub mod bits;
mod codes;
mod color;
mod decode;
mod encode;
mod error;
mod runs;
mod session;
mod spans;
mod strip;

pub use bits::FillOrder;
pub use color::Color;
pub use error::{BufferKind, MhError, MhResult};
pub use runs::max_line_slots;
pub use session::{ChangingElement, MhSession, Mode};
pub use strip::{packed_line_stride, StripCoder};
