//! # Run-length scanline helpers
//!
//! A run-length row alternates white and black pixel counts, starting with a
//! white count. A run that does not fit one `u16` slot is stored as repeated
//! `32767, 0` pairs followed by the remainder; the zero keeps the colors
//! alternating, so zero counts are meaningful and a row always ends up with
//! an odd number of slots.

use crate::error::{BufferKind, MhError, MhResult};

/// Largest pixel count a single slot may hold
pub(crate) const SLOT_MAX: u32 = 32767;

/// Number of slots a single row can need at worst, for sizing row buffers
pub fn max_line_slots(width: u32) -> usize {
    2 * width as usize + 2
}

/// Append one run, splitting counts above [`SLOT_MAX`] into continuation
/// pairs. The final slot is written even when the count is zero.
pub(crate) fn push_run(slots: &mut [u16], at: &mut usize, mut count: u32) -> MhResult<()> {
    while count > SLOT_MAX {
        put_slot(slots, at, SLOT_MAX as u16)?;
        put_slot(slots, at, 0)?;
        count -= SLOT_MAX;
    }
    put_slot(slots, at, count as u16)
}

fn put_slot(slots: &mut [u16], at: &mut usize, value: u16) -> MhResult<()> {
    let slot = slots
        .get_mut(*at)
        .ok_or(MhError::BufferTooSmall(BufferKind::RunLengths))?;
    *slot = value;
    *at += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_run() {
        let mut slots = [0xFFFFu16; 4];
        let mut at = 0;
        push_run(&mut slots, &mut at, 100).unwrap();
        push_run(&mut slots, &mut at, 0).unwrap();
        assert_eq!(at, 2);
        assert_eq!(&slots[..2], &[100, 0]);
    }

    #[test]
    fn test_push_run_splits_large_counts() {
        let mut slots = [0u16; 8];
        let mut at = 0;
        push_run(&mut slots, &mut at, 70000).unwrap();
        assert_eq!(at, 5);
        assert_eq!(&slots[..5], &[32767, 0, 32767, 0, 4466]);
    }

    #[test]
    fn test_push_run_split_boundary() {
        let mut slots = [0u16; 4];
        let mut at = 0;
        push_run(&mut slots, &mut at, 32767).unwrap();
        assert_eq!(&slots[..at], &[32767]);

        let mut at = 0;
        push_run(&mut slots, &mut at, 32768).unwrap();
        assert_eq!(&slots[..at], &[32767, 0, 1]);
    }

    #[test]
    fn test_push_run_overflow() {
        let mut slots = [0u16; 2];
        let mut at = 0;
        assert_eq!(
            push_run(&mut slots, &mut at, 70000),
            Err(MhError::BufferTooSmall(BufferKind::RunLengths))
        );
    }

    #[test]
    fn test_max_line_slots() {
        assert_eq!(max_line_slots(100), 202);
        // a 70000 pixel all-white row needs 5 slots, well under the bound
        assert!(5 <= max_line_slots(70000));
    }
}
