//! ARM Thumb branch filter
//!
//! Thumb `BL` instructions are a pair of halfwords carrying a 22-bit
//! PC-relative offset. The build tool rewrites those offsets into absolute
//! targets before compressing, so repeated calls to the same function become
//! identical byte sequences. [`decode`] reverses that after inflating.
//!
//! The buffer is walked in 2-byte steps. A window matches when the first
//! halfword's top five bits are `11110` and the second's are `11111`, read
//! little-endian. A converted pair is skipped as a whole so its second
//! halfword is never taken as the start of another window.

use tracing::trace;

/// Instruction pair length in bytes
const INSN_LEN: usize = 4;

/// High halfword prefix (`11110`, offset bits 21..11)
const BL_HIGH: u8 = 0xF0;

/// Low halfword prefix (`11111`, offset bits 10..0)
const BL_LOW: u8 = 0xF8;

/// Mask selecting the prefix bits of a halfword's upper byte
const PREFIX_MASK: u8 = 0xF8;

/// Conversion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Relative offsets to absolute targets (build time)
    Encode,
    /// Absolute targets back to relative offsets (load time)
    Decode,
}

/// Restore relative branch offsets in place
///
/// `base` is the position of `buf[0]` in the original image and must be
/// halfword aligned. Returns the index the scan stopped at.
pub fn decode(buf: &mut [u8], base: u32) -> usize {
    convert(buf, base, Direction::Decode)
}

/// Rewrite branch offsets as absolute targets in place
///
/// Exact inverse of [`decode`] for the same `base`.
pub fn encode(buf: &mut [u8], base: u32) -> usize {
    convert(buf, base, Direction::Encode)
}

/// Run the filter over `buf` in the given direction
pub fn convert(buf: &mut [u8], base: u32, direction: Direction) -> usize {
    let mut i = 0;
    let mut converted = 0usize;

    while i + INSN_LEN <= buf.len() {
        if !is_branch_pair(&buf[i..i + INSN_LEN]) {
            i += 2;
            continue;
        }

        let src = (u32::from(buf[i + 1] & 0x07) << 19)
            | (u32::from(buf[i]) << 11)
            | (u32::from(buf[i + 3] & 0x07) << 8)
            | u32::from(buf[i + 2]);
        let src = src << 1;

        // Offsets are relative to the instruction address plus four.
        let pc = base.wrapping_add(i as u32).wrapping_add(INSN_LEN as u32);
        let dest = match direction {
            Direction::Encode => pc.wrapping_add(src),
            Direction::Decode => src.wrapping_sub(pc),
        };
        let dest = dest >> 1;

        buf[i + 1] = BL_HIGH | ((dest >> 19) & 0x07) as u8;
        buf[i] = (dest >> 11) as u8;
        buf[i + 3] = BL_LOW | ((dest >> 8) & 0x07) as u8;
        buf[i + 2] = dest as u8;

        converted += 1;
        i += INSN_LEN;
    }

    trace!(?direction, len = buf.len(), converted, "branch filter pass");
    i
}

fn is_branch_pair(window: &[u8]) -> bool {
    window[1] & PREFIX_MASK == BL_HIGH && window[3] & PREFIX_MASK == BL_LOW
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Pack a 22-bit halfword offset into a little-endian BL pair
    fn bl(offset: u32) -> [u8; 4] {
        [
            (offset >> 11) as u8,
            BL_HIGH | ((offset >> 19) & 0x07) as u8,
            offset as u8,
            BL_LOW | ((offset >> 8) & 0x07) as u8,
        ]
    }

    #[test]
    fn test_decode_subtracts_pc() {
        // Absolute target 0x1000 seen at position 0x100: relative offset is
        // (0x1000 - 0x104) / 2 halfwords.
        let mut buf = bl(0x1000 >> 1).to_vec();
        decode(&mut buf, 0x100);
        assert_eq!(buf, bl((0x1000 - 0x104) >> 1).to_vec());
    }

    #[test]
    fn test_encode_adds_pc() {
        let mut buf = vec![0x00, 0xBF];
        buf.extend_from_slice(&bl(0x10));
        encode(&mut buf, 0);
        // Pair starts at 2, so pc = 6 and target = 6 + 0x20.
        assert_eq!(&buf[2..], &bl((6 + 0x20) >> 1));
        assert_eq!(&buf[..2], &[0x00, 0xBF]);
    }

    #[test]
    fn test_negative_offset_wraps_within_22_bits() {
        // Target behind the instruction
        let mut buf = bl(0).to_vec();
        decode(&mut buf, 0x40);
        let expected = (0u32.wrapping_sub(0x44) >> 1) & 0x3F_FFFF;
        assert_eq!(buf, bl(expected).to_vec());
    }

    #[test]
    fn test_non_matching_bytes_untouched() {
        let original: Vec<u8> = vec![0x00, 0x20, 0x70, 0x47, 0x08, 0xB5, 0x00, 0xF0];
        let mut buf = original.clone();
        let stop = decode(&mut buf, 0);
        assert_eq!(buf, original);
        assert_eq!(stop, 6);
    }

    #[test]
    fn test_trailing_partial_window_untouched() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x00, 0xF0, 0x00, 0xF8]);
        buf.extend_from_slice(&[0x00, 0xF8]);
        let mut expected = buf.clone();
        decode(&mut buf, 0);
        expected[..4].copy_from_slice(&bl((0u32.wrapping_sub(4) >> 1) & 0x3F_FFFF));
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_short_buffers() {
        for len in 0..4 {
            let mut buf = vec![0xF0; len];
            assert_eq!(decode(&mut buf, 0), 0);
            assert_eq!(buf, vec![0xF0; len]);
        }
    }

    proptest! {
        #[test]
        fn encode_then_decode_is_identity(
            data in prop::collection::vec(any::<u8>(), 0..512),
            base in any::<u32>().prop_map(|b| b & !1)
        ) {
            let mut buf = data.clone();
            encode(&mut buf, base);
            decode(&mut buf, base);
            prop_assert_eq!(buf, data);
        }

        #[test]
        fn decode_then_encode_is_identity(
            data in prop::collection::vec(any::<u8>(), 0..512),
            base in any::<u32>().prop_map(|b| b & !1)
        ) {
            let mut buf = data.clone();
            decode(&mut buf, base);
            encode(&mut buf, base);
            prop_assert_eq!(buf, data);
        }

        #[test]
        fn planted_branch_round_trips(
            prefix_halfwords in 0usize..64,
            offset in 0u32..0x40_0000,
            base in any::<u32>().prop_map(|b| b & !1)
        ) {
            let mut data = vec![0u8; prefix_halfwords * 2];
            data.extend_from_slice(&bl(offset));
            data.extend_from_slice(&[0x70, 0x47]);

            let mut buf = data.clone();
            encode(&mut buf, base);
            decode(&mut buf, base);
            prop_assert_eq!(buf, data);
        }
    }
}
