/*!
 * Defines the layout in bits of a signal so that it can be placed into the bytes of a LIN frame
 */

use crate::signal::Signal;

/// Payload bytes in one frame.
pub const FRAME_BYTES: usize = 8;

/// One contiguous span of bits within a single byte of the frame.
///
/// Describes a mapping: "the `num_bits` consecutive bits starting at
/// `bit_offset` in `data[byte_index]` hold the bits of the raw signal value
/// starting at `value_shift`."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSpan {
    pub byte_index: usize,
    /// Lowest bit position within the byte (0..=7).
    pub bit_offset: u8,
    /// How many consecutive bits in this span (1..=8).
    pub num_bits: u8,
    /// Where these bits sit in the raw value, LSB-relative.
    pub value_shift: u8,
}

impl BitSpan {
    /// Highest bit position within the byte covered by this span.
    pub fn last_bit(&self) -> u8 {
        self.bit_offset + self.num_bits - 1
    }

    fn mask(&self) -> u8 {
        ((1u16 << self.num_bits) - 1) as u8
    }

    /// The bits of `raw` that belong to this span, right-aligned.
    ///
    /// This is the one bit-range extraction used both to build the default
    /// image and to label each segment with its own slice of the default.
    pub fn bits_of(&self, raw: u64) -> u8 {
        ((raw >> self.value_shift) as u8) & self.mask()
    }

    /// This span as a mask over the whole 64-bit frame.
    pub fn frame_mask(&self) -> u64 {
        u64::from(self.mask()) << (self.byte_index * 8 + self.bit_offset as usize)
    }
}

/// Precomputed mapping from a signal's bit range to frame data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalLayout {
    /// Each segment describes one contiguous run of bits within a single byte,
    /// in ascending byte order. A signal starting mid-byte produces one partial
    /// leading segment, then full or partial bytes.
    pub segments: Vec<BitSpan>,
    /// Bits of the signal that fall past the last byte of the frame.
    pub truncated_bits: u32,
}

impl SignalLayout {
    /// Build a layout from a validated signal.
    ///
    /// Signals are LSB-first: `start_bit` is the LSB position. Walk upward
    /// within each byte, then move to the next byte at bit 0. Each chunk ends
    /// at the signal's end bit or at the end of its byte, whichever comes first.
    pub fn from_signal(signal: &Signal) -> Self {
        let mut segments = Vec::new();
        let mut byte_index = (signal.start_bit / 8) as usize;
        let mut bit_index = (signal.start_bit % 8) as u8;
        let mut remaining = signal.length;
        let mut value_shift: u32 = 0;

        while remaining > 0 && byte_index < FRAME_BYTES {
            let num_bits = std::cmp::min(8 - u32::from(bit_index), remaining) as u8;
            segments.push(BitSpan {
                byte_index,
                bit_offset: bit_index,
                num_bits,
                value_shift: value_shift as u8,
            });
            value_shift += u32::from(num_bits);
            remaining -= u32::from(num_bits);
            byte_index += 1;
            bit_index = 0;
        }

        Self {
            segments,
            truncated_bits: remaining,
        }
    }

    /// Every frame bit this signal occupies.
    pub fn frame_mask(&self) -> u64 {
        self.segments
            .iter()
            .fold(0, |mask, span| mask | span.frame_mask())
    }

    /// Pack a raw unsigned value into the frame bytes.
    ///
    /// Clears the target bits before writing, so packing a 0 bit over an idle
    /// (all ones) byte clears it. Bits of `raw` above the signal size are never
    /// written.
    pub fn pack(&self, data: &mut [u8; FRAME_BYTES], raw: u64) {
        for span in &self.segments {
            let mask = span.mask();
            data[span.byte_index] &= !(mask << span.bit_offset);
            data[span.byte_index] |= span.bits_of(raw) << span.bit_offset;
        }
    }
}
