//! CRC-16 (ARC / CCITT-reflected, polynomial `0xA001`) used to verify a decompressed
//! member's content against the `file_crc` field in its header.
use core::fmt;

/// A running CRC-16 accumulator.
///
/// Matches the polynomial and bit order `lharc`/`lha.exe` have always used for the
/// body checksum: reflected input and output, no final XOR, initial value `0`.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    sum: u16
}

impl Crc16 {
    /// Resets the accumulator back to its initial state.
    #[inline]
    pub fn reset(&mut self) {
        self.sum = 0;
    }

    /// Feeds `buf` into the running checksum.
    pub fn digest(&mut self, buf: &[u8]) {
        let mut sum = self.sum;
        for &byte in buf {
            sum ^= byte as u16;
            for _ in 0..8 {
                sum = if sum & 1 != 0 { (sum >> 1) ^ 0xA001 } else { sum >> 1 };
            }
        }
        self.sum = sum;
    }

    /// Returns the current checksum value.
    #[inline]
    pub fn sum16(&self) -> u16 {
        self.sum
    }
}

impl fmt::Debug for Crc16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc16").field("sum", &self.sum).finish()
    }
}
