//! # CRC8 (DVB-S2)
//!
//! **Polynomial**: 0xD5, MSB-first, seed 0x00.
//!
//! Covers the frame type and payload. The sync and length bytes are not
//! part of the checksum.

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Lookup table, one entry per input byte
const CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = shift_byte(i as u8);
        i += 1;
    }
    table
}

/// Eight MSB-first shift/xor steps.
const fn shift_byte(mut crc: u8) -> u8 {
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC8_POLY
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

/// Incremental CRC8 over several slices.
///
/// ```
/// use rc_link::crsf::crc::{crc8_dvb_s2, Crc8};
///
/// let mut crc = Crc8::new();
/// crc.update(&[0x16]);
/// crc.update(&[0x00; 22]);
///
/// let mut whole = vec![0x16];
/// whole.extend_from_slice(&[0x00; 22]);
/// assert_eq!(crc.finish(), crc8_dvb_s2(&whole));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc8 {
    value: u8,
}

impl Crc8 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value = CRC8_TABLE[(self.value ^ byte) as usize];
        }
    }

    #[must_use]
    pub fn finish(self) -> u8 {
        self.value
    }
}

/// CRC8-DVB-S2 of a byte slice.
#[must_use]
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    let mut crc = Crc8::new();
    crc.update(data);
    crc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-by-bit reference, independent of the table.
    fn crc8_reference(data: &[u8]) -> u8 {
        let mut crc: u8 = 0;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                let high = crc & 0x80 != 0;
                crc <<= 1;
                if high {
                    crc ^= 0xD5;
                }
            }
        }
        crc
    }

    #[test]
    fn test_empty_is_seed() {
        assert_eq!(crc8_dvb_s2(&[]), 0x00);
    }

    #[test]
    fn test_table_first_entries() {
        assert_eq!(CRC8_TABLE[0], 0x00);
        assert_eq!(CRC8_TABLE[1], 0xD5);
        assert_eq!(CRC8_TABLE[0x80], crc8_reference(&[0x80]));
    }

    #[test]
    fn test_matches_reference() {
        let vectors: [&[u8]; 5] = [
            &[0x16],
            &[0x01, 0x02, 0x03],
            &[0xFF; 10],
            &[0x16, 0xE0, 0x03, 0x1F, 0xF8],
            &[0x00; 23],
        ];
        for data in vectors {
            assert_eq!(crc8_dvb_s2(data), crc8_reference(data), "{:02X?}", data);
        }
    }

    #[test]
    fn test_all_centered_rc_frame_vector() {
        // Type byte + payload for 16 channels at 992
        let mut data = vec![0x16];
        data.extend_from_slice(&[
            0xE0, 0x03, 0x1F, 0xF8, 0xC0, 0x07, 0x3E, 0xF0, 0x81, 0x0F, 0x7C,
            0xE0, 0x03, 0x1F, 0xF8, 0xC0, 0x07, 0x3E, 0xF0, 0x81, 0x0F, 0x7C,
        ]);
        assert_eq!(crc8_dvb_s2(&data), 0xAD);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut crc = Crc8::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc.finish(), crc8_dvb_s2(&data));
    }
}
