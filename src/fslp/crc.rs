//! # CRC-16 Implementation
//!
//! Frame checksum for the FSLP link: the XMODEM polynomial table seeded with
//! the protocol-specific initial value `0x1D0F` (not the conventional
//! all-zero XMODEM seed).
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x1D0F

/// CRC-16 polynomial (XMODEM)
const CRC16_POLY: u16 = 0x1021;

/// Protocol-specific CRC seed
pub const CRC16_SEED: u16 = 0x1D0F;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the frame CRC over a run of cells using the lookup table
///
/// Only the low 8 bits of each cell are fed to the CRC; the cells covered
/// by the checksum are byte-range values by construction.
///
/// # Arguments
///
/// * `cells` - Frame cells from index 2 through the end of the value region
///
/// # Returns
///
/// * `u16` - Calculated CRC16 checksum
pub fn crc16_fslp(cells: &[u16]) -> u16 {
    let mut crc = CRC16_SEED;

    for &cell in cells {
        let byte = (cell & 0xFF) as u8;
        crc = ((crc << 8) & 0xFF00) ^ CRC16_TABLE[(((crc >> 8) & 0xFF) as u8 ^ byte) as usize];
    }

    crc
}

/// Serialize a CRC into its two frame cells, high byte first
pub fn crc_cells(crc: u16) -> [u16; 2] {
    [(crc >> 8) as u16, (crc & 0xFF) as u16]
}

/// Calculate the CRC using the direct bitwise algorithm (slow, for verification)
///
/// Used primarily for testing the lookup table implementation.
#[allow(dead_code)]
fn crc16_fslp_slow(cells: &[u16]) -> u16 {
    let mut crc = CRC16_SEED;

    for &cell in cells {
        crc ^= (cell & 0xFF) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
