//! # FSLP Protocol Constants and Types
//!
//! Core wire definitions for the Boson serial link protocol (FSLP).
//!
//! A command frame is a sequence of logical 16-bit cells, transmitted high
//! byte first. Payload cells carry byte-range values; the two out-of-range
//! control words (`0x0902` / `0x0900`) bracket the frame and double as the
//! telemetry spool stop/start instructions.

use std::fmt;

use crate::error::{Result, ThermalBridgeError};

/// Frame start marker (also the first byte a response is scanned for)
pub const FRAME_START: u8 = 0x8E;

/// Escape marker emitted in front of a reserved payload byte
pub const ESCAPE_MARKER: u8 = 0x9E;

/// Frame end marker
pub const FRAME_END: u8 = 0xAE;

/// The three reserved byte values that must never appear raw in payload data
pub const RESERVED_BYTES: [u8; 3] = [FRAME_START, ESCAPE_MARKER, FRAME_END];

/// Offset subtracted from a reserved byte when escaping (added back on decode)
pub const ESCAPE_OFFSET: u8 = 0x0D;

/// Fixed frame preamble: stop-spooling control word, start marker, then five
/// fixed filler cells. Never escaped.
pub const FRAME_PREAMBLE: [u16; 7] = [0x0902, 0x008E, 0x0000, 0x0012, 0x00C0, 0x00FF, 0x00EE];

/// Fixed frame terminator: end marker, then the start-spooling control word.
/// Never escaped. The control word is out of byte range, so the pair cannot
/// occur inside payload data.
pub const FRAME_TERMINATOR: [u16; 2] = [0x00AE, 0x0900];

/// Cells skipped at the front of the frame by both the CRC and the escape
/// scan: the control word and the literal start marker
pub const FRAME_HEADER_CELLS: usize = 2;

/// Upper bound on frame length in cells; scans that run past this without
/// finding the terminator report `NoTerminator`
pub const MAX_FRAME_CELLS: usize = 64;

/// Upper bound on the byte-wise response read loop
pub const MAX_RESPONSE_BYTES: usize = 64;

/// Offset of the big-endian status word inside a captured response
pub const RESPONSE_STATUS_OFFSET: usize = 9;

/// Offset of the typed payload inside a captured response
pub const RESPONSE_PAYLOAD_OFFSET: usize = 13;

/// Fill cell used in place of a value when a command carries no parameter
pub const FILL_CELL: u16 = 0x00FF;

/// Length of the part number string reported by the sensor
pub const PART_NUMBER_LEN: usize = 32;

/// Telemetry spool-off control word, written alone to silence the stream
pub const SPOOL_OFF: u16 = 0x0A02;

/// Telemetry spool-on control word
pub const SPOOL_ON: u16 = 0x0A00;

/// A 4-byte command body: two big-endian 16-bit fields identifying the
/// register family and the function within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBody {
    family: u16,
    function: u16,
}

// Named command bodies. These are part of the wire contract with the sensor.
pub const TRIGGER_SHUTTER: CommandBody = CommandBody::new(0x0005, 0x0007);
pub const GET_SERIAL_NUMBER: CommandBody = CommandBody::new(0x0005, 0x0002);
pub const GET_PART_NUMBER: CommandBody = CommandBody::new(0x0005, 0x0004);
pub const SET_FFC_MODE: CommandBody = CommandBody::new(0x0005, 0x0012);
pub const GET_FFC_MODE: CommandBody = CommandBody::new(0x0005, 0x0013);
pub const SET_PALETTE: CommandBody = CommandBody::new(0x000B, 0x0003);
pub const GET_PALETTE: CommandBody = CommandBody::new(0x000B, 0x0004);

impl CommandBody {
    /// Create a command body from its family and function fields
    pub const fn new(family: u16, function: u16) -> Self {
        Self { family, function }
    }

    /// Parse a command body from a hexadecimal string (up to 8 digits,
    /// optional `0x` prefix), as accepted by the ad-hoc register commands
    ///
    /// # Errors
    ///
    /// Returns `InvalidCommandBody` if the string is empty, too long, or
    /// contains non-hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.is_empty() || digits.len() > 8 {
            return Err(ThermalBridgeError::InvalidCommandBody(s.to_string()));
        }
        let raw = u32::from_str_radix(digits, 16)
            .map_err(|_| ThermalBridgeError::InvalidCommandBody(s.to_string()))?;
        Ok(Self::new((raw >> 16) as u16, raw as u16))
    }

    /// The body as the four wire bytes, big-endian field order
    pub fn bytes(&self) -> [u8; 4] {
        [
            (self.family >> 8) as u8,
            self.family as u8,
            (self.function >> 8) as u8,
            self.function as u8,
        ]
    }
}

impl fmt::Display for CommandBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}{:04X}", self.family, self.function)
    }
}

/// Color palette selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    WhiteHot = 0,
    BlackHot = 1,
}

impl Palette {
    /// Decode a palette from the raw register value, if recognized
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Palette::WhiteHot),
            1 => Some(Palette::BlackHot),
            _ => None,
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Palette::WhiteHot => write!(f, "white hot"),
            Palette::BlackHot => write!(f, "black hot"),
        }
    }
}

/// Flat-field correction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfcMode {
    Manual = 0,
    Auto = 1,
}

impl FfcMode {
    /// Decode an FFC mode from the raw register value, if recognized
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(FfcMode::Manual),
            1 => Some(FfcMode::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for FfcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfcMode::Manual => write!(f, "manual"),
            FfcMode::Auto => write!(f, "auto"),
        }
    }
}

/// A command frame as logical 16-bit cells, before or after escaping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    cells: Vec<u16>,
}

impl Frame {
    pub(crate) fn from_cells(cells: Vec<u16>) -> Self {
        Self { cells }
    }

    /// The frame's cells in transmission order
    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A validated response: the bytes captured between the start and end
/// markers, already unescaped, with a zero status word.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
}

impl ResponseBuffer {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw unescaped capture, for diagnostics
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read the typed integer payload (big-endian u32 at the payload offset)
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if the capture is too short to hold the payload
    pub fn int_payload(&self) -> Result<u32> {
        let need = RESPONSE_PAYLOAD_OFFSET + 4;
        if self.bytes.len() < need {
            return Err(ThermalBridgeError::Truncated { got: self.bytes.len(), need });
        }
        let b = &self.bytes[RESPONSE_PAYLOAD_OFFSET..need];
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a fixed-length string payload, trimmed at the first NUL
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if the capture is too short to hold `len` bytes
    pub fn string_payload(&self, len: usize) -> Result<String> {
        let need = RESPONSE_PAYLOAD_OFFSET + len;
        if self.bytes.len() < need {
            return Err(ThermalBridgeError::Truncated { got: self.bytes.len(), need });
        }
        let raw = &self.bytes[RESPONSE_PAYLOAD_OFFSET..need];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_constants() {
        assert_eq!(FRAME_PREAMBLE[0], 0x0902);
        assert_eq!(FRAME_PREAMBLE[1], FRAME_START as u16);
        assert_eq!(FRAME_TERMINATOR, [FRAME_END as u16, 0x0900]);
        assert_eq!(RESERVED_BYTES, [0x8E, 0x9E, 0xAE]);
        assert_eq!(ESCAPE_OFFSET, 0x0D);
    }

    #[test]
    fn test_command_body_bytes() {
        assert_eq!(GET_SERIAL_NUMBER.bytes(), [0x00, 0x05, 0x00, 0x02]);
        assert_eq!(SET_PALETTE.bytes(), [0x00, 0x0B, 0x00, 0x03]);
    }

    #[test]
    fn test_command_body_from_hex() {
        assert_eq!(CommandBody::from_hex("00050002").unwrap(), GET_SERIAL_NUMBER);
        assert_eq!(CommandBody::from_hex("50002").unwrap(), GET_SERIAL_NUMBER);
        assert_eq!(CommandBody::from_hex("0x000B0004").unwrap(), GET_PALETTE);
    }

    #[test]
    fn test_command_body_from_hex_rejects_garbage() {
        assert!(CommandBody::from_hex("").is_err());
        assert!(CommandBody::from_hex("0x").is_err());
        assert!(CommandBody::from_hex("123456789").is_err()); // 9 digits
        assert!(CommandBody::from_hex("zzzz").is_err());
    }

    #[test]
    fn test_command_body_display() {
        assert_eq!(GET_SERIAL_NUMBER.to_string(), "00050002");
        assert_eq!(CommandBody::from_hex("b0004").unwrap().to_string(), "000B0004");
    }

    #[test]
    fn test_palette_round_trip() {
        assert_eq!(Palette::from_raw(0), Some(Palette::WhiteHot));
        assert_eq!(Palette::from_raw(1), Some(Palette::BlackHot));
        assert_eq!(Palette::from_raw(2), None);
        assert_eq!(Palette::WhiteHot as u32, 0);
    }

    #[test]
    fn test_ffc_mode_round_trip() {
        assert_eq!(FfcMode::from_raw(0), Some(FfcMode::Manual));
        assert_eq!(FfcMode::from_raw(1), Some(FfcMode::Auto));
        assert_eq!(FfcMode::from_raw(7), None);
    }

    #[test]
    fn test_int_payload() {
        let mut bytes = vec![0u8; RESPONSE_PAYLOAD_OFFSET];
        bytes.extend_from_slice(&[0x00, 0x01, 0x02, 0x03]);
        let buf = ResponseBuffer::new(bytes);
        assert_eq!(buf.int_payload().unwrap(), 0x00010203);
    }

    #[test]
    fn test_int_payload_truncated() {
        let buf = ResponseBuffer::new(vec![0u8; RESPONSE_PAYLOAD_OFFSET + 2]);
        assert!(matches!(
            buf.int_payload(),
            Err(ThermalBridgeError::Truncated { got: 15, need: 17 })
        ));
    }

    #[test]
    fn test_string_payload_trims_at_nul() {
        let mut bytes = vec![0u8; RESPONSE_PAYLOAD_OFFSET];
        bytes.extend_from_slice(b"BOSON640\0\0\0\0\0\0\0\0");
        let buf = ResponseBuffer::new(bytes);
        assert_eq!(buf.string_payload(16).unwrap(), "BOSON640");
    }

    #[test]
    fn test_string_payload_truncated() {
        let buf = ResponseBuffer::new(vec![0u8; RESPONSE_PAYLOAD_OFFSET + 4]);
        assert!(buf.string_payload(32).is_err());
    }
}
