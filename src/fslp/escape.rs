//! # Byte Escaper
//!
//! Bidirectional byte-stuffing transform that hides the three reserved
//! marker values inside payload data. A reserved byte is sent as the escape
//! marker followed by the byte minus `0x0D`; the decoder reverses this.
//!
//! Only the variable region of a frame is escaped. The fixed preamble and
//! terminator carry the marker literals and must pass through untouched.

use crate::error::{Result, ThermalBridgeError};
use crate::fslp::protocol::{
    Frame, ESCAPE_MARKER, ESCAPE_OFFSET, FRAME_HEADER_CELLS, FRAME_TERMINATOR, MAX_FRAME_CELLS,
    RESERVED_BYTES,
};

/// Escape a raw payload byte sequence
///
/// Every occurrence of a reserved byte is replaced by the escape marker and
/// the byte shifted down by `0x0D`, growing the output by one byte per
/// occurrence. Callers must forward the grown length.
pub fn escape_payload(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len());

    for &byte in payload {
        if RESERVED_BYTES.contains(&byte) {
            out.push(ESCAPE_MARKER);
            out.push(byte - ESCAPE_OFFSET);
        } else {
            out.push(byte);
        }
    }

    out
}

/// Reverse the escape transform on received bytes
///
/// Whenever the escape marker is observed it is discarded and the original
/// byte recovered as the following byte plus `0x0D`. A dangling escape
/// marker at the very end of the capture is dropped.
pub fn unescape(escaped: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut iter = escaped.iter();

    while let Some(&byte) = iter.next() {
        if byte == ESCAPE_MARKER {
            match iter.next() {
                Some(&next) => out.push(next.wrapping_add(ESCAPE_OFFSET)),
                None => break,
            }
        } else {
            out.push(byte);
        }
    }

    out
}

/// Escape the variable region of an assembled command frame
///
/// The scan starts after the two header cells (control word and start
/// marker) and stops at the terminator, located as the two-cell sequence
/// `[0x00AE, 0x0900]` — the control word is out of byte range, so the pair
/// cannot occur inside payload data and a payload byte equal to the end
/// marker cannot be mistaken for it.
///
/// # Errors
///
/// Returns `NoTerminator` if the terminator pair does not appear within the
/// maximum frame size.
pub fn escape_frame(frame: &Frame) -> Result<Frame> {
    let cells = frame.cells();
    let term = find_terminator(cells)?;

    let mut out = Vec::with_capacity(cells.len() + 4);
    out.extend_from_slice(&cells[..FRAME_HEADER_CELLS]);

    for &cell in &cells[FRAME_HEADER_CELLS..term] {
        let byte = cell as u8;
        if cell <= 0xFF && RESERVED_BYTES.contains(&byte) {
            out.push(ESCAPE_MARKER as u16);
            out.push((byte - ESCAPE_OFFSET) as u16);
        } else {
            out.push(cell);
        }
    }

    out.extend_from_slice(&cells[term..]);
    Ok(Frame::from_cells(out))
}

/// Locate the terminator cell pair, searching from the end of the header
fn find_terminator(cells: &[u16]) -> Result<usize> {
    let limit = cells.len().min(MAX_FRAME_CELLS);

    for i in FRAME_HEADER_CELLS..limit.saturating_sub(1) {
        if cells[i] == FRAME_TERMINATOR[0] && cells[i + 1] == FRAME_TERMINATOR[1] {
            return Ok(i);
        }
    }

    Err(ThermalBridgeError::NoTerminator(MAX_FRAME_CELLS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fslp::protocol::{FRAME_END, FRAME_PREAMBLE, FRAME_START};

    #[test]
    fn test_escape_plain_bytes_pass_through() {
        let payload = [0x00, 0x05, 0x00, 0x02, 0xFF];
        assert_eq!(escape_payload(&payload), payload.to_vec());
    }

    #[test]
    fn test_escape_reserved_bytes() {
        assert_eq!(escape_payload(&[0x8E]), vec![0x9E, 0x81]);
        assert_eq!(escape_payload(&[0x9E]), vec![0x9E, 0x91]);
        assert_eq!(escape_payload(&[0xAE]), vec![0x9E, 0xA1]);
    }

    #[test]
    fn test_escape_grows_one_byte_per_occurrence() {
        let payload = [0x8E, 0x01, 0x9E, 0x02, 0xAE];
        assert_eq!(escape_payload(&payload).len(), payload.len() + 3);
    }

    #[test]
    fn test_unescape_escape_round_trip_all_bytes() {
        let every_byte: Vec<u8> = (0u8..=255).collect();
        assert_eq!(unescape(&escape_payload(&every_byte)), every_byte);
    }

    #[test]
    fn test_unescape_dangling_escape_dropped() {
        assert_eq!(unescape(&[0x01, 0x9E]), vec![0x01]);
    }

    fn frame_with_payload(payload_cells: &[u16]) -> Frame {
        let mut cells = FRAME_PREAMBLE.to_vec();
        cells.extend_from_slice(payload_cells);
        cells.extend_from_slice(&FRAME_TERMINATOR);
        Frame::from_cells(cells)
    }

    #[test]
    fn test_escape_frame_leaves_clean_frame_unchanged() {
        let frame = frame_with_payload(&[0x00, 0x05, 0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFF]);
        let escaped = escape_frame(&frame).unwrap();
        assert_eq!(escaped, frame);
    }

    #[test]
    fn test_escape_frame_preserves_markers_in_preamble_and_terminator() {
        // Payload containing all three reserved values
        let frame = frame_with_payload(&[0x8E, 0x9E, 0xAE, 0x01]);
        let escaped = escape_frame(&frame).unwrap();
        let cells = escaped.cells();

        // Preamble start marker untouched
        assert_eq!(cells[1], FRAME_START as u16);

        // The end marker cell appears exactly once, at its terminator position
        let end_count = cells.iter().filter(|&&c| c == FRAME_END as u16).count();
        assert_eq!(end_count, 1);
        assert_eq!(&cells[cells.len() - 2..], &FRAME_TERMINATOR);

        // Payload grew by one cell per reserved byte
        assert_eq!(cells.len(), frame.len() + 3);
    }

    #[test]
    fn test_escape_frame_payload_end_marker_not_mistaken_for_terminator() {
        // A payload byte equal to the end marker must be escaped, not treated
        // as the end of the frame
        let frame = frame_with_payload(&[0xAE, 0x42]);
        let escaped = escape_frame(&frame).unwrap();
        let cells = escaped.cells();
        assert_eq!(cells[7], ESCAPE_MARKER as u16);
        assert_eq!(cells[8], 0xA1);
        assert_eq!(cells[9], 0x42);
    }

    #[test]
    fn test_escape_frame_missing_terminator() {
        let mut cells = FRAME_PREAMBLE.to_vec();
        cells.extend_from_slice(&[0x00, 0x05, 0x00, 0x02]);
        let result = escape_frame(&Frame::from_cells(cells));
        assert!(matches!(result, Err(ThermalBridgeError::NoTerminator(_))));
    }

    #[test]
    fn test_escape_frame_terminator_beyond_bound() {
        // Terminator present but past the maximum frame size
        let mut cells = FRAME_PREAMBLE.to_vec();
        cells.extend(std::iter::repeat(0x0001).take(MAX_FRAME_CELLS));
        cells.extend_from_slice(&FRAME_TERMINATOR);
        let result = escape_frame(&Frame::from_cells(cells));
        assert!(matches!(result, Err(ThermalBridgeError::NoTerminator(_))));
    }
}
