//! # FSLP Frame Encoder
//!
//! Assembles outgoing command frames prior to escaping.

use crate::fslp::crc::{crc16_fslp, crc_cells};
use crate::fslp::protocol::*;

/// Build a complete command frame for a command body and optional value
///
/// Layout: `PREAMBLE(7) | BODY(4) | VALUE_OR_FILL(4) | CRC(2) | TERMINATOR(2)`.
/// A query carries four `0xFF` fill cells in the value slot, signalling that
/// this is a command rather than a status reply; a register write carries the
/// value as four big-endian byte cells. The CRC covers every cell from index
/// 2 through the end of the value region, and is appended high byte first.
///
/// The returned frame is unescaped; it must pass through
/// [`escape_frame`](crate::fslp::escape::escape_frame) before transmission.
///
/// # Arguments
///
/// * `body` - The 4-byte command body identifying the register/operation
/// * `value` - Register value for set commands, `None` for queries
pub fn encode_command_frame(body: CommandBody, value: Option<u32>) -> Frame {
    let mut cells = Vec::with_capacity(
        FRAME_PREAMBLE.len() + 4 + 4 + 2 + FRAME_TERMINATOR.len(),
    );

    cells.extend_from_slice(&FRAME_PREAMBLE);
    cells.extend(body.bytes().iter().map(|&b| b as u16));

    match value {
        Some(v) => cells.extend(v.to_be_bytes().iter().map(|&b| b as u16)),
        None => cells.extend(std::iter::repeat(FILL_CELL).take(4)),
    }

    let crc = crc16_fslp(&cells[FRAME_HEADER_CELLS..]);
    cells.extend_from_slice(&crc_cells(crc));
    cells.extend_from_slice(&FRAME_TERMINATOR);

    Frame::from_cells(cells)
}
