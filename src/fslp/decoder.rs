//! # FSLP Response Decoder
//!
//! Stateful scan of an unframed byte stream for a delimited response, and
//! parsing of the captured region into a validated [`ResponseBuffer`].
//!
//! The sensor multiplexes a continuous telemetry stream and command replies
//! over the same channel, so framing is entirely a software concern: the
//! scanner discards bytes until it observes the start marker, captures until
//! the end marker, and restarts if a second start marker appears mid-capture.

use crate::error::{Result, ThermalBridgeError};
use crate::fslp::escape::unescape;
use crate::fslp::protocol::{
    ResponseBuffer, FRAME_END, FRAME_START, RESPONSE_STATUS_OFFSET,
};

/// Incremental scanner for a response frame in a raw byte stream
#[derive(Debug, Default)]
pub struct ResponseScanner {
    capturing: bool,
    complete: bool,
    captured: Vec<u8>,
}

impl ResponseScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received byte; returns `true` once the end marker is seen
    ///
    /// Bytes before the start marker are telemetry residue and are dropped.
    /// A repeated start marker restarts the capture: the reply's own payload
    /// can never contain a raw marker byte, escaping guarantees that.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.complete {
            return true;
        }

        match byte {
            FRAME_START => {
                self.capturing = true;
                self.captured.clear();
            }
            FRAME_END if self.capturing => {
                self.complete = true;
            }
            _ => {
                if self.capturing {
                    self.captured.push(byte);
                }
            }
        }

        self.complete
    }

    /// Whether the end marker has been observed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The bytes captured between the markers (exclusive), still escaped
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }
}

/// Parse a captured response region into a validated buffer
///
/// The region is unescaped, then the big-endian status word at the fixed
/// status offset is checked.
///
/// # Arguments
///
/// * `raw` - Bytes captured between the start and end markers (exclusive)
///
/// # Errors
///
/// * `Truncated` - the capture is shorter than the fixed response layout
/// * `Device` - the sensor's status word was non-zero; no payload is returned
pub fn parse_response(raw: &[u8]) -> Result<ResponseBuffer> {
    let bytes = unescape(raw);

    let need = RESPONSE_STATUS_OFFSET + 4;
    if bytes.len() < need {
        return Err(ThermalBridgeError::Truncated { got: bytes.len(), need });
    }

    let s = &bytes[RESPONSE_STATUS_OFFSET..need];
    let status = u32::from_be_bytes([s[0], s[1], s[2], s[3]]);
    if status != 0 {
        return Err(ThermalBridgeError::Device(status));
    }

    Ok(ResponseBuffer::new(bytes))
}
