//! # Sensor Bus Module
//!
//! Transport primitives layered over the raw bus channel.
//!
//! This module handles:
//! - Writing escaped command frames, two bytes per logical cell
//! - The bounded byte-wise receive loop over the multiplexed stream
//! - The spool-off / spool-on channel reset that silences telemetry
//!   before a command reply is captured

pub mod channel;

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::{Result, ThermalBridgeError};
use crate::fslp::decoder::{parse_response, ResponseScanner};
use crate::fslp::escape::escape_frame;
use crate::fslp::protocol::{
    Frame, ResponseBuffer, FRAME_TERMINATOR, MAX_RESPONSE_BYTES, SPOOL_OFF, SPOOL_ON,
};
use channel::BusChannel;

/// Transport for one sensor on the bus
///
/// Holds the channel together with the sensor's address and the sub-register
/// command replies are read from. All operations are strictly half-duplex;
/// `&mut self` enforces one in-flight command per sensor.
pub struct SensorBus<C: BusChannel> {
    channel: C,
    address: u16,
    register: u8,
    read_timeout: Duration,
}

impl<C: BusChannel> SensorBus<C> {
    pub fn new(channel: C, address: u16, register: u8, read_timeout: Duration) -> Self {
        Self {
            channel,
            address,
            register,
            read_timeout,
        }
    }

    /// Escape and transmit a command frame
    ///
    /// Each logical cell goes out as two bytes, high byte first. The write
    /// loop watches for the terminator control cell mid-stream; running off
    /// the end of the frame without seeing it means the frame was malformed
    /// before escaping, which is an internal invariant violation surfaced
    /// as `NoTerminator`.
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let escaped = escape_frame(frame)?;
        let mut terminated = false;

        for &cell in escaped.cells() {
            self.write_cell(cell).await?;

            if cell == FRAME_TERMINATOR[1] {
                terminated = true;
                break;
            }
        }

        if !terminated {
            warn!("frame exhausted without terminator cell");
            return Err(ThermalBridgeError::NoTerminator(escaped.len()));
        }

        debug!("sent frame ({} cells)", escaped.len());
        Ok(())
    }

    /// Read the channel byte by byte until a complete response is captured
    ///
    /// The read primitive does not frame messages; the scanner looks for the
    /// start/end marker pair within a bounded window. The captured region is
    /// unescaped and status-checked by the decoder.
    ///
    /// # Errors
    ///
    /// * `NoTerminator` - no end marker within the scan window; the device
    ///   state is indeterminate and the caller should reset the channel
    ///   before any subsequent command
    /// * `Bus` - the underlying read failed or timed out
    /// * `Device` / `Truncated` - propagated from response parsing
    pub async fn receive_frame(&mut self) -> Result<ResponseBuffer> {
        let mut scanner = ResponseScanner::new();
        let mut byte = [0u8; 1];

        for _ in 0..MAX_RESPONSE_BYTES {
            timeout(
                self.read_timeout,
                self.channel.read_register(self.address, self.register, &mut byte),
            )
            .await
            .map_err(|_| ThermalBridgeError::Bus("response read timed out".to_string()))?
            .map_err(|e| ThermalBridgeError::Bus(format!("response read failed: {}", e)))?;

            if scanner.push(byte[0]) {
                debug!("captured response ({} bytes)", scanner.captured().len());
                return parse_response(scanner.captured());
            }
        }

        Err(ThermalBridgeError::NoTerminator(MAX_RESPONSE_BYTES))
    }

    /// Silence and flush the telemetry spool
    ///
    /// Two single-cell control writes, spool-off then spool-on, with a fixed
    /// settle delay between them. Must precede any command that expects a
    /// synchronous response so the next marker pair on the channel belongs
    /// to the reply rather than to telemetry.
    pub async fn reset_channel(&mut self, settle: Duration) -> Result<()> {
        debug!("resetting channel (settle {:?})", settle);
        self.write_cell(SPOOL_OFF).await?;
        sleep(settle).await;
        self.write_cell(SPOOL_ON).await?;
        Ok(())
    }

    async fn write_cell(&mut self, cell: u16) -> Result<()> {
        let bytes = [(cell >> 8) as u8, cell as u8];
        self.channel
            .write(self.address, &bytes)
            .await
            .map_err(|e| ThermalBridgeError::Bus(format!("bus write failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fslp::encoder::encode_command_frame;
    use crate::fslp::protocol::{
        FRAME_END, FRAME_START, GET_SERIAL_NUMBER, RESPONSE_STATUS_OFFSET,
    };
    use channel::mocks::MockChannel;
    use std::io;

    fn test_bus(channel: MockChannel) -> SensorBus<MockChannel> {
        SensorBus::new(channel, 0x6A, 0x00, Duration::from_millis(100))
    }

    /// A complete scripted reply: junk, start marker, filler, status,
    /// payload, end marker
    fn scripted_reply(status: u32, payload: &[u8]) -> Vec<u8> {
        let mut stream = vec![0x10, 0x20]; // telemetry residue
        stream.push(FRAME_START);
        stream.extend_from_slice(&[0u8; RESPONSE_STATUS_OFFSET]);
        stream.extend_from_slice(&status.to_be_bytes());
        stream.extend_from_slice(payload);
        stream.push(FRAME_END);
        stream
    }

    #[tokio::test]
    async fn test_send_frame_writes_two_bytes_per_cell() {
        let channel = MockChannel::new();
        let mut bus = test_bus(channel.clone());

        let frame = encode_command_frame(GET_SERIAL_NUMBER, None);
        bus.send_frame(&frame).await.unwrap();

        let writes = channel.get_written();
        assert_eq!(writes.len(), frame.len());
        assert!(writes.iter().all(|w| w.len() == 2));
        assert_eq!(writes[0], vec![0x09, 0x02]);
        assert_eq!(writes[1], vec![0x00, FRAME_START]);
        assert_eq!(writes.last().unwrap(), &vec![0x09, 0x00]);
    }

    #[tokio::test]
    async fn test_send_frame_write_error() {
        let channel = MockChannel::new();
        channel.set_write_error(io::ErrorKind::BrokenPipe);
        let mut bus = test_bus(channel);

        let frame = encode_command_frame(GET_SERIAL_NUMBER, None);
        let result = bus.send_frame(&frame).await;
        assert!(matches!(result, Err(ThermalBridgeError::Bus(_))));
    }

    #[tokio::test]
    async fn test_receive_frame_captures_reply() {
        let channel = MockChannel::new();
        channel.script_reads(&scripted_reply(0, &[0x00, 0x01, 0x02, 0x03]));
        let mut bus = test_bus(channel);

        let resp = bus.receive_frame().await.unwrap();
        assert_eq!(resp.int_payload().unwrap(), 0x00010203);
    }

    #[tokio::test]
    async fn test_receive_frame_device_error() {
        let channel = MockChannel::new();
        channel.script_reads(&scripted_reply(0x0170, &[0, 0, 0, 0]));
        let mut bus = test_bus(channel);

        let result = bus.receive_frame().await;
        assert!(matches!(result, Err(ThermalBridgeError::Device(0x0170))));
    }

    #[tokio::test]
    async fn test_receive_frame_no_terminator_within_window() {
        let channel = MockChannel::new();
        // A start marker but never an end marker within the scan bound
        let mut stream = vec![FRAME_START];
        stream.extend(std::iter::repeat(0x00u8).take(MAX_RESPONSE_BYTES));
        channel.script_reads(&stream);
        let mut bus = test_bus(channel);

        let result = bus.receive_frame().await;
        assert!(matches!(result, Err(ThermalBridgeError::NoTerminator(_))));
    }

    #[tokio::test]
    async fn test_receive_frame_read_error() {
        let channel = MockChannel::new();
        channel.set_read_error(io::ErrorKind::TimedOut);
        let mut bus = test_bus(channel);

        let result = bus.receive_frame().await;
        assert!(matches!(result, Err(ThermalBridgeError::Bus(_))));
    }

    #[tokio::test]
    async fn test_reset_channel_write_order() {
        let channel = MockChannel::new();
        let mut bus = test_bus(channel.clone());

        bus.reset_channel(Duration::from_millis(1)).await.unwrap();

        let writes = channel.get_written();
        assert_eq!(writes, vec![vec![0x0A, 0x02], vec![0x0A, 0x00]]);
    }
}
