//! # Command Dispatcher
//!
//! High-level typed API over the sensor bus: named operations bound to
//! their command bodies, plus generic register access for registers not
//! given a named wrapper.
//!
//! Every command invocation walks a fixed sequence. Void commands are
//! build + send. Response-bearing commands are reset → settle → build +
//! send → settle → receive → typed extraction. Failures at any stage
//! propagate unchanged; nothing is retried here — retry policy belongs to
//! the caller.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::bus::channel::{BusChannel, SerialChannel};
use crate::bus::SensorBus;
use crate::config::{Config, TimingConfig};
use crate::error::Result;
use crate::fslp::encoder::encode_command_frame;
use crate::fslp::protocol::{
    CommandBody, FfcMode, Palette, ResponseBuffer, GET_FFC_MODE, GET_PALETTE, GET_PART_NUMBER,
    GET_SERIAL_NUMBER, PART_NUMBER_LEN, SET_FFC_MODE, SET_PALETTE, TRIGGER_SHUTTER,
};

/// A thermal sensor reachable over a bus channel
///
/// One instance owns its channel; `&mut self` on every operation keeps the
/// request/response sequence strictly half-duplex per sensor address.
pub struct ThermalCamera<C: BusChannel> {
    bus: SensorBus<C>,
    timing: TimingConfig,
}

impl ThermalCamera<SerialChannel> {
    /// Open the configured serial bridge and wrap it as a camera
    pub fn open(config: &Config) -> Result<Self> {
        let channel = SerialChannel::open_with_paths(&[config.bus.port.as_str()], config.bus.baud_rate)?;
        Ok(Self::new(channel, config))
    }
}

impl<C: BusChannel> ThermalCamera<C> {
    /// Wrap an already-open channel
    pub fn new(channel: C, config: &Config) -> Self {
        let bus = SensorBus::new(
            channel,
            config.bus.address,
            config.bus.response_register,
            Duration::from_millis(config.bus.read_timeout_ms),
        );
        Self {
            bus,
            timing: config.timing.clone(),
        }
    }

    /// Trigger the shutter for a flat-field correction
    pub async fn trigger_shutter(&mut self) -> Result<()> {
        info!("triggering shutter");
        self.command(TRIGGER_SHUTTER, None).await
    }

    /// Read the sensor's serial number
    pub async fn get_serial_number(&mut self) -> Result<u32> {
        self.query(GET_SERIAL_NUMBER, None).await?.int_payload()
    }

    /// Read the sensor's part number string
    pub async fn get_part_number(&mut self) -> Result<String> {
        self.query(GET_PART_NUMBER, None).await?.string_payload(PART_NUMBER_LEN)
    }

    /// Select the color palette
    pub async fn set_palette(&mut self, palette: Palette) -> Result<()> {
        info!("setting palette to {}", palette);
        self.command(SET_PALETTE, Some(palette as u32)).await
    }

    /// Read the active color palette; `None` if the raw value is not a
    /// palette this crate knows about
    pub async fn get_palette(&mut self) -> Result<Option<Palette>> {
        let raw = self.query(GET_PALETTE, None).await?.int_payload()?;
        let palette = Palette::from_raw(raw);
        if palette.is_none() {
            debug!("unrecognized palette value 0x{:08X}", raw);
        }
        Ok(palette)
    }

    /// Select the flat-field correction mode
    pub async fn set_ffc_mode(&mut self, mode: FfcMode) -> Result<()> {
        info!("setting FFC mode to {}", mode);
        self.command(SET_FFC_MODE, Some(mode as u32)).await
    }

    /// Read the flat-field correction mode; `None` if unrecognized
    pub async fn get_ffc_mode(&mut self) -> Result<Option<FfcMode>> {
        let raw = self.query(GET_FFC_MODE, None).await?.int_payload()?;
        let mode = FfcMode::from_raw(raw);
        if mode.is_none() {
            debug!("unrecognized FFC mode value 0x{:08X}", raw);
        }
        Ok(mode)
    }

    /// Query an arbitrary register for an integer value
    ///
    /// # Arguments
    ///
    /// * `hex_body` - Command body as up to 8 hex digits, e.g. `"00050002"`
    pub async fn get_register_int(&mut self, hex_body: &str) -> Result<u32> {
        let body = CommandBody::from_hex(hex_body)?;
        self.query(body, None).await?.int_payload()
    }

    /// Write an integer value to an arbitrary register
    pub async fn set_register_int(&mut self, hex_body: &str, value: u32) -> Result<()> {
        let body = CommandBody::from_hex(hex_body)?;
        info!("writing 0x{:08X} to register {}", value, body);
        self.command(body, Some(value)).await
    }

    /// Query an arbitrary register for a fixed-length string
    pub async fn get_register_string(&mut self, hex_body: &str, len: usize) -> Result<String> {
        let body = CommandBody::from_hex(hex_body)?;
        self.query(body, None).await?.string_payload(len)
    }

    /// Build and send a void command; no reset, no reply expected
    async fn command(&mut self, body: CommandBody, value: Option<u32>) -> Result<()> {
        let frame = encode_command_frame(body, value);
        self.bus.send_frame(&frame).await
    }

    /// Full response choreography: reset the channel to silence telemetry,
    /// settle, send, settle, then capture the reply
    async fn query(&mut self, body: CommandBody, value: Option<u32>) -> Result<ResponseBuffer> {
        debug!("querying register {}", body);

        self.bus
            .reset_channel(Duration::from_millis(self.timing.reset_settle_ms))
            .await?;
        sleep(Duration::from_millis(self.timing.post_reset_ms)).await;

        let frame = encode_command_frame(body, value);
        self.bus.send_frame(&frame).await?;
        sleep(Duration::from_millis(self.timing.post_send_ms)).await;

        self.bus.receive_frame().await
    }
}
