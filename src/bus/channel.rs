//! Trait abstraction for the addressed byte channel to enable testing

use async_trait::async_trait;
use std::io;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{Result, ThermalBridgeError};

/// Default sensor bridge device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC bridges
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Trait for the address-routed byte channel the sensor hangs off
///
/// The protocol core treats this as an opaque transport: it writes raw bytes
/// to the sensor's address and reads single bytes back from a sub-register.
/// Framing is never the channel's concern.
#[async_trait]
pub trait BusChannel: Send {
    /// Write bytes to the addressed device
    async fn write(&mut self, address: u16, bytes: &[u8]) -> io::Result<()>;

    /// Read `buf.len()` bytes from a sub-register of the addressed device
    async fn read_register(&mut self, address: u16, register: u8, buf: &mut [u8])
        -> io::Result<()>;
}

/// Bus channel over a serial bridge that carries the sensor's command stream
///
/// Address and register routing is handled by the bridge firmware; on this
/// side the channel is a plain byte stream.
pub struct SerialChannel {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialChannel {
    /// Open a connection to the sensor bridge, auto-detecting the device
    /// by trying common paths
    ///
    /// # Errors
    ///
    /// Returns `PortNotFound` if none of the default paths can be opened
    pub fn open(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open a connection using the first path that succeeds
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open bus device: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened sensor bus at {}", path);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(ThermalBridgeError::PortNotFound(paths.join(", ")))
    }

    /// Open a specific device with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| ThermalBridgeError::Bus(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// The device path of the opened channel
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl BusChannel for SerialChannel {
    async fn write(&mut self, _address: u16, bytes: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(bytes).await?;
        self.port.flush().await
    }

    async fn read_register(
        &mut self,
        _address: u16,
        _register: u8,
        buf: &mut [u8],
    ) -> io::Result<()> {
        use tokio::io::AsyncReadExt;
        self.port.read_exact(buf).await?;
        Ok(())
    }
}
