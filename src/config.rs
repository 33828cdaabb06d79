//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Bus channel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Sensor address on the bridge bus
    #[serde(default = "default_address")]
    pub address: u16,

    /// Sub-register command replies are read back from
    #[serde(default = "default_response_register")]
    pub response_register: u8,

    /// Per-byte timeout for the response read loop
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Command timing configuration
///
/// The reset → settle → send → settle → receive ordering is a contract of
/// the physical device; only the absolute durations are tunable here.
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// Delay between the spool-off and spool-on control writes
    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,

    /// Delay after a channel reset before sending the command
    #[serde(default = "default_post_reset_ms")]
    pub post_reset_ms: u64,

    /// Delay after sending before the receive loop starts
    #[serde(default = "default_post_send_ms")]
    pub post_send_ms: u64,
}

// Default value functions
fn default_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 921_600 }
fn default_address() -> u16 { 0x6A }
fn default_response_register() -> u8 { 0x00 }
fn default_read_timeout_ms() -> u64 { 100 }

fn default_reset_settle_ms() -> u64 { 10 }
fn default_post_reset_ms() -> u64 { 10 }
fn default_post_send_ms() -> u64 { 10 }

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            address: default_address(),
            response_register: default_response_register(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reset_settle_ms: default_reset_settle_ms(),
            post_reset_ms: default_post_reset_ms(),
            post_send_ms: default_post_send_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.bus.port.is_empty() {
            return Err(crate::error::ThermalBridgeError::Config(
                toml::de::Error::custom("bus port cannot be empty")
            ));
        }

        if ![115_200, 230_400, 460_800, 921_600].contains(&self.bus.baud_rate) {
            return Err(crate::error::ThermalBridgeError::Config(
                toml::de::Error::custom("baud_rate must be one of: 115200, 230400, 460800, 921600")
            ));
        }

        if self.bus.read_timeout_ms == 0 || self.bus.read_timeout_ms > 10_000 {
            return Err(crate::error::ThermalBridgeError::Config(
                toml::de::Error::custom("read_timeout_ms must be between 1 and 10000")
            ));
        }

        for (name, value) in [
            ("reset_settle_ms", self.timing.reset_settle_ms),
            ("post_reset_ms", self.timing.post_reset_ms),
            ("post_send_ms", self.timing.post_send_ms),
        ] {
            if value == 0 || value > 1000 {
                return Err(crate::error::ThermalBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be between 1 and 1000", name))
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bus.baud_rate, 921_600);
        assert_eq!(config.timing.reset_settle_ms, 10);
    }

    #[test]
    fn test_empty_port() {
        let mut config = Config::default();
        config.bus.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.bus.baud_rate = 9600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &[115_200, 230_400, 460_800, 921_600] {
            let mut config = Config::default();
            config.bus.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_read_timeout_zero() {
        let mut config = Config::default();
        config.bus.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_timeout_too_high() {
        let mut config = Config::default();
        config.bus.read_timeout_ms = 10_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timing_zero() {
        let mut config = Config::default();
        config.timing.post_send_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timing_too_high() {
        let mut config = Config::default();
        config.timing.reset_settle_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[bus]
port = "/dev/ttyUSB0"
address = 0x40

[timing]
post_send_ms = 20
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.bus.port, "/dev/ttyUSB0");
        assert_eq!(config.bus.address, 0x40);
        assert_eq!(config.bus.baud_rate, 921_600);
        assert_eq!(config.timing.post_send_ms, 20);
        assert_eq!(config.timing.post_reset_ms, 10);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"").unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.bus.port, "/dev/ttyACM0");
    }
}
