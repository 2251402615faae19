use boostpi_lcd::hd44780::{Geometry, LcdConfig, Timing};
use dotenv::var;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "boostpi-config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid I2C address {0:?}")]
    InvalidAddress(String),
    #[error("invalid display size {columns}x{lines}")]
    InvalidGeometry { columns: u8, lines: u8 },
}

/// Contents of `boostpi-config.json`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// I2C bus number, 0 on the very first Pi revision, 1 on everything newer.
    pub i2c_bus: u8,
    /// Address of the LCD backpack, hex (`"0x27"`) or decimal.
    pub i2c_address: String,
    pub i2c_debug: bool,
    /// Serial device of the ELM327 adapter.
    pub elm327_device_location: String,
    pub elm327_baud_rate: u32,
    pub elm327_debug: bool,
    pub lcd_columns: u8,
    pub lcd_lines: u8,
    pub refresh_interval_ms: u64,
    /// How long the error screen stays up before the display goes dark.
    pub error_display_secs: u64,
    /// Stop after this many samples. Runs until failure if unset.
    pub max_samples: Option<u64>,
}

impl Config {
    /// Path of the configuration file, from `BOOSTPI_CONFIG` if set.
    pub fn path() -> PathBuf {
        var("BOOSTPI_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
            .into()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = std::io::BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.address()?;
        self.lcd_config()?;
        Ok(())
    }

    /// Parses [Config::i2c_address].
    pub fn address(&self) -> Result<u8, ConfigError> {
        let s = self.i2c_address.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => s.parse(),
        };
        match parsed {
            Ok(address) if address <= 0x7F => Ok(address),
            _ => Err(ConfigError::InvalidAddress(self.i2c_address.clone())),
        }
    }

    pub fn lcd_config(&self) -> Result<LcdConfig, ConfigError> {
        let geometry = Geometry::new(self.lcd_columns, self.lcd_lines).map_err(|_| {
            ConfigError::InvalidGeometry {
                columns: self.lcd_columns,
                lines: self.lcd_lines,
            }
        })?;
        Ok(LcdConfig {
            geometry,
            timing: Timing::default(),
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            i2c_bus: 1,
            i2c_address: "0x27".to_string(),
            i2c_debug: false,
            elm327_device_location: "/dev/ttyUSB0".to_string(),
            elm327_baud_rate: 38400,
            elm327_debug: false,
            lcd_columns: 16,
            lcd_lines: 2,
            refresh_interval_ms: 500,
            error_display_secs: 5,
            max_samples: None,
        }
    }
}
