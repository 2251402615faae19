//! Character LCD support for BoostPi.
//!
//! The display is an HD44780-compatible controller wired in 4-bit mode behind an 8-bit I2C GPIO
//! expander (the common PCF8574 "backpack"). [transport] moves single bytes to the expander,
//! [hd44780] turns commands and characters into the nibble/strobe sequence the controller expects,
//! and [display] builds the high-level operations (reset, clear, positioned text, going dark) on top.

pub mod display;
pub mod hd44780;
pub mod transport;

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    /// The I2C bus reported an error, e.g. the expander did not acknowledge.
    #[error("I2C bus error: {0}")]
    Bus(embedded_hal::i2c::ErrorKind),
    /// The bus device could not be claimed.
    #[error("cannot open I2C bus: {0}")]
    Open(String),
    /// The device address does not fit in 7 bits.
    #[error("invalid 7-bit I2C address: {0:#04x}")]
    InvalidAddress(u8),
    /// The requested text position is outside the visible area of the display.
    #[error("position (line {line}, offset {offset}) is outside the display")]
    InvalidPosition { line: u8, offset: u8 },
    #[error("invalid argument")]
    InvalidArgument,
}

impl LcdError {
    /// Whether the error was caused by the bus itself, as opposed to a rejected request.
    ///
    /// After a bus failure the controller state is undefined.
    pub fn is_bus_failure(&self) -> bool {
        matches!(self, LcdError::Bus(_) | LcdError::Open(_))
    }
}

pub type LcdResult<T> = Result<T, LcdError>;
