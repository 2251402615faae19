//! Byte transport to the I2C GPIO expander.
//!
//! The LCD driver only ever needs to put one byte on the expander's output pins, so the whole
//! transport boundary is [ByteTransport::write_byte]. [I2cTransport] implements it over any
//! [embedded_hal::i2c::I2c] bus, and opens Linux `/dev/i2c-N` devices through `linux-embedded-hal`.

use crate::{LcdError, LcdResult};
use embedded_hal::i2c::{Error as _, I2c};
use linux_embedded_hal::I2cdev;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};

/// Writes single bytes to a fixed device.
///
/// Every write may fail; implementations must not retry, since a half-delivered command leaves the
/// controller in an undefined state and only the caller can decide what to do about it.
pub trait ByteTransport: Debug {
    fn write_byte(&mut self, byte: u8) -> LcdResult<()>;
}

/// A [ByteTransport] writing to one 7-bit address on an I2C bus.
///
/// The bus handle is owned for the lifetime of the transport and released when it is dropped.
pub struct I2cTransport<I> {
    i2c: I,
    address: u8,
    name: String,
    verbose: bool,
}

impl I2cTransport<I2cdev> {
    /// Claims `/dev/i2c-<bus>` and binds the transport to `address`.
    ///
    /// No bytes are sent; a missing or non-acknowledging expander is only noticed on the first write.
    pub fn open(bus: u8, address: u8) -> LcdResult<Self> {
        let path = format!("/dev/i2c-{}", bus);
        debug!("Opening {} for device {:#04x}...", path, address);
        let i2c = I2cdev::new(&path).map_err(|e| LcdError::Open(format!("{}: {}", path, e)))?;
        Self::with_name(i2c, address, path)
    }
}

impl<I: I2c> I2cTransport<I> {
    /// Wraps an already opened bus.
    pub fn new(i2c: I, address: u8) -> LcdResult<Self> {
        Self::with_name(i2c, address, "i2c".to_string())
    }

    fn with_name(i2c: I, address: u8, name: String) -> LcdResult<Self> {
        if address > 0x7F {
            return Err(LcdError::InvalidAddress(address));
        }
        Ok(I2cTransport {
            i2c,
            address,
            name,
            verbose: false,
        })
    }

    /// Logs every byte at debug level instead of trace.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Gives the bus back, e.g. to share it with another device.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I> Debug for I2cTransport<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "I2cTransport({} @ {:#04x})", self.name, self.address)
    }
}

impl<I: I2c> ByteTransport for I2cTransport<I> {
    fn write_byte(&mut self, byte: u8) -> LcdResult<()> {
        if self.verbose {
            debug!("{:?} <- {:08b}", self, byte);
        } else {
            trace!("{:?} <- {:08b}", self, byte);
        }
        self.i2c
            .write(self.address, &[byte])
            .map_err(|e| LcdError::Bus(e.kind()))
    }
}

/// A [ByteTransport] that keeps every byte written to it, for exercising the driver without hardware.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub written: Vec<u8>,
    fail_at: Option<usize>,
    attempts: usize,
}

#[cfg(any(test, feature = "mock"))]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the write with the given 0-based index (and every later one) fail with a NACK.
    pub fn failing_at(index: usize) -> Self {
        RecordingTransport {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Number of writes attempted so far, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

#[cfg(any(test, feature = "mock"))]
impl ByteTransport for RecordingTransport {
    fn write_byte(&mut self, byte: u8) -> LcdResult<()> {
        let index = self.attempts;
        self.attempts += 1;
        if self.fail_at.is_some_and(|at| index >= at) {
            return Err(LcdError::Bus(embedded_hal::i2c::ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            )));
        }
        self.written.push(byte);
        Ok(())
    }
}
