use crate::hd44780::{CursorDirection, Geometry, HD44780Driver, LcdConfig};
use crate::transport::ByteTransport;
use crate::{LcdError, LcdResult};
use log::{debug, trace};
use std::thread::sleep;

// Expander output bits: D7 D6 D5 D4 BL _ EN RS
const PIN_RS: u8 = 0b00000001;
const PIN_E: u8 = 0b00000100;
const PIN_BACKLIGHT: u8 = 0b00001000;

/// HD44780 driver for a controller wired in 4-bit mode behind an 8-bit I2C GPIO expander.
///
/// Each nibble is latched with three expander writes: the nibble with E low, the same with E high,
/// and with E low again, so the falling edge of E latches the nibble. A byte is always two nibbles,
/// high one first. R/W is tied low, so nothing is ever read back.
///
/// Writes are not retried. The first transport error is returned as is and the rest of the command
/// is not sent, since the controller is out of sync at that point anyway.
#[derive(Debug)]
pub struct ExpanderHD44780Driver<'a> {
    transport: &'a mut dyn ByteTransport,
    config: LcdConfig,
    backlight: bool,
}

impl<'a> ExpanderHD44780Driver<'a> {
    /// Creates a driver talking through `transport`. Nothing is sent until [HD44780Driver::init].
    pub fn new(transport: &'a mut dyn ByteTransport, config: LcdConfig) -> Self {
        ExpanderHD44780Driver {
            transport,
            config,
            backlight: true,
        }
    }

    fn control_bits(&self, rs: bool) -> u8 {
        let mut bits = 0;
        if rs {
            bits |= PIN_RS;
        }
        if self.backlight {
            bits |= PIN_BACKLIGHT;
        }
        bits
    }

    fn write_nibble(&mut self, nibble: u8, rs: bool) -> LcdResult<()> {
        if nibble > 0b1111 {
            return Err(LcdError::InvalidArgument);
        }

        let byte = (nibble << 4) | self.control_bits(rs);
        trace!("Writing nibble: {:04b}, RS: {}", nibble, rs);

        self.transport.write_byte(byte)?;
        // Set E pin to high
        self.transport.write_byte(byte | PIN_E)?;
        sleep(self.config.timing.enable_pulse);
        // Set E pin to low, the controller latches the nibble now
        self.transport.write_byte(byte)?;
        sleep(self.config.timing.enable_hold);
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> LcdResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);
        self.write_nibble((data >> 4) & 0x0F, rs)?;
        self.write_nibble(data & 0x0F, rs)?;
        Ok(())
    }
}

impl HD44780Driver for ExpanderHD44780Driver<'_> {
    /// Resets the controller from an unknown state.
    ///
    /// It sends the `0011` nibble three times, which leaves the controller in 8-bit mode no
    /// matter which mode (or which half of a byte) it was in, then `0010` to switch it to 4-bit
    /// mode. From there on full bytes are sent:
    /// - function set: 4-bit bus, 2 lines, 5x8 font,
    /// - display on, cursor off, blink off,
    /// - clear display,
    /// - entry mode: left to right, no shift.
    ///
    /// The controller then gets `reset_settle` to finish before the next command.
    fn init(&mut self) -> LcdResult<()> {
        debug!("Resetting HD44780 on {:?}...", self.transport);
        let timing = self.config.timing;

        // Synchronize
        for _ in 0..3 {
            self.write_nibble(0b0011, false)?;
            sleep(timing.sync);
        }
        self.write_nibble(0b0010, false)?;

        self.function_set(false, self.config.geometry.lines() > 1, false)?;
        self.set_display_control(true, false, false)?;
        self.clear_display()?;
        self.set_entry_mode(CursorDirection::Right, false)?;

        sleep(timing.reset_settle);
        Ok(())
    }

    fn geometry(&self) -> Geometry {
        self.config.geometry
    }

    fn set_backlight(&mut self, on: bool) -> LcdResult<()> {
        debug!("Backlight {}", if on { "on" } else { "off" });
        self.backlight = on;
        let byte = self.control_bits(false);
        self.transport.write_byte(byte)
    }

    /// Sends the command with RS = 0. Clear display and return home also wait for their much
    /// longer execution time.
    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.send(command, false)?;
        if command == 0b00000001 || command & 0b11111110 == 0b00000010 {
            sleep(self.config.timing.clear_execution);
        }
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.send(data, true)
    }
}
