//! HD44780 LCD controller module.
//!
//! The [HD44780Driver] trait holds the controller command set; an implementation only has to know
//! how to move a command or data byte to the controller and how to drive the backlight. See
//! [ExpanderHD44780Driver] for the 4-bit, I2C expander based implementation used by BoostPi.
//!
//! # Sources
//!
//! - Hitachi, [“HD44780U (LCD-II) Dot Matrix Liquid Crystal Display Controller/Driver,”](https://www.sparkfun.com/datasheets/LCD/HD44780.pdf)
//!   Rev. 0.0, 1998.

mod expander;

use crate::{LcdError, LcdResult};
pub use expander::*;
use std::fmt::Debug;
use std::time::Duration;

pub trait HD44780Driver: Debug {
    /// Runs the power-on synchronization and initialization sequence. After it returns the
    /// controller is in 4-bit mode with the display on, cursor hidden and the DDRAM cleared.
    fn init(&mut self) -> LcdResult<()>;

    /// Visible area of the attached display.
    fn geometry(&self) -> Geometry;

    /// Switches the backlight on or off. The state sticks for every later byte sent to the display.
    fn set_backlight(&mut self, on: bool) -> LcdResult<()>;

    /// Clears the display and sets the cursor to the home position.
    ///
    /// Command: `00000001`.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(0b00000001)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    ///
    /// Command: `0000001?`.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(0b00000010)
    }

    /// Sets the direction the cursor moves after a write, and whether the display shifts with it.
    ///
    /// Command: `000001IS`.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Turns the display on or off, and controls the cursor and its blinking.
    /// Turning the display off keeps the DDRAM contents.
    ///
    /// Command: `00001DCB`.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the interface data length, the number of display lines and the font.
    ///
    /// Command: `001DNF??`.
    /// `D` is `1` for an 8-bit bus, `0` for a 4-bit bus.
    /// `N` is `1` for two (or four) lines, `0` for one line.
    /// `F` is `1` for the 5x10 font, `0` for 5x8.
    fn function_set(&mut self, data_length: bool, two_lines: bool, font: bool) -> LcdResult<()> {
        let mut command = 0b00100000;
        if data_length {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the DDRAM address, i.e. where the next character lands.
    ///
    /// Command: `1AAAAAAA`.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b01111111 {
            return Err(LcdError::InvalidArgument);
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    // Low-level commands
    // These are used by the high-level functions above and implemented by the driver implementation.

    /// Sends a command to the controller with RS = 0.
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a character to the controller with RS = 1.
    fn send_data(&mut self, data: u8) -> LcdResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// A display row, numbered from 1 like on the module's silkscreen.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DisplayLine {
    Line1,
    Line2,
    /// Only on 4-line modules.
    Line3,
    /// Only on 4-line modules.
    Line4,
}

impl DisplayLine {
    pub const ALL: [DisplayLine; 4] = [
        DisplayLine::Line1,
        DisplayLine::Line2,
        DisplayLine::Line3,
        DisplayLine::Line4,
    ];

    /// Length of one line in DDRAM when the controller runs in 2-line mode.
    const DDRAM_LINE_LENGTH: u8 = 40;

    /// 1-based line number.
    pub fn number(self) -> u8 {
        match self {
            DisplayLine::Line1 => 1,
            DisplayLine::Line2 => 2,
            DisplayLine::Line3 => 3,
            DisplayLine::Line4 => 4,
        }
    }

    /// DDRAM address of the first character of the line.
    ///
    /// Lines 3 and 4 of 4-line modules continue lines 1 and 2 past the 20th column.
    pub fn base_address(self) -> u8 {
        match self {
            DisplayLine::Line1 => 0x00,
            DisplayLine::Line2 => 0x40,
            DisplayLine::Line3 => 0x14,
            DisplayLine::Line4 => 0x54,
        }
    }

    /// DDRAM address of the character `offset` columns into the line.
    pub fn ddram_address(self, offset: u8) -> LcdResult<u8> {
        if offset >= Self::DDRAM_LINE_LENGTH {
            return Err(LcdError::InvalidPosition {
                line: self.number(),
                offset,
            });
        }
        Ok(self.base_address() + offset)
    }
}

/// Number of visible columns and lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    columns: u8,
    lines: u8,
}

impl Geometry {
    pub fn new(columns: u8, lines: u8) -> LcdResult<Self> {
        if !(1..=4).contains(&lines) || !(1..=40).contains(&columns) {
            return Err(LcdError::InvalidArgument);
        }
        Ok(Geometry { columns, lines })
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    /// Whether the line exists on this display.
    pub fn has_line(&self, line: DisplayLine) -> bool {
        line.number() <= self.lines
    }
}

impl Default for Geometry {
    /// The ubiquitous 16x2 module.
    fn default() -> Self {
        Geometry {
            columns: 16,
            lines: 2,
        }
    }
}

/// Delays the controller needs between bus operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    /// How long E stays high for each nibble.
    pub enable_pulse: Duration,
    /// Wait after the falling edge of E, before the next nibble.
    pub enable_hold: Duration,
    /// Wait after each of the three synchronization nibbles of the reset sequence.
    pub sync: Duration,
    /// Execution time of clear display and return home.
    pub clear_execution: Duration,
    /// Wait after the reset sequence before the next command.
    pub reset_settle: Duration,
}

impl Timing {
    /// No delays at all, for talking to something that is not a real controller.
    pub const fn none() -> Self {
        Timing {
            enable_pulse: Duration::ZERO,
            enable_hold: Duration::ZERO,
            sync: Duration::ZERO,
            clear_execution: Duration::ZERO,
            reset_settle: Duration::ZERO,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            enable_pulse: Duration::from_micros(500),
            enable_hold: Duration::from_micros(100),
            sync: Duration::from_millis(5),
            clear_execution: Duration::from_millis(2),
            reset_settle: Duration::from_millis(200),
        }
    }
}

/// Immutable driver configuration, handed to the driver when it is created.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LcdConfig {
    pub geometry: Geometry,
    pub timing: Timing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddram_addresses() {
        assert_eq!(DisplayLine::Line1.ddram_address(5), Ok(0x05));
        assert_eq!(DisplayLine::Line2.ddram_address(3), Ok(0x43));
        assert_eq!(DisplayLine::Line3.ddram_address(0), Ok(0x14));
        assert_eq!(DisplayLine::Line4.ddram_address(2), Ok(0x56));
    }

    #[test]
    fn ddram_address_past_line_end() {
        assert_eq!(DisplayLine::Line4.ddram_address(39), Ok(0x7B));
        assert_eq!(
            DisplayLine::Line4.ddram_address(40),
            Err(LcdError::InvalidPosition { line: 4, offset: 40 })
        );
    }

    #[test]
    fn geometry_bounds() {
        assert!(Geometry::new(20, 4).is_ok());
        assert!(Geometry::new(16, 0).is_err());
        assert!(Geometry::new(16, 5).is_err());
        assert!(Geometry::new(0, 2).is_err());
        let g = Geometry::default();
        assert!(g.has_line(DisplayLine::Line2));
        assert!(!g.has_line(DisplayLine::Line3));
    }
}
