//! High-level display operations, available on every [HD44780Driver].

use crate::hd44780::{DisplayLine, HD44780Driver};
use crate::{LcdError, LcdResult};
use log::{debug, warn};

pub trait DisplayExt {
    /// Puts the controller into a known state. See [HD44780Driver::init].
    fn reset(&mut self) -> LcdResult<()>;

    /// Clears the display and returns the cursor home.
    fn clear(&mut self) -> LcdResult<()>;

    /// Writes `text` on `line`, starting `offset` columns in.
    ///
    /// Text that doesn't fit in the visible width is cut off rather than left to spill into the
    /// controller's off-screen DDRAM. Non-ASCII characters are shown as `?`.
    fn write_string(&mut self, text: &str, line: DisplayLine, offset: u8) -> LcdResult<()>;

    /// Writes each string at the start of consecutive lines, from the first one.
    fn write_lines(&mut self, lines: &[&str]) -> LcdResult<()>;

    fn turn_backlight_off(&mut self) -> LcdResult<()>;

    /// Turns the display off, keeping its contents.
    fn turn_display_off(&mut self) -> LcdResult<()>;

    /// Blanks the display: clear, backlight off, display off.
    ///
    /// Running it again on a dark display changes nothing.
    fn shutdown(&mut self) -> LcdResult<()>;
}

impl<T: ?Sized + HD44780Driver> DisplayExt for T {
    fn reset(&mut self) -> LcdResult<()> {
        self.init()
    }

    fn clear(&mut self) -> LcdResult<()> {
        self.clear_display()?;
        self.return_home()
    }

    fn write_string(&mut self, text: &str, line: DisplayLine, offset: u8) -> LcdResult<()> {
        let geometry = self.geometry();
        if !geometry.has_line(line) || offset >= geometry.columns() {
            return Err(LcdError::InvalidPosition {
                line: line.number(),
                offset,
            });
        }

        let visible = (geometry.columns() - offset) as usize;
        if text.chars().count() > visible {
            debug!("Cutting {:?} to {} characters", text, visible);
        }

        self.set_ddram_address(line.ddram_address(offset)?)?;
        for c in text.chars().take(visible) {
            if c.is_ascii() {
                self.send_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.send_data(b'?')?;
            }
        }
        Ok(())
    }

    fn write_lines(&mut self, lines: &[&str]) -> LcdResult<()> {
        if lines.len() > self.geometry().lines() as usize {
            return Err(LcdError::InvalidArgument);
        }
        for (text, line) in lines.iter().zip(DisplayLine::ALL) {
            self.write_string(text, line, 0)?;
        }
        Ok(())
    }

    fn turn_backlight_off(&mut self) -> LcdResult<()> {
        self.set_backlight(false)
    }

    fn turn_display_off(&mut self) -> LcdResult<()> {
        self.set_display_control(false, false, false)
    }

    fn shutdown(&mut self) -> LcdResult<()> {
        debug!("Shutting down display...");
        self.clear()?;
        self.turn_backlight_off()?;
        self.turn_display_off()
    }
}
