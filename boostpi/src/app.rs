//! The module for the telemetry loop and its failure handling.

use crate::boost::{BoostState, boost_psi};
use crate::config::Config;
use crate::format::format_reading;
use crate::sensor::{Quantity, SensorError, SensorSource};
use boostpi_lcd::LcdError;
use boostpi_lcd::display::DisplayExt;
use boostpi_lcd::hd44780::{DisplayLine, HD44780Driver};
use log::{debug, error, info, warn};
use std::thread::sleep;
use std::time::Duration;
use thiserror::Error;

/// Shown while the adapter is being contacted.
pub const LOADING_TEXT: [&str; 2] = ["----BoostPi-----", "----Loading-----"];
/// Shown for a while before the display goes dark after a failure.
pub const ERROR_TEXT: [&str; 2] = ["ERROR", "SHUTTING DOWN"];

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("cannot connect to the OBD-II adapter: {0}")]
    Connect(#[source] SensorError),
    #[error("failed to get {quantity}: {source}")]
    Sensor {
        quantity: Quantity,
        source: SensorError,
    },
    #[error("failed to convert {quantity} {value:?}: not a decimal integer")]
    Parse { quantity: Quantity, value: String },
    #[error("display error: {0}")]
    Display(#[from] LcdError),
}

/// The telemetry loop: reads the pressures, works out the boost and keeps the display up to date.
pub struct App<'a> {
    /// The configuration for the app.
    config: Config,
    /// Current and peak boost.
    state: BoostState,
    /// The LCD the readings go to.
    lcd: &'a mut dyn HD44780Driver,
    /// Where the pressures come from.
    sensor: &'a mut dyn SensorSource,
    /// Completed samples.
    samples: u64,
}

impl<'a> App<'a> {
    pub fn new(
        config: Config,
        lcd: &'a mut dyn HD44780Driver,
        sensor: &'a mut dyn SensorSource,
    ) -> App<'a> {
        App {
            config,
            state: BoostState::new(),
            lcd,
            sensor,
            samples: 0,
        }
    }

    pub fn state(&self) -> &BoostState {
        &self.state
    }

    /// Samples and redraws until something fails, or until `MaxSamples` samples are done.
    ///
    /// Every error ends the loop; the caller is expected to hand it to [finish].
    pub fn run(&mut self) -> Result<(), TelemetryError> {
        info!("Starting telemetry loop...");
        while !self.limit_reached() {
            self.update()?;
            self.samples += 1;
            if !self.limit_reached() {
                sleep(self.config.refresh_interval());
            }
        }
        info!("Done after {} samples.", self.samples);
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.config.max_samples.is_some_and(|max| self.samples >= max)
    }

    /// Takes one sample and shows it.
    pub fn update(&mut self) -> Result<(), TelemetryError> {
        // Both readings are needed, a cycle never renders with only one of them
        let barometric = self.read(Quantity::BarometricPressure)?;
        let manifold = self.read(Quantity::IntakeManifoldPressure)?;

        let boost = boost_psi(manifold, barometric);
        debug!(
            "Manifold {} kPa, barometric {} kPa, boost {:.2} psi",
            manifold, barometric, boost
        );
        if self.state.update(boost) {
            info!("New peak boost: {:.2} psi", self.state.peak_psi());
        }

        self.draw()
    }

    fn read(&mut self, quantity: Quantity) -> Result<u32, TelemetryError> {
        let value = self
            .sensor
            .read_quantity(quantity)
            .map_err(|source| TelemetryError::Sensor { quantity, source })?;
        match parse_reading(&value) {
            Some(reading) => Ok(reading),
            None => Err(TelemetryError::Parse { quantity, value }),
        }
    }

    fn draw(&mut self) -> Result<(), TelemetryError> {
        let geometry = self.lcd.geometry();
        let width = geometry.columns() as usize;

        let current = format_reading("Curr", self.state.current_psi(), "psi", width);
        self.lcd.write_string(&current, DisplayLine::Line1, 0)?;

        if geometry.has_line(DisplayLine::Line2) {
            let peak = format_reading("Peak", self.state.peak_psi(), "psi", width);
            self.lcd.write_string(&peak, DisplayLine::Line2, 0)?;
        }
        Ok(())
    }
}

/// Parses a reading sent as plain decimal digits. Signs, spaces and values past `u32` are rejected.
fn parse_reading(value: &str) -> Option<u32> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Clears the display and shows `text`, one string per line, as far as the display has lines.
pub fn show_screen(lcd: &mut dyn HD44780Driver, text: &[&str]) -> Result<(), LcdError> {
    let lines = text.len().min(lcd.geometry().lines() as usize);
    lcd.clear()?;
    lcd.write_lines(&text[..lines])
}

/// The single place the display goes dark, whichever way the program ends.
///
/// On failure the error is logged and, unless the display bus is what failed, the error
/// screen is shown for `error_display`. The display is then shut down exactly once, and `outcome`
/// handed back so the process can exit with it.
pub fn finish(
    lcd: &mut dyn HD44780Driver,
    outcome: Result<(), TelemetryError>,
    error_display: Duration,
) -> Result<(), TelemetryError> {
    match &outcome {
        Ok(()) => info!("Turning display off."),
        Err(e) => {
            error!("{}", e);
            if matches!(e, TelemetryError::Display(lcd_error) if lcd_error.is_bus_failure()) {
                warn!("Display bus failed, not showing the error screen.");
            } else if let Err(e) = show_screen(lcd, &ERROR_TEXT) {
                warn!("Failed to show the error screen: {}", e);
            } else {
                sleep(error_display);
            }
        }
    }

    if let Err(e) = lcd.shutdown() {
        error!("Failed to shut down the display: {}", e);
        if outcome.is_ok() {
            return Err(e.into());
        }
    }
    outcome
}
