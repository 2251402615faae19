mod app;
mod boost;
mod config;
mod elm327;
mod format;
mod sensor;

use crate::app::{App, LOADING_TEXT, TelemetryError};
use crate::config::Config;
use crate::elm327::Elm327;
use boostpi_lcd::display::DisplayExt;
use boostpi_lcd::hd44780::{ExpanderHD44780Driver, HD44780Driver};
use boostpi_lcd::transport::I2cTransport;
use dotenv::dotenv;
use log::{debug, info};
use sysinfo::System;

fn log_system_info() {
    const UNKNOWN_STR: &str = "???";

    info!(
        "Running on {} ({}), kernel {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("BoostPi starting...");
    log_system_info();

    let config_path = Config::path();
    info!("Loading configuration file: {}", config_path.display());
    let config = Config::load(&config_path)?;
    debug!("{:?}", config);

    let address = config.address()?;
    info!("LCD @ bus {}, address {:#04x}", config.i2c_bus, address);

    debug!("Initializing display connection...");
    let mut transport =
        I2cTransport::open(config.i2c_bus, address)?.with_verbose(config.i2c_debug);
    let mut lcd = ExpanderHD44780Driver::new(&mut transport, config.lcd_config()?);
    debug!("{:?} initialized.", lcd);

    // From here on every way out goes through `finish`, so the display always ends up dark
    let outcome = start(&config, &mut lcd);
    app::finish(&mut lcd, outcome, config.error_display())?;

    info!("BoostPi stopped.");
    Ok(())
}

/// Resets the display, connects to the adapter and runs the telemetry loop.
fn start(config: &Config, lcd: &mut dyn HD44780Driver) -> Result<(), TelemetryError> {
    lcd.reset()?;
    app::show_screen(lcd, &LOADING_TEXT)?;

    info!(
        "Initializing connection to ELM327 at {}...",
        config.elm327_device_location
    );
    let mut elm = Elm327::open(&config.elm327_device_location, config.elm327_baud_rate)
        .map_err(TelemetryError::Connect)?
        .with_verbose(config.elm327_debug);
    elm.init().map_err(TelemetryError::Connect)?;
    let version = elm.version().map_err(TelemetryError::Connect)?;
    info!("ELM327 connection initialized: {}", version);

    // Get rid of the loading text before the first reading
    lcd.clear()?;

    let mut app = App::new(config.clone(), lcd, &mut elm);
    app.run()
}
