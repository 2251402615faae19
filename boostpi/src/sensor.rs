//! Vehicle sensor readings.

use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// A physical quantity BoostPi can ask the vehicle for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Quantity {
    /// Absolute pressure in the intake manifold, kPa.
    IntakeManifoldPressure,
    /// Absolute ambient (barometric) pressure, kPa.
    BarometricPressure,
}

impl Quantity {
    /// OBD-II mode 01 parameter ID.
    pub fn pid(self) -> u8 {
        match self {
            Quantity::IntakeManifoldPressure => 0x0B,
            Quantity::BarometricPressure => 0x33,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Quantity::IntakeManifoldPressure | Quantity::BarometricPressure => "kPa",
        }
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::IntakeManifoldPressure => write!(f, "intake manifold pressure"),
            Quantity::BarometricPressure => write!(f, "barometric pressure"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The adapter answered with an error message instead of data.
    #[error("adapter error: {0}")]
    Adapter(String),
    #[error("malformed response: {0:?}")]
    MalformedResponse(String),
    #[error("vehicle does not support PID {0:#04x}")]
    Unsupported(u8),
}

/// Something that can read [Quantity] values from the vehicle.
///
/// Values come back exactly as reported, as a base-10 integer string in the quantity's unit.
pub trait SensorSource: Debug {
    fn read_quantity(&mut self, quantity: Quantity) -> Result<String, SensorError>;
}
