use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the hardware collaborators. Each one is local to a single metric.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("gpio: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[error("i2c: {0}")]
    I2c(#[from] rppal::i2c::Error),
    #[error("spi: {0}")]
    Spi(#[from] rppal::spi::Error),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("bus: {0}")]
    Bus(String),
    #[error("malformed reading `{0}`")]
    Malformed(String),
    #[error("no 1-wire probe found under {0}")]
    ProbeMissing(PathBuf),
    #[error("probe not ready after {0} attempts")]
    NotReady(u32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("`{key}` must be greater than zero, got {value}")]
    NotPositive { key: &'static str, value: f64 },
    #[error("`{key}` is out of range: {value}")]
    OutOfRange { key: &'static str, value: f64 },
    #[error("`{key}` must not be negative, got {value}")]
    Negative { key: &'static str, value: f64 },
    #[error("wind_interval ({wind_interval}s) exceeds interval ({interval}s)")]
    WindowTooLong { wind_interval: f64, interval: f64 },
    #[error("unknown atmospheric sensor `{0}`")]
    UnknownSensor(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum WindError {
    #[error("sub-window never completed inside the polling interval")]
    NoSpeedSamples,
    #[error("sub-window has zero length")]
    EmptySubWindow,
}
