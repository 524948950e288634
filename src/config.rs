use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use log::{error, info, warn};

use crate::error::ConfigError;
use crate::manager::soil::W1_DEVICES;

/// Section of a weewx-style config file holding the station keys.
pub const SECTION: &str = "PiWeather";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AtmosphericKind {
    Bme280,
    Bmp280Dht22,
}

impl FromStr for AtmosphericKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bme280" => Ok(AtmosphericKind::Bme280),
            "bmp280-dht22" => Ok(AtmosphericKind::Bmp280Dht22),
            _ => Err(ConfigError::UnknownSensor(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StationConfig {
    /// Polling interval, seconds.
    pub interval: f64,
    /// Wind-speed sub-window, seconds.
    pub wind_interval: f64,
    pub anemometer_pin: u8,
    pub bucket_pin: u8,
    pub radius_cm: f64,
    /// Rain per bucket tip.
    pub bucket_size: f64,
    pub adc_channel: u8,
    pub i2c_bus: u8,
    pub atmospheric: AtmosphericKind,
    pub w1_devices: PathBuf,
    /// Append records here instead of stdout.
    pub output: Option<PathBuf>,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            interval: 60.0,
            wind_interval: 5.0,
            anemometer_pin: 5,
            bucket_pin: 6,
            radius_cm: 9.0,
            bucket_size: 0.2794,
            adc_channel: 0,
            i2c_bus: 1,
            atmospheric: AtmosphericKind::Bme280,
            w1_devices: PathBuf::from(W1_DEVICES),
            output: None,
        }
    }
}

/// Keeps `slot` when `value` doesn't parse, logging why.
fn parse_into<T>(key: &str, value: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: Display,
{
    match value.parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(err) => error!("cannot read value for '{}': {}", key, err),
    }
}

/// Seconds to a non-zero `Duration`; sub-nanosecond values round to zero and are rejected.
fn window(key: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !(value > 0.0) {
        return Err(ConfigError::NotPositive { key, value });
    }
    let duration =
        Duration::try_from_secs_f64(value).map_err(|_| ConfigError::OutOfRange { key, value })?;
    if duration.is_zero() {
        return Err(ConfigError::NotPositive { key, value });
    }
    Ok(duration)
}

impl StationConfig {
    /// Reads the `[PiWeather]` section of `path` on top of the defaults.
    pub fn from_file(path: &Path) -> Result<StationConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = StationConfig::default();
        config.apply_text(&text);
        Ok(config)
    }

    /// Lines before the first section header count as part of the station section.
    pub fn apply_text(&mut self, text: &str) {
        let mut in_section = true;
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = name.trim().eq_ignore_ascii_case(SECTION);
                continue;
            }
            if !in_section {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => self.apply(key.trim(), value.trim()),
                None => warn!("ignoring config line `{}`", line),
            }
        }
    }

    pub fn apply(&mut self, key: &str, value: &str) {
        match key {
            "interval" => parse_into(key, value, &mut self.interval),
            "wind_interval" => parse_into(key, value, &mut self.wind_interval),
            "anemometer_pin" => parse_into(key, value, &mut self.anemometer_pin),
            "bucket_pin" => parse_into(key, value, &mut self.bucket_pin),
            "radius_cm" => parse_into(key, value, &mut self.radius_cm),
            "bucket_size" => parse_into(key, value, &mut self.bucket_size),
            "adc_channel" => parse_into(key, value, &mut self.adc_channel),
            "i2c_bus" => parse_into(key, value, &mut self.i2c_bus),
            "atmospheric" => parse_into(key, value, &mut self.atmospheric),
            "w1_devices" => self.w1_devices = PathBuf::from(value),
            "output" => self.output = Some(PathBuf::from(value)),
            //weewx's own keys share the section
            "driver" => (),
            _ => warn!("unknown config key '{}'", key),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius_cm > 0.0 && self.radius_cm.is_finite()) {
            return Err(ConfigError::NotPositive {
                key: "radius_cm",
                value: self.radius_cm,
            });
        }
        if !(self.bucket_size >= 0.0) {
            return Err(ConfigError::Negative {
                key: "bucket_size",
                value: self.bucket_size,
            });
        }
        self.windows().map(|_| ())
    }

    /// `(interval, wind_interval)` as durations, checked the way the wind loop uses them.
    pub fn windows(&self) -> Result<(Duration, Duration), ConfigError> {
        let interval = window("interval", self.interval)?;
        let wind_interval = window("wind_interval", self.wind_interval)?;
        if wind_interval > interval {
            return Err(ConfigError::WindowTooLong {
                wind_interval: self.wind_interval,
                interval: self.interval,
            });
        }
        Ok((interval, wind_interval))
    }

    pub fn log(&self) {
        info!("interval is {}", self.interval);
        info!("wind_interval is {}", self.wind_interval);
        info!("anemometer_pin is {}", self.anemometer_pin);
        info!("bucket_pin is {}", self.bucket_pin);
        info!("bucket_size is {}", self.bucket_size);
        info!("radius_cm is {}", self.radius_cm);
        info!("adc_channel is {}", self.adc_channel);
        info!("atmospheric sensor is {:?} on i2c bus {}", self.atmospheric, self.i2c_bus);
        info!("1-wire devices under {}", self.w1_devices.display());
    }
}
