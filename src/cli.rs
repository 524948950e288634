use std::path::PathBuf;

use clap::{self, Parser};

use crate::config::{AtmosphericKind, StationConfig};
use crate::error::ConfigError;

#[derive(Debug, Parser)]
#[command(about = "Raspberry Pi weather station loop driver", long_about = None)]
pub struct Cli {
    /// weewx-style config file; its [PiWeather] section is read
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Polling interval in seconds
    #[arg(short, long)]
    pub interval: Option<f64>,
    /// Wind-speed sub-window in seconds
    #[arg(short, long)]
    pub wind_interval: Option<f64>,
    #[arg(long)]
    pub anemometer_pin: Option<u8>,
    #[arg(long)]
    pub bucket_pin: Option<u8>,
    #[arg(long)]
    pub radius_cm: Option<f64>,
    #[arg(long)]
    pub bucket_size: Option<f64>,
    #[arg(long)]
    pub adc_channel: Option<u8>,
    #[arg(long)]
    pub i2c_bus: Option<u8>,
    #[arg(short, long, value_enum)]
    pub atmospheric: Option<AtmosphericKind>,
    #[arg(long)]
    pub w1_devices: Option<PathBuf>,
    /// Append observations to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Stop after this many observations
    #[arg(long)]
    pub cycles: Option<u64>,
}

impl Cli {
    /// Defaults, then the config file, then flags; validated.
    pub fn station_config(&self) -> Result<StationConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => StationConfig::from_file(path)?,
            None => StationConfig::default(),
        };

        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(wind_interval) = self.wind_interval {
            config.wind_interval = wind_interval;
        }
        if let Some(pin) = self.anemometer_pin {
            config.anemometer_pin = pin;
        }
        if let Some(pin) = self.bucket_pin {
            config.bucket_pin = pin;
        }
        if let Some(radius_cm) = self.radius_cm {
            config.radius_cm = radius_cm;
        }
        if let Some(bucket_size) = self.bucket_size {
            config.bucket_size = bucket_size;
        }
        if let Some(channel) = self.adc_channel {
            config.adc_channel = channel;
        }
        if let Some(bus) = self.i2c_bus {
            config.i2c_bus = bus;
        }
        if let Some(kind) = self.atmospheric {
            config.atmospheric = kind;
        }
        if let Some(devices) = &self.w1_devices {
            config.w1_devices = devices.clone();
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
