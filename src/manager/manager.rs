use std::error::Error;
use std::time::Duration;

use log::{error, info, warn};
use rppal::gpio::Gpio;
use time::OffsetDateTime;

use super::anemometer::Anemometer;
use super::atmospheric::{AtmosphericSensor, Bme280, Bmp280Dht22, BME280_ADDRESS};
use super::clock::SystemClock;
use super::direction::WindDirection;
use super::observation::Observation;
use super::rain::RainGauge;
use super::soil::{Ds18b20, SoilThermometer};
use super::vane::{Mcp3008, WindVaneSampler};
use super::wind::WindAggregator;
use crate::config::{AtmosphericKind, StationConfig};
use crate::error::ConfigError;

/// Timing and calibration the cycle needs after startup.
#[derive(Clone, Copy, Debug)]
pub struct CycleSettings {
    pub interval: Duration,
    pub wind_interval: Duration,
    pub bucket_size: f64,
}

impl TryFrom<&StationConfig> for CycleSettings {
    type Error = ConfigError;

    fn try_from(config: &StationConfig) -> Result<CycleSettings, ConfigError> {
        let (interval, wind_interval) = config.windows()?;
        Ok(CycleSettings {
            interval,
            wind_interval,
            bucket_size: config.bucket_size,
        })
    }
}

/// Owns every sensor and builds one [`Observation`] per polling interval.
pub struct Manager {
    wind: WindAggregator,
    rain: RainGauge,
    atmospheric: Option<Box<dyn AtmosphericSensor>>,
    soil: Option<Box<dyn SoilThermometer>>,
    settings: CycleSettings,
    last_date_time: Option<i64>,
    pub current_result: Observation,
}

impl Manager {
    pub fn new(config: &StationConfig) -> Result<Manager, Box<dyn Error>> {
        let settings = CycleSettings::try_from(config)?;
        let gpio = Gpio::new()?;

        let anemometer = Anemometer::attach(&gpio, config.anemometer_pin, config.radius_cm)?;
        let rain = RainGauge::attach(&gpio, config.bucket_pin)?;
        let vane = WindVaneSampler::new(Box::new(Mcp3008::new(config.adc_channel)?));
        let wind = WindAggregator::new(anemometer, vane, Box::new(SystemClock));

        //a missing bus or probe only blanks its own fields
        let atmospheric: Option<Box<dyn AtmosphericSensor>> = match config.atmospheric {
            AtmosphericKind::Bme280 => Bme280::new(config.i2c_bus, BME280_ADDRESS)
                .map(|sensor| Box::new(sensor) as Box<dyn AtmosphericSensor>),
            AtmosphericKind::Bmp280Dht22 => Bmp280Dht22::new(config.i2c_bus)
                .map(|sensor| Box::new(sensor) as Box<dyn AtmosphericSensor>),
        }
        .map_err(|err| error!("can't open {:?} sensor: {}", config.atmospheric, err))
        .ok();

        let soil: Option<Box<dyn SoilThermometer>> = Ds18b20::discover(&config.w1_devices)
            .map(|probe| Box::new(probe) as Box<dyn SoilThermometer>)
            .map_err(|err| error!("can't open ground thermometer: {}", err))
            .ok();

        Ok(Manager::with_parts(
            wind,
            rain,
            atmospheric,
            soil,
            settings,
        ))
    }

    pub fn with_parts(
        wind: WindAggregator,
        rain: RainGauge,
        atmospheric: Option<Box<dyn AtmosphericSensor>>,
        soil: Option<Box<dyn SoilThermometer>>,
        settings: CycleSettings,
    ) -> Manager {
        Manager {
            wind,
            rain,
            atmospheric,
            soil,
            settings,
            last_date_time: None,
            current_result: Observation::default(),
        }
    }

    /// Runs one full polling interval and returns the finished record.
    pub fn collect(&mut self) -> Observation {
        self.current_result = Observation::new(0);

        self.get_wind();
        self.get_rainfall();
        self.get_atmospheric();
        self.get_soil_temperature();

        let date_time = next_date_time(self.last_date_time, OffsetDateTime::now_utc());
        self.last_date_time = Some(date_time);
        self.current_result.date_time = date_time;

        self.current_result
    }

    pub fn get_wind(&mut self) {
        match self
            .wind
            .measure(self.settings.interval, self.settings.wind_interval)
        {
            Ok(summary) => {
                let heading = summary
                    .direction
                    .map(|degrees| format!("{:.1}° {}", degrees, WindDirection::from_degrees(degrees).abbreviation()))
                    .unwrap_or_else(|| "unknown".to_string());
                info!(
                    "wind {:.2} m/s, gust {:.2} m/s, from {} over {} sub-windows",
                    summary.speed, summary.gust, heading, summary.sub_windows
                );
                self.current_result.wind_speed = Some(summary.speed);
                self.current_result.wind_gust = Some(summary.gust);
                self.current_result.wind_dir = summary.direction;
            }
            Err(err) => error!("wind measurement failed: {}", err),
        }
    }

    pub fn get_rainfall(&mut self) {
        self.current_result.rain = Some(self.rain.collect(self.settings.bucket_size));
    }

    pub fn get_atmospheric(&mut self) {
        let Some(sensor) = self.atmospheric.as_mut() else {
            return;
        };

        match sensor.read() {
            Ok(reading) => {
                self.current_result.out_humidity = Some(reading.humidity);
                self.current_result.pressure = Some(reading.pressure);
                self.current_result.out_temp = Some(reading.temperature);
            }
            Err(err) => {
                error!("something went wrong communicating with the atmospheric sensor: {}", err);
                if let Err(err) = sensor.reset() {
                    warn!("atmospheric sensor reset failed: {}", err);
                }
            }
        }
    }

    pub fn get_soil_temperature(&mut self) {
        let Some(probe) = self.soil.as_mut() else {
            return;
        };

        match probe.read() {
            Ok(celsius) => self.current_result.soil_temp1 = Some(celsius),
            Err(err) => error!("ground thermometer read failed: {}", err),
        }
    }
}

/// Unix seconds rounded to the nearest second, always after the previous record.
pub fn next_date_time(last: Option<i64>, now: OffsetDateTime) -> i64 {
    let rounded = (now + time::Duration::milliseconds(500)).unix_timestamp();
    match last {
        Some(last) if rounded <= last => last + 1,
        _ => rounded,
    }
}
