use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use bme280::i2c::BME280;
use bmp280::{Bmp280, Bmp280Builder};
use log::debug;
use rppal::hal::Delay;
use rppal::i2c::I2c;

use crate::error::SensorError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphericReading {
    /// %RH
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// °C
    pub temperature: f64,
}

impl AtmosphericReading {
    /// From the driver's units: °C, Pa, %RH.
    pub fn from_pascals(temperature: f32, pressure_pa: f32, humidity: f32) -> AtmosphericReading {
        AtmosphericReading {
            humidity: f64::from(humidity),
            pressure: f64::from(pressure_pa) / 100.0,
            temperature: f64::from(temperature),
        }
    }
}

impl<E> From<bme280::Measurements<E>> for AtmosphericReading {
    fn from(m: bme280::Measurements<E>) -> Self {
        AtmosphericReading::from_pascals(m.temperature, m.pressure, m.humidity)
    }
}

pub trait AtmosphericSensor {
    fn read(&mut self) -> Result<AtmosphericReading, SensorError>;
    fn reset(&mut self) -> Result<(), SensorError>;
}

pub const BME280_ADDRESS: u8 = 0x77;

const REG_SOFT_RESET: u8 = 0xe0;
const SOFT_RESET: u8 = 0xb6;

/// Bosch BME280 on the Pi's I2C bus.
pub struct Bme280 {
    bus: u8,
    address: u8,
    driver: BME280<I2c>,
    delay: Delay,
}

fn open_bme280(bus: u8, address: u8, delay: &mut Delay) -> Result<BME280<I2c>, SensorError> {
    let i2c = I2c::with_bus(bus)?;
    let mut driver = BME280::new(i2c, address);
    driver
        .init(delay)
        .map_err(|err| SensorError::Bus(format!("bme280 init: {err:?}")))?;
    Ok(driver)
}

impl Bme280 {
    pub fn new(bus: u8, address: u8) -> Result<Bme280, SensorError> {
        let mut delay = Delay::new();
        let driver = open_bme280(bus, address, &mut delay)?;
        Ok(Bme280 {
            bus,
            address,
            driver,
            delay,
        })
    }
}

impl AtmosphericSensor for Bme280 {
    fn read(&mut self) -> Result<AtmosphericReading, SensorError> {
        self.driver
            .measure(&mut self.delay)
            .map(AtmosphericReading::from)
            .map_err(|err| SensorError::Bus(format!("bme280: {err:?}")))
    }

    /// Soft reset over a fresh handle, then a new driver reloads the calibration.
    fn reset(&mut self) -> Result<(), SensorError> {
        let mut i2c = I2c::with_bus(self.bus)?;
        i2c.set_slave_address(u16::from(self.address))?;
        i2c.write(&[REG_SOFT_RESET, SOFT_RESET])?;
        thread::sleep(Duration::from_millis(5));

        self.driver = open_bme280(self.bus, self.address, &mut self.delay)?;
        debug!("bme280 reset");
        Ok(())
    }
}

/// BMP280 for temperature and pressure, DHT22 (Linux IIO driver) for humidity.
pub struct Bmp280Dht22 {
    i2c_path: String,
    controller: Bmp280,
    humidity_path: PathBuf,
}

pub const DHT22_HUMIDITY: &str = "/sys/bus/iio/devices/iio:device0/in_humidityrelative_input";

impl Bmp280Dht22 {
    pub fn new(bus: u8) -> Result<Bmp280Dht22, SensorError> {
        let i2c_path = format!("/dev/i2c-{bus}");
        let controller = build_bmp280(&i2c_path)?;
        Ok(Bmp280Dht22 {
            i2c_path,
            controller,
            humidity_path: PathBuf::from(DHT22_HUMIDITY),
        })
    }
}

fn build_bmp280(path: &str) -> Result<Bmp280, SensorError> {
    Bmp280Builder::new()
        .path(path)
        .address(0x76)
        .build()
        .map_err(|err| SensorError::Bus(format!("bmp280: {err:?}")))
}

/// Parses the milli-unit integers the IIO driver exposes.
pub fn parse_milli(text: &str) -> Result<f64, SensorError> {
    text.trim_end()
        .parse::<f64>()
        .map(|value| value / 1000.0)
        .map_err(|_| SensorError::Malformed(text.trim_end().to_string()))
}

impl AtmosphericSensor for Bmp280Dht22 {
    fn read(&mut self) -> Result<AtmosphericReading, SensorError> {
        let pressure = self
            .controller
            .pressure_kpa()
            .map_err(|err| SensorError::Bus(format!("bmp280: {err:?}")))?;
        let temperature = self
            .controller
            .temperature_celsius()
            .map_err(|err| SensorError::Bus(format!("bmp280: {err:?}")))?;
        let humidity = parse_milli(&std::fs::read_to_string(&self.humidity_path)?)?;

        Ok(AtmosphericReading {
            humidity,
            pressure: f64::from(pressure) * 10.0,
            temperature: f64::from(temperature),
        })
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.controller = build_bmp280(&self.i2c_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_units_become_hectopascals() {
        let reading = AtmosphericReading::from_pascals(18.25, 101_325.0, 47.5);
        assert_eq!(reading.temperature, 18.25);
        assert!((reading.pressure - 1013.25).abs() < 1e-9);
        assert_eq!(reading.humidity, 47.5);
    }

    #[test]
    fn iio_milli_values() {
        assert_eq!(parse_milli("45300\n").unwrap(), 45.3);
        assert!(parse_milli("nope").is_err());
    }
}
