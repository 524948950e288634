use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::SensorError;

pub trait SoilThermometer {
    /// °C
    fn read(&mut self) -> Result<f64, SensorError>;
}

pub const W1_DEVICES: &str = "/sys/bus/w1/devices";

const DS18B20_FAMILY: &str = "28-";
const READ_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// DS18B20 probe exposed by the Linux `w1_therm` driver.
pub struct Ds18b20 {
    device_file: PathBuf,
}

impl Ds18b20 {
    /// Picks the first DS18B20 found under `devices`.
    pub fn discover(devices: &Path) -> Result<Ds18b20, SensorError> {
        let mut probes: Vec<PathBuf> = fs::read_dir(devices)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(DS18B20_FAMILY))
            .map(|entry| entry.path())
            .collect();
        probes.sort();

        match probes.into_iter().next() {
            Some(probe) => Ok(Ds18b20 {
                device_file: probe.join("w1_slave"),
            }),
            None => Err(SensorError::ProbeMissing(devices.to_path_buf())),
        }
    }
}

impl SoilThermometer for Ds18b20 {
    fn read(&mut self) -> Result<f64, SensorError> {
        for attempt in 1..=READ_ATTEMPTS {
            if let Some(celsius) = parse_w1_slave(&fs::read_to_string(&self.device_file)?)? {
                return Ok(celsius);
            }
            if attempt < READ_ATTEMPTS {
                thread::sleep(RETRY_DELAY);
            }
        }
        Err(SensorError::NotReady(READ_ATTEMPTS))
    }
}

/// `Ok(None)` when the driver reports a CRC mismatch and the read should be retried.
pub fn parse_w1_slave(text: &str) -> Result<Option<f64>, SensorError> {
    let mut lines = text.lines();
    let crc = lines
        .next()
        .ok_or_else(|| SensorError::Malformed(text.to_string()))?;
    if !crc.trim_end().ends_with("YES") {
        return Ok(None);
    }

    let data = lines
        .next()
        .ok_or_else(|| SensorError::Malformed(text.to_string()))?;
    let (_, millis) = data
        .split_once("t=")
        .ok_or_else(|| SensorError::Malformed(data.to_string()))?;
    let millis: i64 = millis
        .trim()
        .parse()
        .map_err(|_| SensorError::Malformed(data.to_string()))?;

    Ok(Some(millis as f64 / 1000.0))
}
