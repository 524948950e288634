use std::time::Duration;

use log::debug;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use super::clock::Clock;
use crate::error::SensorError;

/// Full-scale voltage of the vane's resistor network.
pub const REFERENCE_VOLTAGE: f64 = 3.3;

/// Time between two vane reads.
pub const VANE_POLL: Duration = Duration::from_millis(100);

/// Vane output in tenths of a volt mapped to a bearing in degrees.
const VANE_VOLTAGE_MAP: [(i64, f64); 16] = [
    (4, 0.0),
    (14, 22.5),
    (12, 45.0),
    (28, 67.5),
    (27, 90.0),
    (29, 112.5),
    (22, 135.0),
    (25, 157.5),
    (18, 180.0),
    (20, 202.5),
    (7, 225.0),
    (8, 247.5),
    (1, 270.0),
    (3, 292.5),
    (2, 315.0),
    (6, 337.5),
];

/// Rounds `volts` to one decimal and looks it up in the vane table.
///
/// Only exact matches count. Readings between table entries return `None` and
/// are dropped by the sampler.
pub fn bearing_for_voltage(volts: f64) -> Option<f64> {
    let tenths = (volts * 10.0).round() as i64;
    VANE_VOLTAGE_MAP
        .iter()
        .find(|(key, _)| *key == tenths)
        .map(|(_, bearing)| *bearing)
}

/// Source of the raw vane level, normalized to 0.0..=1.0.
pub trait AnalogVaneInput {
    fn read(&mut self) -> Result<f64, SensorError>;
}

/// MCP3008 10-bit ADC on SPI0.
pub struct Mcp3008 {
    spi: Spi,
    channel: u8,
}

impl Mcp3008 {
    pub fn new(channel: u8) -> Result<Mcp3008, SensorError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, 1_000_000, Mode::Mode0)?;
        Ok(Mcp3008 {
            spi,
            channel: channel & 0x07,
        })
    }
}

impl AnalogVaneInput for Mcp3008 {
    fn read(&mut self) -> Result<f64, SensorError> {
        //start bit, single-ended mode + channel, padding
        let request = [0x01, (0x08 | self.channel) << 4, 0x00];
        let mut response = [0u8; 3];
        self.spi.transfer(&mut response, &request)?;

        let raw = (u16::from(response[1] & 0x03) << 8) | u16::from(response[2]);
        Ok(f64::from(raw) / 1023.0)
    }
}

pub struct WindVaneSampler {
    input: Box<dyn AnalogVaneInput>,
}

impl WindVaneSampler {
    pub fn new(input: Box<dyn AnalogVaneInput>) -> WindVaneSampler {
        WindVaneSampler { input }
    }

    /// One read: scaled to volts and mapped to a bearing, if it matches the table.
    pub fn sample(&mut self) -> Option<f64> {
        match self.input.read() {
            Ok(level) => bearing_for_voltage(level * REFERENCE_VOLTAGE),
            Err(err) => {
                debug!("vane read failed: {}", err);
                None
            }
        }
    }

    /// Samples every [`VANE_POLL`] until `duration` has passed since the call.
    pub fn sample_window(&mut self, clock: &dyn Clock, duration: Duration) -> Vec<f64> {
        let mut bearings = Vec::new();
        self.sample_window_into(clock, duration, &mut bearings);
        bearings
    }

    pub fn sample_window_into(&mut self, clock: &dyn Clock, duration: Duration, bearings: &mut Vec<f64>) {
        let start = clock.now();
        while clock.now().duration_since(start) < duration {
            if let Some(bearing) = self.sample() {
                bearings.push(bearing);
            }
            clock.sleep(VANE_POLL);
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::manager::clock::tests::ManualClock;

    /// Replays a fixed list of voltages, cycling forever.
    pub struct ScriptedVane {
        volts: Vec<f64>,
        next: usize,
    }

    impl ScriptedVane {
        pub fn new(volts: &[f64]) -> ScriptedVane {
            ScriptedVane {
                volts: volts.to_vec(),
                next: 0,
            }
        }
    }

    impl AnalogVaneInput for ScriptedVane {
        fn read(&mut self) -> Result<f64, SensorError> {
            let volts = self.volts[self.next % self.volts.len()];
            self.next += 1;
            if volts < 0.0 {
                return Err(SensorError::Bus("scripted failure".into()));
            }
            Ok(volts / REFERENCE_VOLTAGE)
        }
    }

    #[test]
    fn exact_table_entries_map() {
        assert_eq!(bearing_for_voltage(0.4), Some(0.0));
        assert_eq!(bearing_for_voltage(1.4), Some(22.5));
        assert_eq!(bearing_for_voltage(0.6), Some(337.5));
        assert_eq!(bearing_for_voltage(0.43), Some(0.0));
    }

    #[test]
    fn unmatched_voltages_are_dropped() {
        assert_eq!(bearing_for_voltage(1.55), None);
        assert_eq!(bearing_for_voltage(1.5), None);
        assert_eq!(bearing_for_voltage(3.3), None);
        assert_eq!(bearing_for_voltage(0.0), None);
    }

    #[test]
    fn window_keeps_only_mapped_samples() {
        let clock = ManualClock::new();
        let vane = ScriptedVane::new(&[0.4, 1.55, 1.4, -1.0]);
        let mut sampler = WindVaneSampler::new(Box::new(vane));

        let bearings = sampler.sample_window(&clock, Duration::from_secs(1));

        //10 reads at 100ms, every other one maps
        assert_eq!(bearings, vec![0.0, 22.5, 0.0, 22.5, 0.0]);
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn window_may_be_empty() {
        let clock = ManualClock::new();
        let mut sampler = WindVaneSampler::new(Box::new(ScriptedVane::new(&[1.55])));
        assert!(sampler.sample_window(&clock, Duration::from_millis(500)).is_empty());
    }
}
