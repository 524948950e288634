use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use rppal::gpio::Gpio;

use super::counter::{PulseCounter, PulseTrigger};
use crate::error::SensorError;

/// Two falling edges per cup rotation.
const EDGES_PER_ROTATION: f64 = 2.0;
/// Empirical factor between cup speed and true wind speed.
const ANEMOMETER_FACTOR: f64 = 1.18;
const CM_PER_KM: f64 = 100_000.0;
const SECS_PER_HOUR: f64 = 3600.0;
const KMH_PER_MS: f64 = 3.6;

pub struct Anemometer {
    counter: Arc<PulseCounter>,
    radius_cm: f64,
    _trigger: Option<PulseTrigger>,
}

impl Anemometer {
    pub fn attach(gpio: &Gpio, pin: u8, radius_cm: f64) -> Result<Anemometer, SensorError> {
        let counter = Arc::new(PulseCounter::new());
        let trigger = PulseTrigger::attach(gpio, pin, counter.clone())?;
        Ok(Anemometer {
            counter,
            radius_cm,
            _trigger: Some(trigger),
        })
    }

    /// Anemometer without a GPIO source; pulses are fed through [`Anemometer::counter`].
    pub fn detached(radius_cm: f64) -> Anemometer {
        Anemometer {
            counter: Arc::new(PulseCounter::new()),
            radius_cm,
            _trigger: None,
        }
    }

    pub fn counter(&self) -> Arc<PulseCounter> {
        self.counter.clone()
    }

    pub fn reset(&self) {
        self.counter.reset();
    }

    /// Speed in m/s over `window`, consuming the pulses counted so far.
    pub fn take_speed(&self, window: Duration) -> f64 {
        calculate_speed(self.counter.take(), window.as_secs_f64(), self.radius_cm)
    }
}

/// Wind speed in m/s for `pulses` edges seen over `time_sec` seconds.
pub fn calculate_speed(pulses: u64, time_sec: f64, radius_cm: f64) -> f64 {
    let time_hour = time_sec / SECS_PER_HOUR;
    let circumference_cm = 2.0 * PI * radius_cm;
    let rotations = pulses as f64 / EDGES_PER_ROTATION;
    let dist_km = circumference_cm * rotations / CM_PER_KM;
    let speed_kmh = dist_km / time_hour;

    speed_kmh * ANEMOMETER_FACTOR / KMH_PER_MS
}
