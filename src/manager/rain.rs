use std::sync::Arc;

use rppal::gpio::Gpio;

use super::counter::{PulseCounter, PulseTrigger};
use crate::error::SensorError;

/// Tipping-bucket rain gauge.
pub struct RainGauge {
    counter: Arc<PulseCounter>,
    _trigger: Option<PulseTrigger>,
}

impl RainGauge {
    pub fn attach(gpio: &Gpio, pin: u8) -> Result<RainGauge, SensorError> {
        let counter = Arc::new(PulseCounter::new());
        let trigger = PulseTrigger::attach(gpio, pin, counter.clone())?;
        Ok(RainGauge {
            counter,
            _trigger: Some(trigger),
        })
    }

    pub fn detached() -> RainGauge {
        RainGauge {
            counter: Arc::new(PulseCounter::new()),
            _trigger: None,
        }
    }

    pub fn tip(&self) {
        self.counter.increment();
    }

    pub fn reset(&self) {
        self.counter.reset();
    }

    /// Rain since the previous call; the tip count restarts from zero.
    pub fn collect(&self, bucket_volume: f64) -> f64 {
        self.counter.take() as f64 * bucket_volume
    }
}
