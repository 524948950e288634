use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use rppal::gpio::{Gpio, InputPin, Level, Trigger};

use crate::error::SensorError;

/// Edge counter shared between an interrupt callback and the polling loop.
///
/// Reads that also reset go through a single atomic swap, so an edge landing
/// between "read" and "reset" is carried into the next window instead of lost.
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU64,
}

impl PulseCounter {
    pub fn new() -> PulseCounter {
        PulseCounter {
            count: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    /// Returns the pulses since the last reset and zeroes the counter atomically.
    pub fn take(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }
}

/// A debounced-by-hardware digital input feeding a [`PulseCounter`].
///
/// The pin must stay alive for the interrupt to keep firing, so the trigger owns it.
pub struct PulseTrigger {
    _pin: InputPin,
}

impl PulseTrigger {
    pub fn attach(gpio: &Gpio, pin: u8, counter: Arc<PulseCounter>) -> Result<PulseTrigger, SensorError> {
        let mut input = gpio.get(pin)?.into_input_pullup();

        //contact closes to ground, so a press is the falling edge
        input.set_async_interrupt(Trigger::FallingEdge, move |level: Level| {
            if level == Level::Low {
                counter.increment();
            }
        })?;
        debug!("pulse trigger attached on gpio {}", pin);

        Ok(PulseTrigger { _pin: input })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn take_returns_count_and_resets() {
        let counter = PulseCounter::new();
        for _ in 0..7 {
            counter.increment();
        }
        assert_eq!(counter.count(), 7);
        assert_eq!(counter.take(), 7);
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.take(), 0);
    }

    #[test]
    fn concurrent_increments_are_never_lost() {
        let counter = Arc::new(PulseCounter::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    counter.increment();
                }
            }));
        }

        let mut taken = 0;
        for _ in 0..100 {
            taken += counter.take();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        taken += counter.take();

        assert_eq!(taken, 40_000);
    }
}
