use std::time::Duration;

use log::{debug, warn};

use super::anemometer::Anemometer;
use super::clock::Clock;
use super::direction::circular_mean;
use super::vane::WindVaneSampler;
use crate::error::WindError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindSummary {
    /// Mean of the sub-window speeds, m/s.
    pub speed: f64,
    /// Highest sub-window speed, m/s.
    pub gust: f64,
    /// Circular mean of every vane sample; `None` when undefined.
    pub direction: Option<f64>,
    pub sub_windows: usize,
}

/// Per-interval accumulation, dropped once the summary is built.
#[derive(Default)]
struct WindAggregationState {
    speeds: Vec<f64>,
    directions: Vec<f64>,
}

impl WindAggregationState {
    fn summarize(self) -> Result<WindSummary, WindError> {
        let gust = self
            .speeds
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or(WindError::NoSpeedSamples)?;
        let speed = self.speeds.iter().sum::<f64>() / self.speeds.len() as f64;

        let direction = if self.directions.is_empty() {
            warn!("no vane reading matched the voltage table, wind direction unknown");
            None
        } else {
            let mean = circular_mean(&self.directions);
            if mean.is_none() {
                warn!(
                    "wind direction undefined: {} vane samples cancel out",
                    self.directions.len()
                );
            }
            mean
        };

        Ok(WindSummary {
            speed,
            gust,
            direction,
            sub_windows: self.speeds.len(),
        })
    }
}

pub struct WindAggregator {
    anemometer: Anemometer,
    vane: WindVaneSampler,
    clock: Box<dyn Clock>,
}

impl WindAggregator {
    pub fn new(anemometer: Anemometer, vane: WindVaneSampler, clock: Box<dyn Clock>) -> WindAggregator {
        WindAggregator {
            anemometer,
            vane,
            clock,
        }
    }

    /// Runs back-to-back `sub_window` speed measurements until `interval` has
    /// passed, sampling the vane throughout.
    pub fn measure(&mut self, interval: Duration, sub_window: Duration) -> Result<WindSummary, WindError> {
        if sub_window.is_zero() {
            return Err(WindError::EmptySubWindow);
        }

        let mut state = WindAggregationState::default();
        let start = self.clock.now();

        while self.clock.now().duration_since(start) < interval {
            self.anemometer.reset();
            let before = state.directions.len();
            self.vane
                .sample_window_into(self.clock.as_ref(), sub_window, &mut state.directions);

            let speed = self.anemometer.take_speed(sub_window);
            debug!(
                "sub-window {}: {:.2} m/s, {} vane samples",
                state.speeds.len() + 1,
                speed,
                state.directions.len() - before
            );
            state.speeds.push(speed);
        }

        state.summarize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::anemometer::calculate_speed;
    use crate::manager::clock::tests::ManualClock;
    use crate::manager::vane::tests::ScriptedVane;

    /// Vane polls are 100ms, so a 1s sub-window is 10 sleeps.
    const TICKS_PER_SECOND: u64 = 10;

    fn aggregator(volts: &[f64], pulses_per_second: u64) -> WindAggregator {
        let anemometer = Anemometer::detached(9.0);
        let counter = anemometer.counter();
        let clock = ManualClock::with_hook(move |tick| {
            if tick % TICKS_PER_SECOND < pulses_per_second {
                counter.increment();
            }
        });
        let vane = WindVaneSampler::new(Box::new(ScriptedVane::new(volts)));
        WindAggregator::new(anemometer, vane, Box::new(clock))
    }

    #[test]
    fn two_sub_windows_with_four_pulses_each() {
        let mut wind = aggregator(&[0.4, 1.4], 4);
        let summary = wind
            .measure(Duration::from_secs(2), Duration::from_secs(1))
            .unwrap();

        let expected = calculate_speed(4, 1.0, 9.0);
        let bearings: Vec<f64> = [0.0, 22.5].iter().copied().cycle().take(20).collect();

        assert_eq!(summary.sub_windows, 2);
        assert!((summary.speed - expected).abs() < 1e-12);
        assert!((summary.gust - expected).abs() < 1e-12);
        let direction = summary.direction.unwrap();
        assert!((direction - circular_mean(&bearings).unwrap()).abs() < 1e-9);
        assert!((direction - 11.25).abs() < 1e-9);
    }

    #[test]
    fn runs_interval_over_sub_window_iterations() {
        let mut wind = aggregator(&[0.4], 2);
        let summary = wind
            .measure(Duration::from_secs(60), Duration::from_secs(5))
            .unwrap();
        assert_eq!(summary.sub_windows, 12);
    }

    #[test]
    fn gust_is_the_fastest_sub_window() {
        let anemometer = Anemometer::detached(9.0);
        let counter = anemometer.counter();
        //one pulse per tick in the first second only
        let clock = ManualClock::with_hook(move |tick| {
            if tick < TICKS_PER_SECOND {
                counter.increment();
            }
        });
        let vane = WindVaneSampler::new(Box::new(ScriptedVane::new(&[2.7])));
        let mut wind = WindAggregator::new(anemometer, vane, Box::new(clock));

        let summary = wind
            .measure(Duration::from_secs(3), Duration::from_secs(1))
            .unwrap();
        let fastest = calculate_speed(10, 1.0, 9.0);

        assert_eq!(summary.sub_windows, 3);
        assert!((summary.gust - fastest).abs() < 1e-12);
        assert!((summary.speed - fastest / 3.0).abs() < 1e-12);
        assert!((summary.direction.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn cancelling_bearings_keep_speed() {
        //0.4V is north, 1.8V is south
        let mut wind = aggregator(&[0.4, 1.8], 3);
        let summary = wind
            .measure(Duration::from_secs(1), Duration::from_secs(1))
            .unwrap();
        assert_eq!(summary.direction, None);
        assert!((summary.speed - calculate_speed(3, 1.0, 9.0)).abs() < 1e-12);
    }

    #[test]
    fn no_matching_vane_samples() {
        let mut wind = aggregator(&[1.55], 0);
        let summary = wind
            .measure(Duration::from_secs(2), Duration::from_secs(1))
            .unwrap();
        assert_eq!(summary.direction, None);
        assert_eq!(summary.gust, 0.0);
        assert_eq!(summary.speed, 0.0);
    }

    #[test]
    fn zero_sub_window_is_refused() {
        let mut wind = aggregator(&[0.4], 4);
        let result = wind.measure(Duration::from_secs(2), Duration::ZERO);
        assert_eq!(result, Err(WindError::EmptySubWindow));
    }

    #[test]
    fn empty_interval_has_no_speed() {
        let mut wind = aggregator(&[0.4], 0);
        let result = wind.measure(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(result, Err(WindError::NoSpeedSamples));
    }
}
