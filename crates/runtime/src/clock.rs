//! Unified clock
//!
//! Cycle counting is the core state; simulated time is derived as
//! `start_time + cycle_count * cycle_time`. The clock also decides which
//! cycles downstream exporters should sample and, in realtime mode,
//! paces the loop by sleeping away whatever budget the cycle left over.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::error::ConfigError;
use crate::types::ClockMode;

/// Fraction of the cycle budget beyond which execution time is warned about.
pub const EXECUTION_TIME_WARNING_THRESHOLD: f64 = 0.6;

/// Clock configuration
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Tick period in seconds.
    pub cycle_time: f64,
    /// Simulated-time anchor, epoch seconds.
    pub start_time: f64,
    pub mode: ClockMode,
    /// Sampling interval in seconds; absent means every cycle samples.
    pub sample_interval: Option<f64>,
    /// strftime pattern for `time_str`; absent means RFC 3339.
    pub time_format: Option<String>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cycle_time: 0.5,
            start_time: 0.0,
            mode: ClockMode::Generator,
            sample_interval: None,
            time_format: None,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_time <= 0.0 {
            return Err(ConfigError::InvalidClock(format!(
                "cycle_time must be positive, got {}",
                self.cycle_time
            )));
        }
        if let Some(interval) = self.sample_interval {
            if interval < self.cycle_time {
                return Err(ConfigError::InvalidClock(format!(
                    "sample_interval ({interval}) must be >= cycle_time ({})",
                    self.cycle_time
                )));
            }
        }
        Ok(())
    }
}

/// One tick's worth of clock outputs.
#[derive(Debug, Clone)]
pub struct ClockTick {
    pub cycle_count: u64,
    pub need_sample: bool,
    pub time_str: String,
}

/// The engine's clock.
#[derive(Debug)]
pub struct Clock {
    config: ClockConfig,
    cycle_count: u64,
    /// Wall-clock start of the current cycle, set by `tick`.
    cycle_started: Option<Instant>,
}

impl Clock {
    pub fn new(config: ClockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            cycle_time = config.cycle_time,
            mode = %config.mode,
            start_time = config.start_time,
            sample_interval = ?config.sample_interval,
            "clock initialized"
        );
        Ok(Self {
            config,
            cycle_count: 0,
            cycle_started: None,
        })
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn cycle_time(&self) -> f64 {
        self.config.cycle_time
    }

    pub fn mode(&self) -> ClockMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: ClockMode) {
        self.config.mode = mode;
    }

    /// Simulated time of the current cycle.
    pub fn sim_time(&self) -> f64 {
        self.config.start_time + self.cycle_count as f64 * self.config.cycle_time
    }

    /// Advance one cycle: bump the counter, record the wall-clock cycle
    /// start, decide sampling and format the time label.
    ///
    /// Sampling marks the first cycle of each `sample_interval` window:
    /// `((cycle_count - 1) * cycle_time) mod sample_interval < cycle_time / 2`.
    pub fn tick(&mut self) -> ClockTick {
        self.cycle_started = Some(Instant::now());
        self.cycle_count += 1;

        let need_sample = match self.config.sample_interval {
            None => true,
            Some(interval) => {
                let elapsed = (self.cycle_count - 1) as f64 * self.config.cycle_time;
                elapsed.rem_euclid(interval) < self.config.cycle_time / 2.0
            }
        };

        ClockTick {
            cycle_count: self.cycle_count,
            need_sample,
            time_str: self.format_time(self.sim_time()),
        }
    }

    fn format_time(&self, sim_time: f64) -> String {
        let secs = sim_time.floor();
        let nanos = ((sim_time - secs) * 1e9).round() as u32;
        match DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999)) {
            Some(dt) => match &self.config.time_format {
                Some(pattern) => dt.format(pattern).to_string(),
                None => dt.to_rfc3339(),
            },
            None => format!("{sim_time:.3}"),
        }
    }

    /// Sleep away the rest of the cycle budget. Realtime mode only; the
    /// 60% warning is advisory and cycles are never dropped. An overrun
    /// pushes the next tick later by the overrun amount.
    pub fn sleep_remaining(&mut self, cancel: &CancelToken) {
        if self.config.mode != ClockMode::Realtime {
            return;
        }
        let Some(started) = self.cycle_started else {
            return;
        };
        let elapsed = started.elapsed().as_secs_f64();
        let cycle_time = self.config.cycle_time;

        if elapsed > EXECUTION_TIME_WARNING_THRESHOLD * cycle_time {
            warn!(
                cycle_count = self.cycle_count,
                elapsed,
                cycle_time,
                "cycle execution exceeded 60% of the cycle budget"
            );
        }
        if elapsed >= cycle_time {
            warn!(
                cycle_count = self.cycle_count,
                elapsed,
                cycle_time,
                "no remaining budget, skipping sleep"
            );
            return;
        }
        cancel.sleep(Duration::from_secs_f64(cycle_time - elapsed));
    }

    pub fn reset(&mut self, cycle_count: u64) {
        info!(cycle_count, "clock reset");
        self.cycle_count = cycle_count;
        self.cycle_started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(cycle_time: f64, sample_interval: Option<f64>) -> Clock {
        Clock::new(ClockConfig {
            cycle_time,
            sample_interval,
            ..ClockConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sim_time_advances() {
        let mut clock = clock(0.5, None);
        assert_eq!(clock.sim_time(), 0.0);
        let tick = clock.tick();
        assert_eq!(tick.cycle_count, 1);
        assert!(tick.need_sample);
        assert_eq!(clock.sim_time(), 0.5);
        clock.tick();
        assert_eq!(clock.sim_time(), 1.0);
    }

    #[test]
    fn test_sampling_decimation() {
        // cycle_time 0.5, sample_interval 2.0: every 4th cycle, starting
        // with the first.
        let mut clock = clock(0.5, Some(2.0));
        let samples: Vec<bool> = (0..8).map(|_| clock.tick().need_sample).collect();
        assert_eq!(
            samples,
            vec![true, false, false, false, true, false, false, false]
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(Clock::new(ClockConfig {
            cycle_time: 0.0,
            ..ClockConfig::default()
        })
        .is_err());
        assert!(Clock::new(ClockConfig {
            cycle_time: 1.0,
            sample_interval: Some(0.5),
            ..ClockConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_time_formatting() {
        let mut clock = Clock::new(ClockConfig {
            cycle_time: 1.0,
            start_time: 0.0,
            time_format: Some("%Y%m%d".to_string()),
            ..ClockConfig::default()
        })
        .unwrap();
        assert_eq!(clock.tick().time_str, "19700101");
    }

    #[test]
    fn test_default_format_is_rfc3339() {
        let mut clock = clock(1.0, None);
        let tick = clock.tick();
        assert!(tick.time_str.starts_with("1970-01-01T00:00:01"));
    }

    #[test]
    fn test_reset() {
        let mut clock = clock(1.0, None);
        clock.tick();
        clock.tick();
        clock.reset(0);
        assert_eq!(clock.cycle_count(), 0);
        assert_eq!(clock.sim_time(), 0.0);
    }
}
