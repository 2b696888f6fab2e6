use std::{ops::RangeInclusive, time::Duration};

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub tick_interval_ms: u64,
    pub drift_min: f64,
    pub drift_max: f64,
    pub trade_log_probability: f64,
    pub trade_units: RangeInclusive<u32>,
}

impl SimConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        // Upside is intentionally wider than downside.
        Self {
            tick_interval_ms: 1_000,
            drift_min: -0.0005,
            drift_max: 0.0007,
            trade_log_probability: 0.1,
            trade_units: 1..=5,
        }
    }
}
