use std::ops::RangeInclusive;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::SimConfig;

/// Randomness consumed by one simulation loop: equity drift and cosmetic
/// trade executions.
#[derive(Debug, Clone)]
pub struct TickNoise {
    rng: StdRng,
    drift_min: f64,
    drift_max: f64,
    trade_log_probability: f64,
    trade_units: RangeInclusive<u32>,
}

impl TickNoise {
    pub fn from_entropy(config: &SimConfig) -> Self {
        Self::with_rng(StdRng::from_entropy(), config)
    }

    pub fn seeded(seed: u64, config: &SimConfig) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }

    fn with_rng(rng: StdRng, config: &SimConfig) -> Self {
        assert!(
            config.drift_min.is_finite()
                && config.drift_max.is_finite()
                && config.drift_min < config.drift_max,
            "drift bounds must be finite and ordered"
        );
        assert!(
            (0.0..=1.0).contains(&config.trade_log_probability),
            "trade_log_probability must be within 0..=1"
        );
        assert!(
            !config.trade_units.is_empty(),
            "trade_units must not be empty"
        );

        Self {
            rng,
            drift_min: config.drift_min,
            drift_max: config.drift_max,
            trade_log_probability: config.trade_log_probability,
            trade_units: config.trade_units.clone(),
        }
    }

    pub fn next_drift(&mut self) -> f64 {
        self.rng.gen_range(self.drift_min..self.drift_max)
    }

    /// Returns the unit count of a simulated trade, if one happens this tick.
    pub fn next_trade_units(&mut self) -> Option<u32> {
        if self.rng.gen_bool(self.trade_log_probability) {
            Some(self.rng.gen_range(self.trade_units.clone()))
        } else {
            None
        }
    }
}
