use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("bot is already deployed")]
    AlreadyDeployed,
    #[error("bot is not deployed")]
    NotDeployed,
}

/// Volatile portfolio state for the single simulated bot.
///
/// `pnl` is derived from `equity - total_external_funding` whenever the
/// simulation moves equity. A redeploy overwrites the funding and equity
/// fields but leaves `pnl` and `reinvested_profit` as they were until the
/// next tick recomputes them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotState {
    pub is_deployed: bool,
    pub equity: f64,
    pub pnl: f64,
    pub initial_funding: f64,
    pub total_external_funding: f64,
    pub reinvested_profit: f64,
}

impl BotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploy(
        &mut self,
        initial_funding: f64,
        additional_capital: f64,
    ) -> Result<(), ControlError> {
        if self.is_deployed {
            return Err(ControlError::AlreadyDeployed);
        }

        self.is_deployed = true;
        self.initial_funding = initial_funding;
        self.total_external_funding = initial_funding + additional_capital;
        self.equity = self.total_external_funding;
        Ok(())
    }

    pub fn halt(&mut self) -> Result<(), ControlError> {
        if !self.is_deployed {
            return Err(ControlError::NotDeployed);
        }

        self.is_deployed = false;
        Ok(())
    }

    /// Adds external capital and returns the new funding total.
    ///
    /// Negative amounts are accepted and withdraw from both funding and equity.
    pub fn inject(&mut self, amount: f64) -> Result<f64, ControlError> {
        if !self.is_deployed {
            return Err(ControlError::NotDeployed);
        }

        self.total_external_funding += amount;
        self.equity += amount;
        Ok(self.total_external_funding)
    }

    /// Applies one multiplicative market move. Empty portfolios do not drift.
    pub fn apply_drift(&mut self, drift: f64) -> bool {
        if self.equity <= 0.0 {
            return false;
        }

        self.equity *= 1.0 + drift;
        self.recompute_pnl();
        true
    }

    pub fn recompute_pnl(&mut self) {
        self.pnl = self.equity - self.total_external_funding;
    }
}

#[cfg(test)]
mod tests {
    use super::{BotState, ControlError};

    #[test]
    fn deploy_sets_funding_and_equity() {
        let mut state = BotState::new();

        state.deploy(1000.0, 500.0).unwrap();

        assert!(state.is_deployed);
        assert_eq!(state.initial_funding, 1000.0);
        assert_eq!(state.total_external_funding, 1500.0);
        assert_eq!(state.equity, 1500.0);
    }

    #[test]
    fn deploy_twice_is_rejected_without_mutation() {
        let mut state = BotState::new();
        state.deploy(1000.0, 0.0).unwrap();
        let before = state;

        let result = state.deploy(5.0, 5.0);

        assert_eq!(result, Err(ControlError::AlreadyDeployed));
        assert_eq!(state, before);
    }

    #[test]
    fn inject_requires_deployment() {
        let mut state = BotState::new();

        assert_eq!(state.inject(250.0), Err(ControlError::NotDeployed));
        assert_eq!(state.equity, 0.0);
        assert_eq!(state.total_external_funding, 0.0);
    }

    #[test]
    fn inject_moves_funding_and_equity_together() {
        let mut state = BotState::new();
        state.deploy(1000.0, 0.0).unwrap();

        let total = state.inject(250.0).unwrap();

        assert_eq!(total, 1250.0);
        assert_eq!(state.equity, 1250.0);
    }

    #[test]
    fn negative_injection_withdraws() {
        let mut state = BotState::new();
        state.deploy(1000.0, 0.0).unwrap();

        state.inject(-400.0).unwrap();

        assert_eq!(state.total_external_funding, 600.0);
        assert_eq!(state.equity, 600.0);
    }

    #[test]
    fn halt_requires_deployment() {
        let mut state = BotState::new();

        assert_eq!(state.halt(), Err(ControlError::NotDeployed));
    }

    #[test]
    fn drift_recomputes_pnl() {
        let mut state = BotState::new();
        state.deploy(1000.0, 0.0).unwrap();

        assert!(state.apply_drift(0.01));

        assert!((state.equity - 1010.0).abs() < 1e-9);
        assert!((state.pnl - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_equity_does_not_drift() {
        let mut state = BotState::new();
        state.deploy(0.0, 0.0).unwrap();
        state.pnl = 3.0;

        assert!(!state.apply_drift(0.01));
        assert_eq!(state.pnl, 3.0);
    }

    #[test]
    fn redeploy_keeps_stale_pnl_until_next_tick() {
        let mut state = BotState::new();
        state.deploy(1000.0, 0.0).unwrap();
        state.apply_drift(0.1);
        state.halt().unwrap();

        state.deploy(200.0, 0.0).unwrap();

        assert_eq!(state.equity, 200.0);
        assert!((state.pnl - 100.0).abs() < 1e-9);
    }
}
