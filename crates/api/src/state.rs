use std::{sync::Arc, time::Duration};

use core_sim::SimConfig;
use oracle::{RuleBasedAgent, SignalService};
use runtime::{Broadcaster, ControlService, SharedState};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct AppState {
    control: ControlService,
    signals: SignalService,
    send_timeout: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_parts(
            ControlService::new(
                SharedState::new(),
                Broadcaster::default(),
                SimConfig::default(),
            ),
            SignalService::new(Arc::new(RuleBasedAgent)),
            DEFAULT_SEND_TIMEOUT,
        )
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        control: ControlService,
        signals: SignalService,
        send_timeout: Duration,
    ) -> Self {
        Self {
            control,
            signals,
            send_timeout,
        }
    }

    pub fn control(&self) -> &ControlService {
        &self.control
    }

    pub fn signals(&self) -> &SignalService {
        &self.signals
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        self.control.broadcaster()
    }

    /// Upper bound on a single WebSocket send before the subscriber is dropped.
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    #[cfg(test)]
    pub(crate) fn with_tick_interval_for_test(tick_interval_ms: u64) -> Self {
        Self::from_parts(
            ControlService::new(
                SharedState::new(),
                Broadcaster::default(),
                SimConfig::default().with_tick_interval_ms(tick_interval_ms),
            ),
            SignalService::new(Arc::new(RuleBasedAgent)),
            DEFAULT_SEND_TIMEOUT,
        )
    }

    #[cfg(test)]
    pub(crate) fn without_agent_for_test() -> Self {
        let state = Self::default();
        Self::from_parts(state.control, SignalService::unavailable(), state.send_timeout)
    }
}
