use std::sync::Arc;

use api::AppState;
use axum::{routing::get, Router};
use core_sim::SimConfig;
use oracle::{GeminiAgent, RuleBasedAgent, SignalService};
use runtime::{Broadcaster, ControlService, SharedState};

use crate::config::{Config, SignalAgentMode};

pub fn build_state(config: &Config) -> AppState {
    let control = ControlService::new(
        SharedState::new(),
        Broadcaster::new(config.subscriber_queue),
        SimConfig::default().with_tick_interval_ms(config.tick_interval_ms),
    );

    AppState::from_parts(control, build_signals(config), config.send_timeout)
}

fn build_signals(config: &Config) -> SignalService {
    match (config.signal_agent, config.google_api_key.as_deref()) {
        (SignalAgentMode::Rules, _) => SignalService::new(Arc::new(RuleBasedAgent)),
        (SignalAgentMode::Gemini, Some(api_key)) => SignalService::new(Arc::new(
            GeminiAgent::new(api_key, config.gemini_model.as_str()),
        )),
        (SignalAgentMode::Gemini, None) | (SignalAgentMode::Off, _) => SignalService::unavailable(),
    }
}

pub fn build_app(state: AppState) -> Router {
    api::app(state).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
