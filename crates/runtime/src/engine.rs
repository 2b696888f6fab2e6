use std::time::Duration;

use core_sim::{PortfolioSnapshot, SimConfig, TickNoise};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    broadcaster::{Broadcaster, PublishReport},
    events::{DashboardMessage, MessageError},
    shared::SharedState,
    supervisor::{ActiveLoopGuard, TaskId},
};

/// Destination for the messages a tick emits.
pub trait TickSink: Send + Sync + 'static {
    fn publish(&self, message: &DashboardMessage) -> Result<PublishReport, MessageError>;
}

impl TickSink for Broadcaster {
    fn publish(&self, message: &DashboardMessage) -> Result<PublishReport, MessageError> {
        Broadcaster::publish(self, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Published { trade_logged: bool },
    Halted,
}

/// Periodic task that drifts equity and publishes portfolio snapshots while
/// the bot is deployed.
pub struct SimulationLoop<S = Broadcaster> {
    id: TaskId,
    shared: SharedState,
    sink: S,
    noise: TickNoise,
    tick_interval: Duration,
    cancel: CancellationToken,
    tick: u64,
}

impl<S: TickSink> SimulationLoop<S> {
    pub fn new(
        id: TaskId,
        shared: SharedState,
        sink: S,
        config: &SimConfig,
        noise: TickNoise,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            shared,
            sink,
            noise,
            tick_interval: config.tick_interval(),
            cancel,
            tick: 0,
        }
    }

    pub async fn run(mut self, _active: ActiveLoopGuard) {
        info!(task = self.id.0, "simulation loop started");

        loop {
            match self.step_once().await {
                Ok(TickOutcome::Halted) => break,
                Ok(TickOutcome::Published { trade_logged }) => {
                    debug!(task = self.id.0, tick = self.tick, trade_logged, "tick published");
                }
                Err(err) => {
                    error!(task = self.id.0, tick = self.tick, %err, "simulation tick failed");
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.tick_interval) => {}
            }
        }

        info!(task = self.id.0, ticks = self.tick, "simulation loop stopped");
    }

    /// Runs one tick with the state lock held for the whole read-modify-publish.
    pub async fn step_once(&mut self) -> Result<TickOutcome, MessageError> {
        let mut slot = self.shared.lock().await;
        if self.cancel.is_cancelled() || !slot.bot.is_deployed {
            return Ok(TickOutcome::Halted);
        }

        self.tick += 1;
        slot.bot.apply_drift(self.noise.next_drift());

        let update = DashboardMessage::portfolio_update(PortfolioSnapshot::from_state(&slot.bot));
        self.sink.publish(&update)?;

        let trade_logged = match self.noise.next_trade_units() {
            Some(units) => {
                self.sink.publish(&DashboardMessage::simulated_buy(units)?)?;
                true
            }
            None => false,
        };

        Ok(TickOutcome::Published { trade_logged })
    }
}
