use std::sync::Arc;

use core_sim::{BotState, ControlError, SimConfig, TickNoise};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    broadcaster::Broadcaster,
    engine::SimulationLoop,
    events::{DashboardMessage, BOT_HALTED},
    shared::SharedState,
    supervisor::{LoopSupervisor, SimulationHandle},
};

/// Deploy, stop and capital commands. Each command runs under the state lock.
///
/// Lifecycle commands (deploy, stop, shutdown) are also serialized on a
/// separate lock that stays held while a stopped loop is joined, so a
/// redeploy never overlaps the loop it replaces.
#[derive(Debug, Clone)]
pub struct ControlService {
    shared: SharedState,
    broadcaster: Broadcaster,
    config: Arc<SimConfig>,
    loops: LoopSupervisor,
    lifecycle: Arc<Mutex<()>>,
}

impl ControlService {
    pub fn new(shared: SharedState, broadcaster: Broadcaster, config: SimConfig) -> Self {
        Self {
            shared,
            broadcaster,
            config: Arc::new(config),
            loops: LoopSupervisor::new(),
            lifecycle: Arc::new(Mutex::new(())),
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub async fn deploy(
        &self,
        initial_funding: f64,
        additional_capital: f64,
    ) -> Result<(), ControlError> {
        let _lifecycle = self.lifecycle.lock().await;
        let mut slot = self.shared.lock().await;
        slot.bot.deploy(initial_funding, additional_capital)?;

        let handle = self.start_loop();
        info!(
            task = handle.id().0,
            initial_funding,
            total_external_funding = slot.bot.total_external_funding,
            "bot deployed"
        );
        slot.task = Some(handle);
        Ok(())
    }

    /// Halts the bot and returns once its loop has exited.
    pub async fn stop(&self) -> Result<(), ControlError> {
        let _lifecycle = self.lifecycle.lock().await;
        let task = {
            let mut slot = self.shared.lock().await;
            slot.bot.halt()?;

            let task = slot.task.take();
            if let Some(task) = &task {
                task.cancel();
                info!(task = task.id().0, equity = slot.bot.equity, "bot stopped");
            }
            self.publish_system(BOT_HALTED);
            task
        };

        // The loop may be parked on the state lock, so join only after releasing it.
        if let Some(task) = task {
            task.cancel_and_join().await;
        }
        Ok(())
    }

    /// Adds external capital and returns the new funding total.
    pub async fn inject_capital(&self, amount: f64) -> Result<f64, ControlError> {
        let mut slot = self.shared.lock().await;
        let new_total = slot.bot.inject(amount)?;

        info!(amount, new_total, "capital injected");
        self.publish_system(format!("Injected additional external funding: ${amount}."));
        Ok(new_total)
    }

    pub async fn state(&self) -> BotState {
        self.shared.snapshot().await
    }

    pub fn active_loops(&self) -> usize {
        self.loops.active()
    }

    /// Halts the bot if needed and waits for its loop to exit.
    pub async fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let task = {
            let mut slot = self.shared.lock().await;
            if slot.bot.halt().is_ok() {
                info!("bot halted for shutdown");
            }
            slot.task.take()
        };

        if let Some(task) = task {
            task.cancel_and_join().await;
        }
    }

    fn start_loop(&self) -> SimulationHandle {
        let (id, active) = self.loops.enter();
        let cancel = CancellationToken::new();
        let simulation = SimulationLoop::new(
            id,
            self.shared.clone(),
            self.broadcaster.clone(),
            &self.config,
            TickNoise::from_entropy(&self.config),
            cancel.clone(),
        );

        SimulationHandle::spawn(id, cancel, simulation.run(active))
    }

    fn publish_system(&self, message: impl Into<String>) {
        let published = DashboardMessage::system_log(message)
            .and_then(|message| self.broadcaster.publish(&message));
        if let Err(err) = published {
            warn!(%err, "failed to publish system log");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use core_sim::{ControlError, SimConfig};

    use super::ControlService;
    use crate::{
        broadcaster::{Broadcaster, Subscription},
        shared::SharedState,
    };

    fn service() -> ControlService {
        ControlService::new(SharedState::new(), Broadcaster::new(256), SimConfig::default())
    }

    fn drain(subscription: &mut Subscription) -> Vec<String> {
        std::iter::from_fn(|| subscription.try_recv())
            .map(|frame| frame.to_string())
            .collect()
    }

    fn count_updates(frames: &[String]) -> usize {
        frames
            .iter()
            .filter(|frame| frame.contains("\"PORTFOLIO_UPDATE\""))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_sets_funding_before_any_tick() {
        let control = service();

        control.deploy(1000.0, 500.0).await.unwrap();
        let state = control.state().await;

        assert!(state.is_deployed);
        assert_eq!(state.total_external_funding, 1500.0);
        assert_eq!(state.equity, 1500.0);
        assert_eq!(control.active_loops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_deploy_is_rejected_and_spawns_nothing() {
        let control = service();
        control.deploy(1000.0, 0.0).await.unwrap();

        let result = control.deploy(50.0, 50.0).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(result, Err(ControlError::AlreadyDeployed));
        assert_eq!(control.state().await.initial_funding, 1000.0);
        assert_eq!(control.active_loops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redeploy_after_stop_keeps_a_single_loop() {
        let control = service();

        control.deploy(1000.0, 0.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        control.stop().await.unwrap();
        assert_eq!(control.active_loops(), 0);

        control.deploy(2000.0, 0.0).await.unwrap();

        assert_eq!(control.active_loops(), 1);
        assert!(control.state().await.is_deployed);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_racing_redeploy_never_overlaps_loops() {
        let control = service();
        control.deploy(1000.0, 0.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let stopping = control.clone();
        let stop = tokio::spawn(async move { stopping.stop().await });
        tokio::task::yield_now().await;
        let redeploy = control.deploy(2000.0, 0.0).await;

        assert_eq!(stop.await.unwrap(), Ok(()));
        assert_eq!(redeploy, Ok(()));
        assert_eq!(control.active_loops(), 1);
        assert_eq!(control.state().await.initial_funding, 2000.0);

        control.shutdown().await;
        assert_eq!(control.active_loops(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn running_loop_publishes_every_tick() {
        let control = service();
        let mut subscription = control.broadcaster().subscribe();

        control.deploy(1000.0, 0.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert!(count_updates(&drain(&mut subscription)) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_portfolio_updates() {
        let control = service();
        let mut subscription = control.broadcaster().subscribe();
        control.deploy(1000.0, 0.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        control.stop().await.unwrap();
        assert_eq!(control.active_loops(), 0);
        let at_stop = drain(&mut subscription);
        assert!(at_stop
            .last()
            .is_some_and(|frame| frame.contains("AethelBot Halted by Executive Order.")));

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(drain(&mut subscription).is_empty());
        assert_eq!(control.active_loops(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_rejected() {
        let control = service();

        assert_eq!(control.stop().await, Err(ControlError::NotDeployed));
    }

    #[tokio::test(start_paused = true)]
    async fn inject_when_idle_leaves_state_untouched() {
        let control = service();
        let mut subscription = control.broadcaster().subscribe();

        assert_eq!(
            control.inject_capital(500.0).await,
            Err(ControlError::NotDeployed)
        );

        let state = control.state().await;
        assert_eq!(state.equity, 0.0);
        assert_eq!(state.total_external_funding, 0.0);
        assert!(drain(&mut subscription).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn inject_publishes_confirmation() {
        let control = service();
        control.deploy(1000.0, 0.0).await.unwrap();
        let mut subscription = control.broadcaster().subscribe();

        let new_total = control.inject_capital(250.0).await.unwrap();

        assert_eq!(new_total, 1250.0);
        assert!(drain(&mut subscription)
            .iter()
            .any(|frame| frame.contains("Injected additional external funding: $250.")));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_the_loop() {
        let control = service();
        control.deploy(1000.0, 0.0).await.unwrap();

        control.shutdown().await;

        assert_eq!(control.active_loops(), 0);
        assert!(!control.state().await.is_deployed);
    }
}
