pub mod broadcaster;
pub mod control;
pub mod engine;
pub mod events;
pub mod shared;
pub mod supervisor;

pub use broadcaster::{Broadcaster, PublishReport, SubscriberId, Subscription};
pub use control::ControlService;
pub use events::{DashboardMessage, LogEntry, LogLevel, MessageError};
pub use shared::SharedState;

#[cfg(test)]
mod tests {
    use core_sim::SimConfig;

    use crate::{Broadcaster, ControlService, SharedState};

    #[tokio::test(start_paused = true)]
    async fn control_and_loop_share_one_state() {
        let shared = SharedState::new();
        let control = ControlService::new(shared.clone(), Broadcaster::default(), SimConfig::default());

        control.deploy(1000.0, 500.0).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

        let seen_by_control = control.state().await;
        let seen_directly = shared.snapshot().await;
        assert_eq!(seen_by_control, seen_directly);
        assert_eq!(
            seen_directly.pnl,
            seen_directly.equity - seen_directly.total_external_funding
        );
    }
}
