use std::sync::Arc;

use core_sim::BotState;
use tokio::sync::{Mutex, MutexGuard};

use crate::supervisor::SimulationHandle;

/// Bot state plus the handle of the loop driving it, behind one lock so that
/// `task.is_some() == bot.is_deployed` holds for every observer.
#[derive(Debug, Default)]
pub struct BotSlot {
    pub bot: BotState,
    pub task: Option<SimulationHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<BotSlot>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, BotSlot> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> BotState {
        self.inner.lock().await.bot
    }
}
