use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Hands out task ids and counts the simulation loops that are still alive.
#[derive(Debug, Clone, Default)]
pub struct LoopSupervisor {
    next_id: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
}

impl LoopSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Registers a loop as alive until the returned guard is dropped.
    pub fn enter(&self) -> (TaskId, ActiveLoopGuard) {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.active.fetch_add(1, Ordering::SeqCst);
        (
            id,
            ActiveLoopGuard {
                active: Arc::clone(&self.active),
            },
        )
    }
}

#[derive(Debug)]
pub struct ActiveLoopGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveLoopGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Retained handle to one spawned simulation loop.
#[derive(Debug)]
pub struct SimulationHandle {
    id: TaskId,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SimulationHandle {
    pub fn spawn<F>(id: TaskId, cancel: CancellationToken, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            id,
            cancel,
            join: tokio::spawn(task),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Requests cancellation. The loop observes it at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn cancel_and_join(self) {
        self.cancel.cancel();
        if let Err(err) = self.join.await {
            warn!(task = self.id.0, %err, "simulation loop exited abnormally");
        }
    }
}
