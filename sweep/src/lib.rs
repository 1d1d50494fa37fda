//! Stream recovery sweeper.
//!
//! A conversation left in the running state by a producer that died
//! without a completion signal would otherwise stay stuck forever. The
//! sweeper is a single long-lived background task: every tick it asks
//! the store for running conversations whose `updated_at` predates the
//! staleness threshold and delegates recovery per conversation. It never
//! mutates conversation content itself.
//!
//! The timer is re-armed only after the current tick's work finishes, so
//! ticks never overlap by construction. A recovery failure is logged and
//! skipped; the conversation stays stuck and the next tick retries it.

use std::sync::Arc;
use std::time::Duration;

use atelier_store::ConversationStore;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const fn default_sweep_interval() -> Duration {
    Duration::from_secs(120)
}

const fn default_stuck_threshold() -> Duration {
    Duration::from_secs(300)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Delay between the end of one tick and the start of the next.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Duration,
    /// How long a running conversation may go untouched before it counts
    /// as stuck.
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            stuck_threshold: default_stuck_threshold(),
        }
    }
}

pub struct Sweeper {
    store: Arc<dyn ConversationStore>,
    config: SweepConfig,
}

impl Sweeper {
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>, config: SweepConfig) -> Self {
        Self { store, config }
    }

    /// Run one sweep: query, then recover sequentially. Returns how many
    /// conversations were successfully recovered.
    ///
    /// Errors never escape a tick. A failed query ends the tick early (the
    /// whole sweep retries next tick); a failed recovery skips to the next
    /// conversation.
    pub async fn tick(&self) -> usize {
        let stuck = match self.store.list_stuck(self.config.stuck_threshold).await {
            Ok(stuck) => stuck,
            Err(error) => {
                tracing::warn!(%error, "stuck conversation query failed, retrying next sweep");
                return 0;
            }
        };
        if stuck.is_empty() {
            return 0;
        }

        tracing::info!(count = stuck.len(), "found stuck streaming conversations");
        let mut recovered = 0;
        for conversation in stuck {
            match self.store.recover_stream_by_id(conversation.id).await {
                Ok(()) => {
                    tracing::info!(conversation = %conversation.id, "recovered stuck stream");
                    recovered += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        conversation = %conversation.id,
                        %error,
                        "stream recovery failed, skipping"
                    );
                }
            }
        }
        recovered
    }

    /// Start the recurring sweep on the current runtime.
    #[must_use]
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(self.config.sweep_interval) => {}
                    _ = shutdown_rx.changed() => break,
                }
                self.tick().await;
            }
            tracing::debug!("sweeper shut down");
        });
        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owning handle for a spawned sweeper.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Cancel the recurring timer. An in-progress tick finishes its work.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the background task to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
