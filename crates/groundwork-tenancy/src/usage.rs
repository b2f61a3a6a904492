//! Background recording of per-day service usage.
//!
//! Request handling never waits on a usage write. [`UsageTracker::record`]
//! pushes onto a bounded queue and returns; a single worker task drains
//! the queue and applies one atomic increment per call. Calls arriving
//! while the queue is full are dropped with a warning, as are write
//! failures.

use chrono::{NaiveDate, Utc};
use groundwork_core::repository::UsageRepository;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Pending calls held before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

enum UsageCommand {
    Record {
        tenant_id: Uuid,
        service_id: Uuid,
        day: NaiveDate,
    },
    /// Acknowledged once every command queued before it has been applied.
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the usage worker. Cheap to clone.
#[derive(Clone)]
pub struct UsageTracker {
    tx: mpsc::Sender<UsageCommand>,
}

impl UsageTracker {
    /// Start the worker on the current Tokio runtime.
    pub fn spawn<R>(repo: R) -> Self
    where
        R: UsageRepository + 'static,
    {
        Self::spawn_with_capacity(repo, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity<R>(repo: R, capacity: usize) -> Self
    where
        R: UsageRepository + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(repo, rx));
        Self { tx }
    }

    /// Queue one call against today's (UTC) counter.
    pub fn record(&self, tenant_id: Uuid, service_id: Uuid) {
        self.record_on(tenant_id, service_id, Utc::now().date_naive());
    }

    pub fn record_on(&self, tenant_id: Uuid, service_id: Uuid, day: NaiveDate) {
        let queued = self.tx.try_send(UsageCommand::Record {
            tenant_id,
            service_id,
            day,
        });
        match queued {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%tenant_id, %service_id, "usage queue full, call not recorded");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%tenant_id, %service_id, "usage worker stopped, call not recorded");
            }
        }
    }

    /// Wait until everything queued so far has been written.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(UsageCommand::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Apply the pending queue, then stop the worker. Calls recorded
    /// afterwards are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(UsageCommand::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_worker<R: UsageRepository>(repo: R, mut rx: mpsc::Receiver<UsageCommand>) {
    let mut acks = Vec::new();
    while let Some(command) = rx.recv().await {
        match command {
            UsageCommand::Record {
                tenant_id,
                service_id,
                day,
            } => {
                if let Err(e) = repo.increment_usage(tenant_id, service_id, day).await {
                    warn!(%tenant_id, %service_id, %day, error = %e, "failed to record service usage");
                }
            }
            UsageCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            UsageCommand::Shutdown(ack) => {
                // Keep draining what was queued before the close.
                rx.close();
                acks.push(ack);
            }
        }
    }
    for ack in acks {
        let _ = ack.send(());
    }
    debug!("usage worker stopped");
}
