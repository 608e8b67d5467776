//! Background writer draining committed state into PostgreSQL.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{PersistedState, PostgresPersistence};
use crate::domain::SwapRecord;
use crate::error::GatewayError;

/// One committed ledger transition to persist.
#[derive(Debug, Clone)]
pub struct Commit {
    /// State after the transition.
    pub state: PersistedState,
    /// Swap record appended by the transition, if any.
    pub record: Option<SwapRecord>,
}

/// Sending half handed to the service layer.
///
/// Submission never blocks: commits queue in an unbounded channel and are
/// written in the order the ledger produced them.
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    sender: mpsc::UnboundedSender<Commit>,
}

impl PersistenceHandle {
    /// Creates a handle and the receiver a writer drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Commit>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a commit. Logs and drops it if the writer has stopped.
    pub fn submit(&self, state: PersistedState, record: Option<SwapRecord>) {
        if self.sender.send(Commit { state, record }).is_err() {
            tracing::error!("persistence writer stopped; commit dropped");
        }
    }
}

/// Attempts per commit before its records are carried to the next one.
const MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry; doubles on each further attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Spawns the writer task. It exits once every handle is dropped.
///
/// Swap records whose commit could not be written stay in a backlog and are
/// written with the next commit, so the stored log never has gaps.
#[must_use]
pub fn spawn_writer(
    persistence: PostgresPersistence,
    mut receiver: mpsc::UnboundedReceiver<Commit>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backlog: Vec<SwapRecord> = Vec::new();
        while let Some(commit) = receiver.recv().await {
            backlog.extend(commit.record);
            let result = retry_with_backoff(MAX_ATTEMPTS, INITIAL_BACKOFF, || {
                persistence.save_commit(&commit.state, &backlog)
            })
            .await;
            match result {
                Ok(id) => {
                    tracing::debug!(snapshot_id = id, records = backlog.len(), "commit persisted");
                    backlog.clear();
                }
                Err(e) => tracing::error!(
                    error = %e,
                    backlog = backlog.len(),
                    "failed to persist commit; records carried to the next commit"
                ),
            }
        }
        if !backlog.is_empty() {
            tracing::error!(backlog = backlog.len(), "writer stopped with unpersisted swap records");
        }
        tracing::info!("persistence writer stopped");
    })
}

/// Runs `op` up to `attempts` times, sleeping between failures with a
/// doubling delay.
async fn retry_with_backoff<T, F, Fut>(
    attempts: u32,
    initial_delay: Duration,
    mut op: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, error = %e, retry_in = ?delay, "persistence write failed");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::domain::{AssetPair, PoolEntry, PoolLedger};

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(5, Duration::from_millis(1), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(GatewayError::PersistenceError("connection reset".to_string()))
            } else {
                Ok(7_i64)
            }
        })
        .await;
        let Ok(id) = result else {
            panic!("expected success on third attempt");
        };
        assert_eq!(id, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<i64, GatewayError> =
            retry_with_backoff(3, Duration::from_millis(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::PersistenceError("down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(GatewayError::PersistenceError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn commits_arrive_in_submission_order() {
        let (handle, mut rx) = PersistenceHandle::channel();
        let entry = PoolEntry::new(PoolLedger::default(), AssetPair::default());
        handle.submit(PersistedState::capture(&entry), None);
        handle.submit(PersistedState::capture(&entry), None);
        drop(handle);

        let mut count = 0;
        while let Some(commit) = rx.recv().await {
            assert!(commit.record.is_none());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
