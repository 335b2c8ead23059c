//! Pending-command queue.
//!
//! External callers enqueue a [`Mutation`] and get back a [`PendingCommand`]
//! to await. The exchange worker drains the whole queue into the reply of
//! the next status report.
//!
//! ```text
//!   caller                       queue                     exchange worker
//!   ------                       -----                     ---------------
//!   enqueue(m, deadline) ──────► [e1, e2, ...]
//!                                     │      ◄───────────── drain_all(copy)
//!                                     │ apply in order, encode, resolve each
//!   wait() ◄──────────────────── Ok(final status)
//!
//!   expiry timer at deadline ──► remove entry ──► Err(CommandTimeout)
//! ```
//!
//! Every entry leaves the queue exactly once, either drained or expired.
//! Both paths take the same lock, so whichever gets there first wins and the
//! other observes the entry as gone. Expiry runs on its own task and does not
//! depend on anyone awaiting the handle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::mutation::Mutation;
use crate::codec::StatusPayload;
use crate::error::{BridgeError, Result};
use crate::liveness::LivenessTracker;

type Completion = oneshot::Sender<Result<StatusPayload>>;

struct QueuedCommand {
    id: u64,
    mutation: Mutation,
    deadline: Instant,
    done: Completion,
    expiry: JoinHandle<()>,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    entries: VecDeque<QueuedCommand>,
}

impl QueueState {
    fn remove(&mut self, id: u64) -> Option<QueuedCommand> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(index)
    }
}

fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    // Nothing inside the lock can panic half-way through an update.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of draining the queue into a status copy.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainOutcome {
    /// The copy with every live mutation applied.
    pub status: StatusPayload,
    /// `status` encoded; this is the text that goes on the wire.
    pub payload: String,
    /// Number of mutations applied. Expired and rejected entries are not counted.
    pub applied: usize,
}

/// FIFO of mutations waiting for the next exchange.
pub struct CommandQueue {
    state: Arc<Mutex<QueueState>>,
    liveness: Arc<LivenessTracker>,
}

impl CommandQueue {
    /// Create an empty queue gated by `liveness`.
    pub fn new(liveness: Arc<LivenessTracker>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            liveness,
        }
    }

    /// Queue a mutation for the next exchange.
    ///
    /// Fails with [`BridgeError::ApplianceUnreachable`] without queueing
    /// anything when the appliance has not reported recently. Otherwise an
    /// expiry timer is started that resolves the command with
    /// [`BridgeError::CommandTimeout`] at `deadline` unless a drain claims it
    /// first. Must be called within a tokio runtime.
    pub fn enqueue(&self, mutation: Mutation, deadline: Instant) -> Result<PendingCommand> {
        if !self.liveness.is_connected(Instant::now()) {
            tracing::debug!("Refusing {}: appliance unreachable", mutation);
            return Err(BridgeError::ApplianceUnreachable);
        }

        let (done, rx) = oneshot::channel();
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            // Spawned under the lock so the timer can never look for the
            // entry before it is queued.
            let expiry = tokio::spawn(expire_at(Arc::downgrade(&self.state), id, deadline));
            state.entries.push_back(QueuedCommand {
                id,
                mutation,
                deadline,
                done,
                expiry,
            });
            id
        };
        tracing::debug!("Queued command {}: {}", id, mutation);

        Ok(PendingCommand { id, deadline, rx })
    }

    /// Take every queued entry, apply the live ones to a copy of `snapshot`
    /// in insertion order and encode the result.
    ///
    /// Entries whose deadline is at or before `now` are resolved with
    /// [`BridgeError::CommandTimeout`] and skipped. A mutation the status
    /// cannot carry is resolved with its error and skipped. Applied entries
    /// are resolved only after the final status encoded, all with that same
    /// status; if encoding fails they are resolved with the encoding error.
    pub fn drain_all(&self, snapshot: &StatusPayload, now: Instant) -> Result<DrainOutcome> {
        let entries = std::mem::take(&mut lock(&self.state).entries);

        let mut status = snapshot.clone();
        let mut applied = Vec::with_capacity(entries.len());
        for entry in entries {
            entry.expiry.abort();
            if entry.deadline <= now {
                tracing::warn!("Command {} ({}) expired before delivery", entry.id, entry.mutation);
                let _ = entry.done.send(Err(BridgeError::CommandTimeout));
                continue;
            }
            match entry.mutation.apply(&mut status) {
                Ok(()) => {
                    tracing::debug!("Applied command {}: {}", entry.id, entry.mutation);
                    applied.push(entry.done);
                }
                Err(e) => {
                    tracing::warn!("Command {} ({}) rejected: {}", entry.id, entry.mutation, e);
                    let _ = entry.done.send(Err(e));
                }
            }
        }

        let payload = match status.encode() {
            Ok(payload) => payload,
            Err(e) => {
                for done in applied {
                    // Same input, same error for every caller.
                    let _ = done.send(status.encode().map(|_| status.clone()));
                }
                return Err(e);
            }
        };

        let count = applied.len();
        for done in applied {
            // The caller may have dropped its handle; that is not an error.
            let _ = done.send(Ok(status.clone()));
        }

        Ok(DrainOutcome {
            status,
            payload,
            applied: count,
        })
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        for entry in lock(&self.state).entries.drain(..) {
            entry.expiry.abort();
        }
    }
}

/// Expiry timer body: remove entry `id` at `deadline` if it is still queued.
async fn expire_at(state: Weak<Mutex<QueueState>>, id: u64, deadline: Instant) {
    sleep_until(deadline).await;

    let Some(state) = state.upgrade() else {
        return;
    };
    let removed = lock(&state).remove(id);
    if let Some(entry) = removed {
        tracing::warn!("Command {} ({}) timed out", entry.id, entry.mutation);
        let _ = entry.done.send(Err(BridgeError::CommandTimeout));
    }
}

/// Handle to a queued mutation.
///
/// Dropping the handle does not cancel the command. It stays queued until a
/// drain applies it or its deadline passes, whichever comes first.
#[derive(Debug)]
pub struct PendingCommand {
    id: u64,
    deadline: Instant,
    rx: oneshot::Receiver<Result<StatusPayload>>,
}

impl PendingCommand {
    /// Queue-assigned id, increasing in enqueue order.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Instant after which the command is no longer delivered.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the reply carrying this command.
    ///
    /// Resolves with the status that was sent to the appliance, or
    /// [`BridgeError::CommandTimeout`] once the deadline passes.
    pub async fn wait(self) -> Result<StatusPayload> {
        self.rx.await.unwrap_or(Err(BridgeError::BridgeClosed))
    }
}
