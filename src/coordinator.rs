//! Exchange coordinator.
//!
//! The appliance drives every exchange: it posts a frame and the bridge
//! answers within the same request. The coordinator turns one inbound frame
//! into at most one reply frame.
//!
//! ```text
//!                     re0000/01
//!  AwaitingRegistration ───────► AwaitingReport ◄──┐
//!                                      │           │ re0101/01
//!                                      └───────────┘
//! ```
//!
//! For a status report the coordinator records contact, replaces the
//! last-known status, notifies observers, then builds the reply from a copy
//! of the report: clock stamped, every queued command applied. The reply is
//! tagged `sm0101` when at least one command went out, `re0101` otherwise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::codec::{ClockStamp, FieldChange, StatusPayload};
use crate::command::CommandQueue;
use crate::error::{BridgeError, Result};
use crate::liveness::LivenessTracker;
use crate::protocol::{prefix, Frame, EXCHANGE_COMMAND};

/// Where the exchange state machine currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    AwaitingRegistration,
    AwaitingReport,
}

/// Published after every decoded status report.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// `None` for the first report since start-up.
    pub previous: Option<StatusPayload>,
    pub current: StatusPayload,
    /// Fields that differ from `previous`; empty on the first report.
    pub changed: Vec<FieldChange>,
}

/// Turns inbound frames into replies.
pub struct ExchangeCoordinator {
    queue: Arc<CommandQueue>,
    liveness: Arc<LivenessTracker>,
    last_status: RwLock<Option<StatusPayload>>,
    registered: AtomicBool,
    registration_token: String,
    changes: broadcast::Sender<StatusChange>,
}

impl ExchangeCoordinator {
    /// Create a coordinator that drains `queue` and records contact in
    /// `liveness`. Registration is answered with `registration_token`.
    pub fn new(
        queue: Arc<CommandQueue>,
        liveness: Arc<LivenessTracker>,
        registration_token: impl Into<String>,
        change_capacity: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(change_capacity.max(1));
        Self {
            queue,
            liveness,
            last_status: RwLock::new(None),
            registered: AtomicBool::new(false),
            registration_token: registration_token.into(),
            changes,
        }
    }

    /// Current position in the exchange state machine.
    pub fn state(&self) -> ExchangeState {
        if self.registered.load(Ordering::Acquire) {
            ExchangeState::AwaitingReport
        } else {
            ExchangeState::AwaitingRegistration
        }
    }

    /// Last decoded status report, if any.
    pub fn last_status(&self) -> Option<StatusPayload> {
        self.last_status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive a [`StatusChange`] for every report decoded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.changes.subscribe()
    }

    /// Handle one raw inbound frame, stamping replies with local time.
    pub fn handle(&self, raw: &str) -> Result<String> {
        self.handle_with_clock(raw, &ClockStamp::now())
    }

    /// Handle one raw inbound frame, stamping replies with `clock`.
    pub fn handle_with_clock(&self, raw: &str, clock: &ClockStamp) -> Result<String> {
        tracing::debug!("Received frame: {}", raw);
        let frame = Frame::decode(raw)?;

        let reply = match frame.prefix.as_str() {
            prefix::REGISTER_REQUEST if frame.command == EXCHANGE_COMMAND => self.register(),
            prefix::STATUS_REPORT if frame.command == EXCHANGE_COMMAND => {
                self.report(&frame, clock)?
            }
            _ => {
                return Err(BridgeError::UnexpectedFrame {
                    prefix: frame.prefix.clone(),
                    command: frame.command,
                })
            }
        };

        let encoded = reply.encode()?;
        tracing::debug!("Sending frame: {}", encoded);
        Ok(encoded)
    }

    fn register(&self) -> Frame {
        let first = !self.registered.swap(true, Ordering::AcqRel);
        tracing::info!("Appliance registered{}", if first { "" } else { " again" });
        Frame::new(
            prefix::REGISTER_ACK,
            EXCHANGE_COMMAND,
            self.registration_token.as_str(),
        )
    }

    fn report(&self, frame: &Frame, clock: &ClockStamp) -> Result<Frame> {
        let status = StatusPayload::decode(&frame.payload)
            .map_err(|e| BridgeError::InvalidReport(Box::new(e)))?;

        let now = Instant::now();
        self.liveness.record_contact(now);

        let previous = self
            .last_status
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(status.clone());
        self.publish(previous, &status);

        let mut reply = status;
        reply.stamp_clock(clock)?;
        let outcome = self.queue.drain_all(&reply, now)?;

        let tag = if outcome.applied > 0 {
            tracing::info!("Delivering {} command(s)", outcome.applied);
            prefix::COMMAND_REPLY
        } else {
            prefix::STATUS_REPORT
        };
        Ok(Frame::new(tag, frame.command, outcome.payload))
    }

    fn publish(&self, previous: Option<StatusPayload>, current: &StatusPayload) {
        let changed = match &previous {
            Some(previous) => current.changes_from(previous),
            None => Vec::new(),
        };
        for change in &changed {
            tracing::info!(
                "property changed {} {} => {}",
                change.field, change.from, change.to
            );
        }

        // No receivers is fine; lagging receivers lose the oldest messages.
        let _ = self.changes.send(StatusChange {
            previous,
            current: current.clone(),
            changed,
        });
    }
}
