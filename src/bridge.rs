//! Bridge builder and facade.
//!
//! The [`BridgeBuilder`] provides a fluent API for configuring timeouts and
//! the registration token. The [`Bridge`] is the boundary the outer surfaces
//! call into:
//! 1. The HTTP listener passes every appliance request body to
//!    [`Bridge::handle_inbound_frame`] and writes back whatever it returns.
//! 2. Front-ends call [`Bridge::request_mutation`] and await the reply.
//! 3. Publishers read [`Bridge::current_status`] or [`Bridge::subscribe`]
//!    to changes.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use rinnai_bridge::{Bridge, BridgeError, Mutation};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bridge = Bridge::builder()
//!         .command_timeout(Duration::from_secs(5))
//!         .build();
//!
//!     // Nothing has reported yet, so commands are refused immediately.
//!     let result = bridge.request_mutation(Mutation::Power(true)).await;
//!     assert!(matches!(result, Err(BridgeError::ApplianceUnreachable)));
//!     assert!(bridge.current_status().is_none());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::codec::{HvacAction, HvacMode, StatusPayload};
use crate::command::{CommandQueue, Mutation};
use crate::coordinator::{ExchangeCoordinator, ExchangeState, StatusChange};
use crate::error::{BridgeError, Result};
use crate::liveness::{LivenessTracker, DEFAULT_LIVENESS_TIMEOUT};

/// Default time a command waits for an exchange.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the status-change channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 16;

/// Placeholder token sent back on registration.
pub const DEFAULT_REGISTRATION_TOKEN: &str = "11111111111111111111111111111111";

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long after the last report the appliance counts as reachable.
    pub liveness_timeout: Duration,
    /// How long a command waits for an exchange before timing out.
    pub command_timeout: Duration,
    /// Payload of the registration acknowledgement.
    pub registration_token: String,
    /// Status changes buffered per subscriber.
    pub change_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            registration_token: DEFAULT_REGISTRATION_TOKEN.to_string(),
            change_capacity: DEFAULT_CHANGE_CAPACITY,
        }
    }
}

/// Builder for configuring and creating a [`Bridge`].
#[derive(Debug, Clone, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
}

impl BridgeBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the liveness window.
    ///
    /// Default: 10 seconds
    pub fn liveness_timeout(mut self, timeout: Duration) -> Self {
        self.config.liveness_timeout = timeout;
        self
    }

    /// Set the command timeout used by [`Bridge::request_mutation`].
    ///
    /// Default: 10 seconds
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set the registration acknowledgement payload.
    ///
    /// Default: 32 × `"1"`
    pub fn registration_token(mut self, token: impl Into<String>) -> Self {
        self.config.registration_token = token.into();
        self
    }

    /// Set the number of status changes buffered per subscriber.
    ///
    /// Slow subscribers lose the oldest changes beyond this.
    /// Default: 16
    pub fn change_capacity(mut self, capacity: usize) -> Self {
        self.config.change_capacity = capacity;
        self
    }

    /// Build the bridge.
    pub fn build(self) -> Bridge {
        Bridge::with_config(self.config)
    }
}

struct Inner {
    config: BridgeConfig,
    liveness: Arc<LivenessTracker>,
    queue: Arc<CommandQueue>,
    coordinator: ExchangeCoordinator,
}

/// Shared handle to one appliance bridge.
///
/// Cloning is cheap; all clones share the same queue and status.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

/// JSON read model: the status plus its derived views.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView<'a> {
    #[serde(flatten)]
    status: &'a StatusPayload,
    hvac_mode: HvacMode,
    hvac_action: HvacAction,
    is_away: bool,
}

impl Bridge {
    /// Create a new builder for configuring a bridge.
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Create a bridge with default configuration.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create a bridge from an explicit configuration.
    pub fn with_config(config: BridgeConfig) -> Self {
        let liveness = Arc::new(LivenessTracker::with_timeout(config.liveness_timeout));
        let queue = Arc::new(CommandQueue::new(liveness.clone()));
        let coordinator = ExchangeCoordinator::new(
            queue.clone(),
            liveness.clone(),
            config.registration_token.clone(),
            config.change_capacity,
        );

        Self {
            inner: Arc::new(Inner {
                config,
                liveness,
                queue,
                coordinator,
            }),
        }
    }

    /// Configuration this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Answer one appliance request.
    ///
    /// Returns the reply frame, or `None` when no reply should be sent.
    /// Failures are logged here and never propagate.
    pub fn handle_inbound_frame(&self, raw: &str) -> Option<String> {
        match self.exchange(raw) {
            Ok(reply) => Some(reply),
            Err(
                e @ (BridgeError::MalformedFrame(_)
                | BridgeError::ChecksumMismatch { .. }
                | BridgeError::BadTail(_)
                | BridgeError::TrailingData(_)
                | BridgeError::UnexpectedFrame { .. }
                | BridgeError::InvalidReport(_)),
            ) => {
                tracing::warn!("Rejected frame {:?}: {}", raw, e);
                None
            }
            Err(e) => {
                tracing::error!("Exchange failed for {:?}: {}", raw, e);
                None
            }
        }
    }

    /// Answer one appliance request, returning the failure if any.
    pub fn exchange(&self, raw: &str) -> Result<String> {
        self.inner.coordinator.handle(raw)
    }

    /// Queue a mutation and wait for it to be delivered, using the
    /// configured command timeout.
    pub async fn request_mutation(&self, mutation: Mutation) -> Result<StatusPayload> {
        self.request_mutation_with_timeout(mutation, self.inner.config.command_timeout)
            .await
    }

    /// Queue a mutation and wait up to `timeout` for it to be delivered.
    ///
    /// Resolves with the status sent to the appliance. Dropping the future
    /// does not withdraw the command; it is still delivered with the next
    /// reply, or discarded once `timeout` has passed.
    pub async fn request_mutation_with_timeout(
        &self,
        mutation: Mutation,
        timeout: Duration,
    ) -> Result<StatusPayload> {
        let deadline = Instant::now() + timeout;
        self.inner.queue.enqueue(mutation, deadline)?.wait().await
    }

    /// Last decoded status, `None` until the first report.
    pub fn current_status(&self) -> Option<StatusPayload> {
        self.inner.coordinator.last_status()
    }

    /// True while the appliance has reported within the liveness window.
    pub fn is_reachable(&self) -> bool {
        self.inner.liveness.is_connected(Instant::now())
    }

    /// JSON rendering of the last status with its derived mode and action.
    pub fn status_json(&self) -> Result<Option<String>> {
        let Some(status) = self.current_status() else {
            return Ok(None);
        };
        let view = StatusView {
            status: &status,
            hvac_mode: status.hvac_mode(),
            hvac_action: status.hvac_action(),
            is_away: status.is_away(),
        };
        Ok(Some(serde_json::to_string(&view)?))
    }

    /// Receive a [`StatusChange`] for every report decoded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.coordinator.subscribe()
    }

    /// Current position in the exchange state machine.
    pub fn exchange_state(&self) -> ExchangeState {
        self.inner.coordinator.state()
    }

    /// Commands waiting for the next exchange.
    pub fn pending_commands(&self) -> usize {
        self.inner.queue.len()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .field("state", &self.exchange_state())
            .field("pending_commands", &self.pending_commands())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{prefix, Frame, EXCHANGE_COMMAND};

    fn report_frame() -> String {
        let payload = format!(
            "0d16162d152821ffff0000000000{}{}{}",
            "0".repeat(70),
            "0".repeat(14),
            "0".repeat(40)
        );
        Frame::new(prefix::STATUS_REPORT, EXCHANGE_COMMAND, payload)
            .encode()
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.liveness_timeout, Duration::from_secs(10));
        assert_eq!(config.command_timeout, Duration::from_secs(10));
        assert_eq!(config.registration_token, "1".repeat(32));
        assert_eq!(config.change_capacity, 16);
    }

    #[tokio::test]
    async fn test_builder_method_chaining() {
        let bridge = Bridge::builder()
            .liveness_timeout(Duration::from_secs(3))
            .command_timeout(Duration::from_secs(1))
            .registration_token("abc")
            .change_capacity(4)
            .build();

        let config = bridge.config();
        assert_eq!(config.liveness_timeout, Duration::from_secs(3));
        assert_eq!(config.command_timeout, Duration::from_secs(1));
        assert_eq!(config.registration_token, "abc");
        assert_eq!(config.change_capacity, 4);
    }

    #[tokio::test]
    async fn test_handle_inbound_frame_swallows_errors() {
        let bridge = Bridge::new();
        assert!(bridge.handle_inbound_frame("garbage").is_none());
        assert!(bridge.handle_inbound_frame("").is_none());
        assert!(bridge.current_status().is_none());
    }

    #[tokio::test]
    async fn test_custom_registration_token() {
        let bridge = Bridge::builder().registration_token("ok").build();
        let raw = Frame::new(prefix::REGISTER_REQUEST, EXCHANGE_COMMAND, "")
            .encode()
            .unwrap();
        let reply = Frame::decode(&bridge.handle_inbound_frame(&raw).unwrap()).unwrap();
        assert_eq!(reply.payload, "ok");
        assert_eq!(bridge.exchange_state(), ExchangeState::AwaitingReport);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reachability_follows_reports() {
        let bridge = Bridge::new();
        assert!(!bridge.is_reachable());

        bridge.handle_inbound_frame(&report_frame()).unwrap();
        assert!(bridge.is_reachable());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!bridge.is_reachable());
        assert!(matches!(
            bridge.request_mutation(Mutation::Power(true)).await,
            Err(BridgeError::ApplianceUnreachable)
        ));
        // The last status is kept after the appliance goes quiet.
        assert!(bridge.current_status().is_some());
    }

    #[tokio::test]
    async fn test_status_json() {
        let bridge = Bridge::new();
        assert!(bridge.status_json().unwrap().is_none());

        bridge.handle_inbound_frame(&report_frame()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&bridge.status_json().unwrap().unwrap()).unwrap();
        assert_eq!(json["isPowerOn"], true);
        assert_eq!(json["desiredHotWaterTemp"], 45.0);
        assert_eq!(json["hvacMode"], "auto");
        assert_eq!(json["hvacAction"], "idle");
        assert_eq!(json["isAway"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_mutation_times_out() {
        let bridge = Bridge::builder()
            .command_timeout(Duration::from_secs(2))
            .build();
        bridge.handle_inbound_frame(&report_frame()).unwrap();

        let result = bridge.request_mutation(Mutation::Heat(false)).await;
        assert!(matches!(result, Err(BridgeError::CommandTimeout)));
        assert_eq!(bridge.pending_commands(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_request_expires_at_deadline() {
        let bridge = Bridge::builder()
            .command_timeout(Duration::from_secs(2))
            .build();
        bridge.handle_inbound_frame(&report_frame()).unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            bridge.request_mutation(Mutation::Heat(false)),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(bridge.pending_commands(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(bridge.pending_commands(), 0);

        // The next reply carries nothing.
        let reply = Frame::decode(&bridge.handle_inbound_frame(&report_frame()).unwrap()).unwrap();
        assert_eq!(reply.prefix, prefix::STATUS_REPORT);
    }
}
