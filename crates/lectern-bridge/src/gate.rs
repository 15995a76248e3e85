//! Readiness gate for the bridge.
//!
//! A small monotonic state machine: `NotCreated -> CreatedNotReady -> Ready`.
//! Content must not invoke capabilities before the host confirms
//! initialization; callers await [`ReadinessGate::ready`], a future the gate
//! resolves exactly once when the host's readiness notice arrives. There is
//! no polling loop and no regression: once `Ready`, always `Ready`.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{BridgeError, Result};

/// Lifecycle of a bridge instance as seen by content code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkState {
    /// No bridge instance exists yet.
    #[default]
    NotCreated,
    /// An instance exists but the host has not confirmed initialization.
    CreatedNotReady,
    /// The host confirmed initialization; all capability calls are safe.
    Ready,
}

impl SdkState {
    /// Ordering rank used to forbid backwards transitions.
    const fn rank(self) -> u8 {
        match self {
            Self::NotCreated => 0,
            Self::CreatedNotReady => 1,
            Self::Ready => 2,
        }
    }

    /// Returns `true` once the host has confirmed initialization.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for SdkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCreated => write!(f, "not_created"),
            Self::CreatedNotReady => write!(f, "created_not_ready"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Monotonic readiness signal shared between the bridge handle and its
/// inbound dispatch task.
#[derive(Debug)]
pub struct ReadinessGate {
    state: watch::Sender<SdkState>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    /// Creates a gate in the `NotCreated` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SdkState::NotCreated);
        Self { state }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SdkState {
        *self.state.borrow()
    }

    /// Advances the machine to `next`.
    ///
    /// Re-entering the current state is a no-op; moving backwards is a
    /// [`BridgeError::StateRegression`].
    pub fn advance(&self, next: SdkState) -> Result<()> {
        let current = self.state();
        if next.rank() < current.rank() {
            return Err(BridgeError::state_regression(current, next));
        }
        if next.rank() > current.rank() {
            // send_replace stores the value even while nobody is subscribed
            // yet; plain send() would drop it on the floor.
            self.state.send_replace(next);
        }
        Ok(())
    }

    /// Marks the instance constructed (`NotCreated -> CreatedNotReady`).
    pub fn mark_created(&self) -> Result<()> {
        self.advance(SdkState::CreatedNotReady)
    }

    /// Marks the host confirmed (`-> Ready`). Idempotent.
    pub fn mark_ready(&self) -> Result<()> {
        self.advance(SdkState::Ready)
    }

    /// Resolves once the gate reaches `Ready`.
    ///
    /// Calls issued before readiness queue here rather than being dropped or
    /// sent into the void. The future completes immediately when the gate is
    /// already `Ready`.
    pub async fn ready(&self) {
        let mut rx = self.state.subscribe();
        loop {
            if rx.borrow().is_ready() {
                return;
            }
            // The sender lives as long as `self`, so `changed` cannot fail
            // while we are borrowed from the gate.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
