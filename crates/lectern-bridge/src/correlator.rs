//! Request correlation for the bridge.
//!
//! The [`Correlator`] exclusively owns the pending-callback table: one entry
//! per in-flight request, keyed by `requestId`, removed and fired exactly
//! once when the correlated response arrives. Responses that match nothing
//! (already resolved, or from a stale session) are discarded without effect,
//! so a duplicate or late response can never re-invoke a callback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use crate::protocol::ResponseEnvelope;

/// Per-process sequence distinguishing ids minted within one millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mints a unique correlation id.
///
/// Millisecond timestamp, a process-wide sequence number, and a random
/// suffix: unique per in-flight call even under rapid repeated invocation,
/// and distinguishable across sandbox sessions sharing a host.
#[must_use]
pub fn next_request_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let entropy: u32 = rand::random();
    format!("{millis:x}-{seq:x}-{entropy:08x}")
}

/// What a resolved call yields: the host's result or its error message.
pub type CallOutcome = std::result::Result<Value, String>;

/// Owns the `requestId -> callback` table for one bridge instance.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: Mutex<HashMap<String, oneshot::Sender<CallOutcome>>>,
}

impl Correlator {
    /// Creates an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending entry and returns its id and the receiver the
    /// caller awaits.
    pub async fn register(&self) -> (String, oneshot::Receiver<CallOutcome>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);
        (id, rx)
    }

    /// Resolves the entry matching `response`, if any.
    ///
    /// Removes the entry and fires it with `(result, error)` collapsed into
    /// a [`CallOutcome`]. Returns `false` when nothing matched; the response
    /// is then discarded, which is the required behavior for duplicates and
    /// for responses belonging to a different session.
    pub async fn resolve(&self, response: ResponseEnvelope) -> bool {
        let slot = self.pending.lock().await.remove(&response.request_id);
        let Some(slot) = slot else {
            debug!(
                request_id = %response.request_id,
                "discarding response with no pending entry"
            );
            return false;
        };

        let outcome = match response.error {
            Some(message) => Err(message),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };

        // The caller may have abandoned the receiver; that is harmless.
        if slot.send(outcome).is_err() {
            debug!(
                request_id = %response.request_id,
                "pending caller went away before resolution"
            );
        }
        true
    }

    /// Removes a pending entry without firing it.
    ///
    /// Used when the outbound send fails after registration, so the table
    /// does not accumulate entries for requests the host never saw.
    pub async fn abandon(&self, request_id: &str) {
        self.pending.lock().await.remove(request_id);
    }

    /// Number of requests currently awaiting a response.
    pub async fn in_flight(&self) -> usize {
        self.pending.lock().await.len()
    }
}
