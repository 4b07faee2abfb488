//! The internal peer re-enqueue channel (spec §4.2, §5, §9).
//!
//! Deliberately distinct from the external work queue: this channel only
//! carries *which* identities need re-evaluating after a conflict-set change,
//! and is bounded and best-effort -- a full channel drops the event rather
//! than blocking the reconcile that produced it, on the theory that the next
//! watch-driven reconcile of the dropped peer will catch up anyway (spec §9).

use policy_types::Identity;
use tokio::sync::mpsc;

/// Default channel capacity per spec §5 ("bounded... default capacity 1024").
pub const DEFAULT_CAPACITY: usize = 1024;

pub fn channel(capacity: usize) -> (PeerSender, PeerReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (PeerSender { tx }, PeerReceiver { rx })
}

pub fn default_channel() -> (PeerSender, PeerReceiver) {
    channel(DEFAULT_CAPACITY)
}

/// Cloneable send half; every mutator reconcile worker holds one.
#[derive(Clone)]
pub struct PeerSender {
    tx: mpsc::Sender<Identity>,
}

impl PeerSender {
    /// Non-blocking send (spec §5: "Send is non-blocking: if full, drop").
    /// Returns `false` if the event was dropped -- callers should log, never
    /// fail the reconcile over it (spec §4.3: "dropped events do not fail the
    /// reconcile").
    pub fn try_notify(&self, id: Identity) -> bool {
        match self.tx.try_send(id) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(identity = %dropped, "peer re-enqueue channel full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::warn!(identity = %dropped, "peer re-enqueue channel closed, dropping event");
                false
            }
        }
    }
}

/// Receive half; drained by whatever dispatches re-enqueue requests onto the
/// reconciler's own work queue (external, §9).
pub struct PeerReceiver {
    rx: mpsc::Receiver<Identity>,
}

impl PeerReceiver {
    pub async fn recv(&mut self) -> Option<Identity> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_sent_identity() {
        let (tx, mut rx) = channel(4);
        let id = Identity::new("fake", "system", "bar");
        assert!(tx.try_notify(id.clone()));
        assert_eq!(rx.recv().await, Some(id));
    }

    #[tokio::test]
    async fn drops_when_full_without_panicking() {
        let (tx, mut rx) = channel(1);
        assert!(tx.try_notify(Identity::new("fake", "system", "a")));
        assert!(!tx.try_notify(Identity::new("fake", "system", "b")));
        assert_eq!(rx.recv().await, Some(Identity::new("fake", "system", "a")));
    }
}
