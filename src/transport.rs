//! In-memory point-to-point transport between node actors.
//!
//! Every link is a bounded `mpsc` channel, one per destination. `send`
//! enforces the per-send timeout itself rather than relying on the
//! channel's own backpressure, since a full queue should surface as a
//! `Timeout` error rather than block the caller indefinitely.

use crate::cluster::Event;
use crate::config::TimingConfig;
use crate::error::{Error, Result};
use crate::types::NodeId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

/// The receiving half handed to a node actor when it registers.
pub type Inbox = mpsc::Receiver<Event>;

/// Shared router between every node actor in a simulation run.
#[derive(Clone)]
pub struct Transport {
    routes: Arc<RwLock<HashMap<NodeId, mpsc::Sender<Event>>>>,
    timing: TimingConfig,
}

impl Transport {
    /// Construct an empty transport with no registered peers.
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            timing,
        }
    }

    /// Register `id` as a reachable destination, returning its inbox.
    /// Replaces any previous registration for the same id.
    pub async fn register(&self, id: NodeId) -> Inbox {
        let (tx, rx) = mpsc::channel(self.timing.queue_capacity);
        self.routes.write().await.insert(id, tx);
        rx
    }

    /// Drop a destination's route. Further sends to it fail with
    /// `PeerNotFound` until it re-registers.
    pub async fn unregister(&self, id: NodeId) {
        self.routes.write().await.remove(&id);
    }

    /// Send `event` to `event.to`, waiting at most `send_timeout` for room
    /// in the destination's queue.
    pub async fn send(&self, event: Event) -> Result<()> {
        let sender = {
            let routes = self.routes.read().await;
            routes
                .get(&event.to)
                .cloned()
                .ok_or(Error::PeerNotFound(event.to))?
        };

        match tokio::time::timeout(self.timing.send_timeout, sender.send(event.clone())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => {
                // Receiver dropped: the destination actor has stopped.
                warn!(peer = %event.to, "send to a peer with no live receiver");
                Err(Error::PeerNotFound(event.to))
            }
            Err(_) => Err(Error::Timeout(event.to)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::EventKind;
    use std::time::Duration;

    fn timing(capacity: usize, timeout_ms: u64) -> TimingConfig {
        let mut t = TimingConfig::default();
        t.queue_capacity = capacity;
        t.send_timeout = Duration::from_millis(timeout_ms);
        t
    }

    #[tokio::test]
    async fn send_to_unregistered_peer_is_peer_not_found() {
        let transport = Transport::new(timing(4, 50));
        let event = Event::new(NodeId(1), NodeId(2), EventKind::Leave);
        let err = transport.send(event).await.unwrap_err();
        assert!(matches!(err, Error::PeerNotFound(NodeId(2))));
    }

    #[tokio::test]
    async fn registered_peer_receives_sent_event() {
        let transport = Transport::new(timing(4, 50));
        let mut inbox = transport.register(NodeId(2)).await;
        let event = Event::new(NodeId(1), NodeId(2), EventKind::Leave);
        transport.send(event.clone()).await.unwrap();
        let received = inbox.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn full_queue_times_out_instead_of_blocking() {
        let transport = Transport::new(timing(1, 20));
        let _inbox = transport.register(NodeId(2)).await;
        transport
            .send(Event::new(NodeId(1), NodeId(2), EventKind::Leave))
            .await
            .unwrap();
        // Queue now holds one unreceived event and has capacity 1.
        let err = transport
            .send(Event::new(NodeId(1), NodeId(2), EventKind::Leave))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(NodeId(2))));
    }

    #[tokio::test]
    async fn unregistering_a_peer_fails_subsequent_sends() {
        let transport = Transport::new(timing(4, 50));
        let _inbox = transport.register(NodeId(2)).await;
        transport.unregister(NodeId(2)).await;
        let err = transport
            .send(Event::new(NodeId(1), NodeId(2), EventKind::Leave))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PeerNotFound(NodeId(2))));
    }
}
