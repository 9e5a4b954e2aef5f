//! The node actor: one tokio task per satellite, owning its `LocalState`
//! and driving the clustering algorithm off a tick timer and its inbox.

use crate::cluster::{Event, LayeredClustering, LocalState};
use crate::config::TimingConfig;
use crate::transport::{Inbox, Transport};
use crate::types::{NodeId, Position};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace, warn};

/// A running node actor and the handles needed to control it.
pub struct NodeHandle {
    node_id: NodeId,
    state: Arc<Mutex<LocalState>>,
    stop: Arc<Notify>,
    task: tokio::task::JoinHandle<()>,
}

impl NodeHandle {
    /// Spawn a node actor for `node_id` at `pos`, wired into `transport`
    /// with an inbox already registered.
    pub fn spawn(
        node_id: NodeId,
        pos: Position,
        algo: LayeredClustering,
        transport: Transport,
        inbox: Inbox,
        timing: TimingConfig,
    ) -> Self {
        let state = Arc::new(Mutex::new(LocalState::new(node_id, pos)));
        let stop = Arc::new(Notify::new());

        let task_state = Arc::clone(&state);
        let task_stop = Arc::clone(&stop);
        let task = tokio::spawn(run(
            node_id, task_state, algo, transport, inbox, timing, task_stop,
        ));

        Self {
            node_id,
            state,
            stop,
            task,
        }
    }

    /// Register this node's reachable peers for the current snapshot.
    /// Must be called before the actor's ticker can make progress.
    pub async fn set_peers(&self, peers: Vec<(NodeId, Position)>) {
        let mut state = self.state.lock().await;
        state.available_nodes = peers;
    }

    /// Replace this node's own position (spec.md §4.2 `update(pos)`).
    /// Peer lists are rebuilt separately by the engine via `set_peers`.
    pub async fn update(&self, pos: Position) {
        self.state.lock().await.update_position(pos);
    }

    /// Reset to a fresh `Election` state, clearing peers and membership.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    /// Snapshot the node's current cluster assignment.
    pub async fn cluster_id(&self) -> NodeId {
        self.state.lock().await.cluster_id
    }

    /// Snapshot the node's current position.
    pub async fn position(&self) -> Position {
        self.state.lock().await.pos
    }

    /// Signal the actor to stop and wait for its task to finish. Safe to
    /// call more than once.
    pub async fn stop(self) {
        self.stop.notify_waiters();
        let _ = self.task.await;
    }

    /// The id this handle controls.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

async fn run(
    node_id: NodeId,
    state: Arc<Mutex<LocalState>>,
    algo: LayeredClustering,
    transport: Transport,
    mut inbox: Inbox,
    timing: TimingConfig,
    stop: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(timing.tick_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outgoing = {
                    let mut guard = state.lock().await;
                    algo.on_tick(&mut guard)
                };
                dispatch(&transport, node_id, outgoing).await;
            }
            incoming = inbox.recv() => {
                let Some(event) = incoming else {
                    debug!(%node_id, "inbox closed, stopping actor");
                    break;
                };
                trace!(%node_id, from = %event.from, "handling event");
                let outgoing = {
                    let mut guard = state.lock().await;
                    algo.on_event(&mut guard, &event)
                };
                dispatch(&transport, node_id, outgoing).await;
            }
            _ = stop.notified() => {
                debug!(%node_id, "stop requested");
                break;
            }
        }
    }
}

async fn dispatch(transport: &Transport, node_id: NodeId, events: Vec<Event>) {
    for event in events {
        if let Err(err) = transport.send(event).await {
            warn!(%node_id, error = %err, "failed to deliver event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlgorithmConfig, TimingConfig};
    use std::time::Duration;

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            tick_period: Duration::from_millis(5),
            send_timeout: Duration::from_millis(50),
            queue_capacity: 30,
        }
    }

    #[tokio::test]
    async fn a_lone_plane_clusterhead_elects_itself_on_first_tick() {
        let timing = fast_timing();
        let transport = Transport::new(timing.clone());
        let inbox = transport.register(NodeId(2)).await;
        let algo = LayeredClustering::new(AlgorithmConfig::default());
        let handle = NodeHandle::spawn(
            NodeId(2),
            Position::new(0.0, 0.0, 0.0),
            algo,
            transport,
            inbox,
            timing,
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handle.cluster_id().await, NodeId(2));
        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_with_respect_to_the_task() {
        let timing = fast_timing();
        let transport = Transport::new(timing.clone());
        let inbox = transport.register(NodeId(1)).await;
        let algo = LayeredClustering::new(AlgorithmConfig::default());
        let handle = NodeHandle::spawn(
            NodeId(1),
            Position::new(0.0, 0.0, 0.0),
            algo,
            transport,
            inbox,
            timing,
        );
        handle.stop().await;
    }

    #[tokio::test]
    async fn update_replaces_the_actors_own_position() {
        let timing = fast_timing();
        let transport = Transport::new(timing.clone());
        let inbox = transport.register(NodeId(1)).await;
        let algo = LayeredClustering::new(AlgorithmConfig::default());
        let handle = NodeHandle::spawn(
            NodeId(1),
            Position::new(0.0, 0.0, 0.0),
            algo,
            transport,
            inbox,
            timing,
        );

        let new_pos = Position::new(1.0, 2.0, 3.0);
        handle.update(new_pos).await;
        assert_eq!(handle.position().await, new_pos);
        handle.stop().await;
    }
}
