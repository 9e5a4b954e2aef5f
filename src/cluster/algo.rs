//! The clustering state machine: two pure operations over [`LocalState`].
//!
//! `LayeredClustering` holds no mutable state of its own — it is a plain
//! function of `(&AlgorithmConfig, &mut LocalState, ...)` — so there is no
//! mutex to guard here (spec.md §9, "Global mutex inside the algorithm
//! object"). The node actor is the sole owner of its `LocalState` and is
//! itself single-threaded with respect to it, which is the property the
//! original's mutex was defending.

use crate::cluster::events::{Event, EventKind};
use crate::cluster::state::{LocalState, Phase};
use crate::config::AlgorithmConfig;
use crate::types::NodeId;

/// Plane-centrality bias toward the equatorial planes of the constellation.
///
/// `1.0` at `middle_plane`, strictly monotone decreasing with distance from
/// it on either side (spec.md §3 invariant 4, §8 invariant 5). See
/// DESIGN.md's "plane_centrality formula" entry: this uses
/// `|plane - middle_plane|` rather than the signed difference written in
/// spec.md §4.1.1, which would make centrality increase without bound
/// below the middle plane and break both the stated invariants and
/// scenario S2.
pub fn plane_centrality(config: &AlgorithmConfig, plane: u32) -> f64 {
    1.0 - (plane as f64 - config.middle_plane()).abs() / config.max_plane_offset()
}

/// Whether a self-headed clusterhead should join `peer` given both
/// centralities: strictly-more-central peers always win; on an exact
/// centrality tie the lower node id joins the higher one.
fn decide_join(my_centrality: f64, peer_centrality: f64, my_id: NodeId, peer_id: NodeId) -> bool {
    my_centrality < peer_centrality || (my_centrality == peer_centrality && my_id < peer_id)
}

fn join_score(config: &AlgorithmConfig, state: &LocalState, peer: NodeId, peer_pos: crate::types::Position) -> f64 {
    let dist = state.pos.distance(&peer_pos);
    let my_centrality = plane_centrality(config, state.node_id.plane(config.satellites_per_plane));
    let peer_centrality = plane_centrality(config, peer.plane(config.satellites_per_plane));
    let d_plane = (my_centrality - peer_centrality).abs();
    config.score_weight_a * dist + config.score_weight_b * d_plane
}

/// The layered clustering algorithm: intra-plane election plus
/// centrality-biased inter-plane merging.
#[derive(Debug, Clone)]
pub struct LayeredClustering {
    config: AlgorithmConfig,
}

impl LayeredClustering {
    pub fn new(config: AlgorithmConfig) -> Self {
        Self { config }
    }

    /// Dispatched once per tick; behavior depends on `state.phase`.
    pub fn on_tick(&self, state: &mut LocalState) -> Vec<Event> {
        match state.phase {
            Phase::Election => self.on_tick_election(state),
            Phase::ClusterHead => self.on_tick_cluster_head(state),
            Phase::ClusterMember => self.on_tick_cluster_member(state),
        }
    }

    fn on_tick_election(&self, state: &mut LocalState) -> Vec<Event> {
        state.term += 1;
        if state.node_id.is_plane_ch_candidate() {
            state.phase = Phase::ClusterHead;
            state.cluster_id = state.node_id;
            let payload = EventKind::ClusterHead {
                cluster_id: state.node_id,
                clusterhead_id: state.node_id,
            };
            let (prev, next) = state.node_id.triad_neighbors();
            vec![
                Event::new(state.node_id, prev, payload.clone()),
                Event::new(state.node_id, next, payload),
            ]
        } else {
            state.phase = Phase::ClusterMember;
            Vec::new()
        }
    }

    fn on_tick_cluster_head(&self, state: &mut LocalState) -> Vec<Event> {
        if state.cluster_id != state.node_id {
            // Already joined another clusterhead; tick-driven merging only
            // runs for a still self-headed clusterhead.
            return Vec::new();
        }

        let mut best_peer: Option<NodeId> = None;
        let mut best_score = f64::INFINITY;
        for &(peer, peer_pos) in &state.available_nodes {
            if !peer.is_plane_ch_candidate() {
                continue;
            }
            if peer.plane(self.config.satellites_per_plane) == state.node_id.plane(self.config.satellites_per_plane) {
                continue;
            }
            let score = join_score(&self.config, state, peer, peer_pos);
            if score < best_score {
                best_score = score;
                best_peer = Some(peer);
            }
        }

        let best_peer = match best_peer {
            Some(p) => p,
            // No cross-plane PCH reachable: skip the decision entirely
            // rather than compare against an invalid sentinel peer.
            None => return Vec::new(),
        };

        let my_centrality = plane_centrality(&self.config, state.node_id.plane(self.config.satellites_per_plane));
        let peer_centrality = plane_centrality(&self.config, best_peer.plane(self.config.satellites_per_plane));

        if !decide_join(my_centrality, peer_centrality, state.node_id, best_peer) {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(state.cluster_members.len() + 3);
        events.push(Event::new(
            state.node_id,
            best_peer,
            EventKind::Join {
                sat_id: state.node_id,
                cluster_id: best_peer,
            },
        ));

        let head_announcement = EventKind::ClusterHead {
            cluster_id: best_peer,
            clusterhead_id: state.node_id,
        };
        let (prev, next) = state.node_id.triad_neighbors();
        events.push(Event::new(state.node_id, prev, head_announcement.clone()));
        events.push(Event::new(state.node_id, next, head_announcement.clone()));
        for &member in &state.cluster_members {
            events.push(Event::new(state.node_id, member, head_announcement.clone()));
        }

        state.cluster_id = best_peer;
        state.ch_id = best_peer;
        state.phase = Phase::ClusterMember;
        events
    }

    fn on_tick_cluster_member(&self, state: &mut LocalState) -> Vec<Event> {
        if !state.is_available(state.ch_id) {
            state.phase = Phase::Election;
            state.cluster_id = state.node_id;
            state.ch_id = state.node_id;
        }
        Vec::new()
    }

    /// Dispatched on receipt of an event addressed to this node.
    pub fn on_event(&self, state: &mut LocalState, event: &Event) -> Vec<Event> {
        match &event.payload {
            EventKind::Join { sat_id, .. } => self.on_join(state, *sat_id),
            EventKind::ClusterHead {
                cluster_id,
                clusterhead_id,
            } => self.on_cluster_head(state, *cluster_id, *clusterhead_id),
            EventKind::ClusterMember | EventKind::Leave => Vec::new(),
        }
    }

    fn on_join(&self, state: &mut LocalState, sat_id: NodeId) -> Vec<Event> {
        state.cluster_members.insert(sat_id);
        match state.phase {
            // Already bound to a super-clusterhead: tell the joiner who it is.
            Phase::ClusterMember => vec![Event::new(
                state.node_id,
                sat_id,
                EventKind::ClusterHead {
                    cluster_id: state.cluster_id,
                    clusterhead_id: state.node_id,
                },
            )],
            // Still self-headed: membership is recorded, the next tick
            // decides whether and where to merge.
            Phase::ClusterHead => Vec::new(),
            Phase::Election => Vec::new(),
        }
    }

    fn on_cluster_head(
        &self,
        state: &mut LocalState,
        cluster_id: NodeId,
        clusterhead_id: NodeId,
    ) -> Vec<Event> {
        state.cluster_id = cluster_id;
        state.ch_id = clusterhead_id;
        state.term += 1;
        state.phase = Phase::ClusterMember;

        if !state.node_id.is_plane_ch_candidate() {
            return Vec::new();
        }

        // This node is a plane clusterhead relaying its super-clusterhead's
        // announcement down to its own triad and plane-cluster members.
        let mut events = Vec::with_capacity(state.cluster_members.len() + 2);
        let relay = EventKind::ClusterHead {
            cluster_id,
            clusterhead_id: state.node_id,
        };
        let (prev, next) = state.node_id.triad_neighbors();
        events.push(Event::new(state.node_id, prev, relay.clone()));
        events.push(Event::new(state.node_id, next, relay.clone()));
        for &member in &state.cluster_members {
            if member == clusterhead_id {
                continue;
            }
            events.push(Event::new(state.node_id, member, relay.clone()));
        }
        events
    }
}
