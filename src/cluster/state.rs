//! Per-node state mutated exclusively by that node's own actor.

use crate::types::{NodeId, Position};
use std::collections::HashSet;

/// Where a node is in the phase machine (spec.md §4.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Election,
    ClusterHead,
    ClusterMember,
}

/// The full local view one node's actor owns and drives the algorithm over.
#[derive(Debug, Clone)]
pub struct LocalState {
    /// Immutable identity.
    pub node_id: NodeId,

    /// Current position, overwritten per snapshot.
    pub pos: Position,

    pub phase: Phase,

    /// The inter-plane super-cluster this node belongs to. A self-value
    /// means "I am my own clusterhead".
    pub cluster_id: NodeId,

    /// The immediate clusterhead this node reports to.
    pub ch_id: NodeId,

    /// Monotone counter bumped on every phase transition / CH change.
    pub term: u64,

    /// Currently reachable peers, as `(id, position)` pairs. Keeping the
    /// pair together (rather than two index-aligned vectors) removes the
    /// length-equality invariant as a representational concern.
    pub available_nodes: Vec<(NodeId, Position)>,

    /// Members currently reporting to this node. Meaningful only while
    /// `phase == ClusterHead` acting as a plane clusterhead.
    pub cluster_members: HashSet<NodeId>,
}

impl LocalState {
    /// Construct a fresh state in the initial `Election` phase.
    pub fn new(node_id: NodeId, pos: Position) -> Self {
        Self {
            node_id,
            pos,
            phase: Phase::Election,
            cluster_id: node_id,
            ch_id: node_id,
            term: 0,
            available_nodes: Vec::new(),
            cluster_members: HashSet::new(),
        }
    }

    /// Register a reachable peer for the current snapshot.
    pub fn add_peer(&mut self, id: NodeId, pos: Position) {
        self.available_nodes.push((id, pos));
    }

    /// Overwrite this node's own position, as the engine does when a new
    /// snapshot arrives for an already-known node. Peer lists are rebuilt
    /// separately by the engine.
    pub fn update_position(&mut self, pos: Position) {
        self.pos = pos;
    }

    /// Reset to the state a brand-new snapshot should start from: back to
    /// `Election`, peers and members cleared. `term` is left untouched — it
    /// is a debugging aid, not consulted for correctness (spec.md §3).
    pub fn reset(&mut self) {
        self.phase = Phase::Election;
        self.cluster_id = self.node_id;
        self.ch_id = self.node_id;
        self.available_nodes.clear();
        self.cluster_members.clear();
    }

    /// Whether `id` is currently a reachable peer.
    pub fn is_available(&self, id: NodeId) -> bool {
        self.available_nodes.iter().any(|(peer, _)| *peer == id)
    }

    /// Position of a reachable peer, if known.
    pub fn peer_position(&self, id: NodeId) -> Option<Position> {
        self.available_nodes
            .iter()
            .find(|(peer, _)| *peer == id)
            .map(|(_, pos)| *pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_self_headed_in_election() {
        let s = LocalState::new(NodeId(5), Position::new(0.0, 0.0, 0.0));
        assert_eq!(s.phase, Phase::Election);
        assert_eq!(s.cluster_id, NodeId(5));
        assert_eq!(s.ch_id, NodeId(5));
    }

    #[test]
    fn reset_clears_peers_and_phase_but_keeps_term() {
        let mut s = LocalState::new(NodeId(2), Position::new(0.0, 0.0, 0.0));
        s.add_peer(NodeId(1), Position::new(1.0, 0.0, 0.0));
        s.phase = Phase::ClusterHead;
        s.term = 7;
        s.reset();
        assert_eq!(s.phase, Phase::Election);
        assert!(s.available_nodes.is_empty());
        assert_eq!(s.term, 7);
    }

    #[test]
    fn peer_arrays_stay_in_lockstep_by_construction() {
        let mut s = LocalState::new(NodeId(2), Position::new(0.0, 0.0, 0.0));
        s.add_peer(NodeId(1), Position::new(1.0, 0.0, 0.0));
        s.add_peer(NodeId(3), Position::new(2.0, 0.0, 0.0));
        assert!(s.is_available(NodeId(1)));
        assert!(s.peer_position(NodeId(3)).is_some());
        assert!(s.peer_position(NodeId(99)).is_none());
    }
}
