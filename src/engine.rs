//! The simulation engine: drives one run per snapshot file in a directory,
//! wiring up a fresh constellation from parsed satellite positions.

use crate::cluster::LayeredClustering;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::node::NodeHandle;
use crate::transport::Transport;
use crate::types::{NodeId, Position};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Drives one or more snapshot files through the clustering simulation.
pub struct SimulationEngine {
    config: Config,
}

impl SimulationEngine {
    /// Build an engine from a fully-resolved configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Process every snapshot file under `snapshots_dir`, sorted by file
    /// name so that successive time steps are processed in order, up to
    /// `engine.snapshot_cap` entries.
    pub async fn run(&self, snapshots_dir: impl AsRef<Path>) -> Result<()> {
        let snapshots_dir = snapshots_dir.as_ref();
        info!(dir = %snapshots_dir.display(), "reading snapshot directory");

        let mut dir = tokio::fs::read_dir(snapshots_dir).await?;
        tokio::fs::create_dir_all(&self.config.engine.output_dir).await?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries.into_iter().take(self.config.engine.snapshot_cap) {
            let path = entry.path();
            info!(snapshot = %path.display(), "running snapshot");
            if let Err(err) = self.run_snapshot(&path).await {
                warn!(snapshot = %path.display(), error = %err, "snapshot aborted");
            }
        }

        Ok(())
    }

    async fn run_snapshot(&self, path: &Path) -> Result<()> {
        let positions = parse_snapshot(path).await?;
        let transport = Transport::new(self.config.timing.clone());
        let algo = LayeredClustering::new(self.config.algorithm.clone());

        let mut handles = Vec::with_capacity(positions.len());
        for &(id, pos) in &positions {
            let inbox = transport.register(id).await;
            let handle = NodeHandle::spawn(
                id,
                pos,
                algo.clone(),
                transport.clone(),
                inbox,
                self.config.timing.clone(),
            );
            handles.push(handle);
        }

        let peers = mutual_peerage(&positions, self.config.engine.max_comm_distance_km);
        for handle in &handles {
            let neighbors = peers.get(&handle.node_id()).cloned().unwrap_or_default();
            handle.set_peers(neighbors).await;
        }

        tokio::time::sleep(self.config.engine.settling_window).await;

        let mut assignments = HashMap::with_capacity(handles.len());
        for handle in handles {
            let cluster_id = handle.cluster_id().await;
            assignments.insert(handle.node_id(), cluster_id);
            handle.stop().await;
        }

        self.write_results(path, &peers, &assignments).await?;
        Ok(())
    }

    async fn write_results(
        &self,
        snapshot_path: &Path,
        peers: &HashMap<NodeId, Vec<(NodeId, Position)>>,
        assignments: &HashMap<NodeId, NodeId>,
    ) -> Result<()> {
        use std::fmt::Write as _;

        let mut out = String::new();
        let mut ids: Vec<NodeId> = peers.keys().copied().collect();
        ids.sort();
        for &id in &ids {
            for &(peer, _) in &peers[&id] {
                if id < peer {
                    let _ = writeln!(out, "{}-{}", id, peer);
                }
            }
        }
        out.push_str("\n\n");

        let mut clusters: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for &id in &ids {
            let cluster_id = assignments[&id];
            let _ = writeln!(out, "{}->{}", id, cluster_id);
            clusters.entry(cluster_id).or_default().push(id);
        }

        for (cluster_id, members) in &clusters {
            let (prev, next) = cluster_id.triad_neighbors();
            if !members.contains(&prev) || !members.contains(&next) {
                warn!(
                    cluster = %cluster_id,
                    "super-cluster does not contain both triad neighbors of its clusterhead"
                );
            }
        }

        let basename = snapshot_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("snapshot"));
        let out_path = Path::new(&self.config.engine.output_dir).join(basename);
        tokio::fs::write(out_path, out).await?;
        Ok(())
    }
}

/// Parse a snapshot file: one `X Y Z` line per satellite, assigned ids
/// `1..=n` in file order. `\r` is stripped before splitting lines.
async fn parse_snapshot(path: &Path) -> Result<Vec<(NodeId, Position)>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let mut positions = Vec::new();
    let mut next_id = 1u32;

    for line in contents.replace('\r', "").lines() {
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 3 {
            return Err(Error::Parse(format!(
                "expected 3 values received {}",
                parts.len()
            )));
        }
        let x: f64 = parts[0]
            .parse()
            .map_err(|_| Error::Parse(format!("invalid x coordinate {:?}", parts[0])))?;
        let y: f64 = parts[1]
            .parse()
            .map_err(|_| Error::Parse(format!("invalid y coordinate {:?}", parts[1])))?;
        let z: f64 = parts[2]
            .parse()
            .map_err(|_| Error::Parse(format!("invalid z coordinate {:?}", parts[2])))?;

        positions.push((NodeId(next_id), Position::new(x, y, z)));
        next_id += 1;
    }

    Ok(positions)
}

/// Every pair closer than `max_comm_distance_km` becomes a mutual peer,
/// an `O(n^2)` scan matching the original's nested loop.
fn mutual_peerage(
    positions: &[(NodeId, Position)],
    max_comm_distance_km: f64,
) -> HashMap<NodeId, Vec<(NodeId, Position)>> {
    let mut peers: HashMap<NodeId, Vec<(NodeId, Position)>> = HashMap::new();
    for &(id, _) in positions {
        peers.entry(id).or_default();
    }

    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let (id_a, pos_a) = positions[i];
            let (id_b, pos_b) = positions[j];
            if pos_a.distance(&pos_b) < max_comm_distance_km {
                peers.entry(id_a).or_default().push((id_b, pos_b));
                peers.entry(id_b).or_default().push((id_a, pos_a));
            }
        }
    }

    peers
}
