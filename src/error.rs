//! Error taxonomy shared across transport, engine, and config loading.

use crate::types::NodeId;
use thiserror::Error;

/// Errors produced anywhere in the simulation.
#[derive(Error, Debug)]
pub enum Error {
    /// A snapshot line did not parse as three space-separated floats.
    #[error("snapshot parse error: {0}")]
    Parse(String),

    /// Snapshot or result-log I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// `send` targeted a node id with no registered route.
    #[error("peer {0} not found")]
    PeerNotFound(NodeId),

    /// `send` timed out waiting on a saturated peer queue.
    #[error("send to peer {0} timed out")]
    Timeout(NodeId),

    /// An event payload tag was not recognized by the dispatcher.
    #[error("unknown event payload")]
    UnknownPayload,

    /// The TOML configuration file was malformed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
