//! A distributed simulator for layered satellite clustering over a
//! Walker-lattice constellation.
//!
//! Each satellite runs as its own `tokio` task (see [`node`]), exchanging
//! [`cluster::Event`]s over a bounded in-memory [`transport::Transport`].
//! [`engine::SimulationEngine`] drives a batch of position snapshots
//! through a fresh constellation of actors, one run per snapshot file.

#![warn(rust_2018_idioms)]

pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod node;
pub mod transport;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{NodeId, Position};
