//! Synthetic fMRI sequence generator with known ground truth.
//!
//! Takes a clean BOLD sequence and corrupts it with the three effects a
//! preprocessing pipeline is supposed to undo: rigid head motion, a periodic
//! activation signal in a chosen region, and thermal noise added in k-space.
//! Every corruption is logged exactly as applied, so downstream estimates can
//! be scored against the truth instead of eyeballed.

pub mod compare;
pub mod config;
pub mod entry;
pub mod error;
pub mod io;
pub mod motion;
pub mod noise;
pub mod signal;
pub mod transform;
pub mod utils;

pub use config::{load_config, SimulationConfig};
pub use error::SimError;
pub use io::{CoordinateMapping, Sequence, Volume};
pub use transform::RigidTransform;
