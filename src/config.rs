use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::motion::MotionConfig;
use crate::noise::NoiseConfig;
use crate::signal::BoldConfig;

/// One TOML file configuring a whole simulation run. Every field has a
/// default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub motion: MotionConfig,
    pub bold: BoldConfig,
    pub noise: NoiseConfig,
    /// Volumes produced when promoting a base volume to a sequence.
    pub replicate: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            motion: MotionConfig::default(),
            bold: BoldConfig::default(),
            noise: NoiseConfig::default(),
            replicate: 150,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
    let config: SimulationConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {:?}", path.as_ref()))?;
    Ok(config)
}
