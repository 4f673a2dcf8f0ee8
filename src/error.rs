// --- File: error.rs ---
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown species \"{0}\"")]
    UnknownSpecies(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("position ({x:.1}, {y:.1}) is out of bounds or impassable")]
    BlockedPosition { x: f64, y: f64 },
    #[error("region grid has {actual} cells, expected {expected}")]
    RegionGridSize { expected: usize, actual: usize },
}
