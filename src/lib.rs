// --- File: lib.rs ---

pub mod agent;
pub mod behavior;
pub mod config;
pub mod constants;
pub mod error;
pub mod heatmap;
pub mod patch;
pub mod region;
pub mod results;
pub mod simulation;
pub mod snapshot;
pub mod spatial;
pub mod species;
pub mod steering;
pub mod utils;
pub mod vector;

pub use config::SimulationConfig;
pub use error::SimError;
pub use simulation::{Simulation, TickOutcome};
