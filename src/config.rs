// --- File: config.rs ---
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::species::{RoamingPattern, SpeciesProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("world dimensions must be positive and finite (got {width} x {height})")]
    InvalidWorldSize { width: f64, height: f64 },
    #[error("{0} must be positive and finite")]
    NonPositive(&'static str),
    #[error("spawn table references unknown species \"{0}\"")]
    UnknownSpecies(String),
    #[error("species \"{0}\" has an invalid profile: {1}")]
    InvalidSpecies(String, &'static str),
    #[error("heatmap color stop \"{color}\" has threshold {threshold} outside [0, 1]")]
    InvalidColorStop { color: String, threshold: f64 },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Agents spawned per species at (re)start.
    pub agents: BTreeMap<String, usize>,
    pub prey_patches: usize,
    /// Position draws per spawn before that spawn is skipped.
    pub spawn_attempts: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            agents: BTreeMap::new(),
            prey_patches: INITIAL_PREY_PATCH_COUNT,
            spawn_attempts: SPAWN_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreyPatchConfig {
    pub min_dist_from_border: f64,
    pub initial_size: f64,
    pub bonus_first: f64,
    pub bonus_per_additional: f64,
    pub spatial_chunk_size: f64,
}

impl Default for PreyPatchConfig {
    fn default() -> Self {
        Self {
            min_dist_from_border: PATCH_MIN_DIST_FROM_BORDER,
            initial_size: PATCH_INITIAL_SIZE,
            bonus_first: PATCH_BONUS_FIRST,
            bonus_per_additional: PATCH_BONUS_PER_ADDITIONAL,
            spatial_chunk_size: PATCH_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevyFlightConfig {
    pub max_attempts: u32,
    pub fractal_dimension: f64,
    pub distance_scaling_factor: f64,
    pub success_distance: f64,
    pub slowing_radius: f64,
}

impl Default for LevyFlightConfig {
    fn default() -> Self {
        Self {
            max_attempts: LEVY_MAX_ATTEMPTS,
            fractal_dimension: LEVY_FRACTAL_DIMENSION,
            distance_scaling_factor: LEVY_DISTANCE_SCALING_FACTOR,
            success_distance: LEVY_SUCCESS_DISTANCE,
            slowing_radius: LEVY_SLOWING_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    pub starting_food_multiplier: f64,
    pub starting_food_variation: f64,
    pub starvation_threshold: i64,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            starting_food_multiplier: STARTING_FOOD_MULTIPLIER,
            starting_food_variation: STARTING_FOOD_VARIATION,
            starvation_threshold: STARVATION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: String,
    /// Fraction of the current maximum at which this color starts.
    pub threshold: f64,
}

impl ColorStop {
    fn new(color: &str, threshold: f64) -> Self {
        Self {
            color: color.to_owned(),
            threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub cell_size: f64,
    pub sample_interval: u64,
    pub color_stops: Vec<ColorStop>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cell_size: HEATMAP_CELL_SIZE,
            sample_interval: HEATMAP_SAMPLE_INTERVAL,
            color_stops: vec![
                ColorStop::new("#ff0000", 0.75),
                ColorStop::new("#ffff00", 0.5),
                ColorStop::new("#00ff00", 0.25),
                ColorStop::new("#0000ff", 0.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub max_force: f64,
    pub wander_circle_distance: f64,
    pub wander_circle_radius: f64,
    pub max_angle_change_deg: f64,
    pub look_ahead_multiplier: f64,
    pub avoid_angle_deg: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_force: MAX_FORCE,
            wander_circle_distance: WANDER_CIRCLE_DISTANCE,
            wander_circle_radius: WANDER_CIRCLE_RADIUS,
            max_angle_change_deg: MAX_ANGLE_CHANGE_DEG,
            look_ahead_multiplier: LOOK_AHEAD_MULTIPLIER,
            avoid_angle_deg: AVOID_ANGLE_DEG,
        }
    }
}

/// Parameters for density-weighted spawning over a region grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub units_per_pixel: f64,
    pub ridge_distance: f64,
    pub ridge_weight: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            units_per_pixel: 1.0,
            ridge_distance: 0.0,
            ridge_weight: 1.0,
        }
    }
}

/// Consumed by renderers only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    pub look_ahead: bool,
    pub sight: bool,
    pub heatmap: bool,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            look_ahead: true,
            sight: true,
            heatmap: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: Option<u64>,
    pub world: WorldConfig,
    pub species: BTreeMap<String, SpeciesProfile>,
    pub prey_patch: PreyPatchConfig,
    pub levy_flight: LevyFlightConfig,
    pub food: FoodConfig,
    pub heatmap: HeatmapConfig,
    pub steering: SteeringConfig,
    pub map: Option<MapConfig>,
    pub agent_chunk_size: f64,
    pub steps_per_update: u32,
    pub draw: DrawConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            world: WorldConfig::default(),
            species: BTreeMap::new(),
            prey_patch: PreyPatchConfig::default(),
            levy_flight: LevyFlightConfig::default(),
            food: FoodConfig::default(),
            heatmap: HeatmapConfig::default(),
            steering: SteeringConfig::default(),
            map: None,
            agent_chunk_size: AGENT_CHUNK_SIZE,
            steps_per_update: DEFAULT_STEPS_PER_UPDATE,
            draw: DrawConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// The stock three-species setup.
    pub fn new() -> Self {
        let mut config = Self::default();

        // --- Red ---
        config.species.insert(
            "red".to_owned(),
            SpeciesProfile::new(1.0, 25.0, RoamingPattern::LevyFlight, "#ff0000"),
        );
        // --- Green: faster, same sight ---
        config.species.insert(
            "green".to_owned(),
            SpeciesProfile::new(1.5, 25.0, RoamingPattern::LevyFlight, "#00ff00"),
        );
        // --- Magenta: slow but sharp-eyed ---
        config.species.insert(
            "magenta".to_owned(),
            SpeciesProfile::new(1.0, 50.0, RoamingPattern::LevyFlight, "#ff00ff"),
        );

        for name in config.species.keys() {
            config
                .world
                .agents
                .insert(name.clone(), INITIAL_AGENTS_PER_SPECIES);
        }
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        if !(w.width.is_finite() && w.height.is_finite() && w.width > 0.0 && w.height > 0.0) {
            return Err(ConfigError::InvalidWorldSize {
                width: w.width,
                height: w.height,
            });
        }
        positive(self.agent_chunk_size, "agent_chunk_size")?;
        positive(self.prey_patch.spatial_chunk_size, "prey_patch.spatial_chunk_size")?;
        positive(self.prey_patch.initial_size, "prey_patch.initial_size")?;
        positive(self.levy_flight.fractal_dimension, "levy_flight.fractal_dimension")?;
        positive(self.heatmap.cell_size, "heatmap.cell_size")?;
        positive(self.steering.max_force, "steering.max_force")?;
        if self.heatmap.sample_interval == 0 {
            return Err(ConfigError::NonPositive("heatmap.sample_interval"));
        }
        if self.steps_per_update == 0 {
            return Err(ConfigError::NonPositive("steps_per_update"));
        }
        if let Some(map) = &self.map {
            positive(map.units_per_pixel, "map.units_per_pixel")?;
        }
        for name in w.agents.keys() {
            if !self.species.contains_key(name) {
                return Err(ConfigError::UnknownSpecies(name.clone()));
            }
        }
        for (name, profile) in &self.species {
            if !(profile.max_speed.is_finite() && profile.max_speed > 0.0) {
                return Err(ConfigError::InvalidSpecies(name.clone(), "max_speed must be positive"));
            }
            if !(profile.sight.is_finite() && profile.sight >= 0.0) {
                return Err(ConfigError::InvalidSpecies(name.clone(), "sight must be non-negative"));
            }
            if profile.food_capacity < 0 {
                return Err(ConfigError::InvalidSpecies(
                    name.clone(),
                    "food_capacity must be non-negative",
                ));
            }
        }
        for stop in &self.heatmap.color_stops {
            if !(0.0..=1.0).contains(&stop.threshold) {
                return Err(ConfigError::InvalidColorStop {
                    color: stop.color.clone(),
                    threshold: stop.threshold,
                });
            }
        }
        Ok(())
    }

    pub fn total_agents(&self) -> usize {
        self.world.agents.values().sum()
    }
}

fn positive(value: f64, name: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_config_is_valid() {
        let config = SimulationConfig::new();
        config.validate().unwrap();
        assert_eq!(config.species.len(), 3);
        assert_eq!(config.total_agents(), 30);
    }

    #[test]
    fn spawn_table_must_name_known_species() {
        let mut config = SimulationConfig::new();
        config.world.agents.insert("blue".to_owned(), 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownSpecies(name)) if name == "blue"
        ));
    }

    #[test]
    fn rejects_non_positive_chunk_size() {
        let mut config = SimulationConfig::new();
        config.prey_patch.spatial_chunk_size = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::NonPositive(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "seed": 3,
            "world": { "width": 200, "height": 100, "agents": { "hawk": 2 } },
            "species": { "hawk": { "max_speed": 2.0, "roaming_pattern": "wander" } }
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.world.prey_patches, INITIAL_PREY_PATCH_COUNT);
        let hawk = &config.species["hawk"];
        assert_eq!(hawk.roaming_pattern, RoamingPattern::Wander);
        assert_eq!(hawk.sight, 25.0);
        assert_eq!(config.levy_flight.fractal_dimension, LEVY_FRACTAL_DIMENSION);
    }
}
// --- End of File: config.rs ---
