// --- File: species.rs ---
use serde::{Deserialize, Serialize};

use crate::constants::FOOD_CAPACITY;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoamingPattern {
    #[default]
    LevyFlight,
    Wander,
}

/// Immutable per-species parameters, shared by every agent of the species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesProfile {
    pub max_speed: f64,
    pub sight: f64,
    pub size_multiplier: f64,
    pub food_capacity: i64,
    pub roaming_pattern: RoamingPattern,
    /// Rendering only; `#rrggbb`.
    pub color: Option<String>,
}

impl Default for SpeciesProfile {
    fn default() -> Self {
        Self {
            max_speed: 1.0,
            sight: 25.0,
            size_multiplier: 1.0,
            food_capacity: FOOD_CAPACITY,
            roaming_pattern: RoamingPattern::LevyFlight,
            color: None,
        }
    }
}

impl SpeciesProfile {
    pub fn new(max_speed: f64, sight: f64, roaming_pattern: RoamingPattern, color: &str) -> Self {
        Self {
            max_speed,
            sight,
            roaming_pattern,
            color: Some(color.to_owned()),
            ..Self::default()
        }
    }

    /// Color lookup for renderers; a missing entry is reported, not fatal.
    pub fn color_or_warn(&self, species: &str) -> Option<&str> {
        if self.color.is_none() {
            log::warn!("Color for species \"{}\" is not defined!", species);
        }
        self.color.as_deref()
    }
}
