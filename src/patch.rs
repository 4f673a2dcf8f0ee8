// --- File: patch.rs ---
use serde::Serialize;

use crate::agent::AgentId;
use crate::config::PreyPatchConfig;
use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatchId(pub u32);

impl std::fmt::Display for PatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "patch-{}", self.0)
    }
}

/// Radius as a function of cumulative arrivals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchGrowth {
    pub bonus_first: f64,
    pub bonus_per_additional: f64,
}

impl PatchGrowth {
    pub fn from_config(config: &PreyPatchConfig) -> Self {
        Self {
            bonus_first: config.bonus_first,
            bonus_per_additional: config.bonus_per_additional,
        }
    }

    pub fn radius(&self, initial_radius: f64, arrivals: usize) -> f64 {
        match arrivals {
            0 => initial_radius,
            n => initial_radius + self.bonus_first + (n - 1) as f64 * self.bonus_per_additional,
        }
    }
}

/// Hands out display names starting at 1; reset with each (re)start.
#[derive(Debug, Clone)]
pub struct PatchNamer {
    next: u32,
}

impl Default for PatchNamer {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PatchNamer {
    pub fn next_name(&mut self) -> u32 {
        let name = self.next;
        self.next += 1;
        name
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

#[derive(Debug, Clone)]
pub struct PreyPatch {
    pub id: PatchId,
    pub name: u32,
    pub pos: Vector2,
    pub initial_radius: f64,
    pub radius: f64,
    /// Arrival order; ids only, agents are owned by the simulation.
    pub arrivals: Vec<AgentId>,
}

impl PreyPatch {
    pub fn new(id: PatchId, name: u32, pos: Vector2, initial_radius: f64) -> Self {
        Self {
            id,
            name,
            pos,
            initial_radius,
            radius: initial_radius,
            arrivals: Vec::new(),
        }
    }

    /// Records an arrival and recomputes the radius from the full count.
    pub fn on_agent_arrive(&mut self, agent: AgentId, growth: &PatchGrowth) {
        self.arrivals.push(agent);
        self.radius = growth.radius(self.initial_radius, self.arrivals.len());
    }

    #[inline]
    pub fn arrival_count(&self) -> usize {
        self.arrivals.len()
    }
}
