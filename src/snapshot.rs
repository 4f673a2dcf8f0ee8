// --- File: snapshot.rs ---

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use crate::agent::{Agent, AgentId};
use crate::config::DrawConfig;
use crate::heatmap::Heatmap;
use crate::patch::{PatchId, PreyPatch};
use crate::utils::parse_hex_color;

/// Base agent size in world units, scaled by the species multiplier.
pub const AGENT_BASE_SIZE: f32 = 5.0;
const FALLBACK_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub species: String,
    pub position: [f64; 2],
    pub facing: f64,
    pub color: Option<String>,
    pub size_multiplier: f64,
    pub food_percent: f64,
    pub state: &'static str,
    pub selected: bool,
}

impl AgentView {
    pub fn new(agent: &Agent, selected: bool) -> Self {
        Self {
            id: agent.id,
            species: agent.species.clone(),
            position: agent.pos.to_array(),
            facing: agent.facing,
            color: agent.profile.color_or_warn(&agent.species).map(str::to_owned),
            size_multiplier: agent.profile.size_multiplier,
            food_percent: agent.food_percent(),
            state: agent.state.name(),
            selected,
        }
    }

    pub fn instance(&self) -> AgentInstance {
        AgentInstance {
            position: [self.position[0] as f32, self.position[1] as f32],
            facing: self.facing as f32,
            size: AGENT_BASE_SIZE * self.size_multiplier as f32,
            color: self
                .color
                .as_deref()
                .and_then(parse_hex_color)
                .unwrap_or(FALLBACK_COLOR),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchView {
    pub id: PatchId,
    pub name: u32,
    pub position: [f64; 2],
    pub radius: f64,
    pub arrivals: usize,
}

impl From<&PreyPatch> for PatchView {
    fn from(patch: &PreyPatch) -> Self {
        Self {
            id: patch.id,
            name: patch.name,
            position: patch.pos.to_array(),
            radius: patch.radius,
            arrivals: patch.arrival_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub size_x: usize,
    pub size_y: usize,
    pub cell_size: f64,
    pub current_max: u32,
    pub values: Vec<u32>,
    /// `(cell index, color)` for every visited cell that maps to a stop.
    pub colors: Vec<(usize, String)>,
}

impl From<&Heatmap> for HeatmapView {
    fn from(heatmap: &Heatmap) -> Self {
        let (size_x, size_y) = heatmap.dimensions();
        let colors = heatmap
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > 0)
            .filter_map(|(i, &v)| heatmap.color_for(v).map(|c| (i, c.to_owned())))
            .collect();
        Self {
            size_x,
            size_y,
            cell_size: heatmap.cell_size(),
            current_max: heatmap.current_max(),
            values: heatmap.values().to_vec(),
            colors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub agents: Vec<AgentView>,
    pub patches: Vec<PatchView>,
    pub heatmap: HeatmapView,
    pub draw: DrawConfig,
}

impl WorldSnapshot {
    /// Per-agent records laid out for a GPU instance buffer.
    pub fn instances(&self) -> Vec<AgentInstance> {
        self.agents.iter().map(AgentView::instance).collect()
    }
}

// Layout must match the instance buffer's vertex attributes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AgentInstance {
    pub position: [f32; 2],
    pub facing: f32,
    pub size: f32,
    pub color: [f32; 4],
}
