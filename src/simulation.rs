// --- File: simulation.rs ---
use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agent::{Agent, AgentId, starting_food};
use crate::behavior::{BehaviorContext, BehaviorState};
use crate::config::SimulationConfig;
use crate::constants::MAX_STEPS_PER_UPDATE;
use crate::error::SimError;
use crate::heatmap::Heatmap;
use crate::patch::{PatchGrowth, PatchId, PatchNamer, PreyPatch};
use crate::region::{DensityMap, OpenWater, RegionGrid, RegionOracle};
use crate::results::{ResultRow, ResultSink, RunSummary};
use crate::snapshot::{AgentView, HeatmapView, PatchView, WorldSnapshot};
use crate::spatial::SpatialIndex;
use crate::species::SpeciesProfile;
use crate::utils::{Bounds, rand_range, within_distance};
use crate::vector::Vector2;

pub type SimRng = StdRng;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing ran.
    Paused,
    Running,
    /// Every agent has arrived or starved. Handed out exactly once per run.
    Finalized(RunSummary),
}

fn seeded_rng(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => SimRng::seed_from_u64(seed),
        None => SimRng::from_entropy(),
    }
}

fn behavior_context<'a>(
    config: &'a SimulationConfig,
    bounds: Bounds,
    patches: &'a [PreyPatch],
    patch_index: &'a SpatialIndex<PatchId>,
    max_patch_radius: f64,
    regions: &'a dyn RegionOracle,
) -> BehaviorContext<'a> {
    BehaviorContext {
        patches,
        patch_index,
        max_patch_radius,
        bounds,
        regions,
        levy: &config.levy_flight,
        steering: &config.steering,
    }
}

/// Owns the world and advances it one tick at a time.
pub struct Simulation {
    config: SimulationConfig,
    bounds: Bounds,
    species: BTreeMap<String, Arc<SpeciesProfile>>,
    growth: PatchGrowth,
    rng: SimRng,
    regions: Box<dyn RegionOracle + Send>,
    density: Option<DensityMap>,

    // Active agents in id order; removals keep the order.
    agents: Vec<Agent>,
    dead_agents: Vec<Agent>,
    patches: Vec<PreyPatch>,
    agent_index: SpatialIndex<AgentId>,
    patch_index: SpatialIndex<PatchId>,
    max_patch_radius: f64,
    patch_namer: PatchNamer,
    next_agent_id: u32,

    heatmap: Heatmap,
    success_log: BTreeMap<String, Vec<u64>>,
    alive_counts: BTreeMap<String, usize>,
    spawn_counts: BTreeMap<String, usize>,
    total_agents: usize,
    successes: usize,
    // Starvations of agents that never arrived.
    unresolved_deaths: usize,

    tick: u64,
    paused: bool,
    finalized: bool,
    summary: Option<RunSummary>,
    steps_per_update: u32,
    selected: Option<AgentId>,
    simulation_id: u32,
}

impl Simulation {
    /// Open-water world sized by `config.world`.
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut sim = Self::build(config, Box::new(OpenWater), None);
        sim.populate()?;
        Ok(sim)
    }

    /// World bounded and shaped by a classified region raster. Agents spawn
    /// through the raster's density map.
    pub fn with_regions(mut config: SimulationConfig, mut grid: RegionGrid) -> Result<Self, SimError> {
        grid.check()?;
        if let Some(map) = &config.map {
            grid.units_per_pixel = map.units_per_pixel;
        }
        config.world.width = grid.world_width();
        config.world.height = grid.world_height();
        config.validate()?;

        let map = config.map.clone().unwrap_or_default();
        let density = DensityMap::new(&grid, map.ridge_distance, map.ridge_weight);
        log::info!(
            "Loaded {}x{} region grid ({:.1} total spawn weight)",
            grid.width,
            grid.height,
            density.total_weight()
        );
        let mut sim = Self::build(config, Box::new(grid), Some(density));
        sim.populate()?;
        Ok(sim)
    }

    fn build(
        config: SimulationConfig,
        regions: Box<dyn RegionOracle + Send>,
        density: Option<DensityMap>,
    ) -> Self {
        let bounds = Bounds::new(config.world.width, config.world.height);
        let species = config
            .species
            .iter()
            .map(|(name, profile)| (name.clone(), Arc::new(profile.clone())))
            .collect();
        Self {
            bounds,
            species,
            growth: PatchGrowth::from_config(&config.prey_patch),
            rng: seeded_rng(config.seed),
            regions,
            density,
            agents: Vec::new(),
            dead_agents: Vec::new(),
            patches: Vec::new(),
            agent_index: SpatialIndex::new(config.agent_chunk_size, false),
            patch_index: SpatialIndex::new(config.prey_patch.spatial_chunk_size, true),
            max_patch_radius: 0.0,
            patch_namer: PatchNamer::default(),
            next_agent_id: 0,
            heatmap: Heatmap::new(&config.heatmap, bounds.width, bounds.height),
            success_log: BTreeMap::new(),
            alive_counts: BTreeMap::new(),
            spawn_counts: BTreeMap::new(),
            total_agents: 0,
            successes: 0,
            unresolved_deaths: 0,
            tick: 0,
            paused: false,
            finalized: false,
            summary: None,
            steps_per_update: config.steps_per_update.clamp(1, MAX_STEPS_PER_UPDATE),
            selected: None,
            simulation_id: 1,
            config,
        }
    }

    /// Patches first, then every species' agents in name order.
    fn populate(&mut self) -> Result<(), SimError> {
        for _ in 0..self.config.world.prey_patches {
            self.spawn_patch();
        }
        let spawn_table: Vec<(String, usize)> = self
            .config
            .world
            .agents
            .iter()
            .map(|(name, &count)| (name.clone(), count))
            .collect();
        for (species, count) in spawn_table {
            for _ in 0..count {
                self.spawn_agent(&species)?;
            }
        }
        log::info!(
            "Simulation {} started: {} agents, {} prey patches",
            self.simulation_id,
            self.total_agents,
            self.patches.len()
        );
        Ok(())
    }

    /// Uniform (or density-weighted) position that is in bounds and
    /// passable, retried up to the spawn budget.
    fn random_position(&mut self, margin: f64, weighted: bool) -> Option<Vector2> {
        for _ in 0..self.config.world.spawn_attempts.max(1) {
            let candidate = match (&self.density, weighted) {
                (Some(density), true) => density.random_point(&mut self.rng)?,
                _ => Vector2::new(
                    rand_range(&mut self.rng, margin, self.bounds.width - margin),
                    rand_range(&mut self.rng, margin, self.bounds.height - margin),
                ),
            };
            if self.bounds.contains_point(candidate) && self.regions.is_passable(candidate.x, candidate.y) {
                return Some(candidate);
            }
        }
        None
    }

    fn spawn_patch(&mut self) -> Option<PatchId> {
        let margin = self.config.prey_patch.min_dist_from_border;
        match self.random_position(margin, false) {
            Some(pos) => Some(self.place_patch(pos)),
            None => {
                log::warn!(
                    "No valid prey patch position after {} attempts; skipping",
                    self.config.world.spawn_attempts
                );
                None
            }
        }
    }

    fn check_open(&self, pos: Vector2) -> Result<(), SimError> {
        if self.bounds.contains_point(pos) && self.regions.is_passable(pos.x, pos.y) {
            Ok(())
        } else {
            Err(SimError::BlockedPosition { x: pos.x, y: pos.y })
        }
    }

    /// Places a prey patch at `pos` with the configured initial size.
    pub fn add_patch(&mut self, pos: Vector2) -> Result<PatchId, SimError> {
        self.check_open(pos)?;
        Ok(self.place_patch(pos))
    }

    fn place_patch(&mut self, pos: Vector2) -> PatchId {
        let id = PatchId(self.patches.len() as u32);
        let patch = PreyPatch::new(
            id,
            self.patch_namer.next_name(),
            pos,
            self.config.prey_patch.initial_size,
        );
        self.patch_index.insert(id, pos);
        self.max_patch_radius = self.max_patch_radius.max(patch.radius);
        log::debug!("Created {} (#{}) at ({:.1}, {:.1})", id, patch.name, pos.x, pos.y);
        self.patches.push(patch);
        id
    }

    /// Spawns one agent of `species` at a random open position. Returns
    /// `Ok(None)` when no position was found within the spawn budget.
    pub fn spawn_agent(&mut self, species: &str) -> Result<Option<AgentId>, SimError> {
        if !self.species.contains_key(species) {
            return Err(SimError::UnknownSpecies(species.to_owned()));
        }
        match self.random_position(0.0, true) {
            Some(pos) => self.place_agent(species, pos).map(Some),
            None => {
                log::warn!(
                    "No valid spawn position for a {} agent after {} attempts; skipping",
                    species,
                    self.config.world.spawn_attempts
                );
                Ok(None)
            }
        }
    }

    /// Spawns an agent at `pos`, which must be in bounds and passable.
    pub fn spawn_agent_at(&mut self, species: &str, pos: Vector2) -> Result<AgentId, SimError> {
        if !self.species.contains_key(species) {
            return Err(SimError::UnknownSpecies(species.to_owned()));
        }
        self.check_open(pos)?;
        self.place_agent(species, pos)
    }

    fn place_agent(&mut self, species: &str, pos: Vector2) -> Result<AgentId, SimError> {
        let profile = self
            .species
            .get(species)
            .cloned()
            .ok_or_else(|| SimError::UnknownSpecies(species.to_owned()))?;

        let id = AgentId(self.next_agent_id);
        let food = starting_food(profile.food_capacity, &self.config.food, &mut self.rng);
        let state = {
            let ctx = behavior_context(
                &self.config,
                self.bounds,
                &self.patches,
                &self.patch_index,
                self.max_patch_radius,
                &*self.regions,
            );
            BehaviorState::initial(profile.roaming_pattern, pos, &ctx, &mut self.rng)
        };
        let mut agent = Agent::new(id, species, profile, pos, food, state, &mut self.rng);
        agent.last_cell_key = Some(self.agent_index.insert(id, pos));

        self.next_agent_id += 1;
        self.total_agents += 1;
        *self.alive_counts.entry(species.to_owned()).or_default() += 1;
        *self.spawn_counts.entry(species.to_owned()).or_default() += 1;
        self.success_log.entry(species.to_owned()).or_default();
        log::debug!("Spawned {} ({}) with {} food in state {}", id, species, food, agent.state.name());
        self.agents.push(agent);
        Ok(id)
    }

    // --- Tick ---

    /// Advances one tick. A paused simulation does nothing.
    pub fn step(&mut self) -> TickOutcome {
        if self.paused {
            return TickOutcome::Paused;
        }
        self.tick += 1;

        let threshold = self.config.food.starvation_threshold;
        let mut outcome = TickOutcome::Running;
        let mut starved = false;
        for i in 0..self.agents.len() {
            if !self.agents[i].alive {
                continue;
            }
            if let Some(patch) = self.move_agent(i) {
                self.record_arrival(i, patch);
                if let Some(summary) = self.check_termination() {
                    outcome = TickOutcome::Finalized(summary);
                }
            }
            starved |= self.agents[i].consume_food(threshold);
        }

        if starved {
            self.evict_dead();
        }

        if self.tick % self.config.heatmap.sample_interval == 0 {
            for agent in self.agents.iter().filter(|a| !a.is_resting()) {
                self.heatmap.apply(agent.pos);
            }
        }

        // Also covers worlds where nobody spawned.
        if let Some(summary) = self.check_termination() {
            outcome = TickOutcome::Finalized(summary);
        }
        outcome
    }

    /// Avoidance or behavior, then integration and re-keying. Returns the
    /// patch reached this tick, if any.
    fn move_agent(&mut self, i: usize) -> Option<PatchId> {
        let tick = self.tick;
        let agent = &mut self.agents[i];
        if agent.is_resting() {
            return None;
        }

        let mut arrived = None;
        let avoiding = agent.avoid_boundaries(
            self.bounds,
            &*self.regions,
            &self.config.steering,
            &mut self.rng,
        );
        if !avoiding {
            let ctx = behavior_context(
                &self.config,
                self.bounds,
                &self.patches,
                &self.patch_index,
                self.max_patch_radius,
                &*self.regions,
            );
            let state = agent.state;
            let step = state.execute(agent, &ctx, &mut self.rng);
            agent.state = step.next;
            arrived = step.arrived;
        }

        match arrived {
            Some(patch) => agent.arrive(patch, tick),
            None => {
                let max_speed = agent.max_speed();
                agent.steering.update(
                    &mut agent.pos,
                    &mut agent.velocity,
                    max_speed,
                    self.config.steering.max_force,
                );
                agent.pos = self.bounds.clamp(agent.pos);
                agent.refresh_facing();
            }
        }

        let key = self.agent_index.key(agent.pos);
        match agent.last_cell_key {
            Some(previous) if previous == key => {}
            Some(previous) => self.agent_index.rekey(agent.id, previous, key),
            None => self.agent_index.insert_at_key(agent.id, key),
        }
        agent.last_cell_key = Some(key);
        arrived
    }

    fn record_arrival(&mut self, i: usize, patch_id: PatchId) {
        let agent = &self.agents[i];
        let Some(patch) = self.patches.get_mut(patch_id.0 as usize) else {
            log::warn!("{} arrived at unknown {}", agent.id, patch_id);
            return;
        };
        patch.on_agent_arrive(agent.id, &self.growth);
        self.max_patch_radius = self.max_patch_radius.max(patch.radius);
        self.success_log
            .entry(agent.species.clone())
            .or_default()
            .push(self.tick);
        self.successes += 1;
        log::debug!(
            "{} ({}) reached {} at tick {}; radius now {:.1}",
            agent.id,
            agent.species,
            patch_id,
            self.tick,
            patch.radius
        );
    }

    /// Moves starved agents out of the active list, keeping its order.
    fn evict_dead(&mut self) {
        let agents = std::mem::take(&mut self.agents);
        for agent in agents {
            if agent.alive {
                self.agents.push(agent);
                continue;
            }
            match agent.last_cell_key {
                Some(key) => {
                    self.agent_index.remove_at_key(agent.id, key);
                }
                None => log::warn!("{} starved without an index entry", agent.id),
            }
            if let Some(count) = self.alive_counts.get_mut(&agent.species) {
                *count = count.saturating_sub(1);
            }
            if agent.success_step.is_none() {
                self.unresolved_deaths += 1;
            }
            log::debug!("{} ({}) starved at tick {}", agent.id, agent.species, self.tick);
            self.dead_agents.push(agent);
        }
    }

    fn check_termination(&mut self) -> Option<RunSummary> {
        if self.finalized || self.successes + self.unresolved_deaths < self.total_agents {
            return None;
        }
        self.paused = true;
        self.finalized = true;
        let summary = RunSummary::new(
            self.simulation_id,
            self.tick,
            self.unresolved_deaths,
            self.starved_after_arrival(),
            &self.success_log,
        );
        log::info!(
            "Simulation {} finished at tick {}: {} arrived, {} starved ({} more after arriving)",
            self.simulation_id,
            self.tick,
            summary.successes,
            summary.deaths,
            summary.starved_after_arrival
        );
        self.summary = Some(summary.clone());
        Some(summary)
    }

    /// Runs up to `steps_per_update` ticks, stopping once paused.
    pub fn update(&mut self) -> Option<RunSummary> {
        for _ in 0..self.steps_per_update {
            match self.step() {
                TickOutcome::Paused => break,
                TickOutcome::Running => {}
                TickOutcome::Finalized(summary) => return Some(summary),
            }
        }
        None
    }

    // --- Controls ---

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused at tick {}", self.tick);
        }
    }

    /// No-op once the run has finished.
    pub fn resume(&mut self) {
        if self.finalized {
            log::info!("Simulation {} already finished; reset to run again", self.simulation_id);
            return;
        }
        if self.paused {
            self.paused = false;
            log::info!("Simulation resumed at tick {}", self.tick);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn set_steps_per_update(&mut self, steps: u32) {
        self.steps_per_update = steps.clamp(1, MAX_STEPS_PER_UPDATE);
        log::debug!("Steps per update: {}", self.steps_per_update);
    }

    /// Selects an active agent. Returns `false` if there is no such agent.
    pub fn select_agent(&mut self, id: AgentId) -> bool {
        if self.agent(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        self.selected.and_then(|id| self.agent(id))
    }

    /// Active agents within `radius` of `pos`, nearest first.
    pub fn agents_near(&self, pos: Vector2, radius: f64) -> Vec<AgentId> {
        let mut hits: Vec<(f64, AgentId)> = self
            .agent_index
            .query_dynamic(pos, radius)
            .into_iter()
            .filter_map(|id| self.agent(id))
            .filter(|agent| within_distance(pos, agent.pos, radius))
            .map(|agent| (pos.distance_squared(agent.pos), agent.id))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Starts a fresh run from the same configuration and seed.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.simulation_id += 1;
        log::info!("Restarting as simulation {}", self.simulation_id);
        self.rng = seeded_rng(self.config.seed);
        self.agents.clear();
        self.dead_agents.clear();
        self.patches.clear();
        self.agent_index.clear();
        self.patch_index.clear();
        self.max_patch_radius = 0.0;
        self.patch_namer.reset();
        self.next_agent_id = 0;
        self.heatmap.clear();
        self.success_log.clear();
        self.alive_counts.clear();
        self.spawn_counts.clear();
        self.total_agents = 0;
        self.successes = 0;
        self.unresolved_deaths = 0;
        self.tick = 0;
        self.paused = false;
        self.finalized = false;
        self.summary = None;
        self.selected = None;
        self.populate()
    }

    // --- Queries ---

    /// Species lookup; an unknown key is reported and yields `None`.
    pub fn species_profile(&self, species: &str) -> Option<&SpeciesProfile> {
        let profile = self.species.get(species).map(Arc::as_ref);
        if profile.is_none() {
            log::warn!("Species \"{}\" not found!", species);
        }
        profile
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .map(|i| &self.agents[i])
    }

    /// One row per spawned agent, active or dead, in id order.
    pub fn results(&self) -> Vec<ResultRow> {
        let mut rows: Vec<ResultRow> = self
            .agents
            .iter()
            .chain(&self.dead_agents)
            .map(|agent| ResultRow {
                simulation_id: self.simulation_id,
                agent_id: agent.id,
                species: agent.species.clone(),
                success_step: agent.success_step,
                patch_name: agent
                    .arrived_patch
                    .and_then(|p| self.patches.get(p.0 as usize))
                    .map(|p| p.name),
            })
            .collect();
        rows.sort_by_key(|row| row.agent_id);
        rows
    }

    pub fn write_results(&self, sink: &mut dyn ResultSink) -> std::io::Result<()> {
        for row in self.results() {
            sink.record(&row)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            paused: self.paused,
            agents: self
                .agents
                .iter()
                .map(|a| AgentView::new(a, self.selected == Some(a.id)))
                .collect(),
            patches: self.patches.iter().map(PatchView::from).collect(),
            heatmap: HeatmapView::from(&self.heatmap),
            draw: self.config.draw,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn dead_agents(&self) -> &[Agent] {
        &self.dead_agents
    }

    pub fn patches(&self) -> &[PreyPatch] {
        &self.patches
    }

    pub fn agent_index(&self) -> &SpatialIndex<AgentId> {
        &self.agent_index
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn success_log(&self) -> &BTreeMap<String, Vec<u64>> {
        &self.success_log
    }

    pub fn alive_count(&self, species: &str) -> usize {
        self.alive_counts.get(species).copied().unwrap_or(0)
    }

    pub fn spawn_count(&self, species: &str) -> usize {
        self.spawn_counts.get(species).copied().unwrap_or(0)
    }

    pub fn total_agents(&self) -> usize {
        self.total_agents
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    /// Starvations of agents that never reached a patch. Together with
    /// `successes` this never exceeds `total_agents`.
    pub fn deaths(&self) -> usize {
        self.unresolved_deaths
    }

    pub fn starved_after_arrival(&self) -> usize {
        self.dead_agents.len() - self.unresolved_deaths
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn run_summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn steps_per_update(&self) -> u32 {
        self.steps_per_update
    }

    pub fn simulation_id(&self) -> u32 {
        self.simulation_id
    }
}
