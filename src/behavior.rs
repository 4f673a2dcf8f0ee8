// --- File: behavior.rs ---
// Each state picks the steering intent for one tick and returns the next
// state. Arrival bookkeeping stays with the simulation, which owns patches.

use rand::Rng;

use crate::agent::Agent;
use crate::config::{LevyFlightConfig, SteeringConfig};
use crate::patch::{PatchId, PreyPatch};
use crate::region::RegionOracle;
use crate::spatial::SpatialIndex;
use crate::species::RoamingPattern;
use crate::utils::{Bounds, within_distance};
use crate::vector::{Vector2, random_unit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorState {
    Wander,
    LevyFlight { target: Vector2 },
    Seek { target: PatchId },
    Rest,
}

/// Read-only world view handed to a state for one tick.
pub struct BehaviorContext<'a> {
    /// Indexed by `PatchId`.
    pub patches: &'a [PreyPatch],
    pub patch_index: &'a SpatialIndex<PatchId>,
    /// Largest radius any patch has reached so far.
    pub max_patch_radius: f64,
    pub bounds: Bounds,
    pub regions: &'a dyn RegionOracle,
    pub levy: &'a LevyFlightConfig,
    pub steering: &'a SteeringConfig,
}

impl BehaviorContext<'_> {
    fn patch(&self, id: PatchId) -> Option<&PreyPatch> {
        self.patches.get(id.0 as usize)
    }

    fn is_open(&self, p: Vector2) -> bool {
        self.bounds.contains_point(p) && self.regions.is_passable(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub next: BehaviorState,
    /// Set on the tick the agent reaches its patch.
    pub arrived: Option<PatchId>,
}

impl Step {
    fn to(next: BehaviorState) -> Self {
        Self {
            next,
            arrived: None,
        }
    }
}

impl BehaviorState {
    /// Starting state for a freshly spawned agent.
    pub fn initial<R: Rng + ?Sized>(
        pattern: RoamingPattern,
        pos: Vector2,
        ctx: &BehaviorContext<'_>,
        rng: &mut R,
    ) -> Self {
        match pattern {
            RoamingPattern::Wander => BehaviorState::Wander,
            RoamingPattern::LevyFlight => BehaviorState::LevyFlight {
                target: levy_target(pos, ctx, rng),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BehaviorState::Wander => "wander",
            BehaviorState::LevyFlight { .. } => "levy_flight",
            BehaviorState::Seek { .. } => "seek",
            BehaviorState::Rest => "rest",
        }
    }

    #[inline]
    pub fn is_rest(&self) -> bool {
        matches!(self, BehaviorState::Rest)
    }

    pub fn execute<R: Rng + ?Sized>(
        self,
        agent: &mut Agent,
        ctx: &BehaviorContext<'_>,
        rng: &mut R,
    ) -> Step {
        match self {
            BehaviorState::Wander => {
                agent.steering.wander(agent.velocity, ctx.steering, rng);
                match scan_for_patch(agent.pos, agent.sight(), ctx) {
                    Some(target) => Step::to(BehaviorState::Seek { target }),
                    None => Step::to(BehaviorState::Wander),
                }
            }
            BehaviorState::LevyFlight { mut target } => {
                if let Some(patch) = scan_for_patch(agent.pos, agent.sight(), ctx) {
                    return Step::to(BehaviorState::Seek { target: patch });
                }
                let reached = ctx.levy.success_distance;
                if agent.pos.distance_squared(target) <= reached * reached {
                    target = levy_target(agent.pos, ctx, rng);
                }
                agent.steering.seek(
                    agent.pos,
                    agent.velocity,
                    agent.max_speed(),
                    target,
                    ctx.levy.slowing_radius,
                );
                Step::to(BehaviorState::LevyFlight { target })
            }
            BehaviorState::Seek { target } => {
                let Some(patch) = ctx.patch(target) else {
                    log::warn!("Agent {} lost track of {}; resuming search", agent.id, target);
                    let pattern = agent.profile.roaming_pattern;
                    return Step::to(BehaviorState::initial(pattern, agent.pos, ctx, rng));
                };
                agent.steering.seek(
                    agent.pos,
                    agent.velocity,
                    agent.max_speed(),
                    patch.pos,
                    patch.initial_radius,
                );
                if agent.pos.distance_squared(patch.pos) <= patch.initial_radius * patch.initial_radius
                {
                    Step {
                        next: BehaviorState::Rest,
                        arrived: Some(target),
                    }
                } else {
                    Step::to(BehaviorState::Seek { target })
                }
            }
            BehaviorState::Rest => Step::to(BehaviorState::Rest),
        }
    }
}

/// Nearest patch whose edge lies within sight, ties going to the lowest id.
pub fn scan_for_patch(pos: Vector2, sight: f64, ctx: &BehaviorContext<'_>) -> Option<PatchId> {
    let index = ctx.patch_index;
    let reach = sight + ctx.max_patch_radius;
    let dynamic;
    let candidates: &[PatchId] = if index.is_replicated() && reach <= index.cell_size() {
        index.query_single(pos)
    } else {
        dynamic = index.query_dynamic(pos, reach);
        &dynamic
    };

    let mut best: Option<(f64, PatchId)> = None;
    for &id in candidates {
        let Some(patch) = ctx.patch(id) else {
            continue;
        };
        if !within_distance(pos, patch.pos, sight + patch.radius) {
            continue;
        }
        let dist_sq = pos.distance_squared(patch.pos);
        let closer = match best {
            None => true,
            Some((best_sq, best_id)) => dist_sq < best_sq || (dist_sq == best_sq && id < best_id),
        };
        if closer {
            best = Some((dist_sq, id));
        }
    }
    best.map(|(_, id)| id)
}

/// Heavy-tailed step: length `(1-u)^(-1/D) * scale` in a random direction.
/// Candidates outside the world (or on impassable ground) are redrawn until
/// the attempt budget runs out, after which the last draw is kept.
pub fn levy_target<R: Rng + ?Sized>(pos: Vector2, ctx: &BehaviorContext<'_>, rng: &mut R) -> Vector2 {
    let params = ctx.levy;
    let attempts = params.max_attempts.max(1);
    let mut candidate = pos;
    for _ in 0..attempts {
        let u: f64 = rng.r#gen();
        let magnitude = (1.0 - u).powf(-1.0 / params.fractal_dimension) * params.distance_scaling_factor;
        candidate = pos + random_unit(rng) * magnitude;
        if ctx.is_open(candidate) {
            return candidate;
        }
    }
    log::debug!(
        "Levy flight: no open target after {} attempts, keeping ({:.1}, {:.1})",
        attempts,
        candidate.x,
        candidate.y
    );
    candidate
}
