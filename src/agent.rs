// --- File: agent.rs ---
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::behavior::BehaviorState;
use crate::config::{FoodConfig, SteeringConfig};
use crate::patch::PatchId;
use crate::region::RegionOracle;
use crate::spatial::CellKey;
use crate::species::SpeciesProfile;
use crate::steering::Steering;
use crate::utils::{Bounds, cardinal_direction, rand_range, to_radians};
use crate::vector::{Vector2, VectorExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bird-{}", self.0)
    }
}

/// A foraging bird.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub species: String,
    pub profile: Arc<SpeciesProfile>,
    pub pos: Vector2,
    pub velocity: Vector2,
    /// Heading in radians; kept from the last non-zero velocity.
    pub facing: f64,
    pub food: i64,
    pub alive: bool,
    pub state: BehaviorState,
    /// Primary cell in the agent index; `None` until first inserted.
    pub last_cell_key: Option<CellKey>,
    pub success_step: Option<u64>,
    pub arrived_patch: Option<PatchId>,
    pub steering: Steering,
}

impl Agent {
    pub fn new<R: Rng + ?Sized>(
        id: AgentId,
        species: &str,
        profile: Arc<SpeciesProfile>,
        pos: Vector2,
        food: i64,
        state: BehaviorState,
        rng: &mut R,
    ) -> Self {
        let velocity = Vector2::new(rng.r#gen(), rng.r#gen()).truncated(profile.max_speed);
        let mut agent = Self {
            id,
            species: species.to_owned(),
            profile,
            pos,
            velocity,
            facing: 0.0,
            food,
            alive: true,
            state,
            last_cell_key: None,
            success_step: None,
            arrived_patch: None,
            steering: Steering::random(rng),
        };
        agent.refresh_facing();
        agent
    }

    #[inline]
    pub fn max_speed(&self) -> f64 {
        self.profile.max_speed
    }

    #[inline]
    pub fn sight(&self) -> f64 {
        self.profile.sight
    }

    #[inline]
    pub fn is_resting(&self) -> bool {
        self.state.is_rest()
    }

    pub fn refresh_facing(&mut self) {
        if self.velocity.length_squared() != 0.0 {
            self.facing = self.velocity.heading();
        }
    }

    pub fn food_percent(&self) -> f64 {
        match self.profile.food_capacity {
            0 => 0.0,
            capacity => (self.food.max(0) as f64 / capacity as f64).min(1.0),
        }
    }

    /// Steers away from the world edge (or impassable ground) ahead of the
    /// agent. Returns `true` when it took over steering for this tick.
    pub fn avoid_boundaries<R: Rng + ?Sized>(
        &mut self,
        bounds: Bounds,
        regions: &dyn RegionOracle,
        params: &SteeringConfig,
        rng: &mut R,
    ) -> bool {
        let look_ahead = self.pos
            + self
                .velocity
                .with_magnitude(self.max_speed() * params.look_ahead_multiplier);
        if bounds.contains_point(look_ahead) && regions.is_passable(look_ahead.x, look_ahead.y) {
            return false;
        }

        let avoid_angle = to_radians(params.avoid_angle_deg);
        let rotation_offset = rand_range(rng, -avoid_angle, avoid_angle);
        let new_target = self.pos
            + (-cardinal_direction(self.velocity))
                .rotated(rotation_offset)
                .with_magnitude(self.velocity.length());
        self.steering
            .seek(self.pos, self.velocity, self.max_speed(), new_target, 0.0);
        self.steering.set_wander_angle_towards(self.pos, new_target);
        true
    }

    /// Arrival at a patch: stop dead and remember where and when.
    pub fn arrive(&mut self, patch: PatchId, tick: u64) {
        self.success_step = Some(tick);
        self.arrived_patch = Some(patch);
        self.velocity = Vector2::ZERO;
        self.steering.reset();
        self.state = BehaviorState::Rest;
    }

    /// Burns one unit of food. Returns `true` if the agent starved this tick.
    pub fn consume_food(&mut self, starvation_threshold: i64) -> bool {
        if !self.alive {
            return false;
        }
        self.food -= 1;
        if self.food <= starvation_threshold {
            self.alive = false;
            return true;
        }
        false
    }
}

/// `floor(capacity * min(multiplier ± variation, 1))`, never negative.
pub fn starting_food<R: Rng + ?Sized>(capacity: i64, params: &FoodConfig, rng: &mut R) -> i64 {
    let variation = params.starting_food_variation.abs();
    let factor = (params.starting_food_multiplier + rand_range(rng, -variation, variation)).clamp(0.0, 1.0);
    (capacity as f64 * factor).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::OpenWater;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn make_agent(pos: Vector2, velocity: Vector2) -> Agent {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = Agent::new(
            AgentId(1),
            "red",
            Arc::new(SpeciesProfile::default()),
            pos,
            10,
            BehaviorState::Wander,
            &mut rng,
        );
        agent.velocity = velocity;
        agent
    }

    #[test]
    fn spawn_velocity_respects_max_speed() {
        let mut rng = StdRng::seed_from_u64(42);
        let profile = Arc::new(SpeciesProfile {
            max_speed: 0.5,
            ..SpeciesProfile::default()
        });
        for i in 0..50 {
            let agent = Agent::new(AgentId(i), "x", profile.clone(), Vector2::ZERO, 1, BehaviorState::Wander, &mut rng);
            assert!(agent.velocity.length() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn starting_food_stays_within_capacity() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = FoodConfig {
            starting_food_multiplier: 0.95,
            starting_food_variation: 0.2,
            starvation_threshold: 0,
        };
        for _ in 0..100 {
            let food = starting_food(1000, &params, &mut rng);
            assert!((750..=1000).contains(&food));
        }
    }

    #[test]
    fn starting_food_without_variation_is_exact() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = FoodConfig {
            starting_food_multiplier: 0.5,
            starting_food_variation: 0.0,
            starvation_threshold: 0,
        };
        assert_eq!(starting_food(101, &params, &mut rng), 50);
    }

    #[test]
    fn starves_when_food_hits_threshold() {
        let mut agent = make_agent(Vector2::ZERO, Vector2::ZERO);
        agent.food = 2;
        assert!(!agent.consume_food(0));
        assert!(agent.consume_food(0));
        assert!(!agent.alive);
        // Dead agents are not charged again.
        assert!(!agent.consume_food(0));
        assert_eq!(agent.food, 0);
    }

    #[test]
    fn avoidance_ignores_clear_path() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = make_agent(Vector2::new(500.0, 500.0), Vector2::new(1.0, 0.0));
        let avoided = agent.avoid_boundaries(
            Bounds::new(1000.0, 1000.0),
            &OpenWater,
            &SteeringConfig::default(),
            &mut rng,
        );
        assert!(!avoided);
        assert_eq!(agent.steering.force(), Vector2::ZERO);
    }

    #[test]
    fn avoidance_turns_back_from_edge() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = make_agent(Vector2::new(980.0, 500.0), Vector2::new(1.0, 0.0));
        let avoided = agent.avoid_boundaries(
            Bounds::new(1000.0, 1000.0),
            &OpenWater,
            &SteeringConfig::default(),
            &mut rng,
        );
        assert!(avoided);
        // Heading back west, give or take 45 degrees.
        assert!(agent.steering.force().x < 0.0);
        let angle = agent.steering.wander_angle().abs();
        assert!(angle >= std::f64::consts::PI * 0.75 - 1e-9);
    }

    #[test]
    fn arrival_zeroes_motion() {
        let mut agent = make_agent(Vector2::new(5.0, 5.0), Vector2::new(0.5, 0.5));
        agent.steering.seek(agent.pos, agent.velocity, 1.0, Vector2::ZERO, 0.0);
        agent.arrive(PatchId(3), 17);
        assert_eq!(agent.velocity, Vector2::ZERO);
        assert_eq!(agent.steering.force(), Vector2::ZERO);
        assert_eq!(agent.success_step, Some(17));
        assert_eq!(agent.arrived_patch, Some(PatchId(3)));
        assert!(agent.is_resting());
    }

    #[test]
    fn food_percent_uses_capacity() {
        let mut agent = make_agent(Vector2::ZERO, Vector2::ZERO);
        agent.food = agent.profile.food_capacity / 4;
        assert!((agent.food_percent() - 0.25).abs() < 1e-9);
    }
}
