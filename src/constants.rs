// --- File: constants.rs ---
// --- Global Simulation Constants ---
use std::f64::consts::TAU;

pub const WORLD_WIDTH: f64 = 1500.0;
pub const WORLD_HEIGHT: f64 = 1500.0;
pub const INITIAL_PREY_PATCH_COUNT: usize = 20;
pub const INITIAL_AGENTS_PER_SPECIES: usize = 10;
pub const SPAWN_ATTEMPTS: u32 = 10;

// Timer callback granularity: ticks advanced per external update.
pub const DEFAULT_STEPS_PER_UPDATE: u32 = 1;
pub const MAX_STEPS_PER_UPDATE: u32 = 10_000;

// --- Steering ---
pub const MAX_FORCE: f64 = 0.1;
// Indirectly modifies wander force
pub const WANDER_CIRCLE_DISTANCE: f64 = 1.0;
// Indirectly modifies wander angle change
pub const WANDER_CIRCLE_RADIUS: f64 = 1.0;
pub const MAX_ANGLE_CHANGE_DEG: f64 = 15.0;
pub const DEFAULT_SLOWING_RADIUS: f64 = 20.0;
pub const TWO_PI: f64 = TAU;

// --- Boundary avoidance ---
pub const AVOID_ANGLE_DEG: f64 = 45.0;
pub const LOOK_AHEAD_MULTIPLIER: f64 = 60.0;

// --- Prey patches ---
pub const PATCH_MIN_DIST_FROM_BORDER: f64 = 64.0;
pub const PATCH_INITIAL_SIZE: f64 = 32.0;
pub const PATCH_BONUS_FIRST: f64 = 5.0;
pub const PATCH_BONUS_PER_ADDITIONAL: f64 = 5.0;
pub const PATCH_CHUNK_SIZE: f64 = 128.0;
pub const AGENT_CHUNK_SIZE: f64 = 64.0;

// --- Levy flight ---
pub const LEVY_MAX_ATTEMPTS: u32 = 10;
pub const LEVY_FRACTAL_DIMENSION: f64 = 1.4;
pub const LEVY_DISTANCE_SCALING_FACTOR: f64 = 100.0;
// Distance at which a levy target counts as reached
pub const LEVY_SUCCESS_DISTANCE: f64 = 5.0;
pub const LEVY_SLOWING_RADIUS: f64 = 5.0;

// --- Food ---
pub const FOOD_CAPACITY: i64 = 5000;
pub const STARTING_FOOD_MULTIPLIER: f64 = 0.8;
pub const STARTING_FOOD_VARIATION: f64 = 0.2;
pub const STARVATION_THRESHOLD: i64 = 0;

// --- Heatmap ---
pub const HEATMAP_CELL_SIZE: f64 = 25.0;
pub const HEATMAP_SAMPLE_INTERVAL: u64 = 10;

// --- Density map ---
// Ridge weight multiplier applied per extension step
pub const RIDGE_DECAY: f64 = 0.2;

// --- End of File: constants.rs ---
