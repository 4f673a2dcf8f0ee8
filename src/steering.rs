// --- File: steering.rs ---

use rand::Rng;

use crate::config::SteeringConfig;
use crate::constants::TWO_PI;
use crate::utils::to_radians;
use crate::vector::{Vector2, VectorExt, from_heading};

#[derive(Debug, Clone)]
pub struct Steering {
    wander_angle: f64,
    force: Vector2,
}

impl Steering {
    pub fn new(wander_angle: f64) -> Self {
        Self {
            wander_angle,
            force: Vector2::ZERO,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0.0..TWO_PI))
    }

    #[inline]
    pub fn force(&self) -> Vector2 {
        self.force
    }

    #[inline]
    pub fn wander_angle(&self) -> f64 {
        self.wander_angle
    }

    pub fn set_wander_angle(&mut self, radians: f64) {
        self.wander_angle = radians;
    }

    pub fn set_wander_angle_towards(&mut self, pos: Vector2, towards: Vector2) {
        self.wander_angle = (towards.y - pos.y).atan2(towards.x - pos.x);
    }

    pub fn reset(&mut self) {
        self.force = Vector2::ZERO;
    }

    /// Accumulates a force toward `target`. Inside `slowing_radius` the
    /// desired speed falls off linearly with distance.
    pub fn seek(
        &mut self,
        pos: Vector2,
        velocity: Vector2,
        max_speed: f64,
        target: Vector2,
        slowing_radius: f64,
    ) {
        let distance = pos.distance(target);
        let desired_speed = if distance < slowing_radius {
            max_speed * (distance / slowing_radius)
        } else {
            max_speed
        };
        let desired = (target - pos).with_magnitude(desired_speed);
        self.force += desired - velocity;
    }

    /// Drifts the wander angle by a bounded random step and pushes along a
    /// point on the wander circle projected ahead of the agent.
    pub fn wander<R: Rng + ?Sized>(&mut self, velocity: Vector2, params: &SteeringConfig, rng: &mut R) {
        let max_change = to_radians(params.max_angle_change_deg);
        let circle_center = velocity.with_magnitude(params.wander_circle_distance);
        if max_change > 0.0 {
            self.wander_angle += rng.gen_range(-max_change..=max_change);
        }
        self.wander_angle %= TWO_PI;

        let displacement = from_heading(self.wander_angle) * params.wander_circle_radius;
        self.force += circle_center + displacement;
    }

    /// Applies the accumulated force and integrates one tick.
    pub fn update(
        &mut self,
        pos: &mut Vector2,
        velocity: &mut Vector2,
        max_speed: f64,
        max_force: f64,
    ) {
        let force = self.force.truncated(max_force);
        *velocity = (*velocity + force).truncated(max_speed);
        *pos += *velocity;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    #[test]
    fn seek_outside_slowing_radius_wants_full_speed() {
        let mut steering = Steering::new(0.0);
        steering.seek(Vector2::ZERO, Vector2::ZERO, 2.0, Vector2::new(100.0, 0.0), 20.0);
        assert!((steering.force() - Vector2::new(2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn seek_inside_slowing_radius_scales_down() {
        let mut steering = Steering::new(0.0);
        steering.seek(Vector2::ZERO, Vector2::ZERO, 2.0, Vector2::new(5.0, 0.0), 20.0);
        assert!((steering.force().x - 0.5).abs() < EPS);
    }

    #[test]
    fn seek_subtracts_current_velocity() {
        let mut steering = Steering::new(0.0);
        let velocity = Vector2::new(0.0, 1.0);
        steering.seek(Vector2::ZERO, velocity, 1.0, Vector2::new(50.0, 0.0), 0.0);
        assert!((steering.force() - Vector2::new(1.0, -1.0)).length() < EPS);
    }

    #[test]
    fn update_clamps_force_and_speed() {
        let mut steering = Steering::new(0.0);
        steering.seek(Vector2::ZERO, Vector2::ZERO, 10.0, Vector2::new(100.0, 0.0), 0.0);
        let mut pos = Vector2::ZERO;
        let mut velocity = Vector2::ZERO;
        steering.update(&mut pos, &mut velocity, 1.0, 0.1);
        assert!((velocity.length() - 0.1).abs() < EPS);
        assert_eq!(pos, velocity);
        assert_eq!(steering.force(), Vector2::ZERO);

        let mut velocity = Vector2::new(5.0, 0.0);
        steering.update(&mut pos, &mut velocity, 1.0, 0.1);
        assert!(velocity.length() <= 1.0 + EPS);
    }

    #[test]
    fn wander_angle_drifts_within_bounds() {
        let params = SteeringConfig::default();
        let max_change = to_radians(params.max_angle_change_deg);
        let mut rng = StdRng::seed_from_u64(11);
        let mut steering = Steering::new(1.0);
        for _ in 0..100 {
            let before = steering.wander_angle();
            steering.wander(Vector2::new(1.0, 0.0), &params, &mut rng);
            let delta = steering.wander_angle() - before;
            // The modulo only kicks in past a full turn.
            assert!(delta.abs() <= max_change + EPS || delta.abs() >= TWO_PI - max_change - EPS);
            steering.reset();
        }
    }

    #[test]
    fn wander_force_is_circle_point_ahead() {
        let params = SteeringConfig {
            max_angle_change_deg: 0.0,
            ..SteeringConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut steering = Steering::new(std::f64::consts::FRAC_PI_2);
        steering.wander(Vector2::new(3.0, 0.0), &params, &mut rng);
        assert!((steering.force() - Vector2::new(1.0, 1.0)).length() < EPS);
    }

    #[test]
    fn wander_angle_towards_points_at_target() {
        let mut steering = Steering::new(0.0);
        steering.set_wander_angle_towards(Vector2::new(1.0, 1.0), Vector2::new(1.0, 5.0));
        assert!((steering.wander_angle() - std::f64::consts::FRAC_PI_2).abs() < EPS);
    }
}
