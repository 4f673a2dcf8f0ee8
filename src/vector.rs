// --- File: vector.rs ---

use glam::DVec2;
use rand::Rng;

use crate::constants::TWO_PI;

pub type Vector2 = DVec2;

/// Unit vector pointing at `angle` radians.
#[inline]
pub fn from_heading(angle: f64) -> Vector2 {
    Vector2::new(angle.cos(), angle.sin())
}

/// Random unit vector, drawn by rotating +x by a uniform angle.
pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vector2 {
    from_heading(rng.gen_range(0.0..TWO_PI))
}

pub trait VectorExt: Sized {
    fn heading(self) -> f64;
    fn rotated(self, radians: f64) -> Self;
    /// Scales to `magnitude`; a zero vector stays zero.
    fn with_magnitude(self, magnitude: f64) -> Self;
    /// Caps the length at `max`, leaving shorter vectors alone.
    fn truncated(self, max: f64) -> Self;
}

impl VectorExt for Vector2 {
    #[inline]
    fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }

    fn rotated(self, radians: f64) -> Self {
        let (sa, ca) = radians.sin_cos();
        Vector2::new(ca * self.x - sa * self.y, sa * self.x + ca * self.y)
    }

    fn with_magnitude(self, magnitude: f64) -> Self {
        let current = self.length();
        if current <= 0.0 {
            return self;
        }
        self * (magnitude / current)
    }

    fn truncated(self, max: f64) -> Self {
        if self.length_squared() > max * max {
            self.with_magnitude(max)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotate_quarter_turn() {
        let v = Vector2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn with_magnitude_keeps_zero_vector() {
        assert_eq!(Vector2::ZERO.with_magnitude(5.0), Vector2::ZERO);
        let v = Vector2::new(3.0, 4.0).with_magnitude(10.0);
        assert!((v.length() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn truncated_only_shrinks() {
        let short = Vector2::new(0.3, 0.4);
        assert_eq!(short.truncated(1.0), short);
        let long = Vector2::new(30.0, 40.0).truncated(1.0);
        assert!((long.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn random_unit_has_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            assert!((random_unit(&mut rng).length() - 1.0).abs() < 1e-12);
        }
    }
}
