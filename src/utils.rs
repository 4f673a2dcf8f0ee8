// --- File: utils.rs ---
use rand::Rng;

use crate::vector::Vector2;

// --- Helper Functions ---

#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Uniform draw in `[min, max)`; a degenerate range returns `min`.
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if min < max {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && x < self.width && y >= 0.0 && y < self.height
    }

    #[inline]
    pub fn contains_point(&self, p: Vector2) -> bool {
        self.contains(p.x, p.y)
    }

    /// Pulls a point back inside `[0,width) x [0,height)`.
    pub fn clamp(&self, p: Vector2) -> Vector2 {
        const EDGE: f64 = 1e-9;
        Vector2::new(
            p.x.clamp(0.0, (self.width - EDGE).max(0.0)),
            p.y.clamp(0.0, (self.height - EDGE).max(0.0)),
        )
    }
}

const UP: Vector2 = Vector2::new(0.0, -1.0);
const DOWN: Vector2 = Vector2::new(0.0, 1.0);
const LEFT: Vector2 = Vector2::new(-1.0, 0.0);
const RIGHT: Vector2 = Vector2::new(1.0, 0.0);

/// The axis direction that dominates `v` (screen coordinates, +y down).
pub fn cardinal_direction(v: Vector2) -> Vector2 {
    if v.y.abs() > v.x.abs() {
        if v.y > 0.0 { DOWN } else { UP }
    } else if v.x > 0.0 {
        RIGHT
    } else {
        LEFT
    }
}

/// Box pre-filter before the exact squared distance check.
#[inline]
pub fn within_distance(a: Vector2, b: Vector2, distance: f64) -> bool {
    (a.x - b.x).abs() <= distance
        && (a.y - b.y).abs() <= distance
        && a.distance_squared(b) <= distance * distance
}

pub fn mean(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Some(sum / values.len() as f64)
}

/// Parses `#rrggbb` into linear RGBA components.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 4]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let rgb = u32::from_str_radix(digits, 16).ok()?;
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    Some([channel(16), channel(8), channel(0), 1.0])
}
