// --- File: region.rs ---
// Consumes an already classified raster; land is impassable.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::RIDGE_DECAY;
use crate::error::SimError;
use crate::utils::rand_range;
use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionId {
    Land,
    Ocean,
    DeepOcean,
}

impl RegionId {
    #[inline]
    pub fn is_water(self) -> bool {
        !matches!(self, RegionId::Land)
    }
}

pub trait RegionOracle {
    fn region_at(&self, x: f64, y: f64) -> Option<RegionId>;

    fn is_passable(&self, x: f64, y: f64) -> bool {
        self.region_at(x, y).is_some_and(RegionId::is_water)
    }
}

/// Borderless open sea: everywhere is passable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWater;

impl RegionOracle for OpenWater {
    fn region_at(&self, _x: f64, _y: f64) -> Option<RegionId> {
        Some(RegionId::Ocean)
    }

    fn is_passable(&self, _x: f64, _y: f64) -> bool {
        true
    }
}

fn unit_scale() -> f64 {
    1.0
}

/// Row-major classified raster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionGrid {
    pub width: usize,
    pub height: usize,
    #[serde(default = "unit_scale")]
    pub units_per_pixel: f64,
    pub cells: Vec<RegionId>,
}

impl RegionGrid {
    pub fn new(
        width: usize,
        height: usize,
        units_per_pixel: f64,
        cells: Vec<RegionId>,
    ) -> Result<Self, SimError> {
        let grid = Self {
            width,
            height,
            units_per_pixel,
            cells,
        };
        grid.check()?;
        Ok(grid)
    }

    pub fn check(&self) -> Result<(), SimError> {
        let expected = self.width * self.height;
        if self.cells.len() != expected {
            return Err(SimError::RegionGridSize {
                expected,
                actual: self.cells.len(),
            });
        }
        Ok(())
    }

    pub fn world_width(&self) -> f64 {
        self.width as f64 * self.units_per_pixel
    }

    pub fn world_height(&self) -> f64 {
        self.height as f64 * self.units_per_pixel
    }

    pub fn at_pixel(&self, px: i64, py: i64) -> Option<RegionId> {
        if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
            return None;
        }
        self.cells.get(py as usize * self.width + px as usize).copied()
    }
}

impl RegionOracle for RegionGrid {
    fn region_at(&self, x: f64, y: f64) -> Option<RegionId> {
        let px = (x / self.units_per_pixel).floor() as i64;
        let py = (y / self.units_per_pixel).floor() as i64;
        self.at_pixel(px, py)
    }
}

/// Spawn weighting over a region grid. Water weighs 1, land 0; the border
/// between ocean and deep ocean is boosted and the boost bleeds outwards,
/// decaying each step.
#[derive(Debug, Clone)]
pub struct DensityMap {
    width: usize,
    units_per_pixel: f64,
    cumulative: Vec<f64>,
}

impl DensityMap {
    pub fn new(grid: &RegionGrid, ridge_distance: f64, ridge_weight: f64) -> Self {
        let (w, h) = (grid.width, grid.height);
        let mut density: Vec<f64> = grid
            .cells
            .iter()
            .map(|r| if r.is_water() { 1.0 } else { 0.0 })
            .collect();

        for y in 0..h {
            for x in 0..w {
                if on_ridge(grid, x, y) {
                    density[y * w + x] *= ridge_weight;
                }
            }
        }

        let ridge_steps = (ridge_distance / grid.units_per_pixel).floor().max(0.0) as usize;
        let mut weight = ridge_weight;
        for _ in 0..ridge_steps {
            weight *= RIDGE_DECAY;
            if weight <= 1.0 {
                break;
            }
            let threshold = weight / RIDGE_DECAY;
            for y in 0..h {
                for x in 0..w {
                    let i = y * w + x;
                    if density[i] == 1.0 && has_heavy_neighbor(&density, w, h, x, y, threshold) {
                        density[i] = weight;
                    }
                }
            }
        }

        let mut running = 0.0;
        let cumulative = density
            .iter()
            .map(|d| {
                running += d;
                running
            })
            .collect();
        Self {
            width: w,
            units_per_pixel: grid.units_per_pixel,
            cumulative,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Weighted random point, or `None` when nothing has weight.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector2> {
        let total = self.total_weight();
        if total <= 0.0 || self.width == 0 {
            return None;
        }
        let pick = rng.gen_range(0.0..total);
        let index = self.cumulative.partition_point(|&c| c <= pick);
        let margin = self.units_per_pixel / 2.0;
        let x = (index % self.width) as f64 * self.units_per_pixel + rand_range(rng, 0.0, margin);
        let y = (index / self.width) as f64 * self.units_per_pixel + rand_range(rng, 0.0, margin);
        Some(Vector2::new(x, y))
    }
}

fn neighbors(x: usize, y: usize) -> [(i64, i64); 4] {
    let (x, y) = (x as i64, y as i64);
    [(x, y - 1), (x - 1, y), (x, y + 1), (x + 1, y)]
}

fn on_ridge(grid: &RegionGrid, x: usize, y: usize) -> bool {
    let ridge = match grid.at_pixel(x as i64, y as i64) {
        Some(RegionId::Ocean) => RegionId::DeepOcean,
        Some(RegionId::DeepOcean) => RegionId::Ocean,
        _ => return false,
    };
    neighbors(x, y)
        .iter()
        .any(|&(nx, ny)| grid.at_pixel(nx, ny) == Some(ridge))
}

fn has_heavy_neighbor(density: &[f64], w: usize, h: usize, x: usize, y: usize, threshold: f64) -> bool {
    neighbors(x, y).iter().any(|&(nx, ny)| {
        nx >= 0
            && ny >= 0
            && (nx as usize) < w
            && (ny as usize) < h
            && density[ny as usize * w + nx as usize] >= threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::RegionId::{DeepOcean as D, Land as L, Ocean as O};

    fn grid(width: usize, cells: Vec<RegionId>) -> RegionGrid {
        let height = cells.len() / width;
        RegionGrid::new(width, height, 10.0, cells).unwrap()
    }

    #[test]
    fn rejects_mismatched_raster() {
        assert!(matches!(
            RegionGrid::new(3, 3, 1.0, vec![O; 8]),
            Err(SimError::RegionGridSize { expected: 9, actual: 8 })
        ));
    }

    #[test]
    fn land_is_impassable() {
        let g = grid(2, vec![L, O, D, O]);
        assert!(!g.is_passable(5.0, 5.0));
        assert!(g.is_passable(15.0, 5.0));
        assert_eq!(g.region_at(5.0, 15.0), Some(D));
        assert_eq!(g.region_at(25.0, 5.0), None);
        assert!(!g.is_passable(-1.0, 5.0));
    }

    #[test]
    fn ridge_cells_get_boosted() {
        // O D O on one row: every water cell touches the other class.
        let g = grid(4, vec![O, D, O, L]);
        let map = DensityMap::new(&g, 0.0, 10.0);
        assert_eq!(map.total_weight(), 30.0);
    }

    #[test]
    fn ridge_extends_with_decay() {
        let g = grid(4, vec![D, O, O, O]);
        // Two steps: 50 -> 10 -> 2 (stops once weight drops to 1 or less).
        let map = DensityMap::new(&g, 20.0, 50.0);
        // D and first O sit on the ridge (50 each), next O gets 10, last gets 2.
        assert!((map.total_weight() - 112.0).abs() < 1e-9);
    }

    #[test]
    fn samples_only_weighted_cells() {
        let g = grid(3, vec![L, L, O, L, L, L]);
        let map = DensityMap::new(&g, 0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let p = map.random_point(&mut rng).unwrap();
            assert!((20.0..25.0).contains(&p.x), "x = {}", p.x);
            assert!((0.0..5.0).contains(&p.y), "y = {}", p.y);
        }
    }

    #[test]
    fn all_land_has_no_spawn_point() {
        let g = grid(2, vec![L; 4]);
        let map = DensityMap::new(&g, 0.0, 5.0);
        assert!(map.random_point(&mut StdRng::seed_from_u64(0)).is_none());
    }
}
