// --- File: heatmap.rs ---
use crate::config::{ColorStop, HeatmapConfig};
use crate::vector::Vector2;

/// Visitation counts over a coarse grid of the world.
#[derive(Debug, Clone)]
pub struct Heatmap {
    cell_size: f64,
    size_x: usize,
    size_y: usize,
    data: Vec<u32>,
    current_max: u32,
    /// Sorted by threshold, highest first.
    color_stops: Vec<ColorStop>,
}

impl Heatmap {
    pub fn new(config: &HeatmapConfig, width: f64, height: f64) -> Self {
        let size_x = (width / config.cell_size).ceil().max(0.0) as usize;
        let size_y = (height / config.cell_size).ceil().max(0.0) as usize;
        let mut color_stops = config.color_stops.clone();
        color_stops.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self {
            cell_size: config.cell_size,
            size_x,
            size_y,
            data: vec![0; size_x * size_y],
            current_max: 0,
            color_stops,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn current_max(&self) -> u32 {
        self.current_max
    }

    pub fn values(&self) -> &[u32] {
        &self.data
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size_x as i64 || y >= self.size_y as i64 {
            return None;
        }
        Some(y as usize * self.size_x + x as usize)
    }

    fn index_for_world_pos(&self, pos: Vector2) -> Option<usize> {
        let x = (pos.x / self.cell_size).floor() as i64;
        let y = (pos.y / self.cell_size).floor() as i64;
        self.index(x, y)
    }

    /// Counts one visit at `pos`; positions off the grid are ignored.
    pub fn apply(&mut self, pos: Vector2) {
        let Some(index) = self.index_for_world_pos(pos) else {
            return;
        };
        let value = &mut self.data[index];
        *value += 1;
        self.current_max = self.current_max.max(*value);
    }

    pub fn value_at(&self, pos: Vector2) -> Option<u32> {
        self.index_for_world_pos(pos).map(|i| self.data[i])
    }

    /// First stop whose threshold the value's share of the maximum reaches.
    pub fn color_for(&self, value: u32) -> Option<&str> {
        if self.current_max == 0 {
            return None;
        }
        let percent = f64::from(value) / f64::from(self.current_max);
        self.color_stops
            .iter()
            .find(|stop| percent >= stop.threshold)
            .map(|stop| stop.color.as_str())
    }

    pub fn color_at(&self, pos: Vector2) -> Option<&str> {
        self.value_at(pos).and_then(|v| self.color_for(v))
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.current_max = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HeatmapConfig {
        HeatmapConfig {
            cell_size: 10.0,
            sample_interval: 1,
            color_stops: vec![
                ColorStop {
                    color: "low".to_owned(),
                    threshold: 0.1,
                },
                ColorStop {
                    color: "high".to_owned(),
                    threshold: 0.8,
                },
            ],
        }
    }

    #[test]
    fn grid_rounds_up() {
        let map = Heatmap::new(&config(), 95.0, 40.0);
        assert_eq!(map.dimensions(), (10, 4));
        assert_eq!(map.values().len(), 40);
    }

    #[test]
    fn apply_tracks_max_and_skips_outside() {
        let mut map = Heatmap::new(&config(), 100.0, 100.0);
        map.apply(Vector2::new(5.0, 5.0));
        map.apply(Vector2::new(6.0, 7.0));
        map.apply(Vector2::new(55.0, 5.0));
        map.apply(Vector2::new(-1.0, 5.0));
        map.apply(Vector2::new(5.0, 100.0));
        assert_eq!(map.value_at(Vector2::new(1.0, 1.0)), Some(2));
        assert_eq!(map.current_max(), 2);
        assert_eq!(map.values().iter().sum::<u32>(), 3);
    }

    #[test]
    fn colors_follow_descending_stops() {
        let mut map = Heatmap::new(&config(), 100.0, 100.0);
        for _ in 0..10 {
            map.apply(Vector2::new(5.0, 5.0));
        }
        map.apply(Vector2::new(15.0, 5.0));
        assert_eq!(map.color_for(10), Some("high"));
        assert_eq!(map.color_for(5), Some("low"));
        assert_eq!(map.color_for(0), None);
        assert_eq!(map.color_at(Vector2::new(15.0, 5.0)), Some("low"));
    }
}
