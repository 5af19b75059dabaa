//! World Geometry
//!
//! The server knows two rectangles: where players spawn and the arena whose
//! margins are lethal. They differ on purpose; spawning never happens inside
//! the larger arena's lethal band on the far sides.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl Rect {
    /// Create a rectangle from its edges.
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Horizontal extent.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Default spawn rectangle: 0-600 by 0-400.
pub const SPAWN_AREA: Rect = Rect::new(0.0, 0.0, 600.0, 400.0);

/// Default arena: 0-800 by 0-600.
pub const ARENA: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

/// Default width of the lethal band inside each arena edge.
pub const EDGE_MARGIN: f64 = 20.0;

/// The arena together with its lethal margin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LethalBoundary {
    /// Playable arena.
    pub arena: Rect,
    /// Band width, measured inward from every edge.
    pub margin: f64,
}

impl Default for LethalBoundary {
    fn default() -> Self {
        Self {
            arena: ARENA,
            margin: EDGE_MARGIN,
        }
    }
}

impl LethalBoundary {
    /// True when `(x, y)` lies at or beyond the lethal line on any side.
    ///
    /// Comparisons are inclusive: with the defaults, `x <= 20`, `x >= 780`,
    /// `y <= 20` and `y >= 580` are all lethal.
    pub fn is_lethal(&self, x: f64, y: f64) -> bool {
        x <= self.arena.min_x + self.margin
            || x >= self.arena.max_x - self.margin
            || y <= self.arena.min_y + self.margin
            || y >= self.arena.max_y - self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_extent() {
        assert_eq!(SPAWN_AREA.width(), 600.0);
        assert_eq!(SPAWN_AREA.height(), 400.0);
        assert_eq!(ARENA.width(), 800.0);
        assert_eq!(ARENA.height(), 600.0);
    }

    #[test]
    fn test_lethal_lines_are_inclusive() {
        let boundary = LethalBoundary::default();

        assert!(boundary.is_lethal(20.0, 300.0));
        assert!(boundary.is_lethal(780.0, 300.0));
        assert!(boundary.is_lethal(400.0, 20.0));
        assert!(boundary.is_lethal(400.0, 580.0));

        assert!(!boundary.is_lethal(20.5, 300.0));
        assert!(!boundary.is_lethal(779.5, 300.0));
        assert!(!boundary.is_lethal(400.0, 20.5));
        assert!(!boundary.is_lethal(400.0, 579.5));
    }

    #[test]
    fn test_beyond_arena_is_lethal() {
        let boundary = LethalBoundary::default();

        assert!(boundary.is_lethal(-50.0, 300.0));
        assert!(boundary.is_lethal(1200.0, 300.0));
        assert!(boundary.is_lethal(400.0, -1.0));
        assert!(boundary.is_lethal(400.0, 900.0));
    }

    #[test]
    fn test_center_is_safe() {
        let boundary = LethalBoundary::default();
        assert!(!boundary.is_lethal(400.0, 300.0));
    }

    #[test]
    fn test_spawn_area_reaches_lethal_band() {
        // Spawn can land in the top/left band; the areas are independent.
        let boundary = LethalBoundary::default();
        assert!(boundary.is_lethal(SPAWN_AREA.min_x, SPAWN_AREA.min_y));
        assert!(!boundary.is_lethal(SPAWN_AREA.max_x - 1.0, SPAWN_AREA.max_y - 1.0));
    }
}
