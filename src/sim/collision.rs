//! Collision resolution against static tile geometry and level borders
//!
//! Discrete, per-frame, axis-separated. Each overlapping obstacle pushes the
//! body out along the single axis of least penetration; obstacles are handled
//! one after another in provider order with no iteration to convergence.

use glam::{DVec2, IVec2};

use super::geometry::{Rect, Side};
use crate::consts::TILE_SIZE;
use crate::to_pixel;

/// Static level geometry consumed by the resolver
pub trait LevelGeometry {
    /// Push every solid rectangle that may overlap `query` into `out`.
    /// Returning extra rectangles is fine, they are re-tested.
    fn collect_obstacles(&self, query: Rect, out: &mut Vec<Rect>);

    /// Level dimensions in pixels
    fn size_px(&self) -> IVec2;
}

/// Plain list of obstacle rectangles
#[derive(Debug, Clone, Default)]
pub struct StaticGeometry {
    pub obstacles: Vec<Rect>,
    pub size: IVec2,
}

impl StaticGeometry {
    pub fn new(size: IVec2) -> Self {
        Self {
            obstacles: Vec::new(),
            size,
        }
    }

    pub fn with_obstacle(mut self, obstacle: Rect) -> Self {
        self.obstacles.push(obstacle);
        self
    }
}

impl LevelGeometry for StaticGeometry {
    fn collect_obstacles(&self, query: Rect, out: &mut Vec<Rect>) {
        out.extend(self.obstacles.iter().filter(|o| o.overlaps(&query)));
    }

    fn size_px(&self) -> IVec2 {
        self.size
    }
}

/// Hitbox of `size` centered on a continuous position
#[inline]
pub fn hitbox_at(position: DVec2, size: IVec2) -> Rect {
    Rect::from_center(to_pixel(position), size)
}

/// Push a body out of every obstacle it overlaps.
///
/// Returns true if any obstacle was resolved on the body's bottom side
/// (the body is standing on something this frame).
pub fn resolve_tiles(
    position: &mut DVec2,
    velocity: &mut DVec2,
    size: IVec2,
    geometry: &dyn LevelGeometry,
) -> bool {
    let query = hitbox_at(*position, size);
    let margin = IVec2::splat(TILE_SIZE);
    let query = Rect {
        min: query.min - margin,
        max: query.max + margin,
    };

    let mut obstacles = Vec::new();
    geometry.collect_obstacles(query, &mut obstacles);

    let mut grounded = false;
    for obstacle in &obstacles {
        // Earlier obstacles may have moved the body
        let hitbox = hitbox_at(*position, size);
        if !hitbox.overlaps(obstacle) {
            continue;
        }
        let side = hitbox.collision_side(obstacle);
        resolve_side(position, velocity, size, obstacle, side);
        if side == Side::Bottom {
            grounded = true;
        }
    }
    grounded
}

/// Snap the hitbox edge on `side` against the opposing edge of `obstacle`
/// and stop motion along that axis. Bottom contacts sit flush; the others
/// keep a 1px gap so they do not re-trigger next frame.
pub fn resolve_side(
    position: &mut DVec2,
    velocity: &mut DVec2,
    size: IVec2,
    obstacle: &Rect,
    side: Side,
) {
    let half = size.as_dvec2() / 2.0;
    match side {
        Side::Bottom => {
            position.y = obstacle.side(Side::Top) as f64 - half.y;
            velocity.y = 0.0;
        }
        Side::Top => {
            position.y = obstacle.side(Side::Bottom) as f64 + half.y + 1.0;
            velocity.y = 0.0;
        }
        Side::Left => {
            position.x = obstacle.side(Side::Right) as f64 + half.x + 1.0;
            velocity.x = 0.0;
        }
        Side::Right => {
            position.x = obstacle.side(Side::Left) as f64 - half.x - 1.0;
            velocity.x = 0.0;
        }
    }
}

/// Keep the hitbox inside `[0, level.x] x [0, level.y]`.
///
/// Moves position only; velocity is untouched.
pub fn resolve_border(position: &mut DVec2, size: IVec2, level: IVec2) {
    let hitbox = hitbox_at(*position, size);
    let half = size.as_dvec2() / 2.0;

    if hitbox.side(Side::Left) < 0 {
        position.x = half.x;
    } else if hitbox.side(Side::Right) > level.x {
        position.x = level.x as f64 - half.x;
    }

    if hitbox.side(Side::Top) < 0 {
        position.y = half.y;
    } else if hitbox.side(Side::Bottom) > level.y {
        position.y = level.y as f64 - half.y;
    }
}
