//! Seeded demo levels
//!
//! Builds a small walled level with a two-row ground, random floating
//! platforms and a handful of entities. The same seed always yields the same
//! level.

use glam::{DVec2, IVec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{PLAYER_HITBOX, TILE_SIZE};
use crate::error::Result;
use crate::sim::{AnimatedTile, Level, PlayerInArea, Rect, StaticTile};

/// Entities the generator scatters around
const DEMO_SPAWNS: &[(&str, &str)] = &[
    ("item", "brass_relic"),
    ("item", "paper"),
    ("destructible", "tnt"),
    ("enemy", "ghost"),
    ("enemy", "sludge"),
    ("particle", "dust"),
];

pub const MIN_WIDTH: i32 = 16;
pub const MIN_HEIGHT: i32 = 10;

/// Pixel center of a grid cell
fn cell_center(cell: IVec2) -> DVec2 {
    (cell * TILE_SIZE).as_dvec2() + DVec2::splat(TILE_SIZE as f64 / 2.0)
}

/// Generate a level of `width` x `height` tiles.
///
/// Panics if the level is smaller than [`MIN_WIDTH`] x [`MIN_HEIGHT`].
pub fn generate_level(seed: u64, width: i32, height: i32) -> Result<Level> {
    assert!(
        width >= MIN_WIDTH && height >= MIN_HEIGHT,
        "demo level must be at least {MIN_WIDTH}x{MIN_HEIGHT} tiles, got {width}x{height}"
    );
    let mut rng = Pcg32::seed_from_u64(seed);

    let ground = height - 2;
    let spawn = DVec2::new(
        2.5 * TILE_SIZE as f64,
        (ground * TILE_SIZE) as f64 - PLAYER_HITBOX.1 as f64 / 2.0,
    );
    let mut level = Level::new(IVec2::new(width, height), spawn).with_seed(seed);

    for x in 0..width {
        level.add_tile(Box::new(StaticTile::solid(IVec2::new(x, ground))));
        level.add_tile(Box::new(StaticTile::solid(IVec2::new(x, ground + 1))));
    }
    for y in 0..ground {
        level.add_tile(Box::new(StaticTile::solid(IVec2::new(0, y))));
        level.add_tile(Box::new(StaticTile::solid(IVec2::new(width - 1, y))));
    }

    let platforms = width / 8;
    for _ in 0..platforms {
        let len = rng.random_range(2..=5);
        let x0 = rng.random_range(2..width - 2 - len);
        let y = rng.random_range(ground - 5..=ground - 3);
        for x in x0..x0 + len {
            level.add_tile(Box::new(StaticTile::solid(IVec2::new(x, y))));
        }
        // Flickering torch on some platforms
        if rng.random_bool(0.5) {
            let torch = StaticTile::decoration(IVec2::new(x0, y - 1));
            level.add_tile(Box::new(AnimatedTile::new(torch, 4, 120.0)));
        }
    }

    let count = width / 4;
    for _ in 0..count {
        let (kind, name) = DEMO_SPAWNS[rng.random_range(0..DEMO_SPAWNS.len())];
        let x = rng.random_range(4..width - 1);
        let position = cell_center(IVec2::new(x, ground - 2));
        level.spawn(kind, name, position)?;
    }

    // Checkpoint halfway along the ground
    let checkpoint = Rect::new(
        IVec2::new(width / 2 * TILE_SIZE, (ground - 2) * TILE_SIZE),
        IVec2::new(TILE_SIZE, 2 * TILE_SIZE),
    );
    level.add_script(Box::new(PlayerInArea::new(checkpoint, true)));

    log::info!(
        "Generated demo level (seed {seed}): {} tiles, {} entities",
        level.tiles.len(),
        level.entities.len()
    );
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::{Side, TickInput, tick};

    fn layout(level: &Level) -> Vec<(String, DVec2)> {
        level
            .entities
            .values()
            .map(|e| (e.kind().to_string(), e.core().position))
            .collect()
    }

    #[test]
    fn test_same_seed_same_level() {
        let a = generate_level(7, 40, 12).unwrap();
        let b = generate_level(7, 40, 12).unwrap();
        assert_eq!(a.tiles.len(), b.tiles.len());
        assert_eq!(layout(&a), layout(&b));
        assert_eq!(a.entities.len(), 10);
        assert_eq!(a.scripts.len(), 1);
    }

    #[test]
    fn test_player_starts_on_ground() {
        let mut level = generate_level(3, 24, 10).unwrap();
        let settings = Settings::default();
        tick(&mut level, &TickInput::default(), &settings, 16.0);
        assert!(level.player.body().is_grounded());
        assert_eq!(level.player.hitbox().side(Side::Bottom), 8 * TILE_SIZE);
    }

    #[test]
    #[should_panic(expected = "demo level must be at least")]
    fn test_tiny_level_panics() {
        let _ = generate_level(1, 8, 8);
    }
}
