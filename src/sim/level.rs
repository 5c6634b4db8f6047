//! Level state: the three object stores plus the player

use glam::{DVec2, IVec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::LevelGeometry;
use super::geometry::Rect;
use super::health::Damage;
use super::objects::{Entity, make_entity};
use super::player::Player;
use super::scripts::Script;
use super::store::{Handle, ObjectStore};
use super::tiles::{Tile, TileMap};
use crate::error::Result;

/// RNG seed for levels built without one
pub const DEFAULT_LEVEL_SEED: u64 = 0;

#[derive(Debug)]
pub struct Level {
    pub tiles: TileMap,
    pub entities: ObjectStore<dyn Entity>,
    pub scripts: ObjectStore<dyn Script>,
    pub player: Player,
    /// Item names picked up so far
    pub collected: Vec<String>,
    /// Drives entity behaviour (creature wandering); seeded for replays
    pub rng: Pcg32,
}

impl Level {
    /// Empty level of `size_tiles` cells with the player at `spawn`
    pub fn new(size_tiles: IVec2, spawn: DVec2) -> Self {
        log::info!("New level: {}x{} tiles, player at {}", size_tiles.x, size_tiles.y, spawn);
        Self {
            tiles: TileMap::new(size_tiles).with_merged_runs(),
            entities: ObjectStore::new(),
            scripts: ObjectStore::new(),
            player: Player::new(spawn),
            collected: Vec::new(),
            rng: Pcg32::seed_from_u64(DEFAULT_LEVEL_SEED),
        }
    }

    /// Reseed the behaviour RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    pub fn size_tiles(&self) -> IVec2 {
        self.tiles.size()
    }

    pub fn size_px(&self) -> IVec2 {
        self.tiles.size_px()
    }

    pub fn add_tile(&mut self, tile: Box<dyn Tile>) -> Handle<dyn Tile> {
        self.tiles.insert(tile)
    }

    pub fn add_entity(&mut self, entity: Box<dyn Entity>) -> Handle<dyn Entity> {
        self.entities.insert_boxed(entity)
    }

    /// Build an entity by registry key and add it
    pub fn spawn(&mut self, kind: &str, name: &str, position: DVec2) -> Result<Handle<dyn Entity>> {
        let entity = make_entity(kind, name, position)?;
        Ok(self.add_entity(entity))
    }

    pub fn add_script(&mut self, script: Box<dyn Script>) -> Handle<dyn Script> {
        self.scripts.insert_boxed(script)
    }

    /// Apply `damage` to every entity with health and a body whose hitbox
    /// overlaps `area`, then to the player. Friendly targets are skipped by
    /// the health module. Returns how many targets took damage.
    pub fn damage_in_area(&mut self, area: Rect, damage: &Damage) -> usize {
        let mut hit = 0;
        for entity in self.entities.values_mut() {
            let core = entity.core_mut();
            let Some(hitbox) = core.hitbox() else {
                continue;
            };
            if !hitbox.overlaps(&area) {
                continue;
            }
            if let Some(health) = core.health.as_mut() {
                if health.apply_damage(damage) {
                    hit += 1;
                }
            }
        }

        if self.player.hitbox().overlaps(&area) && self.player.health_mut().apply_damage(damage) {
            hit += 1;
        }
        hit
    }
}
