//! Activity culling
//!
//! Only objects near the player are simulated. Entities use a smaller radius
//! than tiles so an entity is never simulated while the ground under it is
//! frozen.

use glam::DVec2;

use crate::settings::CullingSettings;

/// True if `subject` is strictly closer than `sqrt(threshold_sq)` to `reference`
#[inline]
pub fn is_active(subject: DVec2, reference: DVec2, threshold_sq: f64) -> bool {
    subject.distance_squared(reference) < threshold_sq
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityCuller {
    tile_radius_sq: f64,
    entity_radius_sq: f64,
}

impl ActivityCuller {
    /// Panics unless `0 < entity_radius < tile_radius`
    pub fn new(tile_radius: f64, entity_radius: f64) -> Self {
        assert!(
            entity_radius > 0.0 && entity_radius < tile_radius,
            "entity activation radius {entity_radius} must be positive and below tile radius {tile_radius}"
        );
        Self {
            tile_radius_sq: tile_radius * tile_radius,
            entity_radius_sq: entity_radius * entity_radius,
        }
    }

    pub fn from_settings(settings: &CullingSettings) -> Self {
        Self::new(settings.tile_radius, settings.entity_radius)
    }

    pub fn tile_active(&self, tile: DVec2, player: DVec2) -> bool {
        is_active(tile, player, self.tile_radius_sq)
    }

    pub fn entity_active(&self, entity: DVec2, player: DVec2) -> bool {
        is_active(entity, player, self.entity_radius_sq)
    }
}

impl Default for ActivityCuller {
    fn default() -> Self {
        Self::from_settings(&CullingSettings::default())
    }
}
