//! Tilefall - simulation core of a tile-based 2D platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (object stores, physics, culling, tick)
//! - `settings`: Data-driven physics and culling tuning
//! - `error`: Recoverable error types
//! - `demo`: Seeded procedural levels for the headless runner and tests

pub mod demo;
pub mod error;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::Settings;

use glam::{DVec2, IVec2};

/// Game configuration constants
pub mod consts {
    /// Tile edge length in pixels (tiles are square)
    pub const TILE_SIZE: i32 = 32;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY_ACCELERATION: f64 = 1500.0;
    /// Grounded horizontal speed below which friction snaps velocity to rest
    pub const FRICTION_EPSILON: f64 = 2.0;
    /// Hard cap on a single frame delta (ms). Larger deltas tunnel through tiles.
    pub const MAX_FRAME_MS: f64 = 50.0;

    /// Activation radius for tiles (pixels)
    pub const TILE_ACTIVE_RADIUS: f64 = 600.0;
    /// Activation radius for entities, smaller than tiles so nothing outruns its ground
    pub const ENTITY_ACTIVE_RADIUS: f64 = 400.0;

    /// Mass/friction defaults per object family
    pub const DEFAULT_MASS_PLAYER: f64 = 100.0;
    pub const DEFAULT_MASS_ITEMS: f64 = 40.0;
    pub const DEFAULT_MASS_CREATURES: f64 = 150.0;

    pub const DEFAULT_FRICTION_PLAYER: f64 = 0.6;
    pub const DEFAULT_FRICTION_ITEMS: f64 = 0.3;
    pub const DEFAULT_FRICTION_CREATURES: f64 = 0.5;

    /// Player movement
    pub const PLAYER_HITBOX: (i32, i32) = (12, 31);
    pub const PLAYER_RUNNING_SPEED: f64 = 150.0;
    /// Running force per unit of mass
    pub const PLAYER_RUN_FORCE: f64 = 3000.0;
    pub const PLAYER_JUMP_SPEED: f64 = 500.0;
}

/// Milliseconds to seconds
#[inline]
pub fn per_second(elapsed_ms: f64) -> f64 {
    elapsed_ms / 1000.0
}

/// Snap a continuous position to the pixel grid
#[inline]
pub fn to_pixel(pos: DVec2) -> IVec2 {
    IVec2::new(pos.x.floor() as i32, pos.y.floor() as i32)
}

/// Sign as -1.0 / 0.0 / 1.0 (unlike `f64::signum`, zero maps to zero)
#[inline]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
