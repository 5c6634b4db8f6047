//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform concerns:
//! - Frame deltas are scaled and capped before they reach the physics
//! - Objects are owned by stores and referenced through handles
//! - Only the player and objects near it are simulated each frame

pub mod body;
pub mod collision;
pub mod culling;
pub mod geometry;
pub mod health;
pub mod level;
pub mod objects;
pub mod player;
pub mod scripts;
pub mod store;
pub mod tick;
pub mod tiles;

pub use body::{Body, BodyFlags};
pub use collision::{LevelGeometry, StaticGeometry, resolve_border, resolve_tiles};
pub use culling::{ActivityCuller, is_active};
pub use geometry::{Rect, Side};
pub use health::{Damage, Fraction, Health, Resistances, are_enemies};
pub use level::Level;
pub use objects::{Entity, EntityContext, EntityCore, make_entity};
pub use player::Player;
pub use scripts::{PlayerInArea, Script};
pub use store::{Cursor, CursorEntry, Handle, ObjectStore};
pub use tick::{FrameClock, TickInput, TickReport, scaled_elapsed, tick};
pub use tiles::{AnimatedTile, StaticTile, Tile, TileMap};
