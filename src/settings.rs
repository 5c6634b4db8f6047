//! Simulation settings
//!
//! Physics, culling and player tuning. Loaded from JSON, defaults match the
//! shipped game constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// Integration and force constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration (pixels/s²)
    pub gravity: f64,
    /// Grounded horizontal speed snapped to zero by friction
    pub friction_epsilon: f64,
    /// Global timescale applied to frame deltas
    pub timescale: f64,
    /// Upper bound on a scaled frame delta (ms)
    pub max_frame_ms: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY_ACCELERATION,
            friction_epsilon: FRICTION_EPSILON,
            timescale: 1.0,
            max_frame_ms: MAX_FRAME_MS,
        }
    }
}

/// Activation radii around the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingSettings {
    pub tile_radius: f64,
    pub entity_radius: f64,
}

impl Default for CullingSettings {
    fn default() -> Self {
        Self {
            tile_radius: TILE_ACTIVE_RADIUS,
            entity_radius: ENTITY_ACTIVE_RADIUS,
        }
    }
}

/// Player movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub running_speed: f64,
    pub run_force: f64,
    pub jump_speed: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            running_speed: PLAYER_RUNNING_SPEED,
            run_force: PLAYER_RUN_FORCE,
            jump_speed: PLAYER_JUMP_SPEED,
        }
    }
}

/// All simulation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub culling: CullingSettings,
    pub player: PlayerSettings,
}

impl Settings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings from a file, falling back to defaults on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.as_ref().display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        if !(p.gravity.is_finite() && p.gravity >= 0.0) {
            return Err(SimError::InvalidSettings(format!("gravity {} must be >= 0", p.gravity)));
        }
        if !(p.max_frame_ms.is_finite() && p.max_frame_ms > 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "max_frame_ms {} must be > 0",
                p.max_frame_ms
            )));
        }
        if !(p.timescale.is_finite() && p.timescale >= 0.0) {
            return Err(SimError::InvalidSettings(format!("timescale {} must be >= 0", p.timescale)));
        }
        if !(p.friction_epsilon.is_finite() && p.friction_epsilon >= 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "friction_epsilon {} must be >= 0",
                p.friction_epsilon
            )));
        }

        let c = &self.culling;
        if !(c.entity_radius > 0.0 && c.entity_radius < c.tile_radius) {
            return Err(SimError::InvalidSettings(format!(
                "entity radius {} must be positive and below tile radius {}",
                c.entity_radius, c.tile_radius
            )));
        }
        Ok(())
    }
}
