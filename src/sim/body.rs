//! Rigid-body-lite physics module
//!
//! A [`Body`] is attached to an object that owns a position. The body never
//! stores that position: every call that reads or moves it takes the owner's
//! position cell explicitly.
//!
//! Per-tick order inside [`Body::update`]:
//! force accumulation -> integration -> tile resolution -> border resolution.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use super::collision::{LevelGeometry, hitbox_at, resolve_border, resolve_tiles};
use super::geometry::Rect;
use crate::settings::PhysicsSettings;
use crate::{per_second, sign};

/// Behaviour switches for a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BodyFlags {
    /// Pulled down by gravity
    pub gravity: bool,
    /// Collides with tile hitboxes
    pub solid_for_tiles: bool,
    /// Kept inside the level rectangle
    pub solid_for_border: bool,
}

impl BodyFlags {
    pub const ALL: BodyFlags = BodyFlags {
        gravity: true,
        solid_for_tiles: true,
        solid_for_border: true,
    };

    pub const NONE: BodyFlags = BodyFlags {
        gravity: false,
        solid_for_tiles: false,
        solid_for_border: false,
    };

    /// Collides with the world but floats
    pub const FLOATING: BodyFlags = BodyFlags {
        gravity: false,
        solid_for_tiles: true,
        solid_for_border: true,
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    hitbox_size: IVec2,
    flags: BodyFlags,
    mass: f64,
    friction: f64,
    velocity: DVec2,
    /// Accumulated force, zeroed by every integration
    force: DVec2,
    /// Set when the last tile pass resolved a bottom contact
    grounded: bool,
}

impl Body {
    /// Create a body at rest.
    ///
    /// Panics on non-positive mass, negative friction or an empty hitbox.
    pub fn new(hitbox_size: IVec2, flags: BodyFlags, mass: f64, friction: f64) -> Self {
        assert!(mass.is_finite() && mass > 0.0, "body mass must be positive, got {mass}");
        assert!(
            friction.is_finite() && friction >= 0.0,
            "body friction must be non-negative, got {friction}"
        );
        assert!(
            hitbox_size.x > 0 && hitbox_size.y > 0,
            "body hitbox must be non-empty, got {hitbox_size}"
        );
        Self {
            hitbox_size,
            flags,
            mass,
            friction,
            velocity: DVec2::ZERO,
            force: DVec2::ZERO,
            grounded: false,
        }
    }

    /// Add a force, consumed by the next integration
    pub fn apply_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Change velocity immediately by `impulse / mass`
    pub fn apply_impulse(&mut self, impulse: DVec2) {
        self.velocity += impulse / self.mass;
    }

    /// Hitbox centered on the owner's current position
    pub fn hitbox(&self, position: DVec2) -> Rect {
        hitbox_at(position, self.hitbox_size)
    }

    pub fn hitbox_size(&self) -> IVec2 {
        self.hitbox_size
    }

    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Overwrite velocity (speed caps in movement code)
    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    pub fn force(&self) -> DVec2 {
        self.force
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Gameplay may clear the flag early (e.g. on jump)
    pub fn clear_grounded(&mut self) {
        self.grounded = false;
    }

    /// Advance one frame.
    ///
    /// `elapsed_ms` must already be scaled and capped by the caller.
    pub fn update(
        &mut self,
        position: &mut DVec2,
        geometry: &dyn LevelGeometry,
        physics: &PhysicsSettings,
        elapsed_ms: f64,
    ) {
        let friction_accel = self.accumulate_forces(physics);
        self.integrate(position, friction_accel, elapsed_ms);

        if self.flags.solid_for_tiles {
            self.grounded = resolve_tiles(position, &mut self.velocity, self.hitbox_size, geometry);
        } else {
            self.grounded = false;
        }
        if self.flags.solid_for_border {
            resolve_border(position, self.hitbox_size, geometry.size_px());
        }
    }

    /// Gravity goes through the force accumulator. Friction is returned as a
    /// horizontal acceleration so integration can stop it at zero speed.
    fn accumulate_forces(&mut self, physics: &PhysicsSettings) -> f64 {
        if self.flags.gravity {
            self.apply_force(DVec2::new(0.0, self.mass * physics.gravity));
        }

        if !self.grounded {
            return 0.0;
        }
        if self.velocity.x.abs() < physics.friction_epsilon {
            self.velocity.x = 0.0;
        }
        let friction_force = -sign(self.velocity.x) * self.mass * physics.gravity * self.friction;
        friction_force / self.mass
    }

    fn integrate(&mut self, position: &mut DVec2, friction_accel: f64, elapsed_ms: f64) {
        let dt = per_second(elapsed_ms);

        let start_vx = self.velocity.x;
        // An applied force against the motion may reverse it; friction alone may not
        let braking = self.force.x * start_vx < 0.0;
        let acceleration = self.force / self.mass;
        self.force = DVec2::ZERO;
        self.velocity += acceleration * dt;

        if friction_accel != 0.0 {
            self.velocity.x += friction_accel * dt;
            if !braking && start_vx * self.velocity.x < 0.0 {
                self.velocity.x = 0.0;
            }
        }

        *position += self.velocity * dt;
    }
}
