//! The player character
//!
//! Always simulated regardless of culling. Unlike other entities the body and
//! health modules are mandatory.

use glam::{DVec2, IVec2};

use super::body::{Body, BodyFlags};
use super::collision::LevelGeometry;
use super::geometry::Rect;
use super::health::{Fraction, Health, Resistances};
use super::tick::TickInput;
use crate::consts::*;
use crate::settings::{PhysicsSettings, PlayerSettings};

#[derive(Debug, Clone)]
pub struct Player {
    position: DVec2,
    body: Body,
    health: Health,
}

impl Player {
    pub fn new(position: DVec2) -> Self {
        let (w, h) = PLAYER_HITBOX;
        Self {
            position,
            body: Body::new(
                IVec2::new(w, h),
                BodyFlags::ALL,
                DEFAULT_MASS_PLAYER,
                DEFAULT_FRICTION_PLAYER,
            ),
            health: Health::new(Fraction::Player, 1000, 10, Resistances::default()),
        }
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Teleport, keeping velocity
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    pub fn hitbox(&self) -> Rect {
        self.body.hitbox(self.position)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Turn movement intent into forces and impulses for the next update
    pub fn apply_input(&mut self, input: &TickInput, tuning: &PlayerSettings) {
        let mass = self.body.mass();

        let direction = input.move_axis.signum() as f64;
        if direction != 0.0 {
            let velocity = self.body.velocity();
            if velocity.x * direction < tuning.running_speed {
                self.body
                    .apply_force(DVec2::new(direction * mass * tuning.run_force, 0.0));
            } else {
                self.body.set_velocity(DVec2::new(
                    direction * tuning.running_speed,
                    velocity.y,
                ));
            }
        }

        if input.jump && self.body.is_grounded() {
            self.body
                .apply_impulse(DVec2::new(0.0, -mass * tuning.jump_speed));
            self.body.clear_grounded();
        }
    }

    pub fn update(&mut self, geometry: &dyn LevelGeometry, physics: &PhysicsSettings, elapsed_ms: f64) {
        self.body
            .update(&mut self.position, geometry, physics, elapsed_ms);
        self.health.update(elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::StaticGeometry;
    use crate::sim::geometry::Side;

    fn floor() -> StaticGeometry {
        StaticGeometry::new(IVec2::new(2_000, 1_000))
            .with_obstacle(Rect::new(IVec2::new(0, 256), IVec2::new(2_000, 32)))
    }

    fn landed() -> Player {
        let mut player = Player::new(DVec2::new(100.0, 240.0));
        player.update(&floor(), &PhysicsSettings::default(), 16.0);
        assert!(player.body().is_grounded());
        player
    }

    #[test]
    fn test_defaults() {
        let player = Player::new(DVec2::new(50.0, 50.0));
        assert_eq!(player.hitbox().size(), IVec2::new(12, 31));
        assert_eq!(player.body().mass(), 100.0);
        assert_eq!(player.body().flags(), BodyFlags::ALL);
        assert_eq!(player.health().fraction(), Fraction::Player);
        assert_eq!(player.health().max_hp(), 1000.0);
    }

    #[test]
    fn test_running_accelerates_up_to_speed_cap() {
        let mut player = landed();
        let geometry = floor();
        let physics = PhysicsSettings::default();
        let tuning = PlayerSettings::default();
        let input = TickInput {
            move_axis: 1,
            ..Default::default()
        };

        for _ in 0..60 {
            player.apply_input(&input, &tuning);
            player.update(&geometry, &physics, 16.0);
            assert!(player.body().velocity().x <= tuning.running_speed + tuning.run_force * 0.016);
        }
        assert!(player.body().velocity().x > 100.0);
        assert!(player.position().x > 100.0);
        assert_eq!(player.hitbox().side(Side::Bottom), 256);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut player = landed();
        let tuning = PlayerSettings::default();
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };

        player.apply_input(&jump, &tuning);
        assert_eq!(player.body().velocity().y, -500.0);
        assert!(!player.body().is_grounded());

        // Second press mid-air does nothing
        player.apply_input(&jump, &tuning);
        assert_eq!(player.body().velocity().y, -500.0);

        player.update(&floor(), &PhysicsSettings::default(), 16.0);
        assert!(player.position().y < 240.0);
    }
}
