//! Per-frame simulation tick
//!
//! Advances a [`Level`] by one frame in a fixed order:
//! cull -> tiles -> entities -> scripts -> player -> sweep.
//! Nothing outside the tick may observe the level mid-frame.

use super::culling::ActivityCuller;
use super::level::Level;
use super::objects::EntityContext;
use super::scripts::ScriptContext;
use crate::settings::{PhysicsSettings, Settings};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal intent: -1 left, 0 idle, 1 right
    pub move_axis: i8,
    /// Jump (ignored while airborne)
    pub jump: bool,
}

/// Scale a raw frame delta and clamp it to `[0, cap_ms]`
#[inline]
pub fn scaled_elapsed(raw_ms: f64, timescale: f64, cap_ms: f64) -> f64 {
    (raw_ms * timescale).clamp(0.0, cap_ms)
}

/// Turns raw frame deltas into simulation deltas and keeps totals
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    frames: u64,
    simulated_ms: f64,
    /// Real time lost to the frame cap
    dropped_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time to feed into [`tick`] for a frame that took `raw_ms`
    pub fn advance(&mut self, raw_ms: f64, physics: &PhysicsSettings) -> f64 {
        let elapsed = scaled_elapsed(raw_ms, physics.timescale, physics.max_frame_ms);
        let unclamped = raw_ms * physics.timescale;
        if unclamped > elapsed {
            self.dropped_ms += unclamped - elapsed;
        }
        self.frames += 1;
        self.simulated_ms += elapsed;
        elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn simulated_ms(&self) -> f64 {
        self.simulated_ms
    }

    pub fn dropped_ms(&self) -> f64 {
        self.dropped_ms
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub active_tiles: usize,
    pub active_entities: usize,
    pub scripts_fired: usize,
    /// Targets hit by deferred area damage
    pub damaged: usize,
    pub swept_entities: usize,
    pub swept_scripts: usize,
    pub pickups: Vec<String>,
    pub player_dead: bool,
}

/// Advance the level by one frame.
///
/// `elapsed_ms` should already be scaled (see [`scaled_elapsed`]); it is
/// clamped to `[0, max_frame_ms]` here so a long frame cannot tunnel.
pub fn tick(level: &mut Level, input: &TickInput, settings: &Settings, elapsed_ms: f64) -> TickReport {
    let elapsed_ms = elapsed_ms.clamp(0.0, settings.physics.max_frame_ms);
    let mut report = TickReport::default();
    let culler = ActivityCuller::from_settings(&settings.culling);
    let reference = level.player.position();

    // Tiles
    for tile in level.tiles.tiles_mut().values_mut() {
        if culler.tile_active(tile.center(), reference) {
            tile.update(elapsed_ms);
            report.active_tiles += 1;
        }
    }

    // Entities, against last frame's player state
    let mut ctx = EntityContext::new(
        &level.tiles,
        &settings.physics,
        reference,
        level.player.hitbox(),
        &mut level.rng,
    );
    let mut cursor = level.entities.cursor();
    while let Some(mut entry) = cursor.next_entry() {
        let entity = entry.get_mut();
        if !culler.entity_active(entity.core().position, reference) {
            continue;
        }
        entity.update(&mut ctx, elapsed_ms);
        report.active_entities += 1;
    }
    let EntityContext {
        area_damage,
        pickups,
        ..
    } = ctx;

    for request in &area_damage {
        report.damaged += level.damage_in_area(request.area, &request.damage);
    }

    // Scripts
    let script_ctx = ScriptContext {
        player_hitbox: level.player.hitbox(),
    };
    for script in level.scripts.values_mut() {
        if script.update(&script_ctx) {
            report.scripts_fired += 1;
        }
    }

    // Player, never culled
    level.player.apply_input(input, &settings.player);
    level
        .player
        .update(&level.tiles, &settings.physics, elapsed_ms);
    report.player_dead = level.player.is_dead();

    // Sweep
    report.swept_entities = level.entities.retain(|_, e| !e.core().is_marked());
    report.swept_scripts = level.scripts.retain(|_, s| !s.is_marked());

    level.collected.extend(pickups.iter().cloned());
    report.pickups = pickups;

    log::debug!(
        "tick {:.1}ms: {} tiles, {} entities active, {} swept",
        elapsed_ms,
        report.active_tiles,
        report.active_entities,
        report.swept_entities + report.swept_scripts
    );
    report
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, IVec2};

    use super::*;
    use crate::sim::geometry::{Rect, Side};
    use crate::sim::health::{Damage, Fraction};
    use crate::sim::scripts::PlayerInArea;
    use crate::sim::tiles::{AnimatedTile, StaticTile};

    /// 40x12 tiles, floor on row 8, player standing at x=100
    fn flat_level() -> Level {
        let mut level = Level::new(IVec2::new(40, 12), DVec2::new(100.0, 240.0));
        for x in 0..40 {
            level.add_tile(Box::new(StaticTile::solid(IVec2::new(x, 8))));
        }
        level
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_elapsed_is_scaled_and_capped() {
        assert_eq!(scaled_elapsed(16.0, 1.0, 50.0), 16.0);
        assert_eq!(scaled_elapsed(16.0, 0.5, 50.0), 8.0);
        assert_eq!(scaled_elapsed(500.0, 1.0, 50.0), 50.0);
        assert_eq!(scaled_elapsed(-3.0, 1.0, 50.0), 0.0);

        let mut clock = FrameClock::new();
        let physics = PhysicsSettings::default();
        assert_eq!(clock.advance(500.0, &physics), 50.0);
        assert_eq!(clock.advance(20.0, &physics), 20.0);
        assert_eq!(clock.frames(), 2);
        assert_eq!(clock.simulated_ms(), 70.0);
        assert_eq!(clock.dropped_ms(), 450.0);
    }

    #[test]
    fn test_long_frame_moves_like_capped_frame() {
        let settings = Settings::default();
        let mut slow = Level::new(IVec2::new(40, 40), DVec2::new(300.0, 100.0));
        let mut capped = Level::new(IVec2::new(40, 40), DVec2::new(300.0, 100.0));

        let mut clock = FrameClock::new();
        let elapsed = clock.advance(500.0, &settings.physics);
        tick(&mut slow, &idle(), &settings, elapsed);
        tick(&mut capped, &idle(), &settings, 50.0);

        assert_eq!(slow.player.position(), capped.player.position());
        assert_eq!(slow.player.body().velocity(), capped.player.body().velocity());
    }

    #[test]
    fn test_tick_caps_raw_elapsed_itself() {
        let settings = Settings::default();
        let mut raw = Level::new(IVec2::new(40, 40), DVec2::new(300.0, 100.0));
        let mut capped = Level::new(IVec2::new(40, 40), DVec2::new(300.0, 100.0));

        tick(&mut raw, &idle(), &settings, 5_000.0);
        tick(&mut capped, &idle(), &settings, settings.physics.max_frame_ms);
        assert_eq!(raw.player.position(), capped.player.position());

        let start = raw.player.position();
        tick(&mut raw, &idle(), &settings, -20.0);
        assert_eq!(raw.player.position(), start);
    }

    #[test]
    fn test_player_falls_and_lands() {
        let settings = Settings::default();
        let mut level = flat_level();
        level.player.set_position(DVec2::new(100.0, 120.0));
        for _ in 0..60 {
            tick(&mut level, &idle(), &settings, 16.0);
        }
        assert_eq!(level.player.hitbox().side(Side::Bottom), 256);
        assert!(level.player.body().is_grounded());
        assert_eq!(level.player.body().velocity().y, 0.0);
    }

    #[test]
    fn test_far_entities_are_frozen() {
        let settings = Settings::default();
        let mut level = flat_level();
        let near = level.spawn("item", "paper", DVec2::new(300.0, 100.0)).unwrap();
        let far = level.spawn("item", "paper", DVec2::new(1_000.0, 100.0)).unwrap();

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert_eq!(report.active_entities, 1);
        assert!(level.entities[near].core().position.y > 100.0);
        assert_eq!(level.entities[far].core().position.y, 100.0);
    }

    #[test]
    fn test_far_tiles_are_frozen() {
        let settings = Settings::default();
        let mut level = Level::new(IVec2::new(40, 12), DVec2::new(100.0, 100.0));
        let near = level.add_tile(Box::new(AnimatedTile::new(StaticTile::decoration(IVec2::new(4, 4)), 2, 10.0)));
        level.add_tile(Box::new(AnimatedTile::new(StaticTile::decoration(IVec2::new(35, 4)), 2, 10.0)));

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert_eq!(report.active_tiles, 1);
        assert!(level.tiles.get(near).is_some());
    }

    #[test]
    fn test_pickup_and_sweep() {
        let settings = Settings::default();
        let mut level = flat_level();
        level.spawn("item", "brass_relic", DVec2::new(104.0, 245.0)).unwrap();

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert_eq!(report.pickups, vec!["brass_relic".to_string()]);
        assert_eq!(report.swept_entities, 1);
        assert!(level.entities.is_empty());
        assert_eq!(level.collected, vec!["brass_relic".to_string()]);
    }

    #[test]
    fn test_tnt_chain_reaction_spans_frames() {
        let settings = Settings::default();
        let mut level = flat_level();
        let first = level.spawn("destructible", "tnt", DVec2::new(300.0, 248.0)).unwrap();
        let second = level.spawn("destructible", "tnt", DVec2::new(320.0, 248.0)).unwrap();

        // Detonate the first one
        level.damage_in_area(
            Rect::from_center(IVec2::new(300, 248), IVec2::splat(4)),
            &Damage::physical(Fraction::Player, 1_000.0),
        );

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert!(report.damaged >= 1);
        assert!(level.entities[first].core().is_dead());
        assert!(!level.entities[second].core().is_dead());

        // 400 more on top of the first blast is not enough for the second
        let hp = level.entities[second].core().health.as_ref().unwrap().hp();
        assert_eq!(hp, 300.0);

        for _ in 0..30 {
            tick(&mut level, &idle(), &settings, 16.0);
        }
        assert!(!level.entities.contains(first));
        assert!(level.entities.contains(second));
    }

    #[test]
    fn test_once_script_is_swept_after_firing() {
        let settings = Settings::default();
        let mut level = flat_level();
        let area = Rect::new(IVec2::new(64, 192), IVec2::new(64, 64));
        level.add_script(Box::new(PlayerInArea::new(area, true)));
        level.add_script(Box::new(PlayerInArea::new(area, false)));

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert_eq!(report.scripts_fired, 2);
        assert_eq!(report.swept_scripts, 1);

        let report = tick(&mut level, &idle(), &settings, 16.0);
        assert_eq!(report.scripts_fired, 1);
        assert_eq!(level.scripts.len(), 1);
    }

    #[test]
    fn test_player_runs_right() {
        let settings = Settings::default();
        let mut level = flat_level();
        tick(&mut level, &idle(), &settings, 16.0);
        let start = level.player.position().x;
        let run = TickInput {
            move_axis: 1,
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut level, &run, &settings, 16.0);
        }
        assert!(level.player.position().x > start + 30.0);
    }
}
