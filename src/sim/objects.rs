//! Entities: composition of optional modules plus per-kind behaviour
//!
//! An entity owns its position and, optionally, a [`Body`] and a [`Health`].
//! Behaviour runs through [`Entity::update`] with an explicit
//! [`EntityContext`] instead of reaching into global game state.

use glam::{DVec2, IVec2};
use rand::Rng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyFlags};
use super::collision::LevelGeometry;
use super::geometry::Rect;
use super::health::{Damage, Fraction, Health, Resistances};
use crate::consts::*;
use crate::error::{Result, SimError};
use crate::settings::PhysicsSettings;
use crate::to_pixel;

/// Damage to deal to everything inside `area` once the entity pass is over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaDamage {
    pub area: Rect,
    pub damage: Damage,
}

/// Everything an entity may read or request during its update
pub struct EntityContext<'a> {
    pub geometry: &'a dyn LevelGeometry,
    pub physics: &'a PhysicsSettings,
    pub player_position: DVec2,
    pub player_hitbox: Rect,
    /// Level RNG, drawn in entity update order
    pub rng: &'a mut Pcg32,
    /// Deferred so no entity is mutated while another one is updating
    pub area_damage: Vec<AreaDamage>,
    /// Names of items picked up this frame
    pub pickups: Vec<String>,
}

impl<'a> EntityContext<'a> {
    pub fn new(
        geometry: &'a dyn LevelGeometry,
        physics: &'a PhysicsSettings,
        player_position: DVec2,
        player_hitbox: Rect,
        rng: &'a mut Pcg32,
    ) -> Self {
        Self {
            geometry,
            physics,
            player_position,
            player_hitbox,
            rng,
            area_damage: Vec::new(),
            pickups: Vec::new(),
        }
    }

    pub fn damage_area(&mut self, area: Rect, damage: Damage) {
        self.area_damage.push(AreaDamage { area, damage });
    }
}

/// State shared by every entity
#[derive(Debug, Clone)]
pub struct EntityCore {
    pub position: DVec2,
    pub body: Option<Body>,
    pub health: Option<Health>,
    enabled: bool,
    erase_mark: bool,
}

impl EntityCore {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            body: None,
            health: None,
            enabled: true,
            erase_mark: false,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flag for removal at the end of the frame. Also disables the entity.
    pub fn mark_for_erase(&mut self) {
        self.erase_mark = true;
        self.enabled = false;
    }

    pub fn is_marked(&self) -> bool {
        self.erase_mark
    }

    /// None for entities without a body
    pub fn hitbox(&self) -> Option<Rect> {
        self.body.as_ref().map(|body| body.hitbox(self.position))
    }

    pub fn is_dead(&self) -> bool {
        self.health.as_ref().is_some_and(Health::is_dead)
    }

    /// Step the body, then the health module
    pub fn update_modules(&mut self, ctx: &EntityContext<'_>, elapsed_ms: f64) {
        if !self.enabled {
            return;
        }
        if let Some(body) = self.body.as_mut() {
            body.update(&mut self.position, ctx.geometry, ctx.physics, elapsed_ms);
        }
        if let Some(health) = self.health.as_mut() {
            health.update(elapsed_ms);
        }
    }
}

pub trait Entity {
    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Registry key, e.g. `"enemy-ghost"`
    fn kind(&self) -> &str;

    fn update(&mut self, ctx: &mut EntityContext<'_>, elapsed_ms: f64) {
        self.core_mut().update_modules(ctx, elapsed_ms);
    }
}

// ---------------------------------------------------------------------------
// Creatures

/// How close the target must be for an attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackRange {
    /// Per-axis distance below the given extents
    Box(DVec2),
    Radius(f64),
}

impl AttackRange {
    fn contains(&self, offset: DVec2) -> bool {
        match *self {
            AttackRange::Box(extent) => offset.x.abs() < extent.x && offset.y.abs() < extent.y,
            AttackRange::Radius(r) => offset.length_squared() < r * r,
        }
    }
}

/// Idle roaming: alternate random waits and walks, turning around before
/// each walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wander {
    /// Walking force is only applied below this speed
    pub max_speed: f64,
    pub wait_ms: (u32, u32),
    pub walk_ms: (u32, u32),
}

/// Tuning for an aggressive creature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    pub aggro_range: f64,
    pub deaggro_range: f64,
    /// Chasing force is only applied below this speed
    pub max_speed: f64,
    pub move_force: f64,
    /// Walkers only push off the ground and only horizontally
    pub walker: bool,
    pub attack_range: AttackRange,
    /// Area hit by an attack, centered on the creature
    pub attack_area: IVec2,
    pub attack_damage: f64,
    pub attack_cooldown_ms: f64,
    /// None stays put while idle
    pub wander: Option<Wander>,
}

impl EnemyProfile {
    pub fn ghost() -> Self {
        Self {
            aggro_range: 150.0,
            deaggro_range: 500.0,
            max_speed: 150.0,
            move_force: 40.0 * 150.0,
            walker: false,
            attack_range: AttackRange::Box(DVec2::new(20.0, 5.0)),
            attack_area: IVec2::new(40, 16),
            attack_damage: 50.0,
            attack_cooldown_ms: 400.0,
            wander: None,
        }
    }

    pub fn sludge() -> Self {
        let mass = 400.0;
        let friction = 0.6;
        Self {
            aggro_range: 100.0,
            deaggro_range: 200.0,
            max_speed: 50.0,
            // Compensates ground friction
            move_force: mass * GRAVITY_ACCELERATION * friction + mass * 40.0,
            walker: true,
            attack_range: AttackRange::Radius(14.0),
            attack_area: IVec2::splat(48),
            attack_damage: 100.0,
            attack_cooldown_ms: 500.0,
            wander: Some(Wander {
                max_speed: 10.0,
                wait_ms: (2_000, 4_000),
                walk_ms: (800, 2_000),
            }),
        }
    }
}

/// Enemy with a body and health. Chases the player once aggroed, erases
/// itself on death.
#[derive(Debug, Clone)]
pub struct Creature {
    core: EntityCore,
    kind: String,
    profile: EnemyProfile,
    aggroed: bool,
    cooldown_ms: f64,
    /// Time left in the current wander phase
    wander_ms: f64,
    walking: bool,
    /// 1 right, -1 left
    facing: f64,
}

impl Creature {
    pub fn new(kind: impl Into<String>, core: EntityCore, profile: EnemyProfile) -> Self {
        Self {
            core,
            kind: kind.into(),
            profile,
            aggroed: false,
            cooldown_ms: 0.0,
            wander_ms: 0.0,
            walking: false,
            facing: 1.0,
        }
    }

    pub fn ghost(position: DVec2) -> Self {
        let flags = BodyFlags {
            gravity: false,
            solid_for_tiles: false,
            solid_for_border: true,
        };
        let core = EntityCore::new(position)
            .with_body(Body::new(IVec2::splat(16), flags, 40.0, 0.0))
            .with_health(Health::new(
                Fraction::Undead,
                800,
                0,
                Resistances {
                    phys: 50,
                    magic: 0,
                    dot: 50,
                },
            ));
        Self::new("enemy-ghost", core, EnemyProfile::ghost())
    }

    pub fn sludge(position: DVec2) -> Self {
        let core = EntityCore::new(position)
            .with_body(Body::new(IVec2::splat(16), BodyFlags::ALL, 400.0, 0.6))
            .with_health(Health::new(
                Fraction::Undead,
                1500,
                10,
                Resistances {
                    phys: 50,
                    ..Default::default()
                },
            ));
        Self::new("enemy-sludge", core, EnemyProfile::sludge())
    }

    pub fn is_aggroed(&self) -> bool {
        self.aggroed
    }

    /// True during a wander walk phase
    pub fn is_walking(&self) -> bool {
        self.walking
    }

    pub fn facing(&self) -> f64 {
        self.facing
    }

    fn fraction(&self) -> Fraction {
        self.core
            .health
            .as_ref()
            .map(Health::fraction)
            .unwrap_or_default()
    }

    fn chase(&mut self, offset: DVec2) {
        let profile = self.profile;
        let Some(body) = self.core.body.as_mut() else {
            return;
        };
        if body.velocity().length() >= profile.max_speed {
            return;
        }
        if profile.walker {
            if body.is_grounded() {
                let direction = if offset.x > 0.0 { 1.0 } else { -1.0 };
                body.apply_force(DVec2::new(direction * profile.move_force, 0.0));
            }
        } else {
            body.apply_force(offset.normalize_or_zero() * profile.move_force);
        }
    }

    /// Roll the next phase once the current one ran out, otherwise keep
    /// walking while grounded
    fn wander(&mut self, rng: &mut Pcg32) {
        let Some(wander) = self.profile.wander else {
            return;
        };
        if self.wander_ms <= 0.0 {
            self.walking = rng.random_bool(0.5);
            let (min, max) = if self.walking {
                self.facing = -self.facing;
                wander.walk_ms
            } else {
                wander.wait_ms
            };
            self.wander_ms = f64::from(rng.random_range(min..=max));
            return;
        }

        let Some(body) = self.core.body.as_mut() else {
            return;
        };
        if self.walking && body.is_grounded() && body.velocity().length() < wander.max_speed {
            body.apply_force(DVec2::new(self.facing * self.profile.move_force, 0.0));
        }
    }

    fn attack(&mut self, ctx: &mut EntityContext<'_>) {
        if self.cooldown_ms > 0.0 {
            return;
        }
        let area = Rect::from_center(to_pixel(self.core.position), self.profile.attack_area);
        ctx.damage_area(area, Damage::physical(self.fraction(), self.profile.attack_damage));
        self.cooldown_ms = self.profile.attack_cooldown_ms;
    }
}

impl Entity for Creature {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn update(&mut self, ctx: &mut EntityContext<'_>, elapsed_ms: f64) {
        if !self.core.is_enabled() {
            return;
        }
        self.core.update_modules(ctx, elapsed_ms);
        self.cooldown_ms = (self.cooldown_ms - elapsed_ms).max(0.0);
        self.wander_ms -= elapsed_ms;

        if self.core.is_dead() {
            self.core.mark_for_erase();
            return;
        }

        let offset = ctx.player_position - self.core.position;
        let distance = offset.length();
        if self.aggroed {
            if distance > self.profile.deaggro_range {
                self.aggroed = false;
            } else if self.profile.attack_range.contains(offset) {
                self.attack(ctx);
            } else {
                self.chase(offset);
            }
        } else if distance < self.profile.aggro_range {
            self.aggroed = true;
        } else {
            self.wander(ctx.rng);
        }
    }
}

// ---------------------------------------------------------------------------
// Destructibles

/// Object with health that fires a one-off area effect on death and lingers
/// for a short delay before erasing itself
#[derive(Debug, Clone)]
pub struct Destructible {
    core: EntityCore,
    kind: String,
    effect_area: IVec2,
    effect_damage: Damage,
    erase_delay_ms: f64,
    /// Set once the effect fired; counts down to erasure
    remaining_ms: Option<f64>,
}

impl Destructible {
    pub fn tnt(position: DVec2) -> Self {
        let core = EntityCore::new(position)
            .with_body(Body::new(
                IVec2::splat(15),
                BodyFlags::ALL,
                DEFAULT_MASS_CREATURES,
                DEFAULT_FRICTION_CREATURES,
            ))
            .with_health(Health::new(Fraction::Neutral, 700, 0, Resistances::default()));
        Self {
            core,
            kind: "destructible-tnt".to_string(),
            effect_area: IVec2::splat(50),
            effect_damage: Damage::physical(Fraction::Neutral, 400.0),
            erase_delay_ms: 300.0,
            remaining_ms: None,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.remaining_ms.is_some()
    }
}

impl Entity for Destructible {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn update(&mut self, ctx: &mut EntityContext<'_>, elapsed_ms: f64) {
        if !self.core.is_enabled() {
            return;
        }
        self.core.update_modules(ctx, elapsed_ms);
        if !self.core.is_dead() {
            return;
        }

        match self.remaining_ms.as_mut() {
            None => {
                let area = Rect::from_center(to_pixel(self.core.position), self.effect_area);
                ctx.damage_area(area, self.effect_damage);
                log::debug!("{} went off at {}", self.kind, area.center());
                self.remaining_ms = Some(self.erase_delay_ms);
            }
            Some(remaining) => {
                *remaining -= elapsed_ms;
                if *remaining <= 0.0 {
                    self.core.mark_for_erase();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Particles

/// Short-lived decoration, optionally physical
#[derive(Debug, Clone)]
pub struct Particle {
    core: EntityCore,
    kind: String,
    /// None lives forever
    lifetime_ms: Option<f64>,
}

impl Particle {
    pub fn new(kind: impl Into<String>, core: EntityCore, lifetime_ms: Option<f64>) -> Self {
        Self {
            core,
            kind: kind.into(),
            lifetime_ms,
        }
    }

    pub fn dust(position: DVec2) -> Self {
        let core = EntityCore::new(position).with_body(Body::new(
            IVec2::splat(2),
            BodyFlags::ALL,
            DEFAULT_MASS_ITEMS,
            DEFAULT_FRICTION_ITEMS,
        ));
        Self::new("particle-dust", core, Some(600.0))
    }

    pub fn lifetime_ms(&self) -> Option<f64> {
        self.lifetime_ms
    }
}

impl Entity for Particle {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn update(&mut self, ctx: &mut EntityContext<'_>, elapsed_ms: f64) {
        self.core.update_modules(ctx, elapsed_ms);
        if let Some(left) = self.lifetime_ms.as_mut() {
            *left -= elapsed_ms;
            if *left <= 0.0 {
                self.core.mark_for_erase();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Items

/// Item lying in the world, picked up when the player touches it
#[derive(Debug, Clone)]
pub struct ItemDrop {
    core: EntityCore,
    kind: String,
    name: String,
}

impl ItemDrop {
    pub fn new(name: &str, position: DVec2, hitbox: IVec2) -> Self {
        let core = EntityCore::new(position).with_body(Body::new(
            hitbox,
            BodyFlags::ALL,
            DEFAULT_MASS_ITEMS,
            DEFAULT_FRICTION_ITEMS,
        ));
        Self {
            core,
            kind: format!("item-{name}"),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for ItemDrop {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn update(&mut self, ctx: &mut EntityContext<'_>, elapsed_ms: f64) {
        if !self.core.is_enabled() {
            return;
        }
        self.core.update_modules(ctx, elapsed_ms);
        if self
            .core
            .hitbox()
            .is_some_and(|hitbox| hitbox.overlaps(&ctx.player_hitbox))
        {
            ctx.pickups.push(self.name.clone());
            self.core.mark_for_erase();
        }
    }
}

// ---------------------------------------------------------------------------
// Factory

type EntityMaker = fn(DVec2) -> Box<dyn Entity>;

fn brass_relic(position: DVec2) -> Box<dyn Entity> {
    Box::new(ItemDrop::new("brass_relic", position, IVec2::new(14, 10)))
}

fn paper(position: DVec2) -> Box<dyn Entity> {
    Box::new(ItemDrop::new("paper", position, IVec2::new(14, 14)))
}

fn tnt(position: DVec2) -> Box<dyn Entity> {
    Box::new(Destructible::tnt(position))
}

fn ghost(position: DVec2) -> Box<dyn Entity> {
    Box::new(Creature::ghost(position))
}

fn sludge(position: DVec2) -> Box<dyn Entity> {
    Box::new(Creature::sludge(position))
}

fn dust(position: DVec2) -> Box<dyn Entity> {
    Box::new(Particle::dust(position))
}

const ENTITY_MAKERS: &[(&str, EntityMaker)] = &[
    ("item-brass_relic", brass_relic),
    ("item-paper", paper),
    ("destructible-tnt", tnt),
    ("enemy-ghost", ghost),
    ("enemy-sludge", sludge),
    ("particle-dust", dust),
];

/// Every key accepted by [`make_entity`]
pub fn entity_kinds() -> impl Iterator<Item = &'static str> {
    ENTITY_MAKERS.iter().map(|(key, _)| *key)
}

/// Build an entity from its `kind` and `name` (joined as `"kind-name"`)
pub fn make_entity(kind: &str, name: &str, position: DVec2) -> Result<Box<dyn Entity>> {
    let key = format!("{kind}-{name}");
    ENTITY_MAKERS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, make)| make(position))
        .ok_or(SimError::UnknownObjectKind(key))
}
