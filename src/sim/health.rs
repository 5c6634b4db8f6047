//! Health module and damage packets
//!
//! Attached optionally to entities. Area damage queries rely on the fraction
//! rules here to skip friendly fire.

use serde::{Deserialize, Serialize};

use crate::per_second;

/// Resistances never exceed this percentage
pub const MAX_RESISTANCE: i32 = 90;

/// Damage affiliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Fraction {
    /// Hostile to everything, itself included
    #[default]
    Neutral,
    Player,
    Undead,
}

/// Different fractions are always enemies; a fraction is only hostile to
/// itself when neutral.
pub fn are_enemies(a: Fraction, b: Fraction) -> bool {
    a != b || a == Fraction::Neutral
}

/// A damage packet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Damage {
    pub fraction: Fraction,
    pub phys: f64,
    pub magic: f64,
    pub dot: f64,
    pub pure: f64,
}

impl Damage {
    pub fn physical(fraction: Fraction, amount: f64) -> Self {
        Self {
            fraction,
            phys: amount,
            ..Default::default()
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            fraction: self.fraction,
            phys: self.phys * factor,
            magic: self.magic * factor,
            dot: self.dot * factor,
            pure: self.pure * factor,
        }
    }
}

/// Flat resistances in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resistances {
    pub phys: i32,
    pub magic: i32,
    pub dot: i32,
}

impl Resistances {
    fn capped(self) -> Self {
        Self {
            phys: self.phys.min(MAX_RESISTANCE),
            magic: self.magic.min(MAX_RESISTANCE),
            dot: self.dot.min(MAX_RESISTANCE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    fraction: Fraction,
    hp: f64,
    max_hp: f64,
    /// Hit points per second
    regen: f64,
    resistances: Resistances,
}

impl Health {
    pub fn new(fraction: Fraction, max_hp: u32, regen: i32, resistances: Resistances) -> Self {
        Self {
            fraction,
            hp: max_hp as f64,
            max_hp: max_hp as f64,
            regen: regen as f64,
            resistances: resistances.capped(),
        }
    }

    pub fn fraction(&self) -> Fraction {
        self.fraction
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    /// Remaining hp in `0.0..=1.0` (negative once overkilled)
    pub fn percentage(&self) -> f64 {
        self.hp / self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Apply a damage packet. Returns false if the source is friendly.
    pub fn apply_damage(&mut self, damage: &Damage) -> bool {
        if !are_enemies(self.fraction, damage.fraction) {
            return false;
        }
        let r = self.resistances;
        self.hp -= damage.phys * (1.0 - r.phys as f64 / 100.0);
        self.hp -= damage.magic * (1.0 - r.magic as f64 / 100.0);
        self.hp -= damage.dot * (1.0 - r.dot as f64 / 100.0);
        self.hp -= damage.pure;
        true
    }

    /// Heal without exceeding max hp. Dead bodies stay dead.
    pub fn heal(&mut self, amount: f64) {
        if self.is_dead() {
            return;
        }
        if self.hp < self.max_hp {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
    }

    /// Regenerate for one frame
    pub fn update(&mut self, elapsed_ms: f64) {
        self.heal(self.regen * per_second(elapsed_ms));
    }
}
