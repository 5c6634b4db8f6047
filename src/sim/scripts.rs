//! Level scripts: invisible triggers checked once per frame

use super::geometry::Rect;

/// What a script may look at when deciding to fire
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext {
    pub player_hitbox: Rect,
}

pub trait Script {
    fn check_trigger(&self, ctx: &ScriptContext) -> bool;

    fn trigger(&mut self);

    /// Swept at the end of the frame when true
    fn is_marked(&self) -> bool {
        false
    }

    /// Returns true if the script fired this frame
    fn update(&mut self, ctx: &ScriptContext) -> bool {
        if self.check_trigger(ctx) {
            self.trigger();
            true
        } else {
            false
        }
    }
}

/// Fires while the player hitbox overlaps `area`
#[derive(Debug, Clone)]
pub struct PlayerInArea {
    pub area: Rect,
    /// Remove after the first firing
    pub once: bool,
    fired: u32,
}

impl PlayerInArea {
    pub fn new(area: Rect, once: bool) -> Self {
        Self {
            area,
            once,
            fired: 0,
        }
    }

    pub fn times_fired(&self) -> u32 {
        self.fired
    }
}

impl Script for PlayerInArea {
    fn check_trigger(&self, ctx: &ScriptContext) -> bool {
        !self.is_marked() && self.area.overlaps(&ctx.player_hitbox)
    }

    fn trigger(&mut self) {
        self.fired += 1;
        log::debug!("area script at {} fired ({} times)", self.area.center(), self.fired);
    }

    fn is_marked(&self) -> bool {
        self.once && self.fired > 0
    }
}
