//! Integer pixel-space rectangles
//!
//! Hitboxes and tile obstacles are axis-aligned rectangles stored as two
//! corners. Everything else (size, center, sides) is derived.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

/// A rectangle side, also used as a collision direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Fixed tie-break order for collision side selection
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}

/// Axis-aligned rectangle, `min` is the top-left corner, `max` the bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: IVec2,
    pub max: IVec2,
}

impl Rect {
    /// Rectangle from its top-left corner and dimensions
    pub fn new(corner: IVec2, size: IVec2) -> Self {
        Self {
            min: corner,
            max: corner + size,
        }
    }

    /// Rectangle of `size` centered on `center`.
    ///
    /// Odd dimensions keep their full size; the extra pixel goes to the
    /// bottom/right half.
    pub fn from_center(center: IVec2, size: IVec2) -> Self {
        Self::new(center - size / 2, size)
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> IVec2 {
        (self.min + self.max) / 2
    }

    pub fn side(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.min.x,
            Side::Right => self.max.x,
            Side::Top => self.min.y,
            Side::Bottom => self.max.y,
        }
    }

    /// Shift by a pixel offset
    pub fn translated(&self, offset: IVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Inclusive overlap test: rectangles sharing an edge overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        other.min.x <= self.max.x
            && other.max.x >= self.min.x
            && other.min.y <= self.max.y
            && other.max.y >= self.min.y
    }

    /// Strict containment (points on the edge are outside)
    pub fn contains_point(&self, point: DVec2) -> bool {
        (self.min.x as f64) < point.x
            && (self.max.x as f64) > point.x
            && (self.min.y as f64) < point.y
            && (self.max.y as f64) > point.y
    }

    /// Side of `self` that hit `other`.
    ///
    /// Compares the distance of each side to the opposing side of `other`
    /// and picks the minimum. Exact ties go to the earlier entry of
    /// [`Side::ALL`].
    pub fn collision_side(&self, other: &Rect) -> Side {
        let mut best = Side::Left;
        let mut best_gap = i32::MAX;
        for side in Side::ALL {
            let gap = (self.side(side) - other.side(side.opposite())).abs();
            if gap < best_gap {
                best = side;
                best_gap = gap;
            }
        }
        best
    }
}
