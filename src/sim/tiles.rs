//! Tiles and the tile map
//!
//! Tiles sit on a fixed grid of [`TILE_SIZE`] squares. The map keeps a cell
//! index next to the owning store so collision queries only look at the
//! cells a hitbox can touch.

use glam::{DVec2, IVec2};

use super::collision::LevelGeometry;
use super::geometry::Rect;
use super::store::{Handle, ObjectStore};
use crate::consts::TILE_SIZE;

pub trait Tile {
    /// Grid cell the tile occupies
    fn cell(&self) -> IVec2;

    /// Solid rectangles, empty for decoration
    fn hitbox(&self) -> &[Rect];

    fn update(&mut self, _elapsed_ms: f64) {}

    /// Top-left corner in pixels
    fn position(&self) -> IVec2 {
        self.cell() * TILE_SIZE
    }

    fn center(&self) -> DVec2 {
        self.position().as_dvec2() + DVec2::splat(TILE_SIZE as f64 / 2.0)
    }
}

/// Full-cell rectangle of a grid cell
pub fn cell_rect(cell: IVec2) -> Rect {
    Rect::new(cell * TILE_SIZE, IVec2::splat(TILE_SIZE))
}

#[derive(Debug, Clone)]
pub struct StaticTile {
    cell: IVec2,
    hitbox: Vec<Rect>,
}

impl StaticTile {
    pub fn solid(cell: IVec2) -> Self {
        Self {
            cell,
            hitbox: vec![cell_rect(cell)],
        }
    }

    pub fn decoration(cell: IVec2) -> Self {
        Self {
            cell,
            hitbox: Vec::new(),
        }
    }
}

impl Tile for StaticTile {
    fn cell(&self) -> IVec2 {
        self.cell
    }

    fn hitbox(&self) -> &[Rect] {
        &self.hitbox
    }
}

/// Tile cycling through `frames` sprite frames
#[derive(Debug, Clone)]
pub struct AnimatedTile {
    tile: StaticTile,
    frames: u32,
    frame_ms: f64,
    frame: u32,
    elapsed_ms: f64,
}

impl AnimatedTile {
    pub fn new(tile: StaticTile, frames: u32, frame_ms: f64) -> Self {
        assert!(frames > 0, "animated tile needs at least one frame");
        assert!(frame_ms > 0.0, "frame duration must be positive, got {frame_ms}");
        Self {
            tile,
            frames,
            frame_ms,
            frame: 0,
            elapsed_ms: 0.0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl Tile for AnimatedTile {
    fn cell(&self) -> IVec2 {
        self.tile.cell
    }

    fn hitbox(&self) -> &[Rect] {
        &self.tile.hitbox
    }

    fn update(&mut self, elapsed_ms: f64) {
        self.elapsed_ms += elapsed_ms;
        while self.elapsed_ms >= self.frame_ms {
            self.elapsed_ms -= self.frame_ms;
            self.frame = (self.frame + 1) % self.frames;
        }
    }
}

/// Tile store plus a per-cell index
#[derive(Debug)]
pub struct TileMap {
    size: IVec2,
    store: ObjectStore<dyn Tile>,
    cells: Vec<Vec<Handle<dyn Tile>>>,
    /// Report runs of full-cell solids as one rectangle per row
    merge_runs: bool,
}

impl TileMap {
    /// Empty map of `size` cells
    pub fn new(size: IVec2) -> Self {
        assert!(size.x > 0 && size.y > 0, "tile map must be non-empty, got {size}");
        Self {
            size,
            store: ObjectStore::new(),
            cells: vec![Vec::new(); (size.x * size.y) as usize],
            merge_runs: false,
        }
    }

    /// Merge horizontal runs of full-cell solids in obstacle queries.
    ///
    /// With first-side tie-breaking a body sliding along a floor meets a flush
    /// seam between two tiles and resolves sideways. One rectangle per run has
    /// no internal seams.
    pub fn with_merged_runs(mut self) -> Self {
        self.merge_runs = true;
        self
    }

    pub fn merges_runs(&self) -> bool {
        self.merge_runs
    }

    /// Size in cells
    pub fn size(&self) -> IVec2 {
        self.size
    }

    fn cell_index(&self, cell: IVec2) -> Option<usize> {
        let inside = cell.x >= 0 && cell.y >= 0 && cell.x < self.size.x && cell.y < self.size.y;
        inside.then(|| (cell.y * self.size.x + cell.x) as usize)
    }

    /// Add a tile. Panics if its cell is outside the map.
    pub fn insert(&mut self, tile: Box<dyn Tile>) -> Handle<dyn Tile> {
        let cell = tile.cell();
        let Some(index) = self.cell_index(cell) else {
            panic!("tile cell {cell} outside map of {}", self.size);
        };
        let handle = self.store.insert_boxed(tile);
        self.cells[index].push(handle);
        handle
    }

    pub fn remove(&mut self, handle: Handle<dyn Tile>) -> Option<Box<dyn Tile>> {
        let tile = self.store.remove(handle)?;
        if let Some(index) = self.cell_index(tile.cell()) {
            self.cells[index].retain(|h| *h != handle);
        }
        Some(tile)
    }

    pub fn get(&self, handle: Handle<dyn Tile>) -> Option<&dyn Tile> {
        self.store.get(handle)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn tiles(&self) -> &ObjectStore<dyn Tile> {
        &self.store
    }

    pub fn tiles_mut(&mut self) -> &mut ObjectStore<dyn Tile> {
        &mut self.store
    }

    /// Tiles in `cell`, in insertion order
    pub fn at(&self, cell: IVec2) -> impl Iterator<Item = &dyn Tile> + '_ {
        self.cell_index(cell)
            .map(|index| self.cells[index].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|handle| &self.store[*handle])
    }
}

impl LevelGeometry for TileMap {
    /// Cells are scanned row by row, left to right. Without run merging every
    /// tile hitbox overlapping the query is reported in that order.
    ///
    /// With run merging a run is reported when the first cell without a
    /// full-cell solid ends it (or at the row end). Partial rectangles are
    /// reported as their cell is scanned, so they precede the run they sit
    /// next to or inside.
    fn collect_obstacles(&self, query: Rect, out: &mut Vec<Rect>) {
        let min = (query.min.as_dvec2() / TILE_SIZE as f64).floor().as_ivec2().max(IVec2::ZERO);
        let max = (query.max.as_dvec2() / TILE_SIZE as f64)
            .floor()
            .as_ivec2()
            .min(self.size - IVec2::ONE);

        for y in min.y..=max.y {
            let mut run: Option<Rect> = None;
            for x in min.x..=max.x {
                let cell = IVec2::new(x, y);
                let full = cell_rect(cell);
                let mut solid = false;
                for rect in self.at(cell).flat_map(|tile| tile.hitbox()) {
                    if self.merge_runs && *rect == full {
                        solid = true;
                    } else if rect.overlaps(&query) {
                        out.push(*rect);
                    }
                }
                if !solid {
                    out.extend(run.take());
                } else if let Some(r) = run.as_mut() {
                    r.max.x = full.max.x;
                } else {
                    run = Some(full);
                }
            }
            out.extend(run);
        }
    }

    fn size_px(&self) -> IVec2 {
        self.size * TILE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_position_and_center() {
        let tile = StaticTile::solid(IVec2::new(3, 8));
        assert_eq!(tile.position(), IVec2::new(96, 256));
        assert_eq!(tile.center(), DVec2::new(112.0, 272.0));
        assert_eq!(tile.hitbox(), &[Rect::new(IVec2::new(96, 256), IVec2::splat(32))]);
    }

    #[test]
    fn test_animation_cycles() {
        let mut tile = AnimatedTile::new(StaticTile::decoration(IVec2::ZERO), 3, 100.0);
        tile.update(99.0);
        assert_eq!(tile.frame(), 0);
        tile.update(1.0);
        assert_eq!(tile.frame(), 1);
        tile.update(250.0);
        assert_eq!(tile.frame(), 0);
        assert!(tile.hitbox().is_empty());
    }

    #[test]
    fn test_collect_obstacles_one_rect_per_tile_by_default() {
        let mut map = TileMap::new(IVec2::new(20, 10));
        assert!(!map.merges_runs());
        for x in 0..20 {
            map.insert(Box::new(StaticTile::solid(IVec2::new(x, 8))));
        }
        map.insert(Box::new(StaticTile::solid(IVec2::new(2, 7))));

        let mut out = Vec::new();
        map.collect_obstacles(Rect::new(IVec2::new(90, 230), IVec2::new(20, 30)), &mut out);
        assert_eq!(
            out,
            vec![
                cell_rect(IVec2::new(2, 7)),
                cell_rect(IVec2::new(2, 8)),
                cell_rect(IVec2::new(3, 8)),
            ]
        );
    }

    #[test]
    fn test_collect_obstacles_merges_floor_runs() {
        let mut map = TileMap::new(IVec2::new(20, 10)).with_merged_runs();
        for x in 0..20 {
            map.insert(Box::new(StaticTile::solid(IVec2::new(x, 8))));
        }
        map.insert(Box::new(StaticTile::decoration(IVec2::new(3, 7))));

        let mut out = Vec::new();
        map.collect_obstacles(Rect::new(IVec2::new(90, 230), IVec2::new(20, 30)), &mut out);
        assert_eq!(out, vec![Rect::new(IVec2::new(64, 256), IVec2::new(64, 32))]);
    }

    #[test]
    fn test_gaps_and_partial_hitboxes_break_runs() {
        struct Slab(IVec2, [Rect; 1]);
        impl Tile for Slab {
            fn cell(&self) -> IVec2 {
                self.0
            }
            fn hitbox(&self) -> &[Rect] {
                &self.1
            }
        }

        let mut map = TileMap::new(IVec2::new(10, 10)).with_merged_runs();
        map.insert(Box::new(StaticTile::solid(IVec2::new(1, 2))));
        map.insert(Box::new(StaticTile::solid(IVec2::new(2, 2))));
        let slab = Rect::new(IVec2::new(96, 64), IVec2::new(32, 8));
        map.insert(Box::new(Slab(IVec2::new(3, 2), [slab])));
        map.insert(Box::new(StaticTile::solid(IVec2::new(4, 2))));

        let mut out = Vec::new();
        map.collect_obstacles(Rect::new(IVec2::new(32, 64), IVec2::new(150, 20)), &mut out);
        assert_eq!(
            out,
            vec![
                slab,
                Rect::new(IVec2::new(32, 64), IVec2::new(64, 32)),
                cell_rect(IVec2::new(4, 2)),
            ]
        );
    }

    #[test]
    fn test_query_outside_map_is_clamped() {
        let mut map = TileMap::new(IVec2::new(4, 4));
        map.insert(Box::new(StaticTile::solid(IVec2::new(0, 0))));
        let mut out = Vec::new();
        map.collect_obstacles(Rect::new(IVec2::new(-50, -50), IVec2::new(60, 60)), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(map.size_px(), IVec2::splat(128));
    }

    #[test]
    fn test_remove_clears_cell_index() {
        let mut map = TileMap::new(IVec2::new(4, 4));
        let h = map.insert(Box::new(StaticTile::solid(IVec2::new(1, 1))));
        assert!(map.remove(h).is_some());
        assert!(map.remove(h).is_none());
        assert_eq!(map.at(IVec2::new(1, 1)).count(), 0);
        assert!(map.is_empty());
    }

    #[test]
    #[should_panic(expected = "outside map")]
    fn test_tile_outside_map_panics() {
        let mut map = TileMap::new(IVec2::new(4, 4));
        map.insert(Box::new(StaticTile::solid(IVec2::new(4, 0))));
    }
}
