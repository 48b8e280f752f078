//! The board: a grid of cell entities plus the spatial occupancy index.
//!
//! Every board coordinate holds exactly one cell entity (floor, wall,
//! stairs). Independently, each coordinate has a set of *pieces*: every
//! entity whose [`Position`] is there, the cell itself included.
//!
//! The piece index is derived state. It is rebuilt wholesale by
//! [`Board::build_entity_cache`] and patched incrementally by the movement
//! resolver through [`Board::relocate`]. Code that writes a `Position`
//! directly must patch the index too.

use std::collections::BTreeSet;

use maleficer_ecs::prelude::*;

use crate::components::{Blocking, Position, Transparent};
use crate::content::tile;
use crate::error::{GameError, GameResult};

#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    /// Column-major: `cells[x * height + y]`.
    cells: Vec<EntityId>,
    pieces: Vec<BTreeSet<EntityId>>,
}

impl Board {
    /// A `width` x `height` board of solid wall.
    pub fn new(world: &mut World, width: i32, height: i32) -> Self {
        Self::filled(world, width, height, |world, x, y| tile::wall(world, x, y, false))
    }

    /// A board whose every cell comes from `make`.
    pub fn filled(
        world: &mut World,
        width: i32,
        height: i32,
        mut make: impl FnMut(&mut World, i32, i32) -> EntityId,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let size = (width * height) as usize;
        let mut cells = Vec::with_capacity(size);
        for x in 0..width {
            for y in 0..height {
                cells.push(make(world, x, y));
            }
        }
        let mut board = Self {
            width,
            height,
            cells,
            pieces: vec![BTreeSet::new(); size],
        };
        board.build_entity_cache(world);
        board
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> GameResult<usize> {
        if !self.in_bounds(x, y) {
            return Err(GameError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((x * self.height + y) as usize)
    }

    // -- cells --------------------------------------------------------------

    pub fn cell_at(&self, x: i32, y: i32) -> GameResult<EntityId> {
        Ok(self.cells[self.index(x, y)?])
    }

    /// Like [`cell_at`](Self::cell_at), but `None` off the board.
    pub fn get_cell(&self, x: i32, y: i32) -> Option<EntityId> {
        self.cell_at(x, y).ok()
    }

    /// Replace the cell at `(x, y)`, despawning the old one.
    ///
    /// The piece index is patched for the two cells; other occupants are
    /// untouched.
    pub fn set_cell(&mut self, world: &mut World, x: i32, y: i32, cell: EntityId) -> GameResult<()> {
        let idx = self.index(x, y)?;
        let old = std::mem::replace(&mut self.cells[idx], cell);
        self.pieces[idx].remove(&old);
        if old != cell && world.is_alive(old) {
            world.despawn(old)?;
        }
        self.pieces[idx].insert(cell);
        Ok(())
    }

    /// Every cell entity, column by column.
    pub fn cells(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.cells.iter().copied()
    }

    // -- pieces -------------------------------------------------------------

    /// Every entity positioned at `(x, y)`, the cell included.
    pub fn pieces_at(&self, x: i32, y: i32) -> GameResult<&BTreeSet<EntityId>> {
        Ok(&self.pieces[self.index(x, y)?])
    }

    /// Whether anything at `(x, y)` blocks movement. Off-board counts as
    /// blocked.
    pub fn has_blocker(&self, world: &World, x: i32, y: i32) -> bool {
        match self.pieces_at(x, y) {
            Ok(pieces) => pieces.iter().any(|e| world.has_component::<Blocking>(*e)),
            Err(_) => true,
        }
    }

    pub fn add(&mut self, entity: EntityId, pos: Position) -> GameResult<()> {
        let idx = self.index(pos.x, pos.y)?;
        self.pieces[idx].insert(entity);
        Ok(())
    }

    pub fn remove(&mut self, entity: EntityId, pos: Position) -> GameResult<bool> {
        let idx = self.index(pos.x, pos.y)?;
        Ok(self.pieces[idx].remove(&entity))
    }

    /// Move `entity` from one piece set to another.
    pub fn relocate(&mut self, entity: EntityId, from: Position, to: Position) -> GameResult<()> {
        let to_idx = self.index(to.x, to.y)?;
        if let Ok(from_idx) = self.index(from.x, from.y) {
            self.pieces[from_idx].remove(&entity);
        }
        self.pieces[to_idx].insert(entity);
        Ok(())
    }

    /// Rebuild the piece index from every positioned entity.
    pub fn build_entity_cache(&mut self, world: &World) {
        for set in &mut self.pieces {
            set.clear();
        }
        let mut stray = 0usize;
        for (entity, (pos,)) in world.query::<(&Position,)>() {
            match self.index(pos.x, pos.y) {
                Ok(idx) => {
                    self.pieces[idx].insert(entity);
                }
                Err(_) => stray += 1,
            }
        }
        if stray > 0 {
            tracing::warn!(stray, "entities positioned off the board were left out of the index");
        }
    }

    /// Per-column transparency, `[x][y]`.
    pub fn as_transparency(&self, world: &World) -> Vec<Vec<bool>> {
        (0..self.width)
            .map(|x| {
                (0..self.height)
                    .map(|y| {
                        let cell = self.cells[(x * self.height + y) as usize];
                        world.has_component::<Transparent>(cell)
                    })
                    .collect()
            })
            .collect()
    }
}
