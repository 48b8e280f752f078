//! Level generation contract.
//!
//! A [`MapSource`] receives a solid-wall board, carves it by replacing
//! cells, and reports where the player starts, where the stairs are and
//! what to populate. The game spawns the player and the population
//! afterwards, then rebuilds the piece index.

use maleficer_ecs::prelude::*;
use rand::Rng;
use rand_pcg::Pcg64;

use crate::board::Board;
use crate::components::Position;
use crate::content::prefab::Prefab;
use crate::content::tile;
use crate::error::GameResult;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelLayout {
    pub player_start: Position,
    /// Where the stairs cell was placed, if the level has one.
    pub stairs: Option<Position>,
    pub spawns: Vec<(Prefab, Position)>,
}

pub trait MapSource {
    fn generate(
        &mut self,
        world: &mut World,
        board: &mut Board,
        depth: u32,
        rng: &mut Pcg64,
    ) -> GameResult<LevelLayout>;
}

/// A walled rectangle of open floor.
///
/// The player starts in the top-left corner and the stairs sit in the
/// bottom-right one. Fixed spawns are placed as given; `random_population`
/// more prefabs are scattered over free floor, more of them the deeper the
/// level.
#[derive(Debug, Clone, Default)]
pub struct ArenaMap {
    pub spawns: Vec<(Prefab, Position)>,
    /// Extra cells to turn back into wall, `true` for breakable.
    pub walls: Vec<(Position, bool)>,
    /// Overrides the default stairs corner.
    pub stairs: Option<Position>,
    pub no_stairs: bool,
    pub random_population: usize,
}

impl ArenaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spawn(mut self, prefab: Prefab, pos: Position) -> Self {
        self.spawns.push((prefab, pos));
        self
    }

    pub fn with_wall(mut self, pos: Position, breakable: bool) -> Self {
        self.walls.push((pos, breakable));
        self
    }

    pub fn without_stairs(mut self) -> Self {
        self.no_stairs = true;
        self
    }

    pub fn populated(mut self, count: usize) -> Self {
        self.random_population = count;
        self
    }
}

impl MapSource for ArenaMap {
    fn generate(
        &mut self,
        world: &mut World,
        board: &mut Board,
        depth: u32,
        rng: &mut Pcg64,
    ) -> GameResult<LevelLayout> {
        let (w, h) = (board.width(), board.height());
        for x in 1..w - 1 {
            for y in 1..h - 1 {
                let floor = tile::floor(world, x, y);
                board.set_cell(world, x, y, floor)?;
            }
        }
        for &(pos, breakable) in &self.walls {
            let wall = tile::wall(world, pos.x, pos.y, breakable);
            board.set_cell(world, pos.x, pos.y, wall)?;
        }

        let player_start = Position::new(1, 1);
        let stairs = if self.no_stairs {
            None
        } else {
            let pos = self.stairs.unwrap_or(Position::new(w - 2, h - 2));
            let cell = tile::stairs(world, pos);
            board.set_cell(world, pos.x, pos.y, cell)?;
            Some(pos)
        };

        let mut spawns = self.spawns.clone();
        let extra = self.random_population + depth.saturating_sub(1) as usize;
        let mut free: Vec<Position> = (1..w - 1)
            .flat_map(|x| (1..h - 1).map(move |y| Position::new(x, y)))
            .filter(|pos| {
                *pos != player_start
                    && Some(*pos) != stairs
                    && !board.has_blocker(world, pos.x, pos.y)
                    && !spawns.iter().any(|(_, taken)| taken == pos)
            })
            .collect();
        for _ in 0..extra.min(free.len()) {
            let pos = free.swap_remove(rng.gen_range(0..free.len()));
            let prefab = Prefab::POPULATION[rng.gen_range(0..Prefab::POPULATION.len())];
            spawns.push((prefab, pos));
        }

        tracing::debug!(depth, width = w, height = h, spawns = spawns.len(), "arena generated");
        Ok(LevelLayout {
            player_start,
            stairs,
            spawns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Cell, Wall};
    use rand::SeedableRng;

    #[test]
    fn arena_is_walled_with_open_floor() {
        let mut world = World::new();
        let mut board = Board::new(&mut world, 6, 5);
        let mut rng = Pcg64::seed_from_u64(0);
        let layout = ArenaMap::new()
            .with_wall(Position::new(2, 2), true)
            .generate(&mut world, &mut board, 1, &mut rng)
            .unwrap();

        assert_eq!(layout.player_start, Position::new(1, 1));
        assert_eq!(layout.stairs, Some(Position::new(4, 3)));
        assert!(board.has_blocker(&world, 0, 0));
        assert!(board.has_blocker(&world, 5, 4));
        assert!(!board.has_blocker(&world, 1, 1));
        assert!(board.has_blocker(&world, 2, 2));
        let cell = board.cell_at(2, 2).unwrap();
        assert!(world.has_component::<Wall>(cell));
        // One cell per coordinate: old walls were despawned.
        assert_eq!(world.filter::<(&Cell,)>().len(), 30);
    }

    #[test]
    fn population_avoids_occupied_spots() {
        let mut world = World::new();
        let mut board = Board::new(&mut world, 5, 5);
        let mut rng = Pcg64::seed_from_u64(11);
        let layout = ArenaMap::new()
            .populated(100)
            .generate(&mut world, &mut board, 1, &mut rng)
            .unwrap();
        // 3x3 interior minus the start and the stairs.
        assert_eq!(layout.spawns.len(), 7);
        assert!(layout.spawns.iter().all(|(_, pos)| *pos != layout.player_start));
    }
}
