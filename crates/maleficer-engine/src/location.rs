//! Geometry over the board: lines, rays, sight and neighbourhoods.

use maleficer_ecs::prelude::*;

use crate::board::Board;
use crate::components::{Blocking, Health, Opaque, Player, Position, Transparent};
use crate::error::GameResult;

/// Bresenham line from `from` to `to`, both ends included.
pub fn line(from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut points = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        points.push((x, y));
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

pub fn euclidean_distance(a: Position, b: Position) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    (dx * dx + dy * dy).sqrt()
}

/// The eight surrounding coordinates, clockwise from north. Not bounds
/// checked.
pub fn neighbor_coords(pos: Position) -> Vec<(i32, i32)> {
    const OFFSETS: [(i32, i32); 8] = [
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
    ];
    OFFSETS
        .iter()
        .map(|(dx, dy)| (pos.x + dx, pos.y + dy))
        .collect()
}

/// On-board coordinates in the square of half-width `radius` around `pos`,
/// `pos` included.
pub fn coords_within_radius(board: &Board, pos: Position, radius: i32) -> Vec<(i32, i32)> {
    let radius = radius.max(0);
    let mut coords = Vec::new();
    for x in pos.x - radius..=pos.x + radius {
        for y in pos.y - radius..=pos.y + radius {
            if board.in_bounds(x, y) {
                coords.push((x, y));
            }
        }
    }
    coords
}

/// Where something at `target` lands when shoved `distance` cells directly
/// away from `source`.
pub fn push_coords(source: Position, target: Position, distance: i32) -> (i32, i32) {
    let dx = (target.x - source.x).signum();
    let dy = (target.y - source.y).signum();
    (target.x + dx * distance, target.y + dy * distance)
}

/// Unit step from `from` towards `to`.
pub fn step_towards(from: Position, to: Position) -> (i32, i32) {
    ((to.x - from.x).signum(), (to.y - from.y).signum())
}

pub fn player_position(world: &World) -> GameResult<Position> {
    let (_, (_, pos)) = world.filter::<(&Player, &Position)>().single()?;
    Ok(*pos)
}

/// Whether light passes through `(x, y)`.
pub fn is_transparent(world: &World, board: &Board, x: i32, y: i32) -> bool {
    let Ok(cell) = board.cell_at(x, y) else {
        return false;
    };
    if !world.has_component::<Transparent>(cell) {
        return false;
    }
    board
        .pieces_at(x, y)
        .map(|pieces| !pieces.iter().any(|e| world.has_component::<Opaque>(*e)))
        .unwrap_or(false)
}

/// Cast a ray from `source` towards `target`.
///
/// The ray stops at the first blocking coordinate it enters. Returns the
/// entity it stopped on and the coordinates it crossed, the source's own
/// coordinate excluded. Reaching `target`'s coordinate returns `target`
/// itself. Otherwise the stopping entity is the first blocker with health at
/// that coordinate, then any blocker, then the cell.
pub fn trace_ray(
    world: &World,
    board: &Board,
    source: EntityId,
    target: EntityId,
) -> GameResult<(EntityId, Vec<(i32, i32)>)> {
    let from = crate::components::position_of(world, source)?;
    let to = crate::components::position_of(world, target)?;
    let mut trace = Vec::new();
    for (x, y) in line(from.as_tuple(), to.as_tuple()).into_iter().skip(1) {
        trace.push((x, y));
        if (x, y) == to.as_tuple() {
            return Ok((target, trace));
        }
        if board.has_blocker(world, x, y) {
            let pieces = board.pieces_at(x, y)?;
            let blocker = pieces
                .iter()
                .copied()
                .filter(|e| world.has_component::<Blocking>(*e))
                .min_by_key(|e| !world.has_component::<Health>(*e));
            let stop = match blocker {
                Some(entity) => entity,
                None => board.cell_at(x, y)?,
            };
            return Ok((stop, trace));
        }
    }
    Ok((target, trace))
}

/// Whether `source` has an unobstructed line of sight to `target`.
///
/// Only the coordinates strictly between the two are checked.
pub fn can_see(world: &World, board: &Board, source: EntityId, target: EntityId) -> GameResult<bool> {
    let from = crate::components::position_of(world, source)?;
    let to = crate::components::position_of(world, target)?;
    Ok(clear_sight(world, board, from, to))
}

fn clear_sight(world: &World, board: &Board, from: Position, to: Position) -> bool {
    let points = line(from.as_tuple(), to.as_tuple());
    let inner = points.len().saturating_sub(1);
    points
        .iter()
        .take(inner)
        .skip(1)
        .all(|&(x, y)| is_transparent(world, board, x, y))
}

/// Visibility grid around one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FovGrid {
    width: i32,
    height: i32,
    visible: Vec<bool>,
}

impl FovGrid {
    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.visible[(x * self.height + y) as usize]
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

/// Every coordinate within `radius` (euclidean) of `origin` with a clear
/// line of sight to it. Opaque coordinates themselves are visible, so walls
/// bounding a room are drawn.
pub fn fov(world: &World, board: &Board, origin: Position, radius: i32) -> FovGrid {
    let mut grid = FovGrid {
        width: board.width(),
        height: board.height(),
        visible: vec![false; (board.width() * board.height()) as usize],
    };
    for (x, y) in coords_within_radius(board, origin, radius) {
        let pos = Position::new(x, y);
        if euclidean_distance(origin, pos) <= f64::from(radius) && clear_sight(world, board, origin, pos)
        {
            grid.visible[(x * board.height() + y) as usize] = true;
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tile;

    fn open_board(world: &mut World, w: i32, h: i32) -> Board {
        Board::filled(world, w, h, |world, x, y| tile::floor(world, x, y))
    }

    #[test]
    fn line_includes_both_ends() {
        assert_eq!(line((0, 0), (3, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(line((2, 2), (2, 2)), vec![(2, 2)]);
        assert_eq!(line((0, 0), (2, 2)), vec![(0, 0), (1, 1), (2, 2)]);
        let steep = line((0, 0), (1, 3));
        assert_eq!(steep.first(), Some(&(0, 0)));
        assert_eq!(steep.last(), Some(&(1, 3)));
        assert_eq!(steep.len(), 4);
    }

    #[test]
    fn radius_is_clipped_to_the_board() {
        let mut world = World::new();
        let board = open_board(&mut world, 5, 5);
        assert_eq!(coords_within_radius(&board, Position::new(2, 2), 1).len(), 9);
        assert_eq!(coords_within_radius(&board, Position::new(0, 0), 1).len(), 4);
        assert_eq!(coords_within_radius(&board, Position::new(0, 0), 0), vec![(0, 0)]);
    }

    #[test]
    fn push_moves_directly_away() {
        let src = Position::new(2, 2);
        assert_eq!(push_coords(src, Position::new(3, 2), 2), (5, 2));
        assert_eq!(push_coords(src, Position::new(1, 1), 2), (-1, -1));
        assert_eq!(step_towards(src, Position::new(0, 5)), (-1, 1));
    }

    #[test]
    fn ray_stops_at_the_first_blocker() {
        let mut world = World::new();
        let mut board = open_board(&mut world, 6, 3);
        let shooter = world.spawn_with(Position::new(0, 1));
        let target = world.spawn_with(Position::new(5, 1));
        let wall = tile::wall(&mut world, 3, 1, false);
        board.set_cell(&mut world, 3, 1, wall).unwrap();
        board.build_entity_cache(&world);

        let (hit, trace) = trace_ray(&world, &board, shooter, target).unwrap();
        assert_eq!(hit, wall);
        assert_eq!(trace, vec![(1, 1), (2, 1), (3, 1)]);
        assert!(!can_see(&world, &board, shooter, target).unwrap());
    }

    #[test]
    fn ray_prefers_a_blocker_with_health() {
        let mut world = World::new();
        let mut board = open_board(&mut world, 5, 1);
        let shooter = world.spawn_with(Position::new(0, 0));
        let target = world.spawn_with(Position::new(4, 0));
        let guard = world.spawn_bundle(
            ComponentBundle::new()
                .with(Position::new(2, 0))
                .with(Blocking)
                .with(Health::new(5)),
        );
        board.build_entity_cache(&world);
        let (hit, _) = trace_ray(&world, &board, shooter, target).unwrap();
        assert_eq!(hit, guard);
        // Blocking actors do not block sight.
        assert!(can_see(&world, &board, shooter, target).unwrap());
    }

    #[test]
    fn fov_sees_walls_but_not_past_them() {
        let mut world = World::new();
        let mut board = open_board(&mut world, 7, 1);
        let wall = tile::wall(&mut world, 3, 0, false);
        board.set_cell(&mut world, 3, 0, wall).unwrap();
        let grid = fov(&world, &board, Position::new(0, 0), 10);
        assert!(grid.is_visible(2, 0));
        assert!(grid.is_visible(3, 0));
        assert!(!grid.is_visible(4, 0));
        assert!(!grid.is_visible(-1, 0));
        assert_eq!(grid.visible_count(), 4);
    }
}
