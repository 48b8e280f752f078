//! Deferred event queues.
//!
//! Code that wants something to happen records an intent; a resolver unit
//! drains the matching queue later in the turn. Every queue is strict FIFO:
//! [`Queues::push`] appends on the right and the `pop_*` methods take from
//! the left, so earlier intents (the player's) resolve before later ones
//! (the monsters').
//!
//! ```
//! use maleficer_engine::event::{Movement, Queues, Tick};
//! use maleficer_ecs::entity::EntityId;
//!
//! let mut queues = Queues::default();
//! let player = EntityId::new(0, 0);
//! let bat = EntityId::new(1, 0);
//! queues.push(Movement::by(player, 1, 0));
//! queues.push(Movement::by(bat, 0, 1));
//! queues.push(Tick);
//!
//! assert_eq!(queues.pop_movement().unwrap().source, player);
//! assert_eq!(queues.pending_ticks(), 1);
//! ```

use std::collections::{HashSet, VecDeque};

use maleficer_ecs::prelude::*;

use crate::components::{name_of, Position};
use crate::content::prefab::Prefab;
use crate::present::{Color, Glyph};

// ---------------------------------------------------------------------------
// Event records
// ---------------------------------------------------------------------------

/// Move `source` by `(x, y)` when `relative`, otherwise to `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub source: EntityId,
    pub x: i32,
    pub y: i32,
    pub relative: bool,
}

impl Movement {
    pub fn by(source: EntityId, dx: i32, dy: i32) -> Self {
        Self {
            source,
            x: dx,
            y: dy,
            relative: true,
        }
    }

    pub fn to(source: EntityId, x: i32, y: i32) -> Self {
        Self {
            source,
            x,
            y,
            relative: false,
        }
    }
}

/// Who dealt a hit, captured when the hit was queued.
///
/// Holding the name rather than only the id keeps the log line intact when
/// the source dies before the damage resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageSource {
    pub entity: Option<EntityId>,
    pub name: String,
}

impl DamageSource {
    pub fn of(world: &World, entity: EntityId) -> Self {
        Self {
            entity: Some(entity),
            name: name_of(world, entity),
        }
    }

    /// The synthetic source of bleed ticks.
    pub fn bleed() -> Self {
        Self {
            entity: None,
            name: "bleeding".to_owned(),
        }
    }
}

/// Subtract `amount` from `target`'s health. Negative amounts heal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Damage {
    pub source: DamageSource,
    pub target: EntityId,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    pub entity: EntityId,
}

/// One turn has been consumed. Upkeep runs once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick;

/// One highlighted coordinate in an [`Animation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub x: i32,
    pub y: i32,
    pub glyph: Option<Glyph>,
    pub color: Color,
}

impl Flash {
    pub fn at(pos: Position, glyph: Option<Glyph>, color: Color) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            glyph,
            color,
        }
    }
}

/// Coordinates to flash one after another. Output only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Animation {
    pub frames: Vec<Flash>,
}

impl Animation {
    pub fn new(frames: Vec<Flash>) -> Self {
        Self { frames }
    }

    /// Every point of `line` in the same colour.
    pub fn line(line: &[(i32, i32)], glyph: Option<Glyph>, color: Color) -> Self {
        Self::new(
            line.iter()
                .map(|&(x, y)| Flash { x, y, glyph, color })
                .collect(),
        )
    }
}

/// Entity construction deferred to the end of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawn {
    Prefab { prefab: Prefab, pos: Position },
    /// Tear down this level and generate the next one.
    NextLevel,
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// All deferred work for the session.
#[derive(Debug, Default)]
pub struct Queues {
    movement: VecDeque<Movement>,
    damage: VecDeque<Damage>,
    death: VecDeque<EntityId>,
    /// Entities already waiting in `death`.
    dying: HashSet<EntityId>,
    ticks: usize,
    animation: VecDeque<Animation>,
    spawn: VecDeque<Spawn>,
}

/// An event that knows which queue it belongs to.
pub trait Emit {
    fn emit(self, queues: &mut Queues);
}

impl Emit for Movement {
    fn emit(self, queues: &mut Queues) {
        queues.movement.push_back(self);
    }
}

impl Emit for Damage {
    fn emit(self, queues: &mut Queues) {
        queues.damage.push_back(self);
    }
}

impl Emit for Death {
    fn emit(self, queues: &mut Queues) {
        if queues.dying.insert(self.entity) {
            queues.death.push_back(self.entity);
        }
    }
}

impl Emit for Tick {
    fn emit(self, queues: &mut Queues) {
        queues.ticks += 1;
    }
}

impl Emit for Animation {
    fn emit(self, queues: &mut Queues) {
        if !self.frames.is_empty() {
            queues.animation.push_back(self);
        }
    }
}

impl Emit for Spawn {
    fn emit(self, queues: &mut Queues) {
        queues.spawn.push_back(self);
    }
}

impl Queues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Emit) {
        event.emit(self);
    }

    pub fn pop_movement(&mut self) -> Option<Movement> {
        self.movement.pop_front()
    }

    pub fn pop_damage(&mut self) -> Option<Damage> {
        self.damage.pop_front()
    }

    pub fn pop_death(&mut self) -> Option<EntityId> {
        let entity = self.death.pop_front()?;
        self.dying.remove(&entity);
        Some(entity)
    }

    /// Consume one pending tick, if any.
    pub fn take_tick(&mut self) -> bool {
        if self.ticks == 0 {
            return false;
        }
        self.ticks -= 1;
        true
    }

    pub fn pop_animation(&mut self) -> Option<Animation> {
        self.animation.pop_front()
    }

    pub fn pop_spawn(&mut self) -> Option<Spawn> {
        self.spawn.pop_front()
    }

    pub fn pending_movement(&self) -> usize {
        self.movement.len()
    }

    pub fn pending_damage(&self) -> usize {
        self.damage.len()
    }

    pub fn pending_deaths(&self) -> usize {
        self.death.len()
    }

    pub fn pending_ticks(&self) -> usize {
        self.ticks
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn.len()
    }

    pub fn is_queued_to_die(&self, entity: EntityId) -> bool {
        self.dying.contains(&entity)
    }

    /// Whether every gameplay queue is empty. Animations are ignored.
    pub fn is_idle(&self) -> bool {
        self.movement.is_empty()
            && self.damage.is_empty()
            && self.death.is_empty()
            && self.ticks == 0
            && self.spawn.is_empty()
    }

    /// Drop everything that refers to the current level's entities.
    pub fn clear_level(&mut self) {
        self.movement.clear();
        self.damage.clear();
        self.death.clear();
        self.dying.clear();
        self.animation.clear();
    }

    pub fn clear(&mut self) {
        self.clear_level();
        self.ticks = 0;
        self.spawn.clear();
    }
}
