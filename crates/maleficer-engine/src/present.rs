//! Output hook between the core and whatever draws it.
//!
//! The core never renders. Render units hand a read-only [`View`] to the
//! session's [`Presenter`]; the animation queue and failed moves call
//! [`Presenter::flash`]; rejected actions call [`Presenter::alert`]. Every
//! method defaults to a no-op so headless drivers implement only what they
//! need.

use std::cell::RefCell;
use std::rc::Rc;

use maleficer_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::location::{self, FovGrid};
use crate::log::MessageLog;
use crate::phase::Ontology;

// ---------------------------------------------------------------------------
// Display vocabulary
// ---------------------------------------------------------------------------

/// What an entity looks like. Renderers map these onto their tile sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Glyph {
    Player,
    Floor,
    Wall,
    BreakableWall,
    Stairs,
    Bat,
    Skeleton,
    Goblin,
    Warlock,
    Flame,
    Potion,
    Scroll,
    Bomb,
    Trap,
    Crosshair,
    MagicMissile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
    Floor,
    LightGrey,
    Red,
    LightRed,
    BloodRed,
    Green,
    DarkGreen,
    Blue,
    Orange,
    Brown,
    Beige,
    Indigo,
    Magenta,
    Yellow,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Read-only snapshot of the session handed to [`Presenter::frame`].
#[derive(Clone, Copy)]
pub struct View<'a> {
    pub world: &'a World,
    pub board: &'a Board,
    pub log: &'a MessageLog,
    pub depth: u32,
    pub turn: u64,
    /// Highlighted row of the active menu, if the phase has one.
    pub menu_cursor: usize,
}

impl View<'_> {
    /// Cells visible from the player, or `None` when there is no player on
    /// the board.
    pub fn player_fov(&self, radius: i32) -> Option<FovGrid> {
        let pos = location::player_position(self.world).ok()?;
        Some(location::fov(self.world, self.board, pos, radius))
    }
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// Receives everything the core wants shown.
pub trait Presenter {
    /// A render unit ran for `phase`.
    fn frame(&mut self, _phase: Ontology, _view: &View<'_>) {}

    /// Highlight one board coordinate, optionally overriding its glyph.
    fn flash(&mut self, _x: i32, _y: i32, _glyph: Option<Glyph>, _color: Color) {}

    /// A user-facing warning, e.g. why an action was rejected.
    fn alert(&mut self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// One call received by a [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    Frame { phase: Ontology, turn: u64 },
    Flash { x: i32, y: i32, glyph: Option<Glyph>, color: Color },
    Alert(String),
}

/// Records every call into a shared buffer.
///
/// Clone the recorder before boxing it into the game; the clone keeps
/// reading the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    events: Rc<RefCell<Vec<Presented>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Presented> {
        self.events.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Presented::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn flashes(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, Presented::Flash { .. }))
            .count()
    }

    pub fn last_frame(&self) -> Option<Ontology> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Presented::Frame { phase, .. } => Some(*phase),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Presenter for RecordingPresenter {
    fn frame(&mut self, phase: Ontology, view: &View<'_>) {
        self.events.borrow_mut().push(Presented::Frame {
            phase,
            turn: view.turn,
        });
    }

    fn flash(&mut self, x: i32, y: i32, glyph: Option<Glyph>, color: Color) {
        self.events
            .borrow_mut()
            .push(Presented::Flash { x, y, glyph, color });
    }

    fn alert(&mut self, message: &str) {
        self.events
            .borrow_mut()
            .push(Presented::Alert(message.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_clones_share_a_buffer() {
        let recorder = RecordingPresenter::new();
        let mut boxed: Box<dyn Presenter> = Box::new(recorder.clone());
        boxed.alert("Spell on cooldown");
        boxed.flash(1, 2, None, Color::Red);
        assert_eq!(recorder.alerts(), vec!["Spell on cooldown".to_owned()]);
        assert_eq!(recorder.flashes(), 1);
        recorder.clear();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn null_presenter_accepts_everything() {
        let mut presenter = NullPresenter;
        presenter.alert("ignored");
        presenter.flash(0, 0, Some(Glyph::Bomb), Color::Red);
    }
}
