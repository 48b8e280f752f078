//! Phases and the unit scheduler.
//!
//! A phase ([`Ontology`]) is a named game mode. Each phase owns an ordered,
//! cyclic list of [`Unit`]s. The scheduler hands them out one at a time;
//! when the cursor reaches the end of the list it wraps to the start.
//!
//! Changing phase mid-cycle abandons the rest of the old list. The new
//! phase starts at its first unit, or at the first occurrence of a chosen
//! one so that, for example, leaving targeting picks the level up at damage
//! resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ontology {
    MainMenu,
    Options,
    About,
    CharSelect,
    Level,
    Target,
    Inventory,
    GameOver,
}

impl Ontology {
    pub const ALL: [Ontology; 8] = [
        Self::MainMenu,
        Self::Options,
        Self::About,
        Self::CharSelect,
        Self::Level,
        Self::Target,
        Self::Inventory,
        Self::GameOver,
    ];

    /// Menu-style phases: rendering plus cursor input, no world simulation.
    pub fn is_menu(self) -> bool {
        matches!(
            self,
            Self::MainMenu | Self::Options | Self::About | Self::CharSelect | Self::GameOver
        )
    }
}

/// One step of a phase's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Render,
    /// Block until the driver submits an action.
    Input,
    /// Consume pending ticks: conditions apply and decay.
    Upkeep,
    Movement,
    Damage,
    NpcTurn,
    Death,
    Spawn,
}

/// Position in the cycle, kept so a rejected action can be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    active: Ontology,
    cursor: usize,
    current: Option<Unit>,
}

#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    phases: HashMap<Ontology, Vec<Unit>>,
    active: Ontology,
    /// Index of the next unit to hand out.
    cursor: usize,
    current: Option<Unit>,
}

impl PhaseScheduler {
    /// No phases registered, parked on the main menu.
    pub fn empty() -> Self {
        Self {
            phases: HashMap::new(),
            active: Ontology::MainMenu,
            cursor: 0,
            current: None,
        }
    }

    /// The game's phase table.
    ///
    /// The level runs two movement and damage passes: the first resolves
    /// the player's action, the second the monsters' replies.
    pub fn standard() -> Self {
        use Unit::*;
        let mut scheduler = Self::empty();
        scheduler.register(
            Ontology::Level,
            vec![
                Upkeep, Render, Input, Damage, Movement, NpcTurn, Movement, Damage, Death, Spawn,
            ],
        );
        scheduler.register(Ontology::Target, vec![Render, Input, Movement]);
        for phase in [
            Ontology::Inventory,
            Ontology::MainMenu,
            Ontology::Options,
            Ontology::About,
            Ontology::CharSelect,
            Ontology::GameOver,
        ] {
            scheduler.register(phase, vec![Render, Input]);
        }
        scheduler
    }

    pub fn register(&mut self, phase: Ontology, units: Vec<Unit>) {
        self.phases.insert(phase, units);
    }

    pub fn active(&self) -> Ontology {
        self.active
    }

    /// The unit most recently handed out.
    pub fn current(&self) -> Option<Unit> {
        self.current
    }

    pub fn active_units(&self) -> &[Unit] {
        self.phases
            .get(&self.active)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the active phase schedules `unit` at all.
    pub fn contains(&self, unit: Unit) -> bool {
        self.active_units().contains(&unit)
    }

    /// Switch to `phase`, starting at `start` if given.
    ///
    /// A `start` the phase does not contain is logged and ignored.
    pub fn change_to(&mut self, phase: Ontology, start: Option<Unit>) {
        let from = self.active;
        self.active = phase;
        self.current = None;
        self.cursor = match start {
            None => 0,
            Some(unit) => match self.active_units().iter().position(|u| *u == unit) {
                Some(idx) => idx,
                None => {
                    tracing::warn!(?phase, ?unit, "phase has no such unit, starting from the top");
                    0
                }
            },
        };
        tracing::info!(?from, to = ?phase, ?start, "phase change");
    }

    /// Hand out the next unit of the active phase, wrapping at the end.
    ///
    /// The cursor moves before the unit runs, so a unit that changes phase
    /// leaves the new phase's cursor untouched.
    pub fn next_unit(&mut self) -> Option<Unit> {
        let units = self.phases.get(&self.active)?;
        if units.is_empty() {
            return None;
        }
        let unit = units[self.cursor % units.len()];
        self.cursor = (self.cursor + 1) % units.len();
        self.current = Some(unit);
        Some(unit)
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            active: self.active,
            cursor: self.cursor,
            current: self.current,
        }
    }

    pub fn restore(&mut self, snapshot: SchedulerSnapshot) {
        self.active = snapshot.active;
        self.cursor = snapshot.cursor;
        self.current = snapshot.current;
    }
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        Self::standard()
    }
}
