//! The game session and its input boundary.
//!
//! [`Game`] owns every piece of mutable state: the ECS world, the board,
//! the event queues, the message log, the RNG and the phase scheduler.
//! Resolvers and callbacks all take `&mut Game`.
//!
//! Drivers talk to it through two calls. [`Game::advance`] runs units until
//! the active phase wants input. [`Game::submit`] applies one [`Action`] and
//! advances again:
//!
//! ```
//! use maleficer_engine::config::GameConfig;
//! use maleficer_engine::game::{Action, Game, Step};
//! use maleficer_engine::phase::Ontology;
//!
//! let mut game = Game::new(GameConfig::headless(7)).unwrap();
//! assert_eq!(game.advance().unwrap(), Step::Awaiting(Ontology::MainMenu));
//! // "New game", then the first class.
//! game.submit(Action::Confirm).unwrap();
//! let step = game.submit(Action::Confirm).unwrap();
//! assert_eq!(step, Step::Awaiting(Ontology::Level));
//! ```

use maleficer_ecs::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::board::Board;
use crate::components::{
    name_of, position_of, Crosshair, Flying, Health, InInventory, MenuSelection, Player, Position,
    Spell, Target, Targeting, Visible,
};
use crate::condition::{self, Condition};
use crate::config::GameConfig;
use crate::content::player::{self, PlayerClass};
use crate::error::{GameError, GameResult};
use crate::event::{Movement, Queues, Tick};
use crate::location;
use crate::log::MessageLog;
use crate::map::{ArenaMap, MapSource};
use crate::phase::{Ontology, PhaseScheduler, Unit};
use crate::present::{Color, Glyph, NullPresenter, Presenter, View};
use crate::resolve;
use crate::trigger::{self, OnUseTrigger};

// ---------------------------------------------------------------------------
// Input vocabulary
// ---------------------------------------------------------------------------

/// A resolved player intent. Key bindings live with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Step, move a cursor, or move the crosshair.
    Move { dx: i32, dy: i32 },
    Wait,
    /// Cast the spell in this slot.
    Cast(usize),
    OpenInventory,
    Confirm,
    Cancel,
}

/// What the session is doing after a call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Parked on an input unit of this phase.
    Awaiting(Ontology),
    /// The action was not legal. Nothing was consumed.
    Rejected { phase: Ontology, reason: String },
    Quit,
}

pub const MAIN_MENU: [&str; 4] = ["New game", "Options", "About", "Quit"];

/// Cursor of the menu-style phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub cursor: usize,
    /// Where options and about go back to.
    pub return_to: Ontology,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            cursor: 0,
            return_to: Ontology::MainMenu,
        }
    }
}

enum InputOutcome {
    /// Carry on with the phase's cycle.
    Resolve,
    /// Nothing happened; keep waiting on the same input unit.
    Stay,
    Quit,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub struct Game {
    pub(crate) world: World,
    pub(crate) board: Board,
    pub(crate) queues: Queues,
    pub(crate) log: MessageLog,
    pub(crate) rng: Pcg64,
    pub(crate) config: GameConfig,
    pub(crate) scheduler: PhaseScheduler,
    pub(crate) presenter: Box<dyn Presenter>,
    map_source: Box<dyn MapSource>,
    menu: MenuState,
    pub(crate) depth: u32,
    pub(crate) turn: u64,
    awaiting: bool,
    quit: bool,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.scheduler.active())
            .field("depth", &self.depth)
            .field("turn", &self.turn)
            .field("entities", &self.world.entity_count())
            .field("awaiting", &self.awaiting)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// A session parked on the main menu.
    pub fn new(config: GameConfig) -> GameResult<Self> {
        config.validate()?;
        let mut world = World::new();
        let board = Board::new(&mut world, config.board_width, config.board_height);
        let mut scheduler = PhaseScheduler::standard();
        scheduler.change_to(Ontology::MainMenu, None);
        tracing::info!(seed = config.seed, "game session created");
        Ok(Self {
            world,
            board,
            queues: Queues::new(),
            log: MessageLog::new(),
            rng: Pcg64::seed_from_u64(config.seed),
            scheduler,
            presenter: Box::new(NullPresenter),
            map_source: Box::new(ArenaMap::new().populated(4)),
            menu: MenuState::default(),
            depth: 0,
            turn: 0,
            awaiting: false,
            quit: false,
            config,
        })
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn with_map_source(mut self, source: impl MapSource + 'static) -> Self {
        self.map_source = Box::new(source);
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn queues(&self) -> &Queues {
        &self.queues
    }

    pub fn queues_mut(&mut self) -> &mut Queues {
        &mut self.queues
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PhaseScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PhaseScheduler {
        &mut self.scheduler
    }

    pub fn phase(&self) -> Ontology {
        self.scheduler.active()
    }

    pub fn menu(&self) -> MenuState {
        self.menu
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn rng_mut(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.awaiting
    }

    /// The player entity.
    pub fn player(&self) -> GameResult<EntityId> {
        Ok(self.world.filter::<(&Player,)>().first()?)
    }

    fn menu_cursor(&self) -> usize {
        if self.scheduler.active() == Ontology::Inventory {
            return self
                .world
                .query::<(&MenuSelection,)>()
                .next()
                .map(|(_, (selection,))| selection.item)
                .unwrap_or(0);
        }
        self.menu.cursor
    }

    // -- runs and levels ----------------------------------------------------

    /// Throw away the current world and start a fresh run at depth one.
    pub fn start_run(&mut self, class: PlayerClass) -> GameResult<()> {
        self.world = World::new();
        self.queues.clear();
        self.log.clear();
        self.depth = 1;
        self.turn = 0;
        player::spawn(
            &mut self.world,
            class,
            Position::new(1, 1),
            self.config.starting_potions,
            self.config.max_known_spells,
        )?;
        self.new_level()?;
        self.scheduler.change_to(Ontology::Level, None);
        self.log.push(format!("The {} enters the dungeon", class.label()));
        Ok(())
    }

    /// Descend one level.
    pub fn next_level(&mut self) -> GameResult<()> {
        self.depth += 1;
        self.new_level()?;
        self.log.push(format!("You descend to depth {}", self.depth));
        Ok(())
    }

    /// Replace the board and everything on it, keeping the player, their
    /// inventory and their spells.
    pub fn new_level(&mut self) -> GameResult<()> {
        self.queues.clear();
        let player = self.player().ok();
        let doomed: Vec<EntityId> = self
            .world
            .query::<(&Position,)>()
            .map(|(entity, _)| entity)
            .filter(|entity| Some(*entity) != player)
            .collect();
        for entity in doomed {
            self.world.despawn_deferred(entity);
        }
        let removed = self.world.flush_deferred();

        self.board = Board::new(&mut self.world, self.config.board_width, self.config.board_height);
        let layout =
            self.map_source
                .generate(&mut self.world, &mut self.board, self.depth, &mut self.rng)?;
        if let Some(player) = player {
            self.world.insert_component(player, layout.player_start)?;
        }
        self.board.build_entity_cache(&self.world);
        for (prefab, pos) in layout.spawns {
            prefab.spawn(self, pos)?;
        }
        self.board.build_entity_cache(&self.world);
        tracing::info!(depth = self.depth, removed, "level ready");
        Ok(())
    }

    /// Back to the main menu with an empty world.
    fn reset(&mut self) {
        self.world = World::new();
        self.board = Board::new(&mut self.world, self.config.board_width, self.config.board_height);
        self.queues.clear();
        self.log.clear();
        self.depth = 0;
        self.turn = 0;
        self.menu = MenuState::default();
        self.scheduler.change_to(Ontology::MainMenu, None);
    }

    // -- driving ------------------------------------------------------------

    /// Run units until the active phase waits for input.
    pub fn advance(&mut self) -> GameResult<Step> {
        if self.quit {
            return Ok(Step::Quit);
        }
        if self.awaiting {
            return Ok(Step::Awaiting(self.scheduler.active()));
        }
        let mut since_input = 0usize;
        loop {
            let phase = self.scheduler.active();
            let Some(unit) = self.scheduler.next_unit() else {
                return Err(GameError::NoInput { phase });
            };
            if unit == Unit::Input {
                self.awaiting = true;
                return Ok(Step::Awaiting(phase));
            }
            since_input += 1;
            if since_input > 4 * self.scheduler.active_units().len().max(1) + 16 {
                return Err(GameError::NoInput { phase });
            }
            self.run_unit(unit)?;
            if self.quit {
                return Ok(Step::Quit);
            }
        }
    }

    /// Apply `action` to the waiting phase, then advance.
    ///
    /// An illegal action is reported as [`Step::Rejected`]: the presenter is
    /// alerted, the reason is logged, and the scheduler is put back on the
    /// same input unit.
    pub fn submit(&mut self, action: Action) -> GameResult<Step> {
        if !self.awaiting {
            if let step @ Step::Quit = self.advance()? {
                return Ok(step);
            }
        }
        let phase = self.scheduler.active();
        let saved = self.scheduler.snapshot();
        self.awaiting = false;
        tracing::debug!(?phase, ?action, "input");

        match self.handle_input(phase, action) {
            Ok(InputOutcome::Resolve) => self.advance(),
            Ok(InputOutcome::Stay) => {
                self.scheduler.restore(saved);
                self.awaiting = true;
                Ok(Step::Awaiting(phase))
            }
            Ok(InputOutcome::Quit) => {
                self.quit = true;
                tracing::info!("quit requested");
                Ok(Step::Quit)
            }
            Err(err) if err.is_invalid_action() => {
                let reason = err.to_string();
                tracing::debug!(?phase, %reason, "action rejected");
                self.presenter.alert(&reason);
                self.log.push(reason.clone());
                self.scheduler.restore(saved);
                self.awaiting = true;
                Ok(Step::Rejected { phase, reason })
            }
            Err(err) => Err(err),
        }
    }

    /// Run one unit immediately, outside the active rotation.
    pub fn oneshot(&mut self, unit: Unit) -> GameResult<()> {
        if unit == Unit::Input {
            tracing::warn!("input cannot run out of band");
            return Ok(());
        }
        self.run_unit(unit)
    }

    fn run_unit(&mut self, unit: Unit) -> GameResult<()> {
        tracing::trace!(?unit, phase = ?self.scheduler.active(), "unit");
        match unit {
            Unit::Render => {
                self.render();
                Ok(())
            }
            Unit::Input => Ok(()),
            Unit::Upkeep => resolve::upkeep::resolve(self),
            Unit::Movement => resolve::movement::resolve(self),
            Unit::Damage => resolve::damage::resolve(self),
            Unit::NpcTurn => resolve::npc::resolve(self),
            Unit::Death => resolve::death::resolve(self),
            Unit::Spawn => resolve::spawn::resolve(self),
        }
    }

    /// Play pending animations, then present a frame.
    fn render(&mut self) {
        let delay = self.config.animation_delay();
        while let Some(animation) = self.queues.pop_animation() {
            for frame in animation.frames {
                self.presenter
                    .flash(frame.x, frame.y, frame.glyph, frame.color);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
        }
        let view = View {
            world: &self.world,
            board: &self.board,
            log: &self.log,
            depth: self.depth,
            turn: self.turn,
            menu_cursor: self.menu_cursor(),
        };
        self.presenter.frame(self.scheduler.active(), &view);
    }

    // -- input handling -----------------------------------------------------

    fn handle_input(&mut self, phase: Ontology, action: Action) -> GameResult<InputOutcome> {
        match phase {
            Ontology::Level => self.level_input(action),
            Ontology::Target => self.target_input(action),
            Ontology::Inventory => self.inventory_input(action),
            Ontology::GameOver => Ok(match action {
                Action::Confirm => {
                    self.reset();
                    InputOutcome::Resolve
                }
                Action::Cancel => InputOutcome::Quit,
                _ => InputOutcome::Stay,
            }),
            Ontology::MainMenu | Ontology::Options | Ontology::About | Ontology::CharSelect => {
                self.menu_input(phase, action)
            }
        }
    }

    fn menu_input(&mut self, phase: Ontology, action: Action) -> GameResult<InputOutcome> {
        let entries = match phase {
            Ontology::MainMenu => MAIN_MENU.len(),
            Ontology::CharSelect => PlayerClass::ALL.len(),
            _ => 1,
        };
        match action {
            Action::Move { dy, .. } if dy != 0 => {
                let moved = self.menu.cursor as i64 + i64::from(dy);
                self.menu.cursor = moved.rem_euclid(entries as i64) as usize;
                Ok(InputOutcome::Resolve)
            }
            Action::Confirm => match phase {
                Ontology::MainMenu => match self.menu.cursor {
                    0 => self.open_menu(Ontology::CharSelect, Ontology::MainMenu),
                    1 => self.open_menu(Ontology::Options, Ontology::MainMenu),
                    2 => self.open_menu(Ontology::About, Ontology::MainMenu),
                    _ => Ok(InputOutcome::Quit),
                },
                Ontology::CharSelect => {
                    let class = PlayerClass::ALL[self.menu.cursor.min(PlayerClass::ALL.len() - 1)];
                    self.menu = MenuState::default();
                    self.start_run(class)?;
                    Ok(InputOutcome::Resolve)
                }
                _ => self.close_menu(),
            },
            Action::Cancel => match phase {
                Ontology::MainMenu => Ok(InputOutcome::Quit),
                Ontology::CharSelect => self.open_menu(Ontology::MainMenu, Ontology::MainMenu),
                _ => self.close_menu(),
            },
            _ => Ok(InputOutcome::Stay),
        }
    }

    fn open_menu(&mut self, phase: Ontology, return_to: Ontology) -> GameResult<InputOutcome> {
        self.menu = MenuState {
            cursor: 0,
            return_to,
        };
        self.scheduler.change_to(phase, None);
        Ok(InputOutcome::Resolve)
    }

    fn close_menu(&mut self) -> GameResult<InputOutcome> {
        let back = self.menu.return_to;
        self.menu = MenuState::default();
        self.scheduler.change_to(back, None);
        Ok(InputOutcome::Resolve)
    }

    fn level_input(&mut self, action: Action) -> GameResult<InputOutcome> {
        match action {
            Action::Move { dx, dy } => {
                let player = self.player()?;
                self.queues.push(Movement::by(player, dx, dy));
                self.queues.push(Tick);
                Ok(InputOutcome::Resolve)
            }
            Action::Wait => {
                self.queues.push(Tick);
                Ok(InputOutcome::Resolve)
            }
            Action::Cast(slot) => self.cast(slot),
            Action::OpenInventory => {
                if player::inventory_map(&self.world).is_empty() {
                    return Err(GameError::invalid("Inventory is empty"));
                }
                self.world.spawn_with(MenuSelection::default());
                self.scheduler.change_to(Ontology::Inventory, None);
                Ok(InputOutcome::Resolve)
            }
            Action::Cancel => self.open_menu(Ontology::Options, Ontology::Level),
            Action::Confirm => Ok(InputOutcome::Stay),
        }
    }

    /// Cast from `slot`. Self-targeted spells resolve now and end the turn;
    /// ranged ones open the targeting phase.
    fn cast(&mut self, slot: usize) -> GameResult<InputOutcome> {
        let spell = player::spell_in_slot(&self.world, slot)
            .ok_or_else(|| GameError::invalid(format!("No spell in slot {slot}")))?;
        if condition::has(&self.world, spell, Condition::Cooldown) {
            return Err(GameError::invalid("Spell on cooldown"));
        }
        let range = self
            .world
            .get_component::<Spell>(spell)
            .ok_or_else(|| GameError::missing::<Spell>(spell))?
            .target_range;
        let player = self.player()?;

        if range == 0 {
            self.world.insert_component(spell, Target { target: player })?;
            trigger::dispatch::<OnUseTrigger>(self, spell)?;
            self.queues.push(Tick);
            return Ok(InputOutcome::Resolve);
        }

        let pos = position_of(&self.world, player)?;
        let crosshair = self.world.spawn_bundle(
            ComponentBundle::new()
                .with(Crosshair)
                .with(pos)
                .with(Visible::new(Glyph::Crosshair, Color::Red))
                .with(Flying),
        );
        self.board.add(crosshair, pos)?;
        self.world.insert_component(spell, Targeting)?;
        self.scheduler.change_to(Ontology::Target, None);
        Ok(InputOutcome::Resolve)
    }

    fn crosshair(&self) -> GameResult<EntityId> {
        Ok(self.world.filter::<(&Crosshair,)>().first()?)
    }

    fn target_input(&mut self, action: Action) -> GameResult<InputOutcome> {
        match action {
            Action::Move { dx, dy } => {
                let crosshair = self.crosshair()?;
                self.queues.push(Movement::by(crosshair, dx, dy));
                Ok(InputOutcome::Resolve)
            }
            Action::Confirm => self.confirm_target(),
            Action::Cancel => {
                self.close_targeting()?;
                self.scheduler.change_to(Ontology::Level, None);
                Ok(InputOutcome::Resolve)
            }
            _ => Ok(InputOutcome::Stay),
        }
    }

    fn confirm_target(&mut self) -> GameResult<InputOutcome> {
        let spell = self.world.filter::<(&Targeting,)>().first()?;
        let crosshair = self.crosshair()?;
        let aim = position_of(&self.world, crosshair)?;
        let origin = position_of(&self.world, self.player()?)?;
        let range = self
            .world
            .get_component::<Spell>(spell)
            .map(|s| s.target_range)
            .unwrap_or(0);
        if location::euclidean_distance(origin, aim) > f64::from(range) {
            return Err(GameError::invalid("Target out of range"));
        }

        let pieces = self.board.pieces_at(aim.x, aim.y)?;
        let target = pieces
            .iter()
            .copied()
            .find(|e| *e != crosshair && self.world.has_component::<Health>(*e))
            .map_or_else(|| self.board.cell_at(aim.x, aim.y), Ok)?;
        self.world.insert_component(spell, Target { target })?;
        trigger::dispatch::<OnUseTrigger>(self, spell)?;

        self.close_targeting()?;
        self.queues.push(Tick);
        self.scheduler.change_to(Ontology::Level, Some(Unit::Damage));
        Ok(InputOutcome::Resolve)
    }

    fn close_targeting(&mut self) -> GameResult<()> {
        let casting: Vec<EntityId> = self
            .world
            .query::<(&Targeting,)>()
            .map(|(entity, _)| entity)
            .collect();
        for spell in casting {
            self.world.remove_component::<Targeting>(spell)?;
        }
        let cursors: Vec<(EntityId, Position)> = self
            .world
            .query::<(&Crosshair, &Position)>()
            .map(|(entity, (_, pos))| (entity, *pos))
            .collect();
        for (crosshair, pos) in cursors {
            self.board.remove(crosshair, pos)?;
            self.world.despawn(crosshair)?;
        }
        Ok(())
    }

    fn inventory_input(&mut self, action: Action) -> GameResult<InputOutcome> {
        let (selection, (cursor,)) = self.world.filter::<(&MenuSelection,)>().single()?;
        let item = cursor.item;
        match action {
            Action::Move { dy, .. } if dy != 0 => {
                let groups = player::inventory_map(&self.world).len().max(1) as i64;
                let next = (item as i64 + i64::from(dy)).rem_euclid(groups) as usize;
                if let Some(cursor) = self.world.get_component_mut::<MenuSelection>(selection) {
                    cursor.item = next;
                }
                Ok(InputOutcome::Resolve)
            }
            Action::Confirm => {
                self.use_item(item)?;
                self.world.despawn(selection)?;
                self.queues.push(Tick);
                self.scheduler.change_to(Ontology::Level, Some(Unit::Damage));
                Ok(InputOutcome::Resolve)
            }
            Action::Cancel => {
                self.world.despawn(selection)?;
                self.scheduler.change_to(Ontology::Level, None);
                Ok(InputOutcome::Resolve)
            }
            _ => Ok(InputOutcome::Stay),
        }
    }

    /// Use one item from inventory group `index`. The item is consumed at
    /// the end of the turn.
    fn use_item(&mut self, index: usize) -> GameResult<()> {
        let inventory = player::inventory_map(&self.world);
        let Some(item) = inventory.get(index).and_then(|(_, items)| items.first().copied()) else {
            return Err(GameError::invalid("Nothing to use"));
        };
        let player = self.player()?;
        self.world.insert_component(item, Target { target: player })?;
        trigger::dispatch::<OnUseTrigger>(self, item)?;
        let name = name_of(&self.world, item);
        self.world.remove_component::<InInventory>(item)?;
        self.world.despawn_deferred(item);
        self.log.push(format!("You use the {name}"));
        Ok(())
    }
}
