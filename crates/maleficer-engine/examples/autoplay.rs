//! Headless autoplay -- a random walker plays runs until it dies or runs
//! out of turns.
//!
//! Run with:
//!   cargo run --example autoplay -p maleficer-engine -- [config.json] [turns]
//!
//! `RUST_LOG=maleficer_engine=debug` shows every resolver step.

use anyhow::Context;
use maleficer_engine::logging;
use maleficer_engine::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Pick something plausible for the phase the game is waiting in.
fn choose(phase: Ontology, rng: &mut Pcg64) -> Action {
    match phase {
        Ontology::Level => match rng.gen_range(0..10) {
            0 => Action::Wait,
            1 => Action::Cast(rng.gen_range(1..=2)),
            2 => Action::OpenInventory,
            _ => {
                let (dx, dy) = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
                Action::Move { dx, dy }
            }
        },
        Ontology::Target => match rng.gen_range(0..4) {
            0 => Action::Confirm,
            1 => Action::Cancel,
            _ => {
                let (dx, dy) = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
                Action::Move { dx, dy }
            }
        },
        Ontology::Options | Ontology::About => Action::Cancel,
        // Main menu, class select, inventory and the end screen.
        _ => Action::Confirm,
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("maleficer_engine=info");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => GameConfig {
            animation_delay_ms: 0,
            ..GameConfig::default()
        },
    };
    let turns: u64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("turn limit {raw:?}"))?,
        None => 500,
    };

    let recorder = RecordingPresenter::new();
    let mut driver = Pcg64::seed_from_u64(config.seed ^ 0x5eed);
    let mut game = Game::new(config)?
        .with_presenter(recorder.clone())
        .with_map_source(ArenaMap::new().populated(6));

    let mut rejected = 0usize;
    let mut step = game.advance()?;
    let mut deepest = 0;
    loop {
        let phase = match step {
            Step::Quit => break,
            Step::Awaiting(phase) => phase,
            Step::Rejected { phase, .. } => {
                rejected += 1;
                phase
            }
        };
        deepest = deepest.max(game.depth());
        if phase == Ontology::GameOver || game.turn() >= turns {
            break;
        }
        // Keep the recorder from growing without bound.
        recorder.clear();
        step = game.submit(choose(phase, &mut driver))?;
    }

    tracing::info!(
        turns = game.turn(),
        depth = deepest,
        rejected,
        phase = ?game.phase(),
        "autoplay finished"
    );
    for line in game.log().tail(10) {
        println!("{line}");
    }
    Ok(())
}
