//! Trigger lists and their dispatch.
//!
//! An entity reacts to a game event by carrying the matching trigger
//! component: an ordered list of [`Callback`]s. [`dispatch`] runs that list
//! against the entity.

use maleficer_ecs::prelude::*;

use crate::behavior::Callback;
use crate::components::Target;
use crate::error::GameResult;
use crate::game::Game;

/// A component holding the callbacks for one kind of game event.
pub trait Trigger: Component {
    /// Short label for diagnostics.
    const KIND: &'static str;

    fn callbacks(&self) -> &[Callback];
}

macro_rules! trigger_list {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name(pub Vec<Callback>);

        impl $name {
            pub fn new(callbacks: impl Into<Vec<Callback>>) -> Self {
                Self(callbacks.into())
            }
        }

        impl Trigger for $name {
            const KIND: &'static str = $kind;

            fn callbacks(&self) -> &[Callback] {
                &self.0
            }
        }
    };
}

trigger_list!(
    /// Fired when a non-flying mover steps onto the entity.
    OnStepTrigger,
    "step"
);
trigger_list!(
    /// Fired by the death resolver.
    OnDeathTrigger,
    "death"
);
trigger_list!(
    /// Fired when a spell is cast or an item is used.
    OnUseTrigger,
    "use"
);
trigger_list!(
    /// Fired on the holder's own turn: bump attacks, ranged fire, fuses.
    OnEnemyTurnTrigger,
    "enemy_turn"
);

/// Run `entity`'s `T` callbacks in order.
///
/// Does nothing for a dead entity. Liveness is re-checked before every
/// callback, so a callback that kills its holder ends the list. Whatever the
/// outcome, a leftover [`Target`] on the holder is removed before returning,
/// and the first callback error is passed to the caller.
pub fn dispatch<T: Trigger>(game: &mut Game, entity: EntityId) -> GameResult<()> {
    if !game.world.is_alive(entity) {
        tracing::trace!(entity = %entity, trigger = T::KIND, "trigger fizzled: holder is gone");
        return Ok(());
    }
    let callbacks = game
        .world
        .get_component::<T>(entity)
        .map(|trigger| trigger.callbacks().to_vec())
        .unwrap_or_default();

    let mut outcome = Ok(());
    for callback in callbacks {
        if !game.world.is_alive(entity) {
            break;
        }
        tracing::trace!(entity = %entity, trigger = T::KIND, ?callback, "invoking callback");
        if let Err(err) = callback.invoke(game, entity) {
            outcome = Err(err);
            break;
        }
    }

    if game.world.is_alive(entity) {
        game.world.remove_component::<Target>(entity)?;
    }
    outcome
}
