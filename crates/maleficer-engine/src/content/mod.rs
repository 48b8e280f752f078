//! Content constructors: tiles, monsters, items, spells and the player.

pub mod item;
pub mod npc;
pub mod player;
pub mod prefab;
pub mod spell;
pub mod tile;
