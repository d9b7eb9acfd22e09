//! Core round types: ids, geometry, heroes, spells, effects

pub mod cast;
pub mod effects;
pub mod hero;
pub mod passive;
pub mod position;
pub mod spell;
pub mod types;

pub use cast::{Cast, CastSpell, QueueId, QueueIdGen};
pub use effects::{
    Effect, EffectKind, Pulse, PulseAmount, PulseKind, Reaction, ReactionAction, StatModifiers,
    Trigger,
};
pub use hero::{Hero, HeroSpells, SlotSpell, HEALTH_CAP};
pub use passive::{Passive, PassiveKind};
pub use position::{BoardKind, BoardRef, SlotRef, BOARD_SIZE};
pub use spell::{
    EnergyRecipient, Formula, FormulaSource, LaneSel, PostEffect, Relative, ScriptKind,
    SpellAction, SpellSpec, TargetDescriptor, TargetOverride,
};
pub use types::{EffectName, HeroId, PlayerToken, Row, Side, SpellId, SpellSlot, StatKind, Winner};
