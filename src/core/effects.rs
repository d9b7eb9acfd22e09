//! Buffs, debuffs and their reaction hooks

use crate::core::{EffectName, SlotRef, SpellId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Buff,
    Debuff,
}

/// Damage or heal applied by a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseKind {
    Damage,
    Heal,
}

/// Where a pulse gets its magnitude from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseAmount {
    Fixed(i32),
    /// The holder's current armor
    Armor,
    /// The current round number
    RoundNumber,
    RoundNumberTimes(i32),
}

impl PulseAmount {
    pub fn evaluate(&self, holder_armor: i32, round: u32) -> i32 {
        let round = round as i32;
        match *self {
            PulseAmount::Fixed(n) => n,
            PulseAmount::Armor => holder_armor,
            PulseAmount::RoundNumber => round,
            PulseAmount::RoundNumberTimes(k) => round * k,
        }
    }
}

/// Periodic damage or heal, applied once per round before energy gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    pub kind: PulseKind,
    pub amount: PulseAmount,
}

/// Flat stat adjustments while the effect is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModifiers {
    pub armor: i32,
    pub speed: i32,
    pub spell_power: i32,
}

/// Event that fires a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Damaged,
    Death,
    RoundStart,
    OwnerCast,
}

/// What a reaction does once triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionAction {
    /// Heal every live ally of the holder (holder included)
    HealAllies(i32),
    /// Deal the damage just taken back to the attacker
    ReflectDamage,
    DamageAttacker(i32),
    GrantEnergy(i32),
    /// Resolve a spell as a scripted cast by the holder
    CastSpell(SpellId),
    ApplyEffectToAttacker(EffectName),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub trigger: Trigger,
    pub action: ReactionAction,
}

/// An effect template or an active effect instance on a slot
///
/// Templates come from content with `source` unset; the instance placed on a
/// slot records which slot applied it so reflect-style reactions can find the
/// attacker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub name: EffectName,
    pub kind: EffectKind,
    /// Remaining rounds; `None` is permanent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<Pulse>,
    #[serde(default)]
    pub modifiers: StatModifiers,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub reactions: SmallVec<[Reaction; 1]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SlotRef>,
}

impl Effect {
    pub fn new(name: impl Into<EffectName>, kind: EffectKind) -> Self {
        Effect {
            name: name.into(),
            kind,
            duration: None,
            pulse: None,
            modifiers: StatModifiers::default(),
            reactions: SmallVec::new(),
            source: None,
        }
    }

    pub fn with_duration(mut self, rounds: i32) -> Self {
        self.duration = Some(rounds);
        self
    }

    pub fn with_pulse(mut self, kind: PulseKind, amount: PulseAmount) -> Self {
        self.pulse = Some(Pulse { kind, amount });
        self
    }

    pub fn with_reaction(mut self, trigger: Trigger, action: ReactionAction) -> Self {
        self.reactions.push(Reaction { trigger, action });
        self
    }

    /// Copy a template onto a slot, recording who applied it
    pub fn instantiate(&self, source: Option<SlotRef>) -> Effect {
        let mut effect = self.clone();
        effect.source = source;
        effect
    }

    pub fn is_debuff(&self) -> bool {
        self.kind == EffectKind::Debuff
    }

    /// Tick the duration down by one round; returns true once expired
    pub fn tick(&mut self) -> bool {
        match self.duration.as_mut() {
            Some(rounds) => {
                *rounds -= 1;
                *rounds <= 0
            }
            None => false,
        }
    }

    pub fn reactions_for(&self, trigger: Trigger) -> impl Iterator<Item = &ReactionAction> {
        self.reactions
            .iter()
            .filter(move |r| r.trigger == trigger)
            .map(|r| &r.action)
    }
}
