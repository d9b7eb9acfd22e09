//! Static spell specifications
//!
//! A `SpellSpec` is content: it says who a spell targets, what it does to each
//! target and which post-effects run afterwards. The payload builder turns a
//! spec plus a caster into a concrete `RuntimeSpellPayload`.

use crate::core::{EffectKind, EffectName, SlotRef, SpellId, StatKind};
use serde::{Deserialize, Serialize};

/// Which main boards a descriptor looks at, relative to the caster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relative {
    Ally,
    Enemy,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSel {
    CasterLane,
    Fixed(usize),
}

/// Abstract target descriptor, resolved against the live boards at cast time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDescriptor {
    SelfCast,
    Board {
        side: Relative,
    },
    Row {
        side: Relative,
        row: crate::core::Row,
    },
    Column {
        side: Relative,
        lane: LaneSel,
    },
    /// Front-most live occupant in the caster's lane
    Projectile {
        side: Relative,
    },
    /// Dead occupants on the caster's main board
    DeadAllies,
    /// Already-resolved slots; passed through untouched
    Concrete(Vec<SlotRef>),
}

/// Numeric formula evaluated per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    Fixed(i32),
    /// Caster's attack stat plus a flat bonus
    Attack {
        #[serde(default)]
        plus: i32,
    },
    /// Caster's current spell power plus a flat bonus
    SpellPower {
        #[serde(default)]
        plus: i32,
    },
    Stat {
        stat: StatKind,
        of: FormulaSource,
        #[serde(default = "one")]
        multiplier: i32,
        #[serde(default)]
        plus: i32,
    },
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaSource {
    Caster,
    Target,
}

/// What a spell does to each target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellAction {
    Damage(Formula),
    Heal(Formula),
    /// Only the effect grants apply
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyRecipient {
    Caster,
    Targets,
}

/// Hooks that run after the per-target actions, handled by one dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEffect {
    SelfDamage(i32),
    /// Remove effects of one kind from each target, newest first
    Scrub {
        kind: EffectKind,
        /// `None` removes every matching effect
        #[serde(default)]
        count: Option<usize>,
        /// Healing granted per removed effect
        #[serde(default)]
        heal_per_removed: i32,
    },
    /// Push each target one row back
    MoveRowBack,
    /// Push every occupant of each targeted board one row back
    MoveAllBack,
    /// Reduce the casts remaining for each target's current spell slot
    ReduceRowCasts(u32),
    /// Resolve a follow-up spell when any target was lethally damaged
    ConditionalSecondary { spell: SpellId },
    /// `percent` of 100 or more always applies
    ApplyEffectWithChance { effect: EffectName, percent: u8 },
    GrantEnergy { amount: i32, to: EnergyRecipient },
    /// Clear each dead target off its tile
    ConsumeCorpse,
}

/// Scripted behaviors that cannot be expressed as plain descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// Hit the enemy row matching the caster's current row
    MirrorRow,
    /// Replay the last cast an enemy resolved this round
    CopyLastEnemyCast,
}

/// Replaces the default action for the n-th resolved target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOverride {
    pub index: usize,
    pub action: SpellAction,
    #[serde(default)]
    pub effects: Vec<EffectName>,
    #[serde(default)]
    pub post: Vec<PostEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSpec {
    pub id: SpellId,
    #[serde(default)]
    pub name: String,
    pub target: TargetDescriptor,
    #[serde(default)]
    pub action: SpellAction,
    /// Effects granted to every target
    #[serde(default)]
    pub effects: Vec<EffectName>,
    #[serde(default)]
    pub post: Vec<PostEffect>,
    #[serde(default)]
    pub overrides: Vec<TargetOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptKind>,
}

impl SpellSpec {
    pub fn new(id: impl Into<SpellId>, target: TargetDescriptor, action: SpellAction) -> Self {
        SpellSpec {
            id: id.into(),
            name: String::new(),
            target,
            action,
            effects: Vec::new(),
            post: Vec::new(),
            overrides: Vec::new(),
            script: None,
        }
    }

    pub fn with_effect(mut self, effect: impl Into<EffectName>) -> Self {
        self.effects.push(effect.into());
        self
    }

    pub fn with_post(mut self, post: PostEffect) -> Self {
        self.post.push(post);
        self
    }

    pub fn with_script(mut self, script: ScriptKind) -> Self {
        self.script = Some(script);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
