//! Passive abilities copied once from a hero template

use crate::core::EffectName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassiveKind {
    /// Gain energy whenever damage is taken
    EnergyOnDamage { amount: i32 },
    /// Survive the first lethal hit at 1 health
    ReviveOnce,
    /// Reward the killer for each kill
    KillReward {
        #[serde(default)]
        energy: i32,
        #[serde(default)]
        heal: i32,
    },
    /// Mark enemy tiles whose energy climbs past the contract threshold
    AcceptContract { effect: EffectName },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passive {
    pub name: String,
    pub kind: PassiveKind,
    /// Set once a single-use passive has fired
    #[serde(default)]
    pub consumed: bool,
}

impl Passive {
    pub fn new(name: impl Into<String>, kind: PassiveKind) -> Self {
        Passive {
            name: name.into(),
            kind,
            consumed: false,
        }
    }

    pub fn is_single_use(&self) -> bool {
        matches!(self.kind, PassiveKind::ReviveOnce)
    }

    pub fn is_available(&self) -> bool {
        !(self.is_single_use() && self.consumed)
    }
}
