//! Hero templates
//!
//! A hero template is static content. Runtime stats live on the occupant that
//! wraps it (see `board::Occupant`).

use crate::core::{HeroId, Passive, SpellId, SpellSlot};
use serde::{Deserialize, Serialize};

/// Health cap for every non-monster hero
pub const HEALTH_CAP: i32 = 15;

/// Spell bound to one spell slot, with its energy cost and cast budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpell {
    pub spell: SpellId,
    pub cost: i32,
    /// Casts for the occupant's whole stay on the board, not per round.
    /// Copied into `Occupant::casts_remaining` on first touch and never
    /// refilled, so a match spends one budget across all its rounds.
    pub casts: u32,
}

impl SlotSpell {
    pub fn new(spell: impl Into<SpellId>, cost: i32, casts: u32) -> Self {
        SlotSpell {
            spell: spell.into(),
            cost,
            casts,
        }
    }
}

/// The hero-to-slot spell table (`hero.spells.{front,middle,back}`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroSpells {
    pub front: Option<SlotSpell>,
    pub middle: Option<SlotSpell>,
    pub back: Option<SlotSpell>,
}

impl HeroSpells {
    pub fn get(&self, slot: SpellSlot) -> Option<&SlotSpell> {
        match slot {
            SpellSlot::Front => self.front.as_ref(),
            SpellSlot::Middle => self.middle.as_ref(),
            SpellSlot::Back => self.back.as_ref(),
        }
    }

    pub fn set(&mut self, slot: SpellSlot, spell: SlotSpell) {
        match slot {
            SpellSlot::Front => self.front = Some(spell),
            SpellSlot::Middle => self.middle = Some(spell),
            SpellSlot::Back => self.back = Some(spell),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    #[serde(default)]
    pub name: String,
    pub health: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub spell_power: i32,
    #[serde(default = "default_attack")]
    pub attack: i32,
    /// Energy the hero starts its first round with
    #[serde(default)]
    pub energy: i32,
    /// Monsters ignore the health cap
    #[serde(default)]
    pub monster: bool,
    #[serde(default)]
    pub spells: HeroSpells,
    #[serde(default)]
    pub passives: Vec<Passive>,
}

fn default_attack() -> i32 {
    1
}

impl Hero {
    pub fn new(id: impl Into<HeroId>, health: i32, speed: i32) -> Self {
        Hero {
            id: id.into(),
            name: String::new(),
            health,
            armor: 0,
            speed,
            spell_power: 0,
            attack: default_attack(),
            energy: 0,
            monster: false,
            spells: HeroSpells::default(),
            passives: Vec::new(),
        }
    }

    pub fn with_spell(mut self, slot: SpellSlot, spell: SlotSpell) -> Self {
        self.spells.set(slot, spell);
        self
    }

    pub fn with_passive(mut self, passive: Passive) -> Self {
        self.passives.push(passive);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Maximum health for this hero, if capped
    pub fn health_cap(&self) -> Option<i32> {
        if self.monster {
            None
        } else {
            Some(HEALTH_CAP)
        }
    }
}
