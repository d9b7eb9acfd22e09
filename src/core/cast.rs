//! Queued casts and the queue-id sequence

use crate::core::{SpellId, SpellSlot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable id of a queued cast, used for dedup and removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(u64);

impl QueueId {
    pub fn new(id: u64) -> Self {
        QueueId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic queue-id generator
///
/// Owned by a round engine instance and threaded through collection, so
/// independent engines never share a counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueIdGen {
    next: u64,
}

impl QueueIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> QueueId {
        let id = QueueId(self.next);
        self.next += 1;
        id
    }

    /// Make sure future ids are strictly greater than `seen`
    pub fn observe(&mut self, seen: QueueId) {
        if seen.0 >= self.next {
            self.next = seen.0 + 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastSpell {
    Spell(SpellId),
    BasicAttack,
}

impl fmt::Display for CastSpell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastSpell::Spell(id) => write!(f, "{id}"),
            CastSpell::BasicAttack => f.write_str("basicAttack"),
        }
    }
}

/// A spell or basic attack waiting in a slot's queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cast {
    pub spell: CastSpell,
    pub slot: SpellSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<QueueId>,
    /// Energy at enqueue time, used for ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_snapshot: Option<i32>,
    /// Explicit cost; basic attacks carry the energy they drain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_override: Option<i32>,
}

impl Cast {
    pub fn spell(spell: impl Into<SpellId>, slot: SpellSlot) -> Self {
        Cast {
            spell: CastSpell::Spell(spell.into()),
            slot,
            queue_id: None,
            energy_snapshot: None,
            cost_override: None,
        }
    }

    pub fn basic_attack(slot: SpellSlot, energy: i32) -> Self {
        Cast {
            spell: CastSpell::BasicAttack,
            slot,
            queue_id: None,
            energy_snapshot: None,
            cost_override: Some(energy),
        }
    }

    pub fn with_snapshot(mut self, energy: i32) -> Self {
        self.energy_snapshot = Some(energy);
        self
    }

    pub fn is_basic_attack(&self) -> bool {
        self.spell == CastSpell::BasicAttack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_ids_are_monotonic() {
        let mut ids = QueueIdGen::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);

        ids.observe(QueueId::new(41));
        assert_eq!(ids.next_id(), QueueId::new(42));

        // Observing an older id never rewinds the sequence
        ids.observe(QueueId::new(3));
        assert_eq!(ids.next_id(), QueueId::new(43));
    }

    #[test]
    fn test_basic_attack_carries_energy() {
        let cast = Cast::basic_attack(SpellSlot::Front, 5);
        assert!(cast.is_basic_attack());
        assert_eq!(cast.cost_override, Some(5));
        assert_eq!(cast.spell.to_string(), "basicAttack");
    }
}
