//! Cast collection and deterministic ordering
//!
//! `collect` gathers every pending cast on the two main boards; `order` sorts
//! them into the exact sequence the round resolves them in:
//!
//! 1. Higher snapshotted energy first.
//! 2. Within one energy value, the lowest reading position first.
//! 3. Two casters sharing that position (one per side) are split by the
//!    priority player, and priority passes to the other player.
//! 4. Several casts from one caster keep their queue order; priority stays.

use crate::board::{BoardSet, Occupant};
use crate::core::{Cast, CastSpell, PlayerToken, QueueId, QueueIdGen, SlotRef, SpellSlot};
use serde::{Deserialize, Serialize};

/// One pending cast, flattened for ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastEntry {
    pub caster: SlotRef,
    pub queue_id: QueueId,
    /// Position inside the caster's own queue
    pub queue_pos: usize,
    pub energy: i32,
    pub reading_pos: usize,
    pub spell: CastSpell,
    pub slot: SpellSlot,
    pub cost: i32,
}

/// Energy a cast will spend when it resolves
pub fn cast_cost(occupant: &Occupant, cast: &Cast) -> i32 {
    if let Some(cost) = cast.cost_override {
        return cost;
    }
    match cast.spell {
        CastSpell::BasicAttack => occupant.energy,
        CastSpell::Spell(_) => occupant
            .hero
            .spells
            .get(cast.slot)
            .map(|s| s.cost)
            .unwrap_or(0),
    }
}

/// Gather pending casts from both main boards
///
/// Casts without a queue id get one from `ids` (persisted on the cast).
/// Casts without an energy snapshot take the value of a per-slot cursor that
/// starts at the occupant's energy and drops by each queued cast's cost.
pub fn collect(boards: &mut BoardSet, ids: &mut QueueIdGen) -> Vec<CastEntry> {
    let mut entries = Vec::new();

    for slot in BoardSet::main_slots() {
        let Some(occupant) = boards.live_mut(slot) else {
            continue;
        };

        let mut cursor = occupant.energy;
        for cast in occupant.casts.iter_mut() {
            if cast.queue_id.is_none() {
                cast.queue_id = Some(ids.next_id());
            }
        }

        for (queue_pos, cast) in occupant.casts.iter().enumerate() {
            let cost = cast_cost(occupant, cast);
            let energy = cast.energy_snapshot.unwrap_or(cursor);
            cursor = if cast.is_basic_attack() {
                0
            } else {
                (cursor - cost).max(0)
            };

            entries.push(CastEntry {
                caster: slot,
                // Assigned just above
                queue_id: cast.queue_id.unwrap_or_else(|| QueueId::new(0)),
                queue_pos,
                energy,
                reading_pos: slot.reading_pos(),
                spell: cast.spell.clone(),
                slot: cast.slot,
                cost,
            });
        }
    }

    entries
}

/// Auto-cast one occupant standing on `slot`; returns the number of casts enqueued
///
/// Runs only when energy rose since the last evaluation on this slot, so
/// repeated passes without an energy change enqueue nothing. Spell casts for
/// the current row are queued while uncommitted energy and casts remaining
/// allow. Once the row's casts remaining is spent (or the row has no spell),
/// a single basic attack takes whatever uncommitted energy is left.
pub fn auto_cast_occupant(slot: SlotRef, occupant: &mut Occupant) -> usize {
    if !occupant.is_alive() || !slot.board.is_main() {
        return 0;
    }
    if occupant
        .last_autocast_energy
        .is_some_and(|last| occupant.energy <= last)
    {
        return 0;
    }

    let row = slot.row();
    let committed: i32 = occupant.casts.iter().map(|c| cast_cost(occupant, c)).sum();
    let committed_casts = occupant
        .casts
        .iter()
        .filter(|c| !c.is_basic_attack() && c.slot == row)
        .count() as u32;
    let mut available = occupant.energy - committed;
    let mut enqueued = 0;

    let remaining = occupant.casts_remaining.get(row);
    if let Some(spell) = occupant.hero.spells.get(row).cloned() {
        let mut casts_left = remaining.saturating_sub(committed_casts);
        while casts_left > 0 && available >= spell.cost {
            occupant
                .casts
                .push(Cast::spell(spell.spell.clone(), row).with_snapshot(available));
            available -= spell.cost.max(0);
            casts_left -= 1;
            enqueued += 1;
        }
    }

    let exhausted = occupant.hero.spells.get(row).is_none() || remaining == 0;
    let attack_queued = occupant.casts.iter().any(Cast::is_basic_attack);
    if exhausted && !attack_queued && available > 0 {
        occupant
            .casts
            .push(Cast::basic_attack(row, available).with_snapshot(available));
        enqueued += 1;
    }

    occupant.last_autocast_energy = Some(occupant.energy);
    enqueued
}

/// AutoCast over both main boards; reserves never auto-cast
pub fn auto_cast(boards: &mut BoardSet) -> usize {
    let mut enqueued = 0;
    for slot in BoardSet::main_slots() {
        if let Some(occupant) = boards.live_mut(slot) {
            enqueued += auto_cast_occupant(slot, occupant);
        }
    }
    enqueued
}

/// Pick the next cast to resolve; returns its index and the new priority
pub fn select_next(entries: &[CastEntry], priority: PlayerToken) -> Option<(usize, PlayerToken)> {
    let top_energy = entries.iter().map(|e| e.energy).max()?;
    let min_pos = entries
        .iter()
        .filter(|e| e.energy == top_energy)
        .map(|e| e.reading_pos)
        .min()?;

    let candidates: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.energy == top_energy && e.reading_pos == min_pos)
        .map(|(i, _)| i)
        .collect();

    let first_caster = entries[candidates[0]].caster;
    let earliest = |pool: &mut dyn Iterator<Item = usize>| {
        pool.min_by_key(|&i| (entries[i].queue_pos, entries[i].queue_id))
    };

    if candidates.iter().all(|&i| entries[i].caster == first_caster) {
        let pick = earliest(&mut candidates.iter().copied())?;
        return Some((pick, priority));
    }

    let favored = priority.side();
    let mut from_priority = candidates
        .iter()
        .copied()
        .filter(|&i| entries[i].caster.side() == favored);
    match earliest(&mut from_priority) {
        Some(pick) => Some((pick, priority.other())),
        None => Some((earliest(&mut candidates.iter().copied())?, priority)),
    }
}

/// Full resolution order for a set of entries
pub fn order(
    mut entries: Vec<CastEntry>,
    mut priority: PlayerToken,
) -> (Vec<CastEntry>, PlayerToken) {
    let mut ordered = Vec::with_capacity(entries.len());
    while let Some((index, next_priority)) = select_next(&entries, priority) {
        ordered.push(entries.remove(index));
        priority = next_priority;
    }
    (ordered, priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Hero, Side, SlotSpell};

    fn caster_hero(cost: i32) -> Hero {
        Hero::new("mage", 10, 3)
            .with_spell(SpellSlot::Front, SlotSpell::new("bolt", cost, 3))
            .with_spell(SpellSlot::Back, SlotSpell::new("bolt", cost, 3))
    }

    fn entry(side: Side, index: usize, energy: i32, id: u64) -> CastEntry {
        let caster = SlotRef::main(side, index);
        CastEntry {
            caster,
            queue_id: QueueId::new(id),
            queue_pos: 0,
            energy,
            reading_pos: caster.reading_pos(),
            spell: CastSpell::Spell("bolt".into()),
            slot: SpellSlot::Front,
            cost: 1,
        }
    }

    #[test]
    fn test_collect_assigns_ids_and_cursor_snapshots() {
        let mut boards = BoardSet::new();
        boards.p1.place(0, caster_hero(2));
        let slot = SlotRef::main(Side::P1, 0);
        {
            let occupant = boards.occupant_mut(slot).unwrap();
            occupant.ensure_runtime();
            occupant.energy = 5;
            occupant.casts.push(Cast::spell("bolt", SpellSlot::Front));
            occupant.casts.push(Cast::spell("bolt", SpellSlot::Front));
            occupant.casts.push(Cast::basic_attack(SpellSlot::Front, 1));
        }

        let mut ids = QueueIdGen::new();
        let entries = collect(&mut boards, &mut ids);
        let energies: Vec<i32> = entries.iter().map(|e| e.energy).collect();
        assert_eq!(energies, vec![5, 3, 1]);

        let persisted: Vec<_> = boards
            .occupant(slot)
            .unwrap()
            .casts
            .iter()
            .map(|c| c.queue_id)
            .collect();
        assert!(persisted.iter().all(Option::is_some));

        // A second pass reuses the persisted ids
        let again = collect(&mut boards, &mut ids);
        assert_eq!(
            entries.iter().map(|e| e.queue_id).collect::<Vec<_>>(),
            again.iter().map(|e| e.queue_id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_collect_skips_dead_and_reserve() {
        let mut boards = BoardSet::new();
        boards.p1.place(0, caster_hero(1));
        boards.p1_reserve.place(0, caster_hero(1));
        for slot in [SlotRef::main(Side::P1, 0), SlotRef::reserve(Side::P1, 0)] {
            let occupant = boards.occupant_mut(slot).unwrap();
            occupant.ensure_runtime();
            occupant.casts.push(Cast::spell("bolt", SpellSlot::Front));
        }
        let mut ids = QueueIdGen::new();
        assert_eq!(collect(&mut boards, &mut ids).len(), 1);

        boards
            .occupant_mut(SlotRef::main(Side::P1, 0))
            .unwrap()
            .mark_dead();
        assert!(collect(&mut boards, &mut ids).is_empty());
    }

    #[test]
    fn test_higher_energy_first_then_reading_order() {
        let entries = vec![
            entry(Side::P1, 4, 3, 0),
            entry(Side::P2, 8, 3, 1),
            entry(Side::P1, 8, 6, 2),
        ];
        let (ordered, priority) = order(entries, PlayerToken::Player1);
        let ids: Vec<u64> = ordered.iter().map(|e| e.queue_id.as_u64()).collect();
        // p2-8 is P2's reading position 0, ahead of p1-4 at position 4
        assert_eq!(ids, vec![2, 1, 0]);
        assert_eq!(priority, PlayerToken::Player1);
    }

    #[test]
    fn test_cross_caster_tie_uses_and_flips_priority() {
        // p1-0 and p2-8 are both reading position 0
        let tie = vec![entry(Side::P1, 0, 3, 0), entry(Side::P2, 8, 3, 1)];

        let (ordered, priority) = order(tie.clone(), PlayerToken::Player1);
        assert_eq!(ordered[0].caster.side(), Side::P1);
        assert_eq!(priority, PlayerToken::Player2);

        let (ordered, priority) = order(tie, PlayerToken::Player2);
        assert_eq!(ordered[0].caster.side(), Side::P2);
        assert_eq!(priority, PlayerToken::Player1);
    }

    #[test]
    fn test_same_caster_tie_keeps_priority() {
        let mut a = entry(Side::P1, 0, 3, 7);
        let mut b = entry(Side::P1, 0, 3, 4);
        a.queue_pos = 0;
        b.queue_pos = 1;
        let (ordered, priority) = order(vec![b, a], PlayerToken::Player2);
        assert_eq!(ordered[0].queue_id.as_u64(), 7);
        assert_eq!(priority, PlayerToken::Player2);
    }

    #[test]
    fn test_order_is_deterministic() {
        let entries = vec![
            entry(Side::P1, 0, 3, 0),
            entry(Side::P2, 8, 3, 1),
            entry(Side::P1, 1, 3, 2),
            entry(Side::P2, 7, 3, 3),
            entry(Side::P2, 2, 5, 4),
        ];
        let first = order(entries.clone(), PlayerToken::Player1);
        let second = order(entries, PlayerToken::Player1);
        assert_eq!(first, second);
        // Two ties consumed: priority flips twice
        assert_eq!(first.1, PlayerToken::Player1);
    }

    #[test]
    fn test_select_next_only_flips_for_the_head() {
        let entries = vec![
            entry(Side::P1, 4, 9, 0),
            entry(Side::P1, 0, 3, 1),
            entry(Side::P2, 8, 3, 2),
        ];
        let (index, priority) = select_next(&entries, PlayerToken::Player1).unwrap();
        assert_eq!(index, 0);
        assert_eq!(priority, PlayerToken::Player1);
    }

    #[test]
    fn test_auto_cast_is_idempotent() {
        let mut boards = BoardSet::new();
        boards.p1.place(0, caster_hero(3));
        let slot = SlotRef::main(Side::P1, 0);
        {
            let occupant = boards.occupant_mut(slot).unwrap();
            occupant.ensure_runtime();
            occupant.energy = 7;
        }

        // Cost 3 with 3 casts: two fit into 7 energy
        assert_eq!(auto_cast(&mut boards), 2);
        assert_eq!(auto_cast(&mut boards), 0);

        let casts = &boards.occupant(slot).unwrap().casts;
        assert_eq!(casts.len(), 2);
        assert_eq!(casts[0].energy_snapshot, Some(7));
        assert_eq!(casts[1].energy_snapshot, Some(4));
    }

    #[test]
    fn test_basic_attack_only_after_casts_run_out() {
        let mut boards = BoardSet::new();
        boards.p1.place(0, caster_hero(3));
        let slot = SlotRef::main(Side::P1, 0);
        {
            let occupant = boards.occupant_mut(slot).unwrap();
            occupant.ensure_runtime();
            occupant.energy = 2;
        }
        // Not enough for the spell, casts remain: nothing queued
        assert_eq!(auto_cast(&mut boards), 0);

        {
            let occupant = boards.occupant_mut(slot).unwrap();
            occupant.casts_remaining.front = 0;
            occupant.energy = 4;
        }
        assert_eq!(auto_cast(&mut boards), 1);
        let casts = &boards.occupant(slot).unwrap().casts;
        assert!(casts[0].is_basic_attack());
        assert_eq!(casts[0].cost_override, Some(4));
    }

    #[test]
    fn test_reserve_never_auto_casts() {
        let mut boards = BoardSet::new();
        boards.p1_reserve.place(0, caster_hero(1));
        let occupant = boards.occupant_mut(SlotRef::reserve(Side::P1, 0)).unwrap();
        occupant.ensure_runtime();
        occupant.energy = 5;
        assert_eq!(auto_cast(&mut boards), 0);
    }
}
