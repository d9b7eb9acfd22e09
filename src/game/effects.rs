//! Damage, healing, effects, pulses, reactions and post-effects
//!
//! Every helper here is best-effort: a stale slot, a dead target or a missing
//! effect template turns the operation into a no-op (logged) instead of an
//! error. The exception is a corpse named explicitly by its descriptor, which
//! still runs its per-target post-effects.

use crate::board::BoardSet;
use crate::core::{
    EffectKind, EffectName, EnergyRecipient, PostEffect, PulseKind, ReactionAction, Row, Side,
    SlotRef, SpellId, Trigger,
};
use crate::core::position::index_at;
use crate::game::payload::{build_spell_payload, PayloadAction, RuntimeSpellPayload};
use crate::game::snapshot::LastAction;
use crate::game::state::{DamageCause, PendingReaction, ReactionKey, RoundState};
use crate::game::stats::recompute_stats;
use crate::game::targeting::live_allies;
use rand::Rng;

/// What resolving a payload did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastOutcome {
    /// Targets that were actually affected
    pub hit: Vec<SlotRef>,
    pub damage_dealt: i32,
    pub healing_done: i32,
    /// Some target was damaged to 0 health or below
    pub lethal: bool,
}

impl<'a> RoundState<'a> {
    /// Deal damage to a live occupant; returns the damage actually dealt
    ///
    /// Spell damage is reduced by the target's armor. Any damage above zero
    /// feeds the energy-on-damage passive and, unless it came from a reaction,
    /// queues the target's on-damaged reactions.
    pub fn apply_damage(
        &mut self,
        target: SlotRef,
        amount: i32,
        attacker: Option<SlotRef>,
        cause: DamageCause,
    ) -> i32 {
        let Some(occupant) = self.boards.live_mut(target) else {
            return 0;
        };

        let dealt = if cause.uses_armor() {
            (amount - occupant.armor).max(0)
        } else {
            amount.max(0)
        };
        if dealt == 0 {
            return 0;
        }
        occupant.health -= dealt;
        let remaining = occupant.health;

        log_if_verbose!(self, verbose: "{} takes {} damage ({} health left)", target, dealt, remaining);

        if let Some(attacker) = attacker.filter(|a| *a != target) {
            self.last_hit.insert(target, attacker);
        }

        self.on_damage_taken(target, dealt);

        if cause.triggers_reactions() {
            self.queue_trigger(target, Trigger::Damaged, attacker, dealt);
        }

        dealt
    }

    /// Heal a live occupant up to its cap; returns the amount healed
    pub fn apply_heal(&mut self, target: SlotRef, amount: i32) -> i32 {
        let Some(occupant) = self.boards.live_mut(target) else {
            return 0;
        };
        if amount <= 0 {
            return 0;
        }
        let before = occupant.health;
        occupant.health += amount;
        occupant.clamp_health();
        let healed = (occupant.health - before).max(0);
        if healed > 0 {
            log_if_verbose!(self, verbose: "{} heals {}", target, healed);
        }
        healed
    }

    /// Put an effect from content on a live occupant
    pub fn apply_effect(
        &mut self,
        target: SlotRef,
        name: &EffectName,
        source: Option<SlotRef>,
    ) -> bool {
        let Some(template) = self.content.effect(name) else {
            log_if_verbose!(self, "unknown effect '{}' ignored", name);
            return false;
        };
        let effect = template.instantiate(source);
        let Some(occupant) = self.boards.live_mut(target) else {
            return false;
        };
        occupant.effects.push(effect);
        recompute_stats(occupant);

        log_if_verbose!(self, verbose: "{} gains {}", target, name);
        self.emit(LastAction::EffectApplied {
            target,
            effect: name.clone(),
        });
        true
    }

    /// Queue energy for a live main-board occupant; applied by the orchestrator
    pub fn queue_energy(&mut self, target: SlotRef, amount: i32) {
        if amount > 0 && target.board.is_main() && self.boards.live(target).is_some() {
            self.pending_energy.push((target, amount));
        }
    }

    pub fn take_pending_energy(&mut self) -> Vec<(SlotRef, i32)> {
        std::mem::take(&mut self.pending_energy)
    }

    /// Add energy right away; reserves never gain energy
    pub fn grant_energy(&mut self, target: SlotRef, amount: i32) {
        if !target.board.is_main() || amount <= 0 {
            return;
        }
        if let Some(occupant) = self.boards.live_mut(target) {
            occupant.energy += amount;
            self.emit(LastAction::EnergyGranted { target, amount });
        }
    }

    /// StartEffects: fire every pulse on the main boards once
    ///
    /// Returns true if any pulse fired.
    pub fn apply_pulses(&mut self) -> bool {
        let mut fired = false;

        for slot in BoardSet::main_slots() {
            let pulses: Vec<_> = match self.boards.live(slot) {
                Some(occupant) => occupant
                    .effects
                    .iter()
                    .filter_map(|e| {
                        e.pulse.map(|p| {
                            (e.name.clone(), p, e.source, p.amount.evaluate(occupant.armor, self.round))
                        })
                    })
                    .collect(),
                None => continue,
            };

            for (effect, pulse, source, amount) in pulses {
                if self.boards.live(slot).is_none() {
                    break;
                }
                let applied = match pulse.kind {
                    PulseKind::Damage => {
                        self.apply_damage(slot, amount, source, DamageCause::Pulse)
                    }
                    PulseKind::Heal => self.apply_heal(slot, amount),
                };
                fired = true;
                log_if_verbose!(self, "{} pulses {:?} {} on {}", effect, pulse.kind, applied, slot);
                self.emit(LastAction::Pulse {
                    target: slot,
                    effect,
                    kind: pulse.kind,
                    amount: applied,
                });
            }
        }

        fired
    }

    /// Queue on-round-start reactions of every live main-board occupant
    pub fn queue_round_start_triggers(&mut self) {
        for slot in BoardSet::main_slots() {
            if self.boards.live(slot).is_some() {
                self.queue_trigger(slot, Trigger::RoundStart, None, 0);
            }
        }
    }

    /// Queue `owner`'s reactions to `trigger`, deduplicated per batch
    pub fn queue_trigger(
        &mut self,
        owner: SlotRef,
        trigger: Trigger,
        attacker: Option<SlotRef>,
        damage: i32,
    ) {
        let Some(occupant) = self.boards.occupant(owner) else {
            return;
        };
        let fired: Vec<_> = occupant
            .effects
            .iter()
            .flat_map(|e| e.reactions_for(trigger).map(move |a| (e.name.clone(), a.clone())))
            .collect();

        for (effect, action) in fired {
            let key = ReactionKey {
                trigger,
                effect,
                attacker,
                owner,
            };
            if self.reaction_batch.insert(key.clone()) {
                self.reactions.push_back(PendingReaction {
                    key,
                    action,
                    damage,
                });
            }
        }
    }

    /// Apply queued reactions in order
    pub fn flush_reactions(&mut self) {
        while let Some(reaction) = self.reactions.pop_front() {
            self.apply_reaction(reaction);
        }
    }

    fn apply_reaction(&mut self, reaction: PendingReaction) {
        let PendingReaction {
            key,
            action,
            damage,
        } = reaction;
        let owner = key.owner;

        log_if_verbose!(self, verbose: "{} reacts ({:?} from {})", owner, key.trigger, key.effect);

        match action {
            ReactionAction::HealAllies(amount) => {
                for ally in live_allies(&self.boards, owner.side()) {
                    self.apply_heal(ally, amount);
                }
            }
            ReactionAction::ReflectDamage => {
                if let Some(attacker) = key.attacker {
                    self.apply_damage(attacker, damage, Some(owner), DamageCause::Reaction);
                }
            }
            ReactionAction::DamageAttacker(amount) => {
                if let Some(attacker) = key.attacker {
                    self.apply_damage(attacker, amount, Some(owner), DamageCause::Reaction);
                }
            }
            ReactionAction::GrantEnergy(amount) => self.queue_energy(owner, amount),
            ReactionAction::CastSpell(spell) => {
                // Round-start casts are real casts; anything else is a reaction
                let cause = if key.trigger == Trigger::RoundStart {
                    DamageCause::Spell
                } else {
                    DamageCause::Reaction
                };
                if self.boards.live(owner).is_some() {
                    self.scripted_cast(owner, &spell, cause, false);
                }
            }
            ReactionAction::ApplyEffectToAttacker(effect) => {
                if let Some(attacker) = key.attacker {
                    self.apply_effect(attacker, &effect, Some(owner));
                }
            }
        }
    }

    /// Resolve a spell with no cost and no casts-remaining change
    pub fn scripted_cast(
        &mut self,
        caster: SlotRef,
        spell: &SpellId,
        cause: DamageCause,
        allow_follow_up: bool,
    ) -> CastOutcome {
        let payload = build_spell_payload(spell, caster, &self.boards, &self.payload_context());
        if payload.is_noop() {
            log_if_verbose!(self, "{} casts {} (no effect)", caster, spell);
            return CastOutcome::default();
        }
        log_if_verbose!(self, "{} casts {}", caster, spell);
        self.resolve_payload(&payload, cause, allow_follow_up)
    }

    /// Apply a payload: per-target actions, effect grants, then post-effects
    pub fn resolve_payload(
        &mut self,
        payload: &RuntimeSpellPayload,
        cause: DamageCause,
        allow_follow_up: bool,
    ) -> CastOutcome {
        let base = self.moves.len();
        let mut outcome = CastOutcome::default();

        for entry in &payload.entries {
            let target = self.follow_from(base, entry.target);
            let caster = self.follow_from(base, payload.caster);
            let live = self.boards.live(target).is_some();
            let corpse =
                !live && entry.allow_dead && self.boards.occupant(target).is_some_and(|o| o.dead);
            if !live && !corpse {
                continue;
            }
            // A corpse only takes the entry's post-effects
            if live {
                match entry.action {
                    PayloadAction::Damage => {
                        outcome.damage_dealt +=
                            self.apply_damage(target, entry.magnitude, Some(caster), cause);
                        if self.boards.live(target).is_some_and(|o| o.health <= 0) {
                            outcome.lethal = true;
                        }
                    }
                    PayloadAction::Heal => {
                        outcome.healing_done += self.apply_heal(target, entry.magnitude);
                    }
                    PayloadAction::None => {}
                }
                for effect in &entry.effects {
                    self.apply_effect(target, effect, Some(caster));
                }
            }
            outcome.hit.push(target);

            for post in &entry.post {
                let target = self.follow_from(base, entry.target);
                let caster = self.follow_from(base, payload.caster);
                self.apply_post(post, caster, &[target], &mut outcome, allow_follow_up);
            }
        }

        for post in &payload.post {
            let caster = self.follow_from(base, payload.caster);
            let targets: Vec<SlotRef> = payload
                .targets
                .iter()
                .map(|t| self.follow_from(base, *t))
                .collect();
            self.apply_post(post, caster, &targets, &mut outcome, allow_follow_up);
        }

        outcome
    }

    /// The single post-effect dispatcher
    pub fn apply_post(
        &mut self,
        post: &PostEffect,
        caster: SlotRef,
        targets: &[SlotRef],
        outcome: &mut CastOutcome,
        allow_follow_up: bool,
    ) {
        match post {
            PostEffect::SelfDamage(amount) => {
                self.apply_damage(caster, *amount, None, DamageCause::SelfInflicted);
            }
            PostEffect::Scrub {
                kind,
                count,
                heal_per_removed,
            } => {
                for &target in targets {
                    let removed = self.scrub(target, *kind, *count);
                    if removed > 0 && *heal_per_removed > 0 {
                        outcome.healing_done +=
                            self.apply_heal(target, heal_per_removed * removed as i32);
                    }
                }
            }
            PostEffect::MoveRowBack => {
                let base = self.moves.len();
                for &target in targets {
                    let target = self.follow_from(base, target);
                    self.push_back(target);
                }
            }
            PostEffect::MoveAllBack => {
                let mut sides: Vec<Side> = targets.iter().map(|t| t.side()).collect();
                sides.sort();
                sides.dedup();
                for side in sides {
                    self.push_all_back(side);
                }
            }
            PostEffect::ReduceRowCasts(amount) => {
                for &target in targets {
                    if let Some(occupant) = self.boards.live_mut(target) {
                        let counter = occupant.casts_remaining.get_mut(target.row());
                        *counter = counter.saturating_sub(*amount);
                    }
                }
            }
            PostEffect::ConditionalSecondary { spell } => {
                if outcome.lethal && allow_follow_up && self.boards.live(caster).is_some() {
                    log_if_verbose!(self, "{} follows up with {}", caster, spell);
                    self.scripted_cast(caster, spell, DamageCause::Spell, false);
                }
            }
            PostEffect::ApplyEffectWithChance { effect, percent } => {
                let chance = (*percent).min(100);
                for &target in targets {
                    let roll: u8 = self.rng.gen_range(0..100);
                    if roll < chance {
                        self.apply_effect(target, effect, Some(caster));
                    }
                }
            }
            PostEffect::GrantEnergy { amount, to } => match to {
                EnergyRecipient::Caster => self.queue_energy(caster, *amount),
                EnergyRecipient::Targets => {
                    for &target in targets {
                        self.queue_energy(target, *amount);
                    }
                }
            },
            PostEffect::ConsumeCorpse => {
                for &target in targets {
                    self.consume_corpse(target);
                }
            }
        }
    }

    /// Take a dead occupant off its tile; live occupants are left alone
    pub fn consume_corpse(&mut self, target: SlotRef) -> bool {
        let Some(tile) = self.boards.tile_mut(target) else {
            return false;
        };
        if !tile.occupant.as_ref().is_some_and(|o| o.dead) {
            return false;
        }
        tile.occupant = None;
        self.last_hit.remove(&target);

        log_if_verbose!(self, "corpse on {} is consumed", target);
        self.emit(LastAction::CorpseConsumed { target });
        true
    }

    /// Remove effects of one kind, newest first; returns how many went
    pub fn scrub(&mut self, target: SlotRef, kind: EffectKind, count: Option<usize>) -> usize {
        let Some(occupant) = self.boards.live_mut(target) else {
            return 0;
        };
        let limit = count.unwrap_or(usize::MAX);
        let mut removed = 0;
        let mut i = occupant.effects.len();
        while i > 0 && removed < limit {
            i -= 1;
            if occupant.effects[i].kind == kind {
                occupant.effects.remove(i);
                removed += 1;
            }
        }
        if removed > 0 {
            recompute_stats(occupant);
            log_if_verbose!(self, verbose: "{} loses {} {:?} effect(s)", target, removed, kind);
        }
        removed
    }

    /// Push an occupant one row back in its lane
    ///
    /// If the tile behind is taken, the occupants between it and the first
    /// free tile further back shift back one; with no free tile the pushed
    /// occupant trades places with the blocker. Back-row occupants stay put.
    pub fn push_back(&mut self, slot: SlotRef) -> SlotRef {
        if !slot.board.is_main() || self.boards.live(slot).is_none() {
            return slot;
        }
        let side = slot.side();
        let lane = slot.lane();
        let rank = slot.row().rank();
        if rank >= 2 {
            return slot;
        }

        let at = |rank: usize| -> Option<SlotRef> {
            Row::from_rank(rank).map(|row| SlotRef::main(side, index_at(side, row, lane)))
        };
        let Some(dest) = at(rank + 1) else {
            return slot;
        };

        let free = (rank + 1..3)
            .filter_map(at)
            .find(|s| self.boards.live(*s).is_none());

        match free {
            Some(free) => {
                // Bubble the free tile forward until it reaches the pushed slot
                let mut hole = free;
                for r in (rank..free.row().rank()).rev() {
                    if let Some(ahead) = at(r) {
                        self.swap_tiles(ahead, hole);
                        hole = ahead;
                    }
                }
            }
            None => self.swap_tiles(slot, dest),
        }

        log_if_verbose!(self, "{} is pushed back to {}", slot, dest);
        dest
    }

    /// Move every live occupant on a main board one row back
    ///
    /// Only steps into a free tile: a full lane stays as it is, and the
    /// back row never moves. Middle goes before front so a lane of two
    /// shifts together.
    pub fn push_all_back(&mut self, side: Side) {
        for lane in 0..3 {
            for row in [Row::Middle, Row::Front] {
                let Some(behind) = row.behind() else {
                    continue;
                };
                let slot = SlotRef::main(side, index_at(side, row, lane));
                let dest = SlotRef::main(side, index_at(side, behind, lane));
                if self.boards.live(slot).is_some() && self.boards.live(dest).is_none() {
                    self.swap_tiles(slot, dest);
                    log_if_verbose!(self, "{} is pushed back to {}", slot, dest);
                }
            }
        }
    }

    fn swap_tiles(&mut self, a: SlotRef, b: SlotRef) {
        if a == b {
            return;
        }
        self.boards.swap(a, b);
        self.moves.push((a, b));

        // Kill attribution follows both the victim and the attacker
        let swapped = |s: SlotRef| {
            if s == a {
                b
            } else if s == b {
                a
            } else {
                s
            }
        };
        self.last_hit = std::mem::take(&mut self.last_hit)
            .into_iter()
            .map(|(victim, attacker)| (swapped(victim), swapped(attacker)))
            .collect();

        self.emit(LastAction::Moved { from: a, to: b });
    }

    /// EffectDecay: tick main-board durations, drop expired, recompute
    pub fn decay_effects(&mut self) {
        for slot in BoardSet::main_slots() {
            let Some(occupant) = self.boards.live_mut(slot) else {
                continue;
            };
            let before = occupant.effects.len();
            occupant.effects.retain_mut(|e| !e.tick());
            let expired = before - occupant.effects.len();
            recompute_stats(occupant);
            if expired > 0 {
                log_if_verbose!(self, verbose: "{} effect(s) expire on {}", expired, slot);
            }
        }
        self.emit(LastAction::EffectsDecayed);
    }
}
