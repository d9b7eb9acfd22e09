//! Passive abilities: energy on damage, revive once, kill rewards and the
//! contract threshold mark

use crate::board::BoardSet;
use crate::core::{EffectName, PassiveKind, SlotRef, Trigger};
use crate::game::snapshot::LastAction;
use crate::game::state::RoundState;

/// Energy a tile must climb past to trigger a contract mark
pub const CONTRACT_THRESHOLD: i32 = 4;

impl<'a> RoundState<'a> {
    /// Energy-on-damage passives; only fires for damage above zero
    pub fn on_damage_taken(&mut self, target: SlotRef, dealt: i32) {
        if dealt <= 0 {
            return;
        }
        let grants: Vec<(String, i32)> = match self.boards.live(target) {
            Some(occupant) => occupant
                .passives
                .iter()
                .filter(|p| p.is_available())
                .filter_map(|p| match p.kind {
                    PassiveKind::EnergyOnDamage { amount } => Some((p.name.clone(), amount)),
                    _ => None,
                })
                .collect(),
            None => return,
        };

        for (passive, amount) in grants {
            log_if_verbose!(self, "{} ({}) will gain {} energy", target, passive, amount);
            self.queue_energy(target, amount);
        }
    }

    /// Single-use revive; returns true if it intercepted the death
    pub fn try_revive(&mut self, slot: SlotRef) -> bool {
        let Some(occupant) = self.boards.live_mut(slot) else {
            return false;
        };
        let Some(passive) = occupant
            .passives
            .iter_mut()
            .find(|p| matches!(p.kind, PassiveKind::ReviveOnce) && p.is_available())
        else {
            return false;
        };
        passive.consumed = true;
        let name = passive.name.clone();
        occupant.health = 1;

        log_if_verbose!(self, "{} is revived by {}", slot, name);
        self.emit(LastAction::Revived { target: slot });
        true
    }

    /// Kill reward passives on the killer, once per kill
    pub fn reward_kill(&mut self, killer: SlotRef, victim: SlotRef) {
        if killer.side() == victim.side() {
            return;
        }
        let rewards: Vec<(String, i32, i32)> = match self.boards.live(killer) {
            Some(occupant) => occupant
                .passives
                .iter()
                .filter_map(|p| match p.kind {
                    PassiveKind::KillReward { energy, heal } => {
                        Some((p.name.clone(), energy, heal))
                    }
                    _ => None,
                })
                .collect(),
            None => return,
        };

        for (passive, energy, heal) in rewards {
            log_if_verbose!(self, "{} ({}) rewarded for killing {}", killer, passive, victim);
            self.apply_heal(killer, heal);
            self.queue_energy(killer, energy);
            self.emit(LastAction::PassiveTriggered {
                owner: killer,
                passive,
            });
        }
    }

    /// Run the death check over every board; returns true if anyone died
    ///
    /// Revive is checked first. A real death queues the victim's on-death
    /// reactions before `mark_dead` clears its effects, then credits the
    /// last slot that damaged it.
    pub fn process_deaths(&mut self) -> bool {
        let mut any_died = false;

        for slot in BoardSet::all_slots() {
            let dying = self.boards.live(slot).is_some_and(|o| o.health <= 0);
            if !dying {
                continue;
            }
            let killer = self.last_hit.remove(&slot);
            if self.try_revive(slot) {
                continue;
            }

            self.queue_trigger(slot, Trigger::Death, killer, 0);
            if let Some(occupant) = self.boards.occupant_mut(slot) {
                occupant.mark_dead();
            }
            any_died = true;

            log_if_verbose!(self, "{} dies", slot);
            self.emit(LastAction::Death { target: slot });

            if let Some(killer) = killer {
                self.reward_kill(killer, slot);
            }
        }

        any_died
    }

    /// Apply queued reactions and deaths until nothing more happens
    pub fn settle(&mut self) {
        loop {
            self.flush_reactions();
            let died = self.process_deaths();
            if !died && self.reactions.is_empty() {
                break;
            }
        }
    }

    /// Mark tiles whose energy just climbed past the contract threshold
    ///
    /// `before` is the energy of each live main-board tile before the grant.
    /// A tile is marked once, and only while a live enemy holds the passive.
    pub fn contract_sweep(&mut self, before: &[(SlotRef, i32)]) {
        let crossed: Vec<SlotRef> = before
            .iter()
            .filter(|(slot, energy)| {
                *energy <= CONTRACT_THRESHOLD
                    && self
                        .boards
                        .live(*slot)
                        .is_some_and(|o| o.energy > CONTRACT_THRESHOLD)
            })
            .map(|(slot, _)| *slot)
            .collect();

        for slot in crossed {
            let Some((holder, passive, effect)) = self.contract_holder(slot) else {
                continue;
            };
            if self.boards.live(slot).is_some_and(|o| o.has_effect(effect.as_str())) {
                continue;
            }
            log_if_verbose!(self, "{} marks {} ({})", holder, slot, passive);
            if self.apply_effect(slot, &effect, Some(holder)) {
                self.emit(LastAction::PassiveTriggered {
                    owner: holder,
                    passive,
                });
            }
        }
    }

    fn contract_holder(&self, slot: SlotRef) -> Option<(SlotRef, String, EffectName)> {
        BoardSet::reading_slots(slot.side().opponent()).find_map(|enemy| {
            self.boards.live(enemy).and_then(|o| {
                o.passives.iter().find_map(|p| match &p.kind {
                    PassiveKind::AcceptContract { effect } => {
                        Some((enemy, p.name.clone(), effect.clone()))
                    }
                    _ => None,
                })
            })
        })
    }
}
