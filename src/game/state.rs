//! Mutable state of one round in progress
//!
//! `RoundState` owns the board clones for the round and everything the
//! effect, passive and cast machinery needs while they mutate them: the
//! seeded RNG, pending energy grants, the reaction batch and kill
//! attribution. The async orchestrator in `round` drives it; everything in
//! here is synchronous.

use crate::board::BoardSet;
use crate::core::{EffectName, PlayerToken, QueueIdGen, ReactionAction, SlotRef, Trigger};
use crate::game::logger::RoundLogger;
use crate::game::payload::{CastRecord, PayloadContext};
use crate::game::round::RoundPhase;
use crate::game::snapshot::{LastAction, RoundStep, StepCallback};
use crate::game::stats::recompute_stats;
use crate::loader::ContentSource;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Where damage comes from; decides armor and reaction handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Spell,
    Pulse,
    SelfInflicted,
    /// Damage dealt by a reaction never triggers further on-damaged reactions
    Reaction,
}

impl DamageCause {
    pub fn uses_armor(self) -> bool {
        self == DamageCause::Spell
    }

    pub fn triggers_reactions(self) -> bool {
        self != DamageCause::Reaction
    }
}

/// Dedup key for reactions within one batch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    pub trigger: Trigger,
    pub effect: EffectName,
    pub attacker: Option<SlotRef>,
    pub owner: SlotRef,
}

#[derive(Debug, Clone)]
pub struct PendingReaction {
    pub key: ReactionKey,
    pub action: ReactionAction,
    /// Damage that fired the reaction, for reflect
    pub damage: i32,
}

pub struct RoundState<'a> {
    pub boards: BoardSet,
    pub round: u32,
    pub priority: PlayerToken,
    pub phase: RoundPhase,
    /// Last cast resolved this round
    pub last_cast: Option<CastRecord>,
    pub logger: RoundLogger,
    pub(crate) content: &'a dyn ContentSource,
    pub(crate) ids: &'a mut QueueIdGen,
    pub(crate) rng: ChaCha12Rng,
    steps: Option<&'a mut StepCallback>,
    step_count: usize,
    pub(crate) pending_energy: Vec<(SlotRef, i32)>,
    pub(crate) reactions: VecDeque<PendingReaction>,
    pub(crate) reaction_batch: FxHashSet<ReactionKey>,
    /// Victim to the last slot that damaged it
    pub(crate) last_hit: FxHashMap<SlotRef, SlotRef>,
    /// Forced moves during the current batch, in order
    pub(crate) moves: Vec<(SlotRef, SlotRef)>,
}

impl<'a> RoundState<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        boards: BoardSet,
        content: &'a dyn ContentSource,
        ids: &'a mut QueueIdGen,
        logger: RoundLogger,
        steps: Option<&'a mut StepCallback>,
        round: u32,
        priority: PlayerToken,
        seed: u64,
    ) -> Self {
        RoundState {
            boards,
            round,
            priority,
            phase: RoundPhase::Init,
            last_cast: None,
            logger,
            content,
            ids,
            rng: ChaCha12Rng::seed_from_u64(seed),
            steps,
            step_count: 0,
            pending_energy: Vec::new(),
            reactions: VecDeque::new(),
            reaction_batch: FxHashSet::default(),
            last_hit: FxHashMap::default(),
            moves: Vec::new(),
        }
    }

    /// Init: runtime fields on every slot, stale per-round flags cleared
    pub fn init(&mut self) {
        if let Some(max) = self.boards.max_queue_id() {
            self.ids.observe(max);
        }
        for slot in BoardSet::all_slots() {
            if let Some(occupant) = self.boards.occupant_mut(slot) {
                occupant.ensure_runtime();
                occupant.last_autocast_energy = None;
                if occupant.is_alive() {
                    recompute_stats(occupant);
                }
            }
        }
        self.last_cast = None;
        self.last_hit.clear();
        self.pending_energy.clear();
        self.reactions.clear();
        self.reaction_batch.clear();
        self.moves.clear();
    }

    pub fn enter(&mut self, phase: RoundPhase) {
        self.phase = phase;
        log_if_verbose!(self, verbose: "-- {:?} --", phase);
    }

    /// Send a deep copy of the boards to the step callback
    pub fn emit(&mut self, last_action: LastAction) {
        self.step_count += 1;
        if let Some(callback) = self.steps.as_deref_mut() {
            callback(RoundStep {
                boards: self.boards.deep_copy(),
                priority: self.priority,
                last_action,
            });
        }
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Start a new pulse or cast batch for reaction dedup and move tracking
    pub fn begin_batch(&mut self) {
        self.reaction_batch.clear();
        self.moves.clear();
    }

    /// Where an occupant that stood on `slot` at batch start stands now
    pub fn follow(&self, slot: SlotRef) -> SlotRef {
        self.follow_from(0, slot)
    }

    /// Same as `follow`, counting only moves recorded from index `base` on
    pub fn follow_from(&self, base: usize, slot: SlotRef) -> SlotRef {
        self.moves.iter().skip(base).fold(slot, |at, &(from, to)| {
            if at == from {
                to
            } else if at == to {
                from
            } else {
                at
            }
        })
    }

    pub fn payload_context(&self) -> PayloadContext<'_> {
        PayloadContext {
            content: self.content,
            last_cast: self.last_cast.as_ref(),
        }
    }

    /// Energy of every live main-board occupant
    pub fn energy_snapshot(&self) -> Vec<(SlotRef, i32)> {
        self.boards
            .live_main_slots()
            .into_iter()
            .filter_map(|s| self.boards.live(s).map(|o| (s, o.energy)))
            .collect()
    }

    /// Drop every queued cast on both main boards
    pub fn discard_casts(&mut self) {
        for slot in BoardSet::main_slots() {
            if let Some(occupant) = self.boards.occupant_mut(slot) {
                occupant.casts.clear();
            }
        }
    }

    pub fn log_minimal(&self, message: &str) {
        self.logger.minimal(message);
    }

    pub fn log_normal(&self, message: &str) {
        self.logger.normal(message);
    }

    pub fn log_verbose(&self, message: &str) {
        self.logger.verbose(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cast, Hero, QueueId, Side, SpellSlot};
    use crate::loader::ContentDatabase;

    #[test]
    fn test_init_seeds_queue_ids_past_existing() {
        let db = ContentDatabase::new();
        let mut ids = QueueIdGen::new();
        let mut boards = BoardSet::new();
        boards.p1.place(0, Hero::new("squire", 5, 1));
        let mut cast = Cast::spell("jab", SpellSlot::Front);
        cast.queue_id = Some(QueueId::new(9));
        boards
            .occupant_mut(SlotRef::main(Side::P1, 0))
            .unwrap()
            .casts
            .push(cast);

        let mut state = RoundState::new(
            boards,
            &db,
            &mut ids,
            RoundLogger::silent(),
            None,
            1,
            PlayerToken::Player1,
            0,
        );
        state.init();
        assert_eq!(state.ids.next_id(), QueueId::new(10));
        assert!(state.boards.occupant(SlotRef::main(Side::P1, 0)).unwrap().initialized);
    }

    #[test]
    fn test_follow_tracks_swaps() {
        let db = ContentDatabase::new();
        let mut ids = QueueIdGen::new();
        let mut state = RoundState::new(
            BoardSet::new(),
            &db,
            &mut ids,
            RoundLogger::silent(),
            None,
            1,
            PlayerToken::Player1,
            0,
        );
        let a = SlotRef::main(Side::P1, 1);
        let b = SlotRef::main(Side::P1, 4);
        state.moves.push((a, b));
        assert_eq!(state.follow(a), b);
        assert_eq!(state.follow(b), a);
        assert_eq!(state.follow(SlotRef::main(Side::P1, 0)), SlotRef::main(Side::P1, 0));
    }
}
