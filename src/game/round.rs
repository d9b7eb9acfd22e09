//! Round orchestrator
//!
//! Sequences one combat round as a fixed state machine:
//!
//! Init → StartEffects → EnergyGain → PassiveSweep → AutoCast →
//! CastResolutionLoop → EffectDecay → Done
//!
//! The round is a single async sequence. The only suspension points are the
//! configured pacing delays, which exist so a renderer can animate the last
//! emitted step; with the default (zero) delays the round never yields.

use crate::board::BoardSet;
use crate::core::{CastSpell, PlayerToken, QueueId, QueueIdGen, SlotRef, Trigger, Winner};
use crate::game::cast_queue::{self, CastEntry};
use crate::game::logger::{LogEntry, LogSink, OutputMode, RoundLogger, VerbosityLevel};
use crate::game::payload::{build_payload, CastRecord};
use crate::game::snapshot::{LastAction, StepCallback};
use crate::game::state::{DamageCause, RoundState};
use crate::loader::ContentSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on resolved casts per round
pub const DEFAULT_MAX_CASTS_PER_ROUND: usize = 256;

/// Round state machine phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Init,
    StartEffects,
    EnergyGain,
    PassiveSweep,
    AutoCast,
    CastResolutionLoop,
    EffectDecay,
    Done,
}

/// Pacing, step callback and logging for a round engine
pub struct RoundOptions {
    /// Pause after each cast before the next one is picked
    pub inter_cast: Duration,
    /// Pause after start-of-round pulses
    pub post_effect: Duration,
    /// Pause before a passive/reaction energy grant is applied
    pub reaction: Duration,
    /// Pause after a cast's resolution step is emitted
    pub post_cast: Duration,
    pub step_callback: Option<StepCallback>,
    /// Suppress all diagnostic logging
    pub quiet: bool,
    pub max_casts_per_round: usize,
    pub verbosity: VerbosityLevel,
    pub output_mode: OutputMode,
}

impl Default for RoundOptions {
    /// Headless: no delays, no callback
    fn default() -> Self {
        RoundOptions {
            inter_cast: Duration::ZERO,
            post_effect: Duration::ZERO,
            reaction: Duration::ZERO,
            post_cast: Duration::ZERO,
            step_callback: None,
            quiet: false,
            max_casts_per_round: DEFAULT_MAX_CASTS_PER_ROUND,
            verbosity: VerbosityLevel::default(),
            output_mode: OutputMode::default(),
        }
    }
}

impl RoundOptions {
    /// Delays tuned for a renderer animating each step
    pub fn paced() -> Self {
        RoundOptions {
            inter_cast: Duration::from_millis(600),
            post_effect: Duration::from_millis(300),
            reaction: Duration::from_millis(250),
            post_cast: Duration::from_millis(200),
            ..Self::default()
        }
    }

    pub fn with_delays(
        mut self,
        inter_cast: Duration,
        post_effect: Duration,
        reaction: Duration,
        post_cast: Duration,
    ) -> Self {
        self.inter_cast = inter_cast;
        self.post_effect = post_effect;
        self.reaction = reaction;
        self.post_cast = post_cast;
        self
    }

    pub fn with_step_callback(mut self, callback: StepCallback) -> Self {
        self.step_callback = Some(callback);
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_max_casts(mut self, max_casts: usize) -> Self {
        self.max_casts_per_round = max_casts;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl std::fmt::Debug for RoundOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundOptions")
            .field("inter_cast", &self.inter_cast)
            .field("post_effect", &self.post_effect)
            .field("reaction", &self.reaction)
            .field("post_cast", &self.post_cast)
            .field("has_step_callback", &self.step_callback.is_some())
            .field("quiet", &self.quiet)
            .field("max_casts_per_round", &self.max_casts_per_round)
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    inter_cast: Duration,
    post_effect: Duration,
    reaction: Duration,
    post_cast: Duration,
}

impl From<&RoundOptions> for Pacing {
    fn from(options: &RoundOptions) -> Self {
        Pacing {
            inter_cast: options.inter_cast,
            post_effect: options.post_effect,
            reaction: options.reaction,
            post_cast: options.post_cast,
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Everything a round starts from
pub struct RoundInput {
    pub boards: BoardSet,
    /// Append-only line consumer for the round log
    pub log_sink: Option<LogSink>,
    pub priority: PlayerToken,
    /// Drives round-number pulse magnitudes
    pub round: u32,
    /// Seed for chance-based post-effects
    pub seed: u64,
}

impl RoundInput {
    pub fn new(boards: BoardSet) -> Self {
        RoundInput {
            boards,
            log_sink: None,
            priority: PlayerToken::Player1,
            round: 1,
            seed: 0,
        }
    }

    pub fn with_priority(mut self, priority: PlayerToken) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }
}

/// Resolved boards, final priority player and winner
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub boards: BoardSet,
    pub priority: PlayerToken,
    /// `None` while both sides still have live main-board occupants
    pub winner: Option<Winner>,
    pub casts_resolved: usize,
    pub steps_emitted: usize,
    /// Captured log lines (memory output modes only)
    #[serde(skip)]
    pub logs: Vec<LogEntry>,
}

/// Outcome of several rounds played back to back
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub boards: BoardSet,
    pub priority: PlayerToken,
    pub winner: Option<Winner>,
    pub rounds_played: u32,
    pub casts_resolved: usize,
}

/// Round engine
///
/// Owns the queue-id sequence, so ids stay unique across every round this
/// engine runs and independent engines never share a counter.
pub struct RoundEngine<'a> {
    content: &'a dyn ContentSource,
    options: RoundOptions,
    queue_ids: QueueIdGen,
}

impl<'a> RoundEngine<'a> {
    pub fn new(content: &'a dyn ContentSource, options: RoundOptions) -> Self {
        RoundEngine {
            content,
            options,
            queue_ids: QueueIdGen::new(),
        }
    }

    pub fn options(&self) -> &RoundOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RoundOptions {
        &mut self.options
    }

    /// Resolve one round
    ///
    /// Never fails: content problems degrade to no-ops and the only terminal
    /// condition is a win or draw, which ends the round immediately.
    pub async fn execute_round(&mut self, input: RoundInput) -> RoundResult {
        let pacing = Pacing::from(&self.options);
        let max_casts = self.options.max_casts_per_round;

        let verbosity = if self.options.quiet {
            VerbosityLevel::Silent
        } else {
            self.options.verbosity
        };
        let mut logger = RoundLogger::with_verbosity(verbosity);
        logger.set_output_mode(self.options.output_mode);
        logger.set_sink(input.log_sink);

        let mut state = RoundState::new(
            input.boards,
            self.content,
            &mut self.queue_ids,
            logger,
            self.options.step_callback.as_mut(),
            input.round,
            input.priority,
            input.seed,
        );

        let (winner, casts_resolved) = run_round(&mut state, pacing, max_casts).await;

        let steps_emitted = state.step_count();
        let logs = state.logger.take_logs();
        RoundResult {
            boards: state.boards,
            priority: state.priority,
            winner,
            casts_resolved,
            steps_emitted,
            logs,
        }
    }

    /// Play rounds back to back until someone wins or `max_rounds` is reached
    ///
    /// The round number increments each round and priority carries over.
    pub async fn run_match(
        &mut self,
        boards: BoardSet,
        priority: PlayerToken,
        max_rounds: u32,
        seed: u64,
    ) -> MatchResult {
        let mut boards = boards;
        let mut priority = priority;
        let mut casts_resolved = 0;

        for round in 1..=max_rounds {
            let input = RoundInput::new(boards)
                .with_priority(priority)
                .with_round(round)
                .with_seed(round_seed(seed, round));
            let result = self.execute_round(input).await;
            boards = result.boards;
            priority = result.priority;
            casts_resolved += result.casts_resolved;

            if result.winner.is_some() {
                return MatchResult {
                    boards,
                    priority,
                    winner: result.winner,
                    rounds_played: round,
                    casts_resolved,
                };
            }
        }

        MatchResult {
            boards,
            priority,
            winner: None,
            rounds_played: max_rounds,
            casts_resolved,
        }
    }
}

/// Per-round seed within a match
pub fn round_seed(seed: u64, round: u32) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(u64::from(round))
}

async fn run_round(
    state: &mut RoundState<'_>,
    pacing: Pacing,
    max_casts: usize,
) -> (Option<Winner>, usize) {
    // Init
    state.enter(RoundPhase::Init);
    state.init();
    log_if_verbose!(state, "Round {} begins ({} has priority)", state.round, state.priority);
    state.emit(LastAction::Phase {
        phase: RoundPhase::Init,
    });

    // StartEffects
    state.enter(RoundPhase::StartEffects);
    state.begin_batch();
    let pulsed = state.apply_pulses();
    state.queue_round_start_triggers();
    state.settle();
    flush_energy(state, pacing).await;
    if pulsed {
        pause(pacing.post_effect).await;
    }
    if let Some(winner) = state.boards.winner() {
        return (finish(state, Some(winner)), 0);
    }

    // EnergyGain
    state.enter(RoundPhase::EnergyGain);
    state.emit(LastAction::EnergyGain);
    let before = state.energy_snapshot();
    for (slot, _) in &before {
        if let Some(occupant) = state.boards.live_mut(*slot) {
            occupant.energy += occupant.speed;
        }
    }

    // PassiveSweep
    state.enter(RoundPhase::PassiveSweep);
    state.contract_sweep(&before);

    // AutoCast
    state.enter(RoundPhase::AutoCast);
    let queued = cast_queue::auto_cast(&mut state.boards);
    log_if_verbose!(state, verbose: "{} cast(s) auto-enqueued", queued);

    // CastResolutionLoop
    state.enter(RoundPhase::CastResolutionLoop);
    let mut resolved = 0;
    loop {
        cast_queue::auto_cast(&mut state.boards);
        let entries = cast_queue::collect(&mut state.boards, &mut *state.ids);
        let Some((index, next_priority)) = cast_queue::select_next(&entries, state.priority)
        else {
            break;
        };
        if resolved >= max_casts {
            log_if_verbose!(state, "Cast limit of {} reached, discarding the rest", max_casts);
            state.discard_casts();
            break;
        }

        let entry = entries[index].clone();
        state.priority = next_priority;
        remove_cast(state, entry.caster, entry.queue_id);

        let ready = state
            .boards
            .live(entry.caster)
            .is_some_and(|o| o.energy >= entry.cost);
        if !ready {
            log_if_verbose!(state, verbose: "{} skips {} ({})", entry.caster, entry.spell, entry.queue_id);
            continue;
        }

        resolve_cast(state, &entry);
        flush_energy(state, pacing).await;
        resolved += 1;

        pause(pacing.post_cast).await;

        if let Some(winner) = state.boards.winner() {
            state.discard_casts();
            return (finish(state, Some(winner)), resolved);
        }

        pause(pacing.inter_cast).await;
    }

    // EffectDecay
    state.enter(RoundPhase::EffectDecay);
    state.decay_effects();

    let winner = state.boards.winner();
    (finish(state, winner), resolved)
}

fn remove_cast(state: &mut RoundState<'_>, caster: SlotRef, queue_id: QueueId) {
    if let Some(occupant) = state.boards.occupant_mut(caster) {
        occupant.casts.retain(|c| c.queue_id != Some(queue_id));
    }
}

/// Resolve the head of the queue: payload, post-effects, cost, deaths
fn resolve_cast(state: &mut RoundState<'_>, entry: &CastEntry) {
    state.emit(LastAction::CastStart {
        caster: entry.caster,
        spell: entry.spell.clone(),
        queue_id: entry.queue_id,
    });

    state.begin_batch();
    let payload = build_payload(
        &entry.spell,
        entry.caster,
        &state.boards,
        &state.payload_context(),
    );
    if payload.is_noop() {
        log_if_verbose!(state, "{} casts {}, which finds no target", entry.caster, entry.spell);
    } else {
        log_if_verbose!(
            state,
            "{} casts {} on {}",
            entry.caster,
            entry.spell,
            payload
                .targets
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    let outcome = state.resolve_payload(&payload, DamageCause::Spell, true);

    let caster = state.follow(entry.caster);
    if let Some(occupant) = state.boards.live_mut(caster) {
        match entry.spell {
            CastSpell::BasicAttack => occupant.energy = 0,
            CastSpell::Spell(_) => {
                occupant.energy = (occupant.energy - entry.cost).max(0);
                let remaining = occupant.casts_remaining.get_mut(entry.slot);
                *remaining = remaining.saturating_sub(1);
            }
        }
        occupant.last_autocast_energy = Some(occupant.energy);
    }

    state.last_cast = Some(CastRecord {
        caster: entry.caster,
        spell: entry.spell.clone(),
    });
    state.queue_trigger(caster, Trigger::OwnerCast, None, 0);
    state.settle();

    state.emit(LastAction::CastResolved {
        caster,
        spell: entry.spell.clone(),
        targets: outcome.hit,
    });
}

/// Apply queued energy grants one at a time, pausing before each
async fn flush_energy(state: &mut RoundState<'_>, pacing: Pacing) {
    let grants = state.take_pending_energy();
    if grants.is_empty() {
        return;
    }
    let before = state.energy_snapshot();
    for (slot, amount) in grants {
        state.emit(LastAction::PassiveTriggered {
            owner: slot,
            passive: format!("+{amount} energy"),
        });
        pause(pacing.reaction).await;
        state.grant_energy(slot, amount);
    }
    state.contract_sweep(&before);
}

fn finish(state: &mut RoundState<'_>, winner: Option<Winner>) -> Option<Winner> {
    state.enter(RoundPhase::Done);
    match winner {
        Some(Winner::Draw) => state.log_minimal(&format!("Round {}: draw", state.round)),
        Some(w) => state.log_minimal(&format!("Round {}: {} wins", state.round, w)),
        None => log_if_verbose!(state, "Round {} ends", state.round),
    }
    state.emit(LastAction::RoundEnd { winner });
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Effect, EffectKind, Formula, Hero, ReactionAction, Relative, Side, SlotSpell,
        SpellAction, SpellSlot, SpellSpec, TargetDescriptor,
    };
    use crate::game::snapshot::recording_callback;
    use crate::loader::ContentDatabase;
    use std::sync::{Arc, Mutex};

    fn content() -> ContentDatabase {
        let mut db = ContentDatabase::new();
        db.add_spell(SpellSpec::new(
            "zap",
            TargetDescriptor::Projectile {
                side: Relative::Enemy,
            },
            SpellAction::Damage(Formula::Fixed(2)),
        ));
        db.add_effect(
            Effect::new("momentum", EffectKind::Buff)
                .with_reaction(Trigger::OwnerCast, ReactionAction::HealAllies(3)),
        );
        db
    }

    fn duelist() -> Hero {
        Hero::new("duelist", 10, 3).with_spell(SpellSlot::Front, SlotSpell::new("zap", 3, 1))
    }

    fn mirrored() -> BoardSet {
        let mut boards = BoardSet::new();
        boards.p1.place(0, duelist());
        boards.p2.place(8, duelist());
        boards
    }

    #[tokio::test]
    async fn test_round_emits_steps_in_phase_order() {
        let db = content();
        let steps = Arc::new(Mutex::new(Vec::new()));
        let options = RoundOptions::default()
            .quiet()
            .with_step_callback(recording_callback(Arc::clone(&steps)));
        let mut engine = RoundEngine::new(&db, options);

        let result = engine.execute_round(RoundInput::new(mirrored())).await;
        assert_eq!(result.winner, None);
        assert_eq!(result.casts_resolved, 2);

        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), result.steps_emitted);
        assert_eq!(
            steps.first().map(|s| &s.last_action),
            Some(&LastAction::Phase {
                phase: RoundPhase::Init
            })
        );
        assert_eq!(
            steps.last().map(|s| &s.last_action),
            Some(&LastAction::RoundEnd { winner: None })
        );
        assert!(steps
            .iter()
            .any(|s| s.last_action == LastAction::EnergyGain));
    }

    #[tokio::test]
    async fn test_queue_ids_stay_unique_across_rounds() {
        let db = content();
        let mut engine = RoundEngine::new(&db, RoundOptions::default().quiet());
        let first = engine.execute_round(RoundInput::new(mirrored())).await;
        let before = engine.queue_ids.clone().next_id();
        let _ = engine
            .execute_round(RoundInput::new(first.boards).with_round(2))
            .await;
        assert!(engine.queue_ids.clone().next_id() > before);
    }

    #[tokio::test]
    async fn test_empty_side_ends_round_at_start() {
        let db = content();
        let mut boards = BoardSet::new();
        boards.p1.place(0, duelist());
        let mut engine = RoundEngine::new(&db, RoundOptions::default().quiet());
        let result = engine.execute_round(RoundInput::new(boards)).await;
        assert_eq!(result.winner, Some(Winner::Player1));
        assert_eq!(result.casts_resolved, 0);
        // No energy was granted
        let occupant = result.boards.occupant(SlotRef::main(Side::P1, 0)).unwrap();
        assert_eq!(occupant.energy, 0);
    }

    #[tokio::test]
    async fn test_cast_limit_discards_remaining() {
        let db = content();
        let mut engine =
            RoundEngine::new(&db, RoundOptions::default().quiet().with_max_casts(1));
        let result = engine.execute_round(RoundInput::new(mirrored())).await;
        assert_eq!(result.casts_resolved, 1);
        for slot in BoardSet::main_slots() {
            if let Some(o) = result.boards.occupant(slot) {
                assert!(o.casts.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_log_sink_receives_lines() {
        let db = content();
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&lines);
        let mut engine = RoundEngine::new(
            &db,
            RoundOptions::default().with_output_mode(OutputMode::Memory),
        );
        let input = RoundInput::new(mirrored()).with_log_sink(Box::new(move |line: &str| {
            if let Ok(mut lines) = captured.lock() {
                lines.push(line.to_string());
            }
        }));
        let result = engine.execute_round(input).await;

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.contains("casts zap")));
        assert_eq!(lines.len(), result.logs.len());
    }

    #[tokio::test]
    async fn test_paced_round_matches_headless() {
        let db = content();
        let tick = Duration::from_millis(1);
        let mut headless = RoundEngine::new(&db, RoundOptions::default().quiet());
        let mut paced = RoundEngine::new(
            &db,
            RoundOptions::default()
                .quiet()
                .with_delays(tick, tick, tick, tick),
        );
        let a = headless.execute_round(RoundInput::new(mirrored())).await;
        let b = paced.execute_round(RoundInput::new(mirrored())).await;
        assert_eq!(a.boards, b.boards);
        assert_eq!(a.priority, b.priority);
    }

    #[tokio::test]
    async fn test_owner_cast_reaction_fires_after_each_cast() {
        let db = content();
        let mut boards = mirrored();
        let momentum = db.effect(&"momentum".into()).cloned().unwrap();
        let holder = SlotRef::main(Side::P1, 0);
        boards
            .occupant_mut(holder)
            .unwrap()
            .effects
            .push(momentum.instantiate(None));

        let mut engine = RoundEngine::new(&db, RoundOptions::default().quiet());
        let result = engine.execute_round(RoundInput::new(boards)).await;

        // p1-0 zaps first and heals itself to 13, then takes p2-8's zap
        assert_eq!(result.casts_resolved, 2);
        assert_eq!(result.boards.occupant(holder).unwrap().health, 11);
        let enemy = result.boards.occupant(SlotRef::main(Side::P2, 8)).unwrap();
        assert_eq!(enemy.health, 8);
    }

    #[tokio::test]
    async fn test_cast_budget_is_not_refilled_between_rounds() {
        let db = content();
        let mut engine = RoundEngine::new(&db, RoundOptions::default().quiet());
        let first = engine.execute_round(RoundInput::new(mirrored())).await;
        for slot in [SlotRef::main(Side::P1, 0), SlotRef::main(Side::P2, 8)] {
            let occupant = first.boards.occupant(slot).unwrap();
            assert_eq!(occupant.casts_remaining.get(SpellSlot::Front), 0);
        }

        let steps = Arc::new(Mutex::new(Vec::new()));
        engine.options_mut().step_callback = Some(recording_callback(Arc::clone(&steps)));
        let second = engine
            .execute_round(RoundInput::new(first.boards).with_round(2))
            .await;
        assert_eq!(second.casts_resolved, 2);

        // With the budget spent, round two only has basic attacks
        let steps = steps.lock().unwrap();
        let spells: Vec<&CastSpell> = steps
            .iter()
            .filter_map(|s| match &s.last_action {
                LastAction::CastStart { spell, .. } => Some(spell),
                _ => None,
            })
            .collect();
        assert_eq!(spells, vec![&CastSpell::BasicAttack, &CastSpell::BasicAttack]);
    }
}
