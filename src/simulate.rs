//! Batch simulation: play one starting position many times in parallel
//!
//! Every game gets its own seed (drawn from a master Xoshiro stream) and its
//! own single-threaded tokio runtime on a rayon worker. Games only differ in
//! their seed and starting priority, so the summary shows how much the
//! chance-based effects and the opening priority swing the result.

use crate::board::BoardSet;
use crate::core::{PlayerToken, Winner};
use crate::game::{MatchResult, RoundEngine, RoundOptions};
use crate::loader::ContentDatabase;
use crate::Result;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};

/// How a simulation batch is run
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub games: usize,
    pub max_rounds: u32,
    pub seed: u64,
    /// Draw the opening priority per game instead of using the given one
    pub random_priority: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            games: 100,
            max_rounds: 20,
            seed: 0,
            random_priority: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub games: usize,
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
    /// Games that hit the round limit with both sides standing
    pub unfinished: usize,
    pub total_rounds: u64,
    pub total_casts: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SimulationSummary {
    fn record(&mut self, result: &MatchResult) {
        self.games += 1;
        self.total_rounds += u64::from(result.rounds_played);
        self.total_casts += result.casts_resolved as u64;
        match result.winner {
            Some(Winner::Player1) => self.p1_wins += 1,
            Some(Winner::Player2) => self.p2_wins += 1,
            Some(Winner::Draw) => self.draws += 1,
            None => self.unfinished += 1,
        }
    }

    pub fn avg_rounds(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_rounds as f64 / self.games as f64
        }
    }

    pub fn print(&self) {
        let pct = |n: usize| {
            if self.games == 0 {
                0.0
            } else {
                n as f64 * 100.0 / self.games as f64
            }
        };
        println!("=== Simulation Results ===");
        println!("Games:      {}", self.games);
        println!("P1 wins:    {} ({:.1}%)", self.p1_wins, pct(self.p1_wins));
        println!("P2 wins:    {} ({:.1}%)", self.p2_wins, pct(self.p2_wins));
        println!("Draws:      {} ({:.1}%)", self.draws, pct(self.draws));
        println!("Unfinished: {} ({:.1}%)", self.unfinished, pct(self.unfinished));
        println!("Avg rounds: {:.2}", self.avg_rounds());
        println!(
            "Elapsed:    {:.2}ms",
            self.elapsed.as_secs_f64() * 1000.0
        );
    }
}

/// Per-game seed and opening priority, derived up front so results do not
/// depend on rayon's scheduling
fn game_plans(config: &SimulationConfig, priority: PlayerToken) -> Vec<(u64, PlayerToken)> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    (0..config.games)
        .map(|_| {
            let seed = rng.gen::<u64>();
            let opening = if config.random_priority && rng.gen_bool(0.5) {
                priority.other()
            } else {
                priority
            };
            (seed, opening)
        })
        .collect()
}

fn play_one(
    content: &ContentDatabase,
    boards: &BoardSet,
    seed: u64,
    priority: PlayerToken,
    max_rounds: u32,
) -> Result<MatchResult> {
    // One runtime per game: rayon workers are plain threads
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let mut engine = RoundEngine::new(content, RoundOptions::default().quiet());
    Ok(runtime.block_on(engine.run_match(boards.deep_copy(), priority, max_rounds, seed)))
}

/// Run `config.games` matches from the same starting boards
pub fn run_simulation(
    content: &ContentDatabase,
    boards: &BoardSet,
    priority: PlayerToken,
    config: SimulationConfig,
) -> Result<SimulationSummary> {
    let start = Instant::now();
    let plans = game_plans(&config, priority);

    let results: Vec<Result<MatchResult>> = plans
        .into_par_iter()
        .map(|(seed, opening)| play_one(content, boards, seed, opening, config.max_rounds))
        .collect();

    let mut summary = SimulationSummary::default();
    for result in results {
        summary.record(&result?);
    }
    summary.elapsed = start.elapsed();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Formula, Hero, Relative, SlotSpell, SpellAction, SpellSlot, SpellSpec, TargetDescriptor,
    };

    fn setup() -> (ContentDatabase, BoardSet) {
        let mut db = ContentDatabase::new();
        db.add_spell(SpellSpec::new(
            "bolt",
            TargetDescriptor::Projectile {
                side: Relative::Enemy,
            },
            SpellAction::Damage(Formula::Fixed(4)),
        ));
        let mut boards = BoardSet::new();
        boards.p1.place(
            1,
            Hero::new("mage", 8, 3).with_spell(SpellSlot::Front, SlotSpell::new("bolt", 3, 3)),
        );
        boards.p2.place(7, Hero::new("brute", 6, 2));
        (db, boards)
    }

    #[test]
    fn test_game_plans_are_reproducible() {
        let config = SimulationConfig {
            games: 8,
            random_priority: true,
            ..Default::default()
        };
        let a = game_plans(&config, PlayerToken::Player1);
        let b = game_plans(&config, PlayerToken::Player1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_simulation_counts_every_game() {
        let (db, boards) = setup();
        let config = SimulationConfig {
            games: 6,
            max_rounds: 10,
            ..Default::default()
        };
        let summary = run_simulation(&db, &boards, PlayerToken::Player1, config).unwrap();
        assert_eq!(summary.games, 6);
        assert_eq!(
            summary.p1_wins + summary.p2_wins + summary.draws + summary.unfinished,
            6
        );
        // The mage out-damages the brute every time
        assert_eq!(summary.p1_wins, 6);
    }
}
