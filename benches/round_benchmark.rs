//! Performance benchmarks for round resolution
//!
//! Two workloads:
//!
//! 1. **Round** - resolve one headless round of each fixture scenario
//! 2. **Match** - play a full board (9 v 9) until one side falls
//!
//! Build with `--no-default-features` to leave out verbose-logging formatting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridclash_rs::{
    board::BoardSet,
    core::{
        Formula, Hero, PlayerToken, Relative, SlotSpell, SpellAction, SpellSlot, SpellSpec,
        TargetDescriptor,
    },
    game::{cast_queue, RoundEngine, RoundInput, RoundOptions},
    loader::{ContentDatabase, Scenario},
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

const FIXTURES: &[&str] = &["pulses_and_reactions", "pushback", "copycat"];

fn load_fixture(name: &str) -> (ContentDatabase, BoardSet, Scenario) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_boards")
        .join(format!("{name}.json"));
    let scenario = Scenario::load(&path).expect("fixture should load");
    let (content, boards) = scenario.build().expect("fixture should build");
    (content, boards, scenario)
}

fn full_board() -> (ContentDatabase, BoardSet) {
    let mut db = ContentDatabase::new();
    db.add_spell(SpellSpec::new(
        "volley",
        TargetDescriptor::Row {
            side: Relative::Enemy,
            row: gridclash_rs::core::Row::Front,
        },
        SpellAction::Damage(Formula::Fixed(2)),
    ));
    db.add_spell(SpellSpec::new(
        "bolt",
        TargetDescriptor::Projectile {
            side: Relative::Enemy,
        },
        SpellAction::Damage(Formula::SpellPower { plus: 2 }),
    ));
    let soldier = |speed| {
        Hero::new("soldier", 12, speed)
            .with_spell(SpellSlot::Front, SlotSpell::new("bolt", 3, 2))
            .with_spell(SpellSlot::Middle, SlotSpell::new("volley", 4, 2))
            .with_spell(SpellSlot::Back, SlotSpell::new("bolt", 2, 3))
    };

    let mut boards = BoardSet::new();
    for i in 0..9 {
        boards.p1.place(i, soldier(2 + (i as i32 % 3)));
        boards.p2.place(i, soldier(2 + ((8 - i) as i32 % 3)));
    }
    (db, boards)
}

fn bench_round(c: &mut Criterion) {
    let runtime = Runtime::new().expect("Failed to create tokio runtime");
    let mut group = c.benchmark_group("round");
    group.measurement_time(Duration::from_secs(10));

    for name in FIXTURES {
        let (content, boards, scenario) = load_fixture(name);
        group.bench_with_input(BenchmarkId::new("fresh", name), &boards, |b, boards| {
            b.iter(|| {
                let mut engine = RoundEngine::new(&content, RoundOptions::default().quiet());
                let input = RoundInput::new(boards.deep_copy())
                    .with_priority(scenario.priority)
                    .with_round(scenario.round)
                    .with_seed(scenario.seed);
                black_box(runtime.block_on(engine.execute_round(input)))
            });
        });
    }
    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let runtime = Runtime::new().expect("Failed to create tokio runtime");
    let (content, boards) = full_board();
    let mut group = c.benchmark_group("match");
    group.sample_size(20);

    group.bench_function("full_board", |b| {
        b.iter(|| {
            let mut engine = RoundEngine::new(&content, RoundOptions::default().quiet());
            black_box(runtime.block_on(engine.run_match(
                boards.deep_copy(),
                PlayerToken::Player1,
                30,
                42,
            )))
        });
    });
    group.finish();
}

fn bench_ordering(c: &mut Criterion) {
    let (_, mut boards) = full_board();
    for slot in BoardSet::main_slots() {
        if let Some(occupant) = boards.occupant_mut(slot) {
            occupant.ensure_runtime();
            occupant.energy = 9;
        }
    }
    cast_queue::auto_cast(&mut boards);
    let mut ids = gridclash_rs::core::QueueIdGen::new();
    let entries = cast_queue::collect(&mut boards, &mut ids);

    c.bench_function("order_full_queue", |b| {
        b.iter(|| black_box(cast_queue::order(entries.clone(), PlayerToken::Player1)))
    });
}

criterion_group!(benches, bench_round, bench_match, bench_ordering);
criterion_main!(benches);
