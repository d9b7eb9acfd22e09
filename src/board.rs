//! Boards, tiles and occupants
//!
//! Each side owns a 9-slot main board and a 9-slot reserve. An occupant wraps
//! a static hero template together with the runtime fields the round engine
//! mutates; everything here is a plain value type, so `Clone` is a full deep
//! copy.

use crate::core::{
    position, BoardKind, BoardRef, Cast, Effect, Hero, Passive, QueueId, Side, SlotRef,
    SpellSlot, Winner, BOARD_SIZE,
};
use serde::{Deserialize, Serialize};

/// Casts remaining per spell slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotCounters {
    pub front: u32,
    pub middle: u32,
    pub back: u32,
}

impl SlotCounters {
    pub fn get(&self, slot: SpellSlot) -> u32 {
        match slot {
            SpellSlot::Front => self.front,
            SpellSlot::Middle => self.middle,
            SpellSlot::Back => self.back,
        }
    }

    pub fn get_mut(&mut self, slot: SpellSlot) -> &mut u32 {
        match slot {
            SpellSlot::Front => &mut self.front,
            SpellSlot::Middle => &mut self.middle,
            SpellSlot::Back => &mut self.back,
        }
    }
}

/// A hero standing on a tile, with its runtime state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub hero: Hero,

    /// Runtime fields below are only meaningful once this is set
    #[serde(default)]
    pub initialized: bool,

    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub spell_power: i32,

    /// Active effects, oldest first
    #[serde(default)]
    pub effects: Vec<Effect>,

    /// Pending casts in queue order
    #[serde(default)]
    pub casts: Vec<Cast>,

    #[serde(default)]
    pub passives: Vec<Passive>,

    /// Filled once by `ensure_runtime`; rounds do not refill it
    #[serde(default)]
    pub casts_remaining: SlotCounters,

    #[serde(default)]
    pub dead: bool,

    /// Energy at the last auto-cast evaluation (cleared every round)
    #[serde(default)]
    pub last_autocast_energy: Option<i32>,
}

impl Occupant {
    pub fn new(hero: Hero) -> Self {
        Occupant {
            hero,
            initialized: false,
            health: 0,
            energy: 0,
            armor: 0,
            speed: 0,
            spell_power: 0,
            effects: Vec::new(),
            casts: Vec::new(),
            passives: Vec::new(),
            casts_remaining: SlotCounters::default(),
            dead: false,
            last_autocast_energy: None,
        }
    }

    /// Initialize runtime fields from the template on first touch
    pub fn ensure_runtime(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.health = self.hero.health;
        self.energy = self.hero.energy.max(0);
        self.armor = self.hero.armor;
        self.speed = self.hero.speed;
        self.spell_power = self.hero.spell_power;
        self.passives = self.hero.passives.clone();
        for slot in [SpellSlot::Front, SpellSlot::Middle, SpellSlot::Back] {
            *self.casts_remaining.get_mut(slot) =
                self.hero.spells.get(slot).map(|s| s.casts).unwrap_or(0);
        }
        self.clamp_health();
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn clamp_health(&mut self) {
        if let Some(cap) = self.hero.health_cap() {
            self.health = self.health.min(cap);
        }
    }

    /// The one place an occupant dies
    ///
    /// A dead occupant keeps its hero (corpse effects can still target it)
    /// but holds no effects, no queued casts and no energy.
    pub fn mark_dead(&mut self) {
        self.dead = true;
        self.health = self.health.max(0);
        self.energy = 0;
        self.effects.clear();
        self.casts.clear();
        self.last_autocast_energy = None;
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant: Option<Occupant>,
}

impl Tile {
    pub fn with_hero(hero: Hero) -> Self {
        Tile {
            occupant: Some(Occupant::new(hero)),
        }
    }

    /// The occupant, if present and not dead
    pub fn live(&self) -> Option<&Occupant> {
        self.occupant.as_ref().filter(|o| o.is_alive())
    }

    pub fn live_mut(&mut self) -> Option<&mut Occupant> {
        self.occupant.as_mut().filter(|o| o.is_alive())
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// One 9-slot board array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub side: Side,
    pub kind: BoardKind,
    pub tiles: [Tile; BOARD_SIZE],
}

impl Board {
    pub fn new(side: Side, kind: BoardKind) -> Self {
        Board {
            side,
            kind,
            tiles: Default::default(),
        }
    }

    pub fn board_ref(&self) -> BoardRef {
        BoardRef {
            side: self.side,
            kind: self.kind,
        }
    }

    pub fn place(&mut self, index: usize, hero: Hero) {
        if let Some(tile) = self.tiles.get_mut(index) {
            *tile = Tile::with_hero(hero);
        }
    }

    pub fn live_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.live().is_some()).count()
    }

    pub fn iter_occupants(&self) -> impl Iterator<Item = (usize, &Occupant)> {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.occupant.as_ref().map(|o| (i, o)))
    }
}

/// The four board arrays a round works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSet {
    pub p1: Board,
    pub p2: Board,
    pub p1_reserve: Board,
    pub p2_reserve: Board,
}

impl Default for BoardSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardSet {
    pub fn new() -> Self {
        BoardSet {
            p1: Board::new(Side::P1, BoardKind::Main),
            p2: Board::new(Side::P2, BoardKind::Main),
            p1_reserve: Board::new(Side::P1, BoardKind::Reserve),
            p2_reserve: Board::new(Side::P2, BoardKind::Reserve),
        }
    }

    /// Independent copy for emission to a renderer
    ///
    /// Every board type is an owned value tree, so this is exactly `Clone`:
    /// new runtime fields are covered without touching this routine.
    pub fn deep_copy(&self) -> BoardSet {
        self.clone()
    }

    pub fn board(&self, board: BoardRef) -> &Board {
        match (board.side, board.kind) {
            (Side::P1, BoardKind::Main) => &self.p1,
            (Side::P2, BoardKind::Main) => &self.p2,
            (Side::P1, BoardKind::Reserve) => &self.p1_reserve,
            (Side::P2, BoardKind::Reserve) => &self.p2_reserve,
        }
    }

    pub fn board_mut(&mut self, board: BoardRef) -> &mut Board {
        match (board.side, board.kind) {
            (Side::P1, BoardKind::Main) => &mut self.p1,
            (Side::P2, BoardKind::Main) => &mut self.p2,
            (Side::P1, BoardKind::Reserve) => &mut self.p1_reserve,
            (Side::P2, BoardKind::Reserve) => &mut self.p2_reserve,
        }
    }

    pub fn main(&self, side: Side) -> &Board {
        self.board(BoardRef::main(side))
    }

    /// Cross-board tile locator
    pub fn tile(&self, slot: SlotRef) -> Option<&Tile> {
        self.board(slot.board).tiles.get(slot.index)
    }

    pub fn tile_mut(&mut self, slot: SlotRef) -> Option<&mut Tile> {
        self.board_mut(slot.board).tiles.get_mut(slot.index)
    }

    pub fn occupant(&self, slot: SlotRef) -> Option<&Occupant> {
        self.tile(slot).and_then(|t| t.occupant.as_ref())
    }

    pub fn occupant_mut(&mut self, slot: SlotRef) -> Option<&mut Occupant> {
        self.tile_mut(slot).and_then(|t| t.occupant.as_mut())
    }

    pub fn live(&self, slot: SlotRef) -> Option<&Occupant> {
        self.tile(slot).and_then(Tile::live)
    }

    pub fn live_mut(&mut self, slot: SlotRef) -> Option<&mut Occupant> {
        self.tile_mut(slot).and_then(Tile::live_mut)
    }

    /// Every main-board slot, P1 then P2, in index order
    pub fn main_slots() -> impl Iterator<Item = SlotRef> {
        [Side::P1, Side::P2]
            .into_iter()
            .flat_map(|side| (0..BOARD_SIZE).map(move |i| SlotRef::main(side, i)))
    }

    /// Every slot on all four boards
    pub fn all_slots() -> impl Iterator<Item = SlotRef> {
        Self::main_slots().chain(
            [Side::P1, Side::P2]
                .into_iter()
                .flat_map(|side| (0..BOARD_SIZE).map(move |i| SlotRef::reserve(side, i))),
        )
    }

    /// Main-board slots of one side in reading order
    pub fn reading_slots(side: Side) -> impl Iterator<Item = SlotRef> {
        position::reading_order(side)
            .into_iter()
            .map(move |i| SlotRef::main(side, i))
    }

    /// Live main-board occupants, P1 then P2 in index order
    pub fn live_main_slots(&self) -> Vec<SlotRef> {
        Self::main_slots()
            .filter(|s| self.live(*s).is_some())
            .collect()
    }

    /// Swap the contents of two tiles on the same board
    pub fn swap(&mut self, a: SlotRef, b: SlotRef) {
        if a.board != b.board || a.index >= BOARD_SIZE || b.index >= BOARD_SIZE {
            return;
        }
        self.board_mut(a.board).tiles.swap(a.index, b.index);
    }

    /// Highest queue id present on any board
    pub fn max_queue_id(&self) -> Option<QueueId> {
        Self::all_slots()
            .filter_map(|s| self.occupant(s))
            .flat_map(|o| o.casts.iter().filter_map(|c| c.queue_id))
            .max()
    }

    /// A side with no live main-board occupants loses; both empty is a draw
    pub fn winner(&self) -> Option<Winner> {
        let p1_alive = self.p1.live_count() > 0;
        let p2_alive = self.p2.live_count() > 0;
        match (p1_alive, p2_alive) {
            (true, true) => None,
            (false, false) => Some(Winner::Draw),
            (false, true) => Some(Winner::against(Side::P1)),
            (true, false) => Some(Winner::against(Side::P2)),
        }
    }
}
