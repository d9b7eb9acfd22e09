//! Target descriptor resolution
//!
//! Maps an abstract descriptor plus the caster's position to concrete slots.
//! Only main boards are ever expanded; empty and dead tiles are skipped except
//! where the descriptor names them explicitly (`DeadAllies`, `Concrete`).

use crate::board::BoardSet;
use crate::core::position::index_at;
use crate::core::{LaneSel, Relative, Row, Side, SlotRef, TargetDescriptor};
use smallvec::SmallVec;

pub type Targets = SmallVec<[SlotRef; 9]>;

fn sides(relative: Relative, caster_side: Side) -> SmallVec<[Side; 2]> {
    match relative {
        Relative::Ally => smallvec::smallvec![caster_side],
        Relative::Enemy => smallvec::smallvec![caster_side.opponent()],
        Relative::Both => smallvec::smallvec![caster_side, caster_side.opponent()],
    }
}

fn live_in_row(boards: &BoardSet, side: Side, row: Row) -> impl Iterator<Item = SlotRef> + '_ {
    (0..3)
        .map(move |lane| SlotRef::main(side, index_at(side, row, lane)))
        .filter(|s| boards.live(*s).is_some())
}

fn live_in_lane(boards: &BoardSet, side: Side, lane: usize) -> impl Iterator<Item = SlotRef> + '_ {
    Row::ALL
        .into_iter()
        .map(move |row| SlotRef::main(side, index_at(side, row, lane)))
        .filter(|s| boards.live(*s).is_some())
}

/// First live occupant in reading order
pub fn front_most(boards: &BoardSet, side: Side) -> Option<SlotRef> {
    BoardSet::reading_slots(side).find(|s| boards.live(*s).is_some())
}

/// Live occupants on a side's main board, reading order
pub fn live_allies(boards: &BoardSet, side: Side) -> Targets {
    BoardSet::reading_slots(side)
        .filter(|s| boards.live(*s).is_some())
        .collect()
}

pub fn resolve_targets(
    descriptor: &TargetDescriptor,
    caster: SlotRef,
    boards: &BoardSet,
) -> Targets {
    let caster_side = caster.side();
    let mut targets = Targets::new();

    match descriptor {
        TargetDescriptor::SelfCast => targets.push(caster),
        TargetDescriptor::Board { side } => {
            for side in sides(*side, caster_side) {
                targets.extend(live_allies(boards, side));
            }
        }
        TargetDescriptor::Row { side, row } => {
            for side in sides(*side, caster_side) {
                targets.extend(live_in_row(boards, side, *row));
            }
        }
        TargetDescriptor::Column { side, lane } => {
            let lane = match lane {
                LaneSel::CasterLane => caster.lane(),
                LaneSel::Fixed(lane) => *lane,
            };
            if lane < 3 {
                for side in sides(*side, caster_side) {
                    targets.extend(live_in_lane(boards, side, lane));
                }
            }
        }
        TargetDescriptor::Projectile { side } => {
            let lane = caster.lane();
            for side in sides(*side, caster_side) {
                let hit = live_in_lane(boards, side, lane)
                    .next()
                    .or_else(|| front_most(boards, side));
                targets.extend(hit);
            }
        }
        TargetDescriptor::DeadAllies => {
            targets.extend(BoardSet::reading_slots(caster_side).filter(|s| {
                boards.occupant(*s).is_some_and(|o| o.dead)
            }));
        }
        TargetDescriptor::Concrete(slots) => targets.extend(slots.iter().copied()),
    }

    targets
}
