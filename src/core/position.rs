//! Board addressing and 3x3 geometry
//!
//! Index `i` sits at grid row `i / 3`, grid column `i % 3`. P1 reads its grid
//! as-is: grid row 0 is the front row and the lane is the grid column. P2's
//! board is mirrored on both axes, so grid row 2 is its front row and lane
//! `2 - i % 3`. Lane L on one board faces lane L on the other.

use crate::core::{Row, Side};
use crate::{ClashError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, one_of},
    combinator::{all_consuming, map, opt},
    sequence::tuple,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots per board
pub const BOARD_SIZE: usize = 9;

/// Main board or reserve bench
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    Main,
    Reserve,
}

/// One of the four board arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardRef {
    pub side: Side,
    pub kind: BoardKind,
}

impl BoardRef {
    pub fn main(side: Side) -> Self {
        BoardRef {
            side,
            kind: BoardKind::Main,
        }
    }

    pub fn reserve(side: Side) -> Self {
        BoardRef {
            side,
            kind: BoardKind::Reserve,
        }
    }

    pub fn is_main(&self) -> bool {
        self.kind == BoardKind::Main
    }
}

/// A concrete slot on one of the four boards
///
/// Serialized as a position token: `p1-4` for a main board slot,
/// `p2r-0` for a reserve slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef {
    pub board: BoardRef,
    pub index: usize,
}

impl SlotRef {
    pub fn new(board: BoardRef, index: usize) -> Self {
        SlotRef { board, index }
    }

    pub fn main(side: Side, index: usize) -> Self {
        SlotRef::new(BoardRef::main(side), index)
    }

    pub fn reserve(side: Side, index: usize) -> Self {
        SlotRef::new(BoardRef::reserve(side), index)
    }

    pub fn side(&self) -> Side {
        self.board.side
    }

    pub fn row(&self) -> Row {
        row_of(self.board.side, self.index)
    }

    pub fn lane(&self) -> usize {
        lane_of(self.board.side, self.index)
    }

    pub fn reading_pos(&self) -> usize {
        reading_pos(self.board.side, self.index)
    }

    /// Parse a position token such as `p1-4` or `p2r-7`
    pub fn parse(token: &str) -> Result<SlotRef> {
        match all_consuming(slot_token)(token.trim()) {
            Ok((_, slot)) => Ok(slot),
            Err(_) => Err(ClashError::ParseError(format!(
                "invalid position token '{token}' (expected e.g. p1-4 or p2r-0)"
            ))),
        }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reserve = if self.board.kind == BoardKind::Reserve {
            "r"
        } else {
            ""
        };
        write!(f, "{}{}-{}", self.board.side, reserve, self.index)
    }
}

impl Serialize for SlotRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        SlotRef::parse(&token).map_err(serde::de::Error::custom)
    }
}

fn side_tag(input: &str) -> IResult<&str, Side> {
    alt((map(tag("p1"), |_| Side::P1), map(tag("p2"), |_| Side::P2)))(input)
}

fn slot_token(input: &str) -> IResult<&str, SlotRef> {
    map(
        tuple((side_tag, opt(char('r')), char('-'), one_of("012345678"))),
        |(side, reserve, _, digit)| {
            let index = digit as usize - '0' as usize;
            let board = match reserve {
                Some(_) => BoardRef::reserve(side),
                None => BoardRef::main(side),
            };
            SlotRef::new(board, index)
        },
    )(input)
}

/// Row of a board index, relative to the owning side
pub fn row_of(side: Side, index: usize) -> Row {
    let grid_row = index / 3;
    let rank = match side {
        Side::P1 => grid_row,
        Side::P2 => 2 - grid_row,
    };
    Row::from_rank(rank).unwrap_or(Row::Back)
}

/// Lane of a board index; lanes line up across the two boards
pub fn lane_of(side: Side, index: usize) -> usize {
    match side {
        Side::P1 => index % 3,
        Side::P2 => 2 - index % 3,
    }
}

/// Board index for a (row, lane) pair on the given side
pub fn index_at(side: Side, row: Row, lane: usize) -> usize {
    let (grid_row, grid_col) = match side {
        Side::P1 => (row.rank(), lane),
        Side::P2 => (2 - row.rank(), 2 - lane),
    };
    grid_row * 3 + grid_col
}

/// Book-order position: front to back, then lane order
pub fn reading_pos(side: Side, index: usize) -> usize {
    row_of(side, index).rank() * 3 + lane_of(side, index)
}

/// Board indices of one side in reading order
pub fn reading_order(side: Side) -> [usize; BOARD_SIZE] {
    let mut order = [0; BOARD_SIZE];
    for (pos, slot) in order.iter_mut().enumerate() {
        *slot = index_at(side, Row::ALL[pos / 3], pos % 3);
    }
    order
}
