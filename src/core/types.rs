//! Strongly-typed wrappers for round concepts
//!
//! Content tables refer to heroes, spells and effects by string id. Wrapping
//! them in distinct types keeps a spell id from being passed where an effect
//! name is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_id!(
    /// Hero template id (e.g., "ember_knight")
    HeroId
);
string_id!(
    /// Spell id as used by content tables and queued casts
    SpellId
);
string_id!(
    /// Effect template name (e.g., "burning", "contract_mark")
    EffectName
);

/// Board side tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }

    /// The player who owns this side
    pub fn player(self) -> PlayerToken {
        match self {
            Side::P1 => PlayerToken::Player1,
            Side::P2 => PlayerToken::Player2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::P1 => "p1",
            Side::P2 => "p2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player token used for the priority tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerToken {
    #[default]
    Player1,
    Player2,
}

impl PlayerToken {
    pub fn other(self) -> PlayerToken {
        match self {
            PlayerToken::Player1 => PlayerToken::Player2,
            PlayerToken::Player2 => PlayerToken::Player1,
        }
    }

    pub fn side(self) -> Side {
        match self {
            PlayerToken::Player1 => Side::P1,
            PlayerToken::Player2 => Side::P2,
        }
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerToken::Player1 => f.write_str("player1"),
            PlayerToken::Player2 => f.write_str("player2"),
        }
    }
}

/// Board row, relative to the owning side's own front/middle/back convention
///
/// A hero's spell slot is the row it currently stands in, so the same enum
/// keys the per-slot spell table and casts-remaining counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Row {
    Front,
    Middle,
    Back,
}

pub type SpellSlot = Row;

impl Row {
    pub const ALL: [Row; 3] = [Row::Front, Row::Middle, Row::Back];

    /// 0 for front, 2 for back
    pub fn rank(self) -> usize {
        match self {
            Row::Front => 0,
            Row::Middle => 1,
            Row::Back => 2,
        }
    }

    pub fn from_rank(rank: usize) -> Option<Row> {
        Row::ALL.get(rank).copied()
    }

    /// The row directly behind this one
    pub fn behind(self) -> Option<Row> {
        Row::from_rank(self.rank() + 1)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Front => f.write_str("front"),
            Row::Middle => f.write_str("middle"),
            Row::Back => f.write_str("back"),
        }
    }
}

/// Round outcome marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player1,
    Player2,
    Draw,
}

impl Winner {
    /// The winner when `loser` has no live occupants left
    pub fn against(loser: Side) -> Winner {
        match loser {
            Side::P1 => Winner::Player2,
            Side::P2 => Winner::Player1,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Player1 => f.write_str("player1"),
            Winner::Player2 => f.write_str("player2"),
            Winner::Draw => f.write_str("draw"),
        }
    }
}

/// Stats that formulas and pulses can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Health,
    Energy,
    Armor,
    Speed,
    SpellPower,
    Attack,
}
