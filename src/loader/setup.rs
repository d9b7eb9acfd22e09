//! Board setups and scenario files
//!
//! A setup places heroes by position token and may pre-seed runtime fields
//! (health, energy, effects, queued casts). A scenario bundles content, a
//! setup and the round parameters so a round can be replayed from one file.

use crate::board::{BoardSet, Occupant, Tile};
use crate::core::{Cast, EffectName, HeroId, PlayerToken, SlotRef};
use crate::loader::{ContentDatabase, ContentFile, ContentSource};
use crate::{ClashError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub at: SlotRef,
    pub hero: HeroId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub casts: Vec<Cast>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSetup {
    pub placements: Vec<Placement>,
}

impl BoardSetup {
    /// Build the four boards from content
    pub fn build(&self, content: &dyn ContentSource) -> Result<BoardSet> {
        let mut boards = BoardSet::new();

        for placement in &self.placements {
            let hero = content
                .hero(&placement.hero)
                .ok_or_else(|| ClashError::UnknownHero(placement.hero.to_string()))?
                .clone();

            let tile = boards.tile_mut(placement.at).ok_or_else(|| {
                ClashError::InvalidBoard(format!("no tile at {}", placement.at))
            })?;
            if !tile.is_empty() {
                return Err(ClashError::InvalidBoard(format!(
                    "{} is placed twice",
                    placement.at
                )));
            }

            let mut occupant = Occupant::new(hero);
            let seeded = placement.health.is_some()
                || placement.energy.is_some()
                || !placement.effects.is_empty();
            if seeded {
                occupant.ensure_runtime();
                if let Some(health) = placement.health {
                    occupant.health = health;
                    occupant.clamp_health();
                }
                if let Some(energy) = placement.energy {
                    occupant.energy = energy.max(0);
                }
                for name in &placement.effects {
                    let template = content.effect(name).ok_or_else(|| {
                        ClashError::InvalidContent(format!("unknown effect '{name}'"))
                    })?;
                    occupant.effects.push(template.instantiate(None));
                }
            }
            occupant.casts.extend(placement.casts.iter().cloned());

            *tile = Tile {
                occupant: Some(occupant),
            };
        }

        Ok(boards)
    }
}

fn first_round() -> u32 {
    1
}

/// Content + setup + round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: ContentFile,
    pub setup: BoardSetup,
    #[serde(default)]
    pub priority: PlayerToken,
    #[serde(default = "first_round")]
    pub round: u32,
    #[serde(default)]
    pub seed: u64,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| ClashError::InvalidBoard(format!("{}: {e}", path.display())))
    }

    /// Content database and boards for this scenario
    pub fn build(&self) -> Result<(ContentDatabase, BoardSet)> {
        let content = ContentDatabase::from_file(self.content.clone());
        let boards = self.setup.build(&content)?;
        Ok((content, boards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;

    const SCENARIO: &str = r#"{
        "name": "duel",
        "content": {
            "heroes": [{"id": "squire", "health": 8, "speed": 2}],
            "effects": [{"name": "poison", "kind": "debuff", "duration": 2}]
        },
        "setup": {
            "placements": [
                {"at": "p1-1", "hero": "squire", "energy": 3, "effects": ["poison"]},
                {"at": "p2-7", "hero": "squire"}
            ]
        },
        "priority": "player2"
    }"#;

    #[test]
    fn test_scenario_builds_boards() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.round, 1);
        assert_eq!(scenario.priority, PlayerToken::Player2);

        let (_, boards) = scenario.build().unwrap();
        let seeded = boards.occupant(SlotRef::main(Side::P1, 1)).unwrap();
        assert!(seeded.initialized);
        assert_eq!(seeded.energy, 3);
        assert!(seeded.has_effect("poison"));

        let fresh = boards.occupant(SlotRef::main(Side::P2, 7)).unwrap();
        assert!(!fresh.initialized);
    }

    #[test]
    fn test_unknown_hero_is_rejected() {
        let setup = BoardSetup {
            placements: vec![Placement {
                at: SlotRef::main(Side::P1, 0),
                hero: HeroId::new("ghost"),
                health: None,
                energy: None,
                effects: Vec::new(),
                casts: Vec::new(),
            }],
        };
        let err = setup.build(&ContentDatabase::new()).unwrap_err();
        assert!(matches!(err, ClashError::UnknownHero(_)));
    }
}
