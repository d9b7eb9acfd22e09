//! Visual steps emitted to the renderer
//!
//! Every discrete state change produces a `RoundStep`: an independent copy of
//! the four boards, the priority player at that moment and a tagged
//! description of what just happened. Steps own their data, so a renderer can
//! hold on to them while the round keeps mutating its own boards.

use crate::board::BoardSet;
use crate::core::{CastSpell, EffectName, PlayerToken, PulseKind, QueueId, SlotRef, Winner};
use crate::game::round::RoundPhase;
use serde::{Deserialize, Serialize};

/// What happened right before a step was emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LastAction {
    Phase {
        phase: RoundPhase,
    },
    Pulse {
        target: SlotRef,
        effect: EffectName,
        kind: PulseKind,
        amount: i32,
    },
    /// Emitted before main-board energy is incremented
    EnergyGain,
    EnergyGranted {
        target: SlotRef,
        amount: i32,
    },
    PassiveTriggered {
        owner: SlotRef,
        passive: String,
    },
    EffectApplied {
        target: SlotRef,
        effect: EffectName,
    },
    CastStart {
        caster: SlotRef,
        spell: CastSpell,
        queue_id: QueueId,
    },
    CastResolved {
        caster: SlotRef,
        spell: CastSpell,
        targets: Vec<SlotRef>,
    },
    Moved {
        from: SlotRef,
        to: SlotRef,
    },
    Revived {
        target: SlotRef,
    },
    Death {
        target: SlotRef,
    },
    CorpseConsumed {
        target: SlotRef,
    },
    EffectsDecayed,
    RoundEnd {
        winner: Option<Winner>,
    },
}

/// A deep copy of the round at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStep {
    pub boards: BoardSet,
    pub priority: PlayerToken,
    pub last_action: LastAction,
}

/// Receives every step, synchronously and in order
pub type StepCallback = Box<dyn FnMut(RoundStep) + Send>;

/// Collects steps into a shared buffer; handy for tests and the CLI
pub fn recording_callback(
    buffer: std::sync::Arc<std::sync::Mutex<Vec<RoundStep>>>,
) -> StepCallback {
    Box::new(move |step| {
        if let Ok(mut steps) = buffer.lock() {
            steps.push(step);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_step_json_is_tagged() {
        let step = RoundStep {
            boards: BoardSet::new(),
            priority: PlayerToken::Player1,
            last_action: LastAction::Death {
                target: SlotRef::main(Side::P2, 4),
            },
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["last_action"]["type"], "death");
        assert_eq!(json["last_action"]["target"], "p2-4");

        let back: RoundStep = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_recording_callback_keeps_order() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut callback = recording_callback(Arc::clone(&buffer));
        for action in [LastAction::EnergyGain, LastAction::EffectsDecayed] {
            callback(RoundStep {
                boards: BoardSet::new(),
                priority: PlayerToken::Player2,
                last_action: action,
            });
        }
        let steps = buffer.lock().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].last_action, LastAction::EffectsDecayed);
    }
}
