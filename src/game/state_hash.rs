//! Deterministic board hashing
//!
//! Serializes the four boards to JSON, drops per-round scratch fields and
//! hashes what is left. Two board sets that will play out the same produce
//! the same hash, which makes it easy to spot where two runs diverge.

use crate::board::BoardSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fields that never influence how a future round resolves
///
/// - last_autocast_energy: cleared at the start of every round
/// - name: display-only hero name
const EXCLUDED_FIELDS: &[&str] = &["last_autocast_energy", "name"];

/// Hash of the gameplay-relevant board state
pub fn compute_board_hash(boards: &BoardSet) -> u64 {
    let json_value = match serde_json::to_value(boards) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: Failed to serialize boards for hashing: {}", e);
            return 0;
        }
    };

    let cleaned = strip_metadata(json_value);

    let canonical = match serde_json::to_string(&cleaned) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to canonicalize cleaned boards: {}", e);
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn strip_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(k, _)| !EXCLUDED_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k, strip_metadata(v)))
                .collect(),
        ),
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(strip_metadata).collect())
        }
        other => other,
    }
}

/// Format a hash for display (shows first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Hero, Side, SlotRef};

    #[test]
    fn test_strip_metadata() {
        let json = serde_json::json!({
            "health": 5,
            "last_autocast_energy": 3,
            "hero": {
                "id": "squire",
                "name": "Squire"
            }
        });

        assert_eq!(
            strip_metadata(json),
            serde_json::json!({
                "health": 5,
                "hero": {
                    "id": "squire"
                }
            })
        );
    }

    #[test]
    fn test_scratch_fields_do_not_change_hash() {
        let mut boards = BoardSet::new();
        boards.p1.place(2, Hero::new("squire", 8, 2));
        let before = compute_board_hash(&boards);

        let slot = SlotRef::main(Side::P1, 2);
        boards.occupant_mut(slot).unwrap().last_autocast_energy = Some(4);
        assert_eq!(compute_board_hash(&boards), before);

        boards.occupant_mut(slot).unwrap().energy = 4;
        assert_ne!(compute_board_hash(&boards), before);
    }

    #[test]
    fn test_format_hash_is_eight_digits() {
        assert_eq!(format_hash(0xdead_beef_0000_0001), "deadbeef");
        assert_eq!(format_hash(0).len(), 8);
    }
}
