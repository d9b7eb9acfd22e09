//! Runtime spell payloads
//!
//! A payload is a spell spec bound to a caster and the current boards: the
//! concrete targets, what happens to each one, and the post-effects that run
//! afterwards. Building a payload never fails; an unknown spell or a spell
//! that finds nothing to hit yields an empty (no-op) payload.

use crate::board::{BoardSet, Occupant};
use crate::core::{
    CastSpell, EffectName, Formula, PostEffect, Relative, ScriptKind, SlotRef, SpellAction,
    SpellId, SpellSpec, TargetDescriptor,
};
use crate::game::stats::{formula_owner, stat_value};
use crate::game::targeting::{resolve_targets, Targets};
use crate::loader::ContentSource;
use serde::{Deserialize, Serialize};

/// Resolved action on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadAction {
    Damage,
    Heal,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub target: SlotRef,
    pub action: PayloadAction,
    pub magnitude: i32,
    pub effects: Vec<EffectName>,
    /// Post-effects scoped to this target only
    pub post: Vec<PostEffect>,
    /// The descriptor named this tile explicitly, so a corpse still counts
    #[serde(default)]
    pub allow_dead: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpellPayload {
    pub caster: SlotRef,
    pub spell: CastSpell,
    pub targets: Targets,
    pub entries: Vec<PayloadEntry>,
    pub post: Vec<PostEffect>,
}

impl RuntimeSpellPayload {
    pub fn noop(caster: SlotRef, spell: CastSpell) -> Self {
        RuntimeSpellPayload {
            caster,
            spell,
            targets: Targets::new(),
            entries: Vec::new(),
            post: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The last cast resolved this round, for copy-style spells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastRecord {
    pub caster: SlotRef,
    pub spell: CastSpell,
}

pub struct PayloadContext<'a> {
    pub content: &'a dyn ContentSource,
    pub last_cast: Option<&'a CastRecord>,
}

fn evaluate(formula: &Formula, caster: &Occupant, target: Option<&Occupant>) -> i32 {
    let value = match *formula {
        Formula::Fixed(n) => n,
        Formula::Attack { plus } => caster.hero.attack + plus,
        Formula::SpellPower { plus } => caster.spell_power + plus,
        Formula::Stat {
            stat,
            of,
            multiplier,
            plus,
        } => formula_owner(of, caster, target)
            .map(|o| stat_value(o, stat) * multiplier + plus)
            .unwrap_or(0),
    };
    value.max(0)
}

fn entry_for(
    action: &SpellAction,
    target: SlotRef,
    caster: &Occupant,
    boards: &BoardSet,
) -> (PayloadAction, i32) {
    let target_occupant = boards.occupant(target);
    match action {
        SpellAction::Damage(f) => (
            PayloadAction::Damage,
            evaluate(f, caster, target_occupant),
        ),
        SpellAction::Heal(f) => (PayloadAction::Heal, evaluate(f, caster, target_occupant)),
        SpellAction::None => (PayloadAction::None, 0),
    }
}

/// Build the payload for a spell spec
pub fn build_from_spec(
    spec: &SpellSpec,
    caster: SlotRef,
    boards: &BoardSet,
    ctx: &PayloadContext<'_>,
) -> RuntimeSpellPayload {
    let spell = CastSpell::Spell(spec.id.clone());
    let Some(caster_occupant) = boards.occupant(caster) else {
        return RuntimeSpellPayload::noop(caster, spell);
    };

    let descriptor = match spec.script {
        Some(ScriptKind::MirrorRow) => TargetDescriptor::Row {
            side: Relative::Enemy,
            row: caster.row(),
        },
        Some(ScriptKind::CopyLastEnemyCast) => {
            return copy_last_enemy_cast(spell, caster, boards, ctx)
        }
        None => spec.target.clone(),
    };

    let targets = resolve_targets(&descriptor, caster, boards);
    if targets.is_empty() {
        return RuntimeSpellPayload::noop(caster, spell);
    }
    let allow_dead = matches!(
        descriptor,
        TargetDescriptor::DeadAllies | TargetDescriptor::Concrete(_)
    );

    let entries = targets
        .iter()
        .enumerate()
        .map(|(n, &target)| match spec.overrides.iter().find(|o| o.index == n) {
            Some(over) => {
                let (action, magnitude) = entry_for(&over.action, target, caster_occupant, boards);
                PayloadEntry {
                    target,
                    action,
                    magnitude,
                    effects: over.effects.clone(),
                    post: over.post.clone(),
                    allow_dead,
                }
            }
            None => {
                let (action, magnitude) = entry_for(&spec.action, target, caster_occupant, boards);
                PayloadEntry {
                    target,
                    action,
                    magnitude,
                    effects: spec.effects.clone(),
                    post: Vec::new(),
                    allow_dead,
                }
            }
        })
        .collect();

    RuntimeSpellPayload {
        caster,
        spell,
        targets,
        entries,
        post: spec.post.clone(),
    }
}

fn copy_last_enemy_cast(
    spell: CastSpell,
    caster: SlotRef,
    boards: &BoardSet,
    ctx: &PayloadContext<'_>,
) -> RuntimeSpellPayload {
    let Some(last) = ctx.last_cast.filter(|l| l.caster.side() != caster.side()) else {
        return RuntimeSpellPayload::noop(caster, spell);
    };

    // The copied spell sees no prior cast, so a copy of a copy fizzles
    let inner = PayloadContext {
        content: ctx.content,
        last_cast: None,
    };
    build_payload(&last.spell, caster, boards, &inner)
}

/// Basic attack: the caster's attack stat against the front-most enemy in lane
pub fn basic_attack_payload(caster: SlotRef, boards: &BoardSet) -> RuntimeSpellPayload {
    let spell = CastSpell::BasicAttack;
    let Some(occupant) = boards.occupant(caster) else {
        return RuntimeSpellPayload::noop(caster, spell);
    };
    let descriptor = TargetDescriptor::Projectile {
        side: Relative::Enemy,
    };
    let targets = resolve_targets(&descriptor, caster, boards);
    let magnitude = occupant.hero.attack.max(0);
    let entries = targets
        .iter()
        .map(|&target| PayloadEntry {
            target,
            action: PayloadAction::Damage,
            magnitude,
            effects: Vec::new(),
            post: Vec::new(),
            allow_dead: false,
        })
        .collect();

    RuntimeSpellPayload {
        caster,
        spell,
        targets,
        entries,
        post: Vec::new(),
    }
}

/// Build the payload for any cast
pub fn build_payload(
    spell: &CastSpell,
    caster: SlotRef,
    boards: &BoardSet,
    ctx: &PayloadContext<'_>,
) -> RuntimeSpellPayload {
    match spell {
        CastSpell::BasicAttack => basic_attack_payload(caster, boards),
        CastSpell::Spell(id) => match ctx.content.spell(id) {
            Some(spec) => build_from_spec(spec, caster, boards, ctx),
            None => RuntimeSpellPayload::noop(caster, spell.clone()),
        },
    }
}

/// Convenience for scripted casts that always name a spell id
pub fn build_spell_payload(
    spell: &SpellId,
    caster: SlotRef,
    boards: &BoardSet,
    ctx: &PayloadContext<'_>,
) -> RuntimeSpellPayload {
    build_payload(&CastSpell::Spell(spell.clone()), caster, boards, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FormulaSource, Hero, Row, Side, StatKind, TargetOverride};
    use crate::loader::ContentDatabase;

    fn boards() -> BoardSet {
        let mut boards = BoardSet::new();
        let mut mage = Hero::new("mage", 10, 2);
        mage.spell_power = 3;
        mage.attack = 2;
        boards.p1.place(3, mage);
        boards.p2.place(8, Hero::new("dummy", 10, 1));
        boards.p2.place(7, Hero::new("dummy", 10, 1));
        for slot in BoardSet::all_slots() {
            if let Some(o) = boards.occupant_mut(slot) {
                o.ensure_runtime();
            }
        }
        boards
    }

    fn content() -> ContentDatabase {
        let mut db = ContentDatabase::new();
        db.add_spell(SpellSpec::new(
            "firebolt",
            TargetDescriptor::Projectile {
                side: Relative::Enemy,
            },
            SpellAction::Damage(Formula::SpellPower { plus: 1 }),
        ));
        db.add_spell(
            SpellSpec::new(
                "mirror",
                TargetDescriptor::SelfCast,
                SpellAction::Damage(Formula::Fixed(2)),
            )
            .with_script(ScriptKind::MirrorRow),
        );
        db.add_spell(
            SpellSpec::new("mimic", TargetDescriptor::SelfCast, SpellAction::None)
                .with_script(ScriptKind::CopyLastEnemyCast),
        );
        db
    }

    #[test]
    fn test_formula_per_target() {
        let db = content();
        let ctx = PayloadContext {
            content: &db,
            last_cast: None,
        };
        let caster = SlotRef::main(Side::P1, 3);
        let payload =
            build_spell_payload(&SpellId::new("firebolt"), caster, &boards(), &ctx);
        // Lane 0 on P2 is 8, 5, 2
        assert_eq!(payload.targets.as_slice(), &[SlotRef::main(Side::P2, 8)]);
        assert_eq!(payload.entries[0].action, PayloadAction::Damage);
        assert_eq!(payload.entries[0].magnitude, 4);
    }

    #[test]
    fn test_unknown_spell_is_noop() {
        let db = content();
        let ctx = PayloadContext {
            content: &db,
            last_cast: None,
        };
        let payload = build_spell_payload(
            &SpellId::new("meteor"),
            SlotRef::main(Side::P1, 3),
            &boards(),
            &ctx,
        );
        assert!(payload.is_noop());
    }

    #[test]
    fn test_mirror_row_targets_caster_row() {
        let db = content();
        let ctx = PayloadContext {
            content: &db,
            last_cast: None,
        };
        // p1-3 stands in the middle row; P2's middle row is 3..6
        let mut boards = boards();
        boards.p2.place(4, Hero::new("dummy", 10, 1));
        let payload = build_spell_payload(
            &SpellId::new("mirror"),
            SlotRef::main(Side::P1, 3),
            &boards,
            &ctx,
        );
        assert_eq!(payload.targets.as_slice(), &[SlotRef::main(Side::P2, 4)]);
        assert_eq!(SlotRef::main(Side::P2, 4).row(), Row::Middle);
    }

    #[test]
    fn test_copy_last_enemy_cast_rules() {
        let db = content();
        let boards = boards();
        let caster = SlotRef::main(Side::P1, 3);
        let mimic = SpellId::new("mimic");

        let none = PayloadContext {
            content: &db,
            last_cast: None,
        };
        assert!(build_spell_payload(&mimic, caster, &boards, &none).is_noop());

        let ally = CastRecord {
            caster: SlotRef::main(Side::P1, 0),
            spell: CastSpell::Spell(SpellId::new("firebolt")),
        };
        let from_ally = PayloadContext {
            content: &db,
            last_cast: Some(&ally),
        };
        assert!(build_spell_payload(&mimic, caster, &boards, &from_ally).is_noop());

        let enemy = CastRecord {
            caster: SlotRef::main(Side::P2, 8),
            spell: CastSpell::Spell(SpellId::new("firebolt")),
        };
        let from_enemy = PayloadContext {
            content: &db,
            last_cast: Some(&enemy),
        };
        let copied = build_spell_payload(&mimic, caster, &boards, &from_enemy);
        assert_eq!(copied.spell, CastSpell::Spell(SpellId::new("firebolt")));
        assert_eq!(copied.targets.as_slice(), &[SlotRef::main(Side::P2, 8)]);
    }

    #[test]
    fn test_override_replaces_action_for_one_target() {
        let mut db = ContentDatabase::new();
        let mut spell = SpellSpec::new(
            "sweep",
            TargetDescriptor::Row {
                side: Relative::Enemy,
                row: Row::Front,
            },
            SpellAction::Damage(Formula::Fixed(1)),
        );
        spell.overrides.push(TargetOverride {
            index: 1,
            action: SpellAction::Damage(Formula::Stat {
                stat: StatKind::Health,
                of: FormulaSource::Target,
                multiplier: 1,
                plus: 0,
            }),
            effects: Vec::new(),
            post: vec![PostEffect::MoveRowBack],
        });
        db.add_spell(spell);

        let ctx = PayloadContext {
            content: &db,
            last_cast: None,
        };
        let payload = build_spell_payload(
            &SpellId::new("sweep"),
            SlotRef::main(Side::P1, 3),
            &boards(),
            &ctx,
        );
        assert_eq!(payload.entries.len(), 2);
        assert_eq!(payload.entries[0].magnitude, 1);
        assert_eq!(payload.entries[1].magnitude, 10);
        assert_eq!(payload.entries[1].post, vec![PostEffect::MoveRowBack]);
    }

    #[test]
    fn test_basic_attack_uses_attack_stat() {
        let payload = basic_attack_payload(SlotRef::main(Side::P1, 3), &boards());
        assert_eq!(payload.entries[0].magnitude, 2);
        assert_eq!(payload.targets.as_slice(), &[SlotRef::main(Side::P2, 8)]);
        assert!(!payload.entries[0].allow_dead);
    }

    #[test]
    fn test_dead_allies_entries_allow_corpses() {
        let mut db = ContentDatabase::new();
        db.add_spell(
            SpellSpec::new("feast", TargetDescriptor::DeadAllies, SpellAction::None)
                .with_post(PostEffect::ConsumeCorpse),
        );
        let ctx = PayloadContext {
            content: &db,
            last_cast: None,
        };
        let mut boards = boards();
        boards.p1.place(1, Hero::new("fallen", 4, 1));
        let corpse = SlotRef::main(Side::P1, 1);
        if let Some(o) = boards.occupant_mut(corpse) {
            o.ensure_runtime();
            o.mark_dead();
        }

        let payload = build_spell_payload(
            &SpellId::new("feast"),
            SlotRef::main(Side::P1, 3),
            &boards,
            &ctx,
        );
        assert_eq!(payload.targets.as_slice(), &[corpse]);
        assert!(payload.entries[0].allow_dead);
        assert_eq!(payload.post, vec![PostEffect::ConsumeCorpse]);
    }
}
