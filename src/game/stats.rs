//! Derived stat recomputation

use crate::board::Occupant;
use crate::core::{FormulaSource, StatKind};

/// Rebuild armor, speed and spell power from base stats plus active effects
///
/// Health and energy are resources, not derived stats: they are only clamped.
pub fn recompute_stats(occupant: &mut Occupant) {
    let (armor, speed, spell_power) = occupant.effects.iter().fold((0, 0, 0), |acc, e| {
        (
            acc.0 + e.modifiers.armor,
            acc.1 + e.modifiers.speed,
            acc.2 + e.modifiers.spell_power,
        )
    });

    occupant.armor = (occupant.hero.armor + armor).max(0);
    occupant.speed = (occupant.hero.speed + speed).max(0);
    occupant.spell_power = occupant.hero.spell_power + spell_power;
    occupant.energy = occupant.energy.max(0);
    occupant.clamp_health();
}

/// Read a stat for formula evaluation
pub fn stat_value(occupant: &Occupant, stat: StatKind) -> i32 {
    match stat {
        StatKind::Health => occupant.health,
        StatKind::Energy => occupant.energy,
        StatKind::Armor => occupant.armor,
        StatKind::Speed => occupant.speed,
        StatKind::SpellPower => occupant.spell_power,
        StatKind::Attack => occupant.hero.attack,
    }
}

/// Pick the formula's stat owner
pub fn formula_owner<'a>(
    source: FormulaSource,
    caster: &'a Occupant,
    target: Option<&'a Occupant>,
) -> Option<&'a Occupant> {
    match source {
        FormulaSource::Caster => Some(caster),
        FormulaSource::Target => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Effect, EffectKind, Hero, StatModifiers};

    #[test]
    fn test_effects_modify_stats() {
        let mut hero = Hero::new("guard", 12, 3);
        hero.armor = 2;
        let mut occupant = Occupant::new(hero);
        occupant.ensure_runtime();

        let mut slow = Effect::new("slow", EffectKind::Debuff);
        slow.modifiers = StatModifiers {
            armor: 0,
            speed: -5,
            spell_power: 0,
        };
        let mut shield = Effect::new("shield", EffectKind::Buff);
        shield.modifiers.armor = 3;
        occupant.effects.push(slow);
        occupant.effects.push(shield);

        recompute_stats(&mut occupant);
        assert_eq!(occupant.armor, 5);
        assert_eq!(occupant.speed, 0);

        occupant.effects.clear();
        recompute_stats(&mut occupant);
        assert_eq!(occupant.armor, 2);
        assert_eq!(occupant.speed, 3);
    }
}
