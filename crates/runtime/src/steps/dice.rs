//! Dice rolling behind a trait so sessions can be replayed deterministically.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skirmish_core::{DamagePart, DiceFormula, FormulaError, RolledDamage};

use crate::activation::RollMode;

/// Source of die results.
pub trait Dice: Send + Sync {
    /// Rolls one die with `sides` faces, returning a value in `1..=sides`.
    fn roll(&self, sides: u32) -> u32;
}

/// Pseudo-random dice; the same seed always yields the same rolls.
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(1..=sides)
    }
}

/// Replays a fixed sequence of results, then repeats `fallback`.
///
/// Results are clamped to the die being rolled.
pub struct ScriptedDice {
    queue: Mutex<VecDeque<u32>>,
    fallback: u32,
}

impl ScriptedDice {
    pub fn new(results: impl IntoIterator<Item = u32>, fallback: u32) -> Self {
        Self {
            queue: Mutex::new(results.into_iter().collect()),
            fallback,
        }
    }

    /// Appends results to the end of the script.
    pub fn push(&self, results: impl IntoIterator<Item = u32>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(results);
    }
}

impl Dice for ScriptedDice {
    fn roll(&self, sides: u32) -> u32 {
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback);
        next.clamp(1, sides.max(1))
    }
}

/// Natural d20 result under the chosen advantage state.
pub fn roll_d20(dice: &dyn Dice, mode: RollMode) -> i32 {
    let first = dice.roll(20);
    let result = match mode {
        RollMode::Normal => first,
        RollMode::Advantage => first.max(dice.roll(20)),
        RollMode::Disadvantage => first.min(dice.roll(20)),
    };
    result as i32
}

/// Rolls every part once; a critical doubles the dice but not the modifiers.
pub fn roll_parts<'a>(
    dice: &dyn Dice,
    parts: impl IntoIterator<Item = &'a DamagePart>,
    critical: bool,
) -> Result<Vec<RolledDamage>, FormulaError> {
    parts
        .into_iter()
        .map(|part| {
            let formula: DiceFormula = part.formula.parse()?;
            let formula = if critical {
                formula.doubled_dice()
            } else {
                formula
            };
            let amount = formula.evaluate(|sides| dice.roll(sides));
            Ok(RolledDamage::new(part.kind, amount.max(0)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use skirmish_core::{ApplicationType, DamageKind};

    use super::*;

    fn part(formula: &str) -> DamagePart {
        DamagePart {
            formula: formula.into(),
            kind: DamageKind::Fire,
            application: ApplicationType::Immediate,
            halved_on_save: true,
        }
    }

    #[test]
    fn seeded_dice_are_reproducible() {
        let a = SeededDice::new(7);
        let b = SeededDice::new(7);
        let left: Vec<u32> = (0..20).map(|_| a.roll(20)).collect();
        let right: Vec<u32> = (0..20).map(|_| b.roll(20)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|value| (1..=20).contains(value)));
    }

    #[test]
    fn advantage_keeps_the_higher_die() {
        let dice = ScriptedDice::new([4, 17, 12, 3], 10);
        assert_eq!(roll_d20(&dice, RollMode::Advantage), 17);
        assert_eq!(roll_d20(&dice, RollMode::Disadvantage), 3);
        assert_eq!(roll_d20(&dice, RollMode::Normal), 10);
    }

    #[test]
    fn critical_doubles_dice_only() {
        let dice = ScriptedDice::new([], 3);
        let normal = roll_parts(&dice, [&part("2d6 + 2")], false).unwrap();
        let critical = roll_parts(&dice, [&part("2d6 + 2")], true).unwrap();
        assert_eq!(normal[0].amount, 8);
        assert_eq!(critical[0].amount, 14);
    }

    #[test]
    fn invalid_formula_is_reported() {
        let dice = ScriptedDice::new([], 1);
        assert!(roll_parts(&dice, [&part("two dice")], false).is_err());
    }
}
