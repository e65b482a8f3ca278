//! Dice formulas such as `2d6 + 3`.

use core::fmt;
use core::str::FromStr;

/// One additive term of a formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiceTerm {
    Dice { count: u32, sides: u32 },
    Flat(i32),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("empty dice formula")]
    Empty,

    #[error("invalid dice term `{0}`")]
    InvalidTerm(String),

    #[error("dice term `{0}` exceeds {max} dice", max = DiceFormula::MAX_DICE)]
    TooManyDice(String),
}

/// Parsed dice formula: signed terms summed left to right.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiceFormula {
    terms: Vec<(i32, DiceTerm)>,
}

impl DiceFormula {
    pub const MAX_DICE: u32 = 100;
    pub const MAX_SIDES: u32 = 1000;

    pub fn terms(&self) -> impl Iterator<Item = (i32, DiceTerm)> + '_ {
        self.terms.iter().copied()
    }

    /// Sums the formula, asking `roll_die(sides)` for every die.
    pub fn evaluate(&self, mut roll_die: impl FnMut(u32) -> u32) -> i32 {
        self.terms
            .iter()
            .map(|(sign, term)| {
                let value = match *term {
                    DiceTerm::Dice { count, sides } => (0..count)
                        .map(|_| i64::from(roll_die(sides).clamp(1, sides)))
                        .sum::<i64>(),
                    DiceTerm::Flat(value) => i64::from(value),
                };
                i64::from(*sign) * value
            })
            .sum::<i64>()
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Same formula with every dice count doubled (critical hits).
    pub fn doubled_dice(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(sign, term)| match *term {
                DiceTerm::Dice { count, sides } => (
                    *sign,
                    DiceTerm::Dice {
                        count: count * 2,
                        sides,
                    },
                ),
                flat => (*sign, flat),
            })
            .collect();
        Self { terms }
    }

    fn parse_term(raw: &str) -> Result<DiceTerm, FormulaError> {
        let invalid = || FormulaError::InvalidTerm(raw.to_string());
        match raw.split_once(['d', 'D']) {
            Some((count, sides)) => {
                let count = if count.is_empty() {
                    1
                } else {
                    count.parse::<u32>().map_err(|_| invalid())?
                };
                let sides = sides.parse::<u32>().map_err(|_| invalid())?;
                if count == 0 || sides == 0 || sides > Self::MAX_SIDES {
                    return Err(invalid());
                }
                if count > Self::MAX_DICE {
                    return Err(FormulaError::TooManyDice(raw.to_string()));
                }
                Ok(DiceTerm::Dice { count, sides })
            }
            None => raw.parse::<i32>().map(DiceTerm::Flat).map_err(|_| invalid()),
        }
    }
}

impl FromStr for DiceFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut terms = Vec::new();
        let mut sign = 1;
        let mut current = String::new();
        for c in compact.chars() {
            match c {
                '+' | '-' => {
                    if !current.is_empty() {
                        terms.push((sign, Self::parse_term(&current)?));
                        current.clear();
                    } else if !terms.is_empty() {
                        return Err(FormulaError::InvalidTerm(compact.clone()));
                    }
                    sign = if c == '-' { -1 } else { 1 };
                }
                _ => current.push(c),
            }
        }
        if current.is_empty() {
            return Err(FormulaError::InvalidTerm(compact));
        }
        terms.push((sign, Self::parse_term(&current)?));

        Ok(Self { terms })
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (sign, term)) in self.terms.iter().enumerate() {
            match (index, *sign < 0) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            match term {
                DiceTerm::Dice { count, sides } => write!(f, "{count}d{sides}")?,
                DiceTerm::Flat(value) => write!(f, "{value}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dice_and_modifiers() {
        let formula: DiceFormula = "2d6 + d4 - 1".parse().unwrap();
        assert_eq!(
            formula.terms().collect::<Vec<_>>(),
            vec![
                (1, DiceTerm::Dice { count: 2, sides: 6 }),
                (1, DiceTerm::Dice { count: 1, sides: 4 }),
                (-1, DiceTerm::Flat(1)),
            ]
        );
        assert_eq!(formula.to_string(), "2d6 + 1d4 - 1");
    }

    #[test]
    fn evaluates_with_supplied_dice() {
        let formula: DiceFormula = "2d6 + 3".parse().unwrap();
        assert_eq!(formula.evaluate(|sides| sides), 15);
        assert_eq!(formula.evaluate(|_| 1), 5);
        assert_eq!(formula.doubled_dice().evaluate(|_| 1), 7);
    }

    #[test]
    fn rejects_malformed_formulas() {
        assert_eq!("".parse::<DiceFormula>(), Err(FormulaError::Empty));
        assert!("2d".parse::<DiceFormula>().is_err());
        assert!("3 +".parse::<DiceFormula>().is_err());
        assert!("1d6 ++ 2".parse::<DiceFormula>().is_err());
        assert!(matches!(
            "500d6".parse::<DiceFormula>(),
            Err(FormulaError::TooManyDice(_))
        ));
    }
}
