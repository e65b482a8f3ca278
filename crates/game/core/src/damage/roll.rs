//! Converting rolled damage into per-target points.

use super::{DamageKind, DamagePoints};
use crate::state::DamageTraits;

/// One rolled damage part as reported by the host's dice roller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RolledDamage {
    pub kind: DamageKind,
    pub amount: i32,
}

impl RolledDamage {
    pub const fn new(kind: DamageKind, amount: i32) -> Self {
        Self { kind, amount }
    }

    /// Half damage, rounded down.
    pub const fn halved(self) -> Self {
        Self {
            kind: self.kind,
            amount: self.amount / 2,
        }
    }
}

/// Totals rolled parts against a target's immunities, resistances and
/// vulnerabilities.
pub fn points_against(rolls: &[RolledDamage], traits: &DamageTraits) -> DamagePoints {
    let mut points = DamagePoints::default();

    for roll in rolls {
        let amount = roll.amount.max(0);
        match roll.kind {
            DamageKind::Healing => points.healing = points.healing.saturating_add(amount),
            DamageKind::TempHp => points.temphp = points.temphp.max(amount),
            kind if traits.immunities.contains(&kind) => points.di = points.di.saturating_add(amount),
            kind if traits.resistances.contains(&kind) => {
                let taken = amount / 2;
                points.dr = points.dr.saturating_add(amount - taken);
                points.damage = points.damage.saturating_add(taken);
            }
            kind if traits.vulnerabilities.contains(&kind) => {
                points.dv = points.dv.saturating_add(amount);
                points.damage = points.damage.saturating_add(amount.saturating_mul(2));
            }
            _ => points.damage = points.damage.saturating_add(amount),
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_adjust_damage_and_record_the_difference() {
        let mut traits = DamageTraits::default();
        traits.immunities.insert(DamageKind::Poison);
        traits.resistances.insert(DamageKind::Fire);
        traits.vulnerabilities.insert(DamageKind::Cold);

        let points = points_against(
            &[
                RolledDamage::new(DamageKind::Poison, 6),
                RolledDamage::new(DamageKind::Fire, 7),
                RolledDamage::new(DamageKind::Cold, 4),
                RolledDamage::new(DamageKind::Slashing, 5),
            ],
            &traits,
        );

        assert_eq!(points.di, 6);
        assert_eq!(points.dr, 4);
        assert_eq!(points.dv, 4);
        assert_eq!(points.damage, 3 + 8 + 5);
    }

    #[test]
    fn temp_hp_does_not_stack() {
        let points = points_against(
            &[
                RolledDamage::new(DamageKind::TempHp, 5),
                RolledDamage::new(DamageKind::TempHp, 3),
                RolledDamage::new(DamageKind::Healing, 2),
            ],
            &DamageTraits::default(),
        );
        assert_eq!(points.temphp, 5);
        assert_eq!(points.healing, 2);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let mut traits = DamageTraits::default();
        traits.vulnerabilities.insert(DamageKind::Cold);

        let points = points_against(
            &[
                RolledDamage::new(DamageKind::Cold, i32::MAX),
                RolledDamage::new(DamageKind::Fire, i32::MAX),
                RolledDamage::new(DamageKind::Healing, i32::MAX),
                RolledDamage::new(DamageKind::Healing, 5),
            ],
            &traits,
        );
        assert_eq!(points.damage, i32::MAX);
        assert_eq!(points.dv, i32::MAX);
        assert_eq!(points.healing, i32::MAX);
    }
}
