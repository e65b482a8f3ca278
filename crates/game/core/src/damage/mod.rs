//! Damage resolver: pure HP arithmetic with an undo-capable record.
//!
//! A [`DamageEntry`] is computed once from an actor's HP state and a set of
//! [`DamagePoints`]. Applying it writes the "after" pair; undoing it writes
//! the "before" pair back. Both directions carry the same signed delta so HP
//! change listeners see symmetric notifications.

mod formula;
mod roll;

pub use formula::{DiceFormula, DiceTerm, FormulaError};
pub use roll::{RolledDamage, points_against};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::state::HitPoints;

/// Damage (and restoration) kinds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DamageKind {
    Acid,
    Bludgeoning,
    Cold,
    Fire,
    Force,
    Lightning,
    Necrotic,
    Piercing,
    Poison,
    Psychic,
    Radiant,
    Slashing,
    Thunder,
    Healing,
    #[strum(serialize = "temphp")]
    #[cfg_attr(feature = "serde", serde(rename = "temphp"))]
    TempHp,
}

impl DamageKind {
    /// Kinds that restore rather than remove hit points.
    pub fn is_restorative(self) -> bool {
        matches!(self, Self::Healing | Self::TempHp)
    }
}

/// Point totals for one target. Missing fields count as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamagePoints {
    pub damage: i32,
    pub healing: i32,
    pub temphp: i32,
    /// Damage ignored through immunity.
    pub di: i32,
    /// Damage prevented through resistance.
    pub dr: i32,
    /// Damage added through vulnerability.
    pub dv: i32,
}

impl DamagePoints {
    pub const fn damage(amount: i32) -> Self {
        Self {
            damage: amount,
            healing: 0,
            temphp: 0,
            di: 0,
            dr: 0,
            dv: 0,
        }
    }

    pub const fn healing(amount: i32) -> Self {
        Self {
            damage: 0,
            healing: amount,
            temphp: 0,
            di: 0,
            dr: 0,
            dv: 0,
        }
    }

    pub const fn temphp(amount: i32) -> Self {
        Self {
            damage: 0,
            healing: 0,
            temphp: amount,
            di: 0,
            dr: 0,
            dv: 0,
        }
    }
}

/// Before/after HP record for one target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DamageEntry {
    pub hp: i32,
    pub temp_hp: i32,
    pub new_hp: i32,
    pub new_temp_hp: i32,
    pub hp_dmg: i32,
    pub temp_hp_dmg: i32,
    pub hp_heal: i32,
    pub temp_hp_raise: i32,
    pub di: i32,
    pub dr: i32,
    pub dv: i32,
}

/// HP write produced by applying or undoing an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpChange {
    pub value: i32,
    pub temp: i32,
    /// Signed net change; negative when hit points were lost.
    pub dhp: i32,
}

/// Resolves `points` against the actor's current HP.
///
/// Temporary HP absorbs damage first, damage cannot push HP below zero before
/// healing is added, and healing cannot exceed the effective maximum.
pub fn compute_damage_entry(hp: &HitPoints, points: &DamagePoints) -> DamageEntry {
    let damage = i64::from(points.damage);
    let healing = i64::from(points.healing);
    let temp_received = i64::from(points.temphp);

    let current = i64::from(hp.value);
    let temp = i64::from(hp.temp.max(0));
    let effective_max = i64::from(hp.effective_max());

    let new_temp = 0.max(temp - damage).max(temp_received);
    let absorbed = 0.max((current + temp - damage).min(current));
    let new_hp = (absorbed + healing).min(effective_max).clamp(0, effective_max);

    let narrow = |value: i64| value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

    DamageEntry {
        hp: hp.value,
        temp_hp: narrow(temp),
        new_hp: narrow(new_hp),
        new_temp_hp: narrow(new_temp),
        hp_dmg: narrow((current - new_hp).max(0)),
        temp_hp_dmg: narrow((temp - new_temp).max(0)),
        hp_heal: narrow((new_hp - current).max(0)),
        temp_hp_raise: narrow((new_temp - temp).max(0)),
        di: points.di,
        dr: points.dr,
        dv: points.dv,
    }
}

impl DamageEntry {
    /// Net hit points lost (positive) or gained (negative) when applied.
    fn net_loss(&self) -> i32 {
        let lost = self.hp_dmg.saturating_add(self.temp_hp_dmg);
        if lost > 0 {
            lost
        } else {
            self.hp_heal.saturating_add(self.temp_hp_raise).saturating_neg()
        }
    }

    /// Write that debits the entry.
    pub fn applied(&self) -> HpChange {
        HpChange {
            value: self.new_hp,
            temp: self.new_temp_hp,
            dhp: self.net_loss().saturating_neg(),
        }
    }

    /// Write that credits the same deltas back.
    pub fn undone(&self) -> HpChange {
        HpChange {
            value: self.hp,
            temp: self.temp_hp,
            dhp: self.net_loss(),
        }
    }
}

impl HpChange {
    pub fn write_to(&self, hp: &mut HitPoints) {
        hp.value = self.value;
        hp.temp = self.temp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp(value: i32, max: i32, temp: i32) -> HitPoints {
        HitPoints::new(value, max).with_temp(temp)
    }

    #[test]
    fn temp_hp_absorbs_damage_first() {
        let entry = compute_damage_entry(&hp(10, 10, 5), &DamagePoints::damage(12));

        assert_eq!(entry.new_temp_hp, 0);
        assert_eq!(entry.new_hp, 3);
        assert_eq!(entry.hp_dmg, 7);
        assert_eq!(entry.temp_hp_dmg, 5);
        assert_eq!(entry.applied().dhp, -12);
    }

    #[test]
    fn undo_restores_original_pool() {
        let mut pool = hp(10, 10, 5);
        let entry = compute_damage_entry(&pool, &DamagePoints::damage(12));

        entry.applied().write_to(&mut pool);
        assert_eq!((pool.value, pool.temp), (3, 0));

        let undo = entry.undone();
        undo.write_to(&mut pool);
        assert_eq!((pool.value, pool.temp), (10, 5));
        assert_eq!(undo.dhp, 12);
    }

    #[test]
    fn healing_is_clamped_to_effective_max() {
        let entry = compute_damage_entry(&hp(4, 10, 0), &DamagePoints::healing(20));
        assert_eq!(entry.new_hp, 10);
        assert_eq!(entry.hp_heal, 6);
        assert_eq!(entry.applied().dhp, 6);
    }

    #[test]
    fn temporary_max_raises_the_healing_ceiling() {
        let mut pool = hp(4, 10, 0);
        pool.temp_max = 5;
        let entry = compute_damage_entry(&pool, &DamagePoints::healing(20));
        assert_eq!(entry.new_hp, 15);
    }

    #[test]
    fn received_temp_hp_is_a_floor() {
        let entry = compute_damage_entry(&hp(10, 10, 2), &DamagePoints::temphp(8));
        assert_eq!(entry.new_temp_hp, 8);
        assert_eq!(entry.temp_hp_raise, 6);

        let weaker = compute_damage_entry(&hp(10, 10, 9), &DamagePoints::temphp(4));
        assert_eq!(weaker.new_temp_hp, 9);
    }

    #[test]
    fn overkill_bottoms_out_at_zero() {
        let entry = compute_damage_entry(&hp(3, 10, 0), &DamagePoints::damage(50));
        assert_eq!(entry.new_hp, 0);
        assert_eq!(entry.hp_dmg, 3);
    }

    #[test]
    fn net_change_saturates_for_stored_extremes() {
        let lost = DamageEntry {
            hp_dmg: i32::MAX,
            temp_hp_dmg: i32::MAX,
            ..DamageEntry::default()
        };
        assert_eq!(lost.applied().dhp, -i32::MAX);
        assert_eq!(lost.undone().dhp, i32::MAX);

        let healed = DamageEntry {
            hp_heal: i32::MAX,
            temp_hp_raise: i32::MAX,
            ..DamageEntry::default()
        };
        assert_eq!(healed.applied().dhp, i32::MAX);
        assert_eq!(healed.undone().dhp, -i32::MAX);
    }

    #[test]
    fn bounds_hold_across_input_grid() {
        for value in [0, 1, 5, 10, 12] {
            for temp in [0, 3, 20] {
                for temp_max in [-4, 0, 6] {
                    for points in [
                        DamagePoints::damage(0),
                        DamagePoints::damage(7),
                        DamagePoints::damage(40),
                        DamagePoints::damage(-5),
                        DamagePoints::healing(9),
                        DamagePoints {
                            damage: 15,
                            healing: 4,
                            temphp: 6,
                            ..DamagePoints::default()
                        },
                    ] {
                        let mut pool = hp(value, 10, temp);
                        pool.temp_max = temp_max;
                        let entry = compute_damage_entry(&pool, &points);
                        let max = pool.effective_max();

                        assert!((0..=max).contains(&entry.new_hp), "{entry:?}");
                        assert!(entry.new_temp_hp >= 0);
                        assert!(entry.new_temp_hp >= points.temphp);

                        let before = pool;
                        entry.applied().write_to(&mut pool);
                        entry.undone().write_to(&mut pool);
                        assert_eq!((pool.value, pool.temp), (before.value, before.temp));
                    }
                }
            }
        }
    }
}
