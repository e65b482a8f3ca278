//! Plan vocabulary: step identifiers, step arguments and the flat plan.

use core::fmt;
use core::str::FromStr;

use sha2::{Digest, Sha256};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Steps the runtime ships an executor for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum BuiltinStep {
    ApplyConcentration,
    ApplyDamage,
    ApplyDefaultTargets,
    ApplyDefaultTargetsAsEffective,
    ApplyDurationEffect,
    ApplyEffects,
    ApplySelectedTargets,
    ConfirmTargets,
    EndEffect,
    EndEffectOnSave,
    PerformAttackRoll,
    PerformAttackDamageRoll,
    PerformSaveDamageRoll,
    PerformSavingThrow,
    TriggerAction,
    AttackCompleted,
    PlaceTemplate,
}

/// Name of a plan step: a built-in, or anything a flow registered itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", from = "String"))]
pub enum StepName {
    Builtin(BuiltinStep),
    Custom(String),
}

impl StepName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Builtin(step) => step.into(),
            Self::Custom(name) => name,
        }
    }

    pub fn builtin(&self) -> Option<BuiltinStep> {
        match self {
            Self::Builtin(step) => Some(*step),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for StepName {
    fn from(name: &str) -> Self {
        BuiltinStep::from_str(name)
            .map(Self::Builtin)
            .unwrap_or_else(|_| Self::Custom(name.to_string()))
    }
}

impl From<String> for StepName {
    fn from(name: String) -> Self {
        match BuiltinStep::from_str(&name) {
            Ok(step) => Self::Builtin(step),
            Err(_) => Self::Custom(name),
        }
    }
}

impl From<StepName> for String {
    fn from(name: StepName) -> Self {
        match name {
            StepName::Builtin(step) => step.to_string(),
            StepName::Custom(name) => name,
        }
    }
}

impl From<BuiltinStep> for StepName {
    fn from(step: BuiltinStep) -> Self {
        Self::Builtin(step)
    }
}

/// Opaque step argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum StepArg {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<StepArg>),
}

impl StepArg {
    /// `false`, `0` and `""` are falsy; lists always count as present.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Text(value) => !value.is_empty(),
            Self::List(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for StepArg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StepArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StepArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StepArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Resolved arguments of one step.
///
/// Built from candidate values: the first truthy candidate wins, and a list
/// candidate is spliced in with its falsy members dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StepArgs(pub Vec<StepArg>);

impl StepArgs {
    pub fn pick(candidates: impl IntoIterator<Item = StepArg>) -> Self {
        match candidates.into_iter().find(StepArg::is_truthy) {
            Some(StepArg::List(items)) => Self(items.into_iter().filter(StepArg::is_truthy).collect()),
            Some(arg) => Self(vec![arg]),
            None => Self::default(),
        }
    }
}

impl From<()> for StepArgs {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<StepArg> for StepArgs {
    fn from(arg: StepArg) -> Self {
        Self::pick([arg])
    }
}

impl From<&str> for StepArgs {
    fn from(arg: &str) -> Self {
        Self::pick([StepArg::from(arg)])
    }
}

impl From<Vec<StepArg>> for StepArgs {
    fn from(candidates: Vec<StepArg>) -> Self {
        Self::pick(candidates)
    }
}

impl From<Option<StepArg>> for StepArgs {
    fn from(arg: Option<StepArg>) -> Self {
        Self::pick(arg)
    }
}

/// One entry of a plan.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub name: StepName,
    pub args: Vec<StepArg>,
}

impl Step {
    pub fn new(name: impl Into<StepName>, args: impl Into<StepArgs>) -> Self {
        Self {
            name: name.into(),
            args: args.into().0,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&StepArg> {
        self.args.get(index)
    }
}

/// Flat, ordered list of steps. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Plan(Vec<Step>);

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, step: BuiltinStep) -> bool {
        self.0.iter().any(|entry| entry.name == StepName::Builtin(step))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.0.iter()
    }

    /// SHA-256 over a length-prefixed encoding of every step.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update((self.0.len() as u64).to_le_bytes());
        for step in &self.0 {
            write_str(&mut hasher, step.name.as_str());
            hasher.update((step.args.len() as u64).to_le_bytes());
            for arg in &step.args {
                write_arg(&mut hasher, arg);
            }
        }
        hasher.finalize().into()
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn write_arg(hasher: &mut Sha256, arg: &StepArg) {
    match arg {
        StepArg::Bool(value) => hasher.update([0, u8::from(*value)]),
        StepArg::Int(value) => {
            hasher.update([1]);
            hasher.update(value.to_le_bytes());
        }
        StepArg::Text(value) => {
            hasher.update([2]);
            write_str(hasher, value);
        }
        StepArg::List(items) => {
            hasher.update([3]);
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                write_arg(hasher, item);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = core::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_round_trip_through_strings() {
        assert_eq!(
            StepName::from("applyDefaultTargetsAsEffective"),
            StepName::Builtin(BuiltinStep::ApplyDefaultTargetsAsEffective)
        );
        assert_eq!(
            StepName::from("summonSwarm"),
            StepName::Custom("summonSwarm".into())
        );
        assert_eq!(BuiltinStep::PerformSavingThrow.to_string(), "performSavingThrow");
    }

    #[test]
    fn first_truthy_candidate_wins_and_lists_are_spliced() {
        let args = StepArgs::pick([
            StepArg::Bool(false),
            StepArg::List(vec![StepArg::from("fire"), StepArg::Int(0), StepArg::Int(3)]),
            StepArg::from("ignored"),
        ]);
        assert_eq!(args.0, vec![StepArg::from("fire"), StepArg::Int(3)]);

        assert!(StepArgs::pick([StepArg::from(""), StepArg::Int(0)]).0.is_empty());
    }

    #[test]
    fn fingerprint_distinguishes_argument_boundaries() {
        let a = Plan::new(vec![Step::new("x", StepArg::from("ab"))]);
        let b = Plan::new(vec![Step::new("xa", StepArg::from("b"))]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn fingerprint_matches_the_documented_encoding() {
        assert_eq!(
            hex::encode(Plan::default().fingerprint()),
            "af5570f5a1810b7af78caf4bc70a660f0df51e42baf91d4de5b2328de0e83dfc"
        );

        let plan = Plan::new(vec![Step::new("summonSwarm", StepArg::from("ab"))]);
        assert_eq!(
            hex::encode(plan.fingerprint()),
            "5350e15f62bd6ba815ffa449df97fb8611144759a95b6d7d0817957f600a9add"
        );
    }
}
