//! Condition lists: `(event, update action)` pairs stored on items and effects.

use super::matrix::{ConditionScope, TriggerMatrix, UpdateAction, event_matches};
use crate::error::ConfigurationError;

/// One configured trigger. A blank entry (both names empty) is a draft row
/// that has not been filled in yet; it is kept but never fires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Condition {
    /// Condition event name, e.g. `target-hits.rwak`.
    pub condition: String,
    /// Update action name, e.g. `apply-effects-immediate`.
    pub update: String,
    /// Free-form note shown to users.
    pub text: String,
}

impl Condition {
    pub fn new(condition: impl Into<String>, update: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            update: update.into(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.condition.is_empty() && self.update.is_empty()
    }

    /// Validates the pair and its availability in `scope`.
    pub fn validate(
        &self,
        matrix: &TriggerMatrix,
        scope: ConditionScope,
    ) -> Result<UpdateAction, ConfigurationError> {
        matrix.check_scope(&self.condition, scope)?;
        matrix.check_pair(&self.condition, &self.update)
    }

    /// Update action to run when `fired` occurs, if this entry listens to it.
    pub fn fires_on(&self, matrix: &TriggerMatrix, fired: &str) -> Option<UpdateAction> {
        if self.is_blank() || !event_matches(&self.condition, fired) {
            return None;
        }
        matrix.check_pair(&self.condition, &self.update).ok()
    }
}

/// Validates every non-blank entry, reporting the first failure by index.
pub fn validate_conditions(
    conditions: &[Condition],
    matrix: &TriggerMatrix,
    scope: ConditionScope,
) -> Result<(), ConfigurationError> {
    conditions
        .iter()
        .enumerate()
        .filter(|(_, condition)| !condition.is_blank())
        .try_for_each(|(index, condition)| {
            condition
                .validate(matrix, scope)
                .map(drop)
                .map_err(|err| err.at(index))
        })
}

/// Appends a blank draft entry.
pub fn add_condition(conditions: &mut Vec<Condition>) {
    conditions.push(Condition::default());
}

/// Removes the entry at `index`; out-of-range indices are ignored.
pub fn remove_condition(conditions: &mut Vec<Condition>, index: usize) -> Option<Condition> {
    (index < conditions.len()).then(|| conditions.remove(index))
}

/// Update actions fired by `event` across a list, in list order.
pub fn updates_for<'a>(
    conditions: &'a [Condition],
    matrix: &'a TriggerMatrix,
    event: &'a str,
) -> impl Iterator<Item = UpdateAction> + 'a {
    conditions
        .iter()
        .filter_map(move |condition| condition.fires_on(matrix, event))
}
