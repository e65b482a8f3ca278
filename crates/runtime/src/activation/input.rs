//! Interactive prompts a step can suspend on, and the answers that resume it.

use serde::{Deserialize, Serialize};
use skirmish_core::{Position, StepName, TargetShape};

use super::record::Target;

/// What a suspended activation is waiting for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputRequest {
    /// The acting user confirms or edits the target list.
    ConfirmTargets { candidates: Vec<Target> },
    /// The acting user places an area template.
    PlaceTemplate { shape: TargetShape, size: u32 },
    /// Roll configuration dialog shown before rolling.
    ConfigureRoll {
        step: StepName,
        variants: Vec<String>,
        custom: Option<String>,
    },
}

/// Advantage state chosen in the roll configuration dialog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// Answer to an [`InputRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputResponse {
    Targets { targets: Vec<Target> },
    Template { origin: Position },
    Roll {
        mode: RollMode,
        variant: Option<String>,
    },
    /// The user dismissed the prompt; the activation is cancelled.
    Decline,
}

impl InputResponse {
    pub fn roll(mode: RollMode) -> Self {
        Self::Roll {
            mode,
            variant: None,
        }
    }
}
