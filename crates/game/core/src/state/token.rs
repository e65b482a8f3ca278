//! Scene tokens and area templates.

use crate::item::TargetShape;
use crate::state::{ActivationId, ActorId, Disposition, Position, TemplateId, TokenId, UserId};

/// A token placed on the scene.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenState {
    pub id: TokenId,
    pub actor: ActorId,
    pub position: Position,
    pub disposition: Disposition,
    /// Area template that follows this token when it moves.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attached_template: Option<TemplateId>,
}

impl TokenState {
    pub fn new(id: TokenId, actor: ActorId, position: Position, disposition: Disposition) -> Self {
        Self {
            id,
            actor,
            position,
            disposition,
            attached_template: None,
        }
    }
}

/// A measured area template placed by an activation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateState {
    pub id: TemplateId,
    pub shape: TargetShape,
    pub origin: Position,
    /// Size in distance units (radius, length or edge depending on shape).
    pub size: u32,
    pub author: UserId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attached_token: Option<TokenId>,
    /// Activations still referencing this template.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owners: Vec<ActivationId>,
}

impl TemplateState {
    /// Detaches `activation` and reports whether no owner remains.
    pub fn release(&mut self, activation: ActivationId) -> bool {
        self.owners.retain(|owner| *owner != activation);
        self.owners.is_empty()
    }
}
