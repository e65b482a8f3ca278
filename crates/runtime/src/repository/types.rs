//! Records owned by the runtime's document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_core::{
    ActivationId, ActorId, DamageEntry, DamagePoints, MessageId, Position, TargetShape, TokenId,
    UserId,
};

/// Who can read a chat message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    /// Visible to the author and privileged users.
    Whisper,
    GmOnly,
}

/// The three views of one activation card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLinks {
    pub master: Option<MessageId>,
    pub gm: Option<MessageId>,
    pub player: Option<MessageId>,
}

impl MessageLinks {
    pub fn iter(&self) -> impl Iterator<Item = MessageId> {
        [self.master, self.gm, self.player].into_iter().flatten()
    }
}

/// Damage card payload: the HP entry for one target and whether it was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageCardState {
    pub actor: ActorId,
    pub token: Option<TokenId>,
    pub points: DamagePoints,
    pub entry: DamageEntry,
    pub applied: bool,
}

/// Bookkeeping attached to runtime-authored messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFlags {
    pub activation: Option<ActivationId>,
    /// User whose action the card reports.
    pub originator: Option<UserId>,
    /// This message is the privileged observer's copy.
    pub gm_view: bool,
    pub links: MessageLinks,
    pub damage_card: Option<DamageCardState>,
}

/// Chat message record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub author: UserId,
    pub visibility: Visibility,
    pub content: serde_json::Value,
    #[serde(default)]
    pub flags: MessageFlags,
    pub created_at: DateTime<Utc>,
}

/// Message to be created; the store assigns identifier and timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMessage {
    pub author: UserId,
    pub visibility: Visibility,
    pub content: serde_json::Value,
    pub flags: MessageFlags,
}

impl NewMessage {
    pub fn new(author: UserId, visibility: Visibility, content: serde_json::Value) -> Self {
        Self {
            author,
            visibility,
            content,
            flags: MessageFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Template to be placed; the store assigns the identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTemplate {
    pub shape: TargetShape,
    pub origin: Position,
    pub size: u32,
    pub author: UserId,
    pub attached_token: Option<TokenId>,
    pub owner: ActivationId,
}
