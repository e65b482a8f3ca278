//! Strongly typed identifiers for records owned by the document store.

use core::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ".{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(
    /// Actor (character or creature sheet).
    ActorId,
    "Actor"
);
record_id!(
    /// Token placed on the scene; each token is backed by exactly one actor.
    TokenId,
    "Token"
);
record_id!(
    /// Item (spell, weapon, feature) owned by an actor.
    ItemId,
    "Item"
);
record_id!(
    /// Active effect carried by an actor.
    EffectId,
    "ActiveEffect"
);
record_id!(
    /// Measured area template placed on the scene.
    TemplateId,
    "MeasuredTemplate"
);
record_id!(
    /// Chat message record.
    MessageId,
    "ChatMessage"
);
record_id!(
    /// Connected user.
    UserId,
    "User"
);
record_id!(
    /// One execution of an item's plan.
    ActivationId,
    "Activation"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_document_prefix() {
        assert_eq!(EffectId(12).to_string(), "ActiveEffect.12");
        assert_eq!(TokenId::from(3).to_string(), "Token.3");
    }
}
