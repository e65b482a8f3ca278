//! Shared geometric and allegiance primitives.

/// Grid coordinate of a token or template origin, measured in squares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Token allegiance as configured by the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disposition {
    Hostile,
    #[default]
    Neutral,
    Friendly,
}

impl Disposition {
    /// Two tokens are allies when they share a disposition.
    pub fn is_ally_of(self, other: Disposition) -> bool {
        self == other
    }

    /// Two tokens are enemies when their dispositions differ.
    pub fn is_enemy_of(self, other: Disposition) -> bool {
        self != other
    }
}
