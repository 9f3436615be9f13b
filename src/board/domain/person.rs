//! People referenced by tasks and the avatar identity derived from a name.

use super::{BoardDomainError, UserId};
use serde::{Deserialize, Serialize};

/// A person from the user directory: a creator or an assignee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    id: UserId,
    name: String,
}

impl Person {
    /// Creates a person reference with a trimmed display name.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyPersonName`] when the name is blank.
    pub fn new(id: UserId, name: impl Into<String>) -> Result<Self, BoardDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::EmptyPersonName);
        }
        Ok(Self {
            id,
            name: trimmed.to_owned(),
        })
    }

    /// Directory identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Avatar derived from the display name.
    #[must_use]
    pub fn avatar(&self) -> AvatarIdentity {
        AvatarIdentity::for_name(&self.name)
    }
}

/// Background colour of an avatar badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarColor {
    /// Emerald.
    Emerald,
    /// Teal.
    Teal,
    /// Green.
    Green,
    /// Cyan.
    Cyan,
    /// Blue.
    Blue,
    /// Indigo.
    Indigo,
    /// Violet.
    Violet,
    /// Purple.
    Purple,
}

impl AvatarColor {
    /// Palette in selection order.
    pub const PALETTE: [Self; 8] = [
        Self::Emerald,
        Self::Teal,
        Self::Green,
        Self::Cyan,
        Self::Blue,
        Self::Indigo,
        Self::Violet,
        Self::Purple,
    ];

    /// Picks the palette entry for a leading initial.
    #[must_use]
    pub const fn for_initial(initial: char) -> Self {
        match (initial as u32).rem_euclid(8) {
            0 => Self::Emerald,
            1 => Self::Teal,
            2 => Self::Green,
            3 => Self::Cyan,
            4 => Self::Blue,
            5 => Self::Indigo,
            6 => Self::Violet,
            _ => Self::Purple,
        }
    }
}

/// Initials and colour shown for a person on a task card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvatarIdentity {
    initials: String,
    color: AvatarColor,
}

impl AvatarIdentity {
    /// Placeholder shown when a name has no usable characters.
    pub const UNKNOWN_INITIALS: &'static str = "?";

    /// Derives the avatar for a display name.
    ///
    /// Initials are the first letter of each word, uppercased and capped at
    /// two characters. The colour is keyed on the first initial.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        let mut initials: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();
        if initials.is_empty() {
            initials = Self::UNKNOWN_INITIALS.to_owned();
        }
        let leading = initials.chars().next().unwrap_or('?');
        Self {
            color: AvatarColor::for_initial(leading),
            initials,
        }
    }

    /// One or two uppercase initials.
    #[must_use]
    pub fn initials(&self) -> &str {
        &self.initials
    }

    /// Badge colour.
    #[must_use]
    pub const fn color(&self) -> AvatarColor {
        self.color
    }
}
