use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerNameError {
    #[error("player name cannot be empty")]
    Empty,
}

/// Display name a player enters before starting a session.
///
/// Trimmed, never empty, and at most [`PlayerName::MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(String);

impl PlayerName {
    pub const MAX_CHARS: usize = 15;

    /// Name recorded when a result arrives without an identity.
    pub const PLACEHOLDER: &'static str = "Anonymous";

    /// Parse user input into a name. Input longer than `MAX_CHARS` is cut.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNameError::Empty` if nothing but whitespace was entered.
    pub fn parse(raw: &str) -> Result<Self, PlayerNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PlayerNameError::Empty);
        }
        let name: String = trimmed.chars().take(Self::MAX_CHARS).collect();
        Ok(Self(name.trim_end().to_owned()))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(Self::PLACEHOLDER.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_accepts_names() {
        assert_eq!(PlayerName::parse("  Clara ").unwrap().as_str(), "Clara");
    }

    #[test]
    fn rejects_blank_names() {
        assert_eq!(PlayerName::parse(""), Err(PlayerNameError::Empty));
        assert_eq!(PlayerName::parse(" \t\n"), Err(PlayerNameError::Empty));
    }

    #[test]
    fn truncates_long_names_on_char_boundaries() {
        let name = PlayerName::parse("Hildegard von Bingen").unwrap();
        assert_eq!(name.as_str(), "Hildegard von B");

        let accented = PlayerName::parse("ÉÉÉÉÉÉÉÉÉÉÉÉÉÉÉÉÉÉ").unwrap();
        assert_eq!(accented.as_str().chars().count(), PlayerName::MAX_CHARS);
    }
}
