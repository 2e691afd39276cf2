use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Starting arrangement of the board. The two layouts have different widths.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// 8x8. Spies replace the h-pawns, which step one rank forward.
    #[default]
    Classic,
    /// 8x9. Spies sit on the back rank next to the kings.
    Wide,
}

impl Layout {
    /// `(rows, cols)`
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            Layout::Classic => (8, 8),
            Layout::Wide => (8, 9),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub layout: Layout,
    /// Occurrences of one position that end the game in a draw.
    pub repetition_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            layout: Layout::Classic,
            repetition_limit: 3,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetition_limit < 2 {
            return Err(ConfigError::UnsupportedRepetitionLimit(self.repetition_limit));
        }
        Ok(())
    }
}
