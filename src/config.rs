use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HEIGHT, DEFAULT_MONSTER_COUNT, DEFAULT_VISIBILITY_RANGE, DEFAULT_WIDTH, MAX_MONSTERS,
    MAX_SIDE, MAX_VISIBILITY, MIN_MONSTERS, MIN_SIDE, MIN_VISIBILITY,
};
use crate::error::{MazeError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MazeSettings {
    pub width: i32,
    pub height: i32,
    pub monster_count: usize,
    pub visibility_range: usize,
}

impl Default for MazeSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            monster_count: DEFAULT_MONSTER_COUNT,
            visibility_range: DEFAULT_VISIBILITY_RANGE,
        }
    }
}

impl MazeSettings {
    pub fn new(width: i32, height: i32, monster_count: usize, visibility_range: usize) -> Self {
        Self {
            width,
            height,
            monster_count,
            visibility_range,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.height < 1 || self.width.checked_mul(self.height).is_none() {
            return Err(MazeError::InvalidConfiguration {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Pulls every field into the ranges offered by the settings screen.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.clamp(MIN_SIDE, MAX_SIDE),
            height: self.height.clamp(MIN_SIDE, MAX_SIDE),
            monster_count: self.monster_count.clamp(MIN_MONSTERS, MAX_MONSTERS),
            visibility_range: self.visibility_range.clamp(MIN_VISIBILITY, MAX_VISIBILITY),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|error| MazeError::SettingsFormat(error.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}
