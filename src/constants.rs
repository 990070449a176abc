use crate::types::Vec2;

pub const DEFAULT_WIDTH: i32 = 25;
pub const DEFAULT_HEIGHT: i32 = 25;
pub const DEFAULT_MONSTER_COUNT: usize = 3;
pub const DEFAULT_VISIBILITY_RANGE: usize = 3;

pub const MIN_SIDE: i32 = 10;
pub const MAX_SIDE: i32 = 50;
pub const MIN_MONSTERS: usize = 1;
pub const MAX_MONSTERS: usize = 10;
pub const MIN_VISIBILITY: usize = 1;
pub const MAX_VISIBILITY: usize = 5;

/// Off-grid coordinate the key moves to once the player picks it up.
pub const KEY_COLLECTED: Vec2 = Vec2::new(-1, -1);
