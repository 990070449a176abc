use std::cmp::Ordering;

use crate::types::{Direction, Vec2};

/// Order in which sight lines are walked out of a room.
pub(super) const RAY_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::West,
    Direction::East,
];

/// One step from `from` toward `target`, closing the x gap first. `None`
/// when already there.
pub fn pursuit_direction(from: Vec2, target: Vec2) -> Option<Direction> {
    if from.x == target.x {
        return match target.y.cmp(&from.y) {
            Ordering::Less => Some(Direction::North),
            Ordering::Greater => Some(Direction::South),
            Ordering::Equal => None,
        };
    }
    if target.x < from.x {
        Some(Direction::West)
    } else {
        Some(Direction::East)
    }
}

pub(super) fn on_border(pos: Vec2, width: i32, height: i32) -> bool {
    pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1
}

/// Whether `key` lies in the half of the grid facing away from the border
/// the exit sits on. A corner exit accepts either half.
pub(super) fn in_key_half(key: Vec2, exit: Vec2, width: i32, height: i32) -> bool {
    (exit.x == 0 && key.x >= width / 2)
        || (exit.x == width - 1 && key.x <= width / 2)
        || (exit.y == 0 && key.y >= height / 2)
        || (exit.y == height - 1 && key.y <= height / 2)
}
