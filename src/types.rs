use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    West,
    South,
    East,
}

impl Direction {
    /// Slot order of a room's walls.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::East,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "N" | "n" | "north" | "up" => Some(Self::North),
            "W" | "w" | "west" | "left" => Some(Self::West),
            "S" | "s" | "south" | "down" => Some(Self::South),
            "E" | "e" | "east" | "right" => Some(Self::East),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::West => 1,
            Direction::South => 2,
            Direction::East => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
        }
    }
}

/// A grid coordinate. Rooms are identified by their coordinate alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    #[default]
    Empty,
    Player,
    Monster,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Active,
    Dead,
    Escaped,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        self != GameState::Active
    }
}

/// User-facing notices. Variants are declared from lowest to highest priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMessage {
    InvalidMove,
    ExitLocked,
    KeyFound,
    Escaped,
    Killed,
}

impl GameMessage {
    pub fn text(self) -> &'static str {
        match self {
            GameMessage::InvalidMove => "Invalid Move: Why are you running into walls?",
            GameMessage::ExitLocked => "You found the exit, but you don't have the key!",
            GameMessage::KeyFound => "You found the key!",
            GameMessage::Escaped => "Congratulations you've escaped the Death Maze!",
            GameMessage::Killed => "GAME OVER: You got killed by a Monster!",
        }
    }
}

impl fmt::Display for GameMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub moved: bool,
    pub message: Option<GameMessage>,
    pub state: GameState,
}

#[derive(Clone, Debug, Serialize)]
pub struct CellView {
    pub x: i32,
    pub y: i32,
    /// Passage flags in north, west, south, east order.
    pub passages: [bool; 4],
    pub visited: bool,
    pub occupant: Occupant,
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeSnapshot {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "visibilityRange")]
    pub visibility_range: usize,
    pub cells: Vec<CellView>,
    pub player: Vec2,
    pub key: Option<Vec2>,
    pub exit: Vec2,
    pub monsters: Vec<Vec2>,
    pub visible: Vec<Vec2>,
    pub state: GameState,
}
