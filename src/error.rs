use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    #[error("invalid configuration: {width}x{height} grid (sides must be at least 1 and the area must fit in i32)")]
    InvalidConfiguration { width: i32, height: i32 },

    #[error("no room satisfies the placement rules for the {item}")]
    NoValidPlacement { item: &'static str },

    #[error("failed to read settings: {0}")]
    SettingsFormat(String),
}

pub type Result<T> = std::result::Result<T, MazeError>;
