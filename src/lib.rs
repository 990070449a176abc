pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod rng;
pub mod types;
pub mod world;

pub use config::MazeSettings;
pub use engine::MazeEngine;
pub use error::{MazeError, Result};
