pub mod config;
pub mod db;
pub mod error;
pub mod flush;
pub mod game;
pub mod id;
pub mod model;
pub mod sim;
pub mod store;

#[cfg(test)]
mod testutil;

pub use config::{GameConfig, Rules};
pub use error::{ConfigError, GameError};
pub use game::{CountrySnapshot, Game, GameStats};
pub use model::{CountryId, World};
pub use store::StateStore;
