//! Core data models for pool play and brackets.

mod game;
mod ids;
mod standing;
mod team;
mod tiebreaker;
mod tournament;

pub use game::*;
pub use ids::*;
pub use standing::*;
pub use team::*;
pub use tiebreaker::*;
pub use tournament::*;
